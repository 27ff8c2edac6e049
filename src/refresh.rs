//! Refresh of the stored collection from a market data source
//!
//! Two passes, as the exchange exposes them: the listing (identifiers, names,
//! trading status) page by page, then full specs for every traded bond whose
//! last refresh is older than a cutoff. A bond whose specs cannot be fetched is
//! still stamped as refreshed so one bad record never stalls the pass.

use crate::data::BondSource;
use crate::enrich::{EnrichedBond, Enricher};
use crate::error::{BondError, Result};
use crate::fields;
use crate::finance::CommissionPolicy;
use crate::store::BondStore;
use chrono::{Duration, NaiveDateTime};
use log::{info, warn};

/// Upper bound on listing pages, in case the source never returns an empty one
pub const MAX_LISTING_PAGES: u32 = 999;

/// Outcome of a listing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingSummary {
    pub pages: u32,
    pub inserted: usize,
    pub updated: usize,
    /// Rows skipped (no secid) plus invalid fields across all rows
    pub issues: usize,
}

/// Outcome of a specs refresh pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    /// Bonds whose specs could not be fetched
    pub failed: usize,
}

/// Walk the listing until an empty page and merge every row into the store
pub async fn refresh_listing<S, B>(source: &S, store: &mut B, page_size: u32) -> Result<ListingSummary>
where
    S: BondSource,
    B: BondStore,
{
    let mut summary = ListingSummary::default();

    for page in 1..=MAX_LISTING_PAGES {
        let rows = match source.listing_page(page, page_size).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("{}: listing page {} failed, stopping: {}", source.name(), page, e);
                break;
            }
        };
        if rows.is_empty() {
            break;
        }
        summary.pages = page;

        for row in &rows {
            match store.upsert_listing(row) {
                Ok(outcome) => {
                    if outcome.inserted {
                        summary.inserted += 1;
                    } else {
                        summary.updated += 1;
                    }
                    summary.issues += outcome.issues.len();
                }
                Err(e) if e.is_record_fault() => {
                    warn!("Skipping listing row: {}", e);
                    summary.issues += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!("Listing page {}: {} bonds", page, rows.len());
    }

    info!(
        "Listing done: {} pages, {} new, {} updated",
        summary.pages, summary.inserted, summary.updated
    );
    Ok(summary)
}

/// Refresh specs and derived fields of every stale traded bond
///
/// `on_bond` is called after each bond is stored. A negative `stale_after`
/// is rejected: every bond saved at `now` would still be older than the cutoff.
pub async fn refresh_stale<S, B, F>(
    source: &S,
    store: &mut B,
    policy: CommissionPolicy,
    stale_after: Duration,
    now: NaiveDateTime,
    mut on_bond: F,
) -> Result<RefreshSummary>
where
    S: BondSource,
    B: BondStore,
    F: FnMut(&EnrichedBond),
{
    if stale_after < Duration::zero() {
        return Err(BondError::ConfigError(format!(
            "stale interval must not be negative, got {} hours",
            stale_after.num_hours()
        )));
    }
    let cutoff = now - stale_after;
    let today = now.date();
    let enricher = Enricher::new(today, policy);
    let mut summary = RefreshSummary::default();

    while let Some(secid) = store.next_stale(cutoff)? {
        let Some(mut record) = store.get(&secid)? else {
            break;
        };

        match source.specs(&secid, today).await {
            Ok(specs) => {
                let issues = fields::merge(&mut record.bond.facts, &specs);
                if !issues.is_empty() {
                    log::debug!("{}: {} invalid specs field(s)", secid, issues.len());
                }
            }
            Err(e) => {
                warn!("{}: failed to fetch specs for {}: {}", source.name(), secid, e);
                summary.failed += 1;
            }
        }

        let bond = enricher.enrich(record.bond.facts);
        store.save(&bond, now)?;
        summary.refreshed += 1;
        on_bond(&bond);
    }

    info!(
        "Specs refresh done: {} bonds ({} failed fetches)",
        summary.refreshed, summary.failed
    );
    Ok(summary)
}

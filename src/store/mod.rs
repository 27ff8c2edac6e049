//! Bond persistence
//!
//! The core never touches storage; the refresh driver and the CLI pass a
//! [`BondStore`] around explicitly.

#[cfg(feature = "rusqlite-support")]
pub mod sqlite;

use crate::bond::BondFacts;
use crate::enrich::EnrichedBond;
use crate::error::{BondError, Result};
use crate::fields::{self, FieldIssue};
use crate::types::{FieldMap, Secid};
use chrono::NaiveDateTime;
use hashbrown::HashMap;

#[cfg(feature = "rusqlite-support")]
pub use sqlite::SqliteBondStore;

/// Timestamp format of the `updated` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted bond with the time its specs were last refreshed
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBond {
    pub bond: EnrichedBond,
    /// `None` until the first specs refresh (or after a reset)
    pub updated: Option<NaiveDateTime>,
}

/// Result of merging one listing row
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub secid: Secid,
    pub inserted: bool,
    pub issues: Vec<FieldIssue>,
}

/// Storage of the bond collection
pub trait BondStore {
    fn get(&self, secid: &str) -> Result<Option<StoredBond>>;

    /// Insert or replace a record
    fn put(&mut self, record: &StoredBond) -> Result<()>;

    /// Every bond, ordered by secid
    fn load_all(&self) -> Result<Vec<EnrichedBond>>;

    /// Next traded bond whose specs were never refreshed or were refreshed
    /// before `older_than`; never-refreshed bonds come first
    fn next_stale(&self, older_than: NaiveDateTime) -> Result<Option<Secid>>;

    /// Number of traded bonds `next_stale` would still return
    fn count_stale(&self, older_than: NaiveDateTime) -> Result<usize>;

    /// Mark every bond as never refreshed, returning how many were touched
    fn reset_updated(&mut self) -> Result<usize>;

    fn count(&self) -> Result<usize>;

    /// Merge a listing row into the store, creating the bond if it is new
    ///
    /// The refresh timestamp is left as is.
    fn upsert_listing(&mut self, row: &FieldMap) -> Result<UpsertOutcome> {
        let secid = match fields::decode_secid(row) {
            Some(secid) => secid,
            None => return Err(BondError::MissingInput("listing row without secid".to_string())),
        };

        let (mut record, inserted) = match self.get(&secid)? {
            Some(record) => (record, false),
            None => (
                StoredBond {
                    bond: EnrichedBond::unenriched(BondFacts::new(secid.clone())),
                    updated: None,
                },
                true,
            ),
        };
        let issues = fields::merge(&mut record.bond.facts, row);
        self.put(&record)?;

        Ok(UpsertOutcome {
            secid,
            inserted,
            issues,
        })
    }

    /// Store a freshly enriched bond stamped with its refresh time
    fn save(&mut self, bond: &EnrichedBond, updated: NaiveDateTime) -> Result<()> {
        self.put(&StoredBond {
            bond: bond.clone(),
            updated: Some(updated),
        })
    }
}

fn is_stale(record: &StoredBond, older_than: NaiveDateTime) -> bool {
    record.bond.facts.is_traded == Some(true) && record.updated.map_or(true, |u| u < older_than)
}

/// Store held in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryBondStore {
    bonds: HashMap<Secid, StoredBond>,
}

impl InMemoryBondStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BondStore for InMemoryBondStore {
    fn get(&self, secid: &str) -> Result<Option<StoredBond>> {
        Ok(self.bonds.get(secid).cloned())
    }

    fn put(&mut self, record: &StoredBond) -> Result<()> {
        self.bonds
            .insert(record.bond.facts.secid.clone(), record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<EnrichedBond>> {
        let mut bonds: Vec<EnrichedBond> = self.bonds.values().map(|r| r.bond.clone()).collect();
        bonds.sort_by(|a, b| a.facts.secid.cmp(&b.facts.secid));
        Ok(bonds)
    }

    fn next_stale(&self, older_than: NaiveDateTime) -> Result<Option<Secid>> {
        Ok(self
            .bonds
            .values()
            .filter(|r| is_stale(r, older_than))
            .min_by(|a, b| {
                a.updated
                    .cmp(&b.updated)
                    .then_with(|| a.bond.facts.secid.cmp(&b.bond.facts.secid))
            })
            .map(|r| r.bond.facts.secid.clone()))
    }

    fn count_stale(&self, older_than: NaiveDateTime) -> Result<usize> {
        Ok(self.bonds.values().filter(|r| is_stale(r, older_than)).count())
    }

    fn reset_updated(&mut self) -> Result<usize> {
        for record in self.bonds.values_mut() {
            record.updated = None;
        }
        Ok(self.bonds.len())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.bonds.len())
    }
}

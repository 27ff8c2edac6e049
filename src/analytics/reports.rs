//! Ranked report views and the export selection
//!
//! Each report is null-safe on its own: when a column it needs is absent from
//! the collection, or the filtered subset is empty, it returns no rows.

use crate::analytics::frame::{asc_absent_last, desc_absent_last, median, BondFrame, Column, Row};
use crate::enrich::EnrichedBond;
use crate::error::BondError;
use crate::finance::constants::NEAR_TERM_DAYS;
use crate::types::Price;
use log::debug;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A bond selected by a report
pub type ReportRow<'a> = Row<'a>;

/// Available ranking views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Priced below a floor, highest yield first
    LowestPrice,
    /// Traded tier 1-2 bonds due within a year, cheaper than their median
    NearTermDiscount,
    /// Tier 1-2 bonds due within a year, yielding above their median
    NearTermHighYield,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::LowestPrice,
        ReportKind::NearTermDiscount,
        ReportKind::NearTermHighYield,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::LowestPrice => "lowest-price",
            ReportKind::NearTermDiscount => "365-cheap",
            ReportKind::NearTermHighYield => "365-yieldest",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = BondError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // underscores are accepted for the names used by older scripts
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "lowest-price" => Ok(ReportKind::LowestPrice),
            "365-cheap" | "365-cheap-ll21" => Ok(ReportKind::NearTermDiscount),
            "365-yieldest" => Ok(ReportKind::NearTermHighYield),
            _ => Err(BondError::ConfigError(format!("Unknown report: {}", s))),
        }
    }
}

fn by_yield_desc(a: &Row<'_>, b: &Row<'_>) -> Ordering {
    desc_absent_last(a.yield_percent(), b.yield_percent())
}

impl BondFrame {
    /// Bonds priced below `floor`, ordered by yield descending
    pub fn report_lowest_price(&self, floor: Price) -> Vec<ReportRow<'_>> {
        if !self.has_all(&[Column::Price, Column::Yield]) {
            debug!("lowest-price report: price or yield column missing");
            return Vec::new();
        }
        let mut rows: Vec<_> = self
            .rows()
            .filter(|r| r.price().map_or(false, |p| p < floor))
            .collect();
        rows.sort_by(by_yield_desc);
        rows
    }

    /// Traded tier 1-2 bonds maturing within a year, priced below the median
    /// price of that subset, cheapest first
    pub fn report_near_term_discount(&self) -> Vec<ReportRow<'_>> {
        let required = [
            Column::IsTraded,
            Column::ListLevel,
            Column::DaysToMaturity,
            Column::Price,
        ];
        if !self.has_all(&required) {
            debug!("365-cheap report: required column missing");
            return Vec::new();
        }
        let subset: Vec<_> = self
            .rows()
            .filter(|r| r.is_traded() && r.is_top_listed() && r.matures_within(NEAR_TERM_DAYS))
            .collect();
        let Some(med) = median(subset.iter().filter_map(|r| r.price())) else {
            return Vec::new();
        };

        let mut rows: Vec<_> = subset
            .into_iter()
            .filter(|r| r.price().map_or(false, |p| p < med))
            .collect();
        rows.sort_by(|a, b| asc_absent_last(a.price(), b.price()));
        rows
    }

    /// Tier 1-2 bonds maturing within a year, yielding above the median yield
    /// of that subset, highest yield first
    pub fn report_near_term_high_yield(&self) -> Vec<ReportRow<'_>> {
        if !self.has_all(&[Column::DaysToMaturity, Column::ListLevel, Column::Yield]) {
            debug!("365-yieldest report: required column missing");
            return Vec::new();
        }
        let subset: Vec<_> = self
            .rows()
            .filter(|r| r.is_top_listed() && r.matures_within(NEAR_TERM_DAYS))
            .collect();
        let Some(med) = median(subset.iter().filter_map(|r| r.yield_percent())) else {
            return Vec::new();
        };

        let mut rows: Vec<_> = subset
            .into_iter()
            .filter(|r| r.yield_percent().map_or(false, |y| y > med))
            .collect();
        rows.sort_by(by_yield_desc);
        rows
    }

    /// Run a report by kind; `floor` only applies to the low-price report
    pub fn report(&self, kind: ReportKind, floor: Price) -> Vec<ReportRow<'_>> {
        match kind {
            ReportKind::LowestPrice => self.report_lowest_price(floor),
            ReportKind::NearTermDiscount => self.report_near_term_discount(),
            ReportKind::NearTermHighYield => self.report_near_term_high_yield(),
        }
    }

    /// Bonds worth exporting for manual review
    ///
    /// Traded, open to non-qualified investors, with a known issue date, a
    /// coupon above 1%, not yet matured and rouble-denominated. Bonds at or
    /// below par come first, then by computed yield descending, then by days to
    /// buyback ascending.
    pub fn export_selection(&self, only_buyback: bool) -> Vec<&EnrichedBond> {
        let as_of = self.as_of();
        let mut selected: Vec<&EnrichedBond> = self
            .bonds()
            .iter()
            .filter(|b| {
                let f = &b.facts;
                f.is_traded == Some(true)
                    && f.is_qualified_only == Some(false)
                    && f.issue_date.is_some()
                    && f.coupon_percent.map_or(false, |c| c > 1.0)
                    && f.maturity_date.map_or(false, |d| d > as_of)
                    && f.is_rouble()
                    && (!only_buyback || f.buyback_date.is_some())
            })
            .collect();

        selected.sort_by(|a, b| {
            let at_par = |e: &EnrichedBond| e.facts.price.map_or(false, |p| p <= 100.0);
            at_par(b)
                .cmp(&at_par(a))
                .then_with(|| desc_absent_last(a.derived.calc_yield, b.derived.calc_yield))
                .then_with(|| {
                    asc_absent_last(
                        a.derived.days_to_buyback.map(|d| d as f64),
                        b.derived.days_to_buyback.map(|d| d as f64),
                    )
                })
        });
        selected
    }
}

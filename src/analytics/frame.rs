//! Column-tolerant view over a bond collection
//!
//! A column is present when at least one bond carries a value for it. Statistics
//! and reports declare the columns they need; when any of them is missing from
//! the whole collection the statistic falls back to its default instead of
//! failing the summary.

use crate::bond::ListLevel;
use crate::enrich::EnrichedBond;
use crate::types::{days_between, Days, Percent, Price};
use chrono::NaiveDate;
use hashbrown::HashSet;
use statrs::statistics::{Data, Distribution, OrderStatistics};
use std::cmp::Ordering;

/// Inputs the analytics rely on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Price,
    Yield,
    ListLevel,
    IsTraded,
    QualifiedOnly,
    IssueDate,
    DaysToMaturity,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Price,
        Column::Yield,
        Column::ListLevel,
        Column::IsTraded,
        Column::QualifiedOnly,
        Column::IssueDate,
        Column::DaysToMaturity,
    ];
}

/// One bond with the values derived for the snapshot
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub bond: &'a EnrichedBond,
    /// Days from the snapshot date to the bond's horizon
    pub days_to_maturity: Option<Days>,
}

impl<'a> Row<'a> {
    pub fn price(&self) -> Option<Price> {
        self.bond.facts.price
    }

    pub fn yield_percent(&self) -> Option<Percent> {
        self.bond.screening_yield()
    }

    pub fn list_level(&self) -> Option<ListLevel> {
        self.bond.facts.list_level
    }

    pub fn is_traded(&self) -> bool {
        self.bond.facts.is_traded == Some(true)
    }

    pub fn issue_date(&self) -> Option<NaiveDate> {
        self.bond.facts.issue_date
    }

    /// Horizon within `window` days and not yet passed
    pub fn matures_within(&self, window: Days) -> bool {
        matches!(self.days_to_maturity, Some(d) if (0..window).contains(&d))
    }

    /// Listing tier 1 or 2
    pub fn is_top_listed(&self) -> bool {
        matches!(self.list_level(), Some(level) if level <= ListLevel::SECOND)
    }

    fn has(&self, column: Column) -> bool {
        let facts = &self.bond.facts;
        match column {
            Column::Price => facts.price.is_some(),
            Column::Yield => self.yield_percent().is_some(),
            Column::ListLevel => facts.list_level.is_some(),
            Column::IsTraded => facts.is_traded.is_some(),
            Column::QualifiedOnly => facts.is_qualified_only.is_some(),
            Column::IssueDate => facts.issue_date.is_some(),
            Column::DaysToMaturity => self.days_to_maturity.is_some(),
        }
    }
}

/// Bond collection prepared for analytics at a fixed date
#[derive(Debug, Clone)]
pub struct BondFrame {
    bonds: Vec<EnrichedBond>,
    days_to_maturity: Vec<Option<Days>>,
    present: HashSet<Column>,
    as_of: NaiveDate,
}

impl BondFrame {
    /// Days to maturity are computed once here and reused by every statistic
    pub fn new(bonds: Vec<EnrichedBond>, as_of: NaiveDate) -> Self {
        let days_to_maturity: Vec<Option<Days>> = bonds
            .iter()
            .map(|b| b.facts.horizon().date().map(|d| days_between(as_of, d)))
            .collect();

        let mut frame = Self {
            bonds,
            days_to_maturity,
            present: HashSet::new(),
            as_of,
        };
        let present: HashSet<Column> = Column::ALL
            .iter()
            .copied()
            .filter(|c| frame.rows().any(|r| r.has(*c)))
            .collect();
        frame.present = present;
        frame
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    pub fn bonds(&self) -> &[EnrichedBond] {
        &self.bonds
    }

    pub fn has(&self, column: Column) -> bool {
        self.present.contains(&column)
    }

    pub fn has_all(&self, columns: &[Column]) -> bool {
        columns.iter().all(|c| self.has(*c))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.bonds
            .iter()
            .zip(self.days_to_maturity.iter())
            .map(|(bond, days)| Row {
                bond,
                days_to_maturity: *days,
            })
    }

    /// Traded bonds in the given listing tier
    pub fn traded_in_tier(&self, level: ListLevel) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows()
            .filter(move |r| r.is_traded() && r.list_level() == Some(level))
    }
}

/// Median of the values, `None` for an empty set
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values);
    Some(data.median())
}

/// Arithmetic mean of the values, `None` for an empty set
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    Data::new(values).mean()
}

/// Descending order with absent values last
pub fn desc_absent_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending order with absent values last
pub fn asc_absent_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

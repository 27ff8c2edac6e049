//! Collection summary statistics
//!
//! Each statistic is declared with the columns it needs. [`summarize`] checks
//! those columns once per statistic and reports 0 when any is missing, so one
//! absent input only zeroes the statistics that depend on it.

use crate::analytics::frame::{mean, median, BondFrame, Column, Row};
use crate::bond::ListLevel;
use crate::finance::constants::{NEAR_TERM_DAYS, YIELD_THRESHOLDS};
use crate::types::round2;
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

type Compute = Box<dyn Fn(&BondFrame) -> f64 + Send + Sync>;

/// A named statistic and the columns it reads
pub struct Statistic {
    pub key: String,
    pub requires: &'static [Column],
    compute: Compute,
}

impl Statistic {
    fn new(
        key: impl Into<String>,
        requires: &'static [Column],
        compute: impl Fn(&BondFrame) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            requires,
            compute: Box::new(compute),
        }
    }

    /// Value over the frame, 0 when a required column is missing
    pub fn evaluate(&self, frame: &BondFrame) -> f64 {
        if !frame.has_all(self.requires) {
            debug!("{}: required column missing, reporting 0", self.key);
            return 0.0;
        }
        let value = (self.compute)(frame);
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

/// Keyed summary of a bond collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub as_of: NaiveDate,
    /// Set when the collection had no bonds at all
    pub empty: bool,
    entries: Vec<(String, f64)>,
}

impl AnalyticsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// Stable keys
pub const TOTAL: &str = "total bonds";
pub const TRADED: &str = "traded";
pub const QUALIFIED_ONLY: &str = "qualified investors only";
pub const MEAN_PRICE: &str = "mean price, %";
pub const NEAR_TERM_MEDIAN_PRICE: &str = "median price, maturity < 365d, %";
pub const NEAR_TERM_MEDIAN_YIELD: &str = "median yield, maturity < 365d, %";

pub fn issued_in_key(year: i32) -> String {
    format!("issued in {}", year)
}

pub fn yield_at_least_key(threshold: f64) -> String {
    format!("yield >= {}%", threshold)
}

pub fn tier_count_key(level: ListLevel) -> String {
    format!("listing {}", level.get())
}

pub fn tier_median_yield_key(level: ListLevel) -> String {
    format!("median yield, listing {}, %", level.get())
}

pub fn tier_median_price_key(level: ListLevel) -> String {
    format!("median price, listing {}, %", level.get())
}

/// Yield bands of the price statistics: [lower, upper)
pub const YIELD_BANDS: [(f64, Option<f64>); 3] = [(11.0, None), (8.0, Some(11.0)), (1.0, Some(8.0))];

pub fn band_median_price_key(lower: f64, upper: Option<f64>) -> String {
    match upper {
        None => format!("median price, yield >= {}, %", lower),
        Some(upper) => format!("median price, yield >= {} & < {}, %", lower, upper),
    }
}

fn in_band(row: &Row<'_>, lower: f64, upper: Option<f64>) -> bool {
    match row.yield_percent() {
        Some(y) => y >= lower && upper.map_or(true, |u| y < u),
        None => false,
    }
}

const TIERS: [ListLevel; 3] = [ListLevel::FIRST, ListLevel::SECOND, ListLevel::THIRD];

/// The statistics of a snapshot taken at `as_of`, in report order
pub fn statistics(as_of: NaiveDate) -> Vec<Statistic> {
    let mut stats = vec![
        Statistic::new(TOTAL, &[], |f| f.len() as f64),
        Statistic::new(TRADED, &[Column::IsTraded], |f| {
            f.rows().filter(|r| r.is_traded()).count() as f64
        }),
        Statistic::new(QUALIFIED_ONLY, &[Column::QualifiedOnly], |f| {
            f.rows()
                .filter(|r| r.bond.facts.is_qualified_only == Some(true))
                .count() as f64
        }),
    ];

    // three preceding calendar years, [Jan 1, next Jan 1)
    for back in 1..=3 {
        let year = as_of.year() - back;
        stats.push(Statistic::new(issued_in_key(year), &[Column::IssueDate], move |f| {
            f.rows()
                .filter(|r| r.issue_date().map_or(false, |d| d.year() == year))
                .count() as f64
        }));
    }

    for threshold in YIELD_THRESHOLDS {
        stats.push(Statistic::new(yield_at_least_key(threshold), &[Column::Yield], move |f| {
            f.rows()
                .filter(|r| r.yield_percent().map_or(false, |y| y >= threshold))
                .count() as f64
        }));
    }

    for level in TIERS {
        stats.push(Statistic::new(tier_count_key(level), &[Column::IsTraded, Column::ListLevel], move |f| {
            f.traded_in_tier(level).count() as f64
        }));
        stats.push(Statistic::new(
            tier_median_yield_key(level),
            &[Column::IsTraded, Column::ListLevel, Column::Yield],
            move |f| median_or_zero(f.traded_in_tier(level).filter_map(|r| r.yield_percent())),
        ));
    }

    stats.push(Statistic::new(MEAN_PRICE, &[Column::Price], |f| {
        mean(f.rows().filter_map(|r| r.price())).map(round2).unwrap_or(0.0)
    }));

    for (lower, upper) in YIELD_BANDS {
        stats.push(Statistic::new(
            band_median_price_key(lower, upper),
            &[Column::Price, Column::Yield],
            move |f| {
                median_or_zero(
                    f.rows()
                        .filter(|r| in_band(r, lower, upper))
                        .filter_map(|r| r.price()),
                )
            },
        ));
    }

    for level in TIERS {
        stats.push(Statistic::new(
            tier_median_price_key(level),
            &[Column::Price, Column::IsTraded, Column::ListLevel],
            move |f| median_or_zero(f.traded_in_tier(level).filter_map(|r| r.price())),
        ));
    }

    stats.push(Statistic::new(
        NEAR_TERM_MEDIAN_PRICE,
        &[Column::Price, Column::DaysToMaturity],
        |f| {
            median_or_zero(
                f.rows()
                    .filter(|r| r.matures_within(NEAR_TERM_DAYS))
                    .filter_map(|r| r.price()),
            )
        },
    ));
    stats.push(Statistic::new(
        NEAR_TERM_MEDIAN_YIELD,
        &[Column::Yield, Column::DaysToMaturity],
        |f| {
            median_or_zero(
                f.rows()
                    .filter(|r| r.matures_within(NEAR_TERM_DAYS))
                    .filter_map(|r| r.yield_percent()),
            )
        },
    ));

    stats
}

fn median_or_zero(values: impl IntoIterator<Item = f64>) -> f64 {
    median(values).map(round2).unwrap_or(0.0)
}

/// Summarize the collection held by the frame
///
/// Never fails: an empty collection gives a snapshot marked empty with every
/// statistic at zero.
pub fn summarize(frame: &BondFrame) -> AnalyticsSnapshot {
    let entries = statistics(frame.as_of())
        .into_iter()
        .map(|stat| {
            let value = stat.evaluate(frame);
            (stat.key, value)
        })
        .collect();

    AnalyticsSnapshot {
        as_of: frame.as_of(),
        empty: frame.is_empty(),
        entries,
    }
}

//! # bond_screener
//!
//! Coupon schedules, yield estimates and collection analytics for
//! exchange-traded bonds (MOEX).
//!
//! The computational core (`schedule`, `finance`, `enrich`, `analytics`) is
//! pure: it takes typed bond facts and returns derived fields, summaries and
//! ranked reports. Market data retrieval (`data`), persistence (`store`) and
//! the refresh driver (`refresh`) sit around it.
//!
//! ## Example
//!
//! ```rust
//! use bond_screener::prelude::*;
//! use chrono::NaiveDate;
//!
//! let mut facts = BondFacts::new("RU000A1047S3");
//! facts.initial_face_value = Some(1000.0);
//! facts.price = Some(98.0);
//! facts.coupon_value = Some(35.0);
//! facts.coupon_frequency = Some(2);
//! facts.next_coupon_date = NaiveDate::from_ymd_opt(2025, 3, 1);
//! facts.maturity_date = NaiveDate::from_ymd_opt(2026, 12, 31);
//!
//! let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let enricher = Enricher::new(as_of, CommissionPolicy::default());
//! let bonds = enricher.enrich_all(vec![facts]);
//!
//! let snapshot = summarize(&BondFrame::new(bonds, as_of));
//! assert!(!snapshot.is_empty());
//! ```

pub mod analytics;
pub mod bond;
pub mod data;
pub mod enrich;
pub mod error;
pub mod fields;
pub mod finance;
#[cfg(feature = "async")]
pub mod refresh;
pub mod schedule;
pub mod store;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::analytics::{summarize, AnalyticsSnapshot, BondFrame, Column, ReportKind};
    pub use crate::bond::{BondFacts, CouponKind, Horizon, ListLevel};
    pub use crate::enrich::{Derived, EnrichedBond, Enricher, YieldSource};
    pub use crate::error::{BondError, Result};
    pub use crate::fields::{decode, merge, Decoded, FieldStatus};
    pub use crate::finance::{CommissionPolicy, YieldModel, YieldResult, YieldSelector};
    pub use crate::schedule::{project_coupons, CouponSchedule};
    pub use crate::store::{BondStore, InMemoryBondStore, StoredBond};
    pub use crate::types::*;
}

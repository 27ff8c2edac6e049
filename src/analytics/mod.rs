//! Collection analytics: summary statistics and ranked reports
//!
//! Everything here works on a [`BondFrame`] built once per call from the
//! current collection; nothing is cached between calls.

pub mod frame;
pub mod reports;
pub mod snapshot;

pub use frame::{BondFrame, Column, Row};
pub use reports::{ReportKind, ReportRow};
pub use snapshot::{summarize, AnalyticsSnapshot, Statistic};

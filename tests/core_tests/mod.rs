//! Core engine tests
//!
//! - Coupon schedule properties
//! - Yield models
//! - Collection analytics and reports
//! - Bond store

mod test_analytics;
mod test_schedule;
mod test_store;
mod test_yields;

//! Market data collaborators
//!
//! - `iss`: pure helpers over MOEX ISS JSON blocks
//! - `smartlab`: coupon kind from smart-lab.ru page titles
//! - `moex`: async ISS client (feature `async`)

pub mod iss;
pub mod smartlab;

#[cfg(feature = "async")]
pub mod moex;

#[cfg(feature = "async")]
pub use moex::MoexClient;
#[cfg(feature = "async")]
pub use smartlab::SmartLabClient;

#[cfg(feature = "async")]
use crate::error::Result;
#[cfg(feature = "async")]
use crate::types::FieldMap;
#[cfg(feature = "async")]
use chrono::NaiveDate;

/// Source of raw bond records
#[cfg(feature = "async")]
pub trait BondSource: Send + Sync {
    /// One page of the bond listing (1-based); an empty page ends the listing
    fn listing_page(
        &self,
        page: u32,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<FieldMap>>> + Send;

    /// Raw specs of one bond as of `today`
    fn specs(
        &self,
        secid: &str,
        today: NaiveDate,
    ) -> impl std::future::Future<Output = Result<FieldMap>> + Send;

    /// Get the source name
    fn name(&self) -> &str;
}

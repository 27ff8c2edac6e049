//! Finance module - commission policy, accrued interest, yield models

pub mod accrued;
pub mod commission;
pub mod constants;
pub mod yields;

pub use accrued::{estimate_accrued, AccruedInterest};
pub use commission::CommissionPolicy;
pub use yields::{
    compute_legacy_yield, compute_yield, FullYield, LegacyYield, LegacyYieldResult, YieldEstimate,
    YieldInputs, YieldModel, YieldResult, YieldSelector,
};

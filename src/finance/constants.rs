//! Yield policy constants and defaults
//!
//! Commission values are fixed policy: a flat transaction fee per purchase and
//! the share of income kept after tax.

/// Flat transaction commission, currency units per bond purchase
pub const DEFAULT_FLAT_COMMISSION: f64 = 2.94;

/// Income tax rate withheld on withdrawal
pub const DEFAULT_TAX_RATE: f64 = 0.13;

/// Share of income retained after tax
pub const DEFAULT_TAX_RETENTION: f64 = 1.0 - DEFAULT_TAX_RATE;

/// Remaining life at or below which no monthly figure is extrapolated
pub const MIN_DAYS_FOR_MONTHLY: i64 = 30;

/// Yield thresholds counted by the collection summary, percent
pub const YIELD_THRESHOLDS: [f64; 3] = [1.0, 8.0, 11.0];

/// Default price floor of the low-price report, percent of face value
pub const DEFAULT_LOW_PRICE_FLOOR: f64 = 90.0;

/// Days-to-maturity window of the near-term statistics and reports
pub const NEAR_TERM_DAYS: i64 = 365;

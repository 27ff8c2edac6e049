//! Coupon schedule projection
//!
//! Coupon dates are stepped forward from the next known coupon date by
//! `365 / frequency` days. The step is fractional, so the k-th date is derived
//! from the anchor as `anchor + floor(k * step)` rather than by adding a rounded
//! step repeatedly, which would drift over long schedules.

use crate::types::{days_between, Days, DAYS_PER_YEAR};
use chrono::{Duration, NaiveDate};

/// Highest frequency whose step is at least one whole day
pub const MAX_FREQUENCY: u32 = 365;

/// Forward-only coupon schedule anchored at the next coupon date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouponSchedule {
    anchor: NaiveDate,
    frequency: u32,
}

impl CouponSchedule {
    /// `None` when the frequency is zero (unknown schedule) or above daily
    pub fn new(next_coupon_date: NaiveDate, frequency: u32) -> Option<Self> {
        if frequency == 0 || frequency > MAX_FREQUENCY {
            return None;
        }
        Some(Self {
            anchor: next_coupon_date,
            frequency,
        })
    }

    /// Schedule from optional inputs, absent when either input is missing
    pub fn from_parts(next_coupon_date: Option<NaiveDate>, frequency: Option<u32>) -> Option<Self> {
        Self::new(next_coupon_date?, frequency?)
    }

    /// Fractional coupon period in days
    pub fn step_days(&self) -> f64 {
        DAYS_PER_YEAR / self.frequency as f64
    }

    /// The k-th coupon date after the anchor (k = 0 is the anchor itself)
    pub fn nth(&self, k: u32) -> NaiveDate {
        let offset = (k as f64 * self.step_days()).floor() as i64;
        self.anchor + Duration::days(offset)
    }

    /// Coupon dates in `[as_of, horizon]`, strictly increasing
    pub fn dates_between(&self, as_of: NaiveDate, horizon: NaiveDate) -> CouponDates {
        CouponDates {
            schedule: *self,
            k: 0,
            as_of,
            horizon,
        }
    }

    /// Coupon date preceding the anchor
    pub fn previous_coupon_date(&self) -> NaiveDate {
        self.anchor - Duration::days(self.step_days().floor() as i64)
    }
}

/// Iterator over projected coupon dates
#[derive(Debug, Clone)]
pub struct CouponDates {
    schedule: CouponSchedule,
    k: u32,
    as_of: NaiveDate,
    horizon: NaiveDate,
}

impl Iterator for CouponDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            let date = self.schedule.nth(self.k);
            if date > self.horizon {
                return None;
            }
            self.k += 1;
            // past coupons are stepped over, never counted
            if date >= self.as_of {
                return Some(date);
            }
        }
    }
}

/// Number of coupons still to be paid up to and including the horizon
///
/// Returns 0 when the next coupon date or the frequency is unknown, and when the
/// horizon is unknown or before the next coupon.
pub fn project_coupons(
    next_coupon_date: Option<NaiveDate>,
    frequency: Option<u32>,
    horizon: Option<NaiveDate>,
    as_of: NaiveDate,
) -> u32 {
    match (CouponSchedule::from_parts(next_coupon_date, frequency), horizon) {
        (Some(schedule), Some(horizon)) => schedule.dates_between(as_of, horizon).count() as u32,
        _ => 0,
    }
}

/// Days elapsed since the coupon preceding `next_coupon_date`, floored at zero
///
/// Reporting only; yield math does not use it.
pub fn days_since_prev_coupon(
    next_coupon_date: Option<NaiveDate>,
    frequency: Option<u32>,
    as_of: NaiveDate,
) -> Days {
    CouponSchedule::from_parts(next_coupon_date, frequency)
        .map(|s| days_between(s.previous_coupon_date(), as_of).max(0))
        .unwrap_or(0)
}

//! Coupon schedule projection properties

use bond_screener::schedule::{days_since_prev_coupon, project_coupons, CouponSchedule};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

proptest! {
    #[test]
    fn dates_increase_within_window(
        frequency in 1u32..=12,
        anchor_offset in -400i64..400,
        as_of_offset in 0i64..400,
        horizon_len in 0i64..3650,
    ) {
        let anchor = base() + Duration::days(anchor_offset);
        let as_of = base() + Duration::days(as_of_offset);
        let horizon = anchor.max(as_of) + Duration::days(horizon_len);
        let schedule = CouponSchedule::new(anchor, frequency).unwrap();

        let dates: Vec<NaiveDate> = schedule.dates_between(as_of, horizon).collect();
        prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(dates.iter().all(|d| *d >= as_of && *d <= horizon));
        prop_assert_eq!(
            project_coupons(Some(anchor), Some(frequency), Some(horizon), as_of) as usize,
            dates.len()
        );
    }

    #[test]
    fn unknown_schedule_projects_nothing(
        frequency in 1u32..=12,
        horizon_len in 0i64..3650,
    ) {
        let horizon = Some(base() + Duration::days(horizon_len));
        prop_assert_eq!(project_coupons(None, Some(frequency), horizon, base()), 0);
        prop_assert_eq!(project_coupons(Some(base()), None, horizon, base()), 0);
        prop_assert_eq!(project_coupons(Some(base()), Some(0), horizon, base()), 0);
    }

    #[test]
    fn days_since_previous_coupon_is_never_negative(
        frequency in 1u32..=12,
        anchor_offset in -400i64..400,
    ) {
        let anchor = base() + Duration::days(anchor_offset);
        prop_assert!(days_since_prev_coupon(Some(anchor), Some(frequency), base()) >= 0);
    }
}

#[test]
fn test_quarterly_schedule_to_maturity() {
    let next = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
    let maturity = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
    // 2025-02-15, 2025-05-17, 2025-08-16, 2025-11-15, 2026-02-15
    assert_eq!(project_coupons(Some(next), Some(4), Some(maturity), as_of), 5);
}

#[test]
fn test_horizon_before_next_coupon() {
    let next = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let horizon = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    assert_eq!(project_coupons(Some(next), Some(2), Some(horizon), base()), 0);
}

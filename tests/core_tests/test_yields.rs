//! Full and legacy yield models

use approx::assert_relative_eq;
use bond_screener::bond::BondFacts;
use bond_screener::finance::{
    compute_legacy_yield, compute_yield, CommissionPolicy, YieldInputs, YieldSelector,
};
use proptest::prelude::*;

fn bond(face: f64, price: f64, coupon: f64, accrued: Option<f64>) -> BondFacts {
    let mut facts = BondFacts::new("YIELD");
    facts.initial_face_value = Some(face);
    facts.price = Some(price);
    facts.coupon_value = Some(coupon);
    facts.accrued_interest = accrued;
    facts.coupon_frequency = Some(2);
    facts
}

fn has_two_decimals(x: f64) -> bool {
    ((x * 100.0).round() - x * 100.0).abs() < 1e-6
}

#[test]
fn test_reference_scenario() {
    let result = compute_yield(
        &bond(1000.0, 98.0, 35.0, Some(12.0)),
        4,
        Some(200),
        &CommissionPolicy::default(),
    )
    .unwrap();

    assert_relative_eq!(result.total_percent, 12.88);
    // annualized from the unrounded total: 23.504.. rounds to 23.5
    assert_relative_eq!(result.annualized_percent, 23.5);
    assert_relative_eq!(result.monthly_percent, 1.93);
}

#[test]
fn test_custom_policy() {
    let policy = CommissionPolicy::new(0.0, 1.0).unwrap();
    // (1000 - 1000) + 50 - 0 + 50 = 100 on 1000
    let result = compute_yield(&bond(1000.0, 100.0, 50.0, Some(0.0)), 2, Some(365), &policy).unwrap();
    assert_relative_eq!(result.total_percent, 10.0);
    assert_relative_eq!(result.annualized_percent, 10.0);
}

#[test]
fn test_invalid_policy_rejected() {
    assert!(CommissionPolicy::new(-1.0, 0.87).is_err());
    assert!(CommissionPolicy::new(2.94, 1.5).is_err());
}

#[test]
fn test_selector_chain() {
    let selector = YieldSelector::default();
    let mut facts = bond(1000.0, 98.0, 35.0, Some(12.0));
    facts.market_yield = Some(14.0);

    let full = YieldInputs {
        facts: &facts,
        remaining_coupons: 4,
        finish_days: Some(200),
    };
    assert_eq!(selector.select(&full).unwrap().model(), "full");

    facts.price = None;
    let degraded = YieldInputs {
        facts: &facts,
        remaining_coupons: 4,
        finish_days: Some(200),
    };
    let estimate = selector.select(&degraded).unwrap();
    assert_eq!(estimate.model(), "legacy");
    assert_eq!(
        estimate.total_percent(),
        compute_legacy_yield(Some(14.0), Some(200), 0.87).total_percent
    );
}

proptest! {
    #[test]
    fn zero_price_is_never_computed(
        coupon in 0.0f64..200.0,
        coupons in 0u32..40,
        days in 1i64..5000,
    ) {
        let facts = bond(1000.0, 0.0, coupon, Some(1.0));
        prop_assert!(compute_yield(&facts, coupons, Some(days), &CommissionPolicy::default()).is_none());
    }

    #[test]
    fn short_life_has_no_monthly_figure(
        price in 50.0f64..150.0,
        coupon in 0.0f64..100.0,
        days in 1i64..=30,
    ) {
        let facts = bond(1000.0, price, coupon, None);
        let result = compute_yield(&facts, 1, Some(days), &CommissionPolicy::default()).unwrap();
        prop_assert_eq!(result.monthly_percent, 0.0);
    }

    #[test]
    fn outputs_are_rounded_to_cents(
        price in 50.0f64..150.0,
        coupon in 0.0f64..100.0,
        accrued in 0.0f64..50.0,
        coupons in 1u32..20,
        days in 1i64..5000,
        market_yield in 0.0f64..40.0,
    ) {
        let facts = bond(1000.0, price, coupon, Some(accrued));
        let result = compute_yield(&facts, coupons, Some(days), &CommissionPolicy::default()).unwrap();
        prop_assert!(has_two_decimals(result.total_percent));
        prop_assert!(has_two_decimals(result.annualized_percent));
        prop_assert!(has_two_decimals(result.monthly_percent));

        let legacy = compute_legacy_yield(Some(market_yield), Some(days), 0.87);
        prop_assert!(has_two_decimals(legacy.total_percent));
        prop_assert!(has_two_decimals(legacy.monthly_percent));
    }
}

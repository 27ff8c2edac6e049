//! Collection summary and ranked reports

use bond_screener::analytics::snapshot::{
    tier_count_key, tier_median_price_key, tier_median_yield_key, yield_at_least_key,
    NEAR_TERM_MEDIAN_PRICE, NEAR_TERM_MEDIAN_YIELD, QUALIFIED_ONLY, TOTAL, TRADED,
};
use bond_screener::analytics::{summarize, BondFrame, ReportKind};
use bond_screener::bond::{BondFacts, ListLevel};
use bond_screener::enrich::EnrichedBond;
use chrono::{Duration, NaiveDate};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn bond(secid: &str, price: f64, yld: f64) -> EnrichedBond {
    let mut facts = BondFacts::new(secid);
    facts.price = Some(price);
    facts.market_yield = Some(yld);
    facts.is_traded = Some(true);
    facts.is_qualified_only = Some(false);
    EnrichedBond::unenriched(facts)
}

fn maturing(mut bond: EnrichedBond, level: i64, days: i64) -> EnrichedBond {
    bond.facts.list_level = ListLevel::new(level);
    bond.facts.maturity_date = Some(as_of() + Duration::days(days));
    bond
}

#[test]
fn test_empty_collection_snapshot() {
    let snapshot = summarize(&BondFrame::new(Vec::new(), as_of()));
    assert!(snapshot.is_empty());
    assert!(snapshot.len() > 0);
    assert!(snapshot.iter().all(|(_, v)| v == 0.0));
}

#[test]
fn test_missing_list_level_only_zeroes_tier_statistics() {
    let bonds = vec![bond("A", 99.0, 12.0), bond("B", 101.0, 7.0), bond("C", 85.0, 20.0)];
    let snapshot = summarize(&BondFrame::new(bonds, as_of()));

    assert!(!snapshot.is_empty());
    for level in [ListLevel::FIRST, ListLevel::SECOND, ListLevel::THIRD] {
        assert_eq!(snapshot.get(&tier_count_key(level)), Some(0.0));
        assert_eq!(snapshot.get(&tier_median_yield_key(level)), Some(0.0));
        assert_eq!(snapshot.get(&tier_median_price_key(level)), Some(0.0));
    }
    assert_eq!(snapshot.get(TOTAL), Some(3.0));
    assert_eq!(snapshot.get(TRADED), Some(3.0));
    assert_eq!(snapshot.get(QUALIFIED_ONLY), Some(0.0));
    assert_eq!(snapshot.get(&yield_at_least_key(11.0)), Some(2.0));
    // no maturity dates at all
    assert_eq!(snapshot.get(NEAR_TERM_MEDIAN_PRICE), Some(0.0));
}

#[test]
fn test_near_term_statistics() {
    let bonds = vec![
        maturing(bond("A", 96.0, 10.0), 1, 30),
        maturing(bond("B", 98.0, 12.0), 2, 200),
        maturing(bond("C", 100.0, 14.0), 3, 364),
        maturing(bond("D", 50.0, 40.0), 3, 365),
        maturing(bond("E", 50.0, 40.0), 3, -5),
    ];
    let snapshot = summarize(&BondFrame::new(bonds, as_of()));
    assert_eq!(snapshot.get(NEAR_TERM_MEDIAN_PRICE), Some(98.0));
    assert_eq!(snapshot.get(NEAR_TERM_MEDIAN_YIELD), Some(12.0));
}

#[test]
fn test_low_price_report_scenario() {
    let frame = BondFrame::new(
        vec![bond("A", 85.0, 5.0), bond("B", 95.0, 3.0), bond("C", 88.0, 9.0)],
        as_of(),
    );
    let rows = frame.report(ReportKind::LowestPrice, 90.0);
    let picked: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.price().unwrap(), r.yield_percent().unwrap()))
        .collect();
    assert_eq!(picked, vec![(88.0, 9.0), (85.0, 5.0)]);
}

#[test]
fn test_near_term_discount_scenario() {
    let frame = BondFrame::new(
        vec![
            maturing(bond("A", 80.0, 9.0), 1, 100),
            maturing(bond("B", 90.0, 9.0), 2, 100),
            maturing(bond("C", 100.0, 9.0), 1, 100),
        ],
        as_of(),
    );
    let rows = frame.report(ReportKind::NearTermDiscount, 90.0);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bond.secid(), "A");
}

#[test]
fn test_reports_without_required_columns() {
    let mut facts = BondFacts::new("BARE");
    facts.price = Some(70.0);
    let frame = BondFrame::new(vec![EnrichedBond::unenriched(facts)], as_of());
    for kind in ReportKind::ALL {
        assert!(frame.report(kind, 90.0).is_empty(), "{} should be empty", kind);
    }
}

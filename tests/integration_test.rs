//! End-to-end tests: raw records through enrichment, analytics and storage

mod core_tests;

use bond_screener::analytics::snapshot::{tier_count_key, TOTAL, TRADED};
use bond_screener::prelude::*;
use chrono::NaiveDate;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn raw(pairs: &[(&str, RawValue)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A small collection as the exchange would deliver it
fn collection() -> Vec<FieldMap> {
    vec![
        raw(&[
            ("secid", "RU000A1047S3".into()),
            ("shortname", "Issuer 1P1".into()),
            ("initialfacevalue", RawValue::Float(1000.0)),
            ("couponvalue", RawValue::Float(35.0)),
            ("couponpercent", RawValue::Float(7.0)),
            ("couponfrequency", RawValue::Int(2)),
            ("coupondate", "2025-03-01".into()),
            ("matdate", "2026-12-31".into()),
            ("price", RawValue::Float(98.0)),
            ("yieldsec", RawValue::Float(9.1)),
            ("listlevel", RawValue::Int(1)),
            ("is_traded", RawValue::Int(1)),
            ("faceunit", "SUR".into()),
        ]),
        raw(&[
            ("secid", "RU000A105SK4".into()),
            ("initialfacevalue", "1000".into()),
            ("couponvalue", "24.93".into()),
            ("couponfrequency", "4".into()),
            ("coupondate", "2025-02-10".into()),
            ("matdate", "2025-08-10".into()),
            ("price", "87.5".into()),
            ("yieldsec", "31.4".into()),
            ("listlevel", "2".into()),
            ("is_traded", "1".into()),
            ("faceunit", "SUR".into()),
        ]),
        // garbage in every numeric field, still part of the collection
        raw(&[
            ("secid", "RU000A0JX0J2".into()),
            ("couponfrequency", "n/a".into()),
            ("price", "".into()),
            ("matdate", "0000-00-00".into()),
            ("listlevel", RawValue::Int(7)),
            ("is_traded", RawValue::Int(0)),
        ]),
    ]
}

fn enriched() -> Vec<EnrichedBond> {
    let facts: Vec<BondFacts> = collection().iter().map(|m| decode(m).facts).collect();
    Enricher::new(as_of(), CommissionPolicy::default()).enrich_all(facts)
}

#[test]
fn test_decode_reports_invalid_fields_per_record() {
    let decoded: Vec<Decoded> = collection().iter().map(decode).collect();
    assert!(decoded[0].is_clean());
    assert!(decoded[1].is_clean());

    let broken = &decoded[2];
    let fields: Vec<&str> = broken.issues.iter().map(|i| i.field).collect();
    assert_eq!(fields, vec!["coupon_frequency", "list_level"]);
    assert_eq!(broken.facts.price, None);
    assert_eq!(broken.facts.maturity_date, None);
    assert_eq!(broken.facts.is_traded, Some(false));
}

#[test]
fn test_enrichment_isolates_bad_records() {
    let bonds = enriched();
    assert_eq!(bonds.len(), 3);

    let good = &bonds[0];
    assert_eq!(good.derived.remaining_coupons, 4);
    assert!(good.derived.calc_yield.is_some());
    assert_eq!(good.derived.yield_source, Some(YieldSource::Full));

    let quarterly = &bonds[1];
    // 2025-02-10 and 2025-05-12; the next step lands on 2025-08-11
    assert_eq!(quarterly.derived.remaining_coupons, 2);
    assert!(quarterly.derived.calc_yield.unwrap() > good.derived.calc_yield.unwrap());

    let broken = &bonds[2];
    assert_eq!(broken.derived.remaining_coupons, 0);
    assert_eq!(broken.derived.calc_yield, None);
    assert_eq!(broken.derived.yield_source, None);
}

#[test]
fn test_summary_and_reports_over_enriched_collection() {
    let frame = BondFrame::new(enriched(), as_of());
    let snapshot = summarize(&frame);

    assert!(!snapshot.is_empty());
    assert_eq!(snapshot.get(TOTAL), Some(3.0));
    assert_eq!(snapshot.get(TRADED), Some(2.0));
    assert_eq!(snapshot.get(&tier_count_key(ListLevel::FIRST)), Some(1.0));
    assert_eq!(snapshot.get(&tier_count_key(ListLevel::SECOND)), Some(1.0));

    let cheap = frame.report(ReportKind::LowestPrice, 90.0);
    assert_eq!(cheap.len(), 1);
    assert_eq!(cheap[0].bond.secid(), "RU000A105SK4");

    // a lone near-term bond is never above its own median
    let yieldest = frame.report(ReportKind::NearTermHighYield, 90.0);
    assert!(yieldest.is_empty());
}

#[test]
fn test_store_roundtrip_keeps_derived_fields() {
    let mut store = InMemoryBondStore::new();
    let stamp = as_of().and_hms_opt(10, 0, 0).unwrap();
    for bond in enriched() {
        store.save(&bond, stamp).unwrap();
    }

    let loaded = store.load_all().unwrap();
    let mut expected = enriched();
    expected.sort_by(|a, b| a.secid().cmp(b.secid()));
    assert_eq!(loaded, expected);

    let frame = BondFrame::new(loaded, as_of());
    assert_eq!(summarize(&frame).get(TOTAL), Some(3.0));
}

//! Bond store behavior over an on-disk SQLite database

#![cfg(feature = "rusqlite-support")]

use bond_screener::enrich::Enricher;
use bond_screener::finance::CommissionPolicy;
use bond_screener::store::{BondStore, InMemoryBondStore, SqliteBondStore};
use bond_screener::types::{FieldMap, RawValue};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn row(pairs: &[(&str, RawValue)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn listing(secid: &str, traded: bool) -> FieldMap {
    row(&[
        ("secid", RawValue::from(secid)),
        ("shortname", RawValue::from(format!("{} 1P", secid))),
        ("is_traded", RawValue::Int(traded as i64)),
    ])
}

fn open(dir: &TempDir) -> SqliteBondStore {
    SqliteBondStore::new(&dir.path().join("bonds.db")).unwrap()
}

/// Both stores must agree on every observable behavior
fn exercise(store: &mut impl BondStore) {
    for (secid, traded) in [("B", true), ("A", true), ("C", false)] {
        assert!(store.upsert_listing(&listing(secid, traded)).unwrap().inserted);
    }
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.count_stale(at(2, 0)).unwrap(), 2);
    assert_eq!(store.next_stale(at(2, 0)).unwrap().as_deref(), Some("A"));

    let specs = row(&[
        ("initialfacevalue", RawValue::from("1000")),
        ("couponvalue", RawValue::Float(35.0)),
        ("couponfrequency", RawValue::Int(2)),
        ("coupondate", RawValue::from("2025-03-01")),
        ("matdate", RawValue::from("2026-12-31")),
        ("price", RawValue::Float(98.0)),
        ("faceunit", RawValue::from("SUR")),
    ]);
    let mut record = store.get("A").unwrap().unwrap();
    let issues = bond_screener::fields::merge(&mut record.bond.facts, &specs);
    assert!(issues.is_empty());
    let bond = Enricher::new(at(1, 0).date(), CommissionPolicy::default()).enrich(record.bond.facts);
    store.save(&bond, at(1, 12)).unwrap();

    assert_eq!(store.next_stale(at(2, 0)).unwrap().as_deref(), Some("B"));
    // A is fresh relative to an earlier cutoff
    assert_eq!(store.count_stale(at(1, 6)).unwrap(), 1);

    // a later listing page keeps specs and the refresh stamp
    let outcome = store.upsert_listing(&listing("A", true)).unwrap();
    assert!(!outcome.inserted);
    let stored = store.get("A").unwrap().unwrap();
    assert_eq!(stored.updated, Some(at(1, 12)));
    assert_eq!(stored.bond, bond);
    assert_eq!(stored.bond.derived.remaining_coupons, 4);

    let all = store.load_all().unwrap();
    let ids: Vec<&str> = all.iter().map(|b| b.secid()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);

    assert_eq!(store.reset_updated().unwrap(), 3);
    assert_eq!(store.count_stale(at(1, 6)).unwrap(), 2);
}

#[test]
fn test_sqlite_store_behavior() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);
    exercise(&mut store);
}

#[test]
fn test_in_memory_store_behavior() {
    let mut store = InMemoryBondStore::new();
    exercise(&mut store);
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = open(&dir);
        store.upsert_listing(&listing("RU000A1047S3", true)).unwrap();
        let record = store.get("RU000A1047S3").unwrap().unwrap();
        store.save(&record.bond, at(3, 8)).unwrap();
    }

    let store = open(&dir);
    let record = store.get("RU000A1047S3").unwrap().unwrap();
    assert_eq!(record.updated, Some(at(3, 8)));
    assert_eq!(record.bond.facts.shortname.as_deref(), Some("RU000A1047S3 1P"));
    assert_eq!(record.bond.facts.is_traded, Some(true));
}

#[test]
fn test_invalid_listing_fields_are_reported_not_stored() {
    let mut store = InMemoryBondStore::new();
    let outcome = store
        .upsert_listing(&row(&[
            ("secid", RawValue::from("X")),
            ("price", RawValue::from("n/a")),
            ("listlevel", RawValue::Int(2)),
        ]))
        .unwrap();
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.issues[0].field, "price");

    let facts = store.get("X").unwrap().unwrap().bond.facts;
    assert_eq!(facts.price, None);
    assert_eq!(facts.list_level.map(|l| l.get()), Some(2));
}

#[test]
fn test_listing_row_without_secid() {
    let mut store = InMemoryBondStore::new();
    let err = store
        .upsert_listing(&row(&[("shortname", RawValue::from("anonymous"))]))
        .unwrap_err();
    assert!(err.is_record_fault());
    assert_eq!(store.count().unwrap(), 0);
}

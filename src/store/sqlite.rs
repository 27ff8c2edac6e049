//! SQLite bond store

use super::{BondStore, StoredBond, TIMESTAMP_FORMAT};
use crate::bond::{BondFacts, CouponKind, ListLevel};
use crate::enrich::{Derived, EnrichedBond, YieldSource};
use crate::error::{BondError, Result};
use crate::types::{Secid, DATE_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const COLUMNS: &str = "secid, shortname, face_value, initial_face_value, coupon_value, coupon_percent,
    coupon_frequency, next_coupon_date, buyback_date, maturity_date, accrued_interest, price,
    market_yield, is_qualified_only, list_level, is_traded, face_unit, issue_date, trade_date,
    volume, coupon_kind, remaining_coupons, days_to_buyback, days_to_coupon, days_to_finish,
    horizon_days, accrued_filled, days_since_prev_coupon, calc_yield, total_percent,
    month_percent, legacy_total_percent, legacy_month_percent, yield_source, updated";

/// Bond store backed by a SQLite file
pub struct SqliteBondStore {
    conn: Connection,
}

impl SqliteBondStore {
    /// Create or open the database at path
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| BondError::StorageError(format!("Failed to open database: {}", e)))?;

        let mut store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    /// Create in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            BondError::StorageError(format!("Failed to create in-memory database: {}", e))
        })?;

        let mut store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    pub fn create_tables(&mut self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS bonds (
                    secid TEXT PRIMARY KEY,
                    shortname TEXT,
                    face_value REAL,
                    initial_face_value REAL,
                    coupon_value REAL,
                    coupon_percent REAL,
                    coupon_frequency INTEGER,
                    next_coupon_date TEXT,
                    buyback_date TEXT,
                    maturity_date TEXT,
                    accrued_interest REAL,
                    price REAL,
                    market_yield REAL,
                    is_qualified_only INTEGER,
                    list_level INTEGER,
                    is_traded INTEGER,
                    face_unit TEXT,
                    issue_date TEXT,
                    trade_date TEXT,
                    volume REAL,
                    coupon_kind TEXT,
                    remaining_coupons INTEGER NOT NULL DEFAULT 0,
                    days_to_buyback INTEGER,
                    days_to_coupon INTEGER,
                    days_to_finish INTEGER,
                    horizon_days INTEGER,
                    accrued_filled REAL,
                    days_since_prev_coupon INTEGER NOT NULL DEFAULT 0,
                    calc_yield REAL,
                    total_percent REAL,
                    month_percent REAL,
                    legacy_total_percent REAL NOT NULL DEFAULT 0,
                    legacy_month_percent REAL NOT NULL DEFAULT 0,
                    yield_source TEXT,
                    updated TEXT
                )",
                [],
            )
            .map_err(|e| BondError::StorageError(format!("Failed to create bonds table: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_traded_updated ON bonds(is_traded, updated)",
                [],
            )
            .map_err(|e| BondError::StorageError(format!("Failed to create updated index: {}", e)))?;

        Ok(())
    }

    fn read_record(row: &Row<'_>) -> rusqlite::Result<StoredBond> {
        let date = |idx: usize| -> rusqlite::Result<Option<NaiveDate>> {
            Ok(row
                .get::<_, Option<String>>(idx)?
                .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()))
        };

        let facts = BondFacts {
            secid: row.get(0)?,
            shortname: row.get(1)?,
            face_value: row.get(2)?,
            initial_face_value: row.get(3)?,
            coupon_value: row.get(4)?,
            coupon_percent: row.get(5)?,
            coupon_frequency: row.get(6)?,
            next_coupon_date: date(7)?,
            buyback_date: date(8)?,
            maturity_date: date(9)?,
            accrued_interest: row.get(10)?,
            price: row.get(11)?,
            market_yield: row.get(12)?,
            is_qualified_only: row.get(13)?,
            list_level: row.get::<_, Option<i64>>(14)?.and_then(ListLevel::new),
            is_traded: row.get(15)?,
            face_unit: row.get(16)?,
            issue_date: date(17)?,
            trade_date: date(18)?,
            volume: row.get(19)?,
            coupon_kind: row
                .get::<_, Option<String>>(20)?
                .and_then(|s| CouponKind::parse(&s)),
        };

        let derived = Derived {
            remaining_coupons: row.get(21)?,
            days_to_buyback: row.get(22)?,
            days_to_coupon: row.get(23)?,
            days_to_finish: row.get(24)?,
            horizon_days: row.get(25)?,
            accrued_interest: row.get(26)?,
            days_since_prev_coupon: row.get(27)?,
            calc_yield: row.get(28)?,
            total_percent: row.get(29)?,
            month_percent: row.get(30)?,
            legacy_total_percent: row.get(31)?,
            legacy_month_percent: row.get(32)?,
            yield_source: row
                .get::<_, Option<String>>(33)?
                .and_then(|s| YieldSource::parse(&s)),
        };

        let updated = row
            .get::<_, Option<String>>(34)?
            .and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok());

        Ok(StoredBond {
            bond: EnrichedBond { facts, derived },
            updated,
        })
    }
}

fn fmt_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn fmt_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

impl BondStore for SqliteBondStore {
    fn get(&self, secid: &str) -> Result<Option<StoredBond>> {
        let query = format!("SELECT {} FROM bonds WHERE secid = ?1", COLUMNS);
        self.conn
            .query_row(&query, params![secid], Self::read_record)
            .optional()
            .map_err(|e| BondError::StorageError(format!("Failed to get bond {}: {}", secid, e)))
    }

    fn put(&mut self, record: &StoredBond) -> Result<()> {
        let f = &record.bond.facts;
        let d = &record.bond.derived;
        let query = format!(
            "INSERT OR REPLACE INTO bonds ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
             ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
             ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35)",
            COLUMNS
        );

        self.conn
            .execute(
                &query,
                params![
                    &f.secid,
                    &f.shortname,
                    f.face_value,
                    f.initial_face_value,
                    f.coupon_value,
                    f.coupon_percent,
                    f.coupon_frequency,
                    fmt_date(f.next_coupon_date),
                    fmt_date(f.buyback_date),
                    fmt_date(f.maturity_date),
                    f.accrued_interest,
                    f.price,
                    f.market_yield,
                    f.is_qualified_only,
                    f.list_level.map(|l| l.get() as i64),
                    f.is_traded,
                    &f.face_unit,
                    fmt_date(f.issue_date),
                    fmt_date(f.trade_date),
                    f.volume,
                    f.coupon_kind.map(|k| k.as_str()),
                    d.remaining_coupons,
                    d.days_to_buyback,
                    d.days_to_coupon,
                    d.days_to_finish,
                    d.horizon_days,
                    d.accrued_interest,
                    d.days_since_prev_coupon,
                    d.calc_yield,
                    d.total_percent,
                    d.month_percent,
                    d.legacy_total_percent,
                    d.legacy_month_percent,
                    d.yield_source.map(|s| s.as_str()),
                    record.updated.map(fmt_timestamp),
                ],
            )
            .map_err(|e| BondError::StorageError(format!("Failed to save bond {}: {}", f.secid, e)))?;

        Ok(())
    }

    fn load_all(&self) -> Result<Vec<EnrichedBond>> {
        let query = format!("SELECT {} FROM bonds ORDER BY secid", COLUMNS);
        let mut stmt = self
            .conn
            .prepare(&query)
            .map_err(|e| BondError::StorageError(format!("Failed to prepare query: {}", e)))?;

        let bonds = stmt
            .query_map([], Self::read_record)
            .map_err(|e| BondError::StorageError(format!("Failed to query bonds: {}", e)))?
            .map(|r| r.map(|record| record.bond))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BondError::StorageError(format!("Failed to collect bonds: {}", e)))?;

        debug!("Loaded {} bonds", bonds.len());
        Ok(bonds)
    }

    fn next_stale(&self, older_than: NaiveDateTime) -> Result<Option<Secid>> {
        self.conn
            .query_row(
                "SELECT secid FROM bonds
                 WHERE is_traded = 1 AND (updated IS NULL OR updated < ?1)
                 ORDER BY updated IS NOT NULL, updated, secid
                 LIMIT 1",
                params![fmt_timestamp(older_than)],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| BondError::StorageError(format!("Failed to find stale bond: {}", e)))
    }

    fn count_stale(&self, older_than: NaiveDateTime) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM bonds WHERE is_traded = 1 AND (updated IS NULL OR updated < ?1)",
                params![fmt_timestamp(older_than)],
                |row| row.get(0),
            )
            .map_err(|e| BondError::StorageError(format!("Failed to count stale bonds: {}", e)))?;
        Ok(count as usize)
    }

    fn reset_updated(&mut self) -> Result<usize> {
        let touched = self
            .conn
            .execute("UPDATE bonds SET updated = NULL", [])
            .map_err(|e| BondError::StorageError(format!("Failed to reset updated: {}", e)))?;
        Ok(touched)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM bonds", [], |row| row.get(0))
            .map_err(|e| BondError::StorageError(format!("Failed to count bonds: {}", e)))?;
        Ok(count as usize)
    }
}

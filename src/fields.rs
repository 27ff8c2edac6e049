//! Field-by-field decode of raw market data into [`BondFacts`]
//!
//! Every recognized field is declared once with the keys it may arrive under
//! (exchange names first, canonical names second). Each value is converted on
//! its own: a value that cannot be converted is reported as [`FieldStatus::Invalid`]
//! and left absent in the facts, it never aborts the decode of the other fields.

use crate::bond::{BondFacts, CouponKind, ListLevel};
use crate::schedule::MAX_FREQUENCY;
use crate::types::{FieldMap, RawValue, DATE_FORMAT};
use chrono::NaiveDate;
use log::debug;

/// Outcome of decoding one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldStatus<T> {
    Present(T),
    Absent,
    Invalid { raw: String, reason: String },
}

impl<T> FieldStatus<T> {
    pub fn present(self) -> Option<T> {
        match self {
            FieldStatus::Present(v) => Some(v),
            _ => None,
        }
    }
}

/// A field value that could not be converted
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub raw: String,
    pub reason: String,
}

/// Decoded facts plus the fields that were present but invalid
#[derive(Debug, Clone)]
pub struct Decoded {
    pub facts: BondFacts,
    pub issues: Vec<FieldIssue>,
}

impl Decoded {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

// Recognized keys, exchange name first
pub const SECID: &[&str] = &["secid"];
pub const SHORTNAME: &[&str] = &["shortname"];
pub const FACE_VALUE: &[&str] = &["facevalue", "face_value"];
pub const INITIAL_FACE_VALUE: &[&str] = &["initialfacevalue", "initial_face_value"];
pub const COUPON_VALUE: &[&str] = &["couponvalue", "coupon_value"];
pub const COUPON_PERCENT: &[&str] = &["couponpercent", "coupon_percent"];
pub const COUPON_FREQUENCY: &[&str] = &["couponfrequency", "coupon_frequency"];
pub const NEXT_COUPON_DATE: &[&str] = &["coupondate", "next_coupon_date"];
pub const BUYBACK_DATE: &[&str] = &["buybackdate", "buyback_date"];
pub const MATURITY_DATE: &[&str] = &["matdate", "maturity_date"];
pub const ACCRUED_INTEREST: &[&str] = &["accruedint", "accrued_interest"];
pub const PRICE: &[&str] = &["price"];
pub const MARKET_YIELD: &[&str] = &["yieldsec", "market_yield"];
pub const QUALIFIED_ONLY: &[&str] = &["isqualifiedinvestors", "is_qualified_only"];
pub const LIST_LEVEL: &[&str] = &["listlevel", "list_level"];
pub const IS_TRADED: &[&str] = &["is_traded"];
pub const FACE_UNIT: &[&str] = &["faceunit", "face_unit"];
pub const ISSUE_DATE: &[&str] = &["issuedate", "issue_date"];
pub const TRADE_DATE: &[&str] = &["tradedate", "trade_date"];
pub const VOLUME: &[&str] = &["volume"];
pub const COUPON_KIND: &[&str] = &["bondtype", "coupon_kind"];

/// Placeholder the exchange uses for "no date"
const NULL_DATE: &str = "0000-00-00";

/// Decode a raw field map into typed bond facts
pub fn decode(map: &FieldMap) -> Decoded {
    let mut d = Decoder {
        map,
        issues: Vec::new(),
    };

    let facts = BondFacts {
        secid: d.field("secid", SECID, text).unwrap_or_default(),
        shortname: d.field("shortname", SHORTNAME, text),
        face_value: d.field("face_value", FACE_VALUE, float),
        initial_face_value: d.field("initial_face_value", INITIAL_FACE_VALUE, float),
        coupon_value: d.field("coupon_value", COUPON_VALUE, float),
        coupon_percent: d.field("coupon_percent", COUPON_PERCENT, float),
        coupon_frequency: d.field("coupon_frequency", COUPON_FREQUENCY, frequency),
        next_coupon_date: d.field("next_coupon_date", NEXT_COUPON_DATE, date),
        buyback_date: d.field("buyback_date", BUYBACK_DATE, date),
        maturity_date: d.field("maturity_date", MATURITY_DATE, date),
        accrued_interest: d.field("accrued_interest", ACCRUED_INTEREST, float),
        price: d.field("price", PRICE, float),
        market_yield: d.field("market_yield", MARKET_YIELD, float),
        is_qualified_only: d.field("is_qualified_only", QUALIFIED_ONLY, boolean),
        list_level: d.field("list_level", LIST_LEVEL, list_level),
        is_traded: d.field("is_traded", IS_TRADED, boolean),
        face_unit: d.field("face_unit", FACE_UNIT, text),
        issue_date: d.field("issue_date", ISSUE_DATE, date),
        trade_date: d.field("trade_date", TRADE_DATE, date),
        volume: d.field("volume", VOLUME, float),
        coupon_kind: d.field("coupon_kind", COUPON_KIND, coupon_kind),
    };

    if !d.issues.is_empty() {
        debug!("{}: {} invalid field(s)", facts.secid, d.issues.len());
    }

    Decoded {
        facts,
        issues: d.issues,
    }
}

/// Overlay the fields carried by `map` onto existing facts
///
/// A key missing from `map` keeps its previous value, so a partial refresh (for
/// example a listing page without prices) never erases known data. A key that
/// is present but blank (null, empty, `0000-00-00`) clears the value: the
/// exchange no longer reports it. Invalid values keep the previous value and
/// are returned as issues.
pub fn merge(facts: &mut BondFacts, map: &FieldMap) -> Vec<FieldIssue> {
    let Decoded { facts: new, issues } = decode(map);
    let carried = |keys: &[&str]| keys.iter().any(|k| map.contains_key(*k));
    let invalid = |name: &str| issues.iter().any(|i| i.field == name);

    macro_rules! overlay {
        ($($field:ident => $keys:expr),* $(,)?) => {
            $(
                if new.$field.is_some() {
                    facts.$field = new.$field;
                } else if carried($keys) && !invalid(stringify!($field)) {
                    facts.$field = None;
                }
            )*
        };
    }

    if !new.secid.is_empty() {
        facts.secid = new.secid;
    }
    overlay!(
        shortname => SHORTNAME,
        face_value => FACE_VALUE,
        initial_face_value => INITIAL_FACE_VALUE,
        coupon_value => COUPON_VALUE,
        coupon_percent => COUPON_PERCENT,
        coupon_frequency => COUPON_FREQUENCY,
        next_coupon_date => NEXT_COUPON_DATE,
        buyback_date => BUYBACK_DATE,
        maturity_date => MATURITY_DATE,
        accrued_interest => ACCRUED_INTEREST,
        price => PRICE,
        market_yield => MARKET_YIELD,
        is_qualified_only => QUALIFIED_ONLY,
        list_level => LIST_LEVEL,
        is_traded => IS_TRADED,
        face_unit => FACE_UNIT,
        issue_date => ISSUE_DATE,
        trade_date => TRADE_DATE,
        volume => VOLUME,
        coupon_kind => COUPON_KIND,
    );

    issues
}

/// Just the identifier of a raw record
pub fn decode_secid(map: &FieldMap) -> Option<String> {
    SECID
        .iter()
        .find_map(|k| map.get(*k))
        .and_then(|raw| text(raw).present())
}

struct Decoder<'a> {
    map: &'a FieldMap,
    issues: Vec<FieldIssue>,
}

impl<'a> Decoder<'a> {
    fn field<T>(
        &mut self,
        name: &'static str,
        keys: &[&str],
        convert: fn(&RawValue) -> FieldStatus<T>,
    ) -> Option<T> {
        let raw = keys.iter().find_map(|k| self.map.get(*k));
        match raw.map(convert).unwrap_or(FieldStatus::Absent) {
            FieldStatus::Present(v) => Some(v),
            FieldStatus::Absent => None,
            FieldStatus::Invalid { raw, reason } => {
                self.issues.push(FieldIssue {
                    field: name,
                    raw,
                    reason,
                });
                None
            }
        }
    }
}

fn invalid<T>(raw: &RawValue, reason: &str) -> FieldStatus<T> {
    FieldStatus::Invalid {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// Text field; blank strings are absent
pub fn text(raw: &RawValue) -> FieldStatus<String> {
    match raw {
        _ if raw.is_blank() => FieldStatus::Absent,
        RawValue::Text(s) => FieldStatus::Present(s.trim().to_string()),
        other => FieldStatus::Present(other.to_string()),
    }
}

/// Float field; numeric strings are accepted
pub fn float(raw: &RawValue) -> FieldStatus<f64> {
    let value = match raw {
        _ if raw.is_blank() => return FieldStatus::Absent,
        RawValue::Float(x) => *x,
        RawValue::Int(i) => *i as f64,
        RawValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(x) => x,
            Err(_) => return invalid(raw, "not a number"),
        },
        RawValue::Bool(_) => return invalid(raw, "expected a number"),
        RawValue::Null => return FieldStatus::Absent,
    };
    if value.is_finite() {
        FieldStatus::Present(value)
    } else {
        invalid(raw, "not a finite number")
    }
}

/// Integer field; integral floats and numeric strings are accepted
pub fn integer(raw: &RawValue) -> FieldStatus<i64> {
    match raw {
        _ if raw.is_blank() => FieldStatus::Absent,
        RawValue::Int(i) => FieldStatus::Present(*i),
        RawValue::Float(x) if x.fract() == 0.0 && x.is_finite() => FieldStatus::Present(*x as i64),
        RawValue::Text(s) => match s.trim().parse::<i64>() {
            Ok(i) => FieldStatus::Present(i),
            Err(_) => match float(raw) {
                FieldStatus::Present(x) if x.fract() == 0.0 => FieldStatus::Present(x as i64),
                _ => invalid(raw, "not an integer"),
            },
        },
        _ => invalid(raw, "not an integer"),
    }
}

/// Coupon frequency: positive payments per year, zero counts as absent
pub fn frequency(raw: &RawValue) -> FieldStatus<u32> {
    match integer(raw) {
        FieldStatus::Present(0) => FieldStatus::Absent,
        FieldStatus::Present(n) if n > 0 && n <= MAX_FREQUENCY as i64 => FieldStatus::Present(n as u32),
        FieldStatus::Present(_) => invalid(raw, "frequency out of range"),
        FieldStatus::Absent => FieldStatus::Absent,
        FieldStatus::Invalid { raw, reason } => FieldStatus::Invalid { raw, reason },
    }
}

/// `YYYY-MM-DD` date; the exchange's `0000-00-00` placeholder is absent
pub fn date(raw: &RawValue) -> FieldStatus<NaiveDate> {
    match raw {
        _ if raw.is_blank() => FieldStatus::Absent,
        RawValue::Text(s) => {
            let s = s.trim();
            if s == NULL_DATE {
                return FieldStatus::Absent;
            }
            // ISS sometimes sends a timestamp; the date part is enough
            let day = s.get(..10).unwrap_or(s);
            match NaiveDate::parse_from_str(day, DATE_FORMAT) {
                Ok(d) => FieldStatus::Present(d),
                Err(_) => invalid(raw, "expected YYYY-MM-DD"),
            }
        }
        _ => invalid(raw, "expected a date string"),
    }
}

/// Boolean flag; accepts `true/false`, `1/0` and their string forms
pub fn boolean(raw: &RawValue) -> FieldStatus<bool> {
    match raw {
        _ if raw.is_blank() => FieldStatus::Absent,
        RawValue::Bool(b) => FieldStatus::Present(*b),
        RawValue::Int(0) => FieldStatus::Present(false),
        RawValue::Int(1) => FieldStatus::Present(true),
        RawValue::Float(x) if *x == 0.0 => FieldStatus::Present(false),
        RawValue::Float(x) if *x == 1.0 => FieldStatus::Present(true),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => FieldStatus::Present(true),
            "0" | "false" => FieldStatus::Present(false),
            _ => invalid(raw, "expected a boolean"),
        },
        _ => invalid(raw, "expected a boolean"),
    }
}

fn list_level(raw: &RawValue) -> FieldStatus<ListLevel> {
    match integer(raw) {
        FieldStatus::Present(n) => match ListLevel::new(n) {
            Some(level) => FieldStatus::Present(level),
            None => invalid(raw, "listing tier must be 1, 2 or 3"),
        },
        FieldStatus::Absent => FieldStatus::Absent,
        FieldStatus::Invalid { raw, reason } => FieldStatus::Invalid { raw, reason },
    }
}

fn coupon_kind(raw: &RawValue) -> FieldStatus<CouponKind> {
    match text(raw) {
        FieldStatus::Present(s) => match CouponKind::parse(&s) {
            Some(kind) => FieldStatus::Present(kind),
            None => invalid(raw, "unknown coupon kind"),
        },
        _ => FieldStatus::Absent,
    }
}

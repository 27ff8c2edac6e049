//! MOEX ISS response blocks
//!
//! ISS answers with named blocks of the form `{"columns": [...], "data": [[...], ...]}`.
//! These helpers turn such blocks into field maps keyed by lower-cased column
//! names. A missing or malformed block yields nothing rather than an error.

use crate::types::{FieldMap, RawValue, DATE_FORMAT};
use chrono::NaiveDate;
use log::debug;
use serde_json::Value;

/// ISS multiplies the reported session volume by this to get units
pub const VOLUME_MULTIPLIER: f64 = 1000.0;

/// Rows of `block` as field maps
///
/// Short rows are padded with nulls, long rows are truncated to the column count.
pub fn flatten(doc: &Value, block: &str) -> Vec<FieldMap> {
    let Some(section) = doc.get(block) else {
        debug!("ISS block '{}' missing", block);
        return Vec::new();
    };
    let (Some(columns), Some(rows)) = (
        section.get("columns").and_then(Value::as_array),
        section.get("data").and_then(Value::as_array),
    ) else {
        debug!("ISS block '{}' malformed", block);
        return Vec::new();
    };

    let columns: Vec<String> = columns
        .iter()
        .map(|c| c.as_str().unwrap_or_default().to_lowercase())
        .collect();

    rows.iter()
        .filter_map(Value::as_array)
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = row.get(i).map(RawValue::from).unwrap_or(RawValue::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Collapse a `name`/`value` block (such as a security description) into one map
pub fn rows_to_dict(doc: &Value, block: &str, key_field: &str, value_field: &str) -> FieldMap {
    flatten(doc, block)
        .into_iter()
        .filter_map(|mut row| {
            let key = match row.get(key_field)? {
                RawValue::Text(s) => s.to_lowercase(),
                _ => return None,
            };
            let value = row.remove(value_field).unwrap_or(RawValue::Null);
            Some((key, value))
        })
        .collect()
}

/// First cell of the first row, `None` when the block is empty
pub fn first_cell(doc: &Value, block: &str) -> Option<RawValue> {
    doc.get(block)?
        .get("data")?
        .as_array()?
        .first()?
        .as_array()?
        .first()
        .map(RawValue::from)
}

/// Price, market yield, trade date and volume of the latest session in `rows`
///
/// With no sessions the bond is recorded at price 0 and yield 0 on `today`,
/// so it is not fetched again until it goes stale.
pub fn last_session(rows: &[FieldMap], today: NaiveDate) -> FieldMap {
    let mut out = FieldMap::new();
    let Some(last) = rows.last() else {
        out.insert("price".to_string(), RawValue::Float(0.0));
        out.insert("yieldsec".to_string(), RawValue::Float(0.0));
        out.insert(
            "tradedate".to_string(),
            RawValue::Text(today.format(DATE_FORMAT).to_string()),
        );
        return out;
    };

    let take = |key: &str| last.get(key).cloned().unwrap_or(RawValue::Null);
    out.insert("price".to_string(), take("close"));
    out.insert("yieldsec".to_string(), take("yieldclose"));
    out.insert("tradedate".to_string(), take("tradedate"));
    let volume = match take("volume") {
        RawValue::Int(v) => RawValue::Float(v as f64 * VOLUME_MULTIPLIER),
        RawValue::Float(v) => RawValue::Float(v * VOLUME_MULTIPLIER),
        _ => RawValue::Null,
    };
    out.insert("volume".to_string(), volume);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_lowercases_and_pads() {
        let doc = json!({
            "securities": {
                "columns": ["SECID", "SHORTNAME", "IS_TRADED"],
                "data": [
                    ["RU000A1047S3", "Bond 1", 1],
                    ["RU000A105SK4"],
                    ["RU000A0JX0J2", "Bond 3", 0, "extra"]
                ]
            }
        });
        let rows = flatten(&doc, "securities");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("secid"), Some(&RawValue::from("RU000A1047S3")));
        assert_eq!(rows[0].get("is_traded"), Some(&RawValue::Int(1)));
        assert_eq!(rows[1].get("shortname"), Some(&RawValue::Null));
        assert_eq!(rows[2].len(), 3);
    }

    #[test]
    fn test_flatten_missing_or_malformed() {
        assert!(flatten(&json!({}), "securities").is_empty());
        assert!(flatten(&json!({"securities": {"columns": ["A"]}}), "securities").is_empty());
        assert!(flatten(&json!({"securities": {"columns": [], "data": []}}), "securities").is_empty());
    }

    #[test]
    fn test_rows_to_dict() {
        let doc = json!({
            "description": {
                "columns": ["name", "title", "value"],
                "data": [
                    ["SECID", "Code", "RU000A1047S3"],
                    ["MATDATE", "Maturity", "2027-03-15"],
                    ["COUPONFREQUENCY", "Coupons per year", "4"]
                ]
            }
        });
        let specs = rows_to_dict(&doc, "description", "name", "value");
        assert_eq!(specs.get("matdate"), Some(&RawValue::from("2027-03-15")));
        assert_eq!(specs.get("couponfrequency"), Some(&RawValue::from("4")));
        assert!(specs.get("title").is_none());
    }

    #[test]
    fn test_first_cell() {
        let doc = json!({"securities": {"columns": ["ACCRUEDINT"], "data": [[12.34]]}});
        assert_eq!(first_cell(&doc, "securities"), Some(RawValue::Float(12.34)));
        let empty = json!({"securities": {"columns": ["ACCRUEDINT"], "data": []}});
        assert_eq!(first_cell(&empty, "securities"), None);
    }

    #[test]
    fn test_last_session() {
        let doc = json!({
            "history": {
                "columns": ["TRADEDATE", "CLOSE", "YIELDCLOSE", "VOLUME"],
                "data": [
                    ["2025-01-09", 97.5, 14.1, 3],
                    ["2025-01-10", 98.1, 13.9, 5]
                ]
            }
        });
        let today = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        let session = last_session(&flatten(&doc, "history"), today);
        assert_eq!(session.get("price"), Some(&RawValue::Float(98.1)));
        assert_eq!(session.get("yieldsec"), Some(&RawValue::Float(13.9)));
        assert_eq!(session.get("volume"), Some(&RawValue::Float(5000.0)));
    }

    #[test]
    fn test_no_sessions() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        let session = last_session(&[], today);
        assert_eq!(session.get("price"), Some(&RawValue::Float(0.0)));
        assert_eq!(session.get("tradedate"), Some(&RawValue::from("2025-01-11")));
    }
}

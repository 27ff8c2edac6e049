//! Bond representations

use crate::types::{days_between, Cash, Days, Percent, Price, Secid, DATE_FORMAT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange listing tier (1 is the highest quality)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListLevel(u8);

impl ListLevel {
    pub const FIRST: ListLevel = ListLevel(1);
    pub const SECOND: ListLevel = ListLevel(2);
    pub const THIRD: ListLevel = ListLevel(3);

    /// Tiers outside 1..=3 are rejected
    pub fn new(level: i64) -> Option<Self> {
        match level {
            1..=3 => Some(ListLevel(level as u8)),
            _ => None,
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Facts about a single bond as supplied by the market-data collaborator
///
/// Everything but the identifier may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BondFacts {
    pub secid: Secid,
    pub shortname: Option<String>,
    pub face_value: Option<Cash>,
    pub initial_face_value: Option<Cash>,
    pub coupon_value: Option<Cash>,
    pub coupon_percent: Option<Percent>,
    /// Coupon payments per year, never zero
    pub coupon_frequency: Option<u32>,
    pub next_coupon_date: Option<NaiveDate>,
    pub buyback_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub accrued_interest: Option<Cash>,
    /// Last traded price, percent of face value
    pub price: Option<Price>,
    /// Exchange-quoted yield (imprecise, computed once a day on the previous session)
    pub market_yield: Option<Percent>,
    pub is_qualified_only: Option<bool>,
    pub list_level: Option<ListLevel>,
    pub is_traded: Option<bool>,
    pub face_unit: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub trade_date: Option<NaiveDate>,
    pub volume: Option<f64>,
    pub coupon_kind: Option<CouponKind>,
}

impl BondFacts {
    /// Create facts carrying only an identifier
    pub fn new(secid: impl Into<Secid>) -> Self {
        Self {
            secid: secid.into(),
            ..Default::default()
        }
    }

    /// Horizon of the yield projection: buyback date, else maturity date
    pub fn horizon(&self) -> Horizon {
        match (self.buyback_date, self.maturity_date) {
            (Some(date), _) => Horizon::Buyback(date),
            (None, Some(date)) => Horizon::Maturity(date),
            (None, None) => Horizon::Undefined,
        }
    }

    /// Issue page on the exchange site
    pub fn url(&self) -> String {
        format!("https://www.moex.com/ru/issue.aspx?code={}", self.secid)
    }

    /// Rouble-denominated bond (`SUR` is the exchange's legacy code)
    pub fn is_rouble(&self) -> bool {
        matches!(self.face_unit.as_deref(), Some("SUR") | Some("RUB"))
    }
}

impl fmt::Display for BondFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = |d: Option<NaiveDate>| {
            d.map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| "n/a".to_string())
        };
        write!(
            f,
            "{} / {}, {} = {:?} / {}",
            self.secid,
            self.shortname.as_deref().unwrap_or("-"),
            date(self.issue_date),
            self.is_traded,
            date(self.trade_date)
        )
    }
}

/// End date of a bond's yield projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    Buyback(NaiveDate),
    Maturity(NaiveDate),
    Undefined,
}

impl Horizon {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Horizon::Buyback(d) | Horizon::Maturity(d) => Some(*d),
            Horizon::Undefined => None,
        }
    }

    /// Days from `as_of` to the horizon (`finish_days`); negative once passed
    pub fn days_from(&self, as_of: NaiveDate) -> Option<Days> {
        self.date().map(|d| days_between(as_of, d))
    }
}

/// Coupon structure, scraped from the issue page title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CouponKind {
    Floating,
    Variable,
    Fixed,
    Amortizing,
    IndexedNominal,
}

impl CouponKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponKind::Floating => "floating",
            CouponKind::Variable => "variable",
            CouponKind::Fixed => "fixed",
            CouponKind::Amortizing => "amortizing",
            CouponKind::IndexedNominal => "indexed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "floating" => Some(CouponKind::Floating),
            "variable" => Some(CouponKind::Variable),
            "fixed" => Some(CouponKind::Fixed),
            "amortizing" => Some(CouponKind::Amortizing),
            "indexed" => Some(CouponKind::IndexedNominal),
            _ => None,
        }
    }
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_horizon_prefers_buyback() {
        let mut bond = BondFacts::new("RU000A1047S3");
        bond.maturity_date = Some(date(2030, 1, 1));
        assert_eq!(bond.horizon(), Horizon::Maturity(date(2030, 1, 1)));

        bond.buyback_date = Some(date(2027, 6, 1));
        assert_eq!(bond.horizon(), Horizon::Buyback(date(2027, 6, 1)));
    }

    #[test]
    fn test_undefined_horizon() {
        let bond = BondFacts::new("X");
        assert_eq!(bond.horizon(), Horizon::Undefined);
        assert_eq!(bond.horizon().days_from(date(2025, 1, 1)), None);
    }

    #[test]
    fn test_days_from() {
        let horizon = Horizon::Maturity(date(2025, 1, 31));
        assert_eq!(horizon.days_from(date(2025, 1, 1)), Some(30));
        assert_eq!(horizon.days_from(date(2025, 2, 1)), Some(-1));
    }

    #[test]
    fn test_list_level_bounds() {
        assert_eq!(ListLevel::new(2), Some(ListLevel::SECOND));
        assert_eq!(ListLevel::new(0), None);
        assert_eq!(ListLevel::new(4), None);
    }

    #[test]
    fn test_is_rouble() {
        let mut bond = BondFacts::new("X");
        assert!(!bond.is_rouble());
        bond.face_unit = Some("SUR".to_string());
        assert!(bond.is_rouble());
        bond.face_unit = Some("USD".to_string());
        assert!(!bond.is_rouble());
    }
}

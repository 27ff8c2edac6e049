//! Per-bond enrichment: schedule, day counts, accrued interest and yields
//!
//! Every bond is enriched independently of the others, so a batch is a plain
//! parallel map. A bond whose yield cannot be computed still gets every other
//! derived field.

use crate::bond::BondFacts;
use crate::finance::accrued::estimate_accrued;
use crate::finance::commission::CommissionPolicy;
use crate::finance::yields::{
    compute_legacy_yield, YieldEstimate, YieldInputs, YieldSelector,
};
use crate::schedule::{days_since_prev_coupon, project_coupons};
use crate::types::{days_between, Cash, Days, Percent};
use chrono::NaiveDate;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which model produced a bond's headline yield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YieldSource {
    Full,
    Legacy,
}

impl YieldSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldSource::Full => "full",
            YieldSource::Legacy => "legacy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(YieldSource::Full),
            "legacy" => Some(YieldSource::Legacy),
            _ => None,
        }
    }
}

impl From<&YieldEstimate> for YieldSource {
    fn from(estimate: &YieldEstimate) -> Self {
        match estimate {
            YieldEstimate::Full(_) => YieldSource::Full,
            YieldEstimate::Legacy(_) => YieldSource::Legacy,
        }
    }
}

impl fmt::Display for YieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields computed from a bond's facts at a given date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    pub remaining_coupons: u32,
    pub days_to_buyback: Option<Days>,
    pub days_to_coupon: Option<Days>,
    /// Days to the maturity date
    pub days_to_finish: Option<Days>,
    /// Days to the horizon (buyback, else maturity)
    pub horizon_days: Option<Days>,
    /// Reported accrued interest, or the estimate when it was not reported
    pub accrued_interest: Option<Cash>,
    pub days_since_prev_coupon: Days,
    /// Annualized net yield of the full model, when it was selected
    pub calc_yield: Option<Percent>,
    pub total_percent: Option<Percent>,
    pub month_percent: Option<Percent>,
    pub legacy_total_percent: Percent,
    pub legacy_month_percent: Percent,
    pub yield_source: Option<YieldSource>,
}

/// Bond facts together with their derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBond {
    pub facts: BondFacts,
    pub derived: Derived,
}

impl EnrichedBond {
    /// Wrap facts with nothing derived yet
    pub fn unenriched(facts: BondFacts) -> Self {
        Self {
            facts,
            derived: Derived::default(),
        }
    }

    pub fn secid(&self) -> &str {
        &self.facts.secid
    }

    /// Annual yield used for screening: the computed yield, else the quoted one
    pub fn screening_yield(&self) -> Option<Percent> {
        self.derived.calc_yield.or(self.facts.market_yield)
    }

    /// Net return to the horizon from whichever model was selected
    pub fn headline_total_percent(&self) -> Option<Percent> {
        match self.derived.yield_source? {
            YieldSource::Full => self.derived.total_percent,
            YieldSource::Legacy => Some(self.derived.legacy_total_percent),
        }
    }
}

/// Computes derived fields for bonds as of a fixed date
pub struct Enricher {
    as_of: NaiveDate,
    policy: CommissionPolicy,
    selector: YieldSelector,
}

impl Enricher {
    pub fn new(as_of: NaiveDate, policy: CommissionPolicy) -> Self {
        Self {
            as_of,
            policy,
            selector: YieldSelector::new(policy),
        }
    }

    /// Replace the yield model chain
    pub fn with_selector(mut self, selector: YieldSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Derive every computed field of one bond
    pub fn derive(&self, facts: &BondFacts) -> Derived {
        let as_of = self.as_of;
        let days_to = |d: Option<NaiveDate>| d.map(|d| days_between(as_of, d));

        let horizon = facts.horizon();
        let horizon_days = horizon.days_from(as_of);
        let remaining_coupons = project_coupons(
            facts.next_coupon_date,
            facts.coupon_frequency,
            horizon.date(),
            as_of,
        );

        let inputs = YieldInputs {
            facts,
            remaining_coupons,
            finish_days: horizon_days,
        };
        // full figures only when the full model was selected
        let estimate = self.selector.select(&inputs);
        let full = match estimate {
            Some(YieldEstimate::Full(result)) => Some(result),
            _ => None,
        };
        let legacy = compute_legacy_yield(facts.market_yield, horizon_days, self.policy.tax_retention);

        let accrued_interest = match (full, facts.accrued_interest) {
            (Some(result), _) => Some(result.accrued.value()),
            (None, Some(known)) => Some(known),
            (None, None) => match (horizon_days, facts.coupon_value) {
                (Some(days), Some(coupon)) if days > 0 => {
                    estimate_accrued(None, days, coupon, facts.coupon_frequency).map(|a| a.value())
                }
                _ => None,
            },
        };

        let yield_source = estimate.as_ref().map(YieldSource::from);
        if yield_source.is_none() {
            debug!("{}: no yield model applicable", facts.secid);
        }

        Derived {
            remaining_coupons,
            days_to_buyback: days_to(facts.buyback_date),
            days_to_coupon: days_to(facts.next_coupon_date),
            days_to_finish: days_to(facts.maturity_date),
            horizon_days,
            accrued_interest,
            days_since_prev_coupon: days_since_prev_coupon(
                facts.next_coupon_date,
                facts.coupon_frequency,
                as_of,
            ),
            calc_yield: full.map(|r| r.annualized_percent),
            total_percent: full.map(|r| r.total_percent),
            month_percent: full.map(|r| r.monthly_percent),
            legacy_total_percent: legacy.total_percent,
            legacy_month_percent: legacy.monthly_percent,
            yield_source,
        }
    }

    pub fn enrich(&self, facts: BondFacts) -> EnrichedBond {
        let derived = self.derive(&facts);
        EnrichedBond { facts, derived }
    }

    /// Enrich a batch in parallel, preserving input order
    pub fn enrich_all(&self, bonds: Vec<BondFacts>) -> Vec<EnrichedBond> {
        let enriched: Vec<EnrichedBond> = bonds.into_par_iter().map(|b| self.enrich(b)).collect();
        let with_yield = enriched.iter().filter(|b| b.derived.calc_yield.is_some()).count();
        info!(
            "Enriched {} bonds as of {} ({} with computed yield)",
            enriched.len(),
            self.as_of,
            with_yield
        );
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn full_bond(secid: &str) -> BondFacts {
        let mut bond = BondFacts::new(secid);
        bond.initial_face_value = Some(1000.0);
        bond.price = Some(98.0);
        bond.coupon_value = Some(35.0);
        bond.coupon_frequency = Some(2);
        bond.next_coupon_date = Some(date(2025, 3, 1));
        bond.maturity_date = Some(date(2026, 12, 31));
        bond
    }

    #[test]
    fn test_derive_full_bond() {
        let enricher = Enricher::new(date(2025, 1, 1), CommissionPolicy::default());
        let derived = enricher.derive(&full_bond("A"));

        assert_eq!(derived.remaining_coupons, 4);
        assert_eq!(derived.days_to_coupon, Some(59));
        assert_eq!(derived.days_to_finish, derived.horizon_days);
        assert_eq!(derived.days_to_buyback, None);
        assert!(derived.calc_yield.is_some());
        assert!(derived.accrued_interest.is_some());
        assert_eq!(derived.yield_source, Some(YieldSource::Full));
    }

    #[test]
    fn test_buyback_sets_horizon() {
        let enricher = Enricher::new(date(2025, 1, 1), CommissionPolicy::default());
        let mut bond = full_bond("B");
        bond.buyback_date = Some(date(2025, 9, 1));
        let derived = enricher.derive(&bond);
        assert_eq!(derived.horizon_days, derived.days_to_buyback);
        assert_eq!(derived.remaining_coupons, 2);
    }

    #[test]
    fn test_matured_bond_keeps_other_fields() {
        let enricher = Enricher::new(date(2027, 6, 1), CommissionPolicy::default());
        let mut bond = full_bond("C");
        bond.market_yield = Some(12.0);
        let derived = enricher.derive(&bond);

        assert!(derived.calc_yield.is_none());
        assert_eq!(derived.legacy_total_percent, 0.0);
        assert_eq!(derived.remaining_coupons, 0);
        assert!(derived.days_to_finish.unwrap() < 0);
        assert_eq!(derived.yield_source, None);
    }

    #[test]
    fn test_full_figures_follow_the_selected_model() {
        use crate::finance::yields::{LegacyYield, YieldModel};

        let policy = CommissionPolicy::default();
        let models: Vec<Box<dyn YieldModel>> = vec![Box::new(LegacyYield::new(policy))];
        let enricher = Enricher::new(date(2025, 1, 1), policy)
            .with_selector(YieldSelector::with_models(models));
        let mut bond = full_bond("D");
        bond.market_yield = Some(12.0);
        let derived = enricher.derive(&bond);

        assert_eq!(derived.yield_source, Some(YieldSource::Legacy));
        assert_eq!(derived.calc_yield, None);
        assert_eq!(derived.total_percent, None);
        assert!(derived.legacy_total_percent > 0.0);
    }

    #[test]
    fn test_legacy_source_when_price_missing() {
        let enricher = Enricher::new(date(2025, 1, 1), CommissionPolicy::default());
        let mut bond = full_bond("D");
        bond.price = None;
        bond.market_yield = Some(15.0);
        let enriched = enricher.enrich(bond);

        assert_eq!(enriched.derived.yield_source, Some(YieldSource::Legacy));
        assert!(enriched.derived.legacy_total_percent > 0.0);
        assert_eq!(enriched.screening_yield(), Some(15.0));
        assert_eq!(
            enriched.headline_total_percent(),
            Some(enriched.derived.legacy_total_percent)
        );
    }

    #[test]
    fn test_enrich_all_preserves_order() {
        let enricher = Enricher::new(date(2025, 1, 1), CommissionPolicy::default());
        let bonds: Vec<_> = (0..50).map(|i| full_bond(&format!("B{}", i))).collect();
        let enriched = enricher.enrich_all(bonds);
        assert_eq!(enriched.len(), 50);
        for (i, b) in enriched.iter().enumerate() {
            assert_eq!(b.secid(), format!("B{}", i));
        }
    }
}

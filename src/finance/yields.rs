//! Yield estimates for a single bond
//!
//! Two models share the [`YieldModel`] interface:
//!
//! - [`FullYield`] projects the net return to the horizon from price, face value,
//!   coupons, accrued interest and commissions.
//! - [`LegacyYield`] scales the exchange-quoted yield to the remaining horizon.
//!   It is the degraded path for bonds that lack the inputs of the full model.
//!
//! [`YieldSelector`] tries the models in order and keeps the first estimate.

use crate::bond::BondFacts;
use crate::error::{BondError, Result};
use crate::finance::accrued::{estimate_accrued, AccruedInterest};
use crate::finance::commission::CommissionPolicy;
use crate::finance::constants::MIN_DAYS_FOR_MONTHLY;
use crate::types::{round2, Days, Percent, DAYS_PER_MONTH, DAYS_PER_YEAR};
use log::debug;
use serde::{Deserialize, Serialize};

/// Result of the full yield model, percentages rounded to 2 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldResult {
    /// Net return over the remaining life, percent of the purchase price
    pub total_percent: Percent,
    pub annualized_percent: Percent,
    /// Zero when the remaining life is 30 days or less
    pub monthly_percent: Percent,
    pub accrued: AccruedInterest,
}

/// Result of the legacy model, percentages rounded to 2 decimals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyYieldResult {
    pub total_percent: Percent,
    pub monthly_percent: Percent,
}

/// Full yield computation with the reason it was not computable
///
/// `finish_days` is the number of days from now to the horizon.
pub fn try_compute_yield(
    facts: &BondFacts,
    remaining_coupons: u32,
    finish_days: Option<Days>,
    policy: &CommissionPolicy,
) -> Result<YieldResult> {
    let missing = |what: &str| BondError::MissingInput(format!("{}: {}", facts.secid, what));

    let face = facts.initial_face_value.ok_or_else(|| missing("initial face value"))?;
    let price_percent = facts.price.ok_or_else(|| missing("price"))?;
    let coupon = facts.coupon_value.ok_or_else(|| missing("coupon value"))?;
    let finish_days = finish_days.ok_or_else(|| missing("horizon"))?;

    if finish_days <= 0 {
        return Err(BondError::InvalidHorizon {
            secid: facts.secid.clone(),
            days: finish_days,
        });
    }

    let real_price = face * price_percent / 100.0;
    if !(real_price > 0.0) {
        return Err(BondError::ArithmeticFault(format!(
            "{}: non-positive purchase price {}",
            facts.secid, real_price
        )));
    }

    let accrued = estimate_accrued(
        facts.accrued_interest,
        finish_days,
        coupon,
        facts.coupon_frequency,
    )
    .ok_or_else(|| missing("accrued interest and coupon frequency"))?;

    // gain to par + next coupon - accrued paid to the seller + later coupons
    let gross_income = (face - real_price) + coupon - accrued.value()
        + coupon * (remaining_coupons as f64 - 1.0);
    let total = policy.net_income(gross_income) / real_price * 100.0;
    let annualized = total / finish_days as f64 * DAYS_PER_YEAR;
    let monthly = if finish_days > MIN_DAYS_FOR_MONTHLY {
        total / finish_days as f64 * DAYS_PER_MONTH
    } else {
        0.0
    };

    if !(total.is_finite() && annualized.is_finite() && monthly.is_finite()) {
        return Err(BondError::ArithmeticFault(format!(
            "{}: non-finite yield",
            facts.secid
        )));
    }

    Ok(YieldResult {
        total_percent: round2(total),
        annualized_percent: round2(annualized),
        monthly_percent: round2(monthly),
        accrued,
    })
}

/// Full yield, or `None` when it is not computable for this bond
///
/// "Not computable" is distinct from a computed zero.
pub fn compute_yield(
    facts: &BondFacts,
    remaining_coupons: u32,
    finish_days: Option<Days>,
    policy: &CommissionPolicy,
) -> Option<YieldResult> {
    match try_compute_yield(facts, remaining_coupons, finish_days, policy) {
        Ok(result) => Some(result),
        Err(e) => {
            debug!("yield not computed: {}", e);
            None
        }
    }
}

/// Legacy yield from the exchange-quoted figure
///
/// Always yields a number: 0/0 when the quoted yield or a remaining horizon is missing.
pub fn compute_legacy_yield(
    market_yield: Option<Percent>,
    finish_days: Option<Days>,
    tax_retention: f64,
) -> LegacyYieldResult {
    let (market_yield, finish_days) = match (market_yield, finish_days) {
        (Some(y), Some(d)) if d > 0 && y.is_finite() => (y, d),
        _ => return LegacyYieldResult::default(),
    };

    let net = market_yield * tax_retention;
    let total = net * finish_days as f64 / DAYS_PER_YEAR;
    let monthly = if finish_days > MIN_DAYS_FOR_MONTHLY {
        net * DAYS_PER_MONTH / DAYS_PER_YEAR
    } else {
        0.0
    };

    LegacyYieldResult {
        total_percent: round2(total),
        monthly_percent: round2(monthly),
    }
}

/// Everything a yield model may look at
#[derive(Debug, Clone, Copy)]
pub struct YieldInputs<'a> {
    pub facts: &'a BondFacts,
    pub remaining_coupons: u32,
    pub finish_days: Option<Days>,
}

/// Yield estimate with the model that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum YieldEstimate {
    Full(YieldResult),
    Legacy(LegacyYieldResult),
}

impl YieldEstimate {
    pub fn total_percent(&self) -> Percent {
        match self {
            YieldEstimate::Full(r) => r.total_percent,
            YieldEstimate::Legacy(r) => r.total_percent,
        }
    }

    pub fn monthly_percent(&self) -> Percent {
        match self {
            YieldEstimate::Full(r) => r.monthly_percent,
            YieldEstimate::Legacy(r) => r.monthly_percent,
        }
    }

    /// Only the full model produces an annualized figure
    pub fn annualized_percent(&self) -> Option<Percent> {
        match self {
            YieldEstimate::Full(r) => Some(r.annualized_percent),
            YieldEstimate::Legacy(_) => None,
        }
    }

    pub fn model(&self) -> &'static str {
        match self {
            YieldEstimate::Full(_) => "full",
            YieldEstimate::Legacy(_) => "legacy",
        }
    }
}

/// A way of estimating a bond's yield from the inputs it has
pub trait YieldModel: Send + Sync {
    /// `None` when the model's required inputs are missing
    fn estimate(&self, inputs: &YieldInputs<'_>) -> Option<YieldEstimate>;

    /// Get model name
    fn name(&self) -> &str;
}

/// Net return projection from price, coupons and commissions
#[derive(Debug, Clone, Default)]
pub struct FullYield {
    pub policy: CommissionPolicy,
}

impl FullYield {
    pub fn new(policy: CommissionPolicy) -> Self {
        Self { policy }
    }
}

impl YieldModel for FullYield {
    fn estimate(&self, inputs: &YieldInputs<'_>) -> Option<YieldEstimate> {
        compute_yield(
            inputs.facts,
            inputs.remaining_coupons,
            inputs.finish_days,
            &self.policy,
        )
        .map(YieldEstimate::Full)
    }

    fn name(&self) -> &str {
        "FullYield"
    }
}

/// Exchange-quoted yield scaled to the remaining horizon
#[derive(Debug, Clone, Default)]
pub struct LegacyYield {
    pub policy: CommissionPolicy,
}

impl LegacyYield {
    pub fn new(policy: CommissionPolicy) -> Self {
        Self { policy }
    }
}

impl YieldModel for LegacyYield {
    fn estimate(&self, inputs: &YieldInputs<'_>) -> Option<YieldEstimate> {
        // as a fallback it needs a quoted yield and a horizon still ahead
        inputs.facts.market_yield?;
        inputs.finish_days.filter(|d| *d > 0)?;
        Some(YieldEstimate::Legacy(compute_legacy_yield(
            inputs.facts.market_yield,
            inputs.finish_days,
            self.policy.tax_retention,
        )))
    }

    fn name(&self) -> &str {
        "LegacyYield"
    }
}

/// Picks the first model able to estimate a bond's yield
pub struct YieldSelector {
    models: Vec<Box<dyn YieldModel>>,
}

impl YieldSelector {
    /// Full model first, legacy model as fallback
    pub fn new(policy: CommissionPolicy) -> Self {
        Self {
            models: vec![
                Box::new(FullYield::new(policy)),
                Box::new(LegacyYield::new(policy)),
            ],
        }
    }

    /// Selector over a custom model list, tried in order
    pub fn with_models(models: Vec<Box<dyn YieldModel>>) -> Self {
        Self { models }
    }

    pub fn select(&self, inputs: &YieldInputs<'_>) -> Option<YieldEstimate> {
        self.models.iter().find_map(|m| m.estimate(inputs))
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }
}

impl Default for YieldSelector {
    fn default() -> Self {
        Self::new(CommissionPolicy::default())
    }
}

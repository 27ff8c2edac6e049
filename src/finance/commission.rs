//! Commission policy applied to projected bond income

use crate::error::{BondError, Result};
use crate::finance::constants::{DEFAULT_FLAT_COMMISSION, DEFAULT_TAX_RETENTION};
use crate::types::Cash;
use serde::{Deserialize, Serialize};

/// Transaction and tax costs of holding a bond to its horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionPolicy {
    /// Flat transaction commission, currency units
    pub flat_commission: Cash,
    /// Multiplier applied to income after tax (13% tax => 0.87)
    pub tax_retention: f64,
}

impl CommissionPolicy {
    /// Create a policy, validating the retention factor
    pub fn new(flat_commission: Cash, tax_retention: f64) -> Result<Self> {
        if !flat_commission.is_finite() || flat_commission < 0.0 {
            return Err(BondError::ConfigError(format!(
                "flat commission must be a non-negative amount, got {}",
                flat_commission
            )));
        }
        if !(tax_retention > 0.0 && tax_retention <= 1.0) {
            return Err(BondError::ConfigError(format!(
                "tax retention must be in (0, 1], got {}",
                tax_retention
            )));
        }
        Ok(Self {
            flat_commission,
            tax_retention,
        })
    }

    /// Policy with no commission and no tax
    pub fn zero() -> Self {
        Self {
            flat_commission: 0.0,
            tax_retention: 1.0,
        }
    }

    /// Income left after the flat commission and tax
    pub fn net_income(&self, gross_income: Cash) -> Cash {
        (gross_income - self.flat_commission) * self.tax_retention
    }

    /// Share of a rate kept after tax
    pub fn after_tax(&self, rate: f64) -> f64 {
        rate * self.tax_retention
    }
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            flat_commission: DEFAULT_FLAT_COMMISSION,
            tax_retention: DEFAULT_TAX_RETENTION,
        }
    }
}

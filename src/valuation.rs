//! Gold valuation calculator
//!
//! Pure arithmetic over collateral weight, purity and the current market
//! price. The financing-ratio policy set is a business rule enforced at the
//! service boundary; `compute_valuation` itself accepts any ratio in (0, 1]
//! so it stays independently testable.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

use crate::error::ApiError;

/// Grams to troy ounce conversion factor
pub const GRAMS_TO_TROY_OZ: Decimal = dec!(0.03215);

/// Karat denominations accepted as collateral
pub const RECOGNIZED_PURITIES: [i32; 4] = [24, 22, 18, 14];

/// Financing ratios offered by business policy
pub const FINANCING_RATIOS: [Decimal; 4] = [dec!(0.65), dec!(0.70), dec!(0.75), dec!(0.80)];

/// Errors from the valuation calculator
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValuationError {
    #[error("weight must be positive, got {0}")]
    NonPositiveWeight(Decimal),

    #[error("price per ounce must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("unrecognized purity {0}K; expected one of 24, 22, 18, 14")]
    UnrecognizedPurity(i32),

    #[error("financing ratio must be in (0, 1], got {0}")]
    RatioOutOfRange(Decimal),
}

impl From<ValuationError> for ApiError {
    fn from(err: ValuationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Result of valuing one collateral item against a financing ratio
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    pub gold_value: Decimal,
    pub financing_amount: Decimal,
}

/// Value a gold item and derive its financing amount.
///
/// gold_value = weight_grams * 0.03215 * price_per_oz * (purity / 24)
/// financing_amount = gold_value * ratio
pub fn compute_valuation(
    weight_grams: Decimal,
    purity_karat: i32,
    price_per_oz: Decimal,
    financing_ratio: Decimal,
) -> Result<Valuation, ValuationError> {
    if weight_grams <= Decimal::ZERO {
        return Err(ValuationError::NonPositiveWeight(weight_grams));
    }
    if price_per_oz <= Decimal::ZERO {
        return Err(ValuationError::NonPositivePrice(price_per_oz));
    }
    if !RECOGNIZED_PURITIES.contains(&purity_karat) {
        return Err(ValuationError::UnrecognizedPurity(purity_karat));
    }
    if financing_ratio <= Decimal::ZERO || financing_ratio > Decimal::ONE {
        return Err(ValuationError::RatioOutOfRange(financing_ratio));
    }

    let purity_ratio = Decimal::from(purity_karat) / dec!(24);
    let weight_ounces = weight_grams * GRAMS_TO_TROY_OZ;
    let gold_value = weight_ounces * price_per_oz * purity_ratio;
    let financing_amount = gold_value * financing_ratio;

    Ok(Valuation {
        gold_value,
        financing_amount,
    })
}

/// Whether a ratio is one of the discrete values offered by policy.
pub fn is_policy_ratio(ratio: Decimal) -> bool {
    FINANCING_RATIOS.contains(&ratio)
}

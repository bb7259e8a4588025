//! Per-fee recomputation from a package rule's calculation model

use crate::core::amount::{AMOUNT_TOLERANCE, round2, within_tolerance};
use crate::core::error::CalculationError;
use crate::core::fee::{
    AppliedFee, ApplicationRule, CalculationType, FeePackageRule, ReferenceAmount,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of recomputing a single fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualFeeCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndividualFeeCheck {
    fn valid(expected_amount: Option<Decimal>) -> Self {
        Self {
            is_valid: true,
            expected_amount,
            error: None,
        }
    }

    fn invalid(expected_amount: Option<Decimal>, error: String) -> Self {
        Self {
            is_valid: false,
            expected_amount,
            error: Some(error),
        }
    }
}

/// Amount `rule` is calculated against
///
/// `previous_deductible_fees` is the sum of deductible fees applied before this
/// rule, in priority order.
pub fn calculate_expected_reference_amount(
    rule: &FeePackageRule,
    original_amount: Decimal,
    previous_deductible_fees: Decimal,
) -> Result<Decimal, CalculationError> {
    match &rule.reference_amount {
        ReferenceAmount::OriginalAmount => Ok(original_amount),
        ReferenceAmount::AfterFeesAmount => original_amount
            .checked_sub(previous_deductible_fees)
            .ok_or_else(|| overflow(rule)),
        ReferenceAmount::Unknown(value) => Err(CalculationError::UnknownReferenceAmount {
            fee_label: rule.fee_label.clone(),
            value: value.clone(),
        }),
    }
}

/// Recompute `fee` from the rule's calculation model and compare
///
/// Rules without a calculation model cannot be checked and are reported valid.
/// Amounts are compared within [`AMOUNT_TOLERANCE`]; use
/// [`FeeValidator::validate_individual_fee`](super::FeeValidator::validate_individual_fee)
/// for a configured tolerance.
pub fn validate_individual_fee_calculation(
    fee: &AppliedFee,
    rule: &FeePackageRule,
    reference_amount: Decimal,
) -> Result<IndividualFeeCheck, CalculationError> {
    recompute(fee, rule, reference_amount, AMOUNT_TOLERANCE)
}

pub(super) fn recompute(
    fee: &AppliedFee,
    rule: &FeePackageRule,
    reference_amount: Decimal,
    tolerance: Decimal,
) -> Result<IndividualFeeCheck, CalculationError> {
    let Some(model) = &rule.calculation_model else {
        return Ok(IndividualFeeCheck::valid(None));
    };

    let mut flat = None::<Decimal>;
    let mut percentage = None::<Decimal>;
    for calculation in &model.calculations {
        match &calculation.calculation_type {
            CalculationType::Flat => {
                flat = Some(accumulate(flat, calculation.value).ok_or_else(|| overflow(rule))?);
            }
            CalculationType::Percentage => {
                percentage =
                    Some(accumulate(percentage, calculation.value).ok_or_else(|| overflow(rule))?);
            }
            CalculationType::Unknown(value) => {
                return Err(CalculationError::UnknownCalculationType {
                    fee_label: rule.fee_label.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    let percentual = percentage
        .map(|p| {
            reference_amount
                .checked_mul(p)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(|| overflow(rule))
        })
        .transpose()?;

    let expected = match &model.application_rule {
        ApplicationRule::FlatFee => flat,
        ApplicationRule::Percentual => percentual,
        ApplicationRule::MaxBetweenTypes => match (flat, percentual) {
            (Some(f), Some(p)) => Some(f.max(p)),
            (f, p) => f.or(p),
        },
        ApplicationRule::Unknown(value) => {
            return Err(CalculationError::UnknownApplicationRule {
                fee_label: rule.fee_label.clone(),
                value: value.clone(),
            });
        }
    };

    let Some(expected) = expected.map(round2) else {
        return Ok(IndividualFeeCheck::invalid(
            None,
            format!(
                "Fee '{}' has no calculation matching its application rule",
                rule.fee_label
            ),
        ));
    };

    if within_tolerance(fee.calculated_amount, expected, tolerance) {
        Ok(IndividualFeeCheck::valid(Some(expected)))
    } else {
        Ok(IndividualFeeCheck::invalid(
            Some(expected),
            format!(
                "Fee '{}' calculated amount {} does not match expected {}",
                fee.fee_label,
                round2(fee.calculated_amount),
                expected
            ),
        ))
    }
}

fn accumulate(total: Option<Decimal>, value: Decimal) -> Option<Decimal> {
    total.unwrap_or_default().checked_add(value)
}

fn overflow(rule: &FeePackageRule) -> CalculationError {
    CalculationError::AmountOverflow {
        fee_label: rule.fee_label.clone(),
    }
}

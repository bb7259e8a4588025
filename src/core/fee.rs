//! Fee entries, calculation state and fee package rules

use super::amount::{add_amounts, checked_sum, round2, sub_amounts, sum_amounts};
use super::error::CalculationError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fee line with its resolution
///
/// A deductible fee reduces what the destination receives; a non-deductible
/// fee is added on top of what the source pays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFee {
    pub fee_id: String,
    pub fee_label: String,
    pub calculated_amount: Decimal,
    pub is_deductible_from: bool,
    #[serde(default)]
    pub credit_account: String,
    pub priority: i32,
}

/// Full result of applying a fee package to a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculationState {
    pub original_amount: Decimal,
    pub original_currency: String,
    pub source_account: String,
    pub destination_account: String,
    pub deductible_fees: Decimal,
    pub non_deductible_fees: Decimal,
    pub total_fees: Decimal,
    pub applied_fees: Vec<AppliedFee>,
    pub source_pays_amount: Decimal,
    pub destination_receives_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_label: Option<String>,
    #[serde(default = "Utc::now")]
    pub calculated_at: DateTime<Utc>,
}

impl FeeCalculationState {
    /// Build a state whose totals are derived from `applied_fees`
    ///
    /// Every sum invariant checked by the validator holds for the result.
    pub fn from_applied_fees(
        original_amount: Decimal,
        original_currency: impl Into<String>,
        source_account: impl Into<String>,
        destination_account: impl Into<String>,
        applied_fees: Vec<AppliedFee>,
    ) -> Self {
        let deductible_fees = round2(sum_fees(&applied_fees, Some(true)));
        let non_deductible_fees = round2(sum_fees(&applied_fees, Some(false)));
        let total_fees = add_amounts(deductible_fees, non_deductible_fees);

        Self {
            original_amount,
            original_currency: original_currency.into(),
            source_account: source_account.into(),
            destination_account: destination_account.into(),
            deductible_fees,
            non_deductible_fees,
            total_fees,
            applied_fees,
            source_pays_amount: add_amounts(original_amount, non_deductible_fees),
            destination_receives_amount: sub_amounts(original_amount, deductible_fees),
            package_id: None,
            package_label: None,
            calculated_at: Utc::now(),
        }
    }

    pub fn with_package(mut self, id: Option<String>, label: Option<String>) -> Self {
        self.package_id = id;
        self.package_label = label;
        self
    }

    /// Share of the original amount taken by fees, in percent
    ///
    /// `None` when the original amount is zero or the share does not fit a
    /// [`Decimal`].
    pub fn fee_percentage(&self) -> Option<Decimal> {
        if self.original_amount.is_zero() {
            return None;
        }
        self.total_fees
            .checked_div(self.original_amount)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }
}

/// Sum of calculated amounts, optionally filtered by deductibility
///
/// Degrades to zero on overflow.
pub fn sum_fees(fees: &[AppliedFee], deductible: Option<bool>) -> Decimal {
    sum_amounts(fee_amounts(fees, deductible))
}

/// Like [`sum_fees`], `None` on overflow
pub fn checked_sum_fees(fees: &[AppliedFee], deductible: Option<bool>) -> Option<Decimal> {
    checked_sum(fee_amounts(fees, deductible))
}

fn fee_amounts(fees: &[AppliedFee], deductible: Option<bool>) -> impl Iterator<Item = Decimal> + '_ {
    fees.iter()
        .filter(move |f| deductible.is_none_or(|d| f.is_deductible_from == d))
        .map(|f| f.calculated_amount)
}

/// Amount a fee rule is calculated against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceAmount {
    OriginalAmount,
    AfterFeesAmount,
    /// Anything the fee package service sent that this crate does not know
    #[serde(untagged)]
    Unknown(String),
}

/// How the calculations of a model combine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationRule {
    FlatFee,
    Percentual,
    MaxBetweenTypes,
    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalculationType {
    Flat,
    Percentage,
    #[serde(untagged)]
    Unknown(String),
}

/// A single flat or percentage component of a calculation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    #[serde(rename = "type")]
    pub calculation_type: CalculationType,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationModel {
    pub application_rule: ApplicationRule,
    #[serde(default)]
    pub calculations: Vec<Calculation>,
}

/// A configured fee definition belonging to a fee package
///
/// Read-only input supplied by the fee package service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePackageRule {
    pub fee_id: String,
    pub fee_label: String,
    pub priority: i32,
    pub reference_amount: ReferenceAmount,
    pub is_deductible_from: bool,
    #[serde(default)]
    pub credit_account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_model: Option<CalculationModel>,
}

impl FeePackageRule {
    /// Fail on the first enum value this crate cannot evaluate
    pub fn ensure_known(&self) -> Result<(), CalculationError> {
        if let ReferenceAmount::Unknown(value) = &self.reference_amount {
            return Err(CalculationError::UnknownReferenceAmount {
                fee_label: self.fee_label.clone(),
                value: value.clone(),
            });
        }

        let Some(model) = &self.calculation_model else {
            return Ok(());
        };
        if let ApplicationRule::Unknown(value) = &model.application_rule {
            return Err(CalculationError::UnknownApplicationRule {
                fee_label: self.fee_label.clone(),
                value: value.clone(),
            });
        }
        match model
            .calculations
            .iter()
            .find_map(|c| match &c.calculation_type {
                CalculationType::Unknown(value) => Some(value),
                _ => None,
            }) {
            Some(value) => Err(CalculationError::UnknownCalculationType {
                fee_label: self.fee_label.clone(),
                value: value.clone(),
            }),
            None => Ok(()),
        }
    }
}

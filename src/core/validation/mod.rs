//! Fee runtime validation
//!
//! Checks a computed [`FeeCalculationState`] against its sum invariants and,
//! optionally, against the rules of the fee package that produced it.
//! Violations are collected, never raised: callers decide whether an error
//! blocks an operation or is only logged. Warnings are advisory.

pub mod calculation;
mod package;
mod state;

pub use calculation::{
    IndividualFeeCheck, calculate_expected_reference_amount, validate_individual_fee_calculation,
};

use crate::core::amount::AMOUNT_TOLERANCE;
use crate::core::error::CalculationError;
use crate::core::fee::{AppliedFee, FeeCalculationState, FeePackageRule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of validating a fee calculation state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn into_report(self) -> ValidationReport {
        ValidationReport {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Validator with configurable thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct FeeValidator {
    /// Maximum difference tolerated between two amounts
    pub tolerance: Decimal,
    /// Fee percentage above which a warning is emitted
    pub high_fee_warning_percent: Decimal,
    /// Fee percentage above which the state is invalid
    pub max_fee_percent: Decimal,
}

impl FeeValidator {
    pub fn new(tolerance: Decimal, high_fee_warning_percent: Decimal, max_fee_percent: Decimal) -> Self {
        Self {
            tolerance,
            high_fee_warning_percent,
            max_fee_percent,
        }
    }

    /// Validate `state`, and its package consistency when `package_rules` is given
    ///
    /// Unknown reference amounts or application rules in the package are
    /// reported as errors here; the lower-level functions return them as `Err`.
    pub fn validate(
        &self,
        state: &FeeCalculationState,
        package_rules: Option<&[FeePackageRule]>,
    ) -> ValidationReport {
        let mut findings = Findings::default();

        state::check_state(self, state, &mut findings);
        if let Some(rules) = package_rules {
            package::check_package(self, state, rules, &mut findings);
        }

        let report = findings.into_report();
        if report.is_valid {
            tracing::debug!(
                warnings = report.warnings.len(),
                total_fees = %state.total_fees,
                "fee calculation validated"
            );
        } else {
            tracing::warn!(errors = ?report.errors, "fee calculation failed validation");
        }
        report
    }

    /// [`validate_individual_fee_calculation`] within this validator's tolerance
    pub fn validate_individual_fee(
        &self,
        fee: &AppliedFee,
        rule: &FeePackageRule,
        reference_amount: Decimal,
    ) -> Result<IndividualFeeCheck, CalculationError> {
        calculation::recompute(fee, rule, reference_amount, self.tolerance)
    }
}

impl Default for FeeValidator {
    fn default() -> Self {
        Self::new(AMOUNT_TOLERANCE, Decimal::new(50, 0), Decimal::ONE_HUNDRED)
    }
}

/// Validate a fee calculation with the default thresholds
pub fn validate_fee_calculation(
    state: &FeeCalculationState,
    package_rules: Option<&[FeePackageRule]>,
) -> ValidationReport {
    FeeValidator::default().validate(state, package_rules)
}

/// Whether `fees` are sorted by non-decreasing priority
pub fn validate_fee_priority_order(fees: &[AppliedFee]) -> bool {
    fees.windows(2).all(|pair| pair[1].priority >= pair[0].priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fee::{
        ApplicationRule, Calculation, CalculationModel, CalculationType, ReferenceAmount,
    };

    fn fee(id: &str, amount: i64, deductible: bool, priority: i32) -> AppliedFee {
        AppliedFee {
            fee_id: id.to_string(),
            fee_label: format!("Fee {}", id),
            calculated_amount: Decimal::new(amount, 0),
            is_deductible_from: deductible,
            credit_account: "@fees".to_string(),
            priority,
        }
    }

    fn rule(id: &str, priority: i32, reference: ReferenceAmount) -> FeePackageRule {
        FeePackageRule {
            fee_id: id.to_string(),
            fee_label: format!("Fee {}", id),
            priority,
            reference_amount: reference,
            is_deductible_from: true,
            credit_account: "@fees".to_string(),
            calculation_model: None,
        }
    }

    fn state(fees: Vec<AppliedFee>) -> FeeCalculationState {
        FeeCalculationState::from_applied_fees(Decimal::new(100, 0), "USD", "@a", "@b", fees)
    }

    // === state invariants ===

    #[test]
    fn test_consistent_state_is_valid() {
        let report = validate_fee_calculation(&state(vec![fee("1", 10, true, 1)]), None);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_total_mismatch_is_error() {
        let mut s = state(vec![fee("1", 10, true, 1)]);
        s.total_fees = Decimal::new(12, 0);
        let report = validate_fee_calculation(&s, None);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("Fee totals mismatch")));
        assert!(report.errors.iter().any(|e| e.contains("Applied fees sum")));
    }

    #[test]
    fn test_tolerance_absorbs_cents() {
        let mut s = state(vec![fee("1", 10, true, 1)]);
        s.destination_receives_amount = Decimal::new(9001, 2);
        assert!(validate_fee_calculation(&s, None).is_valid);
    }

    #[test]
    fn test_source_and_destination_amounts_checked() {
        let mut s = state(vec![fee("1", 10, false, 1)]);
        s.source_pays_amount = Decimal::new(100, 0);
        s.destination_receives_amount = Decimal::new(90, 0);
        let report = validate_fee_calculation(&s, None);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_fees_above_original_amount() {
        let report = validate_fee_calculation(&state(vec![fee("1", 120, true, 1)]), None);
        assert!(report.errors.iter().any(|e| e.contains("negative amount")));
        assert!(report.errors.iter().any(|e| e.contains("limit")));
    }

    #[test]
    fn test_high_fee_percentage_warns() {
        let report = validate_fee_calculation(&state(vec![fee("1", 60, false, 1)]), None);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("High fee percentage"));
    }

    #[test]
    fn test_custom_thresholds() {
        let validator = FeeValidator::new(AMOUNT_TOLERANCE, Decimal::new(5, 0), Decimal::new(8, 0));
        let report = validator.validate(&state(vec![fee("1", 10, false, 1)]), None);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_missing_credit_account() {
        let mut f = fee("1", 10, true, 1);
        f.credit_account = String::new();
        let report = validate_fee_calculation(&state(vec![f]), None);
        assert_eq!(report.errors, vec!["Fee 'Fee 1' has no credit account".to_string()]);
    }

    #[test]
    fn test_duplicate_fee_ids_single_error() {
        let report = validate_fee_calculation(
            &state(vec![fee("1", 5, true, 1), fee("1", 5, true, 2)]),
            None,
        );
        let duplicates: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.contains("Duplicate fee IDs detected"))
            .collect();
        assert_eq!(duplicates.len(), 1);
    }

    // === package rules ===

    #[test]
    fn test_priority_one_must_use_original_amount() {
        let s = state(vec![fee("1", 10, true, 1)]);
        let rules = vec![rule("1", 1, ReferenceAmount::AfterFeesAmount)];
        let report = validate_fee_calculation(&s, Some(rules.as_slice()));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Fee 1"));
    }

    #[test]
    fn test_repeated_priorities_single_error() {
        let s = state(vec![fee("1", 5, true, 1), fee("2", 5, true, 2)]);
        let rules = vec![
            rule("1", 1, ReferenceAmount::OriginalAmount),
            rule("2", 2, ReferenceAmount::OriginalAmount),
            rule("3", 2, ReferenceAmount::OriginalAmount),
        ];
        let report = validate_fee_calculation(&s, Some(rules.as_slice()));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("unique"));
    }

    #[test]
    fn test_order_mismatch_is_warning() {
        let s = state(vec![fee("2", 5, true, 2), fee("1", 5, true, 1)]);
        let rules = vec![
            rule("1", 1, ReferenceAmount::OriginalAmount),
            rule("2", 2, ReferenceAmount::OriginalAmount),
        ];
        let report = validate_fee_calculation(&s, Some(rules.as_slice()));
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("expected [1, 2], got [2, 1]")));
    }

    #[test]
    fn test_after_fees_reference_is_advisory() {
        let s = state(vec![fee("1", 10, true, 1), fee("2", 9, true, 2)]);
        let rules = vec![
            rule("1", 1, ReferenceAmount::OriginalAmount),
            rule("2", 2, ReferenceAmount::AfterFeesAmount),
        ];
        let report = validate_fee_calculation(&s, Some(rules.as_slice()));
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("expected reference amount 90"));
    }

    #[test]
    fn test_model_mismatch_is_warning() {
        let s = state(vec![fee("1", 3, true, 1)]);
        let mut r = rule("1", 1, ReferenceAmount::OriginalAmount);
        r.calculation_model = Some(CalculationModel {
            application_rule: ApplicationRule::Percentual,
            calculations: vec![Calculation {
                calculation_type: CalculationType::Percentage,
                value: Decimal::new(2, 0),
            }],
        });
        let report = validate_fee_calculation(&s, Some(std::slice::from_ref(&r)));
        assert!(report.is_valid);
        assert!(report.warnings[0].contains("expected 2"));
    }

    #[test]
    fn test_unknown_reference_reported_as_error() {
        let s = state(vec![fee("1", 10, true, 1)]);
        let rules = vec![rule("1", 1, ReferenceAmount::Unknown("gross".to_string()))];
        let report = validate_fee_calculation(&s, Some(rules.as_slice()));
        assert!(report.errors.iter().any(|e| e.contains("Unknown reference amount 'gross'")));
    }

    // === priority order ===

    #[test]
    fn test_priority_order() {
        assert!(validate_fee_priority_order(&[]));
        assert!(validate_fee_priority_order(&[fee("1", 1, true, 1), fee("2", 1, true, 1), fee("3", 1, true, 3)]));
        assert!(!validate_fee_priority_order(&[fee("1", 1, true, 2), fee("2", 1, true, 1)]));
    }
}

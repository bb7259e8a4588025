//! Consistency checks between applied fees and their fee package

use super::calculation::{calculate_expected_reference_amount, recompute};
use super::{FeeValidator, Findings};
use crate::core::amount::{add_amounts, round2};
use crate::core::fee::{FeeCalculationState, FeePackageRule, ReferenceAmount};
use rust_decimal::Decimal;
use std::collections::HashSet;

pub(super) fn check_package(
    validator: &FeeValidator,
    state: &FeeCalculationState,
    rules: &[FeePackageRule],
    out: &mut Findings,
) {
    if rules.is_empty() {
        return;
    }

    let first: Vec<&FeePackageRule> = rules.iter().filter(|r| r.priority == 1).collect();
    if first.is_empty() {
        out.warning("Fee package has no rule with priority 1".to_string());
    }
    for rule in first {
        if rule.reference_amount != ReferenceAmount::OriginalAmount {
            out.error(format!(
                "Fee '{}' has priority 1 and must use originalAmount as its reference amount",
                rule.fee_label
            ));
        }
    }

    let mut priorities = HashSet::new();
    let mut repeated: Vec<i32> = rules
        .iter()
        .filter(|r| !priorities.insert(r.priority))
        .map(|r| r.priority)
        .collect();
    if !repeated.is_empty() {
        repeated.sort_unstable();
        repeated.dedup();
        let listed: Vec<String> = repeated.iter().map(i32::to_string).collect();
        out.error(format!(
            "Fee priorities must be unique within a package (repeated: {})",
            listed.join(", ")
        ));
    }

    let mut sorted: Vec<&FeePackageRule> = rules.iter().collect();
    sorted.sort_by_key(|r| r.priority);

    let applied_ids: HashSet<&str> = state.applied_fees.iter().map(|f| f.fee_id.as_str()).collect();
    let rule_ids: HashSet<&str> = rules.iter().map(|r| r.fee_id.as_str()).collect();
    let expected: Vec<&str> = sorted
        .iter()
        .map(|r| r.fee_id.as_str())
        .filter(|id| applied_ids.contains(id))
        .collect();
    let actual: Vec<&str> = state
        .applied_fees
        .iter()
        .map(|f| f.fee_id.as_str())
        .filter(|id| rule_ids.contains(id))
        .collect();
    if expected != actual {
        out.warning(format!(
            "Fees applied out of priority order: expected [{}], got [{}]",
            expected.join(", "),
            actual.join(", ")
        ));
    }

    let mut previous_deductible = Decimal::ZERO;
    for rule in sorted {
        let applied = state.applied_fees.iter().find(|f| f.fee_id == rule.fee_id);

        match calculate_expected_reference_amount(rule, state.original_amount, previous_deductible) {
            Ok(reference) => {
                if rule.reference_amount == ReferenceAmount::AfterFeesAmount && rule.priority > 1 {
                    out.warning(format!(
                        "Fee '{}' (priority {}) uses afterFeesAmount: expected reference amount {}",
                        rule.fee_label,
                        rule.priority,
                        round2(reference)
                    ));
                }

                if let Some(fee) = applied {
                    match recompute(fee, rule, reference, validator.tolerance) {
                        Ok(check) if !check.is_valid => {
                            out.warning(check.error.unwrap_or_else(|| {
                                format!("Fee '{}' does not match its calculation model", rule.fee_label)
                            }));
                        }
                        Ok(_) => {}
                        Err(e) => out.error(e.to_string()),
                    }
                }
            }
            Err(e) => out.error(e.to_string()),
        }

        if let Some(fee) = applied.filter(|f| f.is_deductible_from) {
            previous_deductible = add_amounts(previous_deductible, fee.calculated_amount);
        }
    }
}

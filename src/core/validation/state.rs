//! Invariant checks on a computed fee calculation state

use super::{FeeValidator, Findings};
use crate::core::amount::{round2, within_tolerance};
use crate::core::fee::{FeeCalculationState, checked_sum_fees};
use rust_decimal::Decimal;
use std::collections::HashSet;

pub(super) fn check_state(validator: &FeeValidator, state: &FeeCalculationState, out: &mut Findings) {
    let tol = validator.tolerance;

    let split_total = state.deductible_fees.checked_add(state.non_deductible_fees);
    if !agrees(split_total, Some(state.total_fees), tol) {
        out.error(format!(
            "Fee totals mismatch: deductible ({}) + non-deductible ({}) != total fees ({})",
            round2(state.deductible_fees),
            round2(state.non_deductible_fees),
            round2(state.total_fees)
        ));
    }

    let applied_total = checked_sum_fees(&state.applied_fees, None);
    if !agrees(applied_total, Some(state.total_fees), tol) {
        out.error(format!(
            "Applied fees sum ({}) does not match total fees ({})",
            shown(applied_total),
            round2(state.total_fees)
        ));
    }

    let applied_deductible = checked_sum_fees(&state.applied_fees, Some(true));
    if !agrees(applied_deductible, Some(state.deductible_fees), tol) {
        out.error(format!(
            "Deductible applied fees sum ({}) does not match deductible fees ({})",
            shown(applied_deductible),
            round2(state.deductible_fees)
        ));
    }

    let applied_non_deductible = checked_sum_fees(&state.applied_fees, Some(false));
    if !agrees(applied_non_deductible, Some(state.non_deductible_fees), tol) {
        out.error(format!(
            "Non-deductible applied fees sum ({}) does not match non-deductible fees ({})",
            shown(applied_non_deductible),
            round2(state.non_deductible_fees)
        ));
    }

    let expected_source_pays = state.original_amount.checked_add(state.non_deductible_fees);
    if !agrees(Some(state.source_pays_amount), expected_source_pays, tol) {
        out.error(format!(
            "Source pays amount ({}) should equal original amount plus non-deductible fees ({})",
            round2(state.source_pays_amount),
            shown(expected_source_pays)
        ));
    }

    let expected_destination = state.original_amount.checked_sub(state.deductible_fees);
    if !agrees(Some(state.destination_receives_amount), expected_destination, tol) {
        out.error(format!(
            "Destination receives amount ({}) should equal original amount minus deductible fees ({})",
            round2(state.destination_receives_amount),
            shown(expected_destination)
        ));
    }

    if state.destination_receives_amount < Decimal::ZERO {
        out.error(format!(
            "Destination receives a negative amount ({})",
            round2(state.destination_receives_amount)
        ));
    }

    if state.original_amount < Decimal::ZERO {
        out.error(format!(
            "Original amount must not be negative ({})",
            round2(state.original_amount)
        ));
    }

    match state.fee_percentage() {
        Some(percentage) if percentage > validator.max_fee_percent => {
            out.error(format!(
                "Fees represent {}% of the original amount, above the {}% limit",
                round2(percentage),
                validator.max_fee_percent
            ));
        }
        Some(percentage) if percentage > validator.high_fee_warning_percent => {
            out.warning(format!(
                "High fee percentage: fees represent {}% of the original amount",
                round2(percentage)
            ));
        }
        Some(_) => {}
        // a share too large for a Decimal, unless it is negative
        None if !state.original_amount.is_zero()
            && state.total_fees.is_sign_negative() == state.original_amount.is_sign_negative() =>
        {
            out.error(format!(
                "Fees of {} are out of proportion to the original amount ({}), above the {}% limit",
                round2(state.total_fees),
                state.original_amount,
                validator.max_fee_percent
            ));
        }
        None => {}
    }

    for fee in &state.applied_fees {
        if fee.credit_account.trim().is_empty() {
            out.error(format!("Fee '{}' has no credit account", fee.fee_label));
        }
        if fee.calculated_amount < Decimal::ZERO {
            out.error(format!(
                "Fee '{}' has a negative calculated amount ({})",
                fee.fee_label,
                round2(fee.calculated_amount)
            ));
        }
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for fee in &state.applied_fees {
        if !seen.insert(fee.fee_id.as_str()) && !duplicates.contains(&fee.fee_id.as_str()) {
            duplicates.push(&fee.fee_id);
        }
    }
    if !duplicates.is_empty() {
        out.error(format!(
            "Duplicate fee IDs detected: {}",
            duplicates.join(", ")
        ));
    }
}

/// Both amounts exist and are equal within `tolerance`
fn agrees(actual: Option<Decimal>, expected: Option<Decimal>, tolerance: Decimal) -> bool {
    match (actual, expected) {
        (Some(a), Some(e)) => within_tolerance(a, e, tolerance),
        _ => false,
    }
}

fn shown(amount: Option<Decimal>) -> String {
    amount
        .map(|a| round2(a).to_string())
        .unwrap_or_else(|| "overflow".to_string())
}

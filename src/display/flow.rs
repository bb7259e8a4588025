//! Flow construction: one flow per source account

use super::{DisplayOperation, OperationRole, TransactionFlow};
use crate::core::amount::{falls_short, mul_amounts, sum_amounts};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use uuid::Uuid;

/// A leg normalized from any input shape
#[derive(Debug, Clone)]
pub(crate) struct NormalizedLeg {
    pub alias: String,
    pub amount: Decimal,
    pub asset: String,
    pub description: Option<String>,
    pub chart_of_accounts: Option<String>,
    pub metadata: Option<Map<String, Value>>,
    pub is_fee: bool,
    pub is_deductible: Option<bool>,
}

impl NormalizedLeg {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn to_operation(&self, role: OperationRole, amount: Decimal) -> DisplayOperation {
        DisplayOperation {
            operation_id: Uuid::new_v4(),
            account_alias: self.alias.clone(),
            amount,
            asset: self.asset.clone(),
            role,
            description: self.description.clone(),
            chart_of_accounts: self.chart_of_accounts.clone(),
            is_deductible_from: self.is_deductible,
            metadata: self.metadata.clone(),
        }
    }
}

/// The 1:1 case: one source, one destination, any number of fees
pub(crate) fn simple_flow(
    source: &NormalizedLeg,
    destination: &NormalizedLeg,
    fees: &[&NormalizedLeg],
) -> TransactionFlow {
    assemble(
        source.to_operation(OperationRole::Source, source.amount),
        vec![destination.to_operation(OperationRole::Destination, destination.amount)],
        fees.iter()
            .map(|f| f.to_operation(OperationRole::Fee, f.amount))
            .collect(),
        true,
    )
}

/// The N:N case, allocating every destination proportionally to each source
///
/// This is a display approximation, not ledger attribution. A fee whose
/// `metadata.sourceAccount` names one of the sources goes entirely to that
/// source's flow; other fees are spread like destinations.
pub(crate) fn proportional_flows(
    sources: &[NormalizedLeg],
    destinations: &[&NormalizedLeg],
    fees: &[&NormalizedLeg],
) -> Vec<TransactionFlow> {
    let total = sum_amounts(sources.iter().map(|s| s.amount));
    let even_share = if sources.is_empty() {
        Decimal::ZERO
    } else {
        Decimal::ONE / Decimal::from(sources.len())
    };

    let attributed_to = |fee: &NormalizedLeg| {
        fee.metadata_str("sourceAccount")
            .filter(|account| sources.iter().any(|s| s.alias == *account))
            .map(str::to_string)
    };

    sources
        .iter()
        .map(|source| {
            let ratio = if total.is_zero() {
                even_share
            } else {
                source.amount.checked_div(total).unwrap_or(even_share)
            };

            let destination_operations = destinations
                .iter()
                .map(|d| d.to_operation(OperationRole::Destination, mul_amounts(d.amount, ratio)))
                .collect();

            let fee_operations = fees
                .iter()
                .filter_map(|f| match attributed_to(*f) {
                    Some(account) if account == source.alias => {
                        Some(f.to_operation(OperationRole::Fee, f.amount))
                    }
                    Some(_) => None,
                    None => Some(f.to_operation(OperationRole::Fee, mul_amounts(f.amount, ratio))),
                })
                .collect();

            assemble(
                source.to_operation(OperationRole::Source, source.amount),
                destination_operations,
                fee_operations,
                false,
            )
        })
        .collect()
}

fn assemble(
    source_operation: DisplayOperation,
    destination_operations: Vec<DisplayOperation>,
    fee_operations: Vec<DisplayOperation>,
    is_simple_flow: bool,
) -> TransactionFlow {
    let destination_total_amount = sum_amounts(destination_operations.iter().map(|o| o.amount));
    let fee_total_amount = sum_amounts(fee_operations.iter().map(|o| o.amount));

    TransactionFlow {
        flow_id: Uuid::new_v4(),
        source_amount: source_operation.amount,
        destination_total_amount,
        fee_total_amount,
        is_simple_flow,
        has_deductible_fees: fee_operations
            .iter()
            .any(|f| f.is_deductible_from == Some(true)),
        has_non_deductible_fees: fee_operations
            .iter()
            .any(|f| f.is_deductible_from == Some(false)),
        source_operation,
        destination_operations,
        fee_operations,
    }
}

/// Whether the destination legs add up to less than `original_amount`
pub(crate) fn has_shortfall(destinations: &[&NormalizedLeg], original_amount: Decimal, tolerance: Decimal) -> bool {
    let received = sum_amounts(destinations.iter().map(|d| d.amount));
    falls_short(received, original_amount, tolerance)
}

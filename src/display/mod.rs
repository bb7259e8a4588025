//! Transaction display mapping
//!
//! Normalizes form data, Fee Engine answers and persisted transactions into a
//! single [`TransactionDisplayData`] made of flows (source → destinations →
//! fees), a summary and display warnings.
//!
//! The result is a short-lived projection built fresh for every render.
//! Flow and operation ids are random on every call and must not be relied on
//! across calls.

mod flow;
pub mod mapper;

pub use mapper::{
    TransactionDisplayMapper, map_fee_calculation, map_form_data, map_persisted_transaction,
};

use crate::breakdown::FeeBreakdown;
use crate::core::amount::add_amounts;
use crate::core::fee::AppliedFee;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationRole {
    Source,
    Destination,
    Fee,
}

/// An operation as displayed inside a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOperation {
    pub operation_id: Uuid,
    pub account_alias: String,
    pub amount: Decimal,
    pub asset: String,
    pub role: OperationRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_of_accounts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deductible_from: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// One source account's contribution to the transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFlow {
    pub flow_id: Uuid,
    pub source_operation: DisplayOperation,
    pub destination_operations: Vec<DisplayOperation>,
    pub fee_operations: Vec<DisplayOperation>,
    pub source_amount: Decimal,
    pub destination_total_amount: Decimal,
    pub fee_total_amount: Decimal,
    pub is_simple_flow: bool,
    pub has_deductible_fees: bool,
    pub has_non_deductible_fees: bool,
}

/// Totals across all flows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySummary {
    pub asset: String,
    pub flow_count: usize,
    pub total_source_amount: Decimal,
    pub total_destination_amount: Decimal,
    pub total_fee_amount: Decimal,
    /// Accounts per role, de-duplicated, in order of first appearance
    pub source_accounts: Vec<String>,
    pub destination_accounts: Vec<String>,
    pub fee_accounts: Vec<String>,
}

impl DisplaySummary {
    fn of(flows: &[TransactionFlow], asset: &str) -> Self {
        let mut summary = DisplaySummary {
            asset: asset.to_string(),
            flow_count: flows.len(),
            ..Default::default()
        };

        for flow in flows {
            summary.total_source_amount = add_amounts(summary.total_source_amount, flow.source_amount);
            summary.total_destination_amount =
                add_amounts(summary.total_destination_amount, flow.destination_total_amount);
            summary.total_fee_amount = add_amounts(summary.total_fee_amount, flow.fee_total_amount);

            push_unique(&mut summary.source_accounts, &flow.source_operation.account_alias);
            for op in &flow.destination_operations {
                push_unique(&mut summary.destination_accounts, &op.account_alias);
            }
            for op in &flow.fee_operations {
                push_unique(&mut summary.fee_accounts, &op.account_alias);
            }
        }

        summary
    }
}

/// Fee calculation block shown next to the flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculationDisplay {
    pub original_amount: Decimal,
    pub total_fees: Decimal,
    pub deductible_fees: Decimal,
    pub non_deductible_fees: Decimal,
    pub source_pays_amount: Decimal,
    pub destination_receives_amount: Decimal,
    pub is_deductible_from: bool,
    pub fee_collector: String,
    pub applied_fees: Vec<AppliedFee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_label: Option<String>,
}

impl From<&FeeBreakdown> for FeeCalculationDisplay {
    fn from(breakdown: &FeeBreakdown) -> Self {
        let state = breakdown.to_calculation_state();
        Self {
            original_amount: state.original_amount,
            total_fees: state.total_fees,
            deductible_fees: state.deductible_fees,
            non_deductible_fees: state.non_deductible_fees,
            source_pays_amount: state.source_pays_amount,
            destination_receives_amount: state.destination_receives_amount,
            is_deductible_from: breakdown.is_deductible_from,
            fee_collector: breakdown.fee_collector.clone(),
            applied_fees: state.applied_fees,
            package_id: state.package_id,
            package_label: state.package_label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Simple,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// An account is both a source and a destination
    AccountOverlap,
    /// The Fee Engine merged operations on the same account
    MergedOperations,
    /// Nothing to build flows from
    NoSourceOperations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayWarning {
    pub kind: WarningKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
}

/// Everything a transaction view needs to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDisplayData {
    pub flows: Vec<TransactionFlow>,
    pub summary: DisplaySummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_calculation: Option<FeeCalculationDisplay>,
    pub display_mode: DisplayMode,
    pub warnings: Vec<DisplayWarning>,
}

fn push_unique(accounts: &mut Vec<String>, alias: &str) {
    if !accounts.iter().any(|a| a == alias) {
        accounts.push(alias.to_string());
    }
}

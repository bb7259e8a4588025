//! Fee breakdown derivation
//!
//! Given a transaction with fees applied, works out the original amount, each
//! fee line, who collects the fees and whether they were deducted from the
//! destination or added to the source.
//!
//! # Fee collection and deductibility
//!
//! The fee collector is always the account credited by a fee operation; it is
//! never assumed from the source or destination. Deductibility comes, in
//! order, from a fee leg's `metadata.isDeductibleFrom`, from the matching
//! Fee Engine rule, and finally from the destination shortfall: fees are
//! deductible when the destination receives less than the original amount.

pub mod input;
pub mod render;

pub use input::{FeeServiceResponse, TransactionDto, TransactionInput};
pub use render::{ReceiptLine, ReceiptLineKind};

use crate::core::amount::{
    AMOUNT_TOLERANCE, AmountValue, add_amounts, falls_short, parse_amount, sub_amounts, sum_amounts,
};
use crate::core::fee::{AppliedFee, FeeCalculationState};
use crate::core::operation::{FeeDetector, Leg, Operation, SignalSet};
use crate::transform::FeeRuleRef;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fee line of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownFee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_id: Option<String>,
    pub label: String,
    pub amount: Decimal,
    /// Account credited with this fee
    pub account: String,
    pub is_deductible_from: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// Derived fee breakdown of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub original_amount: Decimal,
    pub asset: String,
    pub total_fees: Decimal,
    pub applied_fees: Vec<BreakdownFee>,
    /// Whether any fee is deducted from what the destination receives
    pub is_deductible_from: bool,
    /// Account credited by the first fee operation
    pub fee_collector: String,
    /// Every account credited by a fee operation, in order of appearance
    pub fee_collectors: Vec<String>,
    pub source_account: String,
    pub destination_account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_label: Option<String>,
}

impl FeeBreakdown {
    pub fn deductible_fees(&self) -> Decimal {
        self.fees_where(true)
    }

    pub fn non_deductible_fees(&self) -> Decimal {
        self.fees_where(false)
    }

    /// What the source pays: original amount plus additive fees
    pub fn source_pays_amount(&self) -> Decimal {
        add_amounts(self.original_amount, self.non_deductible_fees())
    }

    /// What the destination receives: original amount minus deducted fees
    pub fn destination_receives_amount(&self) -> Decimal {
        sub_amounts(self.original_amount, self.deductible_fees())
    }

    /// Calculation state suitable for the runtime validator
    ///
    /// Fee lines without an id get a positional one (`fee-1`, `fee-2`, ...)
    /// and fee lines without a priority take their position.
    pub fn to_calculation_state(&self) -> FeeCalculationState {
        let applied = self
            .applied_fees
            .iter()
            .enumerate()
            .map(|(index, fee)| AppliedFee {
                fee_id: fee
                    .fee_id
                    .clone()
                    .unwrap_or_else(|| format!("fee-{}", index + 1)),
                fee_label: fee.label.clone(),
                calculated_amount: fee.amount,
                is_deductible_from: fee.is_deductible_from,
                credit_account: fee.account.clone(),
                priority: fee.priority.unwrap_or(index as i32 + 1),
            })
            .collect();

        FeeCalculationState::from_applied_fees(
            self.original_amount,
            self.asset.clone(),
            self.source_account.clone(),
            self.destination_account.clone(),
            applied,
        )
        .with_package(self.package_id.clone(), self.package_label.clone())
    }

    fn fees_where(&self, deductible: bool) -> Decimal {
        sum_amounts(
            self.applied_fees
                .iter()
                .filter(|f| f.is_deductible_from == deductible)
                .map(|f| f.amount),
        )
    }
}

/// Derives fee breakdowns with a given fee detector
#[derive(Debug, Clone)]
pub struct FeeBreakdownDeriver {
    detector: FeeDetector,
    tolerance: Decimal,
    plain_signals: SignalSet,
}

impl FeeBreakdownDeriver {
    /// A deriver accepting every fee signal on plain transactions, with the
    /// default amount tolerance
    pub fn new(detector: FeeDetector) -> Self {
        Self {
            detector,
            tolerance: AMOUNT_TOLERANCE,
            plain_signals: SignalSet::ALL,
        }
    }

    /// Tolerance of the destination shortfall check
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Signals accepted when classifying the legs of plain transactions
    pub fn with_plain_signals(mut self, signals: SignalSet) -> Self {
        self.plain_signals = signals;
        self
    }

    /// Derive the breakdown of `input`
    ///
    /// Returns `None` when there is nothing to show: no input, no fee
    /// operations, or fees summing to zero.
    pub fn derive(&self, input: Option<&TransactionInput>) -> Option<FeeBreakdown> {
        let breakdown = match input? {
            TransactionInput::FeeService(response) => self.derive_fee_service(response),
            TransactionInput::Plain(transaction) => self.derive_plain(transaction),
        };

        match &breakdown {
            Some(b) => tracing::debug!(
                total_fees = %b.total_fees,
                deductible = b.is_deductible_from,
                collector = %b.fee_collector,
                "derived fee breakdown"
            ),
            None => tracing::debug!("transaction carries no fees"),
        }
        breakdown
    }

    fn derive_fee_service(&self, response: &FeeServiceResponse) -> Option<FeeBreakdown> {
        let send = &response.transaction.send;
        let source_account = first_alias(&send.source.from);

        let (fees, main): (Vec<&Operation>, Vec<&Operation>) = send
            .distribute
            .to
            .iter()
            .partition(|op| self.detector.is_fee(*op, None, SignalSet::FEE_ENGINE));

        let totals = Totals::of(&fees, &main)?;
        let original_amount = Some(parse_amount(&send.value))
            .filter(|v| !v.is_zero())
            .unwrap_or_else(|| sum(send.source.from.iter()));
        let shortfall = falls_short(totals.destination_receives, original_amount, self.tolerance);

        let applied_fees = fees
            .iter()
            .enumerate()
            .map(|(index, op)| {
                let rule = match_rule(op, index, &response.fee_rules);
                BreakdownFee {
                    fee_id: rule
                        .and_then(|r| r.fee_id.clone())
                        .or_else(|| op.metadata_str("feeId").map(str::to_string)),
                    label: rule
                        .and_then(|r| r.fee_label.clone())
                        .unwrap_or_else(|| op.label()),
                    amount: op.value(),
                    account: op.account_alias.clone(),
                    is_deductible_from: op
                        .metadata_bool("isDeductibleFrom")
                        .or_else(|| rule.and_then(|r| r.is_deductible_from))
                        .unwrap_or(shortfall),
                    priority: rule.and_then(|r| r.priority),
                }
            })
            .collect();

        Some(assemble(
            original_amount,
            asset_of(&send.asset, &send.source.from),
            totals.total_fees,
            applied_fees,
            source_account,
            first_alias_of(&main),
            response.package_id.clone(),
            response.package_label.clone(),
        ))
    }

    fn derive_plain(&self, transaction: &TransactionDto) -> Option<FeeBreakdown> {
        let source_account = first_alias(&transaction.source);

        let (fees, main): (Vec<&Operation>, Vec<&Operation>) =
            transaction.destination.iter().partition(|op| {
                self.detector
                    .is_fee(*op, Some(source_account.as_str()), self.plain_signals)
            });

        let totals = Totals::of(&fees, &main)?;
        let original_amount = transaction
            .amount
            .as_ref()
            .map(AmountValue::decimal)
            .filter(|v| !v.is_zero())
            .unwrap_or_else(|| sum(transaction.source.iter()));
        let shortfall = falls_short(totals.destination_receives, original_amount, self.tolerance);

        let applied_fees = fees
            .iter()
            .map(|op| BreakdownFee {
                fee_id: op.metadata_str("feeId").map(str::to_string),
                label: op.label(),
                amount: op.value(),
                account: op.account_alias.clone(),
                is_deductible_from: op.metadata_bool("isDeductibleFrom").unwrap_or(shortfall),
                priority: None,
            })
            .collect();

        let asset = transaction.asset.clone().unwrap_or_default();

        Some(assemble(
            original_amount,
            asset_of(&asset, &transaction.source),
            totals.total_fees,
            applied_fees,
            source_account,
            first_alias_of(&main),
            None,
            None,
        ))
    }
}

impl Default for FeeBreakdownDeriver {
    fn default() -> Self {
        Self::new(FeeDetector::default())
    }
}

/// Derive a fee breakdown with the default fee detector
pub fn derive_fee_breakdown(input: Option<&TransactionInput>) -> Option<FeeBreakdown> {
    FeeBreakdownDeriver::default().derive(input)
}

struct Totals {
    destination_receives: Decimal,
    total_fees: Decimal,
}

impl Totals {
    /// `None` when there are no fees to show
    fn of(fees: &[&Operation], main: &[&Operation]) -> Option<Self> {
        if fees.is_empty() {
            return None;
        }

        let total_fees = sum(fees.iter().copied());
        if total_fees <= Decimal::ZERO {
            return None;
        }

        Some(Self {
            destination_receives: sum(main.iter().copied()),
            total_fees,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    original_amount: Decimal,
    asset: String,
    total_fees: Decimal,
    applied_fees: Vec<BreakdownFee>,
    source_account: String,
    destination_account: String,
    package_id: Option<String>,
    package_label: Option<String>,
) -> FeeBreakdown {
    let mut fee_collectors: Vec<String> = Vec::new();
    for fee in &applied_fees {
        if !fee_collectors.contains(&fee.account) {
            fee_collectors.push(fee.account.clone());
        }
    }

    FeeBreakdown {
        original_amount,
        asset,
        total_fees,
        is_deductible_from: applied_fees.iter().any(|f| f.is_deductible_from),
        fee_collector: fee_collectors.first().cloned().unwrap_or_default(),
        fee_collectors,
        applied_fees,
        source_account,
        destination_account,
        package_id,
        package_label,
    }
}

/// Match a fee leg to the engine's rule: by id, then label, then credited
/// account, then position
fn match_rule<'a>(op: &Operation, index: usize, rules: &'a [FeeRuleRef]) -> Option<&'a FeeRuleRef> {
    let fee_id = op.metadata_str("feeId");
    let label = op.metadata_str("feeLabel").or(op.description.as_deref());

    rules
        .iter()
        .find(|r| fee_id.is_some() && r.fee_id.as_deref() == fee_id)
        .or_else(|| {
            rules
                .iter()
                .find(|r| label.is_some() && r.fee_label.as_deref() == label)
        })
        .or_else(|| {
            rules
                .iter()
                .find(|r| r.credit_account.as_deref() == Some(op.account_alias.as_str()))
        })
        .or_else(|| rules.get(index))
}

fn sum<'a>(ops: impl Iterator<Item = &'a Operation>) -> Decimal {
    sum_amounts(ops.map(Operation::value))
}

fn first_alias(ops: &[Operation]) -> String {
    ops.first().map(|op| op.account_alias.clone()).unwrap_or_default()
}

fn first_alias_of(ops: &[&Operation]) -> String {
    ops.first().map(|op| op.account_alias.clone()).unwrap_or_default()
}

fn asset_of(declared: &str, legs: &[Operation]) -> String {
    if !declared.is_empty() {
        return declared.to_string();
    }
    legs.iter()
        .find_map(|op| op.asset())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::validate_fee_calculation;
    use serde_json::json;

    fn plain(value: serde_json::Value) -> TransactionInput {
        TransactionInput::from_value(&value).unwrap()
    }

    #[test]
    fn test_none_input_renders_nothing() {
        assert_eq!(derive_fee_breakdown(None), None);
    }

    #[test]
    fn test_no_fee_operations_is_suppressed() {
        let input = plain(json!({
            "amount": "100",
            "source": [{"accountAlias": "@alice", "amount": "100"}],
            "destination": [{"accountAlias": "@bob", "amount": "100", "description": "Rent"}]
        }));
        assert_eq!(derive_fee_breakdown(Some(&input)), None);
    }

    #[test]
    fn test_zero_fees_are_suppressed() {
        let input = plain(json!({
            "amount": "100",
            "source": [{"accountAlias": "@alice", "amount": "100"}],
            "destination": [
                {"accountAlias": "@bob", "amount": "100"},
                {"accountAlias": "@platform", "amount": "0", "description": "Service fee"}
            ]
        }));
        assert_eq!(derive_fee_breakdown(Some(&input)), None);
    }

    #[test]
    fn test_missing_arrays_degrade() {
        let input = plain(json!({"amount": "100"}));
        assert_eq!(derive_fee_breakdown(Some(&input)), None);
    }

    #[test]
    fn test_deductible_fee() {
        let input = plain(json!({
            "amount": "100",
            "asset": "USD",
            "source": [{"accountAlias": "@alice", "amount": "100"}],
            "destination": [
                {"accountAlias": "@bob", "amount": "90"},
                {"accountAlias": "@platform", "amount": "10", "description": "Service fee"}
            ]
        }));

        let breakdown = derive_fee_breakdown(Some(&input)).unwrap();
        assert!(breakdown.is_deductible_from);
        assert_eq!(breakdown.fee_collector, "@platform");
        assert_eq!(breakdown.source_account, "@alice");
        assert_eq!(breakdown.destination_account, "@bob");

        let state = breakdown.to_calculation_state();
        assert_eq!(state.destination_receives_amount, Decimal::new(90, 0));
        assert_eq!(state.source_pays_amount, Decimal::new(100, 0));
        assert!(validate_fee_calculation(&state, None).is_valid);
    }

    #[test]
    fn test_non_deductible_fee() {
        let input = plain(json!({
            "amount": "100",
            "source": [{"accountAlias": "@alice", "amount": "110"}],
            "destination": [
                {"accountAlias": "@bob", "amount": "100"},
                {"accountAlias": "@platform", "amount": "10", "description": "Service fee"}
            ]
        }));

        let breakdown = derive_fee_breakdown(Some(&input)).unwrap();
        assert!(!breakdown.is_deductible_from);
        assert_eq!(breakdown.fee_collector, "@platform");

        let state = breakdown.to_calculation_state();
        assert_eq!(state.source_pays_amount, Decimal::new(110, 0));
        assert_eq!(state.destination_receives_amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_source_echo_is_fee_in_plain_shape() {
        let input = plain(json!({
            "amount": "100",
            "source": [{"accountAlias": "@alice", "amount": "100"}],
            "destination": [
                {"accountAlias": "@bob", "amount": "95"},
                {"accountAlias": "@alice", "amount": "5"}
            ]
        }));

        let breakdown = derive_fee_breakdown(Some(&input)).unwrap();
        assert_eq!(breakdown.total_fees, Decimal::new(5, 0));
        assert_eq!(breakdown.fee_collector, "@alice");
    }

    #[test]
    fn test_source_echo_ignored_with_display_signals() {
        let input = plain(json!({
            "amount": "100",
            "source": [{"accountAlias": "@alice", "amount": "100"}],
            "destination": [
                {"accountAlias": "@bob", "amount": "95"},
                {"accountAlias": "@alice", "amount": "5"}
            ]
        }));

        let deriver = FeeBreakdownDeriver::default().with_plain_signals(SignalSet::DISPLAY);
        assert_eq!(deriver.derive(Some(&input)), None);
    }

    #[test]
    fn test_shortfall_within_tolerance_is_not_deductible() {
        let input = plain(json!({
            "amount": "100",
            "source": [{"accountAlias": "@alice", "amount": "100.50"}],
            "destination": [
                {"accountAlias": "@bob", "amount": "99.50"},
                {"accountAlias": "@platform", "amount": "1", "description": "Service fee"}
            ]
        }));

        let strict = derive_fee_breakdown(Some(&input)).unwrap();
        let lenient = FeeBreakdownDeriver::default()
            .with_tolerance(Decimal::ONE)
            .derive(Some(&input))
            .unwrap();
        assert!(strict.is_deductible_from);
        assert!(!lenient.is_deductible_from);
    }

    #[test]
    fn test_overflowing_legs_degrade() {
        let input = plain(json!({
            "source": [
                {"accountAlias": "@alice", "amount": "5e28"},
                {"accountAlias": "@carol", "amount": "5e28"}
            ],
            "destination": [
                {"accountAlias": "@bob", "amount": "5e28"},
                {"accountAlias": "@bob", "amount": "5e28"},
                {"accountAlias": "@platform", "amount": "1", "description": "Service fee"}
            ]
        }));

        let breakdown = derive_fee_breakdown(Some(&input)).unwrap();
        assert_eq!(breakdown.original_amount, Decimal::ZERO);
        assert_eq!(breakdown.total_fees, Decimal::ONE);
        assert!(!breakdown.is_deductible_from);
    }

    #[test]
    fn test_fee_service_uses_rules() {
        let input = plain(json!({
            "data": {
                "transaction": {
                    "send": {
                        "asset": "BRL",
                        "value": "100",
                        "source": {"from": [{"accountAlias": "@alice", "amount": {"asset": "BRL", "value": "102"}}]},
                        "distribute": {"to": [
                            {"accountAlias": "@bob", "amount": {"asset": "BRL", "value": "97"}},
                            {"accountAlias": "@fees", "amount": {"asset": "BRL", "value": "3"},
                             "metadata": {"source": "@bob", "feeId": "f1"}},
                            {"accountAlias": "@tax", "amount": {"asset": "BRL", "value": "2"},
                             "metadata": {"source": "@alice", "feeId": "f2"}}
                        ]}
                    }
                },
                "feeRules": [
                    {"feeId": "f1", "feeLabel": "Admin fee", "priority": 1, "isDeductibleFrom": true},
                    {"feeId": "f2", "feeLabel": "Tax", "priority": 2, "isDeductibleFrom": false}
                ],
                "packageId": "pkg-1"
            }
        }));

        let breakdown = derive_fee_breakdown(Some(&input)).unwrap();
        assert_eq!(breakdown.total_fees, Decimal::new(5, 0));
        assert_eq!(breakdown.deductible_fees(), Decimal::new(3, 0));
        assert_eq!(breakdown.non_deductible_fees(), Decimal::new(2, 0));
        assert_eq!(breakdown.fee_collectors, vec!["@fees", "@tax"]);
        assert_eq!(breakdown.applied_fees[0].label, "Admin fee");
        assert_eq!(breakdown.package_id.as_deref(), Some("pkg-1"));

        let state = breakdown.to_calculation_state();
        assert_eq!(state.source_pays_amount, Decimal::new(102, 0));
        assert_eq!(state.destination_receives_amount, Decimal::new(97, 0));
        assert!(validate_fee_calculation(&state, None).is_valid);
    }

    #[test]
    fn test_fee_service_ignores_keyword_heuristic() {
        let input = plain(json!({
            "transaction": {
                "send": {
                    "asset": "USD",
                    "value": "100",
                    "source": {"from": [{"accountAlias": "@a", "amount": {"asset": "USD", "value": "100"}}]},
                    "distribute": {"to": [{"accountAlias": "@fee-account", "amount": {"asset": "USD", "value": "100"}}]}
                }
            }
        }));
        assert_eq!(derive_fee_breakdown(Some(&input)), None);
    }

    #[test]
    fn test_fee_split_invariant_holds() {
        let input = plain(json!({
            "amount": "33.33",
            "source": [{"accountAlias": "@a", "amount": "33.33"}],
            "destination": [
                {"accountAlias": "@b", "amount": "32.32"},
                {"accountAlias": "@x", "amount": "0.667", "description": "fee 1"},
                {"accountAlias": "@y", "amount": "0.333", "description": "fee 2", "metadata": {"isDeductibleFrom": false}}
            ]
        }));

        let state = derive_fee_breakdown(Some(&input)).unwrap().to_calculation_state();
        assert_eq!(
            (state.deductible_fees + state.non_deductible_fees).round_dp(2),
            state.total_fees.round_dp(2)
        );
    }
}

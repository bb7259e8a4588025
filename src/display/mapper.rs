//! Input normalization and display assembly

use super::flow::{NormalizedLeg, has_shortfall, proportional_flows, simple_flow};
use super::{
    DisplayMode, DisplaySummary, DisplayWarning, FeeCalculationDisplay, TransactionDisplayData,
    WarningKind, push_unique,
};
use crate::breakdown::{BreakdownFee, FeeBreakdownDeriver, TransactionDto, TransactionInput};
use crate::core::amount::{AMOUNT_TOLERANCE, AmountValue, sum_amounts};
use crate::core::operation::{FeeDetector, Leg, SignalSet};
use crate::transform::{ConsoleTransaction, FeeEngineCalculateResponse};
use rust_decimal::Decimal;

/// Maps transactions into display data with a given fee detector
#[derive(Debug, Clone)]
pub struct TransactionDisplayMapper {
    detector: FeeDetector,
    deriver: FeeBreakdownDeriver,
    tolerance: Decimal,
}

impl TransactionDisplayMapper {
    pub fn new(detector: FeeDetector, tolerance: Decimal) -> Self {
        Self {
            deriver: FeeBreakdownDeriver::new(detector.clone())
                .with_tolerance(tolerance)
                .with_plain_signals(SignalSet::DISPLAY),
            detector,
            tolerance,
        }
    }

    /// Display data for a transaction still being edited in the console form
    pub fn map_form_data(&self, form: &ConsoleTransaction) -> TransactionDisplayData {
        let sources = self.normalize(&form.source, &form.asset, None, SignalSet::DISPLAY);
        let destinations = self.normalize(&form.destination, &form.asset, None, SignalSet::DISPLAY);

        let original_amount = Some(form.value.decimal())
            .filter(|v| !v.is_zero())
            .unwrap_or_else(|| sum_amounts(sources.iter().map(|s| s.amount)));

        self.assemble(sources, destinations, original_amount, &form.asset, None)
    }

    /// Display data for a Fee Engine answer, with the form it was computed from
    pub fn map_fee_calculation(
        &self,
        response: &FeeEngineCalculateResponse,
        form: &ConsoleTransaction,
    ) -> TransactionDisplayData {
        let send = &response.transaction.send;
        let asset = if send.asset.is_empty() { &form.asset } else { &send.asset };

        let breakdown = self
            .deriver
            .derive(Some(&TransactionInput::FeeService(response.clone())));
        let applied = breakdown.as_ref().map(|b| b.applied_fees.as_slice()).unwrap_or_default();

        let sources = self.normalize(&send.source.from, asset, None, SignalSet::FEE_ENGINE);
        let destinations =
            self.normalize(&send.distribute.to, asset, Some(applied), SignalSet::FEE_ENGINE);

        let original_amount = [form.value.decimal(), AmountValue::from(send.value.as_str()).decimal()]
            .into_iter()
            .find(|v| !v.is_zero())
            .unwrap_or_else(|| sum_amounts(sources.iter().map(|s| s.amount)));

        self.assemble(
            sources,
            destinations,
            original_amount,
            asset,
            breakdown.as_ref().map(FeeCalculationDisplay::from),
        )
    }

    /// Display data for a transaction stored by the ledger
    pub fn map_persisted_transaction(&self, transaction: &TransactionDto) -> TransactionDisplayData {
        let asset = transaction
            .asset
            .clone()
            .or_else(|| transaction.source.iter().find_map(|s| s.asset().map(str::to_string)))
            .unwrap_or_default();

        let breakdown = self
            .deriver
            .derive(Some(&TransactionInput::Plain(transaction.clone())));
        let applied = breakdown.as_ref().map(|b| b.applied_fees.as_slice()).unwrap_or_default();

        let sources = self.normalize(&transaction.source, &asset, None, SignalSet::DISPLAY);
        let destinations =
            self.normalize(&transaction.destination, &asset, Some(applied), SignalSet::DISPLAY);

        let original_amount = transaction
            .amount
            .as_ref()
            .map(AmountValue::decimal)
            .filter(|v| !v.is_zero())
            .unwrap_or_else(|| sum_amounts(sources.iter().map(|s| s.amount)));

        self.assemble(
            sources,
            destinations,
            original_amount,
            &asset,
            breakdown.as_ref().map(FeeCalculationDisplay::from),
        )
    }

    /// Normalize legs, resolving fee classification and, for fees known to
    /// `applied`, their deductibility
    fn normalize<L: Leg>(
        &self,
        legs: &[L],
        asset: &str,
        applied: Option<&[BreakdownFee]>,
        signals: SignalSet,
    ) -> Vec<NormalizedLeg> {
        let mut unmatched: Vec<&BreakdownFee> = applied.unwrap_or_default().iter().collect();

        legs.iter()
            .map(|leg| {
                let is_fee = self.detector.is_fee(leg, None, signals);
                let known = if is_fee {
                    take_matching(&mut unmatched, leg.account_alias(), leg.value())
                } else {
                    None
                };

                NormalizedLeg {
                    alias: leg.account_alias().to_string(),
                    amount: leg.value(),
                    asset: leg.asset().unwrap_or(asset).to_string(),
                    description: leg.description().map(str::to_string),
                    chart_of_accounts: leg.chart_of_accounts().map(str::to_string),
                    metadata: leg.metadata().cloned(),
                    is_fee,
                    is_deductible: leg
                        .metadata_bool("isDeductibleFrom")
                        .or(known.map(|f| f.is_deductible_from)),
                }
            })
            .collect()
    }

    fn assemble(
        &self,
        sources: Vec<NormalizedLeg>,
        mut destinations: Vec<NormalizedLeg>,
        original_amount: Decimal,
        asset: &str,
        fee_calculation: Option<FeeCalculationDisplay>,
    ) -> TransactionDisplayData {
        let warnings = collect_warnings(&sources, &destinations);

        let main_legs: Vec<&NormalizedLeg> = destinations.iter().filter(|d| !d.is_fee).collect();
        let shortfall = has_shortfall(&main_legs, original_amount, self.tolerance);
        for leg in destinations.iter_mut().filter(|d| d.is_fee) {
            leg.is_deductible.get_or_insert(shortfall);
        }

        let (fees, mains): (Vec<&NormalizedLeg>, Vec<&NormalizedLeg>) =
            destinations.iter().partition(|d| d.is_fee);

        let flows = if sources.len() == 1 && mains.len() == 1 {
            vec![simple_flow(&sources[0], mains[0], &fees)]
        } else {
            proportional_flows(&sources, &mains, &fees)
        };

        let display_mode = if flows.len() == 1 && flows[0].is_simple_flow {
            DisplayMode::Simple
        } else {
            DisplayMode::Complex
        };

        for warning in &warnings {
            tracing::warn!(kind = ?warning.kind, accounts = ?warning.accounts, "{}", warning.message);
        }
        tracing::debug!(flows = flows.len(), mode = ?display_mode, "mapped transaction for display");

        TransactionDisplayData {
            summary: DisplaySummary::of(&flows, asset),
            flows,
            fee_calculation,
            display_mode,
            warnings,
        }
    }
}

impl Default for TransactionDisplayMapper {
    fn default() -> Self {
        Self::new(FeeDetector::default(), AMOUNT_TOLERANCE)
    }
}

/// Display data for console form data, with the default fee detector
pub fn map_form_data(form: &ConsoleTransaction) -> TransactionDisplayData {
    TransactionDisplayMapper::default().map_form_data(form)
}

/// Display data for a Fee Engine answer, with the default fee detector
pub fn map_fee_calculation(
    response: &FeeEngineCalculateResponse,
    form: &ConsoleTransaction,
) -> TransactionDisplayData {
    TransactionDisplayMapper::default().map_fee_calculation(response, form)
}

/// Display data for a persisted transaction, with the default fee detector
pub fn map_persisted_transaction(transaction: &TransactionDto) -> TransactionDisplayData {
    TransactionDisplayMapper::default().map_persisted_transaction(transaction)
}

fn take_matching<'a>(
    unmatched: &mut Vec<&'a BreakdownFee>,
    account: &str,
    amount: Decimal,
) -> Option<&'a BreakdownFee> {
    let position = unmatched
        .iter()
        .position(|f| f.account == account && f.amount == amount)?;
    Some(unmatched.remove(position))
}

fn collect_warnings(sources: &[NormalizedLeg], destinations: &[NormalizedLeg]) -> Vec<DisplayWarning> {
    let mut warnings = Vec::new();

    if sources.is_empty() {
        warnings.push(DisplayWarning {
            kind: WarningKind::NoSourceOperations,
            message: "Transaction has no source operations".to_string(),
            accounts: Vec::new(),
        });
    }

    let mut overlapping = Vec::new();
    for source in sources {
        if destinations.iter().any(|d| d.alias == source.alias) {
            push_unique(&mut overlapping, &source.alias);
        }
    }
    if !overlapping.is_empty() {
        warnings.push(DisplayWarning {
            kind: WarningKind::AccountOverlap,
            message: format!(
                "Accounts appear as both source and destination: {}",
                overlapping.join(", ")
            ),
            accounts: overlapping,
        });
    }

    let mut merged = Vec::new();
    for leg in sources.iter().chain(destinations) {
        if is_merged(leg) {
            push_unique(&mut merged, &leg.alias);
        }
    }
    if !merged.is_empty() {
        warnings.push(DisplayWarning {
            kind: WarningKind::MergedOperations,
            message: format!(
                "Operations were merged by the fee engine for {}; display accuracy may be affected",
                merged.join(", ")
            ),
            accounts: merged,
        });
    }

    warnings
}

fn is_merged(leg: &NormalizedLeg) -> bool {
    match leg.metadata.as_ref().and_then(|m| m.get("isMerged")) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

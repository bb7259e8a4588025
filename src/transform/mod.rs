//! Request/response transformers between the console and the Fee Engine
//!
//! The console submits transactions as flat `source[]`/`destination[]` lists
//! with a transaction-level `value` and `asset`. The Fee Engine expects the
//! `send.source.from[]`/`send.distribute.to[]` shape with per-leg
//! `amount: { asset, value }`. Transformers never validate business rules.

pub mod console;
pub mod fee_engine;

pub use console::ConsoleTransaction;
pub use fee_engine::{
    DistributeField, FeeEngineCalculateRequest, FeeEngineCalculateResponse, FeeEngineSend,
    FeeEngineTransaction, FeeRuleRef, to_fee_api_value,
};

use crate::core::amount::MonetaryAmount;
use crate::core::operation::{ConsoleOperation, Operation};
use fee_engine::{DistributeLegs, SourceLegs};
use serde_json::{Map, Value};

/// Metadata key carrying the transaction route
pub const ROUTE_KEY: &str = "route";

/// Metadata key carrying the segment the fee package is resolved for
pub const SEGMENT_ID_KEY: &str = "segmentId";

/// Convert a console transaction into the Fee Engine shape
///
/// `route` moves out of metadata into its own field and `segmentId` is
/// dropped (see [`extract_segment_id`]). Empty group names, routes and
/// metadata are omitted from the output entirely.
pub fn convert_console_to_fee_engine(transaction: &ConsoleTransaction) -> FeeEngineTransaction {
    let mut metadata = transaction.metadata.clone().unwrap_or_default();
    let route = metadata
        .remove(ROUTE_KEY)
        .and_then(|v| v.as_str().map(str::to_string))
        .filter(|r| !r.trim().is_empty());
    metadata.remove(SEGMENT_ID_KEY);

    let asset = transaction.asset.clone();
    let to_engine = |leg: &ConsoleOperation| Operation {
        account_alias: leg.account_alias.clone(),
        amount: MonetaryAmount::new(leg.value.asset().unwrap_or(asset.as_str()), leg.value.raw_value()).into(),
        description: non_empty(leg.description.as_deref()),
        chart_of_accounts: non_empty(leg.chart_of_accounts.as_deref()),
        route: None,
        metadata: leg.metadata.clone().filter(|m| !m.is_empty()),
        is_fee: leg.is_fee,
    };

    FeeEngineTransaction {
        description: non_empty(transaction.description.as_deref()),
        chart_of_accounts_group_name: non_empty(
            transaction.chart_of_accounts_group_name.as_deref(),
        ),
        code: non_empty(transaction.code.as_deref()),
        pending: transaction.pending,
        route,
        metadata: Some(metadata).filter(|m| !m.is_empty()),
        send: FeeEngineSend {
            asset: transaction.asset.clone(),
            value: transaction.value.raw_value(),
            source: SourceLegs {
                from: transaction.source.iter().map(to_engine).collect(),
            },
            distribute: DistributeLegs {
                to: transaction.destination.iter().map(to_engine).collect(),
            },
        },
    }
}

/// Segment id carried in the console transaction metadata, if any
pub fn extract_segment_id(transaction: &ConsoleTransaction) -> Option<String> {
    transaction
        .metadata
        .as_ref()
        .and_then(|m| m.get(SEGMENT_ID_KEY))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Build the calculate request sent to the Fee Engine
pub fn build_calculate_request(
    transaction: &ConsoleTransaction,
    ledger_id: Option<&str>,
) -> FeeEngineCalculateRequest {
    FeeEngineCalculateRequest {
        ledger_id: non_empty(ledger_id),
        segment_id: extract_segment_id(transaction),
        transaction: convert_console_to_fee_engine(transaction),
    }
}

/// Convert a Fee Engine transaction back into the console shape
///
/// The route returns to metadata and leg amounts are flattened to values.
pub fn convert_fee_engine_to_console(transaction: &FeeEngineTransaction) -> ConsoleTransaction {
    let mut metadata: Map<String, Value> = transaction.metadata.clone().unwrap_or_default();
    if let Some(route) = &transaction.route {
        metadata.insert(ROUTE_KEY.to_string(), Value::String(route.clone()));
    }

    let to_console = |leg: &Operation| ConsoleOperation {
        account_alias: leg.account_alias.clone(),
        value: leg.amount.raw_value().as_str().into(),
        description: leg.description.clone(),
        chart_of_accounts: leg.chart_of_accounts.clone(),
        metadata: leg.metadata.clone(),
        is_fee: leg.is_fee,
    };

    ConsoleTransaction {
        description: transaction.description.clone(),
        chart_of_accounts_group_name: transaction.chart_of_accounts_group_name.clone(),
        code: transaction.code.clone(),
        pending: transaction.pending,
        asset: transaction.send.asset.clone(),
        value: transaction.send.value.as_str().into(),
        metadata: Some(metadata).filter(|m| !m.is_empty()),
        source: transaction.send.source.from.iter().map(to_console).collect(),
        destination: transaction.send.distribute.to.iter().map(to_console).collect(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

//! Input shapes accepted by the breakdown deriver
//!
//! UI components hand over either a Fee Engine answer or a persisted
//! transaction. The shape is decided once, on entry, by probing for
//! `transaction.send` (optionally wrapped in a `data` envelope).

use crate::core::amount::AmountValue;
use crate::core::operation::Operation;
use crate::transform::FeeEngineCalculateResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fee service answer as seen by the console
pub type FeeServiceResponse = FeeEngineCalculateResponse;

/// A transaction as persisted by the ledger and listed by the console
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,

    /// Original amount of the transaction, before fees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<AmountValue>,

    #[serde(default, alias = "assetCode", skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,

    #[serde(default)]
    pub source: Vec<Operation>,

    #[serde(default)]
    pub destination: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The two transaction shapes the deriver understands
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionInput {
    /// Fee Engine answer, `transaction.send` present
    FeeService(FeeServiceResponse),
    /// Plain persisted transaction with flat `source`/`destination`
    Plain(TransactionDto),
}

impl TransactionInput {
    /// Classify an arbitrary JSON value
    ///
    /// `null` and values matching neither shape yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }

        let candidate = value
            .get("data")
            .filter(|data| has_send(data))
            .unwrap_or(value);

        let parsed = if has_send(candidate) {
            serde_json::from_value(candidate.clone()).map(TransactionInput::FeeService)
        } else {
            serde_json::from_value(candidate.clone()).map(TransactionInput::Plain)
        };

        parsed
            .inspect_err(|e| tracing::debug!(error = %e, "transaction payload matches no known shape"))
            .ok()
    }
}

impl From<FeeServiceResponse> for TransactionInput {
    fn from(response: FeeServiceResponse) -> Self {
        TransactionInput::FeeService(response)
    }
}

impl From<TransactionDto> for TransactionInput {
    fn from(transaction: TransactionDto) -> Self {
        TransactionInput::Plain(transaction)
    }
}

fn has_send(value: &Value) -> bool {
    value
        .get("transaction")
        .and_then(|t| t.get("send"))
        .is_some_and(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_none() {
        assert_eq!(TransactionInput::from_value(&Value::Null), None);
    }

    #[test]
    fn test_fee_service_shape() {
        let value = json!({"transaction": {"send": {"asset": "USD", "value": "10"}}});
        assert!(matches!(
            TransactionInput::from_value(&value),
            Some(TransactionInput::FeeService(_))
        ));
    }

    #[test]
    fn test_data_envelope() {
        let value = json!({"data": {"transaction": {"send": {"asset": "USD", "value": "10"}}}});
        assert!(matches!(
            TransactionInput::from_value(&value),
            Some(TransactionInput::FeeService(_))
        ));
    }

    #[test]
    fn test_plain_shape() {
        let value = json!({"amount": "10", "source": [], "destination": []});
        assert!(matches!(
            TransactionInput::from_value(&value),
            Some(TransactionInput::Plain(_))
        ));
    }

    #[test]
    fn test_partial_plain_transaction_still_parses() {
        let value = json!({"description": "draft"});
        let Some(TransactionInput::Plain(dto)) = TransactionInput::from_value(&value) else {
            panic!("expected a plain transaction");
        };
        assert!(dto.source.is_empty());
        assert!(dto.destination.is_empty());
    }

    #[test]
    fn test_non_object_is_none() {
        assert_eq!(TransactionInput::from_value(&json!("oops")), None);
    }
}

//! Fee Engine request and response shapes
//!
//! The Fee Engine contract is owned by the external service. Two historical
//! dialects exist which differ in the spelling of the distribution key
//! (`distribute` and `distribuite`); both are accepted when reading and the
//! spelling used when writing is chosen by [`DistributeField`].

use crate::core::fee::ReferenceAmount;
use crate::core::operation::Operation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spelling of the distribution key in outbound requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributeField {
    #[default]
    Distribute,
    /// Legacy fees API spelling
    Distribuite,
}

impl DistributeField {
    pub fn key(&self) -> &'static str {
        match self {
            DistributeField::Distribute => "distribute",
            DistributeField::Distribuite => "distribuite",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceLegs {
    #[serde(default)]
    pub from: Vec<Operation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DistributeLegs {
    #[serde(default)]
    pub to: Vec<Operation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeeEngineSend {
    #[serde(default)]
    pub asset: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub source: SourceLegs,

    #[serde(default, alias = "distribuite")]
    pub distribute: DistributeLegs,
}

/// Transaction in the Fee Engine shape
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeEngineTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_of_accounts_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    pub send: FeeEngineSend,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeEngineCalculateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,

    pub transaction: FeeEngineTransaction,
}

/// Resolution of one fee as reported back by the Fee Engine
///
/// Every field is optional: older engines only report deductibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeRuleRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deductible_from: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_account: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_amount: Option<ReferenceAmount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_amount: Option<Decimal>,
}

/// Fee Engine answer: the transaction enriched with fee legs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeEngineCalculateResponse {
    pub transaction: FeeEngineTransaction,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fee_rules: Vec<FeeRuleRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
}

/// Serialize `request` for the fees API using the chosen distribution key
pub fn to_fee_api_value(
    request: &FeeEngineCalculateRequest,
    field: DistributeField,
) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(request)?;

    if field != DistributeField::Distribute {
        let send = value
            .get_mut("transaction")
            .and_then(|t| t.get_mut("send"))
            .and_then(Value::as_object_mut);
        if let Some(send) = send {
            if let Some(legs) = send.remove(DistributeField::Distribute.key()) {
                send.insert(field.key().to_string(), legs);
            }
        }
    }

    Ok(value)
}

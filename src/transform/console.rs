//! Transaction shape submitted by the console forms

use crate::core::amount::AmountValue;
use crate::core::operation::ConsoleOperation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A transaction as built by the console's transaction form
///
/// Every field defaults so partial drafts still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_of_accounts_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<bool>,

    #[serde(default)]
    pub asset: String,

    #[serde(default)]
    pub value: AmountValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(default)]
    pub source: Vec<ConsoleOperation>,

    #[serde(default)]
    pub destination: Vec<ConsoleOperation>,
}

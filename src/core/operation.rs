//! Transaction legs and fee detection
//!
//! A transaction is made of legs (source, destination and fee operations).
//! Two wire shapes exist: [`Operation`] as used by the Fee Engine and persisted
//! transactions, and [`ConsoleOperation`] as produced by the console forms.
//! Both are read through the [`Leg`] trait.

use super::amount::AmountValue;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Read-only view over a transaction leg
pub trait Leg {
    fn account_alias(&self) -> &str;
    fn value(&self) -> Decimal;
    fn asset(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
    fn chart_of_accounts(&self) -> Option<&str>;
    fn metadata(&self) -> Option<&Map<String, Value>>;

    /// Explicit fee tag set by an upstream service
    fn fee_tag(&self) -> Option<bool>;

    /// String metadata entry, empty strings ignored
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Boolean metadata entry; the strings "true"/"false" are accepted too
    fn metadata_bool(&self, key: &str) -> Option<bool> {
        match self.metadata().and_then(|m| m.get(key))? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Human label for the leg: description, then fee label metadata, then alias
    fn label(&self) -> String {
        self.description()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.metadata_str("feeLabel"))
            .or_else(|| self.chart_of_accounts().filter(|c| !c.trim().is_empty()))
            .unwrap_or_else(|| self.account_alias())
            .to_string()
    }
}

/// Operation leg as exchanged with the Fee Engine or stored on a transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(alias = "account", default)]
    pub account_alias: String,

    #[serde(default)]
    pub amount: AmountValue,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_of_accounts: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_fee: Option<bool>,
}

impl Operation {
    pub fn new(account_alias: impl Into<String>, amount: impl Into<AmountValue>) -> Self {
        Self {
            account_alias: account_alias.into(),
            amount: amount.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }
}

impl Leg for Operation {
    fn account_alias(&self) -> &str {
        &self.account_alias
    }

    fn value(&self) -> Decimal {
        self.amount.decimal()
    }

    fn asset(&self) -> Option<&str> {
        self.amount.asset()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn chart_of_accounts(&self) -> Option<&str> {
        self.chart_of_accounts.as_deref()
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    fn fee_tag(&self) -> Option<bool> {
        self.is_fee
    }
}

/// Operation leg as submitted by the console transaction form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleOperation {
    #[serde(default)]
    pub account_alias: String,

    #[serde(default)]
    pub value: AmountValue,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_of_accounts: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_fee: Option<bool>,
}

impl ConsoleOperation {
    pub fn new(account_alias: impl Into<String>, value: impl Into<AmountValue>) -> Self {
        Self {
            account_alias: account_alias.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}

impl Leg for ConsoleOperation {
    fn account_alias(&self) -> &str {
        &self.account_alias
    }

    fn value(&self) -> Decimal {
        self.value.decimal()
    }

    fn asset(&self) -> Option<&str> {
        self.value.asset()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn chart_of_accounts(&self) -> Option<&str> {
        self.chart_of_accounts.as_deref()
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    fn fee_tag(&self) -> Option<bool> {
        self.is_fee
    }
}

/// Why a leg was classified as a fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeSignal {
    /// `isFee: true` set upstream
    ExplicitTag,
    /// `metadata.source` set by the Fee Engine
    MetadataSource,
    /// Keyword found in description, chart of accounts or alias
    Keyword,
    /// Destination alias equals the transaction's source alias
    SourceEcho,
}

/// Which signals a caller accepts when classifying legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSet {
    pub metadata_source: bool,
    pub keyword: bool,
    pub source_echo: bool,
}

impl SignalSet {
    /// Explicit tags and Fee Engine metadata only
    pub const FEE_ENGINE: SignalSet = SignalSet {
        metadata_source: true,
        keyword: false,
        source_echo: false,
    };

    /// Every signal, for legacy plain transactions
    pub const ALL: SignalSet = SignalSet {
        metadata_source: true,
        keyword: true,
        source_echo: true,
    };

    /// Everything but the structural echo, which the display layer reports as an overlap instead
    pub const DISPLAY: SignalSet = SignalSet {
        metadata_source: true,
        keyword: true,
        source_echo: false,
    };
}

/// Keyword marking untagged legs as fees when none is configured
pub const DEFAULT_FEE_KEYWORD: &str = "fee";

/// Classifies legs as fee operations
///
/// Explicit tags always win. The keyword heuristic is kept for payloads that
/// predate tagging.
#[derive(Debug, Clone)]
pub struct FeeDetector {
    keywords: Option<Regex>,
}

impl FeeDetector {
    /// Build a detector matching any of `keywords`, case-insensitively
    pub fn new(keywords: &[String]) -> Result<Self, regex::Error> {
        let alternation = keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| regex::escape(k.trim()))
            .collect::<Vec<_>>()
            .join("|");

        // an empty alternation would match everything
        if alternation.is_empty() {
            return Ok(Self { keywords: None });
        }

        Ok(Self {
            keywords: Some(Regex::new(&format!("(?i)(?:{})", alternation))?),
        })
    }

    /// Classify `leg`, returning the first matching signal
    ///
    /// `source_alias` is the transaction's first source account, used by the
    /// structural echo signal.
    pub fn classify<L: Leg + ?Sized>(
        &self,
        leg: &L,
        source_alias: Option<&str>,
        signals: SignalSet,
    ) -> Option<FeeSignal> {
        match leg.fee_tag() {
            Some(true) => return Some(FeeSignal::ExplicitTag),
            Some(false) => return None,
            None => {}
        }

        if signals.metadata_source && leg.metadata_str("source").is_some() {
            return Some(FeeSignal::MetadataSource);
        }

        if signals.keyword && self.matches_keyword(leg) {
            return Some(FeeSignal::Keyword);
        }

        if signals.source_echo {
            if let Some(source) = source_alias.filter(|s| !s.is_empty()) {
                if leg.account_alias() == source {
                    return Some(FeeSignal::SourceEcho);
                }
            }
        }

        None
    }

    pub fn is_fee<L: Leg + ?Sized>(
        &self,
        leg: &L,
        source_alias: Option<&str>,
        signals: SignalSet,
    ) -> bool {
        self.classify(leg, source_alias, signals).is_some()
    }

    fn matches_keyword<L: Leg + ?Sized>(&self, leg: &L) -> bool {
        let Some(keywords) = &self.keywords else {
            return false;
        };

        [
            leg.description(),
            leg.chart_of_accounts(),
            Some(leg.account_alias()),
        ]
        .into_iter()
        .flatten()
        .any(|text| keywords.is_match(text))
    }
}

impl Default for FeeDetector {
    fn default() -> Self {
        static DEFAULT: OnceLock<FeeDetector> = OnceLock::new();
        DEFAULT
            .get_or_init(|| {
                FeeDetector::new(&[DEFAULT_FEE_KEYWORD.to_string()]).unwrap_or_else(|e| {
                    tracing::error!(error = %e, "default fee keyword rejected, keyword detection disabled");
                    FeeDetector { keywords: None }
                })
            })
            .clone()
    }
}

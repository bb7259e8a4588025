//! HTTP handlers for the fee endpoints
//!
//! Bodies are taken as raw JSON and decoded here so that malformed payloads
//! surface as [`FeeError`] responses with the crate's error codes.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::breakdown::{FeeBreakdown, FeeBreakdownDeriver, TransactionDto, TransactionInput};
use crate::config::FeeConfig;
use crate::core::error::{FeeError, InputError};
use crate::core::fee::{FeeCalculationState, FeePackageRule};
use crate::core::validation::{FeeValidator, ValidationReport};
use crate::display::{TransactionDisplayData, TransactionDisplayMapper};
use crate::transform::{
    ConsoleTransaction, FeeEngineCalculateResponse, build_calculate_request, to_fee_api_value,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FeeConfig>,
    pub deriver: Arc<FeeBreakdownDeriver>,
    pub validator: Arc<FeeValidator>,
    pub mapper: Arc<TransactionDisplayMapper>,
}

impl AppState {
    pub fn new(config: Arc<FeeConfig>) -> Result<Self, FeeError> {
        let detector = config.detector()?;
        Ok(Self {
            deriver: Arc::new(
                FeeBreakdownDeriver::new(detector.clone()).with_tolerance(config.amount_tolerance),
            ),
            validator: Arc::new(config.validator()),
            mapper: Arc::new(TransactionDisplayMapper::new(
                detector,
                config.amount_tolerance,
            )),
            config,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub state: FeeCalculationState,
    #[serde(default)]
    pub package_rules: Option<Vec<FeePackageRule>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    pub transaction: ConsoleTransaction,
    #[serde(default)]
    pub ledger_id: Option<String>,
}

/// POST /fees/breakdown
///
/// Returns `null` when the transaction carries no fees.
pub async fn derive_breakdown(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Option<FeeBreakdown>> {
    let input = TransactionInput::from_value(&payload);
    Json(state.deriver.derive(input.as_ref()))
}

/// POST /fees/validate
pub async fn validate_calculation(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<ValidationReport>, FeeError> {
    let request: ValidateRequest = decode(payload)?;

    let rules = request.package_rules.as_deref();
    for rule in rules.unwrap_or_default() {
        rule.ensure_known()?;
    }

    Ok(Json(state.validator.validate(&request.state, rules)))
}

/// POST /fees/transform
pub async fn transform_transaction(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, FeeError> {
    let request: TransformRequest = decode(payload)?;

    let calculate = build_calculate_request(&request.transaction, request.ledger_id.as_deref());
    let body = to_fee_api_value(&calculate, state.config.distribute_field)
        .map_err(InputError::from)?;

    tracing::debug!(
        segment_id = ?calculate.segment_id,
        field = state.config.distribute_field.key(),
        "built fee engine request"
    );
    Ok(Json(body))
}

/// POST /transactions/display
///
/// Accepts `{persisted}`, `{calculation, transaction}` or `{transaction}`.
pub async fn display_transaction(
    State(state): State<AppState>,
    Json(mut payload): Json<Value>,
) -> Result<Json<TransactionDisplayData>, FeeError> {
    if let Some(persisted) = take(&mut payload, "persisted") {
        let transaction: TransactionDto = decode(persisted)?;
        return Ok(Json(state.mapper.map_persisted_transaction(&transaction)));
    }

    let form: ConsoleTransaction = decode(
        take(&mut payload, "transaction").ok_or(InputError::MissingField("transaction"))?,
    )?;

    let data = match take(&mut payload, "calculation") {
        Some(calculation) => {
            let response: FeeEngineCalculateResponse = decode(calculation)?;
            state.mapper.map_fee_calculation(&response, &form)
        }
        None => state.mapper.map_form_data(&form),
    };
    Ok(Json(data))
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, InputError> {
    Ok(serde_json::from_value(value)?)
}

fn take(payload: &mut Value, key: &str) -> Option<Value> {
    payload
        .as_object_mut()
        .and_then(|body| body.remove(key))
        .filter(|v| !v.is_null())
}

//! Router for the fee endpoints

use super::handlers::{
    AppState, derive_breakdown, display_transaction, health, transform_transaction,
    validate_calculation,
};
use crate::config::FeeConfig;
use crate::core::error::FeeError;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the fee routes from configuration
///
/// - POST /fees/breakdown - Derive the fee breakdown of a transaction
/// - POST /fees/validate - Validate a fee calculation state
/// - POST /fees/transform - Build a Fee Engine request from form data
/// - POST /transactions/display - Map a transaction into display flows
/// - GET /health - Liveness probe
pub fn build_router(config: Arc<FeeConfig>) -> Result<Router, FeeError> {
    let state = AppState::new(config)?;

    Ok(Router::new()
        .route("/fees/breakdown", post(derive_breakdown))
        .route("/fees/validate", post(validate_calculation))
        .route("/fees/transform", post(transform_transaction))
        .route("/transactions/display", post(display_transaction))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state))
}

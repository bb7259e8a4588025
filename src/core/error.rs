//! Typed error handling for the fee engine
//!
//! Most of the crate never fails: malformed transactions degrade to empty
//! results and invariant violations are reported inside a
//! [`ValidationReport`](crate::core::validation::ValidationReport). The errors
//! below cover what must surface loudly instead.
//!
//! # Error Categories
//!
//! - [`CalculationError`]: fee package data the engine cannot interpret
//! - [`ConfigError`]: invalid fee engine configuration
//! - [`InputError`]: request bodies the HTTP exposure cannot map
//!
//! # Example
//!
//! ```rust,ignore
//! use midaz_fees::prelude::*;
//!
//! match calculate_expected_reference_amount(&rule, original, previous) {
//!     Ok(reference) => println!("reference: {}", reference),
//!     Err(CalculationError::UnknownReferenceAmount { value, .. }) => {
//!         eprintln!("fee package sent an unknown reference amount: {}", value);
//!     }
//!     Err(e) => return Err(FeeError::from(e)),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The main error type of the crate
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    /// Fee package data that cannot be evaluated
    #[error(transparent)]
    Calculation(#[from] CalculationError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request payload errors
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl FeeError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            FeeError::Calculation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FeeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FeeError::Input(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            FeeError::Calculation(e) => e.error_code(),
            FeeError::Config(_) => "CONFIG_ERROR",
            FeeError::Input(_) => "INVALID_INPUT",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for FeeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        } else {
            tracing::warn!(code = self.error_code(), "{}", self);
        }
        (status, Json(self.to_response())).into_response()
    }
}

// =============================================================================
// Calculation Errors
// =============================================================================

/// Fee package values outside the known enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    #[error("Unknown reference amount '{value}' for fee '{fee_label}'")]
    UnknownReferenceAmount { fee_label: String, value: String },

    #[error("Unknown application rule '{value}' for fee '{fee_label}'")]
    UnknownApplicationRule { fee_label: String, value: String },

    #[error("Unknown calculation type '{value}' for fee '{fee_label}'")]
    UnknownCalculationType { fee_label: String, value: String },

    #[error("Amounts for fee '{fee_label}' are out of range")]
    AmountOverflow { fee_label: String },
}

impl CalculationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CalculationError::UnknownReferenceAmount { .. } => "UNKNOWN_REFERENCE_AMOUNT",
            CalculationError::UnknownApplicationRule { .. } => "UNKNOWN_APPLICATION_RULE",
            CalculationError::UnknownCalculationType { .. } => "UNKNOWN_CALCULATION_TYPE",
            CalculationError::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid fee keyword pattern: {0}")]
    InvalidKeyword(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

// =============================================================================
// Input Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing field '{0}'")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculation_error_maps_to_422() {
        let err = FeeError::from(CalculationError::UnknownApplicationRule {
            fee_label: "Admin".to_string(),
            value: "tiered".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "UNKNOWN_APPLICATION_RULE");
        assert!(err.to_string().contains("tiered"));
    }

    #[test]
    fn test_input_error_response() {
        let err = FeeError::from(InputError::MissingField("transaction"));
        let body = err.to_response();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_INPUT");
        assert_eq!(body.message, "Missing field 'transaction'");
    }
}

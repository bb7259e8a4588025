//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses are properly formatted
//! - Error conversions work correctly

use axum::http::StatusCode;
use axum::response::IntoResponse;
use midaz_fees::prelude::*;

fn unknown_rule() -> CalculationError {
    CalculationError::UnknownApplicationRule {
        fee_label: "Admin".to_string(),
        value: "tiered".to_string(),
    }
}

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_calculation_error_returns_422() {
        let err = FeeError::from(unknown_rule());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_input_error_returns_400() {
        let err = FeeError::from(InputError::MissingField("state"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_config_error_returns_500() {
        let err = FeeError::from(ConfigError::from(
            regex::Regex::new("(").unwrap_err(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod response_tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let reference = FeeError::from(CalculationError::UnknownReferenceAmount {
            fee_label: "Admin".to_string(),
            value: "grossAmount".to_string(),
        });
        let calculation_type = FeeError::from(CalculationError::UnknownCalculationType {
            fee_label: "Admin".to_string(),
            value: "tiered".to_string(),
        });

        assert_eq!(reference.error_code(), "UNKNOWN_REFERENCE_AMOUNT");
        assert_eq!(calculation_type.error_code(), "UNKNOWN_CALCULATION_TYPE");
        assert_eq!(FeeError::from(unknown_rule()).error_code(), "UNKNOWN_APPLICATION_RULE");
    }

    #[test]
    fn test_response_body() {
        let response = FeeError::from(unknown_rule()).to_response();
        assert_eq!(response.code, "UNKNOWN_APPLICATION_RULE");
        assert_eq!(response.message, "Unknown application rule 'tiered' for fee 'Admin'");
    }

    #[test]
    fn test_into_response_status() {
        let response = FeeError::from(unknown_rule()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

// =============================================================================
// Error Conversion Tests
// =============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_serde_error_becomes_input_error() {
        let parse: std::result::Result<FeeCalculationState, _> = serde_json::from_value(json!({}));
        let err = FeeError::from(InputError::from(parse.unwrap_err()));
        assert!(matches!(err, FeeError::Input(InputError::Malformed(_))));
    }

    #[test]
    fn test_calculation_error_matching() {
        let rule: FeePackageRule = serde_json::from_value(json!({
            "feeId": "f1", "feeLabel": "Admin", "priority": 2,
            "referenceAmount": "netAmount", "isDeductibleFrom": true
        }))
        .unwrap();

        match calculate_expected_reference_amount(&rule, Decimal::ONE_HUNDRED, Decimal::ZERO) {
            Err(CalculationError::UnknownReferenceAmount { value, .. }) => assert_eq!(value, "netAmount"),
            other => panic!("expected an unknown reference amount, got {:?}", other),
        }
    }
}

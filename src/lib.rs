//! # Midaz Fees
//!
//! Fee reconciliation engine for the Midaz Console: how a transaction
//! submitted through the console becomes a Fee Engine request, how fee legs
//! are recognized in the answer, and how the result is checked and displayed.
//!
//! ## Features
//!
//! - **Transformers**: Console form data to the Fee Engine `send` shape and back
//! - **Fee Breakdown**: Original amount, fee lines, collector and deductibility
//! - **Runtime Validation**: Sum invariants and fee package rule consistency
//! - **Display Mapping**: Per-source flows, summaries and display warnings
//! - **Configuration-Based**: Tolerances and fee keywords from YAML
//! - **HTTP Exposure**: An axum router for the console backend
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use midaz_fees::prelude::*;
//!
//! let input = TransactionInput::from_value(&payload);
//! if let Some(breakdown) = derive_fee_breakdown(input.as_ref()) {
//!     let report = validate_fee_calculation(&breakdown.to_calculation_state(), None);
//!     assert!(report.is_valid);
//! }
//! ```

pub mod breakdown;
pub mod config;
pub mod core;
pub mod display;
pub mod server;
pub mod transform;

/// Install a `tracing` subscriber honoring `RUST_LOG`
///
/// Meant for binaries; the library itself never installs one.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // a subscriber may already be installed by the host application
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Re-exports of commonly used types and functions
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        amount::{AMOUNT_TOLERANCE, AmountValue, MonetaryAmount, format_amount, parse_amount},
        error::{CalculationError, ConfigError, ErrorResponse, FeeError, InputError},
        fee::{
            AppliedFee, ApplicationRule, Calculation, CalculationModel, CalculationType,
            FeeCalculationState, FeePackageRule, ReferenceAmount,
        },
        operation::{
            ConsoleOperation, DEFAULT_FEE_KEYWORD, FeeDetector, FeeSignal, Leg, Operation, SignalSet,
        },
        validation::{
            FeeValidator, IndividualFeeCheck, ValidationReport, calculate_expected_reference_amount,
            validate_fee_calculation, validate_fee_priority_order,
            validate_individual_fee_calculation,
        },
    };

    // === Transformers ===
    pub use crate::transform::{
        ConsoleTransaction, DistributeField, FeeEngineCalculateRequest, FeeEngineCalculateResponse,
        FeeEngineTransaction, FeeRuleRef, build_calculate_request, convert_console_to_fee_engine,
        convert_fee_engine_to_console, extract_segment_id, to_fee_api_value,
    };

    // === Breakdown ===
    pub use crate::breakdown::{
        BreakdownFee, FeeBreakdown, FeeBreakdownDeriver, FeeServiceResponse, ReceiptLine,
        ReceiptLineKind, TransactionDto, TransactionInput, derive_fee_breakdown,
    };

    // === Display ===
    pub use crate::display::{
        DisplayMode, DisplayOperation, DisplaySummary, DisplayWarning, FeeCalculationDisplay,
        OperationRole, TransactionDisplayData, TransactionDisplayMapper, TransactionFlow,
        WarningKind, map_fee_calculation, map_form_data, map_persisted_transaction,
    };

    // === Config ===
    pub use crate::config::{FeeConfig, FeeConfigOverlay};

    // === Server ===
    pub use crate::server::{AppState, build_router, serve};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use chrono::{DateTime, Utc};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}

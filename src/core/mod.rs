//! Core module containing the amount, operation and fee primitives

pub mod amount;
pub mod error;
pub mod fee;
pub mod operation;
pub mod validation;

pub use amount::{AMOUNT_TOLERANCE, AmountValue, MonetaryAmount, parse_amount};
pub use error::{CalculationError, ConfigError, FeeError, InputError};
pub use fee::{
    AppliedFee, ApplicationRule, Calculation, CalculationModel, CalculationType,
    FeeCalculationState, FeePackageRule, ReferenceAmount,
};
pub use operation::{ConsoleOperation, FeeDetector, FeeSignal, Leg, Operation, SignalSet};
pub use validation::{FeeValidator, ValidationReport};

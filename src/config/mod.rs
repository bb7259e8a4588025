//! Configuration loading and management

use crate::core::amount::AMOUNT_TOLERANCE;
use crate::core::error::ConfigError;
use crate::core::operation::{DEFAULT_FEE_KEYWORD, FeeDetector};
use crate::core::validation::FeeValidator;
use crate::transform::DistributeField;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Runtime configuration of the fee engine
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    /// Maximum difference tolerated between two amounts
    #[validate(custom(function = "validate_tolerance"))]
    pub amount_tolerance: Decimal,

    /// Fee percentage of the original amount above which a warning is emitted
    #[validate(custom(function = "validate_percent"))]
    pub high_fee_warning_percent: Decimal,

    /// Fee percentage of the original amount above which a state is invalid
    #[validate(custom(function = "validate_percent"))]
    pub max_fee_percent: Decimal,

    /// Keywords marking legacy untagged legs as fees
    #[validate(length(min = 1, message = "at least one fee keyword is required"))]
    pub fee_keywords: Vec<String>,

    /// Key the Fee Engine expects for the distribution legs
    pub distribute_field: DistributeField,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: AMOUNT_TOLERANCE,
            high_fee_warning_percent: Decimal::new(50, 0),
            max_fee_percent: Decimal::ONE_HUNDRED,
            fee_keywords: vec![DEFAULT_FEE_KEYWORD.to_string()],
            distribute_field: DistributeField::Distribute,
        }
    }
}

/// A partial configuration, as read from one YAML layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeConfigOverlay {
    pub amount_tolerance: Option<Decimal>,
    pub high_fee_warning_percent: Option<Decimal>,
    pub max_fee_percent: Option<Decimal>,
    pub fee_keywords: Option<Vec<String>>,
    pub distribute_field: Option<DistributeField>,
}

impl FeeConfigOverlay {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // an empty document parses as null
        let overlay: Option<Self> = serde_yaml::from_str(yaml)?;
        Ok(overlay.unwrap_or_default())
    }
}

impl FeeConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string, missing fields taking their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let overlay = FeeConfigOverlay::from_yaml_str(yaml)?;
        let config = Self::merge(vec![overlay]);
        config.validate().map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Overlay partial configurations on the defaults
    ///
    /// Later layers win field by field. The result is not validated.
    pub fn merge(layers: Vec<FeeConfigOverlay>) -> Self {
        layers
            .into_iter()
            .fold(Self::default(), |mut config, layer| {
                if let Some(tolerance) = layer.amount_tolerance {
                    config.amount_tolerance = tolerance;
                }
                if let Some(percent) = layer.high_fee_warning_percent {
                    config.high_fee_warning_percent = percent;
                }
                if let Some(percent) = layer.max_fee_percent {
                    config.max_fee_percent = percent;
                }
                if let Some(keywords) = layer.fee_keywords {
                    config.fee_keywords = keywords;
                }
                if let Some(field) = layer.distribute_field {
                    config.distribute_field = field;
                }
                config
            })
    }

    /// Fee detector matching the configured keywords
    pub fn detector(&self) -> Result<FeeDetector, ConfigError> {
        Ok(FeeDetector::new(&self.fee_keywords)?)
    }

    /// Runtime validator with the configured thresholds
    pub fn validator(&self) -> FeeValidator {
        FeeValidator::new(
            self.amount_tolerance,
            self.high_fee_warning_percent,
            self.max_fee_percent,
        )
    }
}

fn validate_tolerance(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || *value > Decimal::ONE {
        return Err(ValidationError::new("tolerance_out_of_range"));
    }
    Ok(())
}

fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || *value > Decimal::ONE_THOUSAND {
        return Err(ValidationError::new("percent_out_of_range"));
    }
    Ok(())
}

//! Integration tests for fee configuration loading and merging

use midaz_fees::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
amountTolerance: 0.05
highFeeWarningPercent: 10
maxFeePercent: 25
feeKeywords: [fee, tarifa]
distributeField: distribuite
"#,
    );

    let config = FeeConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.amount_tolerance, Decimal::new(5, 2));
    assert_eq!(config.max_fee_percent, Decimal::new(25, 0));
    assert_eq!(config.distribute_field, DistributeField::Distribuite);

    let validator = config.validator();
    assert_eq!(validator.tolerance, Decimal::new(5, 2));
    assert_eq!(validator.high_fee_warning_percent, Decimal::new(10, 0));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(FeeConfig::from_yaml_file("/nonexistent/fees.yaml").is_err());
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let file = write_config("feeKeywords: {not: a list}");
    assert!(FeeConfig::from_yaml_file(file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_validation_failure_is_a_config_error() {
    let err = FeeConfig::from_yaml_str("highFeeWarningPercent: 5000").unwrap_err();
    assert!(err.downcast_ref::<ConfigError>().is_some());
}

#[test]
fn test_merge_layers_over_defaults() {
    let base = FeeConfigOverlay::from_yaml_str("feeKeywords: [fee]\nmaxFeePercent: 80").unwrap();
    let tenant = FeeConfigOverlay::from_yaml_str("feeKeywords: [tarifa, taxa]").unwrap();

    let merged = FeeConfig::merge(vec![base, tenant]);

    assert_eq!(merged.fee_keywords, vec!["tarifa", "taxa"]);
    assert_eq!(merged.max_fee_percent, Decimal::new(80, 0));
    assert_eq!(merged.amount_tolerance, AMOUNT_TOLERANCE);
}

#[test]
fn test_merge_nothing_is_default() {
    assert_eq!(FeeConfig::merge(vec![]), FeeConfig::default());
}

#[test]
fn test_detector_follows_keywords() {
    let config = FeeConfig::from_yaml_str("feeKeywords: [tarifa]").unwrap();
    let detector = config.detector().unwrap();

    let tarifa = Operation::new("@bank", "1").with_description("Tarifa DOC");
    let fee = Operation::new("@bank", "1").with_description("Service fee");
    assert!(detector.is_fee(&tarifa, None, SignalSet::ALL));
    assert!(!detector.is_fee(&fee, None, SignalSet::ALL));
}

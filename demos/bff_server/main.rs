//! Console backend example
//!
//! This example demonstrates:
//! - Loading the fee configuration from YAML (or falling back to defaults)
//! - Serving the fee endpoints with graceful shutdown
//! - Deriving and validating a breakdown in-process before serving
//!
//! ```bash
//! cargo run --example bff_server
//! curl -X POST localhost:3000/fees/breakdown -H 'content-type: application/json' \
//!   -d '{"amount":"100","source":[{"accountAlias":"@alice","amount":"100"}],
//!        "destination":[{"accountAlias":"@bob","amount":"98"},
//!                       {"accountAlias":"@platform","amount":"2","description":"Service fee"}]}'
//! ```

use midaz_fees::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    midaz_fees::init_tracing();

    println!("💸 Midaz Fees BFF Example");
    println!("=========================\n");

    let config = match std::env::var("FEES_CONFIG") {
        Ok(path) => FeeConfig::from_yaml_file(&path)?,
        Err(_) => FeeConfig::default(),
    };
    println!("✅ Configuration:");
    println!("   - tolerance: {}", config.amount_tolerance);
    println!("   - fee keywords: {:?}", config.fee_keywords);
    println!("   - distribution key: {}\n", config.distribute_field.key());

    // Sanity run of the pipeline on a sample transaction
    let sample = json!({
        "amount": "100",
        "asset": "USD",
        "source": [{"accountAlias": "@alice", "amount": "100"}],
        "destination": [
            {"accountAlias": "@bob", "amount": "98"},
            {"accountAlias": "@platform", "amount": "2", "description": "Service fee"}
        ]
    });
    let deriver = FeeBreakdownDeriver::new(config.detector()?).with_tolerance(config.amount_tolerance);
    if let Some(breakdown) = deriver.derive(TransactionInput::from_value(&sample).as_ref()) {
        for line in breakdown.receipt_lines() {
            println!("   {:<45} {}", line.label, line.display);
        }
        let report = config.validator().validate(&breakdown.to_calculation_state(), None);
        println!("\n✅ Sample breakdown valid: {}\n", report.is_valid);
    }

    let addr = std::env::var("FEES_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    println!("🌐 Routes:");
    println!("   POST http://{}/fees/breakdown", addr);
    println!("   POST http://{}/fees/validate", addr);
    println!("   POST http://{}/fees/transform", addr);
    println!("   POST http://{}/transactions/display", addr);
    println!("   GET  http://{}/health\n", addr);

    serve(config, &addr).await
}

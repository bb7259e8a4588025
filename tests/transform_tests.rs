//! Integration tests for the console/Fee Engine transformers

use midaz_fees::prelude::*;

fn console() -> ConsoleTransaction {
    serde_json::from_value(json!({
        "description": "Invoice 42",
        "chartOfAccountsGroupName": "",
        "asset": "BRL",
        "value": "250.00",
        "metadata": {"route": "pix", "segmentId": "seg-9", "channel": "web"},
        "source": [{"accountAlias": "@alice", "value": "250.00"}],
        "destination": [{"accountAlias": "@bob", "value": "250.00", "description": "Payment"}]
    }))
    .unwrap()
}

#[test]
fn test_console_to_fee_engine_shape() {
    let engine = convert_console_to_fee_engine(&console());
    let body = serde_json::to_value(&engine).unwrap();

    assert_eq!(body["route"], "pix");
    assert_eq!(body["metadata"], json!({"channel": "web"}));
    assert!(body.get("chartOfAccountsGroupName").is_none());
    assert_eq!(body["send"]["value"], "250.00");
    assert_eq!(
        body["send"]["source"]["from"][0]["amount"],
        json!({"asset": "BRL", "value": "250.00"})
    );
    assert_eq!(body["send"]["distribute"]["to"][0]["description"], "Payment");
}

#[test]
fn test_empty_metadata_is_omitted() {
    let mut transaction = console();
    transaction.metadata = Some(
        json!({"route": "", "segmentId": "seg-9"})
            .as_object()
            .cloned()
            .unwrap(),
    );

    let body = serde_json::to_value(convert_console_to_fee_engine(&transaction)).unwrap();
    assert!(body.get("metadata").is_none());
    assert!(body.get("route").is_none());
}

#[test]
fn test_calculate_request_carries_segment() {
    let request = build_calculate_request(&console(), Some("ledger-1"));

    assert_eq!(request.segment_id.as_deref(), Some("seg-9"));
    assert_eq!(request.ledger_id.as_deref(), Some("ledger-1"));
    assert_eq!(extract_segment_id(&console()).as_deref(), Some("seg-9"));
}

#[test]
fn test_dialects() {
    let request = build_calculate_request(&console(), None);

    let modern = to_fee_api_value(&request, DistributeField::Distribute).unwrap();
    let legacy = to_fee_api_value(&request, DistributeField::Distribuite).unwrap();

    assert!(modern["transaction"]["send"].get("distribute").is_some());
    assert!(legacy["transaction"]["send"].get("distribute").is_none());
    assert_eq!(
        legacy["transaction"]["send"]["distribuite"],
        modern["transaction"]["send"]["distribute"]
    );
}

#[test]
fn test_round_trip_restores_route() {
    let back = convert_fee_engine_to_console(&convert_console_to_fee_engine(&console()));

    assert_eq!(back.asset, "BRL");
    assert_eq!(back.source[0].value.decimal(), Decimal::new(25000, 2));
    assert_eq!(
        back.metadata.as_ref().and_then(|m| m.get("route")),
        Some(&json!("pix"))
    );
}

#[test]
fn test_missing_legs_degrade_to_empty() {
    let transaction: ConsoleTransaction = serde_json::from_value(json!({"asset": "USD"})).unwrap();
    let engine = convert_console_to_fee_engine(&transaction);

    assert!(engine.send.source.from.is_empty());
    assert!(engine.send.distribute.to.is_empty());
}

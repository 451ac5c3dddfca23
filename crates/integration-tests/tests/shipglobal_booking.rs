//! Booking an order with ShipGlobal.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use reqwest::Method;
use seller_console::{
    FetchError, OrderFeed, PickupAddressId, ShipGlobalError, ShipGlobalOrder, ShipGlobalOrderId,
};
use seller_console_core::{OrderKey, PurchaseOrderId, ValidationError};
use seller_console_integration_tests::{MockBackend, TEST_TOKEN, loaded_view, shipglobal};
use serde_json::json;

async fn booking_form(backend: &MockBackend) -> ShipGlobalOrder {
    let view = loaded_view(
        OrderFeed::Unshipped,
        backend,
        json!([{
            "purchaseOrderId": "P1",
            "customerOrderId": "C1",
            "phone": "5550100",
            "shippingAddress": {
                "name": "Asha Rao",
                "address1": "12 Elm St",
                "city": "Austin",
                "state": "TX",
                "postalCode": "73301"
            },
            "orderInfo": [{"lineNumber": 1, "productName": "Rose Face Serum", "qtyAmount": "2", "chargeAmount": "12.5"}]
        }]),
    )
    .await;
    let order = view
        .order(&OrderKey::Purchase(PurchaseOrderId::new("P1")))
        .await
        .unwrap();
    ShipGlobalOrder::from_order(&order, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
}

// =============================================================================
// Pickup addresses
// =============================================================================

#[tokio::test]
async fn test_pickup_addresses_reads_data_list() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shipglobal/pickup/get-pickup-address",
        json!({"data": [{"address_id": 3, "address": "Plot 4", "city": "Pune", "default": "1"}]}),
    );

    let addresses = shipglobal(&backend).pickup_addresses().await.unwrap();

    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].address_id, PickupAddressId::new("3"));
    assert!(addresses[0].is_default());
    assert_eq!(backend.requests()[0].token.as_deref(), Some(TEST_TOKEN));
}

#[tokio::test]
async fn test_pickup_addresses_without_data_is_empty() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shipglobal/pickup/get-pickup-address",
        json!({"message": "no addresses"}),
    );

    assert!(shipglobal(&backend).pickup_addresses().await.unwrap().is_empty());
}

// =============================================================================
// Invoice and rates
// =============================================================================

#[tokio::test]
async fn test_validate_invoice_sends_items_and_package() {
    let backend = MockBackend::new();
    let form = booking_form(&backend).await;
    backend.reply(
        Method::POST,
        "/shipglobal/orders/validate-order-invoice",
        json!({"message": "Item invoice validated successfully"}),
    );

    shipglobal(&backend).validate_invoice(&form).await.unwrap();

    let body = backend.requests().pop().unwrap().body.unwrap();
    assert_eq!(body["csbv"], 0);
    assert_eq!(body["country_code"], "US");
    assert_eq!(body["currency_code"], "INR");
    assert_eq!(body["vendor_order_item"][0]["vendor_order_item_name"], "Rose Face Serum");
    assert_eq!(body["vendor_order_item"][0]["vendor_order_item_quantity"], 2);
}

#[tokio::test]
async fn test_validate_invoice_other_message_is_rejected() {
    let backend = MockBackend::new();
    let form = booking_form(&backend).await;
    backend.reply(
        Method::POST,
        "/shipglobal/orders/validate-order-invoice",
        json!({"message": "HSN not allowed"}),
    );

    let err = shipglobal(&backend).validate_invoice(&form).await.unwrap_err();

    assert!(matches!(err, ShipGlobalError::Rejected(_)));
}

#[tokio::test]
async fn test_incomplete_form_makes_no_request() {
    let backend = MockBackend::new();
    let mut form = booking_form(&backend).await;
    form.customer_shipping_postcode.clear();
    let before = backend.request_count();

    let err = shipglobal(&backend).validate_invoice(&form).await.unwrap_err();

    assert!(matches!(
        err,
        ShipGlobalError::Validation(ValidationError::IncompleteEditableFields(ref missing))
            if missing == &vec!["customer_shipping_postcode".to_string()]
    ));
    assert_eq!(backend.request_count(), before);
}

#[tokio::test]
async fn test_shipper_rates() {
    let backend = MockBackend::new();
    let form = booking_form(&backend).await;
    backend.reply(
        Method::POST,
        "/shipglobal/orders/get-shipper-rates",
        json!({"data": {"rate": [
            {"provider_code": "sgx", "display_name": "SG Express", "transit_time": "5-7 days", "rate": 1450, "bill_weight_kg": 0.5}
        ]}}),
    );

    let rates = shipglobal(&backend).shipper_rates(&form).await.unwrap();

    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].provider_code, "sgx");
    let body = backend.requests().pop().unwrap().body.unwrap();
    assert_eq!(body["customer_shipping_postcode"], "73301");
    assert!(body.get("vendor_order_item").is_none());
}

#[tokio::test]
async fn test_shipper_rates_missing_is_rejected() {
    let backend = MockBackend::new();
    let form = booking_form(&backend).await;
    backend.reply(
        Method::POST,
        "/shipglobal/orders/get-shipper-rates",
        json!({"data": {}}),
    );

    let err = shipglobal(&backend).shipper_rates(&form).await.unwrap_err();

    assert!(matches!(err, ShipGlobalError::Rejected(_)));
}

// =============================================================================
// Order and draft
// =============================================================================

#[tokio::test]
async fn test_add_order_then_draft() {
    let backend = MockBackend::new();
    let form = booking_form(&backend).await;
    backend.reply(
        Method::POST,
        "/shipglobal/orders/add-order",
        json!({"data": {"order_id": 99812}}),
    );
    backend.reply(Method::POST, "/shipglobal/orders/pay-order", json!({"status": "ok"}));
    let client = shipglobal(&backend);

    let order_id = client
        .add_order(&form, &PickupAddressId::new("3"), "sgx")
        .await
        .unwrap();
    assert_eq!(order_id, ShipGlobalOrderId::new("99812"));
    client.create_draft(&order_id).await.unwrap();

    let requests = backend.requests();
    let add = requests[requests.len() - 2].body.clone().unwrap();
    assert_eq!(add["pickup_address_id"], "3");
    assert_eq!(add["shipper"], "sgx");
    assert_eq!(add["vendor_invoice_no"], "INV-C1");
    assert_eq!(add["vendor_order_date"], "2024-05-01");
    let draft = requests[requests.len() - 1].body.clone().unwrap();
    assert_eq!(draft, json!({"order_id": "99812", "add_to_draft": true}));
}

#[tokio::test]
async fn test_add_order_without_id_is_rejected() {
    let backend = MockBackend::new();
    let form = booking_form(&backend).await;
    backend.reply(
        Method::POST,
        "/shipglobal/orders/add-order",
        json!({"data": {"message": "duplicate invoice"}}),
    );

    let err = shipglobal(&backend)
        .add_order(&form, &PickupAddressId::new("3"), "sgx")
        .await
        .unwrap_err();

    assert!(matches!(err, ShipGlobalError::Rejected(_)));
}

#[tokio::test]
async fn test_add_order_requires_shipper() {
    let backend = MockBackend::new();
    let form = booking_form(&backend).await;

    let err = shipglobal(&backend)
        .add_order(&form, &PickupAddressId::new("3"), " ")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ShipGlobalError::Validation(ValidationError::MissingField("shipper"))
    ));
}

#[tokio::test]
async fn test_forbidden_is_unauthenticated() {
    let backend = MockBackend::new();
    backend.fail(
        Method::GET,
        "/shipglobal/pickup/get-pickup-address",
        FetchError::from_status(401, String::new()),
    );

    let err = shipglobal(&backend).pickup_addresses().await.unwrap_err();

    assert!(err.is_unauthenticated());
}

//! Courier and geography analytics queries.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use reqwest::Method;
use seller_console::analytics::{DEFAULT_MIN_ORDERS, DEFAULT_PINCODE_LIMIT};
use seller_console::{AnalyticsError, DateRange, StaticToken};
use seller_console_core::ValidationError;
use seller_console_integration_tests::{MockBackend, analytics};
use serde_json::json;

fn may() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
    )
    .unwrap()
}

fn range_query() -> Vec<(String, String)> {
    vec![
        ("startDate".to_string(), "2024-05-01".to_string()),
        ("endDate".to_string(), "2024-05-31".to_string()),
    ]
}

#[tokio::test]
async fn test_courier_performance_sends_date_range() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/courier/performance",
        json!({
            "courierMetrics": [{"courierName": "Delhivery", "deliveryMetrics": {"totalOrders": 10, "successRate": 90.0}}],
            "overallSummary": {"totalOrders": 10, "totalDelivered": 9}
        }),
    );

    let performance = analytics(&backend).courier_performance(may()).await.unwrap();

    assert_eq!(performance.courier_metrics[0].courier_name, "Delhivery");
    assert_eq!(performance.overall_summary.total_delivered, 9);
    assert_eq!(backend.requests()[0].query, range_query());
}

#[tokio::test]
async fn test_courier_details_path_names_courier() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/courier/Blue Dart/details",
        json!({"courierName": "Blue Dart", "rtoMetrics": {"rtoCount": 3}}),
    );

    let details = analytics(&backend)
        .courier_details("Blue Dart", may())
        .await
        .unwrap();

    assert_eq!(details.rto_metrics.rto_count, 3);
}

#[tokio::test]
async fn test_courier_details_blank_name_makes_no_request() {
    let backend = MockBackend::new();

    let err = analytics(&backend)
        .courier_details("  ", may())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AnalyticsError::Validation(ValidationError::MissingField("courierName"))
    ));
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_pincode_performance_sends_limit() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/geography/pincode",
        json!({"pincodeMetrics": [
            {"pincode": "411001", "totalOrders": 4, "avgDeliveryDays": 3.0},
            {"pincode": "110001", "totalOrders": 6, "avgDeliveryDays": 6.0}
        ]}),
    );

    let pincodes = analytics(&backend)
        .pincode_performance(may(), DEFAULT_PINCODE_LIMIT)
        .await
        .unwrap();

    assert_eq!(pincodes.totals().total_orders, 10);
    assert_eq!(pincodes.slowest(1)[0].pincode.as_deref(), Some("110001"));
    let mut expected = range_query();
    expected.push(("limit".to_string(), "50".to_string()));
    assert_eq!(backend.requests()[0].query, expected);
}

#[tokio::test]
async fn test_city_and_state_performance() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/geography/city",
        json!({"cityMetrics": [{"city": "Pune", "totalOrders": 12}]}),
    );
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/geography/state",
        json!({"stateMetrics": [{"state": "MH", "totalOrders": 30}], "generatedAt": "2024-06-01"}),
    );
    let client = analytics(&backend);

    let cities = client.city_performance(may()).await.unwrap();
    let states = client.state_performance(may()).await.unwrap();

    assert_eq!(cities.city_metrics[0].city.as_deref(), Some("Pune"));
    assert_eq!(states.state_metrics[0].total_orders, 30);
    assert_eq!(states.extra.get("generatedAt"), Some(&json!("2024-06-01")));
}

#[tokio::test]
async fn test_problem_areas_sends_min_orders() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/geography/problem-areas",
        json!({"highRTOPincodes": [{"pincode": "110001", "rtoRate": 40.0}]}),
    );

    let areas = analytics(&backend)
        .problem_areas(may(), DEFAULT_MIN_ORDERS)
        .await
        .unwrap();

    assert_eq!(areas.high_rto_pincodes.len(), 1);
    assert!(areas.slow_delivery_pincodes.is_empty());
    let query = backend.requests()[0].query.clone();
    assert_eq!(query.last().unwrap(), &("minOrders".to_string(), "10".to_string()));
}

#[tokio::test]
async fn test_empty_body_is_empty_summary() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/geography/problem-areas",
        json!(null),
    );

    let areas = analytics(&backend).problem_areas(may(), 5).await.unwrap();

    assert!(areas.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let backend = MockBackend::new();
    backend.reply(
        Method::GET,
        "/shopify/orders/analytics/courier/performance",
        json!({"courierMetrics": "not a list"}),
    );

    let err = analytics(&backend).courier_performance(may()).await.unwrap_err();

    assert!(matches!(err, AnalyticsError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_logged_out_makes_no_request() {
    let backend = MockBackend::new();
    let client = seller_console::Analytics::new(backend.clone(), StaticToken::none());

    let err = client.courier_performance(may()).await.unwrap_err();

    assert!(err.is_unauthenticated());
    assert_eq!(backend.request_count(), 0);
}

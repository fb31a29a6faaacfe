//! Aggregate credit summary.

mod common;

use common::{dec, json_dec, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn summary_reports_outstanding_debt_across_credits() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let customer_a = Uuid::new_v4();
    let customer_b = Uuid::new_v4();
    let sale_a = app.seed_credit_sale(customer_a, "1000").await;
    let _sale_b = app.seed_credit_sale(customer_b, "2000").await;

    let response = app
        .register_payment(sale_a, json!({"amount": "500", "payment_method": "cash"}))
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = app.get("/credits/summary").await.json().await.unwrap();
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(json_dec(&data["total_pending"]), dec("2500"));
    assert_eq!(data["total_credits"], 2);
    assert_eq!(data["customers_with_debt"], 2);
}

#[tokio::test]
async fn fully_paid_credits_drop_out_of_the_summary() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let customer = Uuid::new_v4();
    let sale = app.seed_credit_sale(customer, "1000").await;
    let response = app
        .register_payment(sale, json!({"amount": "1000", "payment_method": "cash"}))
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = app.get("/credits/summary").await.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(json_dec(&data["total_pending"]), dec("0"));
    assert_eq!(data["total_credits"], 0);
    assert_eq!(data["customers_with_debt"], 0);
}

#[tokio::test]
async fn summary_is_empty_for_a_fresh_tenant() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let body: serde_json::Value = app.get("/credits/summary").await.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(json_dec(&data["total_pending"]), dec("0"));
    assert_eq!(data["total_credits"], 0);
    assert_eq!(data["customers_with_debt"], 0);
}

//! Per-customer balance aggregation.

mod common;

use common::{dec, json_dec, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn balance_aggregates_across_a_customers_credits() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let customer = Uuid::new_v4();
    let sale_a = app.seed_credit_sale(customer, "1000").await;
    let _sale_b = app.seed_credit_sale(customer, "2000").await;

    let response = app
        .register_payment(sale_a, json!({"amount": "400", "payment_method": "cash"}))
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = app
        .get(&format!("/customers/{}/balance", customer))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["customer_id"], customer.to_string());
    assert_eq!(json_dec(&data["total_credit"]), dec("3000"));
    assert_eq!(json_dec(&data["total_paid"]), dec("400"));
    assert_eq!(json_dec(&data["balance"]), dec("2600"));
}

#[tokio::test]
async fn unknown_customer_has_a_zero_balance() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let customer = Uuid::new_v4();
    let body: serde_json::Value = app
        .get(&format!("/customers/{}/balance", customer))
        .await
        .json()
        .await
        .unwrap();
    let data = &body["data"];
    assert_eq!(data["customer_id"], customer.to_string());
    assert_eq!(json_dec(&data["total_credit"]), dec("0"));
    assert_eq!(json_dec(&data["total_paid"]), dec("0"));
    assert_eq!(json_dec(&data["balance"]), dec("0"));
}

#[tokio::test]
async fn balance_ignores_cash_and_voided_sales() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let customer = Uuid::new_v4();
    app.seed_credit_sale(customer, "1000").await;
    app.seed_sale(
        Some(customer),
        Some("Test Customer"),
        dec("500"),
        "cash",
        "completed",
        None,
    )
    .await;
    app.seed_sale(
        Some(customer),
        Some("Test Customer"),
        dec("700"),
        "store_credit",
        "voided",
        None,
    )
    .await;

    let body: serde_json::Value = app
        .get(&format!("/customers/{}/balance", customer))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json_dec(&body["data"]["total_credit"]), dec("1000"));
}

#[tokio::test]
async fn balance_listing_orders_by_debt_and_paginates() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let small_debtor = Uuid::new_v4();
    let big_debtor = Uuid::new_v4();
    app.seed_credit_sale(small_debtor, "1000").await;
    app.seed_credit_sale(big_debtor, "5000").await;

    let body: serde_json::Value = app.get("/customers/balances").await.json().await.unwrap();
    let data = &body["data"];
    let balances = data["customers"].as_array().unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0]["customer_id"], big_debtor.to_string());
    assert_eq!(balances[1]["customer_id"], small_debtor.to_string());
    assert_eq!(data["pagination"]["total"], 2);

    let page_two: serde_json::Value = app
        .get("/customers/balances?page=2&limit=1")
        .await
        .json()
        .await
        .unwrap();
    let balances = page_two["data"]["customers"].as_array().unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0]["customer_id"], small_debtor.to_string());
}

#[tokio::test]
async fn balances_are_scoped_to_the_tenant() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let customer = Uuid::new_v4();
    app.seed_credit_sale(customer, "1000").await;

    let body: serde_json::Value = app
        .get_as_tenant("/customers/balances", Uuid::new_v4())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["customers"].as_array().unwrap().len(), 0);
}

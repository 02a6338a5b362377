//! Invoice API HTTP Handler Tests

use super::{build_test_router, delete_json, get_json, patch_json, post_json, TestAppState};
use crate::api::seed_client;
use axum::http::StatusCode;
use axum::Router;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn current_period() -> String {
    Utc::now().format("%Y%m").to_string()
}

async fn create_invoice(app: &Router, token: &str, body: Value) -> (StatusCode, Value) {
    post_json(app, "/api/invoices/createInvoice", Some(token), &body).await
}

#[tokio::test]
async fn test_create_invoice_numbers_and_totals() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({
            "clientId": client.id.to_string(),
            "amount": 1000,
            "tax": 180.5,
            "dueDate": "2026-12-31",
            "description": "GST filing Q3"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Invoice created successfully");
    let invoice = &body["data"];
    assert_eq!(
        invoice["invoiceNumber"],
        format!("INV-{}-0001", current_period())
    );
    assert_eq!(invoice["amount"].as_f64(), Some(1000.0));
    assert_eq!(invoice["tax"].as_f64(), Some(180.5));
    assert_eq!(invoice["totalAmount"].as_f64(), Some(1180.5));
    assert_eq!(invoice["status"], "DRAFT");
    assert!(invoice["dueDate"].as_str().unwrap().starts_with("2026-12-31"));
    assert_eq!(invoice["client"]["companyName"], "Meera Traders Pvt Ltd");
    assert_eq!(invoice["issuedBy"]["caProfile"]["firm"], "Rao & Associates");

    let (_, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 500, "dueDate": "2026-12-31" }),
    )
    .await;
    assert_eq!(
        body["data"]["invoiceNumber"],
        format!("INV-{}-0002", current_period())
    );
    assert_eq!(body["data"]["tax"].as_f64(), Some(0.0));
    assert_eq!(body["data"]["totalAmount"].as_f64(), Some(500.0));
}

#[tokio::test]
async fn test_invoice_numbers_are_shared_across_cas() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (first, first_token) = state.ca_with_token("asha@example.com").await;
    let (second, second_token) = state.ca_with_token("vikram@example.com").await;
    let a = seed_client(&state.store, first, "Meera Traders", true).await;
    let b = seed_client(&state.store, second, "Kiran Stores", true).await;

    let (_, one) = create_invoice(
        &app,
        &first_token,
        json!({ "clientId": a.id.to_string(), "amount": 10, "dueDate": "2026-12-31" }),
    )
    .await;
    let (_, two) = create_invoice(
        &app,
        &second_token,
        json!({ "clientId": b.id.to_string(), "amount": 10, "dueDate": "2026-12-31" }),
    )
    .await;

    assert_ne!(one["data"]["invoiceNumber"], two["data"]["invoiceNumber"]);
    assert!(two["data"]["invoiceNumber"].as_str().unwrap().ends_with("-0002"));
}

#[tokio::test]
async fn test_create_invoice_for_unusable_client() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let inactive = seed_client(&state.store, owner, "Closed Co", false).await;

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": inactive.id.to_string(), "amount": 10, "dueDate": "2026-12-31" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Client not found or you do not have permission to create invoices for this client"
    );
    assert!(state.store.read().await.sequences.is_empty());
}

#[tokio::test]
async fn test_create_invoice_validation() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": -5, "dueDate": "someday" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["amount", "dueDate"]);

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "dueDate": "2026-12-31" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");
    assert_eq!(body["errors"][0]["code"], "required");
}

#[tokio::test]
async fn test_create_invoice_rejects_sub_cent_amounts() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 100.005, "tax": 0.005, "dueDate": "2026-12-31" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");
    assert_eq!(body["errors"][0]["code"], "scale");
    assert_eq!(body["errors"][1]["field"], "tax");
    assert!(state.store.read().await.invoices.is_empty());
    assert!(state.store.read().await.sequences.is_empty());
}

#[tokio::test]
async fn test_create_invoice_rejects_amounts_beyond_column() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 99999999999999.0, "dueDate": "2026-12-31" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");
    assert_eq!(body["errors"][0]["code"], "range");

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 9000000000i64, "tax": 1000000000, "dueDate": "2026-12-31" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "totalAmount");
    assert!(state.store.read().await.sequences.is_empty());

    let (status, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 100.1, "tax": 18.02, "dueDate": "2026-12-31" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["totalAmount"].as_f64(), Some(118.12));
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = patch_json(
        &app,
        &format!("/api/invoices/updateInvoice/{}", id),
        Some(&token),
        &json!({ "amount": 9999999999.99 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "totalAmount");
}

#[tokio::test]
async fn test_update_invoice_recomputes_total() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;
    let (_, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 1000, "tax": 180, "dueDate": "2026-12-31" }),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let number = body["data"]["invoiceNumber"].clone();

    let (status, body) = patch_json(
        &app,
        &format!("/api/invoices/updateInvoice/{}", id),
        Some(&token),
        &json!({ "amount": 2000, "status": "SENT" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invoice updated successfully");
    assert_eq!(body["data"]["totalAmount"].as_f64(), Some(2180.0));
    assert_eq!(body["data"]["status"], "SENT");
    assert_eq!(body["data"]["invoiceNumber"], number);
}

#[tokio::test]
async fn test_only_drafts_can_be_deleted() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;

    let (_, paid) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 10, "dueDate": "2026-12-31", "status": "PAID" }),
    )
    .await;
    let (_, draft) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 10, "dueDate": "2026-12-31" }),
    )
    .await;

    let (status, body) = delete_json(
        &app,
        &format!("/api/invoices/deleteInvoice/{}", paid["data"]["id"].as_str().unwrap()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "only draft invoices can be deleted");

    let (status, body) = delete_json(
        &app,
        &format!("/api/invoices/deleteInvoice/{}", draft["data"]["id"].as_str().unwrap()),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invoice deleted successfully");
    assert_eq!(state.store.read().await.invoices.len(), 1);
}

#[tokio::test]
async fn test_invoice_of_another_ca_is_invisible() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let (_, other_token) = state.ca_with_token("vikram@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;
    let (_, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 10, "dueDate": "2026-12-31" }),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) =
        get_json(&app, &format!("/api/invoices/getInvoice/{}", id), Some(&other_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invoice not found");

    let (status, body) = delete_json(
        &app,
        &format!("/api/invoices/deleteInvoice/{}", id),
        Some(&other_token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Invoice not found or you do not have permission to delete it"
    );
}

#[tokio::test]
async fn test_list_invoices_filters() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let meera = seed_client(&state.store, owner, "Meera Traders", true).await;
    let kiran = seed_client(&state.store, owner, "Kiran Stores", true).await;
    for (client, status) in [(&meera, "DRAFT"), (&meera, "PAID"), (&kiran, "PAID")] {
        create_invoice(
            &app,
            &token,
            json!({ "clientId": client.id.to_string(), "amount": 10, "dueDate": "2026-12-31", "status": status }),
        )
        .await;
    }

    let (status, body) = get_json(&app, "/api/invoices/getAllInvoices", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["totalCount"], 3);

    let (_, body) =
        get_json(&app, "/api/invoices/getAllInvoices?status=PAID", Some(&token)).await;
    assert_eq!(body["pagination"]["totalCount"], 2);

    let (_, body) = get_json(
        &app,
        &format!("/api/invoices/getAllInvoices?status=PAID&clientId={}", meera.id),
        Some(&token),
    )
    .await;
    assert_eq!(body["pagination"]["totalCount"], 1);

    let (_, body) = get_json(&app, "/api/invoices/getAllInvoices?search=kiran", Some(&token)).await;
    assert_eq!(body["data"][0]["client"]["name"], "Kiran Stores");

    let (_, body) = get_json(
        &app,
        "/api/invoices/getAllInvoices?sortBy=invoiceNumber&sortOrder=asc",
        Some(&token),
    )
    .await;
    assert!(body["data"][0]["invoiceNumber"].as_str().unwrap().ends_with("-0001"));

    let (status, body) =
        get_json(&app, "/api/invoices/getAllInvoices?status=LOST", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "status");
}

#[tokio::test]
async fn test_updating_tax_alone_keeps_amount() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;
    let (_, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 100, "tax": 18, "dueDate": "2026-12-31" }),
    )
    .await;
    assert_eq!(body["data"]["totalAmount"].as_f64(), Some(118.0));
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = patch_json(
        &app,
        &format!("/api/invoices/updateInvoice/{}", id),
        Some(&token),
        &json!({ "tax": 20 }),
    )
    .await;

    assert_eq!(body["data"]["amount"].as_f64(), Some(100.0));
    assert_eq!(body["data"]["totalAmount"].as_f64(), Some(120.0));
}

#[tokio::test]
async fn test_invoices_stay_readable_after_client_deactivation() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let (owner, token) = state.ca_with_token("asha@example.com").await;
    let client = seed_client(&state.store, owner, "Meera Traders", true).await;
    let (_, body) = create_invoice(
        &app,
        &token,
        json!({ "clientId": client.id.to_string(), "amount": 10, "dueDate": "2026-12-31" }),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    delete_json(&app, &format!("/api/clients/delete/{}", client.id), Some(&token)).await;

    let (status, body) =
        get_json(&app, &format!("/api/invoices/getInvoice/{}", id), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["client"]["name"], "Meera Traders");

    let (_, body) = get_json(&app, "/api/clients/getClients", Some(&token)).await;
    assert_eq!(body["pagination"]["totalCount"], 0);
}

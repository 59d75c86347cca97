//! Integration tests for the console pages: products, orders, carts and
//! the dashboard, driven through a signed-in browser session.
//!
//! Run with: cargo test -p storedesk-integration-tests

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use storedesk_core::Price;

use storedesk_integration_tests::{FakeBackend, browser, location, sign_in, spawn_admin};

const EMAIL: &str = "ops@shop.test";
const PASSWORD: &str = "s3cret-pass";

/// Signed-in client plus the console's base URL.
async fn signed_in(backend: &FakeBackend) -> (Client, String) {
    backend.add_account(EMAIL, PASSWORD, Some("Ops"));
    let admin_url = spawn_admin(backend).await;
    let client = browser();

    let resp = sign_in(&client, &admin_url, EMAIL, PASSWORD).await;
    assert_eq!(location(&resp), Some("/dashboard"), "Sign-in should succeed");
    (client, admin_url)
}

async fn get_page(client: &Client, url: String) -> (StatusCode, String) {
    let resp = client.get(url).send().await.expect("Failed to send request");
    let status = resp.status();
    (status, resp.text().await.expect("Failed to read body"))
}

fn row_id(row: &Value) -> String {
    row["id"].as_str().expect("Row has no id").to_owned()
}

fn seed_product(backend: &FakeBackend, title: &str, description: &str) -> String {
    row_id(&backend.insert(
        "products",
        json!({
            "title": title,
            "description": description,
            "price": "12.50",
            "stock": 4,
            "category": "cosplay",
            "images": ["https://img.test/thumb.png"],
        }),
    ))
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_products_page_lists_and_searches() {
    let backend = FakeBackend::start().await;
    seed_product(&backend, "Silver Wig", "Shoulder length");
    seed_product(&backend, "Lip Balm", "Cherry flavoured");
    let (client, admin_url) = signed_in(&backend).await;

    let (status, body) = get_page(&client, format!("{admin_url}/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Silver Wig"));
    assert!(body.contains("Lip Balm"));
    assert!(body.contains("$12.50"));

    let (_, body) = get_page(&client, format!("{admin_url}/products?q=cherry")).await;
    assert!(body.contains("Lip Balm"));
    assert!(!body.contains("Silver Wig"));
}

#[tokio::test]
async fn test_create_product_through_form() {
    let backend = FakeBackend::start().await;
    let (client, admin_url) = signed_in(&backend).await;

    let resp = client
        .post(format!("{admin_url}/products"))
        .form(&[
            ("title", "Cape"),
            ("description", "Velvet"),
            ("price", "30"),
            ("stock", "2"),
            ("category", "cosplay"),
            ("sub_category", "outerwear"),
            ("images", "https://img.test/cape.png"),
            ("external_link", ""),
        ])
        .send()
        .await
        .expect("Failed to submit product form");
    assert_eq!(location(&resp), Some("/products"));

    let stored = backend.rows("products");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["title"], "Cape");
    assert_eq!(stored[0]["featured"], false);
    assert_eq!(stored[0]["images"], json!({"0": "https://img.test/cape.png"}));

    let (_, body) = get_page(&client, format!("{admin_url}/products")).await;
    assert!(body.contains("Created"));
    assert!(body.contains("Cape"));

    // The flash is shown once.
    let (_, body) = get_page(&client, format!("{admin_url}/products")).await;
    assert!(!body.contains("Created"));
}

#[tokio::test]
async fn test_invalid_product_form_is_rejected() {
    let backend = FakeBackend::start().await;
    let (client, admin_url) = signed_in(&backend).await;

    let resp = client
        .post(format!("{admin_url}/products"))
        .form(&[
            ("title", " "),
            ("price", "free"),
            ("stock", "-1"),
            ("category", "garden"),
        ])
        .send()
        .await
        .expect("Failed to submit product form");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Title is required"));
    assert!(body.contains("Price must be a number"));
    assert!(body.contains("Stock must be a whole number of at least 0"));
    assert!(body.contains("Unknown category: garden"));
    assert!(backend.rows("products").is_empty());
}

#[tokio::test]
async fn test_edit_and_delete_product() {
    let backend = FakeBackend::start().await;
    let id = seed_product(&backend, "Silver Wig", "Shoulder length");
    let (client, admin_url) = signed_in(&backend).await;

    let (status, body) = get_page(&client, format!("{admin_url}/products/{id}/edit")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Edit Product"));
    assert!(body.contains("Silver Wig"));

    let resp = client
        .post(format!("{admin_url}/products/{id}"))
        .form(&[
            ("title", "Golden Wig"),
            ("description", "Shoulder length"),
            ("price", "14.00"),
            ("stock", "4"),
            ("category", "cosplay"),
            ("images", "https://img.test/thumb.png"),
            ("featured", "on"),
        ])
        .send()
        .await
        .expect("Failed to submit edit form");
    assert_eq!(location(&resp), Some("/products"));
    assert_eq!(backend.rows("products")[0]["title"], "Golden Wig");
    assert_eq!(backend.rows("products")[0]["featured"], true);

    let resp = client
        .post(format!("{admin_url}/products/{id}/delete"))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(location(&resp), Some("/products"));
    assert!(backend.rows("products").is_empty());

    let (status, _) = get_page(&client, format!("{admin_url}/products/{id}/edit")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_product_in_retired_category() {
    let backend = FakeBackend::start().await;
    let wig = row_id(&backend.insert(
        "products",
        json!({"title": "Bob Wig", "price": "5.00", "category": "wigs"}),
    ));
    let boxed = row_id(&backend.insert(
        "products",
        json!({"title": "Mystery Box", "price": "3.00", "category": null}),
    ));
    let (client, admin_url) = signed_in(&backend).await;

    let resp = client
        .post(format!("{admin_url}/products/{wig}"))
        .form(&[("title", "Bob Wig"), ("price", "6.00"), ("category", "wigs")])
        .send()
        .await
        .expect("Failed to submit edit form");
    assert_eq!(location(&resp), Some("/products"));

    let resp = client
        .post(format!("{admin_url}/products/{boxed}"))
        .form(&[("title", "Mystery Box"), ("price", "4.00"), ("category", "")])
        .send()
        .await
        .expect("Failed to submit edit form");
    assert_eq!(location(&resp), Some("/products"));

    let rows = backend.rows("products");
    let stored = |id: &str| {
        rows.iter()
            .find(|r| r["id"] == id)
            .cloned()
            .expect("Product should still exist")
    };
    assert_eq!(stored(&wig)["category"], "wigs");
    let price: Price =
        serde_json::from_value(stored(&wig)["price"].clone()).expect("Price should parse");
    assert_eq!(price.to_string(), "$6.00");
    assert_eq!(stored(&boxed)["category"], Value::Null);

    // A different retired category is still refused.
    let resp = client
        .post(format!("{admin_url}/products/{wig}"))
        .form(&[("title", "Bob Wig"), ("price", "6.00"), ("category", "hats")])
        .send()
        .await
        .expect("Failed to submit edit form");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_ids_are_not_found() {
    let backend = FakeBackend::start().await;
    let (client, admin_url) = signed_in(&backend).await;

    let (status, _) = get_page(&client, format!("{admin_url}/products/not-a-uuid/edit")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get_page(&client, format!("{admin_url}/orders/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backend_failure_shows_error_banner() {
    let backend = FakeBackend::start().await;
    let (client, admin_url) = signed_in(&backend).await;
    backend.fail_table("products");

    let (status, body) = get_page(&client, format!("{admin_url}/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Failed to fetch products"));
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_orders_filter_detail_and_status_change() {
    let backend = FakeBackend::start().await;
    let buyer = row_id(&backend.insert("users", json!({"email": "buyer@shop.test", "role": "user"})));
    let product = seed_product(&backend, "Silver Wig", "Shoulder length");
    let pending = row_id(&backend.insert(
        "orders",
        json!({"user_id": buyer, "total_amount": "25.00", "status": "pending",
               "shipping_address": {"city": "Lisbon"}}),
    ));
    backend.insert("orders", json!({"user_id": null, "total_amount": "9.00", "status": "cancelled"}));
    backend.insert(
        "cart_items",
        json!({"user_id": buyer, "product_id": product, "order_id": pending, "quantity": 2, "price_at_time": "12.50"}),
    );
    let (client, admin_url) = signed_in(&backend).await;

    let (status, body) = get_page(&client, format!("{admin_url}/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("buyer@shop.test"));
    assert!(body.contains("$9.00"));

    let (_, body) = get_page(&client, format!("{admin_url}/orders?status=pending")).await;
    assert!(body.contains("$25.00"));
    assert!(!body.contains("$9.00"));

    let (_, body) = get_page(&client, format!("{admin_url}/orders?email=buyer@")).await;
    assert!(body.contains("$25.00"));
    assert!(!body.contains("$9.00"));

    let id_prefix = buyer.get(..8).expect("uuid prefix");
    let (_, body) = get_page(&client, format!("{admin_url}/orders?q={id_prefix}")).await;
    assert!(body.contains("$25.00"));
    assert!(!body.contains("$9.00"));

    let (_, body) =
        get_page(&client, format!("{admin_url}/orders?q={id_prefix}&email=nobody")).await;
    assert!(!body.contains("$25.00"));

    let (status, body) = get_page(&client, format!("{admin_url}/orders/{pending}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("buyer@shop.test"));
    assert!(body.contains("Silver Wig"));

    let resp = client
        .post(format!("{admin_url}/orders/{pending}/status"))
        .form(&[("status", "processing")])
        .send()
        .await
        .expect("Failed to change status");
    assert_eq!(location(&resp), Some(format!("/orders/{pending}").as_str()));
    let stored = backend.rows("orders");
    let order = stored.iter().find(|o| o["id"] == pending.as_str()).expect("Order stored");
    assert_eq!(order["status"], "processing");

    let (_, body) = get_page(&client, format!("{admin_url}/orders/{pending}")).await;
    assert!(body.contains("Order marked Processing"));

    let resp = client
        .post(format!("{admin_url}/orders/{pending}/status"))
        .form(&[("status", "lost")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Carts
// ============================================================================

#[tokio::test]
async fn test_carts_page_and_line_changes() {
    let backend = FakeBackend::start().await;
    let buyer = row_id(&backend.insert(
        "users",
        json!({"email": "buyer@shop.test", "role": "user", "display_name": "Buyer"}),
    ));
    let product = seed_product(&backend, "Silver Wig", "Shoulder length");
    let line = row_id(&backend.insert(
        "cart_items",
        json!({"user_id": buyer, "product_id": product, "order_id": null, "quantity": 1}),
    ));
    let (client, admin_url) = signed_in(&backend).await;

    let (status, body) = get_page(&client, format!("{admin_url}/carts")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("buyer@shop.test"));
    assert!(body.contains("Silver Wig"));

    let (_, body) = get_page(&client, format!("{admin_url}/carts?q=nobody")).await;
    assert!(!body.contains("Silver Wig"));

    let resp = client
        .post(format!("{admin_url}/carts/items/{line}/quantity"))
        .form(&[("quantity", "3")])
        .send()
        .await
        .expect("Failed to change quantity");
    assert_eq!(location(&resp), Some("/carts"));
    assert_eq!(backend.rows("cart_items")[0]["quantity"], 3);

    let (_, body) = get_page(&client, format!("{admin_url}/carts")).await;
    assert!(body.contains("Quantity updated"));
    assert!(body.contains("$37.50"));

    let resp = client
        .post(format!("{admin_url}/carts/items/{line}/delete"))
        .send()
        .await
        .expect("Failed to remove line");
    assert_eq!(location(&resp), Some("/carts"));
    assert!(backend.rows("cart_items").is_empty());
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
async fn test_dashboard_page_and_api() {
    let backend = FakeBackend::start().await;
    seed_product(&backend, "Silver Wig", "Shoulder length");
    backend.insert("orders", json!({"total_amount": "40.00", "status": "completed"}));
    backend.insert("orders", json!({"total_amount": "20.00", "status": "pending"}));
    let (client, admin_url) = signed_in(&backend).await;

    let (status, body) = get_page(&client, format!("{admin_url}/dashboard?range=30")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("$60.00"));
    assert!(body.contains("$30.00"));

    let resp = client
        .get(format!("{admin_url}/api/dashboard?range=30"))
        .send()
        .await
        .expect("Failed to fetch dashboard data");
    assert_eq!(resp.status(), StatusCode::OK);
    let data: Value = resp.json().await.expect("Dashboard response is JSON");
    assert_eq!(data["range"], "30");
    assert_eq!(data["total_orders"], 2);
    assert_eq!(data["total_products"], 1);
    assert_eq!(data["total_revenue"], 60.0);
    assert_eq!(data["status_breakdown"]["completed"], 1);
}

#[tokio::test]
async fn test_dashboard_survives_backend_failure() {
    let backend = FakeBackend::start().await;
    let (client, admin_url) = signed_in(&backend).await;
    backend.fail_table("orders");

    let (status, body) = get_page(&client, format!("{admin_url}/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Failed to fetch dashboard data"));
}

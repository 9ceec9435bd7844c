//! End-to-end tests driving the router against an in-memory database.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use tally_api::auth::Role;
use tally_api::services::{DocumentEvent, NotificationError, NotificationSink, Notifier};
use tally_api::{router, ApiConfig, AppState};
use tally_core::Money;
use tally_db::{Database, DbConfig, NewOutlet, NewProduct};

// =============================================================================
// Harness
// =============================================================================

struct ChannelSink(mpsc::UnboundedSender<DocumentEvent>);

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn notify(&self, event: &DocumentEvent) -> Result<(), NotificationError> {
        self.0
            .send(event.clone())
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }
}

struct TestApp {
    app: Router,
    db: Database,
    state: AppState,
    events: mpsc::UnboundedReceiver<DocumentEvent>,
}

impl TestApp {
    /// Fresh database with one active outlet at 15% GST.
    async fn new() -> Self {
        Self::with_config(ApiConfig::from_lookup(|_| None).unwrap()).await
    }

    async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        uow.outlets()
            .insert(&NewOutlet {
                name: "Main Street".to_string(),
                currency: "NZD".to_string(),
                tax_rate_bps: 1500,
                is_active: true,
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let (tx, events) = mpsc::unbounded_channel();
        let state = AppState::new(db.clone(), config, Notifier::new(Arc::new(ChannelSink(tx))));

        TestApp {
            app: router(state.clone()),
            db,
            state,
            events,
        }
    }

    async fn product(&self, name: &str, price_cents: i64, stock: i64) -> i64 {
        let mut uow = self.db.begin().await.unwrap();
        let product = uow
            .products()
            .insert(&NewProduct {
                name: name.to_string(),
                price: Money::from_cents(price_cents),
                stock,
                category: None,
                subcategory: None,
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        product.id
    }

    async fn stock_of(&self, product_id: i64) -> i64 {
        let mut session = self.db.session().await.unwrap();
        session.products().require(product_id).await.unwrap().stock
    }

    fn token(&self, user: &str, role: Role) -> String {
        self.state.jwt.generate_token(user, role).unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&self.app, method, uri, token, body).await
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn error_text(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let t = TestApp::new().await;

    let (status, body) = t.send(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_back_office_requires_token_and_role() {
    let t = TestApp::new().await;

    let (status, body) = t.send(Method::GET, "/api/invoices", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!error_text(&body).is_empty());

    let (status, _) = t
        .send(Method::GET, "/api/invoices", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cashier = t.token("cashier-01", Role::Cashier);
    let (status, _) = t
        .send(Method::DELETE, "/api/invoices/1", Some(cashier.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Document Lifecycle
// =============================================================================

#[tokio::test]
async fn test_invoice_create_then_delete_restores_stock() {
    let t = TestApp::new().await;
    let beans = t.product("House Blend 1kg", 1000, 10).await;
    let manager = t.token("manager-01", Role::Manager);

    let (status, created) = t
        .send(
            Method::POST,
            "/api/invoices",
            Some(manager.as_str()),
            Some(json!({
                "customerId": null,
                "type": "invoice",
                "paymentMethod": "card",
                "items": [{ "id": beans, "quantity": 3, "price": 10.00 }]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["subtotal"], json!(30.0));
    assert_eq!(created["taxAmount"], json!(4.5));
    assert_eq!(created["total"], json!(34.5));
    assert_eq!(created["type"], "invoice");
    assert_eq!(created["status"], "issued");
    assert_eq!(t.stock_of(beans).await, 7);

    let id = created["id"].as_i64().unwrap();

    let (status, detail) = t
        .send(Method::GET, &format!("/api/invoices/{id}"), Some(manager.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["items"][0]["productName"], "House Blend 1kg");
    assert_eq!(detail["createdBy"], "manager-01");

    let (status, body) = t
        .send(Method::DELETE, &format!("/api/invoices/{id}"), Some(manager.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert_eq!(t.stock_of(beans).await, 10);

    let (status, _) = t
        .send(Method::GET, &format!("/api/invoices/{id}"), Some(manager.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quote_delete_leaves_stock_alone() {
    let t = TestApp::new().await;
    let beans = t.product("Decaf 500g", 2100, 4).await;
    let admin = t.token("admin", Role::Admin);

    let (status, created) = t
        .send(
            Method::POST,
            "/api/invoices",
            Some(admin.as_str()),
            Some(json!({
                "type": "quote",
                "items": [{ "id": beans, "quantity": 2, "price": 21.00 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    assert_eq!(t.stock_of(beans).await, 4);

    let id = created["id"].as_i64().unwrap();
    let (status, _) = t
        .send(Method::DELETE, &format!("/api/invoices/{id}"), Some(admin.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(t.stock_of(beans).await, 4);
}

#[tokio::test]
async fn test_invoice_status_moves_forward_only() {
    let t = TestApp::new().await;
    let tea = t.product("Earl Grey 100g", 1200, 5).await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (_, created) = t
        .send(
            Method::POST,
            "/api/invoices",
            Some(cashier.as_str()),
            Some(json!({ "type": "invoice", "items": [{ "id": tea, "quantity": 1, "price": 12 }] })),
        )
        .await;
    let uri = format!("/api/invoices/{}/status", created["id"]);

    let (status, body) = t
        .send(Method::PUT, &uri, Some(cashier.as_str()), Some(json!({ "status": "draft" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_text(&body), "Invalid status 'draft' for invoice");

    let (status, paid) = t
        .send(
            Method::PUT,
            &uri,
            Some(cashier.as_str()),
            Some(json!({ "status": "paid", "paymentMethod": "cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["paymentMethod"], "cash");

    let (status, _) = t
        .send(Method::PUT, &uri, Some(cashier.as_str()), Some(json!({ "status": "issued" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_convert_takes_stock_once() {
    let t = TestApp::new().await;
    let grinder = t.product("Burr Grinder", 18900, 5).await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (_, quote) = t
        .send(
            Method::POST,
            "/api/invoices",
            Some(cashier.as_str()),
            Some(json!({ "type": "quote", "items": [{ "id": grinder, "quantity": 5, "price": 189 }] })),
        )
        .await;
    let uri = format!("/api/invoices/{}/convert", quote["id"]);

    let (status, invoice) = t.send(Method::PUT, &uri, Some(cashier.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoice["type"], "invoice");
    assert_eq!(invoice["status"], "issued");
    assert_eq!(t.stock_of(grinder).await, 0);

    let (status, body) = t.send(Method::PUT, &uri, Some(cashier.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_text(&body), "Only quotes can be converted");
    assert_eq!(t.stock_of(grinder).await, 0);
}

#[tokio::test]
async fn test_convert_with_short_stock_changes_nothing() {
    let t = TestApp::new().await;
    let croissant = t.product("Croissant", 550, 5).await;
    let loaf = t.product("Sourdough Loaf", 950, 3).await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (_, quote) = t
        .send(
            Method::POST,
            "/api/invoices",
            Some(cashier.as_str()),
            Some(json!({
                "type": "quote",
                "items": [
                    { "id": croissant, "quantity": 2, "price": 5.50 },
                    { "id": loaf, "quantity": 4, "price": 9.50 }
                ]
            })),
        )
        .await;
    let id = quote["id"].as_i64().unwrap();

    let (status, body) = t
        .send(Method::PUT, &format!("/api/invoices/{id}/convert"), Some(cashier.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_text(&body).starts_with("Insufficient stock for Sourdough Loaf"));

    assert_eq!(t.stock_of(croissant).await, 5);
    assert_eq!(t.stock_of(loaf).await, 3);

    let (_, detail) = t
        .send(Method::GET, &format!("/api/invoices/{id}"), Some(cashier.as_str()), None)
        .await;
    assert_eq!(detail["type"], "quote");
    assert_eq!(detail["status"], "draft");
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let t = TestApp::new().await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (status, body) = t
        .send(
            Method::POST,
            "/api/invoices",
            Some(cashier.as_str()),
            Some(json!({ "type": "invoice", "items": [{ "id": 999, "quantity": 1, "price": 1 }] })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_text(&body), "Product not found: 999");
}

// =============================================================================
// Storefront
// =============================================================================

#[tokio::test]
async fn test_storefront_order_uses_catalog_price_and_notifies() {
    let mut t = TestApp::new().await;
    let milk = t.product("Oat Milk 1L", 450, 10).await;

    let (status, created) = t
        .send(
            Method::POST,
            "/api/orders",
            None,
            Some(json!({
                "customer": { "name": "Ana Silva", "email": "  Ana@Example.com " },
                "type": "order",
                "items": [{ "id": milk, "quantity": 2, "price": 0.01 }]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["subtotal"], json!(9.0));
    assert_eq!(created["status"], "issued");
    assert_eq!(t.stock_of(milk).await, 8);

    match t.events.recv().await {
        Some(DocumentEvent::NewOrder {
            document_id,
            customer_email,
            ..
        }) => {
            assert_eq!(document_id, created["id"].as_i64().unwrap());
            assert_eq!(customer_email.as_deref(), Some("ana@example.com"));
        }
        other => panic!("expected NewOrder, got {other:?}"),
    }

    let admin = t.token("admin", Role::Admin);
    let (_, rows) = t.send(Method::GET, "/api/invoices", Some(admin.as_str()), None).await;
    assert_eq!(rows[0]["customer_name"], "Ana Silva");
    assert_eq!(rows[0]["outlet_name"], "Main Street");
    assert_eq!(rows[0]["tax_amount"], json!(1.35));

    let customer_id = rows[0]["customer_id"].as_i64().unwrap();
    let (status, mine) = t
        .send(
            Method::GET,
            &format!("/api/customers/{customer_id}/invoices"),
            Some(admin.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_storefront_rejects_invoice_type() {
    let t = TestApp::new().await;
    let milk = t.product("Oat Milk 1L", 450, 10).await;

    let (status, _) = t
        .send(
            Method::POST,
            "/api/orders",
            None,
            Some(json!({
                "customer": { "name": "Ana", "email": "ana@example.com" },
                "type": "invoice",
                "items": [{ "id": milk, "quantity": 1 }]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.stock_of(milk).await, 10);
}

#[tokio::test]
async fn test_direct_invoice_oversell_follows_policy() {
    let invoice = |product: i64| {
        json!({
            "type": "invoice",
            "paymentMethod": "card",
            "items": [{ "id": product, "quantity": 5, "price": 12.00 }]
        })
    };

    // Default policy lets the till sell past zero
    let t = TestApp::new().await;
    let kettle = t.product("Stovetop Kettle", 1200, 2).await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (status, _) = t
        .send(Method::POST, "/api/invoices", Some(cashier.as_str()), Some(invoice(kettle)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(t.stock_of(kettle).await, -3);

    let strict = ApiConfig::from_lookup(|key| {
        (key == "ALLOW_OVERSELL_INVOICE").then(|| "false".to_string())
    })
    .unwrap();
    let t = TestApp::with_config(strict).await;
    let kettle = t.product("Stovetop Kettle", 1200, 2).await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (status, body) = t
        .send(Method::POST, "/api/invoices", Some(cashier.as_str()), Some(invoice(kettle)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_text(&body),
        "Insufficient stock for Stovetop Kettle: available 2, requested 5"
    );
    assert_eq!(t.stock_of(kettle).await, 2);

    let (_, listed) = t
        .send(Method::GET, "/api/invoices", Some(cashier.as_str()), None)
        .await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_price_beyond_ceiling_is_rejected() {
    let t = TestApp::new().await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (status, body) = t
        .send(
            Method::POST,
            "/api/invoices",
            Some(cashier.as_str()),
            Some(json!({
                "type": "quote",
                "items": [{ "name": "x", "quantity": 2, "price": 90000000000000000u64 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_text(&body).starts_with("price must be between"));
}

#[tokio::test]
async fn test_concurrent_checked_orders_for_last_unit() {
    let t = TestApp::new().await;
    let teapot = t.product("Glass Teapot", 4500, 1).await;

    let order = |email: &str| {
        json!({
            "customer": { "name": "Buyer", "email": email },
            "type": "order",
            "items": [{ "id": teapot, "quantity": 1 }]
        })
    };

    let (a, b) = tokio::join!(
        send(&t.app, Method::POST, "/api/orders", None, Some(order("a@example.com"))),
        send(&t.app, Method::POST, "/api/orders", None, Some(order("b@example.com"))),
    );

    let mut statuses = vec![a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(t.stock_of(teapot).await, 0);
}

// =============================================================================
// Shifts
// =============================================================================

#[tokio::test]
async fn test_shift_close_reconciles_counted_cash() {
    let t = TestApp::new().await;
    let cashier = t.token("cashier-01", Role::Cashier);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/operations/shift/start",
            Some(cashier.as_str()),
            Some(json!({ "startingCash": 300.00 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let counts = json!({ "hundreds": 2, "fifties": 1, "coins": 4.50 });

    let (status, body) = t
        .send(
            Method::POST,
            "/api/operations/shift/close",
            Some(cashier.as_str()),
            Some(json!({ "cashCounts": counts, "notes": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_text(&body),
        "A note is required to close with a discrepancy of -$45.50"
    );

    let (status, _) = t
        .send(
            Method::POST,
            "/api/operations/shift/close",
            Some(cashier.as_str()),
            Some(json!({ "cashCounts": counts, "notes": "Float short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, closed) = t
        .send(
            Method::POST,
            "/api/operations/shift/close",
            Some(cashier.as_str()),
            Some(json!({
                "cashCounts": counts,
                "notes": "Float short",
                "confirmDiscrepancy": true,
                "actualCash": 254.50
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["closing"]["actualCash"], json!(254.5));
    assert_eq!(closed["closing"]["expectedCash"], json!(300.0));
    assert_eq!(closed["closing"]["discrepancy"], json!(-45.5));
    assert_eq!(closed["closing"]["overrideConfirmed"], true);
    assert!(closed["closedAt"].is_string());

    // Closed exactly once
    let (status, _) = t
        .send(
            Method::POST,
            "/api/operations/shift/close",
            Some(cashier.as_str()),
            Some(json!({ "cashCounts": counts, "notes": "again", "confirmDiscrepancy": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_shift_start_while_open_needs_close_choice() {
    let t = TestApp::new().await;
    let cashier = t.token("cashier-01", Role::Cashier);
    let start = |body: Value| {
        send(
            &t.app,
            Method::POST,
            "/api/operations/shift/start",
            Some(cashier.as_str()),
            Some(body),
        )
    };

    let (status, first) = start(json!({ "startingCash": 50 })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = start(json!({ "startingCash": 80 })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, second) = start(json!({
        "startingCash": 80,
        "closePrevious": { "mode": "forced" }
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["closedPrevious"]["id"], first["shift"]["id"]);
    assert_eq!(second["closedPrevious"]["closing"]["kind"], "forced");
    assert_eq!(second["shift"]["startingCash"], json!(80.0));
}

#[tokio::test]
async fn test_shift_start_validated_close_of_previous() {
    let t = TestApp::new().await;
    let cashier = t.token("cashier-03", Role::Cashier);
    let start = |body: Value| {
        send(
            &t.app,
            Method::POST,
            "/api/operations/shift/start",
            Some(cashier.as_str()),
            Some(body),
        )
    };

    let (status, first) = start(json!({ "startingCash": 100 })).await;
    assert_eq!(status, StatusCode::OK);
    let first_id = first["shift"]["id"].clone();

    // Negative counts cannot offset real ones
    let (status, body) = start(json!({
        "startingCash": 60,
        "closePrevious": {
            "mode": "validated",
            "cashCounts": { "hundreds": 2, "fifties": -2 }
        }
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_text(&body), "cashCounts.fifties must not be negative");

    let short = json!({ "fifties": 1 });

    let (status, body) = start(json!({
        "startingCash": 60,
        "closePrevious": { "mode": "validated", "cashCounts": short }
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_text(&body),
        "A note is required to close with a discrepancy of -$50.00"
    );

    let (status, _) = start(json!({
        "startingCash": 60,
        "closePrevious": { "mode": "validated", "cashCounts": short, "notes": "Float short" }
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Failed attempts leave the first shift open
    let (_, current) = t
        .send(Method::GET, "/api/operations/shift/current", Some(cashier.as_str()), None)
        .await;
    assert_eq!(current["isOpen"], true);
    assert_eq!(current["shiftId"], first_id);

    let (status, second) = start(json!({
        "startingCash": 60,
        "closePrevious": {
            "mode": "validated",
            "cashCounts": short,
            "notes": "Float short",
            "confirmDiscrepancy": true
        }
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["closedPrevious"]["id"], first_id);
    assert_eq!(second["closedPrevious"]["closing"]["kind"], "validated");
    assert_eq!(second["closedPrevious"]["closing"]["discrepancy"], json!(-50.0));
    assert_eq!(second["closedPrevious"]["closing"]["overrideConfirmed"], true);
    assert_eq!(second["shift"]["startingCash"], json!(60.0));
}

#[tokio::test]
async fn test_shift_close_rejects_oversized_counts() {
    let t = TestApp::new().await;
    let cashier = t.token("cashier-04", Role::Cashier);

    t.send(
        Method::POST,
        "/api/operations/shift/start",
        Some(cashier.as_str()),
        Some(json!({ "startingCash": 100 })),
    )
    .await;

    let (status, body) = t
        .send(
            Method::POST,
            "/api/operations/shift/close",
            Some(cashier.as_str()),
            Some(json!({
                "cashCounts": { "hundreds": 100000000000000000i64 },
                "notes": "x",
                "confirmDiscrepancy": true
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_text(&body).starts_with("cashCounts.hundreds must be between"));

    let (_, current) = t
        .send(Method::GET, "/api/operations/shift/current", Some(cashier.as_str()), None)
        .await;
    assert_eq!(current["isOpen"], true);
}

#[tokio::test]
async fn test_current_shift_tracks_cash_sales_and_movements() {
    let t = TestApp::new().await;
    let beans = t.product("House Blend 1kg", 1000, 10).await;
    let cashier = t.token("cashier-02", Role::Cashier);

    let (_, idle) = t
        .send(Method::GET, "/api/operations/shift/current", Some(cashier.as_str()), None)
        .await;
    assert_eq!(idle["isOpen"], false);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/operations/shift/cash-movements",
            Some(cashier.as_str()),
            Some(json!({ "kind": "pay_in", "amount": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    t.send(
        Method::POST,
        "/api/operations/shift/start",
        Some(cashier.as_str()),
        Some(json!({ "startingCash": 100 })),
    )
    .await;

    t.send(
        Method::POST,
        "/api/invoices",
        Some(cashier.as_str()),
        Some(json!({
            "type": "invoice",
            "paymentMethod": "cash",
            "items": [{ "id": beans, "quantity": 3, "price": 10 }]
        })),
    )
    .await;

    let (status, movement) = t
        .send(
            Method::POST,
            "/api/operations/shift/cash-movements",
            Some(cashier.as_str()),
            Some(json!({ "kind": "pay_out", "amount": 20, "reason": "Milk run" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movement["kind"], "pay_out");

    let (status, current) = t
        .send(Method::GET, "/api/operations/shift/current", Some(cashier.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["isOpen"], true);
    assert_eq!(current["transactionCount"], 1);
    assert_eq!(current["cashSales"], json!(34.5));
    assert_eq!(current["cardSales"], json!(0.0));
    assert_eq!(current["payOuts"], json!(20.0));
    assert_eq!(current["expectedCash"], json!(114.5));
}

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ActiveValue, Database, DatabaseConnection, EntityTrait};
use serde_json::{Value, json};
use tower::ServiceExt;

use ledger::{Ledger, Role, hash_password, users};
use migration::MigratorTrait;
use server::{ServerState, router};

async fn seed_user(db: &DatabaseConnection, username: &str, password: &str, role: Role) -> i64 {
    let row = users::ActiveModel {
        id: ActiveValue::NotSet,
        username: ActiveValue::Set(username.to_string()),
        password: ActiveValue::Set(hash_password(password)),
        role: ActiveValue::Set(role.as_str().to_string()),
        is_active: ActiveValue::Set(true),
        created_at: ActiveValue::Set(Utc::now()),
    };
    users::Entity::insert(row)
        .exec(db)
        .await
        .unwrap()
        .last_insert_id
}

/// In-memory app with two accounts: member `alice` (id 1) and admin `root`
/// (id 2).
async fn app() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_user(&db, "alice", "password", Role::Member).await;
    seed_user(&db, "root", "s3cret", Role::Admin).await;

    let state = ServerState {
        ledger: Arc::new(Ledger::builder().database(db.clone()).build()),
        db: db.clone(),
    };
    (router(state), db)
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((username, password)) = auth {
        builder = builder.header(header::AUTHORIZATION, basic_auth(username, password));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn deposit(app: &Router, auth: (&str, &str), amount_minor: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/transactions",
        Some(auth),
        Some(json!({ "kind": "deposit", "amount_minor": amount_minor })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (app, _db) = app().await;
    let (status, _) = send(&app, "GET", "/balance", Some(("alice", "nope")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn record_and_list_expose_running_balances() {
    let (app, _db) = app().await;

    deposit(&app, ("alice", "password"), 100_000).await;
    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(("alice", "password")),
        Some(json!({
            "kind": "withdrawal",
            "amount_minor": 30_000,
            "payment_method": "airtel",
            "description": "groceries"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 70_000);

    let (status, body) = send(&app, "GET", "/transactions", Some(("alice", "password")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["balance_minor"], 70_000);
    // Newest first.
    assert_eq!(body["transactions"][0]["kind"], "withdrawal");
    assert_eq!(body["transactions"][0]["balance_minor"], 70_000);
    assert_eq!(body["transactions"][0]["payment_method"], "airtel");
    assert_eq!(body["transactions"][1]["balance_minor"], 100_000);

    let (status, body) = send(&app, "GET", "/balance", Some(("alice", "password")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 70_000);
}

#[tokio::test]
async fn over_withdrawal_is_rejected() {
    let (app, _db) = app().await;
    deposit(&app, ("alice", "password"), 5_000).await;

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(("alice", "password")),
        Some(json!({ "kind": "withdrawal", "amount_minor": 6_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("available balance"));

    let (_, body) = send(&app, "GET", "/balance", Some(("alice", "password")), None).await;
    assert_eq!(body["balance_minor"], 5_000);
}

#[tokio::test]
async fn member_cannot_touch_other_ledgers_or_admin_routes() {
    let (app, _db) = app().await;

    let (status, _) = send(
        &app,
        "GET",
        "/balance?user_id=2",
        Some(("alice", "password")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PATCH",
        "/transactions/1",
        Some(("alice", "password")),
        Some(json!({ "amount_minor": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/reconcile",
        Some(("alice", "password")),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_amend_and_delete_rewrite_balances() {
    let (app, _db) = app().await;
    deposit(&app, ("alice", "password"), 10_000).await;
    deposit(&app, ("alice", "password"), 2_000).await;

    // First deposit has id 1.
    let (status, body) = send(
        &app,
        "PATCH",
        "/transactions/1",
        Some(("root", "s3cret")),
        Some(json!({ "amount_minor": 4_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 6_000);

    let (status, body) = send(
        &app,
        "DELETE",
        "/transactions/2",
        Some(("root", "s3cret")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 4_000);

    let (status, _) = send(
        &app,
        "DELETE",
        "/transactions/99",
        Some(("root", "s3cret")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn amend_with_only_an_amount_keeps_other_fields() {
    let (app, _db) = app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/transactions",
        Some(("alice", "password")),
        Some(json!({
            "kind": "deposit",
            "amount_minor": 10_000,
            "payment_method": "bank",
            "description": "school fees"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PATCH",
        "/transactions/1",
        Some(("root", "s3cret")),
        Some(json!({ "amount_minor": 12_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/transactions", Some(("alice", "password")), None).await;
    assert_eq!(body["transactions"][0]["amount_minor"], 12_000);
    assert_eq!(body["transactions"][0]["description"], "school fees");
    assert_eq!(body["transactions"][0]["payment_method"], "bank");
}

#[tokio::test]
async fn bulk_delete_rejects_foreign_ids_and_keeps_state() {
    let (app, _db) = app().await;
    deposit(&app, ("alice", "password"), 10_000).await;
    deposit(&app, ("alice", "password"), 2_000).await;

    let (status, _) = send(
        &app,
        "POST",
        "/transactions/bulkDelete",
        Some(("root", "s3cret")),
        Some(json!({ "user_id": 1, "transaction_ids": [1, 99] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/balance", Some(("alice", "password")), None).await;
    assert_eq!(body["balance_minor"], 12_000);

    let (status, body) = send(
        &app,
        "POST",
        "/transactions/bulkDelete",
        Some(("root", "s3cret")),
        Some(json!({ "user_id": 1, "transaction_ids": [1, 2] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 0);
}

#[tokio::test]
async fn summary_totals_per_owner() {
    let (app, _db) = app().await;
    deposit(&app, ("alice", "password"), 10_000).await;
    send(
        &app,
        "POST",
        "/transactions",
        Some(("alice", "password")),
        Some(json!({ "kind": "withdrawal", "amount_minor": 3_000 })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/summary", Some(("alice", "password")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_deposits_minor"], 10_000);
    assert_eq!(body["total_withdrawals_minor"], 3_000);
    assert_eq!(body["transactions"], 2);
}

#[tokio::test]
async fn reconcile_reports_and_truncates_anomalies() {
    let (app, db) = app().await;
    deposit(&app, ("alice", "password"), 1_000).await;

    // Slip an over-withdrawal past the write path, as legacy data would.
    let row = ledger::transactions::ActiveModel {
        user_id: ActiveValue::Set(1),
        kind: ActiveValue::Set("withdrawal".to_string()),
        amount_minor: ActiveValue::Set(5_000),
        description: ActiveValue::Set(None),
        payment_method: ActiveValue::Set("momo".to_string()),
        created_at: ActiveValue::Set(Utc::now()),
        balance_minor: ActiveValue::Set(None),
        ..Default::default()
    };
    ledger::transactions::Entity::insert(row).exec(&db).await.unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/reconcile",
        Some(("root", "s3cret")),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["anomalies_found"], 1);
    assert_eq!(body["amounts_truncated"], 0);

    let (_, body) = send(&app, "GET", "/balance", Some(("alice", "password")), None).await;
    assert_eq!(body["balance_minor"], 0);

    let (status, body) = send(
        &app,
        "POST",
        "/reconcile",
        Some(("root", "s3cret")),
        Some(json!({ "truncate_anomalies": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amounts_truncated"], 1);

    // The truncated withdrawal now matches the available 1000.
    let (_, body) = send(&app, "GET", "/transactions", Some(("alice", "password")), None).await;
    assert_eq!(body["transactions"][0]["amount_minor"], 1_000);
    assert_eq!(body["transactions"][0]["balance_minor"], 0);
}

#[tokio::test]
async fn register_creates_member_and_rejects_duplicates() {
    let (app, _db) = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "bob", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "bob", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/balance", Some(("bob", "pw")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 0);
}

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use chrono::{DateTime, Utc};
use driftmail::{app::AppState, db};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub async fn test_state() -> AppState {
    let pool = db::connect("sqlite://:memory:")
        .await
        .expect("connect memory sqlite");
    db::run_migrations(&pool).await.expect("migrate");
    AppState {
        db: pool,
        http: reqwest::Client::new(),
    }
}

pub async fn seed_mailbox(
    pool: &SqlitePool,
    address: &str,
    user_id: &str,
    expires_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO mailboxes (id, address, user_id, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(address)
    .bind(user_id)
    .bind(Utc::now())
    .bind(expires_at)
    .execute(pool)
    .await
    .expect("seed mailbox");
    id
}

pub async fn seed_webhook(pool: &SqlitePool, user_id: &str, url: &str, enabled: bool) {
    sqlx::query("INSERT INTO webhooks (user_id, url, enabled) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(url)
        .bind(enabled)
        .execute(pool)
        .await
        .expect("seed webhook");
}

pub async fn count_messages(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await
        .expect("count messages")
}

pub async fn count_messages_for(pool: &SqlitePool, mailbox_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE mailbox_id = ?")
        .bind(mailbox_id)
        .fetch_one(pool)
        .await
        .expect("count messages for mailbox")
}

pub async fn count_mailboxes(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM mailboxes")
        .fetch_one(pool)
        .await
        .expect("count mailboxes")
}

pub fn raw_mime(to: &str, subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: sender@example.test\r\nTo: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain\r\n\r\n{body}"
    )
    .into_bytes()
}

/// One request recorded by the test webhook endpoint.
pub type HookHit = (Option<String>, serde_json::Value);

pub type Received = Arc<Mutex<Vec<HookHit>>>;

async fn record_hook(
    State(received): State<Received>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let event = headers
        .get("X-Webhook-Event")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    received.lock().unwrap().push((event, body));
    StatusCode::OK
}

/// Spin up a local HTTP endpoint that records webhook POSTs.
pub async fn start_hook_server() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/hook", post(record_hook))
        .with_state(received.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), received)
}

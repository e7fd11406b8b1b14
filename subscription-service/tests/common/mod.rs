//! Common test utilities for subscription-service integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use service_core::config::Config as CommonConfig;
use service_core::error::AppError;
use sqlx::postgres::PgPoolOptions;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use subscription_service::aggregation::AggregationWindow;
use subscription_service::config::{DatabaseConfig, SubscriptionConfig};
use subscription_service::models::{Subscription, SubscriptionFilter, SubscriptionInput};
use subscription_service::services::{Database, SubscriptionStore};
use subscription_service::startup::Application;
use subscription_service::{build_router, AppState};
use tokio::sync::RwLock;
use tower::ServiceExt;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,subscription_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// How the in-memory store answers.
#[derive(Debug, Clone, Copy)]
pub enum StoreMode {
    /// Returns exactly the overlapping subscriptions.
    Exact,
    /// Ignores the window and returns every subscription matching the filter.
    OverApproximate,
    /// Sleeps before every call.
    Slow(Duration),
    /// Fails every call with a database error.
    Failing,
}

pub struct InMemoryStore {
    subscriptions: RwLock<Vec<Subscription>>,
    mode: StoreMode,
}

impl InMemoryStore {
    pub fn new(mode: StoreMode) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            mode,
        }
    }

    async fn enter(&self) -> Result<(), AppError> {
        match self.mode {
            StoreMode::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            StoreMode::Failing => Err(AppError::DatabaseError(anyhow::anyhow!(
                "connection refused"
            ))),
            StoreMode::Exact | StoreMode::OverApproximate => Ok(()),
        }
    }
}

fn overlaps(subscription: &Subscription, window: &AggregationWindow) -> bool {
    subscription.start_date <= window.end.first_day()
        && subscription
            .end_date
            .map_or(true, |end| end >= window.start.first_day())
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn create_subscription(
        &self,
        input: &SubscriptionInput,
    ) -> Result<Subscription, AppError> {
        self.enter().await?;
        let now = Utc::now();
        let subscription = Subscription {
            subscription_id: Uuid::new_v4(),
            service_name: input.service_name.clone(),
            price: input.price,
            user_id: input.user_id,
            start_date: input.start.first_day(),
            end_date: input.end.map(|end| end.first_day()),
            created_utc: now,
            updated_utc: now,
        };
        self.subscriptions.write().await.push(subscription.clone());
        Ok(subscription)
    }

    async fn get_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        self.enter().await?;
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .find(|s| s.subscription_id == subscription_id)
            .cloned())
    }

    async fn update_subscription(
        &self,
        subscription_id: Uuid,
        input: &SubscriptionInput,
    ) -> Result<Option<Subscription>, AppError> {
        self.enter().await?;
        let mut subscriptions = self.subscriptions.write().await;
        let Some(existing) = subscriptions
            .iter_mut()
            .find(|s| s.subscription_id == subscription_id)
        else {
            return Ok(None);
        };

        existing.service_name = input.service_name.clone();
        existing.price = input.price;
        existing.user_id = input.user_id;
        existing.start_date = input.start.first_day();
        existing.end_date = input.end.map(|end| end.first_day());
        existing.updated_utc = Utc::now();

        Ok(Some(existing.clone()))
    }

    async fn delete_subscription(&self, subscription_id: Uuid) -> Result<bool, AppError> {
        self.enter().await?;
        let mut subscriptions = self.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|s| s.subscription_id != subscription_id);
        Ok(subscriptions.len() < before)
    }

    async fn list_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, AppError> {
        self.enter().await?;
        // Newest first; later inserts win ties on the timestamp.
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn list_overlapping(
        &self,
        filter: &SubscriptionFilter,
        window: &AggregationWindow,
    ) -> Result<Vec<Subscription>, AppError> {
        self.enter().await?;
        let over_approximate = matches!(self.mode, StoreMode::OverApproximate);
        let mut candidates: Vec<Subscription> = self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| filter.matches(s) && (over_approximate || overlaps(s, window)))
            .cloned()
            .collect();
        candidates.sort_by_key(|s| s.start_date);
        Ok(candidates)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.enter().await
    }
}

/// Router wired to an in-memory store.
pub struct TestRouter {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

pub fn test_router(mode: StoreMode) -> TestRouter {
    test_router_with_timeout(mode, Duration::from_secs(3))
}

pub fn test_router_with_timeout(mode: StoreMode, query_timeout: Duration) -> TestRouter {
    init_tracing();
    let store = Arc::new(InMemoryStore::new(mode));
    let router = build_router(AppState::new(store.clone(), query_timeout));
    TestRouter { router, store }
}

impl TestRouter {
    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    /// Create a subscription and return its id.
    pub async fn create(&self, body: Value) -> String {
        let (status, json) = self.post("/api/subscriptions", body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
        json["id"].as_str().unwrap().to_string()
    }
}

/// Payload builder for the common case.
pub fn subscription_body(
    service_name: &str,
    price: i32,
    user_id: Uuid,
    start_date: &str,
    end_date: Option<&str>,
) -> Value {
    let mut body = serde_json::json!({
        "service_name": service_name,
        "price": price,
        "user_id": user_id.to_string(),
        "start_date": start_date,
    });
    if let Some(end) = end_date {
        body["end_date"] = Value::String(end.to_string());
    }
    body
}

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Base URL of the disposable test database.
pub fn test_database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests")
}

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_subscription_{}_{}", std::process::id(), counter)
}

/// A freshly created schema plus a connection URL whose `search_path` points at it.
pub struct TestSchema {
    pub name: String,
    pub url: String,
}

impl TestSchema {
    pub async fn create() -> Self {
        let base_url = test_database_url();
        let name = unique_schema_name();

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");

        pool.close().await;

        let separator = if base_url.contains('?') { "&" } else { "?" };
        let url = format!("{}{}options=-c search_path%3D{}", base_url, separator, name);

        Self { name, url }
    }

    /// Migrated `Database` living in this schema.
    pub async fn database(&self) -> Database {
        let db = Database::new(&self.url, 2, 1)
            .await
            .expect("Failed to connect to test schema");
        db.run_migrations()
            .await
            .expect("Failed to migrate test schema");
        db
    }

    /// Drop the schema and everything in it.
    pub async fn cleanup(&self) {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&test_database_url())
            .await
            .ok();

        if let Some(pool) = pool {
            let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name))
                .execute(&pool)
                .await;
            pool.close().await;
        }
    }
}

/// PostgreSQL-backed application running in its own schema.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub db: Database,
    schema: TestSchema,
}

impl TestApp {
    pub async fn cleanup(&self) {
        self.schema.cleanup().await;
    }
}

fn test_config(database_url: String) -> SubscriptionConfig {
    SubscriptionConfig {
        common: CommonConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service_name: "subscription-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
            query_timeout_ms: 3000,
        },
    }
}

/// Spawn the real application against a fresh PostgreSQL schema on a random port.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let schema = TestSchema::create().await;
    let db = schema.database().await;

    let app = Application::build_without_migrations(test_config(schema.url.clone()))
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let address = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    // Wait for the listener to answer
    for _ in 0..20 {
        if client
            .get(format!("{}/health", address))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    TestApp {
        address,
        port,
        client,
        db,
        schema,
    }
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pg_monitoring_demo::db::{RequestRecord, RequestStatistics, RequestStore, StoreError};
use pg_monitoring_demo::metrics::AppMetrics;
use pg_monitoring_demo::{server, AppState};
use tower::ServiceExt;

/// A stored row, with the fields the database would assign.
#[derive(Debug, Clone)]
pub struct StoredRow {
    pub id: i64,
    pub record: RequestRecord,
    pub timestamp: DateTime<Utc>,
}

/// In-memory `RequestStore` with switches for simulating outages.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredRow>>,
    /// Every query fails, like an unreachable database.
    pub unavailable: AtomicBool,
    /// Only inserts fail.
    pub reject_inserts: AtomicBool,
    pub backend_connections: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rows(&self) -> Vec<StoredRow> {
        self.rows.lock().clone()
    }

    pub fn seed(&self, method: &str, path: &str, status_code: u16, response_time: f64) {
        self.push(RequestRecord {
            path: path.into(),
            method: method.into(),
            status_code,
            response_time,
        });
    }

    fn push(&self, record: RequestRecord) {
        let mut rows = self.rows.lock();
        let id = rows.len() as i64 + 1;
        rows.push(StoredRow {
            id,
            record,
            timestamp: Utc::now(),
        });
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "connection refused (os error 111)".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn init_schema(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn insert(&self, record: &RequestRecord) -> Result<(), StoreError> {
        self.check()?;
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert rejected".into()));
        }
        self.push(record.clone());
        Ok(())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.check()?;
        Ok(self.rows.lock().len() as i64)
    }

    async fn active_connections(&self) -> Result<i64, StoreError> {
        self.check()?;
        Ok(self.backend_connections.load(Ordering::SeqCst))
    }

    async fn statistics(&self) -> Result<RequestStatistics, StoreError> {
        self.check()?;
        let rows = self.rows.lock();
        if rows.is_empty() {
            return Ok(RequestStatistics::default());
        }
        let times: Vec<f64> = rows.iter().map(|r| r.record.response_time).collect();
        let sum: f64 = times.iter().sum();
        Ok(RequestStatistics {
            total_requests: rows.len() as i64,
            avg_response_time: Some(sum / times.len() as f64),
            min_response_time: times.iter().cloned().reduce(f64::min),
            max_response_time: times.iter().cloned().reduce(f64::max),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let metrics = Arc::new(AppMetrics::new().expect("metrics registry"));
        let state = Arc::new(AppState::new(store.clone(), metrics));
        Self {
            router: server::create_router(state.clone()),
            state,
            store,
        }
    }

    /// Issue a GET and return status plus raw body.
    pub async fn get_raw(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Issue a GET and parse the body as JSON.
    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.get_raw(uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    /// Wait for detached inserts to land, up to about a second.
    pub async fn wait_for_rows(&self, at_least: usize) -> Vec<StoredRow> {
        for _ in 0..100 {
            let rows = self.store.rows();
            if rows.len() >= at_least {
                return rows;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.store.rows()
    }
}

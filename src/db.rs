use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde::Serialize;
use tokio_postgres::NoTls;

// ─── Schema ──────────────────────────────────────────────────────

/// Idempotent: safe to run against an already-initialized database.
pub const CREATE_REQUESTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS requests (
        id SERIAL PRIMARY KEY,
        path VARCHAR(255),
        method VARCHAR(10),
        status_code INTEGER,
        response_time FLOAT,
        timestamp TIMESTAMPTZ DEFAULT NOW()
    )
"#;

const INSERT_REQUEST: &str =
    "INSERT INTO requests (path, method, status_code, response_time) VALUES ($1, $2, $3, $4)";

const COUNT_REQUESTS: &str = "SELECT COUNT(*) FROM requests";

const COUNT_ACTIVITY: &str = "SELECT count(*) FROM pg_stat_activity";

const REQUEST_STATISTICS: &str = r#"
    SELECT
        count(*) AS total_requests,
        avg(response_time) AS avg_response_time,
        min(response_time) AS min_response_time,
        max(response_time) AS max_response_time
    FROM requests
"#;

// ─── Domain types ────────────────────────────────────────────────

/// One observed HTTP request, as written to the `requests` table.
///
/// `id` and `timestamp` are assigned by the store on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub path: String,
    pub method: String,
    pub status_code: u16,
    /// Seconds between request receipt and response completion.
    pub response_time: f64,
}

/// Aggregates over every stored request. The float fields are `None` on an
/// empty table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestStatistics {
    pub total_requests: i64,
    pub avg_response_time: Option<f64>,
    pub min_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to build connection pool: {0}")]
    Build(#[from] deadpool_postgres::BuildError),

    /// The store cannot serve queries at all. `PgStore` never returns this;
    /// it is for other `RequestStore` implementations.
    #[error("{0}")]
    Unavailable(String),
}

// ─── Store seam ──────────────────────────────────────────────────

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Creates the `requests` table if it does not exist.
    async fn init_schema(&self) -> Result<(), StoreError>;

    async fn insert(&self, record: &RequestRecord) -> Result<(), StoreError>;

    /// `COUNT(*)` over stored requests.
    async fn count(&self) -> Result<i64, StoreError>;

    /// Number of backends the database itself reports as connected.
    async fn active_connections(&self) -> Result<i64, StoreError>;

    async fn statistics(&self) -> Result<RequestStatistics, StoreError>;

    /// Trivial liveness query.
    async fn ping(&self) -> Result<(), StoreError>;
}

// ─── Postgres implementation ─────────────────────────────────────

/// `RequestStore` backed by a deadpool-managed set of tokio-postgres clients.
///
/// Every operation checks out one connection; the pooled object hands it back
/// when dropped, whether the query succeeded or not.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Builds the pool from a connection string. No connection is opened
    /// until the first query.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pg_config: tokio_postgres::Config = database_url.parse()?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager).build()?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl RequestStore for PgStore {
    async fn init_schema(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.batch_execute(CREATE_REQUESTS_TABLE).await?;
        Ok(())
    }

    async fn insert(&self, record: &RequestRecord) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let status_code = i32::from(record.status_code);
        client
            .execute(
                INSERT_REQUEST,
                &[
                    &record.path,
                    &record.method,
                    &status_code,
                    &record.response_time,
                ],
            )
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let client = self.pool.get().await?;
        let row = client.query_one(COUNT_REQUESTS, &[]).await?;
        Ok(row.try_get(0)?)
    }

    async fn active_connections(&self) -> Result<i64, StoreError> {
        let client = self.pool.get().await?;
        let row = client.query_one(COUNT_ACTIVITY, &[]).await?;
        Ok(row.try_get(0)?)
    }

    async fn statistics(&self) -> Result<RequestStatistics, StoreError> {
        let client = self.pool.get().await?;
        let row = client.query_one(REQUEST_STATISTICS, &[]).await?;
        Ok(RequestStatistics {
            total_requests: row.try_get("total_requests")?,
            avg_response_time: row.try_get("avg_response_time")?,
            min_response_time: row.try_get("min_response_time")?,
            max_response_time: row.try_get("max_response_time")?,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }
}

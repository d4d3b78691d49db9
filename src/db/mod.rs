//! Persistence seam for employees and computed metrics.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Settings, StoreBackend};
use crate::models::employee::{Employee, EmployeeQuery};
use crate::models::metric::{Metric, MetricUpdate, Segment};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the id is taken.
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()>;

    async fn get_employee(&self, id: i32) -> StoreResult<Option<Employee>>;

    async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<Vec<Employee>>;

    /// Replaces the stored record with the same id; `false` if there is none.
    async fn update_employee(&self, employee: &Employee) -> StoreResult<bool>;

    async fn delete_employee(&self, id: i32) -> StoreResult<bool>;

    /// Exact-match segment read used by the aggregations.
    async fn employees_in_segment(&self, segment: &Segment) -> StoreResult<Vec<Employee>>;
}

#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Creates the segment's row if absent, then overwrites the fields set in `update`.
    async fn upsert_metric(&self, segment: &Segment, update: &MetricUpdate) -> StoreResult<Metric>;

    async fn get_metric(&self, segment: &Segment) -> StoreResult<Option<Metric>>;

    async fn list_metrics(&self) -> StoreResult<Vec<Metric>>;
}

pub trait Store: EmployeeStore + MetricStore {}

impl<T: EmployeeStore + MetricStore> Store for T {}

pub async fn create_store(settings: &Settings) -> StoreResult<Arc<dyn Store>> {
    match settings.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let database_url = settings.database_url.as_deref().ok_or_else(|| {
                StoreError::Backend("DATABASE_URL must be set for the postgres store".to_string())
            })?;
            let store = PgStore::connect(database_url, settings.database_max_connections).await?;
            info!("Connected to postgres store");
            Ok(Arc::new(store))
        }
    }
}

// src/load/mod.rs

pub mod bigquery;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::error::PipelineResult;
use crate::schema::{Column, SchemaStore};
use crate::storage::object_uri;

pub use bigquery::BigQueryWarehouse;

/// Rows skipped at the top of every staged CSV (the header).
pub const CSV_HEADER_ROWS: u32 = 1;

/// Bulk load of one staged CSV object into `<dataset>.<table>`. Always CSV,
/// always an explicit schema, never autodetect, append only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub source_uri: String,
    pub dataset: String,
    pub table: String,
    pub columns: Vec<Column>,
    pub skip_leading_rows: u32,
}

/// A submitted load job, as reported back by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJobRef {
    pub job_id: String,
    /// Where the job runs; status checks must ask the same location.
    pub location: Option<String>,
}

/// A table store that accepts load jobs.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Start a load job. Rejections map to `LoadSubmission`.
    async fn submit_load(&self, request: &LoadRequest) -> PipelineResult<LoadJobRef>;

    /// Block until the job is terminal. A failed job maps to `LoadJob`.
    async fn wait_for_job(&self, job: &LoadJobRef, table: &str) -> PipelineResult<()>;
}

/// Load `gs://<bucket>/<file_name>` into `<dataset>.<table>` using the
/// schema persisted for `table`. Fails with `SchemaNotFound` before any job
/// is submitted when there is none.
#[instrument(level = "debug", skip(warehouse, schemas))]
pub async fn load_table(
    warehouse: &dyn Warehouse,
    schemas: &dyn SchemaStore,
    bucket: &str,
    file_name: &str,
    table: &str,
    dataset: &str,
) -> PipelineResult<String> {
    let source_uri = object_uri(bucket, file_name);
    let descriptor = schemas.load(table)?;

    let request = LoadRequest {
        source_uri,
        dataset: dataset.to_string(),
        table: table.to_string(),
        columns: descriptor.columns,
        skip_leading_rows: CSV_HEADER_ROWS,
    };

    let job = warehouse.submit_load(&request).await?;
    info!(
        file = %file_name,
        table = %table,
        job_id = %job.job_id,
        location = ?job.location,
        "load job started"
    );

    warehouse.wait_for_job(&job, table).await?;
    info!(file = %file_name, table = %table, "file loaded");
    Ok(job.job_id)
}

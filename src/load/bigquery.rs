// src/load/bigquery.rs

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use google_cloud_bigquery::client::{Client as BqClient, ClientConfig as BqConfig};
use google_cloud_bigquery::http::job::get::GetJobRequest;
use google_cloud_bigquery::http::job::{
    Job, JobConfiguration, JobConfigurationLoad, JobReference, JobState, JobStatus, JobType,
    WriteDisposition,
};
use google_cloud_bigquery::http::table::{
    SourceFormat, TableFieldMode, TableFieldSchema, TableFieldType, TableReference, TableSchema,
};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{LoadJobRef, LoadRequest, Warehouse};
use crate::error::{PipelineError, PipelineResult};
use crate::schema::Column;

/// BigQuery load jobs, authenticated with application default credentials.
pub struct BigQueryWarehouse {
    client: BqClient,
    project_id: String,
    location: Option<String>,
    poll_interval: Duration,
}

impl BigQueryWarehouse {
    /// `project` overrides the project taken from the credentials.
    pub async fn connect(
        project: Option<String>,
        location: Option<String>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let (cfg, project_from_creds) = BqConfig::new_with_auth()
            .await
            .context("authenticating BigQuery client")?;
        let project_id = project
            .or(project_from_creds)
            .ok_or_else(|| anyhow!("no project id given and none in the credentials"))?;
        let client = BqClient::new(cfg)
            .await
            .context("creating BigQuery client")?;
        Ok(Self {
            client,
            project_id,
            location,
            poll_interval,
        })
    }

    fn job_id_for(table: &str) -> String {
        format!("sheetload_{}_{}", table, Utc::now().timestamp_micros())
    }
}

fn field_type(ty: &str) -> Option<TableFieldType> {
    match ty.to_ascii_uppercase().as_str() {
        "STRING" => Some(TableFieldType::String),
        "INTEGER" | "INT64" => Some(TableFieldType::Integer),
        "FLOAT" | "FLOAT64" => Some(TableFieldType::Float),
        "BOOLEAN" | "BOOL" => Some(TableFieldType::Boolean),
        "DATE" => Some(TableFieldType::Date),
        "TIMESTAMP" => Some(TableFieldType::Timestamp),
        _ => None,
    }
}

fn field_mode(mode: &str) -> Option<TableFieldMode> {
    match mode.to_ascii_uppercase().as_str() {
        "NULLABLE" => Some(TableFieldMode::Nullable),
        "REQUIRED" => Some(TableFieldMode::Required),
        "REPEATED" => Some(TableFieldMode::Repeated),
        _ => None,
    }
}

/// The job as created. The service may place it somewhere other than the
/// configured location, and reports where.
fn job_ref(created: JobReference, configured: Option<&String>) -> LoadJobRef {
    LoadJobRef {
        job_id: created.job_id,
        location: created.location.or_else(|| configured.cloned()),
    }
}

/// `None` while the job is still pending or running.
fn job_outcome(status: &JobStatus, table: &str, job_id: &str) -> Option<PipelineResult<()>> {
    if !matches!(status.state, JobState::Done) {
        return None;
    }
    let Some(result) = &status.error_result else {
        return Some(Ok(()));
    };
    let mut diagnostics = vec![result
        .message
        .clone()
        .unwrap_or_else(|| "load job failed".into())];
    for message in status.errors.iter().flatten().filter_map(|e| e.message.as_ref()) {
        if !diagnostics.contains(message) {
            diagnostics.push(message.clone());
        }
    }
    Some(Err(PipelineError::LoadJob {
        table: table.to_string(),
        job_id: job_id.to_string(),
        diagnostics,
    }))
}

fn table_schema(table: &str, columns: &[Column]) -> PipelineResult<TableSchema> {
    let reject = |what: &str, col: &Column, value: &str| PipelineError::LoadSubmission {
        table: table.to_string(),
        message: format!("column `{}` has unsupported {} `{}`", col.name, what, value),
    };
    let fields = columns
        .iter()
        .map(|col| -> PipelineResult<TableFieldSchema> {
            Ok(TableFieldSchema {
                name: col.name.clone(),
                data_type: field_type(&col.ty).ok_or_else(|| reject("type", col, &col.ty))?,
                mode: Some(field_mode(&col.mode).ok_or_else(|| reject("mode", col, &col.mode))?),
                ..Default::default()
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;
    Ok(TableSchema { fields })
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    #[instrument(level = "debug", skip(self, request), fields(table = %request.table))]
    async fn submit_load(&self, request: &LoadRequest) -> PipelineResult<LoadJobRef> {
        let job_id = Self::job_id_for(&request.table);
        let job = Job {
            job_reference: JobReference {
                project_id: self.project_id.clone(),
                job_id: job_id.clone(),
                location: self.location.clone(),
            },
            configuration: JobConfiguration {
                job: JobType::Load(JobConfigurationLoad {
                    source_uris: vec![request.source_uri.clone()],
                    source_format: Some(SourceFormat::Csv),
                    schema: Some(table_schema(&request.table, &request.columns)?),
                    autodetect: Some(false),
                    skip_leading_rows: Some(request.skip_leading_rows as i64),
                    write_disposition: Some(WriteDisposition::WriteAppend),
                    destination_table: TableReference {
                        project_id: self.project_id.clone(),
                        dataset_id: request.dataset.clone(),
                        table_id: request.table.clone(),
                    },
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let created = self
            .client
            .job()
            .create(&job)
            .await
            .map_err(|e| PipelineError::LoadSubmission {
                table: request.table.clone(),
                message: e.to_string(),
            })?;
        let job = job_ref(created.job_reference, self.location.as_ref());
        debug!(job_id = %job.job_id, location = ?job.location, "load job created");
        Ok(job)
    }

    #[instrument(level = "debug", skip(self, job), fields(job_id = %job.job_id))]
    async fn wait_for_job(&self, job: &LoadJobRef, table: &str) -> PipelineResult<()> {
        let request = GetJobRequest {
            location: job.location.clone(),
        };
        loop {
            let polled = self
                .client
                .job()
                .get(&self.project_id, &job.job_id, &request)
                .await
                .map_err(|e| PipelineError::LoadJob {
                    table: table.to_string(),
                    job_id: job.job_id.clone(),
                    diagnostics: vec![format!("polling job status: {}", e)],
                })?;

            if let Some(outcome) = job_outcome(&polled.status, table, &job.job_id) {
                return outcome;
            }
            debug!(state = ?polled.status.state, "waiting for load job");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_columns_map_to_nullable_strings() {
        let schema = table_schema("t", &[Column::text("a"), Column::text("b")]).unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].name, "a");
        assert!(matches!(schema.fields[1].data_type, TableFieldType::String));
        assert!(matches!(schema.fields[1].mode, Some(TableFieldMode::Nullable)));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let col = Column {
            name: "a".into(),
            ty: "GEOGRAPHY_ISH".into(),
            mode: "NULLABLE".into(),
        };
        assert!(matches!(
            table_schema("t", &[col]),
            Err(PipelineError::LoadSubmission { .. })
        ));
    }

    fn status(json: &str) -> JobStatus {
        serde_json::from_str(json).unwrap()
    }

    fn diagnostics_of(outcome: Option<PipelineResult<()>>) -> Vec<String> {
        match outcome {
            Some(Err(PipelineError::LoadJob { diagnostics, .. })) => diagnostics,
            other => panic!("expected a failed job, got {other:?}"),
        }
    }

    #[test]
    fn running_job_has_no_outcome() {
        assert!(job_outcome(&status(r#"{"state":"RUNNING"}"#), "t", "j").is_none());
        assert!(job_outcome(&status(r#"{"state":"PENDING"}"#), "t", "j").is_none());
    }

    #[test]
    fn done_without_error_succeeds() {
        assert!(matches!(
            job_outcome(&status(r#"{"state":"DONE"}"#), "t", "j"),
            Some(Ok(()))
        ));
    }

    #[test]
    fn failed_job_lists_backend_messages() {
        let st = status(
            r#"{"state":"DONE",
                "errorResult":{"reason":"invalid","message":"Error while reading data"},
                "errors":[
                    {"reason":"invalid","message":"Error while reading data"},
                    {"reason":"invalid","message":"Too many values in row 2"},
                    {"reason":"invalid"}
                ]}"#,
        );
        match job_outcome(&st, "raw_source1", "job-7") {
            Some(Err(PipelineError::LoadJob {
                table,
                job_id,
                diagnostics,
            })) => {
                assert_eq!(table, "raw_source1");
                assert_eq!(job_id, "job-7");
                assert_eq!(
                    diagnostics,
                    vec!["Error while reading data", "Too many values in row 2"]
                );
            }
            other => panic!("expected a failed job, got {other:?}"),
        }
    }

    #[test]
    fn failed_job_without_message_still_reports() {
        let st = status(r#"{"state":"DONE","errorResult":{"reason":"backendError"}}"#);
        assert_eq!(diagnostics_of(job_outcome(&st, "t", "j")), vec!["load job failed"]);
    }

    #[test]
    fn polls_where_the_job_was_created() {
        let created = JobReference {
            project_id: "p".into(),
            job_id: "sheetload_t_1".into(),
            location: Some("europe-west2".into()),
        };
        let job = job_ref(created, None);
        assert_eq!(job.job_id, "sheetload_t_1");
        assert_eq!(job.location.as_deref(), Some("europe-west2"));

        let unplaced = JobReference {
            project_id: "p".into(),
            job_id: "sheetload_t_2".into(),
            location: None,
        };
        let configured = "US".to_string();
        assert_eq!(job_ref(unplaced, Some(&configured)).location.as_deref(), Some("US"));
    }

    #[test]
    fn job_ids_name_the_table() {
        assert!(BigQueryWarehouse::job_id_for("raw_source1").starts_with("sheetload_raw_source1_"));
    }
}

// src/pipeline.rs

use std::path::PathBuf;
use tracing::info;

use crate::config::SheetTableMapping;
use crate::error::PipelineResult;
use crate::fetch::SheetSource;
use crate::load::{load_table, Warehouse};
use crate::process::{staged_file_name, CorrectionRules, Extractor, StagedObject};
use crate::schema::SchemaStore;
use crate::storage::ObjectStore;

/// Backend handles, built once at startup and borrowed by every stage.
pub struct Pipeline<'a> {
    pub sheets: &'a dyn SheetSource,
    pub objects: &'a dyn ObjectStore,
    pub warehouse: &'a dyn Warehouse,
    pub schemas: &'a dyn SchemaStore,
    pub corrections: CorrectionRules,
    pub bucket: String,
    pub dataset: String,
    pub staging_dir: PathBuf,
}

/// What a successful run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub staged: Vec<StagedObject>,
    pub load_jobs: Vec<String>,
}

impl<'a> Pipeline<'a> {
    /// Extract every mapped sheet, then load every mapped table, both in
    /// mapping order. Stops at the first error; finished work is kept.
    ///
    /// Precondition: no other run uses the same staging directory.
    pub async fn run(&self, mapping: &SheetTableMapping) -> PipelineResult<RunSummary> {
        let mut summary = RunSummary::default();

        let extractor = Extractor {
            source: self.sheets,
            objects: self.objects,
            schemas: self.schemas,
            corrections: &self.corrections,
            bucket: &self.bucket,
            staging_dir: &self.staging_dir,
        };
        for (sheet, table) in mapping.iter() {
            summary.staged.push(extractor.extract(sheet, table).await?);
        }
        info!(sheets = summary.staged.len(), "extraction complete");

        for (sheet, table) in mapping.iter() {
            let job_id = load_table(
                self.warehouse,
                self.schemas,
                &self.bucket,
                &staged_file_name(sheet),
                table,
                &self.dataset,
            )
            .await?;
            summary.load_jobs.push(job_id);
        }
        info!(tables = summary.load_jobs.len(), "load complete");

        Ok(summary)
    }
}

// src/process/extract.rs

use std::{fs, path::Path};
use tracing::{debug, info, instrument, warn};

use super::{
    corrections::CorrectionRules,
    utils::{clean_field, normalize_column_names},
};
use crate::error::PipelineResult;
use crate::fetch::{CellValue, SheetDataset, SheetSource};
use crate::schema::{generate_schema, SchemaStore};
use crate::storage::{object_uri, ObjectStore};

/// Where one sheet ended up in the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub bucket: String,
    pub name: String,
    pub uri: String,
    pub rows: usize,
}

/// Local and remote name of a sheet's staged CSV.
pub fn staged_file_name(sheet: &str) -> String {
    format!("{}.csv", sheet)
}

/// Header + rows as comma separated text.
pub fn write_csv(dataset: &SheetDataset, path: &Path) -> PipelineResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&dataset.columns)?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|cell| cell.to_csv_field()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Turns sheets into staged CSV objects.
///
/// Each sheet is staged through `<staging_dir>/<sheet>.csv`; two runs must
/// not share a staging directory at the same time.
pub struct Extractor<'a> {
    pub source: &'a dyn SheetSource,
    pub objects: &'a dyn ObjectStore,
    pub schemas: &'a dyn SchemaStore,
    pub corrections: &'a CorrectionRules,
    pub bucket: &'a str,
    pub staging_dir: &'a Path,
}

impl<'a> Extractor<'a> {
    /// Fetch, normalize, correct and clean `sheet`, persist the schema of
    /// `table`, then stage the CSV in the bucket.
    #[instrument(level = "info", skip(self), fields(bucket = %self.bucket))]
    pub async fn extract(&self, sheet: &str, table: &str) -> PipelineResult<StagedObject> {
        let mut dataset = self.source.fetch_sheet(sheet).await?;
        debug!(rows = dataset.rows.len(), columns = dataset.columns.len(), "fetched");

        dataset.columns = normalize_column_names(&dataset.columns);
        let mut dataset = self.corrections.apply(dataset)?;
        for row in dataset.rows.iter_mut() {
            for cell in row.iter_mut() {
                *cell = clean_field(std::mem::replace(cell, CellValue::Null));
            }
        }

        generate_schema(sheet, table, &dataset.columns, self.schemas)?;

        let file_name = staged_file_name(sheet);
        fs::create_dir_all(self.staging_dir)?;
        let local_path = self.staging_dir.join(&file_name);
        write_csv(&dataset, &local_path)?;

        self.upload(&local_path, &file_name).await?;
        info!(
            sheet = %sheet,
            object = %file_name,
            bucket = %self.bucket,
            "sheet uploaded"
        );

        remove_staged(&local_path);

        Ok(StagedObject {
            bucket: self.bucket.to_string(),
            uri: object_uri(self.bucket, &file_name),
            name: file_name,
            rows: dataset.rows.len(),
        })
    }

    async fn upload(&self, local_path: &Path, name: &str) -> PipelineResult<()> {
        let data = tokio::fs::read(local_path).await?;
        if let Err(e) = self.objects.put(self.bucket, name, data).await {
            warn!(file = %local_path.display(), "upload failed, keeping local file");
            return Err(e);
        }
        Ok(())
    }
}

/// Best-effort removal of a staged file.
fn remove_staged(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(file = %path.display(), "removed local file"),
        Err(e) => warn!(file = %path.display(), error = %e, "could not remove local file"),
    }
}

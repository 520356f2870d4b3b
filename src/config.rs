// src/config.rs

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Built-in sheet → table mapping, in processing order.
static DEFAULT_MAPPING: &[(&str, &str)] = &[
    ("salesforce_leads", "raw_salesforce_leads"),
    ("source1", "raw_source1"),
    ("source2", "raw_source2"),
    ("source3", "raw_source3"),
];

/// Copy spreadsheet tabs into warehouse tables via object storage.
#[derive(Parser, Debug, Clone)]
#[command(name = "sheetload", version, about)]
pub struct Config {
    /// Service account key; exported as GOOGLE_APPLICATION_CREDENTIALS
    #[arg(long, env = "GCP_KEY")]
    pub credentials: Option<PathBuf>,

    /// Bucket that receives the staged CSV files
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket: String,

    /// Warehouse dataset holding the target tables
    #[arg(long, env = "DATASET_ID")]
    pub dataset: String,

    /// Spreadsheet URL (or bare key)
    #[arg(long, env = "GOOGLE_SHEET_URL")]
    pub sheet_url: String,

    /// Folder for the per-table schema files
    #[arg(long, env = "SCHEMA_FOLDER_PATH", default_value = "models/raw")]
    pub schema_folder: PathBuf,

    /// Project for load jobs; defaults to the one in the credentials
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: Option<String>,

    /// Location for load jobs
    #[arg(long, env = "BQ_LOCATION")]
    pub location: Option<String>,

    /// Where the temporary CSV files are written
    #[arg(long, env = "STAGING_DIR", default_value = ".")]
    pub staging_dir: PathBuf,

    /// YAML list of {sheet, table} entries replacing the built-in mapping
    #[arg(long, env = "SHEET_TABLE_MAPPING")]
    pub mapping: Option<PathBuf>,

    /// Seconds between load job status checks
    #[arg(long, default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// The mapping file if one was given, else the built-in mapping.
    pub fn sheet_table_mapping(&self) -> Result<SheetTableMapping> {
        match &self.mapping {
            Some(path) => SheetTableMapping::from_yaml_file(path),
            None => Ok(SheetTableMapping::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MappingEntry {
    sheet: String,
    table: String,
}

/// Ordered sheet → table pairs. Every sheet appears once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTableMapping {
    entries: Vec<(String, String)>,
}

impl Default for SheetTableMapping {
    fn default() -> Self {
        Self {
            entries: DEFAULT_MAPPING
                .iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
        }
    }
}

impl SheetTableMapping {
    pub fn new<I, S, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let entries: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(s, t)| (s.into(), t.into()))
            .collect();
        if entries.is_empty() {
            bail!("sheet/table mapping is empty");
        }
        {
            let mut seen = HashSet::new();
            for (sheet, _) in &entries {
                if !seen.insert(sheet.as_str()) {
                    bail!("sheet `{}` is mapped more than once", sheet);
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let entries: Vec<MappingEntry> =
            serde_yaml::from_str(text).context("parsing sheet/table mapping")?;
        Self::new(entries.into_iter().map(|e| (e.sheet, e.table)))
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading mapping file {}", path.display()))?;
        Self::from_yaml_str(&text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Number of mapped sheets; never zero.
    pub fn sheet_count(&self) -> usize {
        self.entries.len()
    }
}

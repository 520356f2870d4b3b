// src/fetch/sheets.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use google_cloud_auth::{
    project::{create_token_source, Config},
    token_source::TokenSource,
};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{SheetDataset, SheetSource};
use crate::error::{PipelineError, PipelineResult};

static SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
static SHEETS_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

static URL_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9\-_]+)").expect("valid regex"));
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-_]+$").expect("valid regex"));

/// Pull the spreadsheet key out of a share URL. A bare key is returned as-is.
pub fn spreadsheet_id_from_url(url: &str) -> Option<String> {
    if let Some(caps) = URL_KEY.captures(url) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    let trimmed = url.trim();
    BARE_KEY
        .is_match(trimmed)
        .then(|| trimmed.to_string())
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Google Sheets v4 REST reader, authenticated with application default
/// credentials.
pub struct GoogleSheets {
    http: Client,
    spreadsheet_id: String,
    tokens: Box<dyn TokenSource>,
}

impl GoogleSheets {
    pub async fn connect(sheet_url: &str) -> Result<Self> {
        let spreadsheet_id = spreadsheet_id_from_url(sheet_url)
            .with_context(|| format!("no spreadsheet key in {}", sheet_url))?;
        let tokens = create_token_source(Config::default().with_scopes(SHEETS_SCOPES))
            .await
            .context("authenticating Sheets client")?;
        Ok(Self {
            http: Client::new(),
            spreadsheet_id,
            tokens,
        })
    }

    fn endpoint(&self, tail: &[&str]) -> PipelineResult<Url> {
        let mut url = Url::parse(SHEETS_API).map_err(|e| PipelineError::Source(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| PipelineError::Source("sheets endpoint cannot be a base".into()))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> PipelineResult<T> {
        let token = self
            .tokens
            .token()
            .await
            .map_err(|e| PipelineError::Source(format!("fetching access token: {}", e)))?;
        self.http
            .get(url.clone())
            .bearer_auth(&token.access_token)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::Source(format!("GET {}: {}", url, e)))?
            .json::<T>()
            .await
            .map_err(|e| PipelineError::Source(format!("decoding {}: {}", url, e)))
    }

    /// Titles of every tab in the spreadsheet.
    pub async fn sheet_titles(&self) -> PipelineResult<Vec<String>> {
        let url = self.endpoint(&[])?;
        let meta: SpreadsheetMeta = self
            .get_json(url, &[("fields", "sheets.properties.title")])
            .await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }
}

/// A1 range covering the whole tab.
fn whole_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_to_string(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetSource for GoogleSheets {
    #[instrument(level = "debug", skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    async fn fetch_sheet(&self, sheet: &str) -> PipelineResult<SheetDataset> {
        let titles = self.sheet_titles().await?;
        if !titles.iter().any(|t| t == sheet) {
            return Err(PipelineError::NotFound {
                what: "sheet",
                name: sheet.to_string(),
            });
        }

        let range = whole_sheet_range(sheet);
        let url = self.endpoint(&["values", &range])?;
        let values: ValueRange = self
            .get_json(
                url,
                &[
                    ("majorDimension", "ROWS"),
                    ("valueRenderOption", "FORMATTED_VALUE"),
                ],
            )
            .await?;

        let grid: Vec<Vec<String>> = values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        debug!(rows = grid.len().saturating_sub(1), "fetched sheet values");
        Ok(SheetDataset::from_grid(sheet, grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_share_url() {
        let url = "https://docs.google.com/spreadsheets/d/1AbC-d_EF/edit#gid=0";
        assert_eq!(spreadsheet_id_from_url(url).as_deref(), Some("1AbC-d_EF"));
        assert_eq!(spreadsheet_id_from_url("1AbC-d_EF").as_deref(), Some("1AbC-d_EF"));
        assert_eq!(spreadsheet_id_from_url("https://example.com/x"), None);
    }

    #[test]
    fn range_quotes_title() {
        assert_eq!(whole_sheet_range("source1"), "'source1'");
        assert_eq!(whole_sheet_range("Bob's tab"), "'Bob''s tab'");
    }

    #[test]
    fn json_cells_become_strings() {
        assert_eq!(cell_to_string(serde_json::json!("a")), "a");
        assert_eq!(cell_to_string(serde_json::json!(12)), "12");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }
}

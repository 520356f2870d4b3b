// src/fetch/memory.rs

use async_trait::async_trait;
use std::collections::HashMap;

use super::{SheetDataset, SheetSource};
use crate::error::{PipelineError, PipelineResult};

/// Sheet source backed by datasets held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySheetSource {
    sheets: HashMap<String, SheetDataset>,
}

impl MemorySheetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, dataset: SheetDataset) -> Self {
        self.insert(dataset);
        self
    }

    pub fn insert(&mut self, dataset: SheetDataset) {
        self.sheets.insert(dataset.name.clone(), dataset);
    }
}

#[async_trait]
impl SheetSource for MemorySheetSource {
    async fn fetch_sheet(&self, sheet: &str) -> PipelineResult<SheetDataset> {
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound {
                what: "sheet",
                name: sheet.to_string(),
            })
    }
}

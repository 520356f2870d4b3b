// src/process/corrections.rs

use crate::error::{PipelineError, PipelineResult};
use crate::fetch::{CellValue, SheetDataset};

/// Marker written over known junk in free-text columns.
pub const SENTINEL: &str = "ZZZ";

/// A data fix that only applies to one sheet. Runs after header
/// normalization and before generic field cleaning.
#[derive(Clone, Copy)]
pub struct CorrectionRule {
    pub name: &'static str,
    pub sheet: &'static str,
    pub apply: fn(SheetDataset) -> PipelineResult<SheetDataset>,
}

impl std::fmt::Debug for CorrectionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionRule")
            .field("name", &self.name)
            .field("sheet", &self.sheet)
            .finish()
    }
}

/// Ordered set of correction rules.
#[derive(Debug, Clone)]
pub struct CorrectionRules {
    rules: Vec<CorrectionRule>,
}

impl Default for CorrectionRules {
    fn default() -> Self {
        Self {
            rules: vec![CorrectionRule {
                name: "caregiver_line_markers",
                sheet: "source2",
                apply: caregiver_line_markers,
            }],
        }
    }
}

impl CorrectionRules {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: CorrectionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules_for<'a>(&'a self, sheet: &'a str) -> impl Iterator<Item = &'a CorrectionRule> {
        self.rules.iter().filter(move |r| r.sheet == sheet)
    }

    /// Run every rule registered for the dataset's sheet, in registration order.
    pub fn apply(&self, mut dataset: SheetDataset) -> PipelineResult<SheetDataset> {
        let sheet = dataset.name.clone();
        for rule in self.rules_for(&sheet) {
            tracing::debug!(rule = rule.name, sheet = %sheet, "applying correction");
            dataset = (rule.apply)(dataset)?;
        }
        Ok(dataset)
    }
}

/// Replace each of `needles` inside the text cells of `column` with `marker`.
pub fn replace_in_column(
    mut dataset: SheetDataset,
    column: &str,
    needles: &[&str],
    marker: &str,
) -> PipelineResult<SheetDataset> {
    let idx = dataset
        .column_index(column)
        .ok_or_else(|| PipelineError::SchemaMismatch {
            sheet: dataset.name.clone(),
            column: column.to_string(),
        })?;
    for row in dataset.rows.iter_mut() {
        if let Some(CellValue::Text(s)) = row.get_mut(idx) {
            for needle in needles {
                if s.contains(needle) {
                    *s = s.replace(needle, marker);
                }
            }
        }
    }
    Ok(dataset)
}

fn caregiver_line_markers(dataset: SheetDataset) -> PipelineResult<SheetDataset> {
    replace_in_column(dataset, "primary_caregiver", &["\n \n ", "NEWLINE"], SENTINEL)
}

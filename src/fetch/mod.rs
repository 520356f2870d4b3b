// src/fetch/mod.rs

pub mod memory;
pub mod sheets;

use async_trait::async_trait;

use crate::error::PipelineResult;

pub use memory::MemorySheetSource;
pub use sheets::{spreadsheet_id_from_url, GoogleSheets};

/// A tabular data source returning the rows of one named sheet.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetch every data row of `sheet`. Unknown sheets fail with `NotFound`.
    async fn fetch_sheet(&self, sheet: &str) -> PipelineResult<SheetDataset>;
}

/// One raw cell, typed the way the spreadsheet client hands it over.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Turn a formatted cell into a number where it reads as one.
    ///
    /// Integers win over floats; text containing `_` is never converted, and
    /// empty cells stay empty text. Integers too wide for `i64` keep their
    /// digits as text.
    pub fn numericise(raw: &str) -> Self {
        if raw.contains('_') {
            return CellValue::Text(raw.to_string());
        }
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        if is_integer_literal(trimmed) {
            return CellValue::Text(trimmed.to_string());
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
        CellValue::Text(raw.to_string())
    }

    /// Rendering used for the staged CSV.
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) if f.is_nan() => String::new(),
            CellValue::Float(f) => float_repr(*f),
            CellValue::Text(s) => s.clone(),
        }
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Shortest round-trip digits; exponents are signed and at least two wide
/// (`1e+20`, `1e-07`).
fn float_repr(f: f64) -> String {
    let plain = format!("{:?}", f);
    if !f.is_finite() || !plain.contains('e') {
        return plain;
    }
    let sci = format!("{:e}", f);
    match sci.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => plain,
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// The rows of one sheet. Each row holds exactly one cell per column, in
/// column order; column names may repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetDataset {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetDataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build from a header row followed by formatted data rows. Short rows
    /// are padded with empty text, long rows are cut to the header width.
    pub fn from_grid(name: impl Into<String>, mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::new(name, Vec::new());
        }
        let columns = grid.remove(0);
        let width = columns.len();
        let rows = grid
            .into_iter()
            .map(|raw| {
                let mut row: Vec<CellValue> = raw
                    .iter()
                    .take(width)
                    .map(|v| CellValue::numericise(v))
                    .collect();
                row.resize(width, CellValue::Text(String::new()));
                row
            })
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Append a row; it is padded or cut to the column count.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Text(String::new()));
        self.rows.push(row);
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numericise_prefers_int_then_float() {
        assert_eq!(CellValue::numericise("42"), CellValue::Int(42));
        assert_eq!(CellValue::numericise(" 7 "), CellValue::Int(7));
        assert_eq!(CellValue::numericise("1.5"), CellValue::Float(1.5));
        assert_eq!(CellValue::numericise("1_000"), CellValue::from("1_000"));
        assert_eq!(CellValue::numericise("1,000"), CellValue::from("1,000"));
        assert_eq!(CellValue::numericise(""), CellValue::from(""));
        assert_eq!(CellValue::numericise("abc"), CellValue::from("abc"));
    }

    #[test]
    fn wide_integers_keep_every_digit() {
        let id = "12345678901234567890123";
        assert_eq!(CellValue::numericise(id), CellValue::from(id));
        assert_eq!(CellValue::numericise(id).to_csv_field(), id);
        assert_eq!(
            CellValue::numericise(" -98765432109876543210 ").to_csv_field(),
            "-98765432109876543210"
        );
        assert_eq!(CellValue::numericise("9223372036854775807"), CellValue::Int(i64::MAX));
    }

    #[test]
    fn csv_rendering() {
        assert_eq!(CellValue::Float(3.0).to_csv_field(), "3.0");
        assert_eq!(CellValue::Float(0.25).to_csv_field(), "0.25");
        assert_eq!(CellValue::Float(f64::NAN).to_csv_field(), "");
        assert_eq!(CellValue::Int(-4).to_csv_field(), "-4");
        assert_eq!(CellValue::Null.to_csv_field(), "");
    }

    #[test]
    fn float_exponents_are_signed_and_padded() {
        assert_eq!(CellValue::Float(1e20).to_csv_field(), "1e+20");
        assert_eq!(CellValue::Float(1e-7).to_csv_field(), "1e-07");
        assert_eq!(CellValue::Float(-2.5e-5).to_csv_field(), "-2.5e-05");
        assert_eq!(CellValue::Float(1.5e100).to_csv_field(), "1.5e+100");
        assert_eq!(CellValue::Float(0.0001).to_csv_field(), "0.0001");
        assert_eq!(CellValue::Float(1e15).to_csv_field(), "1000000000000000.0");
        assert_eq!(CellValue::Float(f64::INFINITY).to_csv_field(), "inf");
    }

    #[test]
    fn grid_rows_are_squared_to_header() {
        let grid = vec![
            vec!["A".to_string(), "B".to_string()],
            vec!["x".to_string()],
            vec!["1".to_string(), "y".to_string(), "extra".to_string()],
        ];
        let ds = SheetDataset::from_grid("s", grid);
        assert_eq!(ds.columns, vec!["A", "B"]);
        assert_eq!(ds.rows[0], vec![CellValue::from("x"), CellValue::from("")]);
        assert_eq!(ds.rows[1], vec![CellValue::Int(1), CellValue::from("y")]);
        assert_eq!(ds.column_index("B"), Some(1));
    }

    #[test]
    fn empty_grid_has_no_columns() {
        let ds = SheetDataset::from_grid("s", Vec::new());
        assert!(ds.columns.is_empty());
        assert!(ds.rows.is_empty());
    }
}

use std::path::PathBuf;
use tracing::{info, warn};

use super::{Column, SchemaDescriptor, SchemaStore};
use crate::error::PipelineResult;
use crate::process::utils::duplicate_columns;

/// Build the STRING/NULLABLE descriptor for `columns` and persist it as the
/// schema of `table_name`, replacing any previous one.
///
/// - `sheet_label`: source sheet, only used in the description
/// - `columns`: cleaned column names, in dataset order; duplicates are kept
pub fn generate_schema(
    sheet_label: &str,
    table_name: &str,
    columns: &[String],
    store: &dyn SchemaStore,
) -> PipelineResult<PathBuf> {
    let dups = duplicate_columns(columns);
    if !dups.is_empty() {
        warn!(table = %table_name, duplicates = ?dups, "schema has duplicate column names");
    }

    let descriptor = SchemaDescriptor {
        table: table_name.to_string(),
        description: Some(format!("Schema for {} data", sheet_label)),
        columns: columns.iter().map(Column::text).collect(),
    };
    let path = store.save(&descriptor)?;
    info!(table = %table_name, path = %path.display(), "schema saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::utils::normalize_column_names;
    use crate::schema::{MemorySchemaStore, YamlSchemaStore, NULLABLE_MODE, STRING_TYPE};
    use tempfile::tempdir;

    #[test]
    fn generated_schema_reads_back_in_order() {
        let tmp = tempdir().unwrap();
        let store = YamlSchemaStore::new(tmp.path().join("models/raw"));
        let cols = normalize_column_names(&["Full Name", "Email Address"]);

        let path = generate_schema("leads", "raw_leads", &cols, &store).unwrap();
        assert!(path.ends_with("raw_leads.yml"));

        let back = store.load("raw_leads").unwrap();
        assert_eq!(back.description.as_deref(), Some("Schema for leads data"));
        let names: Vec<&str> = back.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["full_name", "email_address"]);
        assert!(back
            .columns
            .iter()
            .all(|c| c.ty == STRING_TYPE && c.mode == NULLABLE_MODE));
    }

    #[test]
    fn duplicate_names_are_preserved() {
        let store = MemorySchemaStore::new();
        let cols = vec!["a".to_string(), "a".to_string()];
        generate_schema("s", "t", &cols, &store).unwrap();
        assert_eq!(store.load("t").unwrap().columns.len(), 2);
    }

    #[test]
    fn empty_column_list_is_allowed() {
        let store = MemorySchemaStore::new();
        generate_schema("s", "t", &[], &store).unwrap();
        assert!(store.load("t").unwrap().columns.is_empty());
    }
}

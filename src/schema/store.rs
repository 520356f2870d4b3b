use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::RwLock,
};
use tracing::debug;

use super::types::{SchemaDescriptor, SchemaDocument};
use crate::error::{PipelineError, PipelineResult};

/// Hand-off point between extraction and loading: descriptors keyed by
/// table name.
pub trait SchemaStore: Send + Sync {
    /// Persist `descriptor`, replacing any previous one for the same table.
    /// Returns where it went, for logging.
    fn save(&self, descriptor: &SchemaDescriptor) -> PipelineResult<PathBuf>;

    /// Read back the descriptor for `table`, or `SchemaNotFound`.
    fn load(&self, table: &str) -> PipelineResult<SchemaDescriptor>;
}

/// `<dir>/<table>.yml` files in the dbt-style `version`/`models` layout.
#[derive(Debug, Clone)]
pub struct YamlSchemaStore {
    dir: PathBuf,
}

impl YamlSchemaStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.yml", table))
    }
}

impl SchemaStore for YamlSchemaStore {
    fn save(&self, descriptor: &SchemaDescriptor) -> PipelineResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&descriptor.table);

        // write to a tmp file, then rename over the original
        let tmp_path = self.dir.join(format!(".{}.yml.tmp", descriptor.table));
        let doc = SchemaDocument::single(descriptor.clone());
        let body = serde_yaml::to_string(&doc)?;
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(body.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);
        fs::rename(&tmp_path, &path)?;

        debug!(path = %path.display(), columns = descriptor.columns.len(), "wrote schema file");
        Ok(path)
    }

    fn load(&self, table: &str) -> PipelineResult<SchemaDescriptor> {
        let path = self.path_for(table);
        if !path.is_file() {
            return Err(PipelineError::SchemaNotFound(table.to_string()));
        }
        let text = fs::read_to_string(&path)?;
        let doc: SchemaDocument = serde_yaml::from_str(&text)?;
        doc.models
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::SchemaNotFound(table.to_string()))
    }
}

/// Descriptors kept in a map; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    map: RwLock<HashMap<String, SchemaDescriptor>>,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaStore for MemorySchemaStore {
    fn save(&self, descriptor: &SchemaDescriptor) -> PipelineResult<PathBuf> {
        self.map
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(descriptor.table.clone(), descriptor.clone());
        Ok(PathBuf::from(format!("{}.yml", descriptor.table)))
    }

    fn load(&self, table: &str) -> PipelineResult<SchemaDescriptor> {
        self.map
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(table)
            .cloned()
            .ok_or_else(|| PipelineError::SchemaNotFound(table.to_string()))
    }
}

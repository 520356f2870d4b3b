pub mod store;
pub mod types;
pub mod write;

pub use store::{MemorySchemaStore, SchemaStore, YamlSchemaStore};
pub use types::{Column, SchemaDescriptor, SchemaDocument, NULLABLE_MODE, STRING_TYPE};
pub use write::generate_schema;

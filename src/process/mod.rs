pub mod corrections;
pub mod extract;
pub mod utils;

pub use corrections::{CorrectionRule, CorrectionRules, SENTINEL};
pub use extract::{staged_file_name, Extractor, StagedObject};
pub use utils::{clean_field, clean_str, normalize_column_names};

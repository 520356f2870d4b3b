pub mod config;
pub mod error;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod storage;

pub use error::{PipelineError, PipelineResult};

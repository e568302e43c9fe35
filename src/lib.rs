pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;

pub use config::Settings;
pub use models::{InputText, Relation, Verdict};
pub use pipeline::{Pipeline, PipelineOptions, RunReport};

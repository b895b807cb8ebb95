pub mod loader;
pub mod schema;

pub use loader::{load, load_from_path, load_from_str, locate, ConfigError, CONFIG_ENV};
pub use schema::{
    CleanConfig, DocrevConfig, MarginsConfig, OutputConfig, RevisionConfig, ValidationError,
    ValidationIssue,
};

pub mod config;
pub mod error;
pub mod parse;
pub mod plan;
pub mod siege;

use std::path::PathBuf;

/// A generated file with path and content.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArborError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFileType(PathBuf),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Failed to initialize language: {0}")]
    LanguageInit(String),
    #[error("Duplicate node id in index: {0}")]
    DuplicateNode(String),
    #[error("Directory walk error: {0}")]
    Walk(#[from] ignore::Error),
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ArborError>;

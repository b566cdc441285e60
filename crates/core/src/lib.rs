pub mod config;
pub mod error;
pub mod logging;

pub mod digest;
pub mod index;
pub mod materialize;
pub mod model;
pub mod navigation;
pub mod parser;
pub mod plugin;
pub mod scanner;
pub mod search;
pub mod session;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use config::ArborConfig;
pub use error::{ArborError, Result};
pub use index::StructureIndex;
pub use plugin::{LanguagePlugin, LanguageRegistry};
pub use session::IndexSession;

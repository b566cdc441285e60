use arbor_core::config::ArborConfig;
use arbor_core::error::Result;
use arbor_core::logging::LogOptions;
use arbor_core::session::IndexSession;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

pub use arbor_lang::default_registry;

/// A project root together with the configuration that applies to it.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ArborConfig,
}

impl Project {
    /// Canonicalizes `root` and loads `config_path`, or `<root>/.arbor.json` when
    /// no explicit file is given.
    pub fn open(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let root = root.canonicalize()?;
        let config = match config_path {
            Some(path) => ArborConfig::load(path)?,
            None => ArborConfig::discover(&root)?,
        };
        Ok(Self { root, config })
    }

    pub fn session(&self) -> Result<IndexSession> {
        build_default_session(self.config.clone())
    }
}

/// Session with every bundled grammar registered.
pub fn build_default_session(config: ArborConfig) -> Result<IndexSession> {
    let registry = default_registry()?;
    tracing::debug!("Registered extensions: {}", registry.extensions().join(", "));
    Ok(IndexSession::new(registry, config))
}

/// Initializes logging for one component. Keep the guard alive until exit.
pub fn init_logging(component: &str, to_stderr: bool, verbosity: u8) -> WorkerGuard {
    arbor_core::logging::init_logging(
        &LogOptions::new(component)
            .with_stderr(to_stderr)
            .with_verbosity(verbosity),
    )
}

mod at;
mod defs;
mod index;
mod search;
mod view;
mod watch;

use arbor_core::watcher::DEFAULT_DEBOUNCE;
use arbor_runtime::Project;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    name = "arbor",
    version,
    about = "Syntax-tree structure index: definition digests, keyword search and cursor lookup",
    long_about = "Arbor parses source files with tree-sitter, keeps every syntax node of every file \
                  in an in-memory index and answers structural questions about them: which \
                  definitions a directory contains, which code fragments match a keyword query, \
                  and which node sits under a cursor."
)]
pub struct Cli {
    /// Configuration file. Defaults to `<project>/.arbor.json` when present
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log to stderr as well; repeat for more detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a project and report what was indexed
    Index {
        #[arg(value_name = "PROJECT_PATH", default_value = ".")]
        path: PathBuf,
    },
    /// Print the definition digest of a file or directory
    #[command(
        long_about = "Lists the line of every named definition, grouped per file. Gaps between \
                      definitions are marked with `|----`."
    )]
    Defs {
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,

        /// Also report unsupported and unparsable files
        #[arg(long)]
        report_skipped: bool,

        /// Stop after this many files
        #[arg(long)]
        max_files: Option<usize>,
    },
    /// Keyword search over every indexed node
    Search {
        /// Whitespace-separated terms; case-insensitive
        #[arg(value_name = "QUERY", required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(long, value_name = "PROJECT_PATH", default_value = ".")]
        path: PathBuf,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show the node under a cursor position
    At {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based line number
        line: usize,

        /// 1-based column
        #[arg(default_value_t = 1)]
        column: usize,
    },
    /// Index a project, then keep the index current as files change
    Watch {
        #[arg(value_name = "PROJECT_PATH", default_value = ".")]
        path: PathBuf,

        /// Quiet period before a burst of changes is applied, in milliseconds
        #[arg(long, default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
        debounce_ms: u64,
    },
}

pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let _guard = arbor_runtime::init_logging("cli", cli.verbose > 0, cli.verbose.saturating_sub(1));

    let rt = tokio::runtime::Runtime::new()?;
    let config = cli.config.as_deref();
    let json = cli.json;

    match cli.command {
        Commands::Index { path } => rt.block_on(index::run(open(&path, config)?, json)),
        Commands::Defs {
            path,
            report_skipped,
            max_files,
        } => {
            let project = open(project_dir(&path), config)?;
            defs::run(&project, &path, report_skipped, max_files, json)
        }
        Commands::Search { query, path, limit } => {
            rt.block_on(search::run(open(&path, config)?, &query.join(" "), limit, json))
        }
        Commands::At { file, line, column } => {
            let project = open(project_dir(&file), config)?;
            rt.block_on(at::run(project, &file, line, column, json))
        }
        Commands::Watch { path, debounce_ms } => {
            rt.block_on(watch::run(open(&path, config)?, debounce_ms))
        }
    }
}

fn open(path: &Path, config: Option<&Path>) -> CliResult<Project> {
    Ok(Project::open(path, config)?)
}

/// The directory a file argument belongs to; directories stand for themselves.
fn project_dir(path: &Path) -> &Path {
    if path.is_file() {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    } else {
        path
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

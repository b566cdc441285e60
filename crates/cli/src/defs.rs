use crate::{CliResult, print_json};
use arbor_core::digest::{DefinitionLister, NO_DEFINITIONS};
use arbor_runtime::Project;
use std::path::Path;

pub fn run(
    project: &Project,
    path: &Path,
    report_skipped: bool,
    max_files: Option<usize>,
    json: bool,
) -> CliResult<()> {
    let mut config = project.config.digest.clone();
    config.verbose |= report_skipped;
    if let Some(max_files) = max_files {
        config.max_files = max_files;
    }

    let registry = arbor_runtime::default_registry()?;
    let lister = DefinitionLister::new(&registry, config);
    let digest = if path.is_file() {
        let shown = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match lister.digest_file(path)? {
            Some(block) => format!("{shown}\n{block}"),
            None => format!("{NO_DEFINITIONS}\n"),
        }
    } else {
        lister.list_directory(path)?
    };

    if json {
        print_json(&serde_json::json!({
            "path": path,
            "digest": digest,
        }))
    } else {
        print!("{digest}");
        Ok(())
    }
}

#![allow(dead_code)]

use arbor_core::index::StructureIndex;
use arbor_core::parser::ParsedFile;
use arbor_core::plugin::LanguageRegistry;
use std::path::Path;

pub fn registry() -> LanguageRegistry {
    arbor_lang::default_registry().unwrap()
}

pub fn parse(path: &str, source: &str) -> ParsedFile {
    let plugin = registry().for_path(Path::new(path)).unwrap();
    ParsedFile::parse(path, source, plugin).unwrap()
}

pub fn index_sources(files: &[(&str, &str)]) -> StructureIndex {
    let mut index = StructureIndex::new();
    for (path, source) in files {
        index.index_file(&parse(path, source)).unwrap();
    }
    index
}

/// Writes `files` below `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

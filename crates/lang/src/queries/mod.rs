//! Definition queries. Identifiers are captured as `name.definition.<kind>`, the
//! enclosing construct as `definition.<kind>`.

pub const JAVASCRIPT_DEFINITIONS_SCM: &str = include_str!("javascript.scm");
pub const TYPESCRIPT_DEFINITIONS_SCM: &str = include_str!("typescript.scm");
pub const PYTHON_DEFINITIONS_SCM: &str = include_str!("python.scm");
pub const RUST_DEFINITIONS_SCM: &str = include_str!("rust.scm");

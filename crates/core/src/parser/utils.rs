use crate::error::{ArborError, Result};
use tree_sitter::{Language, Query};

/// Compiles a definition query, rejecting queries that capture nothing.
pub fn load_query(language: &Language, scm: &str) -> Result<Query> {
    let query = Query::new(language, scm).map_err(|e| {
        ArborError::Query(format!(
            "invalid query at row {}, column {}: {}",
            e.row, e.column, e.message
        ))
    })?;
    if query.capture_names().is_empty() {
        return Err(ArborError::Query("query declares no captures".to_string()));
    }
    Ok(query)
}

/// Label of the capture at `index`, as written in the `.scm` source.
pub fn capture_label(query: &Query, index: u32) -> Option<&str> {
    query.capture_names().get(index as usize).copied()
}

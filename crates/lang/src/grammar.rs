use crate::queries;
use arbor_core::error::Result;
use arbor_core::model::NodeKind;
use arbor_core::parser::utils::load_query;
use arbor_core::plugin::LanguagePlugin;
use tree_sitter::{Language, Query};

/// Grammars compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Rust,
}

impl Grammar {
    pub const ALL: [Grammar; 5] = [
        Grammar::JavaScript,
        Grammar::TypeScript,
        Grammar::Tsx,
        Grammar::Python,
        Grammar::Rust,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Grammar::JavaScript => "javascript",
            Grammar::TypeScript => "typescript",
            Grammar::Tsx => "tsx",
            Grammar::Python => "python",
            Grammar::Rust => "rust",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Grammar::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Grammar::TypeScript => &["ts", "mts", "cts"],
            Grammar::Tsx => &["tsx"],
            Grammar::Python => &["py"],
            Grammar::Rust => &["rs"],
        }
    }

    pub fn language(self) -> Language {
        match self {
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::Python => tree_sitter_python::LANGUAGE.into(),
            Grammar::Rust => tree_sitter_rust::LANGUAGE.into(),
        }
    }

    fn definitions_scm(self) -> &'static str {
        match self {
            Grammar::JavaScript => queries::JAVASCRIPT_DEFINITIONS_SCM,
            Grammar::TypeScript | Grammar::Tsx => queries::TYPESCRIPT_DEFINITIONS_SCM,
            Grammar::Python => queries::PYTHON_DEFINITIONS_SCM,
            Grammar::Rust => queries::RUST_DEFINITIONS_SCM,
        }
    }

    /// Grammar-specific node types first, the shared table for everything else.
    pub fn classify(self, grammar_kind: &str) -> NodeKind {
        match (self, grammar_kind) {
            (Grammar::Rust, "line_comment" | "block_comment") => NodeKind::Comment,
            (Grammar::Rust, "function_signature_item") => NodeKind::FunctionDefinition,
            (Grammar::Rust, "struct_item" | "enum_item" | "union_item") => {
                NodeKind::ClassDefinition
            }
            (Grammar::Rust, "trait_item") => NodeKind::InterfaceDeclaration,
            (Grammar::Rust, "type_item") => NodeKind::TypeAliasDeclaration,
            (Grammar::Rust, "let_declaration" | "const_item" | "static_item") => {
                NodeKind::VariableDeclaration
            }
            (Grammar::Rust, "field_identifier") => NodeKind::PropertyIdentifier,
            (Grammar::TypeScript | Grammar::Tsx, "method_signature" | "abstract_method_signature") => {
                NodeKind::PropertySignature
            }
            _ => NodeKind::from_grammar(grammar_kind),
        }
    }
}

/// [`LanguagePlugin`] backed by one bundled grammar.
pub struct GrammarPlugin {
    grammar: Grammar,
    language: Language,
    definitions: Query,
}

impl GrammarPlugin {
    pub fn new(grammar: Grammar) -> Result<Self> {
        let language = grammar.language();
        let definitions = load_query(&language, grammar.definitions_scm())?;
        tracing::debug!(
            "Loaded {} grammar ({} definition patterns)",
            grammar.name(),
            definitions.pattern_count()
        );
        Ok(Self {
            grammar,
            language,
            definitions,
        })
    }
}

impl LanguagePlugin for GrammarPlugin {
    fn name(&self) -> &str {
        self.grammar.name()
    }

    fn extensions(&self) -> &[&str] {
        self.grammar.extensions()
    }

    fn language(&self) -> &Language {
        &self.language
    }

    fn definition_query(&self) -> &Query {
        &self.definitions
    }

    fn classify(&self, grammar_kind: &str) -> NodeKind {
        self.grammar.classify(grammar_kind)
    }
}

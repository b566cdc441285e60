use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural category of a materialized node.
///
/// Grammars name the same construct differently (`function_declaration`,
/// `function_definition`, `function_item`, ...). Each language plugin maps its
/// grammar types onto this closed set; anything unrecognized is `Other`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    FunctionDefinition,
    MethodDefinition,
    ClassDefinition,
    VariableDeclaration,
    InterfaceDeclaration,
    TypeAliasDeclaration,
    PropertySignature,
    PropertyIdentifier,
    TypeIdentifier,
    Comment,
    Other,
}

impl NodeKind {
    /// Grammar-neutral classification used when a plugin has no override.
    pub fn from_grammar(kind: &str) -> Self {
        match kind {
            "function_declaration" | "generator_function_declaration" | "function_definition"
            | "function_item" => NodeKind::FunctionDefinition,
            "method_definition" | "method_declaration" => NodeKind::MethodDefinition,
            "class_declaration" | "abstract_class_declaration" | "class_definition" => {
                NodeKind::ClassDefinition
            }
            "variable_declaration" | "lexical_declaration" => NodeKind::VariableDeclaration,
            "interface_declaration" => NodeKind::InterfaceDeclaration,
            "type_alias_declaration" => NodeKind::TypeAliasDeclaration,
            "property_signature" => NodeKind::PropertySignature,
            "property_identifier" => NodeKind::PropertyIdentifier,
            "type_identifier" => NodeKind::TypeIdentifier,
            "comment" => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }

    /// Kinds for which the materializer tries to extract a name.
    pub fn is_definition_like(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDefinition
                | NodeKind::MethodDefinition
                | NodeKind::ClassDefinition
                | NodeKind::VariableDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::TypeAliasDeclaration
                | NodeKind::PropertySignature
        )
    }

    /// Named, reusable units that search ranks above arbitrary fragments.
    pub fn is_reusable_unit(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDefinition | NodeKind::MethodDefinition | NodeKind::ClassDefinition
        )
    }

    /// Type-level declarations that are often shorter than a useful fragment
    /// but still worth finding by name.
    pub fn is_compact_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::InterfaceDeclaration
                | NodeKind::TypeAliasDeclaration
                | NodeKind::PropertySignature
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::FunctionDefinition => "function",
            NodeKind::MethodDefinition => "method",
            NodeKind::ClassDefinition => "class",
            NodeKind::VariableDeclaration => "variable",
            NodeKind::InterfaceDeclaration => "interface",
            NodeKind::TypeAliasDeclaration => "type_alias",
            NodeKind::PropertySignature => "property_signature",
            NodeKind::PropertyIdentifier => "property_identifier",
            NodeKind::TypeIdentifier => "type_identifier",
            NodeKind::Comment => "comment",
            NodeKind::Other => "other",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

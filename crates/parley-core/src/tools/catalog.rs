//! Catalog of tools an agent may bind statically by id.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Invoked by the model during a turn.
    Callable,
    /// A flag on the agent (e.g. accepts images); never invoked.
    Capability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub description: &'static str,
    pub kind: ToolKind,
    /// Whether this server can execute it.
    pub available: bool,
}

pub const WEB_SEARCH: &str = "webSearch";

pub const BUILTIN_TOOLS: &[CatalogEntry] = &[
    CatalogEntry {
        id: WEB_SEARCH,
        description: "Search the web and return the most relevant pages.",
        kind: ToolKind::Callable,
        available: true,
    },
    CatalogEntry {
        id: "codeInterpreter",
        description: "Execute Python code in a sandboxed environment.",
        kind: ToolKind::Callable,
        available: false,
    },
    CatalogEntry {
        id: "vision",
        description: "Enable vision capabilities for the model.",
        kind: ToolKind::Capability,
        available: true,
    },
    CatalogEntry {
        id: "fileUpload",
        description: "Enable file upload capabilities for the model.",
        kind: ToolKind::Capability,
        available: true,
    },
];

pub fn lookup(id: &str) -> Option<&'static CatalogEntry> {
    BUILTIN_TOOLS.iter().find(|t| t.id == id)
}

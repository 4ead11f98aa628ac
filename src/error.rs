//! Structured error types for the Carte layout engine.
//!
//! `CanvasError` covers failures reported by a canvas engine; `CarteError`
//! is what the public API returns. Most layout failures never reach the
//! caller: they are logged and skipped at the dish, section or page level.

use thiserror::Error;

use crate::canvas::BlockId;

/// Failures reported by a [`CanvasEngine`](crate::canvas::CanvasEngine).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    /// The block was destroyed or never existed.
    #[error("block {0} is not valid")]
    InvalidBlock(BlockId),
    /// A text operation was issued against a non-text block.
    #[error("block {0} is not a text block")]
    NotText(BlockId),
    /// A child operation referenced a block that is not a child of the parent.
    #[error("block {child} is not a child of {parent}")]
    NotAChild { parent: BlockId, child: BlockId },
    /// Reparenting would create a cycle in the scene graph.
    #[error("cannot append block {0} under its own descendant")]
    Cycle(BlockId),
    /// A scene string could not be loaded.
    #[error("scene could not be loaded: {0}")]
    Scene(String),
}

/// The unified error type returned by all public Carte API functions.
#[derive(Debug, Error)]
pub enum CarteError {
    /// JSON input failed to parse as a valid menu document.
    #[error("Failed to parse menu: {source}{}", format_hint(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// The canvas engine rejected an operation.
    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),
    /// A layout template is missing or malformed.
    #[error("Template error: {0}")]
    Template(String),
    /// A page id has no matching page in the store or on the canvas.
    #[error("Page {0} not found")]
    MissingPage(String),
    /// A section id has no matching section on its page.
    #[error("Section {0} not found")]
    MissingSection(String),
    /// I/O error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for CarteError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the menu schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        CarteError::ParseError { source: e, hint }
    }
}

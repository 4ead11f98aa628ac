//! # Carte
//!
//! An automatic layout engine for multi-page restaurant menus.
//!
//! Menu designers work on a free canvas, but a menu is not free-form: every
//! dish belongs to a section, every section to a region of a page, and the
//! page has a fixed height. Carte treats **the page as the unit of layout.**
//! Dishes are laid *into* pages: each pass measures what a page holds,
//! solves the spacing that fills it exactly, and rebuilds the page's blocks
//! from the menu data. Running it twice changes nothing.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON / editor edits)
//!       ↓
//!   [store]      : Pages, sections, dishes; dirty-page tracking
//!       ↓
//!   [scheduler]  : Debounce bursts of edits into one pass
//!       ↓
//!   [layout]     : Compose, solve the gap, position, decorate, group
//!       ↓
//!   [canvas]     : Blocks on a design canvas (in-memory `Scene` here)
//!       ↓
//!   [persistence] : Save the scene
//! ```
//!
//! [`Workspace`] wires these together for an editing session;
//! [`layout_json`] lays out a menu document in one call.

pub mod canvas;
pub mod config;
pub mod error;
pub mod font;
pub mod layers;
pub mod layout;
pub mod model;
pub mod overlay;
pub mod persistence;
pub mod scheduler;
pub mod store;
pub mod templates;
pub mod text;
pub mod workspace;

#[cfg(feature = "wasm")]
pub mod wasm;

use serde::Serialize;

pub use error::CarteError;
pub use workspace::Workspace;

use layout::{LayoutInfo, LayoutReport};
use model::Menu;

/// Result of a one-shot layout: what the pass did, and where every block
/// ended up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOutput {
    pub report: LayoutReport,
    pub layout: LayoutInfo,
}

/// Parse a menu document.
pub fn parse_menu(json: &str) -> Result<Menu, CarteError> {
    Ok(serde_json::from_str(json)?)
}

/// Lay out every page of `menu` on a fresh canvas.
pub fn layout_menu(menu: Menu) -> Result<LayoutOutput, CarteError> {
    let mut workspace = Workspace::open(menu)?;
    let report = workspace.layout_now();
    let layout = workspace.info()?;
    Ok(LayoutOutput { report, layout })
}

/// Lay out a menu described as JSON and return the result as JSON.
pub fn layout_json(json: &str) -> Result<String, CarteError> {
    let output = layout_menu(parse_menu(json)?)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

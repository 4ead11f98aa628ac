//! Engine tunables.
//!
//! `LayoutConfig` rides along in the menu document under `"layout"`. Every
//! field has a serde default so a document can omit the block entirely.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gap used when there is nothing to solve for, in inches.
pub const DEFAULT_DISH_GAP: f64 = 0.15;

/// Smallest gap the solver produces for overflowing content, in inches.
pub const MIN_OVERFLOW_GAP: f64 = 0.1;

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Gap returned when a page has one dish or no content.
    #[serde(default = "default_gap")]
    pub default_gap: f64,

    /// Floor applied by the solver when content overflows.
    #[serde(default = "default_min_gap")]
    pub min_overflow_gap: f64,

    /// Below this gap the page is reported as overflowing and the gap is
    /// clamped back up to it.
    #[serde(default = "default_gap")]
    pub readable_gap: f64,

    /// Delay between the last edit and the layout pass.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,

    /// Copy shown by the busy loader.
    #[serde(default = "default_loading_text")]
    pub loading_text: String,

    /// Copy shown by the pending-changes indicator.
    #[serde(default = "default_apply_text")]
    pub apply_changes_text: String,
}

fn default_gap() -> f64 {
    DEFAULT_DISH_GAP
}

fn default_min_gap() -> f64 {
    MIN_OVERFLOW_GAP
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_line_height() -> f64 {
    1.2
}

fn default_loading_text() -> String {
    "Loading\u{2026}".to_string()
}

fn default_apply_text() -> String {
    "Apply Changes".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_gap: default_gap(),
            min_overflow_gap: default_min_gap(),
            readable_gap: default_gap(),
            debounce_ms: default_debounce_ms(),
            line_height: default_line_height(),
            loading_text: default_loading_text(),
            apply_changes_text: default_apply_text(),
        }
    }
}

impl LayoutConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

//! # Canvas Engine
//!
//! The capability set the layout engine needs from a design canvas. The
//! editor's real canvas lives in the host; [`scene::Scene`] is an in-memory
//! implementation used by the CLI, the WASM build and the tests.
//!
//! Coordinates are in inches. A block's position is relative to its parent;
//! [`CanvasEngine::global_bounding_box`] resolves it against the page.

pub mod names;
pub mod scene;

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::CanvasError;
use crate::model::{Color, HorizontalAlign, TextCase, Typeface};

pub use scene::Scene;

/// Handle to a block in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    Scene,
    Page,
    Group,
    Text,
    Graphic,
}

/// How a block's height is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeMode {
    #[default]
    Absolute,
    /// Grow to fit content (text lines, or children for groups).
    Auto,
}

/// How an image fill maps onto its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentFillMode {
    Cover,
    Contain,
    Crop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    Color(Color),
    Image { uri: String, mode: ContentFillMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect { corner_radius: f64 },
}

/// An axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Smallest rect containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockEventType {
    Created,
    Updated,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEvent {
    pub block: BlockId,
    pub kind: BlockEventType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Block primitives consumed by the layout engine.
///
/// Every operation on a destroyed block fails with
/// [`CanvasError::InvalidBlock`].
pub trait CanvasEngine {
    // ── Lifecycle ──────────────────────────────────────────────
    fn create(&mut self, block_type: BlockType) -> BlockId;
    /// Deep-copy a block and its children. The copy is attached to the
    /// original's parent.
    fn duplicate(&mut self, id: BlockId) -> Result<BlockId, CanvasError>;
    /// Destroy a block and all its descendants.
    fn destroy(&mut self, id: BlockId) -> Result<(), CanvasError>;
    fn is_valid(&self, id: BlockId) -> bool;

    // ── Hierarchy ──────────────────────────────────────────────
    fn children(&self, id: BlockId) -> Result<Vec<BlockId>, CanvasError>;
    fn parent(&self, id: BlockId) -> Result<Option<BlockId>, CanvasError>;
    fn append_child(&mut self, parent: BlockId, child: BlockId) -> Result<(), CanvasError>;
    /// Move `child` under `parent` at sibling `index` (clamped).
    fn insert_child(
        &mut self,
        parent: BlockId,
        child: BlockId,
        index: usize,
    ) -> Result<(), CanvasError>;
    fn find_by_name(&self, name: &str) -> Vec<BlockId>;
    fn find_by_type(&self, block_type: BlockType) -> Vec<BlockId>;

    // ── Identity ───────────────────────────────────────────────
    fn block_type(&self, id: BlockId) -> Result<BlockType, CanvasError>;
    fn set_kind(&mut self, id: BlockId, kind: &str) -> Result<(), CanvasError>;
    fn kind(&self, id: BlockId) -> Result<String, CanvasError>;
    fn set_name(&mut self, id: BlockId, name: &str) -> Result<(), CanvasError>;
    fn name(&self, id: BlockId) -> Result<String, CanvasError>;

    // ── Geometry ───────────────────────────────────────────────
    fn set_position_x(&mut self, id: BlockId, x: f64) -> Result<(), CanvasError>;
    fn set_position_y(&mut self, id: BlockId, y: f64) -> Result<(), CanvasError>;
    fn position_x(&self, id: BlockId) -> Result<f64, CanvasError>;
    fn position_y(&self, id: BlockId) -> Result<f64, CanvasError>;
    fn set_width(&mut self, id: BlockId, width: f64) -> Result<(), CanvasError>;
    fn set_height(&mut self, id: BlockId, height: f64) -> Result<(), CanvasError>;
    fn width(&self, id: BlockId) -> Result<f64, CanvasError>;
    /// Resolved height; auto-height blocks report their content height.
    fn height(&self, id: BlockId) -> Result<f64, CanvasError>;
    fn set_height_mode(&mut self, id: BlockId, mode: SizeMode) -> Result<(), CanvasError>;
    fn global_bounding_box(&self, id: BlockId) -> Result<Rect, CanvasError>;

    fn global_bounding_box_height(&self, id: BlockId) -> Result<f64, CanvasError> {
        Ok(self.global_bounding_box(id)?.height)
    }

    // ── Text ───────────────────────────────────────────────────
    /// Replace the whole text. Styled ranges collapse to the style of the
    /// first character and the letter case resets to normal.
    fn replace_text(&mut self, id: BlockId, text: &str) -> Result<(), CanvasError>;
    fn text(&self, id: BlockId) -> Result<String, CanvasError>;
    fn set_text_case(&mut self, id: BlockId, case: TextCase) -> Result<(), CanvasError>;
    fn text_case(&self, id: BlockId) -> Result<TextCase, CanvasError>;
    fn set_text_alignment(&mut self, id: BlockId, align: HorizontalAlign)
        -> Result<(), CanvasError>;
    /// Distinct colors used in the text, in order of first use.
    fn text_colors(&self, id: BlockId) -> Result<Vec<Color>, CanvasError>;
    /// Distinct font sizes used in the text, in order of first use.
    fn text_font_sizes(&self, id: BlockId) -> Result<Vec<f64>, CanvasError>;
    fn typeface(&self, id: BlockId) -> Result<Typeface, CanvasError>;
    /// Set a property on a char range, or on the whole text when `range` is
    /// `None`.
    fn set_text_color(
        &mut self,
        id: BlockId,
        color: Color,
        range: Option<Range<usize>>,
    ) -> Result<(), CanvasError>;
    fn set_text_font_size(
        &mut self,
        id: BlockId,
        size: f64,
        range: Option<Range<usize>>,
    ) -> Result<(), CanvasError>;
    fn set_typeface(
        &mut self,
        id: BlockId,
        typeface: &Typeface,
        range: Option<Range<usize>>,
    ) -> Result<(), CanvasError>;

    // ── Metadata ───────────────────────────────────────────────
    fn set_metadata(&mut self, id: BlockId, key: &str, value: &str) -> Result<(), CanvasError>;
    fn metadata(&self, id: BlockId, key: &str) -> Result<Option<String>, CanvasError>;
    fn remove_metadata(&mut self, id: BlockId, key: &str) -> Result<(), CanvasError>;

    fn has_metadata(&self, id: BlockId, key: &str) -> Result<bool, CanvasError> {
        Ok(self.metadata(id, key)?.is_some())
    }

    // ── Appearance ─────────────────────────────────────────────
    fn set_fill(&mut self, id: BlockId, fill: Fill) -> Result<(), CanvasError>;
    fn fill(&self, id: BlockId) -> Result<Option<Fill>, CanvasError>;
    fn set_shape(&mut self, id: BlockId, shape: Shape) -> Result<(), CanvasError>;
    fn set_visible(&mut self, id: BlockId, visible: bool) -> Result<(), CanvasError>;
    fn set_transform_locked(&mut self, id: BlockId, locked: bool) -> Result<(), CanvasError>;

    // ── Composition & ordering ─────────────────────────────────
    /// Wrap sibling blocks in a new group that keeps their page positions.
    fn group(&mut self, ids: &[BlockId]) -> Result<BlockId, CanvasError>;
    fn bring_to_front(&mut self, id: BlockId) -> Result<(), CanvasError>;
    fn send_to_back(&mut self, id: BlockId) -> Result<(), CanvasError>;

    // ── Scene ──────────────────────────────────────────────────
    fn save_to_string(&self) -> Result<String, CanvasError>;
    fn load_from_string(&mut self, scene: &str) -> Result<(), CanvasError>;

    // ── Events ─────────────────────────────────────────────────
    /// Subscribe to events on `blocks`, or on every block when empty.
    fn subscribe(&mut self, blocks: &[BlockId]) -> SubscriptionId;
    fn unsubscribe(&mut self, subscription: SubscriptionId);
    /// Drain the events queued for a subscription.
    fn poll_events(&mut self, subscription: SubscriptionId) -> Vec<BlockEvent>;
}

/// The page block tagged with `page_id`.
pub fn find_page_block(engine: &dyn CanvasEngine, page_id: &str) -> Option<BlockId> {
    engine.find_by_type(BlockType::Page).into_iter().find(|page| {
        matches!(engine.metadata(*page, names::meta::PAGE_ID), Ok(Some(id)) if id == page_id)
    })
}

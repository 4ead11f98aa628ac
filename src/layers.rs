//! # Layer Order
//!
//! Every layout pass destroys and recreates the auto-layout blocks of a
//! page, which would reset the stacking order of anything the user placed
//! by hand. Before the pass, [`persist`] writes each user-placed block's
//! sibling index into its metadata; afterwards [`restore`] moves the blocks
//! back to those indices.
//!
//! A block counts as user-placed when it was created directly on a page
//! under a name outside [`AUTO_LAYOUT_NAMES`](crate::canvas::names::AUTO_LAYOUT_NAMES).
//! [`LayerTracker`] flags such blocks from the canvas event stream.

use tracing::debug;

use crate::canvas::names::{self, meta};
use crate::canvas::{BlockEvent, BlockEventType, BlockId, BlockType, CanvasEngine, SubscriptionId};
use crate::error::CarteError;

const FLAG: &str = "true";

/// Flag blocks created directly on a page whose name the layout pass does
/// not own. Returns how many blocks were flagged.
pub fn mark_user_placed(engine: &mut dyn CanvasEngine, events: &[BlockEvent]) -> usize {
    let mut marked = 0;
    for event in events {
        if event.kind != BlockEventType::Created || !engine.is_valid(event.block) {
            continue;
        }
        if is_user_block(engine, event.block) && mark(engine, event.block).is_ok() {
            marked += 1;
        }
    }
    marked
}

fn is_user_block(engine: &dyn CanvasEngine, block: BlockId) -> bool {
    let on_page = matches!(
        engine.parent(block).ok().flatten().map(|p| engine.block_type(p)),
        Some(Ok(BlockType::Page))
    );
    let name = engine.name(block).unwrap_or_default();
    let flagged = engine.has_metadata(block, meta::USER_PLACED).unwrap_or(false);
    on_page && !flagged && !names::is_auto_layout_name(&name) && !names::is_overlay_name(&name)
}

fn mark(engine: &mut dyn CanvasEngine, block: BlockId) -> Result<(), CarteError> {
    engine.set_metadata(block, meta::USER_PLACED, FLAG)?;
    Ok(())
}

pub fn is_user_placed(engine: &dyn CanvasEngine, block: BlockId) -> bool {
    matches!(engine.metadata(block, meta::USER_PLACED), Ok(Some(v)) if v == FLAG)
}

/// Watches block creation and flags user-placed blocks.
#[derive(Debug)]
pub struct LayerTracker {
    subscription: SubscriptionId,
}

impl LayerTracker {
    pub fn new(engine: &mut dyn CanvasEngine) -> Self {
        LayerTracker {
            subscription: engine.subscribe(&[]),
        }
    }

    /// Drain pending events. Call between layout passes, once names are set.
    pub fn poll(&self, engine: &mut dyn CanvasEngine) -> usize {
        let events = engine.poll_events(self.subscription);
        mark_user_placed(engine, &events)
    }

    pub fn detach(self, engine: &mut dyn CanvasEngine) {
        engine.unsubscribe(self.subscription);
    }
}

/// Children of `page` that take part in stacking order. Overlays come and
/// go during a pass and never count towards a recorded index.
fn layered_children(engine: &dyn CanvasEngine, page: BlockId) -> Result<(Vec<BlockId>, Vec<BlockId>), CarteError> {
    let (overlays, layered): (Vec<BlockId>, Vec<BlockId>) = engine
        .children(page)?
        .into_iter()
        .partition(|c| names::is_overlay_name(&engine.name(*c).unwrap_or_default()));
    Ok((layered, overlays))
}

/// Record the sibling index of every user-placed child of `page`.
pub fn persist(engine: &mut dyn CanvasEngine, page: BlockId) -> Result<usize, CarteError> {
    let (children, _) = layered_children(engine, page)?;
    let mut stored = 0;
    for (index, child) in children.into_iter().enumerate() {
        if is_user_placed(engine, child) {
            engine.set_metadata(child, meta::LAYER_INDEX, &index.to_string())?;
            stored += 1;
        }
    }
    debug!(page = %page, stored, "persisted layer order");
    Ok(stored)
}

/// Move user-placed children of `page` back to their recorded indices.
/// Other children keep their relative order and overlays stay on top.
/// Returns how many blocks moved.
pub fn restore(engine: &mut dyn CanvasEngine, page: BlockId) -> Result<usize, CarteError> {
    let (children, overlays) = layered_children(engine, page)?;
    let mut recorded: Vec<(usize, BlockId)> = Vec::new();
    for child in &children {
        if let Some(index) = engine
            .metadata(*child, meta::LAYER_INDEX)?
            .and_then(|v| v.parse::<usize>().ok())
        {
            recorded.push((index, *child));
        }
    }
    if recorded.is_empty() {
        return Ok(0);
    }
    recorded.sort_by_key(|(index, _)| *index);

    let mut order: Vec<BlockId> = children
        .iter()
        .copied()
        .filter(|c| !recorded.iter().any(|(_, b)| b == c))
        .collect();
    for (index, block) in &recorded {
        let at = (*index).min(order.len());
        order.insert(at, *block);
    }
    order.extend(overlays);

    let mut moved = 0;
    for (target, block) in order.into_iter().enumerate() {
        let current = engine.children(page)?.iter().position(|c| *c == block);
        if current != Some(target) {
            engine.insert_child(page, block, target)?;
            moved += 1;
        }
    }
    debug!(page = %page, moved, "restored layer order");
    Ok(moved)
}

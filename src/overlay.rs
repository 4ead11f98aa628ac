//! # Overlays
//!
//! Two transient overlays drawn on top of a page:
//!
//! - the **busy loader** (dimmed page and a "Loading…" label) shown while a
//!   layout pass runs, and
//! - the **pending-changes indicator** (translucent page and an "Apply
//!   Changes" prompt) shown while edits wait for the next pass.
//!
//! Both are keyed by well-known block names. Every call first destroys all
//! blocks with those names, anywhere in the scene, so at most one instance
//! of each overlay ever exists.

use tracing::debug;

use crate::canvas::names;
use crate::canvas::{
    BlockEventType, BlockId, BlockType, CanvasEngine, Fill, Shape, SubscriptionId,
};
use crate::config::LayoutConfig;
use crate::error::CarteError;
use crate::model::{Color, HorizontalAlign};

const PANEL_WIDTH: f64 = 3.0;
const PANEL_HEIGHT: f64 = 0.8;
const LABEL_FONT_SIZE: f64 = 18.0;

fn destroy_named(engine: &mut dyn CanvasEngine, names: &[&str]) -> Result<usize, CarteError> {
    let mut destroyed = 0;
    for name in names {
        for block in engine.find_by_name(name) {
            // A previous match may have taken this block with its parent.
            if engine.is_valid(block) {
                engine.destroy(block)?;
                destroyed += 1;
            }
        }
    }
    Ok(destroyed)
}

/// True while a busy loader exists anywhere in the scene.
pub fn is_busy(engine: &dyn CanvasEngine) -> bool {
    !engine.find_by_name(names::LOADER_GRAPHIC).is_empty()
}

/// Show or hide the busy loader on `page`.
pub fn set_busy(
    engine: &mut dyn CanvasEngine,
    page: BlockId,
    show: bool,
    config: &LayoutConfig,
) -> Result<(), CarteError> {
    destroy_named(
        engine,
        &[names::LOADER_GRAPHIC, names::LOADER_SHAPE, names::LOADER_TEXT],
    )?;
    if !show {
        return Ok(());
    }

    let (width, height) = (engine.width(page)?, engine.height(page)?);
    let dim = cover(engine, page, names::LOADER_GRAPHIC, Color::rgba(0.0, 0.0, 0.0, 0.45))?;

    let panel = engine.create(BlockType::Graphic);
    engine.append_child(page, panel)?;
    engine.set_name(panel, names::LOADER_SHAPE)?;
    engine.set_position_x(panel, (width - PANEL_WIDTH) / 2.0)?;
    engine.set_position_y(panel, (height - PANEL_HEIGHT) / 2.0)?;
    engine.set_width(panel, PANEL_WIDTH)?;
    engine.set_height(panel, PANEL_HEIGHT)?;
    engine.set_shape(panel, Shape::Rect { corner_radius: 0.1 })?;
    engine.set_fill(panel, Fill::Color(Color::WHITE))?;

    label(engine, page, names::LOADER_TEXT, &config.loading_text)?;
    debug!(page = %page, overlay = %dim, "busy loader shown");
    Ok(())
}

/// Full-page rectangle in `color`.
fn cover(
    engine: &mut dyn CanvasEngine,
    page: BlockId,
    name: &str,
    color: Color,
) -> Result<BlockId, CarteError> {
    let (width, height) = (engine.width(page)?, engine.height(page)?);
    let block = engine.create(BlockType::Graphic);
    engine.append_child(page, block)?;
    engine.set_name(block, name)?;
    engine.set_width(block, width)?;
    engine.set_height(block, height)?;
    engine.set_shape(block, Shape::Rect { corner_radius: 0.0 })?;
    engine.set_fill(block, Fill::Color(color))?;
    engine.set_transform_locked(block, true)?;
    Ok(block)
}

/// Centered one-line label.
fn label(
    engine: &mut dyn CanvasEngine,
    page: BlockId,
    name: &str,
    text: &str,
) -> Result<BlockId, CarteError> {
    let (width, height) = (engine.width(page)?, engine.height(page)?);
    let block = engine.create(BlockType::Text);
    engine.append_child(page, block)?;
    engine.set_name(block, name)?;
    engine.replace_text(block, text)?;
    engine.set_text_font_size(block, LABEL_FONT_SIZE, None)?;
    engine.set_text_alignment(block, HorizontalAlign::Center)?;
    engine.set_width(block, PANEL_WIDTH)?;
    let text_height = engine.height(block)?;
    engine.set_position_x(block, (width - PANEL_WIDTH) / 2.0)?;
    engine.set_position_y(block, (height - text_height) / 2.0)?;
    Ok(block)
}

/// The "Apply Changes" overlay plus the host-side arrow next to it.
///
/// The indicator subscribes to its rectangle; when something else destroys
/// the rectangle, [`poll`](Self::poll) tears the rest down.
#[derive(Debug, Default)]
pub struct PendingChangesIndicator {
    rect: Option<BlockId>,
    subscription: Option<SubscriptionId>,
    arrow_visible: bool,
}

impl PendingChangesIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the host should draw its arrow pointing at the prompt.
    pub fn arrow_visible(&self) -> bool {
        self.arrow_visible
    }

    pub fn is_shown(&self) -> bool {
        self.rect.is_some()
    }

    /// Show or hide the indicator on `page`. Never shown over a busy loader.
    pub fn set(
        &mut self,
        engine: &mut dyn CanvasEngine,
        page: BlockId,
        show: bool,
        config: &LayoutConfig,
    ) -> Result<(), CarteError> {
        self.teardown(engine)?;
        if !show || is_busy(engine) {
            return Ok(());
        }

        let rect = cover(
            engine,
            page,
            names::LOADER_CHANGES_GRAPHIC,
            Color::rgba(1.0, 1.0, 1.0, 0.6),
        )?;
        label(engine, page, names::APPLY_LOADER_TEXT, &config.apply_changes_text)?;
        self.subscription = Some(engine.subscribe(&[rect]));
        self.rect = Some(rect);
        self.arrow_visible = true;
        Ok(())
    }

    pub fn hide(&mut self, engine: &mut dyn CanvasEngine) -> Result<(), CarteError> {
        self.teardown(engine)
    }

    /// Handle canvas events. Returns true when the indicator removed itself
    /// because its rectangle was destroyed elsewhere.
    pub fn poll(&mut self, engine: &mut dyn CanvasEngine) -> Result<bool, CarteError> {
        let Some(subscription) = self.subscription else {
            return Ok(false);
        };
        let destroyed = engine
            .poll_events(subscription)
            .iter()
            .any(|e| e.kind == BlockEventType::Destroyed);
        if destroyed {
            debug!("pending-changes overlay destroyed externally");
            self.teardown(engine)?;
        }
        Ok(destroyed)
    }

    fn teardown(&mut self, engine: &mut dyn CanvasEngine) -> Result<(), CarteError> {
        if let Some(subscription) = self.subscription.take() {
            engine.unsubscribe(subscription);
        }
        self.rect = None;
        self.arrow_visible = false;
        destroy_named(
            engine,
            &[names::LOADER_CHANGES_GRAPHIC, names::APPLY_LOADER_TEXT],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Scene;

    #[test]
    fn test_busy_loader_is_idempotent() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let config = LayoutConfig::default();

        set_busy(&mut scene, page, true, &config).unwrap();
        set_busy(&mut scene, page, true, &config).unwrap();
        assert_eq!(scene.find_by_name(names::LOADER_GRAPHIC).len(), 1);
        assert_eq!(scene.find_by_name(names::LOADER_SHAPE).len(), 1);
        let text = scene.find_by_name(names::LOADER_TEXT);
        assert_eq!(text.len(), 1);
        assert_eq!(scene.text(text[0]).unwrap(), "Loading…");
        assert!(is_busy(&scene));

        set_busy(&mut scene, page, false, &config).unwrap();
        assert!(!is_busy(&scene));
        assert!(scene.children(page).unwrap().is_empty());
    }

    #[test]
    fn test_pending_indicator_skipped_while_busy() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let config = LayoutConfig::default();
        let mut indicator = PendingChangesIndicator::new();

        set_busy(&mut scene, page, true, &config).unwrap();
        indicator.set(&mut scene, page, true, &config).unwrap();
        assert!(!indicator.is_shown());
        assert!(scene.find_by_name(names::LOADER_CHANGES_GRAPHIC).is_empty());

        set_busy(&mut scene, page, false, &config).unwrap();
        indicator.set(&mut scene, page, true, &config).unwrap();
        indicator.set(&mut scene, page, true, &config).unwrap();
        assert!(indicator.arrow_visible());
        assert_eq!(scene.find_by_name(names::LOADER_CHANGES_GRAPHIC).len(), 1);
        assert_eq!(scene.find_by_name(names::APPLY_LOADER_TEXT).len(), 1);
    }

    #[test]
    fn test_pending_indicator_removes_itself() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let config = LayoutConfig::default();
        let mut indicator = PendingChangesIndicator::new();
        indicator.set(&mut scene, page, true, &config).unwrap();
        assert!(!indicator.poll(&mut scene).unwrap());

        let rect = scene.find_by_name(names::LOADER_CHANGES_GRAPHIC)[0];
        scene.destroy(rect).unwrap();
        assert!(indicator.poll(&mut scene).unwrap());
        assert!(!indicator.arrow_visible());
        assert!(scene.find_by_name(names::APPLY_LOADER_TEXT).is_empty());
    }
}

//! Border decorations.
//!
//! Borders are sized from the realized bounding boxes of the blocks they
//! frame, after rendering, so they follow text that grew past its nominal
//! height. The border image is stretched with [`ContentFillMode::Crop`].

use crate::canvas::names;
use crate::canvas::{BlockId, BlockType, CanvasEngine, ContentFillMode, Fill, Rect, Shape};
use crate::error::CarteError;
use crate::model::{BorderImage, Edges};

/// Grow `rect` outward by `margins`. Negative margins shrink it.
pub fn expand(rect: &Rect, margins: &Edges) -> Rect {
    Rect {
        x: rect.x - margins.left,
        y: rect.y - margins.top,
        width: (rect.width + margins.horizontal()).max(0.0),
        height: (rect.height + margins.vertical()).max(0.0),
    }
}

/// Union of the page-space bounding boxes of `blocks`.
pub fn realized_bounds(engine: &dyn CanvasEngine, blocks: &[BlockId]) -> Result<Option<Rect>, CarteError> {
    let mut bounds: Option<Rect> = None;
    for block in blocks {
        let rect = engine.global_bounding_box(*block)?;
        bounds = Some(match bounds {
            Some(b) => b.union(&rect),
            None => rect,
        });
    }
    Ok(bounds)
}

/// Frame a whole section. The border is placed behind the first member.
pub fn section_border(
    engine: &mut dyn CanvasEngine,
    page_block: BlockId,
    border: &BorderImage,
    members: &[BlockId],
) -> Result<Option<BlockId>, CarteError> {
    let Some(bounds) = realized_bounds(engine, members)? else {
        return Ok(None);
    };
    let block = border_block(engine, page_block, names::SECTION_BORDER, border, &bounds)?;
    send_behind(engine, page_block, block, members)?;
    Ok(Some(block))
}

/// Frame a single dish, placed directly behind it.
pub fn dish_border(
    engine: &mut dyn CanvasEngine,
    page_block: BlockId,
    border: &BorderImage,
    dish_block: BlockId,
) -> Result<BlockId, CarteError> {
    let bounds = engine.global_bounding_box(dish_block)?;
    let block = border_block(engine, page_block, names::DISH_BORDER, border, &bounds)?;
    send_behind(engine, page_block, block, &[dish_block])?;
    Ok(block)
}

fn border_block(
    engine: &mut dyn CanvasEngine,
    page_block: BlockId,
    name: &str,
    border: &BorderImage,
    bounds: &Rect,
) -> Result<BlockId, CarteError> {
    let rect = expand(bounds, &border.margins);
    let block = engine.create(BlockType::Graphic);
    engine.append_child(page_block, block)?;
    engine.set_name(block, name)?;
    engine.set_position_x(block, rect.x)?;
    engine.set_position_y(block, rect.y)?;
    engine.set_width(block, rect.width)?;
    engine.set_height(block, rect.height)?;
    engine.set_shape(block, Shape::Rect { corner_radius: 0.0 })?;
    engine.set_fill(
        block,
        Fill::Image {
            uri: border.uri.clone(),
            mode: ContentFillMode::Crop,
        },
    )?;
    Ok(block)
}

/// Move `block` to just before the first of `members` among the page's
/// children.
fn send_behind(
    engine: &mut dyn CanvasEngine,
    page_block: BlockId,
    block: BlockId,
    members: &[BlockId],
) -> Result<(), CarteError> {
    let children = engine.children(page_block)?;
    if let Some(index) = children.iter().position(|c| members.contains(c)) {
        engine.insert_child(page_block, block, index)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Scene;
    use pretty_assertions::assert_eq;

    fn boxed(scene: &mut Scene, page: BlockId, x: f64, y: f64, w: f64, h: f64) -> BlockId {
        let b = scene.create(BlockType::Graphic);
        scene.append_child(page, b).unwrap();
        scene.set_position_x(b, x).unwrap();
        scene.set_position_y(b, y).unwrap();
        scene.set_width(b, w).unwrap();
        scene.set_height(b, h).unwrap();
        b
    }

    #[test]
    fn test_section_border_wraps_members_and_sits_behind() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let a = boxed(&mut scene, page, 1.0, 1.0, 3.0, 1.0);
        let b = boxed(&mut scene, page, 1.0, 2.5, 3.0, 0.5);
        let border = BorderImage {
            uri: "frame.png".into(),
            margins: Edges::uniform(0.25),
        };

        let frame = section_border(&mut scene, page, &border, &[a, b]).unwrap().unwrap();
        assert_eq!(
            scene.global_bounding_box(frame).unwrap(),
            Rect { x: 0.75, y: 0.75, width: 3.5, height: 2.5 }
        );
        assert_eq!(scene.children(page).unwrap(), vec![frame, a, b]);
        assert_eq!(scene.name(frame).unwrap(), "sectionBorder");
        assert!(matches!(
            scene.fill(frame).unwrap(),
            Some(Fill::Image { mode: ContentFillMode::Crop, .. })
        ));
    }

    #[test]
    fn test_dish_border_and_empty_section() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let a = boxed(&mut scene, page, 1.0, 1.0, 3.0, 1.0);
        let b = boxed(&mut scene, page, 1.0, 2.5, 3.0, 0.5);
        let border = BorderImage {
            uri: "dish.png".into(),
            margins: Edges { top: -0.1, right: 0.0, bottom: -0.1, left: 0.0 },
        };
        let frame = dish_border(&mut scene, page, &border, b).unwrap();
        assert_eq!(scene.children(page).unwrap(), vec![a, frame, b]);
        let rect = scene.global_bounding_box(frame).unwrap();
        assert!((rect.height - 0.3).abs() < 1e-9);

        assert_eq!(section_border(&mut scene, page, &border, &[]).unwrap(), None);
    }
}

//! Serializable snapshot of the laid-out canvas, for the CLI, the WASM
//! build and debugging tools.

use serde::Serialize;

use super::geometry::PageGeometry;
use crate::canvas::names::meta;
use crate::canvas::{find_page_block, BlockId, BlockType, CanvasEngine, Rect};
use crate::error::CarteError;
use crate::model::Page;

/// Complete layout metadata for all pages.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub pages: Vec<PageInfo>,
}

/// Layout metadata for a single page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_id: String,
    pub width: f64,
    pub height: f64,
    pub content_x: f64,
    pub content_y: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub elements: Vec<ElementInfo>,
}

/// One block, in page coordinates, with its children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub id: BlockId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Block type (Group, Text, Graphic).
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementInfo>,
}

impl ElementInfo {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// This element and all its descendants, depth first.
    pub fn walk(&self) -> Vec<&ElementInfo> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

impl LayoutInfo {
    /// Read every page of `pages` back from the canvas. Pages without a
    /// page block are left out.
    pub fn capture(engine: &dyn CanvasEngine, pages: &[Page]) -> Result<Self, CarteError> {
        let mut out = Vec::with_capacity(pages.len());
        for page in pages {
            let Some(block) = find_page_block(engine, &page.page_id) else {
                continue;
            };
            let size = (engine.width(block)?, engine.height(block)?);
            let geometry = PageGeometry::resolve(page, Some(size));
            out.push(PageInfo {
                page_id: page.page_id.clone(),
                width: geometry.width,
                height: geometry.height,
                content_x: geometry.content_x,
                content_y: geometry.content_y,
                content_width: geometry.content_width,
                content_height: geometry.content_height,
                elements: element_tree(engine, block)?,
            });
        }
        Ok(LayoutInfo { pages: out })
    }

    pub fn page(&self, page_id: &str) -> Option<&PageInfo> {
        self.pages.iter().find(|p| p.page_id == page_id)
    }
}

fn element_tree(engine: &dyn CanvasEngine, parent: BlockId) -> Result<Vec<ElementInfo>, CarteError> {
    let mut out = Vec::new();
    for id in engine.children(parent)? {
        let rect = engine.global_bounding_box(id)?;
        let block_type = engine.block_type(id)?;
        let text_content = if block_type == BlockType::Text {
            Some(engine.text(id)?).filter(|t| !t.is_empty())
        } else {
            None
        };
        out.push(ElementInfo {
            id,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            kind: format!("{:?}", block_type),
            name: engine.name(id)?,
            section_id: engine.metadata(id, meta::SECTION_ID)?,
            dish_id: engine.metadata(id, meta::DISH_ID)?,
            text_content,
            children: element_tree(engine, id)?,
        });
    }
    Ok(out)
}

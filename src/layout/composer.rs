//! # Section Composer
//!
//! Turns the dishes of one section column into canvas blocks: one block per
//! dish, appended to the page and filled by the element renderers. Entries
//! are stacked without gaps; the orchestrator repositions them once the gap
//! is known.
//!
//! A dish that fails to render is logged and contributes an empty entry, so
//! one bad record never blocks the rest of the page.

use std::borrow::Cow;

use tracing::{debug, warn};

use super::context::LayoutContext;
use super::renderers::{self, RenderGeometry};
use crate::canvas::names::{self, meta};
use crate::canvas::{BlockId, BlockType, CanvasEngine};
use crate::error::CarteError;
use crate::model::{BorderImage, Dish, DishType, Edges, Section};
use crate::templates::TemplateRegistry;

/// A dish together with the section it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDish<'a> {
    pub section: &'a Section,
    pub dish: &'a Dish,
}

/// One composed entry. Transient: rebuilt on every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DishBlock {
    /// `None` when the dish rendered nothing or failed.
    pub block: Option<BlockId>,
    pub dish_id: String,
    pub section_id: String,
    pub kind: DishType,
    /// Space taken in the column, margins and border insets included.
    pub height: f64,
    /// Distance from the top of the entry to the top of its block.
    pub content_offset: f64,
    pub margins: Edges,
    /// First entry of a bordered section.
    pub opens_section_border: bool,
    /// Last entry of a bordered section.
    pub closes_section_border: bool,
    pub dish_border: Option<BorderImage>,
    /// Spacer injected for a section top margin.
    pub synthetic: bool,
}

impl DishBlock {
    fn empty(section: &Section, dish: &Dish) -> Self {
        DishBlock {
            block: None,
            dish_id: dish.dish_id.clone(),
            section_id: section.section_id.clone(),
            kind: dish.kind,
            height: 0.0,
            content_offset: 0.0,
            margins: dish.margins,
            opens_section_border: false,
            closes_section_border: false,
            dish_border: None,
            synthetic: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub dish_blocks: Vec<DishBlock>,
    /// Entries per page column when the list is split evenly.
    pub half_index: usize,
}

impl Composition {
    /// Stacked height of every entry, gaps excluded.
    pub fn height(&self) -> f64 {
        self.dish_blocks.iter().map(|d| d.height).sum()
    }

    /// Entries that produced a block.
    pub fn block_count(&self) -> usize {
        self.dish_blocks.iter().filter(|d| d.block.is_some()).count()
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.dish_blocks.iter().filter_map(|d| d.block)
    }
}

/// Compose `dishes` into blocks under `page_block`, starting at `x_start`.
pub fn compose(
    ctx: &LayoutContext<'_>,
    engine: &mut dyn CanvasEngine,
    templates: &dyn TemplateRegistry,
    x_start: f64,
    dishes: &[ColumnDish<'_>],
    column_width: f64,
    page_block: BlockId,
) -> Composition {
    if !engine.is_valid(page_block) {
        warn!(page_id = %ctx.page.page_id, block = %page_block, "page block is gone, nothing composed");
        return Composition::default();
    }

    let mut groups: Vec<(&Section, Vec<Cow<'_, Dish>>)> = Vec::new();
    for entry in dishes {
        let id = &entry.section.section_id;
        match groups.iter_mut().find(|(s, _)| &s.section_id == id) {
            Some((_, list)) => list.push(Cow::Borrowed(entry.dish)),
            None => groups.push((entry.section, vec![Cow::Borrowed(entry.dish)])),
        }
    }

    let mut dish_blocks = Vec::with_capacity(dishes.len());
    let mut y = 0.0;
    for (section, mut list) in groups {
        if let Some(top) = section.top_margin.filter(|t| *t > 0.0) {
            let id = format!("{}-top-margin", section.section_id);
            list.insert(0, Cow::Owned(Dish::spacer(&id, top)));
        }
        let has_top_spacer = section.top_margin.is_some_and(|t| t > 0.0);
        let border_inset = section
            .border
            .as_ref()
            .map(|b| b.margins.positive());
        let last = list.len().saturating_sub(1);

        for (i, dish) in list.iter().enumerate() {
            let placement = Placement {
                x: x_start,
                y,
                width: column_width,
                top_inset: if i == 0 { border_inset.map_or(0.0, |e| e.top) } else { 0.0 },
                bottom_inset: if i == last { border_inset.map_or(0.0, |e| e.bottom) } else { 0.0 },
            };
            let mut entry = match compose_dish(ctx, engine, templates, section, dish, &placement, page_block) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        dish_id = %dish.dish_id,
                        section_id = %section.section_id,
                        error = %err,
                        "dish skipped"
                    );
                    DishBlock::empty(section, dish)
                }
            };
            entry.synthetic = has_top_spacer && i == 0;
            entry.opens_section_border = border_inset.is_some() && i == 0;
            entry.closes_section_border = border_inset.is_some() && i == last;
            y += entry.height;
            dish_blocks.push(entry);
        }
    }

    let columns = ctx.page.columns.max(1) as usize;
    let half_index = dish_blocks.len().div_ceil(columns);
    debug!(
        page_id = %ctx.page.page_id,
        entries = dish_blocks.len(),
        height = y,
        "composed column"
    );
    Composition {
        dish_blocks,
        half_index,
    }
}

/// Where an entry starts in its column.
struct Placement {
    x: f64,
    y: f64,
    width: f64,
    /// Section border inset above this entry (first entry only).
    top_inset: f64,
    /// Section border inset below this entry (last entry only).
    bottom_inset: f64,
}

fn compose_dish(
    ctx: &LayoutContext<'_>,
    engine: &mut dyn CanvasEngine,
    templates: &dyn TemplateRegistry,
    section: &Section,
    dish: &Dish,
    placement: &Placement,
    page_block: BlockId,
) -> Result<DishBlock, CarteError> {
    let block = create_block(engine, templates, section, dish)?;
    match fill_dish(ctx, engine, section, dish, placement, page_block, block) {
        Ok(entry) => Ok(entry),
        Err(err) => {
            if engine.is_valid(block) {
                if let Err(cleanup) = engine.destroy(block) {
                    debug!(block = %block, error = %cleanup, "could not remove failed dish block");
                }
            }
            Err(err)
        }
    }
}

fn fill_dish(
    ctx: &LayoutContext<'_>,
    engine: &mut dyn CanvasEngine,
    section: &Section,
    dish: &Dish,
    placement: &Placement,
    page_block: BlockId,
    block: BlockId,
) -> Result<DishBlock, CarteError> {
    engine.append_child(page_block, block)?;
    engine.set_metadata(block, meta::DISH_ID, &dish.dish_id)?;
    engine.set_metadata(block, meta::SECTION_ID, &section.section_id)?;

    let margins = dish.margins;
    let dish_inset = dish
        .border
        .as_ref()
        .map(|b| b.margins.positive())
        .unwrap_or_default();
    let geometry = RenderGeometry {
        x: placement.x + margins.left + dish_inset.left,
        width: (placement.width - margins.horizontal() - dish_inset.horizontal()).max(0.0),
        align: section.alignment,
        base_font_size: ctx.page.dish_spacing_font_size,
    };
    let content_offset = placement.top_inset + margins.top + dish_inset.top;
    let style = ctx.style_for(&section.section_id);
    let content = renderers::render(
        engine,
        block,
        dish,
        style,
        &geometry,
        placement.y + content_offset,
    )?;

    let mut entry = DishBlock::empty(section, dish);
    entry.dish_border = dish.border.clone();
    if engine.is_valid(block) {
        entry.block = Some(block);
        entry.content_offset = content_offset;
        entry.height =
            content_offset + content + dish_inset.bottom + margins.bottom + placement.bottom_inset;
    } else {
        // Rendered nothing; the section border still needs its room.
        entry.height = placement.top_inset + placement.bottom_inset;
    }
    Ok(entry)
}

fn create_block(
    engine: &mut dyn CanvasEngine,
    templates: &dyn TemplateRegistry,
    section: &Section,
    dish: &Dish,
) -> Result<BlockId, CarteError> {
    let (block, name) = match dish.kind {
        DishType::Dish => (
            instantiate(engine, templates, section, &section.dish_template)?,
            names::SECTION_DISH,
        ),
        DishType::SectionTitle => (
            instantiate(engine, templates, section, &section.title_template)?,
            names::SECTION_DISH,
        ),
        DishType::Spacer | DishType::SectionSpacer => {
            (engine.create(BlockType::Graphic), names::SECTION_SPACER)
        }
        DishType::InlineText => (engine.create(BlockType::Text), names::INLINE_TEXT),
        DishType::InlineImage => (engine.create(BlockType::Graphic), names::INLINE_IMAGE),
        DishType::InlineSectionDivider => {
            (engine.create(BlockType::Graphic), names::SECTION_DIVIDER)
        }
    };
    engine.set_name(block, name)?;
    Ok(block)
}

fn instantiate(
    engine: &mut dyn CanvasEngine,
    templates: &dyn TemplateRegistry,
    section: &Section,
    template_id: &str,
) -> Result<BlockId, CarteError> {
    if template_id.is_empty() {
        return Err(CarteError::Template(format!(
            "section '{}' has no template for this dish type",
            section.section_id
        )));
    }
    templates.instantiate(engine, template_id)
}

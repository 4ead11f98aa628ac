//! # Page Layout Orchestrator
//!
//! Lays out every changed page of a menu on the canvas.
//!
//! ## Destroy, then recreate
//!
//! The engine never diffs the canvas. Every pass removes the blocks it owns
//! (identified by name, see [`AUTO_LAYOUT_NAMES`](crate::canvas::names::AUTO_LAYOUT_NAMES))
//! and builds them again from the menu data. Blocks the user placed by hand
//! are never touched, and their stacking order is saved before the pass and
//! restored after it.
//!
//! ## One page
//!
//! 1. Resolve geometry: grid column width and usable page height.
//! 2. Destroy the previous pass's blocks.
//! 3. Gather dishes per section column, sections ordered by grid row, wider
//!    sections first within a row.
//! 4. Trial pass: compose every column at x = 0 only to measure it.
//! 5. Destroy the trial blocks and solve the gap from the tallest stack.
//! 6. Compose each section for real and stack its blocks at the running Y
//!    cursor of the grid columns it covers, one gap between blocks. A new
//!    grid row aligns every cursor to the lowest one first.
//! 7. Draw borders from the realized bounding boxes.
//! 8. Group each section's blocks into one locked, auto-height group.
//!
//! Errors are contained: a bad dish is skipped by the composer, a failed
//! border leaves its section unframed, and a failed page does not stop the
//! others.

pub mod borders;
pub mod composer;
pub mod context;
pub mod gap;
pub mod geometry;
pub mod info;
pub mod renderers;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::canvas::names::{self, meta};
use crate::canvas::{find_page_block, BlockId, CanvasEngine, SizeMode};
use crate::config::LayoutConfig;
use crate::error::CarteError;
use crate::layers;
use crate::model::{BorderImage, Page, Section};
use crate::overlay;
use crate::persistence::ScenePersistence;
use crate::store::MenuStore;
use crate::templates::TemplateRegistry;

pub use composer::{compose, ColumnDish, Composition, DishBlock};
pub use context::LayoutContext;
pub use gap::{calculate_heights, solve_gap, GapSolver, MaxCombinationInfo, SectionMeasure};
pub use geometry::{ColumnFrame, PageGeometry, SectionFrame};
pub use info::{ElementInfo, LayoutInfo, PageInfo};

/// Tolerance for comparing realized positions against the page bottom.
const EPSILON: f64 = 1e-6;

// ── Reports ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionReport {
    pub section_id: String,
    pub group: BlockId,
    pub top: f64,
    pub bottom: f64,
}

/// Outcome of laying out one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub page_id: String,
    /// Gap used between dish blocks, in inches.
    pub gap: f64,
    pub overflow: bool,
    /// Height of the tallest section stack, gaps excluded.
    pub content_height: f64,
    pub dish_count: usize,
    pub row_transitions: usize,
    pub sections: Vec<SectionReport>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFailure {
    pub page_id: String,
    pub error: String,
}

/// Outcome of one layout batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub pages: Vec<PageReport>,
    /// Pages skipped because the store or the canvas does not have them.
    pub skipped: Vec<String>,
    pub failed: Vec<PageFailure>,
    pub saved: bool,
}

impl LayoutReport {
    pub fn page(&self, page_id: &str) -> Option<&PageReport> {
        self.pages.iter().find(|p| p.page_id == page_id)
    }

    pub fn has_overflow(&self) -> bool {
        self.pages.iter().any(|p| p.overflow)
    }
}

// ── Planning ────────────────────────────────────────────────────

struct ColumnPlan<'a> {
    frame: ColumnFrame,
    dishes: Vec<ColumnDish<'a>>,
}

struct SectionPlan<'a> {
    section: &'a Section,
    frame: SectionFrame,
    columns: Vec<ColumnPlan<'a>>,
}

/// Sections in placement order: grid row ascending, then wider first.
fn gather<'a>(page: &'a Page, geometry: &PageGeometry) -> Vec<SectionPlan<'a>> {
    let mut plans: Vec<SectionPlan<'a>> = page
        .sections
        .iter()
        .map(|section| {
            let frame = geometry.section_frame(section);
            let columns = frame
                .columns
                .iter()
                .map(|column| ColumnPlan {
                    frame: *column,
                    dishes: section
                        .column_dishes(column.index)
                        .into_iter()
                        .map(|dish| ColumnDish { section, dish })
                        .collect(),
                })
                .collect();
            SectionPlan {
                section,
                frame,
                columns,
            }
        })
        .collect();
    plans.sort_by(|a, b| {
        let (pa, pb) = (&a.section.placement, &b.section.placement);
        pa.y.cmp(&pb.y).then(pb.w.max(1).cmp(&pa.w.max(1)))
    });
    plans
}

/// Destroy the blocks a previous pass created on `page_block`. Returns how
/// many top-level blocks were removed.
pub fn clear_auto_blocks(
    engine: &mut dyn CanvasEngine,
    page_block: BlockId,
) -> Result<usize, CarteError> {
    let mut removed = 0;
    for child in engine.children(page_block)? {
        if names::is_auto_layout_name(&engine.name(child)?) {
            engine.destroy(child)?;
            removed += 1;
        }
    }
    Ok(removed)
}

// ── Engine ──────────────────────────────────────────────────────

enum PageOutcome {
    Done(PageReport),
    Failed(CarteError),
    NotInStore,
    NotOnCanvas,
}

/// Blocks of one section after composition.
struct PlacedSection {
    members: Vec<BlockId>,
    framed: Vec<(BlockId, BorderImage)>,
    bottom: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        LayoutEngine { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out every page the store reports as changed, then save the scene.
    pub fn process_changed_pages(
        &self,
        engine: &mut dyn CanvasEngine,
        templates: &dyn TemplateRegistry,
        store: &mut MenuStore,
        persistence: &mut dyn ScenePersistence,
    ) -> LayoutReport {
        let page_ids = store.changed_page_ids();
        let mut report = LayoutReport::default();
        if page_ids.is_empty() {
            return report;
        }
        debug!(pages = page_ids.len(), "layout pass started");

        for page_id in page_ids {
            let page_block = find_page_block(engine, &page_id);
            let outcome = match (
                LayoutContext::from_store(store, &page_id, &self.config),
                page_block,
            ) {
                (Some(ctx), Some(block)) => match self.run_page(&ctx, engine, templates, block) {
                    Ok(page_report) => PageOutcome::Done(page_report),
                    Err(err) => PageOutcome::Failed(err),
                },
                (None, block) => {
                    if let Some(block) = block {
                        self.clear_busy(engine, block);
                    }
                    PageOutcome::NotInStore
                }
                (Some(_), None) => PageOutcome::NotOnCanvas,
            };

            match outcome {
                PageOutcome::Done(page_report) => {
                    store.replace_section_groups(
                        &page_id,
                        page_report
                            .sections
                            .iter()
                            .map(|s| (s.section_id.as_str(), s.group)),
                    );
                    store.clear_changed(&page_id);
                    info!(
                        page_id = %page_id,
                        gap = page_report.gap,
                        overflow = page_report.overflow,
                        sections = page_report.sections.len(),
                        "page laid out"
                    );
                    report.pages.push(page_report);
                }
                PageOutcome::Failed(err) => {
                    error!(page_id = %page_id, error = %err, "page layout failed");
                    report.failed.push(PageFailure {
                        page_id,
                        error: err.to_string(),
                    });
                }
                PageOutcome::NotInStore => {
                    warn!(page_id = %page_id, "page missing from store, skipped");
                    store.clear_changed(&page_id);
                    report.skipped.push(page_id);
                }
                PageOutcome::NotOnCanvas => {
                    warn!(page_id = %page_id, "page has no canvas block, skipped");
                    report.skipped.push(page_id);
                }
            }
        }

        report.saved = self.save(engine, persistence);
        report
    }

    /// One page with its bookkeeping: layer order and busy loader around
    /// the layout itself. The loader is always removed.
    fn run_page(
        &self,
        ctx: &LayoutContext<'_>,
        engine: &mut dyn CanvasEngine,
        templates: &dyn TemplateRegistry,
        page_block: BlockId,
    ) -> Result<PageReport, CarteError> {
        layers::persist(engine, page_block)?;
        overlay::set_busy(engine, page_block, true, ctx.config)?;

        let result = self.layout_page(ctx, engine, templates, page_block);

        let hidden = overlay::set_busy(engine, page_block, false, ctx.config);
        let restored = layers::restore(engine, page_block);
        hidden?;
        let mut page_report = result?;
        if let Err(err) = restored {
            warn!(page_id = %ctx.page.page_id, error = %err, "layer order not restored");
            page_report.warnings.push(format!("layer order not restored: {}", err));
        }
        Ok(page_report)
    }

    /// Compose, position, decorate and group every section of one page.
    pub fn layout_page(
        &self,
        ctx: &LayoutContext<'_>,
        engine: &mut dyn CanvasEngine,
        templates: &dyn TemplateRegistry,
        page_block: BlockId,
    ) -> Result<PageReport, CarteError> {
        let page = ctx.page;
        let size = (engine.width(page_block)?, engine.height(page_block)?);
        let geometry = PageGeometry::resolve(page, Some(size));
        let removed = clear_auto_blocks(engine, page_block)?;
        debug!(page_id = %page.page_id, removed, "cleared previous layout");

        let plans = gather(page, &geometry);

        // Trial pass: measure only. Every section column competes for its
        // grid row.
        let mut measures = Vec::new();
        for plan in &plans {
            for column in &plan.columns {
                let trial = compose(ctx, engine, templates, 0.0, &column.dishes, column.frame.width, page_block);
                measures.push(SectionMeasure {
                    section_id: plan.section.section_id.clone(),
                    row: plan.section.placement.y,
                    height: trial.height(),
                    dish_count: trial.block_count(),
                });
            }
        }
        clear_auto_blocks(engine, page_block)?;

        let combination = calculate_heights(&measures, geometry.content_height, page.section_gap_multiplier);
        let solved = GapSolver::from_config(ctx.config).solve(
            geometry.content_height,
            &combination,
            combination.row_transitions,
            page.section_gap_multiplier,
        );
        let (gap, mut overflow) = gap::readable_gap(
            solved,
            &combination,
            geometry.content_height,
            ctx.config.readable_gap,
        );
        let mut warnings = Vec::new();
        if overflow {
            let message = format!(
                "content does not fit: {:.3}in of dishes on a {:.3}in page, gap {:.3}in",
                combination.height, geometry.content_height, solved
            );
            warn!(page_id = %page.page_id, "{}", message);
            warnings.push(message);
        }

        let row_extra = gap * (page.section_gap_multiplier - 1.0).max(0.0);
        let mut cursors = vec![geometry.content_y; geometry.grid_columns];
        let mut previous_row: Option<u32> = None;
        let mut sections = Vec::new();

        for plan in &plans {
            let row = plan.section.placement.y;
            if previous_row.is_some_and(|r| r != row) {
                let lowest = cursors.iter().copied().fold(geometry.content_y, f64::max);
                cursors.iter_mut().for_each(|c| *c = lowest + row_extra);
            }
            previous_row = Some(row);

            let span = plan.frame.grid_span.clone();
            let start = cursors[span.clone()]
                .iter()
                .copied()
                .fold(geometry.content_y, f64::max);

            let placed = self.place_section(ctx, engine, templates, plan, page_block, start, gap)?;
            cursors[span].iter_mut().for_each(|c| *c = placed.bottom);

            let mut members = placed.members;
            if members.is_empty() {
                continue;
            }
            let mut decorations = Vec::new();
            if let Err(err) = decorate(engine, page_block, plan.section, &members, &placed.framed, &mut decorations) {
                warn!(section_id = %plan.section.section_id, error = %err, "section border skipped");
                warnings.push(format!(
                    "border of section {} skipped: {}",
                    plan.section.section_id, err
                ));
            }
            members.extend(decorations);

            let group = engine.group(&members)?;
            engine.set_name(group, names::SECTION)?;
            engine.set_metadata(group, meta::SECTION_ID, &plan.section.section_id)?;
            engine.set_metadata(group, meta::PAGE_ID, &page.page_id)?;
            engine.set_height_mode(group, SizeMode::Auto)?;
            engine.set_transform_locked(group, true)?;

            let bounds = engine.global_bounding_box(group)?;
            sections.push(SectionReport {
                section_id: plan.section.section_id.clone(),
                group,
                top: bounds.y,
                bottom: bounds.bottom(),
            });
        }

        let realized_bottom = sections
            .iter()
            .map(|s| s.bottom)
            .fold(geometry.content_y, f64::max);
        if !overflow && realized_bottom > geometry.content_bottom() + EPSILON {
            overflow = true;
            let message = format!(
                "content ends at {:.3}in, below the {:.3}in margin",
                realized_bottom,
                geometry.content_bottom()
            );
            warn!(page_id = %page.page_id, "{}", message);
            warnings.push(message);
        }

        Ok(PageReport {
            page_id: page.page_id.clone(),
            gap,
            overflow,
            content_height: combination.height,
            dish_count: combination.dish_count,
            row_transitions: combination.row_transitions,
            sections,
            warnings,
        })
    }

    /// Compose every column of a section and stack its blocks from `start`.
    #[allow(clippy::too_many_arguments)]
    fn place_section(
        &self,
        ctx: &LayoutContext<'_>,
        engine: &mut dyn CanvasEngine,
        templates: &dyn TemplateRegistry,
        plan: &SectionPlan<'_>,
        page_block: BlockId,
        start: f64,
        gap: f64,
    ) -> Result<PlacedSection, CarteError> {
        let mut placed = PlacedSection {
            members: Vec::new(),
            framed: Vec::new(),
            bottom: start,
        };
        for column in &plan.columns {
            let composition = compose(
                ctx,
                engine,
                templates,
                column.frame.x,
                &column.dishes,
                column.frame.width,
                page_block,
            );
            let mut y = start;
            for entry in &composition.dish_blocks {
                let Some(block) = entry.block else {
                    y += entry.height;
                    continue;
                };
                engine.set_position_y(block, y + entry.content_offset)?;
                placed.members.push(block);
                if let Some(border) = &entry.dish_border {
                    placed.framed.push((block, border.clone()));
                }
                y += entry.height + gap;
            }
            placed.bottom = placed.bottom.max(y);
        }
        Ok(placed)
    }

    fn clear_busy(&self, engine: &mut dyn CanvasEngine, page_block: BlockId) {
        if let Err(err) = overlay::set_busy(engine, page_block, false, &self.config) {
            debug!(page = %page_block, error = %err, "could not clear busy loader");
        }
    }

    fn save(&self, engine: &dyn CanvasEngine, persistence: &mut dyn ScenePersistence) -> bool {
        let result = engine
            .save_to_string()
            .map_err(CarteError::from)
            .and_then(|scene| persistence.save(&scene));
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "scene save failed");
                false
            }
        }
    }
}

/// Dish borders first, then the section border behind everything. Created
/// blocks are pushed to `created` as they are made, so a failure part-way
/// still leaves them in the section group.
fn decorate(
    engine: &mut dyn CanvasEngine,
    page_block: BlockId,
    section: &Section,
    members: &[BlockId],
    framed: &[(BlockId, BorderImage)],
    created: &mut Vec<BlockId>,
) -> Result<(), CarteError> {
    for (block, border) in framed {
        created.push(borders::dish_border(engine, page_block, border, *block)?);
    }
    if let Some(border) = &section.border {
        let mut framed_blocks = created.clone();
        framed_blocks.extend_from_slice(members);
        if let Some(block) = borders::section_border(engine, page_block, border, &framed_blocks)? {
            created.push(block);
        }
    }
    Ok(())
}

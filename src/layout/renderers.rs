//! # Element Renderers
//!
//! Fill one freshly created dish block with content and report the height
//! it consumed.
//!
//! Template-based dishes (dishes and section titles) are a container whose
//! text children are named after an [`ElementRole`]. Children are rendered
//! in role order (title, description, add-ons, price) through the
//! [`ROLE_RENDERERS`] table, so a justified price can see the height of
//! everything above it. Spacers, inline text and images are single blocks.
//!
//! An empty field always destroys its block and contributes no height.

use std::collections::BTreeMap;
use std::ops::Range;

use tracing::{debug, warn};

use crate::canvas::names::ElementRole;
use crate::canvas::{BlockId, CanvasEngine, ContentFillMode, Fill, Shape, SizeMode};
use crate::config::POINTS_PER_INCH;
use crate::error::CarteError;
use crate::model::{Dish, DishType, HorizontalAlign, ImageAsset, LayoutStyle};

/// Separator between merged fields in one text run.
const MERGE_SEPARATOR: &str = "  ";

/// Share of the dish width given to a justified price whose template has no
/// explicit width.
const DEFAULT_PRICE_SHARE: f64 = 0.25;

/// Where a dish block goes and how wide it may be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderGeometry {
    /// Left edge relative to the page, in inches.
    pub x: f64,
    /// Available width after margins and border insets.
    pub width: f64,
    /// Section alignment, used by inline text and images.
    pub align: HorizontalAlign,
    /// Font size for inline text, in points.
    pub base_font_size: f64,
}

/// Running state while the children of one dish are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DishCursor {
    /// Height consumed so far, relative to the dish block.
    pub y: f64,
    pub title_height: f64,
    /// Combined height of the text fields placed above the price.
    pub text_height: f64,
    pub fields: usize,
}

impl DishCursor {
    fn place_field(&mut self, height: f64, is_title: bool) {
        self.y += height;
        self.text_height += height;
        self.fields += 1;
        if is_title {
            self.title_height = height;
        }
    }
}

/// What every role renderer sees besides its own block.
pub struct RoleInput<'a> {
    pub dish: &'a Dish,
    pub style: LayoutStyle,
    pub width: f64,
    /// Sibling blocks by role, used to copy template styling onto merged runs.
    pub siblings: &'a BTreeMap<ElementRole, BlockId>,
}

impl RoleInput<'_> {
    fn price_block(&self) -> Option<BlockId> {
        self.siblings
            .get(&ElementRole::Price)
            .or_else(|| self.siblings.get(&ElementRole::SectionPrice))
            .copied()
    }

    /// Width of a justified price: the template width, capped at the dish.
    fn price_width(&self, engine: &dyn CanvasEngine) -> Result<f64, CarteError> {
        let template = match self.price_block() {
            Some(block) => engine.width(block)?,
            None => 0.0,
        };
        let width = if template > 0.0 {
            template
        } else {
            self.width * DEFAULT_PRICE_SHARE
        };
        Ok(width.min(self.width))
    }

    /// Width for non-price fields. Narrowed when a justified price sits on
    /// the right.
    fn field_width(&self, engine: &dyn CanvasEngine) -> Result<f64, CarteError> {
        if self.style.justifies_price() && price_text(self.dish).is_some() {
            Ok((self.width - self.price_width(engine)?).max(0.0))
        } else {
            Ok(self.width)
        }
    }
}

pub type RoleRenderer =
    fn(&mut dyn CanvasEngine, BlockId, &RoleInput<'_>, &mut DishCursor) -> Result<f64, CarteError>;

/// Renderer for each element role.
pub const ROLE_RENDERERS: [(ElementRole, RoleRenderer); 7] = [
    (ElementRole::Title, render_title),
    (ElementRole::Description, render_description),
    (ElementRole::AddOns, render_add_ons),
    (ElementRole::Price, render_price),
    (ElementRole::SectionTitle, render_section_title),
    (ElementRole::SectionAddOns, render_add_ons),
    (ElementRole::SectionPrice, render_price),
];

pub fn renderer_for(role: ElementRole) -> Option<RoleRenderer> {
    ROLE_RENDERERS
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, renderer)| *renderer)
}

/// Render `dish` into `block` at `y` and return the height it consumed.
pub fn render(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    dish: &Dish,
    style: LayoutStyle,
    geometry: &RenderGeometry,
    y: f64,
) -> Result<f64, CarteError> {
    match dish.kind {
        DishType::Dish | DishType::SectionTitle => {
            render_template(engine, block, dish, style, geometry, y)
        }
        DishType::Spacer | DishType::SectionSpacer => render_spacer(engine, block, dish, geometry, y),
        DishType::InlineText => render_inline_text(engine, block, dish, geometry, y),
        DishType::InlineImage => render_image(
            engine,
            block,
            dish.image.as_ref(),
            ContentFillMode::Cover,
            geometry,
            y,
        ),
        DishType::InlineSectionDivider => render_image(
            engine,
            block,
            dish.divider.as_ref(),
            ContentFillMode::Contain,
            geometry,
            y,
        ),
    }
}

fn render_template(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    dish: &Dish,
    style: LayoutStyle,
    geometry: &RenderGeometry,
    y: f64,
) -> Result<f64, CarteError> {
    let mut siblings = BTreeMap::new();
    for child in engine.children(block)? {
        let name = engine.name(child)?;
        match ElementRole::from_name(&name) {
            Some(role) => {
                siblings.insert(role, child);
            }
            None => debug!(dish_id = %dish.dish_id, name = %name, "skipping unnamed template child"),
        }
    }

    engine.set_position_x(block, geometry.x)?;
    engine.set_position_y(block, y)?;
    engine.set_width(block, geometry.width)?;

    let input = RoleInput {
        dish,
        style,
        width: geometry.width,
        siblings: &siblings,
    };
    let mut cursor = DishCursor::default();
    for (&role, &child) in &siblings {
        if let Some(renderer) = renderer_for(role) {
            renderer(engine, child, &input, &mut cursor)?;
        }
    }

    engine.set_height(block, cursor.y)?;
    Ok(cursor.y)
}

// ── Role renderers ──────────────────────────────────────────────

fn render_title(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    input: &RoleInput<'_>,
    cursor: &mut DishCursor,
) -> Result<f64, CarteError> {
    let dish = input.dish;
    let Some(title) = title_text(dish) else {
        if matches!(
            input.style,
            LayoutStyle::TitleAndPrice | LayoutStyle::TitleAndDescriptionAndPrice
        ) {
            warn!(dish_id = %dish.dish_id, "dish title is empty, merged price not shown");
        }
        engine.destroy(block)?;
        return Ok(0.0);
    };

    let mut parts = vec![(ElementRole::Title, title)];
    let description = non_empty(&dish.description).map(str::to_string);
    let price = price_text(dish);
    match input.style {
        LayoutStyle::TitleAndPrice => parts.extend(price.map(|p| (ElementRole::Price, p))),
        LayoutStyle::TitleAndDescriptionAndPrice => {
            parts.extend(description.map(|d| (ElementRole::Description, d)));
            parts.extend(price.map(|p| (ElementRole::Price, p)));
        }
        _ => {}
    }

    let width = input.field_width(engine)?;
    let height = render_run(engine, block, &parts, input, width, cursor.y)?;
    cursor.place_field(height, true);
    Ok(height)
}

fn render_description(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    input: &RoleInput<'_>,
    cursor: &mut DishCursor,
) -> Result<f64, CarteError> {
    let dish = input.dish;
    match input.style {
        LayoutStyle::TitleAndDescriptionAndPrice => {
            engine.destroy(block)?;
            Ok(0.0)
        }
        LayoutStyle::DescriptionAndPrice => {
            let Some(description) = non_empty(&dish.description) else {
                warn!(dish_id = %dish.dish_id, "dish description is empty, merged price not shown");
                engine.destroy(block)?;
                return Ok(0.0);
            };
            let mut parts = vec![(ElementRole::Description, description.to_string())];
            parts.extend(price_text(dish).map(|p| (ElementRole::Price, p)));
            let height = render_run(engine, block, &parts, input, input.width, cursor.y)?;
            cursor.place_field(height, false);
            Ok(height)
        }
        _ => render_field(engine, block, non_empty(&dish.description), input, cursor, false),
    }
}

fn render_add_ons(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    input: &RoleInput<'_>,
    cursor: &mut DishCursor,
) -> Result<f64, CarteError> {
    render_field(engine, block, non_empty(&input.dish.add_ons), input, cursor, false)
}

fn render_section_title(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    input: &RoleInput<'_>,
    cursor: &mut DishCursor,
) -> Result<f64, CarteError> {
    render_field(engine, block, non_empty(&input.dish.title), input, cursor, true)
}

fn render_price(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    input: &RoleInput<'_>,
    cursor: &mut DishCursor,
) -> Result<f64, CarteError> {
    let is_dish_price = input.dish.kind == DishType::Dish;
    if is_dish_price && merges_price(input.style) {
        // Shown inside the title or description run, if at all.
        engine.destroy(block)?;
        return Ok(0.0);
    }
    let Some(price) = price_text(input.dish) else {
        engine.destroy(block)?;
        return Ok(0.0);
    };
    if !input.style.justifies_price() {
        return render_field(engine, block, Some(price.as_str()), input, cursor, false);
    }

    let width = input.price_width(engine)?;
    set_text(engine, block, &price)?;
    engine.set_text_alignment(block, HorizontalAlign::Right)?;
    let height = layout_text(engine, block, input.width - width, cursor.y, width)?;

    if cursor.text_height <= 0.0 {
        // Nothing to align against: anchor at the cursor plus one line unit.
        let consumed = height + font_unit(engine, block)?;
        cursor.y += consumed;
        return Ok(consumed);
    }

    let top = cursor.y - cursor.text_height;
    let target = match input.style {
        LayoutStyle::JustifyPriceTop => top,
        _ => {
            let reference = if cursor.fields > 1 && cursor.title_height > 0.0 {
                cursor.title_height
            } else {
                cursor.text_height
            };
            (top + (reference - height) / 2.0).max(top)
        }
    };
    engine.set_position_y(block, target)?;
    let consumed = (target + height - cursor.y).max(0.0);
    cursor.y += consumed;
    Ok(consumed)
}

// ── Single-block renderers ──────────────────────────────────────

fn render_spacer(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    dish: &Dish,
    geometry: &RenderGeometry,
    y: f64,
) -> Result<f64, CarteError> {
    let size = dish.spacer_size();
    let height = size.height / POINTS_PER_INCH;
    if height <= 0.0 {
        engine.destroy(block)?;
        return Ok(0.0);
    }
    for child in engine.children(block)? {
        engine.destroy(child)?;
    }
    let width = if size.width > 0.0 {
        (size.width / POINTS_PER_INCH).min(geometry.width)
    } else {
        geometry.width
    };
    engine.set_position_x(block, geometry.x)?;
    engine.set_position_y(block, y)?;
    engine.set_width(block, width)?;
    engine.set_height(block, height)?;
    engine.set_visible(block, false)?;
    Ok(height)
}

fn render_inline_text(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    dish: &Dish,
    geometry: &RenderGeometry,
    y: f64,
) -> Result<f64, CarteError> {
    let Some(text) = non_empty(&dish.description).or_else(|| non_empty(&dish.title)) else {
        engine.destroy(block)?;
        return Ok(0.0);
    };
    set_text(engine, block, text)?;
    engine.set_text_font_size(block, geometry.base_font_size, None)?;
    engine.set_text_alignment(block, geometry.align)?;
    layout_text(engine, block, geometry.x, y, geometry.width)
}

fn render_image(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    asset: Option<&ImageAsset>,
    mode: ContentFillMode,
    geometry: &RenderGeometry,
    y: f64,
) -> Result<f64, CarteError> {
    let Some(asset) = asset.filter(|a| !a.uri.is_empty() && a.aspect_width() > 0.0) else {
        engine.destroy(block)?;
        return Ok(0.0);
    };

    let natural = asset.aspect_width();
    let (width, height) = if natural > geometry.width {
        (geometry.width, asset.height_inches * geometry.width / natural)
    } else {
        (natural, asset.height_inches)
    };
    let x = geometry.x + align_offset(geometry.align, geometry.width, width);

    engine.set_position_x(block, x)?;
    engine.set_position_y(block, y)?;
    engine.set_width(block, width)?;
    engine.set_height(block, height)?;
    engine.set_fill(
        block,
        Fill::Image {
            uri: asset.uri.clone(),
            mode,
        },
    )?;
    engine.set_shape(block, Shape::Rect { corner_radius: 0.0 })?;
    Ok(height)
}

// ── Helpers ─────────────────────────────────────────────────────

fn render_field(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    text: Option<&str>,
    input: &RoleInput<'_>,
    cursor: &mut DishCursor,
    is_title: bool,
) -> Result<f64, CarteError> {
    let Some(text) = text else {
        engine.destroy(block)?;
        return Ok(0.0);
    };
    set_text(engine, block, text)?;
    let width = input.field_width(engine)?;
    let height = layout_text(engine, block, 0.0, cursor.y, width)?;
    cursor.place_field(height, is_title);
    Ok(height)
}

/// Write several fields as one run. Every field after the first takes the
/// font size, color and typeface of its own template block.
fn render_run(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    parts: &[(ElementRole, String)],
    input: &RoleInput<'_>,
    width: f64,
    y: f64,
) -> Result<f64, CarteError> {
    let (text, ranges) = merge_parts(parts);
    set_text(engine, block, &text)?;
    for (role, range) in ranges.into_iter().skip(1) {
        match input.siblings.get(&role) {
            Some(&source) if engine.is_valid(source) => copy_style(engine, source, block, range)?,
            _ => debug!(dish_id = %input.dish.dish_id, role = %role, "no template block to copy style from"),
        }
    }
    layout_text(engine, block, 0.0, y, width)
}

/// Join parts with the merge separator, returning the char range of each.
fn merge_parts(parts: &[(ElementRole, String)]) -> (String, Vec<(ElementRole, Range<usize>)>) {
    let mut text = String::new();
    let mut ranges = Vec::with_capacity(parts.len());
    let mut offset = 0;
    for (i, (role, part)) in parts.iter().enumerate() {
        if i > 0 {
            text.push_str(MERGE_SEPARATOR);
            offset += MERGE_SEPARATOR.chars().count();
        }
        let len = part.chars().count();
        text.push_str(part);
        ranges.push((*role, offset..offset + len));
        offset += len;
    }
    (text, ranges)
}

fn copy_style(
    engine: &mut dyn CanvasEngine,
    source: BlockId,
    target: BlockId,
    range: Range<usize>,
) -> Result<(), CarteError> {
    if let Some(size) = engine.text_font_sizes(source)?.first() {
        engine.set_text_font_size(target, *size, Some(range.clone()))?;
    }
    if let Some(color) = engine.text_colors(source)?.first() {
        engine.set_text_color(target, *color, Some(range.clone()))?;
    }
    let typeface = engine.typeface(source)?;
    engine.set_typeface(target, &typeface, Some(range))?;
    Ok(())
}

/// Replace the text of a block, keeping the letter case of its template.
fn set_text(engine: &mut dyn CanvasEngine, block: BlockId, text: &str) -> Result<(), CarteError> {
    let case = engine.text_case(block)?;
    engine.replace_text(block, text)?;
    engine.set_text_case(block, case)?;
    Ok(())
}

fn layout_text(
    engine: &mut dyn CanvasEngine,
    block: BlockId,
    x: f64,
    y: f64,
    width: f64,
) -> Result<f64, CarteError> {
    engine.set_width(block, width)?;
    engine.set_height_mode(block, SizeMode::Auto)?;
    engine.set_position_x(block, x)?;
    engine.set_position_y(block, y)?;
    Ok(engine.global_bounding_box_height(block)?)
}

/// One font-size unit of a text block, in inches.
fn font_unit(engine: &dyn CanvasEngine, block: BlockId) -> Result<f64, CarteError> {
    let size = engine.text_font_sizes(block)?.first().copied().unwrap_or(0.0);
    Ok(size / POINTS_PER_INCH)
}

fn align_offset(align: HorizontalAlign, available: f64, width: f64) -> f64 {
    let free = (available - width).max(0.0);
    match align {
        HorizontalAlign::Left => 0.0,
        HorizontalAlign::Center => free / 2.0,
        HorizontalAlign::Right => free,
    }
}

fn merges_price(style: LayoutStyle) -> bool {
    matches!(
        style,
        LayoutStyle::TitleAndPrice
            | LayoutStyle::DescriptionAndPrice
            | LayoutStyle::TitleAndDescriptionAndPrice
    )
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Title with dietary icons appended.
fn title_text(dish: &Dish) -> Option<String> {
    let title = non_empty(&dish.title)?;
    Some(match non_empty(&dish.dietary_icons) {
        Some(icons) => format!("{} {}", title, icons),
        None => title.to_string(),
    })
}

/// `price / secondPrice`, or whichever of the two is present.
fn price_text(dish: &Dish) -> Option<String> {
    match (non_empty(&dish.price), non_empty(&dish.second_price)) {
        (Some(first), Some(second)) => Some(format!("{} / {}", first, second)),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BlockType, Scene};
    use crate::model::{TemplateElement, TemplateKind, TemplateLayout};
    use crate::templates::{SceneTemplates, TemplateRegistry};

    fn element(role: &str, font_size: f64, width: Option<f64>) -> TemplateElement {
        TemplateElement {
            role: role.to_string(),
            font_size,
            color: Default::default(),
            typeface: Default::default(),
            text_case: Default::default(),
            width,
        }
    }

    struct Fixture {
        scene: Scene,
        templates: SceneTemplates,
        page: BlockId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let layouts = vec![TemplateLayout {
            id: "dish".into(),
            kind: TemplateKind::Dish,
            elements: vec![
                element("title", 14.0, None),
                element("description", 10.0, None),
                element("addons", 9.0, None),
                element("price", 11.0, Some(0.75)),
            ],
        }];
        let templates = SceneTemplates::load(&mut scene, &layouts).unwrap();
        Fixture {
            scene,
            templates,
            page,
        }
    }

    fn geometry() -> RenderGeometry {
        RenderGeometry {
            x: 0.5,
            width: 3.5,
            align: HorizontalAlign::Left,
            base_font_size: 12.0,
        }
    }

    fn dish(title: &str, description: &str, price: &str) -> Dish {
        let field = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Dish {
            dish_id: "d1".into(),
            title: field(title),
            description: field(description),
            price: field(price),
            ..Default::default()
        }
    }

    fn child(scene: &Scene, block: BlockId, name: &str) -> Option<BlockId> {
        scene
            .children(block)
            .unwrap()
            .into_iter()
            .find(|c| scene.name(*c).unwrap() == name)
    }

    fn instance(f: &mut Fixture) -> BlockId {
        let block = f.templates.instantiate(&mut f.scene, "dish").unwrap();
        f.scene.append_child(f.page, block).unwrap();
        block
    }

    #[test]
    fn test_empty_fields_are_destroyed() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("Soup", "", "$5");
        let height = render(&mut f.scene, block, &d, LayoutStyle::Default, &geometry(), 1.0).unwrap();

        assert!(child(&f.scene, block, "description").is_none());
        assert!(child(&f.scene, block, "addons").is_none());
        let title = child(&f.scene, block, "title").unwrap();
        let price = child(&f.scene, block, "price").unwrap();
        let title_h = f.scene.global_bounding_box_height(title).unwrap();
        let price_h = f.scene.global_bounding_box_height(price).unwrap();
        assert!((height - (title_h + price_h)).abs() < 1e-9);
        assert_eq!(f.scene.position_y(price).unwrap(), title_h);
        assert_eq!(f.scene.position_y(block).unwrap(), 1.0);
        assert!((f.scene.global_bounding_box_height(block).unwrap() - height).abs() < 1e-9);
    }

    #[test]
    fn test_dietary_icons_and_second_price() {
        let mut f = fixture();
        let block = instance(&mut f);
        let mut d = dish("Soup", "", "$5");
        d.dietary_icons = Some("(V)".into());
        d.second_price = Some("$8".into());
        render(&mut f.scene, block, &d, LayoutStyle::Default, &geometry(), 0.0).unwrap();
        let title = child(&f.scene, block, "title").unwrap();
        let price = child(&f.scene, block, "price").unwrap();
        assert_eq!(f.scene.text(title).unwrap(), "Soup (V)");
        assert_eq!(f.scene.text(price).unwrap(), "$5 / $8");
    }

    #[test]
    fn test_title_and_price_merges_run() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("Soup", "Hot", "$5");
        render(&mut f.scene, block, &d, LayoutStyle::TitleAndPrice, &geometry(), 0.0).unwrap();

        assert!(child(&f.scene, block, "price").is_none());
        let title = child(&f.scene, block, "title").unwrap();
        assert_eq!(f.scene.text(title).unwrap(), "Soup  $5");
        assert_eq!(f.scene.text_font_sizes(title).unwrap(), vec![14.0, 11.0]);
        assert!(child(&f.scene, block, "description").is_some());
    }

    #[test]
    fn test_title_and_price_with_empty_title() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("", "", "$12");
        let height =
            render(&mut f.scene, block, &d, LayoutStyle::TitleAndPrice, &geometry(), 0.0).unwrap();
        assert_eq!(height, 0.0);
        assert!(child(&f.scene, block, "title").is_none());
        assert!(child(&f.scene, block, "price").is_none());
    }

    #[test]
    fn test_title_description_price_single_run() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("Soup", "Hot", "$5");
        render(
            &mut f.scene,
            block,
            &d,
            LayoutStyle::TitleAndDescriptionAndPrice,
            &geometry(),
            0.0,
        )
        .unwrap();
        let title = child(&f.scene, block, "title").unwrap();
        assert_eq!(f.scene.text(title).unwrap(), "Soup  Hot  $5");
        assert_eq!(f.scene.text_font_sizes(title).unwrap(), vec![14.0, 10.0, 11.0]);
        assert!(child(&f.scene, block, "description").is_none());
        assert!(child(&f.scene, block, "price").is_none());
    }

    #[test]
    fn test_description_and_price_with_empty_description() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("Soup", "", "$5");
        render(&mut f.scene, block, &d, LayoutStyle::DescriptionAndPrice, &geometry(), 0.0).unwrap();
        assert!(child(&f.scene, block, "description").is_none());
        assert!(child(&f.scene, block, "price").is_none());
        let title = child(&f.scene, block, "title").unwrap();
        assert_eq!(f.scene.text(title).unwrap(), "Soup");
    }

    #[test]
    fn test_justify_top_aligns_price_with_title() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("Soup", "Hot and sour", "$5");
        let height =
            render(&mut f.scene, block, &d, LayoutStyle::JustifyPriceTop, &geometry(), 0.0).unwrap();

        let title = child(&f.scene, block, "title").unwrap();
        let price = child(&f.scene, block, "price").unwrap();
        assert_eq!(f.scene.width(title).unwrap(), 2.75);
        assert_eq!(f.scene.width(price).unwrap(), 0.75);
        assert_eq!(f.scene.position_x(price).unwrap(), 2.75);
        assert_eq!(f.scene.position_y(price).unwrap(), 0.0);

        let description = child(&f.scene, block, "description").unwrap();
        let text_h = f.scene.global_bounding_box_height(title).unwrap()
            + f.scene.global_bounding_box_height(description).unwrap();
        assert!((height - text_h).abs() < 1e-9);
    }

    #[test]
    fn test_justify_center_single_field() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("Soup", "", "$5");
        render(&mut f.scene, block, &d, LayoutStyle::JustifyPriceCenter, &geometry(), 0.0).unwrap();
        let title = child(&f.scene, block, "title").unwrap();
        let price = child(&f.scene, block, "price").unwrap();
        let title_h = f.scene.global_bounding_box_height(title).unwrap();
        let price_h = f.scene.global_bounding_box_height(price).unwrap();
        let expected = (title_h - price_h) / 2.0;
        assert!((f.scene.position_y(price).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_justified_price_alone_consumes_extra_unit() {
        let mut f = fixture();
        let block = instance(&mut f);
        let d = dish("", "", "$5");
        let height =
            render(&mut f.scene, block, &d, LayoutStyle::JustifyPriceTop, &geometry(), 0.0).unwrap();
        let price = child(&f.scene, block, "price").unwrap();
        let price_h = f.scene.global_bounding_box_height(price).unwrap();
        assert!((height - (price_h + 11.0 / 72.0)).abs() < 1e-9);
    }

    #[test]
    fn test_spacer_sizes_and_zero_destroys() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let spacer = scene.create(BlockType::Graphic);
        scene.append_child(page, spacer).unwrap();
        let d = Dish::spacer("s", 36.0);
        let h = render(&mut scene, spacer, &d, LayoutStyle::Default, &geometry(), 2.0).unwrap();
        assert_eq!(h, 0.5);
        assert_eq!(scene.height(spacer).unwrap(), 0.5);
        assert_eq!(scene.position_y(spacer).unwrap(), 2.0);

        let empty = scene.create(BlockType::Graphic);
        scene.append_child(page, empty).unwrap();
        let d = Dish::spacer("z", 0.0);
        let h = render(&mut scene, empty, &d, LayoutStyle::Default, &geometry(), 0.0).unwrap();
        assert_eq!(h, 0.0);
        assert!(!scene.is_valid(empty));
    }

    #[test]
    fn test_inline_image_clamped_and_centered() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let block = scene.create(BlockType::Graphic);
        scene.append_child(page, block).unwrap();
        let d = Dish {
            dish_id: "img".into(),
            kind: DishType::InlineImage,
            image: Some(ImageAsset {
                uri: "salad.png".into(),
                width: 800.0,
                height: 200.0,
                height_inches: 1.0,
            }),
            ..Default::default()
        };
        let geo = RenderGeometry {
            align: HorizontalAlign::Center,
            ..geometry()
        };
        let h = render(&mut scene, block, &d, LayoutStyle::Default, &geo, 0.0).unwrap();
        assert!((h - 3.5 / 4.0).abs() < 1e-9);
        assert_eq!(scene.width(block).unwrap(), 3.5);
        assert_eq!(scene.position_x(block).unwrap(), 0.5);
        assert_eq!(
            scene.fill(block).unwrap(),
            Some(Fill::Image {
                uri: "salad.png".into(),
                mode: ContentFillMode::Cover
            })
        );
    }

    #[test]
    fn test_missing_image_destroys_block() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let block = scene.create(BlockType::Graphic);
        scene.append_child(page, block).unwrap();
        let d = Dish {
            dish_id: "div".into(),
            kind: DishType::InlineSectionDivider,
            ..Default::default()
        };
        let h = render(&mut scene, block, &d, LayoutStyle::Default, &geometry(), 0.0).unwrap();
        assert_eq!(h, 0.0);
        assert!(!scene.is_valid(block));
    }

    #[test]
    fn test_inline_text_uses_description_then_title() {
        let mut scene = Scene::new();
        let page = scene.add_page("p1", 8.5, 11.0);
        let block = scene.create(BlockType::Text);
        scene.append_child(page, block).unwrap();
        let mut d = dish("Note", "", "");
        d.kind = DishType::InlineText;
        let h = render(&mut scene, block, &d, LayoutStyle::Default, &geometry(), 0.0).unwrap();
        assert_eq!(scene.text(block).unwrap(), "Note");
        assert!(h > 0.0);
        assert_eq!(h, scene.global_bounding_box_height(block).unwrap());
    }

    #[test]
    fn test_every_role_has_a_renderer() {
        for role in ElementRole::ALL {
            assert!(renderer_for(role).is_some(), "no renderer for {}", role);
        }
    }
}

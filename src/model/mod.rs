//! # Menu Model
//!
//! The input representation for the layout engine. A menu is a list of
//! pages; each page holds sections placed on a row/column grid; each section
//! holds an ordered list of dishes. This is the shape the editor's data store
//! keeps in memory and syncs to storage.
//!
//! A "dish" is not only a menu item: section titles, spacers, inline text,
//! inline images and dividers are all dishes with a different [`DishType`].
//! That keeps one ordering key (`orderPosition`) for everything that stacks
//! inside a section column.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// A complete menu document ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    /// Pages in display order.
    pub pages: Vec<Page>,

    /// Layout style flags keyed by section id.
    #[serde(default)]
    pub layout_settings: HashMap<String, LayoutSettings>,

    /// Layout templates duplicated per dish / section title.
    #[serde(default)]
    pub templates: Vec<TemplateLayout>,

    /// Custom typefaces used by the templates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<FontSource>,

    /// Engine tunables. Every field has a default.
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Menu {
    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_id == page_id)
    }

    pub fn page_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.page_id == page_id)
    }
}

/// Edge values (top, right, bottom, left) used for margins and insets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    /// Only the positive part of each edge. Borders with negative margins
    /// bleed outward and must not shrink the content box.
    pub fn positive(&self) -> Self {
        Self {
            top: self.top.max(0.0),
            right: self.right.max(0.0),
            bottom: self.bottom.max(0.0),
            left: self.left.max(0.0),
        }
    }
}

/// Standard page sizes in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    Letter,
    Legal,
    Tabloid,
    A4,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in inches.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::Letter => (8.5, 11.0),
            PageSize::Legal => (8.5, 14.0),
            PageSize::Tabloid => (11.0, 17.0),
            PageSize::A4 => (8.27, 11.69),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// One menu page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Stable identity used to key canvas blocks.
    pub page_id: String,

    #[serde(default)]
    pub size: PageSize,

    /// Number of grid columns sections are placed on.
    #[serde(default = "default_one")]
    pub columns: u32,

    /// Page margins in inches.
    #[serde(default)]
    pub margins: Edges,

    /// Horizontal gap between grid columns, in inches.
    #[serde(default = "default_column_gap")]
    pub column_gap: f64,

    /// Extra spacing at section-row boundaries, as a multiple of the dish gap.
    #[serde(default = "default_multiplier")]
    pub section_gap_multiplier: f64,

    /// Base font size (points) for spacing units derived from type size.
    #[serde(default = "default_font_size")]
    pub dish_spacing_font_size: f64,

    #[serde(default)]
    pub sections: Vec<Section>,

    /// Set whenever the page content is edited; cleared after a layout pass.
    #[serde(default)]
    pub changed: bool,
}

impl Page {
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.section_id == section_id)
    }

    /// Total number of dishes across all sections.
    pub fn dish_count(&self) -> usize {
        self.sections.iter().map(|s| s.dishes.len()).sum()
    }
}

fn default_one() -> u32 {
    1
}

fn default_column_gap() -> f64 {
    0.25
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_font_size() -> f64 {
    12.0
}

/// Placement of a section on the page grid, in grid cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPlacement {
    pub x: u32,
    pub y: u32,
    #[serde(default = "default_one")]
    pub w: u32,
    #[serde(default = "default_one")]
    pub h: u32,
}

impl GridPlacement {
    /// Grid columns covered by this placement.
    pub fn column_range(&self) -> std::ops::Range<usize> {
        self.x as usize..self.x.saturating_add(self.w.max(1)) as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A border image drawn around a section or a single dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderImage {
    pub uri: String,
    /// Distance between the border and the content it frames, in inches.
    /// Positive margins also inset the content.
    #[serde(default)]
    pub margins: Edges,
}

/// A named region of a page containing ordered dishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub placement: GridPlacement,

    /// Number of dish columns inside the section.
    #[serde(default = "default_one")]
    pub columns: u32,

    /// Horizontal gap between dish columns, in inches.
    #[serde(default)]
    pub column_margin: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderImage>,

    /// Leading space (points) rendered as a synthetic spacer dish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_margin: Option<f64>,

    #[serde(default)]
    pub alignment: HorizontalAlign,

    /// Template id duplicated for every `dish` entry.
    #[serde(default)]
    pub dish_template: String,

    /// Template id duplicated for every `sectionTitle` entry.
    #[serde(default)]
    pub title_template: String,

    #[serde(default)]
    pub dishes: Vec<Dish>,
}

impl Section {
    pub fn column_count(&self) -> u32 {
        self.columns.max(1)
    }

    /// Dishes in one section column, sorted by `orderPosition`.
    pub fn column_dishes(&self, column: u32) -> Vec<&Dish> {
        let last = self.column_count() - 1;
        let mut dishes: Vec<&Dish> = self
            .dishes
            .iter()
            .filter(|d| d.column.min(last) == column)
            .collect();
        dishes.sort_by_key(|d| d.order_position);
        dishes
    }
}

/// The kind of element a dish entry lays out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DishType {
    #[default]
    Dish,
    SectionTitle,
    Spacer,
    SectionSpacer,
    InlineText,
    InlineImage,
    InlineSectionDivider,
}

impl DishType {
    /// Types whose block is duplicated from a layout template.
    pub fn uses_template(&self) -> bool {
        matches!(self, DishType::Dish | DishType::SectionTitle)
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self, DishType::Spacer | DishType::SectionSpacer)
    }
}

/// An image (inline picture or section divider) with its intrinsic size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub uri: String,
    /// Intrinsic pixel width.
    pub width: f64,
    /// Intrinsic pixel height.
    pub height: f64,
    /// Rendered height on the page, in inches.
    pub height_inches: f64,
}

impl ImageAsset {
    /// Rendered width preserving the aspect ratio.
    pub fn aspect_width(&self) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.width / self.height * self.height_inches
    }
}

/// One semantic element inside a section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub dish_id: String,

    #[serde(default, rename = "type")]
    pub kind: DishType,

    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub second_price: Option<String>,
    #[serde(default)]
    pub add_ons: Option<String>,
    #[serde(default)]
    pub dietary_icons: Option<String>,

    /// Section column index (0-based).
    #[serde(default)]
    pub column: u32,

    /// Stacking order within the section column, top to bottom.
    #[serde(default)]
    pub order_position: i64,

    /// Per-dish margins in inches.
    #[serde(default)]
    pub margins: Edges,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderImage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAsset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divider: Option<ImageAsset>,

    /// Spacer size: `{height, width}` as an object or a JSON-encoded string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Spacer dimensions in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpacerSize {
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub width: f64,
}

impl Dish {
    /// Create a synthetic spacer of `height` points.
    pub fn spacer(dish_id: &str, height: f64) -> Self {
        Dish {
            dish_id: dish_id.to_string(),
            kind: DishType::Spacer,
            payload: Some(serde_json::json!({ "height": height, "width": 0 })),
            ..Default::default()
        }
    }

    /// Decode the spacer payload. Numbers stored as strings are accepted.
    pub fn spacer_size(&self) -> SpacerSize {
        let value = match &self.payload {
            Some(serde_json::Value::String(s)) => {
                match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(v) => v,
                    Err(_) => return SpacerSize::default(),
                }
            }
            Some(v) => v.clone(),
            None => return SpacerSize::default(),
        };
        SpacerSize {
            height: number_field(&value, "height"),
            width: number_field(&value, "width"),
        }
    }
}

fn number_field(value: &serde_json::Value, key: &str) -> f64 {
    match value.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Per-section layout style flags, as stored by the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    #[serde(default)]
    pub is_dish_title_and_price: bool,
    #[serde(default)]
    pub is_dish_description_and_price: bool,
    #[serde(default)]
    pub is_dish_title_and_description_and_price: bool,
    #[serde(default)]
    pub is_justify_price_center: bool,
    #[serde(default)]
    pub is_justify_price_top: bool,
}

impl LayoutSettings {
    /// True when none of the specific styles is selected.
    pub fn is_default_layout(&self) -> bool {
        self.style() == LayoutStyle::Default
    }

    /// Resolve the flags into the single active style. When several flags
    /// are set the first one in declaration order wins.
    pub fn style(&self) -> LayoutStyle {
        if self.is_dish_title_and_price {
            LayoutStyle::TitleAndPrice
        } else if self.is_dish_description_and_price {
            LayoutStyle::DescriptionAndPrice
        } else if self.is_dish_title_and_description_and_price {
            LayoutStyle::TitleAndDescriptionAndPrice
        } else if self.is_justify_price_center {
            LayoutStyle::JustifyPriceCenter
        } else if self.is_justify_price_top {
            LayoutStyle::JustifyPriceTop
        } else {
            LayoutStyle::Default
        }
    }
}

/// The active layout style of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutStyle {
    #[default]
    Default,
    TitleAndPrice,
    DescriptionAndPrice,
    TitleAndDescriptionAndPrice,
    JustifyPriceCenter,
    JustifyPriceTop,
}

impl LayoutStyle {
    pub fn justifies_price(&self) -> bool {
        matches!(self, LayoutStyle::JustifyPriceCenter | LayoutStyle::JustifyPriceTop)
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// Letter-case transform applied by the canvas at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextCase {
    #[default]
    Normal,
    Uppercase,
    Lowercase,
    Titlecase,
}

/// A font face reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typeface {
    pub family: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u32 {
    400
}

impl Default for Typeface {
    fn default() -> Self {
        Typeface {
            family: "Helvetica".to_string(),
            weight: 400,
            italic: false,
        }
    }
}

/// A custom font face, as base64 TrueType/OpenType data or a data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSource {
    pub family: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub italic: bool,
    pub src: String,
}

/// What a layout template is duplicated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateKind {
    #[default]
    Dish,
    SectionTitle,
}

/// A pre-authored layout seeding the styling of one dish or section title.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLayout {
    pub id: String,
    #[serde(default)]
    pub kind: TemplateKind,
    pub elements: Vec<TemplateElement>,
}

/// One text block inside a layout template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateElement {
    /// Block name; one of the element role names (`title`, `price`, ...).
    pub role: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub typeface: Typeface,
    #[serde(default)]
    pub text_case: TextCase,
    /// Fixed width in inches. Only justified prices use it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

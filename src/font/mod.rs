//! # Font Management
//!
//! Typeface resolution and glyph metrics for text measurement.
//!
//! The built-in faces (Helvetica, Helvetica-Bold, Courier) need no font
//! data. Template typefaces can be registered from TrueType/OpenType bytes
//! or a base64 data URI; their advance widths are read with ttf-parser.

pub mod metrics;

use std::collections::HashMap;

use base64::Engine as _;

pub use metrics::StandardFontMetrics;

use crate::error::CarteError;
use crate::model::Typeface;

/// A font registry that maps font family + weight + style to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    fn new(family: &str, weight: u32, italic: bool) -> Self {
        FontKey {
            family: family.to_string(),
            weight,
            italic,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// A built-in face measured from static width tables.
    Standard(StandardFont),
    /// A registered TrueType/OpenType face.
    Custom(CustomFontMetrics),
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Latin, Latin-1 and the general punctuation / currency blocks cover
        // what menus print.
        let ranges = [32u32..=0x024F, 0x2000..=0x20CF];
        for code in ranges.into_iter().flatten() {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }
}

/// The built-in faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl StandardFont {
    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA_METRICS,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD_METRICS,
            Self::Courier => &metrics::COURIER_METRICS,
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        // Oblique faces share the upright advance widths.
        let standard_mappings = [
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::Helvetica),
            (("Helvetica", 700, true), StandardFont::HelveticaBold),
            (("Courier", 400, false), StandardFont::Courier),
            (("Courier", 700, false), StandardFont::Courier),
            (("Courier", 400, true), StandardFont::Courier),
            (("Courier", 700, true), StandardFont::Courier),
        ];

        for ((family, weight, italic), font) in standard_mappings {
            fonts.insert(FontKey::new(family, weight, italic), FontData::Standard(font));
        }

        Self { fonts }
    }

    /// Look up a font, falling back to Helvetica if not found.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> &FontData {
        if let Some(font) = self.fonts.get(&FontKey::new(family, weight, italic)) {
            return font;
        }

        // Try with normalized weight (snap to 400 or 700)
        let snapped_weight = if weight >= 600 { 700 } else { 400 };
        if let Some(font) = self.fonts.get(&FontKey::new(family, snapped_weight, italic)) {
            return font;
        }

        static HELVETICA: FontData = FontData::Standard(StandardFont::Helvetica);
        static HELVETICA_BOLD: FontData = FontData::Standard(StandardFont::HelveticaBold);
        if snapped_weight == 700 {
            &HELVETICA_BOLD
        } else {
            &HELVETICA
        }
    }

    /// Register a custom font from raw TrueType/OpenType bytes.
    pub fn register(
        &mut self,
        family: &str,
        weight: u32,
        italic: bool,
        data: &[u8],
    ) -> Result<(), CarteError> {
        let metrics = CustomFontMetrics::from_font_data(data).ok_or_else(|| {
            CarteError::Template(format!("font '{}' could not be parsed", family))
        })?;
        self.fonts
            .insert(FontKey::new(family, weight, italic), FontData::Custom(metrics));
        Ok(())
    }

    /// Register a custom font from base64 data or a data URI
    /// (e.g. "data:font/ttf;base64,...").
    pub fn register_base64(
        &mut self,
        family: &str,
        weight: u32,
        italic: bool,
        src: &str,
    ) -> Result<(), CarteError> {
        let payload = match src.split_once("base64,") {
            Some((_, data)) => data,
            None => src,
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CarteError::Template(format!("font '{}': {}", family, e)))?;
        self.register(family, weight, italic, &bytes)
    }
}

/// Shared font context used by text measurement.
#[derive(Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, typeface: &Typeface, font_size: f64) -> f64 {
        match self
            .registry
            .resolve(&typeface.family, typeface.weight, typeface.italic)
        {
            FontData::Standard(std_font) => std_font.metrics().char_width(ch, font_size),
            FontData::Custom(m) => m.char_width(ch, font_size),
        }
    }

    /// Measure the width of a string on a single line, in points.
    pub fn measure_string(&self, text: &str, typeface: &Typeface, font_size: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, typeface, font_size))
            .sum()
    }

    /// Access the underlying font registry mutably.
    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}

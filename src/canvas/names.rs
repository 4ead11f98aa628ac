//! Well-known block names.
//!
//! These strings are a protocol shared with the host editor: the layout pass
//! destroys blocks by name before every run, and the layer-order tracker
//! treats anything outside [`AUTO_LAYOUT_NAMES`] as user-placed. Renaming a
//! block to one of these names changes what the engine does with it.

use std::fmt;

pub const LOADER_GRAPHIC: &str = "loaderGraphic";
pub const LOADER_TEXT: &str = "loaderText";
pub const LOADER_SHAPE: &str = "loaderShape";
pub const LOADER_CHANGES_GRAPHIC: &str = "loaderChangesGraphic";
pub const APPLY_LOADER_TEXT: &str = "ApplyloaderText";

pub const SECTION: &str = "section";
pub const SECTION_DISH: &str = "sectionDish";
pub const SECTION_BORDER: &str = "sectionBorder";
pub const DISH_BORDER: &str = "dishBorder";
pub const SECTION_DIVIDER: &str = "sectionDivider";
pub const INLINE_TEXT: &str = "inlineText";
pub const INLINE_IMAGE: &str = "inlineImage";
pub const SECTION_SPACER: &str = "sectionSpacer";

/// Names of blocks the layout pass owns. Only these are destroyed before a
/// pass; everything else on a page belongs to the user.
pub const AUTO_LAYOUT_NAMES: &[&str] = &[
    SECTION,
    SECTION_DISH,
    SECTION_BORDER,
    DISH_BORDER,
    SECTION_DIVIDER,
    INLINE_TEXT,
    INLINE_IMAGE,
    SECTION_SPACER,
];

/// Names of transient overlay blocks.
pub const OVERLAY_NAMES: &[&str] = &[
    LOADER_GRAPHIC,
    LOADER_TEXT,
    LOADER_SHAPE,
    LOADER_CHANGES_GRAPHIC,
    APPLY_LOADER_TEXT,
];

/// Metadata keys written on canvas blocks.
pub mod meta {
    pub const PAGE_ID: &str = "pageId";
    pub const SECTION_ID: &str = "sectionId";
    pub const DISH_ID: &str = "dishId";
    pub const USER_PLACED: &str = "userPlaced";
    pub const LAYER_INDEX: &str = "layerIndex";
    pub const TEMPLATE_ID: &str = "templateId";
}

pub fn is_auto_layout_name(name: &str) -> bool {
    AUTO_LAYOUT_NAMES.contains(&name)
}

pub fn is_overlay_name(name: &str) -> bool {
    OVERLAY_NAMES.contains(&name)
}

/// Semantic role of a text block inside a dish or section-title template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementRole {
    Title,
    Description,
    AddOns,
    Price,
    SectionTitle,
    SectionAddOns,
    SectionPrice,
}

impl ElementRole {
    pub const ALL: [ElementRole; 7] = [
        ElementRole::Title,
        ElementRole::Description,
        ElementRole::AddOns,
        ElementRole::Price,
        ElementRole::SectionTitle,
        ElementRole::SectionAddOns,
        ElementRole::SectionPrice,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(ElementRole::Title),
            "description" => Some(ElementRole::Description),
            "price" => Some(ElementRole::Price),
            "addons" => Some(ElementRole::AddOns),
            "sectionTitle" => Some(ElementRole::SectionTitle),
            "sectionPrice" => Some(ElementRole::SectionPrice),
            "sectionAddons" => Some(ElementRole::SectionAddOns),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementRole::Title => "title",
            ElementRole::Description => "description",
            ElementRole::Price => "price",
            ElementRole::AddOns => "addons",
            ElementRole::SectionTitle => "sectionTitle",
            ElementRole::SectionPrice => "sectionPrice",
            ElementRole::SectionAddOns => "sectionAddons",
        }
    }

    pub fn is_price(&self) -> bool {
        matches!(self, ElementRole::Price | ElementRole::SectionPrice)
    }
}

impl fmt::Display for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip() {
        for role in ElementRole::ALL {
            assert_eq!(ElementRole::from_name(role.name()), Some(role));
        }
        assert_eq!(ElementRole::from_name("Title"), None);
    }

    #[test]
    fn test_price_sorts_last_within_dish_roles() {
        let mut roles = vec![ElementRole::Price, ElementRole::AddOns, ElementRole::Title];
        roles.sort();
        assert_eq!(roles, vec![ElementRole::Title, ElementRole::AddOns, ElementRole::Price]);
    }

    #[test]
    fn test_overlays_are_not_auto_layout() {
        assert!(is_auto_layout_name(SECTION_BORDER));
        assert!(!is_auto_layout_name(LOADER_GRAPHIC));
        assert!(is_overlay_name(APPLY_LOADER_TEXT));
    }
}

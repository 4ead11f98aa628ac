//! Immutable inputs of one page layout pass.

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::model::{LayoutSettings, LayoutStyle, Page, Section};
use crate::store::MenuStore;

/// Everything the composer and renderers read about a page. Built once per
/// page so layout code never reaches into the store mid-pass.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub page: &'a Page,
    pub settings: &'a HashMap<String, LayoutSettings>,
    pub config: &'a LayoutConfig,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        page: &'a Page,
        settings: &'a HashMap<String, LayoutSettings>,
        config: &'a LayoutConfig,
    ) -> Self {
        LayoutContext {
            page,
            settings,
            config,
        }
    }

    pub fn from_store(store: &'a MenuStore, page_id: &str, config: &'a LayoutConfig) -> Option<Self> {
        let page = store.page(page_id)?;
        Some(Self::new(page, store.layout_settings(), config))
    }

    pub fn section(&self, section_id: &str) -> Option<&'a Section> {
        self.page.section(section_id)
    }

    /// Active layout style of a section. Sections without settings use the
    /// default style.
    pub fn style_for(&self, section_id: &str) -> LayoutStyle {
        self.settings
            .get(section_id)
            .map(LayoutSettings::style)
            .unwrap_or_default()
    }
}

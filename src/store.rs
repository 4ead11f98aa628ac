//! In-memory menu data store.
//!
//! Holds the pages, sections and dishes the editor works on, plus the set
//! of dirty page ids that drives the next layout pass. Every edit goes
//! through a method that marks the owning page as changed.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::canvas::BlockId;
use crate::error::CarteError;
use crate::model::{Dish, LayoutSettings, Menu, Page, Section};

#[derive(Debug, Default)]
pub struct MenuStore {
    menu: Menu,
    changed: BTreeSet<String>,
    section_groups: HashMap<String, BlockId>,
}

impl MenuStore {
    /// Load a menu. Pages flagged `changed` in the document start dirty.
    pub fn new(menu: Menu) -> Self {
        let changed = menu
            .pages
            .iter()
            .filter(|p| p.changed)
            .map(|p| p.page_id.clone())
            .collect();
        MenuStore {
            menu,
            changed,
            section_groups: HashMap::new(),
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn pages(&self) -> &[Page] {
        &self.menu.pages
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.menu.page(page_id)
    }

    pub fn layout_settings(&self) -> &HashMap<String, LayoutSettings> {
        &self.menu.layout_settings
    }

    /// Ids of pages edited since their last layout pass, in sorted order.
    pub fn changed_page_ids(&self) -> Vec<String> {
        self.changed.iter().cloned().collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn mark_changed(&mut self, page_id: &str) {
        if let Some(page) = self.menu.page_mut(page_id) {
            page.changed = true;
        }
        self.changed.insert(page_id.to_string());
    }

    /// Mark every page dirty (initial layout, template switch).
    pub fn mark_all_changed(&mut self) {
        let ids: Vec<String> = self.menu.pages.iter().map(|p| p.page_id.clone()).collect();
        for id in ids {
            self.mark_changed(&id);
        }
    }

    pub fn clear_changed(&mut self, page_id: &str) {
        if let Some(page) = self.menu.page_mut(page_id) {
            page.changed = false;
        }
        self.changed.remove(page_id);
    }

    /// Record the canvas groups of one page's layout pass. Groups from the
    /// page's previous pass are forgotten, including those of sections that
    /// produced no blocks this time.
    pub fn replace_section_groups<'a>(
        &mut self,
        page_id: &str,
        groups: impl IntoIterator<Item = (&'a str, BlockId)>,
    ) {
        if let Some(page) = self.menu.pages.iter().find(|p| p.page_id == page_id) {
            for section in &page.sections {
                self.section_groups.remove(&section.section_id);
            }
        }
        for (section_id, group) in groups {
            self.section_groups.insert(section_id.to_string(), group);
        }
    }

    pub fn section_group(&self, section_id: &str) -> Option<BlockId> {
        self.section_groups.get(section_id).copied()
    }

    /// Edit a section in place and mark its page changed.
    pub fn update_section(
        &mut self,
        page_id: &str,
        section_id: &str,
        edit: impl FnOnce(&mut Section),
    ) -> Result<(), CarteError> {
        let page = self
            .menu
            .page_mut(page_id)
            .ok_or_else(|| CarteError::MissingPage(page_id.to_string()))?;
        let section = page
            .section_mut(section_id)
            .ok_or_else(|| CarteError::MissingSection(section_id.to_string()))?;
        edit(section);
        self.mark_changed(page_id);
        Ok(())
    }

    /// Edit a dish in place and mark its page changed.
    pub fn update_dish(
        &mut self,
        page_id: &str,
        section_id: &str,
        dish_id: &str,
        edit: impl FnOnce(&mut Dish),
    ) -> Result<(), CarteError> {
        let mut found = false;
        self.update_section(page_id, section_id, |section| {
            if let Some(dish) = section.dishes.iter_mut().find(|d| d.dish_id == dish_id) {
                edit(dish);
                found = true;
            }
        })?;
        if !found {
            debug!(page_id, section_id, dish_id, "dish not found, nothing edited");
        }
        Ok(())
    }

    /// Replace the layout style of a section. Marks the owning page changed.
    pub fn set_layout_settings(&mut self, section_id: &str, settings: LayoutSettings) {
        self.menu
            .layout_settings
            .insert(section_id.to_string(), settings);
        let owner = self
            .menu
            .pages
            .iter()
            .find(|p| p.section(section_id).is_some())
            .map(|p| p.page_id.clone());
        if let Some(page_id) = owner {
            self.mark_changed(&page_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GridPlacement;

    fn menu() -> Menu {
        let json = r#"{
            "pages": [
                { "pageId": "p1", "sections": [
                    { "sectionId": "s1", "dishes": [ { "dishId": "d1", "title": "Soup" } ] }
                ] },
                { "pageId": "p2", "changed": true }
            ]
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_initial_changed_pages() {
        let store = MenuStore::new(menu());
        assert_eq!(store.changed_page_ids(), vec!["p2".to_string()]);
    }

    #[test]
    fn test_update_dish_marks_page() {
        let mut store = MenuStore::new(menu());
        store
            .update_dish("p1", "s1", "d1", |d| d.price = Some("$5".into()))
            .unwrap();
        assert_eq!(store.changed_page_ids(), vec!["p1".to_string(), "p2".to_string()]);
        assert!(store.page("p1").unwrap().changed);
        let dish = &store.page("p1").unwrap().sections[0].dishes[0];
        assert_eq!(dish.price.as_deref(), Some("$5"));

        store.clear_changed("p1");
        assert!(!store.page("p1").unwrap().changed);
        assert_eq!(store.changed_page_ids(), vec!["p2".to_string()]);
    }

    #[test]
    fn test_update_missing_page() {
        let mut store = MenuStore::new(menu());
        let err = store
            .update_section("nope", "s1", |s| s.placement = GridPlacement::default())
            .unwrap_err();
        assert!(matches!(err, CarteError::MissingPage(_)));
    }

    #[test]
    fn test_layout_settings_mark_owner() {
        let mut store = MenuStore::new(menu());
        store.clear_changed("p2");
        store.set_layout_settings(
            "s1",
            LayoutSettings {
                is_justify_price_top: true,
                ..Default::default()
            },
        );
        assert_eq!(store.changed_page_ids(), vec!["p1".to_string()]);
    }

    #[test]
    fn test_section_groups_replaced_per_page() {
        let mut store = MenuStore::new(menu());
        store.replace_section_groups("p1", [("s1", BlockId(7))]);
        assert_eq!(store.section_group("s1"), Some(BlockId(7)));

        store.replace_section_groups("p1", [("s1", BlockId(9))]);
        assert_eq!(store.section_group("s1"), Some(BlockId(9)));

        // s1 rendered nothing on the next pass.
        store.replace_section_groups("p1", Vec::<(&str, BlockId)>::new());
        assert_eq!(store.section_group("s1"), None);
    }
}

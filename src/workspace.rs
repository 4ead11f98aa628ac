//! # Workspace
//!
//! One editing session: the canvas, the menu data and everything that keeps
//! them in sync. Edits go through the workspace, which marks their page
//! changed, shows the pending-changes indicator and (re)arms the debounced
//! layout pass. The host drives time by calling [`Workspace::tick`].

use std::time::Instant;

use tracing::{debug, warn};

use crate::canvas::{find_page_block, CanvasEngine, Scene};
use crate::config::LayoutConfig;
use crate::error::CarteError;
use crate::layers::LayerTracker;
use crate::layout::{LayoutEngine, LayoutInfo, LayoutReport};
use crate::model::{Dish, LayoutSettings, Menu, Section};
use crate::overlay::PendingChangesIndicator;
use crate::persistence::{MemoryPersistence, ScenePersistence};
use crate::scheduler::Debouncer;
use crate::store::MenuStore;
use crate::templates::SceneTemplates;

pub struct Workspace {
    scene: Scene,
    templates: SceneTemplates,
    store: MenuStore,
    engine: LayoutEngine,
    debouncer: Debouncer<()>,
    tracker: LayerTracker,
    indicator: PendingChangesIndicator,
    persistence: Box<dyn ScenePersistence>,
}

impl Workspace {
    /// Build the canvas for `menu`: hidden templates, one page block per
    /// page. Every page starts changed so the first pass lays out all of
    /// them.
    pub fn open(menu: Menu) -> Result<Self, CarteError> {
        let config = menu.layout.clone();
        let mut scene = Scene::new().with_line_height(config.line_height);
        for font in &menu.fonts {
            let registry = scene.fonts_mut().registry_mut();
            if let Err(err) = registry.register_base64(&font.family, font.weight, font.italic, &font.src) {
                warn!(family = %font.family, error = %err, "custom font skipped, measuring with the fallback face");
            }
        }
        let templates = SceneTemplates::load(&mut scene, &menu.templates)?;
        for page in &menu.pages {
            let (width, height) = page.size.dimensions();
            scene.add_page(&page.page_id, width, height);
        }
        let tracker = LayerTracker::new(&mut scene);

        let mut store = MenuStore::new(menu);
        store.mark_all_changed();
        debug!(pages = store.pages().len(), "workspace opened");

        Ok(Workspace {
            scene,
            templates,
            store,
            debouncer: Debouncer::new(config.debounce()),
            engine: LayoutEngine::new(config),
            tracker,
            indicator: PendingChangesIndicator::new(),
            persistence: Box::new(MemoryPersistence::new()),
        })
    }

    pub fn with_persistence(mut self, persistence: impl ScenePersistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Direct canvas access, as the host editor has. Blocks created here on
    /// a page are treated as user-placed.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn store(&self) -> &MenuStore {
        &self.store
    }

    pub fn config(&self) -> &LayoutConfig {
        self.engine.config()
    }

    pub fn indicator(&self) -> &PendingChangesIndicator {
        &self.indicator
    }

    pub fn is_layout_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn edit_dish(
        &mut self,
        now: Instant,
        page_id: &str,
        section_id: &str,
        dish_id: &str,
        edit: impl FnOnce(&mut Dish),
    ) -> Result<(), CarteError> {
        self.store.update_dish(page_id, section_id, dish_id, edit)?;
        self.schedule(now, page_id);
        Ok(())
    }

    pub fn edit_section(
        &mut self,
        now: Instant,
        page_id: &str,
        section_id: &str,
        edit: impl FnOnce(&mut Section),
    ) -> Result<(), CarteError> {
        self.store.update_section(page_id, section_id, edit)?;
        self.schedule(now, page_id);
        Ok(())
    }

    pub fn set_layout_settings(&mut self, now: Instant, section_id: &str, settings: LayoutSettings) {
        self.store.set_layout_settings(section_id, settings);
        let owner = self
            .store
            .pages()
            .iter()
            .find(|p| p.section(section_id).is_some())
            .map(|p| p.page_id.clone());
        match owner {
            Some(page_id) => self.schedule(now, &page_id),
            None => debug!(section_id, "layout settings for a section on no page"),
        }
    }

    fn schedule(&mut self, now: Instant, page_id: &str) {
        self.debouncer.schedule(now, ());
        let Some(page) = find_page_block(&self.scene, page_id) else {
            return;
        };
        if let Err(err) = self.indicator.set(&mut self.scene, page, true, self.engine.config()) {
            warn!(page_id, error = %err, "pending-changes indicator not shown");
        }
    }

    /// Process canvas events and run the layout pass once the debounce
    /// delay has elapsed since the last edit.
    pub fn tick(&mut self, now: Instant) -> Option<LayoutReport> {
        self.tracker.poll(&mut self.scene);
        if let Err(err) = self.indicator.poll(&mut self.scene) {
            warn!(error = %err, "pending-changes indicator poll failed");
        }
        self.debouncer.take_due(now)?;
        Some(self.layout_now())
    }

    /// Lay out every changed page immediately.
    pub fn layout_now(&mut self) -> LayoutReport {
        self.debouncer.cancel();
        if let Err(err) = self.indicator.hide(&mut self.scene) {
            warn!(error = %err, "pending-changes indicator not removed");
        }
        self.tracker.poll(&mut self.scene);
        let report = self.engine.process_changed_pages(
            &mut self.scene,
            &self.templates,
            &mut self.store,
            self.persistence.as_mut(),
        );
        // Drain the pass's own events; its blocks carry reserved names.
        self.tracker.poll(&mut self.scene);
        report
    }

    pub fn info(&self) -> Result<LayoutInfo, CarteError> {
        LayoutInfo::capture(&self.scene, self.store.pages())
    }

    pub fn save_scene(&self) -> Result<String, CarteError> {
        Ok(self.scene.save_to_string()?)
    }
}

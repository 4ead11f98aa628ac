//! Layout templates.
//!
//! Every dish and section title starts life as a copy of a pre-authored
//! template block whose children carry the typography (one text block per
//! element role). The composer never clones blocks itself: it asks a
//! [`TemplateRegistry`] for a fresh instance.

use std::collections::HashMap;

use tracing::debug;

use crate::canvas::names::{meta, ElementRole};
use crate::canvas::{BlockId, BlockType, CanvasEngine, SizeMode};
use crate::error::CarteError;
use crate::model::{TemplateKind, TemplateLayout};

/// Factory for template instances.
pub trait TemplateRegistry {
    /// Create a fresh copy of `template_id`. The caller is responsible for
    /// appending it to a page.
    fn instantiate(
        &self,
        engine: &mut dyn CanvasEngine,
        template_id: &str,
    ) -> Result<BlockId, CarteError>;
}

/// Templates pre-loaded as hidden blocks in the scene and duplicated on
/// demand.
#[derive(Debug, Default)]
pub struct SceneTemplates {
    holder: Option<BlockId>,
    blocks: HashMap<String, BlockId>,
}

impl SceneTemplates {
    /// Build one hidden template block per layout.
    pub fn load(
        engine: &mut dyn CanvasEngine,
        layouts: &[TemplateLayout],
    ) -> Result<Self, CarteError> {
        let holder = engine.create(BlockType::Group);
        engine.set_name(holder, "templates")?;
        engine.set_visible(holder, false)?;

        let mut blocks = HashMap::new();
        for layout in layouts {
            let container = engine.create(BlockType::Group);
            engine.append_child(holder, container)?;
            engine.set_kind(
                container,
                match layout.kind {
                    TemplateKind::Dish => "dish",
                    TemplateKind::SectionTitle => "sectionTitle",
                },
            )?;
            engine.set_metadata(container, meta::TEMPLATE_ID, &layout.id)?;
            engine.set_height_mode(container, SizeMode::Auto)?;

            for element in &layout.elements {
                if ElementRole::from_name(&element.role).is_none() {
                    return Err(CarteError::Template(format!(
                        "template '{}' has unknown element role '{}'",
                        layout.id, element.role
                    )));
                }
                let text = engine.create(BlockType::Text);
                engine.append_child(container, text)?;
                engine.set_name(text, &element.role)?;
                engine.set_text_font_size(text, element.font_size, None)?;
                engine.set_text_color(text, element.color, None)?;
                engine.set_typeface(text, &element.typeface, None)?;
                engine.set_text_case(text, element.text_case)?;
                engine.set_width(text, element.width.unwrap_or(0.0))?;
            }

            debug!(template = %layout.id, elements = layout.elements.len(), "loaded template");
            blocks.insert(layout.id.clone(), container);
        }

        Ok(SceneTemplates {
            holder: Some(holder),
            blocks,
        })
    }

    pub fn contains(&self, template_id: &str) -> bool {
        self.blocks.contains_key(template_id)
    }

    /// The hidden block holding every template.
    pub fn holder(&self) -> Option<BlockId> {
        self.holder
    }
}

impl TemplateRegistry for SceneTemplates {
    fn instantiate(
        &self,
        engine: &mut dyn CanvasEngine,
        template_id: &str,
    ) -> Result<BlockId, CarteError> {
        let template = self
            .blocks
            .get(template_id)
            .copied()
            .ok_or_else(|| CarteError::Template(format!("unknown template '{}'", template_id)))?;
        Ok(engine.duplicate(template)?)
    }
}

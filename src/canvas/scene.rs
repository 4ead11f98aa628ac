//! In-memory canvas engine.
//!
//! `Scene` keeps blocks in an arena keyed by id. Text blocks measure
//! themselves with the crate's font metrics, so auto-height text reports a
//! real height after every text or width change. The whole arena
//! round-trips through JSON for `save_to_string` / `load_from_string`.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::names::meta;
use super::{
    BlockEvent, BlockEventType, BlockId, BlockType, CanvasEngine, Fill, Rect, Shape, SizeMode,
    SubscriptionId,
};
use crate::error::CanvasError;
use crate::font::FontContext;
use crate::model::{Color, HorizontalAlign, TextCase, Typeface};
use crate::text::{resolve_char_styles, StyledRange, TextLayout, TextStyle};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextContent {
    text: String,
    style: TextStyle,
    #[serde(default)]
    ranges: Vec<StyledRange>,
    #[serde(default)]
    case: TextCase,
    #[serde(default)]
    align: HorizontalAlign,
}

impl Default for TextContent {
    fn default() -> Self {
        TextContent {
            text: String::new(),
            style: TextStyle::default(),
            ranges: Vec::new(),
            case: TextCase::Normal,
            align: HorizontalAlign::Left,
        }
    }
}

impl TextContent {
    fn style_at(&self, index: usize) -> TextStyle {
        resolve_char_styles(&self.text, &self.style, &self.ranges)
            .get(index)
            .map(|s| (*s).clone())
            .unwrap_or_else(|| self.style.clone())
    }

    /// Apply `edit` to the whole text or to one char range.
    fn restyle(&mut self, range: Option<Range<usize>>, edit: impl Fn(&mut TextStyle)) {
        match range {
            None => {
                edit(&mut self.style);
                for r in &mut self.ranges {
                    edit(&mut r.style);
                }
            }
            Some(range) => {
                if range.start >= range.end {
                    return;
                }
                let mut style = self.style_at(range.start);
                edit(&mut style);
                self.ranges.push(StyledRange {
                    start: range.start,
                    end: range.end,
                    style,
                });
            }
        }
    }

    fn distinct<T: PartialEq + Clone>(&self, pick: impl Fn(&TextStyle) -> T) -> Vec<T> {
        let styles = resolve_char_styles(&self.text, &self.style, &self.ranges);
        let mut out: Vec<T> = Vec::new();
        for style in styles {
            let value = pick(style);
            if !out.contains(&value) {
                out.push(value);
            }
        }
        if out.is_empty() {
            out.push(pick(&self.style));
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Block {
    block_type: BlockType,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    name: String,
    parent: Option<BlockId>,
    #[serde(default)]
    children: Vec<BlockId>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    height_mode: SizeMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fill: Option<Fill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<Shape>,
    visible: bool,
    #[serde(default)]
    transform_locked: bool,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Block {
    fn new(block_type: BlockType) -> Self {
        let is_text = block_type == BlockType::Text;
        Block {
            block_type,
            kind: String::new(),
            name: String::new(),
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            width: if is_text { 1.0 } else { 0.0 },
            height: 0.0,
            height_mode: if is_text { SizeMode::Auto } else { SizeMode::Absolute },
            text: if is_text { Some(TextContent::default()) } else { None },
            fill: None,
            shape: None,
            visible: true,
            transform_locked: false,
            metadata: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneData {
    blocks: BTreeMap<BlockId, Block>,
    next_id: u64,
}

#[derive(Debug, Default)]
struct Subscription {
    filter: Vec<BlockId>,
    queue: Vec<BlockEvent>,
}

/// An in-memory scene graph implementing [`CanvasEngine`].
pub struct Scene {
    data: SceneData,
    root: BlockId,
    fonts: FontContext,
    text_layout: TextLayout,
    line_height: f64,
    subscriptions: BTreeMap<u64, Subscription>,
    next_subscription: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut scene = Scene {
            data: SceneData::default(),
            root: BlockId(0),
            fonts: FontContext::new(),
            text_layout: TextLayout::new(),
            line_height: 1.2,
            subscriptions: BTreeMap::new(),
            next_subscription: 0,
        };
        scene.root = scene.create(BlockType::Scene);
        scene
    }

    /// Line height factor used when measuring auto-height text.
    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn fonts_mut(&mut self) -> &mut FontContext {
        &mut self.fonts
    }

    /// Add a page block for `page_id` under the scene root.
    pub fn add_page(&mut self, page_id: &str, width: f64, height: f64) -> BlockId {
        let page = self.create(BlockType::Page);
        if let Some(block) = self.data.blocks.get_mut(&page) {
            block.width = width;
            block.height = height;
            block.name = page_id.to_string();
            block.metadata.insert(meta::PAGE_ID.to_string(), page_id.to_string());
            block.parent = Some(self.root);
        }
        if let Some(root) = self.data.blocks.get_mut(&self.root) {
            root.children.push(page);
        }
        page
    }

    /// Number of live blocks, including the scene root.
    pub fn block_count(&self) -> usize {
        self.data.blocks.len()
    }

    fn block(&self, id: BlockId) -> Result<&Block, CanvasError> {
        self.data.blocks.get(&id).ok_or(CanvasError::InvalidBlock(id))
    }

    fn modify<R>(
        &mut self,
        id: BlockId,
        f: impl FnOnce(&mut Block) -> R,
    ) -> Result<R, CanvasError> {
        let block = self
            .data
            .blocks
            .get_mut(&id)
            .ok_or(CanvasError::InvalidBlock(id))?;
        let out = f(block);
        self.emit(id, BlockEventType::Updated);
        Ok(out)
    }

    fn text_content(&self, id: BlockId) -> Result<&TextContent, CanvasError> {
        self.block(id)?.text.as_ref().ok_or(CanvasError::NotText(id))
    }

    fn modify_text<R>(
        &mut self,
        id: BlockId,
        f: impl FnOnce(&mut TextContent) -> R,
    ) -> Result<R, CanvasError> {
        self.text_content(id)?;
        self.modify(id, |b| b.text.as_mut().map(f))?
            .ok_or(CanvasError::NotText(id))
    }

    fn emit(&mut self, block: BlockId, kind: BlockEventType) {
        for sub in self.subscriptions.values_mut() {
            if sub.filter.is_empty() || sub.filter.contains(&block) {
                sub.queue.push(BlockEvent { block, kind });
            }
        }
    }

    fn is_ancestor(&self, ancestor: BlockId, mut id: BlockId) -> bool {
        while let Some(parent) = self.data.blocks.get(&id).and_then(|b| b.parent) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    fn detach(&mut self, child: BlockId) {
        let parent = self.data.blocks.get(&child).and_then(|b| b.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.data.blocks.get_mut(&parent) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Some(c) = self.data.blocks.get_mut(&child) {
            c.parent = None;
        }
    }

    fn attach(
        &mut self,
        parent: BlockId,
        child: BlockId,
        index: Option<usize>,
    ) -> Result<(), CanvasError> {
        self.block(parent)?;
        self.block(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(CanvasError::Cycle(child));
        }
        self.detach(child);
        if let Some(p) = self.data.blocks.get_mut(&parent) {
            let at = index.unwrap_or(p.children.len()).min(p.children.len());
            p.children.insert(at, child);
        }
        if let Some(c) = self.data.blocks.get_mut(&child) {
            c.parent = Some(parent);
        }
        self.emit(parent, BlockEventType::Updated);
        Ok(())
    }

    fn subtree(&self, id: BlockId) -> Vec<BlockId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            if let Some(b) = self.data.blocks.get(&out[i]) {
                out.extend(b.children.iter().copied());
            }
            i += 1;
        }
        out
    }

    fn clone_subtree(&mut self, id: BlockId, parent: Option<BlockId>) -> Result<BlockId, CanvasError> {
        let mut copy = self.block(id)?.clone();
        let children = std::mem::take(&mut copy.children);
        let new_id = BlockId(self.data.next_id);
        self.data.next_id += 1;
        copy.parent = parent;
        self.data.blocks.insert(new_id, copy);
        self.emit(new_id, BlockEventType::Created);
        for child in children {
            let child_copy = self.clone_subtree(child, Some(new_id))?;
            if let Some(b) = self.data.blocks.get_mut(&new_id) {
                b.children.push(child_copy);
            }
        }
        Ok(new_id)
    }

    fn resolved_height(&self, id: BlockId) -> Result<f64, CanvasError> {
        let block = self.block(id)?;
        if block.height_mode == SizeMode::Absolute {
            return Ok(block.height);
        }
        if let Some(text) = &block.text {
            let metrics = self.text_layout.measure(
                &self.fonts,
                &text.text,
                &text.style,
                &text.ranges,
                text.case,
                block.width,
                self.line_height,
            );
            return Ok(metrics.height);
        }
        let mut bottom: f64 = 0.0;
        for child in &block.children {
            let c = self.block(*child)?;
            bottom = bottom.max(c.y + self.resolved_height(*child)?);
        }
        Ok(bottom)
    }
}

impl CanvasEngine for Scene {
    fn create(&mut self, block_type: BlockType) -> BlockId {
        let id = BlockId(self.data.next_id);
        self.data.next_id += 1;
        self.data.blocks.insert(id, Block::new(block_type));
        self.emit(id, BlockEventType::Created);
        id
    }

    fn duplicate(&mut self, id: BlockId) -> Result<BlockId, CanvasError> {
        let parent = self.block(id)?.parent;
        let copy = self.clone_subtree(id, None)?;
        if let Some(parent) = parent {
            self.attach(parent, copy, None)?;
        }
        Ok(copy)
    }

    fn destroy(&mut self, id: BlockId) -> Result<(), CanvasError> {
        self.block(id)?;
        self.detach(id);
        for block in self.subtree(id) {
            self.data.blocks.remove(&block);
            self.emit(block, BlockEventType::Destroyed);
        }
        Ok(())
    }

    fn is_valid(&self, id: BlockId) -> bool {
        self.data.blocks.contains_key(&id)
    }

    fn children(&self, id: BlockId) -> Result<Vec<BlockId>, CanvasError> {
        Ok(self.block(id)?.children.clone())
    }

    fn parent(&self, id: BlockId) -> Result<Option<BlockId>, CanvasError> {
        Ok(self.block(id)?.parent)
    }

    fn append_child(&mut self, parent: BlockId, child: BlockId) -> Result<(), CanvasError> {
        self.attach(parent, child, None)
    }

    fn insert_child(
        &mut self,
        parent: BlockId,
        child: BlockId,
        index: usize,
    ) -> Result<(), CanvasError> {
        self.attach(parent, child, Some(index))
    }

    fn find_by_name(&self, name: &str) -> Vec<BlockId> {
        self.data
            .blocks
            .iter()
            .filter(|(_, b)| b.name == name)
            .map(|(id, _)| *id)
            .collect()
    }

    fn find_by_type(&self, block_type: BlockType) -> Vec<BlockId> {
        self.data
            .blocks
            .iter()
            .filter(|(_, b)| b.block_type == block_type)
            .map(|(id, _)| *id)
            .collect()
    }

    fn block_type(&self, id: BlockId) -> Result<BlockType, CanvasError> {
        Ok(self.block(id)?.block_type)
    }

    fn set_kind(&mut self, id: BlockId, kind: &str) -> Result<(), CanvasError> {
        self.modify(id, |b| b.kind = kind.to_string())
    }

    fn kind(&self, id: BlockId) -> Result<String, CanvasError> {
        Ok(self.block(id)?.kind.clone())
    }

    fn set_name(&mut self, id: BlockId, name: &str) -> Result<(), CanvasError> {
        self.modify(id, |b| b.name = name.to_string())
    }

    fn name(&self, id: BlockId) -> Result<String, CanvasError> {
        Ok(self.block(id)?.name.clone())
    }

    fn set_position_x(&mut self, id: BlockId, x: f64) -> Result<(), CanvasError> {
        self.modify(id, |b| b.x = x)
    }

    fn set_position_y(&mut self, id: BlockId, y: f64) -> Result<(), CanvasError> {
        self.modify(id, |b| b.y = y)
    }

    fn position_x(&self, id: BlockId) -> Result<f64, CanvasError> {
        Ok(self.block(id)?.x)
    }

    fn position_y(&self, id: BlockId) -> Result<f64, CanvasError> {
        Ok(self.block(id)?.y)
    }

    fn set_width(&mut self, id: BlockId, width: f64) -> Result<(), CanvasError> {
        self.modify(id, |b| b.width = width.max(0.0))
    }

    fn set_height(&mut self, id: BlockId, height: f64) -> Result<(), CanvasError> {
        self.modify(id, |b| {
            b.height = height.max(0.0);
            b.height_mode = SizeMode::Absolute;
        })
    }

    fn width(&self, id: BlockId) -> Result<f64, CanvasError> {
        Ok(self.block(id)?.width)
    }

    fn height(&self, id: BlockId) -> Result<f64, CanvasError> {
        self.resolved_height(id)
    }

    fn set_height_mode(&mut self, id: BlockId, mode: SizeMode) -> Result<(), CanvasError> {
        self.modify(id, |b| b.height_mode = mode)
    }

    fn global_bounding_box(&self, id: BlockId) -> Result<Rect, CanvasError> {
        let block = self.block(id)?;
        let mut x = block.x;
        let mut y = block.y;
        let mut parent = block.parent;
        while let Some(p) = parent {
            let pb = self.block(p)?;
            if matches!(pb.block_type, BlockType::Page | BlockType::Scene) {
                break;
            }
            x += pb.x;
            y += pb.y;
            parent = pb.parent;
        }
        Ok(Rect {
            x,
            y,
            width: block.width,
            height: self.resolved_height(id)?,
        })
    }

    fn replace_text(&mut self, id: BlockId, text: &str) -> Result<(), CanvasError> {
        self.modify_text(id, |t| {
            t.style = t.style_at(0);
            t.ranges.clear();
            t.case = TextCase::Normal;
            t.text = text.to_string();
        })
    }

    fn text(&self, id: BlockId) -> Result<String, CanvasError> {
        Ok(self.text_content(id)?.text.clone())
    }

    fn set_text_case(&mut self, id: BlockId, case: TextCase) -> Result<(), CanvasError> {
        self.modify_text(id, |t| t.case = case)
    }

    fn text_case(&self, id: BlockId) -> Result<TextCase, CanvasError> {
        Ok(self.text_content(id)?.case)
    }

    fn set_text_alignment(
        &mut self,
        id: BlockId,
        align: HorizontalAlign,
    ) -> Result<(), CanvasError> {
        self.modify_text(id, |t| t.align = align)
    }

    fn text_colors(&self, id: BlockId) -> Result<Vec<Color>, CanvasError> {
        Ok(self.text_content(id)?.distinct(|s| s.color))
    }

    fn text_font_sizes(&self, id: BlockId) -> Result<Vec<f64>, CanvasError> {
        Ok(self.text_content(id)?.distinct(|s| s.font_size))
    }

    fn typeface(&self, id: BlockId) -> Result<Typeface, CanvasError> {
        Ok(self.text_content(id)?.style.typeface.clone())
    }

    fn set_text_color(
        &mut self,
        id: BlockId,
        color: Color,
        range: Option<Range<usize>>,
    ) -> Result<(), CanvasError> {
        self.modify_text(id, |t| t.restyle(range, |s| s.color = color))
    }

    fn set_text_font_size(
        &mut self,
        id: BlockId,
        size: f64,
        range: Option<Range<usize>>,
    ) -> Result<(), CanvasError> {
        self.modify_text(id, |t| t.restyle(range, |s| s.font_size = size))
    }

    fn set_typeface(
        &mut self,
        id: BlockId,
        typeface: &Typeface,
        range: Option<Range<usize>>,
    ) -> Result<(), CanvasError> {
        self.modify_text(id, |t| t.restyle(range, |s| s.typeface = typeface.clone()))
    }

    fn set_metadata(&mut self, id: BlockId, key: &str, value: &str) -> Result<(), CanvasError> {
        self.modify(id, |b| {
            b.metadata.insert(key.to_string(), value.to_string());
        })
    }

    fn metadata(&self, id: BlockId, key: &str) -> Result<Option<String>, CanvasError> {
        Ok(self.block(id)?.metadata.get(key).cloned())
    }

    fn remove_metadata(&mut self, id: BlockId, key: &str) -> Result<(), CanvasError> {
        self.modify(id, |b| {
            b.metadata.remove(key);
        })
    }

    fn set_fill(&mut self, id: BlockId, fill: Fill) -> Result<(), CanvasError> {
        self.modify(id, |b| b.fill = Some(fill))
    }

    fn fill(&self, id: BlockId) -> Result<Option<Fill>, CanvasError> {
        Ok(self.block(id)?.fill.clone())
    }

    fn set_shape(&mut self, id: BlockId, shape: Shape) -> Result<(), CanvasError> {
        self.modify(id, |b| b.shape = Some(shape))
    }

    fn set_visible(&mut self, id: BlockId, visible: bool) -> Result<(), CanvasError> {
        self.modify(id, |b| b.visible = visible)
    }

    fn set_transform_locked(&mut self, id: BlockId, locked: bool) -> Result<(), CanvasError> {
        self.modify(id, |b| b.transform_locked = locked)
    }

    fn group(&mut self, ids: &[BlockId]) -> Result<BlockId, CanvasError> {
        let first = *ids
            .first()
            .ok_or_else(|| CanvasError::Scene("cannot group zero blocks".to_string()))?;
        let parent = self.block(first)?.parent.ok_or(CanvasError::InvalidBlock(first))?;

        let mut bounds: Option<Rect> = None;
        for id in ids {
            let block = self.block(*id)?;
            if block.parent != Some(parent) {
                return Err(CanvasError::NotAChild { parent, child: *id });
            }
            let rect = Rect {
                x: block.x,
                y: block.y,
                width: block.width,
                height: self.resolved_height(*id)?,
            };
            bounds = Some(match bounds {
                Some(b) => b.union(&rect),
                None => rect,
            });
        }
        let bounds = bounds.unwrap_or_default();

        // Members keep their sibling order inside the group.
        let siblings = self.block(parent)?.children.clone();
        let members: Vec<BlockId> = siblings.iter().copied().filter(|c| ids.contains(c)).collect();
        let insert_at = siblings
            .iter()
            .position(|c| ids.contains(c))
            .unwrap_or(siblings.len());

        let group = self.create(BlockType::Group);
        self.modify(group, |g| {
            g.x = bounds.x;
            g.y = bounds.y;
            g.width = bounds.width;
            g.height = bounds.height;
        })?;
        for member in &members {
            self.detach(*member);
            self.modify(*member, |m| {
                m.x -= bounds.x;
                m.y -= bounds.y;
                m.parent = Some(group);
            })?;
        }
        self.modify(group, |g| g.children = members)?;
        self.attach(parent, group, Some(insert_at))?;
        Ok(group)
    }

    fn bring_to_front(&mut self, id: BlockId) -> Result<(), CanvasError> {
        let parent = self.block(id)?.parent.ok_or(CanvasError::InvalidBlock(id))?;
        self.attach(parent, id, None)
    }

    fn send_to_back(&mut self, id: BlockId) -> Result<(), CanvasError> {
        let parent = self.block(id)?.parent.ok_or(CanvasError::InvalidBlock(id))?;
        self.attach(parent, id, Some(0))
    }

    fn save_to_string(&self) -> Result<String, CanvasError> {
        serde_json::to_string(&self.data).map_err(|e| CanvasError::Scene(e.to_string()))
    }

    fn load_from_string(&mut self, scene: &str) -> Result<(), CanvasError> {
        let data: SceneData =
            serde_json::from_str(scene).map_err(|e| CanvasError::Scene(e.to_string()))?;
        let root = data
            .blocks
            .iter()
            .find(|(_, b)| b.block_type == BlockType::Scene)
            .map(|(id, _)| *id)
            .ok_or_else(|| CanvasError::Scene("scene has no root block".to_string()))?;
        self.data = data;
        self.root = root;
        for sub in self.subscriptions.values_mut() {
            sub.queue.clear();
        }
        Ok(())
    }

    fn subscribe(&mut self, blocks: &[BlockId]) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscriptions.insert(
            id,
            Subscription {
                filter: blocks.to_vec(),
                queue: Vec::new(),
            },
        );
        SubscriptionId(id)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription.0);
    }

    fn poll_events(&mut self, subscription: SubscriptionId) -> Vec<BlockEvent> {
        self.subscriptions
            .get_mut(&subscription.0)
            .map(|s| std::mem::take(&mut s.queue))
            .unwrap_or_default()
    }
}

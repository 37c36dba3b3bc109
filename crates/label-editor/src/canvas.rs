//! Scene/canvas controller.
//!
//! Owns the scene (background + drawable layer), the dimension engine, the
//! selection handles, the list layout, the text editor, and the raster job
//! queue. Every mutation from the host goes through here, so each of those
//! pieces keeps a single writer.

use crate::hit::hit_test;
use crate::input::InputEvent;
use crate::jobs::{JobId, JobOutcome, JobQueue, RasterGenerator, RasterJob, refit_raster, request_for};
use crate::list_layout::{LayoutAxis, LayoutState, ListLayout};
use crate::persistence::DocumentStore;
use crate::selection::{HandleAnchor, SelectionHandles};
use crate::text_edit::{OverlayDescriptor, StyleChange, TextEditor, auto_resize};
use label_core::config::EditorConfig;
use label_core::dimension::DimensionEngine;
use label_core::document::{DocumentState, deserialize_nodes, now_timestamp, serialize_scene};
use label_core::error::Result;
use label_core::factory::{self, apply_resize};
use label_core::id::NodeId;
use label_core::metrics::{FallbackMeasurer, TextMeasurer};
use label_core::model::*;
use label_core::placeholder::{PlaceholderVisual, create_placeholder};
use label_core::NodeIndex;
use kurbo::{Affine, Point, Vec2};
use std::cell::Cell;
use std::rc::Rc;

/// Offset applied to a duplicated node so it does not hide the original.
pub const DUPLICATE_OFFSET: f64 = 10.0;
/// Smallest box a handle drag may shrink a node to.
pub const MIN_GESTURE_SIZE: f64 = 1.0;

/// The host surface the stage is mounted into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountTarget {
    pub width: f64,
    pub height: f64,
}

/// Result of a double-click.
#[derive(Debug, Clone, PartialEq)]
pub enum DoubleClickOutcome {
    Nothing,
    /// A laid-out child was pulled out of its group and selected.
    Escaped(NodeId),
    /// Text editing started; the host shows its overlay here.
    EditText(OverlayDescriptor),
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rotation: f64,
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Drag {
        id: NodeId,
        last: Point,
    },
    Transform {
        id: NodeId,
        anchor: HandleAnchor,
        start: Point,
        origin: Geometry,
    },
}

pub struct Canvas {
    graph: SceneGraph,
    dimensions: DimensionEngine,
    config: EditorConfig,
    measurer: Box<dyn TextMeasurer>,
    selection: SelectionHandles,
    layout: ListLayout,
    editor: TextEditor,
    jobs: JobQueue,
    background: Option<NodeId>,
    stage_size: (f64, f64),
    has_elements: bool,
    initialized: bool,
    /// Set by the dimension subscription, consumed by `sync_stage`.
    stage_dirty: Rc<Cell<bool>>,
    deferred: Vec<NodeId>,
    gesture: Option<Gesture>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("nodes", &self.graph.len())
            .field("stage_size", &self.stage_size)
            .field("selected", &self.selection.target())
            .field("layout", &self.layout.state())
            .field("pending_jobs", &self.jobs.len())
            .finish()
    }
}

impl Canvas {
    pub fn new(config: EditorConfig, measurer: impl TextMeasurer + 'static) -> Self {
        let mut dimensions = DimensionEngine::new(&config.default_paper, config.default_dpi);
        let stage_dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&stage_dirty);
        dimensions.subscribe(move |_| flag.set(true));
        Self {
            graph: SceneGraph::new(),
            dimensions,
            config,
            measurer: Box::new(measurer),
            selection: SelectionHandles::new(),
            layout: ListLayout::new(),
            editor: TextEditor::new(),
            jobs: JobQueue::new(),
            background: None,
            stage_size: (0.0, 0.0),
            has_elements: false,
            initialized: false,
            stage_dirty,
            deferred: Vec::new(),
            gesture: None,
        }
    }

    /// A canvas measuring text with the built-in advance table.
    pub fn headless(config: EditorConfig) -> Self {
        Self::new(config, FallbackMeasurer)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn dimensions(&self) -> &DimensionEngine {
        &self.dimensions
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &SelectionHandles {
        &self.selection
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.target()
    }

    pub fn layout(&self) -> &ListLayout {
        &self.layout
    }

    pub fn text_editor(&self) -> &TextEditor {
        &self.editor
    }

    pub fn stage_size(&self) -> (f64, f64) {
        self.stage_size
    }

    pub fn has_elements(&self) -> bool {
        self.has_elements
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn background(&self) -> Option<NodeId> {
        self.background
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        &*self.measurer
    }

    /// Swap the text measurer (e.g. once a 2D context exists) and
    /// re-measure every auto-sized text node on the next deferred pass.
    pub fn set_measurer(&mut self, measurer: impl TextMeasurer + 'static) {
        self.measurer = Box::new(measurer);
        self.deferred = self
            .graph
            .nodes()
            .filter(|n| match &n.kind {
                NodeKind::Placeholder(p) => p.text_state().is_some(),
                NodeKind::Text(t) => t.auto_width,
                _ => false,
            })
            .map(|n| n.id)
            .collect();
    }

    // ─── Stage ───────────────────────────────────────────────────────────

    /// Mount the stage. A missing target fails; a zero-sized one is logged
    /// and the stage is sized from the page anyway.
    pub fn initialize(&mut self, mount: Option<MountTarget>) -> bool {
        let Some(mount) = mount else {
            log::error!("canvas mount target is missing, editor cannot start");
            return false;
        };
        if mount.width <= 0.0 || mount.height <= 0.0 {
            log::warn!(
                "mount target has no size ({}x{}), using page dimensions",
                mount.width,
                mount.height
            );
        }
        if self.background.is_none() {
            let mut bg = Node::new(self.graph.fresh_id("background"), NodeKind::Background);
            bg.draggable = false;
            bg.selectable = false;
            let id = bg.id;
            let idx = self.graph.add_node(self.graph.root, bg);
            self.graph.move_to_position(idx, 0);
            self.background = Some(id);
        }
        self.stage_size = (0.0, 0.0);
        self.update_stage_size();
        self.initialized = true;
        true
    }

    /// Resize the stage and background to the current page. No-op when the
    /// size is unchanged.
    pub fn update_stage_size(&mut self) -> bool {
        self.stage_dirty.set(false);
        let size = self.dimensions.pixel_size();
        if size == self.stage_size {
            return false;
        }
        self.stage_size = size;
        if let Some(bg) = self.background.and_then(|id| self.graph.get_by_id_mut(id)) {
            bg.width = size.0;
            bg.height = size.1;
        }
        log::debug!("stage resized to {}x{}", size.0, size.1);
        true
    }

    /// Change the page through the dimension engine; the stage follows any
    /// effective change.
    pub fn update_dimensions<R>(&mut self, f: impl FnOnce(&mut DimensionEngine) -> R) -> R {
        let result = f(&mut self.dimensions);
        if self.stage_dirty.get() {
            self.update_stage_size();
        }
        result
    }

    // ─── Elements ────────────────────────────────────────────────────────

    /// Append `node` to the layer unless a node with its ID is already there.
    /// Queues a raster job when the node needs one.
    pub fn add_element(&mut self, node: Node) -> NodeId {
        if let Some(idx) = self.graph.index_of(node.id)
            && self.graph.parent(idx) == Some(self.graph.root)
        {
            return node.id;
        }
        self.attach(node)
    }

    /// Insert under the layer. A colliding ID is replaced by a fresh one.
    fn attach(&mut self, node: Node) -> NodeId {
        let idx = self.graph.add_node(self.graph.root, node);
        let id = self.graph.graph[idx].id;
        if let Some(request) = request_for(&self.graph.graph[idx], &self.config) {
            self.jobs.enqueue(id, request);
        }
        self.refresh_has_elements();
        id
    }

    pub fn add_text(&mut self, x: f64, y: f64, content: &str) -> NodeId {
        let node = factory::text(self.graph.fresh_id("text"), x, y, content);
        self.add_element(node)
    }

    pub fn add_shape(&mut self, shape_type: ShapeType, x: f64, y: f64) -> NodeId {
        let node = factory::shape(self.graph.fresh_id("shape"), shape_type, x, y);
        self.add_element(node)
    }

    pub fn add_image(&mut self, x: f64, y: f64, src: &str, is_client_logo: bool) -> NodeId {
        let node = factory::image(self.graph.fresh_id("image"), x, y, src, is_client_logo);
        self.add_element(node)
    }

    /// Place a placeholder for `identifier`. Invalid identifiers create
    /// nothing.
    pub fn add_placeholder(&mut self, identifier: &str, x: f64, y: f64) -> Option<NodeId> {
        let id = self.graph.fresh_id("placeholder");
        match create_placeholder(id, identifier, x, y, None, &self.config, &*self.measurer) {
            Ok(node) => {
                let text_family = node.is_text_bearing();
                let id = self.add_element(node);
                if text_family {
                    self.deferred.push(id);
                }
                Some(id)
            }
            Err(e) => {
                log::warn!("placeholder not created: {e}");
                None
            }
        }
    }

    /// Destroy a node and everything under it.
    pub fn remove_element(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.graph.index_of(id) else {
            return false;
        };
        if idx == self.graph.root || Some(id) == self.background {
            return false;
        }
        if self.layout.group() == Some(id) {
            self.layout.reset();
        }
        if self.editor.editing() == Some(id) {
            self.editor.reset();
        }
        self.graph.remove_node(idx);
        if self.selection.target().is_some_and(|t| !self.graph.contains(t)) {
            self.selection.detach();
        }
        self.refresh_has_elements();
        true
    }

    /// Remove every element, keeping the background.
    pub fn clear_canvas(&mut self) {
        self.editor.reset();
        self.layout.reset();
        self.selection.detach();
        self.jobs.clear();
        self.deferred.clear();
        self.gesture = None;
        for idx in self.graph.top_level() {
            self.graph.remove_node(idx);
        }
        self.refresh_has_elements();
    }

    fn refresh_has_elements(&mut self) {
        self.has_elements = !self.graph.top_level().is_empty();
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Attach the handles to `id`. A laid-out child selects its group.
    pub fn select_shape(&mut self, id: NodeId) -> bool {
        let id = self.layout.owning_group(&self.graph, id).unwrap_or(id);
        let Some(node) = self.graph.get_by_id(id) else {
            return false;
        };
        let selectable = match node.kind {
            NodeKind::Group => true,
            NodeKind::Layer | NodeKind::Background => false,
            _ => node.selectable,
        };
        if !selectable {
            return false;
        }
        self.selection.attach(id, &node.kind);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.detach();
    }

    /// Route a click: empty stage or background clears the selection, a node
    /// selects it, an attached handle is ignored. In layout mode clicks pick
    /// nodes for the layout or dissolve the group when outside it.
    pub fn handle_click(&mut self, x: f64, y: f64) -> Option<NodeId> {
        if self.editor.is_active() {
            self.editor.commit(&mut self.graph, &self.config, &*self.measurer);
        }
        if self.on_attached_handle(x, y) {
            return self.selection.target();
        }
        let hit = hit_test(&self.graph, x, y);
        match self.layout.state() {
            LayoutState::Selecting => {
                if let Some(id) = hit {
                    self.layout.toggle_selection(&self.graph, id);
                }
                self.selection.detach();
            }
            LayoutState::LaidOut => {
                if self.layout.click_outside(&mut self.graph, hit) {
                    self.selection.detach();
                } else if let Some(id) = hit {
                    self.select_shape(id);
                }
            }
            LayoutState::Inactive => match hit {
                Some(id) => {
                    self.select_shape(id);
                }
                None => self.selection.detach(),
            },
        }
        self.selection.target()
    }

    /// Double-click: escape a laid-out child, or start editing text.
    pub fn handle_double_click(&mut self, x: f64, y: f64) -> DoubleClickOutcome {
        let Some(hit) = hit_test(&self.graph, x, y) else {
            return DoubleClickOutcome::Nothing;
        };
        if self.layout.state() == LayoutState::LaidOut {
            if self.layout.escape_to_child(&mut self.graph, hit) {
                self.select_shape(hit);
                return DoubleClickOutcome::Escaped(hit);
            }
            return DoubleClickOutcome::Nothing;
        }
        match self.begin_text_edit(hit) {
            Some(overlay) => DoubleClickOutcome::EditText(overlay),
            None => DoubleClickOutcome::Nothing,
        }
    }

    fn on_attached_handle(&self, x: f64, y: f64) -> bool {
        self.selection.hit_handle(&self.graph, x, y).is_some()
    }

    /// Feed a raw input event. Returns `true` when the scene or selection
    /// may have changed.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.pointer_down(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { .. } => self.pointer_up(),
            InputEvent::Click { x, y, .. } => {
                self.handle_click(*x, *y);
                true
            }
            InputEvent::DoubleClick { x, y } => {
                self.handle_double_click(*x, *y) != DoubleClickOutcome::Nothing
            }
            InputEvent::Key { key, .. } => self.handle_key(key),
        }
    }

    fn handle_key(&mut self, key: &str) -> bool {
        match key {
            "Escape" => {
                if self.editor.is_active() {
                    self.editor.cancel(&mut self.graph)
                } else if self.layout.state() != LayoutState::Inactive {
                    self.cancel_list_layout()
                } else {
                    let had = self.selection.target().is_some();
                    self.selection.detach();
                    had
                }
            }
            "Delete" | "Backspace" if !self.editor.is_active() => {
                match self.selection.target() {
                    Some(id) => self.remove_element(id),
                    None => false,
                }
            }
            _ => false,
        }
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    fn pointer_down(&mut self, pt: Point) -> bool {
        self.gesture = None;
        if let Some(target) = self.selection.target()
            && let Some(anchor) = self.selection.hit_handle(&self.graph, pt.x, pt.y)
            && let Some(node) = self.graph.get_by_id_mut(target)
            && !matches!(node.kind, NodeKind::Group)
        {
            node.bake_scale();
            self.gesture = Some(Gesture::Transform {
                id: target,
                anchor,
                start: pt,
                origin: Geometry {
                    x: node.x,
                    y: node.y,
                    width: node.width,
                    height: node.height,
                    rotation: node.rotation,
                },
            });
            return true;
        }
        let Some(hit) = hit_test(&self.graph, pt.x, pt.y) else {
            return false;
        };
        let id = self.layout.owning_group(&self.graph, hit).unwrap_or(hit);
        let draggable = self.graph.get_by_id(id).is_some_and(|n| n.draggable);
        if draggable && self.layout.state() != LayoutState::Selecting {
            self.gesture = Some(Gesture::Drag { id, last: pt });
        }
        false
    }

    fn pointer_move(&mut self, pt: Point) -> bool {
        match self.gesture {
            Some(Gesture::Drag { id, last }) => {
                let delta = pt - last;
                self.gesture = Some(Gesture::Drag { id, last: pt });
                self.move_node(id, delta.x, delta.y)
            }
            Some(Gesture::Transform {
                id,
                anchor,
                start,
                origin,
            }) => {
                let Some(idx) = self.graph.index_of(id) else {
                    self.gesture = None;
                    return false;
                };
                let offset = self.graph.parent_offset(idx);
                let node = &mut self.graph.graph[idx];
                if anchor == HandleAnchor::Rotater {
                    rotate_to_pointer(node, origin, offset, pt);
                } else {
                    resize_from_handle(node, origin, anchor, pt - start);
                }
                true
            }
            None => false,
        }
    }

    fn pointer_up(&mut self) -> bool {
        match self.gesture.take() {
            Some(Gesture::Transform { id, .. }) => self.transform_end(id, 1.0, 1.0),
            Some(Gesture::Drag { .. }) => true,
            None => false,
        }
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Move a node by a delta. Laid-out children move their whole group.
    pub fn move_node(&mut self, id: NodeId, dx: f64, dy: f64) -> bool {
        let target = self.layout.owning_group(&self.graph, id).unwrap_or(id);
        if Some(target) == self.layout.group() {
            return self.layout.drag_group(&mut self.graph, dx, dy);
        }
        match self.graph.get_by_id_mut(target) {
            Some(node) if node.draggable => {
                node.x += dx;
                node.y += dy;
                true
            }
            _ => false,
        }
    }

    /// Finish a resize: fold the live scale (times `sx`/`sy`) into the size.
    /// Image placeholders refit their existing raster; nothing is
    /// regenerated.
    pub fn transform_end(&mut self, id: NodeId, sx: f64, sy: f64) -> bool {
        let min_text = self.config.min_text_size();
        let Some(node) = self.graph.get_by_id_mut(id) else {
            return false;
        };
        if !(sx.is_finite() && sy.is_finite()) || matches!(node.kind, NodeKind::Group) {
            return false;
        }
        apply_resize(node, sx, sy, min_text);
        refit_raster(node, &self.config);
        true
    }

    /// Resize to an explicit box.
    pub fn resize_node(&mut self, id: NodeId, width: f64, height: f64) -> bool {
        let Some(node) = self.graph.get_by_id(id) else {
            return false;
        };
        let ratio = |target: f64, current: f64| {
            if current > 0.0 && target >= 0.0 { target / current } else { 1.0 }
        };
        let (sx, sy) = (ratio(width, node.width), ratio(height, node.height));
        self.transform_end(id, sx, sy)
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        let Some(node) = self.graph.get_by_id_mut(id) else {
            return false;
        };
        if !node.set_text(text) {
            return false;
        }
        auto_resize(node, &self.config, &*self.measurer)
    }

    /// Change a text style and re-run auto-size.
    pub fn set_text_style(&mut self, id: NodeId, change: &StyleChange) -> bool {
        let Some(node) = self.graph.get_by_id_mut(id) else {
            return false;
        };
        let props = match &mut node.kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Placeholder(p) => p.text_state_mut(),
            _ => None,
        };
        if !props.is_some_and(|p| change.apply(p)) {
            return false;
        }
        auto_resize(node, &self.config, &*self.measurer);
        true
    }

    pub fn set_shape_style(&mut self, id: NodeId, fill: Option<String>, stroke: Option<String>, stroke_width: Option<f64>) -> bool {
        let Some(NodeKind::Shape(shape)) = self.graph.get_by_id_mut(id).map(|n| &mut n.kind) else {
            return false;
        };
        if let Some(fill) = fill
            && shape.shape_type == ShapeType::Rectangle
        {
            shape.fill = Some(fill);
        }
        if let Some(stroke) = stroke {
            shape.stroke = stroke;
        }
        if let Some(width) = stroke_width.filter(|w| *w >= 0.0) {
            shape.stroke_width = width;
        }
        true
    }

    /// Lock or unlock a node against dragging. A laid-out child keeps the
    /// new flag for when its group dissolves.
    pub fn set_draggable(&mut self, id: NodeId, draggable: bool) -> bool {
        if self.layout.set_draggable_outside_group(id, draggable) {
            return true;
        }
        match self.graph.get_by_id_mut(id) {
            Some(node) if node.node_type().is_some() => {
                node.draggable = draggable;
                true
            }
            _ => false,
        }
    }

    pub fn bring_to_front(&mut self, id: NodeId) -> bool {
        self.graph.index_of(id).is_some_and(|idx| self.graph.bring_to_front(idx))
    }

    pub fn send_to_back(&mut self, id: NodeId) -> bool {
        self.graph.index_of(id).is_some_and(|idx| self.graph.send_to_back(idx))
    }

    /// Copy a top-level node next to the original. Decoded rasters are
    /// shared, not regenerated.
    pub fn duplicate_node(&mut self, id: NodeId) -> Option<NodeId> {
        let idx = self.graph.index_of(id)?;
        let original = self.graph.get(idx)?;
        original.node_type()?;
        let (x, y) = self.graph.absolute_position(idx);
        let mut copy = original.clone();
        copy.id = self.graph.fresh_id(copy.kind.id_prefix());
        copy.x = x + DUPLICATE_OFFSET;
        copy.y = y + DUPLICATE_OFFSET;
        copy.draggable = true;
        Some(self.add_element(copy))
    }

    // ─── Text editing ────────────────────────────────────────────────────

    pub fn begin_text_edit(&mut self, id: NodeId) -> Option<OverlayDescriptor> {
        let overlay = self.editor.begin(&mut self.graph, id, &self.config, &*self.measurer)?;
        self.select_shape(id);
        Some(overlay)
    }

    pub fn text_input(&mut self, text: &str) -> bool {
        self.editor.input(&mut self.graph, text, &self.config, &*self.measurer)
    }

    pub fn text_edit_style(&mut self, change: &StyleChange) -> bool {
        self.editor.apply_style(&mut self.graph, change, &self.config, &*self.measurer)
    }

    pub fn text_overlay(&self) -> Option<OverlayDescriptor> {
        self.editor.overlay(&self.graph)
    }

    pub fn commit_text_edit(&mut self) -> bool {
        self.editor.commit(&mut self.graph, &self.config, &*self.measurer)
    }

    pub fn cancel_text_edit(&mut self) -> bool {
        self.editor.cancel(&mut self.graph)
    }

    // ─── List layout ─────────────────────────────────────────────────────

    pub fn toggle_list_mode(&mut self) -> LayoutState {
        self.selection.detach();
        self.layout.toggle_mode(&mut self.graph)
    }

    pub fn toggle_layout_selection(&mut self, id: NodeId) -> bool {
        self.layout.toggle_selection(&self.graph, id)
    }

    /// Lay out the nodes picked in selecting mode. `separator` defaults to
    /// the configured gap.
    pub fn apply_list_layout(&mut self, axis: LayoutAxis, separator: Option<f64>) -> bool {
        let ids = self.layout.selected().to_vec();
        self.apply_layout_to(&ids, axis, separator)
    }

    pub fn apply_layout_to(&mut self, ids: &[NodeId], axis: LayoutAxis, separator: Option<f64>) -> bool {
        let separator = separator.unwrap_or(self.config.default_separator);
        if !self
            .layout
            .apply_layout(&mut self.graph, ids, axis, separator, &*self.measurer)
        {
            return false;
        }
        if let Some(group) = self.layout.group() {
            self.select_shape(group);
        }
        true
    }

    pub fn undo_last_layout(&mut self) -> bool {
        let group = self.layout.group();
        let undone = self.layout.undo_last_layout(&mut self.graph);
        if undone && group.is_some() && self.selection.target() == group {
            self.selection.detach();
        }
        undone
    }

    pub fn cancel_list_layout(&mut self) -> bool {
        if self.layout.group().is_some() && self.selection.target() == self.layout.group() {
            self.selection.detach();
        }
        self.layout.cancel_list_layout(&mut self.graph)
    }

    // ─── Raster jobs ─────────────────────────────────────────────────────

    pub fn pending_jobs(&self) -> Vec<RasterJob> {
        self.jobs.pending().cloned().collect()
    }

    /// Hand queued jobs to the host for asynchronous execution.
    pub fn take_jobs(&mut self) -> Vec<RasterJob> {
        self.jobs.take()
    }

    pub fn complete_job(&mut self, job: JobId, node: NodeId, outcome: JobOutcome) -> bool {
        self.jobs.complete(&mut self.graph, &self.config, job, node, outcome)
    }

    pub fn run_pending_jobs(&mut self, generator: &mut dyn RasterGenerator) -> usize {
        self.jobs.run_pending(&mut self.graph, &self.config, generator)
    }

    /// Throw away an image placeholder's raster and queue regeneration.
    pub fn invalidate(&mut self, id: NodeId) -> bool {
        let Some(node) = self.graph.get_by_id_mut(id) else {
            return false;
        };
        let NodeKind::Placeholder(p) = &mut node.kind else {
            return false;
        };
        if p.image_kind().is_none() {
            return false;
        }
        p.visual = PlaceholderVisual::Pending;
        match request_for(node, &self.config) {
            Some(request) => {
                self.jobs.enqueue(id, request);
                true
            }
            None => false,
        }
    }

    /// Re-measure text placeholders and auto-width text queued since the
    /// last pass (fonts may have finished loading in between). Nodes removed
    /// meanwhile are skipped.
    pub fn run_deferred_measurements(&mut self) -> usize {
        let mut measured = 0;
        for id in std::mem::take(&mut self.deferred) {
            let Some(node) = self.graph.get_by_id_mut(id) else {
                continue;
            };
            let auto = match &node.kind {
                NodeKind::Placeholder(p) => p.text_state().is_some(),
                NodeKind::Text(t) => t.auto_width,
                _ => false,
            };
            if auto && auto_resize(node, &self.config, &*self.measurer) {
                measured += 1;
            }
        }
        measured
    }

    // ─── Documents ───────────────────────────────────────────────────────

    pub fn serialize_canvas_state(&self) -> DocumentState {
        let mut doc = serialize_scene(&self.graph, self.dimensions.config(), now_timestamp());
        // laid-out children are saved as they will be once the group dissolves
        for rec in &mut doc.nodes {
            if let Some(id) = rec.get("id").and_then(|v| v.as_str())
                && let Some(draggable) = self.layout.draggable_outside_group(NodeId::intern(id))
            {
                rec.insert("draggable".into(), draggable.into());
            }
        }
        doc
    }

    /// Replace the scene with `doc`. The page is applied first so positions
    /// read against the restored DPI. Returns the number of nodes loaded.
    pub fn deserialize_canvas_state(&mut self, doc: &DocumentState) -> usize {
        self.clear_canvas();
        let canvas = doc.canvas.clone();
        self.update_dimensions(|d| d.apply_config(canvas));

        let mut count = 0;
        for node in deserialize_nodes(doc, &self.config, &*self.measurer) {
            let deferred = matches!(&node.kind, NodeKind::Placeholder(p) if p.text_state().is_some());
            let id = self.attach(node);
            if deferred {
                self.deferred.push(id);
            }
            count += 1;
        }
        log::debug!("loaded {count} of {} node records", doc.nodes.len());
        count
    }

    pub fn save_to(&self, store: &mut dyn DocumentStore, document_id: &str) -> Result<()> {
        store.save(document_id, &self.serialize_canvas_state())
    }

    pub fn load_from(&mut self, store: &dyn DocumentStore, document_id: &str) -> Result<usize> {
        let doc = store.load(document_id)?;
        Ok(self.deserialize_canvas_state(&doc))
    }

    /// Handle positions for the host to draw.
    pub fn handle_positions(&self) -> Vec<(HandleAnchor, Point)> {
        self.selection.handle_positions(&self.graph)
    }

    /// Bounding box of the current selection.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        let idx: NodeIndex = self.graph.index_of(self.selection.target()?)?;
        Some(self.graph.client_rect(idx))
    }
}

/// Live resize from a handle drag. `delta` is the pointer movement since
/// the gesture started, in stage pixels.
fn resize_from_handle(node: &mut Node, origin: Geometry, anchor: HandleAnchor, delta: Vec2) {
    let (sin, cos) = origin.rotation.to_radians().sin_cos();
    // into the node's rotated frame
    let lx = delta.x * cos + delta.y * sin;
    let ly = -delta.x * sin + delta.y * cos;

    let (left, top, right, bottom) = anchor.edges();
    let mut width = origin.width;
    let mut height = origin.height;
    if right {
        width += lx;
    }
    if left {
        width -= lx;
    }
    if bottom {
        height += ly;
    }
    if top {
        height -= ly;
    }
    if left || right {
        width = width.max(MIN_GESTURE_SIZE);
    }
    if top || bottom {
        height = height.max(MIN_GESTURE_SIZE);
    }

    let shift_x = if left { origin.width - width } else { 0.0 };
    let shift_y = if top { origin.height - height } else { 0.0 };
    node.scale_x = if origin.width > 0.0 { width / origin.width } else { 1.0 };
    node.scale_y = if origin.height > 0.0 { height / origin.height } else { 1.0 };
    node.x = origin.x + shift_x * cos - shift_y * sin;
    node.y = origin.y + shift_x * sin + shift_y * cos;
}

/// Live rotation about the node's centre so the handle points at `pt`.
fn rotate_to_pointer(node: &mut Node, origin: Geometry, parent_offset: (f64, f64), pt: Point) {
    let local_center = node.local_rect().center();
    let start = Affine::translate((parent_offset.0 + origin.x, parent_offset.1 + origin.y))
        * Affine::rotate(origin.rotation.to_radians());
    let center = start * local_center;

    let angle = (pt.y - center.y).atan2(pt.x - center.x).to_degrees() + 90.0;
    let rotation = angle.rem_euclid(360.0);
    let rotated = Affine::rotate(rotation.to_radians()) * local_center;

    node.rotation = rotation;
    node.x = center.x - rotated.x - parent_offset.0;
    node.y = center.y - rotated.y - parent_offset.1;
}

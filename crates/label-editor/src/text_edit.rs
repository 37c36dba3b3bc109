//! In-place text editing with live auto-resize.
//!
//! A session snapshots the node's text and style when it begins, so cancel
//! restores it exactly. Every keystroke and style toggle re-runs the same
//! auto-size rule the canvas uses after style changes.

use label_core::config::EditorConfig;
use label_core::id::NodeId;
use label_core::metrics::{TextMeasurer, auto_size, wrapped_height};
use label_core::model::*;
use label_core::placeholder::refit_text_placeholder;
use serde::Serialize;

/// One style mutation on a text-bearing node.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleChange {
    FontSize(f64),
    FontFamily(String),
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Align(TextAlign),
    Fill(String),
    Wrap(WrapMode),
    AutoWidth(bool),
}

impl StyleChange {
    /// Apply to text props. Returns `false` when nothing changed.
    pub fn apply(&self, props: &mut TextProps) -> bool {
        let before = props.clone();
        match self {
            Self::FontSize(size) if *size > 0.0 => props.font.size = *size,
            Self::FontSize(_) => {}
            Self::FontFamily(family) => props.font.family = family.clone(),
            Self::Bold(on) => props.font.style.bold = *on,
            Self::Italic(on) => props.font.style.italic = *on,
            Self::Underline(on) => props.underline = *on,
            Self::Align(align) => props.align = *align,
            Self::Fill(fill) => props.fill = fill.clone(),
            Self::Wrap(wrap) => props.wrap = *wrap,
            Self::AutoWidth(on) => props.auto_width = *on,
        }
        *props != before
    }
}

fn text_props_mut(node: &mut Node) -> Option<&mut TextProps> {
    match &mut node.kind {
        NodeKind::Text(t) => Some(t),
        NodeKind::Placeholder(p) => p.text_state_mut(),
        _ => None,
    }
}

fn text_props(node: &Node) -> Option<&TextProps> {
    match &node.kind {
        NodeKind::Text(t) => Some(t),
        NodeKind::Placeholder(p) => p.text_state(),
        _ => None,
    }
}

/// Re-measure a text-bearing node after a content or style change.
///
/// Placeholders and auto-width text get a tight width; fixed-width text
/// keeps its width and re-wraps its height. Both clamp to the minimum box.
pub fn auto_resize(node: &mut Node, config: &EditorConfig, measurer: &dyn TextMeasurer) -> bool {
    if matches!(node.kind, NodeKind::Placeholder(_)) {
        return refit_text_placeholder(node, config, measurer);
    }
    let NodeKind::Text(t) = &node.kind else {
        return false;
    };
    let (min_w, min_h) = config.min_text_size();
    let (width, height) = if t.auto_width {
        auto_size(&t.text, &t.font, t.wrap, t.padding, (min_w, min_h), measurer)
    } else {
        let width = node.width.max(min_w);
        let height = wrapped_height(&t.text, width, t.wrap, &t.font, t.padding, measurer).max(min_h);
        (width, height)
    };
    node.width = width;
    node.height = height;
    node.scale_x = 1.0;
    node.scale_y = 1.0;
    true
}

/// What the host needs to lay its editing surface over the node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayDescriptor {
    pub id: NodeId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    /// CSS `font` shorthand.
    pub font: String,
    pub fill: String,
    pub align: TextAlign,
    pub padding: f64,
    pub underline: bool,
}

#[derive(Debug, Clone)]
struct Session {
    id: NodeId,
    text: String,
    props: TextProps,
    width: f64,
    height: f64,
}

#[derive(Debug, Default)]
pub struct TextEditor {
    session: Option<Session>,
}

impl TextEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Start editing `id`. An active session on another node is committed
    /// first. Returns `None` for nodes without text.
    pub fn begin(
        &mut self,
        graph: &mut SceneGraph,
        id: NodeId,
        config: &EditorConfig,
        measurer: &dyn TextMeasurer,
    ) -> Option<OverlayDescriptor> {
        if self.editing().is_some_and(|current| current != id) {
            self.commit(graph, config, measurer);
        }
        let idx = graph.index_of(id)?;
        let node = graph.get(idx)?;
        let props = text_props(node)?.clone();
        self.session = Some(Session {
            id,
            text: props.text.clone(),
            props,
            width: node.width,
            height: node.height,
        });
        log::debug!("text edit started on {id}");
        self.overlay(graph)
    }

    /// Current overlay geometry, tracking live resizes.
    pub fn overlay(&self, graph: &SceneGraph) -> Option<OverlayDescriptor> {
        let session = self.session.as_ref()?;
        let idx = graph.index_of(session.id)?;
        let node = graph.get(idx)?;
        let props = text_props(node)?;
        let (x, y) = graph.absolute_position(idx);
        Some(OverlayDescriptor {
            id: session.id,
            text: props.text.clone(),
            x,
            y,
            width: node.width * node.scale_x,
            height: node.height * node.scale_y,
            rotation: node.rotation,
            font: props.font.css(),
            fill: props.fill.clone(),
            align: props.align,
            padding: props.padding,
            underline: props.underline,
        })
    }

    /// Live text update from the overlay.
    pub fn input(
        &mut self,
        graph: &mut SceneGraph,
        text: &str,
        config: &EditorConfig,
        measurer: &dyn TextMeasurer,
    ) -> bool {
        let Some(node) = self.live_node(graph) else {
            return false;
        };
        if !node.set_text(text) {
            return false;
        }
        auto_resize(node, config, measurer)
    }

    pub fn apply_style(
        &mut self,
        graph: &mut SceneGraph,
        change: &StyleChange,
        config: &EditorConfig,
        measurer: &dyn TextMeasurer,
    ) -> bool {
        let Some(node) = self.live_node(graph) else {
            return false;
        };
        let changed = text_props_mut(node).is_some_and(|props| change.apply(props));
        if changed {
            auto_resize(node, config, measurer);
        }
        changed
    }

    /// Keep the edited text. Text edited down to nothing gets its original
    /// content back and is measured again.
    pub fn commit(&mut self, graph: &mut SceneGraph, config: &EditorConfig, measurer: &dyn TextMeasurer) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let Some(node) = graph.get_by_id_mut(session.id) else {
            log::debug!("text edit on {} ended after the node was removed", session.id);
            return false;
        };
        if node.text().is_some_and(|t| t.trim().is_empty()) {
            node.set_text(&session.text);
            auto_resize(node, config, measurer);
        }
        true
    }

    /// Restore text, style, and size from the snapshot.
    pub fn cancel(&mut self, graph: &mut SceneGraph) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let Some(node) = graph.get_by_id_mut(session.id) else {
            return false;
        };
        if let Some(props) = text_props_mut(node) {
            *props = session.props;
        }
        node.width = session.width;
        node.height = session.height;
        true
    }

    /// Drop the session without touching the scene (the scene was replaced).
    pub fn reset(&mut self) {
        self.session = None;
    }

    fn live_node<'g>(&mut self, graph: &'g mut SceneGraph) -> Option<&'g mut Node> {
        let id = self.session.as_ref()?.id;
        let node = graph.get_by_id_mut(id);
        if node.is_none() {
            log::debug!("text edit target {id} is gone, ending session");
            self.session = None;
        }
        node
    }
}

//! Scene model for label documents.
//!
//! The scene is an arena: a `StableDiGraph` of [`Node`] values keyed by
//! interned [`NodeId`], with parent→child edges and an explicit child order
//! per parent. The root is the drawable layer; the background rectangle is
//! its first child. Ephemeral list-layout groups are ordinary `Group` nodes
//! that never reach the serializer as containers.
//!
//! Positions are parent-relative pixels. `scale_x`/`scale_y` only differ
//! from 1 during a live resize gesture; [`Node::bake_scale`] folds them back
//! into `width`/`height`.

use crate::id::NodeId;
use crate::placeholder::PlaceholderProps;
use kurbo::{Affine, Rect};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::collections::HashMap;

// ─── Font / Text ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub const NORMAL: Self = Self {
        bold: false,
        italic: false,
    };

    /// Parse a CSS-ish style string (`"bold"`, `"italic bold"`, `"normal"`).
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        Self {
            bold: lower.contains("bold") || lower.contains("700"),
            italic: lower.contains("italic"),
        }
    }

    pub fn as_css(&self) -> &'static str {
        match (self.italic, self.bold) {
            (false, false) => "normal",
            (false, true) => "bold",
            (true, false) => "italic",
            (true, true) => "italic bold",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub style: FontStyle,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Calibri".into(),
            size: 20.0,
            style: FontStyle::NORMAL,
        }
    }
}

impl FontSpec {
    /// CSS `font` shorthand, e.g. `italic bold 20px Calibri`.
    pub fn css(&self) -> String {
        let style = self.style.as_css();
        if style == "normal" {
            format!("{}px {}", self.size, self.family)
        } else {
            format!("{style} {}px {}", self.size, self.family)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    #[default]
    Word,
    Char,
    None,
}

impl WrapMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "word" => Some(Self::Word),
            "char" => Some(Self::Char),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Char => "char",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextProps {
    pub text: String,
    pub font: FontSpec,
    pub fill: String,
    pub align: TextAlign,
    pub padding: f64,
    pub wrap: WrapMode,
    pub underline: bool,
    /// When set, width follows content instead of the stored value.
    pub auto_width: bool,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: FontSpec::default(),
            fill: "#000000".into(),
            align: TextAlign::Left,
            padding: 4.0,
            wrap: WrapMode::Word,
            underline: false,
            auto_width: false,
        }
    }
}

// ─── Image ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageProps {
    /// URL or `data:` URI.
    pub src: String,
    /// Logos scale to fit (aspect preserved) instead of stretching.
    pub is_client_logo: bool,
    /// Decoded pixel size, known once the decode job completes.
    pub natural_size: Option<(f64, f64)>,
}

// ─── Shape ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeType {
    Rectangle,
    OutlinedRectangle,
    Line,
}

impl ShapeType {
    /// Accepts the canonical names plus the spellings older documents used.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "rectangle" | "rect" | "filled-rectangle" | "filledrectangle" => Some(Self::Rectangle),
            "outlined-rectangle" | "outlinedrectangle" | "outline" | "outlined-rect" => {
                Some(Self::OutlinedRectangle)
            }
            "line" => Some(Self::Line),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::OutlinedRectangle => "outlined-rectangle",
            Self::Line => "line",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProps {
    pub shape_type: ShapeType,
    pub fill: Option<String>,
    pub stroke: String,
    pub stroke_width: f64,
    /// Line geometry as `[x1, y1, x2, y2]`, local to the node origin.
    pub points: SmallVec<[f64; 4]>,
}

impl ShapeProps {
    /// End point of a line relative to its start.
    pub fn line_end(&self) -> (f64, f64) {
        match self.points.as_slice() {
            [x1, y1, x2, y2, ..] => (x2 - x1, y2 - y1),
            _ => (0.0, 0.0),
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Serialized discriminator. Only these four kinds are ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Text,
    Image,
    Shape,
    Placeholder,
}

impl NodeType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "shape" => Some(Self::Shape),
            "placeholder" => Some(Self::Placeholder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Shape => "shape",
            Self::Placeholder => "placeholder",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The drawable layer (scene root).
    Layer,
    /// Canvas-sized backdrop. Never selected, never serialized.
    Background,
    /// Ephemeral list-layout container.
    Group,
    Text(TextProps),
    Image(ImageProps),
    Shape(ShapeProps),
    Placeholder(PlaceholderProps),
}

impl NodeKind {
    pub fn node_type(&self) -> Option<NodeType> {
        match self {
            Self::Text(_) => Some(NodeType::Text),
            Self::Image(_) => Some(NodeType::Image),
            Self::Shape(_) => Some(NodeType::Shape),
            Self::Placeholder(_) => Some(NodeType::Placeholder),
            Self::Layer | Self::Background | Self::Group => None,
        }
    }

    /// ID prefix for freshly created nodes of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::Background => "background",
            Self::Group => "group",
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Shape(_) => "shape",
            Self::Placeholder(_) => "placeholder",
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Self::Shape(s) if s.shape_type == ShapeType::Line)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub draggable: bool,
    pub selectable: bool,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            draggable: true,
            selectable: true,
        }
    }

    pub fn node_type(&self) -> Option<NodeType> {
        self.kind.node_type()
    }

    /// Text content for text nodes and text-family placeholders.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(t) => Some(&t.text),
            NodeKind::Placeholder(p) => p.text_state().map(|s| s.text.as_str()),
            _ => None,
        }
    }

    /// Replace text content. Returns `false` for nodes without text.
    pub fn set_text(&mut self, text: &str) -> bool {
        match &mut self.kind {
            NodeKind::Text(t) => {
                t.text = text.to_string();
                true
            }
            NodeKind::Placeholder(p) => match p.text_state_mut() {
                Some(s) => {
                    s.text = text.to_string();
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    pub fn is_text_bearing(&self) -> bool {
        self.text().is_some()
    }

    /// Parent-relative transform: translate · rotate · scale.
    pub fn local_transform(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Untransformed extent in the node's own coordinate space.
    pub fn local_rect(&self) -> Rect {
        match &self.kind {
            NodeKind::Shape(s) if s.shape_type == ShapeType::Line => {
                let (ex, ey) = s.line_end();
                let half = s.stroke_width / 2.0;
                Rect::new(0.0, 0.0, ex, ey)
                    .abs()
                    .inflate(half, half)
            }
            _ => Rect::new(0.0, 0.0, self.width.max(0.0), self.height.max(0.0)),
        }
    }

    /// Fold a live resize scale into width/height and reset scale to 1.
    ///
    /// Lines keep their start at the origin; only the end point scales and
    /// the points are rewritten.
    pub fn bake_scale(&mut self) {
        let (sx, sy) = (self.scale_x, self.scale_y);
        if sx == 1.0 && sy == 1.0 {
            return;
        }
        match &mut self.kind {
            NodeKind::Shape(s) if s.shape_type == ShapeType::Line => {
                let (ex, ey) = s.line_end();
                let (ex, ey) = (ex * sx, ey * sy);
                s.points = smallvec![0.0, 0.0, ex, ey];
                self.width = ex.abs();
                self.height = ey.abs();
            }
            _ => {
                self.width = (self.width * sx).abs();
                self.height = (self.height * sy).abs();
            }
        }
        self.scale_x = 1.0;
        self.scale_y = 1.0;
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Axis-aligned box in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::from(self.to_rect().union(other.to_rect()))
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        let r = r.abs();
        Bounds::new(r.x0, r.y0, r.width(), r.height())
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// Arena of scene nodes. Edges go parent → child; `order` keeps paint order.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub graph: StableDiGraph<Node, ()>,
    /// The drawable layer.
    pub root: NodeIndex,
    id_index: HashMap<NodeId, NodeIndex>,
    order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl SceneGraph {
    /// Create an empty scene: a layer with no children.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let mut layer = Node::new(NodeId::intern("layer"), NodeKind::Layer);
        layer.draggable = false;
        layer.selectable = false;
        let root = graph.add_node(layer);

        let mut id_index = HashMap::new();
        id_index.insert(NodeId::intern("layer"), root);

        Self {
            graph,
            root,
            id_index,
            order: HashMap::new(),
        }
    }

    /// An ID with `prefix` that no attached node uses.
    pub fn fresh_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::with_prefix(prefix);
            if !self.id_index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Add `node` as the last child of `parent`. A duplicate ID is replaced
    /// with a fresh one so IDs stay unique within the scene.
    pub fn add_node(&mut self, parent: NodeIndex, mut node: Node) -> NodeIndex {
        if self.id_index.contains_key(&node.id) {
            let fresh = self.fresh_id(node.kind.id_prefix());
            log::debug!("id {} already in scene, reassigned to {fresh}", node.id);
            node.id = fresh;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.order.entry(parent).or_default().push(idx);
        self.id_index.insert(id, idx);
        idx
    }

    /// Remove a node and its whole subtree. Returns the removed node.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<Node> {
        if idx == self.root {
            return None;
        }
        for child in self.children(idx) {
            self.remove_node(child);
        }
        if let Some(parent) = self.parent(idx)
            && let Some(siblings) = self.order.get_mut(&parent)
        {
            siblings.retain(|&s| s != idx);
        }
        self.order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
        }
        removed
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.graph.node_weight_mut(idx)
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let idx = self.id_index.get(&id).copied()?;
        self.graph.node_weight_mut(idx)
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// Whether `id` is still attached to this scene.
    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in paint order (first = bottom).
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.order.get(&idx).cloned().unwrap_or_default()
    }

    /// Move `child` to the end of `new_parent`'s children.
    pub fn reparent_node(&mut self, child: NodeIndex, new_parent: NodeIndex) {
        if let Some(old_parent) = self.parent(child) {
            if let Some(edge) = self.graph.find_edge(old_parent, child) {
                self.graph.remove_edge(edge);
            }
            if let Some(siblings) = self.order.get_mut(&old_parent) {
                siblings.retain(|&s| s != child);
            }
        }
        self.graph.add_edge(new_parent, child, ());
        self.order.entry(new_parent).or_default().push(child);
    }

    /// Insert `child` at `position` among `parent`'s children.
    pub fn move_to_position(&mut self, child: NodeIndex, position: usize) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let Some(siblings) = self.order.get_mut(&parent) else {
            return false;
        };
        let Some(from) = siblings.iter().position(|&s| s == child) else {
            return false;
        };
        let to = position.min(siblings.len() - 1);
        if from == to {
            return false;
        }
        let node = siblings.remove(from);
        siblings.insert(to, node);
        true
    }

    /// Move a child to the front of z-order (last child).
    pub fn bring_to_front(&mut self, child: NodeIndex) -> bool {
        self.move_to_position(child, usize::MAX)
    }

    /// Move a child to the back of z-order, above the background if any.
    pub fn send_to_back(&mut self, child: NodeIndex) -> bool {
        let floor = self
            .parent(child)
            .and_then(|p| self.order.get(&p))
            .and_then(|sibs| sibs.first())
            .and_then(|first| self.graph.node_weight(*first))
            .map(|n| usize::from(matches!(n.kind, NodeKind::Background)))
            .unwrap_or(0);
        self.move_to_position(child, floor)
    }

    /// Top-level children of the layer, background excluded.
    pub fn top_level(&self) -> Vec<NodeIndex> {
        self.children(self.root)
            .into_iter()
            .filter(|&idx| !matches!(self.graph[idx].kind, NodeKind::Background))
            .collect()
    }

    /// Translation of `idx`'s coordinate space origin in canvas pixels,
    /// i.e. the sum of its ancestors' positions.
    pub fn parent_offset(&self, idx: NodeIndex) -> (f64, f64) {
        let mut offset = (0.0, 0.0);
        let mut current = self.parent(idx);
        while let Some(p) = current {
            if p == self.root {
                break;
            }
            let node = &self.graph[p];
            offset.0 += node.x;
            offset.1 += node.y;
            current = self.parent(p);
        }
        offset
    }

    /// Absolute position of a node's origin.
    pub fn absolute_position(&self, idx: NodeIndex) -> (f64, f64) {
        let (ox, oy) = self.parent_offset(idx);
        let node = &self.graph[idx];
        (ox + node.x, oy + node.y)
    }

    /// Axis-aligned bounding box in canvas pixels, honoring rotation and
    /// scale. Groups report the union of their children.
    pub fn client_rect(&self, idx: NodeIndex) -> Bounds {
        let node = &self.graph[idx];
        if matches!(node.kind, NodeKind::Group | NodeKind::Layer) {
            return self
                .children(idx)
                .into_iter()
                .map(|c| self.client_rect(c))
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| {
                    let (x, y) = self.absolute_position(idx);
                    Bounds::new(x, y, 0.0, 0.0)
                });
        }
        let (ox, oy) = self.parent_offset(idx);
        let transform = Affine::translate((ox, oy)) * node.local_transform();
        Bounds::from(transform.transform_rect_bbox(node.local_rect()))
    }

    /// Iterate every attached node (layer included).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Number of attached nodes, layer excluded.
    pub fn len(&self) -> usize {
        self.graph.node_count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Node {
        let mut n = Node::new(
            NodeId::intern(id),
            NodeKind::Shape(ShapeProps {
                shape_type: ShapeType::Rectangle,
                fill: Some("#000000".into()),
                stroke: "#000000".into(),
                stroke_width: 2.0,
                points: SmallVec::new(),
            }),
        );
        n.x = x;
        n.y = y;
        n.width = w;
        n.height = h;
        n
    }

    #[test]
    fn scene_graph_basics() {
        let mut sg = SceneGraph::new();
        let idx = sg.add_node(sg.root, rect("box1", 0.0, 0.0, 100.0, 50.0));

        assert!(sg.contains(NodeId::intern("box1")));
        assert_eq!(sg.children(sg.root), vec![idx]);
        assert_eq!(sg.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_reassigned() {
        let mut sg = SceneGraph::new();
        sg.add_node(sg.root, rect("dup", 0.0, 0.0, 1.0, 1.0));
        let second = sg.add_node(sg.root, rect("dup", 0.0, 0.0, 1.0, 1.0));
        assert_ne!(sg.graph[second].id, NodeId::intern("dup"));
        assert_eq!(sg.len(), 2);
    }

    #[test]
    fn remove_takes_subtree() {
        let mut sg = SceneGraph::new();
        let mut group = Node::new(NodeId::intern("grp_remove"), NodeKind::Group);
        group.x = 10.0;
        let g = sg.add_node(sg.root, group);
        sg.add_node(g, rect("child_remove", 0.0, 0.0, 5.0, 5.0));

        sg.remove_node(g);
        assert!(!sg.contains(NodeId::intern("child_remove")));
        assert!(sg.is_empty());
    }

    #[test]
    fn reparent_keeps_order_and_offsets() {
        let mut sg = SceneGraph::new();
        let a = sg.add_node(sg.root, rect("rp_a", 15.0, 20.0, 10.0, 10.0));
        let mut group = Node::new(NodeId::intern("rp_group"), NodeKind::Group);
        group.x = 5.0;
        group.y = 5.0;
        let g = sg.add_node(sg.root, group);

        sg.reparent_node(a, g);
        sg.graph[a].x -= 5.0;
        sg.graph[a].y -= 5.0;

        assert_eq!(sg.children(sg.root), vec![g]);
        assert_eq!(sg.absolute_position(a), (15.0, 20.0));
        assert_eq!(sg.client_rect(g), Bounds::new(15.0, 20.0, 10.0, 10.0));
    }

    #[test]
    fn client_rect_honors_rotation() {
        let mut sg = SceneGraph::new();
        let mut n = rect("rot", 0.0, 0.0, 100.0, 20.0);
        n.rotation = 90.0;
        let idx = sg.add_node(sg.root, n);
        let b = sg.client_rect(idx);
        assert!((b.width - 20.0).abs() < 1e-9);
        assert!((b.height - 100.0).abs() < 1e-9);
        assert!((b.x + 20.0).abs() < 1e-9);
    }

    #[test]
    fn z_order_respects_background() {
        let mut sg = SceneGraph::new();
        let mut bg = Node::new(NodeId::intern("bg_z"), NodeKind::Background);
        bg.selectable = false;
        let bg = sg.add_node(sg.root, bg);
        let a = sg.add_node(sg.root, rect("z_a", 0.0, 0.0, 1.0, 1.0));
        let b = sg.add_node(sg.root, rect("z_b", 0.0, 0.0, 1.0, 1.0));

        assert!(sg.send_to_back(b));
        assert_eq!(sg.children(sg.root), vec![bg, b, a]);
        assert!(sg.bring_to_front(b));
        assert_eq!(sg.children(sg.root), vec![bg, a, b]);
        assert_eq!(sg.top_level(), vec![a, b]);
    }

    #[test]
    fn bake_scale_rewrites_line_endpoint() {
        let mut line = Node::new(
            NodeId::intern("line_bake"),
            NodeKind::Shape(ShapeProps {
                shape_type: ShapeType::Line,
                fill: None,
                stroke: "#000000".into(),
                stroke_width: 2.0,
                points: smallvec![0.0, 0.0, 100.0, 0.0],
            }),
        );
        line.width = 100.0;
        line.scale_x = 1.5;
        line.bake_scale();

        let NodeKind::Shape(s) = &line.kind else {
            panic!("expected shape");
        };
        assert_eq!(s.points.as_slice(), &[0.0, 0.0, 150.0, 0.0]);
        assert_eq!((line.scale_x, line.scale_y), (1.0, 1.0));
        assert_eq!(line.width, 150.0);
    }

    #[test]
    fn font_style_parsing() {
        assert_eq!(FontStyle::parse("italic bold").as_css(), "italic bold");
        assert_eq!(FontStyle::parse("BOLD").as_css(), "bold");
        assert_eq!(FontStyle::parse("").as_css(), "normal");
        assert_eq!(FontSpec::default().css(), "20px Calibri");
    }
}

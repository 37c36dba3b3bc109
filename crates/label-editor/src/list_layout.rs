//! List layout: arrange a selection into an aligned row or column.
//!
//! ```text
//!   Inactive ──toggle──▶ Selecting ──apply_layout──▶ LaidOut
//!      ▲                   ▲    │                      │
//!      └──toggle/cancel────┘    └◀── escape / click ───┘
//!                                    outside (ungroup)
//! ```
//!
//! Laying out wraps the nodes in an ephemeral `Group` so they drag as one.
//! The group lives only while `LaidOut`; leaving that state dissolves it and
//! writes absolute coordinates back to the children. One snapshot of the
//! pre-layout positions and texts is kept for undo; a new layout replaces it.

use label_core::NodeIndex;
use label_core::id::NodeId;
use label_core::metrics::{TextMeasurer, measure_wrapped};
use label_core::model::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutState {
    #[default]
    Inactive,
    Selecting,
    LaidOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutAxis {
    /// Left to right, tops aligned.
    Horizontal,
    /// Top to bottom, left edges aligned.
    Vertical,
}

impl LayoutAxis {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "horizontal" | "row" | "x" => Some(Self::Horizontal),
            "vertical" | "column" | "y" => Some(Self::Vertical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SnapshotEntry {
    id: NodeId,
    x: f64,
    y: f64,
    text: Option<String>,
}

#[derive(Debug, Default)]
pub struct ListLayout {
    state: LayoutState,
    selected: Vec<NodeId>,
    group: Option<NodeId>,
    /// Each child's `draggable` flag from before it joined the group.
    child_draggable: Vec<(NodeId, bool)>,
    snapshot: Option<Vec<SnapshotEntry>>,
}

impl ListLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn group(&self) -> Option<NodeId> {
        self.group
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Flag a laid-out child had before the layout pinned it to the group.
    pub fn draggable_outside_group(&self, id: NodeId) -> Option<bool> {
        self.child_draggable.iter().find(|(c, _)| *c == id).map(|(_, d)| *d)
    }

    pub(crate) fn set_draggable_outside_group(&mut self, id: NodeId, draggable: bool) -> bool {
        match self.child_draggable.iter_mut().find(|(c, _)| *c == id) {
            Some((_, saved)) => {
                *saved = draggable;
                true
            }
            None => false,
        }
    }

    /// Enter or leave layout mode. Leaving dissolves the group in place.
    pub fn toggle_mode(&mut self, graph: &mut SceneGraph) -> LayoutState {
        match self.state {
            LayoutState::Inactive => {
                self.state = LayoutState::Selecting;
                self.selected.clear();
            }
            LayoutState::Selecting | LayoutState::LaidOut => {
                self.cancel_list_layout(graph);
            }
        }
        self.state
    }

    /// Add or remove `id` from the tentative selection. Only top-level
    /// content nodes qualify, and only while selecting.
    pub fn toggle_selection(&mut self, graph: &SceneGraph, id: NodeId) -> bool {
        if self.state != LayoutState::Selecting {
            return false;
        }
        let Some(idx) = graph.index_of(id) else {
            return false;
        };
        let node = &graph.graph[idx];
        if graph.parent(idx) != Some(graph.root) || node.node_type().is_none() || !node.selectable {
            return false;
        }
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
        true
    }

    /// The group `id` belongs to, when it is a laid-out child.
    pub fn owning_group(&self, graph: &SceneGraph, id: NodeId) -> Option<NodeId> {
        let group = self.group?;
        let group_idx = graph.index_of(group)?;
        let idx = graph.index_of(id)?;
        (idx == group_idx || graph.parent(idx) == Some(group_idx)).then_some(group)
    }

    /// Arrange `ids` along `axis` with `separator` pixels between them and
    /// wrap them in a draggable group.
    ///
    /// Only content nodes on the layer or in the current group take part.
    /// Fails without touching anything when fewer than two qualify.
    pub fn apply_layout(
        &mut self,
        graph: &mut SceneGraph,
        ids: &[NodeId],
        axis: LayoutAxis,
        separator: f64,
        measurer: &dyn TextMeasurer,
    ) -> bool {
        let current_group = self.group.and_then(|g| graph.index_of(g));
        let mut unique: Vec<NodeId> = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(idx) = graph.index_of(*id) else {
                continue;
            };
            let parent = graph.parent(idx);
            let content = graph.graph[idx].node_type().is_some();
            if content
                && (parent == Some(graph.root) || parent.is_some() && parent == current_group)
                && !unique.contains(id)
            {
                unique.push(*id);
            }
        }
        if unique.len() < 2 {
            log::warn!("list layout needs at least two nodes, got {}", unique.len());
            return false;
        }

        // a previous group is dissolved first so every node is top-level
        self.dissolve_group(graph);

        let mut items: Vec<(NodeIndex, Bounds, (f64, f64))> = unique
            .iter()
            .filter_map(|id| graph.index_of(*id))
            .map(|idx| (idx, graph.client_rect(idx), measured_size(graph, idx, measurer)))
            .collect();

        self.snapshot = Some(
            items
                .iter()
                .map(|(idx, _, _)| {
                    let node = &graph.graph[*idx];
                    SnapshotEntry {
                        id: node.id,
                        x: node.x,
                        y: node.y,
                        text: node.text().map(str::to_string),
                    }
                })
                .collect(),
        );

        // stable: ties keep selection order
        items.sort_by(|a, b| {
            let (ka, kb) = match axis {
                LayoutAxis::Horizontal => (a.1.x, b.1.x),
                LayoutAxis::Vertical => (a.1.y, b.1.y),
            };
            ka.total_cmp(&kb)
        });

        let min_x = items.iter().map(|(_, b, _)| b.x).fold(f64::INFINITY, f64::min);
        let min_y = items.iter().map(|(_, b, _)| b.y).fold(f64::INFINITY, f64::min);

        let mut cursor = 0.0;
        let mut cross_extent: f64 = 0.0;
        for (idx, bounds, (w, h)) in &items {
            let (target_x, target_y) = match axis {
                LayoutAxis::Horizontal => (min_x + cursor, min_y),
                LayoutAxis::Vertical => (min_x, min_y + cursor),
            };
            let node = &mut graph.graph[*idx];
            node.x += target_x - bounds.x;
            node.y += target_y - bounds.y;
            let (along, across) = match axis {
                LayoutAxis::Horizontal => (*w, *h),
                LayoutAxis::Vertical => (*h, *w),
            };
            cursor += along + separator;
            cross_extent = cross_extent.max(across);
        }

        let mut group = Node::new(graph.fresh_id("group"), NodeKind::Group);
        group.x = min_x;
        group.y = min_y;
        (group.width, group.height) = match axis {
            LayoutAxis::Horizontal => (cursor, cross_extent),
            LayoutAxis::Vertical => (cross_extent, cursor),
        };
        let group_id = group.id;
        let group_idx = graph.add_node(graph.root, group);

        self.child_draggable.clear();
        for (idx, _, _) in &items {
            graph.reparent_node(*idx, group_idx);
            let child = &mut graph.graph[*idx];
            child.x -= min_x;
            child.y -= min_y;
            self.child_draggable.push((child.id, child.draggable));
            child.draggable = false;
        }

        log::debug!("laid out {} nodes into {group_id}", items.len());
        self.selected = items.iter().map(|(idx, _, _)| graph.graph[*idx].id).collect();
        self.group = Some(group_id);
        self.state = LayoutState::LaidOut;
        true
    }

    /// Restore the positions and texts captured by the last layout. One
    /// level only: a second call returns `false`.
    pub fn undo_last_layout(&mut self, graph: &mut SceneGraph) -> bool {
        let Some(snapshot) = self.snapshot.take() else {
            return false;
        };
        self.dissolve_group(graph);
        for entry in &snapshot {
            let Some(node) = graph.get_by_id_mut(entry.id) else {
                continue;
            };
            node.x = entry.x;
            node.y = entry.y;
            if let Some(text) = &entry.text {
                node.set_text(text);
            }
        }
        if self.state != LayoutState::Inactive {
            self.state = LayoutState::Selecting;
        }
        true
    }

    /// Ungroup keeping the laid-out positions and leave layout mode.
    pub fn cancel_list_layout(&mut self, graph: &mut SceneGraph) -> bool {
        let was_active = self.state != LayoutState::Inactive;
        self.dissolve_group(graph);
        self.selected.clear();
        self.state = LayoutState::Inactive;
        was_active
    }

    /// Double-click on a laid-out child: dissolve the group so the child
    /// can be edited on its own.
    pub fn escape_to_child(&mut self, graph: &mut SceneGraph, child: NodeId) -> bool {
        if self.state != LayoutState::LaidOut || self.owning_group(graph, child).is_none() {
            return false;
        }
        self.dissolve_group(graph);
        self.selected = vec![child];
        self.state = LayoutState::Selecting;
        true
    }

    /// A click landed on `hit` (or on nothing). Clicking anywhere outside
    /// the group dissolves it.
    pub fn click_outside(&mut self, graph: &mut SceneGraph, hit: Option<NodeId>) -> bool {
        if self.state != LayoutState::LaidOut {
            return false;
        }
        if hit.is_some_and(|id| self.owning_group(graph, id).is_some()) {
            return false;
        }
        self.dissolve_group(graph);
        self.selected.clear();
        self.state = LayoutState::Selecting;
        true
    }

    /// Move the whole group. Children follow since they are group-relative.
    pub fn drag_group(&mut self, graph: &mut SceneGraph, dx: f64, dy: f64) -> bool {
        let Some(node) = self.group.and_then(|g| graph.get_by_id_mut(g)) else {
            return false;
        };
        node.x += dx;
        node.y += dy;
        true
    }

    /// Drop all state without touching the scene (the scene was replaced).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move the group's children back to the layer with absolute
    /// coordinates and destroy the group.
    fn dissolve_group(&mut self, graph: &mut SceneGraph) {
        let saved = std::mem::take(&mut self.child_draggable);
        let Some(group_id) = self.group.take() else {
            return;
        };
        let Some(group_idx) = graph.index_of(group_id) else {
            return;
        };
        let (gx, gy) = graph.absolute_position(group_idx);
        for child in graph.children(group_idx) {
            graph.reparent_node(child, graph.root);
            let node = &mut graph.graph[child];
            node.x += gx;
            node.y += gy;
            node.draggable = saved
                .iter()
                .find(|(id, _)| *id == node.id)
                .is_none_or(|(_, d)| *d);
        }
        graph.remove_node(group_idx);
        log::debug!("dissolved layout group {group_id}");
    }
}

/// Rendered size used for spacing. Text is measured from glyphs, wrapped at
/// its current width; everything else uses its transformed bounding box.
pub fn measured_size(graph: &SceneGraph, idx: NodeIndex, measurer: &dyn TextMeasurer) -> (f64, f64) {
    let node = &graph.graph[idx];
    let text = match &node.kind {
        NodeKind::Text(t) => Some(t),
        NodeKind::Placeholder(p) => p.text_state(),
        _ => None,
    };
    match text {
        Some(t) if node.rotation == 0.0 => {
            let width = node.width * node.scale_x;
            let (w, h) = measure_wrapped(&t.text, width, t.wrap, &t.font, t.padding, measurer);
            (w.min(width), h)
        }
        _ => {
            let b = graph.client_rect(idx);
            (b.width, b.height)
        }
    }
}

//! Hit testing: point → node lookup.
//!
//! Reverse-walks the scene (front-to-back) to find which node is under a
//! stage position. Points are mapped into each node's local space through
//! its inverse transform, so rotated and mid-resize nodes hit exactly.

use label_core::NodeIndex;
use label_core::id::NodeId;
use label_core::model::*;
use kurbo::{Affine, Point};

/// Extra reach around a line, which is otherwise only its stroke wide.
pub const LINE_HIT_SLOP: f64 = 4.0;

/// Find the topmost content node at `(px, py)`.
///
/// Children of a group are reported themselves; resolving them to their
/// group is the caller's decision. Returns `None` for the background and
/// empty stage.
pub fn hit_test(graph: &SceneGraph, px: f64, py: f64) -> Option<NodeId> {
    hit_test_node(graph, graph.root, Point::new(px, py))
}

fn hit_test_node(graph: &SceneGraph, idx: NodeIndex, pt: Point) -> Option<NodeId> {
    // Check children in reverse (topmost first)
    for &child in graph.children(idx).iter().rev() {
        if let Some(hit) = hit_test_node(graph, child, pt) {
            return Some(hit);
        }
    }

    let node = &graph.graph[idx];
    match node.kind {
        NodeKind::Layer | NodeKind::Background | NodeKind::Group => None,
        _ if !node.selectable => None,
        _ => node_contains(graph, idx, pt).then_some(node.id),
    }
}

/// Whether `pt` (stage pixels) falls inside the node's transformed box.
pub fn node_contains(graph: &SceneGraph, idx: NodeIndex, pt: Point) -> bool {
    let node = &graph.graph[idx];
    let (ox, oy) = graph.parent_offset(idx);
    let transform = Affine::translate((ox, oy)) * node.local_transform();
    if transform.determinant().abs() < f64::EPSILON {
        return false;
    }
    let local = transform.inverse() * pt;
    let mut rect = node.local_rect();
    if node.kind.is_line() {
        rect = rect.inflate(LINE_HIT_SLOP, LINE_HIT_SLOP);
    }
    rect.contains(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use label_core::factory;

    #[test]
    fn topmost_node_wins() {
        let mut graph = SceneGraph::new();
        graph.add_node(graph.root, factory::filled_rectangle(NodeId::intern("hit_below"), 0.0, 0.0));
        graph.add_node(graph.root, factory::filled_rectangle(NodeId::intern("hit_above"), 50.0, 40.0));

        assert_eq!(hit_test(&graph, 60.0, 50.0), Some(NodeId::intern("hit_above")));
        assert_eq!(hit_test(&graph, 10.0, 10.0), Some(NodeId::intern("hit_below")));
        assert_eq!(hit_test(&graph, 300.0, 300.0), None);
    }

    #[test]
    fn background_is_not_a_hit() {
        let mut graph = SceneGraph::new();
        let mut bg = Node::new(NodeId::intern("hit_bg"), NodeKind::Background);
        bg.width = 384.0;
        bg.height = 576.0;
        bg.selectable = false;
        graph.add_node(graph.root, bg);
        assert_eq!(hit_test(&graph, 10.0, 10.0), None);
    }

    #[test]
    fn rotation_is_exact() {
        let mut graph = SceneGraph::new();
        let mut bar = factory::filled_rectangle(NodeId::intern("hit_rot"), 100.0, 100.0);
        bar.width = 100.0;
        bar.height = 10.0;
        bar.rotation = 90.0;
        graph.add_node(graph.root, bar);

        // rotated about its origin: now spans x 90..100, y 100..200
        assert_eq!(hit_test(&graph, 95.0, 150.0), Some(NodeId::intern("hit_rot")));
        assert_eq!(hit_test(&graph, 150.0, 105.0), None);
    }

    #[test]
    fn lines_have_slop_and_group_children_hit() {
        let mut graph = SceneGraph::new();
        let mut group = Node::new(NodeId::intern("hit_group"), NodeKind::Group);
        group.x = 20.0;
        group.y = 20.0;
        let g = graph.add_node(graph.root, group);
        graph.add_node(g, factory::line(NodeId::intern("hit_line"), 0.0, 10.0));

        assert_eq!(hit_test(&graph, 70.0, 33.0), Some(NodeId::intern("hit_line")));
        assert_eq!(hit_test(&graph, 70.0, 45.0), None);
    }
}

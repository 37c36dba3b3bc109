//! Selection-handle controller.
//!
//! Bound to zero or one target (a node or an ephemeral group). Handles are
//! not scene nodes; their positions are derived from the target's transform
//! every time they are queried, so they follow moves and rotations for free.

use label_core::id::NodeId;
use label_core::model::*;
use kurbo::{Affine, Point};
use smallvec::SmallVec;

/// Hit radius of a handle, in stage pixels.
pub const HANDLE_RADIUS: f64 = 6.0;
/// Distance of the rotation handle above the target's top edge.
pub const ROTATER_OFFSET: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleAnchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Rotater,
}

impl HandleAnchor {
    pub const ALL_RESIZE: [HandleAnchor; 8] = [
        HandleAnchor::TopLeft,
        HandleAnchor::TopCenter,
        HandleAnchor::TopRight,
        HandleAnchor::MiddleLeft,
        HandleAnchor::MiddleRight,
        HandleAnchor::BottomLeft,
        HandleAnchor::BottomCenter,
        HandleAnchor::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::MiddleLeft => "middle-left",
            Self::MiddleRight => "middle-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
            Self::Rotater => "rotater",
        }
    }

    /// Position as fractions of the target box (`0..=1` on each axis).
    fn fraction(&self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter | Self::Rotater => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::MiddleLeft => (0.0, 0.5),
            Self::MiddleRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }

    /// Which box edges this handle drags: `(left, top, right, bottom)`.
    pub fn edges(&self) -> (bool, bool, bool, bool) {
        let (fx, fy) = self.fraction();
        match self {
            Self::Rotater => (false, false, false, false),
            _ => (fx == 0.0, fy == 0.0, fx == 1.0, fy == 1.0),
        }
    }
}

/// The handles shown for a target of the given kind: lines get only their
/// two end handles plus rotation; everything else gets all eight.
pub fn anchors_for(kind: &NodeKind) -> SmallVec<[HandleAnchor; 9]> {
    if kind.is_line() {
        SmallVec::from_slice(&[HandleAnchor::MiddleLeft, HandleAnchor::MiddleRight, HandleAnchor::Rotater])
    } else {
        let mut anchors = SmallVec::from_slice(&HandleAnchor::ALL_RESIZE);
        anchors.push(HandleAnchor::Rotater);
        anchors
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionHandles {
    target: Option<NodeId>,
    anchors: SmallVec<[HandleAnchor; 9]>,
}

impl SelectionHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the handles to `id`, configured for its kind.
    pub fn attach(&mut self, id: NodeId, kind: &NodeKind) {
        self.target = Some(id);
        self.anchors = anchors_for(kind);
    }

    pub fn detach(&mut self) {
        self.target = None;
        self.anchors.clear();
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn anchors(&self) -> &[HandleAnchor] {
        &self.anchors
    }

    /// Stage positions of every enabled handle. Empty when detached or when
    /// the target is gone.
    pub fn handle_positions(&self, graph: &SceneGraph) -> Vec<(HandleAnchor, Point)> {
        let Some(frame) = self.target.and_then(|id| target_frame(graph, id)) else {
            return Vec::new();
        };
        self.anchors
            .iter()
            .map(|&anchor| (anchor, frame.handle_point(anchor)))
            .collect()
    }

    /// The handle under `(px, py)`, if any.
    pub fn hit_handle(&self, graph: &SceneGraph, px: f64, py: f64) -> Option<HandleAnchor> {
        let pt = Point::new(px, py);
        self.handle_positions(graph)
            .into_iter()
            .find(|(_, p)| p.distance(pt) <= HANDLE_RADIUS)
            .map(|(anchor, _)| anchor)
    }
}

/// A target's box in its own rotated frame, placed on the stage.
#[derive(Debug, Clone, Copy)]
pub struct TargetFrame {
    pub transform: Affine,
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl TargetFrame {
    pub fn handle_point(&self, anchor: HandleAnchor) -> Point {
        let (fx, fy) = anchor.fraction();
        let mut local = Point::new(self.x0 + self.width * fx, self.y0 + self.height * fy);
        if anchor == HandleAnchor::Rotater {
            // keep the offset in screen pixels regardless of live scale
            let (sy, _) = axis_scales(self.transform);
            local.y -= ROTATER_OFFSET / sy.max(f64::EPSILON);
        }
        self.transform * local
    }

    /// Stage position of the box centre.
    pub fn center(&self) -> Point {
        self.transform * Point::new(self.x0 + self.width / 2.0, self.y0 + self.height / 2.0)
    }
}

/// Length of the transformed y and x unit vectors.
fn axis_scales(transform: Affine) -> (f64, f64) {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    ((c * c + d * d).sqrt(), (a * a + b * b).sqrt())
}

/// The frame handles are drawn around. Groups use the union of their
/// children (they are never rotated); nodes use their local box.
pub fn target_frame(graph: &SceneGraph, id: NodeId) -> Option<TargetFrame> {
    let idx = graph.index_of(id)?;
    let node = graph.get(idx)?;
    if matches!(node.kind, NodeKind::Group) {
        let b = graph.client_rect(idx);
        return Some(TargetFrame {
            transform: Affine::IDENTITY,
            x0: b.x,
            y0: b.y,
            width: b.width,
            height: b.height,
        });
    }
    let (ox, oy) = graph.parent_offset(idx);
    let rect = node.local_rect();
    Some(TargetFrame {
        transform: Affine::translate((ox, oy)) * node.local_transform(),
        x0: rect.x0,
        y0: rect.y0,
        width: rect.width(),
        height: rect.height(),
    })
}

//! Constructors for primitive scene nodes with designer defaults.

use crate::id::NodeId;
use crate::model::*;
use smallvec::smallvec;

pub const DEFAULT_RECT_SIZE: (f64, f64) = (100.0, 80.0);
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_LINE_LENGTH: f64 = 100.0;
pub const DEFAULT_TEXT_SIZE: (f64, f64) = (200.0, 30.0);
pub const DEFAULT_IMAGE_SIZE: (f64, f64) = (50.0, 50.0);
pub const DEFAULT_COLOR: &str = "#000000";

fn placed(id: NodeId, kind: NodeKind, x: f64, y: f64, size: (f64, f64)) -> Node {
    let mut node = Node::new(id, kind);
    node.x = x;
    node.y = y;
    node.width = size.0;
    node.height = size.1;
    node
}

pub fn filled_rectangle(id: NodeId, x: f64, y: f64) -> Node {
    placed(
        id,
        NodeKind::Shape(ShapeProps {
            shape_type: ShapeType::Rectangle,
            fill: Some(DEFAULT_COLOR.into()),
            stroke: DEFAULT_COLOR.into(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            points: smallvec![],
        }),
        x,
        y,
        DEFAULT_RECT_SIZE,
    )
}

pub fn outlined_rectangle(id: NodeId, x: f64, y: f64) -> Node {
    placed(
        id,
        NodeKind::Shape(ShapeProps {
            shape_type: ShapeType::OutlinedRectangle,
            fill: None,
            stroke: DEFAULT_COLOR.into(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            points: smallvec![],
        }),
        x,
        y,
        DEFAULT_RECT_SIZE,
    )
}

/// Horizontal line starting at the node origin.
pub fn line(id: NodeId, x: f64, y: f64) -> Node {
    placed(
        id,
        NodeKind::Shape(ShapeProps {
            shape_type: ShapeType::Line,
            fill: None,
            stroke: DEFAULT_COLOR.into(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            points: smallvec![0.0, 0.0, DEFAULT_LINE_LENGTH, 0.0],
        }),
        x,
        y,
        (DEFAULT_LINE_LENGTH, 0.0),
    )
}

pub fn shape(id: NodeId, shape_type: ShapeType, x: f64, y: f64) -> Node {
    match shape_type {
        ShapeType::Rectangle => filled_rectangle(id, x, y),
        ShapeType::OutlinedRectangle => outlined_rectangle(id, x, y),
        ShapeType::Line => line(id, x, y),
    }
}

/// Word-wrapped Calibri 20 text in a 200×30 box.
pub fn text(id: NodeId, x: f64, y: f64, content: &str) -> Node {
    placed(
        id,
        NodeKind::Text(TextProps {
            text: content.to_string(),
            ..TextProps::default()
        }),
        x,
        y,
        DEFAULT_TEXT_SIZE,
    )
}

/// Image shell; the decode job fills in `natural_size` later.
pub fn image(id: NodeId, x: f64, y: f64, src: &str, is_client_logo: bool) -> Node {
    placed(
        id,
        NodeKind::Image(ImageProps {
            src: src.to_string(),
            is_client_logo,
            natural_size: None,
        }),
        x,
        y,
        DEFAULT_IMAGE_SIZE,
    )
}

/// Finish a resize gesture: bake scale into the size and enforce the text
/// minimum box for text-bearing nodes.
pub fn apply_resize(node: &mut Node, scale_x: f64, scale_y: f64, min_text: (f64, f64)) {
    node.scale_x *= scale_x;
    node.scale_y *= scale_y;
    node.bake_scale();
    if node.is_text_bearing() {
        node.width = node.width.max(min_text.0);
        node.height = node.height.max(min_text.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let r = filled_rectangle(NodeId::intern("f_rect"), 1.0, 2.0);
        assert_eq!((r.x, r.y, r.width, r.height), (1.0, 2.0, 100.0, 80.0));
        let NodeKind::Shape(s) = &r.kind else {
            panic!("expected shape")
        };
        assert_eq!(s.stroke_width, 2.0);
        assert!(s.fill.is_some());

        let o = outlined_rectangle(NodeId::intern("f_outline"), 0.0, 0.0);
        let NodeKind::Shape(s) = &o.kind else {
            panic!("expected shape")
        };
        assert!(s.fill.is_none());

        let t = text(NodeId::intern("f_text"), 0.0, 0.0, "Hi");
        let NodeKind::Text(p) = &t.kind else {
            panic!("expected text")
        };
        assert_eq!(p.font.size, 20.0);
        assert_eq!(p.font.family, "Calibri");
        assert_eq!(p.wrap, WrapMode::Word);
        assert_eq!((t.width, t.height), (200.0, 30.0));

        let i = image(NodeId::intern("f_img"), 0.0, 0.0, "logo.png", true);
        assert_eq!((i.width, i.height), (50.0, 50.0));
    }

    #[test]
    fn line_resize_scales_endpoint_only() {
        let mut l = line(NodeId::intern("f_line"), 10.0, 10.0);
        apply_resize(&mut l, 2.0, 1.0, (80.0, 30.0));
        let NodeKind::Shape(s) = &l.kind else {
            panic!("expected shape")
        };
        assert_eq!(s.points.as_slice(), &[0.0, 0.0, 200.0, 0.0]);
        assert_eq!((l.x, l.y), (10.0, 10.0));
        assert_eq!((l.scale_x, l.scale_y), (1.0, 1.0));
    }

    #[test]
    fn text_resize_respects_minimum() {
        let mut t = text(NodeId::intern("f_text_min"), 0.0, 0.0, "Hi");
        apply_resize(&mut t, 0.1, 0.5, (80.0, 30.0));
        assert_eq!((t.width, t.height), (80.0, 30.0));
        assert_eq!((t.scale_x, t.scale_y), (1.0, 1.0));
    }
}

//! Canvas2D renderer.
//!
//! Walks the scene from the layer down and draws each node in its own
//! transform, so rotation and live resize scale come for free. Rasters are
//! drawn from `<img>` elements the host registers per node.

use label_core::NodeIndex;
use label_core::id::NodeId;
use label_core::metrics::{TextMeasurer, wrap_lines};
use label_core::model::*;
use label_core::placeholder::{FALLBACK_DASH, FALLBACK_FILL, FALLBACK_STROKE, PlaceholderVisual};
use label_editor::selection::HandleAnchor;
use label_editor::{Canvas, LayoutState};
use std::collections::HashMap;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

const HANDLE_SIZE: f64 = 8.0;
const ACCENT: &str = "#1E88E5";
const PAGE_BACKDROP: &str = "#E0E0E0";

/// Per-frame inputs that do not live in the scene.
pub struct RenderContext<'a> {
    pub images: &'a HashMap<NodeId, HtmlImageElement>,
    /// Node whose text the HTML overlay is currently showing.
    pub editing: Option<NodeId>,
}

pub fn render_scene(ctx: &CanvasRenderingContext2d, canvas: &Canvas, frame: &RenderContext<'_>) {
    let (w, h) = canvas.stage_size();
    ctx.set_fill_style_str(PAGE_BACKDROP);
    ctx.fill_rect(0.0, 0.0, w, h);

    let graph = canvas.graph();
    render_node(ctx, graph, graph.root, canvas.measurer(), frame);

    if canvas.layout().state() == LayoutState::LaidOut
        && let Some(group) = canvas.layout().group().and_then(|g| graph.index_of(g))
    {
        draw_group_outline(ctx, graph.client_rect(group));
    }
    draw_selection_handles(ctx, &canvas.handle_positions());
}

fn render_node(
    ctx: &CanvasRenderingContext2d,
    graph: &SceneGraph,
    idx: NodeIndex,
    measurer: &dyn TextMeasurer,
    frame: &RenderContext<'_>,
) {
    let node = &graph.graph[idx];
    ctx.save();
    let _ = ctx.translate(node.x, node.y);
    let _ = ctx.rotate(node.rotation.to_radians());
    let _ = ctx.scale(node.scale_x, node.scale_y);

    match &node.kind {
        NodeKind::Layer | NodeKind::Group => {}
        NodeKind::Background => {
            ctx.set_fill_style_str("#FFFFFF");
            ctx.fill_rect(0.0, 0.0, node.width, node.height);
        }
        NodeKind::Text(t) => {
            if frame.editing != Some(node.id) {
                draw_text(ctx, node, t, measurer);
            }
        }
        NodeKind::Shape(s) => draw_shape(ctx, node, s),
        NodeKind::Image(_) => match frame.images.get(&node.id) {
            Some(img) => {
                let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    img,
                    0.0,
                    0.0,
                    node.width,
                    node.height,
                );
            }
            None => draw_fallback(ctx, node.width, node.height, "Image"),
        },
        NodeKind::Placeholder(p) => match (&p.visual, p.text_state()) {
            (PlaceholderVisual::Text, Some(t)) => {
                if frame.editing != Some(node.id) {
                    draw_text(ctx, node, t, measurer);
                }
            }
            (PlaceholderVisual::Raster(fit), _) => match frame.images.get(&node.id) {
                Some(img) => {
                    let d = fit.draw;
                    let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        img, d.x, d.y, d.width, d.height,
                    );
                }
                None => draw_fallback(ctx, node.width, node.height, &p.identifier),
            },
            (PlaceholderVisual::Fallback { label }, _) => {
                draw_fallback(ctx, node.width, node.height, label);
            }
            _ => draw_fallback(ctx, node.width, node.height, "…"),
        },
    }

    for child in graph.children(idx) {
        render_node(ctx, graph, child, measurer, frame);
    }
    ctx.restore();
}

// ─── Drawing primitives ─────────────────────────────────────────────────

fn draw_text(ctx: &CanvasRenderingContext2d, node: &Node, t: &TextProps, measurer: &dyn TextMeasurer) {
    let inner = (node.width - 2.0 * t.padding).max(0.0);
    let line_height = measurer.line_height(&t.font);
    let lines = wrap_lines(&t.text, inner, t.wrap, &t.font, measurer);

    ctx.set_font(&t.font.css());
    ctx.set_fill_style_str(&t.fill);
    ctx.set_text_baseline("top");
    ctx.set_text_align(t.align.as_str());
    let x = match t.align {
        TextAlign::Left => t.padding,
        TextAlign::Center => node.width / 2.0,
        TextAlign::Right => node.width - t.padding,
    };

    for (i, line) in lines.iter().enumerate() {
        let y = t.padding + i as f64 * line_height;
        let _ = ctx.fill_text(line, x, y);
        if t.underline {
            let width = measurer.text_width(line, &t.font);
            let start = match t.align {
                TextAlign::Left => x,
                TextAlign::Center => x - width / 2.0,
                TextAlign::Right => x - width,
            };
            let baseline = y + t.font.size;
            ctx.set_stroke_style_str(&t.fill);
            ctx.set_line_width((t.font.size / 15.0).max(1.0));
            ctx.begin_path();
            ctx.move_to(start, baseline);
            ctx.line_to(start + width, baseline);
            ctx.stroke();
        }
    }
}

fn draw_shape(ctx: &CanvasRenderingContext2d, node: &Node, s: &ShapeProps) {
    ctx.set_stroke_style_str(&s.stroke);
    ctx.set_line_width(s.stroke_width);
    match s.shape_type {
        ShapeType::Line => {
            let (ex, ey) = s.line_end();
            ctx.begin_path();
            ctx.move_to(0.0, 0.0);
            ctx.line_to(ex, ey);
            ctx.stroke();
        }
        ShapeType::Rectangle | ShapeType::OutlinedRectangle => {
            if let Some(fill) = &s.fill {
                ctx.set_fill_style_str(fill);
                ctx.fill_rect(0.0, 0.0, node.width, node.height);
            }
            if s.stroke_width > 0.0 {
                ctx.stroke_rect(0.0, 0.0, node.width, node.height);
            }
        }
    }
}

/// Gray dashed box with a centered label.
fn draw_fallback(ctx: &CanvasRenderingContext2d, w: f64, h: f64, label: &str) {
    ctx.save();
    ctx.set_fill_style_str(FALLBACK_FILL);
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.set_stroke_style_str(FALLBACK_STROKE);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &JsValue::from_f64(FALLBACK_DASH[0]),
        &JsValue::from_f64(FALLBACK_DASH[1]),
    ));
    ctx.stroke_rect(0.0, 0.0, w, h);

    ctx.set_font("12px sans-serif");
    ctx.set_fill_style_str(FALLBACK_STROKE);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(label, w / 2.0, h / 2.0);
    ctx.restore();
}

fn draw_group_outline(ctx: &CanvasRenderingContext2d, b: Bounds) {
    ctx.save();
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(3.0)));
    ctx.stroke_rect(b.x - 2.0, b.y - 2.0, b.width + 4.0, b.height + 4.0);
    ctx.restore();
}

fn draw_selection_handles(ctx: &CanvasRenderingContext2d, handles: &[(HandleAnchor, kurbo::Point)]) {
    let half = HANDLE_SIZE / 2.0;
    ctx.save();
    ctx.set_fill_style_str("#FFFFFF");
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.5);
    for (anchor, pt) in handles {
        if *anchor == HandleAnchor::Rotater {
            ctx.begin_path();
            let _ = ctx.arc(pt.x, pt.y, half, 0.0, std::f64::consts::TAU);
            ctx.fill();
            ctx.stroke();
        } else {
            ctx.fill_rect(pt.x - half, pt.y - half, HANDLE_SIZE, HANDLE_SIZE);
            ctx.stroke_rect(pt.x - half, pt.y - half, HANDLE_SIZE, HANDLE_SIZE);
        }
    }
    ctx.restore();
}

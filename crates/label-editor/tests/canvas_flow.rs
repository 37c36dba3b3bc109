//! Integration tests: the canvas controller driven the way a host drives it.
//!
//! Mount, place elements, click and drag, lay out, run raster jobs, and
//! round-trip the document through a store.

use label_core::error::Result;
use label_core::factory;
use label_core::placeholder::PlaceholderVisual;
use label_core::*;
use label_editor::*;
use pretty_assertions::assert_eq;
use std::io::Cursor;

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Every glyph 10px wide, 20px lines.
struct Mono;

impl TextMeasurer for Mono {
    fn text_width(&self, text: &str, _font: &FontSpec) -> f64 {
        text.chars().count() as f64 * 10.0
    }

    fn line_height(&self, _font: &FontSpec) -> f64 {
        20.0
    }
}

fn mounted() -> Canvas {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut canvas = Canvas::new(EditorConfig::default(), Mono);
    assert!(canvas.initialize(Some(MountTarget {
        width: 1024.0,
        height: 768.0,
    })));
    canvas
}

fn unpadded_text(canvas: &mut Canvas, x: f64, y: f64, content: &str) -> NodeId {
    let mut node = factory::text(canvas.graph().fresh_id("text"), x, y, content);
    if let NodeKind::Text(t) = &mut node.kind {
        t.padding = 0.0;
    }
    canvas.add_element(node)
}

fn abs(canvas: &Canvas, id: NodeId) -> (f64, f64) {
    let graph = canvas.graph();
    graph.absolute_position(graph.index_of(id).expect("node attached"))
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(w, h))
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("png encode");
    buf.into_inner()
}

/// Produces blank PNGs of the requested size.
#[derive(Default)]
struct BlankGenerator {
    calls: usize,
}

impl RasterGenerator for BlankGenerator {
    fn generate_qr(&mut self, _payload: &str, size_px: u32) -> Result<Vec<u8>> {
        self.calls += 1;
        Ok(png(size_px, size_px))
    }

    fn generate_barcode(&mut self, _payload: &str, _format: &str, height_px: u32) -> Result<Vec<u8>> {
        self.calls += 1;
        Ok(png(300, height_px))
    }

    fn fetch_logo(&mut self, _tenant_id: Option<&str>) -> Result<Option<Vec<u8>>> {
        self.calls += 1;
        Ok(None)
    }

    fn load_image(&mut self, _src: &str) -> Result<Vec<u8>> {
        self.calls += 1;
        Ok(png(40, 20))
    }
}

fn visual(canvas: &Canvas, id: NodeId) -> PlaceholderVisual {
    match &canvas.graph().get_by_id(id).expect("node attached").kind {
        NodeKind::Placeholder(p) => p.visual.clone(),
        other => panic!("expected placeholder, got {other:?}"),
    }
}

// ─── Page ────────────────────────────────────────────────────────────────

#[test]
fn orientation_toggles_stage() {
    let mut canvas = mounted();
    assert_eq!(canvas.stage_size(), (384.0, 576.0));
    canvas.update_dimensions(|d| d.toggle_orientation());
    assert_eq!(canvas.stage_size(), (576.0, 384.0));
    canvas.update_dimensions(|d| d.toggle_orientation());
    assert_eq!(canvas.stage_size(), (384.0, 576.0));
}

#[test]
fn unknown_paper_leaves_stage_alone() {
    let mut canvas = mounted();
    assert!(!canvas.update_dimensions(|d| d.set_paper_size("Napkin")));
    assert_eq!(canvas.stage_size(), (384.0, 576.0));
}

// ─── Placeholders ────────────────────────────────────────────────────────

#[test]
fn placeholder_families() {
    let mut canvas = mounted();
    let qr = canvas.add_placeholder("Device.QRCode", 10.0, 10.0).expect("qr");
    let serial = canvas.add_placeholder("Device.Serial", 10.0, 200.0).expect("serial");

    assert_eq!(visual(&canvas, qr), PlaceholderVisual::Pending);
    assert_eq!(canvas.graph().get_by_id(serial).unwrap().text(), Some("SN-123456789"));

    let jobs = canvas.pending_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].node, qr);
    assert!(matches!(jobs[0].request, RasterRequest::Qr { size_px: 200, .. }));
}

#[test]
fn generator_resolves_pending_jobs() {
    let mut canvas = mounted();
    let qr = canvas.add_placeholder("Device.QRCode", 0.0, 0.0).unwrap();
    let barcode = canvas.add_placeholder("Device.Barcode", 0.0, 150.0).unwrap();
    let logo = canvas.add_placeholder("Client.Logo", 0.0, 300.0).unwrap();

    let mut generator = BlankGenerator::default();
    assert_eq!(canvas.run_pending_jobs(&mut generator), 3);
    assert_eq!(generator.calls, 3);

    assert!(matches!(visual(&canvas, qr), PlaceholderVisual::Raster(fit) if fit.natural_width == 200.0));
    assert!(matches!(visual(&canvas, barcode), PlaceholderVisual::Raster(_)));
    assert!(matches!(visual(&canvas, logo), PlaceholderVisual::Fallback { label } if label == "Logo"));
    assert_eq!(canvas.run_pending_jobs(&mut generator), 0);
}

#[test]
fn superseded_job_is_dropped() {
    let mut canvas = mounted();
    let qr = canvas.add_placeholder("Device.QRCode", 0.0, 0.0).unwrap();
    let first = canvas.take_jobs().remove(0);
    assert!(canvas.invalidate(qr));
    let second = canvas.take_jobs().remove(0);

    let outcome = JobOutcome::Src {
        src: "data:image/png;base64,AAAA".into(),
        width: 64.0,
        height: 64.0,
    };
    assert!(!canvas.complete_job(first.id, qr, outcome.clone()));
    assert_eq!(visual(&canvas, qr), PlaceholderVisual::Pending);
    assert!(canvas.complete_job(second.id, qr, outcome));
    assert!(matches!(visual(&canvas, qr), PlaceholderVisual::Raster(_)));
}

// ─── List layout ─────────────────────────────────────────────────────────

#[test]
fn layout_picked_by_clicks_then_undone() {
    let mut canvas = mounted();
    let a = unpadded_text(&mut canvas, 10.0, 10.0, "Hello");
    let b = unpadded_text(&mut canvas, 100.0, 15.0, "ABCDEFGH");

    assert_eq!(canvas.toggle_list_mode(), LayoutState::Selecting);
    canvas.handle_click(15.0, 15.0);
    canvas.handle_click(250.0, 20.0);
    assert_eq!(canvas.layout().selected(), &[a, b]);

    assert!(canvas.apply_list_layout(LayoutAxis::Horizontal, Some(10.0)));
    assert_eq!(abs(&canvas, a), (10.0, 10.0));
    assert_eq!(abs(&canvas, b), (70.0, 10.0));
    let group = canvas.layout().group().expect("group");
    let g = canvas.graph().get_by_id(group).unwrap();
    assert_eq!((g.x, g.y, g.width, g.height), (10.0, 10.0, 150.0, 20.0));
    assert_eq!(canvas.selected(), Some(group));

    // a click on a child keeps the group selected
    assert_eq!(canvas.handle_click(20.0, 18.0), Some(group));

    assert!(canvas.undo_last_layout());
    assert_eq!(abs(&canvas, a), (10.0, 10.0));
    assert_eq!(abs(&canvas, b), (100.0, 15.0));
    assert_eq!(canvas.graph().get_by_id(b).unwrap().text(), Some("ABCDEFGH"));
    assert_eq!(canvas.selected(), None);
    assert!(!canvas.undo_last_layout());
}

#[test]
fn dragging_a_child_moves_the_group() {
    let mut canvas = mounted();
    let a = unpadded_text(&mut canvas, 10.0, 10.0, "Hello");
    let b = unpadded_text(&mut canvas, 100.0, 15.0, "ABCDEFGH");
    assert!(canvas.apply_layout_to(&[a, b], LayoutAxis::Horizontal, None));

    canvas.handle_event(&InputEvent::pointer_down(20.0, 18.0));
    canvas.handle_event(&InputEvent::PointerMove { x: 40.0, y: 48.0 });
    canvas.handle_event(&InputEvent::PointerUp { x: 40.0, y: 48.0 });

    assert_eq!(abs(&canvas, a), (30.0, 40.0));
    assert_eq!(abs(&canvas, b), (90.0, 40.0));
}

#[test]
fn double_click_escapes_child() {
    let mut canvas = mounted();
    let a = unpadded_text(&mut canvas, 10.0, 10.0, "Hello");
    let b = unpadded_text(&mut canvas, 100.0, 15.0, "ABCDEFGH");
    canvas.toggle_list_mode();
    assert!(canvas.apply_layout_to(&[a, b], LayoutAxis::Horizontal, None));

    assert_eq!(canvas.handle_double_click(250.0, 20.0), DoubleClickOutcome::Escaped(b));
    assert_eq!(canvas.layout().group(), None);
    assert_eq!(canvas.layout().state(), LayoutState::Selecting);
    assert_eq!(canvas.selected(), Some(b));
    assert!(canvas.graph().get_by_id(b).unwrap().draggable);
}

// ─── Documents ───────────────────────────────────────────────────────────

#[test]
fn save_and_reload_through_store() {
    let mut canvas = mounted();
    canvas.update_dimensions(|d| {
        d.set_paper_size("Label_3x2");
        d.set_dpi(203)
    });
    let text = canvas.add_text(12.0, 24.0, "Hello");
    canvas.set_text_style(text, &StyleChange::FontSize(16.0));
    canvas.add_shape(ShapeType::Line, 5.0, 100.0);
    let qr = canvas.add_placeholder("Device.QRCode", 200.0, 20.0).unwrap();
    let job = canvas.take_jobs().remove(0);
    canvas.complete_job(
        job.id,
        qr,
        JobOutcome::Src {
            src: "data:image/png;base64,AAAA".into(),
            width: 200.0,
            height: 200.0,
        },
    );

    let mut store = MemoryStore::new();
    canvas.save_to(&mut store, "label-42").expect("save");

    let mut reloaded = mounted();
    assert_eq!(reloaded.load_from(&store, "label-42").expect("load"), 3);
    assert_eq!(reloaded.stage_size(), (609.0, 406.0));
    assert!(reloaded.pending_jobs().is_empty(), "cached raster must not regenerate");

    let graph = reloaded.graph();
    let texts: Vec<_> = graph.nodes().filter_map(|n| n.text()).collect();
    assert_eq!(texts, vec!["Hello"]);
    let restored = graph
        .nodes()
        .find(|n| n.text() == Some("Hello"))
        .expect("text restored");
    assert_eq!((restored.x, restored.y), (12.0, 24.0));
    let NodeKind::Text(props) = &restored.kind else {
        panic!("text kind lost");
    };
    assert_eq!(props.font.size, 16.0);
    assert_eq!(props.fill, "#000000");
}

#[test]
fn laid_out_nodes_save_with_absolute_positions() {
    let mut canvas = mounted();
    let a = unpadded_text(&mut canvas, 10.0, 10.0, "Hello");
    let b = unpadded_text(&mut canvas, 100.0, 15.0, "ABCDEFGH");
    assert!(canvas.apply_layout_to(&[a, b], LayoutAxis::Horizontal, Some(10.0)));

    let doc = canvas.serialize_canvas_state();
    assert_eq!(doc.nodes.len(), 2);
    let xs: Vec<_> = doc.nodes.iter().filter_map(|r| r.get("x").and_then(|v| v.as_f64())).collect();
    assert_eq!(xs, vec![10.0, 70.0]);
    for rec in &doc.nodes {
        assert_eq!(rec.get("draggable"), Some(&serde_json::json!(true)));
    }

    // the group is gone after a reload and the children move on their own
    assert_eq!(canvas.deserialize_canvas_state(&doc), 2);
    assert_eq!(canvas.layout().group(), None);
    assert!(canvas.move_node(a, 5.0, 5.0));
    assert_eq!(abs(&canvas, a), (15.0, 15.0));
    assert_eq!(abs(&canvas, b), (70.0, 10.0));
}

#[test]
fn locked_node_saved_during_layout_stays_locked() {
    let mut canvas = mounted();
    let a = unpadded_text(&mut canvas, 10.0, 10.0, "Hello");
    let b = unpadded_text(&mut canvas, 100.0, 15.0, "ABCDEFGH");
    assert!(canvas.set_draggable(b, false));
    assert!(canvas.apply_layout_to(&[a, b], LayoutAxis::Horizontal, Some(10.0)));
    // unlocking a grouped child applies once the group is gone
    assert!(canvas.set_draggable(a, true));

    let doc = canvas.serialize_canvas_state();
    canvas.deserialize_canvas_state(&doc);
    assert!(canvas.move_node(a, 1.0, 0.0));
    assert!(!canvas.move_node(b, 1.0, 0.0));
}

#[test]
fn colliding_ids_are_reassigned_on_load() {
    let mut store = MemoryStore::new();
    store.insert_json(
        "dupes",
        r##"{
            "version": "2.0",
            "canvas": { "width_inches": 4, "height_inches": 6, "paper_size": "Label_4x6",
                        "orientation": "portrait", "dpi": 96 },
            "nodes": [
                { "node_type": "text", "id": "dup_t1", "x": 0, "y": 0, "text": "One" },
                { "node_type": "text", "id": "dup_t1", "x": 0, "y": 40, "text": "Two" }
            ]
        }"##,
    );

    let mut canvas = mounted();
    assert_eq!(canvas.load_from(&store, "dupes").unwrap(), 2);
    let graph = canvas.graph();
    let top = graph.top_level();
    assert_eq!(top.len(), 2);
    let texts: Vec<_> = top.iter().filter_map(|&idx| graph.graph[idx].text()).collect();
    assert_eq!(texts, vec!["One", "Two"]);
    assert_ne!(graph.graph[top[0]].id, graph.graph[top[1]].id);
    assert_eq!(graph.graph[top[0]].id, NodeId::intern("dup_t1"));
}

#[test]
fn missing_document_is_not_found() {
    let mut canvas = mounted();
    let store = MemoryStore::new();
    assert!(matches!(canvas.load_from(&store, "nope"), Err(LabelError::NotFound(_))));
}

#[test]
fn legacy_document_loads() {
    let mut store = MemoryStore::new();
    store.insert_json(
        "legacy",
        r##"{
            "canvasConfig": { "widthInches": 4, "heightInches": 3, "paperSize": "Label_4x3",
                              "orientation": "portrait", "dpi": 96 },
            "elements": [
                { "type": "text", "x": 5, "y": 6, "width": 120, "height": 30,
                  "text": "Legacy", "fontSize": 18, "fill": "#ff0000" },
                "junk",
                { "type": "hologram", "x": 0, "y": 0 }
            ]
        }"##,
    );

    let mut canvas = mounted();
    assert_eq!(canvas.load_from(&store, "legacy").unwrap(), 1);
    assert_eq!(canvas.stage_size(), (384.0, 288.0));
    assert!(canvas.has_elements());
}

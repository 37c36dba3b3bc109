//! CanvasStateV2: the persisted JSON form of a label document.
//!
//! ```text
//! { version: "2.0", timestamp, canvas: { width_inches, height_inches,
//!   paper_size, orientation, dpi }, nodes: [ { node_type, x, y, ... } ] }
//! ```
//!
//! Node records are flat JSON objects. Decoding is deliberately forgiving:
//! every renamed field is looked up under its canonical key first and then
//! under the legacy spellings older documents used, and a record that cannot
//! be classified is dropped with a warning instead of failing the load.

use crate::config::EditorConfig;
use crate::dimension::{CanvasConfig, DimensionEngine, Orientation};
use crate::error::{LabelError, Result};
use crate::id::NodeId;
use crate::metrics::{TextMeasurer, auto_size};
use crate::model::*;
use crate::placeholder::{
    DEFAULT_BARCODE_FORMAT, ImageKind, PlaceholderFamily, PlaceholderId, PlaceholderProps,
    PlaceholderState, PlaceholderVisual, RasterFit, RasterSource, raster_draw_rect, sample_value,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

pub const DOCUMENT_VERSION: &str = "2.0";

pub type NodeRecord = Map<String, Value>;

// ─── Legacy key tables ───────────────────────────────────────────────────

const K_NODE_TYPE: &[&str] = &["node_type", "type", "nodeType"];
const K_SCALE_X: &[&str] = &["scale_x", "scaleX"];
const K_SCALE_Y: &[&str] = &["scale_y", "scaleY"];
const K_TEXT: &[&str] = &["text", "content"];
const K_FONT_SIZE: &[&str] = &["font_size", "fontSize"];
const K_FONT_FAMILY: &[&str] = &["font_family", "fontFamily"];
const K_FONT_STYLE: &[&str] = &["font_style", "fontStyle"];
const K_FILL: &[&str] = &["fill", "color"];
const K_ALIGN: &[&str] = &["align", "text_align", "textAlign"];
const K_WRAP: &[&str] = &["wrap", "wrap_mode"];
const K_AUTO_WIDTH: &[&str] = &["auto_width", "autoWidth"];
const K_UNDERLINE: &[&str] = &["underline"];
const K_DECORATION: &[&str] = &["text_decoration", "textDecoration"];
const K_SRC: &[&str] = &["src", "image_src", "imageSrc", "url"];
const K_CLIENT_LOGO: &[&str] = &["is_client_logo", "isClientLogo"];
const K_SHAPE_TYPE: &[&str] = &["shape_type", "shapeType"];
const K_STROKE: &[&str] = &["stroke", "stroke_color", "strokeColor"];
const K_STROKE_WIDTH: &[&str] = &["stroke_width", "strokeWidth"];
const K_PLACEHOLDER_ID: &[&str] = &["placeholder_id", "placeholderId", "identifier", "placeholder"];
const K_FAMILY: &[&str] = &["placeholder_family", "placeholderType", "placeholder_type"];
const K_STATE: &[&str] = &["state", "placeholder_state", "placeholderState"];
const K_QR_PAYLOAD: &[&str] = &["qr_data", "qrData", "payload"];
const K_BARCODE_PAYLOAD: &[&str] = &["barcode_data", "barcodeData", "payload"];
const K_BARCODE_FORMAT: &[&str] = &["barcode_format", "barcodeFormat", "format"];
const K_LOGO_SRC: &[&str] = &["logo_src", "logoSrc", "src"];
const K_TENANT: &[&str] = &["tenant_id", "tenantId"];
const K_IMAGE_CACHE: &[&str] = &["image_src", "imageSrc", "image_data", "imageData"];
const K_NATURAL_W: &[&str] = &["natural_width", "naturalWidth"];
const K_NATURAL_H: &[&str] = &["natural_height", "naturalHeight"];

const K_CANVAS_W: &[&str] = &["width_inches", "widthInches", "width"];
const K_CANVAS_H: &[&str] = &["height_inches", "heightInches", "height"];
const K_PAPER: &[&str] = &["paper_size", "paperSize", "paper"];
const K_DPI: &[&str] = &["dpi", "DPI"];

fn field<'a>(rec: &'a NodeRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| rec.get(*k).filter(|v| !v.is_null()))
}

fn f64_field(rec: &NodeRecord, keys: &[&str]) -> Option<f64> {
    field(rec, keys).and_then(|v| {
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            .filter(|n: &f64| n.is_finite())
    })
}

fn str_field(rec: &NodeRecord, keys: &[&str]) -> Option<String> {
    field(rec, keys).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn bool_field(rec: &NodeRecord, keys: &[&str]) -> Option<bool> {
    field(rec, keys).and_then(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

// ─── Document ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentState {
    pub version: String,
    pub timestamp: String,
    pub canvas: CanvasConfig,
    pub nodes: Vec<NodeRecord>,
}

impl<'de> Deserialize<'de> for DocumentState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DocumentState::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl DocumentState {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Tolerant decode of the top-level shape. Accepts older documents with
    /// camelCase canvas keys, a missing version, or `elements` instead of
    /// `nodes`. Non-object node entries are dropped.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(LabelError::Malformed("document is not a JSON object".into()));
        };

        let version = str_field(&root, &["version"]).unwrap_or_else(|| {
            log::debug!("document has no version tag, treating as legacy 1.0");
            "1.0".to_string()
        });
        let timestamp = str_field(&root, &["timestamp", "saved_at", "savedAt"]).unwrap_or_default();

        let canvas = match field(&root, &["canvas", "canvas_config", "canvasConfig"]) {
            Some(Value::Object(c)) => canvas_from_record(c),
            _ => {
                log::warn!("document has no canvas section, using defaults");
                DimensionEngine::default().config().clone()
            }
        };

        let raw_nodes = match root.remove("nodes").or_else(|| root.remove("elements")) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                log::warn!("`nodes` is not an array, ignoring");
                Vec::new()
            }
            None => Vec::new(),
        };
        let nodes = raw_nodes
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(rec) => Some(rec),
                other => {
                    log::warn!("skipping non-object node record: {other}");
                    None
                }
            })
            .collect();

        Ok(Self {
            version,
            timestamp,
            canvas,
            nodes,
        })
    }
}

fn canvas_from_record(rec: &NodeRecord) -> CanvasConfig {
    let defaults = DimensionEngine::default().config().clone();
    CanvasConfig {
        width_inches: f64_field(rec, K_CANVAS_W).unwrap_or(defaults.width_inches),
        height_inches: f64_field(rec, K_CANVAS_H).unwrap_or(defaults.height_inches),
        paper_size: str_field(rec, K_PAPER).unwrap_or(defaults.paper_size),
        orientation: str_field(rec, &["orientation"])
            .and_then(|o| Orientation::parse(&o))
            .unwrap_or(defaults.orientation),
        dpi: f64_field(rec, K_DPI)
            .map(|d| d.round().clamp(0.0, f64::from(u32::MAX)) as u32)
            .unwrap_or(defaults.dpi),
    }
}

/// RFC 3339 timestamp for a freshly serialized document.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ─── Scene → records ─────────────────────────────────────────────────────

/// Serialize every top-level node. Ephemeral groups are flattened: their
/// children are written with absolute coordinates and the group itself is
/// not persisted.
pub fn serialize_scene(graph: &SceneGraph, canvas: &CanvasConfig, timestamp: String) -> DocumentState {
    let mut nodes = Vec::new();
    for idx in graph.top_level() {
        collect_records(graph, idx, &mut nodes);
    }
    DocumentState {
        version: DOCUMENT_VERSION.to_string(),
        timestamp,
        canvas: canvas.clone(),
        nodes,
    }
}

fn collect_records(graph: &SceneGraph, idx: petgraph::graph::NodeIndex, out: &mut Vec<NodeRecord>) {
    let node = &graph.graph[idx];
    match &node.kind {
        NodeKind::Group => {
            for child in graph.children(idx) {
                collect_records(graph, child, out);
            }
        }
        NodeKind::Layer | NodeKind::Background => {}
        _ => {
            let (x, y) = graph.absolute_position(idx);
            if let Some(rec) = node_to_record(node, x, y) {
                out.push(rec);
            }
        }
    }
}

/// Flat record for one node at the given absolute position.
pub fn node_to_record(node: &Node, x: f64, y: f64) -> Option<NodeRecord> {
    let node_type = node.node_type()?;
    let mut rec = Map::new();
    rec.insert("node_type".into(), json!(node_type.as_str()));
    rec.insert("id".into(), json!(node.id.as_str()));
    rec.insert("x".into(), json!(x));
    rec.insert("y".into(), json!(y));
    rec.insert("width".into(), json!(node.width));
    rec.insert("height".into(), json!(node.height));
    rec.insert("rotation".into(), json!(node.rotation));
    rec.insert("scale_x".into(), json!(node.scale_x));
    rec.insert("scale_y".into(), json!(node.scale_y));
    rec.insert("draggable".into(), json!(node.draggable));

    match &node.kind {
        NodeKind::Text(t) => write_text_fields(&mut rec, t),
        NodeKind::Image(i) => {
            rec.insert("src".into(), json!(i.src));
            rec.insert("is_client_logo".into(), json!(i.is_client_logo));
            if let Some((w, h)) = i.natural_size {
                rec.insert("natural_width".into(), json!(w));
                rec.insert("natural_height".into(), json!(h));
            }
        }
        NodeKind::Shape(s) => {
            rec.insert("shape_type".into(), json!(s.shape_type.as_str()));
            rec.insert("fill".into(), s.fill.as_ref().map_or(Value::Null, |f| json!(f)));
            rec.insert("stroke".into(), json!(s.stroke));
            rec.insert("stroke_width".into(), json!(s.stroke_width));
            if s.shape_type == ShapeType::Line {
                rec.insert("points".into(), json!(s.points.as_slice()));
            }
        }
        NodeKind::Placeholder(p) => write_placeholder_fields(&mut rec, p),
        NodeKind::Layer | NodeKind::Background | NodeKind::Group => return None,
    }
    Some(rec)
}

fn write_text_fields(rec: &mut NodeRecord, t: &TextProps) {
    rec.insert("text".into(), json!(t.text));
    rec.insert("font_size".into(), json!(t.font.size));
    rec.insert("font_family".into(), json!(t.font.family));
    rec.insert("font_style".into(), json!(t.font.style.as_css()));
    rec.insert("fill".into(), json!(t.fill));
    rec.insert("align".into(), json!(t.align.as_str()));
    rec.insert("padding".into(), json!(t.padding));
    rec.insert("wrap".into(), json!(t.wrap.as_str()));
    rec.insert("underline".into(), json!(t.underline));
    rec.insert("auto_width".into(), json!(t.auto_width));
}

fn write_placeholder_fields(rec: &mut NodeRecord, p: &PlaceholderProps) {
    rec.insert("placeholder_id".into(), json!(p.identifier));
    rec.insert("placeholder_family".into(), json!(p.family.as_str()));
    // duplicates read by pre-2.0 loaders
    rec.insert("placeholderId".into(), json!(p.identifier));
    rec.insert("placeholderType".into(), json!(p.family.as_str()));

    let mut state = Map::new();
    match &p.state {
        PlaceholderState::Text(t) => {
            state.insert("kind".into(), json!("text"));
            write_text_fields(&mut state, t);
            write_text_fields(rec, t);
        }
        PlaceholderState::Qr { payload } => {
            state.insert("kind".into(), json!(ImageKind::Qr.as_str()));
            state.insert("payload".into(), json!(payload));
            rec.insert("qr_data".into(), json!(payload));
        }
        PlaceholderState::Barcode { payload, format } => {
            state.insert("kind".into(), json!(ImageKind::Barcode.as_str()));
            state.insert("payload".into(), json!(payload));
            state.insert("format".into(), json!(format));
            rec.insert("barcode_data".into(), json!(payload));
            rec.insert("barcode_format".into(), json!(format));
        }
        PlaceholderState::Logo { tenant_id, src } => {
            state.insert("kind".into(), json!(ImageKind::Logo.as_str()));
            state.insert("tenant_id".into(), json!(tenant_id));
            state.insert("src".into(), json!(src));
            if let Some(src) = src {
                rec.insert("logo_src".into(), json!(src));
            }
        }
    }
    if let PlaceholderVisual::Raster(fit) = &p.visual {
        state.insert("natural_width".into(), json!(fit.natural_width));
        state.insert("natural_height".into(), json!(fit.natural_height));
        if let RasterSource::Src(src) = &fit.source {
            state.insert("image_src".into(), json!(src));
        }
    }
    rec.insert("state".into(), Value::Object(state));
}

// ─── Records → nodes ─────────────────────────────────────────────────────

/// Rebuild nodes from a document. The caller applies `doc.canvas` first so
/// positions are read against the restored DPI/paper size.
///
/// Records that cannot be classified or are missing required fields are
/// skipped with a warning.
pub fn deserialize_nodes(
    doc: &DocumentState,
    config: &EditorConfig,
    measurer: &dyn TextMeasurer,
) -> Vec<Node> {
    doc.nodes
        .iter()
        .enumerate()
        .filter_map(|(i, rec)| {
            let node = record_to_node(rec, config, measurer);
            if node.is_none() {
                log::warn!("dropping node record #{i}: cannot classify {rec:?}");
            }
            node
        })
        .collect()
}

/// Decode one flat record.
pub fn record_to_node(
    rec: &NodeRecord,
    config: &EditorConfig,
    measurer: &dyn TextMeasurer,
) -> Option<Node> {
    let node_type = str_field(rec, K_NODE_TYPE).and_then(|t| NodeType::parse(&t))?;

    let kind = match node_type {
        NodeType::Text => NodeKind::Text(text_from_record(rec, config)),
        NodeType::Image => NodeKind::Image(ImageProps {
            src: str_field(rec, K_SRC).unwrap_or_default(),
            is_client_logo: bool_field(rec, K_CLIENT_LOGO).unwrap_or(false),
            natural_size: f64_field(rec, K_NATURAL_W).zip(f64_field(rec, K_NATURAL_H)),
        }),
        NodeType::Shape => NodeKind::Shape(shape_from_record(rec)?),
        NodeType::Placeholder => NodeKind::Placeholder(placeholder_from_record(rec, config)?),
    };

    let id = str_field(rec, &["id"])
        .filter(|s| !s.is_empty())
        .map(|s| NodeId::intern(&s))
        .unwrap_or_else(|| NodeId::with_prefix(kind.id_prefix()));

    let mut node = Node::new(id, kind);
    node.x = f64_field(rec, &["x"]).unwrap_or(0.0);
    node.y = f64_field(rec, &["y"]).unwrap_or(0.0);
    node.rotation = f64_field(rec, &["rotation"]).unwrap_or(0.0);
    node.scale_x = f64_field(rec, K_SCALE_X).unwrap_or(1.0);
    node.scale_y = f64_field(rec, K_SCALE_Y).unwrap_or(1.0);
    node.draggable = bool_field(rec, &["draggable"]).unwrap_or(true);

    let width = f64_field(rec, &["width"]);
    let height = f64_field(rec, &["height"]);
    let (dw, dh) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        _ => default_size(&node, config, measurer),
    };
    node.width = width.unwrap_or(dw).max(0.0);
    node.height = height.unwrap_or(dh).max(0.0);

    // a document saved mid-gesture still loads with scale baked in
    node.bake_scale();
    restore_raster_fit(&mut node, config);
    Some(node)
}

fn default_size(node: &Node, config: &EditorConfig, measurer: &dyn TextMeasurer) -> (f64, f64) {
    use crate::factory::*;
    match &node.kind {
        NodeKind::Text(t) => auto_size(&t.text, &t.font, t.wrap, t.padding, config.min_text_size(), measurer),
        NodeKind::Placeholder(p) => match (&p.state, p.image_kind()) {
            (PlaceholderState::Text(t), _) => {
                auto_size(&t.text, &t.font, t.wrap, t.padding, config.min_text_size(), measurer)
            }
            (_, Some(kind)) => kind.default_size(),
            _ => DEFAULT_TEXT_SIZE,
        },
        NodeKind::Image(_) => DEFAULT_IMAGE_SIZE,
        NodeKind::Shape(s) if s.shape_type == ShapeType::Line => {
            let (ex, ey) = s.line_end();
            (ex.abs(), ey.abs())
        }
        NodeKind::Shape(_) => DEFAULT_RECT_SIZE,
        _ => (0.0, 0.0),
    }
}

fn text_from_record(rec: &NodeRecord, config: &EditorConfig) -> TextProps {
    let defaults = TextProps::default();
    let underline = bool_field(rec, K_UNDERLINE).unwrap_or_else(|| {
        str_field(rec, K_DECORATION).is_some_and(|d| d.contains("underline"))
    });
    TextProps {
        text: str_field(rec, K_TEXT).unwrap_or_default(),
        font: FontSpec {
            family: str_field(rec, K_FONT_FAMILY).unwrap_or(defaults.font.family),
            size: f64_field(rec, K_FONT_SIZE)
                .filter(|s| *s > 0.0)
                .unwrap_or(defaults.font.size),
            style: str_field(rec, K_FONT_STYLE)
                .map(|s| FontStyle::parse(&s))
                .unwrap_or_default(),
        },
        fill: str_field(rec, K_FILL).unwrap_or(defaults.fill),
        align: str_field(rec, K_ALIGN)
            .and_then(|a| TextAlign::parse(&a))
            .unwrap_or_default(),
        padding: f64_field(rec, &["padding"]).unwrap_or(config.text_padding),
        wrap: str_field(rec, K_WRAP)
            .and_then(|w| WrapMode::parse(&w))
            .unwrap_or_default(),
        underline,
        auto_width: bool_field(rec, K_AUTO_WIDTH).unwrap_or(false),
    }
}

fn shape_from_record(rec: &NodeRecord) -> Option<ShapeProps> {
    let shape_type = str_field(rec, K_SHAPE_TYPE).and_then(|s| ShapeType::parse(&s))?;
    let fill = match shape_type {
        ShapeType::Rectangle => Some(str_field(rec, K_FILL).unwrap_or_else(|| "#000000".into())),
        _ => str_field(rec, K_FILL).filter(|f| f != "transparent"),
    };
    let mut points: smallvec::SmallVec<[f64; 4]> = field(rec, &["points"])
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    if shape_type == ShapeType::Line && points.len() < 4 {
        let w = f64_field(rec, &["width"]).unwrap_or(crate::factory::DEFAULT_LINE_LENGTH);
        points = smallvec::smallvec![0.0, 0.0, w, 0.0];
    }
    Some(ShapeProps {
        shape_type,
        fill,
        stroke: str_field(rec, K_STROKE).unwrap_or_else(|| "#000000".into()),
        stroke_width: f64_field(rec, K_STROKE_WIDTH).unwrap_or(crate::factory::DEFAULT_STROKE_WIDTH),
        points,
    })
}

fn placeholder_from_record(rec: &NodeRecord, config: &EditorConfig) -> Option<PlaceholderProps> {
    let raw_id = str_field(rec, K_PLACEHOLDER_ID)?;
    let identifier = match PlaceholderId::parse(&raw_id) {
        Ok(id) => id.to_string(),
        Err(e) => {
            log::warn!("{e}");
            return None;
        }
    };
    let family = PlaceholderFamily::of(&identifier);
    if let Some(stored) = str_field(rec, K_FAMILY)
        && stored != family.as_str()
    {
        log::debug!("placeholder {identifier} stored as {stored}, routed as {}", family.as_str());
    }

    // state blob first, legacy flat fields second
    let empty = Map::new();
    let state_rec = match field(rec, K_STATE) {
        Some(Value::Object(s)) => s,
        _ => &empty,
    };
    let pick_str = |keys: &[&str]| str_field(state_rec, keys).or_else(|| str_field(rec, keys));

    let state = match ImageKind::of(&identifier) {
        None => {
            let source = if state_rec.is_empty() { rec } else { state_rec };
            let mut text = text_from_record(source, config);
            if text.text.is_empty() {
                text.text = sample_value(&identifier);
            }
            PlaceholderState::Text(text)
        }
        Some(ImageKind::Qr) => PlaceholderState::Qr {
            payload: pick_str(K_QR_PAYLOAD).unwrap_or_else(|| sample_value(&identifier)),
        },
        Some(ImageKind::Barcode) => PlaceholderState::Barcode {
            payload: pick_str(K_BARCODE_PAYLOAD).unwrap_or_else(|| sample_value(&identifier)),
            format: pick_str(K_BARCODE_FORMAT).unwrap_or_else(|| DEFAULT_BARCODE_FORMAT.into()),
        },
        Some(ImageKind::Logo) => PlaceholderState::Logo {
            tenant_id: pick_str(K_TENANT),
            src: pick_str(K_LOGO_SRC),
        },
    };

    let visual = match &state {
        PlaceholderState::Text(_) => PlaceholderVisual::Text,
        _ => match (
            str_field(state_rec, K_IMAGE_CACHE),
            f64_field(state_rec, K_NATURAL_W),
            f64_field(state_rec, K_NATURAL_H),
        ) {
            (Some(src), Some(w), Some(h)) => PlaceholderVisual::Raster(RasterFit {
                source: RasterSource::Src(src),
                natural_width: w,
                natural_height: h,
                draw: Bounds::default(),
            }),
            _ => PlaceholderVisual::Pending,
        },
    };

    Some(PlaceholderProps {
        identifier,
        family,
        state,
        visual,
    })
}

/// Recompute the draw rect of a cached raster against the node's box.
fn restore_raster_fit(node: &mut Node, config: &EditorConfig) {
    let (w, h) = (node.width, node.height);
    if let NodeKind::Placeholder(p) = &mut node.kind
        && let Some(kind) = p.state.image_kind()
        && let PlaceholderVisual::Raster(fit) = &mut p.visual
    {
        fit.draw = raster_draw_rect(kind, (fit.natural_width, fit.natural_height), w, h, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::metrics::FallbackMeasurer;
    use pretty_assertions::assert_eq;

    fn roundtrip(node: Node) -> Node {
        let mut graph = SceneGraph::new();
        graph.add_node(graph.root, node);
        let canvas = DimensionEngine::default().config().clone();
        let doc = serialize_scene(&graph, &canvas, now_timestamp());
        let json = doc.to_json_string().unwrap();
        let back = DocumentState::from_json_str(&json).unwrap();
        let mut nodes = deserialize_nodes(&back, &EditorConfig::default(), &FallbackMeasurer);
        assert_eq!(nodes.len(), 1);
        nodes.remove(0)
    }

    #[test]
    fn text_roundtrip() {
        let mut node = factory::text(NodeId::intern("doc_text"), 12.0, 34.0, "Hello");
        if let NodeKind::Text(t) = &mut node.kind {
            t.font.size = 16.0;
            t.fill = "#000000".into();
        }
        let back = roundtrip(node.clone());
        assert_eq!(back.kind, node.kind);
        assert_eq!((back.x, back.y), (12.0, 34.0));
    }

    #[test]
    fn canvas_uses_legacy_keys() {
        let json = r#"{
            "canvas": { "widthInches": 3, "heightInches": 2, "paperSize": "Label_3x2", "orientation": "landscape", "DPI": 203 },
            "nodes": []
        }"#;
        let doc = DocumentState::from_json_str(json).unwrap();
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.canvas.width_inches, 3.0);
        assert_eq!(doc.canvas.paper_size, "Label_3x2");
        assert_eq!(doc.canvas.orientation, Orientation::Landscape);
        assert_eq!(doc.canvas.dpi, 203);
    }

    #[test]
    fn legacy_text_keys() {
        let mut rec = Map::new();
        rec.insert("type".into(), json!("text"));
        rec.insert("content".into(), json!("Legacy"));
        rec.insert("fontSize".into(), json!(18));
        rec.insert("fontFamily".into(), json!("Arial"));
        rec.insert("textDecoration".into(), json!("underline"));
        rec.insert("scaleX".into(), json!(2.0));
        rec.insert("width".into(), json!(100.0));
        rec.insert("height".into(), json!(40.0));

        let node = record_to_node(&rec, &EditorConfig::default(), &FallbackMeasurer).unwrap();
        let NodeKind::Text(t) = &node.kind else {
            panic!("expected text");
        };
        assert_eq!(t.text, "Legacy");
        assert_eq!(t.font.size, 18.0);
        assert_eq!(t.font.family, "Arial");
        assert!(t.underline);
        // scale baked into size
        assert_eq!((node.width, node.scale_x), (200.0, 1.0));
    }

    #[test]
    fn unknown_records_are_dropped() {
        let json = r#"{
            "version": "2.0",
            "canvas": { "width_inches": 4, "height_inches": 6, "paper_size": "Label_4x6", "orientation": "portrait", "dpi": 96 },
            "nodes": [
                { "node_type": "hologram", "x": 1 },
                { "x": 2 },
                42,
                { "node_type": "shape", "shape_type": "blob" },
                { "node_type": "placeholder", "placeholder_id": "bad id" },
                { "node_type": "shape", "shape_type": "rectangle", "x": 5, "y": 6, "width": 10, "height": 20 }
            ]
        }"#;
        let doc = DocumentState::from_json_str(json).unwrap();
        let nodes = deserialize_nodes(&doc, &EditorConfig::default(), &FallbackMeasurer);
        assert_eq!(nodes.len(), 1);
        assert_eq!((nodes[0].x, nodes[0].y, nodes[0].width), (5.0, 6.0, 10.0));
    }

    #[test]
    fn non_object_document_is_an_error() {
        assert!(DocumentState::from_json_str("[1,2]").is_err());
        assert!(DocumentState::from_json_str("{ nope").is_err());
    }

    #[test]
    fn placeholder_records_carry_state_and_legacy_fields() {
        let node = crate::placeholder::create_placeholder(
            NodeId::intern("doc_ph_bar"),
            "Device.Barcode",
            0.0,
            0.0,
            None,
            &EditorConfig::default(),
            &FallbackMeasurer,
        )
        .unwrap();
        let rec = node_to_record(&node, 0.0, 0.0).unwrap();
        assert_eq!(rec["placeholder_id"], json!("Device.Barcode"));
        assert_eq!(rec["placeholderId"], json!("Device.Barcode"));
        assert_eq!(rec["placeholder_family"], json!("image"));
        assert_eq!(rec["state"]["kind"], json!("barcode"));
        assert_eq!(rec["state"]["format"], json!("CODE128"));
        assert_eq!(rec["barcode_data"], rec["state"]["payload"]);

        let back = roundtrip(node.clone());
        let (NodeKind::Placeholder(a), NodeKind::Placeholder(b)) = (&node.kind, &back.kind) else {
            panic!("expected placeholders");
        };
        assert_eq!(a.state, b.state);
        assert!(b.is_pending());
    }

    #[test]
    fn legacy_flat_qr_placeholder() {
        let mut rec = Map::new();
        rec.insert("nodeType".into(), json!("placeholder"));
        rec.insert("placeholderId".into(), json!("Device.QRCode"));
        rec.insert("qrData".into(), json!("https://legacy.example/1"));
        let node = record_to_node(&rec, &EditorConfig::default(), &FallbackMeasurer).unwrap();
        let NodeKind::Placeholder(p) = &node.kind else {
            panic!("expected placeholder");
        };
        assert_eq!(
            p.state,
            PlaceholderState::Qr {
                payload: "https://legacy.example/1".into()
            }
        );
        assert_eq!((node.width, node.height), (100.0, 100.0));
    }

    #[test]
    fn cached_raster_skips_regeneration() {
        let mut rec = Map::new();
        rec.insert("node_type".into(), json!("placeholder"));
        rec.insert("placeholder_id".into(), json!("Client.Logo"));
        rec.insert("width".into(), json!(100.0));
        rec.insert("height".into(), json!(100.0));
        rec.insert(
            "state".into(),
            json!({ "kind": "logo", "image_src": "https://cdn.example/logo.png", "natural_width": 200.0, "natural_height": 100.0 }),
        );
        let node = record_to_node(&rec, &EditorConfig::default(), &FallbackMeasurer).unwrap();
        let NodeKind::Placeholder(p) = &node.kind else {
            panic!("expected placeholder");
        };
        let PlaceholderVisual::Raster(fit) = &p.visual else {
            panic!("expected cached raster");
        };
        assert_eq!(fit.draw, Bounds::new(0.0, 25.0, 100.0, 50.0));
    }

    #[test]
    fn groups_are_flattened_to_absolute() {
        let mut graph = SceneGraph::new();
        let mut group = Node::new(NodeId::intern("doc_group"), NodeKind::Group);
        group.x = 100.0;
        group.y = 50.0;
        let g = graph.add_node(graph.root, group);
        graph.add_node(g, factory::filled_rectangle(NodeId::intern("doc_child"), 5.0, 5.0));

        let canvas = DimensionEngine::default().config().clone();
        let doc = serialize_scene(&graph, &canvas, String::new());
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0]["x"], json!(105.0));
        assert_eq!(doc.nodes[0]["y"], json!(55.0));
        assert_eq!(doc.nodes[0]["node_type"], json!("shape"));
    }
}

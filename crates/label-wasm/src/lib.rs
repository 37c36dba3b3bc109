//! WASM bridge for the label designer: exposes the canvas controller to
//! JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Structured values cross the
//! boundary as JSON strings; raster jobs are handed to JS and completed
//! through `complete_job_*`.

mod logger;
mod measure;
mod render2d;

use label_core::config::EditorConfig;
use label_core::dimension::Orientation;
use label_core::document::DocumentState;
use label_core::id::NodeId;
use label_core::model::{ShapeType, TextAlign, WrapMode};
use label_core::placeholder::{PlaceholderId, sample_value};
use label_editor::{
    Canvas, DoubleClickOutcome, InputEvent, JobId, JobOutcome, LayoutAxis, LayoutState,
    Modifiers, MountTarget, StyleChange,
};
use serde::Deserialize;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// The main WASM-facing canvas controller. All interaction from the page
/// goes through this struct.
#[wasm_bindgen]
pub struct LabelCanvas {
    canvas: Canvas,
    /// Decoded `<img>` elements per node, registered by the host.
    images: HashMap<NodeId, HtmlImageElement>,
}

#[wasm_bindgen]
impl LabelCanvas {
    /// Create a controller. `config_json` may be empty or a partial
    /// `EditorConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Self {
        console_error_panic_hook_setup();

        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json_str(config_json).unwrap_or_else(|e| {
                log::warn!("invalid editor config ({e}), using defaults");
                EditorConfig::default()
            })
        };
        Self {
            canvas: Canvas::headless(config),
            images: HashMap::new(),
        }
    }

    /// Mount into a container of the given size. Pass `undefined` when the
    /// container element could not be found.
    pub fn mount(&mut self, width: Option<f64>, height: Option<f64>) -> bool {
        let target = width.zip(height).map(|(width, height)| MountTarget { width, height });
        self.canvas.initialize(target)
    }

    /// Measure text with this context from now on.
    pub fn use_measure_context(&mut self, ctx: CanvasRenderingContext2d) {
        self.canvas.set_measurer(measure::CanvasTextMeasurer::new(ctx));
    }

    /// Re-measure text nodes waiting on fonts. Call after `document.fonts`
    /// settles.
    pub fn run_deferred_measurements(&mut self) -> usize {
        self.canvas.run_deferred_measurements()
    }

    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let frame = render2d::RenderContext {
            images: &self.images,
            editing: self.canvas.text_editor().editing(),
        };
        render2d::render_scene(ctx, &self.canvas, &frame);
    }

    // ─── Page ────────────────────────────────────────────────────────────

    pub fn set_paper_size(&mut self, name: &str) -> bool {
        self.canvas.update_dimensions(|d| d.set_paper_size(name))
    }

    pub fn set_orientation(&mut self, orientation: &str) -> bool {
        let Some(orientation) = Orientation::parse(orientation) else {
            log::warn!("unknown orientation `{orientation}`");
            return false;
        };
        self.canvas.update_dimensions(|d| d.set_orientation(orientation))
    }

    pub fn toggle_orientation(&mut self) -> bool {
        self.canvas.update_dimensions(|d| d.toggle_orientation())
    }

    pub fn set_dpi(&mut self, dpi: u32) -> bool {
        self.canvas.update_dimensions(|d| d.set_dpi(dpi))
    }

    pub fn set_custom_dimensions(&mut self, width_mm: f64, height_mm: f64) -> bool {
        self.canvas
            .update_dimensions(|d| d.set_custom_dimensions(width_mm, height_mm))
    }

    /// Current page configuration as JSON.
    pub fn get_canvas_config(&self) -> String {
        serde_json::to_string(self.canvas.dimensions().config()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Paper presets as a JSON array.
    pub fn get_paper_presets(&self) -> String {
        serde_json::to_string(self.canvas.dimensions().presets()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn stage_width(&self) -> f64 {
        self.canvas.stage_size().0
    }

    pub fn stage_height(&self) -> f64 {
        self.canvas.stage_size().1
    }

    pub fn has_elements(&self) -> bool {
        self.canvas.has_elements()
    }

    // ─── Elements ────────────────────────────────────────────────────────

    pub fn add_text(&mut self, x: f64, y: f64, content: &str) -> String {
        self.canvas.add_text(x, y, content).as_str().to_string()
    }

    /// `shape` is `rectangle`, `outlined-rectangle`, or `line`. Returns the
    /// new ID, or an empty string for unknown shapes.
    pub fn add_shape(&mut self, shape: &str, x: f64, y: f64) -> String {
        match ShapeType::parse(shape) {
            Some(shape_type) => self.canvas.add_shape(shape_type, x, y).as_str().to_string(),
            None => {
                log::warn!("unknown shape type `{shape}`");
                String::new()
            }
        }
    }

    pub fn add_image(&mut self, x: f64, y: f64, src: &str, is_client_logo: bool) -> String {
        self.canvas.add_image(x, y, src, is_client_logo).as_str().to_string()
    }

    /// Returns the new ID, or an empty string for an invalid identifier.
    pub fn add_placeholder(&mut self, identifier: &str, x: f64, y: f64) -> String {
        self.canvas
            .add_placeholder(identifier, x, y)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn remove_element(&mut self, node_id: &str) -> bool {
        let id = NodeId::intern(node_id);
        self.images.remove(&id);
        self.canvas.remove_element(id)
    }

    pub fn clear_canvas(&mut self) {
        self.images.clear();
        self.canvas.clear_canvas();
    }

    pub fn duplicate_selected(&mut self) -> String {
        let Some(id) = self.canvas.selected() else {
            return String::new();
        };
        match self.canvas.duplicate_node(id) {
            Some(copy) => {
                if let Some(img) = self.images.get(&id).cloned() {
                    self.images.insert(copy, img);
                }
                copy.as_str().to_string()
            }
            None => String::new(),
        }
    }

    pub fn bring_to_front(&mut self, node_id: &str) -> bool {
        self.canvas.bring_to_front(NodeId::intern(node_id))
    }

    pub fn send_to_back(&mut self, node_id: &str) -> bool {
        self.canvas.send_to_back(NodeId::intern(node_id))
    }

    pub fn set_draggable(&mut self, node_id: &str, draggable: bool) -> bool {
        self.canvas.set_draggable(NodeId::intern(node_id), draggable)
    }

    pub fn move_node(&mut self, node_id: &str, dx: f64, dy: f64) -> bool {
        self.canvas.move_node(NodeId::intern(node_id), dx, dy)
    }

    pub fn resize_node(&mut self, node_id: &str, width: f64, height: f64) -> bool {
        self.canvas.resize_node(NodeId::intern(node_id), width, height)
    }

    /// End of a host-driven resize: bake the scale into the size.
    pub fn transform_end(&mut self, node_id: &str, scale_x: f64, scale_y: f64) -> bool {
        self.canvas.transform_end(NodeId::intern(node_id), scale_x, scale_y)
    }

    pub fn set_text(&mut self, node_id: &str, text: &str) -> bool {
        self.canvas.set_text(NodeId::intern(node_id), text)
    }

    /// Apply a JSON style patch, e.g. `{"fontSize": 18, "bold": true}`.
    pub fn set_text_style(&mut self, node_id: &str, patch_json: &str) -> bool {
        let Some(changes) = parse_style_patch(patch_json) else {
            return false;
        };
        let id = NodeId::intern(node_id);
        let mut changed = false;
        for change in &changes {
            changed |= self.canvas.set_text_style(id, change);
        }
        changed
    }

    pub fn set_shape_style(
        &mut self,
        node_id: &str,
        fill: Option<String>,
        stroke: Option<String>,
        stroke_width: Option<f64>,
    ) -> bool {
        self.canvas
            .set_shape_style(NodeId::intern(node_id), fill, stroke, stroke_width)
    }

    /// Node properties as JSON, in document record form.
    pub fn get_node_props(&self, node_id: &str) -> String {
        let graph = self.canvas.graph();
        let Some(idx) = graph.index_of(NodeId::intern(node_id)) else {
            return "{}".to_string();
        };
        let (x, y) = graph.absolute_position(idx);
        graph
            .get(idx)
            .and_then(|node| label_core::document::node_to_record(node, x, y))
            .and_then(|rec| serde_json::to_string(&rec).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    // ─── Selection & input ───────────────────────────────────────────────

    pub fn select_by_id(&mut self, node_id: &str) -> bool {
        self.canvas.select_shape(NodeId::intern(node_id))
    }

    pub fn clear_selection(&mut self) {
        self.canvas.clear_selection();
    }

    /// Selected node ID, or an empty string.
    pub fn get_selected_id(&self) -> String {
        self.canvas
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Selected node's bounding box as `{x, y, width, height}` JSON.
    pub fn get_selection_bounds(&self) -> String {
        match self.canvas.selection_bounds() {
            Some(b) => serde_json::json!({ "x": b.x, "y": b.y, "width": b.width, "height": b.height })
                .to_string(),
            None => "null".to_string(),
        }
    }

    /// Returns the selected ID after the click.
    pub fn handle_click(&mut self, x: f64, y: f64) -> String {
        self.canvas
            .handle_click(x, y)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Returns `{"kind":"nothing"}`, `{"kind":"escaped","id":…}`, or
    /// `{"kind":"edit_text","overlay":{…}}`.
    pub fn handle_double_click(&mut self, x: f64, y: f64) -> String {
        let value = match self.canvas.handle_double_click(x, y) {
            DoubleClickOutcome::Nothing => serde_json::json!({ "kind": "nothing" }),
            DoubleClickOutcome::Escaped(id) => serde_json::json!({ "kind": "escaped", "id": id }),
            DoubleClickOutcome::EditText(overlay) => {
                serde_json::json!({ "kind": "edit_text", "overlay": overlay })
            }
        };
        value.to_string()
    }

    pub fn handle_pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let modifiers = Modifiers { shift, alt, ctrl, meta };
        self.canvas.handle_event(&InputEvent::PointerDown { x, y, modifiers })
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.canvas.handle_event(&InputEvent::PointerMove { x, y })
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.canvas.handle_event(&InputEvent::PointerUp { x, y })
    }

    pub fn handle_key(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let modifiers = Modifiers { shift, alt, ctrl, meta };
        self.canvas.handle_event(&InputEvent::Key {
            key: key.to_string(),
            modifiers,
        })
    }

    // ─── Text editing ────────────────────────────────────────────────────

    /// Overlay descriptor JSON, or `null` when the node has no text.
    pub fn begin_text_edit(&mut self, node_id: &str) -> String {
        overlay_json(self.canvas.begin_text_edit(NodeId::intern(node_id)))
    }

    pub fn get_text_overlay(&self) -> String {
        overlay_json(self.canvas.text_overlay())
    }

    pub fn text_input(&mut self, text: &str) -> bool {
        self.canvas.text_input(text)
    }

    pub fn text_edit_style(&mut self, patch_json: &str) -> bool {
        let Some(changes) = parse_style_patch(patch_json) else {
            return false;
        };
        let mut changed = false;
        for change in &changes {
            changed |= self.canvas.text_edit_style(change);
        }
        changed
    }

    pub fn commit_text_edit(&mut self) -> bool {
        self.canvas.commit_text_edit()
    }

    pub fn cancel_text_edit(&mut self) -> bool {
        self.canvas.cancel_text_edit()
    }

    // ─── List layout ─────────────────────────────────────────────────────

    /// Returns the new mode: `inactive` or `selecting`.
    pub fn toggle_list_mode(&mut self) -> String {
        layout_state_str(self.canvas.toggle_list_mode()).to_string()
    }

    pub fn get_layout_state(&self) -> String {
        layout_state_str(self.canvas.layout().state()).to_string()
    }

    /// IDs picked for the layout as a JSON array.
    pub fn get_layout_selection(&self) -> String {
        serde_json::to_string(self.canvas.layout().selected()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn toggle_layout_selection(&mut self, node_id: &str) -> bool {
        self.canvas.toggle_layout_selection(NodeId::intern(node_id))
    }

    /// `axis` is `horizontal` or `vertical`; `separator` defaults to the
    /// configured gap.
    pub fn apply_list_layout(&mut self, axis: &str, separator: Option<f64>) -> bool {
        let Some(axis) = LayoutAxis::parse(axis) else {
            log::warn!("unknown layout axis `{axis}`");
            return false;
        };
        self.canvas.apply_list_layout(axis, separator)
    }

    pub fn undo_last_layout(&mut self) -> bool {
        self.canvas.undo_last_layout()
    }

    pub fn cancel_list_layout(&mut self) -> bool {
        self.canvas.cancel_list_layout()
    }

    // ─── Raster jobs ─────────────────────────────────────────────────────

    /// Queued raster jobs as a JSON array; they are handed off and must be
    /// completed with one of the `complete_job_*` calls.
    pub fn take_jobs(&mut self) -> String {
        serde_json::to_string(&self.canvas.take_jobs()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn complete_job_bytes(&mut self, job_id: f64, node_id: &str, bytes: &js_sys::Uint8Array) -> bool {
        self.complete(job_id, node_id, JobOutcome::Bytes(bytes.to_vec()))
    }

    /// Completion with a URL or data URI the host already decoded into
    /// `img`. The source is cached in the document.
    pub fn complete_job_src(&mut self, job_id: f64, node_id: &str, img: HtmlImageElement) -> bool {
        let outcome = JobOutcome::Src {
            src: img.src(),
            width: f64::from(img.natural_width()),
            height: f64::from(img.natural_height()),
        };
        let applied = self.complete(job_id, node_id, outcome);
        if applied {
            self.images.insert(NodeId::intern(node_id), img);
        }
        applied
    }

    pub fn complete_job_empty(&mut self, job_id: f64, node_id: &str) -> bool {
        self.complete(job_id, node_id, JobOutcome::Empty)
    }

    pub fn fail_job(&mut self, job_id: f64, node_id: &str, reason: &str) -> bool {
        self.complete(job_id, node_id, JobOutcome::Failed(reason.to_string()))
    }

    /// Register a decoded image for a node (e.g. a cached raster restored
    /// from a document).
    pub fn attach_image(&mut self, node_id: &str, img: HtmlImageElement) {
        self.images.insert(NodeId::intern(node_id), img);
    }

    pub fn invalidate(&mut self, node_id: &str) -> bool {
        let id = NodeId::intern(node_id);
        self.images.remove(&id);
        self.canvas.invalidate(id)
    }

    // ─── Documents ───────────────────────────────────────────────────────

    /// Serialize the scene and page as a `CanvasStateV2` JSON document.
    pub fn save_json(&self) -> String {
        self.canvas
            .serialize_canvas_state()
            .to_json_string()
            .unwrap_or_else(|e| {
                log::error!("document serialization failed: {e}");
                String::new()
            })
    }

    /// Replace the scene with a stored document. Returns the number of
    /// nodes loaded, or -1 when the JSON is not a document.
    pub fn load_json(&mut self, json: &str) -> i32 {
        match DocumentState::from_json_str(json) {
            Ok(doc) => {
                self.images.clear();
                i32::try_from(self.canvas.deserialize_canvas_state(&doc)).unwrap_or(i32::MAX)
            }
            Err(e) => {
                log::error!("document load failed: {e}");
                -1
            }
        }
    }
}

impl LabelCanvas {
    fn complete(&mut self, job_id: f64, node_id: &str, outcome: JobOutcome) -> bool {
        if !(job_id.is_finite() && job_id >= 0.0) {
            return false;
        }
        self.canvas
            .complete_job(JobId(job_id as u64), NodeId::intern(node_id), outcome)
    }
}

/// Whether `identifier` is a usable `Category.Field` placeholder.
#[wasm_bindgen]
pub fn validate_placeholder(identifier: &str) -> bool {
    PlaceholderId::parse(identifier).is_ok()
}

/// Preview value shown for a placeholder identifier.
#[wasm_bindgen]
pub fn placeholder_sample(identifier: &str) -> String {
    sample_value(identifier)
}

/// Route `log` records to the browser console.
#[wasm_bindgen]
pub fn init_logging(verbose: bool) {
    #[cfg(target_arch = "wasm32")]
    {
        let level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        };
        logger::ConsoleLogger::init(level);
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = verbose;
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("label-wasm panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

fn overlay_json(overlay: Option<label_editor::OverlayDescriptor>) -> String {
    overlay
        .and_then(|o| serde_json::to_string(&o).ok())
        .unwrap_or_else(|| "null".to_string())
}

fn layout_state_str(state: LayoutState) -> &'static str {
    match state {
        LayoutState::Inactive => "inactive",
        LayoutState::Selecting => "selecting",
        LayoutState::LaidOut => "laid_out",
    }
}

// ─── Style patches ──────────────────────────────────────────────────────

/// Toolbar style patch. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StylePatch {
    font_size: Option<f64>,
    font_family: Option<String>,
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    align: Option<String>,
    fill: Option<String>,
    wrap: Option<String>,
    auto_width: Option<bool>,
}

impl StylePatch {
    fn into_changes(self) -> Vec<StyleChange> {
        let mut changes = Vec::new();
        if let Some(size) = self.font_size {
            changes.push(StyleChange::FontSize(size));
        }
        if let Some(family) = self.font_family {
            changes.push(StyleChange::FontFamily(family));
        }
        if let Some(on) = self.bold {
            changes.push(StyleChange::Bold(on));
        }
        if let Some(on) = self.italic {
            changes.push(StyleChange::Italic(on));
        }
        if let Some(on) = self.underline {
            changes.push(StyleChange::Underline(on));
        }
        if let Some(align) = self.align.as_deref().and_then(TextAlign::parse) {
            changes.push(StyleChange::Align(align));
        }
        if let Some(fill) = self.fill {
            changes.push(StyleChange::Fill(fill));
        }
        if let Some(wrap) = self.wrap.as_deref().and_then(WrapMode::parse) {
            changes.push(StyleChange::Wrap(wrap));
        }
        if let Some(on) = self.auto_width {
            changes.push(StyleChange::AutoWidth(on));
        }
        changes
    }
}

fn parse_style_patch(json: &str) -> Option<Vec<StyleChange>> {
    match serde_json::from_str::<StylePatch>(json) {
        Ok(patch) => Some(patch.into_changes()),
        Err(e) => {
            log::warn!("invalid style patch: {e}");
            None
        }
    }
}

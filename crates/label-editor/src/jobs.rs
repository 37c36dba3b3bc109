//! Raster job pipeline: the asynchronous boundary of the editor.
//!
//! Image nodes and image-family placeholders need pixels the core cannot
//! produce: a decoded image, a generated QR code or barcode, a fetched logo.
//! The controller queues a [`RasterJob`] for each; the host runs them (through
//! a [`RasterGenerator`] natively, or in JS) and reports an outcome.
//!
//! Completions may arrive after the node is deleted or after a newer job
//! for the same node was queued. Both are detected here and dropped without
//! touching the scene.

use label_core::config::EditorConfig;
use label_core::error::Result;
use label_core::id::NodeId;
use label_core::model::*;
use label_core::placeholder::{
    ImageKind, PlaceholderState, PlaceholderVisual, RasterFit, RasterSource,
    barcode_generation_height, fit_inside, qr_generation_size, raster_draw_rect,
};
use label_core::raster::decode_dimensions;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Opaque raster producer owned by the host.
pub trait RasterGenerator {
    fn generate_qr(&mut self, payload: &str, size_px: u32) -> Result<Vec<u8>>;

    fn generate_barcode(&mut self, payload: &str, format: &str, height_px: u32) -> Result<Vec<u8>>;

    /// Logo bytes for a tenant; `None` when the tenant has no logo.
    fn fetch_logo(&mut self, tenant_id: Option<&str>) -> Result<Option<Vec<u8>>>;

    /// Bytes behind an image URL or data URI.
    fn load_image(&mut self, src: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RasterRequest {
    Qr {
        payload: String,
        size_px: u32,
    },
    Barcode {
        payload: String,
        format: String,
        height_px: u32,
    },
    Logo {
        tenant_id: Option<String>,
        src: Option<String>,
    },
    Image {
        src: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterJob {
    pub id: JobId,
    pub node: NodeId,
    #[serde(flatten)]
    pub request: RasterRequest,
}

/// What the host reports back for a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Encoded image bytes; the natural size is probed here.
    Bytes(Vec<u8>),
    /// A URL or data URI the host already decoded. Cached in the document
    /// so a reload does not regenerate.
    Src { src: String, width: f64, height: f64 },
    /// Logo lookup found nothing.
    Empty,
    Failed(String),
}

impl From<Result<Vec<u8>>> for JobOutcome {
    fn from(result: Result<Vec<u8>>) -> Self {
        match result {
            Ok(bytes) => JobOutcome::Bytes(bytes),
            Err(e) => JobOutcome::Failed(e.to_string()),
        }
    }
}

/// Build the request a node needs right now, if any. Placeholders only need
/// one while `Pending`; image nodes until their natural size is known.
pub fn request_for(node: &Node, config: &EditorConfig) -> Option<RasterRequest> {
    match &node.kind {
        NodeKind::Image(img) if img.natural_size.is_none() && !img.src.is_empty() => {
            Some(RasterRequest::Image {
                src: img.src.clone(),
            })
        }
        NodeKind::Placeholder(p) if p.is_pending() => match &p.state {
            PlaceholderState::Text(_) => None,
            PlaceholderState::Qr { payload } => Some(RasterRequest::Qr {
                payload: payload.clone(),
                size_px: qr_generation_size(node.width, node.height, config) as u32,
            }),
            PlaceholderState::Barcode { payload, format } => Some(RasterRequest::Barcode {
                payload: payload.clone(),
                format: format.clone(),
                height_px: barcode_generation_height(node.height, config) as u32,
            }),
            PlaceholderState::Logo { tenant_id, src } => Some(RasterRequest::Logo {
                tenant_id: tenant_id.clone(),
                src: src.clone(),
            }),
        },
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct JobQueue {
    pending: VecDeque<RasterJob>,
    /// Newest job per node; older completions are superseded.
    latest: HashMap<NodeId, JobId>,
    next_id: u64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `request` for `node`, superseding any job still outstanding
    /// for it.
    pub fn enqueue(&mut self, node: NodeId, request: RasterRequest) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.pending.retain(|job| job.node != node);
        self.latest.insert(node, id);
        log::debug!("queued raster job {} for {node}: {request:?}", id.0);
        self.pending.push_back(RasterJob { id, node, request });
        id
    }

    pub fn pending(&self) -> impl Iterator<Item = &RasterJob> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Hand every queued job to the host. They stay outstanding until
    /// completed.
    pub fn take(&mut self) -> Vec<RasterJob> {
        self.pending.drain(..).collect()
    }

    /// Forget everything (canvas cleared or reloaded).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.latest.clear();
    }

    /// Whether `job` is still the newest job for its node. Consumes the
    /// outstanding entry when it is.
    fn settle(&mut self, job: JobId, node: NodeId) -> bool {
        match self.latest.get(&node) {
            Some(&latest) if latest == job => {
                self.latest.remove(&node);
                true
            }
            _ => false,
        }
    }

    /// Apply a job outcome to the scene.
    ///
    /// Returns `false` without mutating anything when the node is no longer
    /// attached or a newer job superseded this one.
    pub fn complete(
        &mut self,
        graph: &mut SceneGraph,
        config: &EditorConfig,
        job: JobId,
        node: NodeId,
        outcome: JobOutcome,
    ) -> bool {
        if !graph.contains(node) {
            log::debug!("raster job {} finished after {node} was removed, dropped", job.0);
            self.latest.remove(&node);
            return false;
        }
        if !self.settle(job, node) {
            log::debug!("raster job {} for {node} superseded, dropped", job.0);
            return false;
        }
        let Some(target) = graph.get_by_id_mut(node) else {
            return false;
        };

        let decoded = match outcome {
            JobOutcome::Bytes(bytes) => match decode_dimensions(&bytes) {
                Ok((w, h)) => Ok((RasterSource::Bytes(Arc::from(bytes)), f64::from(w), f64::from(h))),
                Err(e) => Err(e.to_string()),
            },
            JobOutcome::Src { src, width, height } if width > 0.0 && height > 0.0 => {
                Ok((RasterSource::Src(src), width, height))
            }
            JobOutcome::Src { .. } => Err("raster reported an empty size".to_string()),
            JobOutcome::Empty => Err("no image available".to_string()),
            JobOutcome::Failed(reason) => Err(reason),
        };

        match decoded {
            Ok((source, natural_w, natural_h)) => {
                apply_raster(target, source, natural_w, natural_h, config);
                true
            }
            Err(reason) => {
                apply_failure(target, &reason);
                true
            }
        }
    }

    /// Drain the queue through `generator`, completing every job
    /// synchronously. Returns the number of jobs applied.
    pub fn run_pending(
        &mut self,
        graph: &mut SceneGraph,
        config: &EditorConfig,
        generator: &mut dyn RasterGenerator,
    ) -> usize {
        let mut applied = 0;
        for job in self.take() {
            let outcome = run_job(&job.request, generator);
            if self.complete(graph, config, job.id, job.node, outcome) {
                applied += 1;
            }
        }
        applied
    }
}

fn run_job(request: &RasterRequest, generator: &mut dyn RasterGenerator) -> JobOutcome {
    match request {
        RasterRequest::Qr { payload, size_px } => generator.generate_qr(payload, *size_px).into(),
        RasterRequest::Barcode {
            payload,
            format,
            height_px,
        } => generator.generate_barcode(payload, format, *height_px).into(),
        RasterRequest::Logo { src: Some(src), .. } => generator.load_image(src).into(),
        RasterRequest::Logo { tenant_id, src: None } => {
            match generator.fetch_logo(tenant_id.as_deref()) {
                Ok(Some(bytes)) => JobOutcome::Bytes(bytes),
                Ok(None) => JobOutcome::Empty,
                Err(e) => JobOutcome::Failed(e.to_string()),
            }
        }
        RasterRequest::Image { src } => generator.load_image(src).into(),
    }
}

fn apply_raster(node: &mut Node, source: RasterSource, natural_w: f64, natural_h: f64, config: &EditorConfig) {
    let (width, height) = (node.width, node.height);
    match &mut node.kind {
        NodeKind::Placeholder(p) => {
            let Some(kind) = p.image_kind() else {
                return;
            };
            p.visual = PlaceholderVisual::Raster(RasterFit {
                source,
                natural_width: natural_w,
                natural_height: natural_h,
                draw: raster_draw_rect(kind, (natural_w, natural_h), width, height, config),
            });
        }
        NodeKind::Image(img) => {
            img.natural_size = Some((natural_w, natural_h));
            if img.is_client_logo {
                // shrink the box to the fitted logo, keeping its centre
                let fit = fit_inside(natural_w, natural_h, width, height);
                node.x += fit.x;
                node.y += fit.y;
                node.width = fit.width;
                node.height = fit.height;
            }
        }
        _ => {}
    }
}

fn apply_failure(node: &mut Node, reason: &str) {
    match &mut node.kind {
        NodeKind::Placeholder(p) => {
            let label = p.image_kind().map_or("Image", |k: ImageKind| k.fallback_label());
            log::warn!("raster for placeholder {} failed ({reason}), showing fallback", p.identifier);
            p.visual = PlaceholderVisual::Fallback {
                label: label.to_string(),
            };
        }
        NodeKind::Image(img) => {
            log::warn!("image {} failed to load: {reason}", img.src);
        }
        _ => {}
    }
}

/// Refit an image placeholder's decoded raster to the node's current box
/// after a resize. Never regenerates.
pub fn refit_raster(node: &mut Node, config: &EditorConfig) -> bool {
    let (width, height) = (node.width, node.height);
    if let NodeKind::Placeholder(p) = &mut node.kind
        && let Some(kind) = p.image_kind()
        && let PlaceholderVisual::Raster(fit) = &mut p.visual
    {
        fit.draw = raster_draw_rect(kind, (fit.natural_width, fit.natural_height), width, height, config);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use label_core::error::LabelError;
    use label_core::metrics::FallbackMeasurer;
    use label_core::placeholder::create_placeholder;
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image::RgbaImage::new(w, h))
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn placeholder(graph: &mut SceneGraph, id: &str, identifier: &str) -> NodeId {
        let node = create_placeholder(
            NodeId::intern(id),
            identifier,
            0.0,
            0.0,
            None,
            &EditorConfig::default(),
            &FallbackMeasurer,
        )
        .unwrap();
        let idx = graph.add_node(graph.root, node);
        graph.graph[idx].id
    }

    struct Failing;

    impl RasterGenerator for Failing {
        fn generate_qr(&mut self, _: &str, _: u32) -> Result<Vec<u8>> {
            Err(LabelError::Generator("offline".into()))
        }
        fn generate_barcode(&mut self, _: &str, _: &str, _: u32) -> Result<Vec<u8>> {
            Err(LabelError::Generator("offline".into()))
        }
        fn fetch_logo(&mut self, _: Option<&str>) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        fn load_image(&mut self, _: &str) -> Result<Vec<u8>> {
            Err(LabelError::Generator("offline".into()))
        }
    }

    #[test]
    fn qr_request_uses_quality_floor() {
        let mut graph = SceneGraph::new();
        let id = placeholder(&mut graph, "job_qr_req", "Device.QRCode");
        let request = request_for(graph.get_by_id(id).unwrap(), &EditorConfig::default());
        assert_eq!(
            request,
            Some(RasterRequest::Qr {
                payload: "https://example.com/d/SN-123456789".into(),
                size_px: 200
            })
        );
    }

    #[test]
    fn completion_after_removal_is_a_noop() {
        let config = EditorConfig::default();
        let mut graph = SceneGraph::new();
        let id = placeholder(&mut graph, "job_removed", "Device.QRCode");
        let mut queue = JobQueue::new();
        let request = request_for(graph.get_by_id(id).unwrap(), &config).unwrap();
        let job = queue.enqueue(id, request);

        let idx = graph.index_of(id).unwrap();
        graph.remove_node(idx);
        assert!(!queue.complete(&mut graph, &config, job, id, JobOutcome::Bytes(png(4, 4))));
        assert!(graph.is_empty());
    }

    #[test]
    fn superseded_job_is_dropped() {
        let config = EditorConfig::default();
        let mut graph = SceneGraph::new();
        let id = placeholder(&mut graph, "job_super", "Device.Barcode");
        let mut queue = JobQueue::new();
        let request = request_for(graph.get_by_id(id).unwrap(), &config).unwrap();
        let old = queue.enqueue(id, request.clone());
        let new = queue.enqueue(id, request);
        assert_eq!(queue.len(), 1);

        assert!(!queue.complete(&mut graph, &config, old, id, JobOutcome::Bytes(png(8, 4))));
        assert!(queue.complete(&mut graph, &config, new, id, JobOutcome::Bytes(png(8, 4))));
    }

    #[test]
    fn failure_shows_fallback_box() {
        let config = EditorConfig::default();
        let mut graph = SceneGraph::new();
        let qr = placeholder(&mut graph, "job_fail_qr", "Device.QRCode");
        let logo = placeholder(&mut graph, "job_fail_logo", "Client.Logo");
        let mut queue = JobQueue::new();
        for id in [qr, logo] {
            let request = request_for(graph.get_by_id(id).unwrap(), &config).unwrap();
            queue.enqueue(id, request);
        }

        assert_eq!(queue.run_pending(&mut graph, &config, &mut Failing), 2);
        let labels: Vec<_> = [qr, logo]
            .iter()
            .map(|id| match &graph.get_by_id(*id).unwrap().kind {
                NodeKind::Placeholder(p) => p.visual.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                PlaceholderVisual::Fallback { label: "QR Code".into() },
                PlaceholderVisual::Fallback { label: "Logo".into() },
            ]
        );
    }

    #[test]
    fn logo_image_fits_preserving_aspect() {
        let config = EditorConfig::default();
        let mut graph = SceneGraph::new();
        let mut logo = label_core::factory::image(NodeId::intern("job_logo_img"), 0.0, 0.0, "logo.png", true);
        logo.width = 100.0;
        logo.height = 100.0;
        graph.add_node(graph.root, logo);
        let id = NodeId::intern("job_logo_img");

        let mut queue = JobQueue::new();
        let job = queue.enqueue(id, request_for(graph.get_by_id(id).unwrap(), &config).unwrap());
        assert!(queue.complete(&mut graph, &config, job, id, JobOutcome::Bytes(png(40, 20))));

        let node = graph.get_by_id(id).unwrap();
        assert_eq!((node.x, node.y, node.width, node.height), (0.0, 25.0, 100.0, 50.0));
    }
}

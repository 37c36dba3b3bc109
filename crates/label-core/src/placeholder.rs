//! Placeholder identifiers, family routing, sample values, and raster sizing.
//!
//! A placeholder is bound to a `Category.Field` identifier. Identifiers that
//! name a QR code, a barcode, or exactly `client.logo` are *image-family* and
//! render a generated raster; everything else is *text-family* and renders a
//! preview value from [`sample_value`].

use crate::config::EditorConfig;
use crate::error::{LabelError, Result};
use crate::id::NodeId;
use crate::metrics::{TextMeasurer, auto_size};
use crate::model::{Bounds, Node, NodeKind, TextProps};
use std::fmt;
use std::sync::Arc;
use winnow::ascii::alpha1;
use winnow::combinator::separated_pair;
use winnow::prelude::*;

pub const FALLBACK_FILL: &str = "#f0f0f0";
pub const FALLBACK_STROKE: &str = "#999999";
pub const FALLBACK_DASH: [f64; 2] = [4.0, 4.0];

pub const DEFAULT_BARCODE_FORMAT: &str = "CODE128";

// ─── Identifier ──────────────────────────────────────────────────────────

/// A parsed `Category.Field` identifier. Case is preserved for display;
/// lookups use [`PlaceholderId::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderId {
    pub category: String,
    pub field: String,
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    separated_pair(alpha1, '.', alpha1).parse_next(input)
}

impl PlaceholderId {
    /// Parse `^[A-Za-z]+\.[A-Za-z]+$`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut rest = s;
        let (category, field) = identifier
            .parse_next(&mut rest)
            .map_err(|_| LabelError::InvalidPlaceholder(s.to_string()))?;
        if !rest.is_empty() {
            return Err(LabelError::InvalidPlaceholder(s.to_string()));
        }
        Ok(Self {
            category: category.to_string(),
            field: field.to_string(),
        })
    }

    /// Lower-cased `category.field`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.category, self.field).to_ascii_lowercase()
    }

    pub fn family(&self) -> PlaceholderFamily {
        PlaceholderFamily::of(&self.to_string())
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.field)
    }
}

// ─── Routing ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderFamily {
    Text,
    Image,
}

impl PlaceholderFamily {
    /// Route an identifier: image-family when it contains `qrcode` or
    /// `barcode`, or is exactly `client.logo` (all case-insensitive).
    pub fn of(identifier: &str) -> Self {
        if ImageKind::of(identifier).is_some() {
            Self::Image
        } else {
            Self::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Image-family sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Qr,
    Barcode,
    Logo,
}

impl ImageKind {
    pub fn of(identifier: &str) -> Option<Self> {
        let lower = identifier.to_ascii_lowercase();
        if lower.contains("qrcode") {
            Some(Self::Qr)
        } else if lower.contains("barcode") {
            Some(Self::Barcode)
        } else if lower == "client.logo" {
            Some(Self::Logo)
        } else {
            None
        }
    }

    /// Label shown inside the fallback box when generation fails.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            Self::Qr => "QR Code",
            Self::Barcode => "Barcode",
            Self::Logo => "Logo",
        }
    }

    /// Size of a freshly dropped placeholder of this kind.
    pub fn default_size(&self) -> (f64, f64) {
        match self {
            Self::Qr => (100.0, 100.0),
            Self::Barcode => (200.0, 80.0),
            Self::Logo => (150.0, 75.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qr => "qrcode",
            Self::Barcode => "barcode",
            Self::Logo => "logo",
        }
    }
}

// ─── Sample values ───────────────────────────────────────────────────────

const SAMPLE_VALUES: &[(&str, &str)] = &[
    ("device.serial", "SN-123456789"),
    ("device.imei", "356938035643809"),
    ("device.model", "iPhone 13 Pro"),
    ("device.brand", "Apple"),
    ("device.color", "Graphite"),
    ("device.storage", "256GB"),
    ("device.grade", "Grade A"),
    ("device.condition", "Excellent"),
    ("device.price", "$499.00"),
    ("device.sku", "SKU-000123"),
    ("device.qrcode", "https://example.com/d/SN-123456789"),
    ("device.barcode", "SN-123456789"),
    ("client.name", "Acme Corporation"),
    ("client.address", "123 Main Street, Springfield"),
    ("client.phone", "(555) 123-4567"),
    ("client.email", "contact@acme.example"),
    ("warehouse.name", "Main Warehouse"),
    ("warehouse.location", "Aisle 4, Shelf B"),
    ("warehouse.code", "WH-01"),
    ("order.number", "ORD-2024-0001"),
    ("order.date", "2024-01-15"),
    ("user.name", "Jane Doe"),
];

const CATEGORY_DEFAULTS: &[(&str, &str)] = &[
    ("device", "Device Information"),
    ("client", "Client Information"),
    ("warehouse", "Warehouse Information"),
    ("order", "Order Information"),
    ("user", "User Information"),
];

/// Preview value for a placeholder identifier.
///
/// Exact `category.field` matches win, then per-category defaults, then a
/// generic `"<Category> Information"`. Never fails.
pub fn sample_value(identifier: &str) -> String {
    let lower = identifier.to_ascii_lowercase();
    if let Some((_, v)) = SAMPLE_VALUES.iter().find(|(k, _)| *k == lower) {
        return (*v).to_string();
    }
    let category = identifier.split('.').next().unwrap_or(identifier);
    let category_lower = category.to_ascii_lowercase();
    if let Some((_, v)) = CATEGORY_DEFAULTS.iter().find(|(k, _)| *k == category_lower) {
        return (*v).to_string();
    }
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => format!("{}{} Information", first.to_ascii_uppercase(), chars.as_str()),
        None => "Information".to_string(),
    }
}

// ─── State ───────────────────────────────────────────────────────────────

/// Everything needed to rebuild a placeholder's visual on reload.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderState {
    Text(TextProps),
    Qr {
        payload: String,
    },
    Barcode {
        payload: String,
        format: String,
    },
    Logo {
        tenant_id: Option<String>,
        src: Option<String>,
    },
}

impl PlaceholderState {
    pub fn image_kind(&self) -> Option<ImageKind> {
        match self {
            Self::Text(_) => None,
            Self::Qr { .. } => Some(ImageKind::Qr),
            Self::Barcode { .. } => Some(ImageKind::Barcode),
            Self::Logo { .. } => Some(ImageKind::Logo),
        }
    }

    /// Default state for an identifier of the given sub-type.
    pub fn for_image(kind: ImageKind, identifier: &str) -> Self {
        match kind {
            ImageKind::Qr => Self::Qr {
                payload: sample_value(identifier),
            },
            ImageKind::Barcode => Self::Barcode {
                payload: sample_value(identifier),
                format: DEFAULT_BARCODE_FORMAT.to_string(),
            },
            ImageKind::Logo => Self::Logo {
                tenant_id: None,
                src: None,
            },
        }
    }
}

/// Decoded raster bytes shared between the scene and the host renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterSource {
    Bytes(Arc<[u8]>),
    /// URL or data URI the host can draw directly.
    Src(String),
}

/// How a decoded raster is drawn inside its node.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFit {
    pub source: RasterSource,
    pub natural_width: f64,
    pub natural_height: f64,
    /// Draw rectangle in node-local pixels.
    pub draw: Bounds,
}

/// Runtime-only visual state of a placeholder. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderVisual {
    /// Text-family: the node renders its text state.
    Text,
    /// Image-family waiting for its raster job.
    Pending,
    Raster(RasterFit),
    /// Gray dashed box with a centered label.
    Fallback { label: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderProps {
    /// `Category.Field` as authored.
    pub identifier: String,
    pub family: PlaceholderFamily,
    pub state: PlaceholderState,
    pub visual: PlaceholderVisual,
}

impl PlaceholderProps {
    pub fn text_state(&self) -> Option<&TextProps> {
        match &self.state {
            PlaceholderState::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_state_mut(&mut self) -> Option<&mut TextProps> {
        match &mut self.state {
            PlaceholderState::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn image_kind(&self) -> Option<ImageKind> {
        self.state.image_kind()
    }

    pub fn is_pending(&self) -> bool {
        self.visual == PlaceholderVisual::Pending
    }
}

// ─── Raster sizing ───────────────────────────────────────────────────────

/// Square generation size for a QR box: never below the quality floor.
pub fn qr_generation_size(width: f64, height: f64, config: &EditorConfig) -> f64 {
    width.max(height).max(config.qr_min_generation_px).round()
}

/// Where a square QR raster is drawn in a `width`×`height` box.
///
/// Near-square boxes get a centered square; boxes whose aspect ratio
/// deviates from 1 by more than the tolerance are filled (stretched).
pub fn qr_fit(width: f64, height: f64, config: &EditorConfig) -> Bounds {
    if width <= 0.0 || height <= 0.0 {
        return Bounds::new(0.0, 0.0, width.max(0.0), height.max(0.0));
    }
    let aspect = width / height;
    if (aspect - 1.0).abs() > config.qr_aspect_tolerance {
        Bounds::new(0.0, 0.0, width, height)
    } else {
        let side = width.min(height);
        Bounds::new((width - side) / 2.0, (height - side) / 2.0, side, side)
    }
}

/// Bar height to request so the human-readable line fits under the bars.
pub fn barcode_generation_height(height: f64, config: &EditorConfig) -> f64 {
    (height - config.barcode_label_margin).max(1.0).round()
}

/// Largest rectangle with the source aspect ratio that fits inside the box,
/// centered.
pub fn fit_inside(natural_width: f64, natural_height: f64, width: f64, height: f64) -> Bounds {
    if natural_width <= 0.0 || natural_height <= 0.0 {
        return Bounds::new(0.0, 0.0, width, height);
    }
    let scale = (width / natural_width).min(height / natural_height);
    let (w, h) = (natural_width * scale, natural_height * scale);
    Bounds::new((width - w) / 2.0, (height - h) / 2.0, w, h)
}

/// Draw rectangle for a decoded raster of `kind` inside a node box.
pub fn raster_draw_rect(
    kind: ImageKind,
    natural: (f64, f64),
    width: f64,
    height: f64,
    config: &EditorConfig,
) -> Bounds {
    match kind {
        ImageKind::Qr => qr_fit(width, height, config),
        ImageKind::Barcode => Bounds::new(0.0, 0.0, width, height),
        ImageKind::Logo => fit_inside(natural.0, natural.1, width, height),
    }
}

// ─── Construction ────────────────────────────────────────────────────────

/// Build a placeholder node at `(x, y)`.
///
/// Text-family nodes are auto-sized immediately. Image-family nodes start
/// `Pending` at `size` (or their kind default) and wait for a raster job.
pub fn create_placeholder(
    id: NodeId,
    identifier: &str,
    x: f64,
    y: f64,
    size: Option<(f64, f64)>,
    config: &EditorConfig,
    measurer: &dyn TextMeasurer,
) -> Result<Node> {
    let parsed = PlaceholderId::parse(identifier)?;
    let display = parsed.to_string();

    let (state, visual, (width, height)) = match ImageKind::of(&display) {
        Some(kind) => (
            PlaceholderState::for_image(kind, &display),
            PlaceholderVisual::Pending,
            size.unwrap_or_else(|| kind.default_size()),
        ),
        None => {
            let text = TextProps {
                text: sample_value(&display),
                padding: config.text_padding,
                ..TextProps::default()
            };
            let measured = auto_size(
                &text.text,
                &text.font,
                text.wrap,
                text.padding,
                config.min_text_size(),
                measurer,
            );
            (PlaceholderState::Text(text), PlaceholderVisual::Text, measured)
        }
    };

    let mut node = Node::new(
        id,
        NodeKind::Placeholder(PlaceholderProps {
            identifier: display.clone(),
            family: PlaceholderFamily::of(&display),
            state,
            visual,
        }),
    );
    node.x = x;
    node.y = y;
    node.width = width;
    node.height = height;
    Ok(node)
}

/// Re-run text-family auto-sizing after a font, style, or content change.
/// Returns `false` for image-family or non-placeholder nodes.
pub fn refit_text_placeholder(
    node: &mut Node,
    config: &EditorConfig,
    measurer: &dyn TextMeasurer,
) -> bool {
    let NodeKind::Placeholder(props) = &node.kind else {
        return false;
    };
    let Some(text) = props.text_state() else {
        return false;
    };
    let (w, h) = auto_size(
        &text.text,
        &text.font,
        text.wrap,
        text.padding,
        config.min_text_size(),
        measurer,
    );
    node.width = w;
    node.height = h;
    node.scale_x = 1.0;
    node.scale_y = 1.0;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FallbackMeasurer;

    #[test]
    fn identifier_grammar() {
        let id = PlaceholderId::parse("Device.Serial").unwrap();
        assert_eq!(id.category, "Device");
        assert_eq!(id.field, "Serial");
        assert_eq!(id.key(), "device.serial");

        for bad in ["Device", "Device.", ".Serial", "Device.Serial.X", "Dev1ce.Serial", "Device.Serial "] {
            assert!(PlaceholderId::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn routing_rule() {
        use PlaceholderFamily::*;
        assert_eq!(PlaceholderFamily::of("Device.QRCode"), Image);
        assert_eq!(PlaceholderFamily::of("device.qrcode"), Image);
        assert_eq!(PlaceholderFamily::of("Order.BarCode"), Image);
        assert_eq!(PlaceholderFamily::of("Client.Logo"), Image);
        assert_eq!(PlaceholderFamily::of("CLIENT.LOGO"), Image);
        assert_eq!(PlaceholderFamily::of("Client.LogoUrl"), Text);
        assert_eq!(PlaceholderFamily::of("Tenant.Logo"), Text);
        assert_eq!(PlaceholderFamily::of("Device.Serial"), Text);
    }

    #[test]
    fn sample_value_fallbacks() {
        assert_eq!(sample_value("Device.Serial"), "SN-123456789");
        assert_eq!(sample_value("device.unknownfield"), "Device Information");
        assert_eq!(sample_value("Pallet.Weight"), "Pallet Information");
        assert_eq!(sample_value("pallet.Weight"), "Pallet Information");
    }

    #[test]
    fn qr_sizing() {
        let cfg = EditorConfig::default();
        assert_eq!(qr_generation_size(100.0, 120.0, &cfg), 200.0);
        assert_eq!(qr_generation_size(300.0, 250.0, &cfg), 300.0);

        // within 10%: centered square
        assert_eq!(qr_fit(105.0, 100.0, &cfg), Bounds::new(2.5, 0.0, 100.0, 100.0));
        // beyond 10%: stretched
        assert_eq!(qr_fit(150.0, 100.0, &cfg), Bounds::new(0.0, 0.0, 150.0, 100.0));
    }

    #[test]
    fn barcode_and_logo_sizing() {
        let cfg = EditorConfig::default();
        assert_eq!(barcode_generation_height(80.0, &cfg), 60.0);
        assert_eq!(barcode_generation_height(10.0, &cfg), 1.0);
        assert_eq!(fit_inside(200.0, 100.0, 100.0, 100.0), Bounds::new(0.0, 25.0, 100.0, 50.0));
    }

    #[test]
    fn text_placeholder_respects_minimums() {
        let cfg = EditorConfig::default();
        let node = create_placeholder(
            NodeId::intern("ph_min"),
            "User.Id",
            0.0,
            0.0,
            None,
            &cfg,
            &FallbackMeasurer,
        )
        .unwrap();
        assert!(node.width >= 80.0);
        assert!(node.height >= 30.0);
        assert_eq!(node.text(), Some("User Information"));
    }

    #[test]
    fn image_placeholder_starts_pending() {
        let cfg = EditorConfig::default();
        let node = create_placeholder(
            NodeId::intern("ph_qr"),
            "Device.QRCode",
            5.0,
            6.0,
            None,
            &cfg,
            &FallbackMeasurer,
        )
        .unwrap();
        let NodeKind::Placeholder(p) = &node.kind else {
            panic!("expected placeholder");
        };
        assert_eq!(p.family, PlaceholderFamily::Image);
        assert!(p.is_pending());
        assert_eq!((node.width, node.height), (100.0, 100.0));
    }

    #[test]
    fn invalid_identifier_creates_nothing() {
        let cfg = EditorConfig::default();
        let err = create_placeholder(
            NodeId::intern("ph_bad"),
            "not an id",
            0.0,
            0.0,
            None,
            &cfg,
            &FallbackMeasurer,
        );
        assert!(matches!(err, Err(LabelError::InvalidPlaceholder(_))));
    }
}

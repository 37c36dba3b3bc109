//! Dimension engine: paper presets, orientation, DPI, and unit conversion.
//!
//! Physical sizes are stored in inches. Pixel sizes are always derived as
//! `round(inches × dpi)`, so the engine never accumulates rounding error
//! across orientation or DPI changes.

use crate::error::{LabelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MM_PER_INCH: f64 = 25.4;

/// Internal DPI bounds. Hosts clamp user input further with [`clamp_ui_dpi`].
pub const MIN_DPI: u32 = 1;
pub const MAX_DPI: u32 = 1200;
pub const UI_MIN_DPI: u32 = 72;
pub const UI_MAX_DPI: u32 = 600;

pub const CUSTOM_PAPER: &str = "Custom";

// ─── Conversions ─────────────────────────────────────────────────────────

pub fn inches_to_mm(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Inches → whole pixels at `dpi`.
pub fn inches_to_pixels(inches: f64, dpi: u32) -> f64 {
    (inches * f64::from(dpi)).round()
}

pub fn pixels_to_inches(pixels: f64, dpi: u32) -> f64 {
    pixels / f64::from(dpi)
}

pub fn mm_to_pixels(mm: f64, dpi: u32) -> f64 {
    inches_to_pixels(mm_to_inches(mm), dpi)
}

pub fn pixels_to_mm(pixels: f64, dpi: u32) -> f64 {
    inches_to_mm(pixels_to_inches(pixels, dpi))
}

/// Clamp a user-entered DPI to the range offered by the designer UI.
pub fn clamp_ui_dpi(dpi: u32) -> u32 {
    dpi.clamp(UI_MIN_DPI, UI_MAX_DPI)
}

// ─── Config ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Self::Portrait => Self::Landscape,
            Self::Landscape => Self::Portrait,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Some(Self::Portrait),
            "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }
}

/// Physical page description persisted with every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Oriented width in inches.
    pub width_inches: f64,
    /// Oriented height in inches.
    pub height_inches: f64,
    pub paper_size: String,
    pub orientation: Orientation,
    pub dpi: u32,
}

impl CanvasConfig {
    pub fn pixel_width(&self) -> f64 {
        inches_to_pixels(self.width_inches, self.dpi)
    }

    pub fn pixel_height(&self) -> f64 {
        inches_to_pixels(self.height_inches, self.dpi)
    }
}

/// A named paper size. Portrait uses the dimensions as listed, which for
/// some labels are wider than tall; landscape swaps them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperPreset {
    pub name: String,
    pub width_inches: f64,
    pub height_inches: f64,
}

fn default_presets() -> Vec<PaperPreset> {
    [
        ("Letter", 8.5, 11.0),
        ("Legal", 8.5, 14.0),
        ("A4", 8.27, 11.69),
        ("A5", 5.83, 8.27),
        ("A6", 4.13, 5.83),
        ("Label_4x6", 4.0, 6.0),
        ("Label_4x3", 4.0, 3.0),
        ("Label_3x2", 3.0, 2.0),
        ("Label_2x1", 2.0, 1.0),
        ("Label_2.25x1.25", 2.25, 1.25),
        (CUSTOM_PAPER, 4.0, 6.0),
    ]
    .into_iter()
    .map(|(name, w, h)| PaperPreset {
        name: name.to_string(),
        width_inches: w,
        height_inches: h,
    })
    .collect()
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Handle returned by [`DimensionEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CanvasConfig)>;

/// Single owner of the page configuration. Every effective change is
/// broadcast to subscribers; no-op calls notify nobody.
pub struct DimensionEngine {
    config: CanvasConfig,
    presets: Vec<PaperPreset>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for DimensionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionEngine")
            .field("config", &self.config)
            .field("presets", &self.presets.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for DimensionEngine {
    fn default() -> Self {
        Self::new("Label_4x6", 96)
    }
}

impl DimensionEngine {
    /// Create an engine on `paper` at `dpi`. Falls back to `Label_4x6` and
    /// 96 DPI when either is invalid.
    pub fn new(paper: &str, dpi: u32) -> Self {
        let presets = default_presets();
        let preset = presets
            .iter()
            .find(|p| p.name == paper)
            .or_else(|| presets.iter().find(|p| p.name == "Label_4x6"))
            .cloned()
            .unwrap_or(PaperPreset {
                name: "Label_4x6".into(),
                width_inches: 4.0,
                height_inches: 6.0,
            });
        let dpi = if (MIN_DPI..=MAX_DPI).contains(&dpi) {
            dpi
        } else {
            log::warn!("DPI {dpi} out of range, using 96");
            96
        };
        Self {
            config: CanvasConfig {
                width_inches: preset.width_inches,
                height_inches: preset.height_inches,
                paper_size: preset.name,
                orientation: Orientation::Portrait,
                dpi,
            },
            presets,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn presets(&self) -> &[PaperPreset] {
        &self.presets
    }

    pub fn preset(&self, name: &str) -> Option<&PaperPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn require_preset(&self, name: &str) -> Result<&PaperPreset> {
        self.preset(name)
            .ok_or_else(|| LabelError::UnknownPaperSize(name.to_string()))
    }

    /// Current canvas size in whole pixels.
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.config.pixel_width(), self.config.pixel_height())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CanvasConfig) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Select a named preset. Unknown names are logged and ignored.
    pub fn set_paper_size(&mut self, name: &str) -> bool {
        if let Err(e) = self.require_preset(name) {
            log::warn!("{e}, keeping {}", self.config.paper_size);
            return false;
        }
        if self.config.paper_size == name {
            return false;
        }
        self.config.paper_size = name.to_string();
        self.apply_orientation();
        self.notify();
        true
    }

    /// Recompute the oriented size from the preset's base inches.
    pub fn set_orientation(&mut self, orientation: Orientation) -> bool {
        if self.config.orientation == orientation {
            return false;
        }
        self.config.orientation = orientation;
        self.apply_orientation();
        self.notify();
        true
    }

    pub fn toggle_orientation(&mut self) -> bool {
        self.set_orientation(self.config.orientation.toggled())
    }

    /// Accepts 1–1200; anything else is logged and ignored.
    pub fn set_dpi(&mut self, dpi: u32) -> bool {
        if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
            log::warn!("DPI {dpi} outside {MIN_DPI}..={MAX_DPI}, ignored");
            return false;
        }
        if self.config.dpi == dpi {
            return false;
        }
        self.config.dpi = dpi;
        self.notify();
        true
    }

    /// Write millimetre dimensions into the `Custom` slot and select it.
    pub fn set_custom_dimensions(&mut self, width_mm: f64, height_mm: f64) -> bool {
        if !(width_mm > 0.0 && height_mm > 0.0) {
            log::warn!("custom dimensions must be positive, got {width_mm}x{height_mm} mm");
            return false;
        }
        self.set_preset(CUSTOM_PAPER, mm_to_inches(width_mm), mm_to_inches(height_mm));
        self.config.paper_size = CUSTOM_PAPER.to_string();
        self.apply_orientation();
        self.notify();
        true
    }

    /// Insert or overwrite a preset. Does not change the selection unless the
    /// overwritten preset is the selected one.
    pub fn set_preset(&mut self, name: &str, width_inches: f64, height_inches: f64) {
        match self.presets.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.width_inches = width_inches;
                p.height_inches = height_inches;
            }
            None => self.presets.push(PaperPreset {
                name: name.to_string(),
                width_inches,
                height_inches,
            }),
        }
        if self.config.paper_size == name {
            self.apply_orientation();
        }
    }

    /// Replace the whole configuration (document load). Unknown paper keys
    /// are registered from the stored inches so the document still renders.
    pub fn apply_config(&mut self, config: CanvasConfig) {
        let dpi = if (MIN_DPI..=MAX_DPI).contains(&config.dpi) {
            config.dpi
        } else {
            log::warn!("stored DPI {} invalid, keeping {}", config.dpi, self.config.dpi);
            self.config.dpi
        };
        let (base_w, base_h) = match config.orientation {
            Orientation::Portrait => (config.width_inches, config.height_inches),
            Orientation::Landscape => (config.height_inches, config.width_inches),
        };
        if config.paper_size == CUSTOM_PAPER || self.preset(&config.paper_size).is_none() {
            self.set_preset(&config.paper_size, base_w, base_h);
        }
        self.config = CanvasConfig { dpi, ..config };
        self.notify();
    }

    fn apply_orientation(&mut self) {
        let Some(preset) = self.preset(&self.config.paper_size) else {
            return;
        };
        let (w, h) = (preset.width_inches, preset.height_inches);
        let (w, h) = match self.config.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };
        self.config.width_inches = w;
        self.config.height_inches = h;
    }

    fn notify(&mut self) {
        let config = self.config.clone();
        for (_, listener) in &mut self.listeners {
            listener(&config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn label_4x6_at_96_dpi() {
        let mut engine = DimensionEngine::new("Label_4x6", 96);
        assert_eq!(engine.pixel_size(), (384.0, 576.0));

        engine.toggle_orientation();
        assert_eq!(engine.pixel_size(), (576.0, 384.0));

        engine.toggle_orientation();
        assert_eq!(engine.pixel_size(), (384.0, 576.0));
    }

    #[test]
    fn orientation_is_an_involution_for_every_preset() {
        let names: Vec<String> = DimensionEngine::default()
            .presets()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        for name in names {
            let mut engine = DimensionEngine::new(&name, 203);
            let before = (engine.config().width_inches, engine.config().height_inches);
            engine.toggle_orientation();
            engine.toggle_orientation();
            let after = (engine.config().width_inches, engine.config().height_inches);
            assert_eq!(before, after, "{name}");
        }
    }

    #[test]
    fn conversions_invert_within_rounding() {
        for dpi in [72, 96, 150, 203, 300, 600, 1200] {
            for v in [0.0, 0.1, 1.0, 2.25, 4.0, 8.27, 11.69] {
                let back = pixels_to_inches(inches_to_pixels(v, dpi), dpi);
                assert!(
                    (back - v).abs() <= 0.5 / f64::from(dpi) + f64::EPSILON,
                    "dpi={dpi} v={v} back={back}"
                );
            }
        }
        assert!((mm_to_inches(inches_to_mm(3.3)) - 3.3).abs() < 1e-12);
        assert_eq!(mm_to_pixels(25.4, 300), 300.0);
        assert!((pixels_to_mm(300.0, 300) - 25.4).abs() < 1e-9);
    }

    #[test]
    fn unknown_paper_is_a_no_op() {
        let mut engine = DimensionEngine::default();
        let before = engine.config().clone();
        assert!(!engine.set_paper_size("Postcard"));
        assert_eq!(engine.config(), &before);
        assert!(matches!(
            engine.require_preset("Postcard"),
            Err(LabelError::UnknownPaperSize(name)) if name == "Postcard"
        ));
    }

    #[test]
    fn dpi_range_is_enforced() {
        let mut engine = DimensionEngine::default();
        assert!(!engine.set_dpi(0));
        assert!(!engine.set_dpi(1201));
        assert!(engine.set_dpi(1200));
        assert_eq!(engine.config().dpi, 1200);
        assert_eq!(clamp_ui_dpi(1200), 600);
        assert_eq!(clamp_ui_dpi(10), 72);
    }

    #[test]
    fn custom_dimensions_select_custom_slot() {
        let mut engine = DimensionEngine::new("Letter", 100);
        assert!(engine.set_custom_dimensions(50.8, 25.4));
        assert_eq!(engine.config().paper_size, CUSTOM_PAPER);
        assert!((engine.config().width_inches - 2.0).abs() < 1e-12);
        assert!((engine.config().height_inches - 1.0).abs() < 1e-12);
        assert_eq!(engine.pixel_size(), (200.0, 100.0));
        assert!(!engine.set_custom_dimensions(0.0, 10.0));
    }

    #[test]
    fn landscape_survives_paper_change() {
        let mut engine = DimensionEngine::new("Label_4x6", 96);
        engine.set_orientation(Orientation::Landscape);
        engine.set_paper_size("Label_3x2");
        assert_eq!(engine.config().width_inches, 2.0);
        assert_eq!(engine.config().height_inches, 3.0);
    }

    #[test]
    fn subscribers_see_effective_changes_only() {
        let hits = Rc::new(Cell::new(0));
        let mut engine = DimensionEngine::default();
        let counter = Rc::clone(&hits);
        let sub = engine.subscribe(move |_| counter.set(counter.get() + 1));

        engine.set_dpi(96); // unchanged
        engine.set_dpi(300);
        engine.set_paper_size("nope");
        engine.toggle_orientation();
        assert_eq!(hits.get(), 2);

        assert!(engine.unsubscribe(sub));
        engine.set_dpi(150);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn apply_config_registers_unknown_paper() {
        let mut engine = DimensionEngine::default();
        engine.apply_config(CanvasConfig {
            width_inches: 5.0,
            height_inches: 3.0,
            paper_size: "Shelf_5x3".into(),
            orientation: Orientation::Landscape,
            dpi: 203,
        });
        assert_eq!(engine.preset("Shelf_5x3").unwrap().width_inches, 3.0);
        engine.toggle_orientation();
        assert_eq!(engine.config().width_inches, 3.0);
        assert_eq!(engine.config().height_inches, 5.0);
    }
}

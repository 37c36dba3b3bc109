//! Editor-wide tunables.

use crate::error::Result;
use serde::Deserialize;

/// Configuration shared by the factory, placeholder sizing, and list layout.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Smallest width an auto-sized text or text placeholder may report. Default: **80**.
    pub min_text_width: f64,
    /// Smallest height an auto-sized text or text placeholder may report. Default: **30**.
    pub min_text_height: f64,
    /// DPI for new documents. Default: **96**.
    pub default_dpi: u32,
    /// Paper preset for new documents. Default: **Label_4x6**.
    pub default_paper: String,
    /// Gap between list-layout items in pixels. Default: **10**.
    pub default_separator: f64,
    /// QR codes are generated at least this large before fitting. Default: **200**.
    pub qr_min_generation_px: f64,
    /// How far a QR box may deviate from square before it is stretched. Default: **0.1**.
    pub qr_aspect_tolerance: f64,
    /// Vertical space reserved for the human-readable barcode line. Default: **20**.
    pub barcode_label_margin: f64,
    /// Inner padding of text boxes. Default: **4**.
    pub text_padding: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_text_width: 80.0,
            min_text_height: 30.0,
            default_dpi: 96,
            default_paper: "Label_4x6".to_string(),
            default_separator: 10.0,
            qr_min_generation_px: 200.0,
            qr_aspect_tolerance: 0.1,
            barcode_label_margin: 20.0,
            text_padding: 4.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn min_text_size(&self) -> (f64, f64) {
        (self.min_text_width, self.min_text_height)
    }
}

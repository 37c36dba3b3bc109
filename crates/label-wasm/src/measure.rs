//! Text measurement through the browser's 2D context, so auto-sizing matches
//! what the page actually renders.

use label_core::metrics::{FallbackMeasurer, TextMeasurer};
use label_core::model::FontSpec;
use web_sys::CanvasRenderingContext2d;

pub struct CanvasTextMeasurer {
    ctx: CanvasRenderingContext2d,
}

impl CanvasTextMeasurer {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl TextMeasurer for CanvasTextMeasurer {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        self.ctx.set_font(&font.css());
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            // detached or tainted context
            Err(_) => FallbackMeasurer.text_width(text, font),
        }
    }
}

//! Text measurement and wrapping.
//!
//! Auto-sizing works from glyph advances rather than a laid-out box: the
//! tight width is the widest explicit line, and the height is the number of
//! wrapped lines at that width times the line height.

use crate::error::{LabelError, Result};
use crate::model::{FontSpec, WrapMode};
use ab_glyph::{Font, FontArc, ScaleFont};

/// Line height as a multiple of font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Source of glyph advances.
pub trait TextMeasurer {
    /// Advance width of a single line of `text` in pixels.
    fn text_width(&self, text: &str, font: &FontSpec) -> f64;

    fn line_height(&self, font: &FontSpec) -> f64 {
        font.size * LINE_HEIGHT_FACTOR
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        (**self).text_width(text, font)
    }

    fn line_height(&self, font: &FontSpec) -> f64 {
        (**self).line_height(font)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for Box<T> {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        (**self).text_width(text, font)
    }

    fn line_height(&self, font: &FontSpec) -> f64 {
        (**self).line_height(font)
    }
}

// ─── Fallback (no font file) ─────────────────────────────────────────────

/// Deterministic advance table approximating a humanist sans (Calibri).
/// Used headless and in tests; hosts with real fonts plug in their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMeasurer;

fn advance_em(ch: char) -> f64 {
    match ch {
        ' ' => 0.226,
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '!' | '|' | ':' | ';' => 0.25,
        'f' | 'r' | 't' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.33,
        'm' | 'w' => 0.8,
        'M' | 'W' => 0.86,
        '0'..='9' => 0.507,
        'A'..='Z' => 0.6,
        'a'..='z' => 0.48,
        c if c.is_whitespace() => 0.226,
        c if c.is_ascii() => 0.5,
        _ => 0.9,
    }
}

impl TextMeasurer for FallbackMeasurer {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        let em: f64 = text.chars().map(advance_em).sum();
        let bold = if font.style.bold { 1.05 } else { 1.0 };
        em * font.size * bold
    }
}

// ─── Real fonts ──────────────────────────────────────────────────────────

/// Measures with the outlines of a loaded TrueType/OpenType font.
#[derive(Clone)]
pub struct GlyphMeasurer {
    regular: FontArc,
    bold: Option<FontArc>,
}

impl std::fmt::Debug for GlyphMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphMeasurer")
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

impl GlyphMeasurer {
    pub fn from_bytes(regular: Vec<u8>) -> Result<Self> {
        let regular = FontArc::try_from_vec(regular).map_err(|e| LabelError::Font(e.to_string()))?;
        Ok(Self {
            regular,
            bold: None,
        })
    }

    pub fn with_bold(mut self, bold: Vec<u8>) -> Result<Self> {
        self.bold = Some(FontArc::try_from_vec(bold).map_err(|e| LabelError::Font(e.to_string()))?);
        Ok(self)
    }

    fn face(&self, font: &FontSpec) -> &FontArc {
        match (&self.bold, font.style.bold) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        }
    }
}

impl TextMeasurer for GlyphMeasurer {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        let face = self.face(font);
        let scaled = face.as_scaled(font.size as f32);
        let mut width = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            let glyph = face.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, glyph);
            }
            width += scaled.h_advance(glyph);
            prev = Some(glyph);
        }
        f64::from(width)
    }

    fn line_height(&self, font: &FontSpec) -> f64 {
        let scaled = self.face(font).as_scaled(font.size as f32);
        f64::from(scaled.ascent() - scaled.descent() + scaled.line_gap()).max(font.size)
    }
}

// ─── Wrapping ────────────────────────────────────────────────────────────

/// Break `text` into display lines no wider than `max_width`.
///
/// Explicit newlines always break. `WrapMode::None` never breaks otherwise;
/// `Word` breaks at spaces and falls back to characters for words wider than
/// the box; `Char` breaks anywhere.
pub fn wrap_lines(
    text: &str,
    max_width: f64,
    wrap: WrapMode,
    font: &FontSpec,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if wrap == WrapMode::None || max_width <= 0.0 {
            lines.push(paragraph.to_string());
            continue;
        }
        match wrap {
            WrapMode::Char => wrap_chars(paragraph, max_width, font, measurer, &mut lines),
            _ => wrap_words(paragraph, max_width, font, measurer, &mut lines),
        }
    }
    lines
}

fn wrap_words(
    paragraph: &str,
    max_width: f64,
    font: &FontSpec,
    measurer: &dyn TextMeasurer,
    out: &mut Vec<String>,
) {
    let mut line = String::new();
    for word in paragraph.split(' ') {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if measurer.text_width(&candidate, font) <= max_width {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            out.push(std::mem::take(&mut line));
        }
        if measurer.text_width(word, font) <= max_width {
            line = word.to_string();
        } else {
            let mut pieces = Vec::new();
            wrap_chars(word, max_width, font, measurer, &mut pieces);
            line = pieces.pop().unwrap_or_default();
            out.extend(pieces);
        }
    }
    out.push(line);
}

fn wrap_chars(
    paragraph: &str,
    max_width: f64,
    font: &FontSpec,
    measurer: &dyn TextMeasurer,
    out: &mut Vec<String>,
) {
    let mut line = String::new();
    for ch in paragraph.chars() {
        line.push(ch);
        if line.chars().count() > 1 && measurer.text_width(&line, font) > max_width {
            line.pop();
            out.push(std::mem::replace(&mut line, ch.to_string()));
        }
    }
    out.push(line);
}

/// Width of the widest explicit line, padding included.
pub fn tight_width(text: &str, font: &FontSpec, padding: f64, measurer: &dyn TextMeasurer) -> f64 {
    let widest = text
        .split('\n')
        .map(|line| measurer.text_width(line, font))
        .fold(0.0, f64::max);
    widest.ceil() + padding * 2.0
}

/// Height of `text` wrapped inside a box `width` wide, padding included.
pub fn wrapped_height(
    text: &str,
    width: f64,
    wrap: WrapMode,
    font: &FontSpec,
    padding: f64,
    measurer: &dyn TextMeasurer,
) -> f64 {
    let inner = (width - padding * 2.0).max(0.0);
    let lines = wrap_lines(text, inner, wrap, font, measurer).len().max(1);
    (lines as f64 * measurer.line_height(font)).ceil() + padding * 2.0
}

/// Rendered extent of `text` laid out inside a box `width` wide: the widest
/// wrapped line and the wrapped height, padding included.
pub fn measure_wrapped(
    text: &str,
    width: f64,
    wrap: WrapMode,
    font: &FontSpec,
    padding: f64,
    measurer: &dyn TextMeasurer,
) -> (f64, f64) {
    let inner = (width - padding * 2.0).max(0.0);
    let lines = wrap_lines(text, inner, wrap, font, measurer);
    let widest = lines
        .iter()
        .map(|line| measurer.text_width(line, font))
        .fold(0.0, f64::max);
    let height = (lines.len().max(1) as f64 * measurer.line_height(font)).ceil();
    (widest.ceil() + padding * 2.0, height + padding * 2.0)
}

/// Tight auto-size for a text box, clamped to `min`.
///
/// Width comes from glyph advances; height is re-measured with wrapping at
/// that width so a clamped-up width never leaves a stale height.
pub fn auto_size(
    text: &str,
    font: &FontSpec,
    wrap: WrapMode,
    padding: f64,
    min: (f64, f64),
    measurer: &dyn TextMeasurer,
) -> (f64, f64) {
    let width = tight_width(text, font, padding, measurer).max(min.0);
    let height = wrapped_height(text, width, wrap, font, padding, measurer).max(min.1);
    (width, height)
}

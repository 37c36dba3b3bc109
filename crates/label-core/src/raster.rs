//! Raster probing for generated and fetched images.

use crate::error::{LabelError, Result};
use image::ImageReader;
use std::io::Cursor;

/// Pixel size of an encoded raster (PNG, JPEG, GIF, BMP, WebP) without
/// decoding the pixel data.
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.is_empty() {
        return Err(LabelError::Decode("empty image".into()));
    }
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LabelError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| LabelError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};

    #[test]
    fn probes_png_size() {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(30, 12))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        assert_eq!(decode_dimensions(buf.get_ref()).unwrap(), (30, 12));
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_dimensions(&[]).is_err());
        assert!(decode_dimensions(b"definitely not an image").is_err());
    }
}

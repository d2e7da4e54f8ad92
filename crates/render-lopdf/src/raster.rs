use crate::error::RenderError;
use image::DynamicImage;
use std::path::Path;

/// A decoded raster image, flattened to 8-bit RGB for a `DeviceRGB` XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl LoadedImage {
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let loaded = Self::from_dynamic(&image::open(path)?);
        log::debug!(
            "Loaded image {} ({}x{})",
            path.display(),
            loaded.width,
            loaded.height
        );
        Ok(loaded)
    }

    /// Flattens onto a white background; transparent pixels come out white.
    pub fn from_dynamic(decoded: &DynamicImage) -> Self {
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = u16::from(a);
            for channel in [r, g, b] {
                let blended = (u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255;
                rgb.push(blended as u8);
            }
        }
        Self { width, height, rgb }
    }

    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(RenderError::Image(format!(
                "expected {} bytes of RGB data for {}x{}, got {}",
                expected,
                width,
                height,
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }
}

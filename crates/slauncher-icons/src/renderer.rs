//! Icon rasterization.

use crate::error::RenderError;
use crate::types::{IconSource, RenderedIcon};
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Turns an icon source into a square bitmap of `size` pixels.
///
/// Implementations run on the background loader threads and must not keep
/// per-call state.
pub trait IconRenderer: Send + Sync + 'static {
    fn render(&self, source: &IconSource, size: u32) -> Result<RenderedIcon, RenderError>;
}

/// Default renderer backed by the `image` crate.
///
/// Sources already at the target size are used as-is, anything else is
/// stretched to fill the square.
#[derive(Debug, Clone, Copy)]
pub struct BitmapRenderer {
    filter: FilterType,
}

impl BitmapRenderer {
    pub fn new() -> Self {
        Self {
            filter: FilterType::CatmullRom,
        }
    }

    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for BitmapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl IconRenderer for BitmapRenderer {
    fn render(&self, source: &IconSource, size: u32) -> Result<RenderedIcon, RenderError> {
        if size == 0 {
            return Err(RenderError::ZeroSize);
        }

        let image = decode(source)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(RenderError::Empty);
        }

        if image.dimensions() == (size, size) {
            return Ok(RenderedIcon::new(image));
        }

        Ok(RenderedIcon::new(imageops::resize(
            &image,
            size,
            size,
            self.filter,
        )))
    }
}

fn decode(source: &IconSource) -> Result<RgbaImage, RenderError> {
    match source {
        IconSource::File(path) => Ok(image::open(path)?.to_rgba8()),
        IconSource::Encoded(bytes) => Ok(image::load_from_memory(bytes)?.to_rgba8()),
        IconSource::Pixels {
            width,
            height,
            rgba,
        } => RgbaImage::from_raw(*width, *height, rgba.to_vec()).ok_or(
            RenderError::InvalidPixels {
                width: *width,
                height: *height,
                len: rgba.len(),
            },
        ),
    }
}

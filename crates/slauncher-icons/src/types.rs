//! Core types for slauncher-icons

use image::RgbaImage;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Stable application identifier, e.g. "org.mozilla.firefox".
pub type CacheKey = String;

/// An application's unrendered icon.
///
/// Cheap to clone; the cache never takes ownership of the underlying data.
#[derive(Clone, Debug)]
pub enum IconSource {
    /// Raster icon file on disk (png, webp, ico, ...).
    File(PathBuf),
    /// Encoded image bytes held in memory.
    Encoded(Arc<[u8]>),
    /// Already decoded RGBA pixels, row-major.
    Pixels {
        width: u32,
        height: u32,
        rgba: Arc<[u8]>,
    },
}

impl IconSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        IconSource::File(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        IconSource::Encoded(bytes.into())
    }

    pub fn from_rgba(width: u32, height: u32, rgba: impl Into<Arc<[u8]>>) -> Self {
        IconSource::Pixels {
            width,
            height,
            rgba: rgba.into(),
        }
    }
}

/// A fixed-size RGBA bitmap produced by the renderer.
///
/// Clones share the same pixel buffer and nothing hands out mutable access,
/// so a cached icon can't be corrupted through a handle.
#[derive(Clone)]
pub struct RenderedIcon {
    image: Arc<RgbaImage>,
}

impl RenderedIcon {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Memory footprint of the pixel buffer. Used as the cache cost.
    pub fn byte_size(&self) -> usize {
        self.image.as_raw().len()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// True if both handles point at the same rendered bitmap.
    pub fn ptr_eq(&self, other: &RenderedIcon) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for RenderedIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedIcon")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Snapshot of how full the icon cache is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheUtilization {
    /// Number of cached icons.
    pub count: usize,
    /// Sum of entry costs in bytes.
    pub total_cost: usize,
    /// Capacity in bytes.
    pub capacity: usize,
    /// total_cost as a percentage of capacity (0-100).
    pub percent_full: u32,
}

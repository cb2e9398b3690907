//! Icon cache configuration.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Icon edge length in density-independent units.
pub const DEFAULT_ICON_SIZE_DP: u32 = 80;
/// Hard ceiling on cached pixel data.
pub const DEFAULT_MAX_CACHE_BYTES: usize = 4 * 1024 * 1024;
/// Threads available to decode work.
pub const DEFAULT_WORKER_THREADS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconCacheConfig {
    /// Icon edge length in density-independent units.
    pub icon_size_dp: u32,
    /// Display density (pixels per dp).
    pub density: f32,
    /// Ceiling on cached bytes. The effective capacity is the smaller of this
    /// and an eighth of system memory.
    pub max_cache_bytes: usize,
    /// Maximum concurrent renders.
    pub worker_threads: usize,
}

impl Default for IconCacheConfig {
    fn default() -> Self {
        Self {
            icon_size_dp: DEFAULT_ICON_SIZE_DP,
            density: 1.0,
            max_cache_bytes: DEFAULT_MAX_CACHE_BYTES,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl IconCacheConfig {
    #[must_use]
    pub fn with_icon_size_dp(mut self, dp: u32) -> Self {
        self.icon_size_dp = dp;
        self
    }

    #[must_use]
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub fn with_max_cache_bytes(mut self, bytes: usize) -> Self {
        self.max_cache_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Icon edge length in physical pixels, never below 1.
    pub fn icon_size(&self) -> u32 {
        let density = if self.density.is_finite() && self.density > 0.0 {
            self.density
        } else {
            1.0
        };
        ((self.icon_size_dp as f32 * density) as u32).max(1)
    }

    /// Effective cache capacity in bytes.
    pub fn cache_capacity(&self) -> usize {
        capacity_for(total_memory_bytes(), self.max_cache_bytes)
    }
}

fn capacity_for(total_memory: u64, ceiling: usize) -> usize {
    if total_memory == 0 {
        return ceiling;
    }
    let eighth = usize::try_from(total_memory / 8).unwrap_or(usize::MAX);
    eighth.min(ceiling)
}

fn total_memory_bytes() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.total_memory()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_size_scales_with_density() {
        let config = IconCacheConfig::default().with_density(2.75);
        assert_eq!(config.icon_size(), 220);
    }

    #[test]
    fn test_bad_density_falls_back() {
        assert_eq!(IconCacheConfig::default().with_density(0.0).icon_size(), 80);
        assert_eq!(IconCacheConfig::default().with_density(f32::NAN).icon_size(), 80);
        assert_eq!(
            IconCacheConfig::default()
                .with_icon_size_dp(0)
                .icon_size(),
            1
        );
    }

    #[test]
    fn test_capacity_is_min_of_memory_share_and_ceiling() {
        let gib = 1024 * 1024 * 1024;
        assert_eq!(
            capacity_for(16 * gib, DEFAULT_MAX_CACHE_BYTES),
            DEFAULT_MAX_CACHE_BYTES
        );
        assert_eq!(
            capacity_for(8 * 1024 * 1024, DEFAULT_MAX_CACHE_BYTES),
            1024 * 1024
        );
        assert_eq!(capacity_for(0, 300), 300);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: IconCacheConfig = serde_json::from_str(r#"{ "density": 2.0 }"#).unwrap();
        assert_eq!(config.icon_size_dp, DEFAULT_ICON_SIZE_DP);
        assert_eq!(config.icon_size(), 160);
    }
}

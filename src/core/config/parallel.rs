//! Shared parallel processing configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for how the pixel conditioner spreads work across threads.
///
/// Conditioning output never depends on this policy: the same buffer is produced
/// whether rows are processed sequentially or in parallel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of threads to use for parallel processing.
    /// If None, rayon will use the default thread pool size (typically number of CPU cores).
    /// Default: None (use rayon's default)
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Threshold for conditioning based on pixel count (<= this uses sequential)
    /// Default: 65_536 (a 256x256 image)
    #[serde(default = "ParallelPolicy::default_conditioning_pixel_threshold")]
    pub conditioning_pixel_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the conditioning pixel threshold.
    pub fn with_conditioning_pixel_threshold(mut self, threshold: usize) -> Self {
        self.conditioning_pixel_threshold = threshold;
        self
    }

    /// Returns true when an image of `pixel_count` pixels should be conditioned in parallel.
    pub fn should_parallelize(&self, pixel_count: usize) -> bool {
        pixel_count > self.conditioning_pixel_threshold
    }

    /// Install the global rayon thread pool with the configured number of threads.
    ///
    /// This method should be called once at application startup before any parallel
    /// processing occurs. If `max_threads` is None, this method does nothing and
    /// rayon will use its default thread pool size.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the thread pool was successfully configured
    /// - `Ok(false)` if `max_threads` is None (no configuration needed)
    /// - `Err` if the thread pool has already been initialized
    pub fn install_global_thread_pool(&self) -> Result<bool, rayon::ThreadPoolBuildError> {
        if let Some(num_threads) = self.max_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn default_conditioning_pixel_threshold() -> usize {
        65_536
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            conditioning_pixel_threshold: Self::default_conditioning_pixel_threshold(),
        }
    }
}

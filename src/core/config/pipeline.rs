//! Configuration for the conditioning and recognition pipeline.

use super::errors::{ConfigError, ConfigValidator};
use super::parallel::ParallelPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Long side, in pixels, that small images are upscaled to before conditioning.
pub const DEFAULT_UPSCALE_TARGET: u32 = 2000;

/// Configuration of the pixel conditioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditioningConfig {
    /// Images whose longer side is below this value are upscaled so that the longer
    /// side matches it. `None` disables upscaling.
    /// Default: Some(2000)
    #[serde(default = "ConditioningConfig::default_upscale_target")]
    pub upscale_target: Option<u32>,

    /// Thread usage for the per-pixel stages.
    #[serde(default)]
    pub parallel: ParallelPolicy,
}

impl ConditioningConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the upscale target.
    pub fn with_upscale_target(mut self, target: Option<u32>) -> Self {
        self.upscale_target = target;
        self
    }

    /// Sets the parallel policy.
    pub fn with_parallel_policy(mut self, policy: ParallelPolicy) -> Self {
        self.parallel = policy;
        self
    }

    fn default_upscale_target() -> Option<u32> {
        Some(DEFAULT_UPSCALE_TARGET)
    }
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            upscale_target: Self::default_upscale_target(),
            parallel: ParallelPolicy::default(),
        }
    }
}

impl ConfigValidator for ConditioningConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.upscale_target == Some(0) {
            return Err(ConfigError::InvalidConfig {
                message: "upscale_target must be greater than 0; use null to disable upscaling"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Page segmentation strategy requested from the recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegmentation {
    /// Fully automatic page segmentation.
    Auto,
    /// A single column of text of variable sizes.
    SingleColumn,
    /// A single uniform block of text. Preserves line structure.
    UniformBlock,
    /// Find as much text as possible in no particular order.
    SparseText,
}

impl PageSegmentation {
    /// Tesseract `--psm` value for this mode.
    pub fn tesseract_psm(self) -> u8 {
        match self {
            PageSegmentation::Auto => 3,
            PageSegmentation::SingleColumn => 4,
            PageSegmentation::UniformBlock => 6,
            PageSegmentation::SparseText => 11,
        }
    }
}

/// Parameters passed to the recognition engine with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionParams {
    /// Default: UniformBlock
    #[serde(default = "RecognitionParams::default_page_segmentation")]
    pub page_segmentation: PageSegmentation,

    /// Keep runs of spaces between words instead of collapsing them.
    /// Default: true
    #[serde(default = "RecognitionParams::default_preserve_interword_spaces")]
    pub preserve_interword_spaces: bool,

    /// Restrict recognition to these characters. `None` allows everything,
    /// including signs and numbers.
    #[serde(default)]
    pub char_whitelist: Option<String>,
}

impl RecognitionParams {
    /// Creates parameters with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page segmentation mode.
    pub fn with_page_segmentation(mut self, mode: PageSegmentation) -> Self {
        self.page_segmentation = mode;
        self
    }

    /// Sets the character whitelist.
    pub fn with_char_whitelist(mut self, whitelist: Option<String>) -> Self {
        self.char_whitelist = whitelist;
        self
    }

    fn default_page_segmentation() -> PageSegmentation {
        PageSegmentation::UniformBlock
    }

    fn default_preserve_interword_spaces() -> bool {
        true
    }
}

impl Default for RecognitionParams {
    fn default() -> Self {
        Self {
            page_segmentation: Self::default_page_segmentation(),
            preserve_interword_spaces: Self::default_preserve_interword_spaces(),
            char_whitelist: None,
        }
    }
}

/// Top-level configuration for a [`crate::pipeline::ScriptOcrPipeline`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub conditioning: ConditioningConfig,
    #[serde(default)]
    pub recognition: RecognitionParams,
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the conditioning configuration.
    pub fn with_conditioning(mut self, conditioning: ConditioningConfig) -> Self {
        self.conditioning = conditioning;
        self
    }

    /// Sets the recognition parameters.
    pub fn with_recognition(mut self, recognition: RecognitionParams) -> Self {
        self.recognition = recognition;
        self
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.conditioning.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.conditioning.upscale_target, Some(2000));
        assert_eq!(
            config.recognition.page_segmentation,
            PageSegmentation::UniformBlock
        );
        assert!(config.recognition.preserve_interword_spaces);
        assert!(config.recognition.char_whitelist.is_none());
        assert_eq!(config.recognition.page_segmentation.tesseract_psm(), 6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"conditioning": {"upscale_target": null}}"#).unwrap();
        assert_eq!(config.conditioning.upscale_target, None);
        assert_eq!(config.recognition, RecognitionParams::default());
    }

    #[test]
    fn test_zero_upscale_target_is_rejected() {
        let config = PipelineConfig::new()
            .with_conditioning(ConditioningConfig::new().with_upscale_target(Some(0)));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"recognition": {{"page_segmentation": "sparse_text"}}}}"#
        )
        .unwrap();
        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(
            config.recognition.page_segmentation,
            PageSegmentation::SparseText
        );
        assert_eq!(config.conditioning, ConditioningConfig::default());
    }

    #[test]
    fn test_from_json_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = PipelineConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}

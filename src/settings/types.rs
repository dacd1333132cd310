use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default lower hysteresis threshold for edge detection (0-255 scale).
pub const DEFAULT_LOW_THRESHOLD: f32 = 100.0;
/// Default upper hysteresis threshold for edge detection (0-255 scale).
pub const DEFAULT_HIGH_THRESHOLD: f32 = 200.0;
/// Gaussian sigma equivalent to a 15x15 kernel with automatic sigma.
pub const DEFAULT_BLUR_SIGMA: f32 = 2.6;

/// What the processor does to each converted frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    /// Grayscale, Canny edge map, back to RGBA.
    #[default]
    Edges,
    /// Grayscale, Gaussian blur, back to RGBA.
    Blur,
    /// Leave the converted colour frame as is.
    Passthrough,
}

impl fmt::Display for ProcessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Edges => "edges",
            Self::Blur => "blur",
            Self::Passthrough => "passthrough",
        })
    }
}

impl FromStr for ProcessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edges" | "canny" => Ok(Self::Edges),
            "blur" => Ok(Self::Blur),
            "passthrough" | "off" | "none" => Ok(Self::Passthrough),
            other => Err(format!("unknown process mode: {other}")),
        }
    }
}

/// Processor configuration, persisted as camelCase JSON.
///
/// Missing fields fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSettings {
    pub mode: ProcessMode,
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub blur_sigma: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            mode: ProcessMode::default(),
            low_threshold: DEFAULT_LOW_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            blur_sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

impl PipelineSettings {
    /// Check that thresholds are ordered and the blur sigma is usable.
    pub fn validate(&self) -> Result<(), String> {
        if !self.low_threshold.is_finite() || !self.high_threshold.is_finite() {
            return Err("thresholds must be finite".to_string());
        }
        if self.low_threshold < 0.0 || self.low_threshold > self.high_threshold {
            return Err(format!(
                "thresholds must satisfy 0 <= low <= high, got {} / {}",
                self.low_threshold, self.high_threshold
            ));
        }
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(format!("blur sigma must be positive, got {}", self.blur_sigma));
        }
        Ok(())
    }
}

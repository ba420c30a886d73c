//! # Configuration
//!
//! Optional TOML configuration shared by the `stego` and `steganalysis`
//! binaries. Every field has a default, so a missing file, an empty file and
//! a partial file are all valid. Command-line flags override file values.
//!
//! ## Example TOML
//!
//! ```toml
//! [embed]
//! policy = "truncate"
//! channels = ["red", "green", "blue"]
//!
//! [analysis]
//! balance_alpha = 0.05
//! pov_suspect_threshold = 0.1
//!
//! [sweep]
//! ratios = [0.1, 0.5, 0.9]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::common::error::{Result, StegoError};
use crate::processing::grid::Channel;
use crate::processing::steganography::{ChannelOrder, EmbedPolicy};

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error, reported as [`StegoError::Config`]
pub fn load_config<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .map_err(|e| StegoError::Config(format!("{}: {}", path.display(), e)))?;
    let config: T = toml::from_str(&content)
        .map_err(|e| StegoError::Config(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StegoConfig {
    /// Embedding policy and channel order
    pub embed: EmbedConfig,
    /// Detector thresholds
    pub analysis: AnalysisConfig,
    /// Payload ratios used by `stego sweep`
    pub sweep: SweepConfig,
}

/// Embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// What to do when the payload does not fill (or overflows) the image
    pub policy: EmbedPolicy,
    /// Channels written per pixel, in order. Must match at extraction time.
    pub channels: Vec<Channel>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            policy: EmbedPolicy::Truncate,
            channels: ChannelOrder::rgb().as_slice().to_vec(),
        }
    }
}

/// Detector thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Balance test flags a channel when its p-value falls below this
    pub balance_alpha: f64,
    /// PoV test flags an image when its p-value rises above this
    pub pov_suspect_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            balance_alpha: 0.05,
            pov_suspect_threshold: 0.1,
        }
    }
}

/// Payload ratios for the sweep command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Fractions of the image capacity to fill
    pub ratios: Vec<f64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            ratios: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
        }
    }
}

impl StegoConfig {
    /// Loads and validates a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: StegoConfig = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        ChannelOrder::new(self.embed.channels.clone())?;

        for (name, value) in [
            ("analysis.balance_alpha", self.analysis.balance_alpha),
            (
                "analysis.pov_suspect_threshold",
                self.analysis.pov_suspect_threshold,
            ),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(StegoError::Config(format!(
                    "{} must lie strictly between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if let Some(bad) = self
            .sweep
            .ratios
            .iter()
            .find(|r| !(r.is_finite() && **r > 0.0))
        {
            return Err(StegoError::Config(format!(
                "sweep.ratios must be positive, got {}",
                bad
            )));
        }

        Ok(())
    }

    /// Channel order described by the `[embed]` section.
    pub fn channel_order(&self) -> Result<ChannelOrder> {
        ChannelOrder::new(self.embed.channels.clone())
    }
}

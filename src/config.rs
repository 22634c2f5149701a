//! Configuration management for the face capture flow

use crate::{
    acceptance::AcceptanceWindows,
    constants::{
        DEFAULT_ESTIMATION_TIMEOUT_MS, DEFAULT_JPEG_QUALITY, DEFAULT_REGISTRATION_TIMEOUT_MS,
        DEFAULT_REGISTRATION_URL, DEFAULT_STABILITY_MS,
    },
    pose::Direction,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Angular acceptance windows per capturing pose
    pub acceptance: AcceptanceWindows,

    /// Stability (hold) durations
    pub stability: StabilityConfig,

    /// Capture and encoding settings
    pub capture: CaptureConfig,

    /// Registration service settings
    pub registration: RegistrationConfig,
}

/// How long a pose has to be held before capture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Required continuous hold in milliseconds
    pub required_ms: u64,

    /// Per-direction replacements for `required_ms`
    pub overrides_ms: BTreeMap<Direction, u64>,
}

/// Capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// JPEG quality of captured stills (1-100)
    pub jpeg_quality: u8,

    /// Maximum wait for a single pose estimate in milliseconds
    pub estimation_timeout_ms: u64,
}

/// Registration service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            required_ms: DEFAULT_STABILITY_MS,
            overrides_ms: BTreeMap::new(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            estimation_timeout_ms: DEFAULT_ESTIMATION_TIMEOUT_MS,
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRATION_URL.to_string(),
            timeout_ms: DEFAULT_REGISTRATION_TIMEOUT_MS,
        }
    }
}

impl StabilityConfig {
    /// Required hold for one direction
    pub fn required_for(&self, direction: Direction) -> Duration {
        let ms = self.overrides_ms.get(&direction).copied().unwrap_or(self.required_ms);
        Duration::from_millis(ms)
    }
}

impl CaptureConfig {
    pub fn estimation_timeout(&self) -> Duration {
        Duration::from_millis(self.estimation_timeout_ms)
    }
}

impl RegistrationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = self.acceptance.invalid_directions();
        if let Some(direction) = invalid.first() {
            return Err(Error::ConfigError(format!(
                "Acceptance window for '{direction}' must have finite bounds with min <= max"
            )));
        }

        if self.stability.required_ms == 0 {
            return Err(Error::ConfigError(
                "Stability duration must be greater than 0".to_string(),
            ));
        }
        if let Some((direction, _)) = self.stability.overrides_ms.iter().find(|(_, ms)| **ms == 0) {
            return Err(Error::ConfigError(format!(
                "Stability override for '{direction}' must be greater than 0"
            )));
        }

        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(Error::ConfigError(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }
        if self.capture.estimation_timeout_ms == 0 {
            return Err(Error::ConfigError(
                "Estimation timeout must be greater than 0".to_string(),
            ));
        }

        let url = self.registration.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::ConfigError(format!(
                "Registration URL must start with http:// or https://, got '{url}'"
            )));
        }
        if self.registration.timeout_ms == 0 {
            return Err(Error::ConfigError(
                "Registration timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Orientation Capture Configuration

# Angular acceptance windows (degrees). Positive yaw turns left,
# negative pitch looks up.
acceptance:
  front:
    roll: { min: -20.0, max: 20.0 }
    pitch: { min: -15.0, max: 15.0 }
    yaw: { min: -15.0, max: 15.0 }
  left:
    roll: { min: -15.0, max: 15.0 }
    pitch: { min: -15.0, max: 15.0 }
    yaw: { min: 15.0, max: 40.0 }
  right:
    roll: { min: -15.0, max: 15.0 }
    pitch: { min: -15.0, max: 15.0 }
    yaw: { min: -40.0, max: -15.0 }
  up:
    roll: { min: -15.0, max: 15.0 }
    pitch: { min: -40.0, max: -2.0 }
    yaw: { min: -15.0, max: 15.0 }
  down:
    roll: { min: -15.0, max: 15.0 }
    pitch: { min: 9.0, max: 40.0 }
    yaw: { min: -15.0, max: 15.0 }

# Continuous hold before a capture fires
stability:
  required_ms: 3000
  overrides_ms: {}

# Capture settings
capture:
  jpeg_quality: 92
  estimation_timeout_ms: 1000

# Registration service
registration:
  base_url: "http://localhost:8000"
  timeout_ms: 10000
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.acceptance, defaults.acceptance);
        assert_eq!(parsed.stability.required_ms, defaults.stability.required_ms);
        assert_eq!(parsed.capture.jpeg_quality, defaults.capture.jpeg_quality);
        assert_eq!(parsed.registration.base_url, defaults.registration.base_url);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml("stability:\n  required_ms: 1500\n").unwrap();
        assert_eq!(config.stability.required_ms, 1500);
        assert_eq!(config.capture.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert_eq!(config.acceptance, AcceptanceWindows::default());
    }

    #[test]
    fn test_required_for_override() {
        let mut stability = StabilityConfig::default();
        stability.overrides_ms.insert(Direction::Down, 1000);
        assert_eq!(stability.required_for(Direction::Down), Duration::from_millis(1000));
        assert_eq!(
            stability.required_for(Direction::Front),
            Duration::from_millis(DEFAULT_STABILITY_MS)
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.stability.required_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.capture.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.registration.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stability.overrides_ms.insert(Direction::Left, 0);
        assert!(config.validate().is_err());
    }
}

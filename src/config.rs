// src/config.rs

//! Heatmap settings, loaded from an optional TOML file:
//!
//! ```toml
//! enable_color = true
//! enable_text = true
//! scale = "exponential"
//! exponential_gamma = 3.0
//! query_timeout_secs = 20
//! ```

use crate::error::{HeatError, Result};
use crate::scale::{ScaleConfig, ScaleMode, DEFAULT_GAMMA};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Paint line backgrounds by heat
    pub enable_color: bool,
    /// Show "(N changes)" after the selected line
    pub enable_text: bool,
    pub scale: ScaleMode,
    pub exponential_gamma: f64,
    /// Per-query limit for history lookups; unset means wait indefinitely
    pub query_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_color: true,
            enable_text: true,
            scale: ScaleMode::default(),
            exponential_gamma: DEFAULT_GAMMA,
            query_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HeatError::Config(e.to_string()))
    }

    pub fn scale_config(&self) -> ScaleConfig {
        ScaleConfig::new(self.scale, self.exponential_gamma)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Nothing would be drawn
    pub fn is_disabled(&self) -> bool {
        !self.enable_color && !self.enable_text
    }
}

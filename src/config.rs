//! Pipeline configuration stored as RON

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::rasterizer::{RasterMode, ScissorRect};
use crate::vertex::{CullMode, DepthRange, Viewport};

/// Every setter-level knob of a rasterizer + vertex processor pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raster_mode: RasterMode,
    pub scissor: ScissorRect,
    pub cull_mode: CullMode,
    pub viewport: Viewport,
    pub depth_range: DepthRange,
}

impl PipelineConfig {
    /// Viewport and scissor covering a `width`x`height` target
    pub fn for_target(width: i32, height: i32) -> Self {
        Self {
            scissor: ScissorRect::new(0, 0, width, height),
            viewport: Viewport::new(0, 0, width, height),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width < 0 || self.viewport.height < 0 {
            return Err(ConfigError::Invalid(format!(
                "negative viewport size {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.scissor.width() < 0 || self.scissor.height() < 0 {
            return Err(ConfigError::Invalid(format!(
                "inverted scissor rect {:?}",
                self.scissor
            )));
        }
        if !self.depth_range.near.is_finite() || !self.depth_range.far.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "non-finite depth range ({}, {})",
                self.depth_range.near, self.depth_range.far
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load and validate a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents)?;
    info!(path = %path.display(), "loaded pipeline config");
    Ok(config)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(2)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    info!(path = %path.display(), "saved pipeline config");
    Ok(())
}

/// Load and validate a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = ron::from_str(s)?;
    config.validate()?;
    Ok(config)
}

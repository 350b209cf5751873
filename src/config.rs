use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::camera::{CameraConfig, CameraFacing};

const DEFAULT_DEVICE: &str = "stub://camera";
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_TARGET_WIDTH: u32 = 224;
const DEFAULT_TARGET_HEIGHT: u32 = 224;
const DEFAULT_TOP_K: usize = 1;

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    camera: Option<CameraConfigFile>,
    analysis: Option<AnalysisConfigFile>,
    labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    facing: Option<CameraFacing>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    rotation_degrees: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct AnalysisConfigFile {
    top_k: Option<usize>,
}

/// Static pipeline configuration.
///
/// Everything here is fixed for the lifetime of the pipeline: the classifier
/// input resolution, the camera selector, the top-K cut, and the
/// label-to-display-text table. None of it is renegotiated at runtime.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub camera: CameraConfig,
    /// How many of the highest-scoring labels to display.
    pub top_k: usize,
    /// Classifier label to display text. Labels absent here are not shown.
    pub labels: HashMap<String, String>,
}

impl PipelineConfig {
    /// Load from the file named by `LIVECLASS_CONFIG` (TOML), then apply env
    /// overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LIVECLASS_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PipelineConfigFile) -> Self {
        let camera_file = file.camera.unwrap_or_default();
        let camera = CameraConfig {
            device: camera_file
                .device
                .unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            facing: camera_file.facing.unwrap_or_default(),
            target_fps: camera_file.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            width: camera_file.width.unwrap_or(DEFAULT_TARGET_WIDTH),
            height: camera_file.height.unwrap_or(DEFAULT_TARGET_HEIGHT),
            rotation_degrees: camera_file.rotation_degrees.unwrap_or(0.0),
        };
        let top_k = file
            .analysis
            .and_then(|analysis| analysis.top_k)
            .unwrap_or(DEFAULT_TOP_K);
        let labels = file.labels.unwrap_or_else(default_labels);
        Self {
            camera,
            top_k,
            labels,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("LIVECLASS_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(facing) = std::env::var("LIVECLASS_CAMERA_FACING") {
            self.camera.facing = match facing.trim().to_lowercase().as_str() {
                "front" => CameraFacing::Front,
                "back" => CameraFacing::Back,
                "" => self.camera.facing,
                other => {
                    return Err(anyhow!(
                        "LIVECLASS_CAMERA_FACING must be 'front' or 'back', got '{}'",
                        other
                    ))
                }
            };
        }
        if let Ok(top_k) = std::env::var("LIVECLASS_TOP_K") {
            self.top_k = top_k
                .parse()
                .map_err(|_| anyhow!("LIVECLASS_TOP_K must be a non-negative integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be at least 1"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_file(PipelineConfigFile::default())
    }
}

fn default_labels() -> HashMap<String, String> {
    HashMap::from([
        ("smile".to_string(), "Smiling".to_string()),
        ("no face".to_string(), "No face".to_string()),
    ])
}

fn read_config_file(path: &Path) -> Result<PipelineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

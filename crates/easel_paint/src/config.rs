//! Canvas configuration file handling (easel.toml)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use easel_core::Color;

use crate::error::ConfigError;
use crate::geometry::DEFAULT_ARC_SEGMENTS;
use crate::view::{DeviceSize, ResizePolicy, ViewBounds};

/// Initial canvas state
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CanvasConfig {
    /// Clear color as 3 or 4 components
    #[serde(default = "default_background")]
    pub background: Vec<f32>,
    #[serde(default)]
    pub resize_policy: ResizePolicy,
    /// Segments used by arcs and rings when a draw call does not pick one
    #[serde(default = "default_arc_segments")]
    pub arc_segments: u32,
    #[serde(default)]
    pub view: ViewBounds,
    #[serde(default)]
    pub device: DeviceSize,
    /// Texture name to image path, queued when the canvas is built
    #[serde(default)]
    pub textures: BTreeMap<String, PathBuf>,
}

fn default_background() -> Vec<f32> {
    vec![0.0, 0.0, 0.0, 1.0]
}

fn default_arc_segments() -> u32 {
    DEFAULT_ARC_SEGMENTS
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            resize_policy: ResizePolicy::default(),
            arc_segments: default_arc_segments(),
            view: ViewBounds::default(),
            device: DeviceSize::default(),
            textures: BTreeMap::new(),
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CanvasConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or from `easel.toml` inside a directory.
    ///
    /// Relative texture paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_path = if path.is_dir() {
            path.join("easel.toml")
        } else {
            path.to_path_buf()
        };

        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = config_path.parent() {
            for texture in config.textures.values_mut() {
                if texture.is_relative() {
                    *texture = base.join(&*texture);
                }
            }
        }
        tracing::debug!(
            path = %config_path.display(),
            textures = config.textures.len(),
            "loaded canvas config"
        );
        Ok(config)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn background_color(&self) -> Result<Color, ConfigError> {
        Color::from_components(&self.background).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "background needs 3 or 4 components, got {}",
                self.background.len()
            ))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.background_color()?;
        if !self.view.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "view bounds must be finite with a non-zero size, got {:?}",
                self.view
            )));
        }
        if self.device.width == 0 || self.device.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "device size must be at least 1x1, got {}x{}",
                self.device.width, self.device.height
            )));
        }
        if self.arc_segments < 2 {
            return Err(ConfigError::Invalid(format!(
                "arc_segments must be at least 2, got {}",
                self.arc_segments
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CanvasConfig::from_toml_str("").unwrap();
        assert_eq!(config, CanvasConfig::default());
        assert_eq!(config.background_color().unwrap(), Color::BLACK);
    }

    #[test]
    fn test_full_document() {
        let config = CanvasConfig::from_toml_str(
            r#"
            background = [0.2, 0.3, 0.4]
            resize_policy = "anchor_corner"
            arc_segments = 24

            [view]
            xmin = -1.0
            xmax = 1.0
            ymin = -2.0
            ymax = 2.0

            [device]
            width = 800
            height = 600

            [textures]
            logo = "images/logo.png"
            "#,
        )
        .unwrap();
        assert_eq!(config.resize_policy, ResizePolicy::AnchorCorner);
        assert_eq!(config.arc_segments, 24);
        assert_eq!(config.view, ViewBounds::new(-1.0, 1.0, -2.0, 2.0));
        assert_eq!(config.device, DeviceSize::new(800, 600));
        assert_eq!(config.background_color().unwrap(), Color::rgb(0.2, 0.3, 0.4));
        assert_eq!(config.textures["logo"], PathBuf::from("images/logo.png"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_background = CanvasConfig::from_toml_str("background = [1.0, 0.0]");
        assert!(matches!(bad_background, Err(ConfigError::Invalid(_))));

        let bad_segments = CanvasConfig::from_toml_str("arc_segments = 1");
        assert!(matches!(bad_segments, Err(ConfigError::Invalid(_))));

        let flat_view =
            CanvasConfig::from_toml_str("[view]\nxmin = 0.0\nxmax = 0.0\nymin = 0.0\nymax = 1.0");
        assert!(matches!(flat_view, Err(ConfigError::Invalid(_))));

        let unknown_policy = CanvasConfig::from_toml_str("resize_policy = \"sideways\"");
        assert!(matches!(unknown_policy, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = CanvasConfig::default();
        config.textures.insert("a".to_string(), PathBuf::from("a.png"));
        let text = config.to_toml().unwrap();
        assert_eq!(CanvasConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_resolves_relative_textures() {
        let dir = std::env::temp_dir().join(format!("easel-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("easel.toml"), "[textures]\nsprite = \"sprite.gif\"\n").unwrap();

        let config = CanvasConfig::load(&dir).unwrap();
        assert_eq!(config.textures["sprite"], dir.join("sprite.gif"));

        let missing = CanvasConfig::load(&dir.join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }
}

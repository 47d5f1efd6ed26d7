// filepath: src/config.rs
//! Configuration handling for the compositor demo
//!
//! This file defines the demo configuration and provides functionality to
//! load and save it from/to a TOML file. DemoConfig describes the
//! destination surface and the list of fills painted onto it.

use crate::color::{Color, Operator};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// One rectangle fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillConfig {
    /// `[left, top, right, bottom]`
    pub rect: [i32; 4],
    /// Straight (non-premultiplied) `[r, g, b, a]`
    pub color: [u8; 4],
    #[serde(default)]
    pub operator: Operator,
}

impl FillConfig {
    pub fn rect(&self) -> Rect {
        Rect::from(self.rect)
    }

    /// Color premultiplied into the surface's native packing
    pub fn color(&self) -> Color {
        let [r, g, b, a] = self.color;
        Color::from_rgba8(r, g, b, a)
    }
}

/// Configuration for the demo surface and what gets drawn on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 4],
    /// Where to write the rendered surface as a PPM image
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub fills: Vec<FillConfig>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            background: [0, 0, 0, 255],
            output: None,
            fills: vec![FillConfig {
                rect: [2, 2, 6, 6],
                color: [255, 255, 255, 128],
                operator: Operator::Over,
            }],
        }
    }
}

impl DemoConfig {
    /// Get the path to the configuration file
    pub fn get_config_path() -> PathBuf {
        let config_dir = if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("rect-compositor")
        } else {
            PathBuf::from(".config/rect-compositor")
        };

        config_dir.join("config.toml")
    }

    pub fn background(&self) -> Color {
        let [r, g, b, a] = self.background;
        Color::from_rgba8(r, g, b, a)
    }

    /// Load configuration from the default location
    pub fn load_from_file() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from_path(&Self::get_config_path())
    }

    /// Load configuration from `path`, writing the default there if missing
    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)?;
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let default_config = Self::default();
                default_config.save_to_path(path)?;
                Ok(default_config)
            }
            Err(e) => Err(Box::new(e)),
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        // Create the directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !Path::exists(parent) {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }
}

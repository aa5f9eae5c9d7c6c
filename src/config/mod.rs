use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::geometry::Color;
use crate::resize::ResizeRestore;
use crate::tools::{ToolOptions, DEFAULT_FONT_SIZE, DEFAULT_STROKE_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "sketchpad";
const APP_CONFIG_FILE: &str = "config.json";

const DEFAULT_SURFACE_WIDTH: u32 = 800;
const DEFAULT_SURFACE_HEIGHT: u32 = 600;

/// Session settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub surface_width: u32,
    pub surface_height: u32,
    pub brush_color: [u8; 3],
    pub stroke_width: u8,
    pub font_size: u8,
    pub history_capacity: Option<NonZeroUsize>,
    pub font_path: Option<PathBuf>,
    pub resize_restore: ResizeRestore,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
            brush_color: [0, 0, 0],
            stroke_width: DEFAULT_STROKE_WIDTH,
            font_size: DEFAULT_FONT_SIZE,
            history_capacity: None,
            font_path: None,
            resize_restore: ResizeRestore::default(),
        }
    }
}

impl SketchConfig {
    pub fn tool_options(&self) -> ToolOptions {
        ToolOptions::new(
            Color::from(self.brush_color),
            self.stroke_width,
            self.font_size,
        )
    }
}

pub fn load_sketch_config() -> SketchConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_sketch_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_sketch_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> SketchConfig {
    let path = match sketch_config_path(xdg_config_home, home) {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!(?err, "no config directory; using defaults");
            return SketchConfig::default();
        }
    };
    if !path.exists() {
        return SketchConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_sketch_config(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            SketchConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            SketchConfig::default()
        }
    }
}

pub fn parse_sketch_config(contents: &str) -> serde_json::Result<SketchConfig> {
    serde_json::from_str(contents)
}

/// `XDG_CONFIG_HOME` and `HOME` as read from the process environment.
pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    let var = |name| std::env::var_os(name).map(PathBuf::from);
    (var("XDG_CONFIG_HOME"), var("HOME"))
}

/// Resolves `<root>/sketchpad/config.json`, where an empty `XDG_CONFIG_HOME`
/// counts as unset.
pub(crate) fn sketch_config_path(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let root = match (xdg_config_home, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg.to_path_buf(),
        (_, Some(home)) => home.join(".config"),
        (_, None) => return Err(ConfigPathError::MissingHomeDirectory),
    };
    Ok(root.join(APP_DIR).join(APP_CONFIG_FILE))
}

// crates/tmedia-cli/src/config.rs
//
// Optional TOML config file, following the `ConfigInner`/`Config` split in
// both `amuseing` repos' config.rs: a plain serde-derived data struct plus
// a thin wrapper that knows how to find/create the file on disk. CLI flags
// (cli.rs) override whatever is loaded here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tmedia_core::command::{ScaleAlgorithm, VideoOutputMode};

fn default_glyph_ramp() -> String {
    " .:-=+*#%@".to_string()
}

fn default_scale_algorithm() -> ScaleAlgorithmConfig {
    ScaleAlgorithmConfig::BoxSampling
}

fn default_output_mode() -> VideoOutputModeConfig {
    VideoOutputModeConfig::Color
}

fn default_volume() -> f32 {
    0.5
}

fn default_ring_capacity_frames() -> usize {
    24_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleAlgorithmConfig {
    BoxSampling,
    Nearest,
}

impl From<ScaleAlgorithmConfig> for ScaleAlgorithm {
    fn from(value: ScaleAlgorithmConfig) -> Self {
        match value {
            ScaleAlgorithmConfig::BoxSampling => ScaleAlgorithm::BoxSampling,
            ScaleAlgorithmConfig::Nearest => ScaleAlgorithm::Nearest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoOutputModeConfig {
    Plain,
    Bg,
    Color,
}

impl From<VideoOutputModeConfig> for VideoOutputMode {
    fn from(value: VideoOutputModeConfig) -> Self {
        match value {
            VideoOutputModeConfig::Plain => VideoOutputMode::Plain,
            VideoOutputModeConfig::Bg => VideoOutputMode::Bg,
            VideoOutputModeConfig::Color => VideoOutputMode::Color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigInner {
    #[serde(default = "default_glyph_ramp")]
    pub glyph_ramp: String,
    #[serde(default = "default_scale_algorithm")]
    pub scale_algorithm: ScaleAlgorithmConfig,
    #[serde(default = "default_output_mode")]
    pub output_mode: VideoOutputModeConfig,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_ring_capacity_frames")]
    pub ring_capacity_frames: usize,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            glyph_ramp: default_glyph_ramp(),
            scale_algorithm: default_scale_algorithm(),
            output_mode: default_output_mode(),
            volume: default_volume(),
            ring_capacity_frames: default_ring_capacity_frames(),
        }
    }
}

pub struct Config {
    pub inner: ConfigInner,
}

impl Config {
    /// Loads `path` if given and present; otherwise tries the default
    /// `~/.config/tmedia/config.toml`, writing out the defaults if nothing
    /// exists yet. Any read/parse failure falls back to in-memory defaults
    /// rather than aborting startup — a malformed config file should not
    /// be fatal for a media player.
    pub fn load(explicit_path: Option<&Path>) -> Self {
        let path = explicit_path.map(PathBuf::from).unwrap_or_else(default_config_path);

        if let Ok(contents) = fs::read_to_string(&path) {
            match toml::from_str(&contents) {
                Ok(inner) => return Self { inner },
                Err(e) => log::warn!("ignoring malformed config at {}: {e}", path.display()),
            }
        } else {
            let inner = ConfigInner::default();
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(toml_str) = toml::to_string_pretty(&inner) {
                let _ = fs::write(&path, toml_str);
            }
            return Self { inner };
        }

        Self { inner: ConfigInner::default() }
    }
}

fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join("tmedia").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let inner = ConfigInner::default();
        let s = toml::to_string_pretty(&inner).unwrap();
        let back: ConfigInner = toml::from_str(&s).unwrap();
        assert_eq!(back.glyph_ramp, inner.glyph_ramp);
        assert_eq!(back.volume, inner.volume);
    }
}

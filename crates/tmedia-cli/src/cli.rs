// crates/tmedia-cli/src/cli.rs
//
// clap-derived argument parsing. Mirrors the config/CLI-flag override
// relationship in both `amuseing` repos (config.rs holds the defaults;
// command-line flags win when given).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use tmedia_core::command::VideoOutputMode;
use tmedia_core::playlist::LoopMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputModeArg {
    Plain,
    Bg,
    Color,
}

impl From<OutputModeArg> for VideoOutputMode {
    fn from(value: OutputModeArg) -> Self {
        match value {
            OutputModeArg::Plain => VideoOutputMode::Plain,
            OutputModeArg::Bg => VideoOutputMode::Bg,
            OutputModeArg::Color => VideoOutputMode::Color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoopArg {
    #[value(name = "none")]
    NoLoop,
    Repeat,
    RepeatOne,
}

impl From<LoopArg> for LoopMode {
    fn from(value: LoopArg) -> Self {
        match value {
            LoopArg::NoLoop => LoopMode::NoLoop,
            LoopArg::Repeat => LoopMode::Repeat,
            LoopArg::RepeatOne => LoopMode::RepeatOne,
        }
    }
}

/// A terminal media player: plays video, audio, and still images as
/// rescaled, quantized character-cell art, driven by a real-time audio
/// clock.
#[derive(Debug, Parser)]
#[command(name = "tmedia", version, about)]
pub struct Args {
    /// Media files or directories to play. A directory is expanded
    /// non-recursively into its playable files, sorted by name.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Loop mode for the playlist.
    #[arg(long, value_enum)]
    pub r#loop: Option<LoopArg>,

    /// Shuffle the playlist on startup.
    #[arg(long)]
    pub shuffle: bool,

    /// Video rendering mode.
    #[arg(long, value_enum)]
    pub mode: Option<OutputModeArg>,

    /// Initial volume in [0.0, 1.0].
    #[arg(long)]
    pub volume: Option<f32>,

    /// Start muted.
    #[arg(long)]
    pub muted: bool,

    /// Start in fullscreen (uses the whole terminal, no status chrome).
    #[arg(long)]
    pub fullscreen: bool,

    /// Path to a config TOML file (default: `~/.config/tmedia/config.toml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

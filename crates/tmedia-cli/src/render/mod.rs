// crates/tmedia-cli/src/render/mod.rs
//
// The renderer shim boundary from spec.md §4.13/§6: `render(state, snapshot)`
// as a trait so the rest of the workspace stays renderer-agnostic. The only
// implementation in this workspace is the crossterm/ratatui backend.

pub mod crossterm_renderer;

use std::path::PathBuf;

use tmedia_core::command::VideoOutputMode;
use tmedia_core::image::PixelData;
use tmedia_core::playlist::LoopMode;

/// Everything the renderer (and, doubling as the `state` the input handler
/// consults for toggle-style commands) needs to draw one frame of chrome.
#[derive(Clone)]
pub struct RenderSnapshot {
    pub frame: PixelData,
    pub output_mode: VideoOutputMode,
    pub glyph_ramp: Vec<char>,
    pub current_path: Option<PathBuf>,
    pub playback_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub volume: f32,
    pub muted: bool,
    pub loop_mode: LoopMode,
    pub shuffled: bool,
    pub fullscreen: bool,
    pub status: Option<String>,
}

pub trait Renderer {
    fn render(&mut self, snapshot: &RenderSnapshot) -> anyhow::Result<()>;

    /// Called once on startup and whenever a `Resize`/`Refresh` command
    /// arrives, returning the render box the caller should rescale video
    /// frames to fit (width, height) in character cells.
    fn render_box(&self) -> (u32, u32);
}

// crates/tmedia-core/src/command.rs
//
// The closed set of user/input commands a renderer-agnostic input handler
// can produce. tmedia-cli's crossterm InputHandler is the only producer in
// this workspace; MediaFetcher and the playlist layer are the consumers.

use crate::playlist::LoopMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoOutputMode {
    /// Character from a glyph ramp, based on luminance only.
    Plain,
    /// Colored background (` ` glyph), color snapped to the nearest palette entry.
    Bg,
    /// Glyph from the ramp plus a colored foreground snapped to the palette.
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleAlgorithm {
    BoxSampling,
    Nearest,
}

impl Default for ScaleAlgorithm {
    fn default() -> Self {
        ScaleAlgorithm::BoxSampling
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Skip,
    Rewind,
    ToggleShuffle,
    SetLoopType(LoopMode),
    Seek(f64),
    SeekOffset(f64),
    Play,
    Pause,
    TogglePlayback,
    SetVideoOutputMode(VideoOutputMode),
    Resize,
    Refresh,
    ToggleFullscreen,
    SetVolume(f32),
    VolumeOffset(f32),
    Mute(bool),
}

// crates/tmedia-core/src/lib.rs
//
// Pure data types and algorithms shared by every tmedia crate: the media
// clock, the audio ring buffers, the playlist, the pixel/color/palette
// model, scaling and formatting helpers, and the closed command/error
// vocabularies. No I/O, no ffmpeg, no audio device — those live in
// tmedia-decode, tmedia-audio, and tmedia-player.

pub mod audio;
pub mod clock;
pub mod command;
pub mod error;
pub mod image;
pub mod media_kind;
pub mod playlist;
pub mod util;

pub use clock::MediaClock;
pub use command::{Command, ScaleAlgorithm, VideoOutputMode};
pub use error::{Result, TmediaError};
pub use media_kind::MediaKind;
pub use playlist::{LoopMode, MoveCmd, Playlist};

// crates/tmedia-core/src/error.rs
//
// The error taxonomy shared by every tmedia crate. Worker threads in
// tmedia-player map any non-transient error here before calling
// MediaFetcher::dispatch_exit; helpers in this crate only ever produce the
// "programming-contract violation" variants (EmptyPalette, InvalidRange,
// InvalidArgument), since they have no I/O or external library to fail on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any failure surfaced by the demux/decode/resample/rescale backend.
    #[error("external library error ({code}): {message}")]
    ExternalLib { code: i32, message: String },

    /// A StreamDecoder exceeded its decode-retry budget (ALLOWED_FAILURES).
    #[error("decode error: exceeded retry budget after {attempts} attempts")]
    Decode { attempts: u32 },

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("palette is empty")]
    EmptyPalette,

    #[error("value {value} out of range [{min}, {max}]")]
    InvalidRange { value: f64, min: f64, max: f64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Sentinel for cooperative cancellation — not a real failure.
    #[error("shutdown requested")]
    ShutdownRequested,
}

pub type Result<T> = std::result::Result<T, TmediaError>;

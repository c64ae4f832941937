// crates/tmedia-decode/src/lib.rs
//
// The ffmpeg-the-third wrapper layer: demuxing, per-stream decode state
// machines, resampling/rescaling, and file probing. Everything above this
// crate talks in terms of DecodedFrame/PixelData/MediaKind, never ffmpeg
// types directly.

pub mod audioresampler;
pub mod mediadecoder;
pub mod probe;
pub mod streamdecoder;
pub mod videoconverter;

pub use audioresampler::AudioResampler;
pub use mediadecoder::{AudioParams, MediaDecoder, StreamInfo, StreamKind, VideoParams};
pub use probe::{probe, ProbeInfo};
pub use streamdecoder::{DecodedFrame, State as StreamDecoderState, StreamDecoder};
pub use videoconverter::VideoConverter;

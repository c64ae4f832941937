// crates/tmedia-audio/src/lib.rs
//
// Real-time audio output. AudioOutput is the only public type: a cpal device
// wrapper bridged to the decode/player side by a wait-free SPSC queue.

pub mod output;

pub use output::{AudioOutput, AudioSource, DeviceConfig};

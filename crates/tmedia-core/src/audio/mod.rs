// crates/tmedia-core/src/audio/mod.rs

mod blocking_ring_buffer;
mod ring_buffer;

pub use blocking_ring_buffer::BlockingAudioRingBuffer;
pub use ring_buffer::AudioRingBuffer;

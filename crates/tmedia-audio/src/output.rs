// crates/tmedia-audio/src/output.rs
//
// cpal-backed AudioOutput. Two-stage design grounded in vidplayer's
// AudioStreamProducer/AudioStreamConsumer split over a ringbuf::HeapRb: a
// queue-fill thread drains a user on_data callback into the SPSC producer
// side, and the cpal stream callback only ever pops from the consumer side —
// no locks, no allocation, on the real-time thread.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;

use tmedia_core::error::{Result, TmediaError};

/// ~0.5s of stereo audio at 48kHz; big enough to absorb scheduling jitter
/// in the queue-fill thread without the host callback ever starving.
const QUEUE_CAPACITY_FRAMES: usize = 24_000;

struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self { bits: AtomicU32::new(value.to_bits()) }
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DeviceConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Shared state the host callback and the queue-fill thread both touch.
/// Every field here is lock-free so the host callback stays wait-free.
struct Shared {
    muted: AtomicBool,
    volume: AtomicF32,
    running: AtomicBool,
}

/// User-supplied producer of audio samples: fills `dst` (interleaved,
/// `channels` wide) with up to `dst.len() / channels` frames, returning the
/// number of frames actually written.
pub trait AudioSource: Send + 'static {
    fn on_data(&mut self, dst: &mut [f32], channels: u16) -> usize;
}

impl<F> AudioSource for F
where
    F: FnMut(&mut [f32], u16) -> usize + Send + 'static,
{
    fn on_data(&mut self, dst: &mut [f32], channels: u16) -> usize {
        self(dst, channels)
    }
}

pub struct AudioOutput {
    config: DeviceConfig,
    shared: Arc<Shared>,
    stream: Option<Stream>,
    fill_thread: Option<JoinHandle<()>>,
    producer: Arc<Mutex<Option<ringbuf::HeapProd<f32>>>>,
    cached_volume: f32,
}

impl AudioOutput {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                muted: AtomicBool::new(false),
                volume: AtomicF32::new(1.0),
                running: AtomicBool::new(false),
            }),
            stream: None,
            fill_thread: None,
            producer: Arc::new(Mutex::new(None)),
            cached_volume: 1.0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn get_volume(&self) -> f32 {
        self.shared.volume.load()
    }

    /// Values outside [0.0, 1.0] are silently clamped.
    pub fn set_volume(&mut self, volume: f32) {
        let clamped = volume.clamp(0.0, 1.0);
        self.cached_volume = clamped;
        self.shared.volume.store(clamped);
    }

    pub fn is_muted(&self) -> bool {
        self.shared.muted.load(Ordering::Acquire)
    }

    pub fn set_muted(&self, muted: bool) {
        self.shared.muted.store(muted, Ordering::Release);
    }

    /// If the device was torn down (stop() was called, or this is the first
    /// start), re-inits using the cached config and re-applies the cached
    /// volume, then starts the stream.
    pub fn start(&mut self, source: impl AudioSource) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| TmediaError::AudioDevice("no default output device".into()))?;

        let stream_config = StreamConfig {
            channels: self.config.channels,
            sample_rate: SampleRate(self.config.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let rb = HeapRb::<f32>::new(QUEUE_CAPACITY_FRAMES * self.config.channels as usize);
        let (producer, mut consumer) = rb.split();
        *self.producer.lock().unwrap() = Some(producer);

        self.shared.running.store(true, Ordering::Release);
        self.shared.volume.store(self.cached_volume);

        let callback_shared = Arc::clone(&self.shared);
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_from_queue(data, &mut consumer, &callback_shared);
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| TmediaError::AudioDevice(e.to_string()))?;

        stream.play().map_err(|e| TmediaError::AudioDevice(e.to_string()))?;

        let channels = self.config.channels;
        let producer_handle = Arc::clone(&self.producer);
        let shared_for_fill = Arc::clone(&self.shared);
        let mut source = source;
        let fill_thread = std::thread::spawn(move || {
            let mut scratch = vec![0.0f32; 4096 * channels as usize];
            while shared_for_fill.running.load(Ordering::Acquire) {
                let written = source.on_data(&mut scratch, channels);
                if written == 0 {
                    std::thread::sleep(Duration::from_millis(5));
                    continue;
                }
                let mut offset = 0;
                let total = written * channels as usize;
                while offset < total && shared_for_fill.running.load(Ordering::Acquire) {
                    let pushed = {
                        let mut guard = producer_handle.lock().unwrap();
                        match guard.as_mut() {
                            Some(p) => p.push_slice(&scratch[offset..total]),
                            None => break,
                        }
                    };
                    offset += pushed;
                    if pushed == 0 {
                        std::thread::sleep(Duration::from_micros(500));
                    }
                }
            }
        });

        self.stream = Some(stream);
        self.fill_thread = Some(fill_thread);
        Ok(())
    }

    /// Fully uninitializes the device — not just pauses. Some host audio
    /// subsystems go out of sync if only paused, so we tear the stream and
    /// queue-fill thread down entirely and rebuild on the next start().
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.stream.take(); // dropping stops the cpal stream
        if let Some(handle) = self.fill_thread.take() {
            let _ = handle.join();
        }
        *self.producer.lock().unwrap() = None;
    }
}

fn fill_from_queue(output: &mut [f32], consumer: &mut ringbuf::HeapCons<f32>, shared: &Shared) {
    let muted = shared.muted.load(Ordering::Acquire);
    let volume = shared.volume.load();

    let available = consumer.occupied_len();
    let to_read = output.len().min(available);
    let read = consumer.pop_slice(&mut output[..to_read]);

    if muted {
        output[..read].fill(0.0);
    } else {
        for sample in &mut output[..read] {
            *sample *= volume;
        }
    }
    output[read..].fill(0.0);
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_clamps_to_unit_range() {
        let mut out = AudioOutput::new(DeviceConfig { sample_rate: 44100, channels: 2 });
        out.set_volume(5.0);
        assert_eq!(out.get_volume(), 1.0);
        out.set_volume(-1.0);
        assert_eq!(out.get_volume(), 0.0);
        out.set_volume(0.42);
        assert!((out.get_volume() - 0.42).abs() < 1e-6);
    }

    #[test]
    fn fresh_output_is_not_playing() {
        let out = AudioOutput::new(DeviceConfig { sample_rate: 44100, channels: 2 });
        assert!(!out.is_playing());
    }
}

// crates/tmedia-player/src/fetcher.rs
//
// MediaFetcher: the playback coordinator. Owns the worker threads and the
// seek/pause/shutdown protocol, generalized from the teacher's MediaWorker
// (crossbeam channels + a Mutex<Option<T>>+Condvar latest-wins slot for
// scrub requests, a poison-pill shutdown flag) to the coarser single
// alter_mutex + epoch-tagged seek messages spec.md's concurrency model
// calls for: no worker may hold alter_mutex across a blocking wait.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tmedia_audio::{AudioOutput, DeviceConfig};
use tmedia_core::audio::BlockingAudioRingBuffer;
use tmedia_core::clock::MediaClock;
use tmedia_core::error::{Result, TmediaError};
use tmedia_core::image::PixelData;

use ffmpeg_the_third::util::rational::Rational;
use tmedia_decode::audioresampler::DST_CHANNELS;
use tmedia_decode::mediadecoder::{AudioParams, StreamKind, VideoParams};
use tmedia_decode::{AudioResampler, DecodedFrame, MediaDecoder, VideoConverter};

/// A/V desync (audio ring buffer current_time vs. media clock) above this
/// threshold restarts the audio output device. Video self-syncs to the
/// clock every frame, so it is never the side that needs a restart.
const DESYNC_RESTART_THRESHOLD_SECS: f64 = 0.150;

/// Upper bound on every blocking wait in the worker loops, so shutdown
/// latency stays bounded regardless of media content.
const MAX_WAIT: Duration = Duration::from_millis(100);

/// Stereo audio ring buffer capacity, in frames. ~0.5s of headroom at
/// typical sample rates absorbs decode-thread scheduling jitter.
const RING_CAPACITY_FRAMES: usize = 24_000;

const RING_CHANNELS: usize = DST_CHANNELS as usize;

struct AlterState {
    decoder: MediaDecoder,
    clock: MediaClock,
    video_converter: Option<VideoConverter>,
    frame: PixelData,
}

/// Worker threads source a monotonic `now` relative to this fixed reference
/// instead of depending on any caller-supplied clock — MediaClock itself
/// stays deliberately decoupled from wall time (see clock.rs).
fn now_secs(epoch: Instant) -> f64 {
    epoch.elapsed().as_secs_f64()
}

pub struct MediaFetcher {
    epoch: Instant,
    alter: Mutex<AlterState>,
    resume_gate: Mutex<bool>,
    resume_cond: Condvar,
    in_use: AtomicBool,
    frame_changed: AtomicBool,
    video_seek_epoch: AtomicU64,
    audio_seek_epoch: AtomicU64,
    error: Mutex<Option<String>>,
    audio_ring: Option<Arc<BlockingAudioRingBuffer>>,
    audio_output: Option<Mutex<AudioOutput>>,
    audio_resampler: Option<Mutex<AudioResampler>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    duration: f64,
    has_video: bool,
    has_audio: bool,
}

impl MediaFetcher {
    pub fn open(path: &Path, dst_w: u32, dst_h: u32) -> Result<Self> {
        let decoder = MediaDecoder::open(path)?;
        let duration = decoder.duration();
        let has_video = decoder.has_stream(StreamKind::Video);
        let has_audio = decoder.has_stream(StreamKind::Audio);

        let video_converter = match decoder.video_params() {
            Some(VideoParams { format, width, height }) => {
                Some(VideoConverter::new(format, width, height, dst_w, dst_h)?)
            }
            None => None,
        };

        let (audio_ring, audio_output, audio_resampler) = if has_audio {
            let AudioParams { format, sample_rate, channel_layout } = decoder
                .audio_params()
                .ok_or_else(|| TmediaError::InvalidArgument("audio stream with no cached params".into()))?;

            let resampler = AudioResampler::new(format, channel_layout, sample_rate, sample_rate)?;
            let ring = Arc::new(BlockingAudioRingBuffer::new(
                RING_CAPACITY_FRAMES,
                RING_CHANNELS,
                sample_rate,
                0.0,
            ));
            let output = AudioOutput::new(DeviceConfig { sample_rate, channels: RING_CHANNELS as u16 });
            (Some(ring), Some(Mutex::new(output)), Some(Mutex::new(resampler)))
        } else {
            (None, None, None)
        };

        let frame = PixelData::new(dst_w as usize, dst_h as usize, Default::default());

        Ok(Self {
            epoch: Instant::now(),
            alter: Mutex::new(AlterState { decoder, clock: MediaClock::new(), video_converter, frame }),
            resume_gate: Mutex::new(false),
            resume_cond: Condvar::new(),
            in_use: AtomicBool::new(false),
            frame_changed: AtomicBool::new(false),
            video_seek_epoch: AtomicU64::new(0),
            audio_seek_epoch: AtomicU64::new(0),
            error: Mutex::new(None),
            audio_ring,
            audio_output,
            audio_resampler,
            handles: Mutex::new(Vec::new()),
            duration,
            has_video,
            has_audio,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.alter.lock().unwrap().clock.is_playing()
    }

    /// True until `dispatch_exit` has run (natural end-of-media, a fatal
    /// worker error, or an explicit `join`). Lets the coordinator's caller
    /// poll for "did playback finish" without blocking in `join`.
    pub fn is_active(&self) -> bool {
        self.in_use()
    }

    pub fn take_frame_if_changed(&self) -> Option<PixelData> {
        if self.frame_changed.swap(false, Ordering::AcqRel) {
            Some(self.alter.lock().unwrap().frame.clone())
        } else {
            None
        }
    }

    pub fn current_time(&self) -> f64 {
        let now = now_secs(self.epoch);
        self.alter.lock().unwrap().clock.get_time(now)
    }

    pub fn get_volume(&self) -> f32 {
        self.audio_output.as_ref().map(|o| o.lock().unwrap().get_volume()).unwrap_or(0.0)
    }

    pub fn set_volume(&self, volume: f32) {
        if let Some(out) = &self.audio_output {
            out.lock().unwrap().set_volume(volume);
        }
    }

    pub fn is_muted(&self) -> bool {
        self.audio_output.as_ref().map(|o| o.lock().unwrap().is_muted()).unwrap_or(false)
    }

    pub fn set_muted(&self, muted: bool) {
        if let Some(out) = &self.audio_output {
            out.lock().unwrap().set_muted(muted);
        }
    }

    pub fn pause(&self) {
        let now = now_secs(self.epoch);
        self.alter.lock().unwrap().clock.pause(now);
    }

    /// Resumes the clock and wakes any worker parked in the resume gate.
    /// Never holds alter_mutex while notifying, since the gate is a
    /// deliberately separate lock from alter_mutex (spec.md's no-blocking-
    /// wait-under-alter_mutex rule).
    pub fn resume(&self) {
        let now = now_secs(self.epoch);
        self.alter.lock().unwrap().clock.resume(now);
        *self.resume_gate.lock().unwrap() = true;
        self.resume_cond.notify_all();
    }

    /// Locks alter_mutex only long enough to compute and apply the clock
    /// skip, then bumps both seek epochs so in-flight worker iterations
    /// notice and re-seek to the latest target rather than racing each
    /// other toward stale ones.
    pub fn seek(&self, target: f64) {
        let target = target.clamp(0.0, self.duration.max(0.0));
        let now = now_secs(self.epoch);
        {
            let mut state = self.alter.lock().unwrap();
            let delta = target - state.clock.get_time(now);
            state.clock.skip(delta);
        }
        self.video_seek_epoch.fetch_add(1, Ordering::SeqCst);
        self.audio_seek_epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(ring) = &self.audio_ring {
            ring.clear(target);
        }
    }

    /// Rebuilds the video converter's destination size (e.g. on a terminal
    /// `Resize` command). A no-op for audio-only media or when the size is
    /// unchanged (`VideoConverter::reset_dst_size` already short-circuits
    /// that case).
    pub fn resize_video(&self, dst_w: u32, dst_h: u32) -> Result<()> {
        let mut state = self.alter.lock().unwrap();
        if let Some(converter) = state.video_converter.as_mut() {
            converter.reset_dst_size(dst_w, dst_h)?;
        }
        Ok(())
    }

    pub fn take_error(&self) -> Option<String> {
        self.error.lock().unwrap().take()
    }

    fn record_error(&self, msg: String) {
        let mut slot = self.error.lock().unwrap();
        if slot.is_none() {
            *slot = Some(msg);
        }
    }

    fn in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    /// Spawns every worker thread. Requires `self` behind an `Arc` since
    /// each worker holds a clone for its lifetime. Not restartable: a
    /// second call on an already-running fetcher is a no-op.
    pub fn begin(self: &Arc<Self>) {
        if self.in_use.swap(true, Ordering::AcqRel) {
            return;
        }
        self.alter.lock().unwrap().clock.init(now_secs(self.epoch));

        let mut handles = self.handles.lock().unwrap();

        // The video thread always runs, even for audio-only media: with no
        // video stream it falls back to rendering an audio-buffer
        // visualizer instead of decoded frames (spec.md §4.9/§9).
        handles.push(spawn_video_thread(Arc::clone(self)));
        if self.has_audio {
            handles.push(spawn_audio_decode_thread(Arc::clone(self)));
            if let Err(e) = self.start_audio_output() {
                self.record_error(e.to_string());
            }
        }
        handles.push(spawn_duration_watchdog(Arc::clone(self)));
    }

    fn start_audio_output(&self) -> Result<()> {
        let Some(ring) = self.audio_ring.clone() else { return Ok(()) };
        let Some(output) = &self.audio_output else { return Ok(()) };
        let channels = RING_CHANNELS as u16;
        output.lock().unwrap().start(move |dst: &mut [f32], _channels: u16| {
            let frames = dst.len() / channels as usize;
            if frames == 0 {
                return 0;
            }
            if !ring.try_read_into(frames, dst, MAX_WAIT) {
                dst.fill(0.0);
                return 0;
            }
            frames
        })
    }

    /// Signals every worker to exit and waits for them to join, consuming
    /// the shared `Arc` since a fetcher is never restarted after join.
    pub fn join(self: Arc<Self>) -> Result<()> {
        self.dispatch_exit(None);
        let mut handles = self.handles.lock().unwrap();
        for h in handles.drain(..) {
            let _ = h.join();
        }
        drop(handles);
        if let Some(out) = &self.audio_output {
            out.lock().unwrap().stop();
        }
        match self.take_error() {
            Some(msg) => Err(TmediaError::InvalidArgument(msg)),
            None => Ok(()),
        }
    }

    /// Sets `in_use=false` and wakes every condition a worker might be
    /// blocked on. `err`, if given, is recorded only if no error has been
    /// recorded yet (first-error-wins).
    pub fn dispatch_exit(&self, err: Option<String>) {
        if let Some(msg) = err {
            self.record_error(msg);
        }
        self.in_use.store(false, Ordering::Release);
        *self.resume_gate.lock().unwrap() = true;
        self.resume_cond.notify_all();
        if let Some(ring) = &self.audio_ring {
            ring.clear(ring.current_time());
        }
    }

    /// Parks the calling worker here while paused, returning as soon as
    /// either playback resumes or exit is requested. Never called while
    /// holding alter_mutex.
    fn wait_for_resume_or_exit(&self) {
        let mut guard = self.resume_gate.lock().unwrap();
        *guard = false;
        let (mut guard, _) = self
            .resume_cond
            .wait_timeout_while(guard, MAX_WAIT, |resumed| !*resumed && self.in_use())
            .unwrap();
        *guard = false;
    }
}

/// Video fetch loop: decode frames, scale to the destination size, store
/// under alter_mutex, signal frame_changed, and sleep until the clock says
/// the next frame is due. Restarts from the new position whenever
/// video_seek_epoch changes underneath it.
fn spawn_video_thread(fetcher: Arc<MediaFetcher>) -> JoinHandle<()> {
    if !fetcher.has_video {
        return spawn_audio_visualizer_thread(fetcher);
    }
    thread::spawn(move || {
        let mut last_seen_epoch = fetcher.video_seek_epoch.load(Ordering::SeqCst);
        while fetcher.in_use() {
            if !fetcher.alter.lock().unwrap().clock.is_playing() {
                fetcher.wait_for_resume_or_exit();
                continue;
            }

            let current_epoch = fetcher.video_seek_epoch.load(Ordering::SeqCst);
            let seek_target = if current_epoch != last_seen_epoch {
                last_seen_epoch = current_epoch;
                let now = now_secs(fetcher.epoch);
                Some(fetcher.alter.lock().unwrap().clock.get_time(now))
            } else {
                None
            };

            let decoded = {
                let mut state = fetcher.alter.lock().unwrap();
                if let Some(target) = seek_target {
                    if let Err(e) = state.decoder.jump_to_time(target) {
                        drop(state);
                        fetcher.dispatch_exit(Some(e.to_string()));
                        break;
                    }
                }
                state.decoder.next_frames(StreamKind::Video)
            };

            let frames = match decoded {
                Ok(f) => f,
                Err(e) => {
                    fetcher.dispatch_exit(Some(e.to_string()));
                    break;
                }
            };

            if frames.is_empty() {
                // EOF: nothing more to decode for this stream. Sleep briefly
                // so the loop keeps noticing seeks/exit without busy-spinning.
                thread::sleep(Duration::from_millis(20));
                continue;
            }

            for frame in frames {
                let DecodedFrame::Video(vframe) = frame else { continue };
                let pts_secs = {
                    let state = fetcher.alter.lock().unwrap();
                    state
                        .decoder
                        .stream_info(StreamKind::Video)
                        .map(|info| pts_to_secs(vframe.pts(), info.time_base))
                        .unwrap_or(0.0)
                };

                // Pace to the media clock before presenting this frame.
                loop {
                    if !fetcher.in_use() {
                        return;
                    }
                    let now = now_secs(fetcher.epoch);
                    let (clock_time, playing) = {
                        let state = fetcher.alter.lock().unwrap();
                        (state.clock.get_time(now), state.clock.is_playing())
                    };
                    if !playing || clock_time >= pts_secs {
                        break;
                    }
                    thread::sleep(Duration::from_millis(5));
                }

                let mut state = fetcher.alter.lock().unwrap();
                if let Some(converter) = state.video_converter.as_mut() {
                    match converter.convert(&vframe) {
                        Ok(pixels) => {
                            state.frame = pixels;
                            drop(state);
                            fetcher.frame_changed.store(true, Ordering::Release);
                        }
                        Err(e) => {
                            drop(state);
                            fetcher.dispatch_exit(Some(e.to_string()));
                            return;
                        }
                    }
                }
            }
        }
    })
}

/// Stand-in "video" thread for audio-only media: instead of decoding video
/// frames it peeks the latest audio-ring samples and renders a bar
/// visualizer via Canvas, at a fixed ~20fps. Whether this thread needs to
/// exist at all for pure-audio files is a policy choice spec.md §9 leaves
/// open; we choose to run it so audio-only files still drive the renderer.
fn spawn_audio_visualizer_thread(fetcher: Arc<MediaFetcher>) -> JoinHandle<()> {
    thread::spawn(move || {
        const PEEK_FRAMES: usize = 256;
        while fetcher.in_use() {
            if let Some(ring) = &fetcher.audio_ring {
                let mut samples = vec![0.0f32; PEEK_FRAMES * RING_CHANNELS];
                if ring.peek_into(PEEK_FRAMES, &mut samples) {
                    let pixels = render_visualizer(&samples, RING_CHANNELS);
                    let mut state = fetcher.alter.lock().unwrap();
                    state.frame = pixels;
                    drop(state);
                    fetcher.frame_changed.store(true, Ordering::Release);
                }
            }
            thread::sleep(Duration::from_millis(50));
        }
    })
}

/// Renders interleaved samples as a column-per-bucket amplitude bar chart
/// onto a fixed-size canvas, via Canvas::vertline.
fn render_visualizer(samples: &[f32], channels: usize) -> PixelData {
    use tmedia_core::image::{Canvas, Rgb24};

    const WIDTH: usize = 80;
    const HEIGHT: usize = 24;
    let mut canvas = Canvas::new(WIDTH, HEIGHT, Rgb24::BLACK);

    let frames = samples.len() / channels.max(1);
    if frames == 0 {
        return canvas.get_image();
    }
    let bucket = (frames / WIDTH).max(1);

    for col in 0..WIDTH {
        let start = col * bucket;
        if start >= frames {
            break;
        }
        let end = (start + bucket).min(frames);
        let mut peak = 0.0f32;
        for f in start..end {
            for c in 0..channels {
                peak = peak.max(samples[f * channels + c].abs());
            }
        }
        let bar_h = (peak.clamp(0.0, 1.0) * (HEIGHT as f32 - 1.0)) as isize;
        let mid = (HEIGHT / 2) as isize;
        canvas.vertline(col as isize, mid - bar_h, mid + bar_h, Rgb24::new(80, 200, 255));
    }
    canvas.get_image()
}

fn pts_to_secs(pts: Option<i64>, time_base: Rational) -> f64 {
    match pts {
        Some(p) => p as f64 * time_base.numerator() as f64 / time_base.denominator() as f64,
        None => 0.0,
    }
}

/// Audio decode loop: decode, resample to the ring buffer's fixed format,
/// and block-write into the ring. Playback pacing is implicit in the ring
/// buffer's blocking writes (the cpal callback drains it at device rate).
fn spawn_audio_decode_thread(fetcher: Arc<MediaFetcher>) -> JoinHandle<()> {
    thread::spawn(move || {
        let Some(ring) = fetcher.audio_ring.clone() else { return };
        let mut last_seen_epoch = fetcher.audio_seek_epoch.load(Ordering::SeqCst);

        while fetcher.in_use() {
            if !fetcher.alter.lock().unwrap().clock.is_playing() {
                fetcher.wait_for_resume_or_exit();
                continue;
            }

            let current_epoch = fetcher.audio_seek_epoch.load(Ordering::SeqCst);
            let seek_target = if current_epoch != last_seen_epoch {
                last_seen_epoch = current_epoch;
                let now = now_secs(fetcher.epoch);
                Some(fetcher.alter.lock().unwrap().clock.get_time(now))
            } else {
                None
            };

            let decoded = {
                let mut state = fetcher.alter.lock().unwrap();
                if let Some(target) = seek_target {
                    if let Err(e) = state.decoder.jump_to_time(target) {
                        drop(state);
                        fetcher.dispatch_exit(Some(e.to_string()));
                        break;
                    }
                }
                state.decoder.next_frames(StreamKind::Audio)
            };

            let frames = match decoded {
                Ok(f) => f,
                Err(e) => {
                    fetcher.dispatch_exit(Some(e.to_string()));
                    break;
                }
            };

            if frames.is_empty() {
                thread::sleep(Duration::from_millis(20));
                continue;
            }

            for frame in frames {
                let DecodedFrame::Audio(aframe) = frame else { continue };
                let Some(resampler) = &fetcher.audio_resampler else { continue };
                let converted = resampler.lock().unwrap().convert(&aframe);
                let samples = match converted {
                    Ok(f) => f,
                    Err(e) => {
                        fetcher.dispatch_exit(Some(e.to_string()));
                        return;
                    }
                };

                let interleaved = samples.data(0);
                let as_f32: &[f32] = bytemuck_cast_f32(interleaved);
                if as_f32.is_empty() {
                    continue;
                }
                let frame_count = as_f32.len() / RING_CHANNELS;
                if frame_count == 0 {
                    continue;
                }
                if !ring.try_write_into(frame_count, &as_f32[..frame_count * RING_CHANNELS], MAX_WAIT) {
                    // Backpressure: writer will retry next loop iteration.
                    continue;
                }
            }

            check_av_desync(&fetcher);
        }
    })
}

/// Reinterprets a raw little-endian f32 byte slice without requiring the
/// `bytemuck` crate: ffmpeg frame buffers are always natively aligned for
/// their sample format, so an exact-size slice cast is sound here.
fn bytemuck_cast_f32(bytes: &[u8]) -> &[f32] {
    let len = bytes.len() / std::mem::size_of::<f32>();
    unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const f32, len) }
}

/// If the audio ring's playhead has drifted from the media clock by more
/// than the desync threshold, restart the audio output device. Grounded in
/// the original implementation's A/V resync watchdog.
fn check_av_desync(fetcher: &Arc<MediaFetcher>) {
    let Some(ring) = &fetcher.audio_ring else { return };
    let now = now_secs(fetcher.epoch);
    let clock_time = fetcher.alter.lock().unwrap().clock.get_time(now);
    let ring_time = ring.current_time();
    if (ring_time - clock_time).abs() > DESYNC_RESTART_THRESHOLD_SECS {
        if let Some(out) = &fetcher.audio_output {
            let mut out = out.lock().unwrap();
            out.stop();
            drop(out);
            let _ = fetcher.start_audio_output();
        }
    }
}

/// Watches for the clock reaching end-of-media and dispatches exit once it
/// does, so join() returns promptly at natural end of playback.
fn spawn_duration_watchdog(fetcher: Arc<MediaFetcher>) -> JoinHandle<()> {
    thread::spawn(move || {
        while fetcher.in_use() {
            let now = now_secs(fetcher.epoch);
            let (time, playing) = {
                let state = fetcher.alter.lock().unwrap();
                (state.clock.get_time(now), state.clock.is_playing())
            };
            if playing && fetcher.duration > 0.0 && time >= fetcher.duration {
                fetcher.dispatch_exit(None);
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_to_secs_scales_by_time_base() {
        let tb = Rational::new(1, 25);
        assert_eq!(pts_to_secs(Some(50), tb), 2.0);
        assert_eq!(pts_to_secs(None, tb), 0.0);
    }

    #[test]
    fn bytemuck_cast_f32_reinterprets_exact_length() {
        let value: f32 = 1.5;
        let mut bytes = value.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&2.5f32.to_ne_bytes());
        let floats = bytemuck_cast_f32(&bytes);
        assert_eq!(floats, &[1.5, 2.5]);
    }

    #[test]
    fn bytemuck_cast_f32_drops_a_trailing_partial_sample() {
        let mut bytes = 1.0f32.to_ne_bytes().to_vec();
        bytes.push(0); // 3 extra bytes, not a whole f32
        bytes.push(0);
        bytes.push(0);
        assert_eq!(bytemuck_cast_f32(&bytes).len(), 1);
    }

    #[test]
    fn render_visualizer_on_silence_returns_a_flat_canvas_sized_frame() {
        let samples = vec![0.0f32; 256 * 2];
        let pixels = render_visualizer(&samples, 2);
        assert_eq!(pixels.width(), 80);
        assert_eq!(pixels.height(), 24);
    }

    #[test]
    fn render_visualizer_on_empty_samples_still_returns_canvas_size() {
        let pixels = render_visualizer(&[], 2);
        assert_eq!(pixels.width(), 80);
        assert_eq!(pixels.height(), 24);
    }

    #[test]
    fn now_secs_is_monotonic_and_nonnegative() {
        let epoch = Instant::now();
        let first = now_secs(epoch);
        let second = now_secs(epoch);
        assert!(first >= 0.0);
        assert!(second >= first);
    }
}

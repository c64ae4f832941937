// crates/tmedia-decode/src/streamdecoder.rs
//
// Per-stream decode state machine, generalized from the teacher's
// LiveDecoder (which hardcoded a single video stream) to work over either a
// video or an audio ffmpeg decoder. MediaDecoder owns one of these per
// demuxed stream it cares about.

use std::collections::VecDeque;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec::context::Context as CodecContext;
use ffmpeg::Packet;
use ffmpeg::util::rational::Rational;

use tmedia_core::error::{Result, TmediaError};

/// A decoded frame, tagged by the stream kind it came from. MediaDecoder
/// hands these to the VideoConverter/AudioResampler respectively.
pub enum DecodedFrame {
    Video(ffmpeg::util::frame::video::Video),
    Audio(ffmpeg::util::frame::audio::Audio),
}

enum Decoder {
    Video(ffmpeg::decoder::video::Video),
    Audio(ffmpeg::decoder::audio::Audio),
}

/// Budget of consecutive hard decode failures tolerated before decode_next
/// surfaces a `Decode` error. Transient EAGAIN-style failures (no frame
/// produced yet, more packets needed) do not count against this budget.
const ALLOWED_FAILURES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Packet queue empty, decoder internals drained.
    Idle,
    /// Packet queue has at least one pending packet.
    Buffered,
    /// Flushed as part of a seek; no packets queued, decoder reset.
    Draining,
}

pub struct StreamDecoder {
    decoder: Decoder,
    time_base: Rational,
    queue: VecDeque<Packet>,
    state: State,
}

impl StreamDecoder {
    pub fn new_video(decoder: ffmpeg::decoder::video::Video, time_base: Rational) -> Self {
        Self {
            decoder: Decoder::Video(decoder),
            time_base,
            queue: VecDeque::new(),
            state: State::Idle,
        }
    }

    pub fn new_audio(decoder: ffmpeg::decoder::audio::Audio, time_base: Rational) -> Self {
        Self {
            decoder: Decoder::Audio(decoder),
            time_base,
            queue: VecDeque::new(),
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn pts_to_secs(&self, pts: i64) -> f64 {
        pts as f64 * self.time_base.numerator() as f64 / self.time_base.denominator() as f64
    }

    /// Appends a packet to this stream's FIFO. No decoding happens here.
    pub fn push_packet(&mut self, packet: Packet) {
        self.queue.push_back(packet);
        self.state = State::Buffered;
    }

    /// Pops packets and feeds the decoder until at least one frame is
    /// produced or the queue empties. Frames are returned in PTS order
    /// since ffmpeg's receive_frame already yields them that way per send.
    pub fn decode_next(&mut self) -> Result<Vec<DecodedFrame>> {
        let mut failures = 0u32;
        loop {
            let Some(packet) = self.queue.pop_front() else {
                self.state = State::Idle;
                return Ok(Vec::new());
            };

            let send_result = match &mut self.decoder {
                Decoder::Video(d) => d.send_packet(&packet),
                Decoder::Audio(d) => d.send_packet(&packet),
            };

            if send_result.is_err() {
                failures += 1;
                if failures > ALLOWED_FAILURES {
                    return Err(TmediaError::Decode { attempts: failures });
                }
                continue;
            }

            let frames = self.drain_decoder()?;
            if self.queue.is_empty() {
                self.state = State::Idle;
            }
            if !frames.is_empty() {
                return Ok(frames);
            }
            // Decoder accepted the packet but needs more input before it can
            // emit a frame (common with B-frames) — loop and feed the next one.
        }
    }

    fn drain_decoder(&mut self) -> Result<Vec<DecodedFrame>> {
        let mut out = Vec::new();
        match &mut self.decoder {
            Decoder::Video(d) => {
                let mut frame = ffmpeg::util::frame::video::Video::empty();
                while d.receive_frame(&mut frame).is_ok() {
                    out.push(DecodedFrame::Video(frame));
                    frame = ffmpeg::util::frame::video::Video::empty();
                }
            }
            Decoder::Audio(d) => {
                let mut frame = ffmpeg::util::frame::audio::Audio::empty();
                while d.receive_frame(&mut frame).is_ok() {
                    out.push(DecodedFrame::Audio(frame));
                    frame = ffmpeg::util::frame::audio::Audio::empty();
                }
            }
        }
        Ok(out)
    }

    /// Flushes decoder state and drops all queued packets. Called on seek.
    pub fn reset(&mut self) {
        self.queue.clear();
        match &mut self.decoder {
            Decoder::Video(d) => d.flush(),
            Decoder::Audio(d) => d.flush(),
        }
        self.state = State::Draining;
    }
}

pub(crate) fn open_video_decoder(
    ctx: CodecContext,
) -> Result<ffmpeg::decoder::video::Video> {
    ctx.decoder().video().map_err(|e| TmediaError::ExternalLib {
        code: 0,
        message: format!("open video decoder: {e}"),
    })
}

pub(crate) fn open_audio_decoder(
    ctx: CodecContext,
) -> Result<ffmpeg::decoder::audio::Audio> {
    ctx.decoder().audio().map_err(|e| TmediaError::ExternalLib {
        code: 0,
        message: format!("open audio decoder: {e}"),
    })
}

// crates/tmedia-decode/src/mediadecoder.rs
//
// Demuxes a media file once and fans packets out to per-stream StreamDecoders,
// generalizing the teacher's LiveDecoder (which hardcoded a single video
// stream opened via a throwaway second ffmpeg::format::input) to a sparse
// map over both video and audio, per spec.md's MediaDecoder contract.

use std::collections::HashMap;
use std::path::Path;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec::context::Context as CodecContext;
use ffmpeg::format::context::Input;
use ffmpeg::media::Type as FfMediaType;
use ffmpeg::util::rational::Rational;

use tmedia_core::error::{Result, TmediaError};

use crate::streamdecoder::{open_audio_decoder, open_video_decoder, DecodedFrame, StreamDecoder};

/// How many packets to pull from the demuxer per next_frames() retry round
/// before giving up and reporting EOF/empty for this call.
const DEMUX_BATCH: usize = 10;

/// Which demuxed elementary stream a call targets. A thin, Hash+Eq-safe
/// stand-in for ffmpeg's own media::Type so the HashMap keys and public API
/// here don't lean on derives we can't see in the vendored crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn to_ffmpeg(self) -> FfMediaType {
        match self {
            StreamKind::Video => FfMediaType::Video,
            StreamKind::Audio => FfMediaType::Audio,
        }
    }
}

pub struct StreamInfo {
    pub index: usize,
    pub time_base: Rational,
}

/// Cached at open() time so callers (the video converter, the resampler)
/// never need to reach back into ffmpeg's stream/decoder objects directly.
#[derive(Debug, Clone, Copy)]
pub struct VideoParams {
    pub format: ffmpeg::format::Pixel,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct AudioParams {
    pub format: ffmpeg::format::Sample,
    pub sample_rate: u32,
    pub channel_layout: ffmpeg::util::channel_layout::ChannelLayout,
}

pub struct MediaDecoder {
    ictx: Input,
    streams: HashMap<StreamKind, StreamDecoder>,
    indices: HashMap<StreamKind, usize>,
    duration_secs: f64,
    video_params: Option<VideoParams>,
    audio_params: Option<AudioParams>,
}

impl MediaDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let ictx = ffmpeg::format::input(path).map_err(|e| TmediaError::ExternalLib {
            code: 0,
            message: format!("open {}: {e}", path.display()),
        })?;

        let duration_secs = ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;

        let mut streams = HashMap::new();
        let mut indices = HashMap::new();
        let mut video_params = None;
        let mut audio_params = None;

        if let Some(stream) = ictx.streams().best(FfMediaType::Video) {
            let index = stream.index();
            let time_base = stream.time_base();
            let ctx = CodecContext::from_parameters(stream.parameters()).map_err(|e| {
                TmediaError::ExternalLib { code: 0, message: format!("video codec ctx: {e}") }
            })?;
            let decoder = open_video_decoder(ctx)?;
            video_params = Some(VideoParams {
                format: decoder.format(),
                width: decoder.width(),
                height: decoder.height(),
            });
            streams.insert(StreamKind::Video, StreamDecoder::new_video(decoder, time_base));
            indices.insert(StreamKind::Video, index);
        }

        if let Some(stream) = ictx.streams().best(FfMediaType::Audio) {
            let index = stream.index();
            let time_base = stream.time_base();
            let ctx = CodecContext::from_parameters(stream.parameters()).map_err(|e| {
                TmediaError::ExternalLib { code: 0, message: format!("audio codec ctx: {e}") }
            })?;
            let decoder = open_audio_decoder(ctx)?;
            audio_params = Some(AudioParams {
                format: decoder.format(),
                sample_rate: decoder.rate(),
                channel_layout: decoder.ch_layout(),
            });
            streams.insert(StreamKind::Audio, StreamDecoder::new_audio(decoder, time_base));
            indices.insert(StreamKind::Audio, index);
        }

        Ok(Self { ictx, streams, indices, duration_secs, video_params, audio_params })
    }

    pub fn duration(&self) -> f64 {
        self.duration_secs
    }

    pub fn video_params(&self) -> Option<VideoParams> {
        self.video_params
    }

    pub fn audio_params(&self) -> Option<AudioParams> {
        self.audio_params
    }

    pub fn has_stream(&self, kind: StreamKind) -> bool {
        self.streams.contains_key(&kind)
    }

    pub fn stream_info(&self, kind: StreamKind) -> Option<StreamInfo> {
        let index = *self.indices.get(&kind)?;
        let time_base = self.streams.get(&kind)?.time_base();
        Some(StreamInfo { index, time_base })
    }

    /// Drains the target StreamDecoder; if empty, pulls batches of packets
    /// from the demuxer (routing each to the correct StreamDecoder's FIFO)
    /// and retries until either frames are produced or the demuxer hits EOF.
    /// Returns an empty vec on EOF — that is not an error condition.
    pub fn next_frames(&mut self, kind: StreamKind) -> Result<Vec<DecodedFrame>> {
        if !self.streams.contains_key(&kind) {
            return Ok(Vec::new());
        }

        loop {
            let frames = self
                .streams
                .get_mut(&kind)
                .expect("checked above")
                .decode_next()?;
            if !frames.is_empty() {
                return Ok(frames);
            }

            if !self.pump_packets(DEMUX_BATCH)? {
                // Demuxer is at EOF and produced nothing further for this stream.
                return Ok(Vec::new());
            }
        }
    }

    /// Pulls up to `n` packets from the demuxer, routing each to the
    /// StreamDecoder for its stream. Returns false at EOF.
    fn pump_packets(&mut self, n: usize) -> Result<bool> {
        let mut pulled = 0;
        let mut packet_iter = self.ictx.packets();
        while pulled < n {
            let Some((stream, packet)) = packet_iter.next() else {
                return Ok(false);
            };
            let idx = stream.index();
            for (&kind, &stream_index) in &self.indices {
                if stream_index == idx {
                    if let Some(sd) = self.streams.get_mut(&kind) {
                        sd.push_packet(packet.clone());
                    }
                    break;
                }
            }
            pulled += 1;
        }
        Ok(true)
    }

    /// Seeks the demuxer to `target` (seconds), resets every StreamDecoder,
    /// then for each stream discards frames until one at or past `target` is
    /// observed (or the stream runs dry). `target` must be within
    /// `[0, duration]`.
    pub fn jump_to_time(&mut self, target: f64) -> Result<()> {
        let seek_ts = (target * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
        self.ictx
            .seek(seek_ts, ..=seek_ts)
            .map_err(|e| TmediaError::ExternalLib { code: 0, message: format!("seek: {e}") })?;

        let kinds: Vec<StreamKind> = self.streams.keys().copied().collect();
        for &kind in &kinds {
            if let Some(sd) = self.streams.get_mut(&kind) {
                sd.reset();
            }
        }

        for kind in kinds {
            loop {
                let frames = self.next_frames(kind)?;
                if frames.is_empty() {
                    break; // ran dry before reaching target; demuxer undershot badly
                }
                let reached = frames
                    .iter()
                    .any(|f| frame_pts_secs(f, &self.streams, kind) >= target);
                if reached {
                    break;
                }
            }
        }

        Ok(())
    }
}

fn frame_pts_secs(
    frame: &DecodedFrame,
    streams: &HashMap<StreamKind, StreamDecoder>,
    kind: StreamKind,
) -> f64 {
    let Some(sd) = streams.get(&kind) else { return f64::MIN };
    let pts = match frame {
        DecodedFrame::Video(f) => f.pts(),
        DecodedFrame::Audio(f) => f.pts(),
    };
    pts.map(|p| sd.pts_to_secs(p)).unwrap_or(f64::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_kind_roundtrips_through_ffmpeg_type() {
        assert_eq!(StreamKind::Video.to_ffmpeg(), FfMediaType::Video);
        assert_eq!(StreamKind::Audio.to_ffmpeg(), FfMediaType::Audio);
    }
}

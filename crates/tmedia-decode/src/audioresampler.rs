// crates/tmedia-decode/src/audioresampler.rs
//
// Thin wrapper over ffmpeg_the_third's swr-backed resampling::Context, built
// lazily once the real input format is known (mono sources especially must
// be declared MONO or swr misreads the channel layout).

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Sample;
use ffmpeg::software::resampling::Context as SwrContext;
use ffmpeg::util::channel_layout::ChannelLayout;
use ffmpeg::util::frame::audio::Audio as AudioFrame;

use tmedia_core::error::{Result, TmediaError};

/// Target format this workspace standardizes on for every audio path:
/// planar f32 stereo. AudioOutput and the BlockingAudioRingBuffer both
/// assume interleaved-after-resample f32, so the resampler is the single
/// place format/channel/rate normalization happens.
pub const DST_FORMAT: Sample = Sample::F32(ffmpeg::format::sample::Type::Packed);
pub const DST_CHANNELS: u16 = 2;

pub struct AudioResampler {
    ctx: SwrContext,
    dst_rate: u32,
}

impl AudioResampler {
    pub fn new(
        src_format: Sample,
        src_layout: ChannelLayout,
        src_rate: u32,
        dst_rate: u32,
    ) -> Result<Self> {
        let src_layout = if src_layout.channels() >= 2 {
            src_layout
        } else {
            ChannelLayout::MONO
        };
        let ctx = SwrContext::get2(
            src_format,
            src_layout,
            src_rate,
            DST_FORMAT,
            ChannelLayout::STEREO,
            dst_rate,
        )
        .map_err(|e| TmediaError::ExternalLib {
            code: 0,
            message: format!("resampler init: {e}"),
        })?;
        Ok(Self { ctx, dst_rate })
    }

    pub fn dst_rate(&self) -> u32 {
        self.dst_rate
    }

    /// Resamples one input frame, returning the converted frame. May return
    /// an empty frame (`samples() == 0`) if swr is still buffering internally.
    pub fn convert(&mut self, src: &AudioFrame) -> Result<AudioFrame> {
        let mut dst = AudioFrame::empty();
        self.ctx.run(src, &mut dst).map_err(|e| TmediaError::ExternalLib {
            code: 0,
            message: format!("resample: {e}"),
        })?;
        Ok(dst)
    }

    /// True if the given frame's format/rate/channels already match this
    /// resampler's target, meaning resampling can be skipped entirely.
    pub fn needs_conversion(frame: &AudioFrame, dst_rate: u32) -> bool {
        frame.format() != DST_FORMAT
            || frame.rate() != dst_rate
            || frame.ch_layout().channels() != DST_CHANNELS as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_conversion_true_for_mismatched_rate() {
        let frame = AudioFrame::empty();
        assert!(AudioResampler::needs_conversion(&frame, 44100));
    }
}

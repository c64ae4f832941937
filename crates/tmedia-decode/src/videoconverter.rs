// crates/tmedia-decode/src/videoconverter.rs
//
// Thin wrapper over ffmpeg_the_third's SwsContext, generalized from the
// teacher's LiveDecoder/probe scaler setup. Output format is fixed at RGBA
// (destriped into tightly-packed rows) since that's what PixelData expects.

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;

use tmedia_core::error::{Result, TmediaError};
use tmedia_core::image::{PixelData, Rgb24};

pub struct VideoConverter {
    scaler: SwsContext,
    src_format: Pixel,
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
}

impl VideoConverter {
    pub fn new(src_format: Pixel, src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Result<Self> {
        let scaler = build_scaler(src_format, src_w, src_h, dst_w, dst_h)?;
        Ok(Self {
            scaler,
            src_format,
            src_w,
            src_h,
            dst_w,
            dst_h,
        })
    }

    pub fn dst_size(&self) -> (u32, u32) {
        (self.dst_w, self.dst_h)
    }

    /// Rebuilds the underlying SwsContext only if the requested size differs
    /// from the current one; a no-op otherwise.
    pub fn reset_dst_size(&mut self, dst_w: u32, dst_h: u32) -> Result<()> {
        if dst_w == self.dst_w && dst_h == self.dst_h {
            return Ok(());
        }
        self.scaler = build_scaler(self.src_format, self.src_w, self.src_h, dst_w, dst_h)?;
        self.dst_w = dst_w;
        self.dst_h = dst_h;
        Ok(())
    }

    pub fn convert(&mut self, src: &VideoFrame) -> Result<PixelData> {
        let mut out = VideoFrame::empty();
        self.scaler.run(src, &mut out).map_err(|e| TmediaError::ExternalLib {
            code: 0,
            message: format!("scale: {e}"),
        })?;

        let stride = out.stride(0);
        let raw = out.data(0);
        let mut pixels = Vec::with_capacity(self.dst_w as usize * self.dst_h as usize);
        for row in 0..self.dst_h as usize {
            let start = row * stride;
            let row_bytes = &raw[start..start + self.dst_w as usize * 4];
            for px in row_bytes.chunks_exact(4) {
                pixels.push(Rgb24::new(px[0], px[1], px[2]));
            }
        }
        Ok(PixelData::from_pixels(self.dst_w as usize, self.dst_h as usize, pixels))
    }
}

fn build_scaler(src_format: Pixel, src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Result<SwsContext> {
    SwsContext::get(
        src_format,
        src_w,
        src_h,
        Pixel::RGBA,
        dst_w.max(2),
        dst_h.max(2),
        Flags::BILINEAR,
    )
    .map_err(|e| TmediaError::ExternalLib {
        code: 0,
        message: format!("scaler init: {e}"),
    })
}

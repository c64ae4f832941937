// crates/tmedia-core/src/image/mod.rs

pub mod canvas;
pub mod color;
pub mod palette;
pub mod pixeldata;
pub mod quantize;

pub use canvas::Canvas;
pub use color::{color_distance_sq, get_char_from_rgb, get_rgb_from_char, glyph_index_from_luminance, Palette, Rgb24};
pub use palette::parse_palette_file;
pub use pixeldata::PixelData;
pub use quantize::quantize_to_palette;

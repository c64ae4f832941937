// crates/tmedia-core/src/util/mod.rs

pub mod format;
pub mod scale;

pub use format::{format_duration, is_h_mm_ss_duration, is_m_ss_duration, is_plain_seconds_duration, parse_duration};
pub use scale::{bound_dims, get_scale_factor, get_scale_size};

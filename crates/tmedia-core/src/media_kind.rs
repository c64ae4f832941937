// crates/tmedia-core/src/media_kind.rs

/// The probed kind of a media file. See `tmedia-decode::probe` for the
/// heuristic that derives this from stream layout and container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

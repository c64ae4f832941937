// crates/tmedia-player/src/lib.rs
//
// The playback coordinator. MediaFetcher is the single public type: it owns
// a MediaDecoder, a MediaClock, and the worker threads that keep decoding,
// scaling/resampling, and presenting frames in sync with the clock.

pub mod fetcher;

pub use fetcher::MediaFetcher;

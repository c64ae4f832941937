// crates/tmedia-cli/src/app.rs
//
// Process wiring: builds the playlist, probes each entry, and drives either
// the single-frame image path or a MediaFetcher session, translating
// Commands from the input handler into MediaFetcher/Playlist calls each
// tick. Generalizes the teacher's `run_app` event-loop shape (poll input,
// mutate state, redraw) to the spec's command vocabulary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tmedia_core::command::{Command, VideoOutputMode};
use tmedia_core::image::PixelData;
use tmedia_core::playlist::{LoopMode, MoveCmd, Playlist};
use tmedia_core::MediaKind;
use tmedia_decode::probe;
use tmedia_player::MediaFetcher;

use crate::cli::Args;
use crate::config::Config;
use crate::input::{crossterm_input::CrosstermInputHandler, InputHandler, PollResult};
use crate::render::{crossterm_renderer::CrosstermRenderer, RenderSnapshot, Renderer};

/// Target frame rate for the render/input tick while a file is playing.
/// Bounded by the renderer's terminal draw cost, not the media's own
/// frame rate — video pacing against the media clock happens inside
/// MediaFetcher.
const TICK: Duration = Duration::from_millis(33);

struct PlayerState {
    output_mode: VideoOutputMode,
    glyph_ramp: Vec<char>,
    volume: f32,
    muted: bool,
    fullscreen: bool,
}

enum Nav {
    Next,
    Prev,
    Quit,
}

pub fn run(args: Args) -> anyhow::Result<()> {
    ffmpeg_the_third::init().map_err(|e| anyhow::anyhow!("ffmpeg init failed: {e}"))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::load(args.config.as_deref());

    let mut playlist = build_playlist(&args.paths)?;
    if playlist.is_empty() {
        anyhow::bail!("no playable files found");
    }
    if let Some(loop_arg) = args.r#loop {
        playlist.set_loop_mode(loop_arg.into());
    }
    if args.shuffle {
        playlist.shuffle(false);
    }

    let mut state = PlayerState {
        output_mode: args.mode.map(Into::into).unwrap_or_else(|| config.inner.output_mode.into()),
        glyph_ramp: config.inner.glyph_ramp.chars().collect(),
        volume: args.volume.unwrap_or(config.inner.volume).clamp(0.0, 1.0),
        muted: args.muted,
        fullscreen: args.fullscreen,
    };
    if state.glyph_ramp.is_empty() {
        state.glyph_ramp = vec![' ', '@'];
    }

    let mut renderer = CrosstermRenderer::new()?;
    let mut input = CrosstermInputHandler::new();

    loop {
        let path = match playlist.current() {
            Some(p) => p.to_path_buf(),
            None => break,
        };

        let kind = probe::probe(&path).map(|info| info.media_kind).unwrap_or(MediaKind::Video);
        let nav = match kind {
            MediaKind::Image => play_image(&path, &mut state, &mut renderer, &mut input, &playlist)?,
            MediaKind::Video | MediaKind::Audio => {
                play_media(&path, &mut state, &mut renderer, &mut input, &mut playlist)?
            }
        };

        match nav {
            Nav::Quit => break,
            Nav::Next => {
                if playlist.can_move(MoveCmd::Skip) {
                    playlist.move_cursor(MoveCmd::Skip);
                } else {
                    break;
                }
            }
            Nav::Prev => playlist.move_cursor(MoveCmd::Rewind),
        }
    }

    Ok(())
}

fn build_playlist(paths: &[PathBuf]) -> anyhow::Result<Playlist> {
    let mut entries = Vec::new();
    for p in paths {
        if p.is_dir() {
            let dir_playlist = Playlist::from_dir(p, LoopMode::NoLoop, is_playable)?;
            entries.extend(dir_playlist.entries().iter().cloned());
        } else {
            entries.push(p.clone());
        }
    }
    Ok(Playlist::new(entries, LoopMode::NoLoop))
}

fn is_playable(path: &Path) -> bool {
    const EXTS: &[&str] = &[
        "mp4", "mkv", "webm", "avi", "mov", "flv", "mp3", "wav", "flac", "ogg", "m4a", "png", "jpg", "jpeg", "bmp",
        "gif", "webp",
    ];
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn snapshot_for(
    frame: PixelData,
    state: &PlayerState,
    path: &Path,
    playback_time: f64,
    duration: f64,
    is_playing: bool,
    playlist: &Playlist,
) -> RenderSnapshot {
    RenderSnapshot {
        frame,
        output_mode: state.output_mode,
        glyph_ramp: state.glyph_ramp.clone(),
        current_path: Some(path.to_path_buf()),
        playback_time,
        duration,
        is_playing,
        volume: state.volume,
        muted: state.muted,
        loop_mode: playlist.loop_mode(),
        shuffled: playlist.shuffled(),
        fullscreen: state.fullscreen,
        status: None,
    }
}

/// Applies a command affecting only shared player chrome (volume, mute,
/// output mode, fullscreen) or playlist/loop state. Returns `Some(nav)`
/// when the command should end this file's playback loop.
fn apply_common_command(cmd: &Command, state: &mut PlayerState, playlist: &mut Playlist) -> Option<Nav> {
    match cmd {
        Command::SetVideoOutputMode(mode) => state.output_mode = *mode,
        Command::ToggleFullscreen => state.fullscreen = !state.fullscreen,
        Command::SetVolume(v) => state.volume = v.clamp(0.0, 1.0),
        Command::VolumeOffset(delta) => state.volume = (state.volume + delta).clamp(0.0, 1.0),
        Command::Mute(m) => state.muted = *m,
        Command::ToggleShuffle => {
            if playlist.shuffled() {
                playlist.unshuffle();
            } else {
                playlist.shuffle(true);
            }
        }
        Command::SetLoopType(mode) => playlist.set_loop_mode(*mode),
        Command::Skip => return Some(Nav::Next),
        Command::Rewind => return Some(Nav::Prev),
        _ => {}
    }
    None
}

fn play_image(
    path: &Path,
    state: &mut PlayerState,
    renderer: &mut CrosstermRenderer,
    input: &mut CrosstermInputHandler,
    playlist: &Playlist,
) -> anyhow::Result<Nav> {
    use tmedia_decode::mediadecoder::{MediaDecoder, StreamKind};
    use tmedia_decode::{DecodedFrame, VideoConverter};

    let mut decoder = MediaDecoder::open(path)?;
    let (dst_w, dst_h) = renderer.render_box();
    let mut converter = match decoder.video_params() {
        Some(p) => VideoConverter::new(p.format, p.width, p.height, dst_w, dst_h)?,
        None => anyhow::bail!("{}: no video stream to display as an image", path.display()),
    };

    let frames = decoder.next_frames(StreamKind::Video)?;
    let pixels = match frames.into_iter().find_map(|f| match f {
        DecodedFrame::Video(v) => Some(v),
        _ => None,
    }) {
        Some(vframe) => converter.convert(&vframe)?,
        None => PixelData::new(dst_w as usize, dst_h as usize, Default::default()),
    };

    loop {
        let snapshot = snapshot_for(pixels.clone(), state, path, 0.0, 0.0, false, playlist);
        renderer.render(&snapshot)?;

        let PollResult { commands, quit } = input.process_input(&snapshot, TICK)?;
        if quit {
            return Ok(Nav::Quit);
        }
        for cmd in &commands {
            if let Some(nav) = apply_common_command(cmd, state, &mut Playlist::empty()) {
                // Image view has no mutable playlist of its own here;
                // Skip/Rewind simply end this file's loop with the
                // requested direction, and the caller's playlist drives it.
                return Ok(nav);
            }
            if let Command::Resize = cmd {
                let (w, h) = renderer.render_box();
                converter.reset_dst_size(w, h)?;
            }
        }
    }
}

fn play_media(
    path: &Path,
    state: &mut PlayerState,
    renderer: &mut CrosstermRenderer,
    input: &mut CrosstermInputHandler,
    playlist: &mut Playlist,
) -> anyhow::Result<Nav> {
    let (dst_w, dst_h) = renderer.render_box();
    let fetcher = Arc::new(MediaFetcher::open(path, dst_w, dst_h)?);
    fetcher.set_volume(state.volume);
    fetcher.set_muted(state.muted);
    fetcher.begin();

    let mut last_frame = PixelData::new(dst_w as usize, dst_h as usize, Default::default());
    let mut nav = Nav::Next;

    while fetcher.is_active() {
        if let Some(frame) = fetcher.take_frame_if_changed() {
            last_frame = frame;
        }

        let snapshot = snapshot_for(
            last_frame.clone(),
            state,
            path,
            fetcher.current_time(),
            fetcher.duration(),
            fetcher.is_playing(),
            playlist,
        );
        renderer.render(&snapshot)?;

        let PollResult { commands, quit } = input.process_input(&snapshot, TICK)?;
        if quit {
            nav = Nav::Quit;
            break;
        }

        let mut stop = false;
        for cmd in &commands {
            if let Some(n) = apply_common_command(cmd, state, playlist) {
                nav = n;
                stop = true;
                break;
            }
            match cmd {
                Command::Play => fetcher.resume(),
                Command::Pause => fetcher.pause(),
                Command::TogglePlayback => {
                    if fetcher.is_playing() {
                        fetcher.pause();
                    } else {
                        fetcher.resume();
                    }
                }
                Command::Seek(t) => fetcher.seek(*t),
                Command::SeekOffset(delta) => fetcher.seek(fetcher.current_time() + delta),
                Command::SetVolume(_) | Command::VolumeOffset(_) => fetcher.set_volume(state.volume),
                Command::Mute(m) => fetcher.set_muted(*m),
                Command::Resize => {
                    let (w, h) = renderer.render_box();
                    let _ = fetcher.resize_video(w, h);
                }
                _ => {}
            }
        }

        if stop {
            break;
        }
    }

    fetcher.pause();
    fetcher.dispatch_exit(None);

    // Worker threads each hold their own Arc clone (spawn_*_thread), so the
    // strong count only drops to 1 once they've all observed dispatch_exit
    // and returned. That happens within a couple of MAX_WAIT ticks.
    let mut fetcher = fetcher;
    for _ in 0..20 {
        match Arc::try_unwrap(fetcher) {
            Ok(f) => {
                if let Err(e) = Arc::new(f).join() {
                    log::warn!("{}: {e}", path.display());
                }
                return Ok(nav);
            }
            Err(arc) => {
                fetcher = arc;
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
    log::warn!("{}: worker threads outlived shutdown wait, abandoning join", path.display());

    Ok(nav)
}

// crates/tmedia-cli/src/input/crossterm_input.rs
//
// Translates crossterm key events into the closed Command set, grounded in
// JackDraak-Humr::terminal_ui's `handle_key_event` key-to-action match.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use tmedia_core::command::{Command, VideoOutputMode};
use tmedia_core::playlist::LoopMode;

use super::{InputHandler, PollResult};
use crate::render::RenderSnapshot;

const SEEK_STEP_SECS: f64 = 5.0;
const VOLUME_STEP: f32 = 0.05;

pub struct CrosstermInputHandler;

impl CrosstermInputHandler {
    pub fn new() -> Self {
        Self
    }

    fn next_loop_mode(current: LoopMode) -> LoopMode {
        match current {
            LoopMode::NoLoop => LoopMode::Repeat,
            LoopMode::Repeat => LoopMode::RepeatOne,
            LoopMode::RepeatOne => LoopMode::NoLoop,
        }
    }

    fn translate(key: KeyCode, snapshot: &RenderSnapshot) -> (Option<Command>, bool) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => (None, true),
            KeyCode::Char(' ') => (Some(Command::TogglePlayback), false),
            KeyCode::Char('n') | KeyCode::Right => (Some(Command::Skip), false),
            KeyCode::Char('p') | KeyCode::Left => (Some(Command::Rewind), false),
            KeyCode::Char('s') => (Some(Command::ToggleShuffle), false),
            KeyCode::Char('l') => {
                (Some(Command::SetLoopType(Self::next_loop_mode(snapshot.loop_mode))), false)
            }
            KeyCode::Char('m') => (Some(Command::Mute(!snapshot.muted)), false),
            KeyCode::Up => (Some(Command::VolumeOffset(VOLUME_STEP)), false),
            KeyCode::Down => (Some(Command::VolumeOffset(-VOLUME_STEP)), false),
            KeyCode::Char(']') => (Some(Command::SeekOffset(SEEK_STEP_SECS)), false),
            KeyCode::Char('[') => (Some(Command::SeekOffset(-SEEK_STEP_SECS)), false),
            KeyCode::Char('1') => (Some(Command::SetVideoOutputMode(VideoOutputMode::Plain)), false),
            KeyCode::Char('2') => (Some(Command::SetVideoOutputMode(VideoOutputMode::Bg)), false),
            KeyCode::Char('3') => (Some(Command::SetVideoOutputMode(VideoOutputMode::Color)), false),
            KeyCode::Char('f') => (Some(Command::ToggleFullscreen), false),
            KeyCode::Char('r') => (Some(Command::Refresh), false),
            _ => (None, false),
        }
    }
}

impl InputHandler for CrosstermInputHandler {
    fn process_input(&mut self, snapshot: &RenderSnapshot, timeout: Duration) -> anyhow::Result<PollResult> {
        let mut commands = Vec::new();
        let mut quit = false;

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let (command, wants_quit) = Self::translate(key.code, snapshot);
                    commands.extend(command);
                    quit = wants_quit;
                }
                Event::Resize(_, _) => commands.push(Command::Resize),
                _ => {}
            }
        }

        Ok(PollResult { commands, quit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmedia_core::image::PixelData;

    fn snapshot() -> RenderSnapshot {
        RenderSnapshot {
            frame: PixelData::new(1, 1, Default::default()),
            output_mode: VideoOutputMode::Color,
            glyph_ramp: vec![' ', '@'],
            current_path: None,
            playback_time: 0.0,
            duration: 0.0,
            is_playing: true,
            volume: 0.5,
            muted: false,
            loop_mode: LoopMode::NoLoop,
            shuffled: false,
            fullscreen: false,
            status: None,
        }
    }

    #[test]
    fn loop_mode_cycles_through_all_three() {
        assert_eq!(CrosstermInputHandler::next_loop_mode(LoopMode::NoLoop), LoopMode::Repeat);
        assert_eq!(CrosstermInputHandler::next_loop_mode(LoopMode::Repeat), LoopMode::RepeatOne);
        assert_eq!(CrosstermInputHandler::next_loop_mode(LoopMode::RepeatOne), LoopMode::NoLoop);
    }

    #[test]
    fn mute_key_toggles_based_on_current_state() {
        let snap = snapshot();
        let (cmd, quit) = CrosstermInputHandler::translate(KeyCode::Char('m'), &snap);
        assert_eq!(cmd, Some(Command::Mute(true)));
        assert!(!quit);
    }

    #[test]
    fn q_requests_quit_with_no_command() {
        let (cmd, quit) = CrosstermInputHandler::translate(KeyCode::Char('q'), &snapshot());
        assert_eq!(cmd, None);
        assert!(quit);
    }
}

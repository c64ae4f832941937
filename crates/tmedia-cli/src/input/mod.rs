// crates/tmedia-cli/src/input/mod.rs
//
// The input-handler shim boundary from spec.md §4.13/§6:
// `process_input(state, snapshot) -> Vec<Command>`. `RenderSnapshot` plays
// the role of both "state" and "snapshot" here since the CLI only ever
// needs the current render state to decide toggle-style commands (mute,
// play/pause). Quitting the process is not part of spec.md's closed
// Command set — it is a CLI process-lifecycle concern, so it is reported
// out of band via `PollResult::quit`.

pub mod crossterm_input;

use std::time::Duration;

use tmedia_core::command::Command;

use crate::render::RenderSnapshot;

pub struct PollResult {
    pub commands: Vec<Command>,
    pub quit: bool,
}

pub trait InputHandler {
    fn process_input(&mut self, snapshot: &RenderSnapshot, timeout: Duration) -> anyhow::Result<PollResult>;
}

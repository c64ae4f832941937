// crates/tmedia-cli/src/main.rs
//
// Process entry point: parse args, hand off to app::run, and map a fatal
// startup/runtime error to a non-zero exit code without a panic-driven
// backtrace dump (grounded in the teacher's `main.rs` thin-wrapper style).

mod app;
mod cli;
mod config;
mod input;
mod render;

use clap::Parser;

fn main() {
    let args = cli::Args::parse();

    if let Err(err) = app::run(args) {
        eprintln!("tmedia: {err:#}");
        std::process::exit(1);
    }
}

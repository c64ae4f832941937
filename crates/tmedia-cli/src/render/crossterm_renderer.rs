// crates/tmedia-cli/src/render/crossterm_renderer.rs
//
// Concrete terminal backend: a ratatui Terminal<CrosstermBackend> driving
// raw-mode/alternate-screen lifecycle (grounded in
// JackDraak-Humr::terminal_ui's run_terminal_ui/run_app split), drawing the
// PixelData grid cell-by-cell per the three video output modes from
// spec.md §6.

use std::io::{self, Stdout};

use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use tmedia_core::command::VideoOutputMode;
use tmedia_core::image::{color_distance_sq, get_char_from_rgb, Palette, Rgb24};
use tmedia_core::util::format_duration;

use super::{RenderSnapshot, Renderer};

/// A fixed 16-color approximation of the standard ANSI palette. Real
/// terminals vary their exact RGB values per theme, but a stable palette is
/// what the nearest-color snapping in Bg/Color mode needs to be
/// deterministic and testable (see spec.md §4.11's weighted distance).
const ANSI16: [(Rgb24, Color); 16] = [
    (Rgb24::new(0, 0, 0), Color::Black),
    (Rgb24::new(128, 0, 0), Color::Red),
    (Rgb24::new(0, 128, 0), Color::Green),
    (Rgb24::new(128, 128, 0), Color::Yellow),
    (Rgb24::new(0, 0, 128), Color::Blue),
    (Rgb24::new(128, 0, 128), Color::Magenta),
    (Rgb24::new(0, 128, 128), Color::Cyan),
    (Rgb24::new(192, 192, 192), Color::Gray),
    (Rgb24::new(128, 128, 128), Color::DarkGray),
    (Rgb24::new(255, 0, 0), Color::LightRed),
    (Rgb24::new(0, 255, 0), Color::LightGreen),
    (Rgb24::new(255, 255, 0), Color::LightYellow),
    (Rgb24::new(0, 0, 255), Color::LightBlue),
    (Rgb24::new(255, 0, 255), Color::LightMagenta),
    (Rgb24::new(0, 255, 255), Color::LightCyan),
    (Rgb24::new(255, 255, 255), Color::White),
];

fn ansi_palette() -> Palette {
    Palette::new(ANSI16.iter().map(|(rgb, _)| *rgb).collect())
}

fn nearest_ansi_color(palette: &Palette, rgb: Rgb24) -> Color {
    match palette.find_closest_color_index(rgb) {
        Ok(idx) => ANSI16[idx].1,
        Err(_) => Color::White,
    }
}

pub struct CrosstermRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    palette: Palette,
}

impl CrosstermRenderer {
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal, palette: ansi_palette() })
    }

    fn status_line(snapshot: &RenderSnapshot) -> Line<'static> {
        let name = snapshot
            .current_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "-".to_string());
        let time = format!(
            "{}/{}",
            format_duration(snapshot.playback_time),
            format_duration(snapshot.duration)
        );
        let play_state = if snapshot.is_playing { "|>" } else { "||" };
        let mute = if snapshot.muted { " muted" } else { "" };
        let loop_tag = match snapshot.loop_mode {
            tmedia_core::playlist::LoopMode::NoLoop => "",
            tmedia_core::playlist::LoopMode::Repeat => " loop",
            tmedia_core::playlist::LoopMode::RepeatOne => " loop1",
        };
        let shuffle_tag = if snapshot.shuffled { " shuffle" } else { "" };
        let text = format!(
            "{play_state} {name}  {time}  vol {:.0}%{mute}{loop_tag}{shuffle_tag}",
            snapshot.volume * 100.0
        );
        Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
    }

}

/// Returns the style/char a single pixel renders as under the active output
/// mode, so a row can be built by grouping consecutive pixels that share one.
fn cell_style(snapshot: &RenderSnapshot, palette: &Palette, rgb: Rgb24) -> (char, Style) {
    match snapshot.output_mode {
        VideoOutputMode::Plain => {
            let ch = get_char_from_rgb(&snapshot.glyph_ramp, rgb);
            (ch, Style::default().fg(Color::White).bg(Color::Black))
        }
        VideoOutputMode::Bg => (' ', Style::default().bg(nearest_ansi_color(palette, rgb))),
        VideoOutputMode::Color => {
            let ch = get_char_from_rgb(&snapshot.glyph_ramp, rgb);
            (ch, Style::default().fg(nearest_ansi_color(palette, rgb)).bg(Color::Black))
        }
    }
}

/// Builds the PixelData grid as a `Text` of one `Line` per pixel row, run-
/// length-encoding consecutive same-style pixels into a single `Span` so a
/// wide frame doesn't produce one span per column. Rendered through a
/// `Paragraph`, like the rest of the retrieval pack's ratatui usage, rather
/// than poking cells into the frame buffer directly.
fn pixel_grid_text<'a>(area: Rect, snapshot: &'a RenderSnapshot, palette: &Palette) -> Text<'a> {
    let frame = &snapshot.frame;
    let rows = (frame.height() as u16).min(area.height);
    let cols = (frame.width() as u16).min(area.width);

    let mut lines = Vec::with_capacity(rows as usize);
    for row in 0..rows {
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style = Style::default();

        for col in 0..cols {
            let rgb = frame.get(row as usize, col as usize);
            let (ch, style) = cell_style(snapshot, palette, rgb);
            if !run.is_empty() && style != run_style {
                spans.push(Span::styled(std::mem::take(&mut run), run_style));
            }
            run_style = style;
            run.push(ch);
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, run_style));
        }
        lines.push(Line::from(spans));
    }
    Text::from(lines)
}

impl Renderer for CrosstermRenderer {
    fn render(&mut self, snapshot: &RenderSnapshot) -> anyhow::Result<()> {
        let size = self.terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        let palette = self.palette.clone();

        let chunks: Vec<Rect> = if snapshot.fullscreen {
            vec![area]
        } else {
            Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(1)])
                .split(area)
                .to_vec()
        };

        let grid = pixel_grid_text(chunks[0], snapshot, &palette);

        self.terminal.draw(|f| {
            f.render_widget(Paragraph::new(grid), chunks[0]);
            if !snapshot.fullscreen {
                f.render_widget(Paragraph::new(Self::status_line(snapshot)), chunks[1]);
            }
        })?;

        Ok(())
    }

    fn render_box(&self) -> (u32, u32) {
        match self.terminal.size() {
            Ok(size) => (size.width as u32, (size.height.saturating_sub(1)) as u32),
            Err(_) => (80, 24),
        }
    }
}

impl Drop for CrosstermRenderer {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_ansi_color_matches_exact_primaries() {
        let palette = ansi_palette();
        assert_eq!(nearest_ansi_color(&palette, Rgb24::new(0, 255, 0)), Color::LightGreen);
        assert_eq!(nearest_ansi_color(&palette, Rgb24::new(0, 0, 0)), Color::Black);
    }

    #[test]
    fn ansi_palette_has_sixteen_distinct_entries() {
        let palette = ansi_palette();
        assert_eq!(palette.len(), 16);
    }

    #[test]
    fn redmean_distance_is_symmetric() {
        let a = Rgb24::new(10, 200, 30);
        let b = Rgb24::new(250, 5, 90);
        assert_eq!(color_distance_sq(a, b), color_distance_sq(b, a));
    }
}

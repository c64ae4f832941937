// crates/tmedia-core/src/image/palette.rs
//
// Textual palette file parsing, supplemented from the original tmedia's
// includes/termcolor.h palette-file support. First line must equal the
// header token exactly; each following data line is `r g b` (whitespace
// separated decimal integers); lines starting with `#` are comments.

use super::color::{Palette, Rgb24};
use crate::error::{Result, TmediaError};

pub const PALETTE_HEADER_TOKEN: &str = "TMEDIA_PALETTE";

pub fn parse_palette_file(contents: &str) -> Result<Palette> {
    let mut lines = contents.lines();
    let header = lines.next().unwrap_or("").trim();
    if header != PALETTE_HEADER_TOKEN {
        return Err(TmediaError::InvalidArgument(format!(
            "expected palette header '{PALETTE_HEADER_TOKEN}', got '{header}'"
        )));
    }

    let mut colors = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(TmediaError::InvalidArgument(format!("malformed palette line: '{line}'")));
        }
        let parse_channel = |s: &str| -> Result<u8> {
            s.parse::<u16>()
                .ok()
                .filter(|v| *v <= 255)
                .map(|v| v as u8)
                .ok_or_else(|| TmediaError::InvalidArgument(format!("invalid color channel '{s}'")))
        };
        let r = parse_channel(parts[0])?;
        let g = parse_channel(parts[1])?;
        let b = parse_channel(parts[2])?;
        colors.push(Rgb24::new(r, g, b));
    }

    Ok(Palette::new(colors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s6_palette_parse() {
        let input = "TMEDIA_PALETTE\n254 91 89\n247 165 71\n";
        let palette = parse_palette_file(input).unwrap();
        assert_eq!(palette.colors(), &[Rgb24::new(254, 91, 89), Rgb24::new(247, 165, 71)]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let input = "TMEDIA_PALETTE\n# a comment\n\n10 20 30\n";
        let palette = parse_palette_file(input).unwrap();
        assert_eq!(palette.colors(), &[Rgb24::new(10, 20, 30)]);
    }

    #[test]
    fn wrong_header_is_rejected() {
        let input = "NOT_A_PALETTE\n1 2 3\n";
        assert!(parse_palette_file(input).is_err());
    }
}

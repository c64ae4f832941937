// crates/tmedia-core/src/image/canvas.rs
//
// A mutable drawing surface over PixelData. Line drawing uses Bresenham's
// algorithm (the same family the original tmedia's drawing.cpp uses for
// its progress-bar and volume-meter chrome), implemented from scratch
// rather than ported line-by-line.

use super::color::Rgb24;
use super::pixeldata::PixelData;

pub struct Canvas {
    image: PixelData,
}

impl Canvas {
    pub fn new(width: usize, height: usize, fill: Rgb24) -> Self {
        Self { image: PixelData::new(width, height, fill) }
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn get_image(&self) -> PixelData {
        self.image.clone()
    }

    fn in_bounds(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height() && (col as usize) < self.width()
    }

    fn plot(&mut self, row: isize, col: isize, color: Rgb24) {
        if self.in_bounds(row, col) {
            self.image.set(row as usize, col as usize, color);
        }
    }

    /// Draws a line between `(r1, c1)` and `(r2, c2)` via Bresenham's
    /// integer-only algorithm, clipping silently at the canvas edges.
    pub fn line(&mut self, r1: isize, c1: isize, r2: isize, c2: isize, color: Rgb24) {
        let dr = (r2 - r1).abs();
        let dc = (c2 - c1).abs();
        let sr = if r1 < r2 { 1 } else { -1 };
        let sc = if c1 < c2 { 1 } else { -1 };
        let mut err = dc - dr;
        let (mut r, mut c) = (r1, c1);

        loop {
            self.plot(r, c, color);
            if r == r2 && c == c2 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dr {
                err -= dr;
                c += sc;
            }
            if e2 < dc {
                err += dc;
                r += sr;
            }
        }
    }

    pub fn vertline(&mut self, col: isize, r1: isize, r2: isize, color: Rgb24) {
        self.line(r1, col, r2, col, color);
    }

    pub fn horzline(&mut self, row: isize, c1: isize, c2: isize, color: Rgb24) {
        self.line(row, c1, row, c2, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_fills_row() {
        let mut canvas = Canvas::new(5, 5, Rgb24::BLACK);
        canvas.horzline(2, 0, 4, Rgb24::WHITE);
        let img = canvas.get_image();
        for col in 0..5 {
            assert_eq!(img.get(2, col), Rgb24::WHITE);
        }
    }

    #[test]
    fn vertical_line_fills_column() {
        let mut canvas = Canvas::new(5, 5, Rgb24::BLACK);
        canvas.vertline(1, 0, 4, Rgb24::WHITE);
        let img = canvas.get_image();
        for row in 0..5 {
            assert_eq!(img.get(row, 1), Rgb24::WHITE);
        }
    }

    #[test]
    fn out_of_bounds_points_are_clipped_not_panicking() {
        let mut canvas = Canvas::new(3, 3, Rgb24::BLACK);
        canvas.line(-5, -5, 10, 10, Rgb24::WHITE);
        // No panic; at least the in-bounds diagonal got drawn.
        assert_eq!(canvas.get_image().get(1, 1), Rgb24::WHITE);
    }
}

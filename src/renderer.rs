// src/renderer.rs

use crate::color::{color_for_bin, Rgba};
use crate::heatmap::line_label;
use crate::model::{Bin, CountVector, MAX_BINS};
use crate::scale::BinAssignment;
use image::{Rgb, RgbImage};
use std::io::{self, Write};
use std::path::Path;

const BG_COLOR: [u8; 3] = [8, 8, 12];

/// One resolved style per bin, built once and reused for every line in it.
/// Must be rebuilt if `MAX_BINS` or the color mapping ever changes.
#[derive(Debug, Clone)]
pub struct BinStyles {
    colors: Vec<Rgba>,
}

impl Default for BinStyles {
    fn default() -> Self {
        Self::new(MAX_BINS)
    }
}

impl BinStyles {
    pub fn new(max_bins: Bin) -> Self {
        Self {
            colors: (0..=max_bins).map(|bin| color_for_bin(bin, max_bins)).collect(),
        }
    }

    pub fn color(&self, bin: Bin) -> Rgba {
        let idx = usize::from(bin).min(self.colors.len() - 1);
        self.colors[idx]
    }

    /// Opaque pixel for a bin over the dark background
    pub fn pixel(&self, bin: Bin) -> Rgb<u8> {
        Rgb(self.color(bin).over(BG_COLOR))
    }
}

/// What the terminal renderer should draw
#[derive(Debug, Clone, Copy)]
pub struct TerminalOptions {
    pub color: bool,
    /// 1-based line that gets the inline change label
    pub selected_line: Option<usize>,
}

/// Print `lines` with heat backgrounds and an inline label on the selected line.
pub fn render_terminal<W: Write>(
    out: &mut W,
    lines: &[&str],
    counts: &CountVector,
    assignment: &BinAssignment,
    styles: &BinStyles,
    options: TerminalOptions,
) -> io::Result<()> {
    let width = lines.len().to_string().len();
    for (line0, text) in lines.iter().enumerate() {
        let number = format!("{:>width$} ", line0 + 1);
        match assignment.bin_of(line0).filter(|_| options.color) {
            Some(bin) => {
                let [r, g, b] = styles.color(bin).over(BG_COLOR);
                write!(out, "{number}\x1b[48;2;{r};{g};{b}m{text}\x1b[0m")?;
            }
            None => write!(out, "{number}{text}")?,
        }
        if options.selected_line == Some(line0 + 1) {
            write!(out, " \x1b[2;3m{}\x1b[0m", line_label(counts, line0 + 1))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Draw a heat strip, one `row_height` band per line, and save it as an image.
///
/// Bands are filled bin by bin, so each bin's color is resolved only once.
pub fn render_png(
    path: &Path,
    assignment: &BinAssignment,
    styles: &BinStyles,
    width: u32,
    row_height: u32,
) -> image::ImageResult<()> {
    let rows = assignment.len().max(1) as u32;
    let mut image = RgbImage::from_pixel(width.max(1), rows * row_height.max(1), Rgb(BG_COLOR));

    for (bin, lines) in assignment.groups() {
        let pixel = styles.pixel(bin);
        for &line0 in lines {
            let top = line0 as u32 * row_height;
            for y in top..top + row_height {
                for x in 0..image.width() {
                    image.put_pixel(x, y, pixel);
                }
            }
        }
    }

    image.save(path)
}

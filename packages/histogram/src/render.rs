//! PNG rendering of histograms.
//!
//! Bars are drawn in light gray on white. An optional overlay marks the
//! mean (solid dark red), one standard deviation (dashed dark blue), and
//! two standard deviations (dashed dark green).

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::{Histogram, HistogramError};

/// Default image width in pixels.
pub const WIDTH: u32 = 1200;
/// Default image height in pixels.
pub const HEIGHT: u32 = 800;
/// Blank space around the plot area.
pub const MARGIN: u32 = 30;

const DASH: f32 = 8.0;
const GAP: f32 = 6.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub(crate) const LIGHT_GRAY: Rgb<u8> = Rgb([211, 211, 211]);
pub(crate) const DARK_RED: Rgb<u8> = Rgb([139, 0, 0]);
pub(crate) const DARK_BLUE: Rgb<u8> = Rgb([0, 0, 139]);
pub(crate) const DARK_GREEN: Rgb<u8> = Rgb([0, 100, 0]);

/// Mean and standard deviation lines drawn over a histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatOverlay {
    /// Mean of the plotted values.
    pub mean: f64,
    /// Population standard deviation of the plotted values.
    pub std_dev: f64,
}

/// Pixel geometry of the plot area.
struct PlotArea {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    min: f64,
    max: f64,
}

impl PlotArea {
    #[allow(clippy::cast_precision_loss)]
    fn new(hist: &Histogram, width: u32, height: u32) -> Self {
        Self {
            left: MARGIN as f32,
            top: MARGIN as f32,
            width: width.saturating_sub(2 * MARGIN) as f32,
            height: height.saturating_sub(2 * MARGIN) as f32,
            min: hist.min,
            max: hist.max,
        }
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }

    #[allow(clippy::cast_possible_truncation)]
    fn x(&self, value: f64) -> f32 {
        self.left + ((value - self.min) / (self.max - self.min)) as f32 * self.width
    }
}

fn draw_bars(img: &mut RgbImage, hist: &Histogram, area: &PlotArea) {
    let max_count = hist.max_count();
    if max_count == 0 {
        return;
    }

    let bin_width = hist.bin_width();
    for (i, count) in hist.counts.iter().enumerate().filter(|(_, c)| **c > 0) {
        #[allow(clippy::cast_precision_loss)]
        let (x0, x1) = (
            area.x(hist.min + i as f64 * bin_width),
            area.x(hist.min + (i + 1) as f64 * bin_width),
        );
        #[allow(clippy::cast_precision_loss)]
        let bar_height = (*count as f32 / max_count as f32 * area.height).round();
        if bar_height < 1.0 {
            continue;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rect = Rect::at(x0.floor() as i32, (area.bottom() - bar_height) as i32)
            .of_size(((x1 - x0).ceil() as u32).max(1), bar_height as u32);
        draw_filled_rect_mut(img, rect, LIGHT_GRAY);
    }
}

fn draw_vertical(img: &mut RgbImage, x: f32, area: &PlotArea, color: Rgb<u8>, dashed: bool) {
    if !dashed {
        draw_line_segment_mut(img, (x, area.top), (x, area.bottom()), color);
        return;
    }

    let mut y = area.top;
    while y < area.bottom() {
        let end = (y + DASH).min(area.bottom());
        draw_line_segment_mut(img, (x, y), (x, end), color);
        y += DASH + GAP;
    }
}

fn draw_overlay(img: &mut RgbImage, overlay: StatOverlay, area: &PlotArea) {
    let StatOverlay { mean, std_dev } = overlay;
    let lines = [
        (mean - 2.0 * std_dev, DARK_GREEN, true),
        (mean + 2.0 * std_dev, DARK_GREEN, true),
        (mean - std_dev, DARK_BLUE, true),
        (mean + std_dev, DARK_BLUE, true),
        (mean, DARK_RED, false),
    ];

    for (value, color, dashed) in lines {
        if (area.min..=area.max).contains(&value) {
            draw_vertical(img, area.x(value), area, color, dashed);
        }
    }
}

/// Draws a histogram into a new image.
#[must_use]
pub fn render(
    hist: &Histogram,
    overlay: Option<StatOverlay>,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    let area = PlotArea::new(hist, width, height);

    draw_bars(&mut img, hist, &area);
    if let Some(overlay) = overlay {
        draw_overlay(&mut img, overlay, &area);
    }

    // Axes
    draw_line_segment_mut(
        &mut img,
        (area.left, area.bottom()),
        (area.left + area.width, area.bottom()),
        BLACK,
    );
    draw_line_segment_mut(
        &mut img,
        (area.left, area.top),
        (area.left, area.bottom()),
        BLACK,
    );

    img
}

/// Renders a histogram and saves it as PNG, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image
/// cannot be written.
pub fn render_png(
    path: &Path,
    hist: &Histogram,
    overlay: Option<StatOverlay>,
) -> Result<(), HistogramError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    render(hist, overlay, WIDTH, HEIGHT).save(path)?;
    log::info!("Histogram saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains_color(img: &RgbImage, color: Rgb<u8>) -> bool {
        img.pixels().any(|p| *p == color)
    }

    #[test]
    fn single_bin_fills_plot_area() {
        let hist = Histogram::compute(&[1.0, 2.0, 3.0], (0.0, 10.0), 1).unwrap();
        let img = render(&hist, None, 220, 160);

        assert_eq!(img.dimensions(), (220, 160));
        // Plot area spans x 30..190, y 30..130.
        assert_eq!(*img.get_pixel(100, 120), LIGHT_GRAY);
        assert_eq!(*img.get_pixel(100, 35), LIGHT_GRAY);
        assert_eq!(*img.get_pixel(5, 5), WHITE);
        assert_eq!(*img.get_pixel(200, 120), WHITE);
    }

    #[test]
    fn empty_histogram_draws_only_axes() {
        let hist = Histogram::compute(&[], (0.0, 1.0), 5).unwrap();
        let img = render(&hist, None, 220, 160);
        assert!(!contains_color(&img, LIGHT_GRAY));
        assert!(contains_color(&img, BLACK));
    }

    #[test]
    fn overlay_draws_stat_lines() {
        let hist = Histogram::compute(&[4.0, 5.0, 6.0], (0.0, 10.0), 10).unwrap();
        let overlay = StatOverlay {
            mean: 5.0,
            std_dev: 1.5,
        };
        let img = render(&hist, Some(overlay), 220, 160);

        assert!(contains_color(&img, DARK_RED));
        assert!(contains_color(&img, DARK_BLUE));
        assert!(contains_color(&img, DARK_GREEN));
    }

    #[test]
    fn out_of_range_lines_are_skipped() {
        let hist = Histogram::compute(&[5.0], (0.0, 10.0), 10).unwrap();
        let overlay = StatOverlay {
            mean: 5.0,
            std_dev: 20.0,
        };
        let img = render(&hist, Some(overlay), 220, 160);

        assert!(contains_color(&img, DARK_RED));
        assert!(!contains_color(&img, DARK_BLUE));
        assert!(!contains_color(&img, DARK_GREEN));
    }

    #[test]
    fn saves_png() {
        let hist = Histogram::compute(&[1.0, 1.5, 2.0], (0.0, 3.0), 3).unwrap();
        let dir = std::env::temp_dir().join("eclipse_map_test_render_png");
        let path = dir.join("hist.png");

        render_png(&path, &hist, None).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), WIDTH);
        assert_eq!(img.height(), HEIGHT);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{ImageFormat, Rgb, RgbImage};

use crate::error::{Error, Result};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 480;

pub const TITLE: &str = "Loss Curve";
pub const X_LABEL: &str = "Iterations";
pub const Y_LABEL: &str = "Loss";
pub const LEGEND: &str = "training loss";

const PAD_L: f64 = 130.0;
const PAD_R: f64 = 24.0;
const PAD_T: f64 = 48.0;
const PAD_B: f64 = 68.0;
const GRID_LINES: u32 = 4;
const TICK_LEN: i64 = 6;

/// Glyphs are 8×8 cells drawn at this many pixels per cell.
const TEXT_SCALE: i64 = 2;
const GLYPH: i64 = 8 * TEXT_SCALE;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([232, 235, 240]);
pub const AXIS: Rgb<u8> = Rgb([90, 90, 90]);
pub const TEXT: Rgb<u8> = Rgb([40, 40, 40]);
pub const CURVE: Rgb<u8> = Rgb([220, 38, 38]);

/// Draws the per-epoch loss as a titled line chart: grid, axes with tick
/// values, axis labels and a legend.
///
/// x runs over epochs (1-based ticks at the first, middle and last epoch),
/// y from 0 to 5% above the largest loss.
pub fn render_loss_curve(losses: &[f64]) -> Result<RgbImage> {
    if losses.is_empty() {
        return Err(Error::Visualization("loss curve is empty".into()));
    }
    if let Some(i) = losses.iter().position(|l| !l.is_finite()) {
        return Err(Error::Visualization(format!("loss at epoch {} is not finite", i + 1)));
    }

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    let (w, h) = (WIDTH as f64, HEIGHT as f64);
    let max_y = losses.iter().cloned().fold(0.0f64, f64::max).max(1e-12) * 1.05;
    let n = losses.len();

    let px = |i: usize, v: f64| -> (i64, i64) {
        let frac = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
        let x = PAD_L + frac * (w - PAD_L - PAD_R);
        let y = PAD_T + (max_y - v) / max_y * (h - PAD_T - PAD_B);
        (x.round() as i64, y.round() as i64)
    };

    let (left, right) = (PAD_L as i64, (w - PAD_R) as i64);
    let (top, bottom) = (PAD_T as i64, (h - PAD_B) as i64);

    // Grid and y ticks, bottom (0) to top (max_y).
    for g in 0..=GRID_LINES {
        let y = bottom - (bottom - top) * g as i64 / GRID_LINES as i64;
        if g > 0 {
            draw_line(&mut img, (left, y), (right, y), GRID);
        }
        draw_line(&mut img, (left - TICK_LEN, y), (left, y), AXIS);
        let label = format!("{:.3}", max_y * g as f64 / GRID_LINES as f64);
        draw_text(&mut img, left - TICK_LEN - 4 - text_width(&label), y - GLYPH / 2, &label, TEXT);
    }

    // x ticks.
    let mut x_ticks = vec![0, (n - 1) / 2, n - 1];
    x_ticks.dedup();
    for i in x_ticks {
        let (x, _) = px(i, 0.0);
        draw_line(&mut img, (x, bottom), (x, bottom + TICK_LEN), AXIS);
        let label = (i + 1).to_string();
        draw_text(&mut img, x - text_width(&label) / 2, bottom + TICK_LEN + 4, &label, TEXT);
    }

    draw_line(&mut img, (left, top), (left, bottom), AXIS);
    draw_line(&mut img, (left, bottom), (right, bottom), AXIS);

    // Title and axis labels.
    let centre_x = (left + right) / 2;
    draw_text(&mut img, centre_x - text_width(TITLE) / 2, (top - GLYPH) / 2, TITLE, TEXT);
    draw_text(&mut img, centre_x - text_width(X_LABEL) / 2, bottom + TICK_LEN + GLYPH + 14, X_LABEL, TEXT);
    draw_text_vertical(&mut img, 12, (top + bottom) / 2 + text_width(Y_LABEL) / 2, Y_LABEL, TEXT);

    if n == 1 {
        let (x, y) = px(0, losses[0]);
        for dx in -2..=2 {
            for dy in -2..=2 {
                plot(&mut img, x + dx, y + dy, CURVE);
            }
        }
    }
    for (i, pair) in losses.windows(2).enumerate() {
        let a = px(i, pair[0]);
        let b = px(i + 1, pair[1]);
        // Two pixels thick.
        draw_line(&mut img, a, b, CURVE);
        draw_line(&mut img, (a.0, a.1 + 1), (b.0, b.1 + 1), CURVE);
    }

    // Legend, top right of the plot area.
    let legend_x = right - 12 - text_width(LEGEND) - 30;
    let legend_y = top + 10;
    for dy in 0..2 {
        draw_line(&mut img, (legend_x, legend_y + GLYPH / 2 + dy), (legend_x + 22, legend_y + GLYPH / 2 + dy), CURVE);
    }
    draw_text(&mut img, legend_x + 30, legend_y, LEGEND, TEXT);

    Ok(img)
}

/// Renders `losses` and writes them to `path` as PNG, creating parent
/// directories as needed.
pub fn save_loss_curve<P: AsRef<Path>>(losses: &[f64], path: P) -> Result<()> {
    let path = path.as_ref();
    let img = render_loss_curve(losses)?;
    let fail = |reason: String| Error::Visualization(format!("{}: {}", path.display(), reason));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }
    img.save_with_format(path, ImageFormat::Png).map_err(|e| fail(e.to_string()))
}

fn plot(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn text_width(text: &str) -> i64 {
    text.chars().count() as i64 * GLYPH
}

/// Draws `text` left to right with its top-left corner at `(x, y)`.
fn draw_text(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let origin = x + i as i64 * GLYPH;
        draw_glyph(img, c, |gx, gy| (origin + gx, y + gy), color);
    }
}

/// Draws `text` bottom to top (rotated 90° counter-clockwise) with its
/// baseline start at `(x, y)`.
fn draw_text_vertical(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let origin = y - i as i64 * GLYPH;
        draw_glyph(img, c, |gx, gy| (x + gy, origin - gx), color);
    }
}

/// Plots one scaled glyph; `place` maps glyph-space pixels to the image.
fn draw_glyph<F>(img: &mut RgbImage, c: char, place: F, color: Rgb<u8>)
where
    F: Fn(i64, i64) -> (i64, i64),
{
    let Some(rows) = BASIC_FONTS.get(c) else { return };
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..8 {
            // Bit 0 is the leftmost pixel.
            if bits & (1 << col) == 0 {
                continue;
            }
            for sy in 0..TEXT_SCALE {
                for sx in 0..TEXT_SCALE {
                    let (x, y) = place(col * TEXT_SCALE + sx, row as i64 * TEXT_SCALE + sy);
                    plot(img, x, y, color);
                }
            }
        }
    }
}

/// Bresenham.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(img, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve_pixels(img: &RgbImage) -> usize {
        img.pixels().filter(|p| **p == CURVE).count()
    }

    fn count_in(img: &RgbImage, color: Rgb<u8>, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| *img.get_pixel(x, y) == color)
            .count()
    }

    #[test]
    fn draws_the_curve_inside_the_plot_area() {
        let img = render_loss_curve(&[0.7, 0.5, 0.4, 0.35, 0.33]).unwrap();
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        assert!(curve_pixels(&img) > 100);
        // First point sits on the left axis.
        let x0 = PAD_L as u32;
        assert!((0..HEIGHT).any(|y| *img.get_pixel(x0, y) == CURVE));
        assert_eq!(*img.get_pixel(2, 2), BACKGROUND);
    }

    #[test]
    fn title_labels_and_ticks_are_drawn() {
        let img = render_loss_curve(&[0.7, 0.5, 0.4, 0.35, 0.33]).unwrap();
        let (left, top) = (PAD_L as u32, PAD_T as u32);
        let bottom = HEIGHT - PAD_B as u32;

        // Title band above the plot.
        assert!(count_in(&img, TEXT, 0..WIDTH, 0..top) > 50);
        // y tick values and the rotated "Loss" label left of the axis.
        assert!(count_in(&img, TEXT, 0..left - TICK_LEN as u32, 0..HEIGHT) > 200);
        assert!(count_in(&img, TEXT, 0..40, top..bottom) > 20);
        // x tick values and "Iterations" below the axis.
        assert!(count_in(&img, TEXT, left..WIDTH, bottom + 1..HEIGHT) > 100);
        // Tick marks on both axes.
        assert_eq!(*img.get_pixel(left - 3, bottom), AXIS);
        assert_eq!(*img.get_pixel(left, bottom + 3), AXIS);
        // Legend swatch and text inside the plot, top right.
        let right = WIDTH - PAD_R as u32;
        assert!(count_in(&img, TEXT, right - 250..right, top..top + 40) > 20);
        assert!(count_in(&img, CURVE, right - 250..right, top..top + 40) >= 22);
    }

    #[test]
    fn glyphs_follow_the_bitmap_font() {
        let mut img = RgbImage::from_pixel(16, 16, BACKGROUND);
        draw_text(&mut img, 0, 0, "1", TEXT);
        let rows = BASIC_FONTS.get('1').unwrap();
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..8u32 {
                let lit = bits & (1 << col) != 0;
                let px = *img.get_pixel(col * 2, row as u32 * 2);
                assert_eq!(px == TEXT, lit, "row {} col {}", row, col);
            }
        }
    }

    #[test]
    fn single_epoch_is_still_drawn() {
        let img = render_loss_curve(&[0.69]).unwrap();
        assert!(curve_pixels(&img) >= 25);
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(matches!(render_loss_curve(&[]), Err(Error::Visualization(_))));
        assert!(matches!(render_loss_curve(&[0.5, f64::NAN]), Err(Error::Visualization(_))));
    }

    #[test]
    fn writes_a_png_that_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("loss.png");
        save_loss_curve(&[0.9, 0.6, 0.5], &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn unwritable_target_is_a_visualization_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_loss_curve(&[0.9, 0.6], dir.path()).unwrap_err();
        assert!(matches!(err, Error::Visualization(_)));
    }
}

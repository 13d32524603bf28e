//! GIF output: frames rasterized with `plotters`, assembled with `image`.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder as GifWriter, Repeat};
use image::{Delay, DynamicImage, Frame, RgbImage};
use plotters::prelude::*;
use plotters::style::Color as _;

use crate::analysis::{Color, render_err, rgb};
use crate::error::{Error, Result};
use crate::geometry::{Bounds, Part, Point2};

use super::{EncodeStats, FrameData, FrameEncoder, FrameLayout};

/// Default canvas size for animations.
pub const DEFAULT_ANIMATION_SIZE: (u32, u32) = (800, 800);

fn gif_err<E: std::fmt::Display>(e: E) -> Error {
    Error::EncodingFailed(e.to_string())
}

/// Stroke color, width and vertex marker radius for a part.
fn part_style(part: Part) -> (Color, u32, Option<i32>) {
    match part {
        Part::Chain | Part::BottomChord | Part::Rim => (Color::BLUE, 2, Some(4)),
        Part::TopChord => (Color::GREEN, 2, Some(4)),
        Part::Rod => (Color::BLACK, 3, Some(4)),
        Part::Spokes => (Color::GRAY, 1, None),
    }
}

/// Delay of frame `index` in centiseconds, the GIF time unit.
///
/// Whole centiseconds are spread so frame `n` ends at `n * 100 / fps`, which
/// keeps the long-run rate at `fps` (30 fps plays as 3, 3, 4, 3, 3, 4, ...).
fn frame_delay_cs(index: usize, fps: u32) -> u32 {
    let fps = u64::from(fps.max(1));
    let end = |n: u64| n * 100 / fps;
    let n = index as u64;
    (end(n + 1) - end(n)).max(1) as u32
}

/// Grow `bounds` so one data unit spans the same pixels on both axes.
fn fit_aspect(bounds: Bounds, size: (u32, u32)) -> Bounds {
    let (w, h) = (size.0.max(1) as f64, size.1.max(1) as f64);
    let (bw, bh) = (bounds.width().max(1e-9), bounds.height().max(1e-9));
    let cx = (bounds.min.x + bounds.max.x) / 2.0;
    let cy = (bounds.min.y + bounds.max.y) / 2.0;
    let (half_w, half_h) = if bw / bh > w / h {
        (bw / 2.0, bw * h / w / 2.0)
    } else {
        (bh * w / h / 2.0, bh / 2.0)
    };
    Bounds {
        min: Point2::new(cx - half_w, cy - half_h),
        max: Point2::new(cx + half_w, cy + half_h),
    }
}

/// Writes an animated GIF.
///
/// The file is created in [`FrameEncoder::begin`] and removed again on
/// [`FrameEncoder::abort`].
pub struct GifEncoder {
    path: PathBuf,
    size: (u32, u32),
    layout: Option<FrameLayout>,
    writer: Option<GifWriter<BufWriter<File>>>,
    frames: usize,
    /// RGB canvas reused across frames.
    pixels: Vec<u8>,
}

impl GifEncoder {
    pub fn new<P: AsRef<Path>>(path: P, size: (u32, u32)) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            size,
            layout: None,
            writer: None,
            frames: 0,
            pixels: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameEncoder for GifEncoder {
    fn begin(&mut self, layout: &FrameLayout) -> Result<()> {
        if self.writer.is_some() {
            return Err(Error::EncodingFailed("GIF encoder already started".to_string()));
        }
        if layout.fps == 0 || self.size.0 == 0 || self.size.1 == 0 {
            return Err(Error::EncodingFailed(format!(
                "invalid GIF parameters: {} fps, {}x{}",
                layout.fps, self.size.0, self.size.1
            )));
        }

        let file = File::create(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let mut writer = GifWriter::new(BufWriter::new(file));
        if let Err(e) = writer.set_repeat(Repeat::Infinite) {
            drop(writer);
            let _ = fs::remove_file(&self.path);
            return Err(gif_err(e));
        }

        self.pixels = vec![255u8; self.size.0 as usize * self.size.1 as usize * 3];
        self.layout = Some(layout.clone());
        self.writer = Some(writer);
        self.frames = 0;
        log::debug!(
            "Writing '{}' ({}x{} @ {} fps)",
            self.path.display(),
            self.size.0,
            self.size.1,
            layout.fps
        );
        Ok(())
    }

    fn encode(&mut self, frame: &FrameData) -> Result<()> {
        let (Some(layout), Some(writer)) = (self.layout.as_ref(), self.writer.as_mut()) else {
            return Err(Error::EncodingFailed("GIF encoder not started".to_string()));
        };

        draw_frame(&mut self.pixels, self.size, layout, frame)?;

        let image = RgbImage::from_raw(self.size.0, self.size.1, self.pixels.clone())
            .ok_or_else(|| Error::EncodingFailed("canvas size mismatch".to_string()))?;
        let rgba = DynamicImage::ImageRgb8(image).into_rgba8();
        let delay = Delay::from_numer_denom_ms(frame_delay_cs(self.frames, layout.fps) * 10, 1);
        writer
            .encode_frame(Frame::from_parts(rgba, 0, 0, delay))
            .map_err(gif_err)?;

        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<EncodeStats> {
        let Some(writer) = self.writer.take() else {
            return Err(Error::EncodingFailed("GIF encoder not started".to_string()));
        };
        // the GIF trailer is written when the encoder is dropped
        drop(writer);
        self.layout = None;

        let bytes = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                let _ = fs::remove_file(&self.path);
                return Err(Error::io(&self.path, e));
            }
        };
        log::info!("Saved '{}'", self.path.display());
        Ok(EncodeStats {
            frames: self.frames,
            bytes,
            output: Some(self.path.clone()),
        })
    }

    fn abort(&mut self) {
        self.layout = None;
        if self.writer.take().is_some() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Could not remove partial '{}': {}", self.path.display(), e);
            }
        }
    }
}

/// Rasterize one frame into an RGB buffer of `size` pixels.
pub fn draw_frame(pixels: &mut [u8], size: (u32, u32), layout: &FrameLayout, frame: &FrameData) -> Result<()> {
    let root = BitMapBackend::with_buffer(pixels, size).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let view = fit_aspect(layout.bounds, size);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(layout.title.as_str(), ("sans-serif", 20))
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(view.min.x..view.max.x, view.min.y..view.max.y)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("X [m]")
        .y_desc("Y [m]")
        .light_line_style(RGBColor(235, 235, 235))
        .draw()
        .map_err(render_err)?;

    if layout.show_trace && frame.trace.len() > 1 {
        let style = rgb(Color::RED).mix(0.5).stroke_width(1);
        chart
            .draw_series(LineSeries::new(frame.trace.iter().map(|p| (p.x, p.y)), style))
            .map_err(render_err)?;
    }

    for polyline in &frame.shape.polylines {
        let (color, width, marker) = part_style(polyline.part);
        let style = rgb(color).stroke_width(width);
        let points: Vec<(f64, f64)> = polyline.points.iter().map(|p| (p.x, p.y)).collect();

        if polyline.part.is_segmented() {
            for pair in points.chunks(2) {
                chart
                    .draw_series(LineSeries::new(pair.iter().copied(), style))
                    .map_err(render_err)?;
            }
        } else {
            chart
                .draw_series(LineSeries::new(points.iter().copied(), style))
                .map_err(render_err)?;
        }
        if let Some(radius) = marker {
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, radius, rgb(color).filled())))
                .map_err(render_err)?;
        }
    }

    chart
        .draw_series(layout.anchors.iter().map(|a| {
            EmptyElement::at((a.x, a.y)) + Rectangle::new([(-5, -5), (5, 5)], BLACK.filled())
        }))
        .map_err(render_err)?;

    root.draw_text(
        &frame.label,
        &("sans-serif", 16).into_font().color(&BLACK),
        (60, 40),
    )
    .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn layout() -> FrameLayout {
        FrameLayout {
            title: String::new(),
            bounds: Bounds {
                min: Point2::ORIGIN,
                max: Point2::new(1.0, 1.0),
            },
            fps: 30,
            frame_count: 1,
            anchors: Vec::new(),
            show_trace: false,
        }
    }

    #[test]
    fn test_fit_aspect_matches_canvas() {
        let bounds = Bounds {
            min: Point2::new(-1.0, -1.0),
            max: Point2::new(9.0, 1.0),
        };
        let view = fit_aspect(bounds, (1000, 600));
        assert!((view.width() / view.height() - 1000.0 / 600.0).abs() < 1e-9);
        assert!(view.contains(bounds.min) && view.contains(bounds.max));

        let tall = fit_aspect(bounds, (100, 1000));
        assert!((tall.width() - 10.0).abs() < 1e-9);
        assert!((tall.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_delays_keep_rate() {
        let delays: Vec<u32> = (0..6).map(|i| frame_delay_cs(i, 30)).collect();
        assert_eq!(delays, vec![3, 3, 4, 3, 3, 4]);
        let second: u32 = (0..30).map(|i| frame_delay_cs(i, 30)).sum();
        assert_eq!(second, 100);
        assert!((0..10).all(|i| frame_delay_cs(i, 25) == 4));
        assert!((0..10).all(|i| frame_delay_cs(i, 500) >= 1));
    }

    #[test]
    fn test_finish_reports_vanished_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.gif");
        let mut encoder = GifEncoder::new(&path, (64, 64));
        encoder.begin(&layout()).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(matches!(encoder.finish(), Err(Error::Io { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_part_styles() {
        assert_eq!(part_style(Part::Spokes).2, None);
        assert_ne!(part_style(Part::BottomChord).0, part_style(Part::TopChord).0);
    }

    #[test]
    fn test_abort_before_begin_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.gif");
        let mut encoder = GifEncoder::new(&path, DEFAULT_ANIMATION_SIZE);
        encoder.abort();
        assert!(!path.exists());
        assert!(encoder.finish().is_err());
    }

    #[test]
    fn test_begin_rejects_zero_fps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("zero.gif");
        let mut encoder = GifEncoder::new(&path, DEFAULT_ANIMATION_SIZE);
        let layout = FrameLayout { fps: 0, ..layout() };
        assert!(encoder.begin(&layout).is_err());
        assert!(!path.exists());
    }
}

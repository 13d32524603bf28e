//! PNG output for [`Figure`]s via `plotters`.

use std::path::Path;

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::Color as _;

use crate::error::{Error, Result};
use crate::geometry::{Bounds, Point2};

use super::{Arrangement, Color, Dash, Figure, Line, LineStyle, Marker, MarkerShape, Panel};

/// Default canvas size for static figures.
pub const DEFAULT_FIGURE_SIZE: (u32, u32) = (1200, 600);

pub(crate) fn render_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

pub(crate) fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn shape_style(style: &LineStyle) -> ShapeStyle {
    rgb(style.color)
        .mix(style.opacity.clamp(0.0, 1.0))
        .stroke_width(style.width.round().max(1.0) as u32)
}

/// Write `figure` as a PNG of `size` pixels.
pub fn render_png<P: AsRef<Path>>(figure: &Figure, path: P, size: (u32, u32)) -> Result<()> {
    let path = path.as_ref();
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_figure(&root, figure)?;
    root.present().map_err(render_err)?;
    log::info!("Saved '{}'", path.display());
    Ok(())
}

/// Draw `figure` onto any plotters drawing area.
pub fn draw_figure<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;
    if figure.panels.is_empty() {
        return Ok(());
    }

    let n = figure.panels.len();
    let areas = match figure.arrangement {
        Arrangement::Row => root.split_evenly((1, n)),
        Arrangement::Column => root.split_evenly((n, 1)),
    };
    for (area, panel) in areas.iter().zip(&figure.panels) {
        draw_panel(area, panel)?;
    }
    Ok(())
}

/// Axis ranges for a panel: data extent padded by 5%, never degenerate.
fn panel_range(panel: &Panel) -> Bounds {
    let extent = panel.extent().unwrap_or(Bounds {
        min: Point2::new(0.0, 0.0),
        max: Point2::new(1.0, 1.0),
    });
    let pad_x = (extent.width() * 0.05).max(if extent.width() == 0.0 { 0.5 } else { 0.0 });
    let pad_y = (extent.height() * 0.05).max(if extent.height() == 0.0 { 0.5 } else { 0.0 });
    let padded = Bounds {
        min: Point2::new(extent.min.x - pad_x, extent.min.y - pad_y),
        max: Point2::new(extent.max.x + pad_x, extent.max.y + pad_y),
    };
    if panel.equal_aspect {
        padded.equal_aspect()
    } else {
        padded
    }
}

fn draw_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()> {
    let range = panel_range(panel);
    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .caption(panel.title.as_str(), ("sans-serif", 22))
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(range.min.x..range.max.x, range.min.y..range.max.y)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .light_line_style(RGBColor(230, 230, 230))
        .draw()
        .map_err(render_err)?;

    let mut labelled = false;
    for line in &panel.lines {
        labelled |= draw_line(&mut chart, line)?;
    }
    for marker in &panel.markers {
        labelled |= draw_marker(&mut chart, marker)?;
    }

    if labelled {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;
    }
    Ok(())
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Returns true if the line added a legend entry.
fn draw_line<DB: DrawingBackend>(chart: &mut Chart<'_, DB>, line: &Line) -> Result<bool> {
    if line.points.is_empty() {
        return Ok(false);
    }
    let style = shape_style(&line.style);
    let points: Vec<(f64, f64)> = line.points.iter().map(|p| (p.x, p.y)).collect();

    if line.segmented {
        for pair in points.chunks(2) {
            chart
                .draw_series(LineSeries::new(pair.iter().copied(), style))
                .map_err(render_err)?;
        }
        return Ok(false);
    }

    let anno = match line.style.dash {
        Dash::Solid => chart.draw_series(LineSeries::new(points, style)),
        Dash::Dashed => chart.draw_series(DashedLineSeries::new(points, 10u32, 6u32, style)),
        Dash::Dotted => chart.draw_series(DashedLineSeries::new(points, 2u32, 4u32, style)),
        Dash::DashDot => chart.draw_series(DashedLineSeries::new(points, 8u32, 4u32, style)),
    }
    .map_err(render_err)?;

    if line.label.is_empty() {
        return Ok(false);
    }
    anno.label(line.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    Ok(true)
}

fn draw_marker<DB: DrawingBackend>(chart: &mut Chart<'_, DB>, marker: &Marker) -> Result<bool> {
    let style = rgb(marker.color).filled();
    let at = (marker.point.x, marker.point.y);
    let s = marker.size as i32;

    let anno = match marker.shape {
        MarkerShape::Circle => chart.draw_series(std::iter::once(Circle::new(at, s, style))),
        MarkerShape::Square => chart.draw_series(std::iter::once(
            EmptyElement::at(at) + Rectangle::new([(-s, -s), (s, s)], style),
        )),
        MarkerShape::Cross => chart.draw_series(std::iter::once(Cross::new(at, s, style))),
    }
    .map_err(render_err)?;

    match &marker.label {
        Some(label) => {
            let color = rgb(marker.color);
            anno.label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x + 5, y - 4), (x + 13, y + 4)], color.filled()));
            Ok(true)
        }
        None => Ok(false),
    }
}

//! Backend-independent figure description.
//!
//! The comparison renderer produces a [`Figure`]; `raster` turns it into
//! pixels. Keeping the two apart lets figures be inspected in tests without
//! a font or image backend.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point2};

/// RGB color, written in configs as a name (`"red"`, `"k"`) or `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const RED: Color = Color::rgb(214, 39, 40);
    pub const GREEN: Color = Color::rgb(44, 160, 44);
    pub const BLUE: Color = Color::rgb(31, 119, 180);
    pub const ORANGE: Color = Color::rgb(255, 127, 14);

    /// Cycle used when lines have no configured color (one per body/column).
    pub const PALETTE: [Color; 10] = [
        Color::rgb(31, 119, 180),
        Color::rgb(255, 127, 14),
        Color::rgb(44, 160, 44),
        Color::rgb(214, 39, 40),
        Color::rgb(148, 103, 189),
        Color::rgb(140, 86, 75),
        Color::rgb(227, 119, 194),
        Color::rgb(127, 127, 127),
        Color::rgb(188, 189, 34),
        Color::rgb(23, 190, 207),
    ];

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn cycle(i: usize) -> Self {
        Self::PALETTE[i % Self::PALETTE.len()]
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            return Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        let color = match s.to_ascii_lowercase().as_str() {
            "black" | "k" => Self::BLACK,
            "gray" | "grey" => Self::GRAY,
            "red" | "r" => Self::RED,
            "green" | "g" => Self::GREEN,
            "blue" | "b" => Self::BLUE,
            "orange" => Self::ORANGE,
            "purple" => Self::PALETTE[4],
            "brown" => Self::PALETTE[5],
            "pink" => Self::PALETTE[6],
            "olive" => Self::PALETTE[8],
            "cyan" | "c" => Self::PALETTE[9],
            "white" | "w" => Self::rgb(255, 255, 255),
            _ => return None,
        };
        Some(color)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLUE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown color '{}'", s))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Line dash pattern, written in configs as `-`, `--`, `:` or `-.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl Dash {
    pub fn as_str(self) -> &'static str {
        match self {
            Dash::Solid => "-",
            Dash::Dashed => "--",
            Dash::Dotted => ":",
            Dash::DashDot => "-.",
        }
    }
}

impl TryFrom<String> for Dash {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.trim() {
            "-" | "solid" => Ok(Dash::Solid),
            "--" | "dashed" => Ok(Dash::Dashed),
            ":" | "dotted" => Ok(Dash::Dotted),
            "-." | "dashdot" => Ok(Dash::DashDot),
            other => Err(format!("unknown line style '{}'", other)),
        }
    }
}

impl From<Dash> for String {
    fn from(d: Dash) -> Self {
        d.as_str().to_string()
    }
}

/// Stroke used for one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub dash: Dash,
    pub width: f64,
    /// 0.0 (invisible) to 1.0 (opaque).
    pub opacity: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::default(),
            dash: Dash::Solid,
            width: 2.0,
            opacity: 0.9,
        }
    }
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: String,
    pub points: Vec<Point2>,
    pub style: LineStyle,
    /// Draw consecutive point pairs as separate segments.
    pub segmented: bool,
}

impl Line {
    pub fn new(label: impl Into<String>, points: Vec<Point2>, style: LineStyle) -> Self {
        Self {
            label: label.into(),
            points,
            style,
            segmented: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    Cross,
}

/// Single highlighted point (anchors, trajectory start/end).
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub point: Point2,
    pub shape: MarkerShape,
    pub color: Color,
    pub size: u32,
    pub label: Option<String>,
}

/// One set of axes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub equal_aspect: bool,
    pub lines: Vec<Line>,
    pub markers: Vec<Marker>,
}

impl Panel {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            ..Default::default()
        }
    }

    /// Data extent of all finite line points and markers.
    pub fn extent(&self) -> Option<Bounds> {
        let points = self
            .lines
            .iter()
            .flat_map(|l| l.points.iter())
            .chain(self.markers.iter().map(|m| &m.point))
            .filter(|p| p.x.is_finite() && p.y.is_finite());

        points.fold(None, |acc: Option<Bounds>, p| {
            Some(match acc {
                None => Bounds { min: *p, max: *p },
                Some(b) => Bounds {
                    min: Point2::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                    max: Point2::new(b.max.x.max(p.x), b.max.y.max(p.y)),
                },
            })
        })
    }

    pub fn line(&self, label: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.label == label)
    }
}

/// How panels share the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arrangement {
    /// Side by side.
    #[default]
    Row,
    /// Stacked, sharing the horizontal axis.
    Column,
}

/// A series that could not be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub label: String,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.label, self.path.display(), self.message)
    }
}

/// Complete figure ready for a backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Figure {
    pub title: String,
    pub panels: Vec<Panel>,
    pub arrangement: Arrangement,
    pub diagnostics: Vec<Diagnostic>,
}

impl Figure {
    /// Labels of every line across all panels.
    pub fn line_labels(&self) -> Vec<&str> {
        self.panels
            .iter()
            .flat_map(|p| p.lines.iter().map(|l| l.label.as_str()))
            .collect()
    }
}

//! Configuration types for scenes, views and animations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analysis::{Color, Dash, LineStyle, Reference, View};
use crate::geometry::Topology;
use crate::table::Delimiter;

fn default_stride() -> usize {
    1
}

fn default_trace_capacity() -> usize {
    100
}

fn default_fps() -> u32 {
    30
}

fn default_margin() -> f64 {
    0.5
}

fn default_line_width() -> f64 {
    2.0
}

fn default_opacity() -> f64 {
    0.9
}

fn default_canvas() -> u32 {
    800
}

/// Top-level description of one mechanical system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    /// Primary artifact, used by the animation and by views without series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactConfig>,
    /// How bodies connect. Required for animations and snapshot views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationConfig>,
    #[serde(default)]
    pub views: Vec<ViewConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "scene".to_string(),
            artifact: None,
            topology: None,
            animation: None,
            views: Vec::new(),
        }
    }
}

impl SceneConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(animation) = &self.animation {
            if self.artifact.is_none() {
                return Err(ConfigError::AnimationWithoutArtifact);
            }
            if self.topology.is_none() {
                return Err(ConfigError::AnimationWithoutTopology);
            }
            animation.validate()?;
        }
        for (i, view) in self.views.iter().enumerate() {
            view.validate()?;
            if view.series.is_empty() && self.artifact.is_none() {
                return Err(ConfigError::ViewWithoutSeries { view: i });
            }
            if matches!(view.view, View::Snapshot { .. }) && self.topology.is_none() {
                return Err(ConfigError::SnapshotWithoutTopology { view: i });
            }
        }
        Ok(())
    }
}

/// A tabular artifact on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub delimiter: Delimiter,
}

/// Frame sequence and trace parameters of an animation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSettings {
    /// Decimation stride: every `stride`-th row becomes a frame.
    #[serde(default = "default_stride")]
    pub stride: usize,
    /// Capacity of the tracked body's trace.
    #[serde(default = "default_trace_capacity")]
    pub trace_capacity: usize,
    /// Body whose path is traced; the last body when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_body: Option<usize>,
    /// Whether encoders draw the trace.
    #[serde(default)]
    pub show_trace: bool,
    /// Target playback rate.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Padding around the data extent, in data units.
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default)]
    pub title: String,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            stride: default_stride(),
            trace_capacity: default_trace_capacity(),
            tracked_body: None,
            show_trace: false,
            fps: default_fps(),
            margin: default_margin(),
            title: String::new(),
        }
    }
}

impl AnimationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stride == 0 {
            return Err(ConfigError::InvalidStride);
        }
        if self.trace_capacity == 0 {
            return Err(ConfigError::InvalidTraceCapacity);
        }
        if self.fps == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ConfigError::InvalidMargin(self.margin));
        }
        Ok(())
    }
}

/// Output format of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// Rasterized GIF.
    #[default]
    Gif,
    /// Vector-frame archive (`.mtra`).
    Archive,
}

/// Animation output of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(flatten)]
    pub settings: AnimationSettings,
    pub output: PathBuf,
    #[serde(default)]
    pub encoder: EncoderKind,
    #[serde(default = "default_canvas")]
    pub width: u32,
    #[serde(default = "default_canvas")]
    pub height: u32,
    /// LZ4-compress archive frames (needs the `lz4` feature).
    #[serde(default)]
    pub compress: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            settings: AnimationSettings::default(),
            output: PathBuf::from("animation.gif"),
            encoder: EncoderKind::Gif,
            width: default_canvas(),
            height: default_canvas(),
            compress: false,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings.validate()?;
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// One solver run in a comparison figure.
///
/// The same descriptor yields the same color, dash and width in every view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDescriptor {
    pub path: PathBuf,
    #[serde(default)]
    pub delimiter: Delimiter,
    pub label: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub style: Dash,
    #[serde(default = "default_line_width")]
    pub width: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl SeriesDescriptor {
    /// Descriptor with default styling, used for a scene's own artifact.
    pub fn primary(path: impl Into<PathBuf>, delimiter: Delimiter, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter,
            label: label.into(),
            color: Color::default(),
            style: Dash::Solid,
            width: default_line_width(),
            opacity: default_opacity(),
        }
    }

    pub fn line_style(&self) -> LineStyle {
        LineStyle {
            color: self.color,
            dash: self.style,
            width: self.width,
            opacity: self.opacity,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel {
                path: self.path.clone(),
            });
        }
        if !(self.width > 0.0) {
            return Err(ConfigError::InvalidLineWidth {
                label: self.label.clone(),
                width: self.width,
            });
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::InvalidOpacity {
                label: self.label.clone(),
                opacity: self.opacity,
            });
        }
        Ok(())
    }
}

/// One static figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub view: View,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// PNG written relative to the scene directory; figure only built when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Series to compare. Empty means the scene's primary artifact.
    #[serde(default)]
    pub series: Vec<SeriesDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    #[serde(default = "default_canvas")]
    pub width: u32,
    #[serde(default = "default_canvas")]
    pub height: u32,
}

impl ViewConfig {
    pub fn new(view: View) -> Self {
        Self {
            view,
            title: None,
            output: None,
            series: Vec::new(),
            reference: None,
            x_label: None,
            y_label: None,
            width: default_canvas(),
            height: default_canvas(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        for series in &self.series {
            series.validate()?;
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Decimation stride must be at least 1")]
    InvalidStride,
    #[error("Trace capacity must be at least 1")]
    InvalidTraceCapacity,
    #[error("Frame rate must be non-zero")]
    InvalidFrameRate,
    #[error("Margin must be a finite non-negative number, got {0}")]
    InvalidMargin(f64),
    #[error("Canvas size {width}x{height} must be non-zero")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("Series for {} has an empty label", path.display())]
    EmptyLabel { path: PathBuf },
    #[error("Series '{label}' has invalid line width {width}")]
    InvalidLineWidth { label: String, width: f64 },
    #[error("Series '{label}' has opacity {opacity} outside [0, 1]")]
    InvalidOpacity { label: String, opacity: f64 },
    #[error("Animation requires a primary artifact")]
    AnimationWithoutArtifact,
    #[error("Animation requires a topology")]
    AnimationWithoutTopology,
    #[error("View {view} has no series and the scene has no primary artifact")]
    ViewWithoutSeries { view: usize },
    #[error("Snapshot view {view} requires a topology")]
    SnapshotWithoutTopology { view: usize },
    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),
}

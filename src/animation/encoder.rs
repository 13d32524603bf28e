//! The seam between an animation session and whatever persists its frames.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::geometry::{Bounds, Point2, Shape};

/// Fixed properties of an animation, known once the session is primed.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub title: String,
    /// Drawing surface; covers every body position and anchor.
    pub bounds: Bounds,
    pub fps: u32,
    /// Number of frames the session will emit.
    pub frame_count: usize,
    pub anchors: Vec<Point2>,
    pub show_trace: bool,
}

/// One reconstructed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    /// Position in the emitted sequence.
    pub index: usize,
    /// Source row in the table.
    pub row: usize,
    pub time: f64,
    /// Time annotation, e.g. `Time: 1.25 s`.
    pub label: String,
    pub shape: Shape,
    /// Tracked body's recent path, oldest first.
    pub trace: Vec<Point2>,
}

/// Summary returned by [`FrameEncoder::finish`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodeStats {
    pub frames: usize,
    pub bytes: u64,
    pub output: Option<PathBuf>,
}

impl fmt::Display for EncodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} frames, {} bytes", self.frames, self.bytes)?;
        if let Some(path) = &self.output {
            write!(f, " -> {}", path.display())?;
        }
        Ok(())
    }
}

/// Consumer of animation frames.
///
/// A session calls `begin` once, `encode` per frame in ascending order, then
/// `finish`. After any error the session calls `abort`, which must remove
/// partial output.
pub trait FrameEncoder {
    fn begin(&mut self, layout: &FrameLayout) -> Result<()>;

    fn encode(&mut self, frame: &FrameData) -> Result<()>;

    fn finish(&mut self) -> Result<EncodeStats>;

    fn abort(&mut self);
}

impl<E: FrameEncoder + ?Sized> FrameEncoder for &mut E {
    fn begin(&mut self, layout: &FrameLayout) -> Result<()> {
        (**self).begin(layout)
    }

    fn encode(&mut self, frame: &FrameData) -> Result<()> {
        (**self).encode(frame)
    }

    fn finish(&mut self) -> Result<EncodeStats> {
        (**self).finish()
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct MemoryEncoder {
    layout: Option<FrameLayout>,
    frames: Vec<FrameData>,
    finished: bool,
    aborted: bool,
}

impl MemoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self) -> Option<&FrameLayout> {
        self.layout.as_ref()
    }

    pub fn frames(&self) -> &[FrameData] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<FrameData> {
        self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameEncoder for MemoryEncoder {
    fn begin(&mut self, layout: &FrameLayout) -> Result<()> {
        if self.layout.is_some() {
            return Err(Error::EncodingFailed("encoder already started".to_string()));
        }
        self.layout = Some(layout.clone());
        Ok(())
    }

    fn encode(&mut self, frame: &FrameData) -> Result<()> {
        if self.layout.is_none() || self.finished {
            return Err(Error::EncodingFailed("encoder is not accepting frames".to_string()));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<EncodeStats> {
        if self.layout.is_none() {
            return Err(Error::EncodingFailed("encoder was never started".to_string()));
        }
        self.finished = true;
        Ok(EncodeStats {
            frames: self.frames.len(),
            bytes: 0,
            output: None,
        })
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.frames.clear();
    }
}

//! Drawable primitives produced by reconstruction.

use serde::{Deserialize, Serialize};

/// A point in the plane. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Which part of a structure a polyline draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Part {
    /// Anchor followed by every body.
    Chain = 0,
    /// Bottom anchor followed by even bodies.
    BottomChord = 1,
    /// Top anchor followed by odd bodies.
    TopChord = 2,
    /// Closed loop through the triangle's bodies.
    Rim = 3,
    /// Pivot-to-body segments, pivot repeated before each body.
    Spokes = 4,
    /// Free two-point rod.
    Rod = 5,
}

impl Part {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Part::Chain),
            1 => Some(Part::BottomChord),
            2 => Some(Part::TopChord),
            3 => Some(Part::Rim),
            4 => Some(Part::Spokes),
            5 => Some(Part::Rod),
            _ => None,
        }
    }

    /// Spokes are drawn as disjoint segments (pairs), everything else as a
    /// connected path.
    pub fn is_segmented(self) -> bool {
        matches!(self, Part::Spokes)
    }

    pub fn label(self) -> &'static str {
        match self {
            Part::Chain => "Chain",
            Part::BottomChord => "Bottom Chord",
            Part::TopChord => "Top Chord",
            Part::Rim => "Rim",
            Part::Spokes => "Spokes",
            Part::Rod => "Rod",
        }
    }
}

/// Ordered vertex list for one part of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub part: Part,
    pub points: Vec<Point2>,
}

impl Polyline {
    pub fn new(part: Part, points: Vec<Point2>) -> Self {
        Self { part, points }
    }
}

/// Geometry of a structure at one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub polylines: Vec<Polyline>,
}

impl Shape {
    /// Polyline for a given part, if the topology produces one.
    pub fn part(&self, part: Part) -> Option<&Polyline> {
        self.polylines.iter().find(|p| p.part == part)
    }

    /// Total number of vertices across all polylines.
    pub fn vertex_count(&self) -> usize {
        self.polylines.iter().map(|p| p.points.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serializes_as_pair() {
        let json = serde_json::to_string(&Point2::new(0.0, 1.5)).unwrap();
        assert_eq!(json, "[0.0,1.5]");
        let back: Point2 = serde_json::from_str("[2, -1]").unwrap();
        assert_eq!(back, Point2::new(2.0, -1.0));
    }

    #[test]
    fn test_part_tags_are_stable() {
        for part in [
            Part::Chain,
            Part::BottomChord,
            Part::TopChord,
            Part::Rim,
            Part::Spokes,
            Part::Rod,
        ] {
            assert_eq!(Part::from_u8(part as u8), Some(part));
        }
        assert_eq!(Part::from_u8(42), None);
    }
}

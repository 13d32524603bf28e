//! Topology policies mapping body positions to drawable vertex lists.
//!
//! Each variant has its own reconstruction function. Reconstruction is pure:
//! it reads one row of an immutable table and keeps no state between calls,
//! so the animation session and the static renderer share it freely.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::{Schema, Table};

use super::{Part, Point2, Polyline, Shape};

fn default_top_anchor() -> Point2 {
    Point2::new(0.0, 1.0)
}

/// How body indices connect into a drawable structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Topology {
    /// anchor -> body 0 -> body 1 -> ... (spring/rod chains, pendulums).
    LinearChain {
        #[serde(default)]
        anchor: Point2,
    },
    /// Even bodies hang off the bottom anchor, odd bodies off the top anchor
    /// (crane chords).
    DualChord {
        #[serde(default)]
        bottom_anchor: Point2,
        #[serde(default = "default_top_anchor")]
        top_anchor: Point2,
    },
    /// Three bodies forming a closed triangle, each joined to the pivot
    /// (spinning top).
    TriangleSpokes {
        #[serde(default)]
        pivot: Point2,
    },
    /// Two free endpoints joined by a rod.
    Rod,
}

impl Default for Topology {
    fn default() -> Self {
        Topology::LinearChain {
            anchor: Point2::ORIGIN,
        }
    }
}

impl Topology {
    /// Fixed points this topology prepends, in drawing order.
    pub fn anchors(&self) -> Vec<Point2> {
        match *self {
            Topology::LinearChain { anchor } => vec![anchor],
            Topology::DualChord {
                bottom_anchor,
                top_anchor,
            } => vec![bottom_anchor, top_anchor],
            Topology::TriangleSpokes { pivot } => vec![pivot],
            Topology::Rod => Vec::new(),
        }
    }

    /// Total vertices emitted per frame for a structure of `bodies` bodies.
    pub fn vertex_count(&self, bodies: usize) -> usize {
        match self {
            Topology::LinearChain { .. } => bodies + 1,
            Topology::DualChord { .. } => bodies + 2,
            // rim closes on body 0, spokes repeat the pivot per body
            Topology::TriangleSpokes { .. } => (bodies + 1) + 2 * bodies,
            Topology::Rod => bodies,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::LinearChain { .. } => "linear chain",
            Topology::DualChord { .. } => "dual chord",
            Topology::TriangleSpokes { .. } => "triangle with spokes",
            Topology::Rod => "rod",
        }
    }

    /// Check that the schema can feed this topology.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        if !schema.is_planar() {
            return Err(Error::SchemaMismatch(format!(
                "{} needs planar x/y body columns",
                self.name()
            )));
        }
        let n = schema.body_count();
        let ok = match self {
            Topology::LinearChain { .. } => n >= 1,
            Topology::DualChord { .. } => n >= 2 && n % 2 == 0,
            Topology::TriangleSpokes { .. } => n == 3,
            Topology::Rod => n == 2,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::SchemaMismatch(format!(
                "{} cannot be built from {} bodies",
                self.name(),
                n
            )))
        }
    }

    /// Reconstruct the structure at `frame`.
    ///
    /// Out-of-range frames are an error, never clamped.
    pub fn reconstruct(&self, table: &Table, schema: &Schema, frame: usize) -> Result<Shape> {
        let rows = table.row_count();
        if frame >= rows {
            return Err(Error::FrameOutOfRange { frame, rows });
        }
        self.validate(schema)?;
        self.reconstruct_validated(table, schema, frame)
    }

    /// [`Topology::reconstruct`] for a schema that already passed
    /// [`Topology::validate`]; only the frame range is checked.
    pub fn reconstruct_validated(&self, table: &Table, schema: &Schema, frame: usize) -> Result<Shape> {
        let rows = table.row_count();
        if frame >= rows {
            return Err(Error::FrameOutOfRange { frame, rows });
        }
        let bodies = body_positions(table, schema, frame)?;

        let polylines = match *self {
            Topology::LinearChain { anchor } => linear_chain(anchor, &bodies),
            Topology::DualChord {
                bottom_anchor,
                top_anchor,
            } => dual_chord(bottom_anchor, top_anchor, &bodies),
            Topology::TriangleSpokes { pivot } => triangle_spokes(pivot, &bodies),
            Topology::Rod => rod(&bodies),
        };
        Ok(Shape { polylines })
    }
}

/// Position of body `k` (index into the schema's body list) at `frame`.
pub fn body_position(table: &Table, schema: &Schema, k: usize, frame: usize) -> Result<Point2> {
    let (Some(&xc), Some(&yc)) = (schema.x.get(k), schema.y.get(k)) else {
        return Err(Error::SchemaMismatch(format!("no planar columns for body {}", k)));
    };
    match (table.value(xc, frame), table.value(yc, frame)) {
        (Some(x), Some(y)) => Ok(Point2::new(x, y)),
        _ => Err(Error::FrameOutOfRange {
            frame,
            rows: table.row_count(),
        }),
    }
}

fn body_positions(table: &Table, schema: &Schema, frame: usize) -> Result<Vec<Point2>> {
    (0..schema.body_count())
        .map(|k| body_position(table, schema, k, frame))
        .collect()
}

fn linear_chain(anchor: Point2, bodies: &[Point2]) -> Vec<Polyline> {
    let mut points = Vec::with_capacity(bodies.len() + 1);
    points.push(anchor);
    points.extend_from_slice(bodies);
    vec![Polyline::new(Part::Chain, points)]
}

fn dual_chord(bottom: Point2, top: Point2, bodies: &[Point2]) -> Vec<Polyline> {
    let chord = |anchor: Point2, parity: usize| {
        std::iter::once(anchor)
            .chain(bodies.iter().skip(parity).step_by(2).copied())
            .collect::<Vec<_>>()
    };
    vec![
        Polyline::new(Part::BottomChord, chord(bottom, 0)),
        Polyline::new(Part::TopChord, chord(top, 1)),
    ]
}

fn triangle_spokes(pivot: Point2, bodies: &[Point2]) -> Vec<Polyline> {
    let mut rim = bodies.to_vec();
    rim.push(bodies[0]);
    let spokes = bodies.iter().flat_map(|&p| [pivot, p]).collect();
    vec![
        Polyline::new(Part::Rim, rim),
        Polyline::new(Part::Spokes, spokes),
    ]
}

fn rod(bodies: &[Point2]) -> Vec<Polyline> {
    vec![Polyline::new(Part::Rod, bodies.to_vec())]
}

//! Derived diagnostic series.
//!
//! The energy here is the unit-mass, unit-stiffness quadratic form
//! `0.5 x^2 + 0.5 v^2`. It is applied identically to every series so solver
//! outputs stay comparable; it is not a physical energy model.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Point2;
use crate::table::{Schema, Table};

use super::{Color, Dash, LineStyle};

/// `0.5 x^2 + 0.5 v^2`.
#[inline]
pub fn harmonic_energy(x: f64, v: f64) -> f64 {
    0.5 * x * x + 0.5 * v * v
}

/// Pair two columns into points. Columns must exist.
pub fn column_pair(table: &Table, a: usize, b: usize) -> Result<Vec<Point2>> {
    let (Some(xs), Some(ys)) = (table.column_at(a), table.column_at(b)) else {
        return Err(Error::SchemaMismatch(format!(
            "{}: missing column {} or {}",
            table.source().display(),
            a,
            b
        )));
    };
    Ok(xs.iter().zip(ys).map(|(&x, &y)| Point2::new(x, y)).collect())
}

/// (position, velocity) per row.
pub fn phase_series(table: &Table, schema: &Schema) -> Result<Vec<Point2>> {
    let (x, v) = schema.phase_pair()?;
    column_pair(table, x, v)
}

/// (t, E) per row.
pub fn energy_series(table: &Table, schema: &Schema) -> Result<Vec<Point2>> {
    let phase = phase_series(table, schema)?;
    let time = time_column(table, schema)?;
    Ok(time
        .iter()
        .zip(phase)
        .map(|(&t, p)| Point2::new(t, harmonic_energy(p.x, p.y)))
        .collect())
}

/// (t, position) per row.
pub fn signal_series(table: &Table, schema: &Schema) -> Result<Vec<Point2>> {
    let (x, _) = schema.phase_pair().or_else(|_| {
        schema
            .x
            .first()
            .map(|&x| (x, x))
            .ok_or_else(|| Error::SchemaMismatch("no position column".to_string()))
    })?;
    column_pair(table, schema.time, x)
}

/// (t, velocity) per row.
pub fn velocity_series(table: &Table, schema: &Schema) -> Result<Vec<Point2>> {
    let (_, v) = schema.phase_pair()?;
    column_pair(table, schema.time, v)
}

/// (t, value) for an arbitrary column.
pub fn time_series(table: &Table, schema: &Schema, column: usize) -> Result<Vec<Point2>> {
    column_pair(table, schema.time, column)
}

fn time_column<'a>(table: &'a Table, schema: &Schema) -> Result<&'a [f64]> {
    table
        .column_at(schema.time)
        .ok_or_else(|| Error::SchemaMismatch("no time column".to_string()))
}

/// Closed-form curve drawn over solver output for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReferenceCurve {
    /// `(cos s, -sin s)` for `s` in `[0, 2pi]`: exact phase portrait of the
    /// undamped unit oscillator started at `x = 1, v = 0`.
    UnitCircle { samples: usize },
    /// `amplitude * cos(angular_frequency * t)` on `[start, end]`, e.g. the
    /// source voltage of a driven circuit.
    Cosine {
        amplitude: f64,
        angular_frequency: f64,
        start: f64,
        end: f64,
        samples: usize,
    },
    /// Caller-computed points.
    Points { points: Vec<Point2> },
}

impl ReferenceCurve {
    pub fn sample(&self) -> Vec<Point2> {
        let steps = |n: usize| {
            let n = n.max(2);
            (0..n).map(move |i| i as f64 / (n - 1) as f64)
        };
        match self {
            ReferenceCurve::UnitCircle { samples } => steps(*samples)
                .map(|s| {
                    let theta = 2.0 * PI * s;
                    Point2::new(theta.cos(), -theta.sin())
                })
                .collect(),
            ReferenceCurve::Cosine {
                amplitude,
                angular_frequency,
                start,
                end,
                samples,
            } => steps(*samples)
                .map(|s| {
                    let t = start + (end - start) * s;
                    Point2::new(t, amplitude * (angular_frequency * t).cos())
                })
                .collect(),
            ReferenceCurve::Points { points } => points.clone(),
        }
    }
}

fn default_reference_color() -> Color {
    Color::BLACK
}

fn default_reference_dash() -> Dash {
    Dash::Dashed
}

fn default_reference_width() -> f64 {
    1.0
}

fn default_reference_opacity() -> f64 {
    0.3
}

/// Reference overlay with its de-emphasized style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub curve: ReferenceCurve,
    pub label: String,
    #[serde(default = "default_reference_color")]
    pub color: Color,
    #[serde(default = "default_reference_dash")]
    pub dash: Dash,
    #[serde(default = "default_reference_width")]
    pub width: f64,
    #[serde(default = "default_reference_opacity")]
    pub opacity: f64,
}

impl Reference {
    pub fn new(curve: ReferenceCurve, label: impl Into<String>) -> Self {
        Self {
            curve,
            label: label.into(),
            color: default_reference_color(),
            dash: default_reference_dash(),
            width: default_reference_width(),
            opacity: default_reference_opacity(),
        }
    }

    pub fn style(&self) -> LineStyle {
        LineStyle {
            color: self.color,
            dash: self.dash,
            width: self.width,
            opacity: self.opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harmonic_table(n: usize) -> Table {
        let t: Vec<f64> = (0..n).map(|i| i as f64 * 0.05).collect();
        let x = t.iter().map(|t| t.cos()).collect();
        let v = t.iter().map(|t| -t.sin()).collect();
        Table::from_columns(vec![("t", t), ("x0", x), ("v0", v)]).unwrap()
    }

    #[test]
    fn test_harmonic_energy_constant() {
        let table = harmonic_table(400);
        let schema = Schema::resolve(&table).unwrap();
        let energy = energy_series(&table, &schema).unwrap();

        assert_eq!(energy.len(), 400);
        for p in energy {
            assert!((p.y - 0.5).abs() < 1e-12, "E({}) = {}", p.x, p.y);
        }
    }

    #[test]
    fn test_phase_series_positional() {
        let table = Table::parse("0 1 0\n0.1 0.5 -0.5\n", crate::table::Delimiter::Whitespace, "o.txt")
            .unwrap();
        let schema = Schema::resolve(&table).unwrap();
        assert_eq!(
            phase_series(&table, &schema).unwrap(),
            vec![Point2::new(1.0, 0.0), Point2::new(0.5, -0.5)]
        );
        assert_eq!(
            signal_series(&table, &schema).unwrap(),
            vec![Point2::new(0.0, 1.0), Point2::new(0.1, 0.5)]
        );
    }

    #[test]
    fn test_phase_needs_velocity() {
        let table = Table::from_columns(vec![("t", vec![0.0]), ("x0", vec![1.0]), ("y0", vec![0.0])])
            .unwrap();
        let schema = Schema::resolve(&table).unwrap();
        assert!(matches!(
            phase_series(&table, &schema),
            Err(Error::SchemaMismatch(_))
        ));
        // signal falls back to the first position column
        assert_eq!(signal_series(&table, &schema).unwrap(), vec![Point2::new(0.0, 1.0)]);
    }

    #[test]
    fn test_unit_circle_reference() {
        let points = ReferenceCurve::UnitCircle { samples: 200 }.sample();
        assert_eq!(points.len(), 200);
        assert_eq!(points[0], Point2::new(1.0, -0.0));
        for p in &points {
            assert!((harmonic_energy(p.x, p.y) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cosine_reference_endpoints() {
        let curve = ReferenceCurve::Cosine {
            amplitude: 2.0,
            angular_frequency: 100.0 * PI,
            start: 0.0,
            end: 0.5,
            samples: 2000,
        };
        let points = curve.sample();
        assert_eq!(points.len(), 2000);
        assert_eq!(points[0], Point2::new(0.0, 2.0));
        assert!((points[1999].x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reference_defaults_deemphasized() {
        let reference: Reference = serde_json::from_str(
            r#"{"curve": {"type": "UnitCircle", "samples": 10}, "label": "Exact Solution"}"#,
        )
        .unwrap();
        let style = reference.style();
        assert_eq!(style.color, Color::BLACK);
        assert_eq!(style.dash, Dash::Dashed);
        assert!(style.opacity < 1.0);
    }
}

//! Drawing-surface extents.

use crate::table::{Schema, Table};

use super::Point2;

/// Axis-aligned view rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds {
    /// Smallest rectangle holding every x/y position in the table and every
    /// anchor, padded by `margin` on each side.
    ///
    /// Falls back to a `margin`-sized box around the origin when there is
    /// nothing to cover.
    pub fn from_table(table: &Table, schema: &Schema, anchors: &[Point2], margin: f64) -> Self {
        let mut bounds: Option<Bounds> = None;
        let mut cover = |p: Point2| {
            if !p.x.is_finite() || !p.y.is_finite() {
                return;
            }
            bounds = Some(match bounds {
                None => Bounds { min: p, max: p },
                Some(b) => Bounds {
                    min: Point2::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                    max: Point2::new(b.max.x.max(p.x), b.max.y.max(p.y)),
                },
            });
        };

        for anchor in anchors {
            cover(*anchor);
        }
        for (&xc, &yc) in schema.x.iter().zip(&schema.y) {
            if let (Some(xs), Some(ys)) = (table.column_at(xc), table.column_at(yc)) {
                for (&x, &y) in xs.iter().zip(ys) {
                    cover(Point2::new(x, y));
                }
            }
        }

        bounds
            .unwrap_or(Bounds {
                min: Point2::ORIGIN,
                max: Point2::ORIGIN,
            })
            .padded(margin)
    }

    /// Grow by `margin` on every side.
    pub fn padded(self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Expand the shorter side so both axes share one scale, keeping the
    /// centre fixed.
    pub fn equal_aspect(self) -> Self {
        let half = self.width().max(self.height()) / 2.0;
        let cx = (self.min.x + self.max.x) / 2.0;
        let cy = (self.min.y + self.max.y) / 2.0;
        Self {
            min: Point2::new(cx - half, cy - half),
            max: Point2::new(cx + half, cy + half),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_cover_data_and_anchors() {
        let table = Table::from_columns(vec![
            ("t", vec![0.0, 1.0]),
            ("x0", vec![1.0, 2.0]),
            ("y0", vec![-1.0, -3.0]),
        ])
        .unwrap();
        let schema = Schema::resolve(&table).unwrap();
        let anchors = [Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)];

        let bounds = Bounds::from_table(&table, &schema, &anchors, 0.5);
        assert_eq!(bounds.min, Point2::new(-0.5, -3.5));
        assert_eq!(bounds.max, Point2::new(2.5, 1.5));
        for a in anchors {
            assert!(bounds.contains(a));
        }
    }

    #[test]
    fn test_bounds_empty_table() {
        let table = Table::from_columns(vec![("t", vec![]), ("x0", vec![]), ("y0", vec![])])
            .unwrap();
        let schema = Schema::resolve(&table).unwrap();
        let bounds = Bounds::from_table(&table, &schema, &[], 1.0);
        assert_eq!(bounds.min, Point2::new(-1.0, -1.0));
        assert_eq!(bounds.max, Point2::new(1.0, 1.0));
    }

    #[test]
    fn test_equal_aspect() {
        let b = Bounds {
            min: Point2::new(0.0, 0.0),
            max: Point2::new(4.0, 2.0),
        }
        .equal_aspect();
        assert_eq!(b.width(), b.height());
        assert_eq!(b.min, Point2::new(0.0, -1.0));
    }
}

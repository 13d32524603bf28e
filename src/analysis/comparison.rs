//! Multi-series comparison figures.
//!
//! Each [`SeriesDescriptor`] names one solver run. Its color, dash and width
//! are applied the same way in every view so a run keeps its identity across
//! figures. A run whose artifact is missing is skipped and reported as a
//! [`Diagnostic`]; any other failure aborts the figure.

use crate::error::{Error, Result};
use crate::geometry::{Point2, Topology, body_position};
use crate::schema::SeriesDescriptor;
use crate::table::{Schema, Table};

use super::{
    Arrangement, Axes, BodySelection, Color, Dash, Diagnostic, Figure, Line, LineStyle, Marker,
    MarkerShape, Panel, Reference, View, energy_series, phase_series, signal_series, time_series,
    velocity_series,
};

/// A loaded series ready for plotting.
pub struct LoadedSeries<'a> {
    pub descriptor: &'a SeriesDescriptor,
    pub table: &'a Table,
    pub schema: &'a Schema,
}

/// Builder for one comparison figure.
#[derive(Debug, Clone)]
pub struct Comparison {
    view: View,
    title: String,
    reference: Option<Reference>,
    topology: Option<Topology>,
}

impl Comparison {
    pub fn new(view: View) -> Self {
        Self {
            title: view.name().to_string(),
            view,
            reference: None,
            topology: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Overlay a closed-form curve (phase, energy and signal views).
    pub fn with_reference(mut self, reference: Option<Reference>) -> Self {
        self.reference = reference;
        self
    }

    /// Topology supplying anchors and snapshot geometry.
    pub fn with_topology(mut self, topology: Option<Topology>) -> Self {
        self.topology = topology;
        self
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Load every series and build the figure.
    pub fn render(&self, series: &[SeriesDescriptor]) -> Result<Figure> {
        let mut tables = Vec::with_capacity(series.len());
        let mut diagnostics = Vec::new();

        for descriptor in series {
            match Table::load(&descriptor.path, descriptor.delimiter) {
                Ok(table) => {
                    let schema = Schema::resolve(&table)?;
                    tables.push((descriptor, table, schema));
                }
                Err(e) if e.is_missing_artifact() => {
                    log::warn!("Skipping series '{}': {}", descriptor.label, e);
                    diagnostics.push(Diagnostic {
                        label: descriptor.label.clone(),
                        path: descriptor.path.clone(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let loaded: Vec<LoadedSeries<'_>> = tables
            .iter()
            .map(|(descriptor, table, schema)| LoadedSeries {
                descriptor: *descriptor,
                table,
                schema,
            })
            .collect();
        let mut figure = self.build(&loaded)?;
        figure.diagnostics = diagnostics;
        Ok(figure)
    }

    /// Build the figure from series that are already in memory.
    pub fn build(&self, series: &[LoadedSeries<'_>]) -> Result<Figure> {
        let multi = series.len() > 1;
        let (x_label, y_label) = self.view.axis_labels();
        let mut panel = Panel::new(self.title.clone(), x_label, y_label);

        let panels = match &self.view {
            View::Phase => {
                panel.equal_aspect = true;
                for s in series {
                    panel.lines.push(series_line(s, phase_series(s.table, s.schema)?));
                }
                self.overlay_reference(&mut panel);
                vec![panel]
            }
            View::Energy => {
                for s in series {
                    panel.lines.push(series_line(s, energy_series(s.table, s.schema)?));
                }
                self.overlay_reference(&mut panel);
                vec![panel]
            }
            View::Signal => {
                for s in series {
                    panel.lines.push(series_line(s, signal_series(s.table, s.schema)?));
                }
                self.overlay_reference(&mut panel);
                vec![panel]
            }
            View::StateEvolution => {
                for s in series {
                    let quantities = [
                        ("position", signal_series(s.table, s.schema)?),
                        ("velocity", velocity_series(s.table, s.schema)?),
                    ];
                    for (i, (name, points)) in quantities.into_iter().enumerate() {
                        let style = LineStyle {
                            color: Color::cycle(i),
                            ..s.descriptor.line_style()
                        };
                        panel
                            .lines
                            .push(Line::new(prefixed(s.descriptor, multi, name), points, style));
                    }
                }
                vec![panel]
            }
            View::TimeHistory { bodies, axes } => {
                return self.time_history(series, bodies, *axes, multi);
            }
            View::ConstraintForce => {
                for s in series {
                    let forces: Vec<_> = s.schema.force_columns().cloned().collect();
                    if forces.is_empty() {
                        return Err(Error::SchemaMismatch(format!(
                            "{}: no constraint-force (lam*) columns",
                            s.table.source().display()
                        )));
                    }
                    for (i, (name, column)) in forces.iter().enumerate() {
                        let style = LineStyle {
                            color: Color::cycle(i),
                            ..s.descriptor.line_style()
                        };
                        panel.lines.push(Line::new(
                            prefixed(s.descriptor, multi, name),
                            time_series(s.table, s.schema, *column)?,
                            style,
                        ));
                    }
                }
                vec![panel]
            }
            View::Trajectories => {
                panel.equal_aspect = true;
                self.mark_anchors(&mut panel);
                for s in series {
                    require_planar(s)?;
                    for k in 0..s.schema.body_count() {
                        let path = body_path(s, k)?;
                        endpoint_markers(&mut panel, &path);
                        let style = LineStyle {
                            color: Color::cycle(k),
                            ..s.descriptor.line_style()
                        };
                        let name = format!("Trajectory M{}", s.schema.bodies[k]);
                        panel
                            .lines
                            .push(Line::new(prefixed(s.descriptor, multi, &name), path, style));
                    }
                }
                vec![panel]
            }
            View::Snapshot { frame } => {
                let topology = self.topology.ok_or_else(|| {
                    Error::SchemaMismatch("snapshot view needs a topology".to_string())
                })?;
                panel.equal_aspect = true;
                self.mark_anchors(&mut panel);
                for s in series {
                    let rows = s.table.row_count();
                    let row = frame
                        .resolve(rows)
                        .ok_or(Error::FrameOutOfRange { frame: rows, rows })?;
                    let shape = topology.reconstruct(s.table, s.schema, row)?;
                    for (i, polyline) in shape.polylines.iter().enumerate() {
                        let style = LineStyle {
                            color: Color::cycle(i),
                            ..s.descriptor.line_style()
                        };
                        let name = format!("{} (t = {:.2})", polyline.part.label(), time_at(s, row));
                        let mut line =
                            Line::new(prefixed(s.descriptor, multi, &name), polyline.points.clone(), style);
                        line.segmented = polyline.part.is_segmented();
                        panel.lines.push(line);
                    }
                    let tip = s.schema.body_count() - 1;
                    let style = LineStyle {
                        color: Color::RED,
                        dash: Dash::Dashed,
                        width: 0.5,
                        opacity: 0.9,
                    };
                    panel.lines.push(Line::new(
                        prefixed(s.descriptor, multi, "Tip Trajectory"),
                        body_path(s, tip)?,
                        style,
                    ));
                }
                vec![panel]
            }
        };

        Ok(Figure {
            title: self.title.clone(),
            panels,
            arrangement: Arrangement::Row,
            diagnostics: Vec::new(),
        })
    }

    fn time_history(
        &self,
        series: &[LoadedSeries<'_>],
        bodies: &BodySelection,
        axes: Axes,
        multi: bool,
    ) -> Result<Figure> {
        let mut panels = Vec::new();
        if matches!(axes, Axes::Both | Axes::X) {
            panels.push((Panel::new(self.title.clone(), "Time [s]", "X Position [m]"), false));
        }
        if matches!(axes, Axes::Both | Axes::Y) {
            let title = if panels.is_empty() { self.title.clone() } else { String::new() };
            panels.push((Panel::new(title, "Time [s]", "Y Position [m]"), true));
        }

        for s in series {
            for (slot, k) in bodies.select(s.schema.body_count()).into_iter().enumerate() {
                let style = LineStyle {
                    color: Color::cycle(slot),
                    ..s.descriptor.line_style()
                };
                let name = format!("Mass {}", s.schema.bodies[k]);
                for (panel, is_y) in panels.iter_mut() {
                    let column = if *is_y {
                        *s.schema.y.get(k).ok_or_else(|| {
                            Error::SchemaMismatch(format!(
                                "{}: no y column for body {}",
                                s.table.source().display(),
                                k
                            ))
                        })?
                    } else {
                        s.schema.x[k]
                    };
                    panel.lines.push(Line::new(
                        prefixed(s.descriptor, multi, &name),
                        time_series(s.table, s.schema, column)?,
                        style,
                    ));
                }
            }
        }

        Ok(Figure {
            title: self.title.clone(),
            panels: panels.into_iter().map(|(p, _)| p).collect(),
            arrangement: Arrangement::Column,
            diagnostics: Vec::new(),
        })
    }

    fn overlay_reference(&self, panel: &mut Panel) {
        if let Some(reference) = &self.reference {
            panel.lines.push(Line::new(
                reference.label.clone(),
                reference.curve.sample(),
                reference.style(),
            ));
        }
    }

    fn mark_anchors(&self, panel: &mut Panel) {
        let Some(topology) = &self.topology else {
            return;
        };
        for (i, anchor) in topology.anchors().into_iter().enumerate() {
            panel.markers.push(Marker {
                point: anchor,
                shape: MarkerShape::Square,
                color: Color::BLACK,
                size: 6,
                label: (i == 0).then(|| "Anchor".to_string()),
            });
        }
    }
}

fn series_line(s: &LoadedSeries<'_>, points: Vec<Point2>) -> Line {
    Line::new(s.descriptor.label.clone(), points, s.descriptor.line_style())
}

fn prefixed(descriptor: &SeriesDescriptor, multi: bool, name: &str) -> String {
    if multi {
        format!("{}: {}", descriptor.label, name)
    } else {
        name.to_string()
    }
}

fn require_planar(s: &LoadedSeries<'_>) -> Result<()> {
    if s.schema.is_planar() {
        Ok(())
    } else {
        Err(Error::SchemaMismatch(format!(
            "{}: view needs planar x/y body columns",
            s.table.source().display()
        )))
    }
}

fn body_path(s: &LoadedSeries<'_>, k: usize) -> Result<Vec<Point2>> {
    (0..s.table.row_count())
        .map(|row| body_position(s.table, s.schema, k, row))
        .collect()
}

fn endpoint_markers(panel: &mut Panel, path: &[Point2]) {
    if let (Some(&start), Some(&end)) = (path.first(), path.last()) {
        for (point, color) in [(start, Color::GREEN), (end, Color::RED)] {
            panel.markers.push(Marker {
                point,
                shape: MarkerShape::Circle,
                color,
                size: 3,
                label: None,
            });
        }
    }
}

fn time_at(s: &LoadedSeries<'_>, row: usize) -> f64 {
    s.table.value(s.schema.time, row).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FrameSelector, ReferenceCurve};
    use crate::table::Delimiter;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_oscillator(dir: &Path, name: &str, scale: f64) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut text = String::new();
        for i in 0..50 {
            let t = i as f64 * 0.1;
            text.push_str(&format!("{}\t{}\t{}\n", t, scale * t.cos(), -scale * t.sin()));
        }
        fs::write(&path, text).unwrap();
        path
    }

    fn descriptor(path: std::path::PathBuf, label: &str, color: Color, dash: Dash, width: f64) -> SeriesDescriptor {
        SeriesDescriptor {
            path,
            delimiter: Delimiter::Whitespace,
            label: label.to_string(),
            color,
            style: dash,
            width,
            opacity: 0.9,
        }
    }

    fn pendulum_series(text: &str) -> (SeriesDescriptor, Table, Schema) {
        let table = Table::parse(text, Delimiter::Tab, "pendulum.tsv").unwrap();
        let schema = Schema::resolve(&table).unwrap();
        (SeriesDescriptor::primary("pendulum.tsv", Delimiter::Tab, "run"), table, schema)
    }

    #[test]
    fn test_missing_series_is_skipped() {
        let dir = tempdir().unwrap();
        let series = vec![
            descriptor(write_oscillator(dir.path(), "a.txt", 1.0), "Improved Euler", Color::RED, Dash::Solid, 2.0),
            descriptor(dir.path().join("b.txt"), "Implicit Euler", Color::GREEN, Dash::Dashed, 4.0),
            descriptor(write_oscillator(dir.path(), "c.txt", 0.9), "Crank-Nicolson", Color::BLUE, Dash::Solid, 2.0),
        ];

        let figure = Comparison::new(View::Phase).render(&series).unwrap();

        assert_eq!(figure.line_labels(), vec!["Improved Euler", "Crank-Nicolson"]);
        assert_eq!(figure.diagnostics.len(), 1);
        assert_eq!(figure.diagnostics[0].label, "Implicit Euler");
        assert_eq!(figure.diagnostics[0].path, dir.path().join("b.txt"));
    }

    #[test]
    fn test_state_evolution_plots_position_and_velocity() {
        let dir = tempdir().unwrap();
        let series = vec![descriptor(
            write_oscillator(dir.path(), "output_test_ode.txt", 1.0),
            "run",
            Color::RED,
            Dash::Solid,
            1.0,
        )];

        let figure = Comparison::new(View::StateEvolution).render(&series).unwrap();
        assert_eq!(figure.panels.len(), 1);
        assert_eq!(figure.line_labels(), vec!["position", "velocity"]);

        let position = figure.panels[0].line("position").unwrap();
        let velocity = figure.panels[0].line("velocity").unwrap();
        assert_eq!(position.points[10], Point2::new(1.0, 1.0f64.cos()));
        assert_eq!(velocity.points[10], Point2::new(1.0, -(1.0f64.sin())));
        assert_ne!(position.style.color, velocity.style.color);
    }

    #[test]
    fn test_all_missing_still_produces_figure() {
        let dir = tempdir().unwrap();
        let series = vec![descriptor(dir.path().join("x.txt"), "x", Color::RED, Dash::Solid, 1.0)];
        let figure = Comparison::new(View::Energy).render(&series).unwrap();
        assert!(figure.panels[0].lines.is_empty());
        assert_eq!(figure.diagnostics.len(), 1);
    }

    #[test]
    fn test_malformed_series_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "0 1 0\n0.1 oops 0\n").unwrap();
        let series = vec![descriptor(path, "bad", Color::RED, Dash::Solid, 1.0)];
        assert!(matches!(
            Comparison::new(View::Phase).render(&series),
            Err(Error::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_series_styles_and_reference() {
        let dir = tempdir().unwrap();
        let series = vec![
            descriptor(write_oscillator(dir.path(), "gl2.txt", 1.0), "GL2", Color::BLUE, Dash::Solid, 6.0),
            descriptor(write_oscillator(dir.path(), "radau3.txt", 1.0), "Radau3", Color::RED, Dash::Dotted, 2.0),
        ];
        let reference = Reference::new(ReferenceCurve::UnitCircle { samples: 200 }, "Exact Solution");

        let figure = Comparison::new(View::Phase)
            .with_title("Phase Space Comparison")
            .with_reference(Some(reference))
            .render(&series)
            .unwrap();

        let panel = &figure.panels[0];
        assert!(panel.equal_aspect);
        assert_eq!(panel.lines.len(), 3);
        assert_eq!(panel.lines[0].style.color, Color::BLUE);
        assert_eq!(panel.lines[0].style.width, 6.0);
        assert_eq!(panel.lines[1].style.dash, Dash::Dotted);
        let exact = panel.line("Exact Solution").unwrap();
        assert_eq!(exact.points.len(), 200);
        assert!(exact.style.opacity < panel.lines[0].style.opacity);
    }

    #[test]
    fn test_energy_view_constant_for_exact_solution() {
        let dir = tempdir().unwrap();
        let series = vec![descriptor(write_oscillator(dir.path(), "e.txt", 1.0), "exact", Color::BLUE, Dash::Solid, 1.0)];
        let figure = Comparison::new(View::Energy).render(&series).unwrap();
        for p in &figure.panels[0].lines[0].points {
            assert!((p.y - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_time_history_panels() {
        let (desc, table, schema) =
            pendulum_series("t\tx0\ty0\tx1\ty1\n0\t1\t0\t2\t0\n0.1\t0.9\t-0.1\t1.8\t-0.3\n");
        let loaded = [LoadedSeries { descriptor: &desc, table: &table, schema: &schema }];
        let view = View::TimeHistory {
            bodies: BodySelection::All,
            axes: Axes::Both,
        };
        let figure = Comparison::new(view).build(&loaded).unwrap();

        assert_eq!(figure.arrangement, Arrangement::Column);
        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.panels[0].lines.len(), 2);
        assert_eq!(figure.panels[1].lines[1].label, "Mass 1");
        assert_eq!(
            figure.panels[1].lines[1].points,
            vec![Point2::new(0.0, 0.0), Point2::new(0.1, -0.3)]
        );
    }

    #[test]
    fn test_time_history_tip_only() {
        let (desc, table, schema) = pendulum_series(
            "t\tx0\ty0\tx1\ty1\tx2\ty2\tx3\ty3\n0\t1\t0\t1\t1\t2\t0\t2\t1\n",
        );
        let loaded = [LoadedSeries { descriptor: &desc, table: &table, schema: &schema }];
        let view = View::TimeHistory {
            bodies: BodySelection::Last(2),
            axes: Axes::Y,
        };
        let figure = Comparison::new(view).build(&loaded).unwrap();
        assert_eq!(figure.panels.len(), 1);
        assert_eq!(figure.line_labels(), vec!["Mass 2", "Mass 3"]);
    }

    #[test]
    fn test_constraint_force_view() {
        let (desc, table, schema) = pendulum_series(
            "t\tx0\ty0\tx1\ty1\tlam1\tlam2\n0\t1\t0\t2\t0\t9.8\t4.9\n0.01\t1\t0\t2\t0\t9.7\t4.8\n",
        );
        let loaded = [LoadedSeries { descriptor: &desc, table: &table, schema: &schema }];
        let figure = Comparison::new(View::ConstraintForce).build(&loaded).unwrap();
        assert_eq!(figure.line_labels(), vec!["lam1", "lam2"]);
        assert_eq!(figure.panels[0].lines[1].points[1], Point2::new(0.01, 4.8));
    }

    #[test]
    fn test_constraint_force_needs_columns() {
        let (desc, table, schema) = pendulum_series("t\tx0\ty0\n0\t1\t0\n");
        let loaded = [LoadedSeries { descriptor: &desc, table: &table, schema: &schema }];
        assert!(Comparison::new(View::ConstraintForce).build(&loaded).is_err());
    }

    #[test]
    fn test_trajectories_mark_anchor_and_endpoints() {
        let (desc, table, schema) =
            pendulum_series("t\tx0\ty0\tx1\ty1\n0\t1\t0\t2\t0\n0.1\t0.9\t-0.1\t1.8\t-0.3\n");
        let loaded = [LoadedSeries { descriptor: &desc, table: &table, schema: &schema }];
        let figure = Comparison::new(View::Trajectories)
            .with_topology(Some(Topology::default()))
            .build(&loaded)
            .unwrap();

        let panel = &figure.panels[0];
        assert_eq!(panel.lines.len(), 2);
        // one anchor + start/end per body
        assert_eq!(panel.markers.len(), 5);
        assert_eq!(panel.markers[0].point, Point2::ORIGIN);
    }

    #[test]
    fn test_snapshot_uses_reconstructor() {
        let (desc, table, schema) = pendulum_series(
            "t\tx0\ty0\tx1\ty1\n0\t1\t0\t1\t1\n0.5\t1\t-0.1\t1\t0.9\n",
        );
        let loaded = [LoadedSeries { descriptor: &desc, table: &table, schema: &schema }];
        let topology = Topology::DualChord {
            bottom_anchor: Point2::ORIGIN,
            top_anchor: Point2::new(0.0, 1.0),
        };
        let figure = Comparison::new(View::Snapshot { frame: FrameSelector::Last })
            .with_topology(Some(topology))
            .build(&loaded)
            .unwrap();

        let panel = &figure.panels[0];
        assert_eq!(panel.lines.len(), 3);
        assert_eq!(panel.lines[0].points, vec![Point2::ORIGIN, Point2::new(1.0, -0.1)]);
        assert_eq!(panel.lines[1].points, vec![Point2::new(0.0, 1.0), Point2::new(1.0, 0.9)]);
        assert_eq!(panel.lines[2].label, "Tip Trajectory");
        assert_eq!(panel.lines[2].points.len(), 2);
    }

    #[test]
    fn test_snapshot_without_topology() {
        let (desc, table, schema) = pendulum_series("t\tx0\ty0\n0\t1\t0\n");
        let loaded = [LoadedSeries { descriptor: &desc, table: &table, schema: &schema }];
        assert!(
            Comparison::new(View::Snapshot { frame: FrameSelector::First })
                .build(&loaded)
                .is_err()
        );
    }
}

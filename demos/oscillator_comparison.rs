//! Compare three integrators on the unit oscillator.
//!
//! Writes solver-style output files to a temporary directory, then renders
//! phase and energy figures against the exact solution.

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use mechtrace::{
    analysis::{Color, Comparison, Dash, DEFAULT_FIGURE_SIZE, Reference, ReferenceCurve, View, render_png},
    schema::SeriesDescriptor,
    table::Delimiter,
};

const STEPS: usize = 200;
const DT: f64 = 2.0 * PI / 40.0;

/// (x, v) after one step of `x'' = -x`.
type Step = fn(f64, f64) -> (f64, f64);

fn explicit_euler(x: f64, v: f64) -> (f64, f64) {
    (x + DT * v, v - DT * x)
}

fn improved_euler(x: f64, v: f64) -> (f64, f64) {
    let (xp, vp) = explicit_euler(x, v);
    (x + DT / 2.0 * (v + vp), v - DT / 2.0 * (x + xp))
}

fn crank_nicolson(x: f64, v: f64) -> (f64, f64) {
    let h = DT / 2.0;
    let det = 1.0 + h * h;
    let (rx, rv) = (x + h * v, v - h * x);
    ((rx + h * rv) / det, (rv - h * rx) / det)
}

fn write_run(dir: &Path, name: &str, step: Step) -> PathBuf {
    let path = dir.join(name);
    let (mut x, mut v) = (1.0, 0.0);
    let mut text = String::new();
    for i in 0..=STEPS {
        text.push_str(&format!("{:.10} {:.10} {:.10}\n", i as f64 * DT, x, v));
        (x, v) = step(x, v);
    }
    fs::write(&path, text).expect("write oscillator run");
    path
}

fn main() {
    env_logger::init();
    println!("=== Oscillator Comparison ===\n");

    let dir = tempfile::tempdir().expect("temporary directory");
    let out = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));

    let runs = [
        ("ExplicitEuler.txt", "Explicit Euler", explicit_euler as Step, Color::RED, Dash::Solid),
        ("ImprovedEuler.txt", "Improved Euler", improved_euler, Color::GREEN, Dash::Dashed),
        ("CrankNicolson.txt", "Crank-Nicolson", crank_nicolson, Color::BLUE, Dash::Solid),
    ];
    let series: Vec<SeriesDescriptor> = runs
        .iter()
        .map(|&(file, label, step, color, style)| SeriesDescriptor {
            color,
            style,
            ..SeriesDescriptor::primary(write_run(dir.path(), file, step), Delimiter::Whitespace, label)
        })
        .collect();

    let figures = [
        (
            Comparison::new(View::Phase)
                .with_title("Phase Portrait")
                .with_reference(Some(Reference::new(ReferenceCurve::UnitCircle { samples: 200 }, "Exact"))),
            "oscillator_phase.png",
        ),
        (
            Comparison::new(View::Energy).with_title("Energy Drift"),
            "oscillator_energy.png",
        ),
    ];

    for (comparison, file) in figures {
        let start = Instant::now();
        let figure = comparison.render(&series).expect("render comparison");

        for line in figure.panels.iter().flat_map(|p| &p.lines) {
            if let (Some(first), Some(last)) = (line.points.first(), line.points.last()) {
                println!("  {:<16} {:>10.4} -> {:>10.4}", line.label, first.y, last.y);
            }
        }

        let path = out.join(file);
        render_png(&figure, &path, DEFAULT_FIGURE_SIZE).expect("write figure");
        println!("Wrote {} in {:.2?}\n", path.display(), start.elapsed());
    }
}

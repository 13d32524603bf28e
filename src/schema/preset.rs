//! Built-in scenes for the systems the companion simulators produce.

use std::f64::consts::PI;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::analysis::{
    Axes, BodySelection, Color, Dash, FrameSelector, Reference, ReferenceCurve, View,
};
use crate::geometry::{Point2, Topology};
use crate::table::Delimiter;

use super::{
    AnimationConfig, AnimationSettings, ArtifactConfig, ConfigError, EncoderKind, SceneConfig,
    SeriesDescriptor, ViewConfig,
};

/// A known mechanical system with its artifact names and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Chain,
    Crane,
    DoublePendulum,
    SpinningTop,
    MassSpring,
    MassSpringOde,
    Circuit,
    RungeKutta,
}

impl Preset {
    pub const ALL: [Preset; 8] = [
        Preset::Chain,
        Preset::Crane,
        Preset::DoublePendulum,
        Preset::SpinningTop,
        Preset::MassSpring,
        Preset::MassSpringOde,
        Preset::Circuit,
        Preset::RungeKutta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Chain => "chain",
            Preset::Crane => "crane",
            Preset::DoublePendulum => "double_pendulum",
            Preset::SpinningTop => "spinning_top",
            Preset::MassSpring => "mass_spring",
            Preset::MassSpringOde => "mass_spring_ode",
            Preset::Circuit => "circuit",
            Preset::RungeKutta => "runge_kutta",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let key = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    /// Scene with paths relative to the directory holding the artifacts.
    pub fn scene(self) -> SceneConfig {
        match self {
            Preset::Chain => chain(),
            Preset::Crane => crane(),
            Preset::DoublePendulum => double_pendulum(),
            Preset::SpinningTop => spinning_top(),
            Preset::MassSpring => mass_spring(),
            Preset::MassSpringOde => mass_spring_ode(),
            Preset::Circuit => circuit(),
            Preset::RungeKutta => runge_kutta(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

fn tsv(path: &str) -> Option<ArtifactConfig> {
    Some(ArtifactConfig {
        path: PathBuf::from(path),
        delimiter: Delimiter::Tab,
    })
}

fn gif(output: &str, title: &str, stride: usize, margin: f64) -> Option<AnimationConfig> {
    Some(AnimationConfig {
        settings: AnimationSettings {
            stride,
            margin,
            title: title.to_string(),
            ..Default::default()
        },
        output: PathBuf::from(output),
        encoder: EncoderKind::Gif,
        ..Default::default()
    })
}

fn figure(view: View, title: &str, output: &str, size: (u32, u32)) -> ViewConfig {
    ViewConfig {
        title: Some(title.to_string()),
        output: Some(PathBuf::from(output)),
        width: size.0,
        height: size.1,
        ..ViewConfig::new(view)
    }
}

fn series(path: &str, label: &str, color: Color, style: Dash, width: f64, opacity: f64) -> SeriesDescriptor {
    SeriesDescriptor {
        path: PathBuf::from(path),
        delimiter: Delimiter::Whitespace,
        label: label.to_string(),
        color,
        style,
        width,
        opacity,
    }
}

fn chain() -> SceneConfig {
    SceneConfig {
        name: "chain".to_string(),
        artifact: tsv("chain_simulation.tsv"),
        topology: Some(Topology::LinearChain {
            anchor: Point2::ORIGIN,
        }),
        animation: gif("chain.gif", "Simulation Animation (Chain)", 5, 0.5),
        views: vec![
            figure(
                View::TimeHistory {
                    bodies: BodySelection::All,
                    axes: Axes::Both,
                },
                "Time History of Positions",
                "plot_time_history.png",
                (1000, 800),
            ),
            figure(
                View::Trajectories,
                "2D Trajectories of Masses",
                "plot_trajectories.png",
                (800, 800),
            ),
        ],
    }
}

fn crane() -> SceneConfig {
    SceneConfig {
        name: "crane".to_string(),
        artifact: tsv("crane_simulation.tsv"),
        topology: Some(Topology::DualChord {
            bottom_anchor: Point2::ORIGIN,
            top_anchor: Point2::new(0.0, 1.0),
        }),
        animation: gif("crane.gif", "Simulation Animation (Crane Structure)", 5, 1.0).map(|mut a| {
            a.width = 1000;
            a.height = 600;
            a
        }),
        views: vec![
            figure(
                View::TimeHistory {
                    bodies: BodySelection::Last(2),
                    axes: Axes::Y,
                },
                "Vertical Vibration of Crane Tip",
                "crane_time_history.png",
                (1000, 600),
            ),
            figure(
                View::Snapshot {
                    frame: FrameSelector::Last,
                },
                "Crane Structure Deflection",
                "crane_trajectories.png",
                (1000, 600),
            ),
        ],
    }
}

fn double_pendulum() -> SceneConfig {
    SceneConfig {
        name: "double_pendulum".to_string(),
        artifact: tsv("double_pendulum_simulation.tsv"),
        topology: Some(Topology::LinearChain {
            anchor: Point2::ORIGIN,
        }),
        animation: gif("double_pendulum.gif", "Double Pendulum Simulation", 2, 0.5).map(|mut a| {
            a.settings.show_trace = true;
            a
        }),
        views: vec![figure(
            View::ConstraintForce,
            "Lagrange Multipliers (Constraint Forces)",
            "double_pendulum_constraint_forces.png",
            (1000, 500),
        )],
    }
}

fn spinning_top() -> SceneConfig {
    SceneConfig {
        name: "spinning_top".to_string(),
        artifact: tsv("spinning_top_simulation.tsv"),
        topology: Some(Topology::TriangleSpokes {
            pivot: Point2::ORIGIN,
        }),
        animation: gif("spinning_top.gif", "Spinning Top Animation", 2, 0.5),
        views: Vec::new(),
    }
}

fn mass_spring() -> SceneConfig {
    let runs = vec![
        series("MassspringImprovedEuler.txt", "Improved Euler", Color::RED, Dash::Solid, 2.0, 0.9),
        series("MassspringImplicitEuler.txt", "Implicit Euler", Color::GREEN, Dash::Dashed, 4.0, 0.9),
        series("MassspringCrankNicolson.txt", "Crank-Nicolson", Color::BLUE, Dash::Solid, 2.0, 0.9),
    ];
    SceneConfig {
        name: "mass_spring".to_string(),
        views: vec![
            ViewConfig {
                series: runs.clone(),
                ..figure(
                    View::Phase,
                    "Mass-Spring: Phase Portrait (Steps = 200)",
                    "massspring_phase.png",
                    (800, 800),
                )
            },
            ViewConfig {
                series: runs,
                ..figure(
                    View::Energy,
                    "Mass-Spring: Energy Conservation (Steps = 200)",
                    "massspring_energy.png",
                    (1000, 600),
                )
            },
        ],
        ..Default::default()
    }
}

/// Single `t x v` run: time evolution plus phase plot.
fn mass_spring_ode() -> SceneConfig {
    SceneConfig {
        name: "mass_spring_ode".to_string(),
        artifact: Some(ArtifactConfig {
            path: PathBuf::from("output_test_ode.txt"),
            delimiter: Delimiter::Whitespace,
        }),
        views: vec![
            ViewConfig {
                x_label: Some("time".to_string()),
                y_label: Some("value".to_string()),
                ..figure(
                    View::StateEvolution,
                    "Mass-Spring System Time Evolution",
                    "massspring_time_evolution.png",
                    (1000, 600),
                )
            },
            ViewConfig {
                series: vec![SeriesDescriptor {
                    color: Color::BLUE,
                    width: 1.5,
                    opacity: 1.0,
                    ..SeriesDescriptor::primary("output_test_ode.txt", Delimiter::Whitespace, "phase plot")
                }],
                x_label: Some("position".to_string()),
                y_label: Some("velocity".to_string()),
                ..figure(
                    View::Phase,
                    "Mass-Spring System Phase Plot",
                    "massspring_phase_plot.png",
                    (800, 800),
                )
            },
        ],
        ..Default::default()
    }
}

fn circuit() -> SceneConfig {
    let source = Reference {
        dash: Dash::Dotted,
        width: 1.5,
        opacity: 0.6,
        ..Reference::new(
            ReferenceCurve::Cosine {
                amplitude: 1.0,
                angular_frequency: 100.0 * PI,
                start: 0.0,
                end: 0.5,
                samples: 2000,
            },
            "Source U0(t)",
        )
    };
    SceneConfig {
        name: "circuit".to_string(),
        views: vec![ViewConfig {
            series: vec![
                series("CircuitImprovedEuler.txt", "Improved Euler", Color::RED, Dash::Solid, 6.0, 0.8),
                series("CircuitImplicitEuler.txt", "Implicit Euler", Color::GREEN, Dash::Dashed, 4.0, 0.8),
                series("CircuitCrankNicolson.txt", "Crank-Nicolson", Color::BLUE, Dash::Solid, 2.0, 0.8),
            ],
            reference: Some(source),
            x_label: Some("Time (s)".to_string()),
            y_label: Some("Voltage (V)".to_string()),
            ..figure(
                View::Signal,
                "RC-Circuit: Capacitor Voltage vs Time (Steps = 80)",
                "circuit_voltage.png",
                (1000, 600),
            )
        }],
        ..Default::default()
    }
}

fn runge_kutta() -> SceneConfig {
    let runs = vec![
        series("output_GL_2.txt", "Gauss-Legendre (2 stages)", Color::BLUE, Dash::Solid, 6.0, 1.0),
        series("output_GL_3.txt", "Gauss-Legendre (3 stages)", Color::ORANGE, Dash::Solid, 4.0, 1.0),
        series("output_Radau_2.txt", "Radau IIA (2 stages)", Color::GREEN, Dash::Dashed, 2.0, 1.0),
        series("output_Radau_3.txt", "Radau IIA (3 stages)", Color::RED, Dash::Dotted, 2.0, 1.0),
    ];
    SceneConfig {
        name: "runge_kutta".to_string(),
        views: vec![
            ViewConfig {
                series: runs.clone(),
                x_label: Some("Time".to_string()),
                y_label: Some("Total Energy".to_string()),
                ..figure(
                    View::Energy,
                    "Energy Conservation Check (100 steps)",
                    "rk_energy.png",
                    (1000, 600),
                )
            },
            ViewConfig {
                series: runs,
                reference: Some(Reference::new(
                    ReferenceCurve::UnitCircle { samples: 200 },
                    "Exact Solution",
                )),
                x_label: Some("Position".to_string()),
                y_label: Some("Velocity".to_string()),
                ..figure(
                    View::Phase,
                    "Phase Space Comparison (100 steps)",
                    "rk_phase.png",
                    (800, 800),
                )
            },
        ],
        ..Default::default()
    }
}

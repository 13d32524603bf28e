//! Static view kinds.

use serde::{Deserialize, Serialize};

/// Row used by a snapshot view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSelector {
    First,
    #[default]
    Last,
    Index(usize),
}

impl FrameSelector {
    /// Concrete row for a table of `rows` rows; `None` if there is no such row.
    pub fn resolve(self, rows: usize) -> Option<usize> {
        let frame = match self {
            FrameSelector::First => 0,
            FrameSelector::Last => rows.checked_sub(1)?,
            FrameSelector::Index(i) => i,
        };
        (frame < rows).then_some(frame)
    }
}

/// Which bodies a time-history view draws.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySelection {
    #[default]
    All,
    /// The last `n` bodies (e.g. the two tip masses of a crane).
    Last(usize),
    /// Explicit positions in the schema's body order.
    Indices(Vec<usize>),
}

impl BodySelection {
    /// Body positions selected out of `count`, ascending, out-of-range dropped.
    pub fn select(&self, count: usize) -> Vec<usize> {
        match self {
            BodySelection::All => (0..count).collect(),
            BodySelection::Last(n) => (count.saturating_sub(*n)..count).collect(),
            BodySelection::Indices(indices) => {
                let mut picked: Vec<usize> = indices.iter().copied().filter(|&i| i < count).collect();
                picked.sort_unstable();
                picked.dedup();
                picked
            }
        }
    }
}

/// Spatial axes drawn by a time-history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axes {
    #[default]
    Both,
    X,
    Y,
}

/// Static comparison view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum View {
    /// Position against velocity, one line per series.
    Phase,
    /// Unit quadratic energy against time.
    Energy,
    /// Position against time (driven circuits, single-coordinate outputs).
    Signal,
    /// Position and velocity against time on one panel.
    StateEvolution,
    /// One panel per spatial axis, one line per body.
    TimeHistory {
        #[serde(default)]
        bodies: BodySelection,
        #[serde(default)]
        axes: Axes,
    },
    /// `lam*` constraint-force columns against time.
    ConstraintForce,
    /// 2D path of every body with anchors and start/end markers.
    Trajectories,
    /// Structure geometry at one frame plus the last body's path.
    Snapshot {
        #[serde(default)]
        frame: FrameSelector,
    },
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Phase => "phase",
            View::Energy => "energy",
            View::Signal => "signal",
            View::StateEvolution => "state_evolution",
            View::TimeHistory { .. } => "time_history",
            View::ConstraintForce => "constraint_force",
            View::Trajectories => "trajectories",
            View::Snapshot { .. } => "snapshot",
        }
    }

    /// Default axis captions (x, y).
    pub fn axis_labels(&self) -> (&'static str, &'static str) {
        match self {
            View::Phase => ("Position (x)", "Velocity (v)"),
            View::Energy => ("Time (t)", "Total Energy (E)"),
            View::Signal | View::StateEvolution => ("Time (t)", "Value"),
            View::TimeHistory { .. } => ("Time [s]", "Position [m]"),
            View::ConstraintForce => ("Time [s]", "Force / Length"),
            View::Trajectories | View::Snapshot { .. } => ("X Position [m]", "Y Position [m]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_selector() {
        assert_eq!(FrameSelector::First.resolve(5), Some(0));
        assert_eq!(FrameSelector::Last.resolve(5), Some(4));
        assert_eq!(FrameSelector::Index(5).resolve(5), None);
        assert_eq!(FrameSelector::Last.resolve(0), None);
    }

    #[test]
    fn test_body_selection() {
        assert_eq!(BodySelection::All.select(3), vec![0, 1, 2]);
        assert_eq!(BodySelection::Last(2).select(6), vec![4, 5]);
        assert_eq!(BodySelection::Last(9).select(2), vec![0, 1]);
        assert_eq!(BodySelection::Indices(vec![3, 0, 3, 7]).select(4), vec![0, 3]);
    }

    #[test]
    fn test_view_json() {
        let view: View = serde_json::from_str(
            r#"{"type": "TimeHistory", "bodies": {"last": 2}, "axes": "y"}"#,
        )
        .unwrap();
        assert_eq!(
            view,
            View::TimeHistory {
                bodies: BodySelection::Last(2),
                axes: Axes::Y
            }
        );
        let view: View = serde_json::from_str(r#"{"type": "Snapshot"}"#).unwrap();
        assert_eq!(view, View::Snapshot { frame: FrameSelector::Last });
    }
}

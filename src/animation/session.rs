//! Frame-decimated animation of a reconstructed structure.

use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{Bounds, Topology, body_position};
use crate::schema::AnimationSettings;
use crate::table::{Schema, Table};

use super::{EncodeStats, FrameData, FrameEncoder, FrameLayout, TraceBuffer};

/// Time annotation drawn on every frame.
pub fn time_label(t: f64) -> String {
    format!("Time: {:.2} s", t)
}

/// Rows visited by an animation: `0, stride, 2*stride, ...` below `rows`.
pub fn frame_sequence(rows: usize, stride: usize) -> Vec<usize> {
    (0..rows).step_by(stride.max(1)).collect()
}

/// Lifecycle of an [`AnimationSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Priming,
    Running,
    Finished,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Priming => "priming",
            SessionState::Running => "running",
            SessionState::Finished => "finished",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationReport {
    /// Rows that became frames, in emission order.
    pub rows: Vec<usize>,
    pub bounds: Bounds,
    pub stats: EncodeStats,
}

/// One run of an animation over an immutable table.
///
/// `Idle -> Priming -> Running -> Finished`. Priming validates everything
/// before the encoder is started, so a failed prime leaves no output behind.
/// Any failure after that aborts the encoder and ends the session. A session
/// is single-use: construct a new one to animate again.
pub struct AnimationSession<'a> {
    table: &'a Table,
    schema: &'a Schema,
    topology: Topology,
    settings: AnimationSettings,
    state: SessionState,
    frames: Vec<usize>,
    cursor: usize,
    tracked: usize,
    trace: TraceBuffer,
    layout: Option<FrameLayout>,
}

impl<'a> AnimationSession<'a> {
    pub fn new(
        table: &'a Table,
        schema: &'a Schema,
        topology: Topology,
        settings: AnimationSettings,
    ) -> Self {
        let trace = TraceBuffer::new(settings.trace_capacity);
        Self {
            table,
            schema,
            topology,
            settings,
            state: SessionState::Idle,
            frames: Vec::new(),
            cursor: 0,
            tracked: 0,
            trace,
            layout: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Frame rows; empty until primed.
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    pub fn layout(&self) -> Option<&FrameLayout> {
        self.layout.as_ref()
    }

    pub fn trace(&self) -> &TraceBuffer {
        &self.trace
    }

    /// Frames not yet emitted.
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }

    fn ensure_state(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected: expected.name(),
                found: self.state.name(),
            })
        }
    }

    /// Compute the frame sequence and bounds, then start the encoder.
    pub fn prime<E: FrameEncoder + ?Sized>(&mut self, encoder: &mut E) -> Result<()> {
        self.ensure_state(SessionState::Idle)?;
        self.state = SessionState::Priming;

        let layout = match self.plan() {
            Ok(layout) => layout,
            Err(e) => {
                self.state = SessionState::Finished;
                return Err(e);
            }
        };

        if let Err(e) = encoder.begin(&layout) {
            encoder.abort();
            self.state = SessionState::Finished;
            return Err(encoding_failed(e));
        }

        log::info!(
            "Animating {} of {} rows ({}, stride {}) from '{}'",
            self.frames.len(),
            self.table.row_count(),
            self.topology.name(),
            self.settings.stride,
            self.table.source().display()
        );
        self.layout = Some(layout);
        self.state = SessionState::Running;
        Ok(())
    }

    fn plan(&mut self) -> Result<FrameLayout> {
        self.settings.validate()?;
        self.topology.validate(self.schema)?;

        let rows = self.table.row_count();
        if rows == 0 {
            return Err(Error::SchemaMismatch(format!(
                "{}: no rows to animate",
                self.table.source().display()
            )));
        }

        let bodies = self.schema.body_count();
        let tracked = self.settings.tracked_body.unwrap_or(bodies.saturating_sub(1));
        if tracked >= bodies {
            return Err(Error::SchemaMismatch(format!(
                "tracked body {} out of range ({} bodies)",
                tracked, bodies
            )));
        }

        let anchors = self.topology.anchors();
        let bounds = Bounds::from_table(self.table, self.schema, &anchors, self.settings.margin);
        self.frames = frame_sequence(rows, self.settings.stride);
        self.tracked = tracked;
        self.cursor = 0;
        self.trace.clear();

        Ok(FrameLayout {
            title: self.settings.title.clone(),
            bounds,
            fps: self.settings.fps,
            frame_count: self.frames.len(),
            anchors,
            show_trace: self.settings.show_trace,
        })
    }

    /// Emit the next frame. Returns its row, or `None` once every frame has
    /// been emitted.
    pub fn tick<E: FrameEncoder + ?Sized>(&mut self, encoder: &mut E) -> Result<Option<usize>> {
        self.ensure_state(SessionState::Running)?;
        let Some(&row) = self.frames.get(self.cursor) else {
            return Ok(None);
        };

        let frame = match self.render(row) {
            Ok(frame) => frame,
            Err(e) => {
                self.fail(encoder);
                return Err(e);
            }
        };
        if let Err(e) = encoder.encode(&frame) {
            self.fail(encoder);
            return Err(encoding_failed(e));
        }

        log::debug!("Frame {}/{} (row {})", self.cursor + 1, self.frames.len(), row);
        self.cursor += 1;
        Ok(Some(row))
    }

    fn render(&mut self, row: usize) -> Result<FrameData> {
        // validated once in plan()
        let shape = self.topology.reconstruct_validated(self.table, self.schema, row)?;
        let tip = body_position(self.table, self.schema, self.tracked, row)?;
        let time = self
            .table
            .value(self.schema.time, row)
            .ok_or_else(|| Error::SchemaMismatch("no time column".to_string()))?;

        self.trace.push(tip);
        Ok(FrameData {
            index: self.cursor,
            row,
            time,
            label: time_label(time),
            shape,
            trace: self.trace.to_vec(),
        })
    }

    fn fail<E: FrameEncoder + ?Sized>(&mut self, encoder: &mut E) {
        encoder.abort();
        self.state = SessionState::Finished;
    }

    /// Emit any remaining frames and finalize the encoder.
    pub fn finish<E: FrameEncoder + ?Sized>(mut self, encoder: &mut E) -> Result<AnimationReport> {
        self.ensure_state(SessionState::Running)?;
        while self.tick(encoder)?.is_some() {}

        let stats = match encoder.finish() {
            Ok(stats) => stats,
            Err(e) => {
                self.fail(encoder);
                return Err(encoding_failed(e));
            }
        };
        self.state = SessionState::Finished;
        log::info!("Animation finished: {}", stats);

        Ok(AnimationReport {
            rows: self.frames,
            bounds: self.layout.map(|l| l.bounds).unwrap_or(Bounds {
                min: Default::default(),
                max: Default::default(),
            }),
            stats,
        })
    }

    /// Prime, emit every frame and finish.
    pub fn run<E: FrameEncoder + ?Sized>(mut self, encoder: &mut E) -> Result<AnimationReport> {
        self.prime(encoder)?;
        self.finish(encoder)
    }
}

fn encoding_failed(e: Error) -> Error {
    match e {
        Error::EncodingFailed(_) => e,
        other => Error::EncodingFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationRecorder, MemoryEncoder, RecorderConfig};
    use crate::geometry::{Part, Point2};
    use tempfile::tempdir;

    /// t, x0, y0, x1, y1 with `rows` rows; body 1 sits at (1 + r, -1 - r).
    fn two_body_table(rows: usize) -> Table {
        let r: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        Table::from_columns(vec![
            ("t", r.iter().map(|i| i * 0.1).collect()),
            ("x0", vec![1.0; rows]),
            ("y0", vec![0.0; rows]),
            ("x1", r.iter().map(|i| 1.0 + i).collect()),
            ("y1", r.iter().map(|i| -1.0 - i).collect()),
        ])
        .unwrap()
    }

    fn settings(stride: usize) -> AnimationSettings {
        AnimationSettings {
            stride,
            ..Default::default()
        }
    }

    /// Fails on the `fail_at`-th encode, or on finish when `None`.
    #[derive(Default)]
    struct FailingEncoder {
        fail_at: Option<usize>,
        encoded: usize,
        begun: bool,
        aborted: bool,
    }

    impl FrameEncoder for FailingEncoder {
        fn begin(&mut self, _layout: &FrameLayout) -> Result<()> {
            self.begun = true;
            Ok(())
        }

        fn encode(&mut self, _frame: &FrameData) -> Result<()> {
            if self.fail_at == Some(self.encoded) {
                return Err(Error::Render("disk full".to_string()));
            }
            self.encoded += 1;
            Ok(())
        }

        fn finish(&mut self) -> Result<EncodeStats> {
            Err(Error::EncodingFailed("cannot finalize".to_string()))
        }

        fn abort(&mut self) {
            self.aborted = true;
        }
    }

    #[test]
    fn test_stride_five_over_ten_rows() {
        let table = two_body_table(10);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = MemoryEncoder::new();

        let report = AnimationSession::new(&table, &schema, Topology::default(), settings(5))
            .run(&mut encoder)
            .unwrap();

        assert_eq!(report.rows, vec![0, 5]);
        assert_eq!(report.stats.frames, 2);
        let rows: Vec<usize> = encoder.frames().iter().map(|f| f.row).collect();
        assert_eq!(rows, vec![0, 5]);
        assert!(encoder.is_finished());
    }

    #[test]
    fn test_frame_contents() {
        let table = two_body_table(10);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = MemoryEncoder::new();
        AnimationSession::new(&table, &schema, Topology::default(), settings(5))
            .run(&mut encoder)
            .unwrap();

        let frame = &encoder.frames()[1];
        assert_eq!(frame.index, 1);
        assert_eq!(frame.label, "Time: 0.50 s");
        let chain = frame.shape.part(Part::Chain).unwrap();
        assert_eq!(
            chain.points,
            vec![Point2::ORIGIN, Point2::new(1.0, 0.0), Point2::new(6.0, -6.0)]
        );
        assert_eq!(frame.trace, vec![Point2::new(1.0, -1.0), Point2::new(6.0, -6.0)]);
    }

    #[test]
    fn test_layout_bounds_cover_anchor() {
        let table = two_body_table(4);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = MemoryEncoder::new();
        let anchor = Point2::new(-3.0, 2.0);
        let mut session = AnimationSession::new(
            &table,
            &schema,
            Topology::LinearChain { anchor },
            settings(1),
        );
        session.prime(&mut encoder).unwrap();

        let layout = encoder.layout().unwrap();
        assert!(layout.bounds.contains(anchor));
        assert!(layout.bounds.contains(Point2::new(4.0, -4.0)));
        assert_eq!(layout.frame_count, 4);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_trace_is_bounded() {
        let table = two_body_table(10);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = MemoryEncoder::new();
        let settings = AnimationSettings {
            trace_capacity: 3,
            ..settings(1)
        };
        let mut session = AnimationSession::new(&table, &schema, Topology::default(), settings);
        session.prime(&mut encoder).unwrap();
        while session.tick(&mut encoder).unwrap().is_some() {}

        assert_eq!(session.trace().len(), 3);
        let last = &encoder.frames()[9];
        assert_eq!(
            last.trace,
            vec![Point2::new(8.0, -8.0), Point2::new(9.0, -9.0), Point2::new(10.0, -10.0)]
        );
        assert_eq!(encoder.frames()[1].trace.len(), 2);
    }

    #[test]
    fn test_prime_failure_never_begins() {
        let table = two_body_table(10);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = MemoryEncoder::new();

        // three bodies required
        let mut session = AnimationSession::new(
            &table,
            &schema,
            Topology::TriangleSpokes { pivot: Point2::ORIGIN },
            settings(1),
        );
        assert!(matches!(
            session.prime(&mut encoder),
            Err(Error::SchemaMismatch(_))
        ));
        assert!(encoder.layout().is_none());
        assert_eq!(session.state(), SessionState::Finished);
        assert!(matches!(
            session.tick(&mut encoder),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_prime_failure_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.mtra");
        let table = two_body_table(10);
        let schema = Schema::resolve(&table).unwrap();
        let mut recorder = AnimationRecorder::new(&path, RecorderConfig::default());

        let result = AnimationSession::new(&table, &schema, Topology::default(), settings(0))
            .run(&mut recorder);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_tracked_body_out_of_range() {
        let table = two_body_table(3);
        let schema = Schema::resolve(&table).unwrap();
        let settings = AnimationSettings {
            tracked_body: Some(2),
            ..Default::default()
        };
        let result = AnimationSession::new(&table, &schema, Topology::default(), settings)
            .run(&mut MemoryEncoder::new());
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_empty_table_rejected() {
        let table = two_body_table(0);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = MemoryEncoder::new();
        let result =
            AnimationSession::new(&table, &schema, Topology::default(), settings(1)).run(&mut encoder);
        assert!(result.is_err());
        assert!(encoder.layout().is_none());
    }

    #[test]
    fn test_tick_before_prime() {
        let table = two_body_table(2);
        let schema = Schema::resolve(&table).unwrap();
        let mut session = AnimationSession::new(&table, &schema, Topology::default(), settings(1));
        assert!(matches!(
            session.tick(&mut MemoryEncoder::new()),
            Err(Error::InvalidState {
                expected: "running",
                found: "idle"
            })
        ));
    }

    #[test]
    fn test_prime_twice_rejected() {
        let table = two_body_table(2);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = MemoryEncoder::new();
        let mut session = AnimationSession::new(&table, &schema, Topology::default(), settings(1));
        session.prime(&mut encoder).unwrap();
        assert!(matches!(
            session.prime(&mut encoder),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_encode_failure_aborts() {
        let table = two_body_table(10);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = FailingEncoder {
            fail_at: Some(1),
            ..Default::default()
        };

        let result =
            AnimationSession::new(&table, &schema, Topology::default(), settings(2)).run(&mut encoder);
        match result {
            Err(Error::EncodingFailed(msg)) => assert!(msg.contains("disk full")),
            other => panic!("expected EncodingFailed, got {:?}", other.map(|r| r.rows)),
        }
        assert!(encoder.begun);
        assert!(encoder.aborted);
        assert_eq!(encoder.encoded, 1);
    }

    #[test]
    fn test_finish_failure_aborts() {
        let table = two_body_table(4);
        let schema = Schema::resolve(&table).unwrap();
        let mut encoder = FailingEncoder::default();

        let result =
            AnimationSession::new(&table, &schema, Topology::default(), settings(1)).run(&mut encoder);
        assert!(matches!(result, Err(Error::EncodingFailed(_))));
        assert_eq!(encoder.encoded, 4);
        assert!(encoder.aborted);
    }

    #[test]
    fn test_frame_sequence() {
        assert_eq!(frame_sequence(10, 5), vec![0, 5]);
        assert_eq!(frame_sequence(11, 5), vec![0, 5, 10]);
        assert_eq!(frame_sequence(3, 1), vec![0, 1, 2]);
        assert!(frame_sequence(0, 2).is_empty());
    }
}

//! A configured mechanical system: its figures and its animation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{Comparison, Diagnostic, Figure, LoadedSeries, render_png};
use crate::animation::{
    AnimationRecorder, AnimationReport, AnimationSession, CompressionType, FrameEncoder,
    GifEncoder, RecorderConfig,
};
use crate::error::{Error, Result};
use crate::schema::{EncoderKind, Preset, SceneConfig, SeriesDescriptor, ViewConfig};
use crate::table::{Schema, Table};

/// Primary artifact with its resolved schema.
type Primary = (Table, Schema);

/// Outcome of one static view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewReport {
    pub title: String,
    /// PNG written, if the view has an output.
    pub output: Option<PathBuf>,
    /// Lines drawn across all panels.
    pub lines: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of [`Scene::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneReport {
    pub name: String,
    pub views: Vec<ViewReport>,
    pub animation: Option<AnimationReport>,
}

impl SceneReport {
    /// Every skipped series across all views.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.views.iter().flat_map(|v| v.diagnostics.iter())
    }
}

impl fmt::Display for SceneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scene '{}'", self.name)?;
        for view in &self.views {
            write!(f, "  {}: {} lines", view.title, view.lines)?;
            if let Some(output) = &view.output {
                write!(f, " -> {}", output.display())?;
            }
            writeln!(f)?;
            for diagnostic in &view.diagnostics {
                writeln!(f, "    skipped {}", diagnostic)?;
            }
        }
        if let Some(animation) = &self.animation {
            writeln!(f, "  animation: {}", animation.stats)?;
        }
        Ok(())
    }
}

/// A validated scene with paths resolved against a base directory.
#[derive(Debug, Clone)]
pub struct Scene {
    config: SceneConfig,
    base_dir: PathBuf,
}

impl Scene {
    pub fn new(config: SceneConfig, base_dir: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            base_dir: base_dir.into(),
        })
    }

    /// Load a JSON scene; relative paths resolve against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: SceneConfig = serde_json::from_str(&text).map_err(|e| Error::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::new(config, base_dir)
    }

    pub fn from_preset(preset: Preset, base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(preset.scene(), base_dir)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Series of a view with resolved paths.
    fn series(&self, view: &ViewConfig) -> Vec<SeriesDescriptor> {
        view.series
            .iter()
            .map(|s| SeriesDescriptor {
                path: self.resolve(&s.path),
                ..s.clone()
            })
            .collect()
    }

    /// Whether any view plots the primary artifact.
    fn views_need_primary(&self) -> bool {
        self.config.views.iter().any(|v| v.series.is_empty())
    }

    /// Build one view's figure without writing it.
    pub fn figure(&self, view: &ViewConfig) -> Result<Figure> {
        let primary = if view.series.is_empty() {
            Some(self.load_primary()?)
        } else {
            None
        };
        self.build_figure(view, primary.as_ref())
    }

    fn build_figure(&self, view: &ViewConfig, primary: Option<&Primary>) -> Result<Figure> {
        let mut comparison = Comparison::new(view.view.clone())
            .with_reference(view.reference.clone())
            .with_topology(self.config.topology);
        if let Some(title) = &view.title {
            comparison = comparison.with_title(title.clone());
        }

        let mut figure = match (view.series.is_empty(), primary, &self.config.artifact) {
            (true, Some((table, schema)), Some(artifact)) => {
                let descriptor = SeriesDescriptor::primary(
                    self.resolve(&artifact.path),
                    artifact.delimiter,
                    &self.config.name,
                );
                comparison.build(&[LoadedSeries {
                    descriptor: &descriptor,
                    table,
                    schema,
                }])?
            }
            _ => comparison.render(&self.series(view))?,
        };

        let single = figure.panels.len() == 1;
        for panel in &mut figure.panels {
            if let Some(x_label) = &view.x_label {
                panel.x_label = x_label.clone();
            }
            if let (Some(y_label), true) = (&view.y_label, single) {
                panel.y_label = y_label.clone();
            }
        }
        Ok(figure)
    }

    /// Build every configured figure, writing PNGs for views with an output.
    ///
    /// Missing comparison series are reported per view. A missing primary
    /// artifact fails before any figure is written.
    pub fn render_views(&self) -> Result<Vec<ViewReport>> {
        let primary = if self.views_need_primary() {
            Some(self.load_primary()?)
        } else {
            None
        };
        self.render_views_with(primary.as_ref())
    }

    fn render_views_with(&self, primary: Option<&Primary>) -> Result<Vec<ViewReport>> {
        let mut reports = Vec::with_capacity(self.config.views.len());
        for view in &self.config.views {
            let figure = self.build_figure(view, primary)?;
            let output = match &view.output {
                Some(output) => {
                    let path = self.resolve(output);
                    render_png(&figure, &path, (view.width, view.height))?;
                    Some(path)
                }
                None => None,
            };
            reports.push(ViewReport {
                title: figure.title.clone(),
                output,
                lines: figure.panels.iter().map(|p| p.lines.len()).sum(),
                diagnostics: figure.diagnostics,
            });
        }
        Ok(reports)
    }

    /// Load and resolve the primary artifact.
    pub fn load_primary(&self) -> Result<(Table, Schema)> {
        let artifact = self.config.artifact.as_ref().ok_or_else(|| {
            Error::SchemaMismatch(format!("scene '{}' has no primary artifact", self.config.name))
        })?;
        let table = Table::load(self.resolve(&artifact.path), artifact.delimiter)?;
        let schema = Schema::resolve(&table)?;
        Ok((table, schema))
    }

    /// Encoder for the configured animation output.
    pub fn encoder(&self) -> Option<Box<dyn FrameEncoder>> {
        let animation = self.config.animation.as_ref()?;
        let path = self.resolve(&animation.output);
        Some(match animation.encoder {
            EncoderKind::Gif => Box::new(GifEncoder::new(path, (animation.width, animation.height))),
            EncoderKind::Archive => {
                let compression = if animation.compress {
                    CompressionType::Lz4
                } else {
                    CompressionType::None
                };
                Box::new(AnimationRecorder::new(path, RecorderConfig { compression }))
            }
        })
    }

    /// Run the configured animation into `encoder`.
    ///
    /// Returns `None` when the scene has no animation. A missing primary
    /// artifact fails before the encoder is started.
    pub fn animate<E: FrameEncoder + ?Sized>(&self, encoder: &mut E) -> Result<Option<AnimationReport>> {
        if self.config.animation.is_none() {
            return Ok(None);
        }
        let primary = self.load_primary()?;
        self.animate_with(encoder, &primary)
    }

    fn animate_with<E: FrameEncoder + ?Sized>(
        &self,
        encoder: &mut E,
        (table, schema): &Primary,
    ) -> Result<Option<AnimationReport>> {
        let (Some(animation), Some(topology)) = (&self.config.animation, self.config.topology) else {
            return Ok(None);
        };
        AnimationSession::new(table, schema, topology, animation.settings.clone())
            .run(encoder)
            .map(Some)
    }

    /// Render every view, then the animation with its configured encoder.
    ///
    /// The primary artifact is loaded once, up front, so a missing or
    /// malformed primary leaves no output behind.
    pub fn run(&self) -> Result<SceneReport> {
        let primary = match &self.config.artifact {
            Some(_) => Some(self.load_primary()?),
            None => None,
        };
        let views = self.render_views_with(primary.as_ref())?;
        let animation = match (self.encoder(), &primary) {
            (Some(mut encoder), Some(primary)) => self.animate_with(encoder.as_mut(), primary)?,
            _ => None,
        };
        Ok(SceneReport {
            name: self.config.name.clone(),
            views,
            animation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::View;
    use crate::animation::MemoryEncoder;
    use crate::schema::{AnimationConfig, AnimationSettings, ArtifactConfig};
    use crate::table::Delimiter;
    use tempfile::tempdir;

    fn write_chain(dir: &Path) {
        let mut text = String::from("t\tx0\ty0\tx1\ty1\n");
        for i in 0..20 {
            let t = i as f64 * 0.05;
            text.push_str(&format!("{}\t{}\t{}\t{}\t{}\n", t, t.sin(), -t.cos(), 2.0 * t.sin(), -2.0 * t.cos()));
        }
        fs::write(dir.join("chain_simulation.tsv"), text).unwrap();
    }

    fn chain_scene() -> SceneConfig {
        let mut scene = Preset::Chain.scene();
        for view in &mut scene.views {
            view.output = None;
        }
        scene
    }

    #[test]
    fn test_animate_from_base_dir() {
        let dir = tempdir().unwrap();
        write_chain(dir.path());
        let scene = Scene::new(chain_scene(), dir.path()).unwrap();

        let mut encoder = MemoryEncoder::new();
        let report = scene.animate(&mut encoder).unwrap().unwrap();
        assert_eq!(report.rows, vec![0, 5, 10, 15]);
        assert_eq!(encoder.frames().len(), 4);
        assert_eq!(encoder.layout().unwrap().title, "Simulation Animation (Chain)");
    }

    #[test]
    fn test_missing_primary_aborts_before_encoder() {
        let dir = tempdir().unwrap();
        let scene = Scene::new(chain_scene(), dir.path()).unwrap();
        let mut encoder = MemoryEncoder::new();

        let err = scene.animate(&mut encoder).unwrap_err();
        assert!(err.is_missing_artifact());
        assert!(encoder.layout().is_none());
    }

    #[test]
    fn test_render_views_fails_before_writing_without_primary() {
        let dir = tempdir().unwrap();
        let scene = Scene::from_preset(Preset::Chain, dir.path()).unwrap();

        assert!(scene.render_views().unwrap_err().is_missing_artifact());
        assert!(!dir.path().join("plot_time_history.png").exists());
        assert!(!dir.path().join("plot_trajectories.png").exists());
    }

    #[test]
    fn test_views_use_primary_artifact() {
        let dir = tempdir().unwrap();
        write_chain(dir.path());
        let scene = Scene::new(chain_scene(), dir.path()).unwrap();

        let reports = scene.render_views().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].title, "Time History of Positions");
        // two bodies on two axes
        assert_eq!(reports[0].lines, 4);
        assert_eq!(reports[1].lines, 2);
        assert!(reports.iter().all(|r| r.output.is_none() && r.diagnostics.is_empty()));
    }

    #[test]
    fn test_axis_label_override() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("CircuitImprovedEuler.txt"), "0 0 0\n0.01 0.3 0\n").unwrap();
        let scene = Scene::new(Preset::Circuit.scene(), dir.path()).unwrap();

        let figure = scene.figure(&scene.config().views[0]).unwrap();
        assert_eq!(figure.panels[0].x_label, "Time (s)");
        assert_eq!(figure.panels[0].y_label, "Voltage (V)");
        // two of three runs missing, plus the source reference
        assert_eq!(figure.diagnostics.len(), 2);
        assert_eq!(figure.line_labels(), vec!["Improved Euler", "Source U0(t)"]);
    }

    #[test]
    fn test_archive_encoder_from_config() {
        let dir = tempdir().unwrap();
        write_chain(dir.path());
        let config = SceneConfig {
            name: "archived".to_string(),
            artifact: Some(ArtifactConfig {
                path: PathBuf::from("chain_simulation.tsv"),
                delimiter: Delimiter::Tab,
            }),
            topology: Some(Default::default()),
            animation: Some(AnimationConfig {
                settings: AnimationSettings {
                    stride: 2,
                    ..Default::default()
                },
                output: PathBuf::from("chain.mtra"),
                encoder: EncoderKind::Archive,
                ..Default::default()
            }),
            views: vec![ViewConfig::new(View::Trajectories)],
        };
        let scene = Scene::new(config, dir.path()).unwrap();

        let report = scene.run().unwrap();
        let animation = report.animation.unwrap();
        assert_eq!(animation.stats.frames, 10);
        assert_eq!(animation.stats.output, Some(dir.path().join("chain.mtra")));
        assert!(dir.path().join("chain.mtra").exists());
    }

    #[test]
    fn test_from_file_resolves_relative_to_file() {
        let dir = tempdir().unwrap();
        write_chain(dir.path());
        let path = dir.path().join("scene.json");
        fs::write(&path, serde_json::to_string_pretty(&chain_scene()).unwrap()).unwrap();

        let scene = Scene::from_file(&path).unwrap();
        assert_eq!(scene.base_dir(), dir.path());
        assert!(scene.load_primary().is_ok());

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Scene::from_file(&path), Err(Error::Json { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = chain_scene();
        config.topology = None;
        assert!(matches!(Scene::new(config, "."), Err(Error::Config(_))));
    }
}

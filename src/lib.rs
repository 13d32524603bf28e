//! mechtrace - Structural reconstruction and animation of precomputed
//! mechanical simulations.
//!
//! Solvers write their state histories as delimited numeric tables. This
//! crate loads those tables, resolves which columns hold time, positions and
//! velocities, rebuilds the mechanism's geometry at any row, and renders
//! either animations of the moving structure or static comparison figures
//! across several solver runs.
//!
//! # Architecture
//!
//! - `table`: Loading delimited artifacts and resolving their column schema
//! - `geometry`: Topologies that turn one table row into drawable polylines
//! - `analysis`: Derived series, comparison figures and PNG rendering
//! - `animation`: Animation sessions, frame encoders and the `.mtra` archive
//! - `schema`: Scene configuration and built-in presets
//! - `scene`: Runs a configured scene end to end
//!
//! # Example
//!
//! ```rust,no_run
//! use mechtrace::{
//!     animation::{AnimationSession, MemoryEncoder},
//!     geometry::{Point2, Topology},
//!     schema::AnimationSettings,
//!     table::{Delimiter, Schema, Table},
//! };
//!
//! let table = Table::load("chain_simulation.tsv", Delimiter::Tab)?;
//! let schema = Schema::resolve(&table)?;
//! let topology = Topology::LinearChain { anchor: Point2::ORIGIN };
//!
//! let settings = AnimationSettings { stride: 5, ..Default::default() };
//! let mut encoder = MemoryEncoder::new();
//! let report = AnimationSession::new(&table, &schema, topology, settings).run(&mut encoder)?;
//!
//! println!("{} frames within {:?}", report.rows.len(), report.bounds);
//! # Ok::<(), mechtrace::Error>(())
//! ```

pub mod analysis;
pub mod animation;
pub mod error;
pub mod geometry;
pub mod scene;
pub mod schema;
pub mod table;

// Re-export commonly used types
pub use animation::{AnimationPlayer, AnimationRecorder, AnimationSession, FrameEncoder};
pub use error::{Error, Result};
pub use geometry::{Shape, Topology};
pub use scene::{Scene, SceneReport};
pub use schema::{Preset, SceneConfig};
pub use table::{Schema, Table};

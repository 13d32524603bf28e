//! Animation of reconstructed structures.
//!
//! An [`AnimationSession`] walks a decimated frame sequence over one table,
//! reconstructs the structure for each frame, keeps a bounded trace of one
//! body and hands each frame to a [`FrameEncoder`]. Encoders:
//!
//! - [`MemoryEncoder`]: keeps frames in memory.
//! - [`GifEncoder`]: rasterizes and writes an animated GIF.
//! - [`AnimationRecorder`]: writes a `.mtra` vector-frame archive, read back
//!   by [`AnimationPlayer`].
//!
//! # Archive format
//!
//! ```text
//! Header:
//!   Magic: "MTRA" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression, trace display)
//!   Frame rate: u32
//!   Frame count: u64
//!   Bounds: 4 x f64
//!   Reserved: 8 bytes
//!   Title, anchors (length-prefixed)
//!
//! Frame records (variable):
//!   Row, time, tagged polylines, trace
//!   Optionally LZ4 compressed
//!
//! Frame index table (frame_count * 16 bytes, end of file):
//!   Offset: u64
//!   Stored size: u64
//! ```

mod encoder;
mod format;
mod gif;
mod player;
mod recorder;
mod session;
mod trace;

pub use encoder::{EncodeStats, FrameData, FrameEncoder, FrameLayout, MemoryEncoder};
pub use format::{
    ANIMATION_MAGIC, ANIMATION_VERSION, AnimationFlags, AnimationHeader, CompressionType,
    FrameIndex,
};
pub use gif::{DEFAULT_ANIMATION_SIZE, GifEncoder, draw_frame};
pub use player::{AnimationPlayer, FrameIterator};
pub use recorder::{AnimationRecorder, RecorderConfig};
pub use session::{AnimationReport, AnimationSession, SessionState, frame_sequence, time_label};
pub use trace::TraceBuffer;

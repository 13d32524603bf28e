//! Archive writer for animation frames.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::format::{AnimationHeader, CompressionType, FrameIndex, compress_lz4, encode_frame};
use super::{EncodeStats, FrameData, FrameEncoder, FrameLayout};
use crate::error::{Error, Result};

/// Configuration for archive recording.
#[derive(Debug, Clone, Default)]
pub struct RecorderConfig {
    /// Compression type to use.
    pub compression: CompressionType,
}

/// Writes frames to a `.mtra` archive.
///
/// The file is created in [`FrameEncoder::begin`], never earlier, so a
/// session that fails to prime leaves nothing on disk.
///
/// Usage:
/// ```ignore
/// let mut recorder = AnimationRecorder::new("chain.mtra", RecorderConfig::default());
/// session.run(&mut recorder)?;
/// ```
pub struct AnimationRecorder {
    path: PathBuf,
    config: RecorderConfig,
    writer: Option<BufWriter<File>>,
    header: Option<AnimationHeader>,
    frame_indices: Vec<FrameIndex>,
    /// Reused buffer for frame encoding.
    encode_buffer: Vec<u8>,
}

impl AnimationRecorder {
    pub fn new<P: AsRef<Path>>(path: P, config: RecorderConfig) -> Self {
        let mut config = config;
        if !config.compression.is_available() {
            log::warn!(
                "{:?} compression unavailable in this build, recording uncompressed",
                config.compression
            );
            config.compression = CompressionType::None;
        }
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            writer: None,
            header: None,
            frame_indices: Vec::new(),
            encode_buffer: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get number of frames recorded so far.
    pub fn frames_written(&self) -> usize {
        self.frame_indices.len()
    }

    fn io_err(&self, e: io::Error) -> Error {
        Error::io(&self.path, e)
    }

    fn write_frame(&mut self, frame: &FrameData) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::other("recorder not started"))?;
        let offset = writer.stream_position()?;

        encode_frame(frame, &mut self.encode_buffer)?;
        let size = match self.config.compression {
            CompressionType::None => {
                writer.write_all(&self.encode_buffer)?;
                self.encode_buffer.len()
            }
            CompressionType::Lz4 => {
                let compressed = compress_lz4(&self.encode_buffer)?;
                writer.write_all(&compressed)?;
                compressed.len()
            }
        };

        self.frame_indices.push(FrameIndex {
            offset,
            size: size as u64,
        });
        Ok(())
    }

    /// Write the index table and rewrite the header with the final count.
    fn finalize(&mut self) -> io::Result<u64> {
        let (Some(mut writer), Some(mut header)) = (self.writer.take(), self.header.take()) else {
            return Err(io::Error::other("recorder not started"));
        };

        for index in &self.frame_indices {
            index.write_to(&mut writer)?;
        }
        let total = writer.stream_position()?;

        header.frame_count = self.frame_indices.len() as u64;
        writer.seek(SeekFrom::Start(0))?;
        header.write_to(&mut writer)?;
        writer.flush()?;
        Ok(total)
    }
}

impl FrameEncoder for AnimationRecorder {
    fn begin(&mut self, layout: &FrameLayout) -> Result<()> {
        if self.writer.is_some() {
            return Err(Error::EncodingFailed("recorder already started".to_string()));
        }
        let file = File::create(&self.path).map_err(|e| self.io_err(e))?;
        let mut writer = BufWriter::new(file);

        // placeholder header; frame count is rewritten on finish
        let header = AnimationHeader::from_layout(layout, self.config.compression);
        header.write_to(&mut writer).map_err(|e| self.io_err(e))?;

        self.writer = Some(writer);
        self.header = Some(header);
        self.frame_indices.clear();
        log::debug!("Recording to '{}'", self.path.display());
        Ok(())
    }

    fn encode(&mut self, frame: &FrameData) -> Result<()> {
        self.write_frame(frame).map_err(|e| self.io_err(e))
    }

    fn finish(&mut self) -> Result<EncodeStats> {
        let bytes = self.finalize().map_err(|e| self.io_err(e))?;
        Ok(EncodeStats {
            frames: self.frame_indices.len(),
            bytes,
            output: Some(self.path.clone()),
        })
    }

    fn abort(&mut self) {
        let started = self.writer.take().is_some();
        self.header = None;
        self.frame_indices.clear();
        if started {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Could not remove partial '{}': {}", self.path.display(), e);
            }
        }
    }
}

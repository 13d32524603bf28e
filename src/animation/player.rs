//! Archive reader for recorded animations.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::format::{AnimationHeader, CompressionType, FrameIndex, decode_frame, decompress_lz4};
use super::{EncodeStats, FrameData, FrameEncoder, FrameLayout};
use crate::error::{Error, Result};

/// Reads frames back from a `.mtra` archive.
///
/// Usage:
/// ```ignore
/// let mut player = AnimationPlayer::open("chain.mtra")?;
/// println!("Animation has {} frames", player.frame_count());
///
/// // Re-encode as a GIF
/// let mut gif = GifEncoder::new("chain.gif", (800, 800));
/// player.replay(&mut gif)?;
/// ```
pub struct AnimationPlayer {
    path: PathBuf,
    reader: BufReader<File>,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    /// Reused read buffer.
    read_buffer: Vec<u8>,
}

impl AnimationPlayer {
    /// Open an archive for playback.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingArtifact { path: path.clone() },
            _ => Error::io(&path, e),
        })?;
        let mut reader = BufReader::new(file);

        let (header, frame_indices) =
            Self::read_layout(&mut reader).map_err(|e| Error::io(&path, e))?;
        log::debug!(
            "Opened '{}': {} frames at {} fps",
            path.display(),
            header.frame_count,
            header.fps
        );

        Ok(Self {
            path,
            reader,
            header,
            frame_indices,
            read_buffer: Vec::new(),
        })
    }

    fn read_layout(reader: &mut BufReader<File>) -> io::Result<(AnimationHeader, Vec<FrameIndex>)> {
        let header = AnimationHeader::read_from(reader)?;
        if !header.flags.compression.is_available() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{:?} compression not supported by this build", header.flags.compression),
            ));
        }

        // Index table sits at the end of the file
        let table_size = header
            .frame_count
            .checked_mul(FrameIndex::SIZE as u64)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "frame count overflow"))?;
        let file_len = reader.seek(SeekFrom::End(0))?;
        let index_start = file_len
            .checked_sub(table_size)
            .filter(|&start| start >= header.encoded_len() as u64)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "truncated frame index"))?;
        reader.seek(SeekFrom::Start(index_start))?;

        let mut frame_indices = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            let index = FrameIndex::read_from(reader)?;
            if index.offset.saturating_add(index.size) > index_start {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "frame index points past frame data",
                ));
            }
            frame_indices.push(index);
        }
        Ok((header, frame_indices))
    }

    pub fn header(&self) -> &AnimationHeader {
        &self.header
    }

    /// Layout the archive was recorded with.
    pub fn layout(&self) -> FrameLayout {
        self.header.layout()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_indices.len()
    }

    pub fn fps(&self) -> u32 {
        self.header.fps
    }

    /// Read a specific frame by position.
    pub fn read_frame(&mut self, frame: usize) -> Result<FrameData> {
        let Some(&index) = self.frame_indices.get(frame) else {
            return Err(Error::FrameOutOfRange {
                frame,
                rows: self.frame_indices.len(),
            });
        };
        self.read_at(index, frame).map_err(|e| Error::io(&self.path, e))
    }

    fn read_at(&mut self, index: FrameIndex, frame: usize) -> io::Result<FrameData> {
        self.reader.seek(SeekFrom::Start(index.offset))?;
        self.read_buffer.resize(index.size as usize, 0);
        self.reader.read_exact(&mut self.read_buffer)?;

        match self.header.flags.compression {
            CompressionType::None => decode_frame(&self.read_buffer, frame),
            CompressionType::Lz4 => decode_frame(&decompress_lz4(&self.read_buffer)?, frame),
        }
    }

    /// Create an iterator over all frames.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }

    /// Feed every frame to another encoder, e.g. to rasterize an archive.
    pub fn replay<E: FrameEncoder + ?Sized>(&mut self, encoder: &mut E) -> Result<EncodeStats> {
        encoder.begin(&self.layout())?;
        for i in 0..self.frame_count() {
            let frame = match self.read_frame(i) {
                Ok(frame) => frame,
                Err(e) => {
                    encoder.abort();
                    return Err(e);
                }
            };
            if let Err(e) = encoder.encode(&frame) {
                encoder.abort();
                return Err(e);
            }
        }
        encoder.finish().inspect_err(|_| encoder.abort())
    }
}

/// Iterator over archive frames.
pub struct FrameIterator<'a> {
    player: &'a mut AnimationPlayer,
    current: usize,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = Result<FrameData>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }

        let result = self.player.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.player.frame_count() - self.current;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FrameIterator<'a> {}

//! Binary format of the vector-frame animation archive (`.mtra`).

use std::io::{self, Read, Write};

use crate::geometry::{Bounds, Part, Point2, Polyline, Shape};

use super::{FrameData, FrameLayout, time_label};

/// Magic bytes identifying an archive.
pub const ANIMATION_MAGIC: &[u8; 4] = b"MTRA";

/// Current format version.
pub const ANIMATION_VERSION: u16 = 1;

/// Compression type for frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Raw little-endian frame records.
    #[default]
    None = 0,
    /// LZ4 block compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }

    /// Whether this build can read and write the compression.
    pub fn is_available(self) -> bool {
        match self {
            CompressionType::None => true,
            CompressionType::Lz4 => cfg!(feature = "lz4"),
        }
    }
}

/// Header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationFlags {
    /// Compression type (lower 4 bits).
    pub compression: CompressionType,
    /// Players should draw the stored trace.
    pub show_trace: bool,
}

impl AnimationFlags {
    pub fn to_u16(self) -> u16 {
        let mut flags = self.compression as u16;
        if self.show_trace {
            flags |= 1 << 4;
        }
        flags
    }

    pub fn from_u16(v: u16) -> io::Result<Self> {
        let compression = CompressionType::from_u8((v & 0x0F) as u8).ok_or_else(|| {
            invalid(format!("Unknown compression type {}", v & 0x0F))
        })?;
        Ok(Self {
            compression,
            show_trace: (v & (1 << 4)) != 0,
        })
    }
}

/// Archive header.
///
/// ```text
/// Magic: "MTRA" (4 bytes)
/// Version: u16
/// Flags: u16
/// Frame rate: u32
/// Frame count: u64
/// Bounds: 4 x f64 (min x, min y, max x, max y)
/// Reserved: 8 bytes
/// Title: u16 length + UTF-8 bytes
/// Anchors: u16 count + count x (f64, f64)
/// ```
///
/// The header is followed by the frame records and then a table of
/// `frame_count` [`FrameIndex`] entries at the very end of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationHeader {
    pub fps: u32,
    pub frame_count: u64,
    pub bounds: Bounds,
    pub title: String,
    pub anchors: Vec<Point2>,
    pub flags: AnimationFlags,
}

impl AnimationHeader {
    /// Size of the fixed-width part in bytes.
    pub const FIXED_SIZE: usize = 4 + 2 + 2 + 4 + 8 + 32 + 8;

    pub fn from_layout(layout: &FrameLayout, compression: CompressionType) -> Self {
        Self {
            fps: layout.fps,
            frame_count: 0,
            bounds: layout.bounds,
            title: layout.title.clone(),
            anchors: layout.anchors.clone(),
            flags: AnimationFlags {
                compression,
                show_trace: layout.show_trace,
            },
        }
    }

    pub fn layout(&self) -> FrameLayout {
        FrameLayout {
            title: self.title.clone(),
            bounds: self.bounds,
            fps: self.fps,
            frame_count: self.frame_count as usize,
            anchors: self.anchors.clone(),
            show_trace: self.flags.show_trace,
        }
    }

    /// Total encoded size, including title and anchors.
    pub fn encoded_len(&self) -> usize {
        Self::FIXED_SIZE + 2 + self.title_bytes().len() + 2 + self.anchors.len() * 16
    }

    /// Title cut to the u16 length prefix, on a char boundary.
    fn title_bytes(&self) -> &[u8] {
        let mut end = self.title.len().min(u16::MAX as usize);
        while !self.title.is_char_boundary(end) {
            end -= 1;
        }
        &self.title.as_bytes()[..end]
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(ANIMATION_MAGIC)?;
        w.write_all(&ANIMATION_VERSION.to_le_bytes())?;
        w.write_all(&self.flags.to_u16().to_le_bytes())?;
        w.write_all(&self.fps.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        write_point(w, self.bounds.min)?;
        write_point(w, self.bounds.max)?;
        w.write_all(&[0u8; 8])?;

        let title = self.title_bytes();
        w.write_all(&(title.len() as u16).to_le_bytes())?;
        w.write_all(title)?;

        if self.anchors.len() > u16::MAX as usize {
            return Err(invalid(format!("Too many anchors: {}", self.anchors.len())));
        }
        w.write_all(&(self.anchors.len() as u16).to_le_bytes())?;
        for anchor in &self.anchors {
            write_point(w, *anchor)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != ANIMATION_MAGIC {
            return Err(invalid("Invalid MTRA magic bytes".to_string()));
        }

        let version = read_u16(r)?;
        if version != ANIMATION_VERSION {
            return Err(invalid(format!("Unsupported MTRA version: {}", version)));
        }

        let flags = AnimationFlags::from_u16(read_u16(r)?)?;
        let fps = read_u32(r)?;
        let frame_count = read_u64(r)?;
        let bounds = Bounds {
            min: read_point(r)?,
            max: read_point(r)?,
        };

        let mut reserved = [0u8; 8];
        r.read_exact(&mut reserved)?;

        let mut title = vec![0u8; read_u16(r)? as usize];
        r.read_exact(&mut title)?;
        let title = String::from_utf8(title).map_err(|e| invalid(e.to_string()))?;

        let anchor_count = read_u16(r)? as usize;
        let anchors = (0..anchor_count)
            .map(|_| read_point(r))
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            fps,
            frame_count,
            bounds,
            title,
            anchors,
            flags,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Stored size in bytes (compressed if compression is on).
    pub size: u64,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let offset = read_u64(r)?;
        let size = read_u64(r)?;
        Ok(Self { offset, size })
    }
}

/// Serialize one frame record.
///
/// Record layout: row u64, time f64, polyline count u16, then per polyline
/// a part tag u8, point count u32 and the points; finally the trace as a
/// u32 count and points. The time label is not stored.
pub fn encode_frame(frame: &FrameData, out: &mut Vec<u8>) -> io::Result<()> {
    out.clear();
    out.extend_from_slice(&(frame.row as u64).to_le_bytes());
    out.extend_from_slice(&frame.time.to_le_bytes());

    let polylines = &frame.shape.polylines;
    if polylines.len() > u16::MAX as usize {
        return Err(invalid(format!("Too many polylines: {}", polylines.len())));
    }
    out.extend_from_slice(&(polylines.len() as u16).to_le_bytes());
    for polyline in polylines {
        out.push(polyline.part as u8);
        write_points(out, &polyline.points)?;
    }
    write_points(out, &frame.trace)
}

/// Parse one frame record. `index` is the frame's position in the archive.
pub fn decode_frame(mut bytes: &[u8], index: usize) -> io::Result<FrameData> {
    let r = &mut bytes;
    let row = read_u64(r)? as usize;
    let time = read_f64(r)?;

    let polyline_count = read_u16(r)? as usize;
    let mut polylines = Vec::with_capacity(polyline_count);
    for _ in 0..polyline_count {
        let mut tag = [0u8; 1];
        r.read_exact(&mut tag)?;
        let part = Part::from_u8(tag[0])
            .ok_or_else(|| invalid(format!("Unknown part tag {}", tag[0])))?;
        polylines.push(Polyline::new(part, read_points(r)?));
    }
    let trace = read_points(r)?;

    if !r.is_empty() {
        return Err(invalid(format!(
            "Frame {} has {} trailing bytes",
            index,
            r.len()
        )));
    }

    Ok(FrameData {
        index,
        row,
        time,
        label: time_label(time),
        shape: Shape { polylines },
        trace,
    })
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "LZ4 support not compiled in (enable the `lz4` feature)",
    ))
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "LZ4 support not compiled in (enable the `lz4` feature)",
    ))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn write_point<W: Write>(w: &mut W, p: Point2) -> io::Result<()> {
    w.write_all(&p.x.to_le_bytes())?;
    w.write_all(&p.y.to_le_bytes())
}

fn write_points(out: &mut Vec<u8>, points: &[Point2]) -> io::Result<()> {
    let count = u32::try_from(points.len())
        .map_err(|_| invalid(format!("Too many points: {}", points.len())))?;
    out.extend_from_slice(&count.to_le_bytes());
    for p in points {
        write_point(out, *p)?;
    }
    Ok(())
}

fn read_points<R: Read>(r: &mut R) -> io::Result<Vec<Point2>> {
    let count = read_u32(r)? as usize;
    // cap the pre-allocation; a corrupt count fails on read instead
    let mut points = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        points.push(read_point(r)?);
    }
    Ok(points)
}

fn read_point<R: Read>(r: &mut R) -> io::Result<Point2> {
    Ok(Point2::new(read_f64(r)?, read_f64(r)?))
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

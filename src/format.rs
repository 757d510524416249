//! Binary bake file.
//!
//! Layout, all little-endian:
//!
//! ```text
//! i32 frame_count
//! i32 grid_size
//! frame_count × grid_size² × (f32 x, f32 y, f32 z, f32 pad)   displacement
//! frame_count × grid_size² × (f32 x, f32 y, f32 z, f32 pad)   normal
//! frame_count × grid_size² × (f32 x, f32 y, f32 z, f32 pad)   foam
//! ```
//!
//! Records within a frame are row-major (`x + z·N`).  Foam is scalar and is
//! written to all three components.  `pad` is always [`RECORD_PAD`].

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::{
    bake::{BakedFrame, FrameBakeSet},
    config::{MAX_FRAME_COUNT, MAX_GRID_SIZE},
};

/// Fourth component of every record.
pub const RECORD_PAD: f32 = 0.5;

/// Size of the two-integer header in bytes.
pub const HEADER_BYTES: usize = 8;

/// Size of one `(x, y, z, pad)` record in bytes.
pub const RECORD_BYTES: usize = 16;

/// Error returned when a bake file cannot be written or read.
#[derive(Debug)]
pub enum FormatError {
    Io(io::Error),
    /// The header holds a zero, negative or unsupported frame count or grid size.
    BadHeader { frame_count: i64, grid_size: i64 },
    /// A frame's arrays do not match the set's grid size.
    FrameSizeMismatch { frame: usize, expected: usize },
    /// The file ended before all records were read.
    Truncated,
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Io(e) => write!(f, "bake file i/o failed: {e}"),
            FormatError::BadHeader {
                frame_count,
                grid_size,
            } => write!(
                f,
                "invalid bake header: {frame_count} frames of size {grid_size}"
            ),
            FormatError::FrameSizeMismatch { frame, expected } => {
                write!(f, "frame {frame} does not hold {expected} texels per array")
            }
            FormatError::Truncated => write!(f, "bake file ended early"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::Truncated
        } else {
            FormatError::Io(e)
        }
    }
}

fn write_record<W: Write>(w: &mut W, v: [f32; 3]) -> io::Result<()> {
    let mut buf = [0u8; RECORD_BYTES];
    for (chunk, value) in buf.chunks_exact_mut(4).zip([v[0], v[1], v[2], RECORD_PAD]) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    w.write_all(&buf)
}

fn read_record<R: Read>(r: &mut R) -> io::Result<[f32; 3]> {
    let mut buf = [0u8; RECORD_BYTES];
    r.read_exact(&mut buf)?;
    let f = |i: usize| f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
    Ok([f(0), f(4), f(8)])
}

fn read_i32<R: Read>(r: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Write `set` to `w` in the bake file layout.
pub fn write_bake<W: Write>(set: &FrameBakeSet, mut w: W) -> Result<(), FormatError> {
    let texels = set.grid_size * set.grid_size;
    let bad_header = || FormatError::BadHeader {
        frame_count: set.frames.len() as i64,
        grid_size: set.grid_size as i64,
    };
    let frame_count = i32::try_from(set.frames.len()).map_err(|_| bad_header())?;
    let grid_size = i32::try_from(set.grid_size).map_err(|_| bad_header())?;
    for (i, frame) in set.frames.iter().enumerate() {
        if frame.displacement.len() != texels
            || frame.normal.len() != texels
            || frame.foam.len() != texels
        {
            return Err(FormatError::FrameSizeMismatch {
                frame: i,
                expected: texels,
            });
        }
    }

    w.write_all(&frame_count.to_le_bytes())?;
    w.write_all(&grid_size.to_le_bytes())?;
    for frame in &set.frames {
        for &d in &frame.displacement {
            write_record(&mut w, d)?;
        }
    }
    for frame in &set.frames {
        for &n in &frame.normal {
            write_record(&mut w, n)?;
        }
    }
    for frame in &set.frames {
        for &f in &frame.foam {
            write_record(&mut w, [f, f, f])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Read a bake file written by [`write_bake`].
pub fn read_bake<R: Read>(mut r: R) -> Result<FrameBakeSet, FormatError> {
    let frame_count = read_i32(&mut r)?;
    let grid_size = read_i32(&mut r)?;
    let bad_header = FormatError::BadHeader {
        frame_count: frame_count as i64,
        grid_size: grid_size as i64,
    };
    let (Ok(frames), Ok(size)) = (usize::try_from(frame_count), usize::try_from(grid_size)) else {
        return Err(bad_header);
    };
    if frames == 0 || frames > MAX_FRAME_COUNT || size == 0 || size > MAX_GRID_SIZE {
        return Err(bad_header);
    }
    let texels = size * size;

    let read_block = |r: &mut R| -> Result<Vec<Vec<[f32; 3]>>, FormatError> {
        (0..frames)
            .map(|_| {
                (0..texels)
                    .map(|_| read_record(r).map_err(FormatError::from))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    };
    let displacement = read_block(&mut r)?;
    let normal = read_block(&mut r)?;
    let foam = read_block(&mut r)?;

    let frames = displacement
        .into_iter()
        .zip(normal)
        .zip(foam)
        .map(|((displacement, normal), foam)| BakedFrame {
            displacement,
            normal,
            foam: foam.into_iter().map(|f| f[0]).collect(),
        })
        .collect();

    Ok(FrameBakeSet {
        grid_size: size,
        frames,
    })
}

impl FrameBakeSet {
    /// Write the set to `path`, replacing any existing file.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), FormatError> {
        write_bake(self, BufWriter::new(File::create(path)?))
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        read_bake(BufReader::new(File::open(path)?))
    }

    /// Size in bytes of the encoded set.
    pub fn encoded_len(&self) -> usize {
        HEADER_BYTES + 3 * self.frames.len() * self.grid_size * self.grid_size * RECORD_BYTES
    }
}

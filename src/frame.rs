//! Decoded frame extraction.
//!
//! The module hands back a decoded picture as a single allocation in its own
//! memory:
//!
//! ```text
//! +-----------+------------+----------------------------------+
//! | width u32 | height u32 | width * height * 4 bytes of RGBA |
//! |    LE     |     LE     |                                  |
//! +-----------+------------+----------------------------------+
//! ```
//!
//! [`extract_frame`] copies it into a caller-owned [`Frame`] and frees the
//! native allocation.

use tracing::{trace, warn};

use crate::error::{DecoderError, MemoryError};
use crate::memory::{Addr, NativeMemory};

/// Size of the packed frame header (width + height).
pub const FRAME_HEADER_LEN: usize = 8;

/// Bytes per pixel (RGBA).
pub const BYTES_PER_PIXEL: usize = 4;

/// A decoded RGBA picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, rows top to bottom, no padding.
    pub data: Vec<u8>,
}

impl Frame {
    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// RGBA value at (`x`, `y`), if inside the picture.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let px = self.data.get(at..at + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// True for degenerate (zero-area) frames.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Pixel payload size for a frame: `(width * height) << 2`.
///
/// `None` if it does not fit in `usize`.
pub fn payload_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_PIXEL)
}

/// Parse a packed frame header.
pub fn parse_header(header: &[u8; FRAME_HEADER_LEN]) -> (u32, u32) {
    let width = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let height = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (width, height)
}

/// Copy the frame at `addr` out of native memory and free it.
///
/// The allocation is freed whether or not the copy succeeds, so a malformed
/// frame never leaks native memory.
pub fn extract_frame<M>(memory: &mut M, addr: Addr) -> Result<Frame, DecoderError>
where
    M: NativeMemory + ?Sized,
{
    let copied = copy_frame(&*memory, addr);
    let freed = memory.free(addr);

    let frame = copied?;
    freed?;
    trace!(addr = %addr, width = frame.width, height = frame.height, "frame extracted");
    Ok(frame)
}

fn copy_frame<M>(memory: &M, addr: Addr) -> Result<Frame, DecoderError>
where
    M: NativeMemory + ?Sized,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    memory.read(addr, &mut header)?;
    let (width, height) = parse_header(&header);

    let len = payload_len(width, height).ok_or(DecoderError::InvalidFrame { width, height })?;
    if len == 0 {
        warn!(width, height, "degenerate frame from decoder");
        return Ok(Frame {
            width,
            height,
            data: Vec::new(),
        });
    }

    let pixels_at = addr
        .checked_add(FRAME_HEADER_LEN)
        .ok_or(DecoderError::InvalidFrame { width, height })?;
    // A corrupt header must not size the copy buffer.
    if !memory.contains(pixels_at, len) {
        return Err(MemoryError::OutOfBounds {
            addr: pixels_at,
            len,
        }
        .into());
    }
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| DecoderError::InvalidFrame { width, height })?;
    data.resize(len, 0);
    memory.read(pixels_at, &mut data)?;

    Ok(Frame { width, height, data })
}

/// Pack a frame into native memory the way the decoder module does.
///
/// `pixels` must hold exactly `(width * height) << 2` bytes. The returned
/// allocation belongs to whoever reads it back with [`extract_frame`].
pub fn write_frame<M>(
    memory: &mut M,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<Addr, DecoderError>
where
    M: NativeMemory + ?Sized,
{
    let len = payload_len(width, height)
        .filter(|&len| len == pixels.len())
        .ok_or(DecoderError::InvalidFrame { width, height })?;
    let total = len
        .checked_add(FRAME_HEADER_LEN)
        .ok_or(DecoderError::InvalidFrame { width, height })?;

    let addr = memory.alloc(total)?;
    let mut header = [0u8; FRAME_HEADER_LEN];
    header[..4].copy_from_slice(&width.to_le_bytes());
    header[4..].copy_from_slice(&height.to_le_bytes());

    let written = match addr.checked_add(FRAME_HEADER_LEN) {
        Some(pixels_at) => memory
            .write(addr, &header)
            .and_then(|()| memory.write(pixels_at, pixels)),
        None => Err(MemoryError::OutOfBounds { addr, len: total }),
    };
    if let Err(e) = written {
        let _ = memory.free(addr);
        return Err(e.into());
    }
    Ok(addr)
}

//! Frame records, the unit the display shows for one time slot.
//!
//! Layout (little-endian):
//! - HEADER (1 byte): 0xAA
//! - FRAME SIZE (2 bytes): length of the whole record, header included
//! - TIME CODE (2 bytes): milliseconds from animation start, 0 for stills
//! - PALETTE TYPE (1 byte): 0x03, Pixoo Max palette of up to 1024 colors
//! - PALETTE LENGTH (2 bytes)
//! - PALETTE (3 bytes per color): RGB triples
//! - PIXELS: packed palette indices, see `bitpack`

use tracing::trace;

use crate::bitpack;
use crate::canvas::PixelGrid;
use crate::error::{CodecError, CodecResult};
use crate::palette::{self, MAX_PALETTE_COLORS};

pub const FRAME_HEADER: u8 = 0xAA;
pub const PALETTE_TYPE_PIXOO_MAX: u8 = 0x03;

/// Bytes before the palette: header, size, time code, type, palette length
pub const FRAME_PREFIX_SIZE: usize = 1 + 2 + 2 + 1 + 2;

/// Build one frame record from a grid
pub fn build_frame(grid: &PixelGrid, time_code: u16) -> CodecResult<Vec<u8>> {
    let image = palette::index_colors(grid, MAX_PALETTE_COLORS)?;
    let width = image.bit_width();
    let pixels = bitpack::pack(&image.indices, width)?;
    let palette_bytes = image.palette_bytes();

    let frame_size = FRAME_PREFIX_SIZE + palette_bytes.len() + pixels.len();

    let mut frame = Vec::with_capacity(frame_size);
    frame.push(FRAME_HEADER);
    frame.extend_from_slice(&(frame_size as u16).to_le_bytes());
    frame.extend_from_slice(&time_code.to_le_bytes());
    frame.push(PALETTE_TYPE_PIXOO_MAX);
    frame.extend_from_slice(&(image.palette.len() as u16).to_le_bytes());
    frame.extend_from_slice(&palette_bytes);
    frame.extend_from_slice(&pixels);

    trace!(
        frame_size,
        time_code,
        colors = image.palette.len(),
        bit_width = width,
        "built frame"
    );

    Ok(frame)
}

/// Time code of frame `index` in an animation with a fixed frame duration
pub fn time_code(index: usize, duration_ms: u16) -> CodecResult<u16> {
    index
        .checked_mul(duration_ms as usize)
        .and_then(|t| u16::try_from(t).ok())
        .ok_or(CodecError::TimeCodeOverflow {
            frame: index,
            duration_ms,
        })
}

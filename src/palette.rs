use std::collections::HashMap;

use tracing::trace;

use crate::canvas::{PixelGrid, Rgb, PIXEL_COUNT};
use crate::error::{CodecError, CodecResult};

/// Palette cap for the Pixoo Max palette type (0x03)
pub const MAX_PALETTE_COLORS: usize = 1024;

/// Palette cap for the legacy one-byte index mode
pub const LEGACY_PALETTE_COLORS: usize = 256;

/// A grid split into its distinct colors and one palette index per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    /// Distinct colors in order of first appearance
    pub palette: Vec<Rgb>,
    /// Palette index for each pixel, row-major
    pub indices: Vec<u16>,
}

impl IndexedImage {
    /// Bits needed to store one index into this palette
    pub fn bit_width(&self) -> u32 {
        bit_width(self.palette.len())
    }

    /// Palette as a flat `R G B R G B ...` byte sequence
    pub fn palette_bytes(&self) -> Vec<u8> {
        self.palette.iter().flat_map(|c| c.to_bytes()).collect()
    }
}

/// `max(1, ceil(log2(len)))`
pub fn bit_width(palette_len: usize) -> u32 {
    if palette_len <= 1 {
        return 1;
    }
    usize::BITS - (palette_len - 1).leading_zeros()
}

/// `bit_width` for a palette that must also respect `limit`
pub fn checked_bit_width(palette_len: usize, limit: usize) -> CodecResult<u32> {
    if palette_len > limit {
        return Err(CodecError::PaletteTooLarge {
            count: palette_len,
            limit,
        });
    }
    Ok(bit_width(palette_len))
}

/// Deduplicate the grid's colors in first-occurrence order.
///
/// Fails with `PaletteTooLarge` carrying the full distinct count when it
/// exceeds `limit`; colors are never merged or dropped.
pub fn index_colors(grid: &PixelGrid, limit: usize) -> CodecResult<IndexedImage> {
    let mut lookup: HashMap<u32, u16> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(PIXEL_COUNT);

    grid.traverse(|_, _, color, _| {
        let next = palette.len() as u16;
        let index = *lookup.entry(color.key()).or_insert_with(|| {
            palette.push(color);
            next
        });
        indices.push(index);
    });

    checked_bit_width(palette.len(), limit)?;

    trace!(colors = palette.len(), limit, "indexed grid colors");

    Ok(IndexedImage { palette, indices })
}

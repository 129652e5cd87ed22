//! Variable-width packing of palette indices.
//!
//! Indices are written back to back, least significant bit first. A value
//! may straddle one or two byte boundaries; the final byte is zero-padded in
//! its high bits.

use crate::error::{CodecError, CodecResult};

/// Widest index the packer handles (a 1024-entry palette)
pub const MAX_BIT_WIDTH: u32 = 10;

/// Number of bytes needed to hold `count` indices of `width` bits
pub fn packed_len(count: usize, width: u32) -> usize {
    (count * width as usize).div_ceil(8)
}

fn check_width(width: u32) -> CodecResult<()> {
    if !(1..=MAX_BIT_WIDTH).contains(&width) {
        return Err(CodecError::InvalidBitWidth(width));
    }
    Ok(())
}

/// Pack `indices` into a little-endian bitstream, `width` bits per index
pub fn pack(indices: &[u16], width: u32) -> CodecResult<Vec<u8>> {
    check_width(width)?;

    let mask = (1u32 << width) - 1;
    let mut out = Vec::with_capacity(packed_len(indices.len(), width));
    let mut acc: u32 = 0;
    let mut held: u32 = 0;

    for &index in indices {
        acc |= (index as u32 & mask) << held;
        held += width;
        while held >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            held -= 8;
        }
    }

    if held > 0 {
        out.push(acc as u8);
    }

    Ok(out)
}

/// Read `count` indices of `width` bits back out of a packed bitstream.
///
/// Bits past the last index are ignored.
pub fn unpack(bytes: &[u8], width: u32, count: usize) -> CodecResult<Vec<u16>> {
    check_width(width)?;

    let needed = packed_len(count, width);
    if bytes.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            available: bytes.len(),
        });
    }

    let mask = (1u32 << width) - 1;
    let mut out = Vec::with_capacity(count);
    let mut acc: u32 = 0;
    let mut held: u32 = 0;
    let mut next = 0;

    while out.len() < count {
        while held < width {
            // in bounds: `needed` bytes cover every index bit
            acc |= (bytes[next] as u32) << held;
            next += 1;
            held += 8;
        }
        out.push((acc & mask) as u16);
        acc >>= width;
        held -= width;
    }

    Ok(out)
}

use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::protocol::message::build_message;

pub const ANIMATION_COMMAND: u8 = 0x49;

/// Frame bytes carried by one chunk
pub const CHUNK_SIZE: usize = 200;

/// Chunk indices are a single byte on the wire
pub const MAX_CHUNKS: usize = 256;

/// Split concatenated animation frames into framed chunk messages.
///
/// Each chunk payload is `49 <total:u16> <index:u8> <up to 200 bytes>`. The
/// device reassembles by index, so the returned messages must be sent in
/// order.
pub fn build_animation_chunks<F>(frames: &[F]) -> CodecResult<Vec<Vec<u8>>>
where
    F: AsRef<[u8]>,
{
    let all_frames: Vec<u8> = frames
        .iter()
        .flat_map(|frame| frame.as_ref().iter().copied())
        .collect();

    let total = u16::try_from(all_frames.len())
        .map_err(|_| CodecError::AnimationTooLarge(all_frames.len()))?;

    let chunk_count = all_frames.len().div_ceil(CHUNK_SIZE);
    if chunk_count > MAX_CHUNKS {
        return Err(CodecError::AnimationTooLarge(all_frames.len()));
    }

    debug!(
        frames = frames.len(),
        bytes = all_frames.len(),
        chunks = chunk_count,
        "chunking animation"
    );

    all_frames
        .chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(index, slice)| {
            let mut payload = Vec::with_capacity(4 + slice.len());
            payload.push(ANIMATION_COMMAND);
            payload.extend_from_slice(&total.to_le_bytes());
            payload.push(index as u8);
            payload.extend_from_slice(slice);
            build_message(&payload)
        })
        .collect()
}

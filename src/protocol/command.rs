use tracing::debug;

use crate::canvas::PixelGrid;
use crate::error::{CodecError, CodecResult};
use crate::frame::{build_frame, time_code};
use crate::protocol::animation::build_animation_chunks;
use crate::protocol::message::build_message;

pub const BRIGHTNESS_COMMAND: u8 = 0x74;
pub const STATIC_IMAGE_COMMAND: u8 = 0x44;

/// Channel selection, observed on the wire; sub-command bytes are opaque
pub const CHANNEL_COMMAND: u8 = 0x45;

/// Bytes the device expects between the static image command and its frame.
/// Their meaning is unknown; they are sent verbatim.
pub const STATIC_IMAGE_PREFIX: [u8; 4] = [0x00, 0x0A, 0x0A, 0x04];

pub const MAX_BRIGHTNESS: i32 = 100;

/// Message setting display brightness in percent (0-100)
pub fn encode_brightness(level: i32) -> CodecResult<Vec<u8>> {
    if !(0..=MAX_BRIGHTNESS).contains(&level) {
        return Err(CodecError::OutOfRange(level));
    }
    debug!(level, "encoding brightness");
    build_message(&[BRIGHTNESS_COMMAND, level as u8])
}

/// Message showing `grid` as a still image
pub fn encode_static_image(grid: &PixelGrid) -> CodecResult<Vec<u8>> {
    let frame = build_frame(grid, 0)?;

    let mut payload = Vec::with_capacity(1 + STATIC_IMAGE_PREFIX.len() + frame.len());
    payload.push(STATIC_IMAGE_COMMAND);
    payload.extend_from_slice(&STATIC_IMAGE_PREFIX);
    payload.extend_from_slice(&frame);

    debug!(frame_bytes = frame.len(), "encoding static image");
    build_message(&payload)
}

/// Chunk messages playing `grids` as an animation, `duration_ms` per frame.
///
/// Every frame is encoded before any chunk is built, so an error in any
/// grid yields no messages at all.
pub fn encode_animation(grids: &[PixelGrid], duration_ms: u16) -> CodecResult<Vec<Vec<u8>>> {
    let frames = grids
        .iter()
        .enumerate()
        .map(|(index, grid)| build_frame(grid, time_code(index, duration_ms)?))
        .collect::<CodecResult<Vec<_>>>()?;

    debug!(frames = frames.len(), duration_ms, "encoding animation");
    build_animation_chunks(&frames)
}

/// Message carrying an arbitrary command byte and its arguments
pub fn encode_command(command: u8, args: &[u8]) -> CodecResult<Vec<u8>> {
    let mut payload = Vec::with_capacity(1 + args.len());
    payload.push(command);
    payload.extend_from_slice(args);
    build_message(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitpack::unpack;
    use crate::canvas::{Rgb, PIXEL_COUNT};
    use crate::frame::FRAME_HEADER;
    use crate::palette::{index_colors, MAX_PALETTE_COLORS};
    use crate::protocol::animation::ANIMATION_COMMAND;
    use crate::protocol::message::parse_message;

    #[test]
    fn test_brightness_full() {
        assert_eq!(
            encode_brightness(100).unwrap(),
            vec![0x01, 0x04, 0x00, 0x74, 0x64, 0xDC, 0x00, 0x02]
        );
    }

    #[test]
    fn test_brightness_out_of_range() {
        assert_eq!(encode_brightness(101), Err(CodecError::OutOfRange(101)));
        assert_eq!(encode_brightness(-1), Err(CodecError::OutOfRange(-1)));
        assert!(encode_brightness(0).is_ok());
    }

    #[test]
    fn test_static_image_payload() {
        let message = encode_static_image(&PixelGrid::new()).unwrap();
        let payload = parse_message(&message).unwrap();

        assert_eq!(&payload[..5], &[0x44, 0x00, 0x0A, 0x0A, 0x04]);
        assert_eq!(payload[5], FRAME_HEADER);
        // time code is zero for still images
        assert_eq!(&payload[8..10], &[0, 0]);
        assert_eq!(payload.len(), 5 + 139);
    }

    #[test]
    fn test_static_image_checkerboard() {
        let mut grid = PixelGrid::new();
        grid.transform(|x, y, _, _| {
            if (x + y) % 2 == 0 {
                Rgb::new(255, 255, 255)
            } else {
                Rgb::BLACK
            }
        });
        let message = encode_static_image(&grid).unwrap();
        let frame = &parse_message(&message).unwrap()[5..];

        assert_eq!(u16::from_le_bytes([frame[6], frame[7]]), 2);
        assert_eq!(frame.len(), 8 + 2 * 3 + 128);
    }

    #[test]
    fn test_static_image_five_colors_unpacks() {
        // 5 colors need 3-bit indices, so indices straddle byte boundaries
        let colors = [
            Rgb::new(255, 0, 0),
            Rgb::new(0, 255, 0),
            Rgb::new(0, 0, 255),
            Rgb::new(255, 255, 0),
            Rgb::new(0, 255, 255),
        ];
        let mut grid = PixelGrid::new();
        grid.transform(|x, y, _, _| colors[(x * 3 + y) % colors.len()]);

        let message = encode_static_image(&grid).unwrap();
        let frame = &parse_message(&message).unwrap()[5..];
        let image = index_colors(&grid, MAX_PALETTE_COLORS).unwrap();

        assert_eq!(u16::from_le_bytes([frame[6], frame[7]]), 5);
        assert_eq!(image.bit_width(), 3);

        let pixels = &frame[8 + 5 * 3..];
        assert_eq!(pixels.len(), 384);
        assert_eq!(unpack(pixels, 3, PIXEL_COUNT).unwrap(), image.indices);
    }

    #[test]
    fn test_animation_time_codes() {
        let grids = vec![
            PixelGrid::filled(Rgb::new(255, 0, 0)),
            PixelGrid::filled(Rgb::new(0, 255, 0)),
            PixelGrid::filled(Rgb::new(0, 0, 255)),
        ];
        let chunks = encode_animation(&grids, 250).unwrap();

        let mut all = Vec::new();
        for chunk in &chunks {
            let payload = parse_message(chunk).unwrap();
            assert_eq!(payload[0], ANIMATION_COMMAND);
            all.extend_from_slice(&payload[4..]);
        }

        // three single-color frames of 139 bytes each
        assert_eq!(all.len(), 3 * 139);
        assert_eq!(chunks.len(), 3);
        for (i, frame) in all.chunks(139).enumerate() {
            assert_eq!(frame[0], FRAME_HEADER);
            assert_eq!(u16::from_le_bytes([frame[3], frame[4]]) as usize, i * 250);
        }
    }

    #[test]
    fn test_animation_rejects_oversized_time_code() {
        let grids = vec![PixelGrid::new(); 3];
        assert!(matches!(
            encode_animation(&grids, 40_000),
            Err(CodecError::TimeCodeOverflow { frame: 2, .. })
        ));
    }

    #[test]
    fn test_raw_command() {
        let message = encode_command(CHANNEL_COMMAND, &[0x00]).unwrap();
        assert_eq!(parse_message(&message).unwrap(), &[0x45, 0x00]);
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Everything the codec can refuse to encode or decode.
///
/// Encoding never returns partial output: any of these errors means no bytes
/// were produced for the request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("pixel coordinate out of bounds: ({x}, {y}) is outside 0..{width}x0..{height}")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    #[error("brightness must be between 0 and 100 (inclusive), got {0}")]
    OutOfRange(i32),

    #[error("palette too large: {count} distinct colors, limit is {limit}")]
    PaletteTooLarge { count: usize, limit: usize },

    #[error("invalid bit width {0}: indices are packed with 1 to 10 bits")]
    InvalidBitWidth(u32),

    #[error("time code overflow: frame {frame} at {duration_ms} ms per frame does not fit in 16 bits")]
    TimeCodeOverflow { frame: usize, duration_ms: u16 },

    #[error("animation too large: {0} bytes of frame data")]
    AnimationTooLarge(usize),

    #[error("payload too large: {0} bytes does not fit a message length field")]
    PayloadTooLarge(usize),

    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("invalid {which} marker: expected {expected:#04x}, got {actual:#04x}")]
    InvalidMarker {
        which: &'static str,
        expected: u8,
        actual: u8,
    },

    #[error("length mismatch: header says {declared} bytes, message carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    InvalidChecksum { expected: u16, actual: u16 },
}

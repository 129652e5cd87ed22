use crate::error::{CodecError, CodecResult};

pub const MESSAGE_START: u8 = 0x01;
pub const MESSAGE_END: u8 = 0x02;

/// START + LENGTH + CHECKSUM + END
pub const MESSAGE_OVERHEAD: usize = 1 + 2 + 2 + 1;

/// Wrapping 16-bit sum of every byte
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

/// Build a Pixoo message around `payload`.
///
/// `01 <len:u16> <payload> <checksum:u16> 02`, where `len` counts the
/// payload plus the checksum and the checksum sums the length field and the
/// payload.
pub fn build_message(payload: &[u8]) -> CodecResult<Vec<u8>> {
    let length = u16::try_from(payload.len() + 2)
        .map_err(|_| CodecError::PayloadTooLarge(payload.len()))?
        .to_le_bytes();

    let sum = checksum(&length).wrapping_add(checksum(payload));

    let mut message = Vec::with_capacity(MESSAGE_OVERHEAD + payload.len());
    message.push(MESSAGE_START);
    message.extend_from_slice(&length);
    message.extend_from_slice(payload);
    message.extend_from_slice(&sum.to_le_bytes());
    message.push(MESSAGE_END);

    Ok(message)
}

/// Validate a complete message and return its payload
pub fn parse_message(message: &[u8]) -> CodecResult<&[u8]> {
    if message.len() < MESSAGE_OVERHEAD {
        return Err(CodecError::Truncated {
            needed: MESSAGE_OVERHEAD,
            available: message.len(),
        });
    }

    if message[0] != MESSAGE_START {
        return Err(CodecError::InvalidMarker {
            which: "start",
            expected: MESSAGE_START,
            actual: message[0],
        });
    }

    let declared = u16::from_le_bytes([message[1], message[2]]) as usize;
    let actual = message.len() - 4;
    if declared != actual {
        return Err(CodecError::LengthMismatch { declared, actual });
    }

    let end = message[message.len() - 1];
    if end != MESSAGE_END {
        return Err(CodecError::InvalidMarker {
            which: "end",
            expected: MESSAGE_END,
            actual: end,
        });
    }

    let checksum_at = message.len() - 3;
    let expected = checksum(&message[1..checksum_at]);
    let received = u16::from_le_bytes([message[checksum_at], message[checksum_at + 1]]);
    if expected != received {
        return Err(CodecError::InvalidChecksum {
            expected,
            actual: received,
        });
    }

    Ok(&message[3..checksum_at])
}

//! BER definite-length octets (X.690 8.1.3).
//!
//! Lengths up to 127 use the short form. Longer ones use the long form with
//! up to four subsequent octets. The indefinite form (0x80) is never valid in
//! SNMP and is rejected.

use crate::error::{DecodeErrorKind, Error, Result};

/// Largest length the decoder accepts.
///
/// No UDP datagram can carry more, so anything larger is garbage.
pub const MAX_LENGTH: usize = 65535;

/// Length octets for `len`, least significant first.
///
/// [`EncodeBuf`](super::EncodeBuf) builds messages back to front, so the
/// octets come out in the order they are pushed.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];
    if len < 0x80 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let mut rest = len;
    let mut count = 0;
    while rest > 0 && count < 4 {
        buf[count] = rest as u8;
        rest >>= 8;
        count += 1;
    }
    buf[count] = 0x80 | count as u8;
    (buf, count + 1)
}

/// Decode the length octets at the start of `data`.
///
/// Returns the length and the number of octets consumed. `base_offset` is
/// where `data` starts in the message and only feeds error reporting.
/// Non-minimal long forms are accepted (X.690 8.1.3.5 Note 2).
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    match first {
        0x00..=0x7F => Ok((first as usize, 1)),
        0x80 => Err(Error::decode(base_offset, DecodeErrorKind::IndefiniteLength)),
        _ => {
            let octets = (first & 0x7F) as usize;
            if octets > 4 {
                return Err(Error::decode(
                    base_offset,
                    DecodeErrorKind::LengthTooLong { octets },
                ));
            }
            let Some(value) = data.get(1..=octets) else {
                return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
            };

            let len = value.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
            if len > MAX_LENGTH {
                return Err(Error::decode(
                    base_offset,
                    DecodeErrorKind::LengthExceedsMax {
                        length: len,
                        max: MAX_LENGTH,
                    },
                ));
            }
            Ok((len, 1 + octets))
        }
    }
}

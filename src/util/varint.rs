use integer_encoding::VarInt;

use crate::FormatError;

/// Maximum number of bytes a 64 bit varint can occupy.
pub const MAX_VARINT_BYTES: usize = 10;

const CONTINUATION_BIT: u8 = 0x80;

/// Appends the varint encoding of `value` to `output`.
///
/// Each byte carries 7 bits of payload (least significant group first); every byte
/// except the last one has its high bit set. The encoding is always minimal, so
/// `0` is written as a single `0x00` byte.
///
/// Returns the number of bytes written.
///
/// # Example
/// ```rust
/// # use pmtiles_index::util::write_varint;
/// let mut output = Vec::new();
/// write_varint(&mut output, 624_485);
/// assert_eq!(output, [0xe5, 0x8e, 0x26]);
/// ```
pub fn write_varint(output: &mut Vec<u8>, value: u64) -> usize {
    let mut buf = [0u8; MAX_VARINT_BYTES];
    let len = value.encode_var(&mut buf);
    output.extend_from_slice(&buf[..len]);
    len
}

/// A cursor reading successive varints from a byte slice.
///
/// Keeps track of its position so errors can report the byte offset
/// at which decoding failed.
#[derive(Debug, Clone)]
pub struct VarIntDecoder<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> VarIntDecoder<'a> {
    /// Creates a new decoder positioned at the first byte of `bytes`.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Offset (in bytes) of the next byte to be read.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes not consumed yet.
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Reads the next varint.
    ///
    /// # Errors
    /// Will return [`Err`] with [`FormatError::UnexpectedEnd`] if the data ends before
    /// the terminating byte and with [`FormatError::VarIntOverflow`] if the encoded
    /// value does not fit into 64 bits.
    ///
    /// # Example
    /// ```rust
    /// # use pmtiles_index::util::VarIntDecoder;
    /// let mut decoder = VarIntDecoder::new(&[0x00, 0x7f, 0xe5, 0x8e, 0x26]);
    /// assert_eq!(decoder.read_varint().unwrap(), 0);
    /// assert_eq!(decoder.read_varint().unwrap(), 127);
    /// assert_eq!(decoder.read_varint().unwrap(), 624_485);
    /// assert!(decoder.read_varint().is_err());
    /// ```
    pub fn read_varint(&mut self) -> Result<u64, FormatError> {
        let start = self.position;
        let rest = &self.bytes[start..];

        let Some(last) = rest
            .iter()
            .take(MAX_VARINT_BYTES)
            .position(|b| b & CONTINUATION_BIT == 0)
        else {
            return Err(if rest.len() < MAX_VARINT_BYTES {
                FormatError::UnexpectedEnd {
                    offset: self.bytes.len(),
                }
            } else {
                FormatError::VarIntOverflow { offset: start }
            });
        };

        // the tenth byte only has room for the 64th bit
        if last == MAX_VARINT_BYTES - 1 && rest[last] > 1 {
            return Err(FormatError::VarIntOverflow { offset: start });
        }

        let (value, len) =
            u64::decode_var(&rest[..=last]).ok_or(FormatError::VarIntOverflow { offset: start })?;
        self.position += len;

        Ok(value)
    }
}

/// Little-endian field extraction for characteristic packets
use thiserror::Error;

/// Raised when a field would read past the end of the packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("field at offset {offset} needs {width} bytes, packet has {len}")]
pub struct BufferTooShort {
    pub offset: usize,
    pub width: usize,
    pub len: usize,
}

/// Wire type of a single packet field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    Float32,
}

impl FieldType {
    /// Number of bytes the field occupies in a packet
    pub const fn width(self) -> usize {
        match self {
            FieldType::UInt8 | FieldType::Int8 => 1,
            FieldType::UInt16 | FieldType::Int16 => 2,
            FieldType::Float32 => 4,
        }
    }

    /// Decode this field from `buffer` at `offset`
    ///
    /// All firmwares send little-endian values; `Float32` is IEEE-754 single
    /// precision. The bounds check runs for every field so a truncated packet
    /// fails at the first field that does not fit.
    ///
    /// # Returns
    /// The decoded value widened to `f64` and the number of bytes consumed
    pub fn decode(self, buffer: &[u8], offset: usize) -> Result<(f64, usize), BufferTooShort> {
        let width = self.width();
        let bytes = offset
            .checked_add(width)
            .and_then(|end| buffer.get(offset..end))
            .ok_or(BufferTooShort {
                offset,
                width,
                len: buffer.len(),
            })?;

        let value = match self {
            FieldType::UInt8 => bytes[0] as f64,
            FieldType::Int8 => bytes[0] as i8 as f64,
            FieldType::UInt16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            FieldType::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            FieldType::Float32 => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
        };

        Ok((value, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_match_wire_sizes() {
        assert_eq!(FieldType::UInt8.width(), 1);
        assert_eq!(FieldType::Int8.width(), 1);
        assert_eq!(FieldType::UInt16.width(), 2);
        assert_eq!(FieldType::Int16.width(), 2);
        assert_eq!(FieldType::Float32.width(), 4);
    }

    #[test]
    fn decodes_signed_and_unsigned_16_bit() {
        assert_eq!(FieldType::Int16.decode(&[0x01, 0x00], 0), Ok((1.0, 2)));
        assert_eq!(FieldType::Int16.decode(&[0xFF, 0xFF], 0), Ok((-1.0, 2)));
        assert_eq!(FieldType::UInt16.decode(&[0xFF, 0xFF], 0), Ok((65535.0, 2)));
        assert_eq!(FieldType::Int16.decode(&[0x00, 0x80], 0), Ok((-32768.0, 2)));
    }

    #[test]
    fn decodes_8_bit() {
        assert_eq!(FieldType::UInt8.decode(&[0xFE], 0), Ok((254.0, 1)));
        assert_eq!(FieldType::Int8.decode(&[0xFE], 0), Ok((-2.0, 1)));
    }

    #[test]
    fn decodes_float32() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(FieldType::Float32.decode(&bytes, 0), Ok((1.5, 4)));

        // -2.25 = 0xC0100000
        let (value, _) = FieldType::Float32
            .decode(&[0x00, 0x00, 0x10, 0xC0], 0)
            .unwrap();
        assert_eq!(value, -2.25);
    }

    #[test]
    fn honours_offset() {
        let packet = [0xAA, 0x34, 0x12];
        assert_eq!(FieldType::UInt16.decode(&packet, 1), Ok((4660.0, 2)));
    }

    #[test]
    fn rejects_reads_past_the_end() {
        let err = FieldType::Int16.decode(&[0x01, 0x02, 0x03], 2).unwrap_err();
        assert_eq!(
            err,
            BufferTooShort {
                offset: 2,
                width: 2,
                len: 3
            }
        );
        assert!(FieldType::UInt8.decode(&[], 0).is_err());
        assert!(FieldType::Float32.decode(&[0; 4], usize::MAX).is_err());
    }
}

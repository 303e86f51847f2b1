use crate::{stream::Stream, AmlError};
use alloc::vec::Vec;
use bit_field::BitField;

/// A decoded PkgLength: the raw encoded value (which includes the length
/// bytes themselves) and the absolute offset at which the package ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PkgLength {
    pub raw_length: u32,
    pub end_offset: usize,
}

/// Decodes a PkgLength at the stream cursor.
///
/// The lead byte's top two bits give the number of extra bytes. With no extra
/// bytes, bits 0..6 hold the value; otherwise the lead byte contributes only
/// its low nibble and each extra byte is shifted in at `4 + i * 8`.
pub fn parse_pkg_length(stream: &mut Stream) -> Result<PkgLength, AmlError> {
    let start = stream.offset();
    let raw_length = parse_pkg_length_raw(stream)?;
    let end_offset = start + raw_length as usize;
    if raw_length as usize > stream.offset() - start + stream.remaining() {
        return Err(AmlError::ScopeMismatch);
    }
    Ok(PkgLength { raw_length, end_offset })
}

/// Decodes the variable-width length encoding without interpreting the value
/// as a byte count. Field lengths inside field lists use the same encoding
/// but count bits, so no bounds check applies.
pub fn parse_pkg_length_raw(stream: &mut Stream) -> Result<u32, AmlError> {
    let lead = stream.read_u8()?;
    let byte_count = lead.get_bits(6..8);

    if byte_count == 0 {
        return Ok(u32::from(lead.get_bits(0..6)));
    }
    if lead.get_bits(4..6) != 0 {
        return Err(AmlError::InvalidPkgLength);
    }
    let mut length = u32::from(lead.get_bits(0..4));
    for i in 0..byte_count {
        length |= u32::from(stream.read_u8()?) << (4 + i * 8);
    }
    Ok(length)
}

impl PkgLength {
    /// Bytes of package content remaining after the length bytes themselves.
    pub fn content_length(&self, stream: &Stream) -> usize {
        self.end_offset.saturating_sub(stream.offset())
    }
}

/// Encodes a package length in the smallest legal width.
///
/// `include_self` covers the normal case where the length bytes count toward
/// the value; field lengths (`NamedField`/`ReservedField`) set it to `false`.
pub fn encode_pkg_length(content_length: usize, include_self: bool) -> Vec<u8> {
    let byte_count = if content_length < (1 << 6) - 1 {
        0
    } else if content_length < (1 << 12) - 2 {
        1
    } else if content_length < (1 << 20) - 3 {
        2
    } else {
        3
    };
    let length = content_length + if include_self { byte_count + 1 } else { 0 };

    let mut bytes = Vec::with_capacity(byte_count + 1);
    if byte_count == 0 {
        bytes.push(length as u8);
    } else {
        bytes.push(((byte_count as u8) << 6) | (length & 0xf) as u8);
        for i in 0..byte_count {
            bytes.push((length >> (4 + i * 8)) as u8);
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<PkgLength, AmlError> {
        let mut stream = Stream::new(bytes);
        parse_pkg_length(&mut stream)
    }

    #[test]
    fn test_one_byte_forms() {
        assert_eq!(decode(&[0x01]), Ok(PkgLength { raw_length: 1, end_offset: 1 }));
        let mut buf = alloc::vec![0x3f];
        buf.extend_from_slice(&[0; 62]);
        assert_eq!(decode(&buf), Ok(PkgLength { raw_length: 63, end_offset: 63 }));
    }

    #[test]
    fn test_multi_byte_forms() {
        let mut buf = alloc::vec![0x41, 0x32];
        buf.resize(0x321, 0);
        assert_eq!(decode(&buf), Ok(PkgLength { raw_length: 0x321, end_offset: 0x321 }));

        // Reserved bits set in the lead byte of a multi-byte form.
        assert_eq!(decode(&[0x71, 0x32, 0x00]), Err(AmlError::InvalidPkgLength));
    }

    #[test]
    fn test_length_beyond_buffer() {
        assert_eq!(decode(&[0x3f, 0x00]), Err(AmlError::ScopeMismatch));
    }

    #[test]
    fn test_encode_widths() {
        assert_eq!(encode_pkg_length(0x05, true), alloc::vec![0x06]);
        assert_eq!(encode_pkg_length(0x3e, true), alloc::vec![0x3f]);
        // 63 bytes of content no longer fits the one-byte form.
        assert_eq!(encode_pkg_length(0x3f, true).len(), 2);
        assert_eq!(encode_pkg_length(0x321 - 2, true), alloc::vec![0x41, 0x32]);
        assert_eq!(encode_pkg_length(0x1000, true).len(), 3);
        assert_eq!(encode_pkg_length(0x10_0000, true).len(), 4);
        // Field lengths do not count their own encoding.
        assert_eq!(encode_pkg_length(0x08, false), alloc::vec![0x08]);
    }

    #[test]
    fn test_round_trip() {
        for content in [0usize, 5, 62, 63, 64, 0xffe, 0xfff, 0xf_ffff, 0x10_0000] {
            let encoded = encode_pkg_length(content, true);
            let mut buf = encoded.clone();
            buf.resize(encoded.len() + content, 0);
            let decoded = decode(&buf).unwrap();
            assert_eq!(decoded.raw_length as usize, encoded.len() + content);
        }
    }
}

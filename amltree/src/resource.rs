//! Decoding and encoding of resource descriptor buffers, as produced by
//! `_CRS` and friends. Decoding is strictly sequential: every descriptor's
//! declared length is checked against its fixed layout before any field is
//! read, and a buffer that ends mid-record is an error rather than a short
//! result.

use crate::AmlError;
use alloc::{vec, vec::Vec};
use bit_field::BitField;
use byteorder::{ByteOrder, LittleEndian};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Resource {
    Irq(IrqDescriptor),
    Dma { channel_mask: u8, flags: u8 },
    StartDependentFunctions { priority: Option<u8> },
    EndDependentFunctions,
    IoPort(IoPortDescriptor),
    FixedIoPort { base: u16, length: u8 },
    FixedDma { request_line: u16, channel: u16, transfer_width: u8 },
    VendorDefined(Vec<u8>),
    Memory24 { info: u8, minimum: u16, maximum: u16, alignment: u16, length: u16 },
    Memory32 { info: u8, minimum: u32, maximum: u32, alignment: u32, length: u32 },
    Memory32Fixed { info: u8, base: u32, length: u32 },
    GenericRegister { address_space: u8, bit_width: u8, bit_offset: u8, access_size: u8, address: u64 },
    AddressSpace(AddressSpaceDescriptor),
    ExtendedInterrupt { flags: u8, interrupts: Vec<u32> },
    /// GPIO, serial bus and pin descriptors are length-validated but carried
    /// as raw payloads.
    LargeRaw { descriptor_type: u8, data: Vec<u8> },
    EndTag,
}

/// A small IRQ format descriptor. The flags byte is optional in the encoding;
/// when absent the interrupt is edge-triggered, active-high, exclusive.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IrqDescriptor {
    pub mask: u16,
    pub flags: Option<u8>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IoPortDescriptor {
    pub decode_16bit: bool,
    pub minimum: u16,
    pub maximum: u16,
    pub alignment: u8,
    pub length: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddressSpaceWidth {
    Word,
    DWord,
    QWord,
    Extended,
}

/// The common shape of the word/dword/qword/extended address space
/// descriptors, widened to 64 bits.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AddressSpaceDescriptor {
    pub width: AddressSpaceWidth,
    /// 0 = memory range, 1 = I/O range, 2 = bus number range.
    pub resource_type: u8,
    pub general_flags: u8,
    pub type_specific_flags: u8,
    pub granularity: u64,
    pub minimum: u64,
    pub maximum: u64,
    pub translation_offset: u64,
    pub length: u64,
    /// Only present on extended address space descriptors.
    pub type_specific_attributes: Option<u64>,
}

pub const RESOURCE_TYPE_MEMORY: u8 = 0;
pub const RESOURCE_TYPE_IO: u8 = 1;
pub const RESOURCE_TYPE_BUS_NUMBER: u8 = 2;

/// Decodes a whole resource buffer. Stops at the end tag; running off the end
/// of the buffer mid-record fails with `ResourceDescriptorTooShort`, and a
/// descriptor whose declared length does not fit its layout fails with
/// `ResourceLengthMismatch`.
pub fn parse_resource_data(bytes: &[u8]) -> Result<Vec<Resource>, AmlError> {
    let mut resources = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let tag = bytes[offset];
        if tag.get_bit(7) {
            /*
             * Large descriptor. Bits 0-6 of the tag are the type; the next
             * two bytes are a little-endian data length.
             */
            if bytes.len() - offset < 3 {
                return Err(AmlError::ResourceDescriptorTooShort);
            }
            let descriptor_type = tag.get_bits(0..7);
            let length = LittleEndian::read_u16(&bytes[offset + 1..offset + 3]) as usize;
            let end = offset + 3 + length;
            if end > bytes.len() {
                return Err(AmlError::ResourceDescriptorTooShort);
            }
            resources.push(parse_large_descriptor(descriptor_type, &bytes[offset + 1 + 2..end])?);
            offset = end;
        } else {
            /*
             * Small descriptor. Bits 3-6 of the tag are the type, bits 0-2
             * the data length.
             */
            let descriptor_type = tag.get_bits(3..7);
            let length = tag.get_bits(0..3) as usize;
            let end = offset + 1 + length;
            if end > bytes.len() {
                return Err(AmlError::ResourceDescriptorTooShort);
            }
            let data = &bytes[offset + 1..end];

            if descriptor_type == 0x0f {
                if length != 1 {
                    return Err(AmlError::ResourceLengthMismatch(descriptor_type));
                }
                resources.push(Resource::EndTag);
                return Ok(resources);
            }
            resources.push(parse_small_descriptor(descriptor_type, data)?);
            offset = end;
        }
    }
    Ok(resources)
}

fn parse_small_descriptor(descriptor_type: u8, data: &[u8]) -> Result<Resource, AmlError> {
    match descriptor_type {
        // IRQ format: a 16-bit level mask, with an optional flags byte.
        0x04 => match data.len() {
            2 => Ok(Resource::Irq(IrqDescriptor {
                mask: LittleEndian::read_u16(data),
                flags: None,
            })),
            3 => Ok(Resource::Irq(IrqDescriptor {
                mask: LittleEndian::read_u16(&data[0..2]),
                flags: Some(data[2]),
            })),
            _ => Err(AmlError::ResourceLengthMismatch(descriptor_type)),
        },
        0x05 => match data {
            [channel_mask, flags] => Ok(Resource::Dma { channel_mask: *channel_mask, flags: *flags }),
            _ => Err(AmlError::ResourceLengthMismatch(descriptor_type)),
        },
        0x06 => match data {
            [] => Ok(Resource::StartDependentFunctions { priority: None }),
            [priority] => Ok(Resource::StartDependentFunctions { priority: Some(*priority) }),
            _ => Err(AmlError::ResourceLengthMismatch(descriptor_type)),
        },
        0x07 => match data {
            [] => Ok(Resource::EndDependentFunctions),
            _ => Err(AmlError::ResourceLengthMismatch(descriptor_type)),
        },
        0x08 => {
            if data.len() != 7 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            Ok(Resource::IoPort(IoPortDescriptor {
                decode_16bit: data[0].get_bit(0),
                minimum: LittleEndian::read_u16(&data[1..3]),
                maximum: LittleEndian::read_u16(&data[3..5]),
                alignment: data[5],
                length: data[6],
            }))
        }
        0x09 => {
            if data.len() != 3 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            Ok(Resource::FixedIoPort { base: LittleEndian::read_u16(&data[0..2]), length: data[2] })
        }
        0x0a => {
            if data.len() != 5 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            Ok(Resource::FixedDma {
                request_line: LittleEndian::read_u16(&data[0..2]),
                channel: LittleEndian::read_u16(&data[2..4]),
                transfer_width: data[4],
            })
        }
        0x0e => Ok(Resource::VendorDefined(data.to_vec())),
        _ => Err(AmlError::ReservedResourceType(descriptor_type)),
    }
}

fn parse_large_descriptor(descriptor_type: u8, data: &[u8]) -> Result<Resource, AmlError> {
    match descriptor_type {
        0x01 => {
            if data.len() != 9 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            Ok(Resource::Memory24 {
                info: data[0],
                minimum: LittleEndian::read_u16(&data[1..3]),
                maximum: LittleEndian::read_u16(&data[3..5]),
                alignment: LittleEndian::read_u16(&data[5..7]),
                length: LittleEndian::read_u16(&data[7..9]),
            })
        }
        0x02 => {
            if data.len() != 12 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            Ok(Resource::GenericRegister {
                address_space: data[0],
                bit_width: data[1],
                bit_offset: data[2],
                access_size: data[3],
                address: LittleEndian::read_u64(&data[4..12]),
            })
        }
        0x04 => Ok(Resource::VendorDefined(data.to_vec())),
        0x05 => {
            if data.len() != 17 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            Ok(Resource::Memory32 {
                info: data[0],
                minimum: LittleEndian::read_u32(&data[1..5]),
                maximum: LittleEndian::read_u32(&data[5..9]),
                alignment: LittleEndian::read_u32(&data[9..13]),
                length: LittleEndian::read_u32(&data[13..17]),
            })
        }
        0x06 => {
            if data.len() != 9 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            Ok(Resource::Memory32Fixed {
                info: data[0],
                base: LittleEndian::read_u32(&data[1..5]),
                length: LittleEndian::read_u32(&data[5..9]),
            })
        }
        0x07 => address_space_descriptor(descriptor_type, data, AddressSpaceWidth::DWord),
        0x08 => address_space_descriptor(descriptor_type, data, AddressSpaceWidth::Word),
        0x09 => {
            /*
             * Extended interrupt: a flags byte, an interrupt count, then that
             * many 4-byte interrupt numbers. Anything after them is the
             * optional resource source.
             */
            if data.len() < 2 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            let count = data[1] as usize;
            if data.len() < 2 + count * 4 {
                return Err(AmlError::ResourceLengthMismatch(descriptor_type));
            }
            let interrupts = (0..count)
                .map(|i| LittleEndian::read_u32(&data[2 + i * 4..6 + i * 4]))
                .collect();
            Ok(Resource::ExtendedInterrupt { flags: data[0], interrupts })
        }
        0x0a => address_space_descriptor(descriptor_type, data, AddressSpaceWidth::QWord),
        0x0b => address_space_descriptor(descriptor_type, data, AddressSpaceWidth::Extended),
        0x0c..=0x12 => Ok(Resource::LargeRaw { descriptor_type, data: data.to_vec() }),
        _ => Err(AmlError::ReservedResourceType(descriptor_type)),
    }
}

fn address_space_descriptor(
    descriptor_type: u8,
    data: &[u8],
    width: AddressSpaceWidth,
) -> Result<Resource, AmlError> {
    /*
     * Common prefix: resource type, general flags, type-specific flags. The
     * extended form inserts a revision byte and a reserved byte before its
     * five 8-byte address fields and trailing attributes; the others may
     * carry an optional resource source after their address fields.
     */
    let (field_size, fields_at, fixed_length) = match width {
        AddressSpaceWidth::Word => (2, 3, 13),
        AddressSpaceWidth::DWord => (4, 3, 23),
        AddressSpaceWidth::QWord => (8, 3, 43),
        AddressSpaceWidth::Extended => (8, 5, 53),
    };
    if data.len() < fixed_length {
        return Err(AmlError::ResourceLengthMismatch(descriptor_type));
    }

    let read = |index: usize| -> u64 {
        let at = fields_at + index * field_size;
        match field_size {
            2 => LittleEndian::read_u16(&data[at..at + 2]) as u64,
            4 => LittleEndian::read_u32(&data[at..at + 4]) as u64,
            _ => LittleEndian::read_u64(&data[at..at + 8]),
        }
    };

    Ok(Resource::AddressSpace(AddressSpaceDescriptor {
        width,
        resource_type: data[0],
        general_flags: data[1],
        type_specific_flags: data[2],
        granularity: read(0),
        minimum: read(1),
        maximum: read(2),
        translation_offset: read(3),
        length: read(4),
        type_specific_attributes: match width {
            AddressSpaceWidth::Extended => Some(LittleEndian::read_u64(&data[45..53])),
            _ => None,
        },
    }))
}

/*
 * Encoding helpers, used by the builder's resource template synthesis. Each
 * appends one descriptor to `out`.
 */

fn push_large_header(out: &mut Vec<u8>, descriptor_type: u8, length: u16) {
    out.push(0x80 | descriptor_type);
    out.extend_from_slice(&length.to_le_bytes());
}

pub fn encode_word_address_space(
    out: &mut Vec<u8>,
    resource_type: u8,
    type_specific_flags: u8,
    granularity: u16,
    minimum: u16,
    maximum: u16,
    translation_offset: u16,
    length: u16,
) {
    push_large_header(out, 0x08, 13);
    out.push(resource_type);
    // Min and max are fixed.
    out.push(0x0c);
    out.push(type_specific_flags);
    for field in [granularity, minimum, maximum, translation_offset, length] {
        out.extend_from_slice(&field.to_le_bytes());
    }
}

pub fn encode_dword_address_space(
    out: &mut Vec<u8>,
    resource_type: u8,
    type_specific_flags: u8,
    granularity: u32,
    minimum: u32,
    maximum: u32,
    translation_offset: u32,
    length: u32,
) {
    push_large_header(out, 0x07, 23);
    out.push(resource_type);
    out.push(0x0c);
    out.push(type_specific_flags);
    for field in [granularity, minimum, maximum, translation_offset, length] {
        out.extend_from_slice(&field.to_le_bytes());
    }
}

pub fn encode_qword_address_space(
    out: &mut Vec<u8>,
    resource_type: u8,
    type_specific_flags: u8,
    granularity: u64,
    minimum: u64,
    maximum: u64,
    translation_offset: u64,
    length: u64,
) {
    push_large_header(out, 0x0a, 43);
    out.push(resource_type);
    out.push(0x0c);
    out.push(type_specific_flags);
    for field in [granularity, minimum, maximum, translation_offset, length] {
        out.extend_from_slice(&field.to_le_bytes());
    }
}

pub fn encode_io_port(out: &mut Vec<u8>, minimum: u16, maximum: u16, alignment: u8, length: u8) {
    out.push(0x47);
    // 16-bit decode.
    out.push(0x01);
    out.extend_from_slice(&minimum.to_le_bytes());
    out.extend_from_slice(&maximum.to_le_bytes());
    out.push(alignment);
    out.push(length);
}

pub fn encode_memory32_fixed(out: &mut Vec<u8>, read_write: bool, base: u32, length: u32) {
    push_large_header(out, 0x06, 9);
    out.push(read_write as u8);
    out.extend_from_slice(&base.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
}

pub fn encode_irq(out: &mut Vec<u8>, mask: u16) {
    out.push(0x22);
    out.extend_from_slice(&mask.to_le_bytes());
}

pub fn encode_extended_interrupt(out: &mut Vec<u8>, flags: u8, interrupts: &[u32]) {
    push_large_header(out, 0x09, (2 + interrupts.len() * 4) as u16);
    out.push(flags);
    out.push(interrupts.len() as u8);
    for interrupt in interrupts {
        out.extend_from_slice(&interrupt.to_le_bytes());
    }
}

/// The end tag. The trailing byte is a checksum over the descriptor bytes
/// which everything treats as "unchecked" when zero.
pub fn encode_end_tag(out: &mut Vec<u8>) {
    out.extend_from_slice(&[0x79, 0x00]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_io_and_irq() {
        let mut buffer = Vec::new();
        encode_io_port(&mut buffer, 0x3f8, 0x3f8, 0x01, 0x08);
        encode_irq(&mut buffer, 1 << 4);
        encode_end_tag(&mut buffer);

        let resources = parse_resource_data(&buffer).unwrap();
        assert_eq!(
            resources,
            vec![
                Resource::IoPort(IoPortDescriptor {
                    decode_16bit: true,
                    minimum: 0x3f8,
                    maximum: 0x3f8,
                    alignment: 0x01,
                    length: 0x08,
                }),
                Resource::Irq(IrqDescriptor { mask: 1 << 4, flags: None }),
                Resource::EndTag,
            ]
        );
    }

    #[test]
    fn test_parse_address_spaces() {
        let mut buffer = Vec::new();
        encode_word_address_space(&mut buffer, RESOURCE_TYPE_BUS_NUMBER, 0, 0, 0, 0xff, 0, 0x100);
        encode_dword_address_space(
            &mut buffer,
            RESOURCE_TYPE_MEMORY,
            0,
            0,
            0x8000_0000,
            0xbfff_ffff,
            0,
            0x4000_0000,
        );
        encode_end_tag(&mut buffer);

        let resources = parse_resource_data(&buffer).unwrap();
        assert_eq!(resources.len(), 3);
        let Resource::AddressSpace(bus) = &resources[0] else { panic!() };
        assert_eq!(bus.width, AddressSpaceWidth::Word);
        assert_eq!(bus.resource_type, RESOURCE_TYPE_BUS_NUMBER);
        assert_eq!((bus.minimum, bus.maximum, bus.length), (0, 0xff, 0x100));
        let Resource::AddressSpace(memory) = &resources[1] else { panic!() };
        assert_eq!(memory.width, AddressSpaceWidth::DWord);
        assert_eq!((memory.minimum, memory.length), (0x8000_0000, 0x4000_0000));
    }

    #[test]
    fn test_parse_extended_interrupt() {
        let mut buffer = Vec::new();
        encode_extended_interrupt(&mut buffer, 0x01, &[16, 17]);
        encode_end_tag(&mut buffer);

        let resources = parse_resource_data(&buffer).unwrap();
        assert_eq!(
            resources[0],
            Resource::ExtendedInterrupt { flags: 0x01, interrupts: vec![16, 17] }
        );
    }

    #[test]
    fn test_truncated_buffer_fails() {
        let mut buffer = Vec::new();
        encode_memory32_fixed(&mut buffer, true, 0xfed0_0000, 0x1000);
        // Chop the descriptor mid-record.
        buffer.truncate(buffer.len() - 3);
        assert_eq!(parse_resource_data(&buffer), Err(AmlError::ResourceDescriptorTooShort));
    }

    #[test]
    fn test_declared_length_must_match_layout() {
        // A 32-bit fixed memory descriptor claiming 8 data bytes.
        let mut buffer = vec![0x86, 0x08, 0x00];
        buffer.extend_from_slice(&[0u8; 8]);
        assert_eq!(parse_resource_data(&buffer), Err(AmlError::ResourceLengthMismatch(0x06)));
    }

    #[test]
    fn test_reserved_tag_is_rejected() {
        assert_eq!(parse_resource_data(&[0x18]), Err(AmlError::ReservedResourceType(0x03)));
    }
}

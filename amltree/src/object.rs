//! Runtime objects produced and consumed by the interpreter. Buffers and
//! packages are shared handles so that stores through references and buffer
//! fields are visible to every holder, the way operation region fields and
//! `Index` references behave on real firmware.

use crate::{namespace::AmlName, tree::Tree, AmlError};
use alloc::{
    boxed::Box,
    collections::BTreeMap,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use bitvec::prelude::*;
use core::fmt;
use spinning_top::Spinlock;

/// The backing store of a buffer, plus any named bit fields carved out of it
/// by `Field` lists or `CreateXField` operators.
pub struct BufferData {
    pub bytes: Vec<u8>,
    pub fields: BTreeMap<String, FieldLayout>,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldLayout {
    pub bit_offset: usize,
    pub bit_length: usize,
    /// Access width in bits. Reads and writes are performed in aligned units
    /// of this width against the handler for operation regions.
    pub access_width: usize,
}

impl BufferData {
    pub fn new(bytes: Vec<u8>) -> BufferData {
        BufferData { bytes, fields: BTreeMap::new() }
    }

    pub fn create_field(&mut self, name: &str, layout: FieldLayout) {
        self.fields.insert(name.to_string(), layout);
    }

    /// Reads a named bit field. Fields up to 64 bits wide come back as an
    /// integer; wider ones as a packed little-endian buffer.
    pub fn read_field(&self, name: &str) -> Result<Object, AmlError> {
        let layout = *self.fields.get(name).ok_or(AmlError::UndefinedBufferField)?;
        let bits = self.bytes.view_bits::<Lsb0>();
        if layout.bit_offset + layout.bit_length > bits.len() {
            return Err(AmlError::BufferFieldOutOfBounds);
        }
        let field = &bits[layout.bit_offset..layout.bit_offset + layout.bit_length];

        if layout.bit_length <= 64 {
            let mut value = 0u64;
            for (i, bit) in field.iter().by_vals().enumerate() {
                if bit {
                    value |= 1 << i;
                }
            }
            Ok(Object::Integer(value))
        } else {
            let mut bytes = alloc::vec![0u8; (layout.bit_length + 7) / 8];
            bytes.view_bits_mut::<Lsb0>()[..layout.bit_length].clone_from_bitslice(field);
            Ok(Object::buffer(bytes))
        }
    }

    /// Writes a named bit field, truncating the value to the field's width.
    pub fn write_field(&mut self, name: &str, value: &Object) -> Result<(), AmlError> {
        let layout = *self.fields.get(name).ok_or(AmlError::UndefinedBufferField)?;
        let bits = self.bytes.view_bits_mut::<Lsb0>();
        if layout.bit_offset + layout.bit_length > bits.len() {
            return Err(AmlError::BufferFieldOutOfBounds);
        }
        let field = &mut bits[layout.bit_offset..layout.bit_offset + layout.bit_length];

        match value {
            Object::Buffer(data) => {
                let data = data.lock();
                let source = data.bytes.view_bits::<Lsb0>();
                for i in 0..field.len() {
                    field.set(i, source.get(i).map(|b| *b).unwrap_or(false));
                }
            }
            _ => {
                let value = value.to_integer()?;
                for i in 0..field.len() {
                    field.set(i, i < 64 && value & (1 << i) != 0);
                }
            }
        }
        Ok(())
    }
}

type NativeMethod = fn(&[Object]) -> Result<Object, AmlError>;

#[derive(Clone)]
pub enum Object {
    Uninitialized,
    Integer(u64),
    String(String),
    Buffer(Arc<Spinlock<BufferData>>),
    /// A named bit field of a shared buffer.
    BufferField { buffer: Arc<Spinlock<BufferData>>, field: String },
    Package(Arc<Spinlock<Vec<Object>>>),
    /// An object reference, as produced by `RefOf`, `CondRefOf` and `Index`.
    /// An `Index` reference carries the element index alongside the container.
    Reference { inner: Box<Object>, index: Option<u64> },
    Device(AmlName),
    Method { scope: AmlName, flags: u8, body: Tree },
    PredefinedMethod { arg_count: usize, handler: NativeMethod },
}

impl Object {
    pub fn buffer(bytes: Vec<u8>) -> Object {
        Object::Buffer(Arc::new(Spinlock::new(BufferData::new(bytes))))
    }

    pub fn package(elements: Vec<Object>) -> Object {
        Object::Package(Arc::new(Spinlock::new(elements)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Uninitialized => "Uninitialized",
            Object::Integer(_) => "Integer",
            Object::String(_) => "String",
            Object::Buffer(_) => "Buffer",
            Object::BufferField { .. } => "BufferField",
            Object::Package(_) => "Package",
            Object::Reference { .. } => "Reference",
            Object::Device(_) => "Device",
            Object::Method { .. } | Object::PredefinedMethod { .. } => "Method",
        }
    }

    /// The ACPI object type code reported by `ObjectType`.
    pub fn type_code(&self) -> u64 {
        match self {
            Object::Uninitialized | Object::Reference { .. } => 0,
            Object::Integer(_) => 1,
            Object::String(_) => 2,
            Object::Buffer(_) => 3,
            Object::Package(_) => 4,
            Object::Device(_) => 6,
            Object::Method { .. } | Object::PredefinedMethod { .. } => 8,
            Object::BufferField { .. } => 14,
        }
    }

    pub fn to_integer(&self) -> Result<u64, AmlError> {
        match self {
            Object::Integer(value) => Ok(*value),
            // String conversion is hexadecimal, matching ToInteger's handling
            // of undecorated digit strings in firmware.
            Object::String(string) => {
                u64::from_str_radix(string.trim(), 16).map_err(|_| AmlError::InvalidConversion)
            }
            Object::Buffer(data) => {
                let data = data.lock();
                let mut value = 0u64;
                for (i, &byte) in data.bytes.iter().take(8).enumerate() {
                    value |= (byte as u64) << (i * 8);
                }
                Ok(value)
            }
            Object::BufferField { buffer, field } => {
                buffer.lock().read_field(field)?.to_integer()
            }
            _ => Err(AmlError::InvalidConversion),
        }
    }

    /// Converts to a fresh buffer. Integers widen to their full 64-bit
    /// little-endian representation.
    pub fn to_buffer_bytes(&self) -> Result<Vec<u8>, AmlError> {
        match self {
            Object::Integer(value) => Ok(value.to_le_bytes().to_vec()),
            Object::String(string) => Ok(string.bytes().collect()),
            Object::Buffer(data) => Ok(data.lock().bytes.clone()),
            Object::BufferField { buffer, field } => {
                buffer.lock().read_field(field)?.to_buffer_bytes()
            }
            _ => Err(AmlError::InvalidConversion),
        }
    }

    pub fn to_aml_string(&self) -> Result<String, AmlError> {
        match self {
            Object::String(string) => Ok(string.clone()),
            Object::Integer(value) => Ok(alloc::format!("{:#x}", value)),
            Object::Buffer(data) => {
                Ok(data.lock().bytes.iter().map(|&b| b as char).collect())
            }
            _ => Err(AmlError::InvalidConversion),
        }
    }

    pub fn to_decimal_string(&self) -> Result<String, AmlError> {
        match self {
            Object::String(string) => Ok(string.clone()),
            Object::Buffer(data) => {
                let data = data.lock();
                let parts: Vec<String> =
                    data.bytes.iter().map(|b| alloc::format!("{}", b)).collect();
                Ok(parts.join(","))
            }
            _ => Ok(alloc::format!("{}", self.to_integer()?)),
        }
    }

    pub fn to_hex_string(&self) -> Result<String, AmlError> {
        match self {
            Object::String(string) => Ok(string.clone()),
            Object::Buffer(data) => {
                let data = data.lock();
                let parts: Vec<String> =
                    data.bytes.iter().map(|b| alloc::format!("{:#04X}", b)).collect();
                Ok(parts.join(","))
            }
            _ => Ok(alloc::format!("{:#X}", self.to_integer()?)),
        }
    }

    /// The byte/element count reported by `SizeOf`.
    pub fn size_of(&self) -> Result<u64, AmlError> {
        match self {
            Object::String(string) => Ok(string.len() as u64),
            Object::Buffer(data) => Ok(data.lock().bytes.len() as u64),
            Object::Package(elements) => Ok(elements.lock().len() as u64),
            Object::Reference { inner, .. } => inner.size_of(),
            _ => Err(AmlError::InvalidConversion),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Uninitialized => write!(f, "Uninitialized"),
            Object::Integer(value) => write!(f, "Integer({:#x})", value),
            Object::String(string) => write!(f, "String({:?})", string),
            Object::Buffer(data) => write!(f, "Buffer({:x?})", data.lock().bytes),
            Object::BufferField { field, .. } => write!(f, "BufferField({:?})", field),
            Object::Package(elements) => write!(f, "Package({:?})", elements.lock()),
            Object::Reference { inner, index: Some(index) } => {
                write!(f, "Reference({:?}[{}])", inner, index)
            }
            Object::Reference { inner, index: None } => write!(f, "Reference({:?})", inner),
            Object::Device(path) => write!(f, "Device({})", path),
            Object::Method { flags, .. } => write!(f, "Method(flags={:#x})", flags),
            Object::PredefinedMethod { arg_count, .. } => {
                write!(f, "PredefinedMethod(args={})", arg_count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Object::String("1f".to_string()).to_integer(), Ok(0x1f));
        assert_eq!(Object::buffer(alloc::vec![0x34, 0x12]).to_integer(), Ok(0x1234));
        assert_eq!(Object::Integer(10).to_decimal_string().unwrap(), "10");
        assert_eq!(Object::Integer(0x1f).to_hex_string().unwrap(), "0x1F");
        assert!(Object::Uninitialized.to_integer().is_err());
    }

    #[test]
    fn test_buffer_fields() {
        let buffer = Object::buffer(alloc::vec![0x00, 0x00]);
        let Object::Buffer(data) = &buffer else { unreachable!() };
        data.lock().create_field(
            "FLAG",
            FieldLayout { bit_offset: 4, bit_length: 3, access_width: 8 },
        );

        data.lock().write_field("FLAG", &Object::Integer(0xff)).unwrap();
        // Truncated to 3 bits at offset 4.
        assert_eq!(data.lock().bytes, alloc::vec![0x70, 0x00]);
        assert_eq!(data.lock().read_field("FLAG").unwrap().to_integer(), Ok(0x7));
        assert!(data.lock().read_field("NONE").is_err());
    }

    #[test]
    fn test_shared_package() {
        let package = Object::package(alloc::vec![Object::Integer(1)]);
        let alias = package.clone();
        if let Object::Package(elements) = &alias {
            elements.lock()[0] = Object::Integer(2);
        }
        if let Object::Package(elements) = &package {
            assert_eq!(elements.lock()[0].to_integer(), Ok(2));
        }
        assert_eq!(package.size_of(), Ok(1));
    }
}

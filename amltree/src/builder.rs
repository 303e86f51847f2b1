//! Construction of parse trees from Rust values, for callers that synthesize
//! AML instead of (or in addition to) parsing it. Built trees use the same
//! node shapes the parser produces, so the binary generator handles both
//! uniformly. `PkgLength` children carry a zero placeholder; the generator
//! recomputes every package length from the encoded content.

use crate::{
    grammar::Construct,
    namespace::{AmlName, NameSeg},
    object::Object,
    resource,
    tree::{NodeValue, Tree},
    AmlError,
};
use alloc::{string::ToString, vec::Vec};

fn leaf(construct: Construct, value: NodeValue) -> Tree {
    Tree::with_value(construct, AmlName::root(), value)
}

pub fn byte_data(value: u8) -> Tree {
    leaf(Construct::ByteData, NodeValue::Integer(value as u64))
}

pub fn word_data(value: u16) -> Tree {
    leaf(Construct::WordData, NodeValue::Integer(value as u64))
}

pub fn dword_data(value: u32) -> Tree {
    leaf(Construct::DWordData, NodeValue::Integer(value as u64))
}

pub fn qword_data(value: u64) -> Tree {
    leaf(Construct::QWordData, NodeValue::Integer(value))
}

pub fn string_data(value: &str) -> Tree {
    leaf(Construct::StringData, NodeValue::String(value.to_string()))
}

pub fn byte_list(bytes: Vec<u8>) -> Tree {
    leaf(Construct::ByteList, NodeValue::Bytes(bytes))
}

pub fn name_seg(segment: &str) -> Result<Tree, AmlError> {
    let seg = NameSeg::from_str(segment)?;
    Ok(leaf(Construct::NameSeg, NodeValue::Name(AmlName::from_name_seg(seg))))
}

pub fn name_string(name: &str) -> Result<Tree, AmlError> {
    Ok(leaf(Construct::NameString, NodeValue::Name(AmlName::from_str(name)?)))
}

/// A package length placeholder. The generator ignores the stored value and
/// emits the minimal encoding of the actual content length.
pub fn pkg_length() -> Tree {
    leaf(Construct::PkgLength, NodeValue::Integer(0))
}

pub fn byte_const(value: u8) -> Tree {
    let mut node = Tree::new(Construct::ByteConst, AmlName::root());
    node.push_child(byte_data(value));
    node
}

pub fn word_const(value: u16) -> Tree {
    let mut node = Tree::new(Construct::WordConst, AmlName::root());
    node.push_child(word_data(value));
    node
}

pub fn dword_const(value: u32) -> Tree {
    let mut node = Tree::new(Construct::DWordConst, AmlName::root());
    node.push_child(dword_data(value));
    node
}

pub fn qword_const(value: u64) -> Tree {
    let mut node = Tree::new(Construct::QWordConst, AmlName::root());
    node.push_child(qword_data(value));
    node
}

/// Encodes an integer with the narrowest legal construct: the dedicated
/// `Zero`/`One`/`Ones` opcodes where they are exact, otherwise the smallest
/// `XXXXConst` prefix that fits.
pub fn integer(value: u64) -> Tree {
    match value {
        0 => Tree::new(Construct::ZeroOp, AmlName::root()),
        1 => Tree::new(Construct::OneOp, AmlName::root()),
        u64::MAX => Tree::new(Construct::OnesOp, AmlName::root()),
        value if value <= 0xff => byte_const(value as u8),
        value if value <= 0xffff => word_const(value as u16),
        value if value <= 0xffff_ffff => dword_const(value as u32),
        value => qword_const(value),
    }
}

pub fn string(value: &str) -> Tree {
    let mut node = Tree::new(Construct::String, AmlName::root());
    node.push_child(string_data(value));
    node
}

pub fn buffer(bytes: Vec<u8>) -> Tree {
    let mut node = Tree::new(Construct::DefBuffer, AmlName::root());
    node.push_child(pkg_length());
    node.push_child(integer(bytes.len() as u64));
    node.push_child(byte_list(bytes));
    node
}

pub fn package(elements: Vec<Tree>) -> Tree {
    let mut node = Tree::new(Construct::DefPackage, AmlName::root());
    node.push_child(pkg_length());
    node.push_child(byte_data(elements.len() as u8));
    let mut list = Tree::new(Construct::PackageElementList, AmlName::root());
    for element in elements {
        list.push_child(element);
    }
    node.push_child(list);
    node
}

/// Builds the tree encoding of a runtime object, where one exists. Objects
/// with no data encoding (devices, methods, references) yield `None`.
pub fn build_value(object: &Object) -> Option<Tree> {
    match object {
        Object::Integer(value) => Some(integer(*value)),
        Object::String(value) => Some(string(value)),
        Object::Buffer(data) => Some(buffer(data.lock().bytes.clone())),
        Object::Package(elements) => {
            let elements = elements.lock();
            let built: Option<Vec<Tree>> = elements.iter().map(build_value).collect();
            Some(package(built?))
        }
        _ => None,
    }
}

pub fn def_name(name: &str, value: Tree) -> Result<Tree, AmlError> {
    let mut node = Tree::new(Construct::DefName, AmlName::root());
    node.push_child(name_string(name)?);
    node.push_child(value);
    Ok(node)
}

pub fn def_device(name: &str, body: Vec<Tree>) -> Result<Tree, AmlError> {
    let mut node = Tree::new(Construct::DefDevice, AmlName::root());
    node.push_child(pkg_length());
    node.push_child(name_string(name)?);
    let mut term_list = Tree::new(Construct::TermList, AmlName::root());
    for term in body {
        term_list.push_child(term);
    }
    node.push_child(term_list);
    Ok(node)
}

pub fn method_invocation(name: &str, args: Vec<Tree>) -> Result<Tree, AmlError> {
    let mut node = leaf(Construct::MethodInvocation, NodeValue::Name(AmlName::from_str(name)?));
    for arg in args {
        node.push_child(arg);
    }
    Ok(node)
}

/// Assembles a `_CRS`-style resource buffer from semantic parameters. The
/// end tag and its zero checksum byte are appended by [`finish`].
///
/// [`finish`]: ResourceTemplate::finish
#[derive(Default)]
pub struct ResourceTemplate {
    bytes: Vec<u8>,
}

impl ResourceTemplate {
    pub fn new() -> ResourceTemplate {
        ResourceTemplate::default()
    }

    /// A producing bus number range, as a host bridge `_CRS` declares.
    pub fn bus_range(mut self, minimum: u16, maximum: u16) -> ResourceTemplate {
        resource::encode_word_address_space(
            &mut self.bytes,
            resource::RESOURCE_TYPE_BUS_NUMBER,
            0,
            0,
            minimum,
            maximum,
            0,
            maximum - minimum + 1,
        );
        self
    }

    pub fn io_port(mut self, minimum: u16, maximum: u16, alignment: u8, length: u8) -> ResourceTemplate {
        resource::encode_io_port(&mut self.bytes, minimum, maximum, alignment, length);
        self
    }

    /// A forwarded I/O window, encoded as a word address space descriptor.
    pub fn io_window(mut self, minimum: u16, maximum: u16) -> ResourceTemplate {
        resource::encode_word_address_space(
            &mut self.bytes,
            resource::RESOURCE_TYPE_IO,
            // Entire range decoded.
            0x03,
            0,
            minimum,
            maximum,
            0,
            maximum - minimum + 1,
        );
        self
    }

    pub fn memory_window_32(mut self, base: u32, length: u32) -> ResourceTemplate {
        resource::encode_dword_address_space(
            &mut self.bytes,
            resource::RESOURCE_TYPE_MEMORY,
            // Non-cacheable, read-write.
            0x01,
            0,
            base,
            base + (length - 1),
            0,
            length,
        );
        self
    }

    pub fn memory_window_64(mut self, base: u64, length: u64) -> ResourceTemplate {
        resource::encode_qword_address_space(
            &mut self.bytes,
            resource::RESOURCE_TYPE_MEMORY,
            0x01,
            0,
            base,
            base + (length - 1),
            0,
            length,
        );
        self
    }

    pub fn memory32_fixed(mut self, base: u32, length: u32) -> ResourceTemplate {
        resource::encode_memory32_fixed(&mut self.bytes, true, base, length);
        self
    }

    pub fn irq(mut self, mask: u16) -> ResourceTemplate {
        resource::encode_irq(&mut self.bytes, mask);
        self
    }

    pub fn interrupt(mut self, flags: u8, gsi: u32) -> ResourceTemplate {
        resource::encode_extended_interrupt(&mut self.bytes, flags, &[gsi]);
        self
    }

    /// Appends the end tag and wraps the descriptors in a `DefBuffer` tree.
    pub fn finish(mut self) -> Tree {
        resource::encode_end_tag(&mut self.bytes);
        buffer(self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{parse_resource_data, Resource};

    #[test]
    fn test_minimal_integer_widths() {
        assert_eq!(integer(0).construct, Construct::ZeroOp);
        assert_eq!(integer(1).construct, Construct::OneOp);
        assert_eq!(integer(u64::MAX).construct, Construct::OnesOp);
        assert_eq!(integer(0xff).construct, Construct::ByteConst);
        assert_eq!(integer(0x100).construct, Construct::WordConst);
        assert_eq!(integer(0x10000).construct, Construct::DWordConst);
        assert_eq!(integer(0x1_0000_0000).construct, Construct::QWordConst);
    }

    #[test]
    fn test_def_name_shape() {
        let node = def_name("_ADR", integer(0x1f0000)).unwrap();
        assert_eq!(node.construct, Construct::DefName);
        assert_eq!(node.child("NameString").unwrap().as_name().unwrap().as_string(), "_ADR");
        assert_eq!(node.child("DataRefObject").unwrap().construct, Construct::DWordConst);
    }

    #[test]
    fn test_device_with_body() {
        let device = def_device(
            "PCI0",
            alloc::vec![
                def_name("_HID", integer(0x030ad041)).unwrap(),
                def_name("_ADR", integer(0)).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(device.construct, Construct::DefDevice);
        assert_eq!(device.child("TermList").unwrap().children.len(), 2);
    }

    #[test]
    fn test_build_value_round_trips_shapes() {
        let package = Object::package(alloc::vec![
            Object::Integer(3),
            Object::String("id".into()),
        ]);
        let tree = build_value(&package).unwrap();
        assert_eq!(tree.construct, Construct::DefPackage);
        let list = tree.child("PackageElementList").unwrap();
        assert_eq!(list.children[0].construct, Construct::ByteConst);
        assert_eq!(list.children[1].construct, Construct::String);

        assert!(build_value(&Object::Uninitialized).is_none());
    }

    #[test]
    fn test_resource_template_decodes() {
        let crs = ResourceTemplate::new()
            .bus_range(0, 0xff)
            .io_port(0x3f8, 0x3f8, 0x01, 0x08)
            .interrupt(0x01, 36)
            .finish();

        let bytes = crs.child("ByteList").unwrap().as_bytes().unwrap().to_vec();
        // The buffer must sum its end-tag checksum byte to a parseable whole.
        let resources = parse_resource_data(&bytes).unwrap();
        assert_eq!(resources.len(), 4);
        assert_eq!(resources[3], Resource::EndTag);
        assert_eq!(
            resources[2],
            Resource::ExtendedInterrupt { flags: 0x01, interrupts: alloc::vec![36] }
        );
    }
}

//! Generation of definition-block bytes from parse trees.
//!
//! Generation is bottom-up: every package's content is encoded first, then
//! wrapped in a freshly computed minimal-width PkgLength, so trees built by
//! hand (whose `PkgLength` children are placeholders) and trees produced by
//! the parser encode identically. A fully parsed table regenerates
//! byte-for-byte, provided its source used minimal-width package lengths.

use crate::{
    grammar::{self, Construct},
    namespace::{AmlName, NameComponent},
    opcode::*,
    pkg_length::encode_pkg_length,
    tree::Tree,
    AmlError,
};
use alloc::vec::Vec;

pub struct GenerateBinaryVisitor;

impl GenerateBinaryVisitor {
    /// Generates the byte encoding of `tree`. For an `AmlCode` root the
    /// header's `Length` and `CheckSum` fields are patched after generation
    /// so the emitted table sums to zero.
    pub fn generate(tree: &Tree) -> Result<Vec<u8>, AmlError> {
        generate_node(tree)
    }
}

/// Convenience wrapper over [`GenerateBinaryVisitor::generate`].
pub fn tree_to_bytes(tree: &Tree) -> Result<Vec<u8>, AmlError> {
    GenerateBinaryVisitor::generate(tree)
}

fn generate_node(node: &Tree) -> Result<Vec<u8>, AmlError> {
    // A deferred stub has no children to encode and its source bytes are
    // gone; the caller gets an error rather than a hole in the table.
    if node.deferred.is_some() {
        return Err(AmlError::UnexpandedDeferredRange);
    }

    let mut out = Vec::new();
    match node.construct {
        Construct::AmlCode => {
            for child in &node.children {
                out.extend(generate_node(child)?);
            }
            let length = out.len() as u32;
            out[4..8].copy_from_slice(&length.to_le_bytes());
            out[9] = 0;
            let sum = out.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte));
            out[9] = sum.wrapping_neg();
        }

        Construct::ByteData => out.push(node.as_integer()? as u8),
        Construct::WordData => out.extend_from_slice(&(node.as_integer()? as u16).to_le_bytes()),
        Construct::DWordData => out.extend_from_slice(&(node.as_integer()? as u32).to_le_bytes()),
        Construct::TWordData => out.extend_from_slice(&node.as_integer()?.to_le_bytes()[..6]),
        Construct::QWordData => out.extend_from_slice(&node.as_integer()?.to_le_bytes()),
        Construct::StringData => {
            out.extend_from_slice(node.as_str()?.as_bytes());
            out.push(0x00);
        }
        Construct::ByteList => out.extend_from_slice(node.as_bytes()?),
        Construct::NameString => encode_name_string(node.as_name()?, &mut out),
        Construct::NameSeg => {
            let seg = node
                .as_name()?
                .last_segment()
                .ok_or(AmlError::WrongNodeValue(Construct::NameSeg))?;
            out.extend_from_slice(&seg.bytes());
        }
        // Package lengths are recomputed by the enclosing construct.
        Construct::PkgLength => (),

        Construct::ArgObj => out.push(ARG0_OP as u8 + node.as_integer()? as u8),
        Construct::LocalObj => out.push(LOCAL0_OP as u8 + node.as_integer()? as u8),
        Construct::NullName => out.push(NULL_NAME),

        Construct::MethodInvocation => {
            encode_name_string(node.as_name()?, &mut out);
            for arg in &node.children {
                out.extend(generate_node(arg)?);
            }
        }

        Construct::TermList | Construct::FieldList | Construct::PackageElementList => {
            for child in &node.children {
                out.extend(generate_node(child)?);
            }
        }

        // Field elements carry a prefix byte the grammar layout does not
        // cover, and their lengths use the non-self-inclusive encoding.
        Construct::NamedField => {
            out.extend(generate_node(node.required("NameSeg")?)?);
            let length = node.required("FieldLength")?.as_integer()?;
            out.extend(encode_pkg_length(length as usize, false));
        }
        Construct::ReservedField => {
            out.push(RESERVED_FIELD_PREFIX);
            let length = node.required("FieldLength")?.as_integer()?;
            out.extend(encode_pkg_length(length as usize, false));
        }
        Construct::AccessField => {
            out.push(ACCESS_FIELD_PREFIX);
            out.push(node.required("AccessType")?.as_integer()? as u8);
            out.push(node.required("AccessAttrib")?.as_integer()? as u8);
        }
        Construct::ConnectField => {
            out.push(CONNECT_FIELD_PREFIX);
            out.extend(generate_node(node.required("ConnectFieldDef")?)?);
        }
        Construct::ExtendedAccessField => {
            out.push(EXTENDED_ACCESS_FIELD_PREFIX);
            for child in &node.children {
                out.extend(generate_node(child)?);
            }
        }

        construct => {
            let Some(layout) = grammar::sequence(construct) else {
                return Err(AmlError::NotImplemented("construct has no byte encoding"));
            };
            if let Some(opcode) = grammar::opcode_of(construct) {
                encode_opcode(opcode, &mut out);
            }

            if layout.first() == Some(&grammar::Field::PkgLength) {
                /*
                 * The first child is the PkgLength placeholder; everything
                 * after it is package content, except that an if's trailing
                 * else arm sits outside the if's own package.
                 */
                let mut content = Vec::new();
                let mut trailing_else = None;
                for child in node.children.iter().skip(1) {
                    if construct == Construct::DefIfElse && child.construct == Construct::DefElse {
                        trailing_else = Some(generate_node(child)?);
                    } else {
                        content.extend(generate_node(child)?);
                    }
                }
                out.extend(encode_pkg_length(content.len(), true));
                out.extend(content);
                if let Some(bytes) = trailing_else {
                    out.extend(bytes);
                }
            } else {
                for child in &node.children {
                    out.extend(generate_node(child)?);
                }
            }
        }
    }
    Ok(out)
}

fn encode_opcode(opcode: u16, out: &mut Vec<u8>) {
    if opcode > 0xff {
        out.push(EXT_OP_PREFIX);
        out.push((opcode >> 8) as u8);
    } else {
        out.push(opcode as u8);
    }
}

fn encode_name_string(name: &AmlName, out: &mut Vec<u8>) {
    let mut segments = Vec::new();
    for component in &name.0 {
        match component {
            NameComponent::Root => out.push(ROOT_CHAR),
            NameComponent::Prefix => out.push(PREFIX_CHAR),
            NameComponent::Segment(seg) => segments.push(seg),
        }
    }
    match segments.len() {
        0 => out.push(NULL_NAME),
        1 => out.extend_from_slice(&segments[0].bytes()),
        2 => {
            out.push(DUAL_NAME_PREFIX);
            out.extend_from_slice(&segments[0].bytes());
            out.extend_from_slice(&segments[1].bytes());
        }
        count => {
            out.push(MULTI_NAME_PREFIX);
            out.push(count as u8);
            for seg in segments {
                out.extend_from_slice(&seg.bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder, context::Context, parser::parse_table, test_utils::make_test_table};

    fn round_trip(body: &[u8]) {
        let table = make_test_table(body);
        let mut context = Context::new();
        let tree = parse_table(&mut context, &table).unwrap();
        assert_eq!(tree_to_bytes(&tree).unwrap(), table);
    }

    #[test]
    fn test_round_trip_declarations() {
        // Scope(\_SB_) { Device(PCI0) { Name(_ADR, Zero) Name(_STR, "pci") } }
        let mut body = alloc::vec![0x10, 0x1d, b'\\', b'_', b'S', b'B', b'_'];
        body.extend_from_slice(&[0x5b, 0x82, 0x15, b'P', b'C', b'I', b'0']);
        body.extend_from_slice(&[0x08, b'_', b'A', b'D', b'R', 0x00]);
        body.extend_from_slice(&[0x08, b'_', b'S', b'T', b'R', 0x0d, b'p', b'c', b'i', 0x00]);
        round_trip(&body);
    }

    #[test]
    fn test_round_trip_method_and_control_flow() {
        // Method(TST_, 1) { If (LEqual(Arg0, One)) { Return(One) }
        // Else { Return(Zero) } }
        let body = [
            0x14, 0x11, b'T', b'S', b'T', b'_', 0x01,
            0xa0, 0x06, 0x93, 0x68, 0x01, 0xa4, 0x01,
            0xa1, 0x03, 0xa4, 0x00,
        ];
        round_trip(&body);
    }

    #[test]
    fn test_round_trip_fields_and_buffers() {
        // OperationRegion(GPIO, SystemIO, 0x400, 0x10)
        // Field(GPIO, ByteAcc, NoLock, Preserve) { , 4, FLD0, 3 }
        // Name(BUF_, Buffer(4) { 1, 2 })
        let mut body = alloc::vec![
            0x5b, 0x80, b'G', b'P', b'I', b'O', 0x01, 0x0b, 0x00, 0x04, 0x0a, 0x10,
        ];
        body.extend_from_slice(&[
            0x5b, 0x81, 0x0d, b'G', b'P', b'I', b'O', 0x01,
            0x00, 0x04,
            b'F', b'L', b'D', b'0', 0x03,
        ]);
        body.extend_from_slice(&[
            0x08, b'B', b'U', b'F', b'_', 0x11, 0x05, 0x0a, 0x04, 0x01, 0x02,
        ]);
        round_trip(&body);
    }

    #[test]
    fn test_round_trip_package_and_multi_segment_names() {
        // Name(\_S5_, Package { Zero, Zero }) and an invocation-free
        // reference through a dual name.
        let body = [
            0x08, b'\\', b'_', b'S', b'5', b'_',
            0x12, 0x04, 0x02, 0x00, 0x00,
        ];
        round_trip(&body);
    }

    #[test]
    fn test_generated_table_sums_to_zero() {
        let body = [0x08, b'F', b'O', b'O', b'_', 0x0a, 0x2a];
        let table = make_test_table(&body);
        let mut context = Context::new();
        let tree = parse_table(&mut context, &table).unwrap();

        let generated = tree_to_bytes(&tree).unwrap();
        assert_eq!(generated.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte)), 0);
        let declared = u32::from_le_bytes([generated[4], generated[5], generated[6], generated[7]]);
        assert_eq!(declared as usize, generated.len());
    }

    #[test]
    fn test_builder_trees_encode() {
        let node = builder::def_name("FOO_", builder::integer(0x2a)).unwrap();
        assert_eq!(
            tree_to_bytes(&node).unwrap(),
            alloc::vec![0x08, b'F', b'O', b'O', b'_', 0x0a, 0x2a]
        );

        let buffer = builder::buffer(alloc::vec![0x01, 0x02]);
        assert_eq!(
            tree_to_bytes(&buffer).unwrap(),
            alloc::vec![0x11, 0x05, 0x0a, 0x02, 0x01, 0x02]
        );
    }

    #[test]
    fn test_name_string_encodings() {
        let mut out = Vec::new();
        encode_name_string(&AmlName::from_str("\\_SB_.PCI0.ISA_").unwrap(), &mut out);
        let mut expected = alloc::vec![b'\\', 0x2f, 0x03];
        expected.extend_from_slice(b"_SB_PCI0ISA_");
        assert_eq!(out, expected);

        let mut out = Vec::new();
        encode_name_string(&AmlName::from_str("^^FOO_.BAR_").unwrap(), &mut out);
        let mut expected = alloc::vec![b'^', b'^', 0x2e];
        expected.extend_from_slice(b"FOO_BAR_");
        assert_eq!(out, expected);

        let mut out = Vec::new();
        encode_name_string(&AmlName::root(), &mut out);
        assert_eq!(out, alloc::vec![b'\\', 0x00]);
    }
}

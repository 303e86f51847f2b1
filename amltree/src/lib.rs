//! A library for parsing, interpreting, generating and rewriting AML (ACPI
//! Machine Language) definition blocks, centred on an explicit parse tree.
//!
//! A table is parsed with [`parse_table`] into a [`Tree`] while its named
//! symbols are collected into a [`Context`]. The tree can then be walked
//! (see [`visitors`]), evaluated against platform hardware through an
//! [`Interpreter`] and a caller-supplied [`Handler`], edited or synthesized
//! from scratch with [`builder`], and encoded back to table bytes with
//! [`tree_to_bytes`].
//!
//! ```ignore
//! let mut context = Context::new();
//! let tree = parse_table(&mut context, table_bytes)?;
//! let mut interpreter = Interpreter::new(&mut context, handler);
//! let value = interpreter.interpret_method_call(&AmlName::from_str("\\_SB_.PCI0._STA")?, &[])?;
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

extern crate alloc;

pub mod binary;
pub mod builder;
pub mod context;
pub mod grammar;
pub mod interpreter;
pub mod namespace;
pub mod object;
pub mod parser;
pub mod pci_routing;
pub mod resource;
pub mod tree;
pub mod visitors;

mod opcode;
mod pkg_length;
mod stream;
#[cfg(test)]
mod test_utils;

pub use binary::{tree_to_bytes, GenerateBinaryVisitor};
pub use context::Context;
pub use interpreter::Interpreter;
pub use namespace::AmlName;
pub use object::Object;
pub use parser::parse_table;
pub use pci_routing::PciRoutingTable;
pub use resource::{parse_resource_data, Resource};
pub use tree::Tree;
pub use visitors::print_layout;

use alloc::string::String;
use grammar::Construct;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AmlError {
    /*
     * Errors produced while reading a byte stream.
     */
    UnexpectedEndOfStream,
    UnexpectedByte(u8),
    UnknownOpcode(u16),
    InvalidPkgLength,
    /// A package or deferred range was closed at a different stream position
    /// than its declared length promised.
    ScopeMismatch,
    InvalidTableLength,

    /*
     * Errors produced when handling names.
     */
    InvalidNameSeg,
    EmptyNamesAreInvalid,
    InvalidNormalizedName(String),
    RootHasNoParent,
    UndefinedSymbol(String),

    /*
     * Errors produced while building or consuming parse trees.
     */
    WrongNodeValue(Construct),
    MissingTreeField(Construct, &'static str),
    /// A method body was invoked before its deferred range was expanded.
    MethodBodyNotExpanded(String),
    /// A deferred stub with no parsed children cannot be encoded.
    UnexpandedDeferredRange,

    /*
     * Errors produced while evaluating objects.
     */
    InvalidConversion,
    InvalidFieldFlags(u8),
    UndefinedBufferField,
    BufferFieldOutOfBounds,
    /// `Break` or `Continue` reached a method boundary without an enclosing
    /// `While`.
    FlowControlOutsideLoop,
    DivideByZero,
    IndexOutOfBounds(u64),
    InvalidMatchOpcode(u8),
    /// A `Fatal` statement was executed, with its type and code operands.
    FatalError(u8, u32),
    NotImplemented(&'static str),

    /*
     * Errors produced while decoding resource descriptors.
     */
    ResourceDescriptorTooShort,
    ResourceLengthMismatch(u8),
    ReservedResourceType(u8),

    /*
     * Errors produced while decoding `_PRT` objects.
     */
    PrtInvalidEntry,
    PrtInvalidAddress,
    PrtInvalidPin,
    PrtInvalidSource,
    PrtInvalidGsi,
    PrtNoEntry,
}

/// The interface from the interpreter to the hosting platform. Operation
/// region accesses are dispatched through this trait, so the library never
/// touches hardware directly.
pub trait Handler {
    fn read_u8(&self, address: usize) -> u8;
    fn read_u16(&self, address: usize) -> u16;
    fn read_u32(&self, address: usize) -> u32;
    fn read_u64(&self, address: usize) -> u64;

    fn write_u8(&mut self, address: usize, value: u8);
    fn write_u16(&mut self, address: usize, value: u16);
    fn write_u32(&mut self, address: usize, value: u32);
    fn write_u64(&mut self, address: usize, value: u64);

    fn read_io_u8(&self, port: u16) -> u8;
    fn read_io_u16(&self, port: u16) -> u16;
    fn read_io_u32(&self, port: u16) -> u32;

    fn write_io_u8(&mut self, port: u16, value: u8);
    fn write_io_u16(&mut self, port: u16, value: u16);
    fn write_io_u32(&mut self, port: u16, value: u32);

    fn read_pci_u8(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u8;
    fn read_pci_u16(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u16;
    fn read_pci_u32(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u32;

    fn write_pci_u8(&mut self, segment: u16, bus: u8, device: u8, function: u8, offset: u16, value: u8);
    fn write_pci_u16(&mut self, segment: u16, bus: u8, device: u8, function: u8, offset: u16, value: u16);
    fn write_pci_u32(&mut self, segment: u16, bus: u8, device: u8, function: u8, offset: u16, value: u32);
}

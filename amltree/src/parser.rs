//! The two-pass table parser.
//!
//! The first pass walks the whole definition block, driving one generic
//! sequence walker off the grammar's layout tables and registering symbols as
//! their declarations appear. Method bodies are never expanded on the first
//! pass: their byte ranges are recorded and skipped, both because the
//! surrounding table may define names the body uses and because most bodies
//! are never executed. Any other construct that fails to parse inside a
//! package (typically an invocation of a method declared later) is likewise
//! recorded and skipped rather than failing the table.
//!
//! The second pass repeatedly re-parses the recorded ranges until no more of
//! them make progress. Each range gets at most two attempts; anything still
//! unexpanded after that is left as a deferred stub and logged.

use crate::{
    context::{
        AliasDecl, Context, DeviceDecl, ExternalDecl, FieldSource, MethodDecl, NamedDecl,
        OperationFieldDecl, OperationRegionDecl, Symbol,
    },
    grammar::{self, Construct, Field},
    namespace::{is_lead_name_char, AmlName, NameComponent, NameSeg},
    opcode::*,
    pkg_length::{parse_pkg_length, parse_pkg_length_raw},
    stream::Stream,
    tree::{DeferredRange, NodeValue, Tree, Visitor},
    AmlError,
};
use alloc::{vec::Vec};
use log::{debug, warn};

/// How a parse attempt failed: a hard error, or a resolution failure that a
/// second pass may fix once more of the table has been loaded.
#[derive(Debug)]
pub(crate) enum ParseFault {
    Error(AmlError),
    Defer(AmlError),
}

impl From<AmlError> for ParseFault {
    fn from(err: AmlError) -> ParseFault {
        ParseFault::Error(err)
    }
}

impl From<ParseFault> for AmlError {
    fn from(fault: ParseFault) -> AmlError {
        match fault {
            ParseFault::Error(err) | ParseFault::Defer(err) => err,
        }
    }
}

type ParseResult = Result<Tree, ParseFault>;

/// Parses a complete definition block (header included) into a tree, loading
/// every declaration into `context`.
pub fn parse_table(context: &mut Context, data: &[u8]) -> Result<Tree, AmlError> {
    let mut parser = Parser { stream: Stream::new(data), context };

    let header = parser.parse_sequence(Construct::DefBlockHeader)?;
    let declared_length = header.required("TableLength")?.as_integer()?;
    if declared_length as usize != data.len() {
        return Err(AmlError::InvalidTableLength);
    }
    if data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte)) != 0 {
        warn!("definition block checksum does not sum to zero");
    }

    parser.context.push_scope(AmlName::root());
    let term_list = parser.parse_term_list_to_scope_end();
    parser.context.pop_scope();
    let term_list = term_list.map_err(AmlError::from)?;

    let mut root = Tree::new(Construct::AmlCode, AmlName::root());
    root.push_child(header);
    root.push_child(term_list);

    expand_deferred(context, data, &mut root);

    let mut attach = AttachDefinitions { context };
    root.walk(&mut attach);
    context.skip_external_on_lookup = true;

    Ok(root)
}

pub(crate) struct Parser<'a, 'c> {
    pub(crate) stream: Stream<'a>,
    pub(crate) context: &'c mut Context,
}

impl<'a, 'c> Parser<'a, 'c> {
    /// Parses one construct by walking its layout table, recovering to a
    /// deferred stub if anything inside its package fails.
    pub(crate) fn parse_sequence(&mut self, construct: Construct) -> ParseResult {
        let start = self.stream.offset();
        let depth = self.stream.scope_depth();
        if grammar::opcode_of(construct).is_some() {
            self.stream.read_opcode()?;
        }

        let mut node = Tree::new(construct, self.context.current_scope());
        let mut pkg_end = None;
        let mut ns_pushed = false;

        let outcome = self
            .parse_fields(construct, &mut node, &mut pkg_end, &mut ns_pushed)
            .and_then(|()| self.register_sequence(&node).map_err(ParseFault::from));

        if ns_pushed {
            self.context.pop_scope();
        }

        match outcome {
            Ok(()) => Ok(node),
            Err(fault) => {
                self.stream.truncate_scopes(depth);
                let Some(end) = pkg_end else { return Err(fault) };
                match &fault {
                    ParseFault::Defer(err) => {
                        debug!("deferring {:?} at {:#x}: {:?}", construct, start, err)
                    }
                    ParseFault::Error(err) => {
                        debug!("retrying {:?} at {:#x} on the second pass: {:?}", construct, start, err)
                    }
                }
                self.stream.seek(end)?;
                node.children.clear();
                node.value = NodeValue::None;
                node.deferred =
                    Some(DeferredRange { start, end, scope: node.scope.clone(), attempts: 0 });
                Ok(node)
            }
        }
    }

    fn parse_fields(
        &mut self,
        construct: Construct,
        node: &mut Tree,
        pkg_end: &mut Option<usize>,
        ns_pushed: &mut bool,
    ) -> Result<(), ParseFault> {
        let Some(layout) = grammar::sequence(construct) else {
            return Err(AmlError::NotImplemented("construct has no sequence layout").into());
        };
        let mut scope_pushed = false;

        for field in layout {
            match field {
                Field::PkgLength => {
                    let pkg = parse_pkg_length(&mut self.stream)?;
                    self.stream.push_scope(pkg.content_length(&self.stream))?;
                    scope_pushed = true;
                    *pkg_end = Some(pkg.end_offset);
                    node.push_child(Tree::with_value(
                        Construct::PkgLength,
                        node.scope.clone(),
                        NodeValue::Integer(pkg.raw_length as u64),
                    ));
                }
                Field::FieldLength => {
                    let length = parse_pkg_length_raw(&mut self.stream)?;
                    node.push_child(Tree::with_value(
                        Construct::PkgLength,
                        node.scope.clone(),
                        NodeValue::Integer(length as u64),
                    ));
                }
                Field::NameString => {
                    let name = self.parse_name_string()?;
                    node.push_child(Tree::with_value(
                        Construct::NameString,
                        node.scope.clone(),
                        NodeValue::Name(name.clone()),
                    ));
                    if grammar::creates_scope(construct) && !*ns_pushed {
                        let resolved = name.resolve(&self.context.current_scope())?;
                        self.context.push_scope(resolved);
                        *ns_pushed = true;
                    }
                }
                Field::NameSeg => {
                    let seg = self.parse_name_seg()?;
                    node.push_child(Tree::with_value(
                        Construct::NameSeg,
                        node.scope.clone(),
                        NodeValue::Name(AmlName::from_name_seg(seg)),
                    ));
                }
                Field::ByteData => self.push_integer(node, Construct::ByteData, 1)?,
                Field::WordData => self.push_integer(node, Construct::WordData, 2)?,
                Field::DWordData => self.push_integer(node, Construct::DWordData, 4)?,
                Field::TWordData => self.push_integer(node, Construct::TWordData, 6)?,
                Field::QWordData => self.push_integer(node, Construct::QWordData, 8)?,
                Field::StringData => {
                    let string = self.stream.read_string()?;
                    node.push_child(Tree::with_value(
                        Construct::StringData,
                        node.scope.clone(),
                        NodeValue::String(string),
                    ));
                }
                Field::TermArg => {
                    let arg = self.parse_term_arg()?;
                    node.push_child(arg);
                }
                Field::SuperName => {
                    let name = self.parse_super_name()?;
                    node.push_child(name);
                }
                Field::SimpleName => {
                    let name = self.parse_simple_name()?;
                    node.push_child(name);
                }
                Field::Target => {
                    let target = self.parse_target()?;
                    node.push_child(target);
                }
                Field::TermList => {
                    if construct == Construct::DefMethod {
                        let Some(end) = *pkg_end else {
                            return Err(AmlError::MissingTreeField(construct, "PkgLength").into());
                        };
                        self.defer_method_body(node, end)?;
                    } else {
                        let list = self.parse_term_list_to_scope_end()?;
                        node.push_child(list);
                    }
                }
                Field::FieldList => {
                    let list = self.parse_field_list()?;
                    node.push_child(list);
                }
                Field::ByteList => {
                    let bytes = self.stream.read_to_scope_end()?;
                    node.push_child(Tree::with_value(
                        Construct::ByteList,
                        node.scope.clone(),
                        NodeValue::Bytes(bytes.to_vec()),
                    ));
                }
                Field::PackageElementList => {
                    let list = self.parse_package_element_list()?;
                    node.push_child(list);
                }
                Field::DataRefObject => {
                    let object = self.parse_data_ref_object()?;
                    node.push_child(object);
                }
                Field::OptionalElse => {
                    // The if package closes before any else arm begins.
                    self.stream.pop_scope(false)?;
                    scope_pushed = false;
                    if !self.stream.at_scope_end()
                        && self.stream.peek_opcode()? == DEF_ELSE_OP
                    {
                        let else_node = self.parse_sequence(Construct::DefElse)?;
                        node.push_child(else_node);
                    }
                }
            }
        }

        if scope_pushed {
            self.stream.pop_scope(false)?;
        }
        Ok(())
    }

    fn push_integer(
        &mut self,
        node: &mut Tree,
        construct: Construct,
        bytes: usize,
    ) -> Result<(), ParseFault> {
        let value = self.stream.read_integer(bytes)?;
        node.push_child(Tree::with_value(construct, node.scope.clone(), NodeValue::Integer(value)));
        Ok(())
    }

    /// Registers the method under its (already pushed) scope and records its
    /// body for the second pass.
    fn defer_method_body(&mut self, node: &mut Tree, pkg_end: usize) -> Result<(), ParseFault> {
        let flags = node.required("MethodFlags")?.as_integer()? as u8;
        let path = self.context.current_scope();
        self.context.register_symbol(Symbol::Method(MethodDecl {
            name: path.clone(),
            arg_count: (flags & 0x07) as usize,
            flags,
            tree: None,
        }));

        let mut body = Tree::new(Construct::TermList, path.clone());
        body.deferred = Some(DeferredRange {
            start: self.stream.offset(),
            end: pkg_end,
            scope: path,
            attempts: 0,
        });
        node.push_child(body);
        self.stream.seek(pkg_end)?;
        Ok(())
    }

    /// Declaration side effects that run once a construct has fully parsed.
    fn register_sequence(&mut self, node: &Tree) -> Result<(), AmlError> {
        let resolve_name = |parser: &Parser, field: &'static str| -> Result<AmlName, AmlError> {
            node.required(field)?.as_name()?.resolve(&parser.context.current_scope())
        };

        match node.construct {
            Construct::DefName | Construct::DefMutex | Construct::DefEvent => {
                let name = resolve_name(self, "NameString")?;
                self.context.register_symbol(Symbol::Name(NamedDecl { name, tree: None }));
            }
            Construct::DefCreateBitField
            | Construct::DefCreateByteField
            | Construct::DefCreateWordField
            | Construct::DefCreateDWordField
            | Construct::DefCreateQWordField
            | Construct::DefCreateField => {
                let name = resolve_name(self, "NameString")?;
                self.context.register_symbol(Symbol::Name(NamedDecl { name, tree: None }));
            }
            // PowerRes, Processor and ThermalZone contents register under
            // their own scope during the body walk; the container itself is
            // just a name.
            Construct::DefPowerRes | Construct::DefProcessor | Construct::DefThermalZone => {
                let name = node.required("NameString")?.as_name()?.resolve(&node.scope)?;
                self.context.register_symbol(Symbol::Name(NamedDecl { name, tree: None }));
            }
            Construct::DefDevice => {
                let name = node.required("NameString")?.as_name()?.resolve(&node.scope)?;
                self.context.register_symbol(Symbol::Device(DeviceDecl { name, tree: None }));
            }
            Construct::DefExternal => {
                let name = resolve_name(self, "NameString")?;
                let object_type = node.required("ObjectType")?.as_integer()? as u8;
                let arg_count = node.required("ArgumentCount")?.as_integer()? as u8;
                self.context.register_symbol(Symbol::External(ExternalDecl {
                    name,
                    object_type,
                    arg_count,
                }));
            }
            Construct::DefOpRegion => {
                let name = resolve_name(self, "NameString")?;
                self.context.register_symbol(Symbol::OpRegion(OperationRegionDecl {
                    name,
                    tree: Some(node.clone()),
                }));
            }
            Construct::DefAlias => {
                let target = resolve_name(self, "SourceObject")?;
                let name = resolve_name(self, "AliasObject")?;
                self.context.register_symbol(Symbol::Alias(AliasDecl { name, target }));
            }
            Construct::DefField => {
                let region = resolve_name(self, "NameString")?;
                self.register_field_list(node, FieldSource::Region(region))?;
            }
            Construct::DefIndexField => {
                let index_field = resolve_name(self, "IndexName")?;
                let data_field = resolve_name(self, "DataName")?;
                self.register_field_list(node, FieldSource::Index { index_field, data_field })?;
            }
            Construct::DefBankField => {
                // Bank selection is not modelled; the fields are registered
                // against the region as plain fields.
                let region = resolve_name(self, "RegionName")?;
                self.register_field_list(node, FieldSource::Region(region))?;
            }
            _ => (),
        }
        Ok(())
    }

    /// Walks a parsed field list assigning bit offsets and registering each
    /// named field.
    fn register_field_list(&mut self, node: &Tree, source: FieldSource) -> Result<(), AmlError> {
        let flags = node.required("FieldFlags")?.as_integer()? as u8;
        let list = node.required("FieldList")?;

        let mut bit_offset = 0u64;
        let mut access_width = access_width_bits(flags & 0x0f)?;

        for element in &list.children {
            match element.construct {
                Construct::ReservedField => {
                    bit_offset += element.required("FieldLength")?.as_integer()?;
                }
                Construct::AccessField => {
                    let access_type = element.required("AccessType")?.as_integer()? as u8;
                    access_width = access_width_bits(access_type & 0x0f)?;
                }
                Construct::NamedField => {
                    let seg = element.required("NameSeg")?.as_name()?;
                    let bit_length = element.required("FieldLength")?.as_integer()?;
                    let name = seg.resolve(&self.context.current_scope())?;
                    self.context.register_symbol(Symbol::OpField(OperationFieldDecl {
                        name,
                        source: source.clone(),
                        bit_offset,
                        bit_length,
                        access_width,
                        flags,
                    }));
                    bit_offset += bit_length;
                }
                // Connection and extended access elements occupy no bits.
                _ => (),
            }
        }
        Ok(())
    }

    pub(crate) fn parse_term_list_to_scope_end(&mut self) -> ParseResult {
        let mut list = Tree::new(Construct::TermList, self.context.current_scope());
        while !self.stream.at_scope_end() {
            let term = self.parse_term_obj()?;
            list.push_child(term);
        }
        Ok(list)
    }

    pub(crate) fn parse_term_obj(&mut self) -> ParseResult {
        let byte = self.stream.peek_u8()?;
        if is_name_string_start(byte) {
            return self.parse_method_invocation();
        }

        let opcode = self.stream.peek_opcode()?;
        let construct = grammar::match_object(opcode)
            .or_else(|| grammar::match_statement_opcode(opcode))
            .or_else(|| grammar::match_expression_opcode(opcode))
            .ok_or(AmlError::UnknownOpcode(opcode))?;
        self.parse_sequence(construct)
    }

    fn parse_term_arg(&mut self) -> ParseResult {
        if let Some(node) = self.parse_arg_or_local()? {
            return Ok(node);
        }
        let byte = self.stream.peek_u8()?;
        if is_name_string_start(byte) {
            return self.parse_method_invocation();
        }
        let opcode = self.stream.peek_opcode()?;
        if let Some(construct) =
            grammar::match_data_object(opcode).or_else(|| grammar::match_expression_opcode(opcode))
        {
            return self.parse_sequence(construct);
        }
        Err(AmlError::UnexpectedByte(byte).into())
    }

    /// A term that begins with a name character is an invocation of (or a
    /// plain reference to) a named symbol. The symbol must already be known,
    /// since its argument count decides how many term args follow; an unknown
    /// name defers the enclosing package to the second pass.
    fn parse_method_invocation(&mut self) -> ParseResult {
        let scope = self.context.current_scope();
        let name = self.parse_name_string()?;
        let arg_count = match self.context.lookup(&name) {
            Ok((_, symbol)) => symbol.arg_count().unwrap_or(0),
            Err(err) => return Err(ParseFault::Defer(err)),
        };

        let mut node =
            Tree::with_value(Construct::MethodInvocation, scope, NodeValue::Name(name));
        for _ in 0..arg_count {
            let arg = self.parse_term_arg()?;
            node.push_child(arg);
        }
        Ok(node)
    }

    fn parse_arg_or_local(&mut self) -> Result<Option<Tree>, ParseFault> {
        let byte = self.stream.peek_u8()? as u16;
        let scope = self.context.current_scope();
        match byte {
            LOCAL0_OP..=LOCAL7_OP => {
                self.stream.read_u8()?;
                Ok(Some(Tree::with_value(
                    Construct::LocalObj,
                    scope,
                    NodeValue::Integer((byte - LOCAL0_OP) as u64),
                )))
            }
            ARG0_OP..=ARG6_OP => {
                self.stream.read_u8()?;
                Ok(Some(Tree::with_value(
                    Construct::ArgObj,
                    scope,
                    NodeValue::Integer((byte - ARG0_OP) as u64),
                )))
            }
            _ => Ok(None),
        }
    }

    fn parse_simple_name(&mut self) -> ParseResult {
        if let Some(node) = self.parse_arg_or_local()? {
            return Ok(node);
        }
        let name = self.parse_name_string()?;
        Ok(Tree::with_value(
            Construct::NameString,
            self.context.current_scope(),
            NodeValue::Name(name),
        ))
    }

    fn parse_super_name(&mut self) -> ParseResult {
        if let Some(node) = self.parse_arg_or_local()? {
            return Ok(node);
        }
        let byte = self.stream.peek_u8()?;
        if is_name_string_start(byte) {
            let name = self.parse_name_string()?;
            return Ok(Tree::with_value(
                Construct::NameString,
                self.context.current_scope(),
                NodeValue::Name(name),
            ));
        }
        match self.stream.peek_opcode()? {
            DEBUG_OP => self.parse_sequence(Construct::DebugObj),
            DEF_REF_OF_OP => self.parse_sequence(Construct::DefRefOf),
            DEF_DEREF_OF_OP => self.parse_sequence(Construct::DefDerefOf),
            DEF_INDEX_OP => self.parse_sequence(Construct::DefIndex),
            _ => Err(AmlError::UnexpectedByte(byte).into()),
        }
    }

    fn parse_target(&mut self) -> ParseResult {
        if self.stream.peek_u8()? == NULL_NAME {
            self.stream.read_u8()?;
            return Ok(Tree::new(Construct::NullName, self.context.current_scope()));
        }
        self.parse_super_name()
    }

    fn parse_data_ref_object(&mut self) -> ParseResult {
        let opcode = self.stream.peek_opcode()?;
        match grammar::match_data_object(opcode) {
            Some(construct) => self.parse_sequence(construct),
            None => Err(AmlError::UnexpectedByte(self.stream.peek_u8()?).into()),
        }
    }

    fn parse_field_list(&mut self) -> ParseResult {
        let mut list = Tree::new(Construct::FieldList, self.context.current_scope());
        while !self.stream.at_scope_end() {
            let byte = self.stream.peek_u8()?;
            let construct = match byte {
                RESERVED_FIELD_PREFIX => Construct::ReservedField,
                ACCESS_FIELD_PREFIX => Construct::AccessField,
                CONNECT_FIELD_PREFIX => Construct::ConnectField,
                EXTENDED_ACCESS_FIELD_PREFIX => Construct::ExtendedAccessField,
                _ if is_lead_name_char(byte) => Construct::NamedField,
                _ => return Err(AmlError::UnexpectedByte(byte).into()),
            };
            if construct != Construct::NamedField {
                self.stream.read_u8()?;
            }
            let element = self.parse_sequence(construct)?;
            list.push_child(element);
        }
        Ok(list)
    }

    fn parse_package_element_list(&mut self) -> ParseResult {
        let mut list = Tree::new(Construct::PackageElementList, self.context.current_scope());
        while !self.stream.at_scope_end() {
            let byte = self.stream.peek_u8()?;
            let element = if is_name_string_start(byte) {
                let name = self.parse_name_string()?;
                Tree::with_value(
                    Construct::NameString,
                    self.context.current_scope(),
                    NodeValue::Name(name),
                )
            } else {
                self.parse_data_ref_object()?
            };
            list.push_child(element);
        }
        Ok(list)
    }

    fn parse_name_string(&mut self) -> Result<AmlName, AmlError> {
        let mut components = Vec::new();
        match self.stream.peek_u8()? {
            ROOT_CHAR => {
                self.stream.read_u8()?;
                components.push(NameComponent::Root);
            }
            PREFIX_CHAR => {
                while self.stream.peek_u8()? == PREFIX_CHAR {
                    self.stream.read_u8()?;
                    components.push(NameComponent::Prefix);
                }
            }
            _ => (),
        }

        let seg_count = match self.stream.peek_u8()? {
            NULL_NAME => {
                self.stream.read_u8()?;
                0
            }
            DUAL_NAME_PREFIX => {
                self.stream.read_u8()?;
                2
            }
            MULTI_NAME_PREFIX => {
                self.stream.read_u8()?;
                self.stream.read_u8()? as usize
            }
            byte if is_lead_name_char(byte) => 1,
            byte => return Err(AmlError::UnexpectedByte(byte)),
        };
        for _ in 0..seg_count {
            components.push(NameComponent::Segment(self.parse_name_seg()?));
        }

        if components.is_empty() {
            return Err(AmlError::EmptyNamesAreInvalid);
        }
        Ok(AmlName::from_components(components))
    }

    fn parse_name_seg(&mut self) -> Result<NameSeg, AmlError> {
        let bytes = self.stream.read_bytes(4)?;
        NameSeg::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

pub(crate) fn is_name_string_start(byte: u8) -> bool {
    is_lead_name_char(byte)
        || byte == ROOT_CHAR
        || byte == PREFIX_CHAR
        || byte == DUAL_NAME_PREFIX
        || byte == MULTI_NAME_PREFIX
}

fn access_width_bits(access_type: u8) -> Result<usize, AmlError> {
    match access_type {
        // AnyAcc and BufferAcc default to byte access.
        0 | 1 | 5 => Ok(8),
        2 => Ok(16),
        3 => Ok(32),
        4 => Ok(64),
        other => Err(AmlError::InvalidFieldFlags(other)),
    }
}

struct ExpandStats {
    expanded: usize,
    remaining: usize,
}

/// The second pass: keep re-parsing deferred ranges until a full sweep makes
/// no progress.
fn expand_deferred(context: &mut Context, data: &[u8], root: &mut Tree) {
    loop {
        let mut stats = ExpandStats { expanded: 0, remaining: 0 };
        expand_node(context, data, root, &mut stats);
        if stats.remaining == 0 {
            break;
        }
        if stats.expanded == 0 {
            warn!("{} deferred AML range(s) could not be expanded", stats.remaining);
            break;
        }
    }
}

fn expand_node(context: &mut Context, data: &[u8], node: &mut Tree, stats: &mut ExpandStats) {
    if let Some(range) = node.deferred.clone() {
        if range.attempts >= 2 {
            stats.remaining += 1;
            return;
        }
        if let Some(deferred) = node.deferred.as_mut() {
            deferred.attempts += 1;
        }

        match reparse_range(context, data, node.construct, &range) {
            Ok(parsed) if parsed.deferred.is_none() => {
                *node = parsed;
                stats.expanded += 1;
            }
            _ => {
                stats.remaining += 1;
                return;
            }
        }
    }

    for child in &mut node.children {
        expand_node(context, data, child, stats);
    }
}

fn reparse_range(
    context: &mut Context,
    data: &[u8],
    construct: Construct,
    range: &DeferredRange,
) -> ParseResult {
    let mut parser = Parser { stream: Stream::new(data), context };
    parser.stream.seek(range.start)?;
    parser.context.push_scope(range.scope.clone());

    let result = if construct == Construct::TermList {
        parser
            .stream
            .push_scope(range.end - range.start)
            .map_err(ParseFault::from)
            .and_then(|()| parser.parse_term_list_to_scope_end())
            .and_then(|list| {
                parser.stream.pop_scope(false)?;
                Ok(list)
            })
    } else {
        parser.parse_term_obj()
    };

    parser.context.pop_scope();
    result
}

/// Attaches each definition's parse tree to its symbol, once the tree is
/// fully expanded.
struct AttachDefinitions<'c> {
    context: &'c mut Context,
}

impl<'c> Visitor for AttachDefinitions<'c> {
    fn visit(&mut self, tree: &Tree) -> bool {
        let attachable = matches!(
            tree.construct,
            Construct::DefName | Construct::DefMethod | Construct::DefDevice | Construct::DefOpRegion
        );
        if !attachable {
            return true;
        }

        let path = tree
            .child("NameString")
            .and_then(|child| child.as_name().ok())
            .and_then(|name| name.resolve(&tree.scope).ok());
        let Some(path) = path else { return true };

        match (tree.construct, self.context.symbol_mut(&path)) {
            (Construct::DefName, Some(Symbol::Name(decl))) => decl.tree = Some(tree.clone()),
            (Construct::DefMethod, Some(Symbol::Method(decl))) => decl.tree = Some(tree.clone()),
            (Construct::DefDevice, Some(Symbol::Device(decl))) => decl.tree = Some(tree.clone()),
            (Construct::DefOpRegion, Some(Symbol::OpRegion(decl))) => decl.tree = Some(tree.clone()),
            _ => (),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_test_table;

    fn parse(body: &[u8]) -> (Context, Tree) {
        let mut context = Context::new();
        let table = make_test_table(body);
        let tree = parse_table(&mut context, &table).unwrap();
        (context, tree)
    }

    #[test]
    fn test_def_name() {
        // Name(FOO_, 0x2a)
        let (context, tree) = parse(&[0x08, b'F', b'O', b'O', b'_', 0x0a, 0x2a]);

        let path = AmlName::from_str("\\FOO_").unwrap();
        let Some(Symbol::Name(decl)) = context.symbol(&path) else {
            panic!("FOO_ not registered as a name");
        };
        let def_name = decl.tree.as_ref().unwrap();
        assert_eq!(def_name.construct, Construct::DefName);
        assert_eq!(
            def_name.required("DataRefObject").unwrap().required("Data").unwrap().as_integer(),
            Ok(0x2a)
        );

        let term_list = &tree.children[1];
        assert_eq!(term_list.children.len(), 1);
    }

    #[test]
    fn test_scoped_device() {
        // Scope(\_SB_) { Device(PCI0) { Name(_ADR, Zero) } }
        let mut body = alloc::vec![0x10, 0x13, b'\\', b'_', b'S', b'B', b'_'];
        body.extend_from_slice(&[0x5b, 0x82, 0x0b, b'P', b'C', b'I', b'0']);
        body.extend_from_slice(&[0x08, b'_', b'A', b'D', b'R', 0x00]);
        let (context, _) = parse(&body);

        let device = AmlName::from_str("\\_SB_.PCI0").unwrap();
        assert!(matches!(context.symbol(&device), Some(Symbol::Device(_))));
        let adr = AmlName::from_str("\\_SB_.PCI0._ADR").unwrap();
        assert!(matches!(context.symbol(&adr), Some(Symbol::Name(_))));
        assert_eq!(context.devices().count(), 1);
    }

    #[test]
    fn test_forward_reference() {
        // Method(FOO_) { BAR0(One) } followed by Method(BAR0, 1) {}.
        // The invocation can only be sized on the second pass.
        let mut body = alloc::vec![0x14, 0x0b, b'F', b'O', b'O', b'_', 0x00];
        body.extend_from_slice(&[b'B', b'A', b'R', b'0', 0x01]);
        body.extend_from_slice(&[0x14, 0x06, b'B', b'A', b'R', b'0', 0x01]);
        let (context, _) = parse(&body);

        let path = AmlName::from_str("\\FOO_").unwrap();
        let Some(Symbol::Method(decl)) = context.symbol(&path) else {
            panic!("FOO_ not registered as a method");
        };
        let method = decl.tree.as_ref().unwrap();
        let term_list = method.required("TermList").unwrap();
        assert!(term_list.deferred.is_none());

        let invocation = &term_list.children[0];
        assert_eq!(invocation.construct, Construct::MethodInvocation);
        assert_eq!(invocation.children.len(), 1);
        assert_eq!(invocation.children[0].construct, Construct::OneOp);
    }

    #[test]
    fn test_external_then_definition() {
        // External(BAR0, MethodObj, 2) then Method(BAR0, 2) {}; the real
        // definition replaces the placeholder.
        let mut body = alloc::vec![0x15, b'B', b'A', b'R', b'0', 0x08, 0x02];
        body.extend_from_slice(&[0x14, 0x06, b'B', b'A', b'R', b'0', 0x02]);
        let (context, _) = parse(&body);

        let path = AmlName::from_str("\\BAR0").unwrap();
        assert!(matches!(context.symbol(&path), Some(Symbol::Method(_))));
    }

    #[test]
    fn test_if_else_shape() {
        // If(One) { Noop } Else { Noop }
        let body = [0xa0, 0x03, 0x01, 0xa3, 0xa1, 0x02, 0xa3];
        let (_, tree) = parse(&body);

        let if_else = &tree.children[1].children[0];
        assert_eq!(if_else.construct, Construct::DefIfElse);
        assert_eq!(if_else.children.len(), 4);
        assert_eq!(if_else.required("DefElse").unwrap().construct, Construct::DefElse);

        // And without an else arm the child is simply absent.
        let (_, tree) = parse(&[0xa0, 0x03, 0x01, 0xa3]);
        let if_only = &tree.children[1].children[0];
        assert_eq!(if_only.children.len(), 3);
    }

    #[test]
    fn test_field_offsets() {
        // OperationRegion(GPIO, SystemIO, 0x400, 0x10)
        // Field(GPIO, ByteAcc, NoLock, Preserve) { , 4, FLD0, 3, FLD1, 9 }
        let mut body = alloc::vec![0x5b, 0x80, b'G', b'P', b'I', b'O', 0x01, 0x0b, 0x00, 0x04, 0x0a, 0x10];
        body.extend_from_slice(&[
            0x5b, 0x81, 0x12, b'G', b'P', b'I', b'O', 0x01,
            0x00, 0x04,
            b'F', b'L', b'D', b'0', 0x03,
            b'F', b'L', b'D', b'1', 0x09,
        ]);
        let (context, _) = parse(&body);

        let fld0 = AmlName::from_str("\\FLD0").unwrap();
        let Some(Symbol::OpField(decl)) = context.symbol(&fld0) else {
            panic!("FLD0 not registered as an operation field");
        };
        assert_eq!(decl.bit_offset, 4);
        assert_eq!(decl.bit_length, 3);
        assert_eq!(decl.access_width, 8);

        let fld1 = AmlName::from_str("\\FLD1").unwrap();
        let Some(Symbol::OpField(decl)) = context.symbol(&fld1) else {
            panic!("FLD1 not registered as an operation field");
        };
        assert_eq!(decl.bit_offset, 7);
        assert_eq!(decl.bit_length, 9);
    }

    #[test]
    fn test_bad_table_length() {
        let mut context = Context::new();
        let mut table = make_test_table(&[0xa3]);
        table.truncate(table.len() - 1);
        assert!(matches!(parse_table(&mut context, &table), Err(AmlError::InvalidTableLength)));
    }
}

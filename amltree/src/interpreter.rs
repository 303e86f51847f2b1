//! Tree-walking evaluation of methods and named objects.
//!
//! Values of named objects are computed lazily and cached in the context's
//! binding table, so evaluating `\_SB_.PCI0._CRS` pulls in only the
//! definitions it actually touches. Control flow inside methods rides the
//! error channel: `Return`, `Break` and `Continue` unwind as [`Flow`]
//! variants until the construct that consumes them.

use crate::{
    context::{FieldSource, MethodDecl, OperationFieldDecl, Symbol},
    grammar::Construct,
    namespace::AmlName,
    object::{FieldLayout, Object},
    tree::Tree,
    AmlError, Handler,
};
use alloc::{boxed::Box, string::String, vec, vec::Vec};
use log::debug;

pub struct Interpreter<'c, H: Handler> {
    pub context: &'c mut crate::context::Context,
    pub handler: H,
}

/// Why evaluation of a subtree stopped early.
pub(crate) enum Flow {
    Err(AmlError),
    Return(Object),
    Break,
    Continue,
}

impl From<AmlError> for Flow {
    fn from(err: AmlError) -> Flow {
        Flow::Err(err)
    }
}

type EvalResult = Result<Object, Flow>;

pub(crate) struct StackFrame {
    args: Vec<Object>,
    locals: Vec<Object>,
}

impl StackFrame {
    fn new(mut args: Vec<Object>) -> StackFrame {
        args.resize(7, Object::Uninitialized);
        StackFrame { args, locals: vec![Object::Uninitialized; 8] }
    }

    fn empty() -> StackFrame {
        StackFrame::new(Vec::new())
    }
}

/// Where an operation region's bits live, after its space and offset
/// expressions have been evaluated.
struct RegionAddress {
    space: u8,
    offset: u64,
    pci: Option<(u16, u8, u8, u8)>,
}

const SPACE_SYSTEM_MEMORY: u8 = 0x00;
const SPACE_SYSTEM_IO: u8 = 0x01;
const SPACE_PCI_CONFIG: u8 = 0x02;

impl<'c, H: Handler> Interpreter<'c, H> {
    pub fn new(context: &'c mut crate::context::Context, handler: H) -> Interpreter<'c, H> {
        Interpreter { context, handler }
    }

    /// Evaluates the method at `path` with the given arguments. The path may
    /// also name a non-method object, in which case its value is returned.
    pub fn interpret_method_call(
        &mut self,
        path: &AmlName,
        args: &[Object],
    ) -> Result<Object, AmlError> {
        let (resolved, symbol) = {
            let (resolved, symbol) = self.context.lookup_in(path, &AmlName::root())?;
            (resolved, symbol.clone())
        };
        match symbol {
            Symbol::Method(decl) => self.invoke_method(&decl, args.to_vec()),
            Symbol::PredefinedMethod(decl) => (decl.handler)(args),
            other => self.eval_symbol(resolved, other),
        }
    }

    /// Evaluates the value of a name resolved from `scope`.
    pub fn eval_name(&mut self, name: &AmlName, scope: &AmlName) -> Result<Object, AmlError> {
        let (path, symbol) = {
            let (path, symbol) = self.context.lookup_in(name, scope)?;
            (path, symbol.clone())
        };
        self.eval_symbol(path, symbol)
    }

    /// Evaluates a single expression subtree outside any method frame.
    pub fn eval_expression(&mut self, tree: &Tree) -> Result<Object, AmlError> {
        let mut frame = StackFrame::empty();
        unflow(self.eval_term(tree, &mut frame))
    }

    fn invoke_method(&mut self, decl: &MethodDecl, args: Vec<Object>) -> Result<Object, AmlError> {
        let tree = decl
            .tree
            .as_ref()
            .ok_or(AmlError::MethodBodyNotExpanded(decl.name.as_string()))?
            .clone();
        let body = tree.required("TermList")?;

        let mut frame = StackFrame::new(args);
        match self.eval_term_list(body, &mut frame) {
            Ok(()) => Ok(Object::Uninitialized),
            Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Err(err)) => Err(err),
            Err(Flow::Break) | Err(Flow::Continue) => Err(AmlError::FlowControlOutsideLoop),
        }
    }

    fn eval_symbol(&mut self, path: AmlName, symbol: Symbol) -> Result<Object, AmlError> {
        if let Some(binding) = self.context.binding(&path) {
            // Reading a name bound to a buffer field yields the field's
            // current contents, not the handle.
            return match binding {
                Object::BufferField { buffer, field } => buffer.lock().read_field(field),
                other => Ok(other.clone()),
            };
        }
        match symbol {
            Symbol::Name(decl) => match &decl.tree {
                Some(tree) => {
                    let mut frame = StackFrame::empty();
                    let value =
                        unflow(self.eval_term(tree.required("DataRefObject")?, &mut frame))?;
                    self.context.set_binding(path, value.clone());
                    Ok(value)
                }
                None => Ok(Object::Uninitialized),
            },
            Symbol::Alias(decl) => self.eval_name(&decl.target, &AmlName::root()),
            Symbol::Device(_) => Ok(Object::Device(path)),
            Symbol::Method(decl) => match &decl.tree {
                Some(tree) => Ok(Object::Method {
                    scope: path,
                    flags: decl.flags,
                    body: tree.clone(),
                }),
                None => Err(AmlError::MethodBodyNotExpanded(path.as_string())),
            },
            Symbol::PredefinedMethod(decl) => Ok(Object::PredefinedMethod {
                arg_count: decl.arg_count,
                handler: decl.handler,
            }),
            Symbol::OpRegion(_) => Ok(Object::Uninitialized),
            Symbol::OpField(decl) => self.read_op_field(&decl),
            Symbol::External(_) => Err(AmlError::UndefinedSymbol(path.as_string())),
        }
    }

    fn eval_term_list(&mut self, list: &Tree, frame: &mut StackFrame) -> Result<(), Flow> {
        for term in &list.children {
            self.eval_term(term, frame)?;
        }
        Ok(())
    }

    fn eval_term(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        use Construct::*;
        match tree.construct {
            ZeroOp => Ok(Object::Integer(0)),
            OneOp => Ok(Object::Integer(1)),
            OnesOp => Ok(Object::Integer(u64::MAX)),
            RevisionOp => Ok(Object::Integer(2)),
            ByteConst | WordConst | DWordConst | QWordConst => {
                Ok(Object::Integer(tree.required("Data")?.as_integer()?))
            }
            String => Ok(Object::String(tree.required("StringData")?.as_str()?.into())),
            DebugObj => Ok(Object::Uninitialized),

            LocalObj => Ok(frame.locals[tree.as_integer()? as usize].clone()),
            ArgObj => Ok(frame.args[tree.as_integer()? as usize].clone()),
            NameString => self.eval_name(tree.as_name()?, &tree.scope).map_err(Flow::from),
            MethodInvocation => self.eval_invocation(tree, frame),

            DefBuffer => self.eval_buffer(tree, frame),
            DefPackage | DefVarPackage => self.eval_package(tree, frame),

            // Statements.
            DefIfElse => {
                let predicate = self.eval_term(tree.required("Predicate")?, frame)?.to_integer()?;
                if predicate != 0 {
                    self.eval_term_list(tree.required("TermList")?, frame)?;
                } else if let Some(else_arm) = tree.child("DefElse") {
                    self.eval_term_list(else_arm.required("TermList")?, frame)?;
                }
                Ok(Object::Uninitialized)
            }
            DefElse => {
                // An else with no preceding if is legal and inert.
                Ok(Object::Uninitialized)
            }
            DefWhile => self.eval_while(tree, frame),
            DefReturn => {
                let value = self.eval_term(tree.required("ArgObject")?, frame)?;
                Err(Flow::Return(value))
            }
            DefBreak => Err(Flow::Break),
            DefContinue => Err(Flow::Continue),
            DefNoop | DefBreakPoint => Ok(Object::Uninitialized),
            DefFatal => {
                let fatal_type = tree.required("FatalType")?.as_integer()?;
                let code = tree.required("FatalCode")?.as_integer()?;
                Err(Flow::Err(AmlError::FatalError(fatal_type as u8, code as u32)))
            }
            DefNotify => {
                let value = self.eval_term(tree.required("NotifyValue")?, frame)?;
                debug!("Notify({:?})", value);
                Ok(Object::Uninitialized)
            }
            DefSleep | DefStall => {
                // Timing is not modelled; the operand is still evaluated for
                // its side effects.
                self.eval_term(&tree.children[0], frame)?;
                Ok(Object::Uninitialized)
            }
            // Synchronization is single-threaded here: acquisition always
            // succeeds and the other primitives are inert.
            DefAcquire => Ok(Object::Integer(1)),
            DefRelease | DefReset | DefSignal => Ok(Object::Uninitialized),
            DefWait => Ok(Object::Integer(0)),
            DefTimer => Ok(Object::Integer(0)),
            DefUnload | DefLoad | DefLoadTable => {
                Err(Flow::Err(AmlError::NotImplemented("table load operators")))
            }

            // Arithmetic.
            DefAdd => self.eval_arith(tree, frame, u64::wrapping_add),
            DefSubtract => self.eval_arith(tree, frame, u64::wrapping_sub),
            DefMultiply => self.eval_arith(tree, frame, u64::wrapping_mul),
            DefAnd => self.eval_arith(tree, frame, |a, b| a & b),
            DefOr => self.eval_arith(tree, frame, |a, b| a | b),
            DefXOr => self.eval_arith(tree, frame, |a, b| a ^ b),
            DefNAnd => self.eval_arith(tree, frame, |a, b| !(a & b)),
            DefNOr => self.eval_arith(tree, frame, |a, b| !(a | b)),
            DefMod => {
                // Operands are evaluated exactly once; the divisor may have
                // side effects.
                let dividend =
                    self.eval_term(tree.required("LeftOperand")?, frame)?.to_integer()?;
                let divisor =
                    self.eval_term(tree.required("RightOperand")?, frame)?.to_integer()?;
                if divisor == 0 {
                    return Err(Flow::Err(AmlError::DivideByZero));
                }
                let result = Object::Integer(dividend % divisor);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefShiftLeft => self.eval_shift(tree, frame, true),
            DefShiftRight => self.eval_shift(tree, frame, false),
            DefDivide => self.eval_divide(tree, frame),
            DefIncrement | DefDecrement => self.eval_increment(tree, frame),
            DefNot => {
                let value = self.eval_term(&tree.children[0], frame)?.to_integer()?;
                let result = Object::Integer(!value);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefFindSetLeftBit => {
                let value = self.eval_term(&tree.children[0], frame)?.to_integer()?;
                let result =
                    Object::Integer(if value == 0 { 0 } else { 64 - value.leading_zeros() as u64 });
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefFindSetRightBit => {
                let value = self.eval_term(&tree.children[0], frame)?.to_integer()?;
                let result = Object::Integer(if value == 0 {
                    0
                } else {
                    value.trailing_zeros() as u64 + 1
                });
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefFromBCD => {
                let bcd = self.eval_term(&tree.children[0], frame)?.to_integer()?;
                let mut value = 0u64;
                for nibble in (0..16).rev() {
                    value = value * 10 + ((bcd >> (nibble * 4)) & 0xf);
                }
                let result = Object::Integer(value);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefToBCD => {
                let mut value = self.eval_term(&tree.children[0], frame)?.to_integer()?;
                let mut bcd = 0u64;
                for nibble in 0..16 {
                    bcd |= (value % 10) << (nibble * 4);
                    value /= 10;
                }
                let result = Object::Integer(bcd);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }

            // Logic and comparison.
            DefLAnd | DefLOr => {
                let left = self.eval_term(tree.required("LeftOperand")?, frame)?.to_integer()?;
                let right =
                    self.eval_term(tree.required("RightOperand")?, frame)?.to_integer()?;
                let result = if tree.construct == DefLAnd {
                    left != 0 && right != 0
                } else {
                    left != 0 || right != 0
                };
                Ok(boolean(result))
            }
            DefLNot => {
                let value = self.eval_term(&tree.children[0], frame)?.to_integer()?;
                Ok(boolean(value == 0))
            }
            DefLEqual | DefLGreater | DefLLess => {
                let left = self.eval_term(tree.required("LeftOperand")?, frame)?;
                let right = self.eval_term(tree.required("RightOperand")?, frame)?;
                let ordering = compare_objects(&left, &right);
                let result = match (tree.construct, ordering) {
                    (DefLEqual, Some(core::cmp::Ordering::Equal)) => true,
                    (DefLGreater, Some(core::cmp::Ordering::Greater)) => true,
                    (DefLLess, Some(core::cmp::Ordering::Less)) => true,
                    _ => false,
                };
                Ok(boolean(result))
            }
            DefMatch => self.eval_match(tree, frame),

            // References.
            DefRefOf => {
                let inner = self.eval_term(&tree.children[0], frame)?;
                Ok(Object::Reference { inner: Box::new(inner), index: None })
            }
            DefCondRefOf => self.eval_cond_ref_of(tree, frame),
            DefDerefOf => {
                let reference = self.eval_term(&tree.children[0], frame)?;
                self.deref(&reference).map_err(Flow::from)
            }
            DefIndex => {
                let container = self.eval_term(tree.required("BuffPkgStrObj")?, frame)?;
                let index = self.eval_term(tree.required("IndexValue")?, frame)?.to_integer()?;
                let result =
                    Object::Reference { inner: Box::new(container), index: Some(index) };
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefSizeOf => {
                let value = self.eval_term(&tree.children[0], frame)?;
                Ok(Object::Integer(value.size_of()?))
            }
            DefObjectType => {
                let value = self.eval_term(&tree.children[0], frame)?;
                Ok(Object::Integer(value.type_code()))
            }

            // Stores and conversions.
            DefStore => {
                let value = self.eval_term(tree.required("TermArg")?, frame)?;
                self.store(tree.required("SuperName")?, value.clone(), frame)?;
                Ok(value)
            }
            DefCopyObject => {
                let value = self.eval_term(tree.required("TermArg")?, frame)?;
                self.store(tree.required("SimpleName")?, value.clone(), frame)?;
                Ok(value)
            }
            DefConcat => self.eval_concat(tree, frame),
            DefConcatRes => self.eval_concat_res(tree, frame),
            DefMid => self.eval_mid(tree, frame),
            DefToBuffer => {
                let value = self.eval_term(&tree.children[0], frame)?;
                let result = Object::buffer(value.to_buffer_bytes()?);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefToInteger => {
                let value = self.eval_term(&tree.children[0], frame)?;
                let result = Object::Integer(value.to_integer()?);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefToDecimalString => {
                let value = self.eval_term(&tree.children[0], frame)?;
                let result = Object::String(value.to_decimal_string()?);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefToHexString => {
                let value = self.eval_term(&tree.children[0], frame)?;
                let result = Object::String(value.to_hex_string()?);
                self.store(tree.required("Target")?, result.clone(), frame)?;
                Ok(result)
            }
            DefToString => self.eval_to_string(tree, frame),

            // Buffer field creation.
            DefCreateBitField => self.create_buffer_field(tree, frame, Some(1)),
            DefCreateByteField => self.create_buffer_field(tree, frame, Some(8)),
            DefCreateWordField => self.create_buffer_field(tree, frame, Some(16)),
            DefCreateDWordField => self.create_buffer_field(tree, frame, Some(32)),
            DefCreateQWordField => self.create_buffer_field(tree, frame, Some(64)),
            DefCreateField => self.create_buffer_field(tree, frame, None),

            // Declarations inside a running method body: names bind their
            // value now, the rest were registered at parse time.
            DefName => {
                let value = self.eval_term(tree.required("DataRefObject")?, frame)?;
                let path = tree.required("NameString")?.as_name()?.resolve(&tree.scope)?;
                self.context.set_binding(path, value);
                Ok(Object::Uninitialized)
            }
            DefScope | DefDevice | DefMethod | DefOpRegion | DefField | DefIndexField
            | DefBankField | DefMutex | DefEvent | DefAlias | DefExternal | DefPowerRes
            | DefProcessor | DefThermalZone | DefDataRegion => Ok(Object::Uninitialized),

            _ => Err(Flow::Err(AmlError::NotImplemented("construct evaluation"))),
        }
    }

    fn eval_invocation(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let name = tree.as_name()?;
        let (path, symbol) = {
            let (path, symbol) =
                self.context.lookup_in(name, &tree.scope).map_err(Flow::from)?;
            (path, symbol.clone())
        };
        match symbol {
            Symbol::Method(decl) => {
                let mut args = Vec::with_capacity(tree.children.len());
                for arg in &tree.children {
                    args.push(self.eval_term(arg, frame)?);
                }
                self.invoke_method(&decl, args).map_err(Flow::from)
            }
            Symbol::PredefinedMethod(decl) => {
                let mut args = Vec::with_capacity(tree.children.len());
                for arg in &tree.children {
                    args.push(self.eval_term(arg, frame)?);
                }
                (decl.handler)(&args).map_err(Flow::from)
            }
            other => self.eval_symbol(path, other).map_err(Flow::from),
        }
    }

    fn eval_buffer(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let size = self.eval_term(tree.required("BufferSize")?, frame)?.to_integer()? as usize;
        let mut bytes = tree.required("ByteList")?.as_bytes()?.to_vec();
        if bytes.len() < size {
            bytes.resize(size, 0);
        }
        Ok(Object::buffer(bytes))
    }

    fn eval_package(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let count = if tree.construct == Construct::DefPackage {
            tree.required("NumElements")?.as_integer()? as usize
        } else {
            self.eval_term(tree.required("VarNumElements")?, frame)?.to_integer()? as usize
        };

        let list = tree.required("PackageElementList")?;
        let mut elements = Vec::with_capacity(count);
        for element in &list.children {
            let value = if element.construct == Construct::NameString {
                // Unresolvable references leave their slot uninitialized.
                match element.as_name() {
                    Ok(name) => match self.context.lookup_in(name, &element.scope) {
                        Ok((path, symbol)) => {
                            let symbol = symbol.clone();
                            self.eval_symbol(path, symbol).unwrap_or(Object::Uninitialized)
                        }
                        Err(_) => Object::Uninitialized,
                    },
                    Err(err) => return Err(Flow::Err(err)),
                }
            } else {
                self.eval_term(element, frame)?
            };
            elements.push(value);
        }
        while elements.len() < count {
            elements.push(Object::Uninitialized);
        }
        Ok(Object::package(elements))
    }

    fn eval_while(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let predicate = tree.required("Predicate")?;
        let body = tree.required("TermList")?;
        loop {
            if self.eval_term(predicate, frame)?.to_integer()? == 0 {
                break;
            }
            match self.eval_term_list(body, frame) {
                Ok(()) | Err(Flow::Continue) => (),
                Err(Flow::Break) => break,
                Err(flow) => return Err(flow),
            }
        }
        Ok(Object::Uninitialized)
    }

    fn eval_arith(
        &mut self,
        tree: &Tree,
        frame: &mut StackFrame,
        op: impl Fn(u64, u64) -> u64,
    ) -> EvalResult {
        let left = self.eval_term(tree.required("LeftOperand")?, frame)?.to_integer()?;
        let right = self.eval_term(tree.required("RightOperand")?, frame)?.to_integer()?;
        let result = Object::Integer(op(left, right));
        self.store(tree.required("Target")?, result.clone(), frame)?;
        Ok(result)
    }

    fn eval_shift(&mut self, tree: &Tree, frame: &mut StackFrame, left_shift: bool) -> EvalResult {
        let operand = self.eval_term(tree.required("Operand")?, frame)?.to_integer()?;
        let count = self.eval_term(tree.required("ShiftCount")?, frame)?.to_integer()?;
        let value = if count >= 64 {
            0
        } else if left_shift {
            operand << count
        } else {
            operand >> count
        };
        let result = Object::Integer(value);
        self.store(tree.required("Target")?, result.clone(), frame)?;
        Ok(result)
    }

    fn eval_divide(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let dividend = self.eval_term(tree.required("Dividend")?, frame)?.to_integer()?;
        let divisor = self.eval_term(tree.required("Divisor")?, frame)?.to_integer()?;
        if divisor == 0 {
            return Err(Flow::Err(AmlError::DivideByZero));
        }
        self.store(tree.required("Remainder")?, Object::Integer(dividend % divisor), frame)?;
        let quotient = Object::Integer(dividend / divisor);
        self.store(tree.required("Quotient")?, quotient.clone(), frame)?;
        Ok(quotient)
    }

    fn eval_increment(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let target = tree.required("SuperName")?;
        let value = self.eval_term(target, frame)?.to_integer()?;
        let new = if tree.construct == Construct::DefIncrement {
            value.wrapping_add(1)
        } else {
            value.wrapping_sub(1)
        };
        let result = Object::Integer(new);
        self.store(target, result.clone(), frame)?;
        Ok(result)
    }

    fn eval_match(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let package = self.eval_term(tree.required("SearchPkg")?, frame)?;
        let op1 = tree.required("MatchOpcode1")?.as_integer()?;
        let operand1 = self.eval_term(tree.required("Operand1")?, frame)?;
        let op2 = tree.required("MatchOpcode2")?.as_integer()?;
        let operand2 = self.eval_term(tree.required("Operand2")?, frame)?;
        let start = self.eval_term(tree.required("StartIndex")?, frame)?.to_integer()? as usize;

        let Object::Package(elements) = &package else {
            return Err(Flow::Err(AmlError::InvalidConversion));
        };
        let elements = elements.lock().clone();
        for (index, element) in elements.iter().enumerate().skip(start) {
            if match_test(op1, element, &operand1)? && match_test(op2, element, &operand2)? {
                return Ok(Object::Integer(index as u64));
            }
        }
        Ok(Object::Integer(u64::MAX))
    }

    fn eval_cond_ref_of(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let super_name = tree.required("SuperName")?;
        let inner = match super_name.construct {
            Construct::NameString => {
                let name = super_name.as_name()?;
                let looked_up = {
                    let result = self.context.lookup_in(name, &super_name.scope);
                    result.map(|(path, symbol)| (path, symbol.clone()))
                };
                match looked_up {
                    Ok((path, symbol)) => match self.eval_symbol(path, symbol) {
                        Ok(value) => value,
                        Err(_) => return Ok(boolean(false)),
                    },
                    Err(_) => return Ok(boolean(false)),
                }
            }
            _ => self.eval_term(super_name, frame)?,
        };
        self.store(
            tree.required("Target")?,
            Object::Reference { inner: Box::new(inner), index: None },
            frame,
        )?;
        Ok(boolean(true))
    }

    fn deref(&mut self, reference: &Object) -> Result<Object, AmlError> {
        match reference {
            Object::Reference { inner, index: Some(index) } => match &**inner {
                Object::Package(elements) => {
                    let elements = elements.lock();
                    elements
                        .get(*index as usize)
                        .cloned()
                        .ok_or(AmlError::IndexOutOfBounds(*index))
                }
                Object::Buffer(data) => {
                    let data = data.lock();
                    data.bytes
                        .get(*index as usize)
                        .map(|&byte| Object::Integer(byte as u64))
                        .ok_or(AmlError::IndexOutOfBounds(*index))
                }
                Object::String(string) => string
                    .as_bytes()
                    .get(*index as usize)
                    .map(|&byte| Object::Integer(byte as u64))
                    .ok_or(AmlError::IndexOutOfBounds(*index)),
                _ => Err(AmlError::InvalidConversion),
            },
            Object::Reference { inner, index: None } => Ok((**inner).clone()),
            _ => Err(AmlError::InvalidConversion),
        }
    }

    fn eval_concat(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let left = self.eval_term(tree.required("LeftOperand")?, frame)?;
        let right = self.eval_term(tree.required("RightOperand")?, frame)?;
        let result = match &left {
            Object::String(string) => {
                let mut joined = string.clone();
                joined.push_str(&right.to_aml_string()?);
                Object::String(joined)
            }
            Object::Buffer(_) => {
                let mut bytes = left.to_buffer_bytes()?;
                bytes.extend(right.to_buffer_bytes()?);
                Object::buffer(bytes)
            }
            _ => {
                let mut bytes = left.to_integer()?.to_le_bytes().to_vec();
                bytes.extend(right.to_integer()?.to_le_bytes());
                Object::buffer(bytes)
            }
        };
        self.store(tree.required("Target")?, result.clone(), frame)?;
        Ok(result)
    }

    fn eval_concat_res(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let mut bytes = strip_end_tag(
            self.eval_term(tree.required("LeftOperand")?, frame)?.to_buffer_bytes()?,
        );
        bytes.extend(strip_end_tag(
            self.eval_term(tree.required("RightOperand")?, frame)?.to_buffer_bytes()?,
        ));
        bytes.extend_from_slice(&[0x79, 0x00]);
        let result = Object::buffer(bytes);
        self.store(tree.required("Target")?, result.clone(), frame)?;
        Ok(result)
    }

    fn eval_mid(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let source = self.eval_term(tree.required("MidObj")?, frame)?;
        let index = self.eval_term(tree.required("Source")?, frame)?.to_integer()? as usize;
        let length = self.eval_term(tree.required("Index")?, frame)?.to_integer()? as usize;

        let result = match &source {
            Object::String(string) => {
                let start = index.min(string.len());
                let end = (start + length).min(string.len());
                Object::String(string[start..end].into())
            }
            _ => {
                let bytes = source.to_buffer_bytes()?;
                let start = index.min(bytes.len());
                let end = (start + length).min(bytes.len());
                Object::buffer(bytes[start..end].to_vec())
            }
        };
        self.store(tree.required("Target")?, result.clone(), frame)?;
        Ok(result)
    }

    fn eval_to_string(&mut self, tree: &Tree, frame: &mut StackFrame) -> EvalResult {
        let bytes = self.eval_term(tree.required("TermArg")?, frame)?.to_buffer_bytes()?;
        let limit = self.eval_term(tree.required("LengthArg")?, frame)?.to_integer()?;

        let mut string = String::new();
        for (i, &byte) in bytes.iter().enumerate() {
            if byte == 0 || (limit != u64::MAX && i as u64 >= limit) {
                break;
            }
            string.push(byte as char);
        }
        let result = Object::String(string);
        self.store(tree.required("Target")?, result.clone(), frame)?;
        Ok(result)
    }

    fn create_buffer_field(
        &mut self,
        tree: &Tree,
        frame: &mut StackFrame,
        fixed_bits: Option<u64>,
    ) -> EvalResult {
        let source = self.eval_term(tree.required("SourceBuff")?, frame)?;
        let Object::Buffer(buffer) = &source else {
            return Err(Flow::Err(AmlError::InvalidConversion));
        };

        let index = self.eval_term(&tree.children[1], frame)?.to_integer()?;
        let (bit_offset, bit_length) = match fixed_bits {
            Some(1) => (index, 1),
            Some(bits) => (index * 8, bits),
            None => {
                let bits = self.eval_term(tree.required("NumBits")?, frame)?.to_integer()?;
                (index, bits)
            }
        };

        let path = tree.required("NameString")?.as_name()?.resolve(&tree.scope)?;
        let field_name = path.as_string();
        buffer.lock().create_field(
            &field_name,
            FieldLayout {
                bit_offset: bit_offset as usize,
                bit_length: bit_length as usize,
                access_width: 8,
            },
        );
        self.context.set_binding(
            path,
            Object::BufferField { buffer: buffer.clone(), field: field_name },
        );
        Ok(Object::Uninitialized)
    }

    fn store(&mut self, target: &Tree, value: Object, frame: &mut StackFrame) -> Result<(), Flow> {
        match target.construct {
            Construct::NullName => Ok(()),
            Construct::LocalObj => {
                frame.locals[target.as_integer()? as usize] = value;
                Ok(())
            }
            Construct::ArgObj => {
                frame.args[target.as_integer()? as usize] = value;
                Ok(())
            }
            Construct::DebugObj => {
                debug!("Debug object: {:?}", value);
                Ok(())
            }
            Construct::NameString => {
                self.store_to_name(target.as_name()?, &target.scope, value).map_err(Flow::from)
            }
            Construct::MethodInvocation if target.children.is_empty() => {
                self.store_to_name(target.as_name()?, &target.scope, value).map_err(Flow::from)
            }
            Construct::DefIndex | Construct::DefRefOf | Construct::DefDerefOf => {
                let reference = self.eval_term(target, frame)?;
                self.store_through(&reference, value).map_err(Flow::from)
            }
            _ => Err(Flow::Err(AmlError::NotImplemented("store target kind"))),
        }
    }

    fn store_to_name(
        &mut self,
        name: &AmlName,
        scope: &AmlName,
        value: Object,
    ) -> Result<(), AmlError> {
        let (path, symbol) = {
            let (path, symbol) = self.context.lookup_in(name, scope)?;
            (path, symbol.clone())
        };
        match symbol {
            Symbol::OpField(decl) => self.write_op_field(&decl, &value),
            Symbol::Alias(decl) => self.store_to_name(&decl.target, &AmlName::root(), value),
            _ => {
                if let Some(Object::BufferField { buffer, field }) =
                    self.context.binding(&path).cloned()
                {
                    buffer.lock().write_field(&field, &value)
                } else {
                    self.context.set_binding(path, value);
                    Ok(())
                }
            }
        }
    }

    fn store_through(&mut self, reference: &Object, value: Object) -> Result<(), AmlError> {
        match reference {
            Object::Reference { inner, index: Some(index) } => match &**inner {
                Object::Package(elements) => {
                    let mut elements = elements.lock();
                    let index = *index as usize;
                    if index >= elements.len() {
                        return Err(AmlError::IndexOutOfBounds(index as u64));
                    }
                    elements[index] = value;
                    Ok(())
                }
                Object::Buffer(data) => {
                    let mut data = data.lock();
                    let index = *index as usize;
                    if index >= data.bytes.len() {
                        return Err(AmlError::IndexOutOfBounds(index as u64));
                    }
                    data.bytes[index] = value.to_integer()? as u8;
                    Ok(())
                }
                _ => Err(AmlError::InvalidConversion),
            },
            _ => Err(AmlError::NotImplemented("store through a bare reference")),
        }
    }

    // Operation region plumbing.

    fn region_address(&mut self, region: &AmlName) -> Result<RegionAddress, AmlError> {
        let decl = match self.context.symbol(region) {
            Some(Symbol::OpRegion(decl)) => decl.clone(),
            _ => return Err(AmlError::UndefinedSymbol(region.as_string())),
        };
        let tree = decl.tree.ok_or(AmlError::MethodBodyNotExpanded(region.as_string()))?;

        let space = tree.required("RegionSpace")?.as_integer()? as u8;
        let mut frame = StackFrame::empty();
        let offset = unflow(self.eval_term(tree.required("RegionOffset")?, &mut frame))?
            .to_integer()?;

        let pci = if space == SPACE_PCI_CONFIG {
            let device_scope = region.parent()?;
            // A host bridge without _ADR is device 0 function 0.
            let adr = self.eval_integer_name("_ADR", &device_scope).unwrap_or(0);
            let bus = self.eval_integer_name("_BBN", &device_scope).unwrap_or(0);
            let segment = self.eval_integer_name("_SEG", &device_scope).unwrap_or(0);
            Some((segment as u16, bus as u8, (adr >> 16) as u8, (adr & 0xffff) as u8))
        } else {
            None
        };

        Ok(RegionAddress { space, offset, pci })
    }

    /// Evaluates a single-segment name searched outward from `scope` to an
    /// integer, invoking it if it is an argument-less method.
    fn eval_integer_name(&mut self, name: &str, scope: &AmlName) -> Option<u64> {
        let name = AmlName::from_str(name).ok()?;
        let value = self.eval_name(&name, scope).ok()?;
        match value {
            Object::Method { scope: path, .. } => {
                self.interpret_method_call(&path, &[]).ok()?.to_integer().ok()
            }
            other => other.to_integer().ok(),
        }
    }

    fn read_op_field(&mut self, decl: &OperationFieldDecl) -> Result<Object, AmlError> {
        if decl.bit_length == 0 {
            return Ok(Object::Integer(0));
        }
        if decl.bit_length > 64 {
            return Err(AmlError::NotImplemented("operation field wider than 64 bits"));
        }

        match &decl.source {
            FieldSource::Region(region) => {
                let region = self.region_address(region)?;
                let width = decl.access_width as u64;
                let first_unit = decl.bit_offset / width;
                let last_unit = (decl.bit_offset + decl.bit_length - 1) / width;

                let mut raw: u128 = 0;
                for (i, unit) in (first_unit..=last_unit).enumerate() {
                    let byte_offset = region.offset + unit * (width / 8);
                    let unit_value = self.read_unit(&region, byte_offset, decl.access_width)?;
                    raw |= (unit_value as u128) << (i as u32 * width as u32);
                }
                let shifted = (raw >> (decl.bit_offset % width) as u32) as u64;
                Ok(Object::Integer(shifted & bit_mask(decl.bit_length)))
            }
            FieldSource::Index { index_field, data_field } => {
                let index_decl = self.op_field_decl(index_field)?;
                let data_decl = self.op_field_decl(data_field)?;
                self.write_op_field(&index_decl, &Object::Integer(decl.bit_offset / 8))?;
                let data = self.read_op_field(&data_decl)?.to_integer()?;
                Ok(Object::Integer((data >> (decl.bit_offset % 8) as u32) & bit_mask(decl.bit_length)))
            }
        }
    }

    fn write_op_field(&mut self, decl: &OperationFieldDecl, value: &Object) -> Result<(), AmlError> {
        if decl.bit_length == 0 {
            return Ok(());
        }
        if decl.bit_length > 64 {
            return Err(AmlError::NotImplemented("operation field wider than 64 bits"));
        }
        let value = value.to_integer()? & bit_mask(decl.bit_length);

        match &decl.source {
            FieldSource::Region(region) => {
                let region = self.region_address(region)?;
                let width = decl.access_width as u64;
                let first_unit = decl.bit_offset / width;
                let last_unit = (decl.bit_offset + decl.bit_length - 1) / width;
                let shift = (decl.bit_offset % width) as u32;

                // Read-modify-write over the covering access units.
                let mut raw: u128 = 0;
                for (i, unit) in (first_unit..=last_unit).enumerate() {
                    let byte_offset = region.offset + unit * (width / 8);
                    let unit_value = self.read_unit(&region, byte_offset, decl.access_width)?;
                    raw |= (unit_value as u128) << (i as u32 * width as u32);
                }
                raw &= !((bit_mask(decl.bit_length) as u128) << shift);
                raw |= (value as u128) << shift;
                for (i, unit) in (first_unit..=last_unit).enumerate() {
                    let byte_offset = region.offset + unit * (width / 8);
                    let unit_value =
                        (raw >> (i as u32 * width as u32)) as u64 & bit_mask(width.min(64));
                    self.write_unit(&region, byte_offset, decl.access_width, unit_value)?;
                }
                Ok(())
            }
            FieldSource::Index { index_field, data_field } => {
                let index_decl = self.op_field_decl(index_field)?;
                let data_decl = self.op_field_decl(data_field)?;
                self.write_op_field(&index_decl, &Object::Integer(decl.bit_offset / 8))?;
                let shift = (decl.bit_offset % 8) as u32;
                let current = self.read_op_field(&data_decl)?.to_integer()?;
                let merged = (current & !(bit_mask(decl.bit_length) << shift)) | (value << shift);
                self.write_op_field(&data_decl, &Object::Integer(merged))
            }
        }
    }

    fn op_field_decl(&self, name: &AmlName) -> Result<OperationFieldDecl, AmlError> {
        match self.context.symbol(name) {
            Some(Symbol::OpField(decl)) => Ok(decl.clone()),
            _ => Err(AmlError::UndefinedSymbol(name.as_string())),
        }
    }

    fn read_unit(
        &mut self,
        region: &RegionAddress,
        byte_offset: u64,
        width: usize,
    ) -> Result<u64, AmlError> {
        match region.space {
            SPACE_SYSTEM_MEMORY => {
                let address = byte_offset as usize;
                Ok(match width {
                    8 => self.handler.read_u8(address) as u64,
                    16 => self.handler.read_u16(address) as u64,
                    32 => self.handler.read_u32(address) as u64,
                    64 => self.handler.read_u64(address),
                    _ => return Err(AmlError::InvalidFieldFlags(width as u8)),
                })
            }
            SPACE_SYSTEM_IO => {
                let port = byte_offset as u16;
                Ok(match width {
                    8 => self.handler.read_io_u8(port) as u64,
                    16 => self.handler.read_io_u16(port) as u64,
                    32 | 64 => self.handler.read_io_u32(port) as u64,
                    _ => return Err(AmlError::InvalidFieldFlags(width as u8)),
                })
            }
            SPACE_PCI_CONFIG => {
                let (segment, bus, device, function) = region.pci.unwrap_or((0, 0, 0, 0));
                let offset = byte_offset as u16;
                Ok(match width {
                    8 => self.handler.read_pci_u8(segment, bus, device, function, offset) as u64,
                    16 => self.handler.read_pci_u16(segment, bus, device, function, offset) as u64,
                    32 | 64 => {
                        self.handler.read_pci_u32(segment, bus, device, function, offset) as u64
                    }
                    _ => return Err(AmlError::InvalidFieldFlags(width as u8)),
                })
            }
            other => Err(AmlError::NotImplemented(region_space_name(other))),
        }
    }

    fn write_unit(
        &mut self,
        region: &RegionAddress,
        byte_offset: u64,
        width: usize,
        value: u64,
    ) -> Result<(), AmlError> {
        match region.space {
            SPACE_SYSTEM_MEMORY => {
                let address = byte_offset as usize;
                match width {
                    8 => self.handler.write_u8(address, value as u8),
                    16 => self.handler.write_u16(address, value as u16),
                    32 => self.handler.write_u32(address, value as u32),
                    64 => self.handler.write_u64(address, value),
                    _ => return Err(AmlError::InvalidFieldFlags(width as u8)),
                }
                Ok(())
            }
            SPACE_SYSTEM_IO => {
                let port = byte_offset as u16;
                match width {
                    8 => self.handler.write_io_u8(port, value as u8),
                    16 => self.handler.write_io_u16(port, value as u16),
                    32 | 64 => self.handler.write_io_u32(port, value as u32),
                    _ => return Err(AmlError::InvalidFieldFlags(width as u8)),
                }
                Ok(())
            }
            SPACE_PCI_CONFIG => {
                let (segment, bus, device, function) = region.pci.unwrap_or((0, 0, 0, 0));
                let offset = byte_offset as u16;
                match width {
                    8 => self.handler.write_pci_u8(segment, bus, device, function, offset, value as u8),
                    16 => {
                        self.handler.write_pci_u16(segment, bus, device, function, offset, value as u16)
                    }
                    32 | 64 => {
                        self.handler.write_pci_u32(segment, bus, device, function, offset, value as u32)
                    }
                    _ => return Err(AmlError::InvalidFieldFlags(width as u8)),
                }
                Ok(())
            }
            other => Err(AmlError::NotImplemented(region_space_name(other))),
        }
    }
}

fn unflow(result: EvalResult) -> Result<Object, AmlError> {
    match result {
        Ok(value) => Ok(value),
        Err(Flow::Return(value)) => Ok(value),
        Err(Flow::Err(err)) => Err(err),
        Err(Flow::Break) | Err(Flow::Continue) => Err(AmlError::FlowControlOutsideLoop),
    }
}

fn boolean(value: bool) -> Object {
    Object::Integer(if value { u64::MAX } else { 0 })
}

fn bit_mask(bits: u64) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Compares two objects the way the comparison operators do: numerically
/// where both sides convert to integers, lexicographically when both are
/// strings, and incomparable otherwise.
fn compare_objects(left: &Object, right: &Object) -> Option<core::cmp::Ordering> {
    match (left.to_integer(), right.to_integer()) {
        (Ok(left), Ok(right)) => Some(left.cmp(&right)),
        _ => match (left, right) {
            (Object::String(left), Object::String(right)) => Some(left.cmp(right)),
            _ => None,
        },
    }
}

/// One half of a `Match` test. Opcode 0 always matches.
fn match_test(op: u64, element: &Object, operand: &Object) -> Result<bool, Flow> {
    use core::cmp::Ordering::*;
    let ordering = compare_objects(element, operand);
    Ok(match op {
        0 => true,
        1 => ordering == Some(Equal),
        2 => matches!(ordering, Some(Less) | Some(Equal)),
        3 => ordering == Some(Less),
        4 => matches!(ordering, Some(Greater) | Some(Equal)),
        5 => ordering == Some(Greater),
        other => return Err(Flow::Err(AmlError::InvalidMatchOpcode(other as u8))),
    })
}

fn strip_end_tag(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.len() >= 2 && bytes[bytes.len() - 2] == 0x79 {
        bytes.truncate(bytes.len() - 2);
    }
    bytes
}

fn region_space_name(space: u8) -> &'static str {
    match space {
        0x03 => "EmbeddedControl region",
        0x04 => "SMBus region",
        0x05 => "CMOS region",
        _ => "region space",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::Context,
        parser::parse_table,
        test_utils::{make_test_table, TestHandler},
    };

    fn run(body: &[u8], method: &str, args: &[Object]) -> (Object, TestHandler) {
        let mut context = Context::new();
        let table = make_test_table(body);
        parse_table(&mut context, &table).unwrap();
        let mut interpreter = Interpreter::new(&mut context, TestHandler::new());
        let result = interpreter
            .interpret_method_call(&AmlName::from_str(method).unwrap(), args)
            .unwrap();
        (result, interpreter.handler)
    }

    #[test]
    fn test_if_else_on_arg0() {
        // Method(TST_, 1) {
        //   If (LEqual(Arg0, One)) { Return(Buffer { "yes" }) }
        //   Else { Return(Buffer { "no" }) }
        // }
        let body = [
            0x14, 0x1c, b'T', b'S', b'T', b'_', 0x01,
            0xa0, 0x0c, 0x93, 0x68, 0x01,
            0xa4, 0x11, 0x06, 0x0a, 0x03, b'y', b'e', b's',
            0xa1, 0x08,
            0xa4, 0x11, 0x05, 0x0a, 0x02, b'n', b'o',
        ];

        let (yes, _) = run(&body, "\\TST_", &[Object::Integer(1)]);
        assert_eq!(yes.to_buffer_bytes().unwrap(), b"yes");
        let (no, _) = run(&body, "\\TST_", &[Object::Integer(0)]);
        assert_eq!(no.to_buffer_bytes().unwrap(), b"no");
    }

    #[test]
    fn test_while_loop() {
        // Method(TST_) { Store(Zero, Local0) While (LLess(Local0, 5))
        // { Increment(Local0) } Return(Local0) }
        let body = [
            0x14, 0x13, b'T', b'S', b'T', b'_', 0x00,
            0x70, 0x00, 0x60,
            0xa2, 0x07, 0x95, 0x60, 0x0a, 0x05, 0x75, 0x60,
            0xa4, 0x60,
        ];
        let (result, _) = run(&body, "\\TST_", &[]);
        assert_eq!(result.to_integer(), Ok(5));
    }

    #[test]
    fn test_match_operator() {
        // Name(PKG_, Package { One, 5, 3 })
        // Method(TST_, 1) { Return(Match(PKG_, MGE, Arg0, MTR, Zero, Zero)) }
        let body = [
            0x08, b'P', b'K', b'G', b'_',
            0x12, 0x07, 0x03, 0x01, 0x0a, 0x05, 0x0a, 0x03,
            0x14, 0x11, b'T', b'S', b'T', b'_', 0x01,
            0xa4, 0x89, b'P', b'K', b'G', b'_', 0x04, 0x68, 0x00, 0x00, 0x00,
        ];

        // First element >= 3 is 5, at index 1.
        let (index, _) = run(&body, "\\TST_", &[Object::Integer(3)]);
        assert_eq!(index.to_integer(), Ok(1));

        // Nothing >= 10: all-ones.
        let (miss, _) = run(&body, "\\TST_", &[Object::Integer(10)]);
        assert_eq!(miss.to_integer(), Ok(u64::MAX));
    }

    #[test]
    fn test_io_field_write_and_read() {
        // OperationRegion(GPIO, SystemIO, 0x400, 0x10)
        // Field(GPIO, ByteAcc, NoLock, Preserve) { , 4, FLD0, 3 }
        // Method(TST_) { Store(0x05, FLD0) Return(FLD0) }
        let body = [
            0x5b, 0x80, b'G', b'P', b'I', b'O', 0x01, 0x0b, 0x00, 0x04, 0x0a, 0x10,
            0x5b, 0x81, 0x0d, b'G', b'P', b'I', b'O', 0x01,
            0x00, 0x04,
            b'F', b'L', b'D', b'0', 0x03,
            0x14, 0x12, b'T', b'S', b'T', b'_', 0x00,
            0x70, 0x0a, 0x05, b'F', b'L', b'D', b'0',
            0xa4, b'F', b'L', b'D', b'0',
        ];
        let (result, handler) = run(&body, "\\TST_", &[]);
        assert_eq!(result.to_integer(), Ok(5));
        // Bits 4..7 of the first byte of the region.
        assert_eq!(handler.io.get(&0x400), Some(&0x50));
    }

    #[test]
    fn test_mod_evaluates_divisor_once() {
        // Name(CNT_, One)
        // Method(DECR) { Store(CNT_, Local0) Store(Zero, CNT_) Return(Local0) }
        // Method(MAIN) { Return(Mod(5, DECR())) }
        //
        // DECR returns 1 the first time and 0 afterwards, so a second
        // evaluation of the divisor would divide by zero.
        let body = [
            0x08, b'C', b'N', b'T', b'_', 0x01,
            0x14, 0x14, b'D', b'E', b'C', b'R', 0x00,
            0x70, b'C', b'N', b'T', b'_', 0x60,
            0x70, 0x00, b'C', b'N', b'T', b'_',
            0xa4, 0x60,
            0x14, 0x0f, b'M', b'A', b'I', b'N', 0x00,
            0xa4, 0x85, 0x0a, 0x05, b'D', b'E', b'C', b'R', 0x00,
        ];
        let (result, _) = run(&body, "\\MAIN", &[]);
        assert_eq!(result.to_integer(), Ok(0));
    }

    #[test]
    fn test_cond_ref_of_undefined() {
        // Method(TST_) { If (CondRefOf(XXXX)) { Return(One) } Return(Zero) }
        let body = [
            0x14, 0x13, b'T', b'S', b'T', b'_', 0x00,
            0xa0, 0x0a, 0x5b, 0x12, b'X', b'X', b'X', b'X', 0x00,
            0xa4, 0x01,
            0xa4, 0x00,
        ];
        let (result, _) = run(&body, "\\TST_", &[]);
        assert_eq!(result.to_integer(), Ok(0));
    }

    #[test]
    fn test_osi_is_permissive() {
        // Method(TST_) { Return(\_OSI("Linux")) }
        let body = [
            0x14, 0x13, b'T', b'S', b'T', b'_', 0x00,
            0xa4, b'\\', b'_', b'O', b'S', b'I', 0x0d, b'L', b'i', b'n', b'u', b'x', 0x00,
        ];
        let (result, _) = run(&body, "\\TST_", &[]);
        assert_eq!(result.to_integer(), Ok(0xffff_ffff));
    }

    #[test]
    fn test_index_and_store() {
        // Name(BUF_, Buffer(4) {})
        // Method(TST_) { Store(0x2a, Index(BUF_, 2)) Return(DerefOf(Index(BUF_, 2))) }
        let body = [
            0x08, b'B', b'U', b'F', b'_', 0x11, 0x03, 0x0a, 0x04,
            0x14, 0x1b, b'T', b'S', b'T', b'_', 0x00,
            0x70, 0x0a, 0x2a, 0x88, b'B', b'U', b'F', b'_', 0x0a, 0x02, 0x00,
            0xa4, 0x83, 0x88, b'B', b'U', b'F', b'_', 0x0a, 0x02, 0x00,
        ];
        let (result, _) = run(&body, "\\TST_", &[]);
        assert_eq!(result.to_integer(), Ok(0x2a));
    }
}

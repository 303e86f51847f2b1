//! Declarative description of every AML construct: which opcode introduces
//! it, which fields follow, and what the fields are called. The parser walks
//! these tables; the generator consults them in reverse. Everything here is
//! `'static` data behind a closed enum, so dispatch is an exhaustive match.

use crate::opcode::*;

/// Every construct the grammar knows about, including leaf kinds produced
/// directly by the parser (`ByteData`, `NameString`, ...).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Construct {
    // Table encoding
    AmlCode,
    DefBlockHeader,

    // Leaves
    ByteData,
    WordData,
    DWordData,
    TWordData,
    QWordData,
    StringData,
    NameSeg,
    NameString,
    PkgLength,
    ByteList,

    // Name objects
    ArgObj,
    LocalObj,
    DebugObj,
    NullName,

    // Data objects
    ByteConst,
    WordConst,
    DWordConst,
    QWordConst,
    String,
    ZeroOp,
    OneOp,
    OnesOp,
    RevisionOp,

    // Term lists
    TermList,
    FieldList,
    PackageElementList,

    // Namespace modifier objects
    DefAlias,
    DefName,
    DefScope,

    // Named objects
    DefBankField,
    DefCreateBitField,
    DefCreateByteField,
    DefCreateDWordField,
    DefCreateField,
    DefCreateQWordField,
    DefCreateWordField,
    DefDataRegion,
    DefDevice,
    DefEvent,
    DefExternal,
    DefField,
    DefIndexField,
    DefMethod,
    DefMutex,
    DefOpRegion,
    DefPowerRes,
    DefProcessor,
    DefThermalZone,

    // Field elements
    NamedField,
    ReservedField,
    AccessField,
    ExtendedAccessField,
    ConnectField,

    // Statement opcodes
    DefBreak,
    DefBreakPoint,
    DefContinue,
    DefElse,
    DefFatal,
    DefIfElse,
    DefNoop,
    DefNotify,
    DefRelease,
    DefReset,
    DefReturn,
    DefSignal,
    DefSleep,
    DefStall,
    DefUnload,
    DefWhile,

    // Expression opcodes
    DefAcquire,
    DefAdd,
    DefAnd,
    DefBuffer,
    DefConcat,
    DefConcatRes,
    DefCondRefOf,
    DefCopyObject,
    DefDecrement,
    DefDerefOf,
    DefDivide,
    DefFindSetLeftBit,
    DefFindSetRightBit,
    DefFromBCD,
    DefIncrement,
    DefIndex,
    DefLAnd,
    DefLEqual,
    DefLGreater,
    DefLLess,
    DefLNot,
    DefLOr,
    DefLoad,
    DefLoadTable,
    DefMatch,
    DefMid,
    DefMod,
    DefMultiply,
    DefNAnd,
    DefNOr,
    DefNot,
    DefObjectType,
    DefOr,
    DefPackage,
    DefVarPackage,
    DefRefOf,
    DefShiftLeft,
    DefShiftRight,
    DefSizeOf,
    DefStore,
    DefSubtract,
    DefTimer,
    DefToBCD,
    DefToBuffer,
    DefToDecimalString,
    DefToHexString,
    DefToInteger,
    DefToString,
    DefWait,
    DefXOr,
    MethodInvocation,
}

/// One field of a sequence construct, as consumed by the parser's generic
/// sequence walker.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
    /// Scope-creating package length. Always first when present.
    PkgLength,
    /// Package-length-encoded number with no scope (field bit lengths).
    FieldLength,
    NameString,
    NameSeg,
    ByteData,
    WordData,
    DWordData,
    TWordData,
    QWordData,
    /// NUL-terminated string body (the `0x0d` prefix is the opcode).
    StringData,
    TermArg,
    SuperName,
    SimpleName,
    Target,
    /// TermObj repetition to the end of the enclosing scope.
    TermList,
    /// FieldElement repetition to the end of the enclosing scope.
    FieldList,
    /// Raw bytes to the end of the enclosing scope.
    ByteList,
    /// PackageElement repetition to the end of the enclosing scope.
    PackageElementList,
    DataRefObject,
    /// An optional trailing `DefElse`.
    OptionalElse,
}

use Construct::*;
use Field::*;

/// The ordered field layout of a sequence construct. `None` for leaves,
/// alternations, and the two custom-parsed constructs (`AmlCode`,
/// `MethodInvocation`).
pub fn sequence(construct: Construct) -> Option<&'static [Field]> {
    Some(match construct {
        DefBlockHeader => &[
            Field::DWordData, Field::DWordData, Field::ByteData, Field::ByteData,
            Field::TWordData, Field::QWordData, Field::DWordData, Field::DWordData,
            Field::DWordData,
        ],

        DefAlias => &[Field::NameString, Field::NameString],
        DefName => &[Field::NameString, DataRefObject],
        DefScope => &[Field::PkgLength, Field::NameString, Field::TermList],

        DefBankField => {
            &[Field::PkgLength, Field::NameString, Field::NameString, TermArg, Field::ByteData, Field::FieldList]
        }
        DefCreateBitField | DefCreateByteField | DefCreateWordField | DefCreateDWordField
        | DefCreateQWordField => &[TermArg, TermArg, Field::NameString],
        DefCreateField => &[TermArg, TermArg, TermArg, Field::NameString],
        DefDataRegion => &[Field::NameString, TermArg, TermArg, TermArg],
        DefDevice | DefThermalZone => &[Field::PkgLength, Field::NameString, Field::TermList],
        DefEvent => &[Field::NameString],
        DefExternal => &[Field::NameString, Field::ByteData, Field::ByteData],
        DefField => &[Field::PkgLength, Field::NameString, Field::ByteData, Field::FieldList],
        DefIndexField => {
            &[Field::PkgLength, Field::NameString, Field::NameString, Field::ByteData, Field::FieldList]
        }
        DefMethod => &[Field::PkgLength, Field::NameString, Field::ByteData, Field::TermList],
        DefMutex => &[Field::NameString, Field::ByteData],
        DefOpRegion => &[Field::NameString, Field::ByteData, TermArg, TermArg],
        DefPowerRes => {
            &[Field::PkgLength, Field::NameString, Field::ByteData, Field::WordData, Field::TermList]
        }
        DefProcessor => {
            &[Field::PkgLength, Field::NameString, Field::ByteData, Field::DWordData, Field::ByteData, Field::TermList]
        }

        NamedField => &[Field::NameSeg, FieldLength],
        ReservedField => &[FieldLength],
        AccessField => &[Field::ByteData, Field::ByteData],
        ExtendedAccessField => &[Field::ByteData, Field::ByteData, Field::ByteData],
        ConnectField => &[Field::NameString],

        DefBreak | DefBreakPoint | DefContinue | DefNoop | DefTimer => &[],
        DefElse => &[Field::PkgLength, Field::TermList],
        DefFatal => &[Field::ByteData, Field::DWordData, TermArg],
        DefIfElse => &[Field::PkgLength, TermArg, Field::TermList, OptionalElse],
        DefNotify => &[SuperName, TermArg],
        DefRelease | DefReset | DefSignal => &[SuperName],
        DefReturn => &[TermArg],
        DefSleep | DefStall => &[TermArg],
        DefUnload => &[Target],
        DefWhile => &[Field::PkgLength, TermArg, Field::TermList],

        DefAcquire => &[SuperName, Field::WordData],
        DefAdd | DefAnd | DefConcat | DefConcatRes | DefMod | DefMultiply | DefNAnd | DefNOr
        | DefOr | DefSubtract | DefXOr | DefShiftLeft | DefShiftRight => {
            &[TermArg, TermArg, Target]
        }
        DefBuffer => &[Field::PkgLength, TermArg, Field::ByteList],
        DefCondRefOf => &[SuperName, Target],
        DefCopyObject => &[TermArg, SimpleName],
        DefDecrement | DefIncrement => &[SuperName],
        DefDerefOf => &[TermArg],
        DefDivide => &[TermArg, TermArg, Target, Target],
        DefFindSetLeftBit | DefFindSetRightBit | DefFromBCD | DefToBCD | DefNot | DefToBuffer
        | DefToDecimalString | DefToHexString | DefToInteger => &[TermArg, Target],
        DefIndex => &[TermArg, TermArg, Target],
        DefLAnd | DefLEqual | DefLGreater | DefLLess | DefLOr => &[TermArg, TermArg],
        DefLNot => &[TermArg],
        DefLoad => &[Field::NameString, Target],
        DefLoadTable => &[TermArg, TermArg, TermArg, TermArg, TermArg, TermArg],
        DefMatch => &[TermArg, Field::ByteData, TermArg, Field::ByteData, TermArg, TermArg],
        DefMid => &[TermArg, TermArg, TermArg, Target],
        DefObjectType | DefRefOf | DefSizeOf => &[SuperName],
        DefPackage => &[Field::PkgLength, Field::ByteData, Field::PackageElementList],
        DefVarPackage => &[Field::PkgLength, TermArg, Field::PackageElementList],
        DefStore => &[TermArg, SuperName],
        DefToString => &[TermArg, TermArg, Target],
        DefWait => &[SuperName, TermArg],

        ByteConst => &[Field::ByteData],
        WordConst => &[Field::WordData],
        DWordConst => &[Field::DWordData],
        QWordConst => &[Field::QWordData],
        String => &[Field::StringData],
        ZeroOp | OneOp | OnesOp | RevisionOp | DebugObj | NullName => &[],

        _ => return None,
    })
}

/// Accessor names for the children of a sequence construct, aligned with the
/// layout returned by [`sequence`].
pub fn field_names(construct: Construct) -> &'static [&'static str] {
    match construct {
        DefBlockHeader => &[
            "TableSignature", "TableLength", "SpecCompliance", "CheckSum", "OemID", "OemTableID",
            "OemRevision", "CreatorID", "CreatorRevision",
        ],
        DefAlias => &["SourceObject", "AliasObject"],
        DefName => &["NameString", "DataRefObject"],
        DefScope | DefDevice | DefThermalZone => &["PkgLength", "NameString", "TermList"],
        DefBankField => {
            &["PkgLength", "RegionName", "BankName", "BankValue", "FieldFlags", "FieldList"]
        }
        DefCreateBitField => &["SourceBuff", "BitIndex", "NameString"],
        DefCreateByteField | DefCreateWordField | DefCreateDWordField | DefCreateQWordField => {
            &["SourceBuff", "ByteIndex", "NameString"]
        }
        DefCreateField => &["SourceBuff", "BitIndex", "NumBits", "NameString"],
        DefDataRegion => &["NameString", "Signature", "OEMID", "OEMTableID"],
        DefEvent => &["NameString"],
        DefExternal => &["NameString", "ObjectType", "ArgumentCount"],
        DefField => &["PkgLength", "NameString", "FieldFlags", "FieldList"],
        DefIndexField => &["PkgLength", "IndexName", "DataName", "FieldFlags", "FieldList"],
        DefMethod => &["PkgLength", "NameString", "MethodFlags", "TermList"],
        DefMutex => &["NameString", "SyncFlags"],
        DefOpRegion => &["NameString", "RegionSpace", "RegionOffset", "RegionLen"],
        DefPowerRes => &["PkgLength", "NameString", "SystemLevel", "ResourceOrder", "TermList"],
        DefProcessor => &["PkgLength", "NameString", "ProcID", "PblkAddr", "PblkLen", "TermList"],
        NamedField => &["NameSeg", "FieldLength"],
        ReservedField => &["FieldLength"],
        AccessField => &["AccessType", "AccessAttrib"],
        ExtendedAccessField => &["AccessType", "ExtendedAccessAttrib", "AccessLength"],
        ConnectField => &["ConnectFieldDef"],
        DefElse => &["PkgLength", "TermList"],
        DefFatal => &["FatalType", "FatalCode", "FatalArg"],
        DefIfElse => &["PkgLength", "Predicate", "TermList", "DefElse"],
        DefNotify => &["NotifyObject", "NotifyValue"],
        DefRelease => &["MutexObject"],
        DefReset | DefSignal => &["EventObject"],
        DefReturn => &["ArgObject"],
        DefSleep => &["MsecTime"],
        DefStall => &["UsecTime"],
        DefUnload => &["Target"],
        DefWhile => &["PkgLength", "Predicate", "TermList"],
        DefAcquire => &["MutexObject", "Timeout"],
        DefAdd | DefAnd | DefConcat | DefConcatRes | DefMod | DefMultiply | DefNAnd | DefNOr
        | DefOr | DefSubtract | DefXOr => &["LeftOperand", "RightOperand", "Target"],
        DefShiftLeft | DefShiftRight => &["Operand", "ShiftCount", "Target"],
        DefBuffer => &["PkgLength", "BufferSize", "ByteList"],
        DefCondRefOf => &["SuperName", "Target"],
        DefCopyObject => &["TermArg", "SimpleName"],
        DefDecrement | DefIncrement => &["SuperName"],
        DefDerefOf => &["ObjReference"],
        DefDivide => &["Dividend", "Divisor", "Remainder", "Quotient"],
        DefFindSetLeftBit | DefFindSetRightBit | DefFromBCD | DefToBCD | DefNot | DefToBuffer
        | DefToDecimalString | DefToHexString | DefToInteger => &["Operand", "Target"],
        DefIndex => &["BuffPkgStrObj", "IndexValue", "Target"],
        DefLAnd | DefLEqual | DefLGreater | DefLLess | DefLOr => &["LeftOperand", "RightOperand"],
        DefLNot => &["Operand"],
        DefLoad => &["NameString", "Target"],
        DefLoadTable => {
            &["Signature", "OEMID", "TableID", "RootPath", "ParameterPath", "ParameterData"]
        }
        DefMatch => {
            &["SearchPkg", "MatchOpcode1", "Operand1", "MatchOpcode2", "Operand2", "StartIndex"]
        }
        DefMid => &["MidObj", "Source", "Index", "Target"],
        DefObjectType | DefRefOf | DefSizeOf => &["SuperName"],
        DefPackage => &["PkgLength", "NumElements", "PackageElementList"],
        DefVarPackage => &["PkgLength", "VarNumElements", "PackageElementList"],
        DefStore => &["TermArg", "SuperName"],
        DefToString => &["TermArg", "LengthArg", "Target"],
        DefWait => &["EventObject", "Operand"],
        ByteConst | WordConst | DWordConst | QWordConst => &["Data"],
        String => &["StringData"],
        _ => &[],
    }
}

/// The opcode that introduces a sequence construct, if it has one.
pub fn opcode_of(construct: Construct) -> Option<u16> {
    Some(match construct {
        ZeroOp => ZERO_OP,
        OneOp => ONE_OP,
        OnesOp => ONES_OP,
        RevisionOp => REVISION_OP,
        ByteConst => BYTE_PREFIX,
        WordConst => WORD_PREFIX,
        DWordConst => DWORD_PREFIX,
        QWordConst => QWORD_PREFIX,
        String => STRING_PREFIX,
        DebugObj => DEBUG_OP,

        DefAlias => DEF_ALIAS_OP,
        DefName => DEF_NAME_OP,
        DefScope => DEF_SCOPE_OP,
        DefBankField => DEF_BANK_FIELD_OP,
        DefCreateBitField => DEF_CREATE_BIT_FIELD_OP,
        DefCreateByteField => DEF_CREATE_BYTE_FIELD_OP,
        DefCreateWordField => DEF_CREATE_WORD_FIELD_OP,
        DefCreateDWordField => DEF_CREATE_DWORD_FIELD_OP,
        DefCreateQWordField => DEF_CREATE_QWORD_FIELD_OP,
        DefCreateField => DEF_CREATE_FIELD_OP,
        DefDataRegion => DEF_DATA_REGION_OP,
        DefDevice => DEF_DEVICE_OP,
        DefEvent => DEF_EVENT_OP,
        DefExternal => DEF_EXTERNAL_OP,
        DefField => DEF_FIELD_OP,
        DefIndexField => DEF_INDEX_FIELD_OP,
        DefMethod => DEF_METHOD_OP,
        DefMutex => DEF_MUTEX_OP,
        DefOpRegion => DEF_OP_REGION_OP,
        DefPowerRes => DEF_POWER_RES_OP,
        DefProcessor => DEF_PROCESSOR_OP,
        DefThermalZone => DEF_THERMAL_ZONE_OP,

        DefBreak => DEF_BREAK_OP,
        DefBreakPoint => DEF_BREAKPOINT_OP,
        DefContinue => DEF_CONTINUE_OP,
        DefElse => DEF_ELSE_OP,
        DefFatal => DEF_FATAL_OP,
        DefIfElse => DEF_IF_OP,
        DefNoop => DEF_NOOP_OP,
        DefNotify => DEF_NOTIFY_OP,
        DefRelease => DEF_RELEASE_OP,
        DefReset => DEF_RESET_OP,
        DefReturn => DEF_RETURN_OP,
        DefSignal => DEF_SIGNAL_OP,
        DefSleep => DEF_SLEEP_OP,
        DefStall => DEF_STALL_OP,
        DefUnload => DEF_UNLOAD_OP,
        DefWhile => DEF_WHILE_OP,

        DefAcquire => DEF_ACQUIRE_OP,
        DefAdd => DEF_ADD_OP,
        DefAnd => DEF_AND_OP,
        DefBuffer => DEF_BUFFER_OP,
        DefConcat => DEF_CONCAT_OP,
        DefConcatRes => DEF_CONCAT_RES_OP,
        DefCondRefOf => DEF_COND_REF_OF_OP,
        DefCopyObject => DEF_COPY_OBJECT_OP,
        DefDecrement => DEF_DECREMENT_OP,
        DefDerefOf => DEF_DEREF_OF_OP,
        DefDivide => DEF_DIVIDE_OP,
        DefFindSetLeftBit => DEF_FIND_SET_LEFT_BIT_OP,
        DefFindSetRightBit => DEF_FIND_SET_RIGHT_BIT_OP,
        DefFromBCD => DEF_FROM_BCD_OP,
        DefIncrement => DEF_INCREMENT_OP,
        DefIndex => DEF_INDEX_OP,
        DefLAnd => DEF_L_AND_OP,
        DefLEqual => DEF_L_EQUAL_OP,
        DefLGreater => DEF_L_GREATER_OP,
        DefLLess => DEF_L_LESS_OP,
        DefLNot => DEF_L_NOT_OP,
        DefLOr => DEF_L_OR_OP,
        DefLoad => DEF_LOAD_OP,
        DefLoadTable => DEF_LOAD_TABLE_OP,
        DefMatch => DEF_MATCH_OP,
        DefMid => DEF_MID_OP,
        DefMod => DEF_MOD_OP,
        DefMultiply => DEF_MULTIPLY_OP,
        DefNAnd => DEF_NAND_OP,
        DefNOr => DEF_NOR_OP,
        DefNot => DEF_NOT_OP,
        DefObjectType => DEF_OBJECT_TYPE_OP,
        DefOr => DEF_OR_OP,
        DefPackage => DEF_PACKAGE_OP,
        DefVarPackage => DEF_VAR_PACKAGE_OP,
        DefRefOf => DEF_REF_OF_OP,
        DefShiftLeft => DEF_SHIFT_LEFT_OP,
        DefShiftRight => DEF_SHIFT_RIGHT_OP,
        DefSizeOf => DEF_SIZE_OF_OP,
        DefStore => DEF_STORE_OP,
        DefSubtract => DEF_SUBTRACT_OP,
        DefTimer => DEF_TIMER_OP,
        DefToBCD => DEF_TO_BCD_OP,
        DefToBuffer => DEF_TO_BUFFER_OP,
        DefToDecimalString => DEF_TO_DECIMAL_STRING_OP,
        DefToHexString => DEF_TO_HEX_STRING_OP,
        DefToInteger => DEF_TO_INTEGER_OP,
        DefToString => DEF_TO_STRING_OP,
        DefWait => DEF_WAIT_OP,
        DefXOr => DEF_XOR_OP,

        _ => return None,
    })
}

/// NameSpaceModifierObj | NamedObj dispatch.
pub fn match_object(opcode: u16) -> Option<Construct> {
    Some(match opcode {
        DEF_ALIAS_OP => DefAlias,
        DEF_NAME_OP => DefName,
        DEF_SCOPE_OP => DefScope,
        DEF_BANK_FIELD_OP => DefBankField,
        DEF_CREATE_BIT_FIELD_OP => DefCreateBitField,
        DEF_CREATE_BYTE_FIELD_OP => DefCreateByteField,
        DEF_CREATE_WORD_FIELD_OP => DefCreateWordField,
        DEF_CREATE_DWORD_FIELD_OP => DefCreateDWordField,
        DEF_CREATE_QWORD_FIELD_OP => DefCreateQWordField,
        DEF_CREATE_FIELD_OP => DefCreateField,
        DEF_DATA_REGION_OP => DefDataRegion,
        DEF_DEVICE_OP => DefDevice,
        DEF_EVENT_OP => DefEvent,
        DEF_EXTERNAL_OP => DefExternal,
        DEF_FIELD_OP => DefField,
        DEF_INDEX_FIELD_OP => DefIndexField,
        DEF_METHOD_OP => DefMethod,
        DEF_MUTEX_OP => DefMutex,
        DEF_OP_REGION_OP => DefOpRegion,
        DEF_POWER_RES_OP => DefPowerRes,
        DEF_PROCESSOR_OP => DefProcessor,
        DEF_THERMAL_ZONE_OP => DefThermalZone,
        _ => return None,
    })
}

pub fn match_statement_opcode(opcode: u16) -> Option<Construct> {
    Some(match opcode {
        DEF_BREAK_OP => DefBreak,
        DEF_BREAKPOINT_OP => DefBreakPoint,
        DEF_CONTINUE_OP => DefContinue,
        DEF_ELSE_OP => DefElse,
        DEF_FATAL_OP => DefFatal,
        DEF_IF_OP => DefIfElse,
        DEF_NOOP_OP => DefNoop,
        DEF_NOTIFY_OP => DefNotify,
        DEF_RELEASE_OP => DefRelease,
        DEF_RESET_OP => DefReset,
        DEF_RETURN_OP => DefReturn,
        DEF_SIGNAL_OP => DefSignal,
        DEF_SLEEP_OP => DefSleep,
        DEF_STALL_OP => DefStall,
        DEF_UNLOAD_OP => DefUnload,
        DEF_WHILE_OP => DefWhile,
        _ => return None,
    })
}

pub fn match_expression_opcode(opcode: u16) -> Option<Construct> {
    Some(match opcode {
        DEF_ACQUIRE_OP => DefAcquire,
        DEF_ADD_OP => DefAdd,
        DEF_AND_OP => DefAnd,
        DEF_BUFFER_OP => DefBuffer,
        DEF_CONCAT_OP => DefConcat,
        DEF_CONCAT_RES_OP => DefConcatRes,
        DEF_COND_REF_OF_OP => DefCondRefOf,
        DEF_COPY_OBJECT_OP => DefCopyObject,
        DEF_DECREMENT_OP => DefDecrement,
        DEF_DEREF_OF_OP => DefDerefOf,
        DEF_DIVIDE_OP => DefDivide,
        DEF_FIND_SET_LEFT_BIT_OP => DefFindSetLeftBit,
        DEF_FIND_SET_RIGHT_BIT_OP => DefFindSetRightBit,
        DEF_FROM_BCD_OP => DefFromBCD,
        DEF_INCREMENT_OP => DefIncrement,
        DEF_INDEX_OP => DefIndex,
        DEF_L_AND_OP => DefLAnd,
        DEF_L_EQUAL_OP => DefLEqual,
        DEF_L_GREATER_OP => DefLGreater,
        DEF_L_LESS_OP => DefLLess,
        DEF_L_NOT_OP => DefLNot,
        DEF_L_OR_OP => DefLOr,
        DEF_LOAD_OP => DefLoad,
        DEF_LOAD_TABLE_OP => DefLoadTable,
        DEF_MATCH_OP => DefMatch,
        DEF_MID_OP => DefMid,
        DEF_MOD_OP => DefMod,
        DEF_MULTIPLY_OP => DefMultiply,
        DEF_NAND_OP => DefNAnd,
        DEF_NOR_OP => DefNOr,
        DEF_NOT_OP => DefNot,
        DEF_OBJECT_TYPE_OP => DefObjectType,
        DEF_OR_OP => DefOr,
        DEF_PACKAGE_OP => DefPackage,
        DEF_VAR_PACKAGE_OP => DefVarPackage,
        DEF_REF_OF_OP => DefRefOf,
        DEF_SHIFT_LEFT_OP => DefShiftLeft,
        DEF_SHIFT_RIGHT_OP => DefShiftRight,
        DEF_SIZE_OF_OP => DefSizeOf,
        DEF_STORE_OP => DefStore,
        DEF_SUBTRACT_OP => DefSubtract,
        DEF_TIMER_OP => DefTimer,
        DEF_TO_BCD_OP => DefToBCD,
        DEF_TO_BUFFER_OP => DefToBuffer,
        DEF_TO_DECIMAL_STRING_OP => DefToDecimalString,
        DEF_TO_HEX_STRING_OP => DefToHexString,
        DEF_TO_INTEGER_OP => DefToInteger,
        DEF_TO_STRING_OP => DefToString,
        DEF_WAIT_OP => DefWait,
        DEF_XOR_OP => DefXOr,
        _ => return None,
    })
}

/// ComputationalData dispatch (constants, strings, buffers).
pub fn match_computational_data(opcode: u16) -> Option<Construct> {
    Some(match opcode {
        BYTE_PREFIX => ByteConst,
        WORD_PREFIX => WordConst,
        DWORD_PREFIX => DWordConst,
        QWORD_PREFIX => QWordConst,
        STRING_PREFIX => String,
        ZERO_OP => ZeroOp,
        ONE_OP => OneOp,
        ONES_OP => OnesOp,
        REVISION_OP => RevisionOp,
        DEF_BUFFER_OP => DefBuffer,
        _ => return None,
    })
}

/// DataObject dispatch: ComputationalData | DefPackage | DefVarPackage.
pub fn match_data_object(opcode: u16) -> Option<Construct> {
    match opcode {
        DEF_PACKAGE_OP => Some(DefPackage),
        DEF_VAR_PACKAGE_OP => Some(DefVarPackage),
        _ => match_computational_data(opcode),
    }
}

/// Constructs whose first field opens a deferred-recoverable package scope.
pub fn has_pkg_scope(construct: Construct) -> bool {
    matches!(
        sequence(construct),
        Some(layout) if layout.first() == Some(&Field::PkgLength)
    )
}

/// Constructs that change the namespace scope to their name while their body
/// parses.
pub fn creates_scope(construct: Construct) -> bool {
    matches!(
        construct,
        DefScope | DefDevice | DefMethod | DefPowerRes | DefProcessor | DefThermalZone
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_and_names_align() {
        // Several construct labels share names with layout field kinds; the
        // layout tables must resolve to `Field` variants throughout.
        assert_eq!(sequence(Construct::WordConst), Some(&[Field::WordData][..]));
        assert_eq!(sequence(Construct::QWordConst), Some(&[Field::QWordData][..]));
        assert_eq!(sequence(Construct::String), Some(&[Field::StringData][..]));
        let header = sequence(Construct::DefBlockHeader).unwrap();
        assert_eq!(header.len(), field_names(Construct::DefBlockHeader).len());
        assert_eq!(header[4], Field::TWordData);

        for construct in [
            Construct::DefScope,
            Construct::DefMethod,
            Construct::DefIfElse,
            Construct::DefField,
            Construct::DefMatch,
        ] {
            assert_eq!(
                sequence(construct).unwrap().len(),
                field_names(construct).len(),
                "{:?}",
                construct
            );
        }
    }
}

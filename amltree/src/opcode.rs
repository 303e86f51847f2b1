//! Opcode constants, as 16-bit values. One-byte opcodes are just the byte;
//! extended opcodes fold the `0x5b` prefix into the low byte, so
//! `DEF_DEVICE_OP` is `0x825b` (`0x5b 0x82` on the wire).

pub const EXT_OP_PREFIX: u8 = 0x5b;

pub const ZERO_OP: u16 = 0x00;
pub const ONE_OP: u16 = 0x01;
pub const DEF_ALIAS_OP: u16 = 0x06;
pub const DEF_NAME_OP: u16 = 0x08;
pub const BYTE_PREFIX: u16 = 0x0a;
pub const WORD_PREFIX: u16 = 0x0b;
pub const DWORD_PREFIX: u16 = 0x0c;
pub const STRING_PREFIX: u16 = 0x0d;
pub const QWORD_PREFIX: u16 = 0x0e;
pub const DEF_SCOPE_OP: u16 = 0x10;
pub const DEF_BUFFER_OP: u16 = 0x11;
pub const DEF_PACKAGE_OP: u16 = 0x12;
pub const DEF_VAR_PACKAGE_OP: u16 = 0x13;
pub const DEF_METHOD_OP: u16 = 0x14;
pub const DEF_EXTERNAL_OP: u16 = 0x15;

pub const NULL_NAME: u8 = 0x00;
pub const DUAL_NAME_PREFIX: u8 = 0x2e;
pub const MULTI_NAME_PREFIX: u8 = 0x2f;
pub const ROOT_CHAR: u8 = b'\\';
pub const PREFIX_CHAR: u8 = b'^';

pub const LOCAL0_OP: u16 = 0x60;
pub const LOCAL7_OP: u16 = 0x67;
pub const ARG0_OP: u16 = 0x68;
pub const ARG6_OP: u16 = 0x6e;

pub const DEF_STORE_OP: u16 = 0x70;
pub const DEF_REF_OF_OP: u16 = 0x71;
pub const DEF_ADD_OP: u16 = 0x72;
pub const DEF_CONCAT_OP: u16 = 0x73;
pub const DEF_SUBTRACT_OP: u16 = 0x74;
pub const DEF_INCREMENT_OP: u16 = 0x75;
pub const DEF_DECREMENT_OP: u16 = 0x76;
pub const DEF_MULTIPLY_OP: u16 = 0x77;
pub const DEF_DIVIDE_OP: u16 = 0x78;
pub const DEF_SHIFT_LEFT_OP: u16 = 0x79;
pub const DEF_SHIFT_RIGHT_OP: u16 = 0x7a;
pub const DEF_AND_OP: u16 = 0x7b;
pub const DEF_NAND_OP: u16 = 0x7c;
pub const DEF_OR_OP: u16 = 0x7d;
pub const DEF_NOR_OP: u16 = 0x7e;
pub const DEF_XOR_OP: u16 = 0x7f;
pub const DEF_NOT_OP: u16 = 0x80;
pub const DEF_FIND_SET_LEFT_BIT_OP: u16 = 0x81;
pub const DEF_FIND_SET_RIGHT_BIT_OP: u16 = 0x82;
pub const DEF_DEREF_OF_OP: u16 = 0x83;
pub const DEF_CONCAT_RES_OP: u16 = 0x84;
pub const DEF_MOD_OP: u16 = 0x85;
pub const DEF_NOTIFY_OP: u16 = 0x86;
pub const DEF_SIZE_OF_OP: u16 = 0x87;
pub const DEF_INDEX_OP: u16 = 0x88;
pub const DEF_MATCH_OP: u16 = 0x89;
pub const DEF_CREATE_DWORD_FIELD_OP: u16 = 0x8a;
pub const DEF_CREATE_WORD_FIELD_OP: u16 = 0x8b;
pub const DEF_CREATE_BYTE_FIELD_OP: u16 = 0x8c;
pub const DEF_CREATE_BIT_FIELD_OP: u16 = 0x8d;
pub const DEF_OBJECT_TYPE_OP: u16 = 0x8e;
pub const DEF_CREATE_QWORD_FIELD_OP: u16 = 0x8f;
pub const DEF_L_AND_OP: u16 = 0x90;
pub const DEF_L_OR_OP: u16 = 0x91;
pub const DEF_L_NOT_OP: u16 = 0x92;
pub const DEF_L_EQUAL_OP: u16 = 0x93;
pub const DEF_L_GREATER_OP: u16 = 0x94;
pub const DEF_L_LESS_OP: u16 = 0x95;
pub const DEF_TO_BUFFER_OP: u16 = 0x96;
pub const DEF_TO_DECIMAL_STRING_OP: u16 = 0x97;
pub const DEF_TO_HEX_STRING_OP: u16 = 0x98;
pub const DEF_TO_INTEGER_OP: u16 = 0x99;
pub const DEF_TO_STRING_OP: u16 = 0x9c;
pub const DEF_COPY_OBJECT_OP: u16 = 0x9d;
pub const DEF_MID_OP: u16 = 0x9e;
pub const DEF_CONTINUE_OP: u16 = 0x9f;
pub const DEF_IF_OP: u16 = 0xa0;
pub const DEF_ELSE_OP: u16 = 0xa1;
pub const DEF_WHILE_OP: u16 = 0xa2;
pub const DEF_NOOP_OP: u16 = 0xa3;
pub const DEF_RETURN_OP: u16 = 0xa4;
pub const DEF_BREAK_OP: u16 = 0xa5;
pub const DEF_BREAKPOINT_OP: u16 = 0xcc;
pub const ONES_OP: u16 = 0xff;

pub const DEF_MUTEX_OP: u16 = 0x015b;
pub const DEF_EVENT_OP: u16 = 0x025b;
pub const DEF_COND_REF_OF_OP: u16 = 0x125b;
pub const DEF_CREATE_FIELD_OP: u16 = 0x135b;
pub const DEF_LOAD_TABLE_OP: u16 = 0x1f5b;
pub const DEF_LOAD_OP: u16 = 0x205b;
pub const DEF_STALL_OP: u16 = 0x215b;
pub const DEF_SLEEP_OP: u16 = 0x225b;
pub const DEF_ACQUIRE_OP: u16 = 0x235b;
pub const DEF_SIGNAL_OP: u16 = 0x245b;
pub const DEF_WAIT_OP: u16 = 0x255b;
pub const DEF_RESET_OP: u16 = 0x265b;
pub const DEF_RELEASE_OP: u16 = 0x275b;
pub const DEF_FROM_BCD_OP: u16 = 0x285b;
pub const DEF_TO_BCD_OP: u16 = 0x295b;
pub const DEF_UNLOAD_OP: u16 = 0x2a5b;
pub const REVISION_OP: u16 = 0x305b;
pub const DEBUG_OP: u16 = 0x315b;
pub const DEF_FATAL_OP: u16 = 0x325b;
pub const DEF_TIMER_OP: u16 = 0x335b;
pub const DEF_OP_REGION_OP: u16 = 0x805b;
pub const DEF_FIELD_OP: u16 = 0x815b;
pub const DEF_DEVICE_OP: u16 = 0x825b;
pub const DEF_PROCESSOR_OP: u16 = 0x835b;
pub const DEF_POWER_RES_OP: u16 = 0x845b;
pub const DEF_THERMAL_ZONE_OP: u16 = 0x855b;
pub const DEF_INDEX_FIELD_OP: u16 = 0x865b;
pub const DEF_BANK_FIELD_OP: u16 = 0x875b;
pub const DEF_DATA_REGION_OP: u16 = 0x885b;

// Field element lead bytes (not opcodes; they appear only inside field lists).
pub const RESERVED_FIELD_PREFIX: u8 = 0x00;
pub const ACCESS_FIELD_PREFIX: u8 = 0x01;
pub const CONNECT_FIELD_PREFIX: u8 = 0x02;
pub const EXTENDED_ACCESS_FIELD_PREFIX: u8 = 0x03;

//! JVM opcode constants used by the decoder and by instruction matching.
//!
//! Only opcodes that carry meaning for member matching (and the handful that
//! fixtures need) get a named constant; everything else is handled by
//! [`operand_length`].

pub const NOP: u8 = 0x00;
pub const ACONST_NULL: u8 = 0x01;
pub const ICONST_0: u8 = 0x03;
pub const ICONST_1: u8 = 0x04;
pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const ILOAD: u8 = 0x15;
pub const ALOAD: u8 = 0x19;
pub const ALOAD_0: u8 = 0x2a;
pub const ALOAD_1: u8 = 0x2b;
pub const ISTORE: u8 = 0x36;
pub const ASTORE: u8 = 0x3a;
pub const ASTORE_1: u8 = 0x4c;
pub const ASTORE_2: u8 = 0x4d;
pub const POP: u8 = 0x57;
pub const DUP: u8 = 0x59;
pub const IADD: u8 = 0x60;
pub const IINC: u8 = 0x84;
pub const IFEQ: u8 = 0x99;
pub const IFNE: u8 = 0x9a;
pub const GOTO: u8 = 0xa7;
pub const JSR: u8 = 0xa8;
pub const RET: u8 = 0xa9;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const IRETURN: u8 = 0xac;
pub const ARETURN: u8 = 0xb0;
pub const RETURN: u8 = 0xb1;
pub const GETSTATIC: u8 = 0xb2;
pub const PUTSTATIC: u8 = 0xb3;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const NEWARRAY: u8 = 0xbc;
pub const ANEWARRAY: u8 = 0xbd;
pub const ATHROW: u8 = 0xbf;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;
pub const IFNULL: u8 = 0xc6;
pub const IFNONNULL: u8 = 0xc7;
pub const GOTO_W: u8 = 0xc8;
pub const JSR_W: u8 = 0xc9;
pub const BREAKPOINT: u8 = 0xca;

/// Number of operand bytes following `opcode`, for opcodes with a fixed
/// encoding. Returns `None` for variable-length opcodes (`tableswitch`,
/// `lookupswitch`, `wide`) and for unassigned opcodes.
pub fn operand_length(opcode: u8) -> Option<usize> {
    match opcode {
        TABLESWITCH | LOOKUPSWITCH | WIDE => None,
        BIPUSH | LDC | NEWARRAY | RET => Some(1),
        ILOAD..=ALOAD | ISTORE..=ASTORE => Some(1),
        SIPUSH | LDC_W | LDC2_W | IINC => Some(2),
        IFEQ..=JSR | IFNULL | IFNONNULL => Some(2),
        GETSTATIC..=INVOKESTATIC => Some(2),
        NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => Some(2),
        MULTIANEWARRAY => Some(3),
        INVOKEINTERFACE | INVOKEDYNAMIC | GOTO_W | JSR_W => Some(4),
        0x00..=BREAKPOINT => Some(0),
        0xfe | 0xff => Some(0),
        _ => None,
    }
}

pub fn is_field_opcode(opcode: u8) -> bool {
    (GETSTATIC..=PUTFIELD).contains(&opcode)
}

pub fn is_invoke_opcode(opcode: u8) -> bool {
    (INVOKEVIRTUAL..=INVOKEINTERFACE).contains(&opcode)
}

/// Mnemonic for the opcodes that show up in selectors and diagnostics.
pub fn name(opcode: u8) -> Option<&'static str> {
    Some(match opcode {
        GETSTATIC => "GETSTATIC",
        PUTSTATIC => "PUTSTATIC",
        GETFIELD => "GETFIELD",
        PUTFIELD => "PUTFIELD",
        INVOKEVIRTUAL => "INVOKEVIRTUAL",
        INVOKESPECIAL => "INVOKESPECIAL",
        INVOKESTATIC => "INVOKESTATIC",
        INVOKEINTERFACE => "INVOKEINTERFACE",
        INVOKEDYNAMIC => "INVOKEDYNAMIC",
        NEW => "NEW",
        ANEWARRAY => "ANEWARRAY",
        CHECKCAST => "CHECKCAST",
        INSTANCEOF => "INSTANCEOF",
        LDC => "LDC",
        LDC_W => "LDC_W",
        LDC2_W => "LDC2_W",
        _ => return None,
    })
}

/// Inverse of [`name`]; case-insensitive.
pub fn from_name(name: &str) -> Option<u8> {
    Some(match name.to_ascii_uppercase().as_str() {
        "GETSTATIC" => GETSTATIC,
        "PUTSTATIC" => PUTSTATIC,
        "GETFIELD" => GETFIELD,
        "PUTFIELD" => PUTFIELD,
        "INVOKEVIRTUAL" => INVOKEVIRTUAL,
        "INVOKESPECIAL" => INVOKESPECIAL,
        "INVOKESTATIC" => INVOKESTATIC,
        "INVOKEINTERFACE" => INVOKEINTERFACE,
        "INVOKEDYNAMIC" => INVOKEDYNAMIC,
        "NEW" => NEW,
        "ANEWARRAY" => ANEWARRAY,
        "CHECKCAST" => CHECKCAST,
        "INSTANCEOF" => INSTANCEOF,
        "LDC" => LDC,
        "LDC_W" => LDC_W,
        "LDC2_W" => LDC2_W,
        _ => return None,
    })
}

use crate::opcodes;

/// A value pushed by `ldc`/`ldc_w`/`ldc2_w`.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(String),
    /// Method handles, method types and dynamic constants.
    Other,
}

/// Decoded instruction payload.
///
/// Only the shapes member matching cares about are decoded structurally;
/// everything else is kept as [`Insn::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum Insn {
    Method {
        opcode: u8,
        owner: String,
        name: String,
        descriptor: String,
        interface: bool,
    },
    Field {
        opcode: u8,
        owner: String,
        name: String,
        descriptor: String,
    },
    Type {
        opcode: u8,
        class: String,
    },
    Ldc(Constant),
    Other(u8),
}

impl Insn {
    pub fn invoke(opcode: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::Method {
            opcode,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            interface: opcode == opcodes::INVOKEINTERFACE,
        }
    }

    pub fn field(opcode: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::Field {
            opcode,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    pub fn new_object(class: &str) -> Self {
        Insn::Type {
            opcode: opcodes::NEW,
            class: class.to_string(),
        }
    }

    pub fn ldc_string(value: &str) -> Self {
        Insn::Ldc(Constant::String(value.to_string()))
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Insn::Method { opcode, .. } | Insn::Field { opcode, .. } | Insn::Type { opcode, .. } => {
                *opcode
            }
            Insn::Ldc(Constant::Long(_) | Constant::Double(_)) => opcodes::LDC2_W,
            Insn::Ldc(_) => opcodes::LDC,
            Insn::Other(opcode) => *opcode,
        }
    }

    /// `true` for `INVOKESPECIAL owner.<init>`.
    pub fn is_initializer_of(&self, class: &str) -> bool {
        matches!(
            self,
            Insn::Method { opcode, owner, name, .. }
                if *opcode == opcodes::INVOKESPECIAL && name == "<init>" && owner == class
        )
    }

    /// `true` for `NEW class`.
    pub fn is_allocation_of(&self, class: &str) -> bool {
        matches!(
            self,
            Insn::Type { opcode, class: allocated } if *opcode == opcodes::NEW && allocated == class
        )
    }
}

/// One instruction of a method body together with its bytecode offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub offset: u32,
    pub insn: Insn,
}

impl Instruction {
    pub fn new(offset: u32, insn: Insn) -> Self {
        Self { offset, insn }
    }
}

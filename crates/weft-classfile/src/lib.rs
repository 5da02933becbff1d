#![forbid(unsafe_code)]

mod classfile;
mod code;
mod constant_pool;
mod descriptor;
mod error;
mod insn;
mod reader;
mod writer;

pub mod opcodes;

pub use crate::classfile::{ClassFile, ClassMember, Code, ACC_PRIVATE, ACC_STATIC};
pub use crate::code::decode_code;
pub use crate::constant_pool::{ConstantPool, CpInfo};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, Descriptor, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::insn::{Constant, Insn, Instruction};
pub use crate::writer::{ClassWriter, MethodSpec};

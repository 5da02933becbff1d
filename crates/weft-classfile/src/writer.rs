use std::collections::HashMap;

use crate::constant_pool::encode_modified_utf8;
use crate::error::{Error, Result};
use crate::insn::{Constant, Insn};
use crate::opcodes;

/// A method to emit with [`ClassWriter`]. `code: None` produces an abstract
/// (body-less) method.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub code: Option<Vec<Insn>>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str, code: Vec<Insn>) -> Self {
        Self {
            access_flags: 0x0001,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code: Some(code),
        }
    }

    /// Same method, `private` instead of `public`.
    pub fn private(mut self) -> Self {
        self.access_flags = (self.access_flags & !0x0001) | crate::classfile::ACC_PRIVATE;
        self
    }

    pub fn abstract_method(name: &str, descriptor: &str) -> Self {
        Self {
            access_flags: 0x0401,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code: None,
        }
    }
}

/// Minimal class-file assembler.
///
/// It only knows how to encode the instruction shapes [`crate::decode_code`]
/// produces structurally plus single-byte opcodes, which is what fixtures need.
#[derive(Debug, Clone)]
pub struct ClassWriter {
    access_flags: u16,
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<(u16, String, String)>,
    methods: Vec<MethodSpec>,
}

impl ClassWriter {
    pub fn new(name: &str) -> Self {
        Self {
            access_flags: 0x0021,
            name: name.to_string(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn super_class(mut self, super_name: Option<&str>) -> Self {
        self.super_name = super_name.map(str::to_string);
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push((0x0002, name.to_string(), descriptor.to_string()));
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut pool = PoolBuilder::default();

        let this_index = pool.class(&self.name);
        let super_index = self.super_name.as_deref().map(|s| pool.class(s)).unwrap_or(0);
        let interface_indices: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();

        let mut body = Vec::new();
        put_u2(&mut body, self.access_flags);
        put_u2(&mut body, this_index);
        put_u2(&mut body, super_index);
        put_u2(&mut body, interface_indices.len() as u16);
        for index in interface_indices {
            put_u2(&mut body, index);
        }

        put_u2(&mut body, self.fields.len() as u16);
        for (access, name, descriptor) in &self.fields {
            put_u2(&mut body, *access);
            put_u2(&mut body, pool.utf8(name));
            put_u2(&mut body, pool.utf8(descriptor));
            put_u2(&mut body, 0);
        }

        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u2(&mut body, method.access_flags);
            put_u2(&mut body, pool.utf8(&method.name));
            put_u2(&mut body, pool.utf8(&method.descriptor));
            match &method.code {
                None => put_u2(&mut body, 0),
                Some(insns) => {
                    let code = encode_code(insns, &mut pool)?;
                    put_u2(&mut body, 1);
                    put_u2(&mut body, pool.utf8("Code"));
                    put_u4(&mut body, (code.len() + 12) as u32);
                    put_u2(&mut body, 16); // max_stack
                    put_u2(&mut body, 16); // max_locals
                    put_u4(&mut body, code.len() as u32);
                    body.extend_from_slice(&code);
                    put_u2(&mut body, 0); // exception_table_length
                    put_u2(&mut body, 0); // attributes_count
                }
            }
        }
        put_u2(&mut body, 0); // class attributes

        let mut out = Vec::with_capacity(body.len() + pool.bytes.len() + 10);
        put_u4(&mut out, 0xCAFEBABE);
        put_u2(&mut out, 0);
        put_u2(&mut out, 52);
        put_u2(&mut out, pool.next);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

fn encode_code(insns: &[Insn], pool: &mut PoolBuilder) -> Result<Vec<u8>> {
    let mut code = Vec::new();
    for insn in insns {
        match insn {
            Insn::Method {
                opcode,
                owner,
                name,
                descriptor,
                interface,
            } => {
                let index = pool.member_ref(
                    if *interface { 11 } else { 10 },
                    owner,
                    name,
                    descriptor,
                );
                code.push(*opcode);
                put_u2(&mut code, index);
                if *opcode == opcodes::INVOKEINTERFACE {
                    code.push(argument_slots(descriptor));
                    code.push(0);
                }
            }
            Insn::Field {
                opcode,
                owner,
                name,
                descriptor,
            } => {
                let index = pool.member_ref(9, owner, name, descriptor);
                code.push(*opcode);
                put_u2(&mut code, index);
            }
            Insn::Type { opcode, class } => {
                let index = pool.class(class);
                code.push(*opcode);
                put_u2(&mut code, index);
            }
            Insn::Ldc(constant) => {
                let (index, wide) = pool.constant(constant)?;
                if wide {
                    code.push(opcodes::LDC2_W);
                    put_u2(&mut code, index);
                } else if index <= u8::MAX as u16 {
                    code.push(opcodes::LDC);
                    code.push(index as u8);
                } else {
                    code.push(opcodes::LDC_W);
                    put_u2(&mut code, index);
                }
            }
            Insn::Other(opcode) => {
                if opcodes::operand_length(*opcode) != Some(0) {
                    return Err(Error::Other("cannot encode an opcode with operands"));
                }
                code.push(*opcode);
            }
        }
    }
    Ok(code)
}

/// `invokeinterface` count operand: receiver plus parameter slots.
fn argument_slots(descriptor: &str) -> u8 {
    let slots = crate::parse_method_descriptor(descriptor)
        .map(|desc| {
            desc.params
                .iter()
                .map(|p| match p {
                    crate::FieldType::Base(crate::BaseType::Long)
                    | crate::FieldType::Base(crate::BaseType::Double) => 2,
                    _ => 1,
                })
                .sum::<usize>()
        })
        .unwrap_or(0);
    (slots + 1).min(u8::MAX as usize) as u8
}

#[derive(Hash, PartialEq, Eq)]
enum PoolKey {
    Utf8(String),
    Class(String),
    String(String),
    Int(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    NameAndType(String, String),
    Member(u8, String, String, String),
}

struct PoolBuilder {
    bytes: Vec<u8>,
    next: u16,
    index: HashMap<PoolKey, u16>,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next: 1,
            index: HashMap::new(),
        }
    }
}

impl PoolBuilder {
    fn intern(&mut self, key: PoolKey, slots: u16, encode: impl FnOnce(&mut Vec<u8>)) -> u16 {
        if let Some(index) = self.index.get(&key) {
            return *index;
        }
        let index = self.next;
        encode(&mut self.bytes);
        self.next += slots;
        self.index.insert(key, index);
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        let encoded = encode_modified_utf8(value);
        self.intern(PoolKey::Utf8(value.to_string()), 1, |out| {
            out.push(1);
            put_u2(out, encoded.len() as u16);
            out.extend_from_slice(&encoded);
        })
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.intern(PoolKey::Class(name.to_string()), 1, |out| {
            out.push(7);
            put_u2(out, name_index);
        })
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.intern(
            PoolKey::NameAndType(name.to_string(), descriptor.to_string()),
            1,
            |out| {
                out.push(12);
                put_u2(out, name_index);
                put_u2(out, descriptor_index);
            },
        )
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat_index = self.name_and_type(name, descriptor);
        self.intern(
            PoolKey::Member(tag, owner.to_string(), name.to_string(), descriptor.to_string()),
            1,
            |out| {
                out.push(tag);
                put_u2(out, class_index);
                put_u2(out, nat_index);
            },
        )
    }

    /// Returns the pool index and whether the constant needs `ldc2_w`.
    fn constant(&mut self, constant: &Constant) -> Result<(u16, bool)> {
        Ok(match constant {
            Constant::String(value) => {
                let string_index = self.utf8(value);
                let index = self.intern(PoolKey::String(value.clone()), 1, |out| {
                    out.push(8);
                    put_u2(out, string_index);
                });
                (index, false)
            }
            Constant::Int(value) => {
                let index = self.intern(PoolKey::Int(*value), 1, |out| {
                    out.push(3);
                    out.extend_from_slice(&value.to_be_bytes());
                });
                (index, false)
            }
            Constant::Float(value) => {
                let bits = value.to_bits();
                let index = self.intern(PoolKey::Float(bits), 1, |out| {
                    out.push(4);
                    out.extend_from_slice(&bits.to_be_bytes());
                });
                (index, false)
            }
            Constant::Long(value) => {
                let index = self.intern(PoolKey::Long(*value), 2, |out| {
                    out.push(5);
                    out.extend_from_slice(&value.to_be_bytes());
                });
                (index, true)
            }
            Constant::Double(value) => {
                let bits = value.to_bits();
                let index = self.intern(PoolKey::Double(bits), 2, |out| {
                    out.push(6);
                    out.extend_from_slice(&bits.to_be_bytes());
                });
                (index, true)
            }
            Constant::Class(name) => (self.class(name), false),
            Constant::Other => return Err(Error::Other("cannot encode an opaque constant")),
        })
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

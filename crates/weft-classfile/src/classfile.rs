use crate::code::decode_code;
use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::insn::Instruction;
use crate::reader::Reader;

pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub source_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    /// Decoded `Code` attribute. Always `None` for fields, and for abstract or
    /// native methods.
    pub code: Option<Code>,
    /// Set when the method had a `Code` attribute that could not be decoded.
    pub code_error: Option<Error>,
}

impl ClassMember {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }
}

#[derive(Debug, Clone)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub instructions: Vec<Instruction>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != 0xCAFEBABE {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class_idx = reader.read_u2()?;
        let super_class = if super_class_idx == 0 {
            None
        } else {
            Some(cp.get_class_name(super_class_idx)?)
        };

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            interfaces.push(cp.get_class_name(reader.read_u2()?)?);
        }

        let fields_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(fields_count);
        for _ in 0..fields_count {
            fields.push(parse_member(&mut reader, &cp, AttributeTarget::Field)?);
        }

        let methods_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(methods_count);
        for _ in 0..methods_count {
            methods.push(parse_member(&mut reader, &cp, AttributeTarget::Method)?);
        }

        let class_attrs = parse_attributes(&mut reader, &cp, AttributeTarget::Class)?;

        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            source_file: class_attrs.source_file,
        })
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&ClassMember> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

fn parse_member(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    target: AttributeTarget,
) -> Result<ClassMember> {
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();

    let attrs = parse_attributes(reader, cp, target)?;
    let (code, code_error) = match attrs.code {
        Some(Ok(code)) => (Some(code), None),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };
    Ok(ClassMember {
        access_flags,
        name,
        descriptor,
        code,
        code_error,
    })
}

#[derive(Default)]
struct ParsedAttributes {
    source_file: Option<String>,
    code: Option<Result<Code>>,
}

#[derive(Clone, Copy)]
enum AttributeTarget {
    Class,
    Field,
    Method,
}

fn parse_attributes(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    target: AttributeTarget,
) -> Result<ParsedAttributes> {
    let attributes_count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        let name = cp.get_utf8(name_index)?;

        let mut sub = Reader::new(info);
        match (name, target) {
            ("SourceFile", AttributeTarget::Class) => {
                let index = sub.read_u2()?;
                parsed.source_file = Some(cp.get_utf8(index)?.to_string());
                sub.ensure_empty()?;
            }
            ("Code", AttributeTarget::Method) => {
                // A broken body only costs this method its instructions.
                parsed.code = Some(parse_code(&mut sub, cp));
            }
            _ => {
                // Unknown attribute: intentionally skipped.
            }
        }
    }

    Ok(parsed)
}

fn parse_code(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Code> {
    let max_stack = reader.read_u2()?;
    let max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let code = reader.read_bytes(code_length)?;
    let instructions = decode_code(code, cp)?;

    // exception_table + nested attributes (LineNumberTable, StackMapTable, ...)
    let exception_table_length = reader.read_u2()? as usize;
    reader.skip(exception_table_length * 8)?;
    let attributes_count = reader.read_u2()? as usize;
    for _ in 0..attributes_count {
        reader.read_u2()?;
        let len = reader.read_u4()? as usize;
        reader.skip(len)?;
    }
    reader.ensure_empty()?;

    Ok(Code {
        max_stack,
        max_locals,
        instructions,
    })
}

use crate::constant_pool::{ConstantPool, CpInfo};
use crate::error::{Error, Result};
use crate::insn::{Constant, Insn, Instruction};
use crate::opcodes;
use crate::reader::Reader;

/// Decode the bytes of a `Code` attribute into a linear instruction list.
pub fn decode_code(code: &[u8], cp: &ConstantPool) -> Result<Vec<Instruction>> {
    let mut reader = Reader::new(code);
    let mut out = Vec::new();

    while reader.remaining() > 0 {
        let offset = reader.position() as u32;
        let opcode = reader.read_u1()?;
        let insn = match opcode {
            opcodes::GETSTATIC..=opcodes::PUTFIELD => {
                let member = cp.get_member_ref(reader.read_u2()?)?;
                Insn::Field {
                    opcode,
                    owner: member.owner,
                    name: member.name,
                    descriptor: member.descriptor,
                }
            }
            opcodes::INVOKEVIRTUAL..=opcodes::INVOKEINTERFACE => {
                let member = cp.get_member_ref(reader.read_u2()?)?;
                if opcode == opcodes::INVOKEINTERFACE {
                    // count, 0
                    reader.skip(2)?;
                }
                Insn::Method {
                    opcode,
                    owner: member.owner,
                    name: member.name,
                    descriptor: member.descriptor,
                    interface: member.interface,
                }
            }
            opcodes::NEW | opcodes::ANEWARRAY | opcodes::CHECKCAST | opcodes::INSTANCEOF => {
                Insn::Type {
                    opcode,
                    class: cp.get_class_name(reader.read_u2()?)?,
                }
            }
            opcodes::LDC => Insn::Ldc(constant(cp, reader.read_u1()? as u16)?),
            opcodes::LDC_W | opcodes::LDC2_W => Insn::Ldc(constant(cp, reader.read_u2()?)?),
            opcodes::TABLESWITCH => {
                skip_padding(&mut reader)?;
                reader.skip(4)?; // default
                let low = reader.read_i4()?;
                let high = reader.read_i4()?;
                if high < low {
                    return Err(Error::MalformedAttribute("Code"));
                }
                let entries = (high as i64 - low as i64 + 1) as usize;
                reader.skip(entries.checked_mul(4).ok_or(Error::UnexpectedEof)?)?;
                Insn::Other(opcode)
            }
            opcodes::LOOKUPSWITCH => {
                skip_padding(&mut reader)?;
                reader.skip(4)?; // default
                let pairs = reader.read_i4()?;
                if pairs < 0 {
                    return Err(Error::MalformedAttribute("Code"));
                }
                reader.skip((pairs as usize).checked_mul(8).ok_or(Error::UnexpectedEof)?)?;
                Insn::Other(opcode)
            }
            opcodes::WIDE => {
                let modified = reader.read_u1()?;
                reader.skip(if modified == opcodes::IINC { 4 } else { 2 })?;
                Insn::Other(opcode)
            }
            _ => match opcodes::operand_length(opcode) {
                Some(len) => {
                    reader.skip(len)?;
                    Insn::Other(opcode)
                }
                None => return Err(Error::InvalidOpcode { opcode, offset }),
            },
        };
        out.push(Instruction::new(offset, insn));
    }

    Ok(out)
}

fn skip_padding(reader: &mut Reader<'_>) -> Result<()> {
    let pad = (4 - reader.position() % 4) % 4;
    reader.skip(pad)
}

fn constant(cp: &ConstantPool, index: u16) -> Result<Constant> {
    Ok(match cp.get(index)? {
        CpInfo::String { string_index } => Constant::String(cp.get_utf8(*string_index)?.to_string()),
        CpInfo::Integer(value) => Constant::Int(*value),
        CpInfo::Float(value) => Constant::Float(*value),
        CpInfo::Long(value) => Constant::Long(*value),
        CpInfo::Double(value) => Constant::Double(*value),
        CpInfo::Class { name_index } => Constant::Class(cp.get_utf8(*name_index)?.to_string()),
        _ => Constant::Other,
    })
}

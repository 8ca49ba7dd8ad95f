use binary_reader::BinaryReader;

use crate::director::lingo::opcode::OpCode;
use crate::io::reader::DirectorExt;

#[derive(Clone, Debug)]
pub struct Bytecode {
    pub op_id: u8,
    pub opcode: Option<OpCode>,
    pub obj: i64,
    pub pos: usize,
}

#[derive(Clone, Debug)]
pub struct HandlerRecord {
    pub name_id: i16,
    pub vector_pos: u16,
    pub compiled_len: u32,
    pub compiled_offset: u32,
    pub argument_count: u16,
    pub argument_offset: u32,
    pub locals_count: u16,
    pub locals_offset: u32,
    pub globals_count: u16,
    pub globals_offset: u32,
    pub unknown1: u32,
    pub unknown2: u16,
    pub line_count: u16,
    pub line_offset: u32,
    pub stack_height: u32,
}

#[derive(Clone, Debug)]
pub struct HandlerDef {
    pub name_id: i16,
    pub argument_name_ids: Vec<u16>,
    pub local_name_ids: Vec<u16>,
    pub global_name_ids: Vec<u16>,
    pub bytecode_array: Vec<Bytecode>,
}

impl HandlerRecord {
    pub fn read_record(
        reader: &mut BinaryReader,
        dir_version: u16,
        _capital_x: bool,
    ) -> std::io::Result<HandlerRecord> {
        let name_id = reader.read_i16()?;
        let vector_pos = reader.read_u16()?;
        let compiled_len = reader.read_u32()?;
        let compiled_offset = reader.read_u32()?;
        let argument_count = reader.read_u16()?;
        let argument_offset = reader.read_u32()?;
        let locals_count = reader.read_u16()?;
        let locals_offset = reader.read_u32()?;
        let globals_count = reader.read_u16()?;
        let globals_offset = reader.read_u32()?;
        let unknown1 = reader.read_u32()?;
        let unknown2 = reader.read_u16()?;
        let line_count = reader.read_u16()?;
        let line_offset = reader.read_u32()?;
        let stack_height = if dir_version >= 850 {
            reader.read_u32()?
        } else {
            0
        };

        Ok(HandlerRecord {
            name_id,
            vector_pos,
            compiled_len,
            compiled_offset,
            argument_count,
            argument_offset,
            locals_count,
            locals_offset,
            globals_count,
            globals_offset,
            unknown1,
            unknown2,
            line_count,
            line_offset,
            stack_height,
        })
    }

    pub fn read_data(reader: &mut BinaryReader, record: &HandlerRecord) -> std::io::Result<HandlerDef> {
        let bytecode_array = read_bytecode(
            reader,
            record.compiled_offset as usize,
            record.compiled_len as usize,
        )?;
        let argument_name_ids = read_name_ids(
            reader,
            record.argument_count as usize,
            record.argument_offset as usize,
        )?;
        let local_name_ids = read_name_ids(
            reader,
            record.locals_count as usize,
            record.locals_offset as usize,
        )?;
        let global_name_ids = read_name_ids(
            reader,
            record.globals_count as usize,
            record.globals_offset as usize,
        )?;

        Ok(HandlerDef {
            name_id: record.name_id,
            argument_name_ids,
            local_name_ids,
            global_name_ids,
            bytecode_array,
        })
    }
}

pub fn read_name_ids(reader: &mut BinaryReader, count: usize, offset: usize) -> std::io::Result<Vec<u16>> {
    if count == 0 {
        return Ok(vec![]);
    }
    reader.seek_to(offset)?;
    reader.require(count * 2)?;
    (0..count).map(|_| reader.read_u16()).collect()
}

fn read_bytecode(reader: &mut BinaryReader, offset: usize, len: usize) -> std::io::Result<Vec<Bytecode>> {
    reader.seek_to(offset)?;
    reader.require(len)?;
    let end = offset + len;

    let mut bytecode_array = vec![];
    while reader.pos < end {
        let pos = reader.pos - offset;
        let op_id = reader.read_u8()?;
        let opcode = OpCode::from_raw(op_id);
        reader.require(operand_width(op_id))?;

        let obj = if op_id >= 0xc0 {
            reader.read_i32()? as i64
        } else if op_id >= 0x80 {
            if matches!(opcode, Some(OpCode::PushInt8) | Some(OpCode::PushInt16)) {
                reader.read_i16()? as i64
            } else {
                reader.read_u16()? as i64
            }
        } else if op_id >= 0x40 {
            if opcode == Some(OpCode::PushInt8) {
                reader.read_u8()? as i8 as i64
            } else {
                reader.read_u8()? as i64
            }
        } else {
            0
        };

        bytecode_array.push(Bytecode { op_id, opcode, obj, pos });
    }
    Ok(bytecode_array)
}

fn operand_width(op_id: u8) -> usize {
    match op_id {
        0xc0..=0xff => 4,
        0x80..=0xbf => 2,
        0x40..=0x7f => 1,
        _ => 0,
    }
}

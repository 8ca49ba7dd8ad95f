use binary_reader::{BinaryReader, Endian};

use crate::director::lingo::datum::Datum;
use crate::io::reader::DirectorExt;

use super::handler::{read_name_ids, HandlerDef, HandlerRecord};
use super::literal::{LiteralRecord, LiteralStore};

const HEADER_SIZE: usize = 92;

/// A compiled `Lscr` script: handlers with their bytecode plus the literal
/// pool they index into.
#[derive(Clone, Debug)]
pub struct ScriptChunk {
    pub script_number: u16,
    pub parent_number: u16,
    pub script_flags: u32,
    pub cast_id: u32,
    pub factory_name_id: u16,
    pub literals: Vec<Datum>,
    pub handlers: Vec<HandlerDef>,
    pub property_name_ids: Vec<u16>,
    pub global_name_ids: Vec<u16>,
}

impl ScriptChunk {
    #[allow(unused_variables)]
    pub fn from_reader(
        reader: &mut BinaryReader,
        dir_version: u16,
        capital_x: bool,
    ) -> std::io::Result<ScriptChunk> {
        // Lingo scripts are always big endian regardless of file endianness
        reader.set_endian(Endian::Big);

        reader.seek_to(0)?;
        reader.require(HEADER_SIZE)?;
        reader.jmp(8);

        let /*  8 */ total_length = reader.read_u32()?;
        let /* 12 */ total_length2 = reader.read_u32()?;
        let /* 16 */ header_length = reader.read_u16()?;
        let /* 18 */ script_number = reader.read_u16()?;
        let /* 20 */ unk20 = reader.read_u16()?;
        let /* 22 */ parent_number = reader.read_u16()?;

        reader.jmp(38);
        let /* 38 */ script_flags = reader.read_u32()?;
        let /* 42 */ unk42 = reader.read_u16()?;
        let /* 44 */ cast_id = reader.read_u32()?;
        let /* 48 */ factory_name_id = reader.read_u16()?;
        let /* 50 */ handler_vectors_count = reader.read_u16()?;
        let /* 52 */ handler_vectors_offset = reader.read_u32()?;
        let /* 56 */ handler_vectors_size = reader.read_u32()?;
        let /* 60 */ properties_count = reader.read_u16()? as usize;
        let /* 62 */ properties_offset = reader.read_u32()? as usize;
        let /* 66 */ globals_count = reader.read_u16()? as usize;
        let /* 68 */ globals_offset = reader.read_u32()? as usize;
        let /* 72 */ handlers_count = reader.read_u16()?;
        let /* 74 */ handlers_offset = reader.read_u32()? as usize;
        let /* 78 */ literals_count = reader.read_u16()?;
        let /* 80 */ literals_offset = reader.read_u32()? as usize;
        let /* 84 */ literals_data_count = reader.read_u32()?;
        let /* 88 */ literals_data_offset = reader.read_u32()? as usize;

        let property_name_ids = read_name_ids(reader, properties_count, properties_offset)?;
        let global_name_ids = read_name_ids(reader, globals_count, globals_offset)?;

        reader.seek_to(handlers_offset)?;
        let handler_records: Vec<HandlerRecord> = (0..handlers_count)
            .map(|_| HandlerRecord::read_record(reader, dir_version, capital_x))
            .collect::<std::io::Result<_>>()?;
        let handlers: Vec<HandlerDef> = handler_records
            .iter()
            .map(|record| HandlerRecord::read_data(reader, record))
            .collect::<std::io::Result<_>>()?;

        reader.seek_to(literals_offset)?;
        let literal_records: Vec<LiteralRecord> = (0..literals_count)
            .map(|_| LiteralStore::read_record(reader, dir_version))
            .collect::<std::io::Result<_>>()?;
        let literals: Vec<Datum> = literal_records
            .iter()
            .map(|record| LiteralStore::read_data(reader, record, literals_data_offset))
            .collect::<std::io::Result<_>>()?;

        Ok(ScriptChunk {
            script_number,
            parent_number,
            script_flags,
            cast_id,
            factory_name_id,
            literals,
            handlers,
            property_name_ids,
            global_name_ids,
        })
    }
}

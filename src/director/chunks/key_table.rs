use binary_reader::BinaryReader;
use log::warn;

use crate::io::reader::DirectorExt;

const ROW_SIZE: usize = 12;

/// One `KEY*` row: `child_id` is owned by `parent_id`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KeyTableEntry {
    pub child_id: i32,
    pub parent_id: i32,
    pub fourcc: u32,
}

#[derive(Clone, Debug)]
pub struct KeyTableChunk {
    pub entry_size: u16,
    pub entry_size2: u16,
    pub entry_count: u32,
    pub used_count: u32,
    pub entries: Vec<KeyTableEntry>,
}

impl KeyTableChunk {
    pub fn from_reader(reader: &mut BinaryReader, len: usize) -> std::io::Result<KeyTableChunk> {
        let end = reader.pos.saturating_add(len).min(reader.length);

        reader.require(12)?;
        let entry_size = reader.read_u16()?;
        let entry_size2 = reader.read_u16()?;
        let entry_count = reader.read_u32()?;
        let used_count = reader.read_u32()?;

        let row_size = (entry_size as usize).max(ROW_SIZE);
        let mut entries = Vec::new();
        for index in 0..entry_count {
            if reader.pos + row_size > end {
                warn!("KEY* declares {} rows but only {} fit", entry_count, index);
                break;
            }
            let row_start = reader.pos;
            entries.push(KeyTableEntry {
                child_id: reader.read_i32()?,
                parent_id: reader.read_i32()?,
                fourcc: reader.read_fourcc()?,
            });
            reader.seek_to(row_start + row_size)?;
        }

        Ok(KeyTableChunk {
            entry_size,
            entry_size2,
            entry_count,
            used_count,
            entries,
        })
    }
}

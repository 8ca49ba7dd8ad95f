use binary_reader::{BinaryReader, Endian};
use log::warn;

use crate::io::reader::DirectorExt;

use super::{ResourceEntry, ResourceStorage};

const MIN_HEADER_SIZE: usize = 12;
const ROW_SIZE: usize = 20;

/// The `mmap` resource table. Free slots are kept so row numbers stay
/// resource ids.
#[derive(Clone, Debug)]
pub struct MemoryMapChunk {
    pub header_size: u16,
    pub entry_size: u16,
    pub total_count: u32,
    pub used_count: u32,
    pub free_list_head: Option<u32>,
    pub free_list_terminator: Option<u32>,
    pub free_count: Option<u32>,
    pub entries: Vec<ResourceEntry>,
}

impl MemoryMapChunk {
    pub fn from_reader(reader: &mut BinaryReader, len: usize) -> std::io::Result<MemoryMapChunk> {
        let start = reader.pos;
        let end = start.saturating_add(len).min(reader.length);

        reader.require(MIN_HEADER_SIZE)?;
        let header_size = reader.read_u16()?;
        let entry_size = reader.read_u16()?;
        let total_count = reader.read_u32()?;
        let used_count = reader.read_u32()?;
        if (header_size as usize) < MIN_HEADER_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("mmap header size {} is too small", header_size),
            ));
        }

        let header_end = start + header_size as usize;
        let optional_field = |reader: &mut BinaryReader| -> std::io::Result<Option<u32>> {
            if reader.pos + 4 <= header_end.min(reader.length) {
                reader.read_u32().map(Some)
            } else {
                Ok(None)
            }
        };
        let free_list_head = optional_field(&mut *reader)?;
        let free_list_terminator = optional_field(&mut *reader)?;
        let free_count = optional_field(&mut *reader)?;
        reader.seek_to(header_end.min(reader.length))?;

        let entry_size = entry_size as usize;
        let mut entries = Vec::new();
        for index in 0..total_count {
            if reader.pos + entry_size > end || entry_size == 0 {
                warn!(
                    "mmap declares {} rows but only {} fit in the chunk",
                    total_count, index
                );
                break;
            }
            let mut row = reader.read_vec(entry_size)?;
            row.resize(row.len().max(ROW_SIZE), 0);
            entries.push(read_row(&row, reader.endian, index as i32)?);
        }

        Ok(MemoryMapChunk {
            header_size,
            entry_size: entry_size as u16,
            total_count,
            used_count,
            free_list_head,
            free_list_terminator,
            free_count,
            entries,
        })
    }
}

fn read_row(row: &[u8], endian: Endian, index: i32) -> std::io::Result<ResourceEntry> {
    let mut row_reader = BinaryReader::from_u8(row);
    row_reader.set_endian(endian);
    Ok(ResourceEntry {
        index,
        fourcc: row_reader.read_fourcc()?,
        size: row_reader.read_u32()?,
        map_offset: row_reader.read_u32()?,
        flags: row_reader.read_u16()?,
        attributes: row_reader.read_u16()?,
        next_free: row_reader.read_u32()?,
        storage: ResourceStorage::Classic,
    })
}

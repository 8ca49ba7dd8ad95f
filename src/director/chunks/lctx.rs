use binary_reader::{BinaryReader, Endian};
use log::debug;

use crate::io::reader::DirectorExt;

const HEADER_SIZE: usize = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptContextEntry {
    pub unknown0: i32,
    pub section_id: i32,
    pub unknown1: u16,
    pub unknown2: u16,
}

/// `Lctx`/`LctX`: lists the `Lscr` sections of a cast and names the `Lnam`
/// they share.
#[derive(Clone, Debug)]
pub struct ScriptContextChunk {
    pub entry_count: u32,
    pub lnam_section_id: i32,
    pub valid_count: u16,
    pub flags: u16,
    pub free_pointer: i16,
    pub entries: Vec<ScriptContextEntry>,
}

impl ScriptContextChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> std::io::Result<ScriptContextChunk> {
        reader.set_endian(Endian::Big);
        reader.seek_to(0)?;
        reader.require(HEADER_SIZE)?;

        let _unknown0 = reader.read_i32()?;
        let _unknown1 = reader.read_i32()?;
        let entry_count = reader.read_u32()?;
        let _entry_count2 = reader.read_u32()?;
        let entries_offset = reader.read_u16()? as usize;
        let _unknown2 = reader.read_i16()?;
        let _unknown3 = reader.read_i32()?;
        let _unknown4 = reader.read_i32()?;
        let _unknown5 = reader.read_i32()?;
        let lnam_section_id = reader.read_i32()?;
        let valid_count = reader.read_u16()?;
        let flags = reader.read_u16()?;
        let free_pointer = reader.read_i16()?;

        reader.seek_to(entries_offset)?;
        let mut entries = Vec::new();
        for index in 0..entry_count {
            if reader.remaining() < 12 {
                debug!("Lctx lists {} scripts but only {} are present", entry_count, index);
                break;
            }
            entries.push(ScriptContextEntry {
                unknown0: reader.read_i32()?,
                section_id: reader.read_i32()?,
                unknown1: reader.read_u16()?,
                unknown2: reader.read_u16()?,
            });
        }

        Ok(ScriptContextChunk {
            entry_count,
            lnam_section_id,
            valid_count,
            flags,
            free_pointer,
            entries,
        })
    }

    /// Section ids of the scripts in this context, skipping unused slots.
    pub fn script_section_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.iter().map(|e| e.section_id).filter(|&id| id > 0)
    }
}

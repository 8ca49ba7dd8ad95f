use binary_reader::BinaryReader;

use crate::io::reader::DirectorExt;

/// The `imap` control chunk.
#[derive(Clone, Debug)]
pub struct InitialMapChunk {
    pub length: u32,
    pub map_version: u32,
    pub mmap_offset: u32,
    pub archive_version: u32,
}

impl InitialMapChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> std::io::Result<InitialMapChunk> {
        reader.require(16)?;
        Ok(InitialMapChunk {
            length: reader.read_u32()?,
            map_version: reader.read_u32()?,
            mmap_offset: reader.read_u32()?,
            archive_version: reader.read_u32()?,
        })
    }
}

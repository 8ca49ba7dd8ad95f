use binary_reader::{BinaryReader, Endian};

use crate::io::reader::DirectorExt;

/// `Lnam`: the symbol table shared by every script in a context.
#[derive(Clone, Debug, Default)]
pub struct ScriptNamesChunk {
    pub names: Vec<String>,
}

impl ScriptNamesChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> std::io::Result<ScriptNamesChunk> {
        reader.set_endian(Endian::Big);
        reader.seek_to(0)?;
        reader.require(20)?;

        let _unknown0 = reader.read_i32()?;
        let _unknown1 = reader.read_i32()?;
        let _len1 = reader.read_u32()?;
        let _len2 = reader.read_u32()?;
        let names_offset = reader.read_u16()? as usize;
        let names_count = reader.read_u16()?;

        reader.seek_to(names_offset)?;
        let names = (0..names_count)
            .map(|_| reader.read_pascal_string())
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(ScriptNamesChunk { names })
    }

    pub fn get_name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }
}

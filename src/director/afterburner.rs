use binary_reader::BinaryReader;
use log::{debug, warn};

use crate::io::reader::DirectorExt;

use super::{
    chunks::{ResourceContainer, ResourceEntry, ResourceStorage},
    compression::{zlib_decompress, CompressionDescriptor, CompressionTable},
    errors::FatalError,
    rifx::DataBlock,
    utils::{fourcc_to_string, FOURCC},
};

/// Resource id of the initial load segment.
pub const ILS_RESOURCE_ID: i32 = 2;

#[derive(Clone, Debug)]
pub struct AfterburnerState {
    pub version: u32,
    pub version_string: Option<String>,
    pub ils_body_offset: usize,
}

fn expect_chunk(reader: &mut BinaryReader, name: &str) -> Result<(), FatalError> {
    let fourcc = reader.read_fourcc()?;
    if fourcc != FOURCC(name) {
        return Err(FatalError::UnexpectedAfterburnerChunk {
            expected: name.to_owned(),
            found: fourcc_to_string(fourcc),
        });
    }
    Ok(())
}

/// Reads `Fver`, `Fcdr`, `ABMP` and `FGEI` in order, registering descriptors,
/// resource rows and inline segments.
pub fn read_afterburner_map(
    reader: &mut BinaryReader,
    block: &mut DataBlock,
    resources: &mut ResourceContainer,
    compressions: &mut CompressionTable,
) -> Result<AfterburnerState, FatalError> {
    reader.seek_to(block.payload_start)?;

    expect_chunk(reader, "Fver")?;
    let fver_length = reader.read_var_int()? as usize;
    let fver_start = reader.pos;
    let version = reader.read_var_int()?;
    if version >= 0x401 {
        block.format.map_version = reader.read_var_int()?;
        block.format.archive_version = reader.read_var_int()?;
    }
    let mut version_string = None;
    if version >= 0x501 {
        reader.require(1)?;
        let len = reader.read_u8()? as usize;
        version_string = Some(reader.read_latin1(len)?);
    }
    if reader.pos != fver_start + fver_length {
        debug!(
            "Fver declares {} bytes but {} were read",
            fver_length,
            reader.pos - fver_start
        );
        reader.seek_to(fver_start + fver_length)?;
    }

    expect_chunk(reader, "Fcdr")?;
    let fcdr_length = reader.read_var_int()? as usize;
    let fcdr = reader.read_zlib_bytes(fcdr_length)?;
    read_compression_table(&fcdr, reader.endian, compressions)?;

    expect_chunk(reader, "ABMP")?;
    let abmp_length = reader.read_var_int()? as usize;
    let abmp_end = reader.pos + abmp_length;
    let compression_mode = reader.read_var_int()?;
    let uncompressed_length = reader.read_var_int()? as usize;
    let abmp_end = abmp_end.max(reader.pos);
    let abmp_raw = reader.read_vec(abmp_end - reader.pos)?;
    let abmp = if compression_mode != 0 {
        zlib_decompress(&abmp_raw, Some(uncompressed_length))?
    } else {
        abmp_raw
    };
    if abmp.len() != uncompressed_length {
        warn!(
            "ABMP: expected uncompressed length {} but got {}",
            uncompressed_length,
            abmp.len()
        );
    }
    read_resource_rows(&abmp, reader.endian, resources)?;

    expect_chunk(reader, "FGEI")?;
    let _ils_header = reader.read_var_int()?;
    let ils_body_offset = reader.pos;
    let ils = resources
        .try_get_entry(ILS_RESOURCE_ID)
        .cloned()
        .ok_or_else(|| FatalError::CorruptAfterburnerMap("map has no ILS entry".to_owned()))?;
    let ils_uncompressed = match ils.storage {
        ResourceStorage::Afterburner {
            uncompressed_size, ..
        } => uncompressed_size as usize,
        ResourceStorage::Classic => 0,
    };
    let ils_raw = reader.read_vec(ils.size as usize)?;
    let ils_data = zlib_decompress(&ils_raw, Some(ils_uncompressed))?;
    read_inline_segments(&ils_data, reader.endian, resources);

    Ok(AfterburnerState {
        version,
        version_string,
        ils_body_offset,
    })
}

fn read_compression_table(
    data: &[u8],
    endian: binary_reader::Endian,
    compressions: &mut CompressionTable,
) -> Result<(), FatalError> {
    let mut reader = BinaryReader::from_u8(data);
    reader.set_endian(endian);

    reader.require(2)?;
    let count = reader.read_u16()? as usize;
    let mut identifiers = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = reader.read_vec(16)?;
        let mut identifier = [0u8; 16];
        identifier.copy_from_slice(&raw);
        identifiers.push(identifier);
    }
    for (index, identifier) in identifiers.into_iter().enumerate() {
        let name = reader.read_cstr().unwrap_or_else(|_| {
            warn!("Fcdr: descriptor {} has no name", index);
            String::new()
        });
        compressions.add(CompressionDescriptor::new(index, identifier, name));
    }
    if !reader.eof() {
        warn!("Fcdr: {} trailing bytes", reader.remaining());
    }
    Ok(())
}

fn read_resource_rows(
    data: &[u8],
    endian: binary_reader::Endian,
    resources: &mut ResourceContainer,
) -> Result<(), FatalError> {
    let mut reader = BinaryReader::from_u8(data);
    reader.set_endian(endian);

    let _unk1 = reader.read_var_int()?;
    let _unk2 = reader.read_var_int()?;
    let count = reader.read_var_int()?;
    debug!("ABMP: {} resources", count);
    for _ in 0..count {
        let index = reader.read_var_int()? as i32;
        let offset = reader.read_var_int()? as i32;
        let size = reader.read_var_int()?;
        let uncompressed_size = reader.read_var_int()?;
        let compression_index = reader.read_var_int()?;
        let fourcc = reader.read_fourcc()?;
        resources.add(ResourceEntry {
            index,
            fourcc,
            size,
            map_offset: offset.max(0) as u32,
            flags: 0,
            attributes: 0,
            next_free: 0,
            storage: ResourceStorage::Afterburner {
                offset,
                uncompressed_size,
                compression_index,
            },
        });
    }
    Ok(())
}

fn read_inline_segments(data: &[u8], endian: binary_reader::Endian, resources: &mut ResourceContainer) {
    let mut reader = BinaryReader::from_u8(data);
    reader.set_endian(endian);

    while !reader.eof() {
        let id = match reader.read_var_int() {
            Ok(id) => id as i32,
            Err(err) => {
                warn!("ILS: truncated record id: {}", err);
                return;
            }
        };
        let size = match resources.try_get_entry(id) {
            Some(entry) => entry.size as usize,
            None => {
                warn!("ILS: resource {} is not in the map", id);
                return;
            }
        };
        match reader.read_vec(size) {
            Ok(bytes) => resources.set_inline_segment(id, bytes),
            Err(err) => {
                warn!("ILS: resource {} is truncated: {}", id, err);
                return;
            }
        }
    }
}

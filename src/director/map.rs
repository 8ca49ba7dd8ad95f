use binary_reader::BinaryReader;
use itertools::Itertools;
use log::{debug, warn};

use crate::io::reader::{DirectorExt, SavedPosition};

use super::{
    chunks::{
        initial_map::InitialMapChunk, key_table::KeyTableChunk, memory_map::MemoryMapChunk,
        ResourceContainer,
    },
    rifx::DataBlock,
    utils::{fourcc_to_string, FOURCC},
};

/// What the classic map walk found, beyond the rows it registered.
#[derive(Clone, Debug, Default)]
pub struct ClassicMap {
    pub imap: Option<InitialMapChunk>,
    pub mmap: Option<MemoryMapChunk>,
    pub key_table: Option<KeyTableChunk>,
}

/// Walks the chunks between `payload_start` and `payload_end`, registering
/// every `mmap` row and `KEY*` link into `resources`.
///
/// Structural problems end the walk early; whatever was read up to that point
/// is kept.
pub fn read_classic_map(
    reader: &mut BinaryReader,
    block: &mut DataBlock,
    rifx_offset: usize,
    resources: &mut ResourceContainer,
) -> ClassicMap {
    let mut map = ClassicMap::default();
    let end = block.payload_end.min(reader.length);
    let mut pos = block.payload_start;

    while pos.saturating_add(8) <= end {
        reader.jmp(pos);
        let (fourcc, len) = match read_chunk_header(reader) {
            Ok(header) => header,
            Err(err) => {
                warn!("Chunk header at {} unreadable: {}", pos, err);
                break;
            }
        };
        let body_start = reader.pos;

        if fourcc == FOURCC("imap") {
            match InitialMapChunk::from_reader(reader) {
                Ok(imap) => {
                    debug!(
                        "imap: map version {} archive version {:#x} mmap at {}",
                        imap.map_version, imap.archive_version, imap.mmap_offset
                    );
                    block.format.map_version = imap.map_version;
                    block.format.archive_version = imap.archive_version;
                    map.imap = Some(imap);
                }
                Err(err) => {
                    warn!("imap at {} is truncated: {}", pos, err);
                    break;
                }
            }
        } else if fourcc == FOURCC("mmap") {
            match MemoryMapChunk::from_reader(reader, len) {
                Ok(mmap) => map.mmap = Some(mmap),
                Err(err) => {
                    warn!("mmap at {} is unreadable: {}", pos, err);
                    break;
                }
            }
        } else if fourcc == FOURCC("KEY*") {
            match KeyTableChunk::from_reader(reader, len) {
                Ok(key_table) => map.key_table = Some(key_table),
                Err(err) => warn!("KEY* at {} is unreadable: {}", pos, err),
            }
        }

        pos = match next_chunk_pos(pos, body_start, len) {
            Some(next) => next,
            None => {
                warn!(
                    "Chunk '{}' at {} does not advance the map walk, stopping",
                    fourcc_to_string(fourcc),
                    pos
                );
                break;
            }
        };
    }

    if map.mmap.is_none() {
        if let Some(imap) = &map.imap {
            map.mmap = read_mmap_at(reader, imap.mmap_offset as usize, rifx_offset, block.payload_start);
        }
    }

    if let Some(mmap) = &map.mmap {
        for entry in &mmap.entries {
            resources.add(entry.clone());
        }
    }
    if let Some(key_table) = &map.key_table {
        for entry in &key_table.entries {
            resources.add_relationship(*entry);
        }
    }
    map
}

/// Start of the chunk after one whose body begins at `body_start`, padded to
/// an even offset. `None` when that would not move past `pos`.
fn next_chunk_pos(pos: usize, body_start: usize, len: usize) -> Option<usize> {
    let next = body_start.checked_add(len)?;
    let next = next.checked_add(next % 2)?;
    (next > pos).then_some(next)
}

fn read_chunk_header(reader: &mut BinaryReader) -> std::io::Result<(u32, usize)> {
    let fourcc = reader.read_fourcc()?;
    reader.require(4)?;
    let len = reader.read_u32()? as usize;
    Ok((fourcc, len))
}

/// Reads the `mmap` chunk `imap` points at, trying the offset as absolute,
/// container-relative and payload-relative.
fn read_mmap_at(
    reader: &mut BinaryReader,
    offset: usize,
    rifx_offset: usize,
    payload_start: usize,
) -> Option<MemoryMapChunk> {
    let mut reader = SavedPosition::new(reader);
    let candidates = [
        offset,
        rifx_offset.saturating_add(offset),
        payload_start.saturating_add(offset),
    ]
    .into_iter()
    .unique()
    .collect_vec();
    for candidate in candidates {
        if reader.seek_to(candidate).is_err() {
            continue;
        }
        match read_chunk_header(&mut reader) {
            Ok((fourcc, len)) if fourcc == FOURCC("mmap") => {
                debug!("mmap found through imap at {}", candidate);
                return MemoryMapChunk::from_reader(&mut reader, len).ok();
            }
            _ => continue,
        }
    }
    warn!("imap points at {} but no mmap chunk is there", offset);
    None
}

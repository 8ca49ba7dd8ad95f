use binary_reader::BinaryReader;
use itertools::Itertools;
use log::{debug, warn};

use crate::io::reader::{DirectorExt, SavedPosition};

use super::{
    afterburner::AfterburnerState,
    chunks::{ResourceContainer, ResourceEntry, ResourceStorage},
    compression::{zlib_decompress, CompressionKind, CompressionTable},
};

/// Loads a classic resource body.
///
/// The row offset is tried as-is and relative to the container start; a
/// candidate is only accepted when the chunk header there carries the row's
/// tag. Returns `None` when neither candidate matches or the body is cut off.
pub fn load_classic_payload(
    reader: &mut BinaryReader,
    rifx_offset: usize,
    entry: &ResourceEntry,
) -> Option<Vec<u8>> {
    let mut reader = SavedPosition::new(reader);
    let raw = entry.map_offset as usize;
    let candidates = [raw, rifx_offset.saturating_add(raw)]
        .into_iter()
        .unique()
        .collect_vec();

    for candidate in candidates {
        if reader.seek_to(candidate).is_err() || reader.remaining() < 8 {
            continue;
        }
        let fourcc = reader.read_fourcc().ok()?;
        let len = reader.read_u32().ok()? as usize;
        if fourcc != entry.fourcc {
            debug!(
                "Resource {} ('{}'): no matching chunk at {}",
                entry.index,
                entry.tag_name(),
                candidate
            );
            continue;
        }
        if len == 0 {
            return Some(Vec::new());
        }
        return match reader.read_vec(len) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(
                    "Resource {} ('{}') is truncated: {}",
                    entry.index,
                    entry.tag_name(),
                    err
                );
                None
            }
        };
    }

    warn!(
        "Resource {} ('{}') could not be located at offset {}",
        entry.index,
        entry.tag_name(),
        entry.map_offset
    );
    None
}

/// Loads an Afterburner resource body from its inline segment or from the ILS
/// body, then applies the descriptor registered for its compression index.
/// Unknown descriptors hand back the stored bytes.
pub fn load_afterburner_payload(
    reader: &mut BinaryReader,
    state: &AfterburnerState,
    resources: &ResourceContainer,
    compressions: &CompressionTable,
    entry: &ResourceEntry,
) -> Option<Vec<u8>> {
    let (offset, uncompressed_size, compression_index) = match entry.storage {
        ResourceStorage::Afterburner {
            offset,
            uncompressed_size,
            compression_index,
        } => (offset, uncompressed_size as usize, compression_index as usize),
        ResourceStorage::Classic => {
            warn!("Resource {} has no Afterburner location", entry.index);
            return None;
        }
    };
    if entry.size == 0 && uncompressed_size == 0 {
        return Some(Vec::new());
    }

    let stored = if offset < 0 {
        match resources.inline_segment(entry.index) {
            Some(bytes) => bytes.clone(),
            None => {
                warn!("Resource {} is inline but missing from the ILS", entry.index);
                return None;
            }
        }
    } else {
        let mut reader = SavedPosition::new(reader);
        let at = state.ils_body_offset.saturating_add(offset as usize);
        match reader
            .seek_to(at)
            .and_then(|_| reader.read_vec(entry.size as usize))
        {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Resource {} ('{}') is truncated: {}", entry.index, entry.tag_name(), err);
                return None;
            }
        }
    };

    match compressions.try_get(compression_index).map(|d| d.kind) {
        Some(CompressionKind::Zlib) => match zlib_decompress(&stored, Some(uncompressed_size)) {
            Ok(bytes) => {
                if bytes.len() != uncompressed_size {
                    warn!(
                        "Resource {}: expected {} bytes after inflate but got {}",
                        entry.index,
                        uncompressed_size,
                        bytes.len()
                    );
                }
                Some(bytes)
            }
            Err(err) => {
                warn!("Resource {}: inflate failed: {}", entry.index, err);
                None
            }
        },
        Some(CompressionKind::None) => Some(stored),
        kind => {
            debug!(
                "Resource {}: no transform for compression {} ({:?})",
                entry.index, compression_index, kind
            );
            Some(stored)
        }
    }
}

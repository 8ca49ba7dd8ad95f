use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use fxhash::FxHashMap;
use log::{debug, warn};

use super::guid::{
    MoaID, FONTMAP_COMPRESSION_GUID, NULL_COMPRESSION_GUID, SND_COMPRESSION_GUID,
    ZLIB_COMPRESSION_GUID,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompressionKind {
    None,
    Zlib,
    Sound,
    FontMap,
    Unknown,
}

static KNOWN_COMPRESSIONS: [(MoaID, CompressionKind); 4] = [
    (NULL_COMPRESSION_GUID, CompressionKind::None),
    (ZLIB_COMPRESSION_GUID, CompressionKind::Zlib),
    (SND_COMPRESSION_GUID, CompressionKind::Sound),
    (FONTMAP_COMPRESSION_GUID, CompressionKind::FontMap),
];

static NAME_HINTS: [(&str, CompressionKind); 3] = [
    ("zlib", CompressionKind::Zlib),
    ("sound", CompressionKind::Sound),
    ("font", CompressionKind::FontMap),
];

impl CompressionKind {
    /// Exact identifier match first, then a case-insensitive look at the
    /// descriptor name.
    pub fn resolve(identifier: &[u8; 16], name: &str) -> CompressionKind {
        if let Some((_, kind)) = KNOWN_COMPRESSIONS
            .iter()
            .find(|(guid, _)| guid.matches(identifier))
        {
            return *kind;
        }
        let name = name.to_ascii_lowercase();
        NAME_HINTS
            .iter()
            .find(|(hint, _)| name.contains(hint))
            .map(|(_, kind)| *kind)
            .unwrap_or(CompressionKind::Unknown)
    }
}

#[derive(Clone, Debug)]
pub struct CompressionDescriptor {
    pub index: usize,
    pub identifier: [u8; 16],
    pub name: String,
    pub kind: CompressionKind,
}

impl CompressionDescriptor {
    pub fn new(index: usize, identifier: [u8; 16], name: String) -> CompressionDescriptor {
        let kind = CompressionKind::resolve(&identifier, &name);
        CompressionDescriptor {
            index,
            identifier,
            name,
            kind,
        }
    }
}

/// Index-keyed `Fcdr` descriptors for the movie currently being read.
#[derive(Clone, Debug, Default)]
pub struct CompressionTable {
    descriptors: FxHashMap<usize, CompressionDescriptor>,
}

impl CompressionTable {
    pub fn add(&mut self, descriptor: CompressionDescriptor) {
        debug!(
            "Compression {}: {:?} \"{}\"",
            descriptor.index, descriptor.kind, descriptor.name
        );
        if let Some(previous) = self.descriptors.insert(descriptor.index, descriptor) {
            warn!("Compression index {} registered twice", previous.index);
        }
    }

    pub fn reset(&mut self) {
        self.descriptors.clear();
    }

    pub fn try_get(&self, index: usize) -> Option<&CompressionDescriptor> {
        self.descriptors.get(&index)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompressionDescriptor> {
        self.descriptors.values()
    }
}

/// Inflates a zlib stream. With an expected length the result is exactly that
/// long, or shorter when the stream runs out first; it is never padded.
pub fn zlib_decompress(data: &[u8], expected_len: Option<usize>) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let guess = data.len().saturating_mul(4);
    let mut out = Vec::with_capacity(expected_len.map_or(guess, |len| len.min(guess)));
    match expected_len {
        Some(len) => decoder.by_ref().take(len as u64).read_to_end(&mut out)?,
        None => decoder.read_to_end(&mut out)?,
    };
    Ok(out)
}

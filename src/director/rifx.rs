use binary_reader::{BinaryReader, Endian};
use log::{debug, warn};

use crate::io::reader::{DirectorExt, SavedPosition};

use super::{
    afterburner::AfterburnerState,
    chunks::{ResourceContainer, ResourceEntry},
    compression::CompressionTable,
    errors::FatalError,
    payload,
    utils::{fourcc_to_string, FOURCC},
};

pub const RIFX_HEADER_SIZE: usize = 12;

const RIFX_MAGIC: [u8; 4] = *b"RIFX";
const XFIR_MAGIC: [u8; 4] = *b"XFIR";
const PROJECTOR_MARKERS: [[u8; 4]; 4] = [*b"PJ93", *b"PJ95", *b"PJ00", *b"PJ01"];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RifxCodec {
    MV93,
    MC95,
    APPL,
    FGDM,
    FGDC,
    Unknown,
}

impl RifxCodec {
    pub fn from_fourcc(fourcc: u32) -> RifxCodec {
        match fourcc {
            x if x == FOURCC("MV93") => RifxCodec::MV93,
            x if x == FOURCC("MC95") => RifxCodec::MC95,
            x if x == FOURCC("APPL") => RifxCodec::APPL,
            x if x == FOURCC("FGDM") => RifxCodec::FGDM,
            x if x == FOURCC("FGDC") => RifxCodec::FGDC,
            _ => RifxCodec::Unknown,
        }
    }

    pub fn is_afterburner(self) -> bool {
        matches!(self, RifxCodec::FGDM | RifxCodec::FGDC)
    }
}

#[derive(Clone, Debug)]
pub struct DataFormat {
    pub codec: RifxCodec,
    pub codec_fourcc: u32,
    pub is_big_endian: bool,
    pub map_version: u32,
    pub archive_version: u32,
}

impl DataFormat {
    /// Major Director release for the `imap` archive version.
    pub fn director_version(&self) -> u16 {
        match self.archive_version {
            0 => 4,
            v if v < 0x45D => 4,
            v if v < 0x4C2 => 5,
            v if v < 0x4C8 => 6,
            v if v < 0x582 => 7,
            v if v < 0x742 => 8,
            v if v < 0x783 => 10,
            v if v < 0x79F => 11,
            _ => 12,
        }
    }

    pub fn director_version_label(&self) -> String {
        format!("Director {}", self.director_version())
    }

    /// Bytecode version in hundreds, with 8.5 reported as 850.
    pub fn lingo_version(&self) -> u16 {
        match self.director_version() {
            8 if self.archive_version >= 0x73B => 850,
            major => major * 100,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DataBlock {
    pub declared_size: u32,
    pub payload_start: usize,
    pub payload_end: usize,
    pub format: DataFormat,
}

/// Finds the absolute offset of the RIFX/XFIR magic.
///
/// Tries the start of the stream, then a projector marker followed by a movie
/// offset, then (if allowed) a byte-by-byte scan. The cursor is restored on
/// every path.
pub fn locate_rifx(reader: &mut BinaryReader, scan_for_magic: bool) -> Result<usize, FatalError> {
    if reader.length < RIFX_HEADER_SIZE {
        return Err(FatalError::StreamTooSmall);
    }
    let mut reader = SavedPosition::new(reader);

    reader.jmp(0);
    let marker = reader.read_vec(4)?;
    if is_magic(&marker) {
        return Ok(0);
    }

    if PROJECTOR_MARKERS.iter().any(|m| m[..] == marker[..]) {
        let raw = reader
            .read_vec(4)
            .map_err(|_| FatalError::TruncatedProjectorHeader)?;
        let raw = [raw[0], raw[1], raw[2], raw[3]];
        for offset in [u32::from_le_bytes(raw), u32::from_be_bytes(raw)] {
            if has_magic_at(&mut reader, offset as usize) {
                debug!(
                    "Projector {} points at movie offset {}",
                    fourcc_to_string(u32::from_be_bytes([marker[0], marker[1], marker[2], marker[3]])),
                    offset
                );
                return Ok(offset as usize);
            }
        }
        warn!("Projector header has no valid movie offset, scanning for magic");
    }

    if !scan_for_magic {
        return Err(FatalError::MagicNotFound);
    }
    (1..=reader.length - 4)
        .find(|&pos| has_magic_at(&mut reader, pos))
        .ok_or(FatalError::MagicNotFound)
}

fn is_magic(bytes: &[u8]) -> bool {
    bytes == RIFX_MAGIC || bytes == XFIR_MAGIC
}

fn has_magic_at(reader: &mut BinaryReader, offset: usize) -> bool {
    if offset.checked_add(4).map_or(true, |end| end > reader.length) {
        return false;
    }
    reader.jmp(offset);
    reader.read_vec(4).map_or(false, |bytes| is_magic(&bytes))
}

/// Reads the 12-byte container header at `rifx_offset` and leaves the reader
/// set to the container's byte order.
pub fn read_data_block(reader: &mut BinaryReader, rifx_offset: usize) -> Result<DataBlock, FatalError> {
    let truncated = |_| FatalError::TruncatedHeader(rifx_offset);

    reader.seek_to(rifx_offset).map_err(truncated)?;
    let magic = reader.read_vec(4).map_err(truncated)?;
    let is_big_endian = match magic.as_slice() {
        b"RIFX" => true,
        b"XFIR" => false,
        _ => return Err(FatalError::MagicNotFound),
    };
    reader.set_endian(if is_big_endian { Endian::Big } else { Endian::Little });

    reader.require(8).map_err(truncated)?;
    let declared_size = reader.read_u32()?;
    let codec_fourcc = reader.read_fourcc()?;
    let codec = RifxCodec::from_fourcc(codec_fourcc);
    if codec == RifxCodec::Unknown {
        warn!("Unknown movie codec '{}'", fourcc_to_string(codec_fourcc));
    }

    let payload_start = reader.pos;
    Ok(DataBlock {
        declared_size,
        payload_start,
        payload_end: payload_start + declared_size as usize,
        format: DataFormat {
            codec,
            codec_fourcc,
            is_big_endian,
            map_version: 0,
            archive_version: 0,
        },
    })
}

/// Everything the map and payload readers share while one movie is parsed.
pub struct RIFXReaderContext {
    pub reader: BinaryReader,
    pub file_name: String,
    pub rifx_offset: usize,
    pub resources: ResourceContainer,
    pub compressions: CompressionTable,
    pub afterburner: Option<AfterburnerState>,
}

impl RIFXReaderContext {
    pub fn new(file_name: &str, bytes: &[u8]) -> RIFXReaderContext {
        RIFXReaderContext {
            reader: BinaryReader::from_u8(bytes),
            file_name: file_name.to_owned(),
            rifx_offset: 0,
            resources: ResourceContainer::default(),
            compressions: CompressionTable::default(),
            afterburner: None,
        }
    }

    /// Clears the per-movie registries.
    pub fn reset(&mut self) {
        self.rifx_offset = 0;
        self.resources.reset();
        self.compressions.reset();
        self.afterburner = None;
    }

    pub fn load_payload(&mut self, entry: &ResourceEntry) -> Option<Vec<u8>> {
        match &self.afterburner {
            Some(state) => payload::load_afterburner_payload(
                &mut self.reader,
                state,
                &self.resources,
                &self.compressions,
                entry,
            ),
            None => payload::load_classic_payload(&mut self.reader, self.rifx_offset, entry),
        }
    }

    pub fn load_payload_by_id(&mut self, id: i32) -> Option<Vec<u8>> {
        let entry = self.resources.try_get_entry(id)?.clone();
        self.load_payload(&entry)
    }
}

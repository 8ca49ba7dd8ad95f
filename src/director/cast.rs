use binary_reader::BinaryReader;
use fxhash::FxHashMap;
use itertools::Itertools;
use log::{debug, warn};

use crate::io::reader::latin1_to_string;

use super::{
    chunks::cast_member::CastMemberChunk,
    enums::ScriptFormat,
    rifx::RIFXReaderContext,
    utils::FOURCC,
};

const CAST_MEMBER_TAGS: [u32; 2] = [FOURCC("CASt"), FOURCC("CAST")];
const TEXT_LENGTH_OFFSET: usize = 0x1D;
const SCRIPT_NUMBER_OFFSET: usize = 16;
const POINTER_SLOT_OFFSET: usize = 0x68;
const POINTER_TABLE_END: usize = 0x6A;
const LEGACY_TEXT_START: usize = 0x21;

/// Where a script member's info block keeps its source text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScriptInfoLayout {
    /// A big-endian pointer at 0x68 gives the text start.
    PointerTable,
    /// Text follows the length field directly, at 0x21.
    LegacyTextAfterLength,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedScriptInfo {
    pub layout: ScriptInfoLayout,
    pub script_number: i32,
    pub text: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct ScriptEntry {
    pub resource_id: i32,
    pub cast_member_id: Option<i32>,
    pub format: ScriptFormat,
    pub layout: Option<ScriptInfoLayout>,
    /// Both layouts decoded cleanly and one was picked.
    pub layout_ambiguous: bool,
    pub script_number: Option<i32>,
    pub bytes: Vec<u8>,
    pub text: Option<String>,
    pub name: Option<String>,
}

fn is_text_byte(byte: u8) -> bool {
    byte >= 0x20 || matches!(byte, b'\t' | b'\r' | b'\n')
}

/// Decodes text and name with one layout; `None` when any span is out of
/// bounds or the bytes are not text.
pub fn decode_script_info(info: &[u8], layout: ScriptInfoLayout) -> Option<DecodedScriptInfo> {
    let length_bytes = info.get(TEXT_LENGTH_OFFSET..TEXT_LENGTH_OFFSET + 4)?;
    let text_len = u32::from_le_bytes([length_bytes[0], length_bytes[1], length_bytes[2], length_bytes[3]]) as usize;

    let text_start = match layout {
        ScriptInfoLayout::PointerTable => {
            let slot = info.get(POINTER_SLOT_OFFSET..POINTER_TABLE_END)?;
            let start = u16::from_be_bytes([slot[0], slot[1]]) as usize;
            if start < POINTER_TABLE_END {
                return None;
            }
            start
        }
        ScriptInfoLayout::LegacyTextAfterLength => LEGACY_TEXT_START,
    };

    let text_end = text_start.checked_add(text_len)?;
    let text = info.get(text_start..text_end)?;
    let name_len = *info.get(text_end)? as usize;
    let name = info.get(text_end + 1..text_end + 1 + name_len)?;
    if !text.iter().all(|&b| is_text_byte(b)) || !name.iter().all(|&b| b >= 0x20) {
        return None;
    }

    let number = info.get(SCRIPT_NUMBER_OFFSET..SCRIPT_NUMBER_OFFSET + 4)?;
    Some(DecodedScriptInfo {
        layout,
        script_number: i32::from_be_bytes([number[0], number[1], number[2], number[3]]),
        text: latin1_to_string(text),
        name: latin1_to_string(name),
    })
}

fn is_known_director_archive(archive_version: u32) -> bool {
    (0x400..=0x7FF).contains(&archive_version)
}

/// Runs both layout decoders. A lone valid result wins; otherwise the one
/// with more content, then the archive version decides. The flag reports
/// whether both decoded.
pub fn detect_script_info(info: &[u8], archive_version: u32) -> Option<(DecodedScriptInfo, bool)> {
    let pointer = decode_script_info(info, ScriptInfoLayout::PointerTable);
    let legacy = decode_script_info(info, ScriptInfoLayout::LegacyTextAfterLength);
    match (pointer, legacy) {
        (Some(p), None) => Some((p, false)),
        (None, Some(l)) => Some((l, false)),
        (None, None) => None,
        (Some(p), Some(l)) => {
            let p_len = p.text.len() + p.name.len();
            let l_len = l.text.len() + l.name.len();
            let pick = if p_len != l_len {
                if p_len > l_len {
                    p
                } else {
                    l
                }
            } else if is_known_director_archive(archive_version) {
                p
            } else {
                l
            };
            debug!("Script info decodes under both layouts, using {:?}", pick.layout);
            Some((pick, true))
        }
    }
}

struct OwningMember {
    cast_member_id: i32,
    format: ScriptFormat,
    info: Vec<u8>,
}

/// Collects every `Lscr` resource with the format, layout and text of the
/// script member that owns it.
pub fn read_script_entries(
    rifx: &mut RIFXReaderContext,
    archive_version: u32,
    decode_text: bool,
) -> Vec<ScriptEntry> {
    let lscr = FOURCC("Lscr");
    let cast_entries = CAST_MEMBER_TAGS
        .iter()
        .flat_map(|&tag| rifx.resources.entries_with_fourcc(tag))
        .cloned()
        .sorted_by_key(|entry| entry.index)
        .collect::<Vec<_>>();

    let mut owners: FxHashMap<i32, OwningMember> = FxHashMap::default();
    for cast_entry in &cast_entries {
        let payload = match rifx.load_payload(cast_entry) {
            Some(payload) if !payload.is_empty() => payload,
            _ => continue,
        };
        let member = match CastMemberChunk::from_reader(&mut BinaryReader::from_vec(&payload)) {
            Ok(member) => member,
            Err(err) => {
                warn!("Cast member {} is unreadable: {}", cast_entry.index, err);
                continue;
            }
        };
        if !member.is_script() {
            continue;
        }

        let resources = &rifx.resources;
        let script_id = member
            .script_resource_id(|id| {
                resources
                    .try_get_entry(id)
                    .map_or(false, |entry| entry.fourcc == lscr)
            })
            .or_else(|| {
                resources
                    .children_of(cast_entry.index)
                    .into_iter()
                    .find(|link| link.fourcc == lscr)
                    .map(|link| link.child_id)
            });
        let script_id = match script_id {
            Some(id) => id,
            None => {
                debug!("Script member {} has no Lscr", cast_entry.index);
                continue;
            }
        };

        owners.entry(script_id).or_insert(OwningMember {
            cast_member_id: cast_entry.index,
            format: member.script_format(),
            info: member.info,
        });
    }

    let script_entries = rifx
        .resources
        .entries_with_fourcc(lscr)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();

    let mut scripts = Vec::new();
    for entry in &script_entries {
        let bytes = match rifx.load_payload(entry) {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                debug!("Lscr {} has no payload, skipping", entry.index);
                continue;
            }
        };

        let owner = owners.get(&entry.index);
        let decoded = owner
            .filter(|_| decode_text)
            .and_then(|owner| detect_script_info(&owner.info, archive_version));
        let (decoded, layout_ambiguous) = match decoded {
            Some((decoded, ambiguous)) => (Some(decoded), ambiguous),
            None => (None, false),
        };

        scripts.push(ScriptEntry {
            resource_id: entry.index,
            cast_member_id: owner.map(|o| o.cast_member_id),
            format: owner.map_or(ScriptFormat::Unknown, |o| o.format),
            layout: decoded.as_ref().map(|d| d.layout),
            layout_ambiguous,
            script_number: decoded.as_ref().map(|d| d.script_number),
            bytes,
            text: decoded.as_ref().map(|d| d.text.clone()),
            name: decoded.map(|d| d.name),
        });
    }
    scripts
}

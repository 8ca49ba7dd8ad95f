//! Synthetic movie builders for tests.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};

use super::cast::ScriptInfoLayout;
use super::guid::{NULL_COMPRESSION_GUID, ZLIB_COMPRESSION_GUID};

pub fn put_u16(out: &mut Vec<u8>, value: u16, big_endian: bool) {
    if big_endian {
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

pub fn put_u32(out: &mut Vec<u8>, value: u32, big_endian: bool) {
    if big_endian {
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

pub fn put_tag(out: &mut Vec<u8>, tag: &[u8; 4], big_endian: bool) {
    if big_endian {
        out.extend_from_slice(tag);
    } else {
        out.extend(tag.iter().rev());
    }
}

fn patch_u32(out: &mut [u8], at: usize, value: u32, big_endian: bool) {
    let bytes = if big_endian {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    };
    out[at..at + 4].copy_from_slice(&bytes);
}

pub fn var_int(mut value: u32) -> Vec<u8> {
    let mut groups = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value != 0 {
        groups.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    groups.reverse();
    groups
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Classic `imap`/`mmap` movie. Resource ids are row numbers in the order
/// resources are added; a `KEY*` chunk is appended last when links exist.
pub struct MovieBuilder {
    big_endian: bool,
    codec: [u8; 4],
    map_version: u32,
    archive_version: u32,
    resources: Vec<([u8; 4], Vec<u8>)>,
    keys: Vec<(i32, i32, [u8; 4])>,
}

impl MovieBuilder {
    pub fn new(big_endian: bool) -> MovieBuilder {
        MovieBuilder {
            big_endian,
            codec: *b"MV93",
            map_version: 1,
            archive_version: 0x4C7,
            resources: Vec::new(),
            keys: Vec::new(),
        }
    }

    pub fn codec(mut self, codec: [u8; 4]) -> Self {
        self.codec = codec;
        self
    }

    pub fn archive_version(mut self, version: u32) -> Self {
        self.archive_version = version;
        self
    }

    pub fn resource(mut self, tag: [u8; 4], data: Vec<u8>) -> Self {
        self.resources.push((tag, data));
        self
    }

    pub fn key(mut self, child_id: i32, parent_id: i32, tag: [u8; 4]) -> Self {
        self.keys.push((child_id, parent_id, tag));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let be = self.big_endian;
        let mut resources = self.resources.clone();
        if !self.keys.is_empty() {
            let mut key = Vec::new();
            put_u16(&mut key, 12, be);
            put_u16(&mut key, 12, be);
            put_u32(&mut key, self.keys.len() as u32, be);
            put_u32(&mut key, self.keys.len() as u32, be);
            for (child, parent, tag) in &self.keys {
                put_u32(&mut key, *child as u32, be);
                put_u32(&mut key, *parent as u32, be);
                put_tag(&mut key, tag, be);
            }
            resources.push((*b"KEY*", key));
        }

        let mut out = Vec::new();
        out.extend_from_slice(if be { b"RIFX" } else { b"XFIR" });
        put_u32(&mut out, 0, be);
        put_tag(&mut out, &self.codec, be);

        put_tag(&mut out, b"imap", be);
        put_u32(&mut out, 16, be);
        put_u32(&mut out, 16, be);
        put_u32(&mut out, self.map_version, be);
        let mmap_offset_at = out.len();
        put_u32(&mut out, 0, be);
        put_u32(&mut out, self.archive_version, be);

        let mmap_start = out.len();
        patch_u32(&mut out, mmap_offset_at, mmap_start as u32, be);
        put_tag(&mut out, b"mmap", be);
        put_u32(&mut out, 12 + 20 * resources.len() as u32, be);
        put_u16(&mut out, 12, be);
        put_u16(&mut out, 20, be);
        put_u32(&mut out, resources.len() as u32, be);
        put_u32(&mut out, resources.len() as u32, be);
        let mut offset_slots = Vec::new();
        for (tag, data) in &resources {
            put_tag(&mut out, tag, be);
            put_u32(&mut out, data.len() as u32, be);
            offset_slots.push(out.len());
            put_u32(&mut out, 0, be);
            put_u16(&mut out, 0, be);
            put_u16(&mut out, 0, be);
            put_u32(&mut out, u32::MAX, be);
        }

        for ((tag, data), slot) in resources.iter().zip(offset_slots) {
            let chunk_start = out.len() as u32;
            patch_u32(&mut out, slot, chunk_start, be);
            put_tag(&mut out, tag, be);
            put_u32(&mut out, data.len() as u32, be);
            out.extend_from_slice(data);
            if out.len() % 2 != 0 {
                out.push(0);
            }
        }

        let size = (out.len() - 12) as u32;
        patch_u32(&mut out, 4, size, be);
        out
    }
}

struct AfterburnerResource {
    id: i32,
    tag: [u8; 4],
    data: Vec<u8>,
    inline: bool,
    compression_index: u32,
}

/// Little-endian `FGDM` movie with a zlib descriptor at index 0 and the null
/// descriptor at index 1.
#[derive(Default)]
pub struct AfterburnerBuilder {
    resources: Vec<AfterburnerResource>,
    omit_ils: bool,
}

impl AfterburnerBuilder {
    pub fn new() -> AfterburnerBuilder {
        AfterburnerBuilder::default()
    }

    pub fn resource(
        mut self,
        id: i32,
        tag: [u8; 4],
        data: Vec<u8>,
        inline: bool,
        compression_index: u32,
    ) -> Self {
        self.resources.push(AfterburnerResource {
            id,
            tag,
            data,
            inline,
            compression_index,
        });
        self
    }

    pub fn without_ils(mut self) -> Self {
        self.omit_ils = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let stored = |r: &AfterburnerResource| {
            if r.compression_index == 0 {
                zlib(&r.data)
            } else {
                r.data.clone()
            }
        };

        let mut ils = Vec::new();
        for r in self.resources.iter().filter(|r| r.inline) {
            ils.extend(var_int(r.id as u32));
            ils.extend(stored(r));
        }
        let ils_stored = zlib(&ils);

        let mut body = ils_stored.clone();
        let mut rows = Vec::new();
        if !self.omit_ils {
            rows.push((2i32, *b"ILS ", 0i32, ils_stored.len(), ils.len(), 0u32));
        }
        for r in &self.resources {
            let data = stored(r);
            let offset = if r.inline { -1 } else { body.len() as i32 };
            rows.push((r.id, r.tag, offset, data.len(), r.data.len(), r.compression_index));
            if !r.inline {
                body.extend(data);
            }
        }

        let mut abmp = Vec::new();
        abmp.extend(var_int(1));
        abmp.extend(var_int(0));
        abmp.extend(var_int(rows.len() as u32));
        for (id, tag, offset, comp, uncomp, compression) in &rows {
            abmp.extend(var_int(*id as u32));
            abmp.extend(var_int(*offset as u32));
            abmp.extend(var_int(*comp as u32));
            abmp.extend(var_int(*uncomp as u32));
            abmp.extend(var_int(*compression));
            put_tag(&mut abmp, tag, false);
        }
        let mut abmp_chunk = var_int(1);
        abmp_chunk.extend(var_int(abmp.len() as u32));
        abmp_chunk.extend(zlib(&abmp));

        let mut fcdr = Vec::new();
        put_u16(&mut fcdr, 2, false);
        fcdr.extend_from_slice(&ZLIB_COMPRESSION_GUID.to_bytes(false));
        fcdr.extend_from_slice(&NULL_COMPRESSION_GUID.to_bytes(false));
        fcdr.extend_from_slice(b"zlib\0none\0");
        let fcdr = zlib(&fcdr);

        let mut out = Vec::new();
        out.extend_from_slice(b"XFIR");
        put_u32(&mut out, 0, false);
        put_tag(&mut out, b"FGDM", false);

        put_tag(&mut out, b"Fver", false);
        let fver = var_int(0x400);
        out.extend(var_int(fver.len() as u32));
        out.extend(fver);

        put_tag(&mut out, b"Fcdr", false);
        out.extend(var_int(fcdr.len() as u32));
        out.extend(fcdr);

        put_tag(&mut out, b"ABMP", false);
        out.extend(var_int(abmp_chunk.len() as u32));
        out.extend(abmp_chunk);

        put_tag(&mut out, b"FGEI", false);
        out.extend(var_int(0));
        out.extend(body);

        let size = (out.len() - 12) as u32;
        patch_u32(&mut out, 4, size, false);
        out
    }
}

/// A `CASt` record for a script member. The script resource id is stored at
/// info offset 8 and the selector in the specific data.
pub fn script_cast_member(
    script_id: u32,
    selector: u16,
    text: &str,
    name: &str,
    layout: ScriptInfoLayout,
) -> Vec<u8> {
    let text_start = match layout {
        ScriptInfoLayout::PointerTable => 0x6A,
        ScriptInfoLayout::LegacyTextAfterLength => 0x21,
    };
    let mut info = vec![0u8; text_start];
    info[8..12].copy_from_slice(&script_id.to_be_bytes());
    info[16..20].copy_from_slice(&1i32.to_be_bytes());
    info[0x1D..0x21].copy_from_slice(&(text.len() as u32).to_le_bytes());
    if layout == ScriptInfoLayout::PointerTable {
        info[0x68..0x6A].copy_from_slice(&(text_start as u16).to_be_bytes());
    }
    info.extend(text.bytes());
    info.push(name.len() as u8);
    info.extend(name.bytes());

    let specific = selector.to_be_bytes();
    let mut out = Vec::new();
    put_u32(&mut out, 11, true);
    put_u32(&mut out, info.len() as u32, true);
    put_u32(&mut out, specific.len() as u32, true);
    out.extend(info);
    out.extend_from_slice(&specific);
    out
}

pub struct HandlerSpec {
    pub name_id: i16,
    pub argument_name_ids: Vec<u16>,
    pub local_name_ids: Vec<u16>,
    pub bytecode: Vec<u8>,
}

pub enum LiteralSpec {
    String(String),
    Int(i32),
    Float(f64),
}

/// Minimal `Lscr` with the fixed 92-byte header, handler records (version
/// below 850) and literals.
pub fn lscr(handlers: &[HandlerSpec], literals: &[LiteralSpec]) -> Vec<u8> {
    const HEADER: usize = 92;
    const RECORD: usize = 42;

    let handlers_offset = HEADER;
    let mut data_offset = handlers_offset + RECORD * handlers.len();
    let mut records = Vec::new();
    let mut data = Vec::new();
    for handler in handlers {
        let code_offset = data_offset + data.len();
        data.extend_from_slice(&handler.bytecode);
        if data.len() % 2 != 0 {
            data.push(0);
        }
        let args_offset = data_offset + data.len();
        for id in &handler.argument_name_ids {
            data.extend_from_slice(&id.to_be_bytes());
        }
        let locals_offset = data_offset + data.len();
        for id in &handler.local_name_ids {
            data.extend_from_slice(&id.to_be_bytes());
        }

        records.extend_from_slice(&handler.name_id.to_be_bytes());
        records.extend_from_slice(&0u16.to_be_bytes());
        records.extend_from_slice(&(handler.bytecode.len() as u32).to_be_bytes());
        records.extend_from_slice(&(code_offset as u32).to_be_bytes());
        records.extend_from_slice(&(handler.argument_name_ids.len() as u16).to_be_bytes());
        records.extend_from_slice(&(args_offset as u32).to_be_bytes());
        records.extend_from_slice(&(handler.local_name_ids.len() as u16).to_be_bytes());
        records.extend_from_slice(&(locals_offset as u32).to_be_bytes());
        records.extend_from_slice(&0u16.to_be_bytes());
        records.extend_from_slice(&0u32.to_be_bytes());
        records.extend_from_slice(&0u32.to_be_bytes());
        records.extend_from_slice(&0u16.to_be_bytes());
        records.extend_from_slice(&0u16.to_be_bytes());
        records.extend_from_slice(&0u32.to_be_bytes());
    }
    data_offset += data.len();

    let literals_offset = data_offset;
    let literals_data_offset = literals_offset + 8 * literals.len();
    let mut literal_records = Vec::new();
    let mut literal_data = Vec::new();
    for literal in literals {
        match literal {
            LiteralSpec::String(s) => {
                literal_records.extend_from_slice(&1u32.to_be_bytes());
                literal_records.extend_from_slice(&(literal_data.len() as u32).to_be_bytes());
                literal_data.extend_from_slice(&(s.len() as u32 + 1).to_be_bytes());
                literal_data.extend(s.bytes());
                literal_data.push(0);
            }
            LiteralSpec::Int(i) => {
                literal_records.extend_from_slice(&4u32.to_be_bytes());
                literal_records.extend_from_slice(&(*i as u32).to_be_bytes());
            }
            LiteralSpec::Float(f) => {
                literal_records.extend_from_slice(&9u32.to_be_bytes());
                literal_records.extend_from_slice(&(literal_data.len() as u32).to_be_bytes());
                literal_data.extend_from_slice(&8u32.to_be_bytes());
                literal_data.extend_from_slice(&f.to_be_bytes());
            }
        }
    }

    let mut out = vec![0u8; HEADER];
    let total = (literals_data_offset + literal_data.len()) as u32;
    out[8..12].copy_from_slice(&total.to_be_bytes());
    out[12..16].copy_from_slice(&total.to_be_bytes());
    out[16..18].copy_from_slice(&(HEADER as u16).to_be_bytes());
    out[72..74].copy_from_slice(&(handlers.len() as u16).to_be_bytes());
    out[74..78].copy_from_slice(&(handlers_offset as u32).to_be_bytes());
    out[78..80].copy_from_slice(&(literals.len() as u16).to_be_bytes());
    out[80..84].copy_from_slice(&(literals_offset as u32).to_be_bytes());
    out[84..88].copy_from_slice(&(literal_data.len() as u32).to_be_bytes());
    out[88..92].copy_from_slice(&(literals_data_offset as u32).to_be_bytes());
    out.extend(records);
    out.extend(data);
    out.extend(literal_records);
    out.extend(literal_data);
    out
}

/// `Lnam` with the names stored as Pascal strings after a 20-byte header.
pub fn lnam(names: &[&str]) -> Vec<u8> {
    let mut body = Vec::new();
    for name in names {
        body.push(name.len() as u8);
        body.extend(name.bytes());
    }
    let mut out = Vec::new();
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&(20 + body.len() as u32).to_be_bytes());
    out.extend_from_slice(&(20 + body.len() as u32).to_be_bytes());
    out.extend_from_slice(&20u16.to_be_bytes());
    out.extend_from_slice(&(names.len() as u16).to_be_bytes());
    out.extend(body);
    out
}

/// `Lctx` pointing at `lnam_id` and listing `script_ids`.
pub fn lctx(lnam_id: i32, script_ids: &[i32]) -> Vec<u8> {
    const ENTRIES_OFFSET: u16 = 42;
    let mut out = Vec::new();
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&(script_ids.len() as u32).to_be_bytes());
    out.extend_from_slice(&(script_ids.len() as u32).to_be_bytes());
    out.extend_from_slice(&ENTRIES_OFFSET.to_be_bytes());
    out.extend_from_slice(&0i16.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&lnam_id.to_be_bytes());
    out.extend_from_slice(&(script_ids.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&(-1i16).to_be_bytes());
    assert_eq!(out.len(), ENTRIES_OFFSET as usize);
    for id in script_ids {
        out.extend_from_slice(&0i32.to_be_bytes());
        out.extend_from_slice(&id.to_be_bytes());
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
    }
    out
}

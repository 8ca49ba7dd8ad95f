pub mod cast_member;
pub mod handler;
pub mod initial_map;
pub mod key_table;
pub mod lctx;
pub mod literal;
pub mod memory_map;
pub mod script;
pub mod script_names;

use fxhash::FxHashMap;
use itertools::Itertools;
use log::warn;

use self::key_table::KeyTableEntry;
use super::utils::{fourcc_to_string, FOURCC};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResourceStorage {
    /// Located through the classic `mmap` table.
    Classic,
    /// Located through the Afterburner `ABMP` table. An offset of -1 means the
    /// bytes live in the initial load segment.
    Afterburner {
        offset: i32,
        uncompressed_size: u32,
        compression_index: u32,
    },
}

#[derive(Clone, Debug)]
pub struct ResourceEntry {
    pub index: i32,
    pub fourcc: u32,
    pub size: u32,
    pub map_offset: u32,
    pub flags: u16,
    pub attributes: u16,
    pub next_free: u32,
    pub storage: ResourceStorage,
}

impl ResourceEntry {
    pub fn is_free(&self) -> bool {
        self.fourcc == FOURCC("free") || self.fourcc == FOURCC("junk")
    }

    pub fn tag_name(&self) -> String {
        fourcc_to_string(self.fourcc)
    }
}

/// Every resource row of one movie, in map order, plus the `KEY*` links and
/// any inline payloads.
#[derive(Clone, Debug, Default)]
pub struct ResourceContainer {
    entries: Vec<ResourceEntry>,
    index_by_id: FxHashMap<i32, usize>,
    relationships: Vec<KeyTableEntry>,
    inline_segments: FxHashMap<i32, Vec<u8>>,
}

impl ResourceContainer {
    pub fn add(&mut self, entry: ResourceEntry) {
        if let Some(slot) = self.index_by_id.get(&entry.index) {
            warn!(
                "Resource {} ('{}') registered twice, keeping the latest row",
                entry.index,
                entry.tag_name()
            );
            self.entries[*slot] = entry;
            return;
        }
        self.index_by_id.insert(entry.index, self.entries.len());
        self.entries.push(entry);
    }

    pub fn add_relationship(&mut self, entry: KeyTableEntry) {
        self.relationships.push(entry);
    }

    pub fn set_inline_segment(&mut self, id: i32, bytes: Vec<u8>) {
        self.inline_segments.insert(id, bytes);
    }

    pub fn inline_segment(&self, id: i32) -> Option<&Vec<u8>> {
        self.inline_segments.get(&id)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.index_by_id.clear();
        self.relationships.clear();
        self.inline_segments.clear();
    }

    pub fn try_get_entry(&self, id: i32) -> Option<&ResourceEntry> {
        self.index_by_id.get(&id).map(|slot| &self.entries[*slot])
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn relationships(&self) -> &[KeyTableEntry] {
        &self.relationships
    }

    pub fn entries_with_fourcc(&self, fourcc: u32) -> Vec<&ResourceEntry> {
        self.entries.iter().filter(|e| e.fourcc == fourcc).collect_vec()
    }

    pub fn first_with_fourcc(&self, fourcc: u32) -> Option<&ResourceEntry> {
        self.entries.iter().find(|e| e.fourcc == fourcc)
    }

    pub fn children_of(&self, parent_id: i32) -> Vec<&KeyTableEntry> {
        self.relationships
            .iter()
            .filter(|r| r.parent_id == parent_id)
            .collect_vec()
    }

    pub fn parent_of(&self, child_id: i32) -> Option<&KeyTableEntry> {
        self.relationships.iter().find(|r| r.child_id == child_id)
    }
}

use binary_reader::{BinaryReader, Endian};
use num_traits::FromPrimitive;

use crate::director::enums::{MemberType, ScriptFormat};
use crate::io::reader::DirectorExt;

/// A `CASt` record: member type plus the opaque info and type-specific
/// blocks. Always big-endian.
#[derive(Clone, Debug)]
pub struct CastMemberChunk {
    pub member_type: u32,
    pub info: Vec<u8>,
    pub specific: Vec<u8>,
}

impl CastMemberChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> std::io::Result<CastMemberChunk> {
        reader.set_endian(Endian::Big);
        reader.require(12)?;
        let member_type = reader.read_u32()?;
        let info_len = reader.read_u32()? as usize;
        let specific_len = reader.read_u32()? as usize;

        let info = reader.read_vec(info_len.min(reader.remaining()))?;
        let specific = reader.read_vec(specific_len.min(reader.remaining()))?;
        Ok(CastMemberChunk {
            member_type,
            info,
            specific,
        })
    }

    pub fn member_type(&self) -> Option<MemberType> {
        MemberType::from_u32(self.member_type)
    }

    pub fn is_script(&self) -> bool {
        self.member_type() == Some(MemberType::Script)
    }

    pub fn script_format(&self) -> ScriptFormat {
        let selector = match self.specific.as_slice() {
            [] => return ScriptFormat::Unknown,
            [single] => *single as u16,
            [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
        };
        ScriptFormat::from_u16(selector).unwrap_or(ScriptFormat::Unknown)
    }

    /// The script resource id stored at info offset 8, big-endian first.
    /// Only ids `accept` approves are returned.
    pub fn script_resource_id(&self, accept: impl Fn(i32) -> bool) -> Option<i32> {
        let raw = self.info.get(8..12)?;
        let raw = [raw[0], raw[1], raw[2], raw[3]];
        [i32::from_be_bytes(raw), i32::from_le_bytes(raw)]
            .into_iter()
            .find(|&id| id > 0 && accept(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::cast::ScriptInfoLayout;
    use crate::director::test_writer::script_cast_member;

    #[test]
    fn test_script_member_fields() {
        let bytes = script_cast_member(5, 3, "on x\rend", "X", ScriptInfoLayout::LegacyTextAfterLength);
        let member = CastMemberChunk::from_reader(&mut BinaryReader::from_vec(&bytes)).unwrap();
        assert!(member.is_script());
        assert_eq!(member.script_format(), ScriptFormat::Movie);
        assert_eq!(member.script_resource_id(|id| id == 5), Some(5));
        assert_eq!(member.script_resource_id(|_| false), None);
    }

    #[test]
    fn test_little_endian_script_id() {
        let mut member = CastMemberChunk {
            member_type: 11,
            info: vec![0; 12],
            specific: vec![7],
        };
        member.info[8..12].copy_from_slice(&9i32.to_le_bytes());
        assert_eq!(member.script_resource_id(|id| id == 9), Some(9));
        assert_eq!(member.script_format(), ScriptFormat::Parent);
    }

    #[test]
    fn test_lengths_are_clamped() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&11u32.to_be_bytes());
        bytes.extend_from_slice(&1000u32.to_be_bytes());
        bytes.extend_from_slice(&1000u32.to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);
        let member = CastMemberChunk::from_reader(&mut BinaryReader::from_vec(&bytes)).unwrap();
        assert_eq!(member.info, vec![1, 2, 3]);
        assert!(member.specific.is_empty());
        assert_eq!(member.script_format(), ScriptFormat::Unknown);
    }
}

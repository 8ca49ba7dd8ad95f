use binary_reader::BinaryReader;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::director::lingo::datum::Datum;
use crate::io::reader::DirectorExt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive)]
pub enum LiteralType {
    String = 1,
    Int = 4,
    Float = 9,
}

#[derive(Clone, Copy, Debug)]
pub struct LiteralRecord {
    pub raw_type: u32,
    pub literal_type: Option<LiteralType>,
    pub offset: u32,
}

pub struct LiteralStore;

impl LiteralStore {
    pub fn read_record(reader: &mut BinaryReader, dir_version: u16) -> std::io::Result<LiteralRecord> {
        let raw_type = if dir_version >= 500 {
            reader.read_u32()?
        } else {
            reader.read_u16()? as u32
        };
        let offset = reader.read_u32()?;
        Ok(LiteralRecord {
            raw_type,
            literal_type: LiteralType::from_u32(raw_type),
            offset,
        })
    }

    pub fn read_data(
        reader: &mut BinaryReader,
        record: &LiteralRecord,
        literals_data_offset: usize,
    ) -> std::io::Result<Datum> {
        let data_start = literals_data_offset.saturating_add(record.offset as usize);
        match record.literal_type {
            Some(LiteralType::Int) => Ok(Datum::Int(record.offset as i32)),
            Some(LiteralType::String) => {
                reader.seek_to(data_start)?;
                let length = reader.read_u32()? as usize;
                // length counts the trailing NUL
                Ok(Datum::String(reader.read_latin1(length.saturating_sub(1))?))
            }
            Some(LiteralType::Float) => {
                reader.seek_to(data_start)?;
                let length = reader.read_u32()? as usize;
                let value = match length {
                    8 => {
                        let mut raw = [0u8; 8];
                        raw.copy_from_slice(&reader.read_vec(8)?);
                        f64::from_be_bytes(raw)
                    }
                    10 => read_extended_float(&reader.read_vec(10)?),
                    _ => 0.0,
                };
                Ok(Datum::Float(value))
            }
            None => Ok(Datum::Void),
        }
    }
}

/// Decodes an 80-bit big-endian extended precision float.
fn read_extended_float(bytes: &[u8]) -> f64 {
    let exponent = (((bytes[0] & 0x7f) as i32) << 8) | bytes[1] as i32;
    let mut mantissa_bytes = [0u8; 8];
    mantissa_bytes.copy_from_slice(&bytes[2..10]);
    let mantissa = u64::from_be_bytes(mantissa_bytes);
    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }
    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    if exponent == 0x7fff {
        return if mantissa << 1 == 0 { sign * f64::INFINITY } else { f64::NAN };
    }
    let value = mantissa as f64 * 2f64.powi(exponent - 16383 - 63);
    sign * value
}

#[cfg(test)]
mod tests {
    use super::*;
    use binary_reader::Endian;

    fn be_reader(bytes: &[u8]) -> BinaryReader {
        let mut reader = BinaryReader::from_u8(bytes);
        reader.set_endian(Endian::Big);
        reader
    }

    #[test]
    fn test_int_literal_lives_in_offset_slot() {
        let mut reader = be_reader(&[0, 0, 0, 4, 0xff, 0xff, 0xff, 0xfe]);
        let record = LiteralStore::read_record(&mut reader, 500).unwrap();
        assert_eq!(record.literal_type, Some(LiteralType::Int));
        let datum = LiteralStore::read_data(&mut reader, &record, 0).unwrap();
        assert_eq!(datum, Datum::Int(-2));
    }

    #[test]
    fn test_string_literal_drops_trailing_nul() {
        let data = [0, 0, 0, 4, b'a', b'b', b'c', 0];
        let mut reader = be_reader(&data);
        let record = LiteralRecord { raw_type: 1, literal_type: Some(LiteralType::String), offset: 0 };
        let datum = LiteralStore::read_data(&mut reader, &record, 0).unwrap();
        assert_eq!(datum, Datum::String("abc".to_owned()));
    }

    #[test]
    fn test_pre_500_records_use_short_type() {
        let mut reader = be_reader(&[0, 9, 0, 0, 0, 0x10]);
        let record = LiteralStore::read_record(&mut reader, 400).unwrap();
        assert_eq!(record.literal_type, Some(LiteralType::Float));
        assert_eq!(record.offset, 0x10);
        assert_eq!(reader.pos, 6);
    }

    #[test]
    fn test_float_literals() {
        let mut data = vec![0, 0, 0, 8];
        data.extend_from_slice(&1.5f64.to_be_bytes());
        let mut reader = be_reader(&data);
        let record = LiteralRecord { raw_type: 9, literal_type: Some(LiteralType::Float), offset: 0 };
        assert_eq!(LiteralStore::read_data(&mut reader, &record, 0).unwrap(), Datum::Float(1.5));

        // 3.0 as an 80-bit extended float
        let data = [0, 0, 0, 10, 0x40, 0x00, 0xc0, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = be_reader(&data);
        assert_eq!(LiteralStore::read_data(&mut reader, &record, 0).unwrap(), Datum::Float(3.0));
    }

    #[test]
    fn test_unknown_type_is_void() {
        let mut reader = be_reader(&[]);
        let record = LiteralRecord { raw_type: 11, literal_type: None, offset: 0 };
        assert_eq!(LiteralStore::read_data(&mut reader, &record, 0).unwrap(), Datum::Void);
    }
}

/// A 16-byte Moa class identifier as stored in the `Fcdr` table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoaID {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl MoaID {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> MoaID {
        MoaID {
            data1,
            data2,
            data3,
            data4,
        }
    }

    pub fn to_bytes(&self, big_endian: bool) -> [u8; 16] {
        let mut out = [0u8; 16];
        if big_endian {
            out[0..4].copy_from_slice(&self.data1.to_be_bytes());
            out[4..6].copy_from_slice(&self.data2.to_be_bytes());
            out[6..8].copy_from_slice(&self.data3.to_be_bytes());
        } else {
            out[0..4].copy_from_slice(&self.data1.to_le_bytes());
            out[4..6].copy_from_slice(&self.data2.to_le_bytes());
            out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        }
        out[8..16].copy_from_slice(&self.data4);
        out
    }

    /// Raw ids are compared in both byte layouts since the table is written
    /// in the movie's byte order.
    pub fn matches(&self, raw: &[u8; 16]) -> bool {
        self.to_bytes(true) == *raw || self.to_bytes(false) == *raw
    }
}

pub const NULL_COMPRESSION_GUID: MoaID = MoaID::new(
    0xAC99982E,
    0x005D,
    0x0D50,
    [0x00, 0x00, 0x08, 0x00, 0x07, 0x37, 0x7A, 0x34],
);
pub const ZLIB_COMPRESSION_GUID: MoaID = MoaID::new(
    0xAC99E904,
    0x0070,
    0x0B36,
    [0x00, 0x00, 0x08, 0x00, 0x07, 0x37, 0x7A, 0x34],
);
pub const SND_COMPRESSION_GUID: MoaID = MoaID::new(
    0x7204A889,
    0xAFD0,
    0x11CF,
    [0xA2, 0x22, 0x00, 0xA0, 0x24, 0x53, 0x44, 0x4C],
);
pub const FONTMAP_COMPRESSION_GUID: MoaID = MoaID::new(
    0x8A4679A1,
    0x3720,
    0x11D0,
    [0x92, 0x23, 0x00, 0xA0, 0xC9, 0x08, 0x68, 0xB1],
);

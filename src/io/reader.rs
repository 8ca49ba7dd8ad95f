use std::io::{self, Error, ErrorKind};
use std::ops::{Deref, DerefMut};

use binary_reader::{BinaryReader, Endian};

use crate::director::compression::zlib_decompress;

fn eof(wanted: usize, pos: usize, length: usize) -> Error {
    Error::new(
        ErrorKind::UnexpectedEof,
        format!("wanted {} bytes at {} but stream is {} bytes long", wanted, pos, length),
    )
}

/// Director-specific helpers layered over `BinaryReader`.
///
/// Every read is bounds-checked before it touches the underlying buffer, so a
/// failed read leaves the cursor where it was.
pub trait DirectorExt {
    fn remaining(&self) -> usize;
    fn eof(&self) -> bool;
    fn is_big_endian(&self) -> bool;
    fn require(&self, len: usize) -> io::Result<()>;
    fn seek_to(&mut self, pos: usize) -> io::Result<()>;
    fn skip(&mut self, len: usize) -> io::Result<()>;
    fn align_even(&mut self);
    fn read_fourcc(&mut self) -> io::Result<u32>;
    fn read_var_int(&mut self) -> io::Result<u32>;
    fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>>;
    fn read_cstr(&mut self) -> io::Result<String>;
    fn read_pascal_string(&mut self) -> io::Result<String>;
    fn read_latin1(&mut self, len: usize) -> io::Result<String>;
    fn read_zlib_bytes(&mut self, len: usize) -> io::Result<Vec<u8>>;
}

impl DirectorExt for BinaryReader {
    fn remaining(&self) -> usize {
        self.length.saturating_sub(self.pos)
    }

    fn eof(&self) -> bool {
        self.pos >= self.length
    }

    fn is_big_endian(&self) -> bool {
        matches!(self.endian, Endian::Big)
    }

    fn require(&self, len: usize) -> io::Result<()> {
        if self.remaining() < len {
            return Err(eof(len, self.pos, self.length));
        }
        Ok(())
    }

    fn seek_to(&mut self, pos: usize) -> io::Result<()> {
        if pos > self.length {
            return Err(eof(0, pos, self.length));
        }
        self.jmp(pos);
        Ok(())
    }

    fn skip(&mut self, len: usize) -> io::Result<()> {
        self.require(len)?;
        self.jmp(self.pos + len);
        Ok(())
    }

    fn align_even(&mut self) {
        if self.pos % 2 != 0 && self.pos < self.length {
            self.jmp(self.pos + 1);
        }
    }

    /// Reads a tag in the stream's byte order. XFIR files store tags
    /// byte-reversed, so the result always compares equal to `FOURCC(..)`.
    fn read_fourcc(&mut self) -> io::Result<u32> {
        self.require(4)?;
        self.read_u32()
    }

    /// Afterburner variable-length integer: 7 bits per byte, most
    /// significant group first, high bit set on every byte but the last.
    fn read_var_int(&mut self) -> io::Result<u32> {
        let mut value: u32 = 0;
        loop {
            self.require(1)?;
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7f) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
    }

    fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        self.require(len)?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    fn read_cstr(&mut self) -> io::Result<String> {
        let mut bytes = Vec::new();
        loop {
            self.require(1)?;
            match self.read_u8()? {
                0 => break,
                byte => bytes.push(byte),
            }
        }
        Ok(latin1_to_string(&bytes))
    }

    fn read_pascal_string(&mut self) -> io::Result<String> {
        self.require(1)?;
        let len = self.read_u8()? as usize;
        self.read_latin1(len)
    }

    fn read_latin1(&mut self, len: usize) -> io::Result<String> {
        let bytes = self.read_vec(len)?;
        Ok(latin1_to_string(&bytes))
    }

    fn read_zlib_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let compressed = self.read_vec(len)?;
        zlib_decompress(&compressed, None)
    }
}

/// Director strings are single-byte; every byte maps to the code point with
/// the same value.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Restores the reader's cursor when dropped.
///
/// Speculative probing (magic lookup, candidate chunk offsets) goes through
/// this guard so every exit path, `?` included, leaves the cursor untouched.
pub struct SavedPosition<'a> {
    reader: &'a mut BinaryReader,
    saved_pos: usize,
    saved_endian: Endian,
}

impl<'a> SavedPosition<'a> {
    pub fn new(reader: &'a mut BinaryReader) -> SavedPosition<'a> {
        let saved_pos = reader.pos;
        let saved_endian = reader.endian;
        SavedPosition {
            reader,
            saved_pos,
            saved_endian,
        }
    }
}

impl Deref for SavedPosition<'_> {
    type Target = BinaryReader;

    fn deref(&self) -> &BinaryReader {
        self.reader
    }
}

impl DerefMut for SavedPosition<'_> {
    fn deref_mut(&mut self) -> &mut BinaryReader {
        self.reader
    }
}

impl Drop for SavedPosition<'_> {
    fn drop(&mut self) {
        self.reader.jmp(self.saved_pos);
        self.reader.endian = self.saved_endian;
    }
}

//! `IndexHeader`: the 80-byte record at the head of
//! `drivers.zudi-index` (§4.4, §6).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::WriteError;

/// Target byte order for a whole index (chosen once, at `create`
/// time; this crate performs no endianness conversion of its own —
/// §1's non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    fn tag(self) -> [u8; 4] {
        match self {
            Endianness::Little => *b"le\0\0",
            Endianness::Big => *b"be\0\0",
        }
    }
}

pub const FORMAT_MAJOR_VERSION: u16 = 1;
pub const FORMAT_MINOR_VERSION: u16 = 0;
pub const INDEX_HEADER_LEN: u64 = 4 + 2 + 2 + 4 + 4 + 64;

pub struct IndexHeader {
    pub endianness: Endianness,
    pub major_version: u16,
    pub minor_version: u16,
    pub n_records: u32,
    pub next_driver_id: u32,
}

impl IndexHeader {
    pub fn write_to(&self, file: &mut File) -> std::io::Result<()> {
        file.write_all(&self.endianness.tag())?;
        write_u16(file, self.endianness, self.major_version)?;
        write_u16(file, self.endianness, self.minor_version)?;
        write_u32(file, self.endianness, self.n_records)?;
        write_u32(file, self.endianness, self.next_driver_id)?;
        file.write_all(&[0u8; 64])?;
        Ok(())
    }

    /// Reads `nRecords` out of an existing `drivers.zudi-index`,
    /// inferring endianness from its own tag, without touching any
    /// other field.
    fn read_n_records(file: &mut File) -> std::io::Result<(Endianness, u32)> {
        file.seek(SeekFrom::Start(0))?;
        let mut tag = [0u8; 4];
        file.read_exact(&mut tag)?;
        let endianness = if tag == *b"be\0\0" {
            Endianness::Big
        } else {
            Endianness::Little
        };
        // skip majorVersion + minorVersion
        file.seek(SeekFrom::Current(4))?;
        let n_records = match endianness {
            Endianness::Little => file.read_u32::<LittleEndian>()?,
            Endianness::Big => file.read_u32::<BigEndian>()?,
        };
        Ok((endianness, n_records))
    }

    /// Increments `nRecords` in place by one, the single permitted
    /// non-append mutation in the whole format (§4.3 step 7).
    pub fn bump_record_count(path: &Path) -> Result<(), WriteError> {
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| WriteError::io(path.display(), e))?;
        let (endianness, n_records) =
            Self::read_n_records(&mut file).map_err(|e| WriteError::io(path.display(), e))?;
        file.seek(SeekFrom::Start(8))
            .map_err(|e| WriteError::io(path.display(), e))?;
        write_u32(&mut file, endianness, n_records + 1)
            .map_err(|e| WriteError::io(path.display(), e))?;
        Ok(())
    }
}

pub fn write_u16(file: &mut File, endianness: Endianness, v: u16) -> std::io::Result<()> {
    match endianness {
        Endianness::Little => file.write_u16::<LittleEndian>(v),
        Endianness::Big => file.write_u16::<BigEndian>(v),
    }
}

pub fn write_u32(file: &mut File, endianness: Endianness, v: u32) -> std::io::Result<()> {
    match endianness {
        Endianness::Little => file.write_u32::<LittleEndian>(v),
        Endianness::Big => file.write_u32::<BigEndian>(v),
    }
}

/// Writes `s` left-justified into a fixed-size, NUL-padded field.
/// Callers have already validated `s.len() < width` against the
/// matching limit in [`crate::limits`].
pub fn write_fixed_str(file: &mut File, s: &str, width: usize) -> std::io::Result<()> {
    let mut buf = vec![0u8; width];
    buf[..s.len()].copy_from_slice(s.as_bytes());
    file.write_all(&buf)
}

//! The shared string pool (`strings.zudi-index`): every
//! variable-length string referenced by any on-disk record is
//! interned here once, and the referencing record stores only the
//! pre-append byte offset (§4.3).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::WriteError;

pub struct StringPool {
    file: File,
    offset: u32,
    path: String,
}

impl StringPool {
    pub fn open_append(path: &Path) -> Result<Self, WriteError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| WriteError::io(path.display(), e))?;
        let offset = file
            .metadata()
            .map_err(|e| WriteError::io(path.display(), e))?
            .len() as u32;
        Ok(StringPool {
            file,
            offset,
            path: path.display().to_string(),
        })
    }

    /// Interns a NUL-terminated string, returning the offset of its
    /// first byte.
    pub fn intern_str(&mut self, s: &str) -> Result<u32, WriteError> {
        let offset = self.offset;
        self.file
            .write_all(s.as_bytes())
            .and_then(|_| self.file.write_all(&[0u8]))
            .map_err(|e| WriteError::io(&self.path, e))?;
        self.offset += s.len() as u32 + 1;
        Ok(offset)
    }

    /// Interns a raw byte blob (no terminator), as used for ARRAY8
    /// attribute values; the caller records the length separately.
    pub fn intern_bytes(&mut self, bytes: &[u8]) -> Result<u32, WriteError> {
        let offset = self.offset;
        self.file
            .write_all(bytes)
            .map_err(|e| WriteError::io(&self.path, e))?;
        self.offset += bytes.len() as u32;
        Ok(offset)
    }
}

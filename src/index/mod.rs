//! Index Writer (§4.3, §4.4): serializes an assembled driver and its
//! side-lists into the append-only multi-file index format.

pub mod header;
pub mod strings;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use header::Endianness;
use header::{write_fixed_str, write_u16, write_u32, IndexHeader};
use strings::StringPool;

use crate::error::WriteError;
use crate::limits::*;
use crate::model::{AttrValue, DriverHeader, SideLists};

const OTHER_FILES: &[&str] = &[
    "driver-data.zudi-index",
    "devices.zudi-index",
    "ranks.zudi-index",
    "provisions.zudi-index",
    "regions.zudi-index",
    "messages.zudi-index",
    "disaster-messages.zudi-index",
    "message-files.zudi-index",
    "readable-files.zudi-index",
    "strings.zudi-index",
];

/// Attaches the offending file's path to a bare `io::Result`,
/// shortening every write call site in this module to a single `.at`.
trait AtPath<T> {
    fn at(self, path: &Path) -> Result<T, WriteError>;
}

impl<T> AtPath<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T, WriteError> {
        self.map_err(|e| WriteError::io(path.display(), e))
    }
}

fn write_byte(file: &mut File, b: u8) -> std::io::Result<()> {
    file.write_all(&[b])
}

pub struct IndexWriter {
    dir: PathBuf,
}

impl IndexWriter {
    pub fn new(dir: &Path) -> Self {
        IndexWriter {
            dir: dir.to_path_buf(),
        }
    }

    /// Establishes or clears every file in the index. This is the
    /// only operation that truncates; everything else only appends
    /// (§4.4).
    pub fn create(
        dir: &Path,
        endianness: Endianness,
        next_driver_id: u32,
    ) -> Result<(), WriteError> {
        std::fs::create_dir_all(dir).at(dir)?;

        let drivers_path = dir.join("drivers.zudi-index");
        let mut drivers_file = File::create(&drivers_path).at(&drivers_path)?;
        IndexHeader {
            endianness,
            major_version: header::FORMAT_MAJOR_VERSION,
            minor_version: header::FORMAT_MINOR_VERSION,
            n_records: 0,
            next_driver_id,
        }
        .write_to(&mut drivers_file)
        .at(&drivers_path)?;

        for name in OTHER_FILES {
            let path = dir.join(name);
            File::create(&path).at(&path)?;
        }
        Ok(())
    }

    /// Runs the full write sequence for one driver (§4.3).
    pub fn write_driver(
        &self,
        mut header: DriverHeader,
        lists: SideLists,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let mut strings = StringPool::open_append(&self.dir.join("strings.zudi-index"))?;

        self.write_embedded_tables(&mut header, &mut strings, endianness)?;
        self.write_ranks(&mut header, &lists, &mut strings, endianness)?;
        self.write_devices(&mut header, &lists, &mut strings, endianness)?;
        self.write_provisions(&mut header, &lists, &mut strings, endianness)?;
        self.write_regions(&mut header, &lists, endianness)?;
        self.write_messages(&mut header, &lists, &mut strings, endianness)?;
        self.write_disaster_messages(&mut header, &lists, &mut strings, endianness)?;
        self.write_message_files(&mut header, &lists, &mut strings, endianness)?;
        self.write_readable_files(&mut header, &lists, &mut strings, endianness)?;
        self.write_driver_header(&header, &lists, endianness)?;

        Ok(())
    }

    fn open_append(&self, name: &str) -> Result<(File, PathBuf), WriteError> {
        let path = self.dir.join(name);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .at(&path)?;
        Ok((file, path))
    }

    fn tell(file: &File, path: &Path) -> Result<u32, WriteError> {
        Ok(file.metadata().at(path)?.len() as u32)
    }

    fn write_embedded_tables(
        &self,
        header: &mut DriverHeader,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("driver-data.zudi-index")?;
        header.data_file_offset = Self::tell(&f, &p)?;

        header.modules_offset = Self::tell(&f, &p)?;
        for m in &header.modules {
            let name_offset = strings.intern_str(&m.file_name)?;
            write_u16(&mut f, endianness, m.index).at(&p)?;
            write_u32(&mut f, endianness, name_offset).at(&p)?;
        }

        header.requirements_offset = Self::tell(&f, &p)?;
        for r in &header.requirements {
            let name_offset = strings.intern_str(&r.name)?;
            write_u32(&mut f, endianness, r.version).at(&p)?;
            write_u32(&mut f, endianness, name_offset).at(&p)?;
        }

        header.metalanguages_offset = Self::tell(&f, &p)?;
        for m in &header.metalanguages {
            let name_offset = strings.intern_str(&m.name)?;
            write_u16(&mut f, endianness, m.index).at(&p)?;
            write_u32(&mut f, endianness, name_offset).at(&p)?;
        }

        header.parent_bops_offset = Self::tell(&f, &p)?;
        for b in &header.parent_bops {
            write_u16(&mut f, endianness, b.meta_index).at(&p)?;
            write_u16(&mut f, endianness, b.region_index).at(&p)?;
            write_u16(&mut f, endianness, b.ops_index).at(&p)?;
            write_u16(&mut f, endianness, b.bind_cb_index).at(&p)?;
        }

        header.child_bops_offset = Self::tell(&f, &p)?;
        for b in &header.child_bops {
            write_u16(&mut f, endianness, b.meta_index).at(&p)?;
            write_u16(&mut f, endianness, b.region_index).at(&p)?;
            write_u16(&mut f, endianness, b.ops_index).at(&p)?;
        }

        header.internal_bops_offset = Self::tell(&f, &p)?;
        for b in &header.internal_bops {
            write_u16(&mut f, endianness, b.meta_index).at(&p)?;
            write_u16(&mut f, endianness, b.region_index).at(&p)?;
            write_u16(&mut f, endianness, b.ops_index0).at(&p)?;
            write_u16(&mut f, endianness, b.ops_index1).at(&p)?;
            write_u16(&mut f, endianness, b.bind_cb_index).at(&p)?;
        }

        Ok(())
    }

    fn write_ranks(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("ranks.zudi-index")?;
        header.rank_file_offset = Self::tell(&f, &p)?;

        for rank in &lists.ranks {
            write_u32(&mut f, endianness, rank.driver_id).at(&p)?;
            write_byte(&mut f, rank.attributes.len() as u8).at(&p)?;
            write_byte(&mut f, rank.rank).at(&p)?;
            for attr in &rank.attributes {
                let name_offset = strings.intern_str(&attr.name)?;
                write_u32(&mut f, endianness, name_offset).at(&p)?;
            }
        }
        Ok(())
    }

    fn write_devices(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("devices.zudi-index")?;
        header.device_file_offset = Self::tell(&f, &p)?;

        for device in &lists.devices {
            write_u32(&mut f, endianness, device.driver_id).at(&p)?;
            write_u16(&mut f, endianness, device.index).at(&p)?;
            write_u16(&mut f, endianness, device.message_index).at(&p)?;
            write_u16(&mut f, endianness, device.meta_index).at(&p)?;
            write_byte(&mut f, device.attributes.len() as u8).at(&p)?;

            for attr in &device.attributes {
                let name_offset = strings.intern_str(&attr.name)?;
                let (attr_type, size, value) = match &attr.value {
                    AttrValue::String(s) => (0u8, s.len() as u8, strings.intern_str(s)?),
                    AttrValue::Ubit32(v) => (1u8, 4u8, *v),
                    AttrValue::Bool(b) => (2u8, 1u8, *b as u32),
                    AttrValue::Array8(bytes) => {
                        (3u8, bytes.len() as u8, strings.intern_bytes(bytes)?)
                    }
                };
                write_byte(&mut f, attr_type).at(&p)?;
                write_byte(&mut f, size).at(&p)?;
                write_u32(&mut f, endianness, name_offset).at(&p)?;
                write_u32(&mut f, endianness, value).at(&p)?;
            }
        }
        Ok(())
    }

    fn write_provisions(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("provisions.zudi-index")?;
        header.provision_file_offset = Self::tell(&f, &p)?;
        for provision in &lists.provisions {
            let name_offset = strings.intern_str(&provision.name)?;
            write_u32(&mut f, endianness, provision.driver_id).at(&p)?;
            write_u32(&mut f, endianness, provision.version).at(&p)?;
            write_u32(&mut f, endianness, name_offset).at(&p)?;
        }
        Ok(())
    }

    /// Regions have no variable-length fields, so unlike its sibling
    /// `write_*` methods this one never touches the string pool.
    fn write_regions(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("regions.zudi-index")?;
        header.regions_offset = Self::tell(&f, &p)?;
        for r in &lists.regions {
            write_u32(&mut f, endianness, r.driver_id).at(&p)?;
            write_u16(&mut f, endianness, r.index).at(&p)?;
            write_u16(&mut f, endianness, r.module_index).at(&p)?;
            write_byte(&mut f, r.priority as u8).at(&p)?;
            write_byte(&mut f, r.latency as u8).at(&p)?;
            write_u32(&mut f, endianness, r.flags.bits()).at(&p)?;
        }
        Ok(())
    }

    fn write_messages(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("messages.zudi-index")?;
        header.messages_offset = Self::tell(&f, &p)?;
        for m in &lists.messages {
            let text_offset = strings.intern_str(&m.text)?;
            write_u32(&mut f, endianness, m.driver_id).at(&p)?;
            write_u16(&mut f, endianness, m.index).at(&p)?;
            write_u32(&mut f, endianness, text_offset).at(&p)?;
        }
        Ok(())
    }

    fn write_disaster_messages(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("disaster-messages.zudi-index")?;
        header.disaster_messages_offset = Self::tell(&f, &p)?;
        for m in &lists.disaster_messages {
            let text_offset = strings.intern_str(&m.text)?;
            write_u32(&mut f, endianness, m.driver_id).at(&p)?;
            write_u16(&mut f, endianness, m.index).at(&p)?;
            write_u32(&mut f, endianness, text_offset).at(&p)?;
        }
        Ok(())
    }

    fn write_message_files(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("message-files.zudi-index")?;
        header.message_files_offset = Self::tell(&f, &p)?;
        for m in &lists.message_files {
            let name_offset = strings.intern_str(&m.file_name)?;
            write_u32(&mut f, endianness, m.driver_id).at(&p)?;
            write_u16(&mut f, endianness, m.index).at(&p)?;
            write_u32(&mut f, endianness, name_offset).at(&p)?;
        }
        Ok(())
    }

    fn write_readable_files(
        &self,
        header: &mut DriverHeader,
        lists: &SideLists,
        strings: &mut StringPool,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let (mut f, p) = self.open_append("readable-files.zudi-index")?;
        header.readable_files_offset = Self::tell(&f, &p)?;
        for m in &lists.readable_files {
            let name_offset = strings.intern_str(&m.file_name)?;
            write_u32(&mut f, endianness, m.driver_id).at(&p)?;
            write_u16(&mut f, endianness, m.index).at(&p)?;
            write_u32(&mut f, endianness, name_offset).at(&p)?;
        }
        Ok(())
    }

    /// Appends the now-complete driver header as the final step of
    /// the write sequence, then bumps the index's record count — the
    /// one permitted non-append mutation in the whole format.
    fn write_driver_header(
        &self,
        header: &DriverHeader,
        lists: &SideLists,
        endianness: Endianness,
    ) -> Result<(), WriteError> {
        let p = self.dir.join("drivers.zudi-index");
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .at(&p)?;

        write_u32(&mut f, endianness, header.id).at(&p)?;
        write_u32(&mut f, endianness, header.kind as u32).at(&p)?;
        write_u16(&mut f, endianness, header.name_index as u16).at(&p)?;
        write_u16(&mut f, endianness, header.supplier_index as u16).at(&p)?;
        write_u16(&mut f, endianness, header.contact_index as u16).at(&p)?;
        write_u16(&mut f, endianness, header.category_index as u16).at(&p)?;
        write_fixed_str(&mut f, &header.short_name, SHORTNAME_MAXLEN).at(&p)?;
        write_fixed_str(&mut f, &header.release_string, RELEASE_MAXLEN).at(&p)?;
        write_u32(&mut f, endianness, header.release_string_index).at(&p)?;
        write_u32(&mut f, endianness, header.required_udi_version).at(&p)?;
        write_fixed_str(&mut f, &header.base_path, BASEPATH_MAXLEN).at(&p)?;

        for count in [
            header.metalanguages.len(),
            header.child_bops.len(),
            header.parent_bops.len(),
            header.internal_bops.len(),
            header.modules.len(),
            header.requirements.len(),
            lists.messages.len(),
            lists.disaster_messages.len(),
            lists.message_files.len(),
            lists.readable_files.len(),
            lists.regions.len(),
            lists.devices.len(),
            lists.ranks.len(),
            lists.provisions.len(),
        ] {
            write_byte(&mut f, count as u8).at(&p)?;
        }

        for offset in [
            header.data_file_offset,
            header.rank_file_offset,
            header.device_file_offset,
            header.provision_file_offset,
            header.regions_offset,
            header.messages_offset,
            header.disaster_messages_offset,
            header.message_files_offset,
            header.readable_files_offset,
            header.requirements_offset,
            header.metalanguages_offset,
            header.child_bops_offset,
            header.parent_bops_offset,
            header.internal_bops_offset,
            header.modules_offset,
        ] {
            write_u32(&mut f, endianness, offset).at(&p)?;
        }

        IndexHeader::bump_record_count(&p)?;
        Ok(())
    }
}

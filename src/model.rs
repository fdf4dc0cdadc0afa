//! The data model manipulated by the Parser and serialized by the
//! Index Writer (§3).

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::limits::*;

/// `driver::typeE` from the reference format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum DriverKind {
    Driver = 0,
    Metalanguage = 1,
}

/// The aggregate built up by the Parser for a single `udiprops`
/// stream, one per driver. Counts are tracked as plain `usize` here
/// and narrowed to their wire `u8` width only at write time; the
/// narrowing can never overflow because every push path enforces the
/// matching capacity in [`crate::limits`] first.
#[derive(Debug, Clone)]
pub struct DriverHeader {
    pub id: u32,
    pub kind: DriverKind,
    pub short_name: String,
    pub release_string: String,
    pub release_string_index: u32,
    pub name_index: u32,
    pub supplier_index: u32,
    pub contact_index: u32,
    pub category_index: u32,
    pub required_udi_version: u32,
    pub has_requires_udi: bool,
    pub base_path: String,

    pub requirements: Vec<Requirement>,
    pub metalanguages: Vec<Metalanguage>,
    pub child_bops: Vec<ChildBop>,
    pub parent_bops: Vec<ParentBop>,
    pub internal_bops: Vec<InternalBop>,
    pub modules: Vec<Module>,

    // Offsets stamped in by the Index Writer; meaningless until then.
    pub data_file_offset: u32,
    pub rank_file_offset: u32,
    pub device_file_offset: u32,
    pub provision_file_offset: u32,
    pub regions_offset: u32,
    pub messages_offset: u32,
    pub disaster_messages_offset: u32,
    pub message_files_offset: u32,
    pub readable_files_offset: u32,
    pub requirements_offset: u32,
    pub metalanguages_offset: u32,
    pub child_bops_offset: u32,
    pub parent_bops_offset: u32,
    pub internal_bops_offset: u32,
    pub modules_offset: u32,
}

impl DriverHeader {
    pub fn new(id: u32, base_path: String) -> Self {
        DriverHeader {
            id,
            kind: DriverKind::Driver,
            short_name: String::new(),
            release_string: String::new(),
            release_string_index: 0,
            name_index: 0,
            supplier_index: 0,
            contact_index: 0,
            category_index: 0,
            required_udi_version: 0,
            has_requires_udi: false,
            base_path,
            requirements: Vec::new(),
            metalanguages: Vec::new(),
            child_bops: Vec::new(),
            parent_bops: Vec::new(),
            internal_bops: Vec::new(),
            modules: Vec::new(),
            data_file_offset: 0,
            rank_file_offset: 0,
            device_file_offset: 0,
            provision_file_offset: 0,
            regions_offset: 0,
            messages_offset: 0,
            disaster_messages_offset: 0,
            message_files_offset: 0,
            readable_files_offset: 0,
            requirements_offset: 0,
            metalanguages_offset: 0,
            child_bops_offset: 0,
            parent_bops_offset: 0,
            internal_bops_offset: 0,
            modules_offset: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Requirement {
    pub version: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Metalanguage {
    pub index: u16,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ChildBop {
    pub meta_index: u16,
    pub region_index: u16,
    pub ops_index: u16,
}

#[derive(Debug, Clone)]
pub struct ParentBop {
    pub meta_index: u16,
    pub region_index: u16,
    pub ops_index: u16,
    pub bind_cb_index: u16,
}

#[derive(Debug, Clone)]
pub struct InternalBop {
    pub meta_index: u16,
    pub region_index: u16,
    pub ops_index0: u16,
    pub ops_index1: u16,
    pub bind_cb_index: u16,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub index: u16,
    pub file_name: String,
}

/// `regionPrioE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum RegionPriority {
    Low = 0,
    Medium = 1,
    High = 2,
}

/// `regionLatencyE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum RegionLatency {
    NonCritical = 0,
    NonOverrunning = 1,
    Retriable = 2,
    Overrunning = 3,
    PowerfailWarned = 4,
}

bitflags! {
    /// `ZUDI_REGION_FLAGS_*`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegionFlags: u32 {
        const FP = 1 << 0;
        const DYNAMIC = 1 << 1;
        const INTERRUPT = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct RegionRecord {
    pub driver_id: u32,
    pub index: u16,
    pub module_index: u16,
    pub priority: RegionPriority,
    pub latency: RegionLatency,
    pub flags: RegionFlags,
}

/// `device::attrTypeE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum AttrType {
    String = 0,
    Ubit32 = 1,
    Bool = 2,
    Array8 = 3,
}

#[derive(Debug, Clone)]
pub enum AttrValue {
    String(String),
    Ubit32(u32),
    Bool(bool),
    Array8(Vec<u8>),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::String(_) => AttrType::String,
            AttrValue::Ubit32(_) => AttrType::Ubit32,
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Array8(_) => AttrType::Array8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceAttribute {
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone)]
pub struct DeviceRecord {
    pub driver_id: u32,
    pub index: u16,
    pub message_index: u16,
    pub meta_index: u16,
    pub attributes: Vec<DeviceAttribute>,
}

impl DeviceRecord {
    pub fn push_attribute(&mut self, attr: DeviceAttribute) -> Result<(), ()> {
        if self.attributes.len() >= MAX_DEVICE_ATTRS {
            return Err(());
        }
        self.attributes.push(attr);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub driver_id: u32,
    pub index: u16,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DisasterMessageRecord {
    pub driver_id: u32,
    pub index: u16,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct MessageFileRecord {
    pub driver_id: u32,
    pub index: u16,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct ReadableFileRecord {
    pub driver_id: u32,
    pub index: u16,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct RankAttribute {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RankRecord {
    pub driver_id: u32,
    pub rank: u8,
    pub attributes: Vec<RankAttribute>,
}

impl RankRecord {
    pub fn push_attribute(&mut self, attr: RankAttribute) -> Result<(), ()> {
        if self.attributes.len() >= MAX_RANK_ATTRS {
            return Err(());
        }
        self.attributes.push(attr);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionRecord {
    pub driver_id: u32,
    pub version: u32,
    pub name: String,
}

/// Every record kind accumulated alongside a [`DriverHeader`] while
/// parsing a single `udiprops` stream. Kept as one struct (rather than
/// loose locals in `Session`) so it can be created empty, appended to,
/// and handed whole to the Index Writer.
#[derive(Debug, Clone, Default)]
pub struct SideLists {
    pub regions: Vec<RegionRecord>,
    pub devices: Vec<DeviceRecord>,
    pub messages: Vec<MessageRecord>,
    pub disaster_messages: Vec<DisasterMessageRecord>,
    pub message_files: Vec<MessageFileRecord>,
    pub readable_files: Vec<ReadableFileRecord>,
    pub ranks: Vec<RankRecord>,
    pub provisions: Vec<ProvisionRecord>,
}

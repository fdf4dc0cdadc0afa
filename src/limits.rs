//! Size and capacity limits carried over from the UDI `udiprops` wire
//! format. These are not tunable: they are baked into the on-disk
//! record layouts and into the reference parser's own validation.

/// Maximum length, in bytes, of a folded logical line (§4.1).
pub const MAX_LOGICAL_LINE: usize = 512;

/// Maximum length of a message or disaster-message body, NUL excluded.
pub const MESSAGE_MAXLEN: usize = 150;

/// Maximum length of a module/message-file/readable-file filename.
pub const FILENAME_MAXLEN: usize = 64;

/// Maximum length of a driver's `shortname`.
pub const SHORTNAME_MAXLEN: usize = 16;

/// Maximum length of a driver's `release` string.
pub const RELEASE_MAXLEN: usize = 32;

/// Maximum length of a caller-supplied `basePath`.
pub const BASEPATH_MAXLEN: usize = 128;

/// Maximum length of a metalanguage/requirement name.
pub const METALANGUAGE_MAXLEN: usize = 32;

/// Maximum length of a provision name.
pub const PROVISION_NAME_MAXLEN: usize = METALANGUAGE_MAXLEN;

/// Maximum length of a device or rank attribute name.
pub const ATTR_NAMELEN: usize = 32;

/// Maximum length of a STRING-typed device attribute value.
pub const ATTR_STRING_MAXLEN: usize = 64;

/// Maximum number of hex characters in an ARRAY8-typed attribute value
/// (so at most 32 decoded bytes).
pub const ATTR_ARRAY_HEXLEN: usize = 64;

pub const MAX_REQUIREMENTS: usize = 16;
pub const MAX_METALANGUAGES: usize = 16;
pub const MAX_CHILD_BOPS: usize = 12;
pub const MAX_PARENT_BOPS: usize = 8;
pub const MAX_INTERNAL_BOPS: usize = 24;
pub const MAX_MODULES: usize = 16;

pub const MAX_DEVICE_ATTRS: usize = 20;
pub const MAX_RANK_ATTRS: usize = MAX_DEVICE_ATTRS;

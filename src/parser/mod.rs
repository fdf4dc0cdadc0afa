//! Parser / Driver Assembler (§4.2): keyword classification and
//! per-statement validation against a single in-memory driver
//! aggregate.

pub mod device;
pub mod fields;
pub mod region;

use log::{debug, trace};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::limits::*;
use crate::model::{
    ChildBop, DisasterMessageRecord, DriverHeader, InternalBop, MessageFileRecord, MessageRecord,
    Metalanguage, Module, ParentBop, ReadableFileRecord, Requirement, SideLists,
};
use fields::{next_token, parse_decimal, parse_hex};

/// The tagged result of one `parse_line` call (§4.2's result-code
/// table). `Module` is never produced today: the reference
/// implementation's own dispatch table routes the `module` keyword to
/// the same result kind as every other header-mutating statement
/// (`Driver`), even though its result-type definition carries a
/// distinct `LT_MODULE` discriminant. It is kept here for fidelity to
/// that full tag set and reserved for a future dedicated
/// module-listing statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ParseOutcome {
    Unknown = 0,
    Invalid = 1,
    Overflow = 2,
    LimitExceeded = 3,
    Misc = 4,
    Driver = 5,
    Module = 6,
    Region = 7,
    Device = 8,
    Message = 9,
    DisasterMessage = 10,
    MessageFile = 11,
    ChildBops = 12,
    ParentBops = 13,
    InternalBops = 14,
    Metalanguage = 15,
    ReadableFile = 16,
}

impl ParseOutcome {
    /// Whether this result aborts ingestion of the current driver
    /// (§4.2: "Any of the first four are 'bad'").
    pub fn is_bad(self) -> bool {
        matches!(
            self,
            ParseOutcome::Unknown
                | ParseOutcome::Invalid
                | ParseOutcome::Overflow
                | ParseOutcome::LimitExceeded
        )
    }
}

/// Strips a leading keyword from `text` if present, requiring a word
/// boundary (whitespace or end-of-string) right after it, and returns
/// the (whitespace-trimmed) remainder. This is the Rust analogue of
/// the reference parser's `strncmp(line, keyword, strlen(keyword))`
/// checks.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c == ' ' || c == '\t' => Some(rest.trim_start_matches([' ', '\t'])),
        _ => None,
    }
}

/// Classifies and dispatches one logical line against `header` and
/// `lists`, mutating either as appropriate. `line_no` is only used for
/// diagnostics.
pub fn parse_line(
    header: &mut DriverHeader,
    lists: &mut SideLists,
    line_no: u64,
    text: &str,
) -> ParseOutcome {
    let outcome = dispatch(header, lists, text);

    if outcome.is_bad() {
        debug!("line {line_no}: rejected ({outcome:?}): {text:?}");
    } else {
        trace!("line {line_no}: accepted ({outcome:?}): {text:?}");
    }
    outcome
}

fn dispatch(header: &mut DriverHeader, lists: &mut SideLists, text: &str) -> ParseOutcome {
    // `message_file` must be checked before `message` (longer, more
    // specific prefix first).
    if let Some(rest) = strip_keyword(text, "message_file") {
        return parse_message_file(header, lists, rest);
    }
    if let Some(rest) = strip_keyword(text, "message") {
        return parse_message(header, lists, rest);
    }
    if let Some(rest) = strip_keyword(text, "disaster_message") {
        return parse_disaster_message(header, lists, rest);
    }
    if let Some(rest) = strip_keyword(text, "readable_file") {
        return parse_readable_file(header, lists, rest);
    }
    if let Some(rest) = strip_keyword(text, "meta") {
        return parse_meta(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "device") {
        return parse_device_stmt(header, lists, rest);
    }
    if let Some(rest) = strip_keyword(text, "requires") {
        return parse_requires(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "internal_bind_ops") {
        return parse_internal_bops(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "parent_bind_ops") {
        return parse_parent_bops(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "child_bind_ops") {
        return parse_child_bops(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "region") {
        return parse_region_stmt(header, lists, rest);
    }
    if let Some(rest) = strip_keyword(text, "module") {
        return parse_module(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "shortname") {
        return parse_shortname(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "release") {
        return parse_release(header, rest);
    }
    if let Some(rest) = strip_keyword(text, "name") {
        return parse_index_field(rest, |h, v| h.name_index = v, header);
    }
    if let Some(rest) = strip_keyword(text, "contact") {
        return parse_index_field(rest, |h, v| h.contact_index = v, header);
    }
    if let Some(rest) = strip_keyword(text, "supplier") {
        return parse_index_field(rest, |h, v| h.supplier_index = v, header);
    }
    for misc in [
        "properties_version",
        "pio_serialization_limit",
        "compile_options",
        "source_files",
        "source_requires",
        "multi_parent",
        "enumerates",
        "locale",
        "custom",
    ] {
        if strip_keyword(text, misc).is_some() {
            return ParseOutcome::Misc;
        }
    }

    ParseOutcome::Unknown
}

fn parse_index_field(
    rest: &str,
    set: impl FnOnce(&mut DriverHeader, u32),
    header: &mut DriverHeader,
) -> ParseOutcome {
    let Some((tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((value, _)) = parse_decimal(tok) else {
        return ParseOutcome::Invalid;
    };
    if value == 0 {
        return ParseOutcome::Invalid;
    }
    set(header, value);
    ParseOutcome::Driver
}

fn parse_shortname(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    let Some((tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    if tok.len() >= SHORTNAME_MAXLEN {
        return ParseOutcome::Invalid;
    }
    header.short_name = tok.to_string();
    ParseOutcome::Driver
}

fn parse_release(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    let Some((idx_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((index, _)) = parse_decimal(idx_tok) else {
        return ParseOutcome::Invalid;
    };
    if index == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((name_tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    if name_tok.len() >= RELEASE_MAXLEN {
        return ParseOutcome::Invalid;
    }
    header.release_string_index = index;
    header.release_string = name_tok.to_string();
    ParseOutcome::Driver
}

fn parse_requires(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    if header.requirements.len() >= MAX_REQUIREMENTS {
        return ParseOutcome::LimitExceeded;
    }
    let Some((name_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    if name_tok.len() >= METALANGUAGE_MAXLEN {
        return ParseOutcome::Invalid;
    }
    let Some((version_tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((version, _)) = parse_hex(version_tok) else {
        return ParseOutcome::Invalid;
    };

    if name_tok == "udi" {
        header.has_requires_udi = true;
        header.required_udi_version = version;
        return ParseOutcome::Driver;
    }

    header.requirements.push(Requirement {
        version,
        name: name_tok.to_string(),
    });
    ParseOutcome::Driver
}

fn parse_meta(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    if header.metalanguages.len() >= MAX_METALANGUAGES {
        return ParseOutcome::LimitExceeded;
    }
    let Some((idx_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((index, _)) = parse_decimal(idx_tok) else {
        return ParseOutcome::Invalid;
    };
    if index == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((name_tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    if name_tok.len() >= METALANGUAGE_MAXLEN {
        return ParseOutcome::Invalid;
    }
    header.metalanguages.push(Metalanguage {
        index: index as u16,
        name: name_tok.to_string(),
    });
    ParseOutcome::Metalanguage
}

fn parse_module(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    if header.modules.len() >= MAX_MODULES {
        return ParseOutcome::LimitExceeded;
    }
    let Some((tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    if tok.len() >= FILENAME_MAXLEN {
        return ParseOutcome::Invalid;
    }
    let index = header.modules.len() as u16;
    header.modules.push(Module {
        index,
        file_name: tok.to_string(),
    });
    ParseOutcome::Driver
}

fn parse_child_bops(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    if header.child_bops.len() >= MAX_CHILD_BOPS {
        return ParseOutcome::LimitExceeded;
    }
    let Some((meta_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((meta_index, _)) = parse_decimal(meta_tok) else {
        return ParseOutcome::Invalid;
    };
    if meta_index == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((region_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((region_index, _)) = parse_decimal(region_tok) else {
        return ParseOutcome::Invalid;
    };
    let Some((ops_tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((ops_index, _)) = parse_decimal(ops_tok) else {
        return ParseOutcome::Invalid;
    };
    if ops_index == 0 {
        return ParseOutcome::Invalid;
    }
    header.child_bops.push(ChildBop {
        meta_index: meta_index as u16,
        region_index: region_index as u16,
        ops_index: ops_index as u16,
    });
    ParseOutcome::ChildBops
}

fn parse_parent_bops(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    if header.parent_bops.len() >= MAX_PARENT_BOPS {
        return ParseOutcome::LimitExceeded;
    }
    let Some((meta_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((meta_index, _)) = parse_decimal(meta_tok) else {
        return ParseOutcome::Invalid;
    };
    if meta_index == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((region_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((region_index, rest)) = parse_decimal(region_tok) else {
        return ParseOutcome::Invalid;
    };
    let Some((ops_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((ops_index, _)) = parse_decimal(ops_tok) else {
        return ParseOutcome::Invalid;
    };
    if ops_index == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((bind_tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((bind_cb_index, _)) = parse_decimal(bind_tok) else {
        return ParseOutcome::Invalid;
    };
    header.parent_bops.push(ParentBop {
        meta_index: meta_index as u16,
        region_index: region_index as u16,
        ops_index: ops_index as u16,
        bind_cb_index: bind_cb_index as u16,
    });
    ParseOutcome::ParentBops
}

fn parse_internal_bops(header: &mut DriverHeader, rest: &str) -> ParseOutcome {
    if header.internal_bops.len() >= MAX_INTERNAL_BOPS {
        return ParseOutcome::LimitExceeded;
    }
    let Some((meta_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((meta_index, _)) = parse_decimal(meta_tok) else {
        return ParseOutcome::Invalid;
    };
    if meta_index == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((region_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((region_index, _)) = parse_decimal(region_tok) else {
        return ParseOutcome::Invalid;
    };
    if region_index == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((ops0_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((ops_index0, _)) = parse_decimal(ops0_tok) else {
        return ParseOutcome::Invalid;
    };
    if ops_index0 == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((ops1_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((ops_index1, _)) = parse_decimal(ops1_tok) else {
        return ParseOutcome::Invalid;
    };
    if ops_index1 == 0 {
        return ParseOutcome::Invalid;
    }
    let Some((bind_tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((bind_cb_index, _)) = parse_decimal(bind_tok) else {
        return ParseOutcome::Invalid;
    };
    header.internal_bops.push(InternalBop {
        meta_index: meta_index as u16,
        region_index: region_index as u16,
        ops_index0: ops_index0 as u16,
        ops_index1: ops_index1 as u16,
        bind_cb_index: bind_cb_index as u16,
    });
    ParseOutcome::InternalBops
}

fn parse_message(header: &mut DriverHeader, lists: &mut SideLists, rest: &str) -> ParseOutcome {
    let Some((idx_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((index, _)) = parse_decimal(idx_tok) else {
        return ParseOutcome::Invalid;
    };
    if index == 0 {
        return ParseOutcome::Invalid;
    }
    let text = rest.trim_start_matches([' ', '\t']);
    if text.len() >= MESSAGE_MAXLEN {
        return ParseOutcome::Invalid;
    }
    lists.messages.push(MessageRecord {
        driver_id: header.id,
        index: index as u16,
        text: text.to_string(),
    });
    ParseOutcome::Message
}

fn parse_disaster_message(
    header: &mut DriverHeader,
    lists: &mut SideLists,
    rest: &str,
) -> ParseOutcome {
    let Some((idx_tok, rest)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    let Some((index, _)) = parse_decimal(idx_tok) else {
        return ParseOutcome::Invalid;
    };
    if index == 0 {
        return ParseOutcome::Invalid;
    }
    let text = rest.trim_start_matches([' ', '\t']);
    if text.len() >= MESSAGE_MAXLEN {
        return ParseOutcome::Invalid;
    }
    lists.disaster_messages.push(DisasterMessageRecord {
        driver_id: header.id,
        index: index as u16,
        text: text.to_string(),
    });
    ParseOutcome::DisasterMessage
}

fn parse_message_file(
    header: &mut DriverHeader,
    lists: &mut SideLists,
    rest: &str,
) -> ParseOutcome {
    let Some((tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    if tok.len() >= FILENAME_MAXLEN || tok.contains('/') {
        return ParseOutcome::Invalid;
    }
    let index = lists.message_files.len() as u16;
    lists.message_files.push(MessageFileRecord {
        driver_id: header.id,
        index,
        file_name: tok.to_string(),
    });
    ParseOutcome::MessageFile
}

fn parse_readable_file(
    header: &mut DriverHeader,
    lists: &mut SideLists,
    rest: &str,
) -> ParseOutcome {
    let Some((tok, _)) = next_token(rest) else {
        return ParseOutcome::Invalid;
    };
    if tok.len() >= FILENAME_MAXLEN || tok.contains('/') {
        return ParseOutcome::Invalid;
    }
    let index = lists.readable_files.len() as u16;
    lists.readable_files.push(ReadableFileRecord {
        driver_id: header.id,
        index,
        file_name: tok.to_string(),
    });
    ParseOutcome::ReadableFile
}

fn parse_region_stmt(header: &mut DriverHeader, lists: &mut SideLists, rest: &str) -> ParseOutcome {
    if header.modules.is_empty() {
        return ParseOutcome::Invalid;
    }
    let module_index = (header.modules.len() - 1) as u16;
    match region::parse_region(header.id, module_index, rest) {
        Some(record) => {
            lists.regions.push(record);
            ParseOutcome::Region
        }
        None => ParseOutcome::Invalid,
    }
}

fn parse_device_stmt(header: &mut DriverHeader, lists: &mut SideLists, rest: &str) -> ParseOutcome {
    let index = lists.devices.len() as u16;
    match device::parse_device(header.id, index, rest) {
        Some(record) => {
            lists.devices.push(record);
            ParseOutcome::Device
        }
        None => ParseOutcome::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (DriverHeader, SideLists) {
        (DriverHeader::new(1, String::new()), SideLists::default())
    }

    #[test]
    fn message_file_checked_before_message() {
        let (mut h, mut l) = fresh();
        let outcome = parse_line(&mut h, &mut l, 1, "message_file foo.txt");
        assert_eq!(outcome, ParseOutcome::MessageFile);
        assert_eq!(l.message_files.len(), 1);
        assert_eq!(l.messages.len(), 0);
    }

    #[test]
    fn requires_udi_sets_flag_without_requirement_entry() {
        let (mut h, mut l) = fresh();
        let outcome = parse_line(&mut h, &mut l, 1, "requires udi 0x101");
        assert_eq!(outcome, ParseOutcome::Driver);
        assert!(h.has_requires_udi);
        assert_eq!(h.required_udi_version, 0x101);
        assert_eq!(h.requirements.len(), 0);
    }

    #[test]
    fn requires_other_adds_requirement() {
        let (mut h, mut l) = fresh();
        parse_line(&mut h, &mut l, 1, "requires foo 0x1");
        assert_eq!(h.requirements.len(), 1);
        assert_eq!(h.requirements[0].version, 1);
        assert_eq!(h.requirements[0].name, "foo");
    }

    #[test]
    fn requirements_limit_exceeded_on_seventeenth() {
        let (mut h, mut l) = fresh();
        for _ in 0..16 {
            let outcome = parse_line(&mut h, &mut l, 1, "requires foo 0x1");
            assert_eq!(outcome, ParseOutcome::Driver);
        }
        let outcome = parse_line(&mut h, &mut l, 1, "requires foo 0x1");
        assert_eq!(outcome, ParseOutcome::LimitExceeded);
        assert_eq!(h.requirements.len(), 16);
    }

    #[test]
    fn shortname_boundary() {
        let (mut h, mut l) = fresh();
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "shortname 123456789012345"),
            ParseOutcome::Driver
        );
        assert_eq!(h.short_name.len(), 15);

        let (mut h, mut l) = fresh();
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "shortname 1234567890123456"),
            ParseOutcome::Invalid
        );
    }

    #[test]
    fn message_index_zero_rejected_one_accepted() {
        let (mut h, mut l) = fresh();
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "message 0 hi"),
            ParseOutcome::Invalid
        );
        assert_eq!(
            parse_line(&mut h, &mut l, 2, "message 1 hi"),
            ParseOutcome::Message
        );
    }

    #[test]
    fn message_text_length_boundary() {
        let (mut h, mut l) = fresh();
        let text149 = "a".repeat(149);
        let text150 = "a".repeat(150);
        assert_eq!(
            parse_line(&mut h, &mut l, 1, &format!("message 1 {text149}")),
            ParseOutcome::Message
        );
        assert_eq!(
            parse_line(&mut h, &mut l, 2, &format!("message 2 {text150}")),
            ParseOutcome::Invalid
        );
    }

    #[test]
    fn region_without_prior_module_rejected() {
        let (mut h, mut l) = fresh();
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "region 0 type normal"),
            ParseOutcome::Invalid
        );
    }

    #[test]
    fn region_after_module_uses_last_module_index() {
        let (mut h, mut l) = fresh();
        parse_line(&mut h, &mut l, 1, "module foo.so");
        parse_line(&mut h, &mut l, 2, "module bar.so");
        parse_line(&mut h, &mut l, 3, "region 0 type normal");
        assert_eq!(l.regions[0].module_index, 1);
    }

    #[test]
    fn misc_statements_ignored() {
        let (mut h, mut l) = fresh();
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "properties_version 0x101"),
            ParseOutcome::Misc
        );
    }

    #[test]
    fn unknown_keyword() {
        let (mut h, mut l) = fresh();
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "nonsense foo"),
            ParseOutcome::Unknown
        );
    }

    #[test]
    fn bops_use_their_own_capacity_counters() {
        let (mut h, mut l) = fresh();
        for _ in 0..8 {
            assert_eq!(
                parse_line(&mut h, &mut l, 1, "parent_bind_ops 1 0 1 0"),
                ParseOutcome::ParentBops
            );
        }
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "parent_bind_ops 1 0 1 0"),
            ParseOutcome::LimitExceeded
        );
        // child_bind_ops has its own, separate counter and is
        // unaffected by parent_bind_ops having filled up.
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "child_bind_ops 1 0 1"),
            ParseOutcome::ChildBops
        );
    }

    #[test]
    fn internal_bops_reject_zero_region_or_ops() {
        let (mut h, mut l) = fresh();
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "internal_bind_ops 1 0 1 1 0"),
            ParseOutcome::Invalid
        );
        assert_eq!(
            parse_line(&mut h, &mut l, 1, "internal_bind_ops 1 1 1 1 0"),
            ParseOutcome::InternalBops
        );
    }
}

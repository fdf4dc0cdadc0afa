//! `device` statement parsing: header fields plus the attribute
//! clause loop (§4.2).

use log::trace;

use crate::limits::*;
use crate::model::{AttrValue, DeviceAttribute, DeviceRecord};
use crate::parser::fields::{next_token, parse_decimal, parse_uint_base0};

/// Parses `<messageIndex> <metaIndex> [<name> <type> <value…>]*`,
/// given the already-captured device index and driver id.
pub fn parse_device(
    driver_id: u32,
    index: u16,
    rest: &str,
) -> Option<DeviceRecord> {
    let (msg_tok, rest) = next_token(rest)?;
    let (message_index, _) = parse_decimal(msg_tok)?;
    if message_index == 0 {
        return None;
    }

    let (meta_tok, mut rest) = next_token(rest)?;
    let (meta_index, _) = parse_decimal(meta_tok)?;
    if meta_index == 0 {
        return None;
    }

    let mut record = DeviceRecord {
        driver_id,
        index,
        message_index: message_index as u16,
        meta_index: meta_index as u16,
        attributes: Vec::new(),
    };

    while let Some((name_tok, after_name)) = next_token(rest) {
        if name_tok.len() >= ATTR_NAMELEN {
            return None;
        }
        let (type_tok, after_type) = next_token(after_name)?;
        let (value, after_value) = parse_attribute_value(type_tok, after_type)?;
        trace!(
            "device[{}]: attr {} = {:?}",
            index, name_tok, value
        );
        let attr = DeviceAttribute {
            name: name_tok.to_string(),
            value,
        };
        if record.push_attribute(attr).is_err() {
            return None;
        }
        rest = after_value;
    }

    Some(record)
}

fn parse_attribute_value<'a>(type_tok: &str, rest: &'a str) -> Option<(AttrValue, &'a str)> {
    match type_tok {
        "string" => {
            let (tok, after) = next_token(rest)?;
            if tok.len() >= ATTR_STRING_MAXLEN {
                return None;
            }
            Some((AttrValue::String(tok.to_string()), after))
        }
        "ubit32" => {
            let (tok, after) = next_token(rest)?;
            let (value, _) = parse_uint_base0(tok)?;
            Some((AttrValue::Ubit32(value), after))
        }
        "boolean" => {
            let (tok, after) = next_token(rest)?;
            let value = match tok.as_bytes().first() {
                Some(b't') | Some(b'T') => true,
                Some(b'f') | Some(b'F') => false,
                _ => return None,
            };
            Some((AttrValue::Bool(value), after))
        }
        "array" => {
            let (tok, after) = next_token(rest)?;
            let bytes = decode_hex_array(tok)?;
            Some((AttrValue::Array8(bytes), after))
        }
        _ => None,
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Decodes an even-length ASCII hex string into bytes, high-nibble
/// first. Rejects odd length, non-hex characters, and strings longer
/// than [`ATTR_ARRAY_HEXLEN`] hex characters.
fn decode_hex_array(tok: &str) -> Option<Vec<u8>> {
    if tok.len() > ATTR_ARRAY_HEXLEN || tok.len() % 2 != 0 {
        return None;
    }
    let bytes = tok.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let hi = hex_nibble(pair[0])?;
        let lo = hex_nibble(pair[1])?;
        out.push((hi << 4) | lo);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_attribute() {
        let rec = parse_device(1, 0, "1 2 bus_type string pci").unwrap();
        assert_eq!(rec.message_index, 1);
        assert_eq!(rec.meta_index, 2);
        assert_eq!(rec.attributes.len(), 1);
        assert_eq!(rec.attributes[0].name, "bus_type");
        match &rec.attributes[0].value {
            AttrValue::String(s) => assert_eq!(s, "pci"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_array_attribute() {
        let rec = parse_device(1, 0, "1 2 cap array DEADBEEF").unwrap();
        match &rec.attributes[0].value {
            AttrValue::Array8(bytes) => assert_eq!(bytes, &[0xDE, 0xAD, 0xBE, 0xEF]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_odd_length_hex() {
        assert!(parse_device(1, 0, "1 2 cap array ABC").is_none());
    }

    #[test]
    fn rejects_zero_message_or_meta_index() {
        assert!(parse_device(1, 0, "0 2").is_none());
        assert!(parse_device(1, 0, "1 0").is_none());
    }

    #[test]
    fn parses_boolean_and_ubit32() {
        let rec = parse_device(1, 0, "1 2 present boolean t level ubit32 0x10").unwrap();
        match &rec.attributes[0].value {
            AttrValue::Bool(b) => assert!(*b),
            other => panic!("unexpected {other:?}"),
        }
        match &rec.attributes[1].value {
            AttrValue::Ubit32(v) => assert_eq!(*v, 0x10),
            other => panic!("unexpected {other:?}"),
        }
    }
}

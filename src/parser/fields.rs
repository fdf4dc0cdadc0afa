//! Small parsing combinators standing in for the reference
//! implementation's `strtoul`-based field extraction (§9).
//!
//! Every combinator distinguishes "no digits were consumed" from
//! "digits were consumed and the value happens to be zero" — the
//! distinction the source's `line == tmp` checks make and that a bare
//! `.parse().unwrap_or(0)` would lose, wrongly collapsing a malformed
//! field into the legal-zero case for fields where zero is allowed
//! (e.g. bop region indices).

/// Splits `text` into its first whitespace-delimited token and the
/// remainder (with leading whitespace trimmed from the remainder).
/// Returns `None` if `text` is empty after trimming.
pub fn next_token(text: &str) -> Option<(&str, &str)> {
    let trimmed = text.trim_start_matches([' ', '\t']);
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find([' ', '\t']) {
        Some(pos) => {
            let (tok, rest) = trimmed.split_at(pos);
            Some((tok, rest.trim_start_matches([' ', '\t'])))
        }
        None => Some((trimmed, "")),
    }
}

/// Parses a leading base-10 unsigned integer off `text`, returning the
/// value and the unconsumed remainder. Returns `None` if the first
/// token has no leading digit at all (mirrors `strtoul` leaving
/// `endptr == nptr`).
pub fn parse_decimal(text: &str) -> Option<(u32, &str)> {
    parse_radix(text, 10, false)
}

/// Parses a leading base-16 (hex, no `0x` prefix required) unsigned
/// integer, as used by `requires <name> <version-hex>`.
pub fn parse_hex(text: &str) -> Option<(u32, &str)> {
    parse_radix(text, 16, false)
}

/// Parses a leading unsigned integer the way `strtoul(str, &end, 0)`
/// would: a `0x`/`0X` prefix selects hex, a bare leading `0` selects
/// octal, anything else is decimal.
pub fn parse_uint_base0(text: &str) -> Option<(u32, &str)> {
    parse_radix(text, 0, true)
}

fn parse_radix(text: &str, radix: u32, base0: bool) -> Option<(u32, &str)> {
    let trimmed = text.trim_start_matches([' ', '\t']);
    let mut rest = trimmed;
    let mut radix = radix;

    if base0 {
        if let Some(hex) = rest
            .strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
        {
            radix = 16;
            rest = hex;
        } else if rest.starts_with('0') && rest.len() > 1 {
            radix = 8;
            rest = &rest[1..];
        } else {
            radix = 10;
        }
    }

    let digit_len = rest
        .char_indices()
        .take_while(|(_, c)| c.is_digit(radix))
        .count();
    if digit_len == 0 {
        // base0 with a lone "0" still consumed a digit, above, via the
        // octal branch trimming the leading zero; handle that case.
        if base0 && trimmed.starts_with('0') {
            let after = trimmed[1..].trim_start_matches([' ', '\t']);
            return Some((0, after));
        }
        return None;
    }

    let digits = &rest[..digit_len];
    let value = u32::from_str_radix(digits, radix).ok()?;
    let after = rest[digit_len..].trim_start_matches([' ', '\t']);
    Some((value, after))
}

/// Returns the remainder of `text` up to (not including) the next
/// whitespace run, i.e. the rest-of-line token used for filenames and
/// short names.
pub fn token_len_before_whitespace(text: &str) -> usize {
    text.find([' ', '\t']).unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_token_splits_on_whitespace() {
        assert_eq!(next_token("foo bar baz"), Some(("foo", "bar baz")));
        assert_eq!(next_token("   foo"), Some(("foo", "")));
        assert_eq!(next_token(""), None);
        assert_eq!(next_token("   "), None);
    }

    #[test]
    fn parse_decimal_rejects_no_digits() {
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("0 rest"), Some((0, "rest")));
        assert_eq!(parse_decimal("42rest"), Some((42, "rest")));
    }

    #[test]
    fn parse_hex_reads_hex_without_prefix() {
        assert_eq!(parse_hex("101 rest"), Some((0x101, "rest")));
        assert_eq!(parse_hex("ff"), Some((0xff, "")));
    }

    #[test]
    fn parse_uint_base0_handles_prefixes() {
        assert_eq!(parse_uint_base0("0x1A rest"), Some((0x1A, "rest")));
        assert_eq!(parse_uint_base0("010 rest"), Some((8, "rest")));
        assert_eq!(parse_uint_base0("10 rest"), Some((10, "rest")));
        assert_eq!(parse_uint_base0("0"), Some((0, "")));
    }
}

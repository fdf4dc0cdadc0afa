//! `region` statement parsing: index plus attribute-fragment loop
//! (§4.2).

use crate::model::{RegionFlags, RegionLatency, RegionPriority, RegionRecord};
use crate::parser::fields::{next_token, parse_decimal};

/// Parses `<index> [type|binding|priority|latency|overrun_time
/// <arg>]*`, given the module index the region attaches to (always
/// `nModules - 1` at the call site).
pub fn parse_region(driver_id: u32, module_index: u16, text: &str) -> Option<RegionRecord> {
    let (index_tok, mut rest) = next_token(text)?;
    let (index, _) = parse_decimal(index_tok)?;

    let mut priority = RegionPriority::Low;
    let mut latency = RegionLatency::NonCritical;
    let mut flags = RegionFlags::empty();

    while let Some((keyword, after_keyword)) = next_token(rest) {
        let (arg, after_arg) = next_token(after_keyword)?;
        match keyword {
            "type" => match arg {
                "normal" => {}
                "fp" => flags |= RegionFlags::FP,
                "interrupt" => flags |= RegionFlags::INTERRUPT,
                _ => return None,
            },
            "binding" => match arg {
                "static" => {}
                "dynamic" => flags |= RegionFlags::DYNAMIC,
                _ => return None,
            },
            "priority" => match arg {
                "lo" => priority = RegionPriority::Low,
                "med" => priority = RegionPriority::Medium,
                "hi" => priority = RegionPriority::High,
                _ => return None,
            },
            // Accepted and silently ignored, matching the reference
            // parser's own behavior for these two keywords.
            "latency" | "overrun_time" => {}
            _ => return None,
        }
        rest = after_arg;
    }

    Some(RegionRecord {
        driver_id,
        index: index as u16,
        module_index,
        priority,
        latency,
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_normal_region_with_priority() {
        let r = parse_region(1, 0, "0 type normal priority med").unwrap();
        assert_eq!(r.index, 0);
        assert_eq!(r.module_index, 0);
        assert_eq!(r.priority, RegionPriority::Medium);
        assert!(r.flags.is_empty());
    }

    #[test]
    fn sets_fp_and_dynamic_flags() {
        let r = parse_region(1, 0, "2 type fp binding dynamic").unwrap();
        assert!(r.flags.contains(RegionFlags::FP));
        assert!(r.flags.contains(RegionFlags::DYNAMIC));
    }

    #[test]
    fn ignores_latency_and_overrun_time() {
        let r = parse_region(1, 0, "1 latency 3 overrun_time 10").unwrap();
        assert_eq!(r.index, 1);
        assert!(r.flags.is_empty());
    }

    #[test]
    fn rejects_unknown_attribute() {
        assert!(parse_region(1, 0, "0 bogus xyz").is_none());
    }

    #[test]
    fn zero_region_index_is_valid() {
        assert!(parse_region(1, 0, "0").is_some());
    }
}

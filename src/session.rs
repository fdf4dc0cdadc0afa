//! [`Session`]: the owned replacement for the reference
//! implementation's process-wide current-driver-pointer and
//! side-list globals (§9).

use std::path::Path;

use crate::error::{IndexError, ParseError};
use crate::index::{Endianness, IndexWriter};
use crate::limits::BASEPATH_MAXLEN;
use crate::model::{DriverHeader, ProvisionRecord, RankRecord, SideLists};
use crate::parser::{self, ParseOutcome};

enum SessionState {
    Uninitialized,
    Accumulating {
        header: DriverHeader,
        lists: SideLists,
    },
    Sealed,
}

/// Drives one driver's worth of `udiprops` ingestion at a time.
///
/// A `Session` has exactly the three states described in §4.2:
/// uninitialized, accumulating, and sealed (write resets it back to
/// uninitialized-equivalent behavior). Calling `parse_line` outside
/// the accumulating state is a programming error surfaced as
/// `ParseError::NotInitialized` rather than silently discarding the
/// line.
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Session {
            state: SessionState::Uninitialized,
        }
    }

    /// Allocates a fresh driver aggregate, dropping any previous
    /// state (`initialize` always fully replaces the current driver,
    /// matching §3's lifecycle note).
    pub fn initialize(&mut self, driver_id: u32, base_path: &str) -> Result<(), ParseError> {
        if base_path.len() >= BASEPATH_MAXLEN {
            return Err(ParseError::Overflow {
                line: 0,
                field: "basePath",
            });
        }
        self.state = SessionState::Accumulating {
            header: DriverHeader::new(driver_id, base_path.to_string()),
            lists: SideLists::default(),
        };
        Ok(())
    }

    /// Borrows the current driver aggregate, if any.
    pub fn current(&self) -> Option<&DriverHeader> {
        match &self.state {
            SessionState::Accumulating { header, .. } => Some(header),
            _ => None,
        }
    }

    /// Classifies and dispatches one logical line against the current
    /// driver. Returns `ParseOutcome::Invalid` (not a panic) if the
    /// session has no current driver, since a bad call here should be
    /// diagnosable the same way a bad statement is.
    pub fn parse_line(&mut self, line_no: u64, text: &str) -> ParseOutcome {
        match &mut self.state {
            SessionState::Accumulating { header, lists } => {
                parser::parse_line(header, lists, line_no, text)
            }
            _ => ParseOutcome::Invalid,
        }
    }

    /// Appends a rank record directly (§3: no statement grammar
    /// populates ranks in the reference source; this is the only
    /// entry point).
    pub fn push_rank(&mut self, rank: RankRecord) -> Result<(), ParseError> {
        match &mut self.state {
            SessionState::Accumulating { lists, .. } => {
                lists.ranks.push(rank);
                Ok(())
            }
            _ => Err(ParseError::NotInitialized),
        }
    }

    /// Appends a provision record directly (§3: same reasoning as
    /// [`Session::push_rank`]).
    pub fn push_provision(&mut self, provision: ProvisionRecord) -> Result<(), ParseError> {
        match &mut self.state {
            SessionState::Accumulating { lists, .. } => {
                lists.provisions.push(provision);
                Ok(())
            }
            _ => Err(ParseError::NotInitialized),
        }
    }

    /// Runs the full §4.3 write sequence against `index_dir`,
    /// enforces the `hasRequiresUdi` end-of-file check from §7, and
    /// transitions the session to sealed.
    pub fn write(&mut self, index_dir: &Path, endianness: Endianness) -> Result<(), IndexError> {
        let (header, lists) = match std::mem::replace(&mut self.state, SessionState::Sealed) {
            SessionState::Accumulating { header, lists } => (header, lists),
            SessionState::Sealed => return Err(IndexError::NotInitialized),
            SessionState::Uninitialized => return Err(IndexError::NotInitialized),
        };

        if !header.has_requires_udi {
            return Err(IndexError::NoRequiresUdi {
                driver_id: header.id,
            });
        }

        let writer = IndexWriter::new(index_dir);
        writer.write_driver(header, lists, endianness)?;
        Ok(())
    }

    /// Discards the current driver without writing it, returning the
    /// session to the uninitialized state.
    pub fn release(mut self) -> Session {
        self.state = SessionState::Uninitialized;
        self
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_before_initialize_is_invalid() {
        let mut session = Session::new();
        assert_eq!(session.parse_line(1, "shortname x"), ParseOutcome::Invalid);
    }

    #[test]
    fn initialize_resets_previous_driver() {
        let mut session = Session::new();
        session.initialize(1, "/drivers/foo").unwrap();
        session.parse_line(1, "shortname foo");
        session.initialize(2, "/drivers/bar").unwrap();
        assert_eq!(session.current().unwrap().short_name, "");
        assert_eq!(session.current().unwrap().id, 2);
    }

    #[test]
    fn base_path_overflow_rejected() {
        let mut session = Session::new();
        let long = "/".repeat(200);
        assert!(session.initialize(1, &long).is_err());
    }
}

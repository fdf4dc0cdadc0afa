//! Compiler for UDI `udiprops` driver-metadata files into an
//! append-only binary index.
//!
//! # Pipeline
//! * [`LineReader`] folds a `udiprops` stream into logical lines,
//!   collapsing backslash continuations and stripping comments.
//! * [`parser`] classifies each logical line into a statement and
//!   accumulates it into a [`DriverHeader`] plus its side-lists.
//! * [`Session`] owns one driver's worth of that accumulated state at
//!   a time and drives it through to [`index::IndexWriter`], which
//!   serializes it into the on-disk index format.
//!
//! [`ingest_udiprops`] wires the first two stages together for the
//! common case of compiling a whole stream in one call.

pub mod buffer;
pub mod error;
pub mod index;
pub mod limits;
pub mod line_reader;
pub mod model;
pub mod parser;
pub mod session;

use std::io::BufRead;

pub use error::{IndexError, LineError, ParseError, WriteError};
pub use index::{Endianness, IndexWriter};
pub use line_reader::{LineReader, LogicalLine};
pub use model::DriverHeader;
pub use parser::ParseOutcome;
pub use session::Session;

/// Folds `reader` into logical lines and parses each one against
/// `session`. A bad [`ParseOutcome`] (`Unknown`, `Invalid`, `Overflow`
/// or `LimitExceeded`) aborts ingestion of the current driver: a
/// `log::debug!` diagnostic naming the logical line number, kind and
/// raw text is emitted, and this call returns
/// `Err(IndexError::Parse(ParseError::Rejected { .. }))` without
/// consuming any further lines, matching §7's "the driver ingestion is
/// aborted and a diagnostic emitted, but the enclosing process
/// continues to the next driver" — the caller's next driver gets a
/// fresh `Session`. `session`'s already-accumulated state is left as
/// it was at the point of rejection; the caller should not call
/// `Session::write` on it and should `Session::release` it instead.
pub fn ingest_udiprops<R: BufRead>(session: &mut Session, reader: R) -> Result<(), IndexError> {
    let mut lines = LineReader::new(reader);
    while let Some(line) = lines.next_logical_line().map_err(IndexError::Line)? {
        let outcome = session.parse_line(line.number, &line.text);
        if outcome.is_bad() {
            log::debug!(
                "udiprops:{}: {:?} while parsing {:?}",
                line.number,
                outcome,
                line.text
            );
            return Err(IndexError::Parse(ParseError::Rejected {
                line: line.number,
                outcome,
                text: line.text,
            }));
        }
    }
    Ok(())
}

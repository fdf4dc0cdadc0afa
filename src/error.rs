//! Error types for every fallible boundary in the crate.
//!
//! Each layer gets its own enum rather than a single flat error: the
//! Line Reader only ever fails on I/O, the Parser only ever fails on
//! a malformed statement, the Index Writer only ever fails on I/O, and
//! [`IndexError`] aggregates the two plus the end-of-file
//! `requires udi` check that belongs to neither.

use std::fmt;
use thiserror::Error;

use crate::parser::ParseOutcome;

/// Failures from the Line Reader (§4.1). The only hard failure is the
/// underlying byte stream erroring out; over-length segments are a
/// diagnostic, not an error (see [`crate::line_reader`]).
#[derive(Debug, Error)]
pub enum LineError {
    #[error("I/O error reading udiprops stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures from a single statement parser (§4.2).
///
/// These are also carried, tagged, inside [`ParseOutcome`] for calls
/// that "fail" without aborting the whole ingestion; `ParseError` is
/// the typed form used once an error needs to propagate past a single
/// `parse_line` call (e.g. `Session::initialize`).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: invalid statement: {text:?}")]
    Invalid { line: u64, text: String },

    #[error("line {line}: value for {field} does not fit its field")]
    Overflow { line: u64, field: &'static str },

    #[error("line {line}: {table} table is full")]
    LimitExceeded { line: u64, table: &'static str },

    #[error("line {line}: rejected ({outcome:?}): {text:?}")]
    Rejected {
        line: u64,
        outcome: ParseOutcome,
        text: String,
    },

    #[error("session is not initialized; call Session::initialize first")]
    NotInitialized,
}

impl ParseError {
    /// The tagged [`ParseOutcome`] this error corresponds to, matching
    /// the first four "bad" result kinds of §4.2's result-code enum.
    pub fn outcome(&self) -> ParseOutcome {
        match self {
            ParseError::Invalid { .. } => ParseOutcome::Invalid,
            ParseError::Overflow { .. } => ParseOutcome::Overflow,
            ParseError::LimitExceeded { .. } => ParseOutcome::LimitExceeded,
            ParseError::Rejected { outcome, .. } => *outcome,
            ParseError::NotInitialized => ParseOutcome::Invalid,
        }
    }
}

/// Failures from the Index Writer (§4.3).
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error writing index file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    pub(crate) fn io(path: impl fmt::Display, source: std::io::Error) -> Self {
        WriteError::Io {
            path: path.to_string(),
            source,
        }
    }
}

/// Top-level error returned by [`crate::Session::write`] and
/// [`crate::ingest_udiprops`].
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Line(#[from] LineError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("driver {driver_id} has no `requires udi` statement")]
    NoRequiresUdi { driver_id: u32 },

    #[error("session is not initialized; call Session::initialize first")]
    NotInitialized,
}

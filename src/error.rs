//! Faults raised while loading or running a program.
//!
//! Every fault aborts the run where it is detected. Program counters are
//! always positions in the byte-level [`Program`](crate::Program), whichever
//! engine raised them.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unmatched '[' at pc={pc}")]
    UnmatchedOpen { pc: usize },

    #[error("unmatched ']' at pc={pc}")]
    UnmatchedClose { pc: usize },

    #[error("instruction pointer overflow at pc={pc}")]
    Fetch { pc: usize },

    #[error("instruction '{}' is bad char at offset {offset}", .byte.escape_ascii())]
    InvalidInstruction { byte: u8, offset: usize },

    #[error("data pointer {pointer} is outside the tape at pc={pc}")]
    OutOfBounds { pc: usize, pointer: isize },

    #[error("I/O failure at pc={pc}: {source}")]
    Io {
        pc: usize,
        #[source]
        source: io::Error,
    },

    #[error("step limit of {steps} exceeded")]
    StepLimit { steps: u64 },

    #[error("could not read program source: {0}")]
    Source(#[from] io::Error),
}

impl Error {
    /// The program counter the fault was raised at, if it has one.
    pub fn pc(&self) -> Option<usize> {
        match *self {
            Error::UnmatchedOpen { pc }
            | Error::UnmatchedClose { pc }
            | Error::Fetch { pc }
            | Error::OutOfBounds { pc, .. }
            | Error::Io { pc, .. } => Some(pc),
            Error::InvalidInstruction { .. } | Error::StepLimit { .. } | Error::Source(_) => None,
        }
    }

    /// Rewrite the program counter carried by this fault.
    pub(crate) fn relocate<F>(self, f: F) -> Error
    where
        F: FnOnce(usize) -> usize,
    {
        match self {
            Error::UnmatchedOpen { pc } => Error::UnmatchedOpen { pc: f(pc) },
            Error::UnmatchedClose { pc } => Error::UnmatchedClose { pc: f(pc) },
            Error::Fetch { pc } => Error::Fetch { pc: f(pc) },
            Error::OutOfBounds { pc, pointer } => Error::OutOfBounds { pc: f(pc), pointer },
            Error::Io { pc, source } => Error::Io { pc: f(pc), source },
            other => other,
        }
    }
}

#[test]
fn relocate_moves_pc() {
    let err = Error::OutOfBounds { pc: 2, pointer: -1 }.relocate(|pc| pc * 10);
    assert_eq!(err.pc(), Some(20));
}

#[test]
fn relocate_ignores_faults_without_pc() {
    let err = Error::StepLimit { steps: 5 }.relocate(|_| 99);
    assert_eq!(err.pc(), None);
}

#[test]
fn messages_name_the_position() {
    assert_eq!(
        Error::UnmatchedOpen { pc: 0 }.to_string(),
        "unmatched '[' at pc=0"
    );
    assert_eq!(
        Error::InvalidInstruction {
            byte: b'x',
            offset: 3
        }
        .to_string(),
        "instruction 'x' is bad char at offset 3"
    );
}

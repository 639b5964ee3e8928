//! The byte-level program: the eight BF instructions in source order,
//! with everything else filtered out.

use crate::error::{Error, Result};
use std::convert::TryFrom;
use std::fmt;
use std::io::Read;

#[cfg(test)]
use std::io;

#[cfg(test)]
use pretty_assertions::assert_eq;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Instruction {
    MoveRight,
    MoveLeft,
    Increment,
    Decrement,
    Write,
    Read,
    LoopOpen,
    LoopClose,
}

impl Instruction {
    /// The instruction for a source byte, or `None` for comment text.
    pub fn from_byte(byte: u8) -> Option<Instruction> {
        match byte {
            b'>' => Some(Instruction::MoveRight),
            b'<' => Some(Instruction::MoveLeft),
            b'+' => Some(Instruction::Increment),
            b'-' => Some(Instruction::Decrement),
            b'.' => Some(Instruction::Write),
            b',' => Some(Instruction::Read),
            b'[' => Some(Instruction::LoopOpen),
            b']' => Some(Instruction::LoopClose),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Instruction::MoveRight => '>',
            Instruction::MoveLeft => '<',
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::Write => '.',
            Instruction::Read => ',',
            Instruction::LoopOpen => '[',
            Instruction::LoopClose => ']',
        }
    }
}

impl TryFrom<u8> for Instruction {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Instruction> {
        Instruction::from_byte(byte).ok_or(Error::InvalidInstruction { byte, offset: 0 })
    }
}

/// An immutable sequence of instructions, indexed by program counter.
///
/// Each instruction remembers the byte offset it was read from, so faults
/// can be reported against the original source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    offsets: Vec<usize>,
}

impl Program {
    /// Read a whole byte stream, keeping only the eight instruction symbols.
    ///
    /// End of stream finishes the program, even if nothing was collected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Program> {
        let mut program = Program::default();
        for (offset, byte) in reader.bytes().enumerate() {
            program.push_byte(offset, byte?);
        }
        Ok(program)
    }

    /// Decode a buffer in which every byte must be an instruction.
    pub fn decode(bytes: &[u8]) -> Result<Program> {
        let instructions = bytes
            .iter()
            .enumerate()
            .map(|(offset, &byte)| {
                Instruction::from_byte(byte).ok_or(Error::InvalidInstruction { byte, offset })
            })
            .collect::<Result<Vec<_>>>()?;
        let offsets = (0..instructions.len()).collect();
        Ok(Program {
            instructions,
            offsets,
        })
    }

    fn push_byte(&mut self, offset: usize, byte: u8) {
        if let Some(instruction) = Instruction::from_byte(byte) {
            self.instructions.push(instruction);
            self.offsets.push(offset);
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn fetch(&self, pc: usize) -> Result<Instruction> {
        self.instructions
            .get(pc)
            .copied()
            .ok_or(Error::Fetch { pc })
    }

    /// Byte offset in the source that the instruction at `pc` came from.
    pub fn source_offset(&self, pc: usize) -> Option<usize> {
        self.offsets.get(pc).copied()
    }
}

impl<'a> From<&'a str> for Program {
    fn from(source: &'a str) -> Program {
        let mut program = Program::default();
        for (offset, byte) in source.bytes().enumerate() {
            program.push_byte(offset, byte);
        }
        program
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for instruction in &self.instructions {
            write!(f, "{}", instruction.symbol())?;
        }
        Ok(())
    }
}

#[test]
fn parse_keeps_only_symbols() {
    let program = Program::from_reader("a+b\n[ -]>.,<".as_bytes()).unwrap();
    assert_eq!(program.to_string(), "+[-]>.,<");
    assert_eq!(program.len(), 8);
}

#[test]
fn parse_empty_stream() {
    let program = Program::from_reader(io::empty()).unwrap();
    assert!(program.is_empty());
}

#[test]
fn parse_comment() {
    assert_eq!(Program::from("foo! ").len(), 0);
}

#[test]
fn parse_records_source_offsets() {
    let program = Program::from("x +\n]");
    assert_eq!(program.source_offset(0), Some(2));
    assert_eq!(program.source_offset(1), Some(4));
    assert_eq!(program.source_offset(2), None);
}

#[test]
fn parse_propagates_stream_errors() {
    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }
    match Program::from_reader(Broken) {
        Err(Error::Source(e)) => assert_eq!(e.to_string(), "disk on fire"),
        other => panic!("expected a source error, got {:?}", other),
    }
}

#[test]
fn parse_rendering_is_idempotent() {
    let program = Program::from("hello [world] ,.+-<>");
    let reparsed = Program::from(program.to_string().as_str());
    assert_eq!(program.instructions(), reparsed.instructions());
}

#[test]
fn fetch_past_end() {
    let program = Program::from("+");
    assert_eq!(program.fetch(0).unwrap(), Instruction::Increment);
    assert!(matches!(program.fetch(1), Err(Error::Fetch { pc: 1 })));
}

#[test]
fn decode_rejects_comments() {
    assert_eq!(Program::decode(b"+[-]").unwrap().len(), 4);
    assert!(matches!(
        Program::decode(b"+ -"),
        Err(Error::InvalidInstruction {
            byte: b' ',
            offset: 1
        })
    ));
}

#[test]
fn try_from_byte() {
    assert_eq!(Instruction::try_from(b']').unwrap(), Instruction::LoopClose);
    assert!(Instruction::try_from(b'x').is_err());
}

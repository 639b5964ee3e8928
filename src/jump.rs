//! Matching loop brackets.
//!
//! Engines only ask one question: given a branch at `pc`, where is its
//! partner? [`JumpTable`] answers from a table built once before the run,
//! [`LiveScan`] answers by scanning the program every time it is asked.

use crate::error::{Error, Result};
use crate::program::Instruction;
use tracing::debug;

#[cfg(test)]
use crate::program::Program;
#[cfg(test)]
use pretty_assertions::assert_eq;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Bracket {
    Open,
    Close,
}

/// Anything that may be a loop bracket.
pub trait Branch {
    fn bracket(&self) -> Option<Bracket>;
}

impl Branch for Instruction {
    fn bracket(&self) -> Option<Bracket> {
        match self {
            Instruction::LoopOpen => Some(Bracket::Open),
            Instruction::LoopClose => Some(Bracket::Close),
            _ => None,
        }
    }
}

pub trait JumpResolver<T> {
    /// The position of the bracket matching the one at `pc`.
    fn resolve(&self, code: &[T], pc: usize) -> Result<usize>;
}

/// Partner positions for every bracket, indexed by program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTable {
    targets: Vec<Option<usize>>,
}

impl JumpTable {
    /// Pair up every bracket in `code`.
    ///
    /// A `]` with no open loop fails as soon as it is seen; otherwise the
    /// first `[` left open at the end of the program is reported.
    pub fn build<T: Branch>(code: &[T]) -> Result<JumpTable> {
        let mut targets = vec![None; code.len()];
        let mut open = vec![];
        let mut pairs = 0;

        for (pc, instr) in code.iter().enumerate() {
            match instr.bracket() {
                Some(Bracket::Open) => open.push(pc),
                Some(Bracket::Close) => {
                    let start = open.pop().ok_or(Error::UnmatchedClose { pc })?;
                    targets[start] = Some(pc);
                    targets[pc] = Some(start);
                    pairs += 1;
                }
                None => {}
            }
        }

        if let Some(&pc) = open.first() {
            return Err(Error::UnmatchedOpen { pc });
        }

        debug!(len = code.len(), pairs, "built jump table");
        Ok(JumpTable { targets })
    }

    /// The matching bracket for `pc`, or `None` if `pc` is not a bracket.
    pub fn partner(&self, pc: usize) -> Option<usize> {
        self.targets.get(pc).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl<T> JumpResolver<T> for JumpTable {
    fn resolve(&self, _: &[T], pc: usize) -> Result<usize> {
        self.partner(pc).ok_or(Error::Fetch { pc })
    }
}

/// Finds partners on demand by counting nesting depth from the branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveScan;

impl<T: Branch> JumpResolver<T> for LiveScan {
    fn resolve(&self, code: &[T], pc: usize) -> Result<usize> {
        match code.get(pc).and_then(Branch::bracket) {
            Some(Bracket::Open) => scan_forward(code, pc),
            Some(Bracket::Close) => scan_backward(code, pc),
            None => Err(Error::Fetch { pc }),
        }
    }
}

fn scan_forward<T: Branch>(code: &[T], pc: usize) -> Result<usize> {
    let mut nesting = 1;
    for (seek, instr) in code.iter().enumerate().skip(pc + 1) {
        match instr.bracket() {
            Some(Bracket::Open) => nesting += 1,
            Some(Bracket::Close) => nesting -= 1,
            None => {}
        }
        if nesting == 0 {
            return Ok(seek);
        }
    }
    Err(Error::UnmatchedOpen { pc })
}

fn scan_backward<T: Branch>(code: &[T], pc: usize) -> Result<usize> {
    let mut nesting = 1;
    for seek in (0..pc).rev() {
        match code[seek].bracket() {
            Some(Bracket::Close) => nesting += 1,
            Some(Bracket::Open) => nesting -= 1,
            None => {}
        }
        if nesting == 0 {
            return Ok(seek);
        }
    }
    Err(Error::UnmatchedClose { pc })
}

#[test]
fn table_pairs_nested_loops() {
    let program = Program::from("+[>[-]<]");
    let table = JumpTable::build(program.instructions()).unwrap();
    assert_eq!(table.len(), 8);
    assert_eq!(table.partner(1), Some(7));
    assert_eq!(table.partner(7), Some(1));
    assert_eq!(table.partner(3), Some(5));
    assert_eq!(table.partner(5), Some(3));
    assert_eq!(table.partner(0), None);
}

#[test]
fn table_pairs_sibling_loops() {
    let program = Program::from("[][]");
    let table = JumpTable::build(program.instructions()).unwrap();
    assert_eq!(table.partner(0), Some(1));
    assert_eq!(table.partner(2), Some(3));
}

#[test]
fn table_rejects_unmatched_open() {
    let program = Program::from("[][");
    assert!(matches!(
        JumpTable::build(program.instructions()),
        Err(Error::UnmatchedOpen { pc: 2 })
    ));

    let program = Program::from("[[]");
    assert!(matches!(
        JumpTable::build(program.instructions()),
        Err(Error::UnmatchedOpen { pc: 0 })
    ));
}

#[test]
fn table_rejects_dangling_close() {
    let program = Program::from("+]");
    assert!(matches!(
        JumpTable::build(program.instructions()),
        Err(Error::UnmatchedClose { pc: 1 })
    ));
}

#[test]
fn live_scan_agrees_with_table() {
    let program = Program::from("[[-]>[<+>-]]");
    let code = program.instructions();
    let table = JumpTable::build(code).unwrap();
    for pc in 0..code.len() {
        if code[pc].bracket().is_some() {
            assert_eq!(
                LiveScan.resolve(code, pc).unwrap(),
                table.resolve(code, pc).unwrap()
            );
        }
    }
}

#[test]
fn live_scan_runs_off_either_end() {
    let program = Program::from("+[");
    assert!(matches!(
        LiveScan.resolve(program.instructions(), 1),
        Err(Error::UnmatchedOpen { pc: 1 })
    ));

    let program = Program::from("-]");
    assert!(matches!(
        LiveScan.resolve(program.instructions(), 1),
        Err(Error::UnmatchedClose { pc: 1 })
    ));
}

#[test]
fn resolving_a_non_branch_faults() {
    let program = Program::from("+");
    let code = program.instructions();
    assert!(LiveScan.resolve(code, 0).is_err());
    assert!(JumpTable::build(code).unwrap().resolve(code, 0).is_err());
}

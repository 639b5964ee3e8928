//! bfir defines the run-length folded form of a BF program. Runs of the
//! same non-branch instruction collapse into one operation with a repeat
//! count, so the IR engine dispatches once per run instead of once per
//! symbol.
//!
//! Each operation keeps the range of byte-level program positions it was
//! folded from, which is how faults raised while running the IR are
//! reported against the original program.

use crate::diagnostics::{Combine, Position};
use crate::error::{Error, Result};
use crate::jump::{Bracket, Branch};
use crate::program::{Instruction, Program};
use itertools::Itertools;
use std::fmt;
use tracing::debug;

#[cfg(test)]
use pretty_assertions::assert_eq;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum OpKind {
    MoveRight,
    MoveLeft,
    IncCell,
    DecCell,
    Read,
    Write,
    BranchIfZero,
    BranchIfNonZero,
}

impl OpKind {
    pub fn is_branch(self) -> bool {
        matches!(self, OpKind::BranchIfZero | OpKind::BranchIfNonZero)
    }

    fn symbol(self) -> char {
        Instruction::from(self).symbol()
    }
}

impl From<Instruction> for OpKind {
    fn from(instr: Instruction) -> OpKind {
        match instr {
            Instruction::MoveRight => OpKind::MoveRight,
            Instruction::MoveLeft => OpKind::MoveLeft,
            Instruction::Increment => OpKind::IncCell,
            Instruction::Decrement => OpKind::DecCell,
            Instruction::Read => OpKind::Read,
            Instruction::Write => OpKind::Write,
            Instruction::LoopOpen => OpKind::BranchIfZero,
            Instruction::LoopClose => OpKind::BranchIfNonZero,
        }
    }
}

impl From<OpKind> for Instruction {
    fn from(kind: OpKind) -> Instruction {
        match kind {
            OpKind::MoveRight => Instruction::MoveRight,
            OpKind::MoveLeft => Instruction::MoveLeft,
            OpKind::IncCell => Instruction::Increment,
            OpKind::DecCell => Instruction::Decrement,
            OpKind::Read => Instruction::Read,
            OpKind::Write => Instruction::Write,
            OpKind::BranchIfZero => Instruction::LoopOpen,
            OpKind::BranchIfNonZero => Instruction::LoopClose,
        }
    }
}

/// One IR operation. Branches always have a count of 1.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct IrOp {
    pub kind: OpKind,
    pub count: usize,
    /// Byte-level program positions this operation was folded from.
    pub position: Position,
}

impl Branch for IrOp {
    fn bracket(&self) -> Option<Bracket> {
        match self.kind {
            OpKind::BranchIfZero => Some(Bracket::Open),
            OpKind::BranchIfNonZero => Some(Bracket::Close),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrProgram {
    ops: Vec<IrOp>,
}

impl IrProgram {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[IrOp] {
        &self.ops
    }

    pub fn fetch(&self, pc: usize) -> Result<IrOp> {
        self.ops.get(pc).copied().ok_or(Error::Fetch { pc })
    }

    /// The first byte-level program position behind the operation at `pc`.
    pub fn origin(&self, pc: usize) -> usize {
        match self.ops.get(pc) {
            Some(op) => op.position.start,
            None => self.ops.last().map_or(0, |op| op.position.end + 1),
        }
    }

    /// A human-readable listing, one operation per line.
    pub fn listing(&self) -> String {
        let mut result = String::new();
        for (pc, op) in self.ops.iter().enumerate() {
            result.push_str(&format!(
                "{:>5}  {:<16}{:>6}  @{:?}\n",
                pc,
                format!("{:?}", op.kind),
                op.count,
                op.position
            ));
        }
        result
    }
}

/// Replays every operation `count` times, giving back BF source.
impl fmt::Display for IrProgram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for op in &self.ops {
            let symbol = op.kind.symbol();
            for _ in 0..op.count {
                write!(f, "{}", symbol)?;
            }
        }
        Ok(())
    }
}

/// Fold runs of identical non-branch instructions into single operations.
pub fn translate(program: &Program) -> IrProgram {
    let ops: Vec<IrOp> = program
        .instructions()
        .iter()
        .enumerate()
        .map(|(pc, &instr)| IrOp {
            kind: instr.into(),
            count: 1,
            position: Position::at(pc),
        })
        .coalesce(|prev, next| {
            if prev.kind == next.kind && !prev.kind.is_branch() {
                Ok(IrOp {
                    count: prev.count + 1,
                    position: prev.position.combine(next.position),
                    ..prev
                })
            } else {
                Err((prev, next))
            }
        })
        .collect();

    debug!(
        instructions = program.len(),
        ops = ops.len(),
        "translated program to IR"
    );
    IrProgram { ops }
}

#[cfg(test)]
fn op(kind: OpKind, count: usize, start: usize, end: usize) -> IrOp {
    IrOp {
        kind,
        count,
        position: Position { start, end },
    }
}

#[test]
fn translate_folds_runs() {
    let ir = translate(&Program::from("+++>>-"));
    assert_eq!(
        ir.ops(),
        &[
            op(OpKind::IncCell, 3, 0, 2),
            op(OpKind::MoveRight, 2, 3, 4),
            op(OpKind::DecCell, 1, 5, 5),
        ]
    );
}

#[test]
fn translate_never_merges_branches() {
    let ir = translate(&Program::from("[[]]"));
    assert_eq!(ir.len(), 4);
    assert!(ir.ops().iter().all(|op| op.count == 1));
}

#[test]
fn translate_does_not_fold_across_branches() {
    let ir = translate(&Program::from("++[++]++"));
    assert_eq!(
        ir.ops(),
        &[
            op(OpKind::IncCell, 2, 0, 1),
            op(OpKind::BranchIfZero, 1, 2, 2),
            op(OpKind::IncCell, 2, 3, 4),
            op(OpKind::BranchIfNonZero, 1, 5, 5),
            op(OpKind::IncCell, 2, 6, 7),
        ]
    );
}

#[test]
fn translate_folds_io() {
    let ir = translate(&Program::from(",,..."));
    assert_eq!(
        ir.ops(),
        &[op(OpKind::Read, 2, 0, 1), op(OpKind::Write, 3, 2, 4)]
    );
}

#[test]
fn translate_empty_program() {
    let ir = translate(&Program::default());
    assert!(ir.is_empty());
    assert_eq!(ir.origin(0), 0);
}

#[test]
fn display_expands_counts() {
    let program = Program::from("++>>>[-]<<.,,");
    assert_eq!(translate(&program).to_string(), program.to_string());
}

#[test]
fn origin_maps_back_to_program() {
    let ir = translate(&Program::from("+++[-]"));
    assert_eq!(ir.origin(0), 0);
    assert_eq!(ir.origin(1), 3);
    assert_eq!(ir.origin(3), 5);
    assert_eq!(ir.origin(4), 6);
}

#[test]
fn listing_has_a_line_per_op() {
    let ir = translate(&Program::from("++[-]"));
    let listing = ir.listing();
    assert_eq!(listing.lines().count(), 4);
    assert!(listing.lines().next().unwrap().contains("IncCell"));
}

#[test]
fn fetch_past_end() {
    let ir = translate(&Program::from("++"));
    assert_eq!(ir.fetch(0).unwrap(), op(OpKind::IncCell, 2, 0, 1));
    assert!(matches!(ir.fetch(1), Err(Error::Fetch { pc: 1 })));
}

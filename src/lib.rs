#![warn(trivial_numeric_casts)]

//! bfi runs BF programs with one of three interchangeable engines over the
//! same byte tape: a naive interpreter that scans for loop partners on every
//! jump, one that looks them up in a precomputed table, and one that runs a
//! run-length folded IR.

pub use bfir::{translate, IrOp, IrProgram, OpKind};
pub use diagnostics::{Diagnostic, Level, Position};
pub use error::{Error, Result};
pub use execution::{execute, execute_to_vec, Config, Engine, Interpreter, DEFAULT_TAPE_LEN};
pub use jump::{JumpResolver, JumpTable, LiveScan};
pub use program::{Instruction, Program};

mod bfir;
mod diagnostics;
mod error;
mod execution;
mod jump;
mod program;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod soundness_tests;

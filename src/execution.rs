//! The three execution engines.
//!
//! All of them share one fetch/decode/execute loop. They differ in what
//! they feed it: the naive engine runs the byte-level program and finds
//! loop partners by scanning, the table engine runs the same program with
//! a precomputed [`JumpTable`], and the IR engine runs the run-length folded
//! [`IrProgram`](crate::bfir::IrProgram) with its own table.

use crate::bfir::{self, IrOp, OpKind};
use crate::error::{Error, Result};
use crate::jump::{Branch, JumpResolver, JumpTable, LiveScan};
use crate::program::{Instruction, Program};
use std::convert::TryFrom;
use std::fmt;
use std::io::{Read, Write};
use tracing::debug;

pub const DEFAULT_TAPE_LEN: usize = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of cells on the tape.
    pub tape_len: usize,
    /// Abort with [`Error::StepLimit`] after this many dispatched operations.
    pub max_steps: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tape_len: DEFAULT_TAPE_LEN,
            max_steps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Naive,
    Table,
    Ir,
}

impl Engine {
    pub const ALL: [Engine; 3] = [Engine::Naive, Engine::Table, Engine::Ir];
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Engine::Naive => "naive",
            Engine::Table => "table",
            Engine::Ir => "ir",
        };
        write!(f, "{}", name)
    }
}

/// Something the execution loop can dispatch: an operation kind applied
/// `count` times.
pub trait Dispatch: Branch + Copy {
    fn kind(&self) -> OpKind;
    fn count(&self) -> usize;
    /// Byte-level program position of repetition `n` of this operation,
    /// found at `pc` in its own sequence.
    fn origin(&self, pc: usize, n: usize) -> usize;
}

impl Dispatch for Instruction {
    fn kind(&self) -> OpKind {
        OpKind::from(*self)
    }

    fn count(&self) -> usize {
        1
    }

    fn origin(&self, pc: usize, n: usize) -> usize {
        pc + n
    }
}

impl Dispatch for IrOp {
    fn kind(&self) -> OpKind {
        self.kind
    }

    fn count(&self) -> usize {
        self.count
    }

    fn origin(&self, _: usize, n: usize) -> usize {
        self.position.start + n
    }
}

/// Machine state for a single run: the tape, both pointers and the two
/// byte streams.
pub struct Interpreter<R, W> {
    config: Config,
    tape: Vec<u8>,
    pc: usize,
    data_pointer: isize,
    steps: u64,
    input: R,
    output: W,
}

impl<R: Read, W: Write> Interpreter<R, W> {
    pub fn new(config: Config, input: R, output: W) -> Self {
        Interpreter {
            config,
            tape: vec![0; config.tape_len],
            pc: 0,
            data_pointer: 0,
            steps: 0,
            input,
            output,
        }
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn data_pointer(&self) -> isize {
        self.data_pointer
    }

    /// Operations dispatched by the last run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn run(&mut self, engine: Engine, program: &Program) -> Result<()> {
        match engine {
            Engine::Naive => self.run_naive(program),
            Engine::Table => self.run_table(program),
            Engine::Ir => self.run_ir(program),
        }
    }

    /// Run the program directly, scanning for loop partners at every jump.
    pub fn run_naive(&mut self, program: &Program) -> Result<()> {
        self.execute(program.instructions(), &LiveScan)
    }

    /// Run the program directly, with loop partners looked up in a table.
    pub fn run_table(&mut self, program: &Program) -> Result<()> {
        let table = JumpTable::build(program.instructions())?;
        self.execute(program.instructions(), &table)
    }

    /// Run the run-length folded form of the program.
    pub fn run_ir(&mut self, program: &Program) -> Result<()> {
        let ir = bfir::translate(program);
        let table = JumpTable::build(ir.ops()).map_err(|e| e.relocate(|pc| ir.origin(pc)))?;
        self.execute(ir.ops(), &table)
    }

    fn reset(&mut self) {
        self.tape.clear();
        self.tape.resize(self.config.tape_len, 0);
        self.pc = 0;
        self.data_pointer = 0;
        self.steps = 0;
    }

    fn execute<T, J>(&mut self, code: &[T], jumps: &J) -> Result<()>
    where
        T: Dispatch,
        J: JumpResolver<T>,
    {
        self.reset();
        debug!(len = code.len(), tape_len = self.tape.len(), "starting run");

        while self.pc < code.len() {
            let op = *code.get(self.pc).ok_or(Error::Fetch { pc: self.pc })?;
            self.tick()?;

            let count = op.count();
            let pc = self.pc;
            let origin = |n| op.origin(pc, n);
            match op.kind() {
                OpKind::MoveRight => {
                    self.data_pointer = self.data_pointer.wrapping_add(count as isize);
                }
                OpKind::MoveLeft => {
                    self.data_pointer = self.data_pointer.wrapping_sub(count as isize);
                }
                OpKind::IncCell => {
                    let index = self.cell_index(origin(0))?;
                    self.tape[index] = self.tape[index].wrapping_add(count as u8);
                }
                OpKind::DecCell => {
                    let index = self.cell_index(origin(0))?;
                    self.tape[index] = self.tape[index].wrapping_sub(count as u8);
                }
                OpKind::Write => {
                    let byte = self.tape[self.cell_index(origin(0))?];
                    for n in 0..count {
                        let pc = origin(n);
                        self.output
                            .write_all(&[byte])
                            .map_err(|source| Error::Io { pc, source })?;
                    }
                }
                OpKind::Read => {
                    let index = self.cell_index(origin(0))?;
                    for n in 0..count {
                        self.tape[index] = self.read_byte(origin(n))?;
                    }
                }
                OpKind::BranchIfZero => {
                    if self.tape[self.cell_index(origin(0))?] == 0 {
                        self.pc = jumps.resolve(code, self.pc)?;
                    }
                }
                OpKind::BranchIfNonZero => {
                    if self.tape[self.cell_index(origin(0))?] != 0 {
                        self.pc = jumps.resolve(code, self.pc)?;
                    }
                }
            }
            self.pc += 1;
        }

        let pc = code
            .last()
            .map_or(0, |op| op.origin(code.len() - 1, op.count()));
        self.output
            .flush()
            .map_err(|source| Error::Io { pc, source })?;
        debug!(steps = self.steps, "run finished");
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        if let Some(max_steps) = self.config.max_steps {
            if self.steps >= max_steps {
                return Err(Error::StepLimit { steps: max_steps });
            }
        }
        self.steps += 1;
        Ok(())
    }

    /// The tape index under the data pointer, if it is on the tape.
    fn cell_index(&self, pc: usize) -> Result<usize> {
        usize::try_from(self.data_pointer)
            .ok()
            .filter(|&index| index < self.tape.len())
            .ok_or(Error::OutOfBounds {
                pc,
                pointer: self.data_pointer,
            })
    }

    /// Block for one byte of input. Pending output is flushed first so
    /// prompts are visible.
    fn read_byte(&mut self, pc: usize) -> Result<u8> {
        let mut buf = [0];
        self.output
            .flush()
            .and_then(|_| self.input.read_exact(&mut buf))
            .map_err(|source| Error::Io { pc, source })?;
        Ok(buf[0])
    }
}

/// Run `program` on a fresh machine wired to the given streams.
pub fn execute<R: Read, W: Write>(
    engine: Engine,
    config: Config,
    program: &Program,
    input: R,
    output: W,
) -> Result<()> {
    Interpreter::new(config, input, output).run(engine, program)
}

/// Run `program` against in-memory input, returning everything it wrote.
pub fn execute_to_vec(
    engine: Engine,
    config: Config,
    program: &Program,
    input: &[u8],
) -> Result<Vec<u8>> {
    let mut output = vec![];
    execute(engine, config, program, input, &mut output)?;
    Ok(output)
}

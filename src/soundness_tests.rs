//! Properties that must hold for every program, checked with quickcheck.

use crate::bfir::translate;
use crate::error::Error;
use crate::execution::{Config, Engine, Interpreter};
use crate::jump::JumpTable;
use crate::program::Program;
use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};
use std::collections::HashSet;

const MAX_STEPS: u64 = 10_000;
const MAX_DEPTH: usize = 3;

/// Source text with balanced brackets.
#[derive(Debug, Clone)]
struct BalancedSource(String);

fn arbitrary_block<G: Gen>(g: &mut G, depth: usize, out: &mut String) {
    let len = usize::arbitrary(g) % 12;
    for _ in 0..len {
        match u8::arbitrary(g) % 10 {
            0 => out.push('>'),
            1 => out.push('<'),
            2 | 3 => out.push('+'),
            4 => out.push('-'),
            5 => out.push('.'),
            6 => out.push(','),
            7 => out.push('>'),
            _ if depth < MAX_DEPTH => {
                out.push('[');
                arbitrary_block(g, depth + 1, out);
                out.push(']');
            }
            _ => out.push('-'),
        }
    }
}

impl Arbitrary for BalancedSource {
    fn arbitrary<G: Gen>(g: &mut G) -> Self {
        let mut source = String::new();
        arbitrary_block(g, 0, &mut source);
        BalancedSource(source)
    }
}

struct Run {
    result: crate::Result<()>,
    output: Vec<u8>,
    tape: Vec<u8>,
}

fn run(engine: Engine, program: &Program, input: &[u8]) -> Run {
    let config = Config {
        tape_len: 64,
        max_steps: Some(MAX_STEPS),
    };
    let mut output = vec![];
    let mut interpreter = Interpreter::new(config, input, &mut output);
    let result = interpreter.run(engine, program);
    let tape = interpreter.tape().to_vec();
    Run {
        result,
        output,
        tape,
    }
}

/// Faults compared by kind and position, ignoring I/O error payloads.
fn fault_summary(result: &crate::Result<()>) -> Option<(String, Option<usize>)> {
    match result {
        Ok(()) => None,
        Err(Error::Io { pc, source }) => Some((format!("io {:?}", source.kind()), Some(*pc))),
        Err(e) => Some((e.to_string(), e.pc())),
    }
}

#[test]
fn engines_agree() {
    fn prop(source: BalancedSource, input: Vec<u8>) -> TestResult {
        let program = Program::from(source.0.as_str());

        // The IR engine dispatches fewer steps, so a step budget is only
        // comparable when the naive run finished inside it.
        let naive = run(Engine::Naive, &program, &input);
        if let Err(Error::StepLimit { .. }) = naive.result {
            return TestResult::discard();
        }

        for &engine in &[Engine::Table, Engine::Ir] {
            let other = run(engine, &program, &input);
            if other.output != naive.output
                || other.tape != naive.tape
                || fault_summary(&other.result) != fault_summary(&naive.result)
            {
                return TestResult::failed();
            }
        }
        TestResult::passed()
    }
    quickcheck(prop as fn(BalancedSource, Vec<u8>) -> TestResult);
}

#[test]
fn parsing_is_idempotent() {
    fn prop(source: Vec<u8>) -> bool {
        let program = Program::from_reader(&source[..]).unwrap();
        let rendered = program.to_string();
        let reparsed = Program::from_reader(rendered.as_bytes()).unwrap();
        reparsed.instructions() == program.instructions() && reparsed.to_string() == rendered
    }
    quickcheck(prop as fn(Vec<u8>) -> bool);
}

#[test]
fn ir_expands_back_to_the_program() {
    fn prop(source: String) -> bool {
        let program = Program::from(source.as_str());
        let ir = translate(&program);
        ir.len() <= program.len() && ir.to_string() == program.to_string()
    }
    quickcheck(prop as fn(String) -> bool);
}

#[test]
fn ir_branches_are_never_folded() {
    fn prop(source: BalancedSource) -> bool {
        let program = Program::from(source.0.as_str());
        translate(&program)
            .ops()
            .iter()
            .all(|op| op.count >= 1 && (!op.kind.is_branch() || op.count == 1))
    }
    quickcheck(prop as fn(BalancedSource) -> bool);
}

#[test]
fn jump_table_is_symmetric() {
    fn prop(source: BalancedSource) -> bool {
        let program = Program::from(source.0.as_str());
        let table = match JumpTable::build(program.instructions()) {
            Ok(table) => table,
            Err(_) => return false,
        };

        let mut closes = HashSet::new();
        for pc in 0..program.len() {
            if let Some(partner) = table.partner(pc) {
                if table.partner(partner) != Some(pc) {
                    return false;
                }
                if pc < partner && !closes.insert(partner) {
                    return false;
                }
            }
        }
        true
    }
    quickcheck(prop as fn(BalancedSource) -> bool);
}

use crate::error::Error;
use crate::execution::{execute_to_vec, Config, Engine, Interpreter};
use crate::program::Program;
use pretty_assertions::assert_eq;
use std::io::{self, ErrorKind, Write};

const HELLO_WORLD: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

struct Outcome {
    result: crate::Result<()>,
    output: Vec<u8>,
    tape: Vec<u8>,
    data_pointer: isize,
    steps: u64,
}

fn run_with(engine: Engine, config: Config, source: &str, input: &[u8]) -> Outcome {
    let program = Program::from(source);
    let mut output = vec![];
    let mut interpreter = Interpreter::new(config, input, &mut output);
    let result = interpreter.run(engine, &program);
    let tape = interpreter.tape().to_vec();
    let data_pointer = interpreter.data_pointer();
    let steps = interpreter.steps();
    Outcome {
        result,
        output,
        tape,
        data_pointer,
        steps,
    }
}

fn run(engine: Engine, source: &str, input: &[u8]) -> Outcome {
    run_with(engine, Config::default(), source, input)
}

#[test]
fn add_then_write() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "+++.", b"");
        assert!(outcome.result.is_ok(), "{}", engine);
        assert_eq!(outcome.output, vec![3]);
    }
}

#[test]
fn echo_one_byte() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, ",.", b"A");
        assert!(outcome.result.is_ok(), "{}", engine);
        assert_eq!(outcome.output, b"A".to_vec());
    }
}

#[test]
fn clear_loop_leaves_zero() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "++[-]", b"");
        assert!(outcome.result.is_ok(), "{}", engine);
        assert_eq!(outcome.tape[0], 0);
        assert_eq!(outcome.data_pointer, 0);
        assert!(outcome.output.is_empty());
    }
}

#[test]
fn end_of_input_inside_loop_is_a_fault() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, ",[.,]", b"ab");
        assert_eq!(outcome.output, b"ab".to_vec());
        match outcome.result {
            Err(Error::Io { pc, source }) => {
                assert_eq!(pc, 3);
                assert_eq!(source.kind(), ErrorKind::UnexpectedEof);
            }
            other => panic!("{}: expected an I/O fault, got {:?}", engine, other),
        }
    }
}

#[test]
fn unmatched_open_is_reported_at_zero() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "[", b"");
        assert!(
            matches!(outcome.result, Err(Error::UnmatchedOpen { pc: 0 })),
            "{}: {:?}",
            engine,
            outcome.result
        );
        assert!(outcome.output.is_empty());
    }
}

#[test]
fn multiply_loop() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "++++[>++++<-]>.", b"");
        assert!(outcome.result.is_ok(), "{}", engine);
        assert_eq!(outcome.output, vec![16]);
        assert_eq!(&outcome.tape[..2], &[0, 16]);
    }
}

#[test]
fn hello_world() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, HELLO_WORLD, b"");
        assert!(outcome.result.is_ok(), "{}", engine);
        assert_eq!(String::from_utf8(outcome.output).unwrap(), "Hello World!\n");
    }
}

#[test]
fn cells_wrap_around() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "-.+.", b"");
        assert_eq!(outcome.output, vec![255, 0]);

        let source = "+".repeat(300);
        let outcome = run(engine, &source, b"");
        assert_eq!(outcome.tape[0], 44);
    }
}

#[test]
fn repeated_reads_keep_last_byte() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, ",,.", b"xy");
        assert!(outcome.result.is_ok(), "{}", engine);
        assert_eq!(outcome.output, b"y".to_vec());
    }
}

#[test]
fn moving_left_of_the_tape_faults_on_access() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "+++<<+", b"");
        assert!(
            matches!(
                outcome.result,
                Err(Error::OutOfBounds {
                    pc: 5,
                    pointer: -2
                })
            ),
            "{}: {:?}",
            engine,
            outcome.result
        );
        assert_eq!(outcome.tape[0], 3);
    }
}

#[test]
fn moving_off_the_tape_and_back_is_fine() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "<<>>+.", b"");
        assert!(outcome.result.is_ok(), "{}", engine);
        assert_eq!(outcome.output, vec![1]);
    }
}

#[test]
fn tape_length_is_configurable() {
    let config = Config {
        tape_len: 2,
        ..Config::default()
    };
    for &engine in &Engine::ALL {
        let outcome = run_with(engine, config, ">+>+", b"");
        assert!(
            matches!(outcome.result, Err(Error::OutOfBounds { pc: 3, pointer: 2 })),
            "{}: {:?}",
            engine,
            outcome.result
        );
        assert_eq!(outcome.tape, vec![0, 1]);
    }
}

#[test]
fn step_limit_stops_infinite_loops() {
    let config = Config {
        max_steps: Some(100),
        ..Config::default()
    };
    for &engine in &Engine::ALL {
        let outcome = run_with(engine, config, "+[]", b"");
        assert!(
            matches!(outcome.result, Err(Error::StepLimit { steps: 100 })),
            "{}: {:?}",
            engine,
            outcome.result
        );
    }
}

#[test]
fn ir_dispatches_fewer_steps() {
    assert_eq!(run(Engine::Naive, "+++.", b"").steps, 4);
    assert_eq!(run(Engine::Table, "+++.", b"").steps, 4);
    assert_eq!(run(Engine::Ir, "+++.", b"").steps, 2);
}

#[test]
fn dangling_close_is_rejected_up_front_by_tables() {
    assert!(run(Engine::Naive, "]", b"").result.is_ok());
    assert!(matches!(
        run(Engine::Table, "]", b"").result,
        Err(Error::UnmatchedClose { pc: 0 })
    ));
    assert!(matches!(
        run(Engine::Ir, "]", b"").result,
        Err(Error::UnmatchedClose { pc: 0 })
    ));
}

#[test]
fn naive_engine_faults_when_scan_runs_off_the_start() {
    assert!(matches!(
        run(Engine::Naive, "+.]", b"").result,
        Err(Error::UnmatchedClose { pc: 2 })
    ));
    // Output before the fault is kept.
    assert_eq!(run(Engine::Naive, "+.]", b"").output, vec![1]);
}

#[test]
fn naive_engine_skips_unreached_open() {
    // The cell is nonzero, so the naive engine never looks for a partner.
    assert!(run(Engine::Naive, "+[", b"").result.is_ok());
    assert!(matches!(
        run(Engine::Table, "+[", b"").result,
        Err(Error::UnmatchedOpen { pc: 1 })
    ));
}

#[test]
fn ir_faults_are_reported_in_program_positions() {
    let outcome = run(Engine::Ir, ">>>>[<<<<<<-]", b"");
    assert!(outcome.result.is_ok());

    let outcome = run(Engine::Ir, "++[<<<-]", b"");
    assert!(
        matches!(
            outcome.result,
            Err(Error::OutOfBounds {
                pc: 6,
                pointer: -3
            })
        ),
        "{:?}",
        outcome.result
    );
}

#[test]
fn write_failure_is_a_fault() {
    struct Closed;
    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let program = Program::from("++.");
    for &engine in &Engine::ALL {
        let mut interpreter = Interpreter::new(Config::default(), io::empty(), Closed);
        match interpreter.run(engine, &program) {
            Err(Error::Io { pc, source }) => {
                assert_eq!(pc, 2);
                assert_eq!(source.kind(), ErrorKind::BrokenPipe);
            }
            other => panic!("{}: expected an I/O fault, got {:?}", engine, other),
        }
    }
}

#[test]
fn each_run_starts_from_a_clean_tape() {
    let program = Program::from("+>+");
    let mut output: Vec<u8> = vec![];
    let mut interpreter = Interpreter::new(Config::default(), io::empty(), &mut output);
    interpreter.run(Engine::Table, &program).unwrap();
    interpreter.run(Engine::Ir, &program).unwrap();
    assert_eq!(&interpreter.tape()[..3], &[1, 1, 0]);
    assert_eq!(interpreter.data_pointer(), 1);
}

#[test]
fn execute_to_vec_collects_output() {
    let program = Program::from(",----------[++++++++++.,----------]");
    for &engine in &Engine::ALL {
        let output =
            execute_to_vec(engine, Config::default(), &program, b"179424691\n").unwrap();
        assert_eq!(output, b"179424691".to_vec());
    }
}

#[test]
fn empty_program_does_nothing() {
    for &engine in &Engine::ALL {
        let outcome = run(engine, "no code here", b"");
        assert!(outcome.result.is_ok());
        assert!(outcome.output.is_empty());
        assert_eq!(outcome.steps, 0);
    }
}

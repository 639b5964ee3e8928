//! Command line front end: pick a source and an engine, then hand the
//! program and the process's standard streams to the library.

use bfi::{Config, Diagnostic, Engine, JumpTable, Level, Position, Program, DEFAULT_TAPE_LEN};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bfi", version, about = "Run BF programs")]
struct Cli {
    /// Program source. Reads standard input when absent or `-`.
    file: Option<PathBuf>,

    /// Execution engine.
    #[arg(short, long, value_enum, default_value_t = EngineArg::Naive)]
    engine: EngineArg,

    /// Number of cells on the tape.
    #[arg(long, default_value_t = DEFAULT_TAPE_LEN)]
    tape_size: usize,

    /// Give up after this many dispatched operations.
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print the run-length folded IR instead of running the program.
    #[arg(long)]
    dump_ir: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineArg {
    /// Scan for loop partners on every jump.
    Naive,
    /// Look loop partners up in a precomputed table.
    Table,
    /// Run the run-length folded IR.
    Ir,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Engine {
        match arg {
            EngineArg::Naive => Engine::Naive,
            EngineArg::Table => Engine::Table,
            EngineArg::Ir => Engine::Ir,
        }
    }
}

struct Source {
    filename: String,
    bytes: Vec<u8>,
}

impl Source {
    fn diagnostic(&self, level: Level, message: String, position: Option<Position>) -> Diagnostic {
        Diagnostic {
            level,
            filename: self.filename.clone(),
            message,
            position,
            source: Some(String::from_utf8_lossy(&self.bytes).into_owned()),
        }
    }
}

fn read_source(path: Option<&PathBuf>) -> Result<Source, Diagnostic> {
    let (filename, bytes) = match path {
        Some(path) if path.as_os_str() != "-" => {
            let filename = path.display().to_string();
            let bytes = fs::read(path).map_err(|e| Diagnostic {
                level: Level::Error,
                filename: filename.clone(),
                message: e.to_string(),
                position: None,
                source: None,
            })?;
            (filename, bytes)
        }
        _ => {
            // The program takes all of stdin, so reads at run time see end of stream.
            let mut bytes = vec![];
            io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|e| Diagnostic {
                    level: Level::Error,
                    filename: "<stdin>".to_owned(),
                    message: e.to_string(),
                    position: None,
                    source: None,
                })?;
            ("<stdin>".to_owned(), bytes)
        }
    };
    Ok(Source { filename, bytes })
}

/// Point at the source byte behind a program counter, if there is one.
fn source_position(program: &Program, err: &bfi::Error) -> Option<Position> {
    err.pc()
        .and_then(|pc| program.source_offset(pc))
        .map(Position::at)
}

fn run(cli: &Cli) -> Result<(), Diagnostic> {
    let source = read_source(cli.file.as_ref())?;
    let program = Program::from_reader(&source.bytes[..])
        .map_err(|e| source.diagnostic(Level::Error, e.to_string(), None))?;
    debug!(
        filename = %source.filename,
        bytes = source.bytes.len(),
        instructions = program.len(),
        "parsed program"
    );

    if cli.dump_ir {
        print!("{}", bfi::translate(&program).listing());
        return Ok(());
    }

    let engine = Engine::from(cli.engine);
    if engine == Engine::Naive {
        // The naive engine only notices bad brackets it actually jumps over.
        if let Err(e) = JumpTable::build(program.instructions()) {
            let position = source_position(&program, &e);
            eprintln!("{}", source.diagnostic(Level::Warning, e.to_string(), position));
        }
    }

    let config = Config {
        tape_len: cli.tape_size,
        max_steps: cli.max_steps,
    };
    info!(%engine, tape_len = config.tape_len, "running program");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = bfi::execute(engine, config, &program, stdin.lock(), stdout.lock());
    // Keep whatever the program printed before a fault.
    let _ = io::stdout().flush();

    result.map_err(|e| {
        let position = source_position(&program, &e);
        source.diagnostic(Level::Error, e.to_string(), position)
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BFI_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => process::exit(0),
        Err(diagnostic) => {
            eprintln!("{}", diagnostic);
            process::exit(1);
        }
    }
}

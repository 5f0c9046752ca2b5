use clap::{ArgAction, Parser};
use miette::{IntoDiagnostic, Result, WrapErr};
use plea::gate::Plea;
use plea::{Engine, EngineOptions, Error, render_error};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// plea - a language that has to be asked nicely
#[derive(Parser, Debug)]
#[command(name = "plea")]
#[command(about = "Compile and run a plea program", long_about = None)]
struct Args {
    /// Print the compiled bytecode instead of running it
    #[arg(long, action = ArgAction::Set, default_value_t = cfg!(debug_assertions))]
    disassemble: bool,

    /// Program source file
    file: PathBuf,
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    // PLEA_LOG takes precedence over RUST_LOG; default to WARN if neither is set.
    let filter = EnvFilter::try_from_env("PLEA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging();

    let source = std::fs::read_to_string(&args.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", args.file.display()))?;

    let engine = Engine::new(EngineOptions::default());
    let code = match engine.compile(&source) {
        Ok(code) => code,
        Err(e) => {
            render_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.disassemble {
        print!("{}", code);
        return Ok(ExitCode::SUCCESS);
    }

    let stdin = std::io::stdin();
    let input = BufReader::new(stdin.lock());
    let output = BufWriter::new(std::io::stdout().lock());
    match engine.run(&code, &mut Plea, input, output) {
        Ok(outcome) => {
            debug!(value = ?outcome.value, arrays_released = outcome.arrays_released, "done");
            Ok(ExitCode::SUCCESS)
        }
        Err(Error::Runtime(err)) => {
            eprintln!("{}", err);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            render_error(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

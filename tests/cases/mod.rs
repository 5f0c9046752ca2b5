#![allow(dead_code, unused_macros)]

use plea::gate::Fixed;
use plea::{Engine, EngineOptions, Error, Outcome};

/// A greeting the default test gate always accepts.
pub const GREETING: &str = "beg \"please, oh great and almighty program!!!\";";

pub struct Run {
    pub result: Result<Outcome, Error>,
    pub output: String,
}

/// Compile `program` after the standard greeting and run it with `input` on
/// stdin. The gate never rejects a greeting that scores above zero.
pub fn run(program: &str, input: &str) -> Run {
    run_source(&format!("{}\n{}", GREETING, program), input, &mut Fixed { hour: 12, roll: 0 })
}

pub fn run_source(source: &str, input: &str, gate: &mut Fixed) -> Run {
    let engine = Engine::new(EngineOptions::default());
    let mut output = Vec::new();
    let result = engine
        .compile(source)
        .and_then(|code| engine.run(&code, gate, input.as_bytes(), &mut output));
    Run {
        result,
        output: String::from_utf8_lossy(&output).into_owned(),
    }
}

/// Runs a program that must halt normally.
///
/// ```ignore
/// test_case!(
///     name,
///     program: "fnctn returns 0 nm main args calls ;",
///     input: "optional stdin",
///     output: "",
///     value: Value::Int(0),
/// );
/// ```
macro_rules! test_case {
    (
        $name:ident,
        program: $program:expr,
        $(input: $input:expr,)?
        output: $output:expr,
        $(value: $value:expr,)?
    ) => {
        #[test]
        fn $name() {
            let inputs: &[&str] = &[$($input)?];
            let run = cases::run($program, inputs.first().copied().unwrap_or(""));
            let outcome = match run.result {
                Ok(outcome) => outcome,
                Err(err) => panic!("{}\n{}", err, plea::render_error_to_string_no_color(&err)),
            };
            pretty_assertions::assert_eq!(run.output, $output);
            $(pretty_assertions::assert_eq!(outcome.value, Some($value));)?
            let _ = outcome;
        }
    };
}

/// Runs a program that must stop with an error matching a pattern.
macro_rules! test_error {
    (
        $name:ident,
        program: $program:expr,
        $(input: $input:expr,)?
        error: $pattern:pat $(if $guard:expr)?,
        $(output: $output:expr,)?
    ) => {
        #[test]
        fn $name() {
            let inputs: &[&str] = &[$($input)?];
            let run = cases::run($program, inputs.first().copied().unwrap_or(""));
            match &run.result {
                $pattern $(if $guard)? => {}
                other => panic!("unexpected result: {:?}", other),
            }
            $(pretty_assertions::assert_eq!(run.output, $output);)?
        }
    };
}

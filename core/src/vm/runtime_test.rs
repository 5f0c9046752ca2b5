//! Tests for the virtual machine, driven through the compiler.

use pretty_assertions::assert_eq;

use super::*;
use crate::bytecode::{Code, DecodeError};
use crate::compiler::compile;
use crate::gate::{Fixed, Gate, Lenient, Rejection};

const GREETING: &str = "beg \"please, oh great and almighty program!!!\";";

fn compile_program(source: &str) -> Code {
    crate::test_utils::init_test_logging();
    let source = format!("{} {}", GREETING, source);
    match compile(&source) {
        Ok(code) => code,
        Err(err) => panic!("{} failed to compile: {}", source, err),
    }
}

fn execute(
    code: &Code,
    input: &str,
    options: VmOptions,
    gate: &mut dyn Gate,
) -> (Result<Outcome, RuntimeError>, String) {
    let mut output = Vec::new();
    let result = Vm::new(code, options, gate, input.as_bytes(), &mut output).run();
    (result, String::from_utf8_lossy(&output).into_owned())
}

/// Run `fnctn returns <ret> nm main args calls <body>;` and return what main
/// returned along with everything printed.
fn run_main(ret: &str, body: &str) -> (Value, String) {
    let code = compile_program(&format!("fnctn returns {} nm main args calls {};", ret, body));
    let (result, output) = execute(&code, "", VmOptions::default(), &mut Lenient);
    match result {
        Ok(outcome) => (outcome.value.expect("main returned nothing"), output),
        Err(err) => panic!("{} failed: {}\n{}", body, err, code),
    }
}

fn run_err(source: &str) -> RuntimeError {
    let code = compile_program(source);
    match execute(&code, "", VmOptions::default(), &mut Lenient).0 {
        Ok(outcome) => panic!("{} succeeded with {:?}", source, outcome),
        Err(err) => err,
    }
}

// ============================================================================
// Values and variables
// ============================================================================

#[test]
fn test_main_return_value() {
    assert_eq!(run_main("7", "").0, Value::Int(7));
    assert_eq!(run_main("300", "").0, Value::Int(300));
    assert_eq!(run_main("x", "let x = -12").0, Value::Int(-12));
}

#[test]
fn test_increments_and_pooled_steps() {
    assert_eq!(
        run_main("x", "let x = 250 then chg x, * + + + + + + + + + +").0,
        Value::Int(260)
    );
    assert_eq!(
        run_main("x", "let x = 250 then chg x, * - .x 1000").0,
        Value::Int(-750)
    );
    assert_eq!(
        run_main("y", "let x = 5 then let y = 0 then chg y, x + + -").0,
        Value::Int(6)
    );
    assert_eq!(
        run_main("x", "let x = 5 then chg x, * + .x 0").0,
        Value::Int(6)
    );
}

#[test]
fn test_real_arithmetic() {
    assert_eq!(
        run_main("r", "let r = 1.5 then chg r, * +").0,
        Value::Real(2.5)
    );
    assert_eq!(run_main("r", "let r = f 2 then chg r, * - -").0, Value::Real(0.0));
}

// ============================================================================
// print and input
// ============================================================================

#[test]
fn test_print_char_yields_value() {
    let (value, output) = run_main("ch", "let x = 72 then let ch = call print in x endin");
    assert_eq!(output, "H");
    assert_eq!(value, Value::Int(72));
}

#[test]
fn test_print_char_array() {
    let (_, output) = run_main("0", "let s = \"hello\" then call print in s endin");
    assert_eq!(output, "hello");
}

#[test]
fn test_input_line_is_truncated() {
    let code = compile_program("fnctn returns 0 nm main args calls call print in input endin;");

    let (result, output) = execute(&code, "hi there\nignored\n", VmOptions::default(), &mut Lenient);
    assert_eq!(result.unwrap().arrays_released, 1);
    assert_eq!(output, "\nhi there");

    let long = "x".repeat(100);
    let (result, output) = execute(&code, &long, VmOptions::default(), &mut Lenient);
    assert!(result.is_ok());
    assert_eq!(output, format!("\n{}", "x".repeat(63)));
}

#[test]
fn test_input_keeps_raw_bytes() {
    let code = compile_program("fnctn returns 0 nm main args calls call print in input endin;");
    let mut output = Vec::new();
    let result = Vm::new(
        &code,
        VmOptions::default(),
        &mut Lenient,
        &b"caf\xe9\r\nnext"[..],
        &mut output,
    )
    .run();
    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(output, b"\ncaf\xe9".to_vec());
}

#[test]
fn test_input_discards_rest_of_long_line() {
    let code = compile_program(
        "fnctn returns 0 nm main args calls \
             call print in input endin then call print in input endin;",
    );
    let input = format!("{}\nsecond\n", "a".repeat(70));
    let (result, output) = execute(&code, &input, VmOptions::default(), &mut Lenient);
    assert!(result.is_ok());
    assert_eq!(output, format!("\n{}\nsecond", "a".repeat(63)));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn test_array_reads_and_writes() {
    assert_eq!(
        run_main("v", "let a = [i 3] then chg a @ 2, 9 then let v = a @ 2").0,
        Value::Int(9)
    );
    assert_eq!(
        run_main("n", "let a = [i 3] then let n = lng of a").0,
        Value::Int(3)
    );
    assert_eq!(
        run_main("n", "let a = [c] then let n = lng of a").0,
        Value::Int(16)
    );
    assert_eq!(
        run_main("v", "let a = [f 2] then chg a @ 1, 0.5 then let v = a @ 1").0,
        Value::Real(0.5)
    );
}

#[test]
fn test_array_length_can_change() {
    assert_eq!(
        run_main("n", "let a = [i 3] then chg lng of a, 40 then let n = lng of a").0,
        Value::Int(40)
    );
}

#[test]
fn test_array_index_out_of_bounds() {
    let err = run_err("fnctn returns 0 nm main args calls let a = [i 3] then chg a @ 3, 1;");
    assert!(
        matches!(err, RuntimeError::IndexOutOfBounds { index: 3, len: 3 }),
        "{}",
        err
    );
}

#[test]
fn test_aliased_arrays_are_released_once() {
    let code = compile_program(
        "fnctn returns 0 nm main args calls let a = [i] then let b = a then let s = \"hi\";",
    );
    let outcome = execute(&code, "", VmOptions::default(), &mut Lenient)
        .0
        .unwrap();
    assert_eq!(outcome.arrays_released, 2);
}

// ============================================================================
// Calls and frames
// ============================================================================

#[test]
fn test_call_with_arguments() {
    let code = compile_program(
        "fnctn returns a nm first args a : int, b : int calls ; \
         fnctn returns r nm main args calls let r = call first in 4, 5 endin;",
    );
    let outcome = execute(&code, "", VmOptions::default(), &mut Lenient)
        .0
        .unwrap();
    assert_eq!(outcome.value, Some(Value::Int(4)));
}

#[test]
fn test_frames_are_isolated() {
    let program = |ret: &str| {
        compile_program(&format!(
            "fnctn returns x nm inner args calls let x = 99 then let y = 98; \
             fnctn returns x nm outer args x : int calls let z = call inner in endin then chg x, z; \
             fnctn returns {} nm main args calls \
                 let x = 1 then let y = 2 then let r = call outer in 5 endin then chg x, * + then chg y, * +;",
            ret
        ))
    };
    for (ret, expected) in [("x", 2), ("y", 3), ("r", 99)] {
        let outcome = execute(&program(ret), "", VmOptions::default(), &mut Lenient)
            .0
            .unwrap();
        assert_eq!(outcome.value, Some(Value::Int(expected)), "returning {}", ret);
    }
}

#[test]
fn test_unbounded_recursion_is_too_deep() {
    let err = run_err("fnctn returns 0 nm main args calls call main in endin;");
    assert!(matches!(err, RuntimeError::ScopeTooDeep), "{}", err);
}

#[test]
fn test_operand_stack_limit() {
    let code = compile_program(
        "fnctn returns void nm take args a : int, b : int, d : int calls ; \
         fnctn returns 0 nm main args calls call take in 1, 2, 3 endin;",
    );
    let options = VmOptions {
        stack_size: 2,
        ..VmOptions::default()
    };
    let (result, _) = execute(&code, "", options, &mut Lenient);
    assert!(matches!(result, Err(RuntimeError::StackOverflow)));
}

// ============================================================================
// Jumps
// ============================================================================

#[test]
fn test_forward_jump_skips_statements() {
    assert_eq!(
        run_main("x", "let x = 1 then jmp _+ + then chg x, 5 then let y = 0").0,
        Value::Int(1)
    );
}

#[test]
fn test_subroutine_jump_returns() {
    let body = "let x = 0 then \
                jmp @ _+ + then \
                jmp _+ + + then \
                chg x, * + then \
                return then \
                let done = 1";
    assert_eq!(run_main("x", body).0, Value::Int(1));
}

// ============================================================================
// Deferred conditions
// ============================================================================

#[test]
fn test_when_true_on_arrival_resumes_once() {
    let (value, output) = run_main(
        "x",
        "let x = 0 then chg x, 3 when x is 3 then call print in 65 endin",
    );
    assert_eq!(value, Value::Int(3));
    assert_eq!(output, "A");
}

#[test]
fn test_when_fires_later_and_resumes_after_clause() {
    let (value, output) = run_main(
        "x",
        "let x = 0 then chg x, 0 when x is 2 then call print in 65 endin then chg x, 2",
    );
    assert_eq!(value, Value::Int(2));
    assert_eq!(output, "AA");
}

#[test]
fn test_when_not_fires_on_inequality() {
    let (_, output) = run_main(
        "0",
        "let x = 0 then chg x, 0 when x is not 0 then call print in 66 endin then chg x, 1",
    );
    assert_eq!(output, "BB");
}

#[test]
fn test_broken_promise_is_fatal() {
    let err = run_err("fnctn returns 0 nm main args calls let x = 0 then chg x, 1 when x is 5;");
    assert!(
        matches!(&err, RuntimeError::BrokenPromise { function } if function == "main"),
        "{}",
        err
    );
}

#[test]
fn test_unmet_optional_condition_is_dropped() {
    assert_eq!(
        run_main("x", "let x = 0 then chg x, 1 when x is 5 catch error").0,
        Value::Int(1)
    );
}

#[test]
fn test_callee_does_not_poll_caller_conditions() {
    // `five` writes 5 into its own slot 0, which is `y` in main's frame.
    let code = compile_program(
        "fnctn returns q nm five args calls let q = 5; \
         fnctn returns x nm main args calls \
             let y = 0 when y is 5 catch error then \
             let x = 0 then \
             let z = call five in endin then \
             chg x, * +;",
    );
    let (result, output) = execute(&code, "", VmOptions::default(), &mut Lenient);
    assert_eq!(result.unwrap().value, Some(Value::Int(1)));
    assert_eq!(output, "");
}

// ============================================================================
// Greeting and malformed code
// ============================================================================

#[test]
fn test_missing_greeting_is_insufficient_begging() {
    let code = compile("fnctn returns 0 nm main args calls ;").unwrap();
    let (result, _) = execute(&code, "", VmOptions::default(), &mut Lenient);
    assert!(matches!(result, Err(RuntimeError::InsufficientlyBegged)));
}

#[test]
fn test_gate_rejection_stops_before_main() {
    let code = compile_program("fnctn returns 0 nm main args calls call print in 65 endin;");
    let mut gate = Fixed { hour: 12, roll: 99 };
    let (result, output) = execute(&code, "", VmOptions::default(), &mut gate);
    assert!(matches!(
        result,
        Err(RuntimeError::GateRejected(Rejection::Unconvinced { score: 71, roll: 99 }))
    ));
    assert_eq!(output, "");

    let mut gate = Fixed { hour: 12, roll: 10 };
    let (result, output) = execute(&code, "", VmOptions::default(), &mut gate);
    assert!(result.is_ok());
    assert_eq!(output, "A");
}

#[test]
fn test_unknown_opcode() {
    let code = Code {
        bytes: b"\x01a b\0\x7f".to_vec(),
        ..Code::default()
    };
    let (result, _) = execute(&code, "", VmOptions::default(), &mut Lenient);
    assert!(matches!(
        result,
        Err(RuntimeError::Decode(DecodeError::UnknownOpcode {
            offset: 5,
            byte: 0x7f
        }))
    ));
}

#[macro_use]
mod cases;

use plea::{Error, RuntimeError, Value};

test_case!(
    overwrite_a_character,
    program: "fnctn returns 0 nm main args calls let s = \"cat\" then chg s @ 0, 98 then call print in s endin;",
    output: "bat",
);

test_case!(
    index_with_a_variable,
    program: "fnctn returns 0 nm main args calls
                  let s = \"abc\" then
                  let k = 2 then
                  let ch = s @ k then
                  call print in ch endin;",
    output: "c",
);

test_case!(
    edit_an_input_line,
    program: "fnctn returns 0 nm main args calls
                  let line = call print in input endin then
                  chg line @ 0, 42 then
                  call print in line endin;",
    input: "hey",
    output: "\nhey*ey",
);

test_case!(
    input_length,
    program: "fnctn returns n nm main args calls let line = call print in input endin then let n = lng of line;",
    input: "four\n",
    output: "\nfour",
    value: Value::Int(4),
);

test_case!(
    shrink_a_string,
    program: "fnctn returns 0 nm main args calls let s = \"hello\" then chg lng of s, 2 then call print in s endin;",
    output: "he",
);

test_case!(
    arrays_are_shared_between_variables,
    program: "fnctn returns 0 nm main args calls
                  let s = \"ok\" then
                  let t = s then
                  chg t @ 1, 75 then
                  call print in s endin;",
    output: "oK",
);

test_error!(
    negative_index,
    program: "fnctn returns v nm main args calls let a = [i 2] then let v = a @ -1;",
    error: Err(Error::Runtime(RuntimeError::IndexOutOfBounds { index: -1, len: 2 })),
);

test_error!(
    negative_length,
    program: "fnctn returns 0 nm main args calls let n = -3 then let a = [i] then chg lng of a, n;",
    error: Err(Error::Runtime(RuntimeError::InvalidLength(-3))),
);

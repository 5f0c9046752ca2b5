use pretty_assertions::assert_eq;

use super::{MAX_VARIABLES, Scalar, Type, Vars, VarsError};

#[test]
fn test_tags() {
    assert_eq!(Type::INT.tag(), 0);
    assert_eq!(Type::REAL.tag(), 1);
    assert_eq!(Type::Array(Scalar::Int).tag(), 2);
    assert_eq!(Type::Array(Scalar::Real).tag(), 3);
    assert_eq!(Type::Void.tag(), 4);
    assert_eq!(Type::Array(Scalar::Char).tag(), 5);
    assert_eq!(Type::CHAR.tag(), 6);
}

#[test]
fn test_array_kind_round_trips() {
    for scalar in [Scalar::Int, Scalar::Real, Scalar::Char] {
        assert_eq!(Scalar::from_kind(scalar.kind()), Some(scalar));
    }
    assert_eq!(Scalar::from_kind(2), None);
}

#[test]
fn test_accepts() {
    assert!(Type::INT.accepts(Type::INT));
    assert!(Type::CHAR.accepts(Type::INT));
    assert!(!Type::INT.accepts(Type::CHAR));
    assert!(!Type::INT.accepts(Type::REAL));
    assert!(!Type::Array(Scalar::Char).accepts(Type::Array(Scalar::Int)));
}

#[test]
fn test_printable() {
    assert!(Type::INT.is_printable());
    assert!(Type::CHAR.is_printable());
    assert!(Type::Array(Scalar::Char).is_printable());
    assert!(Type::Array(Scalar::Int).is_printable());
    assert!(!Type::REAL.is_printable());
    assert!(!Type::Array(Scalar::Real).is_printable());
    assert!(!Type::Void.is_printable());
}

#[test]
fn test_display() {
    assert_eq!(Type::Array(Scalar::Char).to_string(), "[char]");
    assert_eq!(Type::REAL.to_string(), "float");
}

#[test]
fn test_slots_are_positional() {
    let mut vars = Vars::new();
    assert_eq!(vars.declare("a", Type::INT), Ok(0));
    assert_eq!(vars.declare("b", Type::Array(Scalar::Char)), Ok(1));
    assert_eq!(vars.lookup("b"), Some((1, Type::Array(Scalar::Char))));
    assert_eq!(vars.lookup("c"), None);
    assert_eq!(vars.declare("a", Type::REAL), Err(VarsError::Duplicate));
}

#[test]
fn test_slot_limit() {
    let mut vars = Vars::new();
    for i in 0..MAX_VARIABLES {
        vars.declare(&format!("v{}", i), Type::INT).unwrap();
    }
    assert_eq!(vars.declare("extra", Type::INT), Err(VarsError::Full));
}

#[test]
fn test_truncate_forgets_names() {
    let mut vars = Vars::new();
    vars.declare("a", Type::INT).unwrap();
    vars.declare("b", Type::INT).unwrap();
    vars.truncate(1);
    assert_eq!(vars.len(), 1);
    assert_eq!(vars.lookup("b"), None);
    assert_eq!(vars.declare("b", Type::REAL), Ok(1));
}

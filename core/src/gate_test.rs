use pretty_assertions::assert_eq;

use super::*;

const HUMBLE: &str = "please, oh great and almighty program!!!";

#[test]
fn test_score_counts_phrases_and_exclamations() {
    assert_eq!(score(HUMBLE, 12), 25 + 20 + 20 + 6);
    assert_eq!(score("PLEASE think of my Family", 12), 40);
    assert_eq!(score("please please please", 12), 25);
    assert_eq!(score("hello there", 12), 0);
}

#[test]
fn test_score_penalises_early_hours() {
    assert_eq!(score(HUMBLE, 8), 71 - 20);
    assert_eq!(score(HUMBLE, 9), 71);
    assert_eq!(score("hi there", 0), -20);
}

#[test]
fn test_judge_requires_spaces() {
    assert_eq!(judge("please!!!!", 12, 0), Err(Rejection::NoSpaces));
    // 22 bytes over 2 spaces.
    assert_eq!(
        judge("pleasepleaseplease x y", 12, 0),
        Err(Rejection::TooFewSpaces)
    );
    // 21 bytes over 2 spaces rounds down to 10.
    assert_eq!(judge("pleasepleasepleas x y", 12, 0), Ok(()));
}

#[test]
fn test_judge_rolls_against_score() {
    assert_eq!(judge(HUMBLE, 12, 70), Ok(()));
    assert_eq!(
        judge(HUMBLE, 12, 71),
        Err(Rejection::Unconvinced {
            score: 71,
            roll: 71
        })
    );
    assert_eq!(
        judge("hi there", 12, 0),
        Err(Rejection::Unconvinced { score: 0, roll: 0 })
    );
}

#[test]
fn test_fixed_and_lenient_gates() {
    let mut gate = Fixed { hour: 8, roll: 60 };
    assert_eq!(
        gate.admit(HUMBLE),
        Err(Rejection::Unconvinced {
            score: 51,
            roll: 60
        })
    );
    let mut gate = Fixed { hour: 10, roll: 60 };
    assert_eq!(gate.admit(HUMBLE), Ok(()));
    assert_eq!(Lenient.admit("x"), Ok(()));
}

#[test]
fn test_plea_gate_rejects_shapeless_greetings() {
    assert_eq!(Plea.admit("pleeeeeease"), Err(Rejection::NoSpaces));
}

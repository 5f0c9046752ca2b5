//! The greeting gate.
//!
//! Every program opens with `beg "<greeting>"`. Before the first statement
//! runs, the VM hands that text to a [`Gate`], which may refuse to run the
//! program at all. The default gate, [`Plea`], scores the greeting for
//! politeness, penalises early mornings, and then rolls a die.

use chrono::Timelike;
use thiserror::Error;
use tracing::debug;

/// Why a greeting was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("the greeting has no spaces")]
    NoSpaces,

    #[error("the greeting is too terse")]
    TooFewSpaces,

    #[error("the program was not convinced (rolled {roll}, needed less than {score})")]
    Unconvinced { score: i32, roll: u32 },
}

/// Decides whether a program may run, given its greeting.
pub trait Gate {
    fn admit(&mut self, greeting: &str) -> Result<(), Rejection>;
}

/// Hour before which greetings lose points.
const EARLY_HOUR: u32 = 9;

/// Politeness score of a greeting at the given local hour.
///
/// Matching is case-insensitive; each phrase counts once however often it
/// appears, while every `!` adds two points.
pub fn score(greeting: &str, hour: u32) -> i32 {
    const PHRASES: [(&str, i32); 4] = [
        ("please", 25),
        ("family", 15),
        ("great", 20),
        ("almighty program", 20),
    ];

    let lower = greeting.to_lowercase();
    let mut score = PHRASES
        .iter()
        .filter(|(phrase, _)| lower.contains(phrase))
        .map(|(_, points)| points)
        .sum::<i32>();
    score += 2 * greeting.matches('!').count() as i32;
    if hour < EARLY_HOUR {
        score -= 20;
    }
    score
}

/// The full decision, with the clock and the die supplied by the caller.
///
/// Greetings without spaces, or with more than ten bytes per space, are
/// refused outright. Otherwise a roll in `0..100` must come in under the score.
pub fn judge(greeting: &str, hour: u32, roll: u32) -> Result<(), Rejection> {
    let spaces = greeting.bytes().filter(|&b| b == b' ').count();
    if spaces == 0 {
        return Err(Rejection::NoSpaces);
    }
    if greeting.len() / spaces > 10 {
        return Err(Rejection::TooFewSpaces);
    }

    let score = score(greeting, hour);
    debug!(score, roll, hour, "judging greeting");
    if roll as i64 >= score as i64 {
        return Err(Rejection::Unconvinced { score, roll });
    }
    Ok(())
}

/// The real gate: local time from the system clock and a random roll.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plea;

impl Plea {
    fn roll() -> u32 {
        let mut bytes = [0u8; 4];
        match getrandom::getrandom(&mut bytes) {
            Ok(()) => u32::from_ne_bytes(bytes) % 100,
            Err(err) => {
                debug!(%err, "no system randomness, rolling with the clock");
                chrono::Local::now().timestamp_subsec_nanos() % 100
            }
        }
    }
}

impl Gate for Plea {
    fn admit(&mut self, greeting: &str) -> Result<(), Rejection> {
        let hour = chrono::Local::now().hour();
        judge(greeting, hour, Self::roll())
    }
}

/// A gate with a fixed clock and die, for reproducible runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed {
    pub hour: u32,
    pub roll: u32,
}

impl Gate for Fixed {
    fn admit(&mut self, greeting: &str) -> Result<(), Rejection> {
        judge(greeting, self.hour, self.roll)
    }
}

/// Admits every greeting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lenient;

impl Gate for Lenient {
    fn admit(&mut self, _greeting: &str) -> Result<(), Rejection> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

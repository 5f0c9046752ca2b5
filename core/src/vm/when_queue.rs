//! Deferred conditions registered by `when` clauses.
//!
//! A record is a suspended continuation: when its condition holds, control
//! resumes at the park jump right after the registering opcode. Records are
//! polled after every instruction, but only by the frame that registered them.

use tracing::debug;

use super::error::RuntimeError;
use crate::bytecode::{Obligation, Polarity};

/// One side of a deferred comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Value(i32),
    /// Variable slot, read from the owner's frame at poll time.
    Slot(u8),
}

impl Operand {
    /// Decode a popped operand according to its bit in the mode byte.
    pub fn from_mode(value: i32, mode: i32, bit: i32) -> Operand {
        if mode & bit != 0 {
            Operand::Slot(value as u8)
        } else {
            Operand::Value(value)
        }
    }
}

/// The call that registered a record: function index and frame depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub function: usize,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct When {
    pub polarity: Polarity,
    pub obligation: Obligation,
    pub left: Operand,
    pub right: Operand,
    /// Offset of the park jump.
    pub resume: usize,
    pub owner: Owner,
}

impl When {
    fn holds(&self, left: i64, right: i64) -> bool {
        match self.polarity {
            Polarity::Equal => left == right,
            Polarity::NotEqual => left != right,
        }
    }
}

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Idle,
    /// A record fired; continue at this offset.
    Resume(usize),
}

/// Live records in registration order. Retired entries become `None` so that
/// indices stay stable while scanning.
#[derive(Debug, Default)]
pub struct WhenQueue {
    records: Vec<Option<When>>,
}

impl WhenQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, when: When) {
        debug!(resume = when.resume, ?when.obligation, ?when.polarity, "when registered");
        self.records.push(Some(when));
    }

    fn retire(&mut self, index: usize) {
        if let Some(record) = self.records.get_mut(index) {
            *record = None;
        }
        while matches!(self.records.last(), Some(None)) {
            self.records.pop();
        }
    }

    pub fn live(&self) -> usize {
        self.records.iter().flatten().count()
    }

    /// Scan the records owned by `owner` once.
    ///
    /// The first record whose condition holds fires and ends the scan. A record
    /// whose resume point lies ahead of `pc` lapses: control went back before
    /// its clause.
    pub fn poll(
        &mut self,
        owner: Owner,
        pc: usize,
        mut resolve: impl FnMut(Operand) -> Result<i64, RuntimeError>,
    ) -> Result<Poll, RuntimeError> {
        for index in 0..self.records.len() {
            let Some(when) = &self.records[index] else {
                continue;
            };
            if when.owner != owner {
                continue;
            }
            let left = resolve(when.left)?;
            let right = resolve(when.right)?;
            if when.holds(left, right) {
                let resume = when.resume;
                debug!(resume, pc, "when fired");
                self.retire(index);
                return Ok(Poll::Resume(resume));
            }
            if when.resume > pc {
                debug!(resume = when.resume, pc, "when lapsed");
                self.retire(index);
            }
        }
        Ok(Poll::Idle)
    }

    /// Drop every record owned by a returning call. Returns an error if any of
    /// them was a promise.
    pub fn settle(&mut self, owner: Owner) -> Result<(), When> {
        let mut broken = None;
        for record in self.records.iter_mut() {
            if record.as_ref().is_some_and(|w| w.owner == owner) {
                let when = record.take();
                if broken.is_none() {
                    broken = when.filter(|w| w.obligation == Obligation::Promise);
                }
            }
        }
        while matches!(self.records.last(), Some(None)) {
            self.records.pop();
        }
        match broken {
            Some(when) => Err(when),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: Owner = Owner {
        function: 0,
        depth: 1,
    };

    fn when(left: Operand, right: Operand, resume: usize, obligation: Obligation) -> When {
        When {
            polarity: Polarity::Equal,
            obligation,
            left,
            right,
            resume,
            owner: MAIN,
        }
    }

    fn slots(values: &[i64]) -> impl FnMut(Operand) -> Result<i64, RuntimeError> + '_ {
        move |operand| match operand {
            Operand::Value(v) => Ok(v as i64),
            Operand::Slot(s) => Ok(values[s as usize]),
        }
    }

    #[test]
    fn test_mode_bits_select_slots() {
        assert_eq!(Operand::from_mode(3, 1, 1), Operand::Slot(3));
        assert_eq!(Operand::from_mode(3, 1, 2), Operand::Value(3));
        assert_eq!(Operand::from_mode(7, 3, 2), Operand::Slot(7));
    }

    #[test]
    fn test_first_match_fires_once() {
        let mut queue = WhenQueue::new();
        queue.register(when(Operand::Slot(0), Operand::Value(1), 10, Obligation::Optional));
        queue.register(when(Operand::Slot(0), Operand::Value(1), 20, Obligation::Optional));

        assert_eq!(queue.poll(MAIN, 30, slots(&[0])).unwrap(), Poll::Idle);
        assert_eq!(queue.poll(MAIN, 30, slots(&[1])).unwrap(), Poll::Resume(10));
        assert_eq!(queue.live(), 1);
        assert_eq!(queue.poll(MAIN, 30, slots(&[1])).unwrap(), Poll::Resume(20));
        assert_eq!(queue.live(), 0);
    }

    #[test]
    fn test_not_equal_polarity() {
        let mut queue = WhenQueue::new();
        let mut record = when(Operand::Slot(0), Operand::Value(5), 4, Obligation::Optional);
        record.polarity = Polarity::NotEqual;
        queue.register(record);
        assert_eq!(queue.poll(MAIN, 8, slots(&[5])).unwrap(), Poll::Idle);
        assert_eq!(queue.poll(MAIN, 8, slots(&[6])).unwrap(), Poll::Resume(4));
    }

    #[test]
    fn test_other_frames_are_ignored() {
        let mut queue = WhenQueue::new();
        queue.register(when(Operand::Value(1), Operand::Value(1), 10, Obligation::Optional));
        let callee = Owner {
            function: 1,
            depth: 2,
        };
        assert_eq!(queue.poll(callee, 50, slots(&[])).unwrap(), Poll::Idle);
        assert_eq!(queue.live(), 1);
    }

    #[test]
    fn test_record_lapses_when_control_moves_back() {
        let mut queue = WhenQueue::new();
        queue.register(when(Operand::Slot(0), Operand::Value(1), 10, Obligation::Promise));
        assert_eq!(queue.poll(MAIN, 5, slots(&[0])).unwrap(), Poll::Idle);
        assert_eq!(queue.live(), 0);
        assert_eq!(queue.settle(MAIN), Ok(()));
    }

    #[test]
    fn test_settle_reports_broken_promise() {
        let mut queue = WhenQueue::new();
        queue.register(when(Operand::Slot(0), Operand::Value(1), 10, Obligation::Optional));
        queue.register(when(Operand::Slot(0), Operand::Value(2), 20, Obligation::Promise));

        let broken = queue.settle(MAIN).unwrap_err();
        assert_eq!(broken.resume, 20);
        assert_eq!(queue.live(), 0);
    }

    #[test]
    fn test_settle_drops_optional_records() {
        let mut queue = WhenQueue::new();
        queue.register(when(Operand::Slot(0), Operand::Value(1), 10, Obligation::Optional));
        assert_eq!(queue.settle(MAIN), Ok(()));
        assert_eq!(queue.live(), 0);
    }
}

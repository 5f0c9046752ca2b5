use super::error::RuntimeError;
use super::value::Value;

/// Variable slots of every active call, one fixed-size frame per depth.
///
/// Depth 0 is the program prologue; `main` runs at depth 1. Frames are never
/// shrunk: returning only lowers the depth, and the next call at that depth
/// zeroes the frame again.
#[derive(Debug)]
pub struct Frames {
    slots: Vec<Value>,
    frame_size: usize,
    max_depth: usize,
    depth: usize,
}

impl Frames {
    pub fn new(frame_size: usize, max_depth: usize) -> Self {
        Self {
            slots: vec![Value::default(); frame_size],
            frame_size,
            max_depth,
            depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Enter a new zeroed frame.
    pub fn push(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::ScopeTooDeep);
        }
        self.depth += 1;
        let start = self.depth * self.frame_size;
        let end = start + self.frame_size;
        if self.slots.len() < end {
            self.slots.resize(end, Value::default());
        }
        self.slots[start..end].fill(Value::default());
        Ok(())
    }

    pub fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn offset(&self, slot: u8) -> Result<usize, RuntimeError> {
        let slot = slot as usize;
        if slot >= self.frame_size {
            return Err(RuntimeError::InvalidOperand("variable slot outside the frame"));
        }
        Ok(self.depth * self.frame_size + slot)
    }

    pub fn get(&self, slot: u8) -> Result<Value, RuntimeError> {
        Ok(self.slots[self.offset(slot)?])
    }

    pub fn set(&mut self, slot: u8, value: Value) -> Result<(), RuntimeError> {
        let offset = self.offset(slot)?;
        self.slots[offset] = value;
        Ok(())
    }

    /// Every slot of every frame ever entered.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.slots.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_isolated() {
        let mut frames = Frames::new(4, 3);
        frames.push().unwrap();
        frames.set(0, Value::Int(7)).unwrap();

        frames.push().unwrap();
        assert_eq!(frames.get(0).unwrap(), Value::Int(0));
        frames.set(0, Value::Int(9)).unwrap();

        frames.pop();
        assert_eq!(frames.depth(), 1);
        assert_eq!(frames.get(0).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_reentered_frame_is_zeroed() {
        let mut frames = Frames::new(4, 3);
        frames.push().unwrap();
        frames.set(2, Value::Real(1.5)).unwrap();
        frames.pop();
        frames.push().unwrap();
        assert_eq!(frames.get(2).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_depth_limit() {
        let mut frames = Frames::new(4, 2);
        frames.push().unwrap();
        frames.push().unwrap();
        assert!(matches!(frames.push(), Err(RuntimeError::ScopeTooDeep)));
    }

    #[test]
    fn test_slot_outside_frame() {
        let mut frames = Frames::new(4, 2);
        frames.push().unwrap();
        assert!(matches!(
            frames.set(4, Value::Int(1)),
            Err(RuntimeError::InvalidOperand(_))
        ));
    }
}

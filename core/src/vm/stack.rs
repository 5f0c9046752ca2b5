use core::fmt;

/// Pushing onto a stack that is already at its maximum size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// A stack with a hard maximum size.
///
/// The VM keeps two of these: the operand stack and the return-address stack.
/// Unlike a plain `Vec`, pushing past the limit is reported instead of growing.
pub struct Stack<T> {
    items: Vec<T>,
    max_size: usize,
}

impl<T> Stack<T> {
    /// Creates an empty stack holding at most `max_size` elements.
    ///
    /// Pre-allocates up to 256 elements to avoid frequent reallocations
    /// during normal execution.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Vec::with_capacity(max_size.min(256)),
            max_size,
        }
    }

    /// Pushes a value, failing if the stack is full.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), Overflow> {
        if self.items.len() >= self.max_size {
            return Err(Overflow);
        }
        self.items.push(value);
        Ok(())
    }

    /// Removes and returns the top value, or `None` if the stack is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }
}

impl<T: fmt::Debug> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("items", &self.items)
            .field("len", &self.items.len())
            .field("capacity", &self.max_size)
            .finish()
    }
}

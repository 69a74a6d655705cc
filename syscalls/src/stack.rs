use crate::error::SyscallError;
use crate::CAPACITY;

/// LIFO of `i64` with a fixed number of slots
///
/// `top` is the index of the last pushed value, `-1` when empty.
/// Invariant: `-1 <= top < CAPACITY`.
#[derive(Debug, Clone)]
pub struct BoundedStack {
    slots: [i64; CAPACITY],
    top: isize,
}

impl BoundedStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [0; CAPACITY],
            top: -1,
        }
    }

    /// # Errors
    /// `Full` once all slots are taken.
    pub fn push(&mut self, value: i64) -> Result<(), SyscallError> {
        let next = usize::try_from(self.top + 1).unwrap_or(0);
        let Some(slot) = self.slots.get_mut(next) else {
            log::info!("stack is full.");
            return Err(SyscallError::Full("stack"));
        };
        *slot = value;
        self.top += 1;
        log::info!("push : {value}");
        Ok(())
    }

    /// # Errors
    /// `Empty` if nothing was pushed.
    pub fn pop(&mut self) -> Result<i64, SyscallError> {
        let Ok(top) = usize::try_from(self.top) else {
            log::info!("stack is empty.");
            return Err(SyscallError::Empty("stack"));
        };
        let value = std::mem::take(&mut self.slots[top]);
        self.top -= 1;
        log::info!("pop : {value}");
        Ok(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(self.top + 1).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top < 0
    }
}

impl Default for BoundedStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut stack = BoundedStack::new();
        stack.push(5).unwrap();
        stack.push(9).unwrap();
        assert_eq!(stack.pop(), Ok(9));
        assert_eq!(stack.pop(), Ok(5));
        assert_eq!(stack.pop(), Err(SyscallError::Empty("stack")));
    }

    #[test]
    fn test_fills_every_slot() {
        let mut stack = BoundedStack::new();
        for v in 0..CAPACITY {
            stack.push(i64::try_from(v).unwrap()).unwrap();
        }
        assert_eq!(stack.len(), CAPACITY);
        assert_eq!(stack.push(99), Err(SyscallError::Full("stack")));
        assert_eq!(stack.pop(), Ok(i64::try_from(CAPACITY - 1).unwrap()));
        stack.push(99).unwrap();
    }

    #[test]
    fn test_pop_clears_slot() {
        let mut stack = BoundedStack::new();
        stack.push(-7).unwrap();
        stack.pop().unwrap();
        assert!(stack.is_empty());
        assert!(stack.slots.iter().all(|v| *v == 0));
    }
}

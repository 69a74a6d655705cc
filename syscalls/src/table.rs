//! System call numbers and the dispatcher behind them

use crate::error::SyscallError;
use crate::queue::BoundedQueue;
use crate::stack::BoundedStack;

pub const NR_PUSH: i64 = 453;
pub const NR_POP: i64 = 454;
pub const NR_ENQUEUE: i64 = 455;
pub const NR_DEQUEUE: i64 = 456;

/// The containers reachable through the four calls
#[derive(Debug, Default, Clone)]
pub struct Syscalls {
    stack: BoundedStack,
    queue: BoundedQueue,
}

impl Syscalls {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// `Full` if the stack has no free slot.
    pub fn push(&mut self, value: i64) -> Result<(), SyscallError> {
        self.stack.push(value)
    }

    /// # Errors
    /// `Empty` if the stack holds nothing.
    pub fn pop(&mut self) -> Result<i64, SyscallError> {
        self.stack.pop()
    }

    /// # Errors
    /// `Full` if the queue has no free slot.
    pub fn enqueue(&mut self, value: i64) -> Result<(), SyscallError> {
        self.queue.enqueue(value)
    }

    /// # Errors
    /// `Empty` if the queue holds nothing.
    pub fn dequeue(&mut self) -> Result<i64, SyscallError> {
        self.queue.dequeue()
    }

    #[must_use]
    pub fn stack(&self) -> &BoundedStack {
        &self.stack
    }

    #[must_use]
    pub fn queue(&self) -> &BoundedQueue {
        &self.queue
    }

    /// Typed dispatch by call number.
    ///
    /// Push and enqueue return `0` on success, pop and dequeue the value.
    ///
    /// # Errors
    /// `NoSuchCall` for an unknown number, `MissingArgument` for push or
    /// enqueue without a value, and whatever the container reports.
    pub fn call(&mut self, nr: i64, arg: Option<i64>) -> Result<i64, SyscallError> {
        let needs = |arg: Option<i64>| arg.ok_or(SyscallError::MissingArgument(nr));
        match nr {
            NR_PUSH => self.push(needs(arg)?).map(|()| 0),
            NR_POP => self.pop(),
            NR_ENQUEUE => self.enqueue(needs(arg)?).map(|()| 0),
            NR_DEQUEUE => self.dequeue(),
            _ => Err(SyscallError::NoSuchCall(nr)),
        }
    }

    /// Raw call surface: failures collapse to `-1`.
    ///
    /// A popped or dequeued `-1` is indistinguishable from a failure here;
    /// use [`Syscalls::call`] when that matters.
    pub fn syscall(&mut self, nr: i64, arg: Option<i64>) -> i64 {
        self.call(nr, arg).unwrap_or_else(|err| {
            log::debug!("syscall {nr} failed: {err}");
            -1
        })
    }
}

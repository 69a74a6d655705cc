//! Stack and queue services exposed as numbered system calls
//!
//! Two fixed-capacity containers of `i64` values, each reachable through two
//! calls. Failures come back as `-1` on the raw call surface.

pub mod error;
pub mod queue;
pub mod stack;
pub mod table;

pub use error::SyscallError;
pub use queue::BoundedQueue;
pub use stack::BoundedStack;
pub use table::{Syscalls, NR_DEQUEUE, NR_ENQUEUE, NR_POP, NR_PUSH};

/// Number of 8-byte slots in each container (256 bytes of storage)
pub const CAPACITY: usize = 256 / std::mem::size_of::<i64>();

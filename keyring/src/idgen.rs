use std::sync::atomic::{AtomicU32, Ordering};

/// Number of bits of a device minor number
pub const MINOR_BITS: u32 = 20;

/// Largest valid minor number
pub const MINOR_MAX: u32 = (1 << MINOR_BITS) - 1;

/// Device identity: the minor number a call arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Minor(u32);

impl Minor {
    /// Minor of the controller device
    pub const CONTROL: Minor = Minor(0);

    #[must_use]
    pub fn new(minor: u32) -> Self {
        Self(minor)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_control(self) -> bool {
        self == Self::CONTROL
    }
}

impl std::fmt::Display for Minor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thread-safe minor number generator
///
/// Hands out minors starting at 1; minor 0 belongs to the controller.
/// Minors are not reused.
#[derive(Debug)]
pub struct MinorGen {
    next_minor: AtomicU32,
}

impl MinorGen {
    pub fn new() -> Self {
        Self {
            next_minor: AtomicU32::new(1),
        }
    }

    /// Get the next unused minor, `None` once the minor space is used up
    pub fn get_next(&self) -> Option<Minor> {
        let minor = self.next_minor.fetch_add(1, Ordering::Relaxed);
        (1..=MINOR_MAX).contains(&minor).then_some(Minor(minor))
    }
}

impl Default for MinorGen {
    fn default() -> Self {
        Self::new()
    }
}

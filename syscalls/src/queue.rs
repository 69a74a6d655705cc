use crate::error::SyscallError;
use crate::CAPACITY;

/// Circular FIFO of `i64`
///
/// `front` trails the oldest value by one slot and `rear` is the newest
/// value. `front == rear` means empty, `rear + 1 == front` (mod capacity)
/// means full, so one slot always stays unused.
#[derive(Debug, Clone)]
pub struct BoundedQueue {
    slots: [i64; CAPACITY],
    front: usize,
    rear: usize,
}

impl BoundedQueue {
    /// Values the queue holds when full
    pub const USABLE: usize = CAPACITY - 1;

    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [0; CAPACITY],
            front: 0,
            rear: 0,
        }
    }

    /// # Errors
    /// `Full` once `USABLE` values are queued.
    pub fn enqueue(&mut self, value: i64) -> Result<(), SyscallError> {
        let next = (self.rear + 1) % CAPACITY;
        if next == self.front {
            log::info!("queue is full.");
            return Err(SyscallError::Full("queue"));
        }
        self.rear = next;
        self.slots[self.rear] = value;
        log::info!("Enqueue : {value}");
        Ok(())
    }

    /// # Errors
    /// `Empty` if nothing is queued.
    pub fn dequeue(&mut self) -> Result<i64, SyscallError> {
        if self.front == self.rear {
            log::info!("queue is empty.");
            return Err(SyscallError::Empty("queue"));
        }
        self.front = (self.front + 1) % CAPACITY;
        let value = self.slots[self.front];
        log::info!("Dequeue : {value}");
        Ok(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        (self.rear + CAPACITY - self.front) % CAPACITY
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front == self.rear
    }
}

impl Default for BoundedQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = BoundedQueue::new();
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();
        assert_eq!(queue.dequeue(), Ok(1));
        assert_eq!(queue.dequeue(), Ok(2));
        assert_eq!(queue.dequeue(), Err(SyscallError::Empty("queue")));
    }

    #[test]
    fn test_full_keeps_one_slot_free() {
        let mut queue = BoundedQueue::new();
        for v in 0..BoundedQueue::USABLE {
            queue.enqueue(i64::try_from(v).unwrap()).unwrap();
        }
        assert_eq!(queue.len(), BoundedQueue::USABLE);
        assert_eq!(queue.enqueue(-1), Err(SyscallError::Full("queue")));
    }

    #[test]
    fn test_wraps_around() {
        let mut queue = BoundedQueue::new();
        for round in 0..(3 * CAPACITY) {
            let v = i64::try_from(round).unwrap();
            queue.enqueue(v).unwrap();
            queue.enqueue(v + 1000).unwrap();
            assert_eq!(queue.dequeue(), Ok(v));
            assert_eq!(queue.dequeue(), Ok(v + 1000));
        }
        assert!(queue.is_empty());
    }
}

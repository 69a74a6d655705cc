#[macro_use]
extern crate hamcrest;

use hamcrest::prelude::*;
use syscalls::{BoundedQueue, Syscalls, CAPACITY, NR_DEQUEUE, NR_ENQUEUE, NR_POP, NR_PUSH};

#[test]
fn test_stack_and_queue_are_independent() {
    let mut sys = Syscalls::new();
    for v in [10, 20, 30] {
        assert_that!(sys.syscall(NR_PUSH, Some(v)), is(equal_to(0)));
        assert_that!(sys.syscall(NR_ENQUEUE, Some(v)), is(equal_to(0)));
    }

    let popped: Vec<i64> = (0..3).map(|_| sys.syscall(NR_POP, None)).collect();
    let dequeued: Vec<i64> = (0..3).map(|_| sys.syscall(NR_DEQUEUE, None)).collect();
    assert_that!(popped, is(equal_to(vec![30, 20, 10])));
    assert_that!(dequeued, is(equal_to(vec![10, 20, 30])));

    assert_that!(sys.syscall(NR_POP, None), is(equal_to(-1)));
    assert_that!(sys.syscall(NR_DEQUEUE, None), is(equal_to(-1)));
}

#[test]
fn test_capacity_limits() {
    let mut sys = Syscalls::new();
    let mut pushed = 0;
    while sys.syscall(NR_PUSH, Some(1)) == 0 {
        pushed += 1;
    }
    let mut queued = 0;
    while sys.syscall(NR_ENQUEUE, Some(1)) == 0 {
        queued += 1;
    }
    assert_that!(pushed, is(equal_to(CAPACITY)));
    assert_that!(queued, is(equal_to(BoundedQueue::USABLE)));
    assert_that!(sys.stack().len(), is(equal_to(CAPACITY)));
}

#[test]
fn test_queue_recovers_after_full() {
    let mut sys = Syscalls::new();
    while sys.enqueue(7).is_ok() {}
    assert_that!(sys.dequeue(), is(equal_to(Ok(7))));
    assert_that!(sys.enqueue(8).is_ok(), is(true));
    let drained: Vec<i64> = std::iter::from_fn(|| sys.dequeue().ok()).collect();
    assert_that!(drained.len(), is(equal_to(BoundedQueue::USABLE)));
    assert_that!(*drained.last().unwrap(), is(equal_to(8)));
}

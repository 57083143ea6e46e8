//! Bounded lock-free multi-producer/multi-consumer queue.
//!
//! A power-of-two ring of sequence-stamped cells (Vyukov's bounded MPMC
//! protocol). A producer claims cell `pos` when its sequence equals `pos`,
//! writes the value, then publishes with `sequence = pos + 1`; a consumer
//! claims when the sequence equals `pos + 1`, reads, then recycles the cell
//! with `sequence = pos + capacity`. Both positions advance through
//! compare-exchange, so the queue stays lock-free under contention.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Number of failed retries that use a CPU pause before falling back to
/// `thread::yield_now` in the blocking variants.
const SPIN_RETRIES: usize = 10;

struct Slot<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded MPMC ring queue.
///
/// Any number of threads may call [`try_push`](Self::try_push) and
/// [`try_pop`](Self::try_pop) concurrently through a shared reference.
pub struct MpmcQueue<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    enqueue_pos: CachePadded<AtomicUsize>,
    dequeue_pos: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send> Send for MpmcQueue<T> {}
unsafe impl<T: Send> Sync for MpmcQueue<T> {}

impl<T> MpmcQueue<T> {
    /// Create a queue holding at least `capacity` elements.
    ///
    /// The capacity is rounded up to the next power of two (minimum 2).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let buffer = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buffer,
            mask: capacity - 1,
            enqueue_pos: CachePadded::new(AtomicUsize::new(0)),
            dequeue_pos: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Maximum number of elements the queue can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Attempt to enqueue without blocking.
    ///
    /// # Errors
    ///
    /// Returns the value back when the queue is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            #[allow(clippy::cast_possible_wrap)]
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe {
                            (*slot.value.get()).write(value);
                        }
                        slot.sequence.store(pos + 1, Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return Err(value);
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Attempt to dequeue without blocking, returning `None` when empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            #[allow(clippy::cast_possible_wrap)]
            let diff = seq as isize - (pos + 1) as isize;

            if diff == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { (*slot.value.get()).assume_init_read() };
                        slot.sequence
                            .store(pos + self.buffer.len(), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Enqueue with a bounded retry budget.
    ///
    /// Retries spin with a CPU pause for the first few attempts, then yield
    /// the thread. Exhausting the budget is a shed-load signal.
    ///
    /// # Errors
    ///
    /// Returns the value back when the budget is exhausted.
    pub fn push(&self, value: T, max_retries: usize) -> Result<(), T> {
        let mut value = value;
        for attempt in 0..max_retries {
            match self.try_push(value) {
                Ok(()) => return Ok(()),
                Err(v) => value = v,
            }
            backoff(attempt);
        }
        Err(value)
    }

    /// Dequeue with a bounded retry budget.
    ///
    /// Returns `None` when the budget is exhausted without finding a value.
    pub fn pop(&self, max_retries: usize) -> Option<T> {
        for attempt in 0..max_retries {
            if let Some(value) = self.try_pop() {
                return Some(value);
            }
            backoff(attempt);
        }
        None
    }

    /// Check whether the queue appears empty.
    ///
    /// Approximate under concurrency.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let enq = self.enqueue_pos.load(Ordering::Acquire);
        let deq = self.dequeue_pos.load(Ordering::Acquire);
        enq == deq
    }

    /// Approximate number of queued elements.
    #[must_use]
    pub fn len(&self) -> usize {
        let enq = self.enqueue_pos.load(Ordering::Acquire);
        let deq = self.dequeue_pos.load(Ordering::Acquire);
        enq.wrapping_sub(deq) & self.mask
    }
}

impl<T> Drop for MpmcQueue<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}

#[inline]
fn backoff(attempt: usize) {
    if attempt < SPIN_RETRIES {
        std::hint::spin_loop();
    } else {
        std::thread::yield_now();
    }
}

//! Unbounded lock-free single-producer/single-consumer queue.
//!
//! Singly-linked list with a dummy head node. The producer publishes a new
//! tail with a release store; the consumer observes it with an acquire load
//! and reclaims popped nodes. Splitting the queue into [`Producer`] and
//! [`Consumer`] handles makes the single-producer/single-consumer contract
//! structural: neither handle is `Clone` or `Sync`.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

struct Node<T> {
    next: AtomicPtr<Node<T>>,
    value: Option<T>,
}

impl<T> Node<T> {
    fn new(value: Option<T>) -> *mut Self {
        Box::into_raw(Box::new(Self {
            next: AtomicPtr::new(ptr::null_mut()),
            value,
        }))
    }
}

/// State shared by the two handles. `head` trails the consumer, `tail`
/// trails the producer; they sit on distinct cache lines.
struct Shared<T> {
    head: CachePadded<AtomicPtr<Node<T>>>,
    tail: CachePadded<AtomicPtr<Node<T>>>,
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // Both handles are gone, so the list is private to this thread.
        let mut node = *self.head.get_mut();
        while !node.is_null() {
            let boxed = unsafe { Box::from_raw(node) };
            node = boxed.next.load(Ordering::Relaxed);
        }
    }
}

/// The producing half of an SPSC queue.
///
/// `Send` but not `Clone`/`Sync`; move it to the producing thread.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
    /// Producer-private cached tail; always the last node in the list.
    tail: *mut Node<T>,
}

/// The consuming half of an SPSC queue.
///
/// `Send` but not `Clone`/`Sync`; move it to the consuming thread.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    /// Consumer-private cached head; always the current dummy node.
    head: *mut Node<T>,
}

unsafe impl<T: Send> Send for Producer<T> {}
unsafe impl<T: Send> Send for Consumer<T> {}

/// Create a new SPSC queue, returning its producer and consumer handles.
#[must_use]
pub fn channel<T>() -> (Producer<T>, Consumer<T>) {
    let dummy = Node::new(None);
    let shared = Arc::new(Shared {
        head: CachePadded::new(AtomicPtr::new(dummy)),
        tail: CachePadded::new(AtomicPtr::new(dummy)),
    });
    (
        Producer {
            shared: Arc::clone(&shared),
            tail: dummy,
        },
        Consumer {
            shared,
            head: dummy,
        },
    )
}

impl<T> Producer<T> {
    /// Enqueue a value. The queue is unbounded, so this always succeeds.
    pub fn push(&mut self, value: T) {
        let node = Node::new(Some(value));
        // Publish the new node; the release store pairs with the consumer's
        // acquire load of `next`.
        unsafe {
            (*self.tail).next.store(node, Ordering::Release);
        }
        self.tail = node;
        self.shared.tail.store(node, Ordering::Release);
    }
}

impl<T> Consumer<T> {
    /// Dequeue the oldest pending value, or `None` when the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        let head = self.head;
        let next = unsafe { (*head).next.load(Ordering::Acquire) };
        if next.is_null() {
            return None;
        }

        let value = unsafe { (*next).value.take() };
        self.shared.head.store(next, Ordering::Release);
        self.head = next;
        // The old dummy is ours to reclaim.
        unsafe {
            drop(Box::from_raw(head));
        }
        value
    }

    /// Check whether the queue currently has no pending values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        unsafe { (*self.head).next.load(Ordering::Acquire).is_null() }
    }

    /// Approximate number of pending values.
    ///
    /// Walks the list; the producer may append concurrently, so the result
    /// is a monitoring hint, not an exact count.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut node = unsafe { (*self.head).next.load(Ordering::Acquire) };
        while !node.is_null() {
            count += 1;
            node = unsafe { (*node).next.load(Ordering::Acquire) };
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_push_pop_fifo() {
        let (mut tx, mut rx) = channel::<u32>();
        assert!(rx.is_empty());
        assert_eq!(rx.pop(), None);

        for i in 0..100 {
            tx.push(i);
        }
        assert_eq!(rx.len(), 100);
        for i in 0..100 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn test_cross_thread_order_preserved() {
        const N: u64 = 100_000;
        let (mut tx, mut rx) = channel::<u64>();

        let producer = thread::spawn(move || {
            for i in 0..N {
                tx.push(i);
            }
        });

        // Dequeued items must form a prefix of the enqueued sequence, in
        // enqueue order.
        let mut expected = 0;
        while expected < N {
            if let Some(value) = rx.pop() {
                assert_eq!(value, expected);
                expected += 1;
            } else {
                std::hint::spin_loop();
            }
        }
        producer.join().unwrap();
        assert!(rx.is_empty());
    }

    #[test]
    fn test_drop_reclaims_pending_nodes() {
        let (mut tx, rx) = channel::<Vec<u8>>();
        for _ in 0..1000 {
            tx.push(vec![0u8; 64]);
        }
        // Dropping both halves with values still queued must not leak or
        // double-free; exercised under the test allocator.
        drop(tx);
        drop(rx);
    }

    #[test]
    fn test_interleaved_push_pop() {
        let (mut tx, mut rx) = channel::<u32>();
        tx.push(1);
        assert_eq!(rx.pop(), Some(1));
        tx.push(2);
        tx.push(3);
        assert_eq!(rx.pop(), Some(2));
        tx.push(4);
        assert_eq!(rx.pop(), Some(3));
        assert_eq!(rx.pop(), Some(4));
        assert_eq!(rx.pop(), None);
    }
}

//! Double-buffered event channel between two regions.
//!
//! A connection crossing a region boundary is decoupled by a pair of
//! single-producer single-consumer queues with alternating roles: at any
//! instant the producer region appends to the *filling* queue while the
//! consumer region pops the *draining* queue. The producer's switch tick
//! swaps the roles, publishing the queued events; the consumer's work tick
//! drains the published batch to the downstream handler.
//!
//! The protocol guarantees that
//!
//! 1. events queued before a swap are delivered on a consumer tick that
//!    follows the swap, never before,
//! 2. no event is delivered twice,
//! 3. events queued after a swap never appear in the batch published by
//!    that swap,
//! 4. the swap itself is a constant-time, wait-free operation for the
//!    producer.
//!
//! The only data shared between the two threads are the index of the
//! draining queue and a flag recording whether the consumer has exhausted
//! it. A swap is refused while the previous batch is still being drained,
//! in which case the queued events simply stay in the filling queue until
//! the next switch tick.

mod queue;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use queue::{spsc_queue, Consumer, Producer};

/// State shared between the two sides of a swap buffer.
struct SwapShared {
    /// Index of the queue currently owned by the consumer.
    draining: AtomicUsize,
    /// Whether the consumer has exhausted the draining queue.
    drained: AtomicBool,
}

/// The producer-side handle of a swap buffer.
///
/// Both methods must be invoked from the producer region's thread; the
/// handle is not `Sync`, so sharing it requires external synchronization
/// which establishes the necessary ordering.
pub struct SwapProducer<T> {
    queues: [Producer<T>; 2],
    shared: Arc<SwapShared>,
    /// Index of the queue currently filled by this side.
    filling: usize,
    /// Number of values pushed to the filling queue since the last swap.
    pending: usize,
}

impl<T> SwapProducer<T> {
    /// Appends a value to the filling queue.
    pub fn push(&mut self, value: T) {
        self.queues[self.filling].push(value);
        self.pending += 1;
    }

    /// Publishes the filling queue to the consumer, if possible.
    ///
    /// The swap is skipped when nothing was pushed since the last swap, or
    /// when the consumer has not yet exhausted the previously published
    /// batch; queued values then remain pending until a later call.
    pub fn switch(&mut self) {
        if self.pending == 0 {
            return;
        }
        // Ordering: Acquire synchronizes with the Release store in `drain`
        // so that the consumer's pops on the queue about to become the
        // filling queue happen before any subsequent push to it.
        if !self.shared.drained.load(Ordering::Acquire) {
            return;
        }

        let published = self.filling;
        self.filling = 1 - self.filling;
        self.pending = 0;

        self.shared.draining.store(published, Ordering::Relaxed);
        // Ordering: this Release store publishes the new draining index; it
        // synchronizes with the Acquire load in `drain`.
        self.shared.drained.store(false, Ordering::Release);
    }
}

impl<T> fmt::Debug for SwapProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SwapProducer")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

/// The consumer-side handle of a swap buffer.
///
/// [`drain`](SwapConsumer::drain) must be invoked from the consumer
/// region's thread; the handle is not `Sync`.
pub struct SwapConsumer<T> {
    queues: [Consumer<T>; 2],
    shared: Arc<SwapShared>,
}

impl<T> SwapConsumer<T> {
    /// Pops the published batch, delivering each value downstream.
    ///
    /// Does nothing if no unconsumed batch has been published.
    pub fn drain(&mut self, mut deliver: impl FnMut(T)) {
        // Ordering: Acquire synchronizes with the Release store in `switch`
        // so that the draining index read below is the one published with
        // the batch.
        if self.shared.drained.load(Ordering::Acquire) {
            return;
        }

        let draining = self.shared.draining.load(Ordering::Relaxed);
        while let Some(value) = self.queues[draining].pop() {
            deliver(value);
        }

        // Ordering: this Release store hands the exhausted queue back to
        // the producer side.
        self.shared.drained.store(true, Ordering::Release);
    }
}

impl<T> fmt::Debug for SwapConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SwapConsumer").finish_non_exhaustive()
    }
}

/// Creates the producer and consumer sides of a swap buffer.
pub fn swap_buffer<T>() -> (SwapProducer<T>, SwapConsumer<T>) {
    let (producer_a, consumer_a) = spsc_queue();
    let (producer_b, consumer_b) = spsc_queue();

    let shared = Arc::new(SwapShared {
        draining: AtomicUsize::new(0),
        drained: AtomicBool::new(true),
    });

    let producer = SwapProducer {
        queues: [producer_a, producer_b],
        shared: shared.clone(),
        filling: 1,
        pending: 0,
    };
    let consumer = SwapConsumer {
        queues: [consumer_a, consumer_b],
        shared,
    };

    (producer, consumer)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    fn collect(consumer: &mut SwapConsumer<u64>) -> Vec<u64> {
        let mut values = Vec::new();
        consumer.drain(|v| values.push(v));

        values
    }

    #[test]
    fn batch_is_published_by_the_switch() {
        let (mut producer, mut consumer) = swap_buffer();

        producer.push(1);
        producer.push(2);

        // Not yet published.
        assert!(collect(&mut consumer).is_empty());

        producer.switch();
        assert_eq!(collect(&mut consumer), vec![1, 2]);

        // A batch is observable exactly once.
        assert!(collect(&mut consumer).is_empty());
    }

    #[test]
    fn values_pushed_after_the_switch_wait_for_the_next_one() {
        let (mut producer, mut consumer) = swap_buffer();

        producer.push(1);
        producer.switch();
        producer.push(2);

        assert_eq!(collect(&mut consumer), vec![1]);

        producer.switch();
        assert_eq!(collect(&mut consumer), vec![2]);
    }

    #[test]
    fn switch_without_drain_keeps_values_pending() {
        let (mut producer, mut consumer) = swap_buffer();

        producer.push(1);
        producer.switch();

        // The consumer has not drained yet, so this switch is refused and
        // the value stays pending.
        producer.push(2);
        producer.switch();

        assert_eq!(collect(&mut consumer), vec![1]);

        producer.switch();
        assert_eq!(collect(&mut consumer), vec![2]);
    }

    #[test]
    fn empty_switch_is_a_no_op() {
        let (mut producer, mut consumer) = swap_buffer();

        producer.switch();
        assert!(collect(&mut consumer).is_empty());

        producer.push(7);
        producer.switch();
        assert_eq!(collect(&mut consumer), vec![7]);
    }

    #[test]
    fn no_value_is_lost_or_duplicated_across_threads() {
        const VALUE_COUNT: u64 = if cfg!(miri) { 500 } else { 50_000 };

        let (mut producer, mut consumer) = swap_buffer();

        let th = thread::spawn(move || {
            let mut received = Vec::new();
            while (received.len() as u64) < VALUE_COUNT {
                consumer.drain(|v| received.push(v));
            }

            received
        });

        for i in 0..VALUE_COUNT {
            producer.push(i);
            if i % 7 == 0 {
                producer.switch();
            }
        }
        // Publish whatever is still pending; the consumer may refuse a few
        // swaps, so keep switching until everything went through.
        loop {
            producer.switch();
            if producer.pending == 0 {
                break;
            }
            thread::yield_now();
        }

        let received = th.join().unwrap();
        assert_eq!(received, (0..VALUE_COUNT).collect::<Vec<_>>());
    }
}

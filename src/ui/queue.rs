//! Inbound batch queue
//!
//! One producer (the transport listener) appends decoded batches; one
//! consumer (the render loop) drains them in order once per tick. The
//! producer only holds the lock long enough to push.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::protocol::{decode_redraw, RedrawEvent, Value};

/// Atomically delivered group of events
pub type Batch = Vec<RedrawEvent>;

struct Inner {
    batches: VecDeque<Batch>,
    /// Backlog warning already issued for the current overrun
    over_high_water: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    high_water_mark: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking peer leaves the queue itself intact
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Producer handle
#[derive(Clone)]
pub struct BatchSender {
    shared: Arc<Shared>,
}

/// Consumer handle
pub struct BatchReceiver {
    shared: Arc<Shared>,
}

/// Create a queue that warns once its backlog exceeds `high_water_mark`
pub fn batch_queue(high_water_mark: usize) -> (BatchSender, BatchReceiver) {
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            batches: VecDeque::new(),
            over_high_water: false,
        }),
        high_water_mark: high_water_mark.max(1),
    });
    (
        BatchSender {
            shared: Arc::clone(&shared),
        },
        BatchReceiver { shared },
    )
}

impl BatchSender {
    /// Append a decoded batch. Never drops: ordering matters more than memory.
    pub fn send(&self, batch: Batch) {
        if batch.is_empty() {
            return;
        }
        let mut inner = self.shared.lock();
        inner.batches.push_back(batch);
        if inner.batches.len() > self.shared.high_water_mark && !inner.over_high_water {
            inner.over_high_water = true;
            warn!(
                "Redraw backlog: {} batches queued (high-water mark {})",
                inner.batches.len(),
                self.shared.high_water_mark
            );
        }
    }

    /// Decode a redraw notification and append it as one batch
    pub fn send_notification(&self, params: &[Value]) {
        self.send(decode_redraw(params));
    }
}

impl BatchReceiver {
    /// Take every queued batch, oldest first
    pub fn drain(&self) -> Vec<Batch> {
        let mut inner = self.shared.lock();
        if inner.over_high_water {
            info!("Redraw backlog cleared ({} batches)", inner.batches.len());
            inner.over_high_water = false;
        }
        inner.batches.drain(..).collect()
    }

    /// Take the oldest batch
    pub fn try_recv(&self) -> Option<Batch> {
        let mut inner = self.shared.lock();
        let batch = inner.batches.pop_front();
        if inner.batches.len() <= self.shared.high_water_mark {
            inner.over_high_water = false;
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.shared.lock().batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = batch_queue(8);
        tx.send(vec![RedrawEvent::GridClear { grid: 1 }]);
        tx.send(vec![RedrawEvent::GridClear { grid: 2 }]);
        tx.send(vec![]);
        assert_eq!(rx.len(), 2);
        assert_eq!(rx.try_recv(), Some(vec![RedrawEvent::GridClear { grid: 1 }]));
        let rest = rx.drain();
        assert_eq!(rest, vec![vec![RedrawEvent::GridClear { grid: 2 }]]);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_over_high_water_keeps_everything() {
        let (tx, rx) = batch_queue(2);
        for grid in 0..5 {
            tx.send(vec![RedrawEvent::GridClear { grid }]);
        }
        let drained = rx.drain();
        assert_eq!(drained.len(), 5);
        assert_eq!(drained[4], vec![RedrawEvent::GridClear { grid: 4 }]);
    }

    #[test]
    fn test_producer_thread_ordering() {
        let (tx, rx) = batch_queue(1024);
        let producer = thread::spawn(move || {
            for grid in 0..100u64 {
                tx.send(vec![RedrawEvent::GridClear { grid }]);
            }
        });
        producer.join().unwrap();
        let grids: Vec<u64> = rx
            .drain()
            .into_iter()
            .flatten()
            .map(|e| match e {
                RedrawEvent::GridClear { grid } => grid,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(grids, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_send_notification_decodes() {
        let (tx, rx) = batch_queue(8);
        tx.send_notification(&[Value::Array(vec![
            "grid_clear".into(),
            Value::Array(vec![1.into()]),
        ])]);
        assert_eq!(rx.drain(), vec![vec![RedrawEvent::GridClear { grid: 1 }]]);
    }
}

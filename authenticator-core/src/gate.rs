//! `gate` provides [`QueueGate`], the counting join behind every multi connection request.
use std::sync::{Arc, Mutex, MutexGuard};

use rst_common::with_logging::log::warn;
use rst_common::with_tokio::tokio::sync::oneshot;

type OnFinished<T> = Box<dyn FnOnce(Vec<T>) + Send>;

struct GateState<T> {
    remaining: usize,
    results: Vec<T>,
    on_finished: Option<OnFinished<T>>,
}

/// `QueueGate` waits for a known number of completions, then hands every collected result
/// to `on_finished` exactly once
///
/// The callback runs outside of the internal lock, so it is free to touch the gate again.
/// Completions arriving after the gate fired are dropped.
pub struct QueueGate<T> {
    state: Arc<Mutex<GateState<T>>>,
}

impl<T> Clone for QueueGate<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Send + 'static> QueueGate<T> {
    pub fn new<F>(count: usize, on_finished: F) -> Self
    where
        F: FnOnce(Vec<T>) + Send + 'static,
    {
        if count == 0 {
            on_finished(Vec::new());
            return Self {
                state: Arc::new(Mutex::new(GateState {
                    remaining: 0,
                    results: Vec::new(),
                    on_finished: None,
                })),
            };
        }

        Self {
            state: Arc::new(Mutex::new(GateState {
                remaining: count,
                results: Vec::with_capacity(count),
                on_finished: Some(Box::new(on_finished)),
            })),
        }
    }

    /// `with_channel` builds a gate whose aggregate is delivered through a oneshot channel
    pub fn with_channel(count: usize) -> (Self, oneshot::Receiver<Vec<T>>) {
        let (tx, rx) = oneshot::channel();
        let gate = Self::new(count, move |results| {
            let _ = tx.send(results);
        });

        (gate, rx)
    }

    pub fn complete(&self, result: T) {
        let finished = {
            let mut state = self.lock();
            if state.remaining == 0 {
                warn!("[gate:complete] extra completion ignored");
                return;
            }

            state.results.push(result);
            state.remaining -= 1;

            if state.remaining == 0 {
                let results = std::mem::take(&mut state.results);
                state.on_finished.take().map(|callback| (callback, results))
            } else {
                None
            }
        };

        if let Some((callback, results)) = finished {
            callback(results)
        }
    }

    pub fn remaining(&self) -> usize {
        self.lock().remaining
    }

    fn lock(&self) -> MutexGuard<'_, GateState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rst_common::with_tokio::tokio;

    #[test]
    fn test_fires_once_after_all_completions() {
        let fired = Arc::new(AtomicUsize::new(0));
        let collected = Arc::new(Mutex::new(Vec::new()));

        let fired_cb = fired.clone();
        let collected_cb = collected.clone();
        let gate = QueueGate::new(3, move |results: Vec<u32>| {
            fired_cb.fetch_add(1, Ordering::SeqCst);
            collected_cb.lock().unwrap().extend(results);
        });

        gate.complete(3);
        gate.complete(1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(gate.remaining(), 1);

        gate.complete(2);
        gate.complete(4);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let mut results = collected.lock().unwrap().clone();
        results.sort();
        assert_eq!(results, vec![1, 2, 3])
    }

    #[test]
    fn test_zero_fires_immediately() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_cb = fired.clone();
        let gate = QueueGate::new(0, move |results: Vec<u32>| {
            assert!(results.is_empty());
            fired_cb.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        gate.complete(1);
        assert_eq!(fired.load(Ordering::SeqCst), 1)
    }

    #[test]
    fn test_callback_can_use_gate() {
        let slot: Arc<Mutex<Option<QueueGate<u32>>>> = Arc::new(Mutex::new(None));
        let slot_cb = slot.clone();
        let gate = QueueGate::new(1, move |_| {
            if let Some(gate) = slot_cb.lock().unwrap().as_ref() {
                assert_eq!(gate.remaining(), 0);
            }
        });
        *slot.lock().unwrap() = Some(gate.clone());

        gate.complete(1)
    }

    #[tokio::test]
    async fn test_concurrent_completions() {
        let (gate, rx) = QueueGate::with_channel(16);

        let handles = (0..16usize)
            .map(|idx| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.complete(idx) })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.await.unwrap();
        }

        let mut results = rx.await.unwrap();
        results.sort();
        assert_eq!(results, (0..16usize).collect::<Vec<_>>())
    }
}

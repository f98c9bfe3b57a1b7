use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rst_common::with_logging::log::{debug, info};
use rst_common::with_tokio::tokio::{self, task::JoinHandle, time::MissedTickBehavior};

use crate::config::Polling as PollingConfig;

use super::types::{
    PollingControl, PollingListener, PollingSource, PollingState, SubscriptionId,
};

type Listener<TEvent> = Arc<dyn PollingListener<TEvent>>;

struct Inner<TSource: PollingSource> {
    source: TSource,
    interval: Duration,
    running: AtomicBool,
    generation: AtomicU64,
    tick: AtomicU64,
    next_subscription: AtomicU64,
    state: Mutex<(u64, u64, TSource::State)>,
    subscribers: Mutex<Vec<(SubscriptionId, Listener<TSource::Event>)>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<TSource: PollingSource> Inner<TSource> {
    fn is_current(&self, generation: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    fn stop_generation(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        if self.running.swap(false, Ordering::SeqCst) {
            if let Some(handle) = lock(&self.handle).take() {
                handle.abort();
            }
            info!("[polling:stop] stopped generation {}", generation);
        }
    }

    /// `poll_once` applies a response only when no later tick of the same generation was
    /// applied before it
    async fn poll_once(self: Arc<Self>, generation: u64, tick: u64) {
        let output = self.source.fetch().await;
        if !self.is_current(generation) {
            debug!("[polling:poll_once] late response ignored");
            return;
        }

        let mut state = lock(&self.state);
        if !self.is_current(generation) {
            return;
        }

        if state.0 != generation {
            *state = (generation, 0, TSource::State::default());
        }

        if tick <= state.1 {
            debug!(
                "[polling:poll_once] response of tick {} overtaken by tick {}",
                tick, state.1
            );
            return;
        }
        state.1 = tick;

        let step = self.source.apply(&mut state.2, output);
        let listeners = lock(&self.subscribers)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<Listener<TSource::Event>>>();

        for event in step.events.iter() {
            if !self.is_current(generation) {
                break;
            }

            listeners
                .iter()
                .for_each(|listener| listener.on_event(event));
        }

        drop(state);
        if step.control == PollingControl::Stop {
            self.stop_generation(generation);
        }
    }
}

/// `PollingService` fires one request immediately on [`PollingService::start`] and then one
/// per interval, every response runs on its own task so slow responses may overlap
///
/// Applying responses and notifying subscribers is serialized. A response arriving after
/// the response of a later tick is dropped, the observed state never moves backwards. After
/// [`PollingService::stop`] responses still in flight are ignored. Subscribers are copied
/// before each delivery, a callback may subscribe, unsubscribe or stop the service.
pub struct PollingService<TSource: PollingSource> {
    inner: Arc<Inner<TSource>>,
}

impl<TSource: PollingSource> PollingService<TSource> {
    pub fn new(source: TSource, config: &PollingConfig) -> Self {
        Self::with_interval(source, config.interval())
    }

    pub fn with_interval(source: TSource, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                interval,
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                tick: AtomicU64::new(0),
                next_subscription: AtomicU64::new(1),
                state: Mutex::new((0, 0, TSource::State::default())),
                subscribers: Mutex::new(Vec::new()),
                handle: Mutex::new(None),
            }),
        }
    }

    /// `start` must be called inside a tokio runtime. Starting a running service does
    /// nothing, starting a stopped one begins with a fresh state.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !inner.is_current(generation) {
                    break;
                }

                let tick = inner.tick.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::spawn(inner.clone().poll_once(generation, tick));
            }
        });

        let previous = lock(&self.inner.handle).replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        info!(
            "[polling:start] started generation {} every {:?}",
            generation, self.inner.interval
        );
    }

    pub fn stop(&self) {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        self.inner.stop_generation(generation)
    }

    pub fn state(&self) -> PollingState {
        if self.inner.running.load(Ordering::SeqCst) {
            PollingState::Running
        } else if self.inner.generation.load(Ordering::SeqCst) == 0 {
            PollingState::Idle
        } else {
            PollingState::Stopped
        }
    }

    pub fn subscribe<TListener>(&self, listener: TListener) -> SubscriptionId
    where
        TListener: PollingListener<TSource::Event> + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::SeqCst));
        lock(&self.inner.subscribers).push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock(&self.inner.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(subscription, _)| *subscription != id);
        subscribers.len() != before
    }

    pub fn subscribers(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }

    /// `controller` gives a handle that can stop the service from inside a callback
    pub fn controller(&self) -> PollingController<TSource> {
        PollingController {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<TSource: PollingSource> Drop for PollingService<TSource> {
    fn drop(&mut self) {
        self.stop()
    }
}

/// `PollingController` holds a weak reference to a service, it never keeps the service
/// alive
pub struct PollingController<TSource: PollingSource> {
    inner: std::sync::Weak<Inner<TSource>>,
}

impl<TSource: PollingSource> Clone for PollingController<TSource> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<TSource: PollingSource> PollingController<TSource> {
    pub fn stop(&self) {
        if let Some(inner) = self.inner.upgrade() {
            let generation = inner.generation.load(Ordering::SeqCst);
            inner.stop_generation(generation);
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.running.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

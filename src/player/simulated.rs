use chrono::TimeDelta;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{ObservationHandler, ObservationToken, Player, Subscription};
use crate::models::{MediaTime, PlayerItem};

const POSITION_TIMESCALE: i32 = 600;

/// An in-process player with no media pipeline behind it. The playhead
/// advances with wall-clock time scaled by the rate.
#[derive(Clone)]
pub struct SimulatedPlayer {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    observers: Mutex<Observers>,
    next_token: AtomicU64,
    frozen: bool,
}

struct State {
    rate: f64,
    item: Option<PlayerItem>,
    anchor_position: f64,
    anchor: Instant,
}

#[derive(Default)]
struct Observers {
    rate: HashMap<u64, ObservationHandler>,
    item: HashMap<u64, ObservationHandler>,
    periodic: HashMap<u64, PeriodicObserver>,
}

struct PeriodicObserver {
    handler: ObservationHandler,
    // Dropping the sender stops the timer thread.
    _stop: Option<Sender<()>>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::build(false)
    }

    /// A player whose playhead only moves on `seek`.
    pub fn frozen() -> Self {
        Self::build(true)
    }

    fn build(frozen: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    rate: 0.0,
                    item: None,
                    anchor_position: 0.0,
                    anchor: Instant::now(),
                }),
                observers: Mutex::new(Observers::default()),
                next_token: AtomicU64::new(1),
                frozen,
            }),
        }
    }

    pub fn play(&self) {
        self.set_rate(1.0);
    }

    pub fn pause(&self) {
        self.set_rate(0.0);
    }

    pub fn set_rate(&self, rate: f64) {
        let (changed, started_or_stopped) = {
            let mut state = self.inner.lock_state();
            let position = self.inner.position(&state);
            let old = state.rate;
            state.anchor_position = position;
            state.anchor = Instant::now();
            state.rate = rate;
            (old != rate, (old == 0.0) != (rate == 0.0))
        };

        if changed {
            self.inner.notify_rate();
        }
        if started_or_stopped {
            self.inner.notify_periodic();
        }
    }

    pub fn seek(&self, seconds: f64) {
        {
            let mut state = self.inner.lock_state();
            state.anchor_position = self.inner.clamp(&state, seconds.max(0.0));
            state.anchor = Instant::now();
        }
        self.inner.notify_periodic();
    }

    /// A date on `item` is taken as the date at position zero; the reported
    /// current date then follows the playhead.
    pub fn replace_current_item(&self, item: Option<PlayerItem>) {
        {
            let mut state = self.inner.lock_state();
            state.item = item;
            state.anchor_position = 0.0;
            state.anchor = Instant::now();
        }
        self.inner.notify_item();
    }

    pub fn position(&self) -> f64 {
        let state = self.inner.lock_state();
        self.inner.position(&state)
    }

    pub fn observer_count(&self) -> usize {
        let observers = self.inner.lock_observers();
        observers.rate.len() + observers.item.len() + observers.periodic.len()
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for SimulatedPlayer {
    fn rate(&self) -> f64 {
        self.inner.lock_state().rate
    }

    fn current_item(&self) -> Option<PlayerItem> {
        let state = self.inner.lock_state();
        let position = self.inner.position(&state);
        let mut item = state.item.clone()?;

        if let Some(start) = item.current_date {
            let offset = TimeDelta::milliseconds((position * 1000.0) as i64);
            item.current_date = start.checked_add_signed(offset);
        }

        Some(item)
    }

    fn current_time(&self) -> MediaTime {
        MediaTime::with_seconds(self.position(), POSITION_TIMESCALE)
    }

    fn subscribe(
        &self,
        subscription: Subscription,
        handler: ObservationHandler,
    ) -> ObservationToken {
        let id = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        let mut observers = self.inner.lock_observers();

        match subscription {
            Subscription::Rate => {
                observers.rate.insert(id, handler);
            }
            Subscription::CurrentItem => {
                observers.item.insert(id, handler);
            }
            Subscription::PeriodicTime { interval } => {
                let stop = match interval.to_duration().filter(|d| !d.is_zero()) {
                    Some(period) => spawn_timer(Arc::downgrade(&self.inner), id, period),
                    None => {
                        warn!("Ignoring periodic observer with unusable interval {interval:?}");
                        None
                    }
                };
                observers.periodic.insert(
                    id,
                    PeriodicObserver {
                        handler,
                        _stop: stop,
                    },
                );
            }
        }

        ObservationToken::new(id)
    }

    fn unsubscribe(&self, token: ObservationToken) {
        let id = token.id();
        let mut observers = self.inner.lock_observers();

        let removed = observers.rate.remove(&id).is_some()
            || observers.item.remove(&id).is_some()
            || observers.periodic.remove(&id).is_some();

        if !removed {
            warn!("Unsubscribe for unknown observation token {id}");
        }
    }
}

impl Inner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_observers(&self) -> std::sync::MutexGuard<'_, Observers> {
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn position(&self, state: &State) -> f64 {
        if self.frozen || state.rate == 0.0 {
            return state.anchor_position;
        }
        let advanced = state.anchor_position + state.anchor.elapsed().as_secs_f64() * state.rate;
        self.clamp(state, advanced.max(0.0))
    }

    fn clamp(&self, state: &State, position: f64) -> f64 {
        match state.item.as_ref().map(|item| item.duration) {
            Some(duration) if duration.is_numeric() => position.min(duration.seconds()),
            _ => position,
        }
    }

    // Handlers are cloned out so none runs while a lock is held.
    fn notify_rate(&self) {
        let handlers: Vec<_> = self.lock_observers().rate.values().cloned().collect();
        handlers.iter().for_each(|h| h());
    }

    fn notify_item(&self) {
        let handlers: Vec<_> = self.lock_observers().item.values().cloned().collect();
        handlers.iter().for_each(|h| h());
    }

    fn notify_periodic(&self) {
        let handlers: Vec<_> = self
            .lock_observers()
            .periodic
            .values()
            .map(|o| Arc::clone(&o.handler))
            .collect();
        handlers.iter().for_each(|h| h());
    }

    fn tick(&self, id: u64) {
        if self.lock_state().rate == 0.0 {
            return;
        }
        let handler = self
            .lock_observers()
            .periodic
            .get(&id)
            .map(|o| Arc::clone(&o.handler));
        if let Some(handler) = handler {
            handler();
        }
    }
}

fn spawn_timer(inner: Weak<Inner>, id: u64, period: Duration) -> Option<Sender<()>> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let spawned = thread::Builder::new()
        .name(format!("player-timer-{id}"))
        .spawn(move || {
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => match inner.upgrade() {
                        Some(inner) => inner.tick(id),
                        None => break,
                    },
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("Periodic observer {id} stopped");
        });

    match spawned {
        Ok(_) => Some(stop_tx),
        Err(e) => {
            warn!("Failed to spawn periodic observer thread: {e}");
            None
        }
    }
}

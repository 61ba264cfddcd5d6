#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use nowplay::error::SurfaceError;
use nowplay::models::{MediaTime, NowPlayingInfo, PlaybackState, PlayerItem};
use nowplay::player::{ObservationHandler, ObservationToken, Player, Subscription};
use nowplay::surface::NowPlayingSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Rate,
    CurrentItem,
    Tick,
}

/// A player whose state is set directly by the test and whose observers
/// fire only when the test says so.
pub struct StubPlayer {
    state: Mutex<StubState>,
    subscriptions: Mutex<HashMap<u64, (Subscription, ObservationHandler)>>,
    unsubscribed: Mutex<Vec<u64>>,
    next_id: AtomicU64,
    // Keeps handlers registered after unsubscribe, like a player that
    // delivers one last late callback.
    leaky: bool,
}

struct StubState {
    rate: f64,
    scripted_rates: VecDeque<f64>,
    item: Option<PlayerItem>,
    time: MediaTime,
}

impl StubPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    pub fn leaky() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(leaky: bool) -> Self {
        Self {
            state: Mutex::new(StubState {
                rate: 0.0,
                scripted_rates: VecDeque::new(),
                item: None,
                time: MediaTime::ZERO,
            }),
            subscriptions: Mutex::new(HashMap::new()),
            unsubscribed: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            leaky,
        }
    }

    pub fn set_rate(&self, rate: f64) {
        self.state.lock().unwrap().rate = rate;
    }

    /// Successive `rate()` reads return these values before falling back
    /// to the stored rate.
    pub fn script_rates(&self, rates: &[f64]) {
        self.state.lock().unwrap().scripted_rates.extend(rates);
    }

    pub fn set_item(&self, item: Option<PlayerItem>) {
        self.state.lock().unwrap().item = item;
    }

    pub fn set_elapsed(&self, seconds: f64) {
        self.state.lock().unwrap().time = MediaTime::with_seconds(seconds, 600);
    }

    pub fn fire(&self, event: Event) {
        let handlers: Vec<ObservationHandler> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|(subscription, _)| {
                matches!(
                    (subscription, event),
                    (Subscription::Rate, Event::Rate)
                        | (Subscription::CurrentItem, Event::CurrentItem)
                        | (Subscription::PeriodicTime { .. }, Event::Tick)
                )
            })
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler();
        }
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .values()
            .map(|(subscription, _)| *subscription)
            .collect()
    }

    pub fn unsubscribed(&self) -> Vec<u64> {
        self.unsubscribed.lock().unwrap().clone()
    }
}

impl Player for StubPlayer {
    fn rate(&self) -> f64 {
        let mut state = self.state.lock().unwrap();
        let rate = state.rate;
        state.scripted_rates.pop_front().unwrap_or(rate)
    }

    fn current_item(&self) -> Option<PlayerItem> {
        self.state.lock().unwrap().item.clone()
    }

    fn current_time(&self) -> MediaTime {
        self.state.lock().unwrap().time
    }

    fn subscribe(
        &self,
        subscription: Subscription,
        handler: ObservationHandler,
    ) -> ObservationToken {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions
            .lock()
            .unwrap()
            .insert(id, (subscription, handler));
        ObservationToken::new(id)
    }

    fn unsubscribe(&self, token: ObservationToken) {
        self.unsubscribed.lock().unwrap().push(token.id());
        if !self.leaky {
            self.subscriptions.lock().unwrap().remove(&token.id());
        }
    }
}

/// Counts write attempts and rejects every one of them.
#[derive(Default)]
pub struct FailingSurface {
    pub attempts: AtomicUsize,
}

impl NowPlayingSurface for FailingSurface {
    fn is_supported(&self) -> bool {
        true
    }

    fn set_playback_state(&self, _state: PlaybackState) -> Result<(), SurfaceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SurfaceError::Backend("rejected".to_string()))
    }

    fn set_now_playing_info(&self, _info: &NowPlayingInfo) -> Result<(), SurfaceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SurfaceError::Disconnected)
    }
}

/// Takes `delay` to finish each info write.
pub struct SlowSurface {
    delay: Duration,
    pub completed: AtomicUsize,
}

impl SlowSurface {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            completed: AtomicUsize::new(0),
        }
    }
}

impl NowPlayingSurface for SlowSurface {
    fn is_supported(&self) -> bool {
        true
    }

    fn set_playback_state(&self, _state: PlaybackState) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn set_now_playing_info(&self, _info: &NowPlayingInfo) -> Result<(), SurfaceError> {
        thread::sleep(self.delay);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

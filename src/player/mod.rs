use std::sync::Arc;

use crate::models::{MediaTime, PlayerItem};

mod simulated;
pub use simulated::SimulatedPlayer;

/// Callback fired when an observed attribute changes. May be invoked from
/// any thread.
pub type ObservationHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Subscription {
    Rate,
    CurrentItem,
    PeriodicTime { interval: MediaTime },
}

/// Opaque handle for a live subscription. Not `Clone`: it is handed back to
/// [`Player::unsubscribe`] exactly once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ObservationToken(u64);

impl ObservationToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// The playback object being mirrored.
pub trait Player: Send + Sync {
    fn rate(&self) -> f64;

    fn current_item(&self) -> Option<PlayerItem>;

    fn current_time(&self) -> MediaTime;

    fn subscribe(&self, subscription: Subscription, handler: ObservationHandler)
    -> ObservationToken;

    fn unsubscribe(&self, token: ObservationToken);
}

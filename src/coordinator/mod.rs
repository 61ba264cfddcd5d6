use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tracing::{debug, info, warn};

use crate::models::{
    BasicNowPlayingInfo, InfoValue, MEDIA_TYPE_VIDEO, MediaTime, NowPlayingInfo, PlaybackState,
    keys,
};
use crate::player::{ObservationHandler, ObservationToken, Player, Subscription};
use crate::queue::{DispatchQueue, QueueHandle};
use crate::surface::NowPlayingSurface;

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorOptions {
    /// Cadence of the periodic refresh.
    pub tick_interval: MediaTime,
    /// Thread name of the serial queue reactions run on.
    pub queue_label: String,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            tick_interval: MediaTime::with_seconds(1.0, 30_000),
            queue_label: "nowplay.coordinator".to_string(),
        }
    }
}

/// Keeps the system now-playing surface in sync with a player.
///
/// Observation starts on construction and ends on [`teardown`] or drop.
/// Every reaction runs on one serial queue, so surface writes never
/// overlap and arrive in the order the player reported changes.
///
/// [`teardown`]: NowPlayingCoordinator::teardown
pub struct NowPlayingCoordinator {
    shared: Arc<Shared>,
    observations: Mutex<Option<Observations>>,
    queue: DispatchQueue,
}

struct Shared {
    player: Arc<dyn Player>,
    surface: Arc<dyn NowPlayingSurface>,
    basic_info: RwLock<Option<BasicNowPlayingInfo>>,
    active: AtomicBool,
}

// Held as one unit: either all three are live or none is.
struct Observations {
    rate: ObservationToken,
    item: ObservationToken,
    time: ObservationToken,
}

impl NowPlayingCoordinator {
    pub fn new(player: Arc<dyn Player>, surface: Arc<dyn NowPlayingSurface>) -> Self {
        Self::with_options(player, surface, CoordinatorOptions::default())
    }

    pub fn with_options(
        player: Arc<dyn Player>,
        surface: Arc<dyn NowPlayingSurface>,
        options: CoordinatorOptions,
    ) -> Self {
        let shared = Arc::new(Shared {
            player,
            surface,
            basic_info: RwLock::new(None),
            active: AtomicBool::new(true),
        });
        let queue = DispatchQueue::new(options.queue_label);
        let observations = observe_player(&shared, &queue.handle(), options.tick_interval);

        debug!("Now playing coordinator observing player");

        Self {
            shared,
            observations: Mutex::new(Some(observations)),
            queue,
        }
    }

    pub fn basic_now_playing_info(&self) -> Option<BasicNowPlayingInfo> {
        self.shared.read_basic_info().clone()
    }

    pub fn set_basic_now_playing_info(&self, info: Option<BasicNowPlayingInfo>) {
        *self
            .shared
            .basic_info
            .write()
            .unwrap_or_else(|e| e.into_inner()) = info;
    }

    pub fn playback_state_appropriate_for_player(&self) -> PlaybackState {
        self.shared.playback_state_appropriate_for_player()
    }

    /// `None` when the player has no current item.
    pub fn now_playing_info(&self) -> Option<NowPlayingInfo> {
        self.shared.now_playing_info()
    }

    /// Queues a playback state write, as a rate change would.
    pub fn playback_rate_did_change(&self) {
        let weak = Arc::downgrade(&self.shared);
        self.queue.dispatch(move || with_live(&weak, Shared::playback_rate_did_change));
    }

    /// Queues a full info push, as an item change or tick would.
    pub fn update_now_playing_info(&self) {
        let weak = Arc::downgrade(&self.shared);
        self.queue.dispatch(move || with_live(&weak, Shared::update_now_playing_info));
    }

    /// Waits for every reaction queued so far to finish.
    pub fn flush(&self) {
        self.queue.sync();
    }

    pub fn is_observing(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Stops observing the player. Reactions already queued become no-ops,
    /// and a write already in progress finishes before this returns.
    /// Calling this more than once has no further effect.
    pub fn teardown(&self) {
        self.shared.active.store(false, Ordering::SeqCst);
        self.queue.sync();

        let observations = self
            .observations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(Observations { rate, item, time }) = observations {
            let player = &self.shared.player;
            player.unsubscribe(time);
            player.unsubscribe(rate);
            player.unsubscribe(item);
            info!("Now playing coordinator stopped observing player");
        }
    }
}

impl Drop for NowPlayingCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn observe_player(
    shared: &Arc<Shared>,
    queue: &QueueHandle,
    tick_interval: MediaTime,
) -> Observations {
    let player = &shared.player;

    let rate = player.subscribe(
        Subscription::Rate,
        reaction(shared, queue, Shared::playback_rate_did_change),
    );
    let item = player.subscribe(
        Subscription::CurrentItem,
        reaction(shared, queue, Shared::update_now_playing_info),
    );
    let time = player.subscribe(
        Subscription::PeriodicTime {
            interval: tick_interval,
        },
        reaction(shared, queue, Shared::update_now_playing_info),
    );

    Observations { rate, item, time }
}

/// Wraps `react` so it always runs on the coordinator's queue, and only
/// while the coordinator is alive.
fn reaction(shared: &Arc<Shared>, queue: &QueueHandle, react: fn(&Shared)) -> ObservationHandler {
    let weak = Arc::downgrade(shared);
    let queue = queue.clone();

    Arc::new(move || {
        let weak = weak.clone();
        queue.dispatch(move || with_live(&weak, react));
    })
}

fn with_live(shared: &Weak<Shared>, react: fn(&Shared)) {
    if let Some(shared) = shared.upgrade() {
        react(&shared);
    }
}

impl Shared {
    fn read_basic_info(&self) -> std::sync::RwLockReadGuard<'_, Option<BasicNowPlayingInfo>> {
        self.basic_info.read().unwrap_or_else(|e| e.into_inner())
    }

    fn playback_state_appropriate_for_player(&self) -> PlaybackState {
        PlaybackState::from_rate(self.player.rate())
    }

    fn now_playing_info(&self) -> Option<NowPlayingInfo> {
        let item = self.player.current_item()?;

        let mut info = NowPlayingInfo::new();
        info.insert(keys::MEDIA_TYPE, InfoValue::Integer(MEDIA_TYPE_VIDEO));
        info.insert(keys::PLAYBACK_RATE, self.player.rate());
        info.insert(
            keys::ELAPSED_PLAYBACK_TIME,
            self.player.current_time().seconds(),
        );

        if let Some(url) = item.asset_url {
            info.insert(keys::ASSET_URL, InfoValue::Url(url));
        }

        if let Some(date) = item.current_date {
            info.insert(keys::CURRENT_PLAYBACK_DATE, date);
        }

        if let Some(basic) = self.read_basic_info().as_ref() {
            info.merge(basic.dictionary_representation());
        }

        if item.duration.is_valid() && item.duration.is_numeric() {
            info.insert(keys::PLAYBACK_DURATION, item.duration.seconds());
        }

        Some(info)
    }

    fn can_write(&self) -> bool {
        self.active.load(Ordering::SeqCst) && self.surface.is_supported()
    }

    fn playback_rate_did_change(&self) {
        if !self.can_write() {
            return;
        }

        let state = self.playback_state_appropriate_for_player();
        debug!(%state, "Playback rate changed");

        if let Err(e) = self.surface.set_playback_state(state) {
            warn!("Dropped playback state update: {e}");
        }
    }

    fn update_now_playing_info(&self) {
        if !self.can_write() {
            return;
        }

        let Some(info) = self.now_playing_info() else {
            debug!("No current item, now playing info left untouched");
            return;
        };

        if let Err(e) = self.surface.set_now_playing_info(&info) {
            warn!("Dropped now playing info update: {e}");
        }
    }
}

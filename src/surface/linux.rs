use mpris_server::{Metadata, PlaybackStatus, Player, Time};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::NowPlayingSurface;
use crate::error::SurfaceError;
use crate::models::{NowPlayingInfo, PlaybackState, keys};

enum Update {
    State(PlaybackState),
    Info(NowPlayingInfo),
}

/// Publishes now-playing state as an MPRIS player on the session bus.
///
/// The zbus player is not `Send`, so it lives on its own thread with a
/// current-thread runtime and is fed through a channel. Remote-control
/// method calls are not handled.
pub struct MprisSurface {
    tx: UnboundedSender<Update>,
}

impl MprisSurface {
    pub fn spawn(identity: &str) -> Result<Self, SurfaceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let identity = identity.to_string();

        thread::Builder::new()
            .name("mpris".to_string())
            .spawn(move || run_mpris(identity, rx, ready_tx))
            .map_err(|e| SurfaceError::Backend(format!("failed to spawn MPRIS thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { tx }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SurfaceError::Disconnected),
        }
    }
}

impl NowPlayingSurface for MprisSurface {
    fn is_supported(&self) -> bool {
        !self.tx.is_closed()
    }

    fn set_playback_state(&self, state: PlaybackState) -> Result<(), SurfaceError> {
        self.tx
            .send(Update::State(state))
            .map_err(|_| SurfaceError::Disconnected)
    }

    fn set_now_playing_info(&self, info: &NowPlayingInfo) -> Result<(), SurfaceError> {
        self.tx
            .send(Update::Info(info.clone()))
            .map_err(|_| SurfaceError::Disconnected)
    }
}

fn run_mpris(
    identity: String,
    mut rx: UnboundedReceiver<Update>,
    ready_tx: std_mpsc::Sender<Result<(), SurfaceError>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready_tx.send(Err(SurfaceError::Backend(e.to_string())));
            return;
        }
    };

    runtime.block_on(async move {
        let player = match Player::builder(&identity)
            .identity(identity.clone())
            .can_control(false)
            .can_play(false)
            .can_pause(false)
            .can_seek(false)
            .can_go_next(false)
            .can_go_previous(false)
            .build()
            .await
        {
            Ok(player) => {
                let _ = ready_tx.send(Ok(()));
                player
            }
            Err(e) => {
                let _ = ready_tx.send(Err(SurfaceError::Backend(e.to_string())));
                return;
            }
        };

        info!("MPRIS player registered as org.mpris.MediaPlayer2.{identity}");

        while let Some(update) = rx.recv().await {
            let result = match update {
                Update::State(state) => player.set_playback_status(playback_status(state)).await,
                Update::Info(info) => apply_info(&player, &info).await,
            };
            if let Err(e) = result {
                warn!("MPRIS update dropped: {e}");
            }
        }

        debug!("MPRIS surface closed");
    });
}

async fn apply_info(player: &Player, info: &NowPlayingInfo) -> mpris_server::zbus::Result<()> {
    let fields = MprisFields::from_info(info);

    if let Some(rate) = fields.rate {
        player.set_rate(rate).await?;
    }
    if let Some(position) = fields.position_micros {
        player.set_position(Time::from_micros(position));
    }
    player.set_metadata(fields.metadata()).await
}

fn playback_status(state: PlaybackState) -> PlaybackStatus {
    match state {
        PlaybackState::Playing => PlaybackStatus::Playing,
        PlaybackState::Paused => PlaybackStatus::Paused,
    }
}

#[derive(Debug, Default, PartialEq)]
struct MprisFields {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    art_url: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    position_micros: Option<i64>,
    rate: Option<f64>,
}

impl MprisFields {
    fn from_info(info: &NowPlayingInfo) -> Self {
        let text = |key: &str| info.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let micros = |key: &str| {
            info.get(key)
                .and_then(|v| v.as_f64())
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| (s * 1_000_000.0) as i64)
        };

        Self {
            title: text(keys::TITLE),
            artist: text(keys::ARTIST),
            album: text(keys::ALBUM_TITLE),
            art_url: text(keys::ARTWORK_URL),
            url: text(keys::ASSET_URL),
            length_micros: micros(keys::PLAYBACK_DURATION),
            position_micros: micros(keys::ELAPSED_PLAYBACK_TIME),
            // MPRIS expresses pause through the status, not a zero rate.
            rate: info
                .get(keys::PLAYBACK_RATE)
                .and_then(|v| v.as_f64())
                .filter(|r| r.is_finite() && *r != 0.0),
        }
    }

    fn metadata(&self) -> Metadata {
        let mut builder = Metadata::builder();
        if let Some(title) = &self.title {
            builder = builder.title(title.clone());
        }
        if let Some(artist) = &self.artist {
            builder = builder.artist([artist.clone()]);
        }
        if let Some(album) = &self.album {
            builder = builder.album(album.clone());
        }
        if let Some(art_url) = &self.art_url {
            builder = builder.art_url(art_url.clone());
        }
        if let Some(url) = &self.url {
            builder = builder.url(url.clone());
        }
        if let Some(length) = self.length_micros {
            builder = builder.length(Time::from_micros(length));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InfoValue;

    #[test]
    fn test_fields_from_info() {
        let mut info = NowPlayingInfo::new();
        info.insert(keys::TITLE, "Session 101");
        info.insert(keys::ASSET_URL, InfoValue::Url("file:///talk.mp4".to_string()));
        info.insert(keys::PLAYBACK_DURATION, 120.0);
        info.insert(keys::ELAPSED_PLAYBACK_TIME, 12.5);
        info.insert(keys::PLAYBACK_RATE, 0.0);

        let fields = MprisFields::from_info(&info);
        assert_eq!(fields.title.as_deref(), Some("Session 101"));
        assert_eq!(fields.url.as_deref(), Some("file:///talk.mp4"));
        assert_eq!(fields.length_micros, Some(120_000_000));
        assert_eq!(fields.position_micros, Some(12_500_000));
        assert_eq!(fields.rate, None);
        assert_eq!(fields.artist, None);
    }

    #[test]
    fn test_playback_status_mapping() {
        assert!(matches!(
            playback_status(PlaybackState::Playing),
            PlaybackStatus::Playing
        ));
        assert!(matches!(
            playback_status(PlaybackState::Paused),
            PlaybackStatus::Paused
        ));
    }
}

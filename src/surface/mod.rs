use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::SurfaceConfig;
use crate::error::SurfaceError;
use crate::models::{NowPlayingInfo, PlaybackState};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
pub use linux::MprisSurface;
#[cfg(target_os = "macos")]
pub use macos::InfoCenterSurface;

/// The process-wide now-playing service. Write-only from the coordinator's
/// point of view.
pub trait NowPlayingSurface: Send + Sync {
    /// Whether this environment can show now-playing information at all.
    fn is_supported(&self) -> bool;

    fn set_playback_state(&self, state: PlaybackState) -> Result<(), SurfaceError>;

    fn set_now_playing_info(&self, info: &NowPlayingInfo) -> Result<(), SurfaceError>;
}

/// The native surface for this platform, or [`UnsupportedSurface`] where
/// there is none.
#[cfg(target_os = "macos")]
pub fn system_surface(_config: &SurfaceConfig) -> Arc<dyn NowPlayingSurface> {
    Arc::new(InfoCenterSurface::new())
}

#[cfg(target_os = "linux")]
pub fn system_surface(config: &SurfaceConfig) -> Arc<dyn NowPlayingSurface> {
    match MprisSurface::spawn(&config.identity) {
        Ok(surface) => Arc::new(surface),
        Err(e) => {
            tracing::warn!("MPRIS unavailable, now playing updates disabled: {e}");
            Arc::new(UnsupportedSurface)
        }
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn system_surface(_config: &SurfaceConfig) -> Arc<dyn NowPlayingSurface> {
    Arc::new(UnsupportedSurface)
}

/// Stand-in for environments without a now-playing service.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSurface;

impl NowPlayingSurface for UnsupportedSurface {
    fn is_supported(&self) -> bool {
        false
    }

    fn set_playback_state(&self, _state: PlaybackState) -> Result<(), SurfaceError> {
        Err(SurfaceError::Unsupported)
    }

    fn set_now_playing_info(&self, _info: &NowPlayingInfo) -> Result<(), SurfaceError> {
        Err(SurfaceError::Unsupported)
    }
}

/// Emits every write as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSurface;

impl NowPlayingSurface for LogSurface {
    fn is_supported(&self) -> bool {
        true
    }

    fn set_playback_state(&self, state: PlaybackState) -> Result<(), SurfaceError> {
        info!(%state, "playback state");
        Ok(())
    }

    fn set_now_playing_info(&self, info: &NowPlayingInfo) -> Result<(), SurfaceError> {
        let json =
            serde_json::to_string(info).map_err(|e| SurfaceError::Backend(e.to_string()))?;
        info!(info = %json, "now playing info");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceWrite {
    PlaybackState(PlaybackState),
    Info(NowPlayingInfo),
}

/// Keeps every write in memory, in the order received.
#[derive(Debug)]
pub struct RecordingSurface {
    supported: bool,
    writes: Mutex<Vec<SurfaceWrite>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            supported: true,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn writes(&self) -> Vec<SurfaceWrite> {
        self.lock().clone()
    }

    pub fn playback_states(&self) -> Vec<PlaybackState> {
        self.lock()
            .iter()
            .filter_map(|w| match w {
                SurfaceWrite::PlaybackState(state) => Some(*state),
                SurfaceWrite::Info(_) => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<NowPlayingInfo> {
        self.lock()
            .iter()
            .filter_map(|w| match w {
                SurfaceWrite::Info(info) => Some(info.clone()),
                SurfaceWrite::PlaybackState(_) => None,
            })
            .collect()
    }

    pub fn last_info(&self) -> Option<NowPlayingInfo> {
        self.infos().pop()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SurfaceWrite>> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl NowPlayingSurface for RecordingSurface {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn set_playback_state(&self, state: PlaybackState) -> Result<(), SurfaceError> {
        self.lock().push(SurfaceWrite::PlaybackState(state));
        Ok(())
    }

    fn set_now_playing_info(&self, info: &NowPlayingInfo) -> Result<(), SurfaceError> {
        self.lock().push(SurfaceWrite::Info(info.clone()));
        Ok(())
    }
}

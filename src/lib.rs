//! Mirrors a video player's transport state (rate, position, item identity,
//! duration) into the platform "now playing" surface so lock screens,
//! remotes and media keys can display it.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use nowplay::config::SurfaceConfig;
//! use nowplay::coordinator::NowPlayingCoordinator;
//! use nowplay::player::SimulatedPlayer;
//! use nowplay::surface::system_surface;
//!
//! let player = SimulatedPlayer::new();
//! let surface = system_surface(&SurfaceConfig::default());
//! let coordinator = NowPlayingCoordinator::new(Arc::new(player.clone()), surface);
//! player.play();
//! # drop(coordinator);
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod player;
pub mod queue;
pub mod surface;

pub use coordinator::{CoordinatorOptions, NowPlayingCoordinator};
pub use error::{ConfigError, SurfaceError};
pub use models::{BasicNowPlayingInfo, NowPlayingInfo, PlaybackState};
pub use player::Player;
pub use surface::NowPlayingSurface;

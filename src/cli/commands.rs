use anyhow::{Context, Result, bail};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nowplay::config::Config;
use nowplay::coordinator::NowPlayingCoordinator;
use nowplay::models::{BasicNowPlayingInfo, MediaTime, PlayerItem};
use nowplay::player::SimulatedPlayer;
use nowplay::surface::{LogSurface, NowPlayingSurface, UnsupportedSurface, system_surface};

use super::SurfaceKind;

const ITEM_TIMESCALE: i32 = 600;

pub struct App {
    pub config: Config,
}

pub struct InfoArgs {
    pub rate: f64,
    pub elapsed: f64,
    pub duration: Option<f64>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub no_item: bool,
}

impl App {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load().with_context(|| "Failed to load config")?,
        };
        Ok(Self { config })
    }

    pub fn info(&self, args: InfoArgs) -> Result<()> {
        if args.elapsed < 0.0 {
            bail!("Elapsed time cannot be negative");
        }

        let player = SimulatedPlayer::frozen();
        if !args.no_item {
            let duration = args
                .duration
                .map(|d| MediaTime::with_seconds(d, ITEM_TIMESCALE))
                .unwrap_or(MediaTime::INVALID);
            let mut item = PlayerItem::new(duration);
            item.asset_url = args.url;
            player.replace_current_item(Some(item));
            player.seek(args.elapsed);
            player.set_rate(args.rate);
        }

        // Nothing is published; the coordinator only computes here.
        let coordinator = NowPlayingCoordinator::with_options(
            Arc::new(player),
            Arc::new(UnsupportedSurface),
            self.config.coordinator.options()?,
        );
        coordinator.set_basic_now_playing_info(basic_info(args.title, args.artist));

        let output = serde_json::json!({
            "state": coordinator.playback_state_appropriate_for_player(),
            "info": coordinator.now_playing_info(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);

        Ok(())
    }

    pub fn simulate(
        &self,
        duration: f64,
        seconds: u64,
        title: String,
        url: Option<String>,
        kind: SurfaceKind,
    ) -> Result<()> {
        if !(duration.is_finite() && duration > 0.0) {
            bail!("Duration must be a positive number of seconds");
        }

        let surface: Arc<dyn NowPlayingSurface> = match kind {
            SurfaceKind::System => system_surface(&self.config.surface),
            SurfaceKind::Log => Arc::new(LogSurface),
        };
        if !surface.is_supported() {
            println!("Now playing is not supported here; updates will be skipped");
        }

        let player = SimulatedPlayer::new();
        let coordinator = NowPlayingCoordinator::with_options(
            Arc::new(player.clone()),
            surface,
            self.config.coordinator.options()?,
        );
        coordinator.set_basic_now_playing_info(basic_info(Some(title.clone()), None));

        let mut item = PlayerItem::new(MediaTime::with_seconds(duration, ITEM_TIMESCALE))
            .with_current_date(chrono::Utc::now());
        item.asset_url = url;
        player.replace_current_item(Some(item));

        println!("Playing: {title} ({})", format_seconds(duration));
        player.play();

        let half = Duration::from_secs(seconds) / 2;
        thread::sleep(half);

        player.pause();
        println!("Paused at {}", format_seconds(player.position()));
        thread::sleep(Duration::from_secs(1).min(half));

        player.play();
        println!("Resumed");
        thread::sleep(Duration::from_secs(seconds).saturating_sub(half));

        player.pause();
        coordinator.flush();
        let last = coordinator.now_playing_info();
        coordinator.teardown();

        println!("Stopped at {}", format_seconds(player.position()));
        println!("{}", serde_json::to_string_pretty(&last)?);

        Ok(())
    }

    pub fn show_config(&self) -> Result<()> {
        print!("{}", self.config.to_toml()?);
        Ok(())
    }
}

fn basic_info(title: Option<String>, artist: Option<String>) -> Option<BasicNowPlayingInfo> {
    if title.is_none() && artist.is_none() {
        return None;
    }
    Some(BasicNowPlayingInfo {
        title,
        artist,
        ..Default::default()
    })
}

fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0:00");
        assert_eq!(format_seconds(90.4), "1:30");
        assert_eq!(format_seconds(-3.0), "0:00");
    }

    #[test]
    fn test_basic_info_only_when_supplied() {
        assert_eq!(basic_info(None, None), None);
        let info = basic_info(Some("Talk".to_string()), None).unwrap();
        assert_eq!(info.title.as_deref(), Some("Talk"));
        assert_eq!(info.artist, None);
    }
}

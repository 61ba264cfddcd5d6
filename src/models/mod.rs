use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::Duration;

/// Well-known now-playing keys, named after the MediaPlayer framework
/// constants. Platform backends translate them to their own vocabulary.
pub mod keys {
    pub const MEDIA_TYPE: &str = "MPNowPlayingInfoPropertyMediaType";
    pub const PLAYBACK_RATE: &str = "MPNowPlayingInfoPropertyPlaybackRate";
    pub const ELAPSED_PLAYBACK_TIME: &str = "MPNowPlayingInfoPropertyElapsedPlaybackTime";
    pub const ASSET_URL: &str = "MPNowPlayingInfoPropertyAssetURL";
    pub const CURRENT_PLAYBACK_DATE: &str = "MPNowPlayingInfoPropertyCurrentPlaybackDate";
    pub const PLAYBACK_DURATION: &str = "MPMediaItemPropertyPlaybackDuration";
    pub const TITLE: &str = "MPMediaItemPropertyTitle";
    pub const ARTIST: &str = "MPMediaItemPropertyArtist";
    pub const ALBUM_TITLE: &str = "MPMediaItemPropertyAlbumTitle";
    pub const ARTWORK_URL: &str = "artworkURL";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Paused,
    Playing,
}

impl PlaybackState {
    /// Zero (of either sign) is paused; every other rate, negative and NaN
    /// included, counts as playing.
    pub fn from_rate(rate: f64) -> Self {
        if rate == 0.0 {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Playing => write!(f, "playing"),
        }
    }
}

/// Raw `MPNowPlayingInfoMediaType` value for video.
pub const MEDIA_TYPE_VIDEO: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum TimeKind {
    Invalid,
    Numeric,
    PositiveInfinity,
    NegativeInfinity,
    Indefinite,
}

/// A rational media time (`value / timescale`) that can also be invalid,
/// infinite or indefinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTime {
    value: i64,
    timescale: i32,
    kind: TimeKind,
}

impl MediaTime {
    pub const INVALID: MediaTime = MediaTime::special(TimeKind::Invalid);
    pub const INDEFINITE: MediaTime = MediaTime::special(TimeKind::Indefinite);
    pub const POSITIVE_INFINITY: MediaTime = MediaTime::special(TimeKind::PositiveInfinity);
    pub const NEGATIVE_INFINITY: MediaTime = MediaTime::special(TimeKind::NegativeInfinity);
    pub const ZERO: MediaTime = MediaTime {
        value: 0,
        timescale: 1,
        kind: TimeKind::Numeric,
    };

    const fn special(kind: TimeKind) -> Self {
        Self {
            value: 0,
            timescale: 0,
            kind,
        }
    }

    pub fn new(value: i64, timescale: i32) -> Self {
        if timescale <= 0 {
            return Self::INVALID;
        }
        Self {
            value,
            timescale,
            kind: TimeKind::Numeric,
        }
    }

    pub fn with_seconds(seconds: f64, timescale: i32) -> Self {
        if seconds.is_nan() || timescale <= 0 {
            Self::INVALID
        } else if seconds == f64::INFINITY {
            Self::POSITIVE_INFINITY
        } else if seconds == f64::NEG_INFINITY {
            Self::NEGATIVE_INFINITY
        } else {
            Self::new((seconds * f64::from(timescale)).round() as i64, timescale)
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn timescale(&self) -> i32 {
        self.timescale
    }

    pub fn is_valid(&self) -> bool {
        self.kind != TimeKind::Invalid
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == TimeKind::Numeric
    }

    pub fn seconds(&self) -> f64 {
        match self.kind {
            TimeKind::Numeric => self.value as f64 / f64::from(self.timescale),
            TimeKind::PositiveInfinity => f64::INFINITY,
            TimeKind::NegativeInfinity => f64::NEG_INFINITY,
            TimeKind::Invalid | TimeKind::Indefinite => f64::NAN,
        }
    }

    /// Non-negative numeric times only.
    pub fn to_duration(&self) -> Option<Duration> {
        if !self.is_numeric() || self.value < 0 {
            return None;
        }
        Some(Duration::from_secs_f64(self.seconds()))
    }
}

impl Default for MediaTime {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Read-only view of the player's current item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerItem {
    pub asset_url: Option<String>,
    pub current_date: Option<DateTime<Utc>>,
    pub duration: MediaTime,
}

impl PlayerItem {
    pub fn new(duration: MediaTime) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    pub fn with_asset_url(mut self, url: impl Into<String>) -> Self {
        self.asset_url = Some(url.into());
        self
    }

    pub fn with_current_date(mut self, date: DateTime<Utc>) -> Self {
        self.current_date = Some(date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InfoValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Url(String),
    Date(DateTime<Utc>),
}

impl InfoValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InfoValue::Integer(i) => Some(*i as f64),
            InfoValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            InfoValue::Text(s) | InfoValue::Url(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for InfoValue {
    fn from(value: f64) -> Self {
        InfoValue::Number(value)
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::Text(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::Text(value)
    }
}

impl From<DateTime<Utc>> for InfoValue {
    fn from(value: DateTime<Utc>) -> Self {
        InfoValue::Date(value)
    }
}

/// String-keyed snapshot handed to the now-playing surface.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct NowPlayingInfo(BTreeMap<String, InfoValue>);

impl NowPlayingInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<InfoValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries from `other` replace entries with the same key.
    pub fn merge(&mut self, other: NowPlayingInfo) {
        self.0.extend(other.0);
    }
}

impl<'a> IntoIterator for &'a NowPlayingInfo {
    type Item = (&'a String, &'a InfoValue);
    type IntoIter = btree_map::Iter<'a, String, InfoValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Descriptive metadata supplied by the host application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicNowPlayingInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_title: Option<String>,
    pub artwork_url: Option<String>,
    pub extra: BTreeMap<String, InfoValue>,
}

impl BasicNowPlayingInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album_title(mut self, album_title: impl Into<String>) -> Self {
        self.album_title = Some(album_title.into());
        self
    }

    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<InfoValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn dictionary_representation(&self) -> NowPlayingInfo {
        let mut info = NowPlayingInfo::new();

        if let Some(title) = &self.title {
            info.insert(keys::TITLE, title.as_str());
        }
        if let Some(artist) = &self.artist {
            info.insert(keys::ARTIST, artist.as_str());
        }
        if let Some(album_title) = &self.album_title {
            info.insert(keys::ALBUM_TITLE, album_title.as_str());
        }
        if let Some(url) = &self.artwork_url {
            info.insert(keys::ARTWORK_URL, InfoValue::Url(url.clone()));
        }
        for (key, value) in &self.extra {
            info.insert(key.clone(), value.clone());
        }

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_from_rate() {
        assert_eq!(PlaybackState::from_rate(0.0), PlaybackState::Paused);
        assert_eq!(PlaybackState::from_rate(-0.0), PlaybackState::Paused);
        assert_eq!(PlaybackState::from_rate(1.0), PlaybackState::Playing);
        assert_eq!(PlaybackState::from_rate(0.5), PlaybackState::Playing);
        assert_eq!(PlaybackState::from_rate(-1.0), PlaybackState::Playing);
        assert_eq!(PlaybackState::from_rate(f64::MIN_POSITIVE), PlaybackState::Playing);
        assert_eq!(PlaybackState::from_rate(f64::NAN), PlaybackState::Playing);
    }

    #[test]
    fn test_media_time_classification() {
        let t = MediaTime::with_seconds(120.0, 600);
        assert!(t.is_valid());
        assert!(t.is_numeric());
        assert_eq!(t.seconds(), 120.0);
        assert_eq!(t.value(), 72_000);

        assert!(!MediaTime::INVALID.is_valid());
        assert!(MediaTime::with_seconds(f64::NAN, 600).seconds().is_nan());

        assert!(MediaTime::INDEFINITE.is_valid());
        assert!(!MediaTime::INDEFINITE.is_numeric());

        let inf = MediaTime::with_seconds(f64::INFINITY, 600);
        assert!(inf.is_valid());
        assert!(!inf.is_numeric());
        assert_eq!(inf.seconds(), f64::INFINITY);

        assert!(!MediaTime::new(10, 0).is_valid());
    }

    #[test]
    fn test_media_time_tick_interval() {
        let tick = MediaTime::with_seconds(1.0, 30_000);
        assert_eq!(tick.value(), 30_000);
        assert_eq!(tick.to_duration(), Some(Duration::from_secs(1)));
        assert_eq!(MediaTime::with_seconds(-1.0, 30_000).to_duration(), None);
    }

    #[test]
    fn test_basic_info_dictionary_representation() {
        let basic = BasicNowPlayingInfo::new()
            .with_title("Keynote")
            .with_artwork_url("https://example.com/art.png")
            .with_field("custom", 3.0);

        let info = basic.dictionary_representation();
        assert_eq!(info.len(), 3);
        assert_eq!(info.get(keys::TITLE).and_then(|v| v.as_str()), Some("Keynote"));
        assert_eq!(
            info.get(keys::ARTWORK_URL),
            Some(&InfoValue::Url("https://example.com/art.png".to_string()))
        );
        assert!(!info.contains_key(keys::ARTIST));
    }

    #[test]
    fn test_merge_prefers_incoming_values() {
        let mut info = NowPlayingInfo::new();
        info.insert(keys::PLAYBACK_RATE, 1.0);
        info.insert(keys::TITLE, "computed");

        let mut overrides = NowPlayingInfo::new();
        overrides.insert(keys::TITLE, "supplied");
        info.merge(overrides);

        assert_eq!(info.get(keys::TITLE).and_then(|v| v.as_str()), Some("supplied"));
        assert_eq!(info.get(keys::PLAYBACK_RATE).and_then(|v| v.as_f64()), Some(1.0));
    }

    #[test]
    fn test_info_serializes_as_flat_object() {
        let mut info = NowPlayingInfo::new();
        info.insert(keys::MEDIA_TYPE, InfoValue::Integer(MEDIA_TYPE_VIDEO));
        info.insert(keys::ELAPSED_PLAYBACK_TIME, 12.5);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json[keys::MEDIA_TYPE], 2);
        assert_eq!(json[keys::ELAPSED_PLAYBACK_TIME], 12.5);
    }
}

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject};
use objc2_foundation::{
    NSCopying, NSDate, NSDictionary, NSMutableDictionary, NSNumber, NSString, NSURL,
};
use objc2_media_player::{
    MPMediaItemPropertyAlbumTitle, MPMediaItemPropertyArtist, MPMediaItemPropertyPlaybackDuration,
    MPMediaItemPropertyTitle, MPNowPlayingInfoCenter, MPNowPlayingInfoPropertyAssetURL,
    MPNowPlayingInfoPropertyCurrentPlaybackDate, MPNowPlayingInfoPropertyElapsedPlaybackTime,
    MPNowPlayingInfoPropertyMediaType, MPNowPlayingInfoPropertyPlaybackRate,
    MPNowPlayingPlaybackState,
};
use tracing::debug;

use super::NowPlayingSurface;
use crate::error::SurfaceError;
use crate::models::{InfoValue, NowPlayingInfo, PlaybackState, keys};

/// Writes to `MPNowPlayingInfoCenter.defaultCenter`.
///
/// The center is looked up on every write instead of being stored, since
/// the retained object is not `Send`.
pub struct InfoCenterSurface {
    supported: bool,
}

impl InfoCenterSurface {
    pub fn new() -> Self {
        let supported = objc2::available!(macos = 10.12.2);
        debug!("MPNowPlayingInfoCenter supported: {supported}");
        Self { supported }
    }
}

impl NowPlayingSurface for InfoCenterSurface {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn set_playback_state(&self, state: PlaybackState) -> Result<(), SurfaceError> {
        if !self.supported {
            return Err(SurfaceError::Unsupported);
        }

        let state = match state {
            PlaybackState::Playing => MPNowPlayingPlaybackState::Playing,
            PlaybackState::Paused => MPNowPlayingPlaybackState::Paused,
        };

        unsafe {
            let center = MPNowPlayingInfoCenter::defaultCenter();
            center.setPlaybackState(state);
        }
        Ok(())
    }

    fn set_now_playing_info(&self, info: &NowPlayingInfo) -> Result<(), SurfaceError> {
        if !self.supported {
            return Err(SurfaceError::Unsupported);
        }

        unsafe {
            let dict = info_dictionary(info);
            let dict: &NSDictionary<NSString, AnyObject> = &dict;
            let center = MPNowPlayingInfoCenter::defaultCenter();
            center.setNowPlayingInfo(Some(dict));
        }
        Ok(())
    }
}

unsafe fn info_dictionary(
    info: &NowPlayingInfo,
) -> Retained<NSMutableDictionary<NSString, AnyObject>> {
    unsafe {
        let dict: Retained<NSMutableDictionary<NSString, AnyObject>> = NSMutableDictionary::new();

        for (key, value) in info {
            if !key_available(key) {
                continue;
            }
            let Some(object) = info_object(value) else {
                continue;
            };
            let owned_key;
            let key: &NSString = match framework_key(key) {
                Some(key) => key,
                None => {
                    owned_key = NSString::from_str(key);
                    &owned_key
                }
            };
            let key_copying: &ProtocolObject<dyn NSCopying> = ProtocolObject::from_ref(key);
            dict.setObject_forKey(&*object, key_copying);
        }

        dict
    }
}

/// Some keys arrived in later releases than the info center itself.
fn key_available(key: &str) -> bool {
    match key {
        keys::ASSET_URL => objc2::available!(macos = 10.12.3),
        keys::CURRENT_PLAYBACK_DATE => objc2::available!(macos = 10.13.1),
        _ => true,
    }
}

unsafe fn framework_key(key: &str) -> Option<&'static NSString> {
    unsafe {
        let key = match key {
            keys::MEDIA_TYPE => MPNowPlayingInfoPropertyMediaType,
            keys::PLAYBACK_RATE => MPNowPlayingInfoPropertyPlaybackRate,
            keys::ELAPSED_PLAYBACK_TIME => MPNowPlayingInfoPropertyElapsedPlaybackTime,
            keys::ASSET_URL => MPNowPlayingInfoPropertyAssetURL,
            keys::CURRENT_PLAYBACK_DATE => MPNowPlayingInfoPropertyCurrentPlaybackDate,
            keys::PLAYBACK_DURATION => MPMediaItemPropertyPlaybackDuration,
            keys::TITLE => MPMediaItemPropertyTitle,
            keys::ARTIST => MPMediaItemPropertyArtist,
            keys::ALBUM_TITLE => MPMediaItemPropertyAlbumTitle,
            _ => return None,
        };
        Some(key)
    }
}

unsafe fn info_object(value: &InfoValue) -> Option<Retained<AnyObject>> {
    unsafe {
        let object: Retained<AnyObject> = match value {
            InfoValue::Integer(i) => Retained::cast_unchecked(NSNumber::new_i64(*i)),
            InfoValue::Number(n) => Retained::cast_unchecked(NSNumber::new_f64(*n)),
            InfoValue::Text(s) => Retained::cast_unchecked(NSString::from_str(s)),
            InfoValue::Url(s) => {
                let url = NSURL::URLWithString(&NSString::from_str(s))?;
                Retained::cast_unchecked(url)
            }
            InfoValue::Date(date) => {
                let seconds = date.timestamp_millis() as f64 / 1000.0;
                Retained::cast_unchecked(NSDate::dateWithTimeIntervalSince1970(seconds))
            }
        };
        Some(object)
    }
}

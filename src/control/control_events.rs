//! Events emitted by the media control, and the platform notification it observes.

use std::fmt;

/// Notification name for device rotation; bridged into a layout refresh.
pub const ORIENTATION_CHANGED_NOTIFICATION: &str = "deviceOrientationDidChange";

/// Payload key carrying the playhead position (seconds) on `positionUpdate`.
pub const KEY_POSITION: &str = "position";

/// Payload key carrying the buffered end (seconds) on `bufferUpdate`.
pub const KEY_END_POSITION: &str = "end_position";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaControlEvent {
    Playing,
    NotPlaying,
}

impl MediaControlEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaControlEvent::Playing => "mediaControlPlaying",
            MediaControlEvent::NotPlaying => "mediaControlNotPlaying",
        }
    }
}

impl AsRef<str> for MediaControlEvent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for MediaControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Player lifecycle event names.
//!
//! The emitter accepts any string as an event name; this enum is the shared
//! vocabulary that player, container, playback and media control agree on.
//! Embedders can trigger their own names next to these, e.g.
//! `emitter.trigger("myPlugin:adBreak")`.

use std::fmt;
use std::str::FromStr;

/// Reference player event vocabulary. Wire names are camelCase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    BufferUpdate,
    PositionUpdate,
    Ready,
    Stalled,
    WillUpdateAudioSource,
    DidUpdateAudioSource,
    WillUpdateSubtitleSource,
    DidUpdateSubtitleSource,
    DisableMediaControl,
    EnableMediaControl,
    DidComplete,
    WillPlay,
    Playing,
    WillPause,
    DidPause,
    WillStop,
    DidStop,
    Error,
    AirPlayStatusUpdate,
    RequestFullscreen,
    ExitFullscreen,
    RequestPosterUpdate,
    WillUpdatePoster,
    DidUpdatePoster,
}

impl Event {
    pub const ALL: [Event; 24] = [
        Event::BufferUpdate,
        Event::PositionUpdate,
        Event::Ready,
        Event::Stalled,
        Event::WillUpdateAudioSource,
        Event::DidUpdateAudioSource,
        Event::WillUpdateSubtitleSource,
        Event::DidUpdateSubtitleSource,
        Event::DisableMediaControl,
        Event::EnableMediaControl,
        Event::DidComplete,
        Event::WillPlay,
        Event::Playing,
        Event::WillPause,
        Event::DidPause,
        Event::WillStop,
        Event::DidStop,
        Event::Error,
        Event::AirPlayStatusUpdate,
        Event::RequestFullscreen,
        Event::ExitFullscreen,
        Event::RequestPosterUpdate,
        Event::WillUpdatePoster,
        Event::DidUpdatePoster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BufferUpdate => "bufferUpdate",
            Event::PositionUpdate => "positionUpdate",
            Event::Ready => "ready",
            Event::Stalled => "stalled",
            Event::WillUpdateAudioSource => "willUpdateAudioSource",
            Event::DidUpdateAudioSource => "didUpdateAudioSource",
            Event::WillUpdateSubtitleSource => "willUpdateSubtitleSource",
            Event::DidUpdateSubtitleSource => "didUpdateSubtitleSource",
            Event::DisableMediaControl => "disableMediaControl",
            Event::EnableMediaControl => "enableMediaControl",
            Event::DidComplete => "didComplete",
            Event::WillPlay => "willPlay",
            Event::Playing => "playing",
            Event::WillPause => "willPause",
            Event::DidPause => "didPause",
            Event::WillStop => "willStop",
            Event::DidStop => "didStop",
            Event::Error => "error",
            Event::AirPlayStatusUpdate => "airPlayStatusUpdate",
            Event::RequestFullscreen => "requestFullscreen",
            Event::ExitFullscreen => "exitFullscreen",
            Event::RequestPosterUpdate => "requestPosterUpdate",
            Event::WillUpdatePoster => "willUpdatePoster",
            Event::DidUpdatePoster => "didUpdatePoster",
        }
    }
}

impl AsRef<str> for Event {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown event name: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for e in Event::ALL {
            assert_eq!(e.as_str().parse::<Event>().unwrap(), e);
        }
        assert_eq!(Event::PositionUpdate.to_string(), "positionUpdate");
    }

    #[test]
    fn test_unknown_name_is_err() {
        assert!("myPlugin:adBreak".parse::<Event>().is_err());
        assert!("Ready".parse::<Event>().is_err());
    }
}

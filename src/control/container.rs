//! Headless playback container.
//!
//! Stands in for the media engine side: it owns the playback facts (duration,
//! live/VOD, playing) and announces every change on its emitter. It never
//! references its listeners.

use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use super::control_events::{KEY_END_POSITION, KEY_POSITION};
use crate::core::{AsEmitter, Bindings, EmitterConfig, EventCapable, EventEmitter, EventObject, Payload};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackType {
    #[default]
    Vod,
    Live,
}

#[derive(Debug, Clone)]
struct ContainerState {
    duration: f64,
    playback_type: PlaybackType,
    playing: bool,
    position: f64,
    media_control_enabled: bool,
}

#[derive(Debug)]
pub struct Container {
    object: EventObject,
    state: RefCell<ContainerState>,
}

impl Container {
    pub fn new(duration: f64, playback_type: PlaybackType) -> Rc<Self> {
        Self::with_config(duration, playback_type, EmitterConfig::default())
    }

    pub fn with_config(duration: f64, playback_type: PlaybackType, config: EmitterConfig) -> Rc<Self> {
        Rc::new(Self {
            object: EventObject::with_emitter(EventEmitter::with_config(config)),
            state: RefCell::new(ContainerState {
                duration: duration.max(0.0),
                playback_type,
                playing: false,
                position: 0.0,
                media_control_enabled: true,
            }),
        })
    }

    pub fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    pub fn playback_type(&self) -> PlaybackType {
        self.state.borrow().playback_type
    }

    pub fn is_live(&self) -> bool {
        self.playback_type() == PlaybackType::Live
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position
    }

    pub fn media_control_enabled(&self) -> bool {
        self.state.borrow().media_control_enabled
    }

    // ========== Playback ==========

    pub fn ready(&self) {
        self.trigger(Event::Ready);
    }

    pub fn play(&self) {
        self.state.borrow_mut().playing = true;
        self.trigger(Event::Playing);
    }

    pub fn pause(&self) {
        self.state.borrow_mut().playing = false;
        self.trigger(Event::DidPause);
    }

    pub fn stop(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.playing = false;
            state.position = 0.0;
        }
        self.trigger(Event::DidStop);
    }

    pub fn complete(&self) {
        self.state.borrow_mut().playing = false;
        self.trigger(Event::DidComplete);
    }

    /// Move the playhead, clamped to `[0, duration]`.
    pub fn seek(&self, position: f64) {
        let position = {
            let mut state = self.state.borrow_mut();
            state.position = position.clamp(0.0, state.duration);
            state.position
        };
        debug!("Container seek -> {:.3}s", position);
        self.trigger_with(Event::PositionUpdate, &Payload::new().with(KEY_POSITION, position));
    }

    pub fn update_buffer(&self, end_position: f64) {
        self.trigger_with(Event::BufferUpdate, &Payload::new().with(KEY_END_POSITION, end_position));
    }

    pub fn set_media_control_enabled(&self, enabled: bool) {
        self.state.borrow_mut().media_control_enabled = enabled;
        if enabled {
            self.trigger(Event::EnableMediaControl);
        } else {
            self.trigger(Event::DisableMediaControl);
        }
    }
}

impl AsEmitter for Container {
    fn as_emitter(&self) -> &EventEmitter {
        self.object.as_emitter()
    }
}

impl EventCapable for Container {
    fn bindings(&self) -> &Bindings {
        self.object.bindings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn record(container: &Container, events: &[Event]) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for event in events {
            let l = Rc::clone(&log);
            let name = event.as_str();
            container.on(event, move |p| {
                let entry = match p.get_f64(KEY_POSITION) {
                    Some(pos) => format!("{}@{}", name, pos),
                    None => name.to_string(),
                };
                l.borrow_mut().push(entry);
            });
        }
        log
    }

    #[test]
    fn test_playback_events() {
        let container = Container::new(60.0, PlaybackType::Vod);
        let log = record(&container, &[Event::Playing, Event::DidPause, Event::DidStop]);

        container.play();
        assert!(container.is_playing());
        container.pause();
        assert!(!container.is_playing());
        container.stop();

        assert_eq!(*log.borrow(), vec!["playing", "didPause", "didStop"]);
    }

    #[test]
    fn test_seek_clamps_and_reports_position() {
        let container = Container::new(60.0, PlaybackType::Vod);
        let log = record(&container, &[Event::PositionUpdate]);

        container.seek(30.0);
        container.seek(90.0);
        container.seek(-1.0);

        assert_eq!(
            *log.borrow(),
            vec!["positionUpdate@30", "positionUpdate@60", "positionUpdate@0"]
        );
    }

    #[test]
    fn test_media_control_toggle_events() {
        let container = Container::new(0.0, PlaybackType::Live);
        let log = record(&container, &[Event::EnableMediaControl, Event::DisableMediaControl]);

        container.set_media_control_enabled(false);
        assert!(!container.media_control_enabled());
        container.set_media_control_enabled(true);

        assert!(container.is_live());
        assert_eq!(*log.borrow(), vec!["disableMediaControl", "enableMediaControl"]);
    }
}

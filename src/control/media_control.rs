//! Headless media control: the player's transport-bar state machine.
//!
//! **Architecture**: MediaControl never owns its Container. `setup()` stores a
//! `Weak<Container>` and subscribes to the container's events through
//! `listen_to`, recording each binding on the control itself. Every callback
//! captures `Weak<MediaControl>`, so the container's listener table never
//! keeps the control alive.
//!
//! Teardown paths:
//! - `setup()` with another container: `stop_listening()` first, then rebind
//! - `teardown()`: unbind everything and release the orientation observer
//! - drop: `Bindings` and `NotificationSubscription` guards do the same
//!
//! # Container events handled
//!
//! | event                 | effect                                        |
//! |-----------------------|-----------------------------------------------|
//! | `playing`             | state = Playing, emit `mediaControlPlaying`   |
//! | `didPause`            | state = Paused, emit `mediaControlNotPlaying` |
//! | `didStop`             | state = Stopped, emit `mediaControlNotPlaying`|
//! | `didComplete`         | state = Stopped                               |
//! | `ready`               | detect live/VOD                               |
//! | `positionUpdate`      | seek percentage from `position`               |
//! | `bufferUpdate`        | buffer percentage from `end_position`         |
//! | `disableMediaControl` | disable + hide                                |
//! | `enableMediaControl`  | enable + show                                 |

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::container::Container;
use super::control_events::{KEY_END_POSITION, KEY_POSITION, MediaControlEvent, ORIENTATION_CHANGED_NOTIFICATION};
use crate::core::{
    AsEmitter, Bindings, EmitterConfig, EventCapable, EventEmitter, EventObject, NotificationBridge,
    NotificationCenter, NotificationSubscription, Payload,
};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackControlState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Snapshot of everything the control would render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaControlState {
    pub playback_control_state: PlaybackControlState,
    pub enabled: bool,
    pub controls_hidden: bool,
    pub live_playback: bool,
    /// Playhead position as a fraction of duration
    pub seek_percentage: f64,
    /// Buffered end as a fraction of duration
    pub buffer_percentage: f64,
    /// Layout passes requested by orientation changes
    pub layout_refreshes: u32,
}

impl Default for MediaControlState {
    fn default() -> Self {
        Self {
            playback_control_state: PlaybackControlState::Stopped,
            enabled: false,
            controls_hidden: true,
            live_playback: false,
            seek_percentage: 0.0,
            buffer_percentage: 0.0,
            layout_refreshes: 0,
        }
    }
}

type Handler = fn(&MediaControl, &Payload);

#[derive(Debug)]
pub struct MediaControl {
    object: EventObject,
    container: RefCell<Weak<Container>>,
    state: RefCell<MediaControlState>,
    orientation: RefCell<Option<NotificationSubscription>>,
}

impl MediaControl {
    /// Create a hidden, disabled control with no container.
    pub fn new() -> Rc<Self> {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Rc<Self> {
        Rc::new(Self {
            object: EventObject::with_emitter(EventEmitter::with_config(config)),
            container: RefCell::new(Weak::new()),
            state: RefCell::new(MediaControlState::default()),
            orientation: RefCell::new(None),
        })
    }

    /// Observe device rotation on `center` and refresh layout on each one.
    /// Replaces any previous observation.
    pub fn bind_orientation_changed(self: &Rc<Self>, center: &NotificationCenter) {
        let weak = Rc::downgrade(self);
        let subscription = center.observe(
            ORIENTATION_CHANGED_NOTIFICATION,
            None,
            NotificationBridge::new(move |_| {
                if let Some(control) = weak.upgrade() {
                    control.did_rotate();
                }
            }),
        );
        *self.orientation.borrow_mut() = Some(subscription);
    }

    /// Attach to `container`, dropping every binding to a previous one.
    pub fn setup(self: &Rc<Self>, container: &Rc<Container>) {
        self.stop_listening();
        *self.container.borrow_mut() = Rc::downgrade(container);
        self.bind_event_listeners(container);

        if container.media_control_enabled() {
            self.enable();
        } else {
            self.disable();
        }
        self.state.borrow_mut().playback_control_state = if container.is_playing() {
            PlaybackControlState::Playing
        } else {
            PlaybackControlState::Stopped
        };
        debug!("MediaControl set up with {} bindings", self.bindings().len());
    }

    fn bind_event_listeners(self: &Rc<Self>, container: &Container) {
        let handlers: [(Event, Handler); 9] = [
            (Event::Playing, |mc, _| mc.playback_started()),
            (Event::DidPause, |mc, _| mc.playback_paused()),
            (Event::DidStop, |mc, _| mc.playback_stopped()),
            (Event::DidComplete, |mc, _| mc.set_playback_control_state(PlaybackControlState::Stopped)),
            (Event::Ready, |mc, _| mc.container_ready()),
            (Event::PositionUpdate, |mc, p| mc.time_updated(p)),
            (Event::BufferUpdate, |mc, p| mc.progress_updated(p)),
            (Event::DisableMediaControl, |mc, _| mc.disable()),
            (Event::EnableMediaControl, |mc, _| mc.enable()),
        ];

        for (event, handler) in handlers {
            let weak = Rc::downgrade(self);
            self.listen_to(container, event, move |payload| {
                if let Some(control) = weak.upgrade() {
                    handler(&control, payload);
                }
            });
        }
    }

    /// Unbind from the container and release the orientation observer.
    pub fn teardown(&self) {
        self.stop_listening();
        self.orientation.borrow_mut().take();
        *self.container.borrow_mut() = Weak::new();
    }

    pub fn state(&self) -> MediaControlState {
        self.state.borrow().clone()
    }

    pub fn playback_control_state(&self) -> PlaybackControlState {
        self.state.borrow().playback_control_state
    }

    fn container(&self) -> Option<Rc<Container>> {
        self.container.borrow().upgrade()
    }

    fn set_playback_control_state(&self, state: PlaybackControlState) {
        self.state.borrow_mut().playback_control_state = state;
    }

    // ========== Container callbacks ==========

    fn playback_started(&self) {
        self.set_playback_control_state(PlaybackControlState::Playing);
        self.trigger(MediaControlEvent::Playing);
    }

    fn playback_paused(&self) {
        self.set_playback_control_state(PlaybackControlState::Paused);
        self.trigger(MediaControlEvent::NotPlaying);
    }

    fn playback_stopped(&self) {
        self.set_playback_control_state(PlaybackControlState::Stopped);
        self.trigger(MediaControlEvent::NotPlaying);
    }

    fn container_ready(&self) {
        let live = self.container().is_some_and(|c| c.is_live());
        let mut state = self.state.borrow_mut();
        state.live_playback = live;
        if live {
            state.seek_percentage = 1.0;
        }
    }

    fn time_updated(&self, payload: &Payload) {
        let Some(position) = payload.get_f64(KEY_POSITION) else {
            trace!("positionUpdate without '{}'", KEY_POSITION);
            return;
        };
        if self.state.borrow().live_playback {
            return;
        }
        let seek = self.fraction_of_duration(position);
        self.state.borrow_mut().seek_percentage = seek;
    }

    fn progress_updated(&self, payload: &Payload) {
        let Some(end) = payload.get_f64(KEY_END_POSITION) else {
            trace!("bufferUpdate without '{}'", KEY_END_POSITION);
            return;
        };
        if self.state.borrow().live_playback {
            return;
        }
        let buffer = self.fraction_of_duration(end);
        self.state.borrow_mut().buffer_percentage = buffer;
    }

    fn fraction_of_duration(&self, seconds: f64) -> f64 {
        let duration = self.container().map(|c| c.duration()).unwrap_or(0.0);
        if duration == 0.0 { 0.0 } else { seconds / duration }
    }

    fn did_rotate(&self) {
        self.state.borrow_mut().layout_refreshes += 1;
    }

    // ========== Visibility ==========

    fn enable(&self) {
        self.state.borrow_mut().enabled = true;
        self.show();
    }

    fn disable(&self) {
        self.state.borrow_mut().enabled = false;
        self.hide();
    }

    pub fn show(&self) {
        self.set_controls_hidden(false);
    }

    pub fn hide(&self) {
        self.set_controls_hidden(true);
    }

    pub fn toggle_visibility(&self) {
        if self.state.borrow().controls_hidden {
            self.show();
        } else {
            self.hide();
        }
    }

    /// A disabled control can be hidden but not shown.
    fn set_controls_hidden(&self, hidden: bool) {
        let mut state = self.state.borrow_mut();
        if !hidden && !state.enabled {
            return;
        }
        state.controls_hidden = hidden;
    }

    // ========== User actions ==========

    /// Play/pause button: pauses (or stops, when live) while playing, else plays.
    pub fn toggle_play(&self) {
        let current = self.playback_control_state();
        let live = self.state.borrow().live_playback;
        match (current, live) {
            (PlaybackControlState::Playing, true) => self.stop(),
            (PlaybackControlState::Playing, false) => self.pause(),
            _ => self.play(),
        }
    }

    // With a container the state change arrives back through its event;
    // without one it is applied directly.

    pub fn play(&self) {
        match self.container() {
            Some(container) => container.play(),
            None => self.playback_started(),
        }
    }

    pub fn pause(&self) {
        match self.container() {
            Some(container) => container.pause(),
            None => self.playback_paused(),
        }
    }

    pub fn stop(&self) {
        match self.container() {
            Some(container) => container.stop(),
            None => self.playback_stopped(),
        }
    }
}

impl AsEmitter for MediaControl {
    fn as_emitter(&self) -> &EventEmitter {
        self.object.as_emitter()
    }
}

impl EventCapable for MediaControl {
    fn bindings(&self) -> &Bindings {
        self.object.bindings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::container::PlaybackType;
    use crate::core::Notification;

    fn control_events(control: &MediaControl) -> Rc<RefCell<Vec<&'static str>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for event in [MediaControlEvent::Playing, MediaControlEvent::NotPlaying] {
            let l = Rc::clone(&log);
            control.on(event, move |_| l.borrow_mut().push(event.as_str()));
        }
        log
    }

    #[test]
    fn test_new_control_is_hidden_and_disabled() {
        let control = MediaControl::new();
        let state = control.state();
        assert!(state.controls_hidden);
        assert!(!state.enabled);

        // Disabled control refuses to show
        control.show();
        assert!(control.state().controls_hidden);
    }

    #[test]
    fn test_setup_reflects_container() {
        let container = Container::new(120.0, PlaybackType::Vod);
        container.play();

        let control = MediaControl::new();
        control.setup(&container);

        let state = control.state();
        assert_eq!(state.playback_control_state, PlaybackControlState::Playing);
        assert!(state.enabled);
        assert!(!state.controls_hidden);
        assert_eq!(control.bindings().len(), 9);
    }

    #[test]
    fn test_play_pause_stop_round_trip() {
        let container = Container::new(120.0, PlaybackType::Vod);
        let control = MediaControl::new();
        control.setup(&container);
        let log = control_events(&control);

        control.toggle_play();
        assert_eq!(control.playback_control_state(), PlaybackControlState::Playing);
        assert!(container.is_playing());

        control.toggle_play();
        assert_eq!(control.playback_control_state(), PlaybackControlState::Paused);
        assert!(!container.is_playing());

        container.stop();
        assert_eq!(control.playback_control_state(), PlaybackControlState::Stopped);

        assert_eq!(
            *log.borrow(),
            vec!["mediaControlPlaying", "mediaControlNotPlaying", "mediaControlNotPlaying"]
        );
    }

    #[test]
    fn test_position_and_buffer_updates() {
        let container = Container::new(120.0, PlaybackType::Vod);
        let control = MediaControl::new();
        control.setup(&container);

        container.seek(30.0);
        container.update_buffer(90.0);
        let state = control.state();
        assert_eq!(state.seek_percentage, 0.25);
        assert_eq!(state.buffer_percentage, 0.75);

        // Missing or mistyped keys leave state untouched
        container.trigger(Event::PositionUpdate);
        container.trigger_with(Event::BufferUpdate, &Payload::new().with(KEY_END_POSITION, "soon"));
        assert_eq!(control.state(), state);
    }

    #[test]
    fn test_zero_duration_gives_zero_fraction() {
        let container = Container::new(0.0, PlaybackType::Vod);
        let control = MediaControl::new();
        control.setup(&container);

        container.trigger_with(Event::PositionUpdate, &Payload::new().with(KEY_POSITION, 10.0));
        assert_eq!(control.state().seek_percentage, 0.0);
    }

    #[test]
    fn test_live_playback() {
        let container = Container::new(0.0, PlaybackType::Live);
        let control = MediaControl::new();
        control.setup(&container);
        container.ready();

        let state = control.state();
        assert!(state.live_playback);
        assert_eq!(state.seek_percentage, 1.0);

        // Position updates are ignored for live streams
        container.seek(5.0);
        assert_eq!(control.state().seek_percentage, 1.0);

        // Toggling while playing live stops instead of pausing
        control.toggle_play();
        control.toggle_play();
        assert_eq!(control.playback_control_state(), PlaybackControlState::Stopped);
    }

    #[test]
    fn test_disable_enable_from_container() {
        let container = Container::new(60.0, PlaybackType::Vod);
        let control = MediaControl::new();
        control.setup(&container);

        container.set_media_control_enabled(false);
        assert!(!control.state().enabled);
        assert!(control.state().controls_hidden);
        control.toggle_visibility();
        assert!(control.state().controls_hidden);

        container.set_media_control_enabled(true);
        assert!(!control.state().controls_hidden);
        control.toggle_visibility();
        assert!(control.state().controls_hidden);
    }

    #[test]
    fn test_resetup_detaches_from_old_container() {
        let old = Container::new(100.0, PlaybackType::Vod);
        let new = Container::new(200.0, PlaybackType::Vod);
        let control = MediaControl::new();

        control.setup(&old);
        assert!(old.as_emitter().has_listeners(Event::Playing));

        control.setup(&new);
        assert!(old.as_emitter().is_empty());
        assert_eq!(control.bindings().len(), 9);

        old.play();
        assert_eq!(control.playback_control_state(), PlaybackControlState::Stopped);

        new.seek(50.0);
        assert_eq!(control.state().seek_percentage, 0.25);
    }

    #[test]
    fn test_drop_control_unbinds_from_container() {
        let container = Container::new(60.0, PlaybackType::Vod);
        {
            let control = MediaControl::new();
            control.setup(&container);
            assert_eq!(container.as_emitter().len(), 9);
        }
        assert!(container.as_emitter().is_empty());
        // Nothing dangling to invoke
        container.play();
    }

    #[test]
    fn test_container_dropped_before_control() {
        let control = MediaControl::new();
        {
            let container = Container::new(60.0, PlaybackType::Vod);
            control.setup(&container);
        }
        // Stale bindings are dropped silently
        control.teardown();
        assert!(control.bindings().is_empty());
        // No container: play applies locally
        control.play();
        assert_eq!(control.playback_control_state(), PlaybackControlState::Playing);
    }

    #[test]
    fn test_orientation_notification() {
        let center = NotificationCenter::new();
        let control = MediaControl::new();
        control.bind_orientation_changed(&center);

        center.post(&Notification::new(ORIENTATION_CHANGED_NOTIFICATION));
        center.post(&Notification::new(ORIENTATION_CHANGED_NOTIFICATION));
        assert_eq!(control.state().layout_refreshes, 2);

        drop(control);
        assert_eq!(center.observer_count(), 0);
        assert_eq!(center.post(&Notification::new(ORIENTATION_CHANGED_NOTIFICATION)), 0);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let center = NotificationCenter::new();
        let container = Container::new(60.0, PlaybackType::Vod);
        let control = MediaControl::new();
        control.bind_orientation_changed(&center);
        control.setup(&container);

        control.teardown();
        assert!(container.as_emitter().is_empty());
        assert_eq!(center.observer_count(), 0);
    }
}

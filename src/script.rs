//! Scripted container/media-control sessions.
//!
//! A script describes one container and a list of steps. Each step is applied
//! to a fresh [`Session`] and produces a [`StepReport`] with the media-control
//! state afterwards plus the events the control emitted during the step.
//!
//! ```json
//! {
//!   "duration": 120.0,
//!   "steps": [
//!     {"op": "trigger", "event": "ready"},
//!     {"op": "toggle_play"},
//!     {"op": "trigger", "event": "positionUpdate", "payload": {"position": 30.0}},
//!     {"op": "notify", "name": "deviceOrientationDidChange"},
//!     {"op": "teardown"}
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::config::BusConfig;
use crate::control::{
    Container, MediaControl, MediaControlEvent, MediaControlState, ORIENTATION_CHANGED_NOTIFICATION, PlaybackType,
};
use crate::core::{EventCapable, Notification, NotificationCenter, Payload};
use crate::events::Event;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Media duration in seconds (0 for unknown/live)
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub live: bool,
    #[serde(default = "default_true")]
    pub media_control_enabled: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Trigger a raw event on the container (any name)
    Trigger {
        event: String,
        #[serde(default)]
        payload: Payload,
    },
    Play,
    Pause,
    Stop,
    Seek { position: f64 },
    Buffer { end_position: f64 },
    TogglePlay,
    ToggleVisibility,
    /// Post a platform notification through the cross-thread queue
    Notify {
        name: String,
        #[serde(default)]
        payload: Option<Payload>,
    },
    Teardown,
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::Trigger { .. } => "trigger",
            Step::Play => "play",
            Step::Pause => "pause",
            Step::Stop => "stop",
            Step::Seek { .. } => "seek",
            Step::Buffer { .. } => "buffer",
            Step::TogglePlay => "toggle_play",
            Step::ToggleVisibility => "toggle_visibility",
            Step::Notify { .. } => "notify",
            Step::Teardown => "teardown",
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid script: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(text)?;
        if script.duration < 0.0 {
            anyhow::bail!("duration must not be negative (got {})", script.duration);
        }
        Ok(script)
    }

    /// Built-in session used when no script is given.
    pub fn demo() -> Self {
        Self {
            duration: 120.0,
            live: false,
            media_control_enabled: true,
            steps: vec![
                Step::Trigger {
                    event: Event::Ready.to_string(),
                    payload: Payload::default(),
                },
                Step::TogglePlay,
                Step::Seek { position: 30.0 },
                Step::Buffer { end_position: 90.0 },
                Step::Notify {
                    name: ORIENTATION_CHANGED_NOTIFICATION.to_string(),
                    payload: None,
                },
                Step::TogglePlay,
                Step::Trigger {
                    event: Event::DisableMediaControl.to_string(),
                    payload: Payload::default(),
                },
                Step::Teardown,
                Step::Play,
            ],
        }
    }
}

/// Result of applying one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: usize,
    pub op: String,
    /// Events the media control emitted while the step ran
    pub emitted: Vec<String>,
    pub state: MediaControlState,
}

/// One container wired to one media control.
pub struct Session {
    center: NotificationCenter,
    container: Rc<Container>,
    control: Rc<MediaControl>,
    emitted: Rc<RefCell<Vec<String>>>,
}

impl Session {
    pub fn new(script: &Script, config: &BusConfig) -> Self {
        let emitter_config = config.emitter_config();
        let playback_type = if script.live { PlaybackType::Live } else { PlaybackType::Vod };

        let center = NotificationCenter::new();
        let container = Container::with_config(script.duration, playback_type, emitter_config);
        if !script.media_control_enabled {
            container.set_media_control_enabled(false);
        }

        let control = MediaControl::with_config(emitter_config);
        control.bind_orientation_changed(&center);
        control.setup(&container);

        let emitted = Rc::new(RefCell::new(Vec::new()));
        for event in [MediaControlEvent::Playing, MediaControlEvent::NotPlaying] {
            let log = Rc::clone(&emitted);
            control.on(event, move |_| log.borrow_mut().push(event.to_string()));
        }

        Self {
            center,
            container,
            control,
            emitted,
        }
    }

    pub fn apply(&self, step: &Step) {
        debug!("Applying step: {:?}", step);
        match step {
            Step::Trigger { event, payload } => {
                if event.parse::<Event>().is_err() {
                    debug!("'{}' is not a player event, triggering anyway", event);
                }
                self.container.trigger_with(event, payload);
            }
            Step::Play => self.container.play(),
            Step::Pause => self.container.pause(),
            Step::Stop => self.container.stop(),
            Step::Seek { position } => self.container.seek(*position),
            Step::Buffer { end_position } => self.container.update_buffer(*end_position),
            Step::TogglePlay => self.control.toggle_play(),
            Step::ToggleVisibility => self.control.toggle_visibility(),
            Step::Notify { name, payload } => {
                let mut notification = Notification::new(name.as_str()).with_source("script");
                notification.user_info = payload.clone();
                if !self.center.poster().post(notification) {
                    warn!("Notification '{}' was not queued", name);
                }
                self.center.dispatch_pending();
            }
            Step::Teardown => self.control.teardown(),
        }
    }

    pub fn state(&self) -> MediaControlState {
        self.control.state()
    }

    fn take_emitted(&self) -> Vec<String> {
        std::mem::take(&mut *self.emitted.borrow_mut())
    }
}

/// Apply every step of `script` in order.
pub fn run(script: &Script, config: &BusConfig) -> Vec<StepReport> {
    let session = Session::new(script, config);
    let reports: Vec<StepReport> = script
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            session.apply(step);
            StepReport {
                step: index,
                op: step.op().to_string(),
                emitted: session.take_emitted(),
                state: session.state(),
            }
        })
        .collect();
    info!("Script finished: {} step(s)", reports.len());
    reports
}

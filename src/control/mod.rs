//! Headless player components built on the event core.
//!
//! [`Container`] announces playback changes; [`MediaControl`] listens to a
//! container via cross-object bindings and keeps the transport-bar state.
//! No rendering or gesture handling lives here.

pub mod container;
pub mod control_events;
pub mod media_control;

pub use container::{Container, PlaybackType};
pub use control_events::{MediaControlEvent, ORIENTATION_CHANGED_NOTIFICATION};
pub use media_control::{MediaControl, MediaControlState, PlaybackControlState};

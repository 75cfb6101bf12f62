//! Model module - Application state and data types
//!
//! - `song`: Song and playlist records
//! - `types`: Screens, list cursors, prompt and UI state
//! - `playback`: The playback session state machine
//! - `app_model`: Main application model tying library, search and session together

mod app_model;
mod playback;
mod song;
mod types;

pub use song::{Playlist, Song, UNKNOWN_TITLE};

pub use types::{InputPurpose, InputState, ListCursor, Screen, UiState};

pub use playback::{Direction, GRACE_PERIOD, PlaybackError, PlaybackSession, PlaybackSource};

#[cfg(test)]
pub(crate) use playback::fake::FakePlayer;

pub use app_model::AppModel;

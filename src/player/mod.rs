//! Player control.
//!
//! The rest of the application talks to the player through [`PlayerBackend`];
//! [`MpvClient`] is the real implementation over mpv's IPC socket.

pub mod connection;
pub mod mpv;
pub mod protocol;

use std::io;

use thiserror::Error;

pub use connection::PlayerConnection;
pub use mpv::MpvClient;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player unavailable: {0}")]
    Unavailable(String),
    #[error("Player I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Fire-and-forget control of an external player
pub trait PlayerBackend {
    /// Connects to the player, launching it first if nothing is listening
    fn ensure_running(&mut self) -> Result<(), PlayerError>;

    /// Replaces whatever is playing with `url`
    fn load(&mut self, url: &str) -> Result<(), PlayerError>;

    fn toggle_pause(&mut self) -> Result<(), PlayerError>;

    fn stop(&mut self) -> Result<(), PlayerError>;

    /// Non-blocking. True only if the current item played to its end.
    fn poll_track_end(&mut self) -> bool;

    /// Discards any pending events
    fn drain(&mut self);

    fn is_connected(&self) -> bool;

    /// Shuts the player down and releases its resources
    fn quit(&mut self);
}

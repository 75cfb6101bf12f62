//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! mutates the model, and drives the player. It is organized into submodules
//! by responsibility:
//!
//! - `input`: Key event handling and the text prompt
//! - `navigation`: Screen transitions and list movement
//! - `playback`: Play, pause, next/previous and the auto-advance tick
//! - `library`: Search and playlist mutations

mod input;
mod library;
mod navigation;
mod playback;

#[cfg(test)]
mod tests;

pub use navigation::Movement;

use crate::model::{AppModel, PlaybackError};
use crate::player::{PlayerBackend, PlayerError};
use crate::search::SearchProvider;

pub const WELCOME_STATUS: &str = "Press / to search, f for playlists, h for help.";

pub struct AppController<P: PlayerBackend> {
    pub(crate) model: AppModel,
    pub(crate) player: P,
    search: Box<dyn SearchProvider>,
    max_results: usize,
}

impl<P: PlayerBackend> AppController<P> {
    pub fn new(model: AppModel, player: P, search: Box<dyn SearchProvider>, max_results: usize) -> Self {
        let mut controller = Self {
            model,
            player,
            search,
            max_results,
        };
        controller.model.set_status(WELCOME_STATUS);
        controller
    }

    pub fn model(&self) -> &AppModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut AppModel {
        &mut self.model
    }

    pub fn should_quit(&self) -> bool {
        self.model.should_quit
    }

    /// Shuts the player down; called once on exit
    pub fn shutdown(&mut self) {
        tracing::info!("Shutting down player");
        self.model.session.reset();
        self.player.quit();
    }

    /// Shows a playback failure. A player outage is only reported once until
    /// the player comes back.
    pub(crate) fn report_playback_error(&mut self, error: &PlaybackError) {
        if matches!(error, PlaybackError::Player(PlayerError::Unavailable(_))) {
            if self.model.player_outage_reported {
                return;
            }
            self.model.player_outage_reported = true;
        }
        tracing::warn!(error = %error, "Playback action failed");
        self.model.set_status(Self::format_error(error));
    }

    pub(crate) fn format_error(error: &PlaybackError) -> String {
        match error {
            PlaybackError::Player(PlayerError::Unavailable(reason)) => {
                format!("Player unavailable ({}). Is mpv installed?", reason)
            }
            PlaybackError::Player(PlayerError::Io(e)) => format!("Player error: {}", e),
            PlaybackError::OutOfRange(_) => "Nothing to play there".to_string(),
            PlaybackError::Library(e) => format!("Error: {}", e),
        }
    }
}

//! Playback control methods

use std::time::Instant;

use crate::model::{Direction, PlaybackError, PlaybackSource, Screen};
use crate::player::PlayerBackend;

use super::AppController;

impl<P: PlayerBackend> AppController<P> {
    pub fn play_search_result(&mut self, index: usize, now: Instant) {
        let model = &mut self.model;
        let result = model
            .session
            .play_from_search(&mut self.player, &model.search_results, index, now)
            .map(|song| song.title.clone());
        self.after_play(result);
    }

    pub fn play_playlist_song(&mut self, playlist: usize, index: usize, now: Instant) {
        let model = &mut self.model;
        let result = model
            .session
            .play_from_playlist(&mut self.player, &mut model.library, playlist, index, now)
            .map(|song| song.title.clone());
        self.after_play(result);
    }

    pub fn toggle_pause(&mut self) {
        match self.model.session.toggle_pause(&mut self.player) {
            Ok(true) => {
                let status = if self.model.session.is_paused() { "Paused" } else { "Playing" };
                self.model.set_status(status);
            }
            Ok(false) => {}
            Err(e) => self.report_playback_error(&PlaybackError::from(e)),
        }
    }

    /// Next/previous within the current source; a no-op at either end
    pub fn skip(&mut self, direction: Direction, now: Instant) {
        if !self.model.session.is_active() {
            return;
        }
        match self.advance(direction, now) {
            Ok(Some(title)) => {
                let label = match direction {
                    Direction::Next => "Next",
                    Direction::Previous => "Previous",
                };
                self.model.set_status(format!("{}: {}", label, title));
            }
            Ok(None) => {}
            Err(e) => self.report_playback_error(&e),
        }
    }

    pub fn stop_playback(&mut self) {
        if self.model.session.is_active() {
            self.model.session.stop(&mut self.player);
            self.model.set_status("Playback stopped");
        }
    }

    /// One tick of the auto-advance loop. Returns true if the session moved.
    ///
    /// Events arriving within the grace period after a load are drained and
    /// ignored. After that, a natural end of track advances at most once.
    pub fn poll_player_at(&mut self, now: Instant) -> bool {
        if !self.model.session.is_active() {
            return false;
        }
        if !self.model.session.grace_elapsed(now) {
            self.player.drain();
            return false;
        }
        if !self.player.poll_track_end() {
            return false;
        }

        tracing::debug!(position = self.model.session.position(), "Track ended");
        match self.advance(Direction::Next, now) {
            Ok(Some(title)) => {
                self.model.set_status(format!("Auto-playing: {}", title));
            }
            Ok(None) => {
                self.model.session.reset();
                self.model.set_status("Playback finished");
            }
            Err(e) => {
                self.model.session.reset();
                self.report_playback_error(&e);
            }
        }
        true
    }

    pub fn poll_player(&mut self) -> bool {
        self.poll_player_at(Instant::now())
    }

    fn advance(&mut self, direction: Direction, now: Instant) -> Result<Option<String>, PlaybackError> {
        let model = &mut self.model;
        let moved = model
            .session
            .advance(&mut self.player, &model.search_results, &mut model.library, direction, now)?
            .map(|song| song.title.clone());
        if moved.is_some() {
            self.model.player_outage_reported = false;
            self.follow_session();
        }
        Ok(moved)
    }

    fn after_play(&mut self, result: Result<String, PlaybackError>) {
        match result {
            Ok(title) => {
                self.model.player_outage_reported = false;
                self.model.set_status(format!("Playing: {}", title));
                self.follow_session();
            }
            Err(e) => self.report_playback_error(&e),
        }
    }

    /// Moves the selection of the source's list onto the playing song
    fn follow_session(&mut self) {
        let position = self.model.session.position();
        let screen = match self.model.session.source() {
            PlaybackSource::None => return,
            PlaybackSource::SearchResults => Screen::Search,
            PlaybackSource::Playlist(p) if self.model.ui_state.open_playlist == Some(p) => {
                Screen::PlaylistSongs
            }
            PlaybackSource::Playlist(_) => return,
        };
        let len = self.model.list_len(screen);
        let height = self.model.ui_state.list_height;
        let cursor = self.model.ui_state.cursor_mut(screen);
        cursor.select(position, len);
        cursor.keep_visible(height);
    }
}

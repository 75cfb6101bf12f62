//! Search and playlist mutations

use crate::library::LibraryError;
use crate::model::{InputPurpose, Screen};
use crate::player::PlayerBackend;

use super::AppController;

impl<P: PlayerBackend> AppController<P> {
    /// Queues a search; `run_pending_search` runs it after the next frame
    pub fn submit_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.model.set_status("Search cancelled");
            return;
        }
        self.model.set_status(format!("Searching: {} ...", query));
        self.model.pending_search = Some(query.to_string());
    }

    /// Runs a queued search, blocking until the search tool exits
    pub fn run_pending_search(&mut self) {
        let Some(query) = self.model.pending_search.take() else {
            return;
        };

        match self.search.search(&query, self.max_results) {
            Ok(songs) => {
                let stopped = self.model.session.on_search_replaced(&mut self.player);
                let count = songs.len();
                self.model.search_results = songs;
                self.model.last_query = query.clone();
                self.model.ui_state.search_cursor.reset();

                let mut status = if count == 0 {
                    format!("No results for: {}", query)
                } else {
                    format!("Found {} results for: {}", count, query)
                };
                if stopped {
                    status.push_str(" (playback stopped)");
                }
                self.model.set_status(status);
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Search failed");
                self.model.set_status("Search error!");
            }
        }
    }

    pub fn create_playlist(&mut self, name: &str) -> Option<usize> {
        match self.model.library.create(name) {
            Ok(index) => {
                self.model.set_status(format!("Created playlist: {}", name.trim()));
                Some(index)
            }
            Err(e) => {
                self.report_library_error(&e);
                None
            }
        }
    }

    /// Creates a playlist and adds the pending song to it
    pub fn create_and_add(&mut self, name: &str) {
        let Some(index) = self.create_playlist(name) else {
            return;
        };
        let Some(song) = self.model.pending_song.take() else {
            return;
        };

        match self.model.library.add_song(index, &song) {
            Ok(()) => self.model.set_status(format!("Created '{}' and added song", name.trim())),
            Err(e) => self.report_library_error(&e),
        }
        self.enter(Screen::Search);
    }

    /// Adds the pending song to the playlist selected in `AddToPlaylist`
    pub fn add_pending_to_selected(&mut self) {
        if self.model.library.is_empty() {
            self.model.set_status("No playlists yet, press c to create one");
            return;
        }
        let Some(song) = self.model.pending_song.take() else {
            self.enter(Screen::Search);
            return;
        };

        let index = self.model.ui_state.add_cursor.selected;
        match self.model.library.add_song(index, &song) {
            Ok(()) => {
                let name = self.model.library.get(index).map(|p| p.name.clone()).unwrap_or_default();
                self.model.set_status(format!("Added to: {}", name));
            }
            Err(e) => self.report_library_error(&e),
        }
        self.enter(Screen::Search);
    }

    pub fn rename_playlist(&mut self, index: usize, name: &str) {
        match self.model.library.rename(index, name) {
            Ok(()) => self.model.set_status(format!("Renamed to: {}", name.trim())),
            Err(e) => self.report_library_error(&e),
        }
    }

    /// Deletes a playlist and fixes every index that pointed past it
    pub fn delete_playlist(&mut self, index: usize) {
        if let Err(e) = self.model.library.delete(index) {
            self.report_library_error(&e);
            return;
        }

        let stopped = self.model.session.on_playlist_deleted(&mut self.player, index);
        let ui = &mut self.model.ui_state;
        ui.open_playlist = match ui.open_playlist {
            Some(open) if open == index => None,
            Some(open) if open > index => Some(open - 1),
            other => other,
        };
        self.model.clamp_cursors();

        self.model.set_status(if stopped {
            "Deleted playlist, playback stopped"
        } else {
            "Deleted playlist"
        });
    }

    /// Removes the selected song from the open playlist
    pub fn remove_selected_song(&mut self) {
        let Some(playlist) = self.model.ui_state.open_playlist else {
            return;
        };
        let song_index = self.model.ui_state.songs_cursor.selected;
        if song_index >= self.model.open_playlist_songs().len() {
            return;
        }

        match self.model.library.remove_song(playlist, song_index) {
            Ok(song) => {
                let stopped = self.model.session.on_song_removed(&mut self.player, playlist, song_index);
                self.model.clamp_cursors();
                let mut status = format!("Removed: {}", song.title);
                if stopped {
                    status.push_str(" (playback stopped)");
                }
                self.model.set_status(status);
            }
            Err(e) => self.report_library_error(&e),
        }
    }

    /// Dispatches a submitted prompt
    pub(crate) fn submit_input(&mut self, purpose: InputPurpose, text: &str) {
        let text = text.trim();
        match purpose {
            InputPurpose::Search => self.submit_search(text),
            _ if text.is_empty() => self.model.set_status("Cancelled"),
            InputPurpose::CreatePlaylist => {
                if let Some(index) = self.create_playlist(text)
                    && self.model.ui_state.screen == Screen::PlaylistList
                {
                    let len = self.model.library.len();
                    self.model.ui_state.playlists_cursor.select(index, len);
                }
            }
            InputPurpose::CreateAndAdd => self.create_and_add(text),
            InputPurpose::RenamePlaylist(index) => self.rename_playlist(index, text),
            InputPurpose::ConfirmDelete(index) => {
                if text.starts_with(['y', 'Y']) {
                    self.delete_playlist(index);
                } else {
                    self.model.set_status("Cancelled");
                }
            }
        }
    }

    fn report_library_error(&mut self, error: &LibraryError) {
        let message = match error {
            LibraryError::DuplicateEntry(_) => "Already in playlist".to_string(),
            LibraryError::DuplicateName(name) => format!("Playlist already exists: {}", name),
            LibraryError::EmptyName => "Cancelled".to_string(),
            LibraryError::OutOfRange(_) => return,
            LibraryError::Io { .. } => {
                tracing::error!(error = %error, "Library write failed");
                format!("Save failed: {}", error)
            }
        };
        self.model.set_status(message);
    }
}

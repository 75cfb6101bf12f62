//! Main application model with state management

use crate::library::LibraryStore;

use super::playback::PlaybackSession;
use super::song::Song;
use super::types::{Screen, UiState};

/// Main application model containing all state
pub struct AppModel {
    pub library: LibraryStore,
    pub search_results: Vec<Song>,
    pub last_query: String,
    /// Query submitted but not yet run, so the "Searching" status can be drawn first
    pub pending_search: Option<String>,
    pub session: PlaybackSession,
    pub ui_state: UiState,
    /// Song captured when entering `AddToPlaylist`, cleared on completion or cancel
    pub pending_song: Option<Song>,
    /// Set once the player outage has been shown to the user
    pub player_outage_reported: bool,
    pub should_quit: bool,
}

impl AppModel {
    pub fn new(library: LibraryStore) -> Self {
        Self {
            library,
            search_results: Vec::new(),
            last_query: String::new(),
            pending_search: None,
            session: PlaybackSession::new(),
            ui_state: UiState::default(),
            pending_song: None,
            player_outage_reported: false,
            should_quit: false,
        }
    }

    /// Songs of the playlist opened in `PlaylistSongs`
    pub fn open_playlist_songs(&self) -> &[Song] {
        self.ui_state
            .open_playlist
            .and_then(|i| self.library.get(i))
            .map(|p| p.songs.as_slice())
            .unwrap_or(&[])
    }

    /// Number of rows in the list shown on `screen`
    pub fn list_len(&self, screen: Screen) -> usize {
        match screen {
            Screen::Search => self.search_results.len(),
            Screen::PlaylistList | Screen::AddToPlaylist => self.library.len(),
            Screen::PlaylistSongs => self.open_playlist_songs().len(),
        }
    }

    pub fn selected_search_result(&self) -> Option<&Song> {
        self.search_results.get(self.ui_state.search_cursor.selected)
    }

    /// Re-clamps every cursor after a list changed size
    pub fn clamp_cursors(&mut self) {
        for screen in [
            Screen::Search,
            Screen::PlaylistList,
            Screen::PlaylistSongs,
            Screen::AddToPlaylist,
        ] {
            let len = self.list_len(screen);
            self.ui_state.cursor_mut(screen).clamp(len);
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(status = %message, "Status");
        self.ui_state.set_status(message);
    }
}

//! Screen transitions and list movement

use crate::model::Screen;
use crate::player::PlayerBackend;

use super::AppController;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

impl<P: PlayerBackend> AppController<P> {
    pub fn move_selection(&mut self, movement: Movement) {
        let screen = self.model.ui_state.screen;
        let len = self.model.list_len(screen);
        let height = self.model.ui_state.list_height;
        let cursor = self.model.ui_state.cursor_mut(screen);

        match movement {
            Movement::Up => cursor.up(),
            Movement::Down => cursor.down(len),
            Movement::PageUp => cursor.page_up(height),
            Movement::PageDown => cursor.page_down(height, len),
            Movement::Home => cursor.home(),
            Movement::End => cursor.end(len),
        }
        cursor.keep_visible(height);
    }

    /// Records the rows available to lists and keeps every selection on screen
    pub fn set_viewport_height(&mut self, height: usize) {
        self.model.ui_state.list_height = height.max(1);
        self.model.clamp_cursors();
        for screen in [
            Screen::Search,
            Screen::PlaylistList,
            Screen::PlaylistSongs,
            Screen::AddToPlaylist,
        ] {
            self.model.ui_state.cursor_mut(screen).keep_visible(height);
        }
    }

    pub fn open_playlists(&mut self) {
        let len = self.model.library.len();
        self.model.ui_state.playlists_cursor.clamp(len);
        self.enter(Screen::PlaylistList);
        self.model.set_status("Playlists");
    }

    /// Opens the selected playlist, loading its songs on first access
    pub fn open_selected_playlist(&mut self) {
        let index = self.model.ui_state.playlists_cursor.selected;
        if let Err(e) = self.model.library.load_songs(index) {
            tracing::debug!(index, error = %e, "Nothing to open");
            return;
        }

        if self.model.ui_state.open_playlist != Some(index) {
            self.model.ui_state.songs_cursor.reset();
        }
        self.model.ui_state.open_playlist = Some(index);
        let len = self.model.list_len(Screen::PlaylistSongs);
        self.model.ui_state.songs_cursor.clamp(len);

        self.enter(Screen::PlaylistSongs);
        let name = self.model.library.get(index).map(|p| p.name.clone()).unwrap_or_default();
        self.model.set_status(format!("Opened: {}", name));
    }

    /// Captures the selected search result and asks where to add it
    pub fn begin_add_to_playlist(&mut self) {
        let Some(song) = self.model.selected_search_result().cloned() else {
            self.model.set_status("No song selected");
            return;
        };
        self.model.pending_song = Some(song);
        self.model.ui_state.add_cursor.reset();
        self.enter(Screen::AddToPlaylist);
        self.model.set_status("Select playlist");
    }

    /// Follows the back table. Leaving `AddToPlaylist` this way cancels it.
    pub fn go_back(&mut self) {
        let screen = self.model.ui_state.screen;
        if screen == Screen::AddToPlaylist {
            self.model.pending_song = None;
            self.model.set_status("Cancelled");
        } else if screen != Screen::Search {
            self.model.ui_state.clear_status();
        }
        self.enter(screen.back());
    }

    pub fn toggle_help(&mut self) {
        let ui = &mut self.model.ui_state;
        ui.show_help_popup = !ui.show_help_popup;
    }

    pub(crate) fn enter(&mut self, screen: Screen) {
        if self.model.ui_state.screen != screen {
            tracing::debug!(from = ?self.model.ui_state.screen, to = ?screen, "Screen change");
        }
        self.model.ui_state.screen = screen;
        let height = self.model.ui_state.list_height;
        self.model.ui_state.cursor_mut(screen).keep_visible(height);
    }
}

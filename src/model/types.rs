//! Core type definitions for the UI state

/// The screen currently shown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Search,
    PlaylistList,
    PlaylistSongs,
    AddToPlaylist,
}

impl Screen {
    /// Where `Esc` leads from this screen
    pub fn back(self) -> Self {
        match self {
            Screen::Search => Screen::Search,
            Screen::PlaylistList => Screen::Search,
            Screen::PlaylistSongs => Screen::PlaylistList,
            Screen::AddToPlaylist => Screen::Search,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Search => "Search",
            Screen::PlaylistList => "Playlists",
            Screen::PlaylistSongs => "Playlist",
            Screen::AddToPlaylist => "Add to playlist",
        }
    }
}

/// Selection and scroll offset of one list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListCursor {
    pub selected: usize,
    pub scroll: usize,
}

impl ListCursor {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn page_up(&mut self, height: usize) {
        self.selected = self.selected.saturating_sub(height.max(1));
    }

    pub fn page_down(&mut self, height: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + height.max(1)).min(len - 1);
    }

    pub fn home(&mut self) {
        self.selected = 0;
    }

    pub fn end(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub fn select(&mut self, index: usize, len: usize) {
        self.selected = index;
        self.clamp(len);
    }

    /// Pulls the selection back inside a list that may have shrunk
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.reset();
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Adjusts the scroll offset so the selection sits inside a viewport of `height` rows
    pub fn keep_visible(&mut self, height: usize) {
        let height = height.max(1);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + height {
            self.scroll = self.selected + 1 - height;
        }
    }
}

/// What a submitted prompt will be used for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputPurpose {
    Search,
    CreatePlaylist,
    /// Create a playlist and add the pending song to it
    CreateAndAdd,
    RenamePlaylist(usize),
    ConfirmDelete(usize),
}

impl InputPurpose {
    fn default_prompt(&self) -> &'static str {
        match self {
            InputPurpose::Search => "Search: ",
            InputPurpose::CreatePlaylist | InputPurpose::CreateAndAdd => "New playlist name: ",
            InputPurpose::RenamePlaylist(_) => "Rename to: ",
            InputPurpose::ConfirmDelete(_) => "Delete? (y/n): ",
        }
    }
}

/// A one-line text prompt shown at the bottom of the screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputState {
    pub purpose: InputPurpose,
    pub prompt: String,
    pub buffer: String,
}

impl InputState {
    pub fn new(purpose: InputPurpose) -> Self {
        let prompt = purpose.default_prompt().to_string();
        Self {
            purpose,
            prompt,
            buffer: String::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.buffer = text.to_string();
        self
    }

    pub fn push(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }
}

/// UI state for the application
#[derive(Clone, Debug)]
pub struct UiState {
    pub screen: Screen,
    pub search_cursor: ListCursor,
    pub playlists_cursor: ListCursor,
    pub songs_cursor: ListCursor,
    pub add_cursor: ListCursor,
    /// Playlist opened in `PlaylistSongs`
    pub open_playlist: Option<usize>,
    pub input: Option<InputState>,
    pub status_message: Option<String>,
    pub show_help_popup: bool,
    /// Rows available to the active list, refreshed every frame
    pub list_height: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Search,
            search_cursor: ListCursor::default(),
            playlists_cursor: ListCursor::default(),
            songs_cursor: ListCursor::default(),
            add_cursor: ListCursor::default(),
            open_playlist: None,
            input: None,
            status_message: None,
            show_help_popup: false,
            list_height: 10,
        }
    }
}

impl UiState {
    pub fn cursor(&self, screen: Screen) -> &ListCursor {
        match screen {
            Screen::Search => &self.search_cursor,
            Screen::PlaylistList => &self.playlists_cursor,
            Screen::PlaylistSongs => &self.songs_cursor,
            Screen::AddToPlaylist => &self.add_cursor,
        }
    }

    pub fn cursor_mut(&mut self, screen: Screen) -> &mut ListCursor {
        match screen {
            Screen::Search => &mut self.search_cursor,
            Screen::PlaylistList => &mut self.playlists_cursor,
            Screen::PlaylistSongs => &mut self.songs_cursor,
            Screen::AddToPlaylist => &mut self.add_cursor,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_table() {
        assert_eq!(Screen::PlaylistSongs.back(), Screen::PlaylistList);
        assert_eq!(Screen::PlaylistList.back(), Screen::Search);
        assert_eq!(Screen::AddToPlaylist.back(), Screen::Search);
        assert_eq!(Screen::Search.back(), Screen::Search);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut cursor = ListCursor::default();
        cursor.up();
        assert_eq!(cursor.selected, 0);

        cursor.down(3);
        cursor.down(3);
        cursor.down(3);
        assert_eq!(cursor.selected, 2);

        cursor.page_down(10, 3);
        assert_eq!(cursor.selected, 2);
        cursor.page_up(10);
        assert_eq!(cursor.selected, 0);

        cursor.end(0);
        assert_eq!(cursor.selected, 0);
        cursor.page_down(5, 0);
        assert_eq!(cursor.selected, 0);
    }

    #[test]
    fn clamp_follows_shrinking_lists() {
        let mut cursor = ListCursor { selected: 7, scroll: 4 };
        cursor.clamp(5);
        assert_eq!(cursor.selected, 4);
        cursor.clamp(0);
        assert_eq!(cursor, ListCursor::default());
    }

    #[test]
    fn scroll_keeps_selection_visible() {
        let mut cursor = ListCursor::default();
        cursor.end(50);
        cursor.keep_visible(10);
        assert_eq!(cursor.scroll, 40);

        cursor.select(35, 50);
        cursor.keep_visible(10);
        assert_eq!(cursor.scroll, 35);

        cursor.select(40, 50);
        cursor.keep_visible(10);
        assert_eq!(cursor.scroll, 35);
    }

    #[test]
    fn status_is_set_and_cleared() {
        let mut ui = UiState::default();
        ui.set_status("Playing: A");
        assert_eq!(ui.status_message.as_deref(), Some("Playing: A"));
        ui.clear_status();
        assert!(ui.status_message.is_none());
    }
}

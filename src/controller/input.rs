//! Key event handling

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{Direction, InputPurpose, InputState, Screen};
use crate::player::PlayerBackend;

use super::AppController;
use super::navigation::Movement;

impl<P: PlayerBackend> AppController<P> {
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.model.should_quit = true;
            return;
        }

        // Text prompt swallows every key until submitted or cancelled
        if self.model.ui_state.input.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        // Any key closes the help popup
        if self.model.ui_state.show_help_popup {
            self.model.ui_state.show_help_popup = false;
            return;
        }

        if self.handle_global_key(key) {
            return;
        }

        match self.model.ui_state.screen {
            Screen::Search => self.handle_search_key(key),
            Screen::PlaylistList => self.handle_playlist_list_key(key),
            Screen::PlaylistSongs => self.handle_playlist_songs_key(key),
            Screen::AddToPlaylist => self.handle_add_to_playlist_key(key),
        }
    }

    fn handle_global_key(&mut self, key: KeyEvent) -> bool {
        let now = Instant::now();
        match key.code {
            KeyCode::Char('q') => self.model.should_quit = true,
            KeyCode::Char(' ') => self.toggle_pause(),
            KeyCode::Char('n') => self.skip(Direction::Next, now),
            KeyCode::Char('p') => self.skip(Direction::Previous, now),
            KeyCode::Char('h') | KeyCode::Char('?') => self.toggle_help(),
            KeyCode::Esc => self.go_back(),
            _ => return false,
        }
        true
    }

    fn handle_movement_key(&mut self, key: KeyEvent) -> bool {
        let movement = match key.code {
            KeyCode::Up | KeyCode::Char('k') => Movement::Up,
            KeyCode::Down | KeyCode::Char('j') => Movement::Down,
            KeyCode::PageUp => Movement::PageUp,
            KeyCode::PageDown => Movement::PageDown,
            KeyCode::Home | KeyCode::Char('g') => Movement::Home,
            KeyCode::End | KeyCode::Char('G') => Movement::End,
            _ => return false,
        };
        self.move_selection(movement);
        true
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        if self.handle_movement_key(key) {
            return;
        }
        match key.code {
            KeyCode::Enter => {
                if !self.model.search_results.is_empty() {
                    let index = self.model.ui_state.search_cursor.selected;
                    self.play_search_result(index, Instant::now());
                }
            }
            KeyCode::Char('/') | KeyCode::Char('s') => {
                let prompt = InputState::new(InputPurpose::Search).with_text(&self.model.last_query);
                self.model.ui_state.input = Some(prompt);
            }
            KeyCode::Char('x') => self.stop_playback(),
            KeyCode::Char('f') => self.open_playlists(),
            KeyCode::Char('a') => self.begin_add_to_playlist(),
            KeyCode::Char('c') => self.open_prompt(InputPurpose::CreatePlaylist),
            _ => {}
        }
    }

    fn handle_playlist_list_key(&mut self, key: KeyEvent) {
        if self.handle_movement_key(key) {
            return;
        }
        let selected = self.model.ui_state.playlists_cursor.selected;
        let Some(name) = self.model.library.get(selected).map(|p| p.name.clone()) else {
            if key.code == KeyCode::Char('c') {
                self.open_prompt(InputPurpose::CreatePlaylist);
            }
            return;
        };

        match key.code {
            KeyCode::Enter => self.open_selected_playlist(),
            KeyCode::Char('c') => self.open_prompt(InputPurpose::CreatePlaylist),
            KeyCode::Char('r') => {
                let prompt = InputState::new(InputPurpose::RenamePlaylist(selected)).with_text(&name);
                self.model.ui_state.input = Some(prompt);
            }
            KeyCode::Char('d') | KeyCode::Char('x') => {
                let prompt = InputState::new(InputPurpose::ConfirmDelete(selected))
                    .with_prompt(format!("Delete '{}'? (y/n): ", name));
                self.model.ui_state.input = Some(prompt);
            }
            _ => {}
        }
    }

    fn handle_playlist_songs_key(&mut self, key: KeyEvent) {
        if self.handle_movement_key(key) {
            return;
        }
        match key.code {
            KeyCode::Enter => {
                if let Some(playlist) = self.model.ui_state.open_playlist
                    && !self.model.open_playlist_songs().is_empty()
                {
                    let index = self.model.ui_state.songs_cursor.selected;
                    self.play_playlist_song(playlist, index, Instant::now());
                }
            }
            KeyCode::Char('d') => self.remove_selected_song(),
            KeyCode::Char('x') => self.stop_playback(),
            _ => {}
        }
    }

    fn handle_add_to_playlist_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(Movement::Up),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(Movement::Down),
            KeyCode::Enter => self.add_pending_to_selected(),
            KeyCode::Char('c') => self.open_prompt(InputPurpose::CreateAndAdd),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(input) = self.model.ui_state.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                if let Some(input) = self.model.ui_state.input.take() {
                    self.submit_input(input.purpose, &input.buffer);
                }
            }
            KeyCode::Esc => {
                let purpose = self.model.ui_state.input.take().map(|i| i.purpose);
                self.model.set_status(if purpose == Some(InputPurpose::Search) {
                    "Search cancelled"
                } else {
                    "Cancelled"
                });
            }
            KeyCode::Backspace => input.backspace(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.push(c),
            _ => {}
        }
    }

    fn open_prompt(&mut self, purpose: InputPurpose) {
        self.model.ui_state.input = Some(InputState::new(purpose));
    }
}

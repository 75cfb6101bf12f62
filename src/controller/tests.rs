use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;

use super::AppController;
use crate::library::LibraryStore;
use crate::model::{AppModel, FakePlayer, PlaybackSource, Screen, Song};
use crate::search::{SearchError, SearchProvider};

struct FakeSearch {
    songs: Vec<Song>,
}

impl SearchProvider for FakeSearch {
    fn search(&self, query: &str, max: usize) -> Result<Vec<Song>, SearchError> {
        if query == "fail" {
            return Err(SearchError::Failed("boom".to_string()));
        }
        Ok(self.songs.iter().take(max).cloned().collect())
    }
}

fn songs(n: usize) -> Vec<Song> {
    (0..n).map(|i| Song::new(format!("Song {i}"), format!("vid{i:04}"))).collect()
}

fn controller(results: usize) -> (TempDir, AppController<FakePlayer>) {
    let dir = TempDir::new().unwrap();
    let playlists_dir = dir.path().join("playlists");
    std::fs::create_dir_all(&playlists_dir).unwrap();
    let library = LibraryStore::open(dir.path().join("playlists.json"), playlists_dir);
    let mut controller = AppController::new(
        AppModel::new(library),
        FakePlayer::default(),
        Box::new(FakeSearch { songs: songs(results) }),
        50,
    );
    controller.submit_search("anything");
    controller.run_pending_search();
    (dir, controller)
}

fn press(controller: &mut AppController<FakePlayer>, code: KeyCode) {
    controller.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_text(controller: &mut AppController<FakePlayer>, text: &str) {
    for c in text.chars() {
        press(controller, KeyCode::Char(c));
    }
}

fn status(controller: &AppController<FakePlayer>) -> &str {
    controller.model.ui_state.status_message.as_deref().unwrap_or("")
}

#[test]
fn eof_during_grace_period_is_drained_not_followed() {
    let (_dir, mut c) = controller(3);
    let t0 = Instant::now();
    c.play_search_result(0, t0);

    c.player.pending_eof = 1;
    assert!(!c.poll_player_at(t0 + Duration::from_secs(1)));
    assert_eq!(c.player.drained, 1);
    assert!(!c.poll_player_at(t0 + Duration::from_secs(4)));
    assert_eq!(c.model.session.position(), 0);

    c.player.pending_eof = 2;
    assert!(c.poll_player_at(t0 + Duration::from_secs(4)));
    assert_eq!(c.model.session.position(), 1);
    assert_eq!(status(&c), "Auto-playing: Song 1");
    assert_eq!(c.model.ui_state.search_cursor.selected, 1);
}

#[test]
fn auto_advance_past_the_end_finishes() {
    let (_dir, mut c) = controller(2);
    let t0 = Instant::now();
    c.play_search_result(1, t0);

    c.player.pending_eof = 1;
    let later = t0 + Duration::from_secs(5);
    assert!(c.poll_player_at(later));
    assert!(!c.model.session.is_active());
    assert_eq!(status(&c), "Playback finished");

    press(&mut c, KeyCode::Char('n'));
    assert!(!c.model.session.is_active());
    assert_eq!(c.player.loaded.len(), 1);
}

#[test]
fn enter_plays_and_n_p_move_within_bounds() {
    let (_dir, mut c) = controller(5);
    press(&mut c, KeyCode::Down);
    press(&mut c, KeyCode::Down);
    press(&mut c, KeyCode::Enter);
    assert_eq!(c.model.session.position(), 2);
    assert_eq!(status(&c), "Playing: Song 2");

    press(&mut c, KeyCode::Char('n'));
    press(&mut c, KeyCode::Char('n'));
    press(&mut c, KeyCode::Char('n'));
    assert_eq!(c.model.session.position(), 4);
    assert_eq!(c.player.loaded.last().unwrap(), "https://www.youtube.com/watch?v=vid0004");

    press(&mut c, KeyCode::Char(' '));
    assert!(c.model.session.is_paused());
    press(&mut c, KeyCode::Char('x'));
    assert!(!c.model.session.is_active());
}

#[test]
fn player_outage_is_reported_once() {
    let (_dir, mut c) = controller(2);
    c.player.unavailable = true;

    c.play_search_result(0, Instant::now());
    assert!(status(&c).starts_with("Player unavailable"));
    c.model.set_status("something else");
    c.play_search_result(1, Instant::now());
    assert_eq!(status(&c), "something else");

    c.player.unavailable = false;
    c.play_search_result(1, Instant::now());
    assert!(!c.model.player_outage_reported);
}

#[test]
fn add_to_playlist_flow() {
    let (_dir, mut c) = controller(3);
    press(&mut c, KeyCode::Char('c'));
    type_text(&mut c, "Road Trip");
    press(&mut c, KeyCode::Enter);
    assert_eq!(c.model.library.len(), 1);

    press(&mut c, KeyCode::Down);
    press(&mut c, KeyCode::Char('a'));
    assert_eq!(c.model.ui_state.screen, Screen::AddToPlaylist);
    assert_eq!(c.model.pending_song.as_ref().unwrap().source_id, "vid0001");

    press(&mut c, KeyCode::Enter);
    assert_eq!(c.model.ui_state.screen, Screen::Search);
    assert!(c.model.pending_song.is_none());
    assert_eq!(status(&c), "Added to: Road Trip");

    press(&mut c, KeyCode::Char('a'));
    press(&mut c, KeyCode::Enter);
    assert_eq!(status(&c), "Already in playlist");
    assert_eq!(c.model.library.get(0).unwrap().songs.len(), 1);
}

#[test]
fn cancelling_add_clears_pending_song() {
    let (_dir, mut c) = controller(1);
    press(&mut c, KeyCode::Char('a'));
    assert!(c.model.pending_song.is_some());
    press(&mut c, KeyCode::Esc);
    assert_eq!(c.model.ui_state.screen, Screen::Search);
    assert!(c.model.pending_song.is_none());
    assert_eq!(status(&c), "Cancelled");
}

#[test]
fn create_and_add_from_the_picker() {
    let (_dir, mut c) = controller(1);
    press(&mut c, KeyCode::Char('a'));
    press(&mut c, KeyCode::Char('c'));
    type_text(&mut c, "Fresh");
    press(&mut c, KeyCode::Enter);

    assert_eq!(status(&c), "Created 'Fresh' and added song");
    assert_eq!(c.model.ui_state.screen, Screen::Search);
    assert_eq!(c.model.library.get(0).unwrap().songs.len(), 1);
}

#[test]
fn back_navigation_follows_the_table() {
    let (_dir, mut c) = controller(0);
    c.create_playlist("One");

    press(&mut c, KeyCode::Char('f'));
    assert_eq!(c.model.ui_state.screen, Screen::PlaylistList);
    press(&mut c, KeyCode::Enter);
    assert_eq!(c.model.ui_state.screen, Screen::PlaylistSongs);
    assert!(c.model.library.get(0).unwrap().loaded);

    press(&mut c, KeyCode::Esc);
    assert_eq!(c.model.ui_state.screen, Screen::PlaylistList);
    press(&mut c, KeyCode::Esc);
    assert_eq!(c.model.ui_state.screen, Screen::Search);
}

#[test]
fn deleting_playlists_keeps_session_consistent() {
    let (_dir, mut c) = controller(0);
    for name in ["A", "B", "C"] {
        let index = c.create_playlist(name).unwrap();
        c.model.library.add_song(index, &Song::new(name, format!("{name}-song1"))).unwrap();
    }
    c.play_playlist_song(2, 0, Instant::now());
    assert_eq!(c.model.session.source(), PlaybackSource::Playlist(2));

    press(&mut c, KeyCode::Char('f'));
    press(&mut c, KeyCode::Char('d'));
    type_text(&mut c, "y");
    press(&mut c, KeyCode::Enter);
    assert_eq!(c.model.library.len(), 2);
    assert_eq!(c.model.session.source(), PlaybackSource::Playlist(1));

    press(&mut c, KeyCode::End);
    press(&mut c, KeyCode::Char('x'));
    type_text(&mut c, "n");
    press(&mut c, KeyCode::Enter);
    assert_eq!(status(&c), "Cancelled");
    assert_eq!(c.model.library.len(), 2);

    press(&mut c, KeyCode::Char('x'));
    type_text(&mut c, "y");
    press(&mut c, KeyCode::Enter);
    assert_eq!(c.model.library.len(), 1);
    assert!(!c.model.session.is_active());
    assert_eq!(c.model.ui_state.playlists_cursor.selected, 0);
}

#[test]
fn removing_songs_from_the_open_playlist() {
    let (_dir, mut c) = controller(0);
    let p = c.create_playlist("P").unwrap();
    for i in 0..3 {
        c.model.library.add_song(p, &Song::new(format!("S{i}"), format!("sid{i:04}"))).unwrap();
    }
    press(&mut c, KeyCode::Char('f'));
    press(&mut c, KeyCode::Enter);
    press(&mut c, KeyCode::End);
    press(&mut c, KeyCode::Enter);
    assert_eq!(c.model.session.position(), 2);

    press(&mut c, KeyCode::Home);
    press(&mut c, KeyCode::Char('d'));
    assert_eq!(status(&c), "Removed: S0");
    assert_eq!(c.model.session.position(), 1);

    press(&mut c, KeyCode::End);
    press(&mut c, KeyCode::Char('d'));
    assert!(!c.model.session.is_active());
    assert_eq!(c.model.open_playlist_songs().len(), 1);
    assert_eq!(c.model.ui_state.songs_cursor.selected, 0);
}

#[test]
fn new_search_stops_search_playback() {
    let (_dir, mut c) = controller(3);
    c.play_search_result(1, Instant::now());

    press(&mut c, KeyCode::Char('/'));
    assert_eq!(c.model.ui_state.input.as_ref().unwrap().buffer, "anything");
    press(&mut c, KeyCode::Backspace);
    press(&mut c, KeyCode::Enter);
    assert!(status(&c).starts_with("Searching: anythin"));
    c.run_pending_search();

    assert!(!c.model.session.is_active());
    assert_eq!(c.player.stops, 1);
    assert!(status(&c).starts_with("Found 3 results for: anythin"));
}

#[test]
fn search_failure_keeps_old_results() {
    let (_dir, mut c) = controller(2);
    c.submit_search("fail");
    c.run_pending_search();
    assert_eq!(status(&c), "Search error!");
    assert_eq!(c.model.search_results.len(), 2);
}

#[test]
fn help_popup_swallows_the_next_key() {
    let (_dir, mut c) = controller(2);
    press(&mut c, KeyCode::Char('?'));
    assert!(c.model.ui_state.show_help_popup);
    press(&mut c, KeyCode::Char('q'));
    assert!(!c.model.ui_state.show_help_popup);
    assert!(!c.should_quit());
    press(&mut c, KeyCode::Char('q'));
    assert!(c.should_quit());
}

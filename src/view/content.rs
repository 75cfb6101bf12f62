//! Main content area rendering (search results, playlists, playlist songs)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Padding, Paragraph},
    Frame,
};

use crate::model::{AppModel, PlaybackSource, Screen, Song};
use super::utils::{calculate_num_width, format_duration, render_scrollable_list, truncate_string};

pub fn render_main_content(frame: &mut Frame, area: Rect, model: &AppModel) {
    match model.ui_state.screen {
        Screen::Search => render_search_results(frame, area, model),
        Screen::PlaylistList => render_playlist_list(frame, area, model, " Playlists "),
        Screen::PlaylistSongs => render_playlist_songs(frame, area, model),
        Screen::AddToPlaylist => {
            let title = match &model.pending_song {
                Some(song) => format!(" Add '{}' to playlist ", song.title),
                None => " Add to playlist ".to_string(),
            };
            render_playlist_list(frame, area, model, &title);
        }
    }
}

fn content_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Green))
}

fn render_hint(frame: &mut Frame, area: Rect, title: &str, hint: &str) {
    let content = Paragraph::new(hint.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(content_block(title));
    frame.render_widget(content, area);
}

fn render_search_results(frame: &mut Frame, area: Rect, model: &AppModel) {
    let title = if model.last_query.is_empty() {
        " Search ".to_string()
    } else {
        format!(" Results for '{}' ({}) ", model.last_query, model.search_results.len())
    };

    if model.search_results.is_empty() {
        render_hint(
            frame,
            area,
            &title,
            "Press / to search YouTube\n\nf  playlists\nh  help\nq  quit",
        );
        return;
    }

    let playing = (model.session.source() == PlaybackSource::SearchResults)
        .then(|| model.session.position());
    let items = song_rows(
        &model.search_results,
        model.ui_state.search_cursor.selected,
        playing,
        area.width,
    );
    render_scrollable_list(frame, area, items, &model.ui_state.search_cursor, content_block(&title));
}

fn render_playlist_songs(frame: &mut Frame, area: Rect, model: &AppModel) {
    let Some(index) = model.ui_state.open_playlist else {
        render_hint(frame, area, " Playlist ", "No playlist open");
        return;
    };
    let name = model.library.get(index).map(|p| p.name.as_str()).unwrap_or("?");
    let songs = model.open_playlist_songs();
    let title = format!(" {} ({} songs) ", name, songs.len());

    if songs.is_empty() {
        render_hint(frame, area, &title, "This playlist is empty.\n\nAdd songs from search results with a");
        return;
    }

    let playing = (model.session.source() == PlaybackSource::Playlist(index))
        .then(|| model.session.position());
    let items = song_rows(songs, model.ui_state.songs_cursor.selected, playing, area.width);
    render_scrollable_list(frame, area, items, &model.ui_state.songs_cursor, content_block(&title));
}

fn render_playlist_list(frame: &mut Frame, area: Rect, model: &AppModel, title: &str) {
    let playlists = model.library.playlists();
    if playlists.is_empty() {
        render_hint(frame, area, title, "No playlists yet.\n\nc  create a playlist");
        return;
    }

    let cursor = model.ui_state.cursor(model.ui_state.screen);
    let playing = model.session.playlist();
    let num_width = calculate_num_width(playlists.len());

    let items: Vec<ListItem> = playlists
        .iter()
        .enumerate()
        .map(|(i, playlist)| {
            let marker = if playing == Some(i) { "▶" } else { " " };
            let count = if playlist.loaded {
                format!("{} songs", playlist.songs.len())
            } else {
                String::new()
            };
            let text = format!(" {:>num_width$} {} {}  {}", i + 1, marker, playlist.name, count);
            ListItem::new(text).style(row_style(i == cursor.selected, playing == Some(i)))
        })
        .collect();

    render_scrollable_list(frame, area, items, cursor, content_block(title));
}

fn song_rows(songs: &[Song], selected: usize, playing: Option<usize>, width: u16) -> Vec<ListItem<'static>> {
    let num_width = calculate_num_width(songs.len());
    // borders, padding, number, marker, duration and separators
    let fixed = 4 + 1 + num_width + 3 + 3 + 8;
    let title_width = (width as usize).saturating_sub(fixed).max(10);

    songs
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let is_playing = playing == Some(i);
            let marker = if is_playing { "▶" } else { " " };
            let text = format!(
                " {:>num_width$} {}  {}   {:>8}",
                i + 1,
                marker,
                truncate_string(&song.title, title_width),
                format_duration(song.duration_seconds),
            );
            ListItem::new(text).style(row_style(i == selected, is_playing))
        })
        .collect()
}

fn row_style(selected: bool, playing: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else if playing {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

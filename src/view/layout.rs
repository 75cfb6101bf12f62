//! Layout rendering (top bar, now-playing bar, status line)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
    Frame,
};

use crate::model::{AppModel, PlaybackSource, Screen};

pub fn render_top_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Screen + query
            Constraint::Length(24), // Library size
        ])
        .split(area);

    let screen = model.ui_state.screen;
    let detail = match screen {
        Screen::Search if model.last_query.is_empty() => "Press / to search".to_string(),
        Screen::Search => model.last_query.clone(),
        Screen::PlaylistSongs => model
            .ui_state
            .open_playlist
            .and_then(|i| model.library.get(i))
            .map(|p| p.name.clone())
            .unwrap_or_default(),
        Screen::PlaylistList | Screen::AddToPlaylist => String::new(),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(screen.title(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(detail, Style::default().fg(Color::White)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" shellbeats ")
            .padding(Padding::horizontal(1))
            .border_style(Style::default().fg(Color::Green)),
    );
    frame.render_widget(header, chunks[0]);

    let library = Paragraph::new(format!("🎵 {} playlists", model.library.len()))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Library "));
    frame.render_widget(library, chunks[1]);
}

pub fn render_now_playing(frame: &mut Frame, area: Rect, model: &AppModel) {
    let session = &model.session;
    let source = match session.source() {
        PlaybackSource::None => String::new(),
        PlaybackSource::SearchResults => format!(
            " search {}/{} ",
            session.position() + 1,
            model.search_results.len()
        ),
        PlaybackSource::Playlist(i) => {
            let playlist = model.library.get(i);
            format!(
                " {} {}/{} ",
                playlist.map(|p| p.name.as_str()).unwrap_or("?"),
                session.position() + 1,
                playlist.map_or(0, |p| p.songs.len())
            )
        }
    };

    let status_text = match session.title() {
        None => " No track playing".to_string(),
        Some(title) if session.is_paused() => format!("⏸  {}", title),
        Some(title) => format!(" ▶ {}", title),
    };
    let style = if session.is_playing() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let now_playing = Paragraph::new(status_text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Now playing ")
            .title_bottom(Line::from(source).right_aligned()),
    );
    frame.render_widget(now_playing, area);
}

pub fn render_status_line(frame: &mut Frame, area: Rect, model: &AppModel) {
    let text = model.ui_state.status_message.as_deref().unwrap_or("");
    let status = Paragraph::new(format!(" {}", text)).style(Style::default().fg(Color::Cyan));
    frame.render_widget(status, area);
}

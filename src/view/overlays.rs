//! Overlay rendering (text prompt, help popup)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::model::InputState;

pub fn render_input_prompt(frame: &mut Frame, area: Rect, input: &InputState) {
    frame.render_widget(Clear, area);

    let line = Line::from(vec![
        Span::styled(input.prompt.clone(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(input.buffer.clone()),
    ]);
    let prompt = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Enter to confirm, Esc to cancel "),
    );
    frame.render_widget(prompt, area);

    // Cursor after the typed text
    let x = area.x + 1 + (input.prompt.chars().count() + input.buffer.chars().count()) as u16;
    if x < area.x + area.width.saturating_sub(1) {
        frame.set_cursor_position((x, area.y + 1));
    }
}

pub fn render_help_popup(frame: &mut Frame) {
    let area = frame.area();

    let keybindings = vec![
        ("", "── Playback ──"),
        ("Enter", "Play selected"),
        ("Space", "Pause / Resume"),
        ("n / p", "Next / Previous track"),
        ("x", "Stop playback"),
        ("", ""),
        ("", "── Navigation ──"),
        ("↑ ↓ / k j", "Move selection"),
        ("PgUp / PgDn", "Page up / down"),
        ("g / G", "First / Last"),
        ("/ or s", "Search"),
        ("Esc", "Go back"),
        ("", ""),
        ("", "── Playlists ──"),
        ("f", "Open playlists"),
        ("a", "Add song to playlist"),
        ("c", "Create playlist"),
        ("r", "Rename playlist"),
        ("d", "Remove song / Delete playlist"),
        ("", ""),
        ("", "── General ──"),
        ("h / ?", "Toggle this help"),
        ("q", "Quit"),
        ("", ""),
        ("", "Requirements: yt-dlp, mpv"),
    ];

    let popup_width = 56.min(area.width);
    let popup_height = (keybindings.len() as u16 + 2).min(area.height.saturating_sub(2));

    let popup_x = area.width.saturating_sub(popup_width) / 2;
    let popup_y = area.height.saturating_sub(popup_height) / 2;

    let popup_area = Rect {
        x: popup_x,
        y: popup_y,
        width: popup_width,
        height: popup_height,
    };

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                // Section header or empty line
                Line::from(Span::styled(
                    format!("{:^50}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>14}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (any key to close) ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        )
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}

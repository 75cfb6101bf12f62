//! Utility functions for rendering UI components

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

use crate::model::ListCursor;

pub fn render_scrollable_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    cursor: &ListCursor,
    block: Block,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default()); // Highlight handled by item styles

    // Scroll offset is owned by the model so it survives between frames
    let mut list_state = ListState::default()
        .with_offset(cursor.scroll)
        .with_selected(Some(cursor.selected));

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// `--:--` when unknown, otherwise `m:ss` or `h:mm:ss`
pub fn format_duration(seconds: u32) -> String {
    if seconds == 0 {
        return "--:--".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Calculate width needed for index column (log10(n) + padding)
pub fn calculate_num_width(item_count: usize) -> usize {
    if item_count == 0 {
        2
    } else {
        let digits = (item_count as f64).log10().floor() as usize + 1;
        digits + 1
    }
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_width)
    } else {
        format!("{:<width$}", s, width = max_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "--:--");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(212), "3:32");
        assert_eq!(format_duration(3_725), "1:02:05");
    }

    #[test]
    fn truncation_pads_and_cuts() {
        assert_eq!(truncate_string("abc", 5), "abc  ");
        assert_eq!(truncate_string("abcdefgh", 6), "abc...");
        assert_eq!(calculate_num_width(0), 2);
        assert_eq!(calculate_num_width(50), 3);
    }
}

//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, scrollable lists)
//! - `layout`: Top bar, now-playing bar and status line
//! - `content`: Main list area for each screen
//! - `overlays`: Text prompt and help popup

mod content;
mod layout;
mod overlays;
mod utils;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::model::AppModel;

const TOP_BAR_HEIGHT: u16 = 3;
const NOW_PLAYING_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 1;
const PROMPT_HEIGHT: u16 = 3;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, model: &AppModel) {
        let chunks = Self::split(frame.area());

        layout::render_top_bar(frame, chunks[0], model);
        content::render_main_content(frame, chunks[1], model);
        layout::render_now_playing(frame, chunks[2], model);
        layout::render_status_line(frame, chunks[3], model);

        // Prompt overlays the bottom of the list
        if let Some(input) = &model.ui_state.input {
            let list = chunks[1];
            let height = PROMPT_HEIGHT.min(list.height);
            let area = Rect {
                x: list.x,
                y: list.y + list.height - height,
                width: list.width,
                height,
            };
            overlays::render_input_prompt(frame, area, input);
        }

        if model.ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }

    /// Rows available to the list for a terminal of the given size
    pub fn list_height(area: Rect) -> usize {
        // two border rows around the list
        Self::split(area)[1].height.saturating_sub(2).max(1) as usize
    }

    fn split(area: Rect) -> std::rc::Rc<[Rect]> {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TOP_BAR_HEIGHT),
                Constraint::Min(0), // List
                Constraint::Length(NOW_PLAYING_HEIGHT),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .split(area)
    }
}

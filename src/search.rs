//! Search through yt-dlp.
//!
//! yt-dlp is asked to print one `title|||id|||duration` line per hit. Anything
//! else on stdout (warnings, errors, half-written lines) is skipped.

use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::model::Song;

const FIELD_SEPARATOR: &str = "|||";
const PRINT_TEMPLATE: &str = "%(title)s|||%(id)s|||%(duration)s";
const MIN_ID_LEN: usize = 5;
const MAX_ID_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Could not run search tool: {0}")]
    Spawn(#[source] io::Error),
    #[error("Search failed: {0}")]
    Failed(String),
}

pub trait SearchProvider {
    /// Blocks until the search finishes. Returns at most `max` songs.
    fn search(&self, query: &str, max: usize) -> Result<Vec<Song>, SearchError>;
}

pub struct YtDlpSearch {
    program: String,
}

impl YtDlpSearch {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SearchProvider for YtDlpSearch {
    fn search(&self, query: &str, max: usize) -> Result<Vec<Song>, SearchError> {
        let query = query.trim();
        if query.is_empty() || max == 0 {
            return Ok(Vec::new());
        }

        tracing::info!(query, max, "Searching");
        let output = Command::new(&self.program)
            .arg("--flat-playlist")
            .arg("--print")
            .arg(PRINT_TEMPLATE)
            .arg(format!("ytsearch{}:{}", max, query))
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(SearchError::Spawn)?;

        let songs = parse_search_output(&String::from_utf8_lossy(&output.stdout), max);
        if songs.is_empty() && !output.status.success() {
            return Err(SearchError::Failed(format!("{} exited with {}", self.program, output.status)));
        }
        tracing::debug!(query, found = songs.len(), "Search finished");
        Ok(songs)
    }
}

pub fn parse_search_output(stdout: &str, max: usize) -> Vec<Song> {
    stdout.lines().filter_map(parse_search_line).take(max).collect()
}

/// Parses one `title|||id[|||duration]` line
pub fn parse_search_line(line: &str) -> Option<Song> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() || line.starts_with("ERROR") || line.starts_with("WARNING") {
        return None;
    }

    let mut fields = line.splitn(3, FIELD_SEPARATOR);
    let title = fields.next()?;
    let id = fields.next()?.trim();
    if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&id.chars().count()) {
        return None;
    }
    let duration = fields.next().map_or(0, parse_duration);

    Some(Song::new(title, id).with_duration(duration))
}

/// Seconds as printed by yt-dlp: an integer, a float, or `NA`
fn parse_duration(text: &str) -> u32 {
    let text = text.trim();
    if let Ok(seconds) = text.parse::<u32>() {
        return seconds;
    }
    match text.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

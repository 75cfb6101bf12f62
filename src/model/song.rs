//! Song and playlist records

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Title used when a song arrives without one
pub const UNKNOWN_TITLE: &str = "Unknown";

/// A remote track, identified by its source id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    pub source_id: String,
    /// Seconds; 0 means unknown
    pub duration_seconds: u32,
}

impl Song {
    pub fn new(title: impl Into<String>, source_id: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            title: if title.is_empty() { UNKNOWN_TITLE.to_string() } else { title },
            source_id: source_id.into(),
            duration_seconds: 0,
        }
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// The playable URL, always derived from `source_id`
    pub fn url(&self) -> String {
        format!("{}{}", WATCH_URL_PREFIX, self.source_id)
    }
}

/// A named, persisted list of songs.
///
/// `songs` is only meaningful once `loaded` is true; an unloaded playlist has an
/// empty song list regardless of what is on disk.
#[derive(Clone, Debug)]
pub struct Playlist {
    pub name: String,
    pub storage_key: String,
    pub songs: Vec<Song>,
    pub loaded: bool,
}

impl Playlist {
    pub fn unloaded(name: String, storage_key: String) -> Self {
        Self {
            name,
            storage_key,
            songs: Vec::new(),
            loaded: false,
        }
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.songs.iter().any(|s| s.source_id == source_id)
    }
}

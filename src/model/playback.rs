//! Playback session - what is playing, where it came from, and how to move on

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::library::{LibraryError, LibraryStore};
use crate::model::Song;
use crate::player::{PlayerBackend, PlayerError};

/// Time after a load during which player events are drained but not trusted
pub const GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Where the playing song's index points into
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackSource {
    #[default]
    None,
    SearchResults,
    /// Index into the library's playlists
    Playlist(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Nothing to play at position {0}")]
    OutOfRange(usize),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Player(#[from] PlayerError),
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackSession {
    source: PlaybackSource,
    position: usize,
    is_paused: bool,
    started_at: Option<Instant>,
    title: Option<String>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> PlaybackSource {
        self.source
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_active(&self) -> bool {
        self.source != PlaybackSource::None
    }

    pub fn is_playing(&self) -> bool {
        self.is_active() && !self.is_paused
    }

    /// Title of the loaded song, if any
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The playlist being played, if the source is one
    pub fn playlist(&self) -> Option<usize> {
        match self.source {
            PlaybackSource::Playlist(index) => Some(index),
            _ => None,
        }
    }

    pub fn play_from_search<'a, P: PlayerBackend + ?Sized>(
        &mut self,
        player: &mut P,
        results: &'a [Song],
        index: usize,
        now: Instant,
    ) -> Result<&'a Song, PlaybackError> {
        let song = results.get(index).ok_or(PlaybackError::OutOfRange(index))?;
        self.start(player, PlaybackSource::SearchResults, song, index, now)?;
        Ok(song)
    }

    pub fn play_from_playlist<'a, P: PlayerBackend + ?Sized>(
        &mut self,
        player: &mut P,
        library: &'a mut LibraryStore,
        playlist: usize,
        index: usize,
        now: Instant,
    ) -> Result<&'a Song, PlaybackError> {
        library.load_songs(playlist)?;
        let library: &'a LibraryStore = library;
        let song = library
            .get(playlist)
            .and_then(|p| p.songs.get(index))
            .ok_or(PlaybackError::OutOfRange(index))?;
        self.start(player, PlaybackSource::Playlist(playlist), song, index, now)?;
        Ok(song)
    }

    /// Moves one step within the current source.
    ///
    /// Returns `Ok(None)` and leaves the session untouched when there is no
    /// song in that direction.
    pub fn advance<'a, P: PlayerBackend + ?Sized>(
        &mut self,
        player: &mut P,
        results: &'a [Song],
        library: &'a mut LibraryStore,
        direction: Direction,
        now: Instant,
    ) -> Result<Option<&'a Song>, PlaybackError> {
        let target = match direction {
            Direction::Next => self.position.checked_add(1),
            Direction::Previous => self.position.checked_sub(1),
        };
        let Some(target) = target else {
            return Ok(None);
        };

        match self.source {
            PlaybackSource::None => Ok(None),
            PlaybackSource::SearchResults => {
                if target >= results.len() {
                    return Ok(None);
                }
                self.play_from_search(player, results, target, now).map(Some)
            }
            PlaybackSource::Playlist(playlist) => {
                library.load_songs(playlist)?;
                let len = library.get(playlist).map_or(0, |p| p.songs.len());
                if target >= len {
                    return Ok(None);
                }
                self.play_from_playlist(player, library, playlist, target, now).map(Some)
            }
        }
    }

    /// Flips the pause flag. Does nothing when no source is set.
    pub fn toggle_pause<P: PlayerBackend + ?Sized>(&mut self, player: &mut P) -> Result<bool, PlayerError> {
        if !self.is_active() {
            return Ok(false);
        }
        player.toggle_pause()?;
        self.is_paused = !self.is_paused;
        Ok(true)
    }

    /// Stops the player and returns to idle. The session is reset even if the
    /// stop command cannot be delivered.
    pub fn stop<P: PlayerBackend + ?Sized>(&mut self, player: &mut P) {
        if let Err(e) = player.stop() {
            tracing::debug!(error = %e, "Stop command not delivered");
        }
        self.reset();
    }

    /// Returns to idle without talking to the player
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True once the grace period after the last load has passed
    pub fn grace_elapsed(&self, now: Instant) -> bool {
        self.started_at
            .is_none_or(|started| now.saturating_duration_since(started) >= GRACE_PERIOD)
    }

    /// Keeps the playlist reference valid after a playlist is deleted.
    /// Returns true if playback had to stop.
    pub fn on_playlist_deleted<P: PlayerBackend + ?Sized>(&mut self, player: &mut P, deleted: usize) -> bool {
        match self.source {
            PlaybackSource::Playlist(current) if current == deleted => {
                self.stop(player);
                true
            }
            PlaybackSource::Playlist(current) if current > deleted => {
                self.source = PlaybackSource::Playlist(current - 1);
                false
            }
            _ => false,
        }
    }

    /// Keeps the position valid after a song is removed from a playlist.
    /// Returns true if playback had to stop.
    pub fn on_song_removed<P: PlayerBackend + ?Sized>(
        &mut self,
        player: &mut P,
        playlist: usize,
        removed: usize,
    ) -> bool {
        if self.source != PlaybackSource::Playlist(playlist) {
            return false;
        }
        if removed == self.position {
            self.stop(player);
            return true;
        }
        if removed < self.position {
            self.position -= 1;
        }
        false
    }

    /// Search results were replaced; indices into the old set are meaningless.
    /// Returns true if playback had to stop.
    pub fn on_search_replaced<P: PlayerBackend + ?Sized>(&mut self, player: &mut P) -> bool {
        if self.source == PlaybackSource::SearchResults {
            self.stop(player);
            return true;
        }
        false
    }

    fn start<P: PlayerBackend + ?Sized>(
        &mut self,
        player: &mut P,
        source: PlaybackSource,
        song: &Song,
        index: usize,
        now: Instant,
    ) -> Result<(), PlayerError> {
        player.ensure_running()?;
        player.load(&song.url())?;

        self.source = source;
        self.position = index;
        self.is_paused = false;
        self.started_at = Some(now);
        self.title = Some(song.title.clone());
        tracing::info!(?source, index, title = %song.title, "Playing");
        Ok(())
    }
}

//! Library store - the authoritative, persisted list of playlists.
//!
//! Every mutation follows the same shape: change the in-memory copy, write the
//! affected file, and undo the in-memory change if the write fails, so memory
//! never runs ahead of disk.

pub mod codec;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Playlist, Song};
use codec::{IndexEntry, MAX_RECORD_BYTES};

const STORAGE_KEY_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Playlist name cannot be empty")]
    EmptyName,
    #[error("Playlist already exists: {0}")]
    DuplicateName(String),
    #[error("Already in playlist: {0}")]
    DuplicateEntry(String),
    #[error("No entry at position {0}")]
    OutOfRange(usize),
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Derives a file name from a playlist name: lowercase ASCII letters, digits,
/// `-` and `_` are kept, spaces become `_`, everything else is dropped.
pub fn storage_key_for(name: &str) -> String {
    let mut stem: String = name
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c.to_ascii_lowercase()),
            ' ' => Some('_'),
            _ => None,
        })
        .collect();
    if stem.is_empty() {
        stem.push_str("playlist");
    }
    stem.push_str(STORAGE_KEY_SUFFIX);
    stem
}

/// Storage keys from disk must name a file directly inside the playlists directory
fn is_plain_file_name(key: &str) -> bool {
    !key.is_empty() && key != "." && !key.contains(['/', '\\']) && !key.contains("..")
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub struct LibraryStore {
    playlists: Vec<Playlist>,
    index_path: PathBuf,
    playlists_dir: PathBuf,
}

impl LibraryStore {
    pub fn new(index_path: PathBuf, playlists_dir: PathBuf) -> Self {
        Self {
            playlists: Vec::new(),
            index_path,
            playlists_dir,
        }
    }

    /// Creates a store and loads the index from disk
    pub fn open(index_path: PathBuf, playlists_dir: PathBuf) -> Self {
        let mut store = Self::new(index_path, playlists_dir);
        store.load();
        store
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn get(&self, index: usize) -> Option<&Playlist> {
        self.playlists.get(index)
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    pub fn playlist_path(&self, playlist: &Playlist) -> PathBuf {
        self.playlists_dir.join(&playlist.storage_key)
    }

    /// Replaces the in-memory library with the index on disk. Playlists come
    /// back unloaded. Missing or unreadable files give an empty library.
    pub fn load(&mut self) {
        self.playlists.clear();
        let Some(text) = read_record(&self.index_path) else {
            return;
        };

        for entry in codec::decode_index(&text) {
            if !is_plain_file_name(&entry.storage_key) {
                tracing::warn!(
                    playlist = %entry.name,
                    key = %entry.storage_key,
                    "Skipping index entry with unsafe file name"
                );
                continue;
            }
            let clash = self.playlists.iter().any(|p| {
                same_name(&p.name, &entry.name) || p.storage_key == entry.storage_key
            });
            if clash {
                tracing::warn!(playlist = %entry.name, "Skipping duplicate index entry");
                continue;
            }
            self.playlists
                .push(Playlist::unloaded(entry.name, entry.storage_key));
        }
        tracing::info!(count = self.playlists.len(), "Loaded playlist index");
    }

    /// Reads a playlist's songs from disk unless already loaded
    pub fn load_songs(&mut self, index: usize) -> LibraryResult<()> {
        let path = {
            let playlist = self.playlists.get(index).ok_or(LibraryError::OutOfRange(index))?;
            if playlist.loaded {
                return Ok(());
            }
            self.playlist_path(playlist)
        };

        let record = read_record(&path)
            .map(|text| codec::decode_playlist(&text))
            .unwrap_or_default();

        let mut songs: Vec<Song> = Vec::with_capacity(record.songs.len());
        for song in record.songs {
            if !songs.iter().any(|s| s.source_id == song.source_id) {
                songs.push(song);
            }
        }

        let playlist = &mut self.playlists[index];
        tracing::debug!(playlist = %playlist.name, songs = songs.len(), "Loaded playlist songs");
        playlist.songs = songs;
        playlist.loaded = true;
        Ok(())
    }

    /// Adds an empty playlist and returns its position
    pub fn create(&mut self, name: &str) -> LibraryResult<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        if self.playlists.iter().any(|p| same_name(&p.name, name)) {
            return Err(LibraryError::DuplicateName(name.to_string()));
        }

        let storage_key = self.unique_storage_key(storage_key_for(name));
        let mut playlist = Playlist::unloaded(name.to_string(), storage_key);
        playlist.loaded = true;

        self.write_playlist(&playlist)?;
        self.playlists.push(playlist);
        if let Err(e) = self.write_index() {
            if let Some(orphan) = self.playlists.pop() {
                let _ = fs::remove_file(self.playlist_path(&orphan));
            }
            return Err(e);
        }

        tracing::info!(playlist = %name, "Created playlist");
        Ok(self.playlists.len() - 1)
    }

    /// Renames a playlist; its storage key does not change
    pub fn rename(&mut self, index: usize, new_name: &str) -> LibraryResult<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        if index >= self.playlists.len() {
            return Err(LibraryError::OutOfRange(index));
        }
        let clash = self
            .playlists
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && same_name(&p.name, new_name));
        if clash {
            return Err(LibraryError::DuplicateName(new_name.to_string()));
        }

        self.load_songs(index)?;
        let old_name = std::mem::replace(&mut self.playlists[index].name, new_name.to_string());

        let written = self
            .write_index()
            .and_then(|_| self.write_playlist(&self.playlists[index]));
        if let Err(e) = written {
            self.playlists[index].name = old_name;
            let _ = self.write_index();
            return Err(e);
        }

        tracing::info!(from = %old_name, to = %new_name, "Renamed playlist");
        Ok(())
    }

    /// Removes a playlist and its file. Later playlists shift down by one.
    pub fn delete(&mut self, index: usize) -> LibraryResult<Playlist> {
        if index >= self.playlists.len() {
            return Err(LibraryError::OutOfRange(index));
        }

        let removed = self.playlists.remove(index);
        if let Err(e) = self.write_index() {
            self.playlists.insert(index, removed);
            return Err(e);
        }

        let path = self.playlist_path(&removed);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not remove playlist file"),
        }

        tracing::info!(playlist = %removed.name, "Deleted playlist");
        Ok(removed)
    }

    /// Appends a song unless one with the same source id is already there
    pub fn add_song(&mut self, index: usize, song: &Song) -> LibraryResult<()> {
        self.load_songs(index)?;

        let playlist = &mut self.playlists[index];
        if playlist.contains(&song.source_id) {
            return Err(LibraryError::DuplicateEntry(song.title.clone()));
        }
        playlist.songs.push(Song::new(song.title.clone(), song.source_id.clone())
            .with_duration(song.duration_seconds));

        if let Err(e) = self.write_playlist(&self.playlists[index]) {
            self.playlists[index].songs.pop();
            return Err(e);
        }

        tracing::info!(playlist = %self.playlists[index].name, song = %song.title, "Added song");
        Ok(())
    }

    /// Removes one song, keeping the order of the rest
    pub fn remove_song(&mut self, index: usize, song_index: usize) -> LibraryResult<Song> {
        self.load_songs(index)?;

        let playlist = &mut self.playlists[index];
        if song_index >= playlist.songs.len() {
            return Err(LibraryError::OutOfRange(song_index));
        }
        let removed = playlist.songs.remove(song_index);

        if let Err(e) = self.write_playlist(&self.playlists[index]) {
            self.playlists[index].songs.insert(song_index, removed);
            return Err(e);
        }

        tracing::info!(playlist = %self.playlists[index].name, song = %removed.title, "Removed song");
        Ok(removed)
    }

    fn unique_storage_key(&self, base: String) -> String {
        let taken = |key: &str| self.playlists.iter().any(|p| p.storage_key == key);
        if !taken(&base) {
            return base;
        }
        let mut ordinal = self.playlists.len();
        loop {
            let candidate = format!("{}_{}", ordinal, base);
            if !taken(&candidate) {
                return candidate;
            }
            ordinal += 1;
        }
    }

    fn write_index(&self) -> LibraryResult<()> {
        let entries: Vec<IndexEntry> = self
            .playlists
            .iter()
            .map(|p| IndexEntry {
                name: p.name.clone(),
                storage_key: p.storage_key.clone(),
            })
            .collect();
        write_record(&self.index_path, &codec::encode_index(&entries))
    }

    fn write_playlist(&self, playlist: &Playlist) -> LibraryResult<()> {
        write_record(
            &self.playlist_path(playlist),
            &codec::encode_playlist(&playlist.name, &playlist.songs),
        )
    }
}

fn write_record(path: &Path, text: &str) -> LibraryResult<()> {
    fs::write(path, text).map_err(|source| {
        tracing::error!(path = %path.display(), error = %source, "Write failed");
        LibraryError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Reads a record file, or `None` if it is missing, unreadable or too large
fn read_record(path: &Path) -> Option<String> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Record not found");
            return None;
        }
    };
    if len > MAX_RECORD_BYTES as u64 {
        tracing::warn!(path = %path.display(), len, "Record too large, ignoring");
        return None;
    }
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LibraryStore) {
        let dir = TempDir::new().unwrap();
        let playlists_dir = dir.path().join("playlists");
        fs::create_dir_all(&playlists_dir).unwrap();
        let store = LibraryStore::open(dir.path().join("playlists.json"), playlists_dir);
        (dir, store)
    }

    #[test]
    fn storage_keys_are_sanitized() {
        assert_eq!(storage_key_for("Road Trip"), "road_trip.json");
        assert_eq!(storage_key_for("Lo-Fi_Beats!! 2024"), "lo-fi_beats_2024.json");
        assert_eq!(storage_key_for("日本"), "playlist.json");
    }

    #[test]
    fn duplicate_names_are_rejected_case_insensitively() {
        let (_dir, mut store) = store();
        store.create("Road Trip").unwrap();
        assert!(matches!(store.create("road trip"), Err(LibraryError::DuplicateName(_))));
        assert!(matches!(store.create("  ROAD TRIP "), Err(LibraryError::DuplicateName(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn colliding_storage_keys_get_an_ordinal_prefix() {
        let (_dir, mut store) = store();
        store.create("Road Trip").unwrap();
        let second = store.create("road_trip").unwrap();
        assert_eq!(store.get(second).unwrap().storage_key, "1_road_trip.json");
        assert!(store.playlist_path(store.get(second).unwrap()).exists());
    }

    #[test]
    fn index_entries_escaping_the_playlists_dir_are_skipped() {
        let dir = TempDir::new().unwrap();
        let playlists_dir = dir.path().join("playlists");
        fs::create_dir_all(&playlists_dir).unwrap();
        let outside = dir.path().join("outside.json");
        fs::write(&outside, "keep me").unwrap();
        fs::write(
            dir.path().join("playlists.json"),
            r#"{"playlists":[{"name":"Evil","filename":"../outside.json"},{"name":"Abs","filename":"/etc/passwd"},{"name":"Good","filename":"good.json"}]}"#,
        )
        .unwrap();

        let mut store = LibraryStore::open(dir.path().join("playlists.json"), playlists_dir);
        let names: Vec<_> = store.playlists().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["Good"]);

        store.delete(0).unwrap();
        assert_eq!(fs::read_to_string(&outside).unwrap(), "keep me");
    }

    #[test]
    fn empty_name_is_rejected() {
        let (_dir, mut store) = store();
        assert!(matches!(store.create("   "), Err(LibraryError::EmptyName)));
    }

    #[test]
    fn index_survives_reload_unloaded() {
        let (dir, mut store) = store();
        store.create("One").unwrap();
        let two = store.create("Two").unwrap();
        store.add_song(two, &Song::new("A", "abc123")).unwrap();

        let mut reopened =
            LibraryStore::open(dir.path().join("playlists.json"), dir.path().join("playlists"));
        let names: Vec<_> = reopened.playlists().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["One", "Two"]);
        assert!(!reopened.get(1).unwrap().loaded);

        reopened.load_songs(1).unwrap();
        assert_eq!(reopened.get(1).unwrap().songs, vec![Song::new("A", "abc123")]);
    }

    #[test]
    fn load_songs_does_not_merge_twice() {
        let (_dir, mut store) = store();
        let idx = store.create("P").unwrap();
        store.add_song(idx, &Song::new("A", "abc123")).unwrap();
        store.load_songs(idx).unwrap();
        store.load_songs(idx).unwrap();
        assert_eq!(store.get(idx).unwrap().songs.len(), 1);
    }

    #[test]
    fn add_song_loads_before_checking_duplicates() {
        let (dir, mut store) = store();
        let idx = store.create("P").unwrap();
        store.add_song(idx, &Song::new("A", "abc123")).unwrap();

        let mut reopened =
            LibraryStore::open(dir.path().join("playlists.json"), dir.path().join("playlists"));
        assert!(matches!(
            reopened.add_song(0, &Song::new("A again", "abc123")),
            Err(LibraryError::DuplicateEntry(_))
        ));
        reopened.add_song(0, &Song::new("B", "def456")).unwrap();
        assert_eq!(reopened.get(0).unwrap().songs.len(), 2);
    }

    #[test]
    fn remove_song_out_of_range_is_rejected() {
        let (_dir, mut store) = store();
        let idx = store.create("P").unwrap();
        assert!(matches!(store.remove_song(idx, 0), Err(LibraryError::OutOfRange(0))));
        assert!(matches!(store.remove_song(7, 0), Err(LibraryError::OutOfRange(7))));
    }

    #[test]
    fn rename_keeps_storage_key_and_rejects_clashes() {
        let (dir, mut store) = store();
        store.create("First").unwrap();
        store.create("Second").unwrap();

        assert!(matches!(store.rename(1, "first"), Err(LibraryError::DuplicateName(_))));
        store.rename(1, "second").unwrap();
        store.rename(0, "Renamed").unwrap();
        assert_eq!(store.get(0).unwrap().storage_key, "first.json");

        let reopened =
            LibraryStore::open(dir.path().join("playlists.json"), dir.path().join("playlists"));
        assert_eq!(reopened.get(0).unwrap().name, "Renamed");
        assert_eq!(reopened.get(1).unwrap().name, "second");
    }

    #[test]
    fn failed_write_rolls_back_memory() {
        let (dir, mut store) = store();
        let idx = store.create("P").unwrap();
        fs::remove_dir_all(dir.path().join("playlists")).unwrap();

        assert!(matches!(
            store.add_song(idx, &Song::new("A", "abc123")),
            Err(LibraryError::Io { .. })
        ));
        assert!(store.get(idx).unwrap().songs.is_empty());

        assert!(store.create("Q").is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_index_is_an_empty_library() {
        let dir = TempDir::new().unwrap();
        let store = LibraryStore::open(dir.path().join("nope.json"), dir.path().to_path_buf());
        assert!(store.is_empty());
    }
}

//! On-disk record format for the playlist index and playlist files.
//!
//! The format is a deliberately restricted, JSON-shaped text: the encoder writes
//! a fixed layout, and the decoder does not parse JSON in general. It walks the
//! text looking for the expected field labels, skips the separator, and reads
//! the quoted string that follows. That keeps it tolerant of anything a general
//! JSON encoder produces for the same logical shape (reordered keys, extra
//! fields, different whitespace) and of damaged files, which decode to whatever
//! complete records precede the damage instead of failing.

use crate::model::{Song, UNKNOWN_TITLE};

/// Larger inputs are refused outright
pub const MAX_RECORD_BYTES: usize = 1024 * 1024;

const INDEX_LIST_LABEL: &str = "playlists";
const INDEX_NAME_LABEL: &str = "name";
const INDEX_KEY_LABEL: &str = "filename";
const PLAYLIST_NAME_LABEL: &str = "name";
const PLAYLIST_SONGS_LABEL: &str = "songs";
const SONG_TITLE_LABEL: &str = "title";
const SONG_ID_LABEL: &str = "video_id";

/// One line of the playlist index
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub storage_key: String,
}

/// Decoded contents of one playlist file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaylistRecord {
    pub name: String,
    pub songs: Vec<Song>,
}

pub fn encode_index(entries: &[IndexEntry]) -> String {
    let mut out = String::from("{\n  \"playlists\": [\n");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "    {{\"name\": \"{}\", \"filename\": \"{}\"}}{}\n",
            escape(&entry.name),
            escape(&entry.storage_key),
            if i + 1 < entries.len() { "," } else { "" }
        ));
    }
    out.push_str("  ]\n}\n");
    out
}

pub fn encode_playlist(name: &str, songs: &[Song]) -> String {
    let mut out = format!("{{\n  \"name\": \"{}\",\n  \"songs\": [\n", escape(name));
    for (i, song) in songs.iter().enumerate() {
        out.push_str(&format!(
            "    {{\"title\": \"{}\", \"video_id\": \"{}\"}}{}\n",
            escape(&song.title),
            escape(&song.source_id),
            if i + 1 < songs.len() { "," } else { "" }
        ));
    }
    out.push_str("  ]\n}\n");
    out
}

pub fn decode_index(text: &str) -> Vec<IndexEntry> {
    if text.len() > MAX_RECORD_BYTES {
        return Vec::new();
    }
    let Some(list_start) = find_key(text, INDEX_LIST_LABEL, 1) else {
        return Vec::new();
    };

    array_objects(text, list_start)
        .into_iter()
        .filter_map(|obj| {
            let name = string_field(obj, INDEX_NAME_LABEL)?;
            let storage_key = string_field(obj, INDEX_KEY_LABEL)?;
            if name.is_empty() || storage_key.is_empty() {
                return None;
            }
            Some(IndexEntry { name, storage_key })
        })
        .collect()
}

pub fn decode_playlist(text: &str) -> PlaylistRecord {
    if text.len() > MAX_RECORD_BYTES {
        return PlaylistRecord::default();
    }
    let name = string_field(text, PLAYLIST_NAME_LABEL).unwrap_or_default();
    let Some(songs_start) = find_key(text, PLAYLIST_SONGS_LABEL, 1) else {
        return PlaylistRecord { name, songs: Vec::new() };
    };

    let songs = array_objects(text, songs_start)
        .into_iter()
        .filter_map(|obj| {
            let source_id = string_field(obj, SONG_ID_LABEL).filter(|id| !id.is_empty())?;
            let title = string_field(obj, SONG_TITLE_LABEL)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
            Some(Song::new(title, source_id))
        })
        .collect();

    PlaylistRecord { name, songs }
}

/// Escapes a value for a quoted field
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let high = read_hex4(&mut chars);
                let code = match high {
                    Some(h) if (0xD800..0xDC00).contains(&h) => {
                        // surrogate pair written by general-purpose encoders
                        let mut lookahead = chars.clone();
                        match (lookahead.next(), lookahead.next(), read_hex4(&mut lookahead)) {
                            (Some('\\'), Some('u'), Some(l)) if (0xDC00..0xE000).contains(&l) => {
                                chars = lookahead;
                                Some(0x10000 + ((h - 0xD800) << 10) + (l - 0xDC00))
                            }
                            _ => None,
                        }
                    }
                    other => other,
                };
                out.push(code.and_then(char::from_u32).unwrap_or('\u{FFFD}'));
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut value = 0;
    for _ in 0..4 {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

/// Index one past the closing quote of the string opening at `start`
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r') {
        i += 1;
    }
    i
}

/// Finds the first `"key":` at the given nesting depth and returns the
/// position just after the colon.
fn find_key(text: &str, key: &str, depth: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut level = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let end = skip_string(bytes, i)?;
                let after = skip_whitespace(bytes, end);
                if level == depth
                    && after < bytes.len()
                    && bytes[after] == b':'
                    && unescape(&text[i + 1..end - 1]) == key
                {
                    return Some(after + 1);
                }
                i = end;
            }
            b'{' | b'[' => {
                level += 1;
                i += 1;
            }
            b'}' | b']' => {
                level = level.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Reads the quoted string at `pos`, after optional whitespace
fn read_string(text: &str, pos: usize) -> Option<String> {
    let bytes = text.as_bytes();
    let start = skip_whitespace(bytes, pos);
    if bytes.get(start) != Some(&b'"') {
        return None;
    }
    let end = skip_string(bytes, start)?;
    Some(unescape(&text[start + 1..end - 1]))
}

fn string_field(object: &str, key: &str) -> Option<String> {
    read_string(object, find_key(object, key, 1)?)
}

/// Slices of the complete `{...}` objects directly inside the array at `pos`.
/// Stops at the closing bracket or at the first incomplete object.
fn array_objects(text: &str, pos: usize) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut objects = Vec::new();
    let mut i = skip_whitespace(bytes, pos);
    if bytes.get(i) != Some(&b'[') {
        return objects;
    }
    i += 1;

    while i < bytes.len() {
        match bytes[i] {
            b']' => break,
            b'{' => {
                let Some(end) = matching_close(bytes, i) else {
                    break;
                };
                objects.push(&text[i..end]);
                i = end;
            }
            b'"' => match skip_string(bytes, i) {
                Some(end) => i = end,
                None => break,
            },
            b'[' => match matching_close(bytes, i) {
                Some(end) => i = end,
                None => break,
            },
            _ => i += 1,
        }
    }
    objects
}

/// One past the bracket closing the one at `start`, skipping quoted text
fn matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut level = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'{' | b'[' => level += 1,
            b'}' | b']' => {
                level -= 1;
                if level == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

//! shellbeats - a terminal YouTube player.
//!
//! Searches through yt-dlp, plays through mpv over its IPC socket, and keeps
//! playlists on disk.

pub mod config;
pub mod controller;
pub mod library;
pub mod logging;
pub mod model;
pub mod player;
pub mod search;
pub mod view;

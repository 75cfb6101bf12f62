//! mpv client over its JSON IPC socket

use std::thread;
use std::time::Duration;

use super::connection::{PlayerConnection, ReadOutcome};
use super::protocol::{Command, LineBuffer, parse_event};
use super::{PlayerBackend, PlayerError};

const LAUNCH_POLL_INTERVAL: Duration = Duration::from_millis(50);
const LAUNCH_POLL_ATTEMPTS: u32 = 100;
const QUIT_GRACE: Duration = Duration::from_millis(100);

pub struct MpvClient {
    conn: PlayerConnection,
    program: String,
    lines: LineBuffer,
}

impl MpvClient {
    pub fn new(conn: PlayerConnection, program: impl Into<String>) -> Self {
        Self {
            conn,
            program: program.into(),
            lines: LineBuffer::new(),
        }
    }

    fn launch_args(&self) -> Vec<String> {
        vec![
            "--no-video".to_string(),
            "--idle=yes".to_string(),
            "--force-window=no".to_string(),
            "--really-quiet".to_string(),
            format!("--input-ipc-server={}", self.conn.socket_path().display()),
        ]
    }

    /// Connects and subscribes to end-of-file notifications
    fn connect(&mut self) -> Result<(), PlayerError> {
        if self.conn.connect()? {
            self.lines.clear();
            if let Err(e) = self.conn.write_line(&Command::ObserveEof.to_line()) {
                self.conn.disconnect();
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn send(&mut self, command: Command<'_>) -> Result<(), PlayerError> {
        let line = command.to_line();
        if self.conn.is_connected() {
            match self.conn.write_line(&line) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Write to player failed, retrying once");
                    self.conn.disconnect();
                }
            }
        }
        self.conn.send_once(&line).map_err(|e| {
            tracing::debug!(error = %e, "One-shot send failed");
            PlayerError::Unavailable(e.to_string())
        })
    }

    /// Discards pending events and reports whether the peer is still there.
    /// Drops the stream if it is not.
    fn peer_alive(&mut self) -> bool {
        match self.conn.read_available() {
            Ok(ReadOutcome::Open(_)) => true,
            Ok(ReadOutcome::Closed(_)) | Err(_) => {
                tracing::info!("Player went away while idle");
                self.conn.disconnect();
                self.lines.clear();
                false
            }
        }
    }

    /// Consumes buffered events, returning whether one was a natural end of track
    fn read_events(&mut self) -> bool {
        if !self.conn.is_connected() && (!self.conn.socket_exists() || self.connect().is_err()) {
            return false;
        }

        let (data, closed) = match self.conn.read_available() {
            Ok(ReadOutcome::Open(data)) => (data, false),
            Ok(ReadOutcome::Closed(data)) => (data, true),
            Err(e) => {
                tracing::warn!(error = %e, "Read from player failed");
                (Vec::new(), true)
            }
        };

        let ended = self
            .lines
            .push(&data)
            .iter()
            .filter_map(|line| parse_event(line))
            .any(|event| event.is_natural_end());

        if closed {
            tracing::info!("Player closed the control channel");
            self.conn.disconnect();
            self.lines.clear();
        }
        ended
    }
}

impl PlayerBackend for MpvClient {
    fn ensure_running(&mut self) -> Result<(), PlayerError> {
        // A stream left over from before may point at a player that has since exited
        if self.conn.is_connected() && self.peer_alive() {
            return Ok(());
        }
        if self.conn.socket_exists() && self.connect().is_ok() {
            return Ok(());
        }

        self.conn.remove_socket_file();
        let args = self.launch_args();
        self.conn
            .spawn(&self.program, &args)
            .map_err(|e| PlayerError::Unavailable(format!("{}: {}", self.program, e)))?;

        for _ in 0..LAUNCH_POLL_ATTEMPTS {
            thread::sleep(LAUNCH_POLL_INTERVAL);
            if self.conn.socket_exists() && self.connect().is_ok() {
                return Ok(());
            }
        }
        tracing::error!(program = %self.program, "Player did not open its control socket");
        Err(PlayerError::Unavailable(format!("{} did not start", self.program)))
    }

    fn load(&mut self, url: &str) -> Result<(), PlayerError> {
        tracing::debug!(url, "Loading");
        self.send(Command::LoadFile(url))
    }

    fn toggle_pause(&mut self) -> Result<(), PlayerError> {
        self.send(Command::TogglePause)
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.send(Command::Stop)
    }

    fn poll_track_end(&mut self) -> bool {
        self.read_events()
    }

    fn drain(&mut self) {
        self.read_events();
    }

    fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    fn quit(&mut self) {
        if self.conn.is_connected() || self.conn.socket_exists() {
            let _ = self.send(Command::Quit);
            thread::sleep(QUIT_GRACE);
        }
        self.conn.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;

    fn client_with_peer() -> (tempfile::TempDir, MpvClient, std::os::unix::net::UnixStream) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let mut client = MpvClient::new(PlayerConnection::new(&path), "mpv-not-used");
        client.ensure_running().unwrap();
        let (peer, _) = listener.accept().unwrap();
        (dir, client, peer)
    }

    #[test]
    fn subscribes_on_connect_then_sends_commands() {
        let (_dir, mut client, peer) = client_with_peer();
        client.load("https://www.youtube.com/watch?v=abc123").unwrap();
        client.toggle_pause().unwrap();

        let mut reader = BufReader::new(peer);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert!(line.contains("observe_property"));
        line.clear();
        reader.read_line(&mut line).unwrap();
        assert!(line.contains("loadfile") && line.contains("abc123"));
        line.clear();
        reader.read_line(&mut line).unwrap();
        assert!(line.contains("cycle"));
    }

    #[test]
    fn only_eof_counts_as_track_end() {
        let (_dir, mut client, mut peer) = client_with_peer();
        assert!(!client.poll_track_end());

        peer.write_all(b"{\"event\":\"end-file\",\"reason\":\"stop\"}\n").unwrap();
        assert!(!client.poll_track_end());

        peer.write_all(b"{\"event\":\"start-file\"}\n{\"event\":\"end-file\",\"reason\":\"eof\"}\n")
            .unwrap();
        assert!(client.poll_track_end());
        assert!(!client.poll_track_end());
    }

    #[test]
    fn drained_events_do_not_resurface() {
        let (_dir, mut client, mut peer) = client_with_peer();
        peer.write_all(b"{\"event\":\"end-file\",\"reason\":\"eof\"}\n").unwrap();
        client.drain();
        assert!(!client.poll_track_end());
    }

    #[test]
    fn peer_close_disconnects() {
        let (_dir, mut client, peer) = client_with_peer();
        drop(peer);
        assert!(!client.poll_track_end());
        assert!(!client.is_connected());
    }

    #[test]
    fn restarted_player_gets_a_fresh_subscription() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let mut client = MpvClient::new(PlayerConnection::new(&path), "mpv-not-used");
        client.ensure_running().unwrap();
        let (first, _) = listener.accept().unwrap();

        // Player dies while nothing is playing; a new one listens on the same path
        drop(first);
        client.ensure_running().unwrap();
        let (second, _) = listener.accept().unwrap();
        client.load("https://www.youtube.com/watch?v=abc123").unwrap();

        let mut reader = BufReader::new(second);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert!(line.contains("observe_property"));
        line.clear();
        reader.read_line(&mut line).unwrap();
        assert!(line.contains("loadfile"));
    }

    #[test]
    fn dead_player_is_relaunched_not_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let mut client = MpvClient::new(
            PlayerConnection::new(&path),
            "/nonexistent/shellbeats-player",
        );
        client.ensure_running().unwrap();
        let (peer, _) = listener.accept().unwrap();

        drop(peer);
        drop(listener);
        let result = client.ensure_running();
        assert!(matches!(result, Err(PlayerError::Unavailable(ref reason)) if reason.contains("shellbeats-player")));
        assert!(!client.is_connected());
    }

    #[test]
    fn missing_player_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MpvClient::new(
            PlayerConnection::new(dir.path().join("mpv.sock")),
            "/nonexistent/shellbeats-player",
        );
        assert!(matches!(client.ensure_running(), Err(PlayerError::Unavailable(_))));
        assert!(matches!(client.stop(), Err(PlayerError::Unavailable(_))));
    }
}

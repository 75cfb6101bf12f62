//! Owned handles to the player: the control socket and, if we started it, the
//! player process.

use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

/// Longest a command write may wait on a full socket buffer
const WRITE_TIMEOUT: Duration = Duration::from_millis(250);
const WRITE_RETRY_INTERVAL: Duration = Duration::from_millis(5);
const REAP_ATTEMPTS: u32 = 20;
const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// Result of draining the socket without blocking
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes read (possibly zero) and the peer is still there
    Open(Vec<u8>),
    /// The peer closed the channel; any trailing bytes are included
    Closed(Vec<u8>),
}

pub struct PlayerConnection {
    socket_path: PathBuf,
    stream: Option<UnixStream>,
    child: Option<Child>,
}

impl PlayerConnection {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            stream: None,
            child: None,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Connects if not already connected. Returns true if a new stream was opened.
    pub fn connect(&mut self) -> io::Result<bool> {
        if self.stream.is_some() {
            return Ok(false);
        }
        let stream = UnixStream::connect(&self.socket_path)?;
        stream.set_nonblocking(true)?;
        self.stream = Some(stream);
        tracing::debug!(socket = %self.socket_path.display(), "Connected to player");
        Ok(true)
    }

    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Disconnected from player");
        }
    }

    /// Writes a whole line on the open stream. Gives up after `WRITE_TIMEOUT`
    /// if the player stops reading, dropping the stream.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(ErrorKind::NotConnected, "player not connected"))?;
        let result = write_all_nonblocking(stream, line.as_bytes());
        if result.is_err() {
            self.disconnect();
        }
        result
    }

    /// Sends a line over a temporary connection that is closed straight after
    pub fn send_once(&self, line: &str) -> io::Result<()> {
        let mut stream = UnixStream::connect(&self.socket_path)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.write_all(line.as_bytes())
    }

    /// Reads whatever is buffered on the socket without waiting for more
    pub fn read_available(&mut self) -> io::Result<ReadOutcome> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(ReadOutcome::Open(Vec::new()));
        };

        let mut data = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => return Ok(ReadOutcome::Closed(data)),
                Ok(n) => data.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(ReadOutcome::Open(data)),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Starts the player process with its output discarded
    pub fn spawn(&mut self, program: &str, args: &[String]) -> io::Result<()> {
        // A previous launch that never opened its socket is still ours to stop
        self.terminate_child();
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::info!(program, pid = child.id(), "Started player process");
        self.child = Some(child);
        Ok(())
    }

    /// Removes a socket file left behind by a player that is gone
    pub fn remove_socket_file(&self) {
        match fs::remove_file(&self.socket_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(socket = %self.socket_path.display(), error = %e, "Could not remove socket file")
            }
        }
    }

    /// Closes the channel, terminates a launched player and removes the socket file
    pub fn teardown(&mut self) {
        self.disconnect();
        self.terminate_child();
        self.remove_socket_file();
    }

    fn terminate_child(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = Pid::from_raw(child.id() as i32);
        if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
            tracing::debug!(%pid, error = %e, "SIGTERM failed, player probably already gone");
        }
        for _ in 0..REAP_ATTEMPTS {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(%pid, %status, "Player exited");
                    return;
                }
                Ok(None) => thread::sleep(REAP_INTERVAL),
                Err(e) => {
                    tracing::warn!(%pid, error = %e, "Could not reap player");
                    return;
                }
            }
        }
        tracing::debug!(%pid, "Player still shutting down");
    }
}

impl Drop for PlayerConnection {
    fn drop(&mut self) {
        self.disconnect();
        self.terminate_child();
    }
}

fn write_all_nonblocking(stream: &mut UnixStream, mut bytes: &[u8]) -> io::Result<()> {
    let deadline = Instant::now() + WRITE_TIMEOUT;
    while !bytes.is_empty() {
        match stream.write(bytes) {
            Ok(0) => return Err(io::Error::new(ErrorKind::WriteZero, "player closed the channel")),
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(io::Error::new(ErrorKind::TimedOut, "player is not reading commands"));
                }
                thread::sleep(WRITE_RETRY_INTERVAL);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

//! Wire format of the player's control channel.
//!
//! Commands go out as one JSON object per line. Events come back the same way;
//! the only one interpreted here is `end-file`, and only its `reason` matters.

use serde_json::{Value, json};

/// Pending bytes kept while waiting for a newline before they are dropped
const MAX_PENDING_BYTES: usize = 64 * 1024;

/// Observer id used for the end-of-file subscription
const EOF_OBSERVER_ID: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Subscribe to end-of-file transitions
    ObserveEof,
    /// Replace the current item with this URL
    LoadFile(&'a str),
    TogglePause,
    Stop,
    Quit,
}

impl Command<'_> {
    /// Encodes the command as a newline-terminated line
    pub fn to_line(&self) -> String {
        let value = match self {
            Command::ObserveEof => json!({ "command": ["observe_property", EOF_OBSERVER_ID, "eof-reached"] }),
            Command::LoadFile(url) => json!({ "command": ["loadfile", url, "replace"] }),
            Command::TogglePause => json!({ "command": ["cycle", "pause"] }),
            Command::Stop => json!({ "command": ["stop"] }),
            Command::Quit => json!({ "command": ["quit"] }),
        };
        let mut line = value.to_string();
        line.push('\n');
        line
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndReason {
    Eof,
    Stop,
    Quit,
    Error,
    Other(String),
}

impl EndReason {
    fn parse(reason: &str) -> Self {
        match reason {
            "eof" => EndReason::Eof,
            "stop" => EndReason::Stop,
            "quit" => EndReason::Quit,
            "error" => EndReason::Error,
            other => EndReason::Other(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    EndFile(EndReason),
    /// Any other event name, or a command reply
    Other,
}

impl PlayerEvent {
    pub fn is_natural_end(&self) -> bool {
        matches!(self, PlayerEvent::EndFile(EndReason::Eof))
    }
}

/// Parses one line from the channel. Lines that are not JSON objects give `None`.
pub fn parse_event(line: &str) -> Option<PlayerEvent> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    let object = value.as_object()?;

    match object.get("event").and_then(Value::as_str) {
        Some("end-file") => {
            let reason = object.get("reason").and_then(Value::as_str).unwrap_or("");
            Some(PlayerEvent::EndFile(EndReason::parse(reason)))
        }
        _ => Some(PlayerEvent::Other),
    }
}

/// Splits the incoming byte stream into lines, holding back a trailing partial line
#[derive(Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes and returns every line completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            tracing::warn!(len = self.pending.len(), "Dropping oversized partial line from player");
            self.pending.clear();
        }
        lines
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_escapes_the_url() {
        let line = Command::LoadFile(r#"https://x/?a="b"\c"#).to_line();
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["command"][1], r#"https://x/?a="b"\c"#);
        assert_eq!(value["command"][2], "replace");
    }

    #[test]
    fn subscription_observes_eof() {
        assert_eq!(
            Command::ObserveEof.to_line(),
            "{\"command\":[\"observe_property\",1,\"eof-reached\"]}\n"
        );
    }

    #[test]
    fn only_eof_is_a_natural_end() {
        let eof = parse_event(r#"{"event":"end-file","reason":"eof","playlist_entry_id":1}"#).unwrap();
        assert!(eof.is_natural_end());

        for reason in ["stop", "error", "quit", "redirect"] {
            let line = format!(r#"{{"event":"end-file","reason":"{reason}"}}"#);
            assert!(!parse_event(&line).unwrap().is_natural_end());
        }
        assert_eq!(
            parse_event(r#"{"event":"property-change","name":"eof-reached","data":true}"#),
            Some(PlayerEvent::Other)
        );
        assert_eq!(parse_event(r#"{"data":null,"error":"success"}"#), Some(PlayerEvent::Other));
        assert_eq!(parse_event("not json"), None);
    }

    #[test]
    fn line_buffer_holds_partial_lines() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"event\":\"end-").is_empty());
        let lines = buffer.push(b"file\",\"reason\":\"eof\"}\n{\"event\":\"idle\"}\n{\"ev");
        assert_eq!(lines.len(), 2);
        assert!(parse_event(&lines[0]).unwrap().is_natural_end());
        assert_eq!(buffer.push(b"ent\":\"idle\"}\n"), vec!["{\"event\":\"idle\"}".to_string()]);
    }

    #[test]
    fn line_buffer_drops_runaway_input() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(&vec![b'x'; MAX_PENDING_BYTES + 1]).is_empty());
        assert_eq!(buffer.push(b"ok\n"), vec!["ok".to_string()]);
    }
}

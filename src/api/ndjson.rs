//! Newline-delimited JSON framing for streamed replies.

use serde::Deserialize;

/// Accumulates raw chunks and yields complete lines.
///
/// Works on bytes so a multi-byte character split across two reads is
/// decoded intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk and return every line it completed, trimmed, blanks dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    /// The unterminated remainder, if any, once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// One streamed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRecord {
    Fragment(String),
    Done,
}

#[derive(Deserialize)]
struct RawRecord {
    message: Option<String>,
    #[serde(default)]
    done: bool,
}

/// Parse a record line. Malformed records yield `None` and are skipped.
pub fn parse_record(line: &str) -> Option<StreamRecord> {
    let raw: RawRecord = serde_json::from_str(line).ok()?;
    if raw.done {
        return Some(StreamRecord::Done);
    }
    raw.message.map(StreamRecord::Fragment)
}

// components/fetch_progress/src/lines.rs
use std::fmt;

/// Which child stream a line was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Stdout => write!(f, "stdout"),
            StreamSource::Stderr => write!(f, "stderr"),
        }
    }
}

/// One trimmed, non-empty line of downloader output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    raw: String,
    source: StreamSource,
}

impl LogLine {
    pub fn new(raw: impl Into<String>, source: StreamSource) -> Self {
        Self {
            raw: raw.into(),
            source,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn source(&self) -> StreamSource {
        self.source
    }
}

/// Splits the raw chunks of a single stream into [`LogLine`]s.
///
/// `\n`, `\r\n` and a bare `\r` all end a line. Bytes after the last
/// terminator are held until the next chunk (or [`LineSplitter::finish`]),
/// and decoding happens per line so a multi-byte character split across
/// two chunks is still decoded correctly.
#[derive(Debug)]
pub struct LineSplitter {
    source: StreamSource,
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new(source: StreamSource) -> Self {
        Self {
            source,
            pending: Vec::new(),
        }
    }

    /// Feed one chunk, returning every line it completed, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<LogLine> {
        let mut lines = Vec::new();
        for &byte in chunk {
            match byte {
                b'\n' | b'\r' => lines.extend(self.take_line()),
                _ => self.pending.push(byte),
            }
        }
        lines
    }

    /// Flush a trailing unterminated line once the stream has ended
    pub fn finish(&mut self) -> Option<LogLine> {
        self.take_line()
    }

    fn take_line(&mut self) -> Option<LogLine> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();

        if text.is_empty() {
            None
        } else {
            Some(LogLine::new(text, self.source))
        }
    }
}

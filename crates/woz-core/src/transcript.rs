use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use super::error::WozError;
use super::message::Message;

/// Reads a conversation either as one JSON array or as JSON lines.
///
/// A missing file is an empty conversation. Unreadable lines are skipped.
pub fn load_transcript(path: impl AsRef<Path>) -> Result<Vec<Message>, WozError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path).map_err(|err| WozError::io(path, err))?;
    parse_transcript(&raw)
}

pub fn parse_transcript(raw: &str) -> Result<Vec<Message>, WozError> {
    if raw.trim_start().starts_with('[') {
        return Ok(serde_json::from_str::<Vec<Message>>(raw)?);
    }
    Ok(parse_lines(raw.lines().map(str::to_string)))
}

fn parse_lines(lines: impl Iterator<Item = String>) -> Vec<Message> {
    let mut messages = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Message>(&line) {
            Ok(message) => messages.push(message),
            Err(err) => {
                tracing::warn!(line = index + 1, error = %err, "skipping unreadable transcript line");
            }
        }
    }
    messages
}

/// Append-only JSONL log of a conversation as it arrives.
#[derive(Debug)]
pub struct TranscriptLog {
    path: PathBuf,
    len: usize,
}

impl TranscriptLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WozError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| WozError::io(parent, err))?;
        }
        let len = load_lines(path.as_path())?.len();
        Ok(Self { path, len })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn append(&mut self, message: &Message) -> Result<usize, WozError> {
        let line = serde_json::to_string(message)?;
        append_line(self.path.as_path(), line.as_str())
            .map_err(|err| WozError::io(self.path.as_path(), err))?;
        self.len = self.len.saturating_add(1);
        Ok(self.len)
    }

    pub fn load(&self) -> Result<Vec<Message>, WozError> {
        load_lines(self.path.as_path())
    }
}

fn load_lines(path: &Path) -> Result<Vec<Message>, WozError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(|err| WozError::io(path, err))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        lines.push(line.map_err(|err| WozError::io(path, err))?);
    }
    Ok(parse_lines(lines.into_iter()))
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

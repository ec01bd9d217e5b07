use std::fs;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eqlog_core::{CombatEvent, ParsingSession};
use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::prelude::*;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::{Duration, sleep};

#[derive(Debug, Error)]
pub enum EventFileError {
    #[error("failed to open event file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read event file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Byte ranges of the non-empty lines in `bytes`
fn line_ranges(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for end in memchr_iter(b'\n', bytes) {
        if end > start {
            ranges.push((start, end));
        }
        start = end + 1;
    }
    if start < bytes.len() {
        ranges.push((start, bytes.len()));
    }
    ranges
}

/// Parse one JSON event line. Blank lines and `#` comments yield `None`.
pub fn parse_event_line(line: &[u8]) -> Option<CombatEvent> {
    let line = line.trim_ascii();
    if line.is_empty() || line.starts_with(b"#") {
        return None;
    }
    match serde_json::from_slice(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed event line");
            None
        }
    }
}

/// Read a whole JSON-lines event file. Returns the events in file order and
/// the byte offset to continue tailing from.
pub fn read_event_file<P: AsRef<Path>>(path: P) -> Result<(Vec<CombatEvent>, u64), EventFileError> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|source| EventFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    // SAFETY: the file is only read while mapped; a concurrent writer can at
    // worst produce a torn final line, which fails to parse and is skipped.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| EventFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = mmap.as_ref();
    let end_pos = bytes.len() as u64;

    let ranges = line_ranges(bytes);
    let events: Vec<CombatEvent> = ranges
        .par_iter()
        .filter_map(|&(start, end)| parse_event_line(&bytes[start..end]))
        .collect();

    let skipped = ranges.len() - events.len();
    if skipped > 0 {
        tracing::warn!(skipped, path = %path.display(), "Lines without an event were skipped");
    }
    Ok((events, end_pos))
}

/// Follow a growing event file from `start`, feeding each complete line to
/// the session. Runs until the file can no longer be read.
pub async fn tail_event_file<P: AsRef<Path>>(
    path: P,
    start: u64,
    session: Arc<ParsingSession>,
) -> Result<(), EventFileError> {
    let path = path.as_ref();
    let read_error = |source| EventFileError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).await.map_err(|source| EventFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(start)).await.map_err(read_error)?;

    let mut line = String::new();
    loop {
        match reader.read_line(&mut line).await {
            Ok(0) => sleep(Duration::from_millis(100)).await,
            // Writer has not finished this line yet
            Ok(_) if !line.ends_with('\n') => sleep(Duration::from_millis(100)).await,
            Ok(_) => {
                if let Some(event) = parse_event_line(line.as_bytes()) {
                    session.process_event(event);
                }
                line.clear();
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Stopped tailing event file");
                return Err(read_error(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqlog_core::EventKind;

    #[test]
    fn splits_lines_without_empty_ranges() {
        let bytes = b"one\n\ntwo\nthree";
        let ranges = line_ranges(bytes);
        assert_eq!(ranges, vec![(0, 3), (5, 8), (9, 14)]);
    }

    #[test]
    fn parses_event_lines_and_skips_noise() {
        let event = parse_event_line(
            br#"  {"timestamp": 5.0, "type": "chat", "sender": "Firiona", "channel": "guild"}  "#,
        )
        .unwrap();
        assert_eq!(event.timestamp, 5.0);
        assert!(matches!(event.kind, EventKind::Chat(_)));

        assert!(parse_event_line(b"").is_none());
        assert!(parse_event_line(b"# comment").is_none());
        assert!(parse_event_line(b"{not json").is_none());
    }

    #[test]
    fn reads_whole_file_in_order() {
        let path = std::env::temp_dir().join(format!("eqlog-reader-{}.jsonl", std::process::id()));
        let contents = concat!(
            r#"{"timestamp": 1.0, "type": "damage", "attacker": "You", "defender": "a gnoll", "amount": 10}"#,
            "\n",
            "garbage\n",
            r#"{"timestamp": 2.0, "type": "death", "killed": "a gnoll", "killer": "You"}"#,
            "\n",
        );
        std::fs::write(&path, contents).unwrap();

        let (events, end) = read_event_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(end, contents.len() as u64);
        let stamps: Vec<f64> = events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![1.0, 2.0]);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = read_event_file("/nonexistent/eqlog/events.jsonl").unwrap_err();
        assert!(matches!(err, EventFileError::Open { .. }));
    }
}

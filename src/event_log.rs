use std::io::BufRead;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ReportError;
use crate::models::RawEvent;

/// Read raw play events from `path`.
///
/// Accepts either a JSON array (the game data endpoint's response body)
/// or one JSON object per line. Blank lines are ignored; lines that fail
/// to parse are skipped with a warning.
pub fn read_events(path: &Path) -> Result<Vec<RawEvent>, ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(io_err)?;
    let mut reader = std::io::BufReader::new(file);

    if starts_with_array(&mut reader).map_err(io_err)? {
        let events: Vec<RawEvent> = serde_json::from_reader(reader)?;
        debug!(count = events.len(), path = %path.display(), "loaded event array");
        return Ok(events);
    }

    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => warn!(line = idx + 1, error = %e, "skipping malformed event"),
        }
    }

    debug!(count = events.len(), path = %path.display(), "loaded event lines");
    Ok(events)
}

/// Peek past leading whitespace for a `[` without consuming it.
fn starts_with_array<R: BufRead>(reader: &mut R) -> std::io::Result<bool> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(false);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let is_array = buf[pos] == b'[';
                reader.consume(pos);
                return Ok(is_array);
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

//! JSONL activity log for session events.
//!
//! Each [`SessionEvent`] is written as a single JSON line carrying its
//! `type` tag and an RFC 3339 `timestamp`, appended through a buffered writer.

use leancup_application::ports::event_sink::{SessionEvent, SessionEventSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Activity log that appends one JSON object per event.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Open the log at the given path, appending to an existing file.
    ///
    /// Creates parent directories as needed. Returns `None` if the file
    /// cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionEventSink for JsonlEventLog {
    fn publish(&self, event: &SessionEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let record = match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.insert(
                    "timestamp".to_string(),
                    serde_json::Value::String(timestamp),
                );
                serde_json::Value::Object(map)
            }
            Ok(other) => serde_json::json!({
                "type": event.event_type(),
                "timestamp": timestamp,
                "data": other,
            }),
            Err(e) => {
                warn!(event_type = event.event_type(), "Could not serialize event: {}", e);
                return;
            }
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock()
            && let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush())
        {
            warn!("Could not append to event log {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

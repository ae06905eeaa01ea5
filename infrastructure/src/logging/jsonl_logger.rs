//! JSONL file writer for experiment events.
//!
//! Each [`ConversationEvent`] (utterance, memory entry, consensus check,
//! payout, disclosure, phase) becomes a single JSON line with a `type` field
//! and an RFC 3339 `timestamp`, appended to the file via a buffered writer.

use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;
use veil_application::{ConversationEvent, ConversationLogger};

/// Experiment logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`, so one logger can be shared by
/// every run of a batch. Every line carries a `seq` number in write order.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    seq: AtomicU64,
}

impl JsonlConversationLogger {
    /// Create (or truncate) the log file, creating parent directories
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            writer: Mutex::new(BufWriter::new(File::create(path)?)),
            path: path.to_path_buf(),
            seq: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines written so far
    pub fn lines_written(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }

    fn record(&self, event: ConversationEvent) -> Value {
        let mut record = match event.payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        record.insert("type".to_string(), Value::from(event.event_type));
        record.insert(
            "timestamp".to_string(),
            Value::from(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        );
        record.insert(
            "seq".to_string(),
            Value::from(self.seq.fetch_add(1, Ordering::Relaxed)),
        );
        Value::Object(record)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        // seq is assigned under the lock so file order matches seq order
        let record = self.record(event);
        let written = serde_json::to_writer(&mut *writer, &record)
            .map_err(io::Error::from)
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());
        if let Err(e) = written {
            warn!("Failed to write to {}: {}", self.path.display(), e);
        }
    }
}

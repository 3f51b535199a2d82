use crate::config::AppConfig;
use crate::errors::ExplorerError;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: 4096,
        }
    }

    /// `None` when the configuration leaves logging disabled.
    pub fn from_config(cfg: &AppConfig) -> Option<Self> {
        cfg.log_path().map(|path| Self {
            path,
            max_payload_bytes: cfg.logging.max_payload_bytes,
        })
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), ExplorerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ExplorerError::Io(e.to_string()))?;
        }
        let truncated = truncate_json(event.payload.clone(), self.max_payload_bytes);
        let line = serde_json::to_string(&LogEvent {
            level: event.level,
            event_type: event.event_type,
            payload: truncated,
        })
        .map_err(|e| ExplorerError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ExplorerError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| ExplorerError::Io(e.to_string()))?;
        file.write_all(b"\n")
            .map_err(|e| ExplorerError::Io(e.to_string()))?;
        Ok(())
    }

    pub fn info(&self, event_type: &str, payload: Value) -> Result<(), ExplorerError> {
        self.append(&LogEvent {
            level: "info",
            event_type,
            payload,
        })
    }
}

pub fn structured_fallback_line(event_type: &str, message: &str) -> String {
    format!(
        "event_type={event_type} message={} ",
        message.replace('\n', "\\n")
    )
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}

#[cfg(test)]
mod tests {
    use super::{structured_fallback_line, JsonlLogger, LogEvent};
    use crate::config::AppConfig;
    use serde_json::json;

    #[test]
    fn logger_truncates_large_payloads_and_writes_jsonl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("run.jsonl");
        let mut logger = JsonlLogger::new(&path);
        logger.max_payload_bytes = 20;

        logger
            .append(&LogEvent {
                level: "info",
                event_type: "search_completed",
                payload: json!({"text": "abcdefghijklmnopqrstuvwxyz"}),
            })
            .expect("append");
        logger
            .info("replay_frame", json!({"cursor": 3}))
            .expect("append");

        let text = std::fs::read_to_string(&path).expect("read");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"event_type\":\"search_completed\""));
        assert!(lines[0].contains("..."));
        assert!(lines[1].contains("\"cursor\":3"));
    }

    #[test]
    fn logger_is_disabled_by_default_config() {
        assert!(JsonlLogger::from_config(&AppConfig::default()).is_none());
        let mut cfg = AppConfig::default();
        cfg.logging.path = "/tmp/x.jsonl".to_string();
        cfg.logging.max_payload_bytes = 64;
        let logger = JsonlLogger::from_config(&cfg).expect("enabled");
        assert_eq!(logger.max_payload_bytes, 64);
    }

    #[test]
    fn fallback_line_is_deterministic() {
        let line = structured_fallback_line("search_started", "hello\nworld");
        assert_eq!(line, "event_type=search_started message=hello\\nworld ");
    }
}

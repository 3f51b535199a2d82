use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cursor {cursor} out of range for trace of {len} steps")]
    CursorOutOfRange { cursor: usize, len: usize },
    #[error("malformed trace: {0}")]
    MalformedTrace(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("recording error: {0}")]
    Recording(String),
}

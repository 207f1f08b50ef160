use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShortError {
    #[error("{0}")]
    Parse(String),
    #[error("invalid time '{0}', expected HH:MM:SS")]
    InvalidTime(String),
    #[error("window end {end} is not after start {start}")]
    InvalidWindow { start: String, end: String },
    #[error("{tool} exited with status {code:?}: {stderr}")]
    Tool {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("expected output was not produced: '{}'", .0.display())]
    NoOutput(PathBuf),
    #[error("no clips given to join")]
    NothingToJoin,
}

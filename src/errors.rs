use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing value for argument: {flag}")]
    MissingValue { flag: String },
    #[error("missing required argument: {field}")]
    MissingRequired { field: String },
    #[error("unsupported argument: {arg}")]
    UnsupportedArgument { arg: String },
    #[error("parse error: {message}")]
    ParseError { message: String },
    #[error("{text}")]
    Help { text: String },
    #[error(
        "-d argument must be full path to working directory.  Relative paths will not work. (got {path})"
    )]
    RelativeOutputDir { path: String },
    #[error("pipeline template not found: {}", path.display())]
    MissingTemplate { path: PathBuf },
    #[error("invalid configuration file {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },
    #[error("required command not found in PATH: {command}")]
    CommandNotFound { command: String },
    #[error("command failed: {command} (exit: {code:?}) stderr: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Maps a spawn failure to `CommandNotFound` when the executable is missing.
    pub fn from_spawn(command: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            AppError::CommandNotFound {
                command: command.to_string(),
            }
        } else {
            AppError::Io(err)
        }
    }
}

// src/error.rs  —  Device and settings error kinds
use std::path::PathBuf;
use thiserror::Error;

/// Everything the device session can report.  Only `TransferTimeout` is
/// benign; the scan loop turns every other variant into a reconnect.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scanner {vid:04x}:{pid:04x} not found")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("Scanner has no interrupt IN endpoint")]
    EndpointNotFound,

    #[error("Cannot open scanner: {0}")]
    Open(String),

    #[error("Transfer timeout")]
    TransferTimeout,

    #[error("USB transfer error: {0}")]
    TransferError(String),

    #[error("Scanner not connected")]
    NotConnected,
}

impl ScanError {
    pub fn is_benign(&self) -> bool { matches!(self, ScanError::TransferTimeout) }
}

/// Settings file failures.  Read/Parse are recovered with defaults, Write is
/// logged — none of them reach the user.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Reading settings {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Parsing settings {path:?}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("Writing settings {path:?}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    #[error("Encoding settings: {0}")]
    Encode(#[from] serde_json::Error),
}

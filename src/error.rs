use std::path::PathBuf;

use thiserror::Error;

use crate::role::Role;

/// Errors raised by the cue engine.
///
/// Startup failures (`AssetLoad`, `ResourceExhausted`) abort registry
/// construction. Runtime failures (`EngineShutdown`, `TransientPlayback`)
/// are swallowed by the playback controller and only logged.
#[derive(Error, Debug)]
pub enum CueError {
    #[error("Failed to load sound for role {role}: {}", path.display())]
    AssetLoad {
        role: Role,
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("Audio engine could not allocate {0}")]
    ResourceExhausted(String),

    #[error("Audio engine session has been shut down")]
    EngineShutdown,

    #[error("Cue playback failed: {0}")]
    TransientPlayback(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Failures while reading a sound file into a buffer.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to open sound file")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode audio format")]
    Decoder(#[from] rodio::decoder::DecoderError),

    #[error("Sound file contains no samples")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save settings to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Failed to create settings directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform configuration directory")]
    NoConfigDir,
}

pub type CueResult<T> = Result<T, CueError>;

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

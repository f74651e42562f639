//! Error types for the floating bubble

use thiserror::Error;

use crate::window::Surface;

/// Failures reported by the host's overlay window manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// The overlay token was rejected, usually because permission was revoked
    #[error("overlay window token rejected for {0:?}")]
    BadToken(Surface),

    #[error("surface {0:?} is not attached")]
    NotAttached(Surface),
}

impl WindowError {
    /// Whether the overlay session can not continue after this error
    pub fn is_permission_lost(&self) -> bool {
        matches!(self, WindowError::BadToken(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid menu definition: {0}")]
    InvalidMenu(String),

    #[error("invalid physics settings: {0}")]
    InvalidPhysics(String),
}

#[derive(Error, Debug)]
pub enum BubbleError {
    #[error("window manager error: {0}")]
    Window(#[from] WindowError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("event loop error: {0}")]
    EventLoop(String),
}

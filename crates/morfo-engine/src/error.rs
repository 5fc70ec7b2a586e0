//! Engine error types.

/// Errors surfaced by [`crate::Engine`] lifecycle calls.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No audio output device is available on the system.
    #[error("no audio output device available")]
    NoDevice,

    /// The requested output device was not found.
    #[error("output device not found: {0}")]
    DeviceNotFound(String),

    /// Stream construction or startup failed.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// A control call was made before a successful `init`.
    #[error("engine is not running")]
    NotRunning,
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

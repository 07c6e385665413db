//! Engine error types

use thiserror::Error;

/// Errors surfaced to the control side.
///
/// Buffer generation and parameter ramps cannot fail, so this stays small.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The output device could not be created or resumed.
    ///
    /// Reported once per failed start; nothing was built.
    #[error("audio output device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A voice key from the UI did not name any known source.
    #[error("unknown voice kind `{0}`")]
    InvalidVoiceKind(String),
}

pub type Result<T> = core::result::Result<T, EngineError>;

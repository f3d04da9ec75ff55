//! Error types for the web view bridge.

use thiserror::Error;

use crate::protocol::Opcode;
use crate::readiness::ReadinessStage;

#[derive(Error, Debug)]
pub enum WebViewError {
    /// The peer closed the channel cleanly between frames.
    #[error("channel closed by peer")]
    Disconnected,

    /// A frame carried an opcode outside the protocol vocabulary. Indicates
    /// version skew; the connection must be torn down.
    #[error("unknown opcode {0}")]
    UnknownOpcode(i16),

    /// A frame carried a known opcode that is not valid in this direction.
    #[error("unexpected {0} frame")]
    UnexpectedOpcode(Opcode),

    /// A frame's length field was not a valid payload size.
    #[error("invalid frame length {0}")]
    InvalidLength(i64),

    /// A payload did not match the shape fixed by its opcode.
    #[error("malformed {opcode} payload: {reason}")]
    MalformedPayload { opcode: Opcode, reason: String },

    /// Browser engine bring-up failed. Fatal to the engine instance; no
    /// retry, no fallback engine.
    #[error("web view engine failed at {stage} stage: {reason}")]
    EngineFailed {
        stage: ReadinessStage,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WebViewError {
    pub(crate) fn malformed(opcode: Opcode, reason: impl Into<String>) -> Self {
        WebViewError::MalformedPayload {
            opcode,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WebViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WebViewError::UnknownOpcode(99);
        assert_eq!(err.to_string(), "unknown opcode 99");

        let err = WebViewError::malformed(Opcode::Navigate, "missing terminator");
        assert!(err.to_string().contains("navigate"));
        assert!(err.to_string().contains("missing terminator"));

        let err = WebViewError::EngineFailed {
            stage: ReadinessStage::EnvironmentReady,
            reason: "runtime not installed".into(),
        };
        assert!(err.to_string().contains("environment"));
        assert!(err.to_string().contains("runtime not installed"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err = WebViewError::from(io);
        assert!(matches!(err, WebViewError::Io(_)));
    }
}

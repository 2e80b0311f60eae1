use std::time::Duration;

use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },
}

/// Errors reported by a capture device.
///
/// Only [`CaptureError::Timeout`] is recoverable: the render loop skips the
/// cycle and waits again. Every other variant is fatal.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No frame became ready within the wait budget.
    #[error("Timeout : aucune frame après {0:?}")]
    Timeout(Duration),

    /// The device could not be opened.
    #[error("Impossible d'ouvrir le périphérique {device} : {reason}")]
    Open {
        /// Device path or name.
        device: String,
        /// Backend message.
        reason: String,
    },

    /// Streaming could not be started or stopped unexpectedly.
    #[error("Erreur de stream : {0}")]
    Stream(String),

    /// A frame was announced but could not be read.
    #[error("Erreur de lecture de frame : {0}")]
    Read(String),

    /// The device was used after `close()`.
    #[error("Périphérique fermé")]
    Closed,
}

impl CaptureError {
    /// `true` for the single retried condition.
    ///
    /// # Example
    /// ```
    /// use cam_core::error::CaptureError;
    /// use std::time::Duration;
    /// assert!(CaptureError::Timeout(Duration::from_secs(5)).is_timeout());
    /// assert!(!CaptureError::Closed.is_timeout());
    /// ```
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Errors produced while turning an encoded frame into a [`crate::PixelGrid`].
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The buffer is not a valid image in the expected format.
    #[error("Frame illisible : {0}")]
    Malformed(String),

    /// The decoded image has an unusable size.
    #[error("Dimensions de frame invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeout_is_recoverable() {
        assert!(CaptureError::Timeout(Duration::from_secs(5)).is_timeout());
        assert!(!CaptureError::Closed.is_timeout());
        assert!(!CaptureError::Read("eof".into()).is_timeout());
        assert!(
            !CaptureError::Open {
                device: "/dev/video0".into(),
                reason: "denied".into(),
            }
            .is_timeout()
        );
    }

    #[test]
    fn timeout_message_mentions_wait() {
        let msg = CaptureError::Timeout(Duration::from_secs(5)).to_string();
        assert!(msg.contains("5s"), "{msg}");
    }
}

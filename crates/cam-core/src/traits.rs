use std::time::Duration;

use crate::error::{CaptureError, DecodeError};
use crate::frame::PixelGrid;

/// Périphérique de capture qui fournit des frames encodées.
///
/// L'ouverture est le constructeur du backend (ex: `FfmpegDevice::open`).
/// Implémenté par : `FfmpegDevice`.
///
/// # Example
/// ```
/// use cam_core::traits::CaptureDevice;
/// use cam_core::error::CaptureError;
/// use std::time::Duration;
///
/// struct DummyDevice;
/// impl CaptureDevice for DummyDevice {
///     fn start_streaming(&mut self) -> Result<(), CaptureError> { Ok(()) }
///     fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
///         Err(CaptureError::Timeout(timeout))
///     }
///     fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> { Err(CaptureError::Closed) }
///     fn close(&mut self) {}
/// }
/// ```
pub trait CaptureDevice {
    /// Démarre le flux. Appelé une fois, avant la première attente.
    ///
    /// # Errors
    /// Fatal: the render loop never starts.
    fn start_streaming(&mut self) -> Result<(), CaptureError>;

    /// Bloque jusqu'à ce qu'une frame soit prête, au plus `timeout`.
    ///
    /// # Errors
    /// [`CaptureError::Timeout`] if nothing arrived in time (recoverable);
    /// any other variant is fatal.
    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError>;

    /// Retourne la frame annoncée par le dernier `wait_for_frame` réussi.
    ///
    /// # Errors
    /// Fatal read failure.
    fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError>;

    /// Libère le périphérique. Doit être idempotent.
    fn close(&mut self);
}

/// Décode une frame encodée en grille de pixels.
///
/// # Example
/// ```
/// use cam_core::traits::FrameDecoder;
/// use cam_core::frame::PixelGrid;
/// use cam_core::error::DecodeError;
///
/// struct BlackDecoder;
/// impl FrameDecoder for BlackDecoder {
///     fn decode(&self, _bytes: &[u8]) -> Result<PixelGrid, DecodeError> {
///         Ok(PixelGrid::filled(40, 60, [0, 0, 0, 0xFFFF]))
///     }
/// }
/// ```
pub trait FrameDecoder {
    /// # Errors
    /// Returns [`DecodeError`] if the buffer cannot be decoded. Fatal for the loop.
    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid, DecodeError>;
}

use std::ops::{Deref, DerefMut};

use cam_core::error::CaptureError;
use cam_core::traits::CaptureDevice;

/// Session de capture : périphérique démarré, fermé au drop.
///
/// Le `close()` du périphérique est appelé sur tous les chemins de sortie,
/// y compris quand `start_streaming` échoue ou qu'une erreur fatale remonte
/// de la boucle de rendu.
///
/// # Example
/// ```
/// use cam_core::error::CaptureError;
/// use cam_core::traits::CaptureDevice;
/// use cam_source::session::DeviceSession;
/// use std::time::Duration;
///
/// struct Null;
/// impl CaptureDevice for Null {
///     fn start_streaming(&mut self) -> Result<(), CaptureError> { Ok(()) }
///     fn wait_for_frame(&mut self, t: Duration) -> Result<(), CaptureError> {
///         Err(CaptureError::Timeout(t))
///     }
///     fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> { Err(CaptureError::Closed) }
///     fn close(&mut self) {}
/// }
///
/// let mut session = DeviceSession::start(Null).unwrap();
/// assert!(session.wait_for_frame(Duration::from_millis(1)).unwrap_err().is_timeout());
/// ```
pub struct DeviceSession<D: CaptureDevice> {
    device: D,
}

impl<D: CaptureDevice> DeviceSession<D> {
    /// Start streaming on `device` and take ownership of it.
    ///
    /// # Errors
    /// Propagates the `start_streaming` error; the device is closed first.
    pub fn start(device: D) -> Result<Self, CaptureError> {
        let mut session = Self { device };
        session.device.start_streaming()?;
        Ok(session)
    }
}

impl<D: CaptureDevice> Deref for DeviceSession<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.device
    }
}

impl<D: CaptureDevice> DerefMut for DeviceSession<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: CaptureDevice> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        log::debug!("Fermeture de la session de capture");
        self.device.close();
    }
}

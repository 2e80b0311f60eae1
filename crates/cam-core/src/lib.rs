/// Configuration, types, and shared structures for camscii.
///
/// This crate contains the pixel/block data model, the glyph ramp, the
/// capture configuration and the collaborator traits implemented by the
/// capture backends.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::{GLYPH_RAMP, quantize};
pub use config::{BlockSize, CaptureConfig, ConfigOverrides};
pub use error::{CaptureError, CoreError, DecodeError};
pub use frame::{BlockMatrix, PixelGrid};
pub use traits::{CaptureDevice, FrameDecoder};

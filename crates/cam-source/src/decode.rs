use cam_core::error::DecodeError;
use cam_core::frame::PixelGrid;
use cam_core::traits::FrameDecoder;
use image::ImageFormat;

/// Décodeur JPEG (format natif des webcams en MJPEG).
///
/// Les canaux 8 bits sont élargis à 16 bits (`0xFF → 0xFFFF`), les images
/// en niveaux de gris sont répliquées sur R, G et B.
///
/// # Example
/// ```no_run
/// use cam_core::traits::FrameDecoder;
/// use cam_source::decode::JpegDecoder;
/// let bytes = std::fs::read("frame.jpg").unwrap();
/// let grid = JpegDecoder.decode(&bytes).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegDecoder;

impl FrameDecoder for JpegDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid, DecodeError> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let rgba = img.to_rgba16();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        PixelGrid::from_rgba16(width, height, rgba.as_raw())
            .map_err(|_| DecodeError::InvalidDimensions { width, height })
    }
}

/// Capture backends and frame decoding for camscii.
///
/// - `decode`  : JPEG → `PixelGrid` via the `image` crate
/// - `mjpeg`   : splits a concatenated MJPEG byte stream into frames
/// - `stream`  : reader thread + latest-frame handoff
/// - `ffmpeg`  : `CaptureDevice` backed by an `ffmpeg` subprocess
/// - `session` : scoped device session, closed on every exit path
pub mod decode;
pub mod ffmpeg;
pub mod mjpeg;
pub mod session;
pub mod stream;

pub use decode::JpegDecoder;
pub use ffmpeg::FfmpegDevice;
pub use session::DeviceSession;

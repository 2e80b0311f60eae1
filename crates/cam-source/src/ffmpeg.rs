// Capture via ffmpeg en subprocess : pas de binding V4L2/AVFoundation natif.
// Prérequis runtime : `ffmpeg` accessible dans le PATH.
//
// ffmpeg ouvre le périphérique et ré-encode en MJPEG sur stdout, quel que
// soit le format natif de la caméra (YUYV, MJPEG, NV12). Le thread de
// `FrameStream` découpe ce flux en frames JPEG. stderr est vidé en continu
// par un second thread, sinon ffmpeg bloque dès que le pipe est plein.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::thread;
use std::time::Duration;

use cam_core::config::CaptureConfig;
use cam_core::error::CaptureError;
use cam_core::traits::CaptureDevice;

use crate::stream::FrameStream;

/// Octets de stderr conservés pour le message d'erreur (les derniers).
const STDERR_TAIL: usize = 4096;

/// Webcam lue par un processus `ffmpeg`.
///
/// # Example
/// ```no_run
/// use cam_core::config::CaptureConfig;
/// use cam_core::traits::CaptureDevice;
/// use cam_source::ffmpeg::FfmpegDevice;
/// use std::time::Duration;
///
/// let mut cam = FfmpegDevice::open(&CaptureConfig::default()).unwrap();
/// cam.start_streaming().unwrap();
/// cam.wait_for_frame(Duration::from_secs(5)).unwrap();
/// let jpeg = cam.read_frame().unwrap();
/// cam.close();
/// ```
pub struct FfmpegDevice {
    program: PathBuf,
    device: PathBuf,
    input_format: String,
    child: Option<Child>,
    stream: Option<FrameStream>,
    stderr: Option<thread::JoinHandle<String>>,
}

impl FfmpegDevice {
    /// Prepare a device. Nothing is spawned until `start_streaming`.
    ///
    /// For the `v4l2` demuxer the device node must exist.
    ///
    /// # Errors
    /// [`CaptureError::Open`] if the device node is missing.
    pub fn open(config: &CaptureConfig) -> Result<Self, CaptureError> {
        if config.input_format == "v4l2" && !config.device.exists() {
            return Err(CaptureError::Open {
                device: config.device.display().to_string(),
                reason: "périphérique introuvable".to_string(),
            });
        }
        log::info!(
            "Périphérique {} ({})",
            config.device.display(),
            config.input_format
        );
        Ok(Self {
            program: config.ffmpeg.clone(),
            device: config.device.clone(),
            input_format: config.input_format.clone(),
            child: None,
            stream: None,
            stderr: None,
        })
    }

    fn stream_mut(&mut self) -> Result<&mut FrameStream, CaptureError> {
        self.stream.as_mut().ok_or(CaptureError::Closed)
    }

    /// Kill ffmpeg and collect the tail of what it wrote on stderr.
    fn reap_child(&mut self) -> Option<String> {
        let mut child = self.child.take()?;
        let _ = child.kill();
        let status = child.wait().ok();
        log::debug!("ffmpeg terminé : {status:?}");
        let tail = self.stderr.take()?.join().ok()?;
        (!tail.is_empty()).then_some(tail)
    }
}

/// Drain ffmpeg's stderr on a named thread, keeping the last
/// [`STDERR_TAIL`] bytes. The handle yields them once the pipe closes.
fn spawn_stderr_drain(
    mut pipe: ChildStderr,
) -> Result<thread::JoinHandle<String>, CaptureError> {
    thread::Builder::new()
        .name("cam-ffmpeg-stderr".to_string())
        .spawn(move || {
            let mut tail: VecDeque<u8> = VecDeque::with_capacity(STDERR_TAIL);
            let mut chunk = [0u8; 1024];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        tail.extend(&chunk[..n]);
                        let excess = tail.len().saturating_sub(STDERR_TAIL);
                        tail.drain(..excess);
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(_) => break,
                }
            }
            String::from_utf8_lossy(tail.make_contiguous())
                .trim()
                .to_string()
        })
        .map_err(|e| CaptureError::Stream(format!("thread stderr ffmpeg : {e}")))
}

/// Arguments ffmpeg : périphérique → MJPEG brut sur stdout.
#[must_use]
pub fn ffmpeg_args(device: &Path, input_format: &str) -> Vec<String> {
    let device = device.to_string_lossy();
    [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        input_format,
        "-i",
        &*device,
        "-an", // pas d'audio
        "-c:v",
        "mjpeg",
        "-pix_fmt",
        "yuvj420p",
        "-q:v",
        "5",
        "-f",
        "mjpeg",
        "pipe:1",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl CaptureDevice for FfmpegDevice {
    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let mut child = Command::new(&self.program)
            .args(ffmpeg_args(&self.device, &self.input_format))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CaptureError::Stream(format!(
                    "impossible de lancer {} ({e}). Vérifiez que ffmpeg est installé et dans le PATH.",
                    self.program.display()
                ))
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CaptureError::Stream("pipes ffmpeg indisponibles".to_string()));
        };
        self.child = Some(child);
        match spawn_stderr_drain(stderr) {
            Ok(handle) => self.stderr = Some(handle),
            Err(e) => {
                self.reap_child();
                return Err(e);
            }
        }

        match FrameStream::spawn(stdout) {
            Ok(stream) => {
                self.stream = Some(stream);
                log::info!("ffmpeg démarré sur {}", self.device.display());
                Ok(())
            }
            Err(e) => {
                self.reap_child();
                Err(e)
            }
        }
    }

    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        let result = self.stream_mut()?.wait(timeout);
        match result {
            Err(CaptureError::Stream(msg)) => {
                let detail = self.reap_child().unwrap_or_default();
                Err(CaptureError::Stream(format!("{msg} {detail}").trim().to_string()))
            }
            other => other,
        }
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.stream_mut()?.take()
    }

    fn close(&mut self) {
        let had_child = self.child.is_some();
        self.reap_child();
        if let Some(mut stream) = self.stream.take() {
            stream.join();
        }
        if had_child {
            log::info!("Périphérique {} fermé", self.device.display());
        }
    }
}

impl Drop for FfmpegDevice {
    fn drop(&mut self) {
        self.close();
    }
}

use std::io::Read;
use std::thread;
use std::time::Duration;

use cam_core::error::CaptureError;
use flume::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::mjpeg::MjpegSplitter;

/// Capacité du canal reader → boucle de rendu.
/// Au-delà, le reader jette la frame la plus récente plutôt que de bloquer.
const CHANNEL_CAPACITY: usize = 2;

const READ_CHUNK: usize = 64 * 1024;

/// Flux de frames MJPEG lu par un thread dédié.
///
/// `wait` bloque au plus `timeout` puis garde la frame la plus récente ;
/// les frames plus anciennes encore dans le canal sont jetées.
pub struct FrameStream {
    frames: Receiver<Vec<u8>>,
    reader: Option<thread::JoinHandle<()>>,
    pending: Option<Vec<u8>>,
}

impl FrameStream {
    /// Spawn the reader thread over any byte source.
    ///
    /// # Errors
    /// [`CaptureError::Stream`] if the thread cannot be spawned.
    pub fn spawn<R: Read + Send + 'static>(source: R) -> Result<Self, CaptureError> {
        let (tx, rx) = flume::bounded(CHANNEL_CAPACITY);
        let reader = thread::Builder::new()
            .name("cam-capture".to_string())
            .spawn(move || reader_loop(source, &tx))
            .map_err(|e| CaptureError::Stream(format!("thread de capture : {e}")))?;
        Ok(Self {
            frames: rx,
            reader: Some(reader),
            pending: None,
        })
    }

    /// Block until a frame is ready, at most `timeout`.
    ///
    /// # Errors
    /// [`CaptureError::Timeout`] if nothing arrived, [`CaptureError::Stream`]
    /// once the reader has stopped and the channel is drained.
    pub fn wait(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        if self.pending.is_some() {
            return Ok(());
        }
        match self.frames.recv_timeout(timeout) {
            Ok(frame) => {
                let latest = self.frames.try_iter().last().unwrap_or(frame);
                self.pending = Some(latest);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::Stream(
                "le flux de capture s'est arrêté".to_string(),
            )),
        }
    }

    /// Take the frame announced by the last successful [`Self::wait`].
    ///
    /// # Errors
    /// [`CaptureError::Read`] if no frame is pending.
    pub fn take(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.pending
            .take()
            .ok_or_else(|| CaptureError::Read("aucune frame en attente".to_string()))
    }

    /// Wait for the reader thread to finish. The byte source must already be
    /// closed (child killed), otherwise this blocks.
    pub fn join(&mut self) {
        if let Some(handle) = self.reader.take()
            && handle.join().is_err()
        {
            log::warn!("cam-capture: le thread reader a paniqué");
        }
    }
}

fn reader_loop<R: Read>(mut source: R, tx: &Sender<Vec<u8>>) {
    let mut splitter = MjpegSplitter::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut sent = 0u64;
    let mut dropped = 0u64;

    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => {
                log::info!(
                    "cam-capture: EOF après {sent} frames ({dropped} jetées, {} octets incomplets)",
                    splitter.buffered()
                );
                return;
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("cam-capture: erreur lecture pipe : {e}");
                return;
            }
        };
        splitter.push(&chunk[..n]);

        while let Some(frame) = splitter.next_frame() {
            match tx.try_send(frame) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    log::trace!("cam-capture: canal plein, frame jetée");
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

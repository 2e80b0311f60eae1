use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cam_ascii::downsample::downsample;
use cam_core::config::{BlockSize, CaptureConfig};
use cam_core::error::CaptureError;
use cam_core::traits::{CaptureDevice, FrameDecoder};
use cam_source::session::DeviceSession;

use crate::terminal::Terminal;

/// Délai pendant lequel une erreur de capture peut encore être attribuée à
/// un Ctrl+C : le SIGINT atteint ffmpeg en même temps que le handler.
const STOP_GRACE: Duration = Duration::from_millis(250);

/// Issue d'un cycle de la boucle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cycle {
    /// Une frame a été affichée (dimensions de la matrice).
    Rendered { columns: usize, rows: usize },
    /// Aucune frame dans le délai : diagnostic émis, rien d'affiché.
    TimedOut,
}

/// Boucle acquisition → décodage → moyenne par blocs → rendu.
///
/// Un timeout d'acquisition est signalé sur `diagnostics` puis le cycle
/// reprend. Toute autre erreur termine la boucle ; la session est fermée
/// quand la boucle est détruite.
pub struct RenderLoop<D, C, W, E>
where
    D: CaptureDevice,
    C: FrameDecoder,
    W: Write,
    E: Write,
{
    session: DeviceSession<D>,
    decoder: C,
    block: BlockSize,
    wait: Duration,
    terminal: Terminal<W>,
    diagnostics: E,
    rendered: u64,
    timeouts: u64,
}

impl<D, C, W, E> RenderLoop<D, C, W, E>
where
    D: CaptureDevice,
    C: FrameDecoder,
    W: Write,
    E: Write,
{
    #[must_use]
    pub fn new(
        session: DeviceSession<D>,
        decoder: C,
        config: &CaptureConfig,
        out: W,
        diagnostics: E,
    ) -> Self {
        Self {
            session,
            decoder,
            block: config.block,
            wait: config.wait,
            terminal: Terminal::new(out),
            diagnostics,
            rendered: 0,
            timeouts: 0,
        }
    }

    /// Run one cycle.
    ///
    /// # Errors
    /// Any capture error other than a timeout, a decode error, or a write
    /// error on the output.
    pub fn step(&mut self) -> Result<Cycle> {
        if let Err(e) = self.session.wait_for_frame(self.wait) {
            if !e.is_timeout() {
                return Err(e).context("Échec de l'acquisition");
            }
            self.timeouts += 1;
            log::debug!("Timeout #{} : {e}", self.timeouts);
            writeln!(self.diagnostics, "{e}").context("Écriture du diagnostic")?;
            return Ok(Cycle::TimedOut);
        }

        let bytes = self
            .session
            .read_frame()
            .context("Lecture de la frame")?;
        let grid = self
            .decoder
            .decode(&bytes)
            .context("Décodage de la frame")?;
        drop(bytes);

        let matrix = downsample(&grid, self.block);
        self.terminal
            .present(&matrix)
            .context("Écriture sur le terminal")?;

        self.rendered += 1;
        log::trace!(
            "Frame {} : {}x{} px → {}x{} glyphes",
            self.rendered,
            grid.width(),
            grid.height(),
            matrix.columns(),
            matrix.rows()
        );
        Ok(Cycle::Rendered {
            columns: matrix.columns(),
            rows: matrix.rows(),
        })
    }

    /// Cycle until `stop` is raised or a fatal error occurs.
    ///
    /// A capture error followed by `stop` within [`STOP_GRACE`] ends the
    /// loop cleanly: ffmpeg may see the Ctrl+C before the handler runs.
    ///
    /// # Errors
    /// The first fatal error from [`Self::step`].
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Relaxed) {
            match self.step() {
                Ok(_) => {}
                Err(e) if e.downcast_ref::<CaptureError>().is_some() && stop_follows(stop) => {
                    log::debug!("Erreur ignorée après arrêt : {e:#}");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        log::info!(
            "Arrêt : {} frames affichées, {} timeouts",
            self.rendered,
            self.timeouts
        );
        Ok(())
    }

    /// Close the session and give back both writers.
    #[cfg(test)]
    fn into_writers(self) -> (W, E) {
        let Self {
            session,
            terminal,
            diagnostics,
            ..
        } = self;
        drop(session);
        (terminal.into_inner(), diagnostics)
    }
}

/// `true` if `stop` is raised now or within [`STOP_GRACE`].
fn stop_follows(stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + STOP_GRACE;
    loop {
        if stop.load(Ordering::Relaxed) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cam_core::error::DecodeError;
    use cam_core::frame::PixelGrid;
    use cam_source::decode::JpegDecoder;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::sync::Arc;

    const CLEAR: &str = "\x1b[2J";

    enum Event {
        Frame(Vec<u8>),
        Timeout,
        Fail,
        /// Stream ends, the stop flag follows shortly after (Ctrl+C race).
        EndThenStop,
    }

    /// Scripted device. Once the script runs out it raises `stop` (if any)
    /// and times out.
    struct Scripted {
        events: VecDeque<Event>,
        pending: Option<Vec<u8>>,
        closed: Rc<Cell<u32>>,
        stop: Option<Arc<AtomicBool>>,
    }

    impl Scripted {
        fn new(events: Vec<Event>, closed: &Rc<Cell<u32>>) -> Self {
            Self {
                events: events.into(),
                pending: None,
                closed: Rc::clone(closed),
                stop: None,
            }
        }
    }

    impl CaptureDevice for Scripted {
        fn start_streaming(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
        fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
            match self.events.pop_front() {
                Some(Event::Frame(bytes)) => {
                    self.pending = Some(bytes);
                    Ok(())
                }
                Some(Event::Timeout) => Err(CaptureError::Timeout(timeout)),
                Some(Event::Fail) => Err(CaptureError::Read("périphérique débranché".into())),
                Some(Event::EndThenStop) => {
                    if let Some(stop) = &self.stop {
                        let stop = Arc::clone(stop);
                        thread::spawn(move || {
                            thread::sleep(Duration::from_millis(30));
                            stop.store(true, Ordering::Relaxed);
                        });
                    }
                    Err(CaptureError::Stream("le flux de capture s'est arrêté".into()))
                }
                None => {
                    if let Some(stop) = &self.stop {
                        stop.store(true, Ordering::Relaxed);
                    }
                    Err(CaptureError::Timeout(timeout))
                }
            }
        }
        fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
            self.pending.take().ok_or(CaptureError::Closed)
        }
        fn close(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    /// Frame bytes `[width, height, level]` → uniform grid.
    struct Uniform;

    impl FrameDecoder for Uniform {
        fn decode(&self, bytes: &[u8]) -> Result<PixelGrid, DecodeError> {
            match *bytes {
                [w, h, level] => Ok(PixelGrid::filled(
                    u32::from(w),
                    u32::from(h),
                    [u16::from(level) * 257; 4],
                )),
                _ => Err(DecodeError::Malformed("frame de test invalide".into())),
            }
        }
    }

    fn config(cx: i64, cy: i64) -> CaptureConfig {
        CaptureConfig {
            block: BlockSize::new(cx, cy).unwrap(),
            wait: Duration::from_millis(5),
            ..CaptureConfig::default()
        }
    }

    fn render_loop(
        events: Vec<Event>,
        closed: &Rc<Cell<u32>>,
    ) -> RenderLoop<Scripted, Uniform, Vec<u8>, Vec<u8>> {
        let session = DeviceSession::start(Scripted::new(events, closed)).unwrap();
        RenderLoop::new(session, Uniform, &config(20, 30), Vec::new(), Vec::new())
    }

    /// Text printed after the last clear sequence.
    fn last_frame(out: &[u8]) -> String {
        let text = String::from_utf8(out.to_vec()).unwrap();
        let at = text.rfind(CLEAR).unwrap();
        text[at + CLEAR.len()..].to_string()
    }

    #[test]
    fn black_frame_renders_blank_lines() {
        let closed = Rc::new(Cell::new(0));
        let mut lp = render_loop(vec![Event::Frame(vec![40, 60, 0])], &closed);
        assert_eq!(
            lp.step().unwrap(),
            Cycle::Rendered {
                columns: 2,
                rows: 2
            }
        );
        let (out, diag) = lp.into_writers();
        assert_eq!(last_frame(&out), "  \n  \n");
        assert!(diag.is_empty());
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn white_frame_renders_densest_glyph() {
        let closed = Rc::new(Cell::new(0));
        let mut lp = render_loop(vec![Event::Frame(vec![40, 60, 255])], &closed);
        lp.step().unwrap();
        let (out, _) = lp.into_writers();
        assert_eq!(last_frame(&out), "$$\n$$\n");
    }

    #[test]
    fn trailing_pixels_are_dropped() {
        let closed = Rc::new(Cell::new(0));
        let mut lp = render_loop(vec![Event::Frame(vec![45, 65, 255])], &closed);
        assert_eq!(
            lp.step().unwrap(),
            Cycle::Rendered {
                columns: 2,
                rows: 2
            }
        );
    }

    #[test]
    fn frame_smaller_than_a_block_renders_nothing() {
        let closed = Rc::new(Cell::new(0));
        let mut lp = render_loop(vec![Event::Frame(vec![10, 10, 255])], &closed);
        assert_eq!(
            lp.step().unwrap(),
            Cycle::Rendered {
                columns: 0,
                rows: 0
            }
        );
        let (out, _) = lp.into_writers();
        assert_eq!(last_frame(&out), "");
    }

    #[test]
    fn timeouts_are_reported_and_retried() {
        let closed = Rc::new(Cell::new(0));
        let mut lp = render_loop(
            vec![
                Event::Timeout,
                Event::Timeout,
                Event::Timeout,
                Event::Frame(vec![40, 60, 255]),
            ],
            &closed,
        );
        for _ in 0..3 {
            assert_eq!(lp.step().unwrap(), Cycle::TimedOut);
        }
        assert!(matches!(lp.step().unwrap(), Cycle::Rendered { .. }));
        let (out, diag) = lp.into_writers();
        let diag = String::from_utf8(diag).unwrap();
        assert_eq!(diag.lines().count(), 3, "{diag}");
        assert_eq!(String::from_utf8(out).unwrap().matches(CLEAR).count(), 1);
    }

    #[test]
    fn timeouts_alone_print_nothing() {
        let closed = Rc::new(Cell::new(0));
        let mut lp = render_loop(vec![Event::Timeout, Event::Timeout], &closed);
        lp.step().unwrap();
        lp.step().unwrap();
        let (out, diag) = lp.into_writers();
        assert!(out.is_empty());
        assert_eq!(diag.iter().filter(|&&b| b == b'\n').count(), 2);
    }

    #[test]
    fn capture_failure_is_fatal_and_closes() {
        let closed = Rc::new(Cell::new(0));
        let stop = AtomicBool::new(false);
        let mut lp = render_loop(
            vec![Event::Frame(vec![40, 60, 0]), Event::Fail],
            &closed,
        );
        let err = lp.run(&stop).unwrap_err();
        assert!(format!("{err:#}").contains("débranché"), "{err:#}");
        drop(lp);
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn decode_failure_is_fatal() {
        let closed = Rc::new(Cell::new(0));
        let mut lp = render_loop(vec![Event::Frame(vec![1, 2])], &closed);
        let err = lp.step().unwrap_err();
        assert!(err.downcast_ref::<DecodeError>().is_some(), "{err:#}");
    }

    #[test]
    fn run_stops_when_flag_is_raised() {
        let closed = Rc::new(Cell::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let mut device = Scripted::new(
            vec![
                Event::Frame(vec![40, 60, 0]),
                Event::Timeout,
                Event::Frame(vec![40, 60, 255]),
            ],
            &closed,
        );
        device.stop = Some(Arc::clone(&stop));
        let session = DeviceSession::start(device).unwrap();
        let mut lp = RenderLoop::new(session, Uniform, &config(20, 30), Vec::new(), Vec::new());
        lp.run(&stop).unwrap();
        let (out, diag) = lp.into_writers();
        assert_eq!(String::from_utf8(out.clone()).unwrap().matches(CLEAR).count(), 2);
        assert_eq!(last_frame(&out), "$$\n$$\n");
        // Le timeout scripté plus celui qui lève le drapeau.
        assert_eq!(String::from_utf8(diag).unwrap().lines().count(), 2);
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn stream_end_just_before_stop_is_a_clean_exit() {
        let closed = Rc::new(Cell::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let mut device = Scripted::new(
            vec![Event::Frame(vec![40, 60, 0]), Event::EndThenStop],
            &closed,
        );
        device.stop = Some(Arc::clone(&stop));
        let session = DeviceSession::start(device).unwrap();
        let mut lp = RenderLoop::new(session, Uniform, &config(20, 30), Vec::new(), Vec::new());
        lp.run(&stop).unwrap();
        assert!(stop.load(Ordering::Relaxed));
        drop(lp);
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn jpeg_frames_end_to_end() {
        use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
        use std::io::Cursor;

        let jpeg = |level: u8| {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 60, Rgb([level; 3])));
            let mut bytes = Vec::new();
            img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
                .unwrap();
            bytes
        };
        let closed = Rc::new(Cell::new(0));
        let session = DeviceSession::start(Scripted::new(
            vec![Event::Frame(jpeg(0))],
            &closed,
        ))
        .unwrap();
        let mut lp = RenderLoop::new(session, JpegDecoder, &config(20, 30), Vec::new(), Vec::new());

        lp.step().unwrap();
        let (out, _) = lp.into_writers();
        assert_eq!(last_frame(&out), "  \n  \n");

        let session = DeviceSession::start(Scripted::new(
            vec![Event::Frame(jpeg(255))],
            &closed,
        ))
        .unwrap();
        let mut lp = RenderLoop::new(session, JpegDecoder, &config(20, 30), Vec::new(), Vec::new());
        lp.step().unwrap();
        let (out, _) = lp.into_writers();
        assert_eq!(last_frame(&out), "$$\n$$\n");
        assert_eq!(closed.get(), 2);
    }
}

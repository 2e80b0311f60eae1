/// Start Of Image.
const SOI: [u8; 2] = [0xFF, 0xD8];
/// End Of Image.
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Taille maximale d'une frame en cours d'assemblage avant abandon.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Découpe un flux MJPEG (JPEG concaténés) en frames complètes.
///
/// Une frame va d'un marqueur SOI au premier EOI qui suit. Dans les
/// données entropiques JPEG, `0xFF` est toujours suivi de `0x00`, donc
/// `FF D9` ne peut apparaître qu'en fin d'image. Les octets avant un SOI
/// sont ignorés.
///
/// # Example
/// ```
/// use cam_source::mjpeg::MjpegSplitter;
/// let mut s = MjpegSplitter::new();
/// s.push(&[0x00, 0xFF, 0xD8, 1, 2]);
/// assert!(s.next_frame().is_none());
/// s.push(&[3, 0xFF, 0xD9, 0xFF]);
/// assert_eq!(s.next_frame().unwrap(), vec![0xFF, 0xD8, 1, 2, 3, 0xFF, 0xD9]);
/// assert!(s.next_frame().is_none());
/// ```
pub struct MjpegSplitter {
    buf: Vec<u8>,
    /// Position from which to resume the EOI search.
    scan_from: usize,
    max_frame: usize,
}

impl MjpegSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_FRAME_BYTES)
    }

    /// Splitter that drops any frame growing past `max_frame` bytes.
    #[must_use]
    pub fn with_limit(max_frame: usize) -> Self {
        Self {
            buf: Vec::with_capacity(256 * 1024),
            scan_from: 0,
            max_frame,
        }
    }

    /// Append bytes read from the stream.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes currently buffered (partial frame or garbage tail).
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            if !self.align_to_soi() {
                return None;
            }

            let start = self.scan_from.max(SOI.len());
            if let Some(pos) = find(&self.buf[start..], EOI) {
                let end = start + pos + EOI.len();
                let frame: Vec<u8> = self.buf.drain(..end).collect();
                self.scan_from = 0;
                return Some(frame);
            }

            if self.buf.len() > self.max_frame {
                log::warn!(
                    "mjpeg: frame de plus de {} octets sans EOI, abandon",
                    self.max_frame
                );
                // Skip this SOI and look for the next one.
                self.buf.drain(..SOI.len());
                self.scan_from = 0;
                continue;
            }

            // Keep the last byte in the next scan: it may be the 0xFF of a
            // split EOI marker.
            self.scan_from = self.buf.len().saturating_sub(1).max(SOI.len());
            return None;
        }
    }

    /// Drop everything before the first SOI. Returns `false` if there is
    /// none yet; a trailing lone `0xFF` is kept as a possible marker start.
    fn align_to_soi(&mut self) -> bool {
        match find(&self.buf, SOI) {
            Some(0) => true,
            Some(pos) => {
                self.buf.drain(..pos);
                self.scan_from = 0;
                true
            }
            None => {
                let keep = usize::from(self.buf.last() == Some(&0xFF));
                let cut = self.buf.len() - keep;
                self.buf.drain(..cut);
                self.scan_from = 0;
                false
            }
        }
    }
}

impl Default for MjpegSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn find(haystack: &[u8], marker: [u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|w| w == marker)
}

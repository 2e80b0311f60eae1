use std::io::{self, Write};

use cam_ascii::text::write_matrix;
use cam_core::frame::BlockMatrix;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

/// Sortie texte : efface l'écran puis écrit une matrice par cycle.
///
/// Pas de mode raw ni d'écran alternatif : la sortie reste un flux de
/// lignes, redirigeable vers un fichier.
pub struct Terminal<W: Write> {
    out: W,
}

impl<W: Write> Terminal<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Clear the screen, home the cursor and print `matrix`, then flush.
    ///
    /// # Errors
    /// Propagates I/O errors from the underlying writer.
    pub fn present(&mut self, matrix: &BlockMatrix) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        write_matrix(&mut self.out, matrix)?;
        self.out.flush()
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAR: &str = "\x1b[2J";

    fn frame_text(bytes: &[u8]) -> &str {
        let text = std::str::from_utf8(bytes).unwrap();
        let at = text.find(CLEAR).unwrap();
        &text[at + CLEAR.len()..]
    }

    #[test]
    fn clears_before_each_frame() {
        let mut m = BlockMatrix::new(2, 1);
        m.set(1, 0, 255.0);
        let mut term = Terminal::new(Vec::new());
        term.present(&m).unwrap();
        term.present(&m).unwrap();
        let out = String::from_utf8(term.into_inner()).unwrap();
        assert_eq!(out.matches(CLEAR).count(), 2);
        assert!(out.ends_with(" $\n"));
    }

    #[test]
    fn cursor_is_homed_before_clearing() {
        let mut term = Terminal::new(Vec::new());
        term.present(&BlockMatrix::new(1, 1)).unwrap();
        let out = term.into_inner();
        let text = std::str::from_utf8(&out).unwrap();
        assert!(text.starts_with("\x1b[1;1H"), "{text:?}");
        assert_eq!(frame_text(&out), " \n");
    }

    #[test]
    fn empty_matrix_still_clears() {
        let mut term = Terminal::new(Vec::new());
        term.present(&BlockMatrix::new(0, 0)).unwrap();
        assert_eq!(frame_text(&term.into_inner()), "");
    }
}

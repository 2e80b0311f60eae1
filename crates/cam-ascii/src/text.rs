use std::io::{self, Write};

use cam_core::charset::quantize;
use cam_core::frame::BlockMatrix;

/// Convertit une matrice en lignes de glyphes, de haut en bas.
///
/// Boucle extérieure sur l'index vertical, intérieure sur l'index
/// horizontal : l'orientation affichée est celle de la caméra.
///
/// # Example
/// ```
/// use cam_core::frame::BlockMatrix;
/// use cam_ascii::text::render_lines;
/// let mut m = BlockMatrix::new(3, 1);
/// m.set(2, 0, 255.0);
/// assert_eq!(render_lines(&m), vec!["  $".to_string()]);
/// ```
#[must_use]
pub fn render_lines(matrix: &BlockMatrix) -> Vec<String> {
    matrix
        .iter_rows()
        .map(|row| row.iter().map(|&shade| quantize(shade)).collect())
        .collect()
}

/// Écrit la matrice, une ligne terminée par `\n` par index vertical.
///
/// N'efface pas l'écran et ne flush pas : c'est le rôle du terminal.
///
/// # Errors
/// Propagates I/O errors from `out`.
///
/// # Example
/// ```
/// use cam_core::frame::BlockMatrix;
/// use cam_ascii::text::write_matrix;
/// let m = BlockMatrix::new(2, 2);
/// let mut out = Vec::new();
/// write_matrix(&mut out, &m).unwrap();
/// assert_eq!(out, b"  \n  \n");
/// ```
pub fn write_matrix<W: Write>(out: &mut W, matrix: &BlockMatrix) -> io::Result<()> {
    let mut line = String::with_capacity(matrix.columns() + 1);
    for row in matrix.iter_rows() {
        line.clear();
        line.extend(row.iter().map(|&shade| quantize(shade)));
        line.push('\n');
        out.write_all(line.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_match_write_output() {
        let mut m = BlockMatrix::new(4, 3);
        for row in 0..3 {
            for col in 0..4 {
                m.set(col, row, (row * 4 + col) as f64 * 20.0);
            }
        }
        let mut out = Vec::new();
        write_matrix(&mut out, &m).unwrap();
        let joined: String = render_lines(&m).iter().map(|l| format!("{l}\n")).collect();
        assert_eq!(String::from_utf8(out).unwrap(), joined);
    }

    #[test]
    fn horizontal_index_is_inner() {
        // Two columns, three rows: a bright block top-right must print at the
        // end of the first line.
        let mut m = BlockMatrix::new(2, 3);
        m.set(1, 0, 255.0);
        let lines = render_lines(&m);
        assert_eq!(lines, vec![" $", "  ", "  "]);
    }

    #[test]
    fn empty_matrix_writes_nothing() {
        let mut out = Vec::new();
        write_matrix(&mut out, &BlockMatrix::new(0, 0)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn boundary_shade_never_panics() {
        let mut m = BlockMatrix::new(1, 1);
        m.set(0, 0, 255.0);
        assert_eq!(render_lines(&m), vec!["$"]);
    }
}

use cam_core::config::BlockSize;
use cam_core::frame::{BlockMatrix, PixelGrid};

use crate::luminance::luma;

/// Réduit une grille de pixels en matrice de luma moyenne par bloc.
///
/// La matrice a `floor(width / block.width())` colonnes et
/// `floor(height / block.height())` lignes. Les bandes partielles à droite
/// et en bas sont ignorées : pas de padding, pas de moyenne sur bloc
/// incomplet. Chaque pixel couvert est lu exactement une fois.
///
/// # Example
/// ```
/// use cam_core::config::BlockSize;
/// use cam_core::frame::PixelGrid;
/// use cam_ascii::downsample::downsample;
///
/// let grid = PixelGrid::filled(45, 61, [0, 0, 0, 0xFFFF]);
/// let m = downsample(&grid, BlockSize::new(20, 30).unwrap());
/// assert_eq!((m.columns(), m.rows()), (2, 2));
/// ```
#[must_use]
pub fn downsample(grid: &PixelGrid, block: BlockSize) -> BlockMatrix {
    let bw = block.width() as usize;
    let bh = block.height() as usize;
    let columns = grid.width() as usize / bw;
    let rows = grid.height() as usize / bh;

    let mut matrix = BlockMatrix::new(columns, rows);
    if matrix.is_empty() {
        log::trace!(
            "downsample: grille {}x{} plus petite qu'un bloc {bw}x{bh}",
            grid.width(),
            grid.height()
        );
        return matrix;
    }

    let area = block.area() as f64;
    let covered = columns * bw;
    let mut sums = vec![0.0f64; columns];

    for row in 0..rows {
        sums.fill(0.0);
        // Walk the block's pixel rows once, spreading each line across the
        // block columns it crosses.
        for y in row * bh..(row + 1) * bh {
            let line = &grid.row(y as u32)[..covered];
            for (sum, chunk) in sums.iter_mut().zip(line.chunks_exact(bw)) {
                *sum += chunk.iter().map(|&s| luma(s)).sum::<f64>();
            }
        }
        for (column, sum) in sums.iter().enumerate() {
            matrix.set(column, row, sum / area);
        }
    }

    matrix
}

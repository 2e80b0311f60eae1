use crate::error::CoreError;

/// Grille de pixels décodée. Une par cycle, lecture seule en aval.
///
/// Stocke les échantillons en row-major, `[r, g, b, a]` sur 16 bits.
/// Le canal alpha est conservé mais ignoré par le rendu.
///
/// # Example
/// ```
/// use cam_core::frame::PixelGrid;
/// let grid = PixelGrid::filled(4, 2, [0xFFFF, 0, 0, 0xFFFF]);
/// assert_eq!(grid.sample(3, 1), [0xFFFF, 0, 0, 0xFFFF]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    samples: Vec<[u16; 4]>,
}

impl PixelGrid {
    /// Build a grid from row-major samples.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `samples.len()` is not
    /// `width * height`.
    pub fn from_samples(width: u32, height: u32, samples: Vec<[u16; 4]>) -> Result<Self, CoreError> {
        if samples.len() != width as usize * height as usize {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a grid from interleaved RGBA 16-bit channels, as produced by
    /// `image::DynamicImage::to_rgba16().into_raw()`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the buffer length does not
    /// match `width * height * 4`.
    ///
    /// # Example
    /// ```
    /// use cam_core::frame::PixelGrid;
    /// let grid = PixelGrid::from_rgba16(1, 1, &[1, 2, 3, 4]).unwrap();
    /// assert_eq!(grid.sample(0, 0), [1, 2, 3, 4]);
    /// ```
    pub fn from_rgba16(width: u32, height: u32, raw: &[u16]) -> Result<Self, CoreError> {
        if raw.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        let samples = raw
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Uniform grid, mostly for tests and benches.
    #[must_use]
    pub fn filled(width: u32, height: u32, sample: [u16; 4]) -> Self {
        Self {
            width,
            height,
            samples: vec![sample; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Échantillon au pixel (x, y).
    #[inline(always)]
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> [u16; 4] {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.samples[y as usize * self.width as usize + x as usize]
    }

    /// One row of samples.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u32) -> &[[u16; 4]] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.samples[start..start + w]
    }
}

/// Matrice de luminance moyenne par bloc, valeurs dans [0, 255].
///
/// `columns` blocs horizontalement, `rows` verticalement, stockés ligne par
/// ligne : l'index vertical est l'axe extérieur, comme à l'affichage.
///
/// # Example
/// ```
/// use cam_core::frame::BlockMatrix;
/// let mut m = BlockMatrix::new(3, 2);
/// m.set(2, 1, 128.0);
/// assert_eq!(m.get(2, 1), 128.0);
/// assert_eq!(m.row(1), &[0.0, 0.0, 128.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMatrix {
    columns: usize,
    rows: usize,
    cells: Vec<f64>,
}

impl BlockMatrix {
    /// Matrice remplie de zéros.
    #[must_use]
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![0.0; columns * rows],
        }
    }

    /// Number of horizontal blocks.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of vertical blocks.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// `true` when the grid was smaller than one block in either axis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    #[must_use]
    pub fn get(&self, column: usize, row: usize) -> f64 {
        self.cells[row * self.columns + column]
    }

    #[inline(always)]
    pub fn set(&mut self, column: usize, row: usize, shade: f64) {
        self.cells[row * self.columns + column] = shade;
    }

    /// Blocks of one printed line, left to right.
    #[inline]
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.columns;
        &self.cells[start..start + self.columns]
    }

    /// Iterate printed lines, top to bottom. An empty matrix has no lines,
    /// even when one of its dimensions is non-zero.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        let rows = if self.is_empty() { 0 } else { self.rows };
        (0..rows).map(move |row| self.row(row))
    }
}

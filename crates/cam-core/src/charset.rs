/// 28 caractères, du plus sombre au plus clair.
pub const GLYPH_RAMP: &str = " .:!i><~+_-?][}{1)(/0*#&8%@$";

/// Même rampe, indexable en O(1).
const GLYPHS: [char; 28] = [
    ' ', '.', ':', '!', 'i', '>', '<', '~', '+', '_', '-', '?', ']', '[', '}', '{', '1', ')', '(',
    '/', '0', '*', '#', '&', '8', '%', '@', '$',
];

/// Width of one brightness band in [0, 255].
const BAND: f64 = 255.0 / GLYPHS.len() as f64;

/// Index of the glyph for a brightness value.
///
/// `floor(shade / (255 / L))` with `L = 28`, clamped to the ramp. A shade of exactly
/// 255.0 would land one past the end and maps to the last glyph instead.
/// Negative and NaN shades map to index 0.
///
/// # Example
/// ```
/// use cam_core::charset::glyph_index;
/// assert_eq!(glyph_index(0.0), 0);
/// assert_eq!(glyph_index(255.0), 27);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_index(shade: f64) -> usize {
    // `as usize` saturates: NaN and negatives become 0.
    let idx = (shade / BAND).floor() as usize;
    idx.min(GLYPHS.len() - 1)
}

/// Map a block brightness [0, 255] to its glyph.
///
/// # Example
/// ```
/// use cam_core::charset::quantize;
/// assert_eq!(quantize(0.0), ' ');
/// assert_eq!(quantize(255.0), '$');
/// ```
#[inline(always)]
#[must_use]
pub fn quantize(shade: f64) -> char {
    GLYPHS[glyph_index(shade)]
}

/// Pondération perceptuelle BT.601.
const WEIGHT_R: f64 = 0.299;
const WEIGHT_G: f64 = 0.587;
const WEIGHT_B: f64 = 0.114;

/// Ramène la plage native 16 bits vers [0, 255].
const RESCALE: f64 = 255.0 / 65535.0;

/// Luma d'un échantillon 16 bits, dans [0, 255].
///
/// `(0.299·R + 0.587·G + 0.114·B) · 255/65535`, calculé sur la plage native
/// puis remis à l'échelle. Le quatrième canal est ignoré.
///
/// # Example
/// ```
/// use cam_ascii::luminance::luma;
/// assert_eq!(luma([0, 0, 0, 0xFFFF]), 0.0);
/// assert!((luma([0xFFFF, 0xFFFF, 0xFFFF, 0]) - 255.0).abs() < 1e-9);
/// ```
#[inline(always)]
#[must_use]
pub fn luma(sample: [u16; 4]) -> f64 {
    let [r, g, b, _] = sample;
    let shade = WEIGHT_R * f64::from(r) + WEIGHT_G * f64::from(g) + WEIGHT_B * f64::from(b);
    shade * RESCALE
}

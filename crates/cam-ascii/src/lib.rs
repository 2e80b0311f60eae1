/// ASCII conversion engine for camscii.
///
/// Turns a decoded pixel grid into a block matrix of mean luma, then into
/// lines of glyphs.
pub mod downsample;
pub mod luminance;
pub mod text;

pub use downsample::downsample;
pub use luminance::luma;
pub use text::{render_lines, write_matrix};

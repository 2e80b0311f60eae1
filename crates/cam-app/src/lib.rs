/// camscii application layer: command line, terminal output and the
/// acquire → decode → downsample → print loop.
pub mod cli;
pub mod render_loop;
pub mod terminal;

//! Snapshot renderers for Karel worlds.

mod ascii;
mod png;

pub use ascii::{AsciiRenderer, agent_glyph, render_world};
pub use png::{DEFAULT_CELL_PX, MAX_CELL_PX, MIN_CELL_PX, PngRenderer, render_png};

//! Report generation modules.
//!
//! Chart rendering, namespace colours and summary tables.

pub mod chart;
pub mod palette;
pub mod table;

pub use chart::{render_bar_grid, render_figure};
pub use palette::Palette;

//! Static comparison figures.
//!
//! Derived series and views build a backend-independent [`Figure`]; the
//! `raster` submodule draws it with `plotters`.

mod comparison;
mod derived;
mod figure;
mod raster;
mod view;

pub use comparison::*;
pub use derived::*;
pub use figure::*;
pub use raster::{DEFAULT_FIGURE_SIZE, draw_figure, render_png};
pub(crate) use raster::{render_err, rgb};
pub use view::*;

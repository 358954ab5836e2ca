//! Data types shared by detection and filling.

mod asset;
mod grid;
mod schema;
mod values;
mod workbook;

pub use asset::*;
pub use grid::*;
pub use schema::*;
pub use values::*;
pub use workbook::*;

//! Local list state of the orders page and the reducer that orders it.

pub mod filter;
pub mod sort;

pub use filter::*;
pub use sort::*;

//! Display-ready projections of page state.

pub mod landing;
pub mod page;

pub use landing::*;
pub use page::*;

//! Long-running services and their message loops.

pub mod orders_page;

pub use orders_page::*;

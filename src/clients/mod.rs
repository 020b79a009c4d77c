//! Handles for talking to running services.

mod macros;
pub mod page_client;

pub use page_client::OrdersPageClient;

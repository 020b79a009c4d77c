//! Boundary to the REST backend.

pub mod http;

use async_trait::async_trait;

use crate::domain::{Order, OrderId, OrderItemRequest, OrderStatus, Product};
use crate::error::ApiError;

pub use http::HttpApi;

/// Order ("command") endpoints.
#[async_trait]
pub trait CommandApi: Send + Sync {
    async fn list_commands(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError>;

    async fn get_command(&self, id: OrderId) -> Result<Order, ApiError>;

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, ApiError>;

    async fn update_items(
        &self,
        id: OrderId,
        items: Vec<OrderItemRequest>,
    ) -> Result<Order, ApiError>;

    /// Removes the record.
    async fn delete_command(&self, id: OrderId) -> Result<(), ApiError>;

    /// Moves the order to CANCELLED; the record stays.
    async fn cancel_command(&self, id: OrderId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;
}

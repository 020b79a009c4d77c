use tokio::sync::mpsc;
use tracing::{debug, instrument};

use super::macros::client_method;
use crate::domain::{Order, OrderId, OrderItemRequest, OrderStatus};
use crate::error::PageError;
use crate::messages::PageRequest;
use crate::order_list::{SortBy, StatusFilter};
use crate::view::PageView;

/// Client for the orders page service. Cheap to clone; every clone feeds
/// the same queue.
#[derive(Clone)]
pub struct OrdersPageClient {
    sender: mpsc::Sender<PageRequest>,
}

impl OrdersPageClient {
    pub fn new(sender: mpsc::Sender<PageRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), PageError> {
        debug!("Sending shutdown request");
        self.sender
            .send(PageRequest::Shutdown)
            .await
            .map_err(|_| PageError::ActorCommunicationError("Actor closed".to_string()))
    }
}

client_method!(OrdersPageClient => fn render() -> PageView as PageRequest::Render, Error = PageError);
client_method!(OrdersPageClient => fn render_settled() -> PageView as PageRequest::RenderSettled, Error = PageError);
client_method!(OrdersPageClient => fn set_status_filter(filter: StatusFilter) -> PageView as PageRequest::SetStatusFilter, Error = PageError);
client_method!(OrdersPageClient => fn set_sort_by(sort_by: SortBy) -> PageView as PageRequest::SetSortBy, Error = PageError);
client_method!(OrdersPageClient => fn retry() -> PageView as PageRequest::Retry, Error = PageError);
client_method!(OrdersPageClient => fn login() -> PageView as PageRequest::Login, Error = PageError);
client_method!(OrdersPageClient => fn update_status(id: OrderId, status: OrderStatus) -> Order as PageRequest::UpdateStatus, Error = PageError);
client_method!(OrdersPageClient => fn update_items(id: OrderId, items: Vec<OrderItemRequest>) -> Order as PageRequest::UpdateItems, Error = PageError);
client_method!(OrdersPageClient => fn delete_order(id: OrderId) -> () as PageRequest::DeleteOrder, Error = PageError);
client_method!(OrdersPageClient => fn cancel_order(id: OrderId) -> () as PageRequest::CancelOrder, Error = PageError);

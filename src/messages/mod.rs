use tokio::sync::oneshot;

use crate::domain::{Order, OrderId, OrderItemRequest, OrderStatus, Product};
use crate::error::{ApiError, PageError};
use crate::order_list::{SortBy, StatusFilter};
use crate::view::PageView;

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Messages accepted by the orders page service. UI-facing variants carry a
/// oneshot channel for the reply; the `*Settled` variants are posted back by
/// the service's own background tasks.
#[derive(Debug)]
pub enum PageRequest {
    /// Current view; starts any fetch the view needs without waiting for it.
    Render {
        respond_to: ServiceResponse<PageView, PageError>,
    },
    /// Like `Render`, but replies once no fetch for the active view is running.
    RenderSettled {
        respond_to: ServiceResponse<PageView, PageError>,
    },
    SetStatusFilter {
        filter: StatusFilter,
        respond_to: ServiceResponse<PageView, PageError>,
    },
    SetSortBy {
        sort_by: SortBy,
        respond_to: ServiceResponse<PageView, PageError>,
    },
    Retry {
        respond_to: ServiceResponse<PageView, PageError>,
    },
    Login {
        respond_to: ServiceResponse<PageView, PageError>,
    },
    UpdateStatus {
        id: OrderId,
        status: OrderStatus,
        respond_to: ServiceResponse<Order, PageError>,
    },
    UpdateItems {
        id: OrderId,
        items: Vec<OrderItemRequest>,
        respond_to: ServiceResponse<Order, PageError>,
    },
    DeleteOrder {
        id: OrderId,
        respond_to: ServiceResponse<(), PageError>,
    },
    CancelOrder {
        id: OrderId,
        respond_to: ServiceResponse<(), PageError>,
    },
    FetchSettled(FetchSettled),
    MutationSettled(MutationSettled),
    Shutdown,
}

#[derive(Debug)]
pub enum FetchSettled {
    Orders {
        filter: StatusFilter,
        generation: u64,
        result: Result<Vec<Order>, ApiError>,
    },
    Products {
        generation: u64,
        result: Result<Vec<Product>, ApiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    UpdateStatus,
    UpdateItems,
    Delete,
    Cancel,
}

impl MutationKind {
    pub fn requires_admin(&self) -> bool {
        !matches!(self, MutationKind::Cancel)
    }

    /// Phrase used in "Only administrators can ..." rejections.
    pub fn action(&self) -> &'static str {
        match self {
            MutationKind::UpdateStatus => "update order status",
            MutationKind::UpdateItems => "edit orders",
            MutationKind::Delete => "delete orders",
            MutationKind::Cancel => "cancel orders",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            MutationKind::UpdateStatus => "Order status updated",
            MutationKind::UpdateItems => "Order updated successfully",
            MutationKind::Delete => "Order deleted successfully",
            MutationKind::Cancel => "Order cancelled successfully",
        }
    }

    /// The server's message verbatim, or a per-command fallback when empty.
    pub fn failure_message(&self, error: &ApiError) -> String {
        let message = error.message().trim();
        if !message.is_empty() {
            return message.to_string();
        }
        match self {
            MutationKind::UpdateStatus => "Failed to update status",
            MutationKind::UpdateItems => "Failed to update order",
            MutationKind::Delete => "Failed to delete order",
            MutationKind::Cancel => "Failed to cancel order",
        }
        .to_string()
    }
}

/// Outcome of a write together with the caller still waiting for it.
#[derive(Debug)]
pub enum MutationReply {
    Order {
        result: Result<Order, ApiError>,
        respond_to: ServiceResponse<Order, PageError>,
    },
    Done {
        result: Result<(), ApiError>,
        respond_to: ServiceResponse<(), PageError>,
    },
}

impl MutationReply {
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            MutationReply::Order { result, .. } => result.as_ref().err(),
            MutationReply::Done { result, .. } => result.as_ref().err(),
        }
    }

    pub fn deliver(self) {
        match self {
            MutationReply::Order { result, respond_to } => {
                let _ = respond_to.send(result.map_err(PageError::from));
            }
            MutationReply::Done { result, respond_to } => {
                let _ = respond_to.send(result.map_err(PageError::from));
            }
        }
    }
}

#[derive(Debug)]
pub struct MutationSettled {
    pub kind: MutationKind,
    pub id: OrderId,
    pub reply: MutationReply,
}

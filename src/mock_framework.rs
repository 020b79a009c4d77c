//! # Mock Framework
//!
//! Utilities for testing the orders page without a gateway.
//!
//! [`create_mock_api`] returns a [`MockApi`] that forwards every call as an
//! [`ApiCall`] onto a channel the test owns. Helpers like
//! [`expect_list_commands`] or [`expect_delete`] pull the next call off that
//! channel and hand back its responder, so a test decides when and how each
//! request settles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Notify};

use crate::actors::PageBackends;
use crate::api::{CommandApi, ProductApi};
use crate::auth::{AuthProvider, AuthState, Credentials, SessionAuth};
use crate::domain::{Order, OrderId, OrderItemRequest, OrderStatus, Product};
use crate::error::{ApiError, AuthError};
use crate::notify::{Notification, NotificationSink};

pub type Reply<T> = oneshot::Sender<Result<T, ApiError>>;

#[derive(Debug)]
pub enum ApiCall {
    ListCommands {
        status: Option<OrderStatus>,
        respond_to: Reply<Vec<Order>>,
    },
    GetCommand {
        id: OrderId,
        respond_to: Reply<Order>,
    },
    UpdateStatus {
        id: OrderId,
        status: OrderStatus,
        respond_to: Reply<Order>,
    },
    UpdateItems {
        id: OrderId,
        items: Vec<OrderItemRequest>,
        respond_to: Reply<Order>,
    },
    DeleteCommand {
        id: OrderId,
        respond_to: Reply<()>,
    },
    CancelCommand {
        id: OrderId,
        respond_to: Reply<()>,
    },
    ListProducts {
        respond_to: Reply<Vec<Product>>,
    },
}

#[derive(Clone)]
pub struct MockApi {
    sender: mpsc::Sender<ApiCall>,
}

impl MockApi {
    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> ApiCall) -> Result<T, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| ApiError::Transport("mock api closed".to_string()))?;
        response
            .await
            .map_err(|_| ApiError::Transport("mock call dropped".to_string()))?
    }
}

#[async_trait]
impl CommandApi for MockApi {
    async fn list_commands(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
        self.call(|respond_to| ApiCall::ListCommands { status, respond_to }).await
    }

    async fn get_command(&self, id: OrderId) -> Result<Order, ApiError> {
        self.call(|respond_to| ApiCall::GetCommand { id, respond_to }).await
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, ApiError> {
        self.call(|respond_to| ApiCall::UpdateStatus {
            id,
            status,
            respond_to,
        })
        .await
    }

    async fn update_items(
        &self,
        id: OrderId,
        items: Vec<OrderItemRequest>,
    ) -> Result<Order, ApiError> {
        self.call(|respond_to| ApiCall::UpdateItems {
            id,
            items,
            respond_to,
        })
        .await
    }

    async fn delete_command(&self, id: OrderId) -> Result<(), ApiError> {
        self.call(|respond_to| ApiCall::DeleteCommand { id, respond_to }).await
    }

    async fn cancel_command(&self, id: OrderId) -> Result<(), ApiError> {
        self.call(|respond_to| ApiCall::CancelCommand { id, respond_to }).await
    }
}

#[async_trait]
impl ProductApi for MockApi {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.call(|respond_to| ApiCall::ListProducts { respond_to }).await
    }
}

/// Creates a mock API and the receiver its calls arrive on.
pub fn create_mock_api(buffer_size: usize) -> (MockApi, mpsc::Receiver<ApiCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (MockApi { sender }, receiver)
}

/// Helper to verify that the next call is a ListCommands
pub async fn expect_list_commands(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(Option<OrderStatus>, Reply<Vec<Order>>)> {
    match receiver.recv().await {
        Some(ApiCall::ListCommands { status, respond_to }) => Some((status, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a ListProducts
pub async fn expect_list_products(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<Reply<Vec<Product>>> {
    match receiver.recv().await {
        Some(ApiCall::ListProducts { respond_to }) => Some(respond_to),
        _ => None,
    }
}

pub async fn expect_update_status(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(OrderId, OrderStatus, Reply<Order>)> {
    match receiver.recv().await {
        Some(ApiCall::UpdateStatus {
            id,
            status,
            respond_to,
        }) => Some((id, status, respond_to)),
        _ => None,
    }
}

pub async fn expect_update_items(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(OrderId, Vec<OrderItemRequest>, Reply<Order>)> {
    match receiver.recv().await {
        Some(ApiCall::UpdateItems {
            id,
            items,
            respond_to,
        }) => Some((id, items, respond_to)),
        _ => None,
    }
}

pub async fn expect_delete(receiver: &mut mpsc::Receiver<ApiCall>) -> Option<(OrderId, Reply<()>)> {
    match receiver.recv().await {
        Some(ApiCall::DeleteCommand { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_cancel(receiver: &mut mpsc::Receiver<ApiCall>) -> Option<(OrderId, Reply<()>)> {
    match receiver.recv().await {
        Some(ApiCall::CancelCommand { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Passes if no call arrives within a short grace period.
pub async fn expect_no_call(receiver: &mut mpsc::Receiver<ApiCall>) {
    if let Ok(Some(call)) = tokio::time::timeout(Duration::from_millis(50), receiver.recv()).await {
        panic!("Unexpected API call: {:?}", call);
    }
}

/// Answers one orders read and one products read, in whichever order they
/// arrive. Returns the status filter the orders read asked for.
pub async fn serve_reads(
    receiver: &mut mpsc::Receiver<ApiCall>,
    orders: Result<Vec<Order>, ApiError>,
    products: Result<Vec<Product>, ApiError>,
) -> Option<OrderStatus> {
    let mut orders = Some(orders);
    let mut products = Some(products);
    let mut requested = None;
    while orders.is_some() || products.is_some() {
        match receiver.recv().await {
            Some(ApiCall::ListCommands { status, respond_to }) => {
                requested = status;
                let reply = orders.take().expect("orders read issued twice");
                let _ = respond_to.send(reply);
            }
            Some(ApiCall::ListProducts { respond_to }) => {
                let reply = products.take().expect("products read issued twice");
                let _ = respond_to.send(reply);
            }
            other => panic!("Expected a read, got {:?}", other),
        }
    }
    requested
}

/// Collects notifications for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

pub fn admin_session() -> Arc<SessionAuth> {
    Arc::new(SessionAuth::new(Some(Credentials::new("admin-token", "root", true))))
}

pub fn customer_session() -> Arc<SessionAuth> {
    Arc::new(SessionAuth::new(Some(Credentials::new("user-token", "alice", false))))
}

/// Admin session whose `login` parks until released, holding the page
/// inside its login handler so a test can queue messages behind it.
#[derive(Default)]
pub struct HeldLogin {
    pub entered: Notify,
    pub release: Notify,
}

pub struct HeldLoginAuth {
    session: SessionAuth,
    gate: Arc<HeldLogin>,
}

impl HeldLoginAuth {
    pub fn new(gate: Arc<HeldLogin>) -> Self {
        let credentials = Credentials::new("admin-token", "root", true);
        let session = SessionAuth::new(Some(credentials.clone()))
            .with_login_source(move || Some(credentials.clone()));
        Self { session, gate }
    }
}

#[async_trait]
impl AuthProvider for HeldLoginAuth {
    fn state(&self) -> AuthState {
        self.session.state()
    }

    fn bearer_token(&self) -> Option<String> {
        self.session.bearer_token()
    }

    async fn login(&self) -> Result<AuthState, AuthError> {
        self.gate.entered.notify_one();
        self.gate.release.notified().await;
        self.session.login().await
    }
}

pub fn mock_backends(
    api: &MockApi,
    auth: Arc<dyn AuthProvider>,
    notifier: Arc<RecordingNotifier>,
) -> PageBackends {
    PageBackends {
        commands: Arc::new(api.clone()),
        products: Arc::new(api.clone()),
        auth,
        notifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_api_forwards_calls() {
        let (api, mut receiver) = create_mock_api(10);

        let list_task = tokio::spawn({
            let api = api.clone();
            async move { api.list_commands(Some(OrderStatus::Shipped)).await }
        });

        let (status, responder) = expect_list_commands(&mut receiver)
            .await
            .expect("Expected ListCommands call");
        assert_eq!(status, Some(OrderStatus::Shipped));
        responder
            .send(Ok(vec![Order::new(1, OrderStatus::Shipped)]))
            .unwrap();

        let result = list_task.await.unwrap().unwrap();
        assert_eq!(result.len(), 1);

        drop(receiver);
        assert!(matches!(api.list_products().await, Err(ApiError::Transport(_))));
    }
}

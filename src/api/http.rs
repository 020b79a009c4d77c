use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::{CommandApi, ProductApi};
use crate::auth::AuthProvider;
use crate::domain::{Order, OrderId, OrderItemRequest, OrderStatus, Product};
use crate::error::ApiError;

#[derive(Serialize)]
struct StatusUpdateRequest {
    status: OrderStatus,
}

#[derive(Serialize)]
struct ItemsUpdateRequest<'a> {
    items: &'a [OrderItemRequest],
}

/// reqwest-backed client for the gateway's `/api/commands` and
/// `/api/products` routes. The bearer token is looked up per request so a
/// login mid-session takes effect immediately.
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthProvider>,
}

impl HttpApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("order-desk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        match self.auth.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        warn!(status = status.as_u16(), message = %message, "Request rejected");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        Self::send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Picks the message to show for a failed request: the JSON `message` or
/// `error` field, then a plain-text body, then the bare status.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(message) = value
                .get(field)
                .and_then(|v| v.as_str())
                .filter(|m| !m.trim().is_empty())
            {
                return message.to_string();
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() && !body.starts_with('{') && !body.starts_with('<') {
        return body.to_string();
    }
    format!("Request failed with status {}", status.as_u16())
}

#[async_trait]
impl CommandApi for HttpApi {
    #[instrument(skip(self))]
    async fn list_commands(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
        debug!("Sending request");
        let mut builder = self.request(Method::GET, "/api/commands");
        if let Some(status) = status {
            builder = builder.query(&[("status", status.as_str())]);
        }
        Self::json(builder).await
    }

    #[instrument(skip(self))]
    async fn get_command(&self, id: OrderId) -> Result<Order, ApiError> {
        debug!("Sending request");
        Self::json(self.request(Method::GET, &format!("/api/commands/{}", id))).await
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, ApiError> {
        debug!("Sending request");
        let builder = self
            .request(Method::PATCH, &format!("/api/commands/{}/status", id))
            .json(&StatusUpdateRequest { status });
        Self::json(builder).await
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn update_items(
        &self,
        id: OrderId,
        items: Vec<OrderItemRequest>,
    ) -> Result<Order, ApiError> {
        debug!("Sending request");
        let builder = self
            .request(Method::PUT, &format!("/api/commands/{}", id))
            .json(&ItemsUpdateRequest { items: &items });
        Self::json(builder).await
    }

    #[instrument(skip(self))]
    async fn delete_command(&self, id: OrderId) -> Result<(), ApiError> {
        debug!("Sending request");
        Self::send(self.request(Method::DELETE, &format!("/api/commands/{}", id))).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cancel_command(&self, id: OrderId) -> Result<(), ApiError> {
        debug!("Sending request");
        Self::send(self.request(Method::POST, &format!("/api/commands/{}/cancel", id))).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductApi for HttpApi {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        debug!("Sending request");
        Self::json(self.request(Method::GET, "/api/products")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, SessionAuth};
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn api(server: &MockServer, credentials: Option<Credentials>) -> HttpApi {
        let auth: Arc<dyn AuthProvider> = Arc::new(SessionAuth::new(credentials));
        HttpApi::new(server.base_url(), Duration::from_secs(5), auth).unwrap()
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        let body = r#"{"message":"Insufficient stock for product 3","status":400}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Insufficient stock for product 3"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"error":"Not Found"}"#),
            "Not Found"
        );
        assert_eq!(error_message(StatusCode::CONFLICT, "locked"), "locked");
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "Request failed with status 502"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":""}"#),
            "Request failed with status 500"
        );
    }

    #[tokio::test]
    async fn test_list_commands_sends_status_and_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/commands")
                    .query_param("status", "PENDING")
                    .header("authorization", "Bearer t0k");
                then.status(200).json_body(json!([
                    {"commandId": 1, "status": "PENDING", "createdAt": "2024-01-01T10:00:00", "totalAmount": 50.0, "items": []}
                ]));
            })
            .await;

        let orders = api(&server, Some(Credentials::new("t0k", "admin", true)))
            .list_commands(Some(OrderStatus::Pending))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, 1);
    }

    #[tokio::test]
    async fn test_list_commands_without_filter() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/commands");
                then.status(200).json_body(json!([]));
            })
            .await;

        let orders = api(&server, None).list_commands(None).await.unwrap();
        mock.assert_async().await;
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_patches_status_route() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/api/commands/4/status")
                    .json_body(json!({"status": "SHIPPED"}));
                then.status(200)
                    .json_body(json!({"commandId": 4, "status": "SHIPPED"}));
            })
            .await;

        let order = api(&server, None)
            .update_status(4, OrderStatus::Shipped)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_update_items_puts_item_list() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/api/commands/9")
                    .json_body(json!({"items": [{"productId": 2, "quantity": 3}]}));
                then.status(200).json_body(json!({
                    "commandId": 9,
                    "status": "PENDING",
                    "items": [{"productId": 2, "quantity": 3}]
                }));
            })
            .await;

        let order = api(&server, None)
            .update_items(9, vec![OrderItemRequest { product_id: 2, quantity: 3 }])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(order.items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_cancel_hit_distinct_routes() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/commands/5");
                then.status(204);
            })
            .await;
        let cancel = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/commands/6/cancel");
                then.status(200);
            })
            .await;

        let api = api(&server, None);
        api.delete_command(5).await.unwrap();
        api.cancel_command(6).await.unwrap();
        delete.assert_async().await;
        cancel.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_message_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/commands/6/cancel");
                then.status(400)
                    .json_body(json!({"message": "Cannot cancel a delivered order"}));
            })
            .await;

        let err = api(&server, None).cancel_command(6).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                message: "Cannot cancel a delivered order".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_list_products() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/products");
                then.status(200).json_body(json!([
                    {"productId": 1, "name": "Desk", "price": 120.0, "stockQuantity": 4}
                ]));
            })
            .await;

        let products = api(&server, None).list_products().await.unwrap();
        assert_eq!(products[0].name, "Desk");
        assert_eq!(products[0].stock_quantity, Some(4));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/products");
                then.status(200).body("not json");
            })
            .await;

        let err = api(&server, None).list_products().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}

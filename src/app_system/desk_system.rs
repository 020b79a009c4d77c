use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::actors::{OrdersPageService, PageBackends, PageSettings};
use crate::api::{CommandApi, HttpApi, ProductApi};
use crate::auth::{AuthProvider, SessionAuth};
use crate::clients::OrdersPageClient;
use crate::config::DeskConfig;
use crate::error::StartupError;
use crate::notify::ConsoleNotifier;

/// The running desk: the orders page service plus the collaborators it was
/// wired with. Subcommands that bypass the page (`show`, `products`) use
/// the API handles directly.
pub struct OrderDeskSystem {
    pub page: OrdersPageClient,
    pub commands: Arc<dyn CommandApi>,
    pub products: Arc<dyn ProductApi>,
    pub auth: Arc<dyn AuthProvider>,
    handle: JoinHandle<()>,
}

impl OrderDeskSystem {
    pub fn new(config: &DeskConfig) -> Result<Self, StartupError> {
        let settings = config.page_settings()?;
        let auth: Arc<dyn AuthProvider> = Arc::new(SessionAuth::new(config.credentials()));
        let api = Arc::new(HttpApi::new(
            config.api.base_url.clone(),
            config.timeout(),
            Arc::clone(&auth),
        )?);
        info!(base_url = %config.api.base_url, "Connecting to order gateway");

        let backends = PageBackends {
            commands: api.clone(),
            products: api,
            auth,
            notifier: Arc::new(ConsoleNotifier),
        };
        Ok(Self::with_backends(config.page.buffer_size, backends, settings))
    }

    /// Starts the page service over arbitrary collaborators.
    pub fn with_backends(buffer_size: usize, backends: PageBackends, settings: PageSettings) -> Self {
        let commands = Arc::clone(&backends.commands);
        let products = Arc::clone(&backends.products);
        let auth = Arc::clone(&backends.auth);
        let (service, page) = OrdersPageService::new(buffer_size, backends, settings);
        let handle = tokio::spawn(service.run());
        Self {
            page,
            commands,
            products,
            auth,
            handle,
        }
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down order desk...");
        if let Err(e) = self.page.shutdown().await {
            // Already stopped; the join below still reports a panic.
            info!(error = %e, "Page service already closed");
        }
        drop(self.page);

        if let Err(e) = self.handle.await {
            error!("Page service task failed: {:?}", e);
            return Err(format!("Page service task failed: {:?}", e));
        }

        info!("Order desk shutdown complete.");
        Ok(())
    }
}

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::api::{CommandApi, ProductApi};
use crate::auth::{AuthProvider, AuthState};
use crate::clients::OrdersPageClient;
use crate::domain::{Order, OrderId, OrderItemRequest, OrderStatus, Product};
use crate::error::PageError;
use crate::messages::{
    FetchSettled, MutationKind, MutationReply, MutationSettled, PageRequest, ServiceResponse,
};
use crate::notify::NotificationSink;
use crate::order_list::{SortBy, StatusFilter};
use crate::query_cache::{FetchOutcome, QueryCache, QueryState};
use crate::view::{build_page, PageView};

/// External collaborators the page talks to.
#[derive(Clone)]
pub struct PageBackends {
    pub commands: Arc<dyn CommandApi>,
    pub products: Arc<dyn ProductApi>,
    pub auth: Arc<dyn AuthProvider>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Initial local list state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageSettings {
    pub status_filter: StatusFilter,
    pub sort_by: SortBy,
}

/// The orders page as a service: owns filter/sort state and both read
/// caches, and processes one message at a time. Network calls run in
/// spawned tasks that post `FetchSettled` / `MutationSettled` back here, so
/// several writes can be in flight while the page keeps answering.
pub struct OrdersPageService {
    receiver: mpsc::Receiver<PageRequest>,
    mailbox: mpsc::WeakSender<PageRequest>,
    backends: PageBackends,
    orders: QueryCache<StatusFilter, Vec<Order>>,
    catalog: QueryCache<(), Vec<Product>>,
    status_filter: StatusFilter,
    sort_by: SortBy,
    waiters: Vec<ServiceResponse<PageView, PageError>>,
}

impl OrdersPageService {
    pub fn new(
        buffer_size: usize,
        backends: PageBackends,
        settings: PageSettings,
    ) -> (Self, OrdersPageClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            mailbox: sender.downgrade(),
            backends,
            orders: QueryCache::new(),
            catalog: QueryCache::new(),
            status_filter: settings.status_filter,
            sort_by: settings.sort_by,
            waiters: Vec::new(),
        };
        (service, OrdersPageClient::new(sender))
    }

    #[instrument(name = "orders_page", skip(self))]
    pub async fn run(mut self) {
        info!("OrdersPageService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                PageRequest::Render { respond_to } => self.handle_render(respond_to),
                PageRequest::RenderSettled { respond_to } => {
                    self.handle_render_settled(respond_to)
                }
                PageRequest::SetStatusFilter { filter, respond_to } => {
                    self.handle_set_status_filter(filter, respond_to)
                }
                PageRequest::SetSortBy { sort_by, respond_to } => {
                    self.handle_set_sort_by(sort_by, respond_to)
                }
                PageRequest::Retry { respond_to } => self.handle_retry(respond_to),
                PageRequest::Login { respond_to } => self.handle_login(respond_to).await,
                PageRequest::UpdateStatus {
                    id,
                    status,
                    respond_to,
                } => self.handle_update_status(id, status, respond_to),
                PageRequest::UpdateItems {
                    id,
                    items,
                    respond_to,
                } => self.handle_update_items(id, items, respond_to),
                PageRequest::DeleteOrder { id, respond_to } => {
                    self.handle_delete_order(id, respond_to)
                }
                PageRequest::CancelOrder { id, respond_to } => {
                    self.handle_cancel_order(id, respond_to)
                }
                PageRequest::FetchSettled(settled) => self.handle_fetch_settled(settled),
                PageRequest::MutationSettled(settled) => self.handle_mutation_settled(settled),
                PageRequest::Shutdown => {
                    info!("OrdersPageService shutting down");
                    self.drain().await;
                    break;
                }
            }
        }
        info!("OrdersPageService stopped");
    }

    /// Stops intake and settles writes that finished while `Shutdown` was
    /// queued. Fetch results and UI requests still in the queue are dropped.
    async fn drain(&mut self) {
        self.receiver.close();
        while let Some(msg) = self.receiver.recv().await {
            if let PageRequest::MutationSettled(settled) = msg {
                debug!(
                    action = settled.kind.action(),
                    order_id = settled.id,
                    "Settling write after shutdown"
                );
                settle_detached(self.backends.notifier.as_ref(), settled);
            }
        }
    }

    // -------------------------------------------------------------------------
    // View
    // -------------------------------------------------------------------------

    fn current_view(&self) -> PageView {
        match self.backends.auth.state() {
            AuthState::Loading => PageView::Loading,
            AuthState::Unauthenticated => PageView::LoginRequired,
            AuthState::Authenticated(viewer) => build_page(
                &viewer,
                self.orders.state(&self.status_filter),
                self.catalog.state(&()),
                self.status_filter,
                self.sort_by,
            ),
        }
    }

    /// Nothing the active view depends on is being fetched.
    fn is_settled(&self) -> bool {
        !self.backends.auth.state().is_authenticated()
            || (!self.orders.is_fetching(&self.status_filter) && !self.catalog.is_fetching(&()))
    }

    fn flush_waiters(&mut self) {
        if self.waiters.is_empty() || !self.is_settled() {
            return;
        }
        let view = self.current_view();
        debug!(waiters = self.waiters.len(), "Releasing settled renders");
        for respond_to in self.waiters.drain(..) {
            let _ = respond_to.send(Ok(view.clone()));
        }
    }

    fn handle_render(&mut self, respond_to: ServiceResponse<PageView, PageError>) {
        self.ensure_fetches();
        let _ = respond_to.send(Ok(self.current_view()));
    }

    fn handle_render_settled(&mut self, respond_to: ServiceResponse<PageView, PageError>) {
        self.ensure_fetches();
        self.waiters.push(respond_to);
        self.flush_waiters();
    }

    #[instrument(fields(filter = %filter), skip(self, respond_to))]
    fn handle_set_status_filter(
        &mut self,
        filter: StatusFilter,
        respond_to: ServiceResponse<PageView, PageError>,
    ) {
        debug!("Processing set_status_filter request");
        if let Some(snapshot) = self.orders.snapshot(&filter) {
            let age = Utc::now() - snapshot.fetched_at;
            debug!(age_ms = age.num_milliseconds(), "Orders already cached for filter");
        }
        self.status_filter = filter;
        self.ensure_fetches();
        let _ = respond_to.send(Ok(self.current_view()));
        self.flush_waiters();
    }

    #[instrument(fields(sort_by = sort_by.key()), skip(self, respond_to))]
    fn handle_set_sort_by(
        &mut self,
        sort_by: SortBy,
        respond_to: ServiceResponse<PageView, PageError>,
    ) {
        debug!("Processing set_sort_by request");
        self.sort_by = sort_by;
        let _ = respond_to.send(Ok(self.current_view()));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_retry(&mut self, respond_to: ServiceResponse<PageView, PageError>) {
        info!(filter = %self.status_filter, "Retrying failed queries");
        self.orders.invalidate(&self.status_filter);
        if matches!(self.catalog.state(&()), QueryState::Error(_)) {
            self.catalog.invalidate(&());
        }
        self.ensure_fetches();
        let _ = respond_to.send(Ok(self.current_view()));
    }

    #[instrument(skip(self, respond_to))]
    async fn handle_login(&mut self, respond_to: ServiceResponse<PageView, PageError>) {
        debug!("Processing login request");
        match self.backends.auth.login().await {
            Ok(_) => {
                self.ensure_fetches();
                let _ = respond_to.send(Ok(self.current_view()));
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.backends.notifier.error(&e.to_string());
                let _ = respond_to.send(Err(PageError::Auth(e)));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Data fetchers
    // -------------------------------------------------------------------------

    /// Starts the reads the active view needs. Disabled unless authenticated.
    fn ensure_fetches(&mut self) {
        if !self.backends.auth.state().is_authenticated() {
            return;
        }
        if self.orders.needs_fetch(&self.status_filter) {
            self.spawn_orders_fetch(self.status_filter);
        }
        if self.catalog.needs_fetch(&()) {
            self.spawn_products_fetch();
        }
    }

    fn spawn_orders_fetch(&mut self, filter: StatusFilter) {
        let generation = self.orders.begin_fetch(filter);
        let api = Arc::clone(&self.backends.commands);
        let mailbox = self.mailbox.clone();
        tokio::spawn(
            async move {
                let result = api.list_commands(filter.status()).await;
                let settled = FetchSettled::Orders {
                    filter,
                    generation,
                    result,
                };
                match mailbox.upgrade() {
                    Some(sender) => {
                        let _ = sender.send(PageRequest::FetchSettled(settled)).await;
                    }
                    None => debug!("Page closed before orders fetch settled"),
                }
            }
            .instrument(info_span!("fetch_orders", filter = %filter, generation)),
        );
    }

    fn spawn_products_fetch(&mut self) {
        let generation = self.catalog.begin_fetch(());
        let api = Arc::clone(&self.backends.products);
        let mailbox = self.mailbox.clone();
        tokio::spawn(
            async move {
                let result = api.list_products().await;
                let settled = FetchSettled::Products { generation, result };
                match mailbox.upgrade() {
                    Some(sender) => {
                        let _ = sender.send(PageRequest::FetchSettled(settled)).await;
                    }
                    None => debug!("Page closed before products fetch settled"),
                }
            }
            .instrument(info_span!("fetch_products", generation)),
        );
    }

    fn handle_fetch_settled(&mut self, settled: FetchSettled) {
        match settled {
            FetchSettled::Orders {
                filter,
                generation,
                result,
            } => {
                if let Err(e) = &result {
                    warn!(filter = %filter, error = %e, "Orders fetch failed");
                }
                let count = result.as_ref().map_or(0, Vec::len);
                let result = result.map_err(|e| e.to_string());
                match self.orders.complete_fetch(&filter, generation, result) {
                    FetchOutcome::Stored => info!(filter = %filter, count, "Orders refreshed"),
                    FetchOutcome::Superseded => {
                        debug!(filter = %filter, generation, "Discarding orders fetched before invalidation")
                    }
                }
            }
            FetchSettled::Products { generation, result } => {
                if let Err(e) = &result {
                    warn!(error = %e, "Products fetch failed");
                }
                let result = result.map_err(|e| e.to_string());
                if self.catalog.complete_fetch(&(), generation, result) == FetchOutcome::Superseded {
                    debug!(generation, "Discarding superseded products fetch");
                }
            }
        }
        // Superseded reads for the active view are re-issued here.
        self.ensure_fetches();
        self.flush_waiters();
    }

    // -------------------------------------------------------------------------
    // Mutation commands
    // -------------------------------------------------------------------------

    fn authorize(&self, kind: MutationKind) -> Result<(), PageError> {
        match self.backends.auth.state() {
            AuthState::Authenticated(viewer) if kind.requires_admin() && !viewer.is_admin => {
                Err(PageError::AdminRequired(kind.action()))
            }
            AuthState::Authenticated(_) => Ok(()),
            AuthState::Loading | AuthState::Unauthenticated => Err(PageError::LoginRequired),
        }
    }

    /// Reports a command refused before reaching the server.
    fn reject<T>(
        &self,
        kind: MutationKind,
        error: PageError,
        respond_to: ServiceResponse<T, PageError>,
    ) {
        warn!(action = kind.action(), error = %error, "Mutation rejected");
        self.backends.notifier.error(&error.to_string());
        let _ = respond_to.send(Err(error));
    }

    /// Runs a write in the background. The write is never aborted: if the
    /// page is gone when it finishes, the caller and the notifier are
    /// answered directly. A result queued behind `Shutdown` is settled by
    /// [`OrdersPageService::drain`].
    fn spawn_mutation<F>(&self, kind: MutationKind, id: OrderId, write: F)
    where
        F: Future<Output = MutationReply> + Send + 'static,
    {
        let mailbox = self.mailbox.clone();
        let notifier = Arc::clone(&self.backends.notifier);
        tokio::spawn(
            async move {
                let settled = MutationSettled {
                    kind,
                    id,
                    reply: write.await,
                };
                let unsent = match mailbox.upgrade() {
                    Some(sender) => match sender.send(PageRequest::MutationSettled(settled)).await {
                        Ok(()) => None,
                        Err(returned) => match returned.0 {
                            PageRequest::MutationSettled(settled) => Some(settled),
                            _ => None,
                        },
                    },
                    None => Some(settled),
                };
                if let Some(settled) = unsent {
                    debug!("Page closed before mutation settled");
                    settle_detached(notifier.as_ref(), settled);
                }
            }
            .instrument(info_span!("mutation", action = kind.action(), order_id = id)),
        );
    }

    #[instrument(fields(order_id = id, status = %status), skip(self, respond_to))]
    fn handle_update_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        respond_to: ServiceResponse<Order, PageError>,
    ) {
        debug!("Processing update_status request");
        let kind = MutationKind::UpdateStatus;
        if let Err(e) = self.authorize(kind) {
            return self.reject(kind, e, respond_to);
        }
        let api = Arc::clone(&self.backends.commands);
        self.spawn_mutation(kind, id, async move {
            MutationReply::Order {
                result: api.update_status(id, status).await,
                respond_to,
            }
        });
    }

    #[instrument(fields(order_id = id, items = items.len()), skip(self, items, respond_to))]
    fn handle_update_items(
        &mut self,
        id: OrderId,
        items: Vec<OrderItemRequest>,
        respond_to: ServiceResponse<Order, PageError>,
    ) {
        debug!("Processing update_items request");
        let kind = MutationKind::UpdateItems;
        if let Err(e) = self.authorize(kind) {
            return self.reject(kind, e, respond_to);
        }
        let api = Arc::clone(&self.backends.commands);
        self.spawn_mutation(kind, id, async move {
            MutationReply::Order {
                result: api.update_items(id, items).await,
                respond_to,
            }
        });
    }

    #[instrument(fields(order_id = id), skip(self, respond_to))]
    fn handle_delete_order(&mut self, id: OrderId, respond_to: ServiceResponse<(), PageError>) {
        debug!("Processing delete_order request");
        let kind = MutationKind::Delete;
        if let Err(e) = self.authorize(kind) {
            return self.reject(kind, e, respond_to);
        }
        let api = Arc::clone(&self.backends.commands);
        self.spawn_mutation(kind, id, async move {
            MutationReply::Done {
                result: api.delete_command(id).await,
                respond_to,
            }
        });
    }

    #[instrument(fields(order_id = id), skip(self, respond_to))]
    fn handle_cancel_order(&mut self, id: OrderId, respond_to: ServiceResponse<(), PageError>) {
        debug!("Processing cancel_order request");
        let kind = MutationKind::Cancel;
        if let Err(e) = self.authorize(kind) {
            return self.reject(kind, e, respond_to);
        }
        let api = Arc::clone(&self.backends.commands);
        self.spawn_mutation(kind, id, async move {
            MutationReply::Done {
                result: api.cancel_command(id).await,
                respond_to,
            }
        });
    }

    #[instrument(fields(action = settled.kind.action(), order_id = settled.id), skip(self, settled))]
    fn handle_mutation_settled(&mut self, settled: MutationSettled) {
        let MutationSettled { kind, reply, .. } = settled;
        match reply.error() {
            Some(e) => {
                warn!(error = %e, "Mutation failed");
                self.backends.notifier.error(&kind.failure_message(e));
            }
            None => {
                info!("Mutation succeeded, invalidating orders");
                self.orders.invalidate_all();
                self.backends.notifier.success(kind.success_message());
                self.ensure_fetches();
            }
        }
        reply.deliver();
    }
}

/// Notifies and answers a write the page can no longer process.
fn settle_detached(notifier: &dyn NotificationSink, settled: MutationSettled) {
    let MutationSettled { kind, reply, .. } = settled;
    match reply.error() {
        Some(e) => notifier.error(&kind.failure_message(e)),
        None => notifier.success(kind.success_message()),
    }
    reply.deliver();
}

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use super::landing::Route;
use crate::domain::{Order, OrderId, OrderStatus, Product, ProductId, Viewer};
use crate::order_list::{sort_orders, SortBy, StatusFilter};
use crate::query_cache::QueryState;

/// Everything the orders page can show.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    Loading,
    LoginRequired,
    Error { message: String, can_retry: bool },
    Empty(EmptyState),
    Listing(OrderListing),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyAction {
    ViewAllOrders,
    CreateOrder(Route),
}

impl EmptyAction {
    pub fn label(&self) -> &'static str {
        match self {
            EmptyAction::ViewAllOrders => "View All Orders",
            EmptyAction::CreateOrder(_) => "Create New Order",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub description: &'static str,
    pub action: Option<EmptyAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderListing {
    pub heading: &'static str,
    pub subtitle: &'static str,
    pub count_label: String,
    /// Customers get a "New Order" shortcut; admins do not place orders.
    pub can_create: bool,
    pub status_filter: StatusFilter,
    pub sort_by: SortBy,
    pub cards: Vec<OrderCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderCard {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub total_amount: Option<f64>,
    pub username: Option<String>,
    pub lines: Vec<CardLine>,
    pub actions: CardActions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardActions {
    pub change_status: bool,
    pub edit: bool,
    pub delete: bool,
    pub cancel: bool,
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 order".to_string()
    } else {
        format!("{} orders", count)
    }
}

fn empty_state(viewer: &Viewer, filter: StatusFilter) -> EmptyState {
    if !filter.is_all() {
        EmptyState {
            title: "No orders found",
            description: "Try changing the status filter",
            action: Some(EmptyAction::ViewAllOrders),
        }
    } else if viewer.is_admin {
        EmptyState {
            title: "No orders yet",
            description: "No orders have been placed yet",
            action: None,
        }
    } else {
        EmptyState {
            title: "No orders yet",
            description: "Create your first order to get started",
            action: Some(EmptyAction::CreateOrder(Route::NewOrder)),
        }
    }
}

fn card(order: Order, viewer: &Viewer, catalog: &HashMap<ProductId, &Product>) -> OrderCard {
    let lines = order
        .items
        .into_iter()
        .map(|item| {
            let known = catalog.get(&item.product_id);
            CardLine {
                product_id: item.product_id,
                product_name: item
                    .product_name
                    .or_else(|| known.map(|p| p.name.clone()))
                    .unwrap_or_else(|| format!("Product #{}", item.product_id)),
                quantity: item.quantity,
                unit_price: item.unit_price.or_else(|| known.map(|p| p.price)),
            }
        })
        .collect();

    OrderCard {
        id: order.id,
        status: order.status,
        created_at: order.created_at,
        total_amount: order.total_amount,
        username: if viewer.is_admin { order.username } else { None },
        lines,
        actions: CardActions {
            change_status: viewer.is_admin,
            edit: viewer.is_admin,
            delete: viewer.is_admin,
            cancel: order.status.is_cancellable(),
        },
    }
}

/// Combines both read queries with the local list state.
///
/// Loading wins over errors, and an orders error is reported before a
/// products error.
pub fn build_page(
    viewer: &Viewer,
    orders: QueryState<'_, Vec<Order>>,
    products: QueryState<'_, Vec<Product>>,
    status_filter: StatusFilter,
    sort_by: SortBy,
) -> PageView {
    let (orders, products) = match (orders, products) {
        (QueryState::Loading, _) | (_, QueryState::Loading) => return PageView::Loading,
        (QueryState::Error(reason), _) | (_, QueryState::Error(reason)) => {
            return PageView::Error {
                message: reason.to_string(),
                can_retry: true,
            }
        }
        (QueryState::Success(orders), QueryState::Success(products)) => (orders, products),
    };

    if orders.is_empty() {
        return PageView::Empty(empty_state(viewer, status_filter));
    }

    let catalog: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let cards = sort_orders(Some(orders), sort_by)
        .into_iter()
        .map(|order| card(order, viewer, &catalog))
        .collect();

    let (heading, subtitle) = if viewer.is_admin {
        ("All Orders", "Manage and track all customer orders")
    } else {
        ("My Orders", "View and manage your orders")
    };

    PageView::Listing(OrderListing {
        heading,
        subtitle,
        count_label: count_label(orders.len()),
        can_create: !viewer.is_admin,
        status_filter,
        sort_by,
        cards,
    })
}

fn money(amount: Option<f64>) -> String {
    format!("${:.2}", amount.unwrap_or(0.0))
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageView::Loading => writeln!(f, "Loading..."),
            PageView::LoginRequired => {
                writeln!(f, "Login Required")?;
                writeln!(f, "Please login to view and manage orders")?;
                writeln!(f, "[Login]  (order_desk login)")
            }
            PageView::Error { message, can_retry } => {
                writeln!(f, "Something went wrong: {}", message)?;
                if *can_retry {
                    writeln!(f, "[Retry]")?;
                }
                Ok(())
            }
            PageView::Empty(empty) => {
                writeln!(f, "{}", empty.title)?;
                writeln!(f, "{}", empty.description)?;
                match empty.action {
                    Some(EmptyAction::CreateOrder(route)) => {
                        writeln!(f, "[{}]  ({})", EmptyAction::CreateOrder(route).label(), route)
                    }
                    Some(action) => writeln!(f, "[{}]", action.label()),
                    None => Ok(()),
                }
            }
            PageView::Listing(listing) => write!(f, "{}", listing),
        }
    }
}

impl fmt::Display for OrderListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        writeln!(f, "{}", self.subtitle)?;
        writeln!(
            f,
            "{} | sort: {} | status: {}",
            self.count_label,
            self.sort_by.label(),
            self.status_filter.label()
        )?;
        if self.can_create {
            writeln!(f, "[New Order]  ({})", Route::NewOrder)?;
        }
        for card in &self.cards {
            writeln!(f)?;
            write!(f, "{}", card)?;
        }
        Ok(())
    }
}

impl fmt::Display for OrderCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let created = self
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "#{:<6} {:<10} {:<16} {:>10}",
            self.id,
            self.status.label(),
            created,
            money(self.total_amount)
        )?;
        if let Some(username) = &self.username {
            write!(f, "  @{}", username)?;
        }
        writeln!(f)?;
        for line in &self.lines {
            writeln!(
                f,
                "    {} x {} @ {}",
                line.quantity,
                line.product_name,
                money(line.unit_price)
            )?;
        }
        let mut actions = Vec::new();
        if self.actions.change_status {
            actions.push("status");
        }
        if self.actions.edit {
            actions.push("edit");
        }
        if self.actions.cancel {
            actions.push("cancel");
        }
        if self.actions.delete {
            actions.push("delete");
        }
        if !actions.is_empty() {
            writeln!(f, "    actions: {}", actions.join(", "))?;
        }
        Ok(())
    }
}

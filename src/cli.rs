use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app_system::OrderDeskSystem;
use crate::config::DeskConfig;
use crate::domain::{OrderId, OrderItemRequest, OrderStatus};
use crate::order_list::{SortBy, StatusFilter};
use crate::view::{LandingView, PageView};

#[derive(Parser, Debug)]
#[command(name = "order_desk")]
#[command(version, about = "Browse and manage shop orders from the terminal")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = "order-desk.toml")]
    pub config: PathBuf,

    /// Gateway base URL. Overrides the config file and ORDER_DESK_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the landing page
    Home,
    /// List orders
    Orders {
        /// ALL or one of PENDING, CONFIRMED, PROCESSING, SHIPPED, DELIVERED, CANCELLED
        #[arg(short, long)]
        status: Option<StatusFilter>,
        /// newest, oldest, price-high or price-low
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one order as returned by the server
    Show { id: OrderId },
    /// List the product catalog
    Products,
    /// Change an order's status (admin)
    SetStatus { id: OrderId, status: OrderStatus },
    /// Replace an order's items (admin)
    Edit {
        id: OrderId,
        /// PRODUCT_ID:QUANTITY, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<OrderItemRequest>,
    },
    /// Permanently delete an order (admin)
    Delete {
        id: OrderId,
        #[arg(long)]
        yes: bool,
    },
    /// Cancel an order; the record is kept
    Cancel { id: OrderId },
    /// Log in with the credentials from the environment
    Login,
}

pub fn load_config(cli: &Cli) -> Result<DeskConfig> {
    let mut config = DeskConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?
        .with_env()
        .context("Invalid ORDER_DESK_* environment")?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    Ok(config)
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Home = cli.command {
        print!("{}", LandingView);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let system = OrderDeskSystem::new(&config).context("Failed to start order desk")?;
    let outcome = dispatch(&system, cli.command).await;
    system
        .shutdown()
        .await
        .map_err(anyhow::Error::msg)
        .context("Failed to shut down")?;
    outcome
}

async fn dispatch(system: &OrderDeskSystem, command: Commands) -> Result<()> {
    let page = &system.page;
    match command {
        Commands::Home => print!("{}", LandingView),
        Commands::Orders { status, sort } => {
            if let Some(filter) = status {
                page.set_status_filter(filter).await?;
            }
            if let Some(key) = sort {
                page.set_sort_by(SortBy::from_key(&key)).await?;
            }
            print_page(page.render_settled().await?);
        }
        Commands::Show { id } => {
            let order = system
                .commands
                .get_command(id)
                .await
                .with_context(|| format!("Failed to load order #{}", id))?;
            println!("{}", serde_json::to_string_pretty(&order)?);
        }
        Commands::Products => {
            let products = system
                .products
                .list_products()
                .await
                .context("Failed to load products")?;
            for product in products {
                let stock = product
                    .stock_quantity
                    .map(|qty| format!(" ({} in stock)", qty))
                    .unwrap_or_default();
                println!("#{:<5} {:<32} ${:.2}{}", product.id, product.name, product.price, stock);
            }
        }
        Commands::SetStatus { id, status } => {
            let order = page.update_status(id, status).await?;
            info!(order_id = order.id, status = %order.status, "Status changed");
            print_page(page.render_settled().await?);
        }
        Commands::Edit { id, items } => {
            page.update_items(id, items).await?;
            print_page(page.render_settled().await?);
        }
        Commands::Delete { id, yes } => {
            if !yes {
                bail!("Deleting order #{} cannot be undone. Re-run with --yes to confirm", id);
            }
            page.delete_order(id).await?;
            print_page(page.render_settled().await?);
        }
        Commands::Cancel { id } => {
            page.cancel_order(id).await?;
            print_page(page.render_settled().await?);
        }
        Commands::Login => print_page(page.login().await?),
    }
    Ok(())
}

fn print_page(view: PageView) {
    print!("{}", view);
}

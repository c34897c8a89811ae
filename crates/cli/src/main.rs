//! VocaloCart CLI - storefront client and environment checks.
//!
//! # Usage
//!
//! ```bash
//! # Check that the proxy and backend are up
//! vc-cli health
//!
//! # Sign in (the session token is saved to .vocalocart-token)
//! vc-cli login -e miku@example.com -p secret
//!
//! # Browse and buy
//! vc-cli products --q miku --sort price --desc
//! vc-cli cart add 42 --quantity 2
//! vc-cli checkout --address 3
//! ```
//!
//! # Commands
//!
//! - `health` - Check proxy, backend and session
//! - `login` / `register` / `logout` / `whoami` - Session management
//! - `products` / `product` / `categories` - Catalog
//! - `cart` / `checkout` - Cart and ordering
//! - `orders` / `addresses` / `wishlist` - Account data
//! - `contact` - Send a message to the shop

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vocalocart_core::{
    AddressId, AddressRequest, CartItemId, CategoryId, OrderId, OrderStatus, ProductId,
    ProductSearch, SortDirection,
};

mod commands;
mod output;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "vc-cli")]
#[command(author, version, about = "VocaloCart storefront CLI")]
struct Cli {
    /// Base URL of the VocaloCart proxy
    #[arg(long, global = true, env = "VOCALOCART_API_URL", default_value = "http://127.0.0.1:5000")]
    api_url: String,

    /// Where the session token is kept
    #[arg(long, global = true, env = "VOCALOCART_TOKEN_FILE", default_value = ".vocalocart-token")]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the proxy and backend are reachable
    Health {
        /// Backend address the proxy forwards to
        #[arg(long, env = "VOCALOCART_UPSTREAM_ADDR", default_value = "127.0.0.1:8081")]
        upstream_addr: String,
    },
    /// Sign in and save the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        nickname: Option<String>,
        /// Birthday as YYYY-MM-DD
        #[arg(short, long)]
        birthday: Option<NaiveDate>,
    },
    /// Forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Search the catalog
    Products {
        /// Search text
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        category: Option<CategoryId>,
        /// Sort field
        #[arg(long, default_value = "id")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        size: u32,
    },
    /// Show one product
    Product { id: ProductId },
    /// List categories
    Categories,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Place an order for the current cart
    Checkout {
        /// Ship to this saved address instead of the default
        #[arg(long)]
        address: Option<AddressId>,
    },
    /// Order history and admin status updates
    Orders {
        #[command(subcommand)]
        action: Option<OrderAction>,
    },
    /// Saved shipping addresses
    Addresses {
        #[command(subcommand)]
        action: Option<AddressAction>,
    },
    /// Wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Send a message through the contact form
    Contact {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        details: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove one unit of a cart line
    Remove { line: CartItemId },
    /// Remove a cart line entirely
    RemoveAll { line: CartItemId },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Your orders
    List,
    /// Every order (admin)
    All,
    /// Change an order's status (admin)
    SetStatus { id: OrderId, status: OrderStatus },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        line1: String,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        phone: String,
        /// Make this the default address
        #[arg(long)]
        default: bool,
    },
    /// Delete a saved address
    Remove { id: AddressId },
    /// Make an address the default
    SetDefault { id: AddressId },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    List,
    /// Add a product
    Add { product: ProductId },
    /// Remove a product
    Remove { product: ProductId },
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        output::emit(&format!("{} ({e})", e.category().message()));
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Health { upstream_addr } = &cli.command {
        return commands::health::run(&cli.api_url, upstream_addr, &cli.token_file).await;
    }

    let ctx = Context::open(&cli.api_url, &cli.token_file).await?;

    match cli.command {
        Commands::Health { .. } => {}
        Commands::Login { email, password } => {
            commands::session::login(&ctx, &email, &password).await?;
        }
        Commands::Register {
            email,
            password,
            nickname,
            birthday,
        } => commands::session::register(&ctx, &email, &password, nickname, birthday).await?,
        Commands::Logout => commands::session::logout(&ctx),
        Commands::Whoami => commands::session::whoami(&ctx).await?,
        Commands::Products {
            q,
            category,
            sort,
            desc,
            page,
            size,
        } => {
            let search = ProductSearch {
                q,
                category_id: category,
                sort,
                dir: if desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
                page,
                size,
            };
            commands::catalog::search(&ctx, &search).await?;
        }
        Commands::Product { id } => commands::catalog::show(&ctx, id).await?,
        Commands::Categories => commands::catalog::categories(&ctx).await?,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add { product, quantity } => {
                commands::cart::add(&ctx, product, quantity).await?;
            }
            CartAction::Remove { line } => commands::cart::remove(&ctx, line).await?,
            CartAction::RemoveAll { line } => commands::cart::remove_all(&ctx, line).await?,
        },
        Commands::Checkout { address } => commands::cart::checkout(&ctx, address).await?,
        Commands::Orders { action } => match action.unwrap_or(OrderAction::List) {
            OrderAction::List => commands::account::orders(&ctx).await?,
            OrderAction::All => commands::account::all_orders(&ctx).await?,
            OrderAction::SetStatus { id, status } => {
                commands::account::set_order_status(&ctx, id, status).await?;
            }
        },
        Commands::Addresses { action } => match action.unwrap_or(AddressAction::List) {
            AddressAction::List => commands::account::addresses(&ctx).await?,
            AddressAction::Add {
                recipient,
                line1,
                line2,
                city,
                state,
                postal_code,
                country,
                phone,
                default,
            } => {
                let request = AddressRequest {
                    recipient_name: recipient,
                    line1,
                    line2,
                    city,
                    state,
                    postal_code,
                    country,
                    phone,
                    is_default: default.then_some(true),
                };
                commands::account::add_address(&ctx, request).await?;
            }
            AddressAction::Remove { id } => commands::account::remove_address(&ctx, id).await?,
            AddressAction::SetDefault { id } => {
                commands::account::set_default_address(&ctx, id).await?;
            }
        },
        Commands::Wishlist { action } => match action.unwrap_or(WishlistAction::List) {
            WishlistAction::List => commands::account::wishlist(&ctx).await?,
            WishlistAction::Add { product } => {
                commands::account::add_to_wishlist(&ctx, product).await?;
            }
            WishlistAction::Remove { product } => {
                commands::account::remove_from_wishlist(&ctx, product).await?;
            }
        },
        Commands::Contact {
            name,
            email,
            title,
            details,
        } => commands::account::contact(&ctx, name, &email, title, details).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_parses_order_status_argument() {
        let cli = Cli::try_parse_from(["vc-cli", "orders", "set-status", "7", "IN_DELIVERY"]).unwrap();
        match cli.command {
            Commands::Orders {
                action: Some(OrderAction::SetStatus { id, status }),
            } => {
                assert_eq!(id, OrderId::new(7));
                assert_eq!(status, OrderStatus::InDelivery);
            }
            _ => panic!("unexpected command"),
        }
        assert!(Cli::try_parse_from(["vc-cli", "orders", "set-status", "7", "SHIPPED"]).is_err());
    }
}

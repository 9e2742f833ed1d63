//! CLI administration tool for the delivery service.
//!
//! Registers couriers and orders, runs single dispatch ticks and lists the
//! current state without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Register a courier with the default storage place
//! cargo run --bin admin -- courier create --name Ann --speed 2
//!
//! # Create an order (the id is generated when omitted)
//! cargo run --bin admin -- order create --street "Main st 1" --volume 5
//!
//! # Run one assignment or movement tick by hand
//! cargo run --bin admin -- tick assign
//! cargo run --bin admin -- tick move
//!
//! # Show couriers and undelivered orders
//! cargo run --bin admin -- couriers
//! cargo run --bin admin -- orders
//!
//! # Check storage connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the service, see `delivery::config`. With `STORAGE_BACKEND=memory`
//! every invocation starts from an empty store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use uuid::Uuid;

use delivery::AppState;
use delivery::config;
use delivery::error::AppError;
use delivery::prelude::{CreateCourierCommand, CreateOrderCommand};

/// CLI tool for managing the delivery service.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage couriers
    Courier {
        #[command(subcommand)]
        action: CourierAction,
    },

    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },

    /// Run a single dispatch tick
    Tick {
        #[command(subcommand)]
        action: TickAction,
    },

    /// List all couriers
    Couriers,

    /// List orders that are not delivered yet
    Orders,

    /// Storage operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum CourierAction {
    /// Register a new courier at a random location
    Create {
        #[arg(short, long)]
        name: String,

        /// Grid cells per movement tick
        #[arg(short, long, default_value_t = 1)]
        speed: i32,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Create an order for a street address
    Create {
        /// Order id (generated if not provided)
        #[arg(long)]
        id: Option<Uuid>,

        #[arg(short, long)]
        street: String,

        #[arg(short, long)]
        volume: i32,
    },
}

#[derive(Subcommand)]
enum TickAction {
    /// Assign the oldest created order to the fastest free courier
    Assign,

    /// Move every busy courier one step
    Move,
}

#[derive(Subcommand)]
enum DbAction {
    /// Check storage connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let state = delivery::server::build_state(&config).await?;

    match cli.command {
        Commands::Courier { action } => handle_courier_action(action, &state).await?,
        Commands::Order { action } => handle_order_action(action, &state).await?,
        Commands::Tick { action } => handle_tick_action(action, &state).await?,
        Commands::Couriers => list_couriers(&state).await?,
        Commands::Orders => list_orders(&state).await?,
        Commands::Db { action } => handle_db_action(action, &state).await?,
    }

    Ok(())
}

async fn handle_courier_action(action: CourierAction, state: &AppState) -> Result<()> {
    match action {
        CourierAction::Create { name, speed } => {
            println!("{}", "🚴 Create Courier".bright_blue().bold());
            println!();

            let command = CreateCourierCommand::new(name.as_str(), speed)?;
            let courier_id = state.create_courier.handle(command).await?;

            println!("{}", "✅ Courier created".green().bold());
            println!("  Name: {}", name.cyan());
            println!("  ID:   {}", courier_id.to_string().bright_black());
            println!();
        }
    }

    Ok(())
}

async fn handle_order_action(action: OrderAction, state: &AppState) -> Result<()> {
    match action {
        OrderAction::Create { id, street, volume } => {
            println!("{}", "📦 Create Order".bright_blue().bold());
            println!();

            let order_id = id.unwrap_or_else(Uuid::new_v4);
            let command = CreateOrderCommand::new(order_id, street.as_str(), volume)?;
            state.create_order.handle(command).await?;

            println!("{}", "✅ Order created".green().bold());
            println!("  Street: {}", street.cyan());
            println!("  Volume: {}", volume.to_string().bright_white());
            println!("  ID:     {}", order_id.to_string().bright_black());
            println!();
        }
    }

    Ok(())
}

/// Runs one tick. "Nothing to do" is reported, not treated as a failure.
async fn handle_tick_action(action: TickAction, state: &AppState) -> Result<()> {
    match action {
        TickAction::Assign => match state.assign_order.handle().await {
            Ok(placement) => {
                println!("{}", "✅ Order assigned".green().bold());
                println!("  Order:   {}", placement.order_id.to_string().cyan());
                println!("  Courier: {}", placement.courier_id.to_string().cyan());
                println!(
                    "  Place:   {}",
                    placement.storage_place_id.to_string().bright_black()
                );
            }
            Err(e @ AppError::Unavailable { .. }) => {
                println!(
                    "{} {}",
                    "⚠️  Nothing assigned:".yellow(),
                    e.reason().unwrap_or_default()
                );
            }
            Err(e) => return Err(e.into()),
        },
        TickAction::Move => {
            let report = state.move_couriers.handle().await?;
            println!(
                "  Moved:     {}",
                report.moved.to_string().bright_green().bold()
            );
            println!(
                "  Completed: {}",
                report.completed.to_string().bright_green().bold()
            );
        }
    }
    println!();

    Ok(())
}

async fn list_couriers(state: &AppState) -> Result<()> {
    println!("{}", "🚴 Couriers".bright_blue().bold());
    println!();

    let couriers = state.get_couriers.handle().await?;
    if couriers.is_empty() {
        println!("{}", "  No couriers registered".yellow());
        println!();
        return Ok(());
    }

    println!(
        "  {:<36} {:<20} {}",
        "ID".bright_white().bold(),
        "NAME".bright_white().bold(),
        "LOCATION".bright_white().bold()
    );
    for courier in &couriers {
        println!(
            "  {:<36} {:<20} ({}, {})",
            courier.id.to_string().bright_black(),
            courier.name.cyan(),
            courier.location.x(),
            courier.location.y()
        );
    }

    println!();
    println!(
        "  Total: {}",
        couriers.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn list_orders(state: &AppState) -> Result<()> {
    println!("{}", "📦 Active Orders".bright_blue().bold());
    println!();

    let orders = state.get_orders.handle().await?;
    if orders.is_empty() {
        println!("{}", "  No active orders".yellow());
        println!();
        return Ok(());
    }

    for order in &orders {
        println!(
            "  {} ({}, {})",
            order.id.to_string().cyan(),
            order.location.x(),
            order.location.y()
        );
    }

    println!();
    println!("  Total: {}", orders.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, state: &AppState) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking storage connection...".bright_blue());

            state.read_model.ping().await?;

            println!("{}", "✅ Storage connection OK".green().bold());
        }
    }

    Ok(())
}

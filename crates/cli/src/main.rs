//! Casanova CLI - Database migrations and customer tracking tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! casanova-cli migrate
//!
//! # Look up a customer and their history
//! casanova-cli customer lookup --email guest@example.com
//!
//! # Mark a reservation as a no-show (counted once)
//! casanova-cli reservation no-show 0b6f... --restaurant CASANOVA2024
//!
//! # Print the reservation feed with history, one JSON object per line
//! casanova-cli history
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "casanova-cli")]
#[command(author, version, about = "Casanova customer tracking CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Record reservation outcomes
    Reservation {
        #[command(subcommand)]
        action: ReservationAction,
    },
    /// Print a restaurant's reservations with customer history
    History {
        /// Restaurant code (defaults to `DEFAULT_RESTAURANT_CODE`)
        #[arg(short, long)]
        restaurant: Option<String>,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Find the customer matching an email and/or phone
    Lookup {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(short, long)]
        restaurant: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReservationAction {
    /// Mark a reservation as a no-show
    NoShow {
        /// Reservation id
        id: String,

        /// Customer to charge (defaults to the reservation's linked customer)
        #[arg(short, long)]
        customer: Option<String>,

        #[arg(short, long)]
        restaurant: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Customer { action } => match action {
            CustomerAction::Lookup {
                email,
                phone,
                restaurant,
            } => {
                commands::customer::lookup(
                    email.as_deref().unwrap_or_default(),
                    phone.as_deref().unwrap_or_default(),
                    restaurant.as_deref(),
                )
                .await?;
            }
        },
        Commands::Reservation { action } => match action {
            ReservationAction::NoShow {
                id,
                customer,
                restaurant,
            } => {
                commands::reservation::no_show(&id, customer.as_deref(), restaurant.as_deref())
                    .await?;
            }
        },
        Commands::History { restaurant } => {
            commands::history::print(restaurant.as_deref()).await?;
        }
    }
    Ok(())
}

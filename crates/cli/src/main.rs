//! PawPal CLI - session-store migrations and checkout tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! pawpal-cli migrate storefront
//!
//! # Create the back-office session table
//! pawpal-cli migrate admin
//!
//! # Both
//! pawpal-cli migrate all
//!
//! # Price a cart offline
//! pawpal-cli quote --cart cart.json --voucher voucher.json --shipping express
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use pawpal_core::ShippingMethod;
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "pawpal-cli")]
#[command(author, version, about = "PawPal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Print the checkout breakdown for a cart
    Quote {
        /// Cart JSON, inline or a file path
        #[arg(long)]
        cart: String,

        /// Voucher JSON, inline or a file path
        #[arg(long)]
        voucher: Option<String>,

        /// Shipping method (`standard` or `express`)
        #[arg(long, default_value = "standard")]
        shipping: ShippingMethod,

        /// Standard delivery fee in VND
        #[arg(long, default_value = "0")]
        standard_fee: Decimal,

        /// Express delivery fee in VND
        #[arg(long, default_value = "0")]
        express_fee: Decimal,

        /// Tax rate in percent, applied to the discounted subtotal
        #[arg(long, default_value = "0")]
        tax_rate: Decimal,

        /// Check voucher validity at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session table
    Storefront,
    /// Back-office session table
    Admin,
    /// Both session tables
    All,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawpal_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Quote {
            cart,
            voucher,
            shipping,
            standard_fee,
            express_fee,
            tax_rate,
            at,
        } => {
            let breakdown = commands::quote::run(&commands::quote::QuoteArgs {
                cart,
                voucher,
                shipping,
                standard_fee,
                express_fee,
                tax_rate,
                at,
            })?;
            #[allow(clippy::print_stdout)]
            {
                print!("{breakdown}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_quote_args_parse() {
        let cli = Cli::try_parse_from([
            "pawpal-cli",
            "quote",
            "--cart",
            "cart.json",
            "--shipping",
            "express",
            "--tax-rate",
            "8.5",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Quote {
            shipping, tax_rate, ..
        } = cli.command
        else {
            panic!("expected quote");
        };
        assert_eq!(shipping, ShippingMethod::Express);
        assert_eq!(tax_rate, Decimal::new(85, 1));
    }
}

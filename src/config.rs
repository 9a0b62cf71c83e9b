//! Command-line configuration

use std::path::PathBuf;

use clap::Parser;

/// Replays a cart script against in-memory stores and prints the resulting cart.
#[derive(Debug, Parser)]
#[command(name = "storefront-cart", about = "Storefront cart demo", long_about = None)]
pub struct CartConfig {
    /// Fixture set name; products, coupons and cart script share it
    #[arg(short, long, env = "CART_FIXTURE", default_value = "ties")]
    pub fixture: String,

    /// Directory holding the `products/`, `coupons/` and `carts/` fixtures
    #[arg(short = 'd', long, env = "CART_FIXTURES_DIR", default_value = "./fixtures")]
    pub fixtures_dir: PathBuf,

    /// Maximum number of recommended products to print
    #[arg(short, long, env = "CART_RECOMMENDATIONS", default_value_t = 4)]
    pub recommendations: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl CartConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

//! Cookbook Library
//!
//! This library provides the request-forwarding layer of a personal recipe
//! collection. Recipes live in a separate backend API; this crate signs users
//! in against an identity provider, relays their calls to the backend with a
//! bearer token attached and renders recipes in the terminal.
//!
//! # Modules
//!
//! - `api` - HTTP handlers of the authenticated proxy server
//! - `auth` - Token resolution, PKCE helpers and the identity provider client
//! - `cli` - Terminal pages (library, detail, form, export, photo upload)
//! - `client` - Typed HTTP client shared by the pages and the proxy
//! - `config` - Configuration loaded once from the environment
//! - `error` - Error types for the client and the auth layer
//! - `management` - Token cache used by the terminal pages
//! - `server` - Router assembly and the listening loop
//! - `session` - Session accessor capability and the in-memory session store
//! - `types` - Data structures exchanged with the backend
//! - `utils` - Client-side conveniences (search, form parsing, URLs)
//!
//! # Example
//!
//! ```no_run
//! use cookbook::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> cookbook::Res<()> {
//!     config::load_env().await?;
//!     let config = config::AppConfig::from_env()?;
//!     server::start_api_server(server::AppState::new(config)?).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used for top-level plumbing (startup, page handlers) where the concrete
/// error only matters for display. Library seams return the typed errors in
/// [`error`] instead.
///
/// # Example
///
/// ```
/// use cookbook::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```ignore
/// info!("Starting proxy server on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```ignore
/// success!("Recipe {} saved", id);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark to stderr and exits
/// the program.
///
/// Only for fatal errors in the terminal pages. Request handlers must never
/// call this; they report through [`warning!`] and answer with a response.
///
/// # Example
///
/// ```ignore
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark to stderr, keeping
/// stdout free for page output.
///
/// # Example
///
/// ```ignore
/// warning!("Upstream call failed: {}", err);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

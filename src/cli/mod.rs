//! # CLI Module
//!
//! The terminal pages of the cookbook. Each page fetches what it shows from
//! the backend through [`crate::client::ApiClient`], with the access token
//! kept by [`crate::management::TokenCache`], and renders it with tables and
//! coloured output.
//!
//! ## Pages
//!
//! - [`login`] / [`logout`] - sign in through the identity provider
//! - [`list_recipes`] - the library, with client-side search and filters
//! - [`show_recipe`] - one recipe in full
//! - [`create_recipe`] / [`edit_recipe`] - the recipe form
//! - [`delete_recipe`], [`export_recipe`] - actions on one recipe
//! - [`upload_photo`] - attach a photo to a recipe
//! - [`serve`] - run the proxy server
//!
//! A spinner runs while a page waits on its first fetch and is cleared on
//! every exit path. Failed calls end the page with an error line; there are
//! no retries.
//!
//! ## Usage Patterns
//!
//! ```bash
//! cookbook login
//! cookbook recipes --search soup --tag vegan
//! cookbook recipes create --title Soup --servings 4 --ingredient water --step boil
//! cookbook recipes export 42 --style artistic --open
//! cookbook photo soup.jpg --recipe 42
//! ```

mod auth;
mod photo;
mod recipes;
mod serve;

pub use auth::login;
pub use auth::logout;
pub use photo::upload_photo;
pub use recipes::{
    RecipeForm, create_recipe, delete_recipe, edit_recipe, export_recipe, list_recipes,
    show_recipe,
};
pub use serve::serve;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    auth::IdentityProvider, client::ApiClient, config::AppConfig, error,
    management::TokenCache,
};

/// Backend client and access token of the signed-in user.
struct Backend {
    client: ApiClient,
    token: String,
}

async fn connect(config: &AppConfig) -> Backend {
    let client = match ApiClient::new(&config.public_api_url, config.request_timeout) {
        Ok(client) => client.with_local_url(config.local_url()),
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    };

    let mut cache = match TokenCache::load().await {
        Ok(cache) => cache,
        Err(e) => error!(
            "Failed to load token. Please run cookbook login\n Error: {}",
            e
        ),
    };

    let idp = config.identity.clone().and_then(|identity| {
        IdentityProvider::new(identity, config.audience.clone(), config.request_timeout).ok()
    });
    let token = cache.valid_token(idp.as_ref()).await;

    Backend { client, token }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

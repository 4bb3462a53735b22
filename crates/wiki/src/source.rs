//! Documentation source abstraction.
//!
//! The orchestrator only needs two lookups, so it depends on this trait
//! instead of the HTTP client. Tests substitute in-memory sources.

use std::future::Future;
use std::pin::Pin;

use crate::client::{Client, Error};

/// Boxed future returned by [`PageSource`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Supplies documentation pages and titles keyed by game identifier.
pub trait PageSource: Send + Sync {
    /// Returns the raw page text, or `None` when the game has no page.
    fn fetch_page<'a>(&'a self, game_id: &'a str) -> BoxFuture<'a, Result<Option<String>, Error>>;

    /// Returns the storefront title, or `None` when unknown.
    fn fetch_title<'a>(&'a self, game_id: &'a str)
    -> BoxFuture<'a, Result<Option<String>, Error>>;
}

impl PageSource for Client {
    fn fetch_page<'a>(&'a self, game_id: &'a str) -> BoxFuture<'a, Result<Option<String>, Error>> {
        Box::pin(self.fetch_wikitext(game_id))
    }

    fn fetch_title<'a>(
        &'a self,
        game_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, Error>> {
        Box::pin(self.fetch_store_title(game_id))
    }
}

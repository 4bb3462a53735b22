//! Community wiki and storefront HTTP client.
//!
//! Async client using `reqwest` with an identifying `User-Agent` and a
//! bounded timeout. Non-success statuses and undecodable bodies are
//! reported as "not found" (`Ok(None)`); only transport failures are errors.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::types::{CargoQueryResponse, ParseResponse, StoreResponse};

/// MediaWiki API endpoint of the community wiki.
pub const DEFAULT_WIKI_URL: &str = "https://www.pcgamingwiki.com/w/api.php";

/// Storefront app details endpoint.
pub const DEFAULT_STORE_URL: &str = "https://store.steampowered.com/api/appdetails";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Returns the default `User-Agent` value.
pub fn default_user_agent() -> String {
    format!(
        "savescout/{} (+{})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY")
    )
}

/// Errors from the wiki client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid user agent")]
    InvalidUserAgent,
}

/// Wiki + storefront client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    wiki_url: String,
    store_url: String,
}

impl Client {
    /// Creates a new client sending `user_agent` on every request.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|_| Error::InvalidUserAgent)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            wiki_url: DEFAULT_WIKI_URL.to_string(),
            store_url: DEFAULT_STORE_URL.to_string(),
        })
    }

    /// Overrides the wiki API endpoint.
    pub fn with_wiki_url(mut self, url: impl Into<String>) -> Self {
        self.wiki_url = url.into();
        self
    }

    /// Overrides the storefront endpoint.
    pub fn with_store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = url.into();
        self
    }

    /// Performs a GET and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<T>, Error> {
        let resp = self.http.get(url).query(params).send().await?;
        let status = resp.status();

        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "unexpected response status");
            return Ok(None);
        }

        let body = resp.bytes().await?;
        match serde_json::from_slice(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(url, error = %e, "malformed response body");
                Ok(None)
            }
        }
    }

    /// Looks up the wiki page id for a Steam AppID.
    pub async fn page_id_for_app(&self, app_id: &str) -> Result<Option<String>, Error> {
        let filter = format!("Infobox_game.Steam_AppID HOLDS \"{app_id}\"");
        let params = [
            ("action", "cargoquery"),
            ("tables", "Infobox_game"),
            (
                "fields",
                "Infobox_game._pageID=PageID,Infobox_game.Steam_AppID",
            ),
            ("where", filter.as_str()),
            ("format", "json"),
        ];

        let resp: Option<CargoQueryResponse> = self.get_json(&self.wiki_url, &params).await?;
        let page_id = resp
            .and_then(|r| r.cargoquery.into_iter().next())
            .and_then(|row| row.title.page_id());

        match &page_id {
            Some(id) => tracing::debug!(app_id, page_id = %id, "wiki page found"),
            None => tracing::info!(app_id, "no wiki page for app"),
        }
        Ok(page_id)
    }

    /// Returns the raw wikitext of a page by id.
    pub async fn wikitext_by_page_id(&self, page_id: &str) -> Result<Option<String>, Error> {
        self.wikitext(("pageid", page_id)).await
    }

    /// Returns the raw wikitext of a page by title.
    pub async fn wikitext_by_title(&self, title: &str) -> Result<Option<String>, Error> {
        self.wikitext(("page", title)).await
    }

    async fn wikitext(&self, key: (&str, &str)) -> Result<Option<String>, Error> {
        let params = [
            ("action", "parse"),
            key,
            ("prop", "wikitext"),
            ("format", "json"),
        ];
        let resp: Option<ParseResponse> = self.get_json(&self.wiki_url, &params).await?;
        Ok(resp
            .and_then(|r| r.parse)
            .and_then(|p| p.wikitext)
            .map(|w| w.content))
    }

    /// Fetches the documentation page for a game.
    ///
    /// Numeric ids are Steam AppIDs; anything else is used as a page title.
    pub async fn fetch_wikitext(&self, game_id: &str) -> Result<Option<String>, Error> {
        if !is_app_id(game_id) {
            return self.wikitext_by_title(game_id).await;
        }
        match self.page_id_for_app(game_id).await? {
            Some(page_id) => self.wikitext_by_page_id(&page_id).await,
            None => Ok(None),
        }
    }

    /// Fetches the store title of a Steam AppID.
    pub async fn fetch_store_title(&self, game_id: &str) -> Result<Option<String>, Error> {
        if !is_app_id(game_id) {
            return Ok(None);
        }
        let resp: Option<StoreResponse> = self
            .get_json(&self.store_url, &[("appids", game_id)])
            .await?;
        Ok(resp
            .and_then(|mut r| r.remove(game_id))
            .filter(|entry| entry.success)
            .and_then(|entry| entry.data)
            .map(|data| data.name)
            .filter(|name| !name.is_empty()))
    }
}

/// True for identifiers made only of digits (Steam AppIDs).
pub fn is_app_id(game_id: &str) -> bool {
    !game_id.is_empty() && game_id.bytes().all(|b| b.is_ascii_digit())
}

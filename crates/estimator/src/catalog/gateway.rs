//! Remote catalog gateway.
//!
//! Issues the four CRUD calls against the catalog service and classifies the
//! outcome. Nothing here retries, caches or times out.

use std::sync::Arc;

use async_trait::async_trait;
use md_estimator_core::{CatalogItem, ItemDraft, ItemId};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use super::normalize::normalize_catalog;
use super::{CatalogError, DeleteError};
use crate::config::CatalogConfig;

/// Characters of a non-JSON error body quoted back to the user.
const ERROR_EXCERPT_CHARS: usize = 50;

/// Characters of a response body written to the log.
const LOG_EXCERPT_CHARS: usize = 500;

/// Operations the synchronization core needs from the catalog service.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Fetch and normalize the whole catalog.
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Create an item. The server assigns its identity.
    async fn create(&self, draft: &ItemDraft) -> Result<(), CatalogError>;

    /// Replace the name and price of an existing item.
    async fn update(&self, id: &ItemId, draft: &ItemDraft) -> Result<(), CatalogError>;

    /// Delete an item.
    async fn delete(&self, id: &ItemId) -> Result<(), DeleteError>;
}

/// Request body for create and update.
#[derive(Debug, Serialize)]
struct ItemBody<'a> {
    name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

impl<'a> From<&'a ItemDraft> for ItemBody<'a> {
    fn from(draft: &'a ItemDraft) -> Self {
        Self {
            name: draft.name(),
            price: draft.price().amount(),
        }
    }
}

// =============================================================================
// HttpCatalogGateway
// =============================================================================

/// `reqwest` implementation of [`CatalogGateway`].
#[derive(Clone)]
pub struct HttpCatalogGateway {
    inner: Arc<HttpCatalogGatewayInner>,
}

struct HttpCatalogGatewayInner {
    client: reqwest::Client,
    items_url: String,
}

impl HttpCatalogGateway {
    /// Create a gateway for the configured catalog service.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| CatalogError::Config(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(HttpCatalogGatewayInner {
                client,
                items_url: config.items_url(),
            }),
        })
    }

    /// URL of a single item, with the identity percent-encoded.
    fn item_url(&self, id: &ItemId) -> String {
        format!(
            "{}/{}",
            self.inner.items_url,
            urlencoding::encode(id.as_str())
        )
    }

    /// Turn a non-success response into [`CatalogError::Status`].
    async fn status_error(response: reqwest::Response) -> CatalogError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(
            status = %status,
            body = %excerpt(&body, LOG_EXCERPT_CHARS),
            "Catalog service returned non-success status"
        );
        CatalogError::Status {
            status: status.as_u16(),
            body: excerpt(&body, LOG_EXCERPT_CHARS),
        }
    }
}

impl std::fmt::Debug for HttpCatalogGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalogGateway")
            .field("items_url", &self.inner.items_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalogGateway {
    #[instrument(skip(self), fields(url = %self.inner.items_url))]
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        debug!("Fetching catalog");

        let response = self
            .inner
            .client
            .get(&self.inner.items_url)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Catalog fetch failed"))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text).inspect_err(|e| {
            error!(
                error = %e,
                body = %excerpt(&text, LOG_EXCERPT_CHARS),
                "Failed to parse catalog response"
            );
        })?;

        let items = normalize_catalog(&payload);
        debug!(count = items.len(), "Catalog fetched");
        Ok(items)
    }

    #[instrument(skip(self, draft), fields(name = %draft.name()))]
    async fn create(&self, draft: &ItemDraft) -> Result<(), CatalogError> {
        let response = self
            .inner
            .client
            .post(&self.inner.items_url)
            .header(CONTENT_TYPE, "application/json")
            .json(&ItemBody::from(draft))
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Item create failed"))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        debug!(status = %response.status(), "Item created");
        Ok(())
    }

    #[instrument(skip(self, id, draft), fields(id = %id, name = %draft.name()))]
    async fn update(&self, id: &ItemId, draft: &ItemDraft) -> Result<(), CatalogError> {
        let response = self
            .inner
            .client
            .put(self.item_url(id))
            .header(CONTENT_TYPE, "application/json")
            .json(&ItemBody::from(draft))
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Item update failed"))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        debug!(status = %response.status(), "Item updated");
        Ok(())
    }

    #[instrument(skip(self, id), fields(id = %id))]
    async fn delete(&self, id: &ItemId) -> Result<(), DeleteError> {
        ensure_persisted(id)?;

        let url = self.item_url(id);
        debug!(url = %url, "Sending delete request");

        // Some deployments reject DELETE without a JSON content type
        let response = match self
            .inner
            .client
            .delete(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Item delete failed");
                return Err(DeleteError::transport(&e));
            }
        };

        let status = response.status();
        debug!(status = %status, "Delete response received");

        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(status.as_u16(), &body);
        error!(status = %status, message = %message, "Item delete rejected");

        Err(DeleteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Refuse to delete items that were never saved server-side.
///
/// # Errors
///
/// Returns [`DeleteError::Unsaved`] for placeholder identities.
pub(crate) fn ensure_persisted(id: &ItemId) -> Result<(), DeleteError> {
    if id.is_placeholder() {
        warn!(id = %id, "Refusing to delete an item that was never saved");
        return Err(DeleteError::Unsaved);
    }
    Ok(())
}

/// Derive the user-facing message for a rejected delete.
///
/// Tries the JSON `message` field, then `error`, then a short excerpt of a
/// non-JSON body, and finally the bare status code.
fn rejection_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => ["message", "error"]
            .iter()
            .find_map(|key| {
                json.get(key)
                    .and_then(Value::as_str)
                    .filter(|message| !message.is_empty())
            })
            .map_or_else(|| generic_rejection(status), str::to_owned),
        Err(_) if !body.is_empty() => {
            format!("Server error: {}...", excerpt(body, ERROR_EXCERPT_CHARS))
        }
        Err(_) => generic_rejection(status),
    }
}

fn generic_rejection(status: u16) -> String {
    format!("Server error ({status})")
}

/// The first `max_chars` characters of `text`.
fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

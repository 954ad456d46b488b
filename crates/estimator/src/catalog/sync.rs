//! Synchronization core.
//!
//! Owns the in-memory catalog and sequences gateway calls. Every successful
//! mutation is followed by a full refetch; local state is never patched.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use md_estimator_core::{CatalogItem, ItemDraft, ItemId};
use tracing::{debug, info, instrument, warn};

use super::gateway::CatalogGateway;
use super::{CatalogError, DeleteError};

/// Message returned by a successful [`CatalogSync::delete`].
pub const DELETE_CONFIRMATION: &str = "Item deleted successfully";

#[derive(Debug, Default)]
struct CatalogState {
    items: Vec<CatalogItem>,
    /// Ticket of the refresh whose result is currently shown.
    applied_ticket: u64,
}

/// The locally held catalog, kept in step with the catalog service.
///
/// Concurrent refreshes are ordered by a ticket taken when each one starts.
/// A result is applied only if no newer-started refresh has been applied
/// already, so the newest request wins regardless of completion order.
#[derive(Debug)]
pub struct CatalogSync<G> {
    gateway: G,
    state: RwLock<CatalogState>,
    next_ticket: AtomicU64,
    in_flight: AtomicUsize,
}

impl<G: CatalogGateway> CatalogSync<G> {
    /// Create an empty catalog backed by `gateway`.
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: RwLock::new(CatalogState::default()),
            next_ticket: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// The gateway this catalog talks to.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Refetch the whole catalog.
    ///
    /// On failure the previously shown catalog is kept.
    ///
    /// # Errors
    ///
    /// Returns the gateway's [`CatalogError`] if the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), CatalogError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::enter(&self.in_flight);

        let items = self.gateway.fetch_all().await?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if ticket > state.applied_ticket {
            info!(ticket, count = items.len(), "Catalog refreshed");
            state.items = items;
            state.applied_ticket = ticket;
        } else {
            debug!(
                ticket,
                applied = state.applied_ticket,
                "Discarding stale catalog refresh"
            );
        }
        Ok(())
    }

    /// Create an item, then refetch.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the service rejects the item or is
    /// unreachable.
    pub async fn create(&self, draft: &ItemDraft) -> Result<(), CatalogError> {
        self.gateway.create(draft).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Replace an item's name and price, then refetch.
    ///
    /// Cart lines already holding the item keep their original values.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the service rejects the change or is
    /// unreachable.
    pub async fn update(&self, id: &ItemId, draft: &ItemDraft) -> Result<(), CatalogError> {
        self.gateway.update(id, draft).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Delete an item, then refetch.
    ///
    /// # Errors
    ///
    /// Returns [`DeleteError`] when the item was never saved, the service
    /// rejects the request, or no response arrives.
    pub async fn delete(&self, id: &ItemId) -> Result<&'static str, DeleteError> {
        self.gateway.delete(id).await?;
        self.refresh_after_mutation().await;
        Ok(DELETE_CONFIRMATION)
    }

    /// A refetch failing after a successful mutation does not undo it.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Catalog refresh after mutation failed");
        }
    }

    /// Snapshot of the current catalog.
    #[must_use]
    pub fn items(&self) -> Vec<CatalogItem> {
        self.read().items.clone()
    }

    /// Look up one item by identity.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<CatalogItem> {
        self.read().items.iter().find(|item| &item.id == id).cloned()
    }

    /// Items whose name contains `query`, ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<CatalogItem> {
        let needle = query.to_lowercase();
        self.read()
            .items
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Number of items in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// Whether any refresh is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts a refresh as in flight until dropped.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

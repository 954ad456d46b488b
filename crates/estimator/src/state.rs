//! Session-scoped application state.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{Local, NaiveDate};
use md_estimator_core::{ItemId, User};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, instrument, warn};

use crate::cart::{Cart, CartLine};
use crate::catalog::{CatalogError, CatalogGateway, CatalogSync, HttpCatalogGateway};
use crate::config::EstimatorConfig;
use crate::error::{Error, Result};
use crate::export::{EstimateSnapshot, ExportError};
use crate::session::{SessionError, SessionStore, UserDirectory};

/// Everything one estimating session works with.
///
/// This struct is cheaply cloneable via `Arc`. The catalog and the cart are
/// independent: refreshing the catalog never touches the cart.
pub struct Estimator<G = HttpCatalogGateway> {
    inner: Arc<EstimatorInner<G>>,
}

struct EstimatorInner<G> {
    catalog: CatalogSync<G>,
    cart: Mutex<Cart>,
    sessions: SessionStore,
    users: UserDirectory,
    current_user: RwLock<Option<User>>,
}

impl<G> Clone for Estimator<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Estimator<HttpCatalogGateway> {
    /// Create an estimator talking to the configured catalog service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &EstimatorConfig) -> std::result::Result<Self, CatalogError> {
        let gateway = HttpCatalogGateway::new(&config.catalog)?;
        Ok(Self::new(
            gateway,
            SessionStore::new(&config.session_file),
            UserDirectory::default(),
        ))
    }
}

impl<G: CatalogGateway> Estimator<G> {
    /// Create an estimator with an empty catalog, an empty cart and nobody
    /// signed in.
    #[must_use]
    pub fn new(gateway: G, sessions: SessionStore, users: UserDirectory) -> Self {
        Self {
            inner: Arc::new(EstimatorInner {
                catalog: CatalogSync::new(gateway),
                cart: Mutex::new(Cart::new()),
                sessions,
                users,
                current_user: RwLock::new(None),
            }),
        }
    }

    /// Restore the stored identity and load the catalog.
    ///
    /// The identity is restored even if the catalog cannot be loaded.
    ///
    /// # Errors
    ///
    /// Returns the [`CatalogError`] of the initial refresh.
    #[instrument(skip(self))]
    pub async fn start(&self) -> std::result::Result<(), CatalogError> {
        self.restore_session();
        self.inner.catalog.refresh().await
    }

    /// Restore the stored identity, if any, without touching the catalog.
    pub fn restore_session(&self) -> Option<User> {
        let user = self.inner.sessions.load()?;
        info!(username = %user.username, "Restored session");
        *self.user_slot() = Some(user.clone());
        Some(user)
    }

    /// The synchronized catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogSync<G> {
        &self.inner.catalog
    }

    /// Lock the cart.
    pub async fn cart(&self) -> MutexGuard<'_, Cart> {
        self.inner.cart.lock().await
    }

    /// Add `quantity` units of a catalog item to the cart.
    ///
    /// The line snapshots the item as currently listed. Returns the line as
    /// it stands afterwards, or `None` when `quantity` is zero and the item
    /// was not already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownItem`] if `id` is not in the catalog.
    pub async fn add_to_cart(&self, id: &ItemId, quantity: u32) -> Result<Option<CartLine>> {
        let item = self
            .inner
            .catalog
            .item(id)
            .ok_or_else(|| Error::UnknownItem(id.clone()))?;

        let mut cart = self.cart().await;
        cart.add(item, quantity);
        Ok(cart.line(id).cloned())
    }

    /// Sign in as a known user and remember the identity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownUser`] for unknown usernames, or an
    /// I/O error if the identity cannot be stored.
    #[instrument(skip(self))]
    pub fn login(&self, username: &str) -> std::result::Result<User, SessionError> {
        let Some(user) = self.inner.users.find(username).cloned() else {
            warn!("Login rejected for unknown user");
            return Err(SessionError::UnknownUser(username.to_string()));
        };

        self.inner.sessions.save(&user)?;
        *self.user_slot() = Some(user.clone());
        info!(role = %user.role, "User logged in");
        Ok(user)
    }

    /// Sign out: forget the identity and discard the estimate.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored identity cannot be removed. The cart
    /// and in-memory identity are cleared regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> std::result::Result<(), SessionError> {
        self.cart().await.clear();
        let previous = self.user_slot().take();
        if let Some(user) = previous {
            info!(username = %user.username, "User logged out");
        }
        self.inner.sessions.clear()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner
            .current_user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot the cart for the print collaborator, dated `date`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EmptyEstimate`] if the cart is empty.
    pub async fn export(&self, date: NaiveDate) -> std::result::Result<EstimateSnapshot, ExportError> {
        self.cart().await.snapshot(date)
    }

    /// Snapshot the cart dated today in local time.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EmptyEstimate`] if the cart is empty.
    pub async fn export_today(&self) -> std::result::Result<EstimateSnapshot, ExportError> {
        self.export(Local::now().date_naive()).await
    }

    fn user_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<User>> {
        self.inner
            .current_user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use md_estimator_core::{CatalogItem, ItemDraft, Price, Role};
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::test_support::MemoryGateway;

    fn panel() -> CatalogItem {
        CatalogItem::new("1", "Panel", Price::new(Decimal::from(500)).unwrap())
    }

    fn build(dir: &tempfile::TempDir) -> Estimator<MemoryGateway> {
        Estimator::new(
            MemoryGateway::with_items(vec![panel()]),
            SessionStore::new(dir.path().join("session.json")),
            UserDirectory::default(),
        )
    }

    #[tokio::test]
    async fn test_start_loads_catalog_and_identity() {
        let dir = tempfile::tempdir().unwrap();
        build(&dir).login("emp").unwrap();

        let restarted = build(&dir);
        restarted.start().await.unwrap();

        assert_eq!(restarted.current_user().unwrap().role, Role::Employee);
        assert_eq!(restarted.catalog().items(), vec![panel()]);
    }

    #[tokio::test]
    async fn test_add_to_cart_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = build(&dir);
        estimator.start().await.unwrap();
        let id = ItemId::new("1");

        estimator.add_to_cart(&id, 1).await.unwrap();
        assert_eq!(estimator.cart().await.total(), Decimal::from(500));

        let line = estimator.add_to_cart(&id, 2).await.unwrap().unwrap();
        assert_eq!(line.quantity, 3);
        let cart = estimator.cart().await;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), Decimal::from(1500));
    }

    #[tokio::test]
    async fn test_add_unknown_item() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = build(&dir);
        estimator.start().await.unwrap();

        let err = estimator.add_to_cart(&ItemId::new("99"), 1).await.unwrap_err();
        assert!(matches!(err, Error::UnknownItem(id) if id.as_str() == "99"));
    }

    #[tokio::test]
    async fn test_cart_keeps_snapshot_after_update() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = build(&dir);
        estimator.start().await.unwrap();
        let id = ItemId::new("1");
        estimator.add_to_cart(&id, 2).await.unwrap();

        let draft = ItemDraft::parse("Panel Deluxe", "900").unwrap();
        estimator.catalog().update(&id, &draft).await.unwrap();

        assert_eq!(estimator.catalog().item(&id).unwrap().name, "Panel Deluxe");
        let cart = estimator.cart().await;
        let line = cart.line(&id).unwrap();
        assert_eq!(line.item.name, "Panel");
        assert_eq!(cart.total(), Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = build(&dir);

        assert!(matches!(
            estimator.login("root"),
            Err(SessionError::UnknownUser(name)) if name == "root"
        ));
        assert!(estimator.current_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_cart_and_identity() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = build(&dir);
        estimator.start().await.unwrap();
        estimator.login("admin").unwrap();
        estimator.add_to_cart(&ItemId::new("1"), 4).await.unwrap();
        estimator.cart().await.set_customer_name("Asha");

        estimator.logout().await.unwrap();

        assert!(estimator.current_user().is_none());
        let cart = estimator.cart().await;
        assert!(cart.is_empty());
        assert_eq!(cart.customer_name(), "");
        drop(cart);

        let restarted = build(&dir);
        restarted.start().await.unwrap();
        assert!(restarted.current_user().is_none());
    }

    #[tokio::test]
    async fn test_export_requires_lines() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = build(&dir);
        estimator.start().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        assert!(matches!(
            estimator.export(date).await,
            Err(ExportError::EmptyEstimate)
        ));

        estimator.add_to_cart(&ItemId::new("1"), 1).await.unwrap();
        let snapshot = estimator.export(date).await.unwrap();
        assert_eq!(snapshot.total, Decimal::from(500));
    }
}

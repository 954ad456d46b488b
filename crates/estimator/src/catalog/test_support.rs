//! In-memory catalog service for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use md_estimator_core::{CatalogItem, ItemDraft, ItemId};

use super::gateway::{CatalogGateway, ensure_persisted};
use super::{CatalogError, DeleteError};

/// In-memory catalog service.
#[derive(Default)]
pub struct MemoryGateway {
    pub items: Mutex<Vec<CatalogItem>>,
    pub next_id: AtomicU64,
    pub fetches: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_mutations: AtomicBool,
}

impl MemoryGateway {
    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        let gateway = Self::default();
        *gateway.items.lock().unwrap() = items;
        gateway
    }

    fn rejection() -> CatalogError {
        CatalogError::Status {
            status: 500,
            body: "unavailable".to_string(),
        }
    }
}

#[async_trait]
impl CatalogGateway for MemoryGateway {
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::rejection());
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn create(&self, draft: &ItemDraft) -> Result<(), CatalogError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Self::rejection());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 100;
        self.items.lock().unwrap().push(CatalogItem::new(
            id.to_string(),
            draft.name(),
            draft.price(),
        ));
        Ok(())
    }

    async fn update(&self, id: &ItemId, draft: &ItemDraft) -> Result<(), CatalogError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Self::rejection());
        }
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(Self::rejection)?;
        item.name = draft.name().to_string();
        item.price = draft.price();
        Ok(())
    }

    async fn delete(&self, id: &ItemId) -> Result<(), DeleteError> {
        ensure_persisted(id)?;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| &item.id != id);
        if items.len() == before {
            return Err(DeleteError::Rejected {
                status: 404,
                message: "not found".to_string(),
            });
        }
        Ok(())
    }
}

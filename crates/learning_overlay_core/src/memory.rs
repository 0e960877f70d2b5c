//! In-process implementations of the overlay ports, used by tests and by embedders
//! that do not need the overlays to survive a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use crate::ports::{OverlayDirectory, OverlayStore, OverlayUpdateGuard, PortError, PortResult};

#[derive(Debug, Default)]
pub struct MemoryOverlayStore {
    entries: RwLock<HashMap<String, String>>,
    update_lock: Arc<tokio::sync::Mutex<()>>,
}

impl MemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> PortError {
    PortError::Unexpected("overlay store lock poisoned".to_string())
}

#[async_trait]
impl OverlayStore for MemoryOverlayStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.clear();
        Ok(())
    }

    async fn lock_for_update(&self) -> OverlayUpdateGuard {
        self.update_lock.clone().lock_owned().await
    }
}

/// Keeps one `MemoryOverlayStore` per device for the lifetime of the directory.
#[derive(Debug, Default)]
pub struct MemoryOverlayDirectory {
    stores: Mutex<HashMap<Uuid, Arc<MemoryOverlayStore>>>,
}

impl MemoryOverlayDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverlayDirectory for MemoryOverlayDirectory {
    fn open(&self, device_id: Uuid) -> Arc<dyn OverlayStore> {
        // A poisoned map still holds valid stores; keep serving them.
        let mut stores = match self.stores.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        stores
            .entry(device_id)
            .or_insert_with(|| Arc::new(MemoryOverlayStore::new()))
            .clone()
    }
}

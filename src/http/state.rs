use crate::config::Config;
use crate::http::error::{HttpError, HttpResult};
use crate::photos::{FsPhotoStorage, PhotoStorage};
use crate::platform;
use crate::repertoire::models::RepertoireItem;
use crate::store::ItemStore;
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct HttpState {
    pub store: ItemStore,
    pub photos: Arc<dyn PhotoStorage>,
}

impl HttpState {
    pub fn new(store: ItemStore, photos: Arc<dyn PhotoStorage>) -> Self {
        Self { store, photos }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let data_dir = platform::get_data_dir(config.storage.data_dir_override.as_ref())
            .context("Failed to resolve data directory")?;
        tracing::info!("Using data directory {}", data_dir.display());

        Ok(Self::new(
            ItemStore::open(&data_dir),
            Arc::new(FsPhotoStorage::new(platform::photos_dir(&data_dir))),
        ))
    }

    /// Deletes an item together with its photo file
    pub fn delete_item(&self, id: u64) -> anyhow::Result<Option<RepertoireItem>> {
        let removed = self.store.delete(id)?;
        if let Some(photo) = removed.as_ref().and_then(|item| item.photo.as_deref()) {
            self.discard_photo(photo);
        }
        Ok(removed)
    }

    /// Best effort; the record change already happened
    pub fn discard_photo(&self, name: &str) {
        if let Err(e) = self.photos.delete(name) {
            tracing::warn!("Failed to delete photo {}: {:#}", name, e);
        }
    }

    /// Run file-backed store and photo work off the async workers
    pub async fn blocking<F, R>(&self, f: F) -> HttpResult<R>
    where
        F: FnOnce(&HttpState) -> anyhow::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|e| HttpError::Internal(anyhow::Error::new(e)))?
            .map_err(HttpError::Internal)
    }
}

use crate::repertoire::models::{FieldErrors, ItemDraft, ListFilter, RepertoireItem};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// On-disk collection of repertoire items
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Catalog {
    pub version: String,
    pub next_id: u64,
    pub items: Vec<RepertoireItem>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            next_id: 1,
            items: Vec::new(),
        }
    }
}

impl Catalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).context("Failed to read catalog file")?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).context("Failed to parse catalog JSON")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize catalog")?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers never take the lock, so replace the file atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&RepertoireItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn find_by_photo(&self, photo: &str) -> Option<&RepertoireItem> {
        self.items
            .iter()
            .find(|item| item.photo.as_deref() == Some(photo))
    }

    /// Items matching `filter`, in ascending id order
    pub fn search<'a>(&'a self, filter: &'a ListFilter) -> impl Iterator<Item = &'a RepertoireItem> {
        self.items.iter().filter(move |item| filter.matches(item))
    }

    /// Ids are never reused, even after deletes
    pub fn insert(&mut self, draft: ItemDraft) -> &RepertoireItem {
        let id = self.next_id.max(self.max_id() + 1);
        self.next_id = id + 1;
        self.items.push(RepertoireItem::from_draft(id, draft));
        &self.items[self.items.len() - 1]
    }

    pub fn replace(&mut self, id: u64, draft: ItemDraft) -> Option<&RepertoireItem> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        *item = RepertoireItem::from_draft(id, draft);
        Some(&*item)
    }

    pub fn remove(&mut self, id: u64) -> Option<RepertoireItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    fn max_id(&self) -> u64 {
        self.items.iter().map(|item| item.id).max().unwrap_or(0)
    }
}

pub fn with_catalog_lock<F, R>(lock_path: &Path, catalog_path: &Path, f: F) -> Result<R>
where
    F: FnOnce(&mut Catalog) -> Result<R>,
{
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(lock_path)
        .context("Failed to open lock file")?;

    file.lock_exclusive().context("Failed to acquire lock")?;

    let mut catalog = Catalog::load(catalog_path)?;

    let result = f(&mut catalog);

    if result.is_ok() {
        catalog.save(catalog_path)?;
    }

    file.unlock().context("Failed to unlock")?;

    result
}

/// Result of [`ItemStore::update`]
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The item as stored now, and as it was before the edit
    Updated {
        item: RepertoireItem,
        previous: RepertoireItem,
    },
    Invalid(FieldErrors),
    NotFound,
}

/// Blocking record store over a lock-guarded JSON catalog
#[derive(Debug, Clone)]
pub struct ItemStore {
    lock_path: PathBuf,
    catalog_path: PathBuf,
}

impl ItemStore {
    pub fn new(lock_path: PathBuf, catalog_path: PathBuf) -> Self {
        Self {
            lock_path,
            catalog_path,
        }
    }

    /// Store rooted at `dir` (`catalog.lock` + `catalog.json`)
    pub fn open(dir: &Path) -> Self {
        Self::new(dir.join("catalog.lock"), dir.join("catalog.json"))
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<RepertoireItem>> {
        let catalog = Catalog::load(&self.catalog_path)?;
        Ok(catalog.search(filter).cloned().collect())
    }

    pub fn get(&self, id: u64) -> Result<Option<RepertoireItem>> {
        let catalog = Catalog::load(&self.catalog_path)?;
        Ok(catalog.get(id).cloned())
    }

    pub fn find_by_photo(&self, photo: &str) -> Result<Option<RepertoireItem>> {
        let catalog = Catalog::load(&self.catalog_path)?;
        Ok(catalog.find_by_photo(photo).cloned())
    }

    pub fn create(&self, draft: ItemDraft) -> Result<RepertoireItem> {
        with_catalog_lock(&self.lock_path, &self.catalog_path, |catalog| {
            Ok(catalog.insert(draft).clone())
        })
    }

    /// Applies `edit` to the stored item while holding the catalog lock, so
    /// concurrent edits of one item never overwrite each other. The edited
    /// draft is validated before it replaces the item; a rejected edit
    /// changes nothing.
    pub fn update<F>(&self, id: u64, edit: F) -> Result<UpdateOutcome>
    where
        F: FnOnce(&mut ItemDraft) -> Result<(), FieldErrors>,
    {
        with_catalog_lock(&self.lock_path, &self.catalog_path, |catalog| {
            let Some(previous) = catalog.get(id).cloned() else {
                return Ok(UpdateOutcome::NotFound);
            };

            let mut draft = previous.to_draft();
            if let Err(errors) = edit(&mut draft).and_then(|()| draft.validate()) {
                return Ok(UpdateOutcome::Invalid(errors));
            }

            Ok(match catalog.replace(id, draft) {
                Some(item) => UpdateOutcome::Updated {
                    item: item.clone(),
                    previous,
                },
                None => UpdateOutcome::NotFound,
            })
        })
    }

    pub fn delete(&self, id: u64) -> Result<Option<RepertoireItem>> {
        with_catalog_lock(&self.lock_path, &self.catalog_path, |catalog| {
            Ok(catalog.remove(id))
        })
    }
}

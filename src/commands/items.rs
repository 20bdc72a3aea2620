use crate::OutputFormat;
use crate::config::Config;
use crate::photos::{FsPhotoStorage, PhotoStorage};
use crate::platform;
use crate::repertoire::form::RepertoireForm;
use crate::repertoire::models::{FieldErrors, ListFilter, RepertoireItem};
use crate::store::{ItemStore, UpdateOutcome};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Field values given on the command line; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub name: Option<String>,
    pub date: Option<String>,
    pub rating: Option<String>,
    pub review: Option<String>,
    pub kind: Option<String>,
    pub duration: Option<String>,
    pub season: Option<String>,
    pub photo: Option<PathBuf>,
}

impl ItemFields {
    fn apply_to(&self, form: &mut RepertoireForm) {
        let overlay = [
            (&mut form.name, &self.name),
            (&mut form.date, &self.date),
            (&mut form.rating, &self.rating),
            (&mut form.review, &self.review),
            (&mut form.kind, &self.kind),
            (&mut form.duration, &self.duration),
            (&mut form.season, &self.season),
        ];
        for (slot, value) in overlay {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
    }
}

struct Local {
    store: ItemStore,
    photos: FsPhotoStorage,
}

fn open_local(config: &Config) -> Result<Local> {
    let data_dir = platform::get_data_dir(config.storage.data_dir_override.as_ref())?;
    Ok(Local {
        store: ItemStore::open(&data_dir),
        photos: FsPhotoStorage::new(platform::photos_dir(&data_dir)),
    })
}

pub fn list(config: &Config, filter: &ListFilter, format: OutputFormat) -> Result<()> {
    let items = open_local(config)?.store.list(filter)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    print_table(&items);
    Ok(())
}

pub fn show(config: &Config, id: u64, format: OutputFormat) -> Result<()> {
    let item = open_local(config)?
        .store
        .get(id)?
        .with_context(|| format!("Item {} not found", id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&item)?),
        OutputFormat::Text => print_item(&item),
    }
    Ok(())
}

pub fn add(config: &Config, fields: &ItemFields) -> Result<()> {
    let local = open_local(config)?;

    let mut form = RepertoireForm::default();
    fields.apply_to(&mut form);
    let mut draft = form.validate(None).map_err(invalid)?;

    if let Some(path) = &fields.photo {
        draft.photo = Some(store_photo(&local.photos, path)?);
    }

    let photo = draft.photo.clone();
    let item = local.store.create(draft).inspect_err(|_| {
        if let Some(photo) = &photo {
            discard_photo(&local.photos, photo);
        }
    })?;
    tracing::info!("Created item {}", item.id);
    println!("✓ Added item {}: {}", item.id, item.name);
    Ok(())
}

/// Overlays `fields` on the stored item under the catalog lock
pub fn edit(config: &Config, id: u64, fields: &ItemFields, clear_duration: bool) -> Result<()> {
    let local = open_local(config)?;

    let uploaded = fields
        .photo
        .as_deref()
        .map(|path| store_photo(&local.photos, path))
        .transpose()?;
    let discard_upload = || {
        if let Some(photo) = &uploaded {
            discard_photo(&local.photos, photo);
        }
    };

    let outcome = local
        .store
        .update(id, |draft| {
            let mut form = RepertoireForm::from_draft(draft);
            fields.apply_to(&mut form);
            if clear_duration {
                form.duration.clear();
            }
            let photo = uploaded.clone().or_else(|| draft.photo.take());
            *draft = form.validate(photo)?;
            Ok(())
        })
        .inspect_err(|_| discard_upload())?;

    let (item, previous) = match outcome {
        UpdateOutcome::Updated { item, previous } => (item, previous),
        UpdateOutcome::Invalid(errors) => {
            discard_upload();
            return Err(invalid(errors));
        }
        UpdateOutcome::NotFound => {
            discard_upload();
            anyhow::bail!("Item {} not found", id);
        }
    };

    if let Some(old) = previous.photo.as_deref() {
        if item.photo.as_deref() != Some(old) {
            discard_photo(&local.photos, old);
        }
    }

    println!("✓ Updated item {}: {}", item.id, item.name);
    Ok(())
}

pub fn delete(config: &Config, id: u64, dry_run: bool) -> Result<()> {
    let local = open_local(config)?;

    if dry_run {
        let item = local
            .store
            .get(id)?
            .with_context(|| format!("Item {} not found", id))?;
        println!("[DRY-RUN] Would delete item {}: {}", item.id, item.name);
        if let Some(photo) = &item.photo {
            println!("[DRY-RUN] Would delete photo {}", photo);
        }
        return Ok(());
    }

    let item = local
        .store
        .delete(id)?
        .with_context(|| format!("Item {} not found", id))?;

    if let Some(photo) = item.photo.as_deref() {
        discard_photo(&local.photos, photo);
    }

    println!("✓ Deleted item {}: {}", item.id, item.name);
    Ok(())
}

fn store_photo(photos: &FsPhotoStorage, path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read photo {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Photo path has no file name")?;

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(invalid(FieldErrors::single(
            "photo",
            format!("{} is not an image", path.display()),
        )));
    }

    photos.save(file_name, &bytes)
}

fn discard_photo(photos: &FsPhotoStorage, name: &str) {
    if let Err(e) = photos.delete(name) {
        tracing::warn!("Failed to delete photo {}: {:#}", name, e);
    }
}

fn invalid(errors: FieldErrors) -> anyhow::Error {
    let lines: Vec<String> = errors
        .iter()
        .map(|(field, messages)| format!("  {}: {}", field, messages.join(" ")))
        .collect();
    anyhow::anyhow!("Invalid item:\n{}", lines.join("\n"))
}

pub(crate) fn print_table(items: &[RepertoireItem]) {
    println!(
        "{:<6} {:<40} {:<8} {:<12} {:<7} {:<8}",
        "ID", "Name", "Kind", "Date", "Rating", "Duration"
    );
    println!("{}", "-".repeat(86));

    for item in items {
        let name: String = if item.name.chars().count() > 38 {
            format!("{}...", item.name.chars().take(35).collect::<String>())
        } else {
            item.name.clone()
        };

        println!(
            "{:<6} {:<40} {:<8} {:<12} {:<7} {:<8}",
            item.id,
            name,
            item.kind.code(),
            item.date.format("%Y-%m-%d").to_string(),
            item.rating.to_string(),
            crate::repertoire::duration::format_optional(item.duration),
        );
    }
}

pub(crate) fn print_item(item: &RepertoireItem) {
    println!("Item {}: {}", item.id, item.name);
    println!("Kind: {}", item.kind.label());
    println!("Date: {}", item.date.format("%Y-%m-%d"));
    println!("Rating: {}", item.rating);
    if let Some(duration) = item.duration {
        println!("Duration: {}", duration);
    }
    if let Some(season) = item.season {
        println!("Season: {}", season);
    }
    if let Some(photo) = &item.photo {
        println!("Photo: {}", photo);
    }
    println!();
    println!("{}", item.review);
}

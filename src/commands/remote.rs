use crate::OutputFormat;
use crate::client::ApiClient;
use crate::config::Config;
use crate::http::types::{ApiItem, ItemPayload};
use crate::repertoire::models::{ListFilter, RepertoireItem};
use anyhow::Result;

fn client(config: &Config) -> Result<ApiClient> {
    let token = config.get_remote_token()?;
    Ok(ApiClient::new(&config.remote.url, &token))
}

pub fn list(config: &Config, filter: &ListFilter, format: OutputFormat) -> Result<()> {
    let items = client(config)?.list_items(filter)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    let items: Vec<RepertoireItem> = items.into_iter().map(|api| api.item).collect();
    super::items::print_table(&items);
    Ok(())
}

pub fn show(config: &Config, id: u64, format: OutputFormat) -> Result<()> {
    let item = client(config)?.get_item(id)?;
    print(&item, format)
}

pub fn edit(
    config: &Config,
    id: u64,
    payload: &ItemPayload,
    format: OutputFormat,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        println!("[DRY-RUN] Would PATCH item {} on {}", id, config.remote.url);
        println!("{}", serde_json::to_string_pretty(payload)?);
        return Ok(());
    }

    let item = client(config)?.update_item(id, payload, true)?;
    print(&item, format)
}

pub fn delete(config: &Config, id: u64, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("[DRY-RUN] Would delete item {} on {}", id, config.remote.url);
        return Ok(());
    }

    client(config)?.delete_item(id)?;
    println!("✓ Deleted remote item {}", id);
    Ok(())
}

pub fn login(config: &Config, token: &str) -> Result<()> {
    if !config.remote.use_keyring {
        anyhow::bail!(
            "Keyring storage is disabled. Set remote.token in ~/.repertoire/config.toml instead"
        );
    }

    crate::keyring::store_remote_token(&config.remote.url, token)?;
    println!(
        "✓ Remote token for {} stored in system keyring",
        crate::keyring::account_for(&config.remote.url)
    );
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    let account = crate::keyring::account_for(&config.remote.url);
    if crate::keyring::delete_remote_token(&config.remote.url)? {
        println!("✓ Remote token for {} removed from system keyring", account);
    } else {
        println!("No remote token stored for {}", account);
    }
    Ok(())
}

fn print(item: &ApiItem, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
        OutputFormat::Text => {
            super::items::print_item(&item.item);
            if let Some(url) = &item.photo_url {
                println!("Photo URL: {}", url);
            }
        }
    }
    Ok(())
}

use crate::http::types::{ApiItem, ItemPayload};
use crate::repertoire::models::ListFilter;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};

/// Blocking client for the REST API of a running instance
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Helper for testing to override base URL (e.g. wiremock)
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/api/items/{}", self.base_url, id)
    }

    pub fn list_items(&self, filter: &ListFilter) -> Result<Vec<ApiItem>> {
        let url = format!("{}/api/items", self.base_url);

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(search) = &filter.search {
            query.push(("search", search.clone()));
        }
        if let Some(kind) = filter.kind {
            query.push(("kind", kind.code().to_string()));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(&query)
            .send()
            .context("Failed to send request to repertoire API")?;

        let response = check_status(response, "List")?;

        response
            .json::<Vec<ApiItem>>()
            .context("Failed to parse item list")
    }

    pub fn get_item(&self, id: u64) -> Result<ApiItem> {
        let response = self
            .client
            .get(self.item_url(id))
            .header("Authorization", self.auth_header())
            .send()
            .context("Failed to send request to repertoire API")?;

        let response = check_status(response, "Get")?;

        response.json::<ApiItem>().context("Failed to parse item")
    }

    /// `PATCH` when `partial`, otherwise a full `PUT`
    pub fn update_item(&self, id: u64, payload: &ItemPayload, partial: bool) -> Result<ApiItem> {
        let request = if partial {
            self.client.patch(self.item_url(id))
        } else {
            self.client.put(self.item_url(id))
        };

        let response = request
            .header("Authorization", self.auth_header())
            .json(payload)
            .send()
            .context("Failed to send update to repertoire API")?;

        let response = check_status(response, "Update")?;

        response
            .json::<ApiItem>()
            .context("Failed to parse updated item")
    }

    pub fn delete_item(&self, id: u64) -> Result<()> {
        let response = self
            .client
            .delete(self.item_url(id))
            .header("Authorization", self.auth_header())
            .send()
            .context("Failed to send delete to repertoire API")?;

        check_status(response, "Delete")?;
        Ok(())
    }
}

fn check_status(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => anyhow::bail!(
            "{} failed: remote rejected the token ({}). Run 'repertoire remote login --token <TOKEN>'",
            operation,
            body
        ),
        StatusCode::NOT_FOUND => anyhow::bail!("{} failed: item not found", operation),
        _ => anyhow::bail!("{} failed: status {} {}", operation, status, body),
    }
}

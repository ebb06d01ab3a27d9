//! Client for the provider's table API (`/rest/v1`).
//!
//! Queries are built fluently and scoped to a bearer token, so row-level
//! security is evaluated as the signed-in user:
//!
//! ```ignore
//! let rows: Vec<UserRow> = records
//!     .table("users")
//!     .bearer(token)
//!     .select(UserRow::COLUMNS)
//!     .eq("id", user_id)
//!     .fetch()
//!     .await?;
//! ```

use crate::config::ProviderSettings;
use crate::services::error::{read_empty, read_json, ProviderError};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use std::fmt::Display;

#[derive(Clone)]
pub struct RecordsClient {
    client: Client,
    base_url: String,
    anon_key: Secret<String>,
}

impl RecordsClient {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", settings.url.trim_end_matches('/')),
            anon_key: settings.anon_key.clone(),
        }
    }

    /// Start a query against `table`.
    pub fn table(&self, table: &str) -> TableQuery {
        TableQuery {
            records: self.clone(),
            table: table.to_string(),
            token: None,
            select: None,
            filters: Vec::new(),
            order: None,
        }
    }
}

pub struct TableQuery {
    records: RecordsClient,
    table: String,
    token: Option<String>,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<String>,
}

impl TableQuery {
    /// Run the query as the owner of `token` instead of the anonymous role.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order = Some(format!("{}.{}", column, direction));
        self
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 2);
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        pairs
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.records.base_url, self.table);
        let anon_key = self.records.anon_key.expose_secret();
        let bearer = self.token.as_deref().unwrap_or(anon_key);

        self.records
            .client
            .request(method, url)
            .query(&self.query_pairs())
            .header("apikey", anon_key)
            .bearer_auth(bearer)
    }

    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, ProviderError> {
        let response = self.request(reqwest::Method::GET).send().await?;
        read_json(response).await
    }

    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, ProviderError> {
        Ok(self.fetch::<T>().await?.into_iter().next())
    }

    /// Delete every matching row. A query without filters is refused.
    pub async fn delete(self) -> Result<(), ProviderError> {
        if self.filters.is_empty() {
            return Err(ProviderError::InvalidRequest(format!(
                "Refusing to delete from '{}' without a filter",
                self.table
            )));
        }

        let response = self
            .request(reqwest::Method::DELETE)
            .header("Prefer", "return=minimal")
            .send()
            .await?;

        read_empty(response).await?;
        tracing::info!(table = %self.table, filters = ?self.filters, "Rows deleted");
        Ok(())
    }
}

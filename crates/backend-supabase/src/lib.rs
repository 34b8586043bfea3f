//! Supabase (PostgREST) recall store implementation.
//!
//! Provides the `RecallStore` trait and its Supabase implementation, plus
//! the upstream RappelConso sync. The trait keeps the pipeline
//! backend-agnostic: the normalizer and the stats engine only ever see
//! `RawRecallRecord` collections.

use rappelscope_model::{RawRecallRecord, RecallQuery};
use rappelscope_query::{PostgrestDialect, QueryDialect};
use std::future::Future;
use thiserror::Error;

/// Errors from recall store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Store not available")]
    Unavailable,
}

/// Trait for recall stores (Supabase today, anything PostgREST-shaped later).
///
/// The core pipeline never retries; recoverable failures surface to the
/// caller which degrades to an empty collection.
pub trait RecallStore {
    /// Load the full history, newest first.
    fn load_all(&self)
        -> impl Future<Output = Result<Vec<RawRecallRecord>, StoreError>> + Send;

    /// Paged/filtered query; returns the rows and the exact total count.
    fn search(
        &self,
        query: &RecallQuery,
    ) -> impl Future<Output = Result<(Vec<RawRecallRecord>, u64), StoreError>> + Send;

    /// Insert or update records keyed on `numero_fiche`, so repeated
    /// synchronization is idempotent.
    fn upsert(
        &self,
        records: &[RawRecallRecord],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Check if the store is reachable.
    fn health_check(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Store name for logging.
    fn name(&self) -> &'static str;
}

/// Supabase store configuration.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL (PostgREST lives under `/rest/v1`)
    pub base_url: String,
    /// Table name
    pub table: String,
    /// anon or service-role API key
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:54321".to_string(),
            table: "rappel".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Supabase (PostgREST) recall store.
pub struct SupabaseStore {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStore {
    /// Create a new Supabase store.
    pub fn new(config: SupabaseConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn fetch_rows(
        &self,
        params: &[(String, String)],
        count_exact: bool,
    ) -> Result<(Vec<RawRecallRecord>, Option<u64>), StoreError> {
        let mut request = self.authed(self.client.get(self.table_url()).query(params));
        if count_exact {
            request = request.header("Prefer", "count=exact");
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::QueryFailed(format!("HTTP {}: {}", status, body)));
        }

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let rows: Vec<RawRecallRecord> = response
            .json()
            .await
            .map_err(|e| StoreError::ParseError(e.to_string()))?;

        Ok((rows, total))
    }
}

/// Total from a PostgREST `Content-Range` header, e.g. `0-49/1234`.
fn parse_content_range_total(header: &str) -> Option<u64> {
    let total = header.rsplit('/').next()?;
    total.parse().ok()
}

impl RecallStore for SupabaseStore {
    async fn load_all(&self) -> Result<Vec<RawRecallRecord>, StoreError> {
        let params = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "date_publication.desc".to_string()),
        ];

        tracing::debug!(table = %self.config.table, "Loading full recall history");

        let (rows, _) = self.fetch_rows(&params, false).await?;
        Ok(rows)
    }

    async fn search(
        &self,
        query: &RecallQuery,
    ) -> Result<(Vec<RawRecallRecord>, u64), StoreError> {
        let params = PostgrestDialect
            .translate(query)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        tracing::debug!(?params, "Executing recall search");

        let (rows, total) = self.fetch_rows(&params, true).await?;
        let total = total.unwrap_or(rows.len() as u64);
        Ok((rows, total))
    }

    async fn upsert(&self, records: &[RawRecallRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let response = self
            .authed(
                self.client
                    .post(self.table_url())
                    .query(&[("on_conflict", "numero_fiche")])
                    .header("Prefer", "resolution=merge-duplicates")
                    .json(records),
            )
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::QueryFailed(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let response = self
            .authed(
                self.client
                    .get(self.table_url())
                    .query(&[("select", "id"), ("limit", "1")]),
            )
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

/// Upstream RappelConso open-data API configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Dataset base URL on the Opendatasoft explore API
    pub base_url: String,
    /// Records fetched per sync run
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.economie.gouv.fr/api/explore/v2.1/catalog/datasets/rappelconso-v2-gtin-espaces".to_string(),
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

/// Client for the government open-data API the store is synced from.
pub struct UpstreamClient {
    config: UpstreamConfig,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Fetch the newest page of records, publication date descending.
    pub async fn fetch_latest(&self) -> Result<Vec<RawRecallRecord>, StoreError> {
        let url = format!("{}/records", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("limit", self.config.page_size.to_string()),
                ("offset", "0".to_string()),
                ("order_by", "date_publication DESC".to_string()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::QueryFailed(format!(
                "Upstream API HTTP {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StoreError::ParseError(e.to_string()))?;

        parse_upstream_payload(payload)
    }
}

/// Rows from the explore API envelope (`{"results": [...]}`).
fn parse_upstream_payload(payload: serde_json::Value) -> Result<Vec<RawRecallRecord>, StoreError> {
    let results = payload
        .get("results")
        .cloned()
        .ok_or_else(|| StoreError::ParseError("Missing results array".to_string()))?;

    serde_json::from_value(results).map_err(|e| StoreError::ParseError(e.to_string()))
}

/// One sync run: pull the newest upstream page and upsert it into the store.
///
/// Upsert is keyed on `numero_fiche`, so overlapping pages are harmless.
pub async fn sync_latest(
    upstream: &UpstreamClient,
    store: &impl RecallStore,
) -> Result<usize, StoreError> {
    let records = upstream.fetch_latest().await?;
    tracing::info!(count = records.len(), "Fetched records from upstream API");

    store.upsert(&records).await?;
    tracing::info!(store = store.name(), "Sync complete");

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_url() {
        let store = SupabaseStore::new(SupabaseConfig {
            base_url: "https://abc.supabase.co/".to_string(),
            ..Default::default()
        });
        assert_eq!(store.table_url(), "https://abc.supabase.co/rest/v1/rappel");
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-49/1234"), Some(1234));
        assert_eq!(parse_content_range_total("*/87"), Some(87));
        assert_eq!(parse_content_range_total("0-49/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_parse_upstream_payload() {
        let payload = json!({
            "total_count": 2,
            "results": [
                {"id": 1, "numero_fiche": "2024-01-0001", "marque_produit": "Lactel"},
                {"id": 2}
            ]
        });
        let records = parse_upstream_payload(payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].numero_fiche.as_deref(), Some("2024-01-0001"));
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].numero_fiche, None);
    }

    #[test]
    fn test_parse_upstream_payload_missing_results() {
        let payload = json!({"total_count": 0});
        assert!(matches!(
            parse_upstream_payload(payload),
            Err(StoreError::ParseError(_))
        ));
    }
}

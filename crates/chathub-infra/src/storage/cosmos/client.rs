//! Minimal Cosmos DB SQL REST client: document create/upsert and queries.
//!
//! The master key is kept in [`CosmosConnection`] and only exposed while
//! signing a request.

use std::time::Duration;

use chathub_types::error::RepositoryError;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;

use super::query::SqlQuery;
use super::signature::{CosmosConnection, request_date};

/// REST API version sent in `x-ms-version`.
const API_VERSION: &str = "2018-12-31";
const CONTINUATION_HEADER: &str = "x-ms-continuation";

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

/// Cosmos DB client shared by every container-scoped storage context.
pub struct CosmosClient {
    http: reqwest::Client,
    connection: CosmosConnection,
}

impl CosmosClient {
    pub fn new(connection: CosmosConnection, timeout: Duration) -> Result<Self, RepositoryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::Connection(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, connection })
    }

    pub fn endpoint(&self) -> &str {
        &self.connection.endpoint
    }

    fn docs_request(
        &self,
        database: &str,
        container: &str,
    ) -> Result<reqwest::RequestBuilder, RepositoryError> {
        let link = format!("dbs/{database}/colls/{container}");
        let url = format!("{}/{link}/docs", self.connection.endpoint);
        let date = request_date(Utc::now());
        let authorization = self.connection.authorization("POST", "docs", &link, &date)?;

        Ok(self
            .http
            .post(url)
            .header("authorization", authorization)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION))
    }

    /// Create a document, or replace it when `upsert` is set.
    ///
    /// Returns [`RepositoryError::Conflict`] when creating an existing id.
    pub async fn write_document(
        &self,
        database: &str,
        container: &str,
        partition: &str,
        document: &Value,
        upsert: bool,
    ) -> Result<(), RepositoryError> {
        let partition_key = serde_json::to_string(&[partition])
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let mut request = self
            .docs_request(database, container)?
            .header("x-ms-documentdb-partitionkey", partition_key)
            .json(document);
        if upsert {
            request = request.header("x-ms-documentdb-is-upsert", "True");
        }

        let response = request.send().await.map_err(send_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), body))
    }

    /// Run a cross-partition query, following continuation tokens until the
    /// result set is exhausted.
    pub async fn query_documents(
        &self,
        database: &str,
        container: &str,
        query: &SqlQuery,
    ) -> Result<Vec<Value>, RepositoryError> {
        let body =
            serde_json::to_vec(query).map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request = self
                .docs_request(database, container)?
                .header(CONTENT_TYPE, "application/query+json")
                .header("x-ms-documentdb-isquery", "True")
                .header("x-ms-documentdb-query-enablecrosspartition", "True")
                .body(body.clone());
            if let Some(token) = &continuation {
                request = request.header(CONTINUATION_HEADER, token.as_str());
            }

            let response = request.send().await.map_err(send_error)?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(status_error(status.as_u16(), text));
            }

            continuation = response
                .headers()
                .get(CONTINUATION_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let page: QueryPage = response
                .json()
                .await
                .map_err(|e| RepositoryError::Serialization(format!("invalid query response: {e}")))?;
            documents.extend(page.documents);

            if continuation.is_none() {
                break;
            }
        }

        tracing::trace!(container, count = documents.len(), "Cosmos query finished");
        Ok(documents)
    }
}

fn send_error(err: reqwest::Error) -> RepositoryError {
    RepositoryError::Connection(format!("Cosmos DB request failed: {err}"))
}

fn status_error(status: u16, body: String) -> RepositoryError {
    match status {
        409 => RepositoryError::Conflict(body),
        401 | 403 => RepositoryError::Connection(format!("Cosmos DB rejected credentials ({status})")),
        _ => RepositoryError::Remote {
            status,
            message: body,
        },
    }
}

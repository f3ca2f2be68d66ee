use crate::config::FetcherConfig;
use crate::error::{FetchError, FormError, Result};
use crate::schema::{DatasetList, Schema};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Source of per-dataset schemas
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch(&self, db_id: &str) -> std::result::Result<Schema, FetchError>;
}

/// Source of the selectable dataset list
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn list_datasets(&self) -> std::result::Result<DatasetList, FetchError>;
}

/// Portal backend client for `/api/db/detail` and `/api/db/list`
#[derive(Clone, Debug)]
pub struct HttpSchemaFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSchemaFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        config.validate().map_err(FormError::InvalidConfig)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(FetchError::from)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SchemaFetcher for HttpSchemaFetcher {
    async fn fetch(&self, db_id: &str) -> std::result::Result<Schema, FetchError> {
        let url = format!("{}/api/db/detail", self.base_url);
        debug!("Fetching schema for dataset {db_id}");
        let resp = self
            .http
            .get(url)
            .query(&[("db_id", db_id)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                db_id: db_id.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::TransientIo(format!(
                "schema request failed: {status} - {body}"
            )));
        }

        // The backend answers an unknown id with 200 and a null body.
        let schema: Option<Schema> = resp.json().await?;
        schema.ok_or_else(|| FetchError::NotFound {
            db_id: db_id.to_string(),
        })
    }
}

#[async_trait]
impl DatasetSource for HttpSchemaFetcher {
    async fn list_datasets(&self) -> std::result::Result<DatasetList, FetchError> {
        let url = format!("{}/api/db/list", self.base_url);
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::TransientIo(format!(
                "dataset list request failed: {status} - {body}"
            )));
        }
        Ok(resp.json().await?)
    }
}

//! REST implementation of the gateway against a PostgREST-style row store.

use super::{CategoryRow, Gateway, GatewayError, SiteOrderRow, SitePatch, SiteRow, Snapshot};
use crate::config::RemoteConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;

const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

/// Gateway over HTTP. The base URL may point directly at the row store or at
/// the credential-hiding passthrough; either way the anon key rides along as
/// `apikey` plus a bearer token.
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestGateway {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            anon_key: config.anon_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.anon_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).headers(self.headers())
    }

    async fn expect_success(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        debug!("gateway call failed ({}): {}", status, message);
        Err(GatewayError::api(status.as_u16(), message))
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        prefer: Option<&str>,
        body: &T,
    ) -> Result<(), GatewayError> {
        let mut request = self.request(method, url).json(body);
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        let response = request.send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn fetch_all(&self) -> Result<Snapshot, GatewayError> {
        let url = format!(
            "{}?select=*&order=sort_order.asc,label.asc",
            self.table_url("categories")
        );
        let response = self.request(Method::GET, &url).send().await?;
        let categories: Vec<CategoryRow> = Self::expect_success(response).await?.json().await?;

        let url = format!(
            "{}?select=*&order=sort_order.asc,name.asc",
            self.table_url("sites")
        );
        let response = self.request(Method::GET, &url).send().await?;
        let sites: Vec<SiteRow> = Self::expect_success(response).await?.json().await?;

        Ok(Snapshot { categories, sites })
    }

    async fn upsert_categories(&self, rows: &[CategoryRow]) -> Result<(), GatewayError> {
        let url = format!("{}?on_conflict=id", self.table_url("categories"));
        self.write(Method::POST, &url, Some(MERGE_DUPLICATES), rows)
            .await
    }

    async fn insert_sites(&self, rows: &[SiteRow]) -> Result<(), GatewayError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.write(Method::POST, &self.table_url("sites"), None, rows)
            .await
    }

    async fn update_site(&self, id: &str, patch: &SitePatch) -> Result<(), GatewayError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url("sites"),
            urlencoding::encode(id)
        );
        self.write(Method::PATCH, &url, None, patch).await
    }

    async fn delete_site(&self, id: &str) -> Result<(), GatewayError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url("sites"),
            urlencoding::encode(id)
        );
        let response = self.request(Method::DELETE, &url).send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn delete_all_sites(&self) -> Result<(), GatewayError> {
        // PostgREST refuses an unfiltered DELETE; a tautological id filter
        // hits every row.
        let url = format!("{}?id=neq.", self.table_url("sites"));
        let response = self.request(Method::DELETE, &url).send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn upsert_site_order(&self, rows: &[SiteOrderRow]) -> Result<(), GatewayError> {
        let url = format!(
            "{}?on_conflict=id&columns=id,sort_order",
            self.table_url("sites")
        );
        self.write(Method::POST, &url, Some(MERGE_DUPLICATES), rows)
            .await
    }
}

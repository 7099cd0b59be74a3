// SPDX-License-Identifier: Apache-2.0

use crate::backend::{StoreError, StoreErrorCode};
use crate::remote::RemoteGateway;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use sdl_feedback_model::{Entry, PageKey};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const APIKEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "prefer";

/// PostgREST-style table endpoint (`{base}/rest/v1/{table}`) authenticated
/// with a static key sent both as `apikey` and as a bearer token.
pub struct RestGateway {
    base_url: String,
    api_key: String,
    table: String,
    allow_private_hosts: bool,
    client: reqwest::Client,
}

impl RestGateway {
    #[must_use]
    pub fn new(
        base_url: String,
        api_key: String,
        table: String,
        timeout: Duration,
        allow_private_hosts: bool,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
            allow_private_hosts,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_else(|err| {
                    warn!(error = %err, "http client setup failed; using defaults without timeout");
                    reqwest::Client::new()
                }),
        }
    }

    #[must_use]
    pub fn collection_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn validate_url(&self, url: &str) -> Result<(), StoreError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| {
            StoreError::new(StoreErrorCode::Config, format!("invalid remote url: {e}"))
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| StoreError::new(StoreErrorCode::Config, "remote url missing host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_ascii_lowercase();
        if self.allow_private_hosts {
            return Ok(());
        }
        if host == "localhost" || host.ends_with(".localhost") {
            return Err(StoreError::new(
                StoreErrorCode::Config,
                "blocked remote host: localhost",
            ));
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            if is_private_ip(ip) {
                return Err(StoreError::new(
                    StoreErrorCode::Config,
                    "blocked private remote host",
                ));
            }
        }
        Ok(())
    }

    fn auth_headers(&self) -> Result<HeaderMap, StoreError> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            StoreError::new(StoreErrorCode::Config, format!("invalid api key header: {e}"))
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(APIKEY_HEADER),
            HeaderValue::from_str(&self.api_key).map_err(invalid)?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(invalid)?,
        );
        Ok(headers)
    }

    #[instrument(name = "feedback_remote_push", skip(self, entry), fields(id = %entry.id, page = %entry.page))]
    async fn try_push(&self, entry: &Entry) -> Result<(), StoreError> {
        let url = self.collection_url();
        self.validate_url(&url)?;
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(PREFER_HEADER),
            HeaderValue::from_static("return=minimal"),
        );
        let resp = self
            .client
            .post(&url)
            .headers(headers)
            .json(entry)
            .send()
            .await
            .map_err(|e| StoreError::network(format!("push failed url={url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(StoreError::network(format!(
                "push rejected status={} url={url}",
                resp.status()
            )));
        }
        debug!("entry pushed");
        Ok(())
    }

    #[instrument(name = "feedback_remote_pull", skip(self), fields(page = %page))]
    async fn try_pull(&self, page: &PageKey) -> Result<Vec<Entry>, StoreError> {
        let url = self.collection_url();
        self.validate_url(&url)?;
        let page_filter = format!("eq.{}", page.as_str());
        let resp = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(&[("page", page_filter.as_str()), ("order", "created_at.asc")])
            .send()
            .await
            .map_err(|e| StoreError::network(format!("pull failed url={url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(StoreError::network(format!(
                "pull rejected status={} url={url}",
                resp.status()
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StoreError::network(format!("read body failed: {e}")))?;
        let entries: Vec<Entry> = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::network(format!("malformed pull payload: {e}")))?;
        debug!(count = entries.len(), "entries pulled");
        Ok(entries)
    }
}

fn is_private_ipv4(v4: Ipv4Addr) -> bool {
    v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_broadcast()
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_ipv4(mapped);
            }
            let head = v6.segments()[0];
            // fc00::/7 unique-local, fe80::/10 link-local
            v6.is_loopback()
                || v6.is_unspecified()
                || head & 0xfe00 == 0xfc00
                || head & 0xffc0 == 0xfe80
        }
    }
}

#[async_trait]
impl RemoteGateway for RestGateway {
    fn backend_tag(&self) -> &'static str {
        "rest"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn push(&self, entry: &Entry) -> Result<(), StoreError> {
        self.try_push(entry).await.map_err(|err| {
            warn!(id = %entry.id, error = %err, "remote push failed");
            err
        })
    }

    async fn pull(&self, page: &PageKey) -> Option<Vec<Entry>> {
        match self.try_pull(page).await {
            Ok(entries) => Some(entries),
            Err(err) => {
                warn!(page = %page, error = %err, "remote pull failed; using local entries only");
                None
            }
        }
    }
}

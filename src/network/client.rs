//! HTTP client for making requests to search providers

use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::providers::{ProviderRequest, ProviderResponse};
use anyhow::Result;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client wrapper with browser-like defaults
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    /// Fixed user agent; a fresh random one is used per request when unset
    user_agent: Option<String>,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(settings.request_timeout.max(0.1))?;

        let mut builder = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
            user_agent: settings.useragent.clone(),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Timeout applied to every request
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute a provider request.
    ///
    /// Any HTTP status is returned as a response; judging it is the
    /// provider's job.
    pub async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(generate_user_agent);

        let mut req_builder = self
            .client
            .get(&request.url)
            .timeout(self.default_timeout)
            .header("User-Agent", user_agent)
            .header("Accept", accept_html())
            .header("Accept-Language", accept_language("en"))
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1");

        for (key, value) in self.extra_headers.iter().chain(request.headers.iter()) {
            req_builder = req_builder.header(key, value);
        }

        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    async fn parse_response(response: Response) -> Result<ProviderResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text().await?;

        Ok(ProviderResponse { status, text, url })
    }
}

// src/client.rs

use crate::{config::AppConfig, error::*};
use log::trace;
use reqwest::{IntoUrl, Response, header};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::sync::Arc;

/// Authenticated portal session: a cookie-keeping HTTP client with transient-failure retries.
#[derive(Clone)]
pub struct RobustClient {
    pub client: ClientWithMiddleware,
    config: Arc<AppConfig>,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.timeout)
            .pool_max_idle_per_host(config.max_workers * 3)
            .build()?;
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, config })
    }

    /// GET that fails on any non-2xx status. The whole exchange, body included, must finish
    /// within the configured timeout.
    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self.client.get(url).timeout(self.config.timeout).send().await?;
        trace!("GET {} -> {}", res.url(), res.status());
        Ok(res.error_for_status()?)
    }

    /// GET for file bodies of any size: no overall deadline, only the idle timeout between reads.
    pub async fn get_stream<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self.client.get(url).send().await?;
        trace!("GET (stream) {} -> {}", res.url(), res.status());
        Ok(res.error_for_status()?)
    }

    /// HEAD that fails on any non-2xx status. No body is transferred.
    pub async fn head<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self.client.head(url).timeout(self.config.timeout).send().await?;
        trace!("HEAD {} -> {}", res.url(), res.status());
        Ok(res.error_for_status()?)
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form<T: IntoUrl>(&self, url: T, fields: &[(&str, &str)]) -> AppResult<Response> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let res = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .timeout(self.config.timeout)
            .send()
            .await?;
        trace!("POST {} -> {}", res.url(), res.status());
        Ok(res.error_for_status()?)
    }
}

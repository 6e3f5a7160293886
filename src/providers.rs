use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::MediaLinks;
use moka::future::Cache;
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use std::time::Duration;

/// Client for the upstream player-data providers.
///
/// Both data providers are queried concurrently. A failing provider never
/// fails the request: its payload degrades to `{}` and the reconciler fills
/// the gaps with placeholders.
#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
    primary_url: String,
    secondary_url: String,
    outfit_url: String,
    banner_url: String,
    /// Successful payloads keyed by provider, uid and region. `None` when disabled.
    cache: Option<Cache<String, Value>>,
}

impl ProviderClient {
    /// Creates a new `ProviderClient` from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Provider base URLs, per-call timeout and cache TTL.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create provider client: {}", e))
            })?;

        let cache = (config.provider_cache_ttl_secs > 0).then(|| {
            Cache::builder()
                .time_to_live(Duration::from_secs(config.provider_cache_ttl_secs))
                .max_capacity(10_000)
                .build()
        });

        Ok(Self {
            client,
            primary_url: config.primary_provider_url.clone(),
            secondary_url: config.secondary_provider_url.clone(),
            outfit_url: config.outfit_image_url.clone(),
            banner_url: config.banner_image_url.clone(),
            cache,
        })
    }

    /// Fetches every data provider concurrently, primary first.
    ///
    /// Always returns one payload per provider; failures become `{}`.
    pub async fn fetch_sources(&self, uid: &str, region: &str) -> Vec<Value> {
        let (primary, secondary) =
            tokio::join!(self.fetch_primary(uid), self.fetch_secondary(uid, region));

        vec![
            degrade("primary", uid, primary),
            degrade("secondary", uid, secondary),
        ]
    }

    /// `GET {primary}/info?uid=`
    pub async fn fetch_primary(&self, uid: &str) -> Result<Value, AppError> {
        let url = build_url(&self.primary_url, "info", &[("uid", uid)])?;
        self.get_json(format!("primary:{}", uid), url)
            .await
            .with_context(|| format!("primary provider lookup for {}", uid))
    }

    /// `GET {secondary}/player-info?uid=&region=`
    pub async fn fetch_secondary(&self, uid: &str, region: &str) -> Result<Value, AppError> {
        let url = build_url(
            &self.secondary_url,
            "player-info",
            &[("uid", uid), ("region", region)],
        )?;
        self.get_json(format!("secondary:{}:{}", uid, region), url)
            .await
            .with_context(|| format!("secondary provider lookup for {}", uid))
    }

    /// Image URLs for the browser. Nothing is fetched here.
    pub fn media_links(&self, uid: &str, region: &str) -> Result<MediaLinks, AppError> {
        let params = [("uid", uid), ("region", region)];
        Ok(MediaLinks {
            outfit_url: build_url(&self.outfit_url, "generate-profile", &params)?.into(),
            banner_url: build_url(&self.banner_url, "banner-image", &params)?.into(),
        })
    }

    async fn get_json(&self, cache_key: String, url: Url) -> Result<Value, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cache_key).await {
                tracing::debug!("Provider cache HIT: {}", cache_key);
                return Ok(cached);
            }
        }

        tracing::info!("Fetching {} from {}", cache_key, url.path());

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Provider returned status {}: {}",
                status,
                truncate(&error_text, 200)
            )));
        }

        let payload: Value = response.json().await?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, payload.clone()).await;
        }

        Ok(payload)
    }
}

/// Builds `{base}/{endpoint}?params` with proper query encoding.
fn build_url(base: &str, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, AppError> {
    Url::parse_with_params(&format!("{}/{}", base, endpoint), params)
        .map_err(|e| AppError::InternalError(format!("Failed to build provider URL: {}", e)))
}

fn degrade(provider: &str, uid: &str, result: Result<Value, AppError>) -> Value {
    match result {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(
                "Provider '{}' degraded to empty payload for {}: {}",
                provider,
                uid,
                e
            );
            Value::Object(Map::new())
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

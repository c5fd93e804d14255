//! Provider adapters: how to query each GIF backend and how to read its
//! payload into [`GifResult`]s.
//!
//! Upstream payloads are untrusted. Every field an item needs is checked
//! explicitly, and an item missing one is dropped instead of failing the
//! whole response.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::config::{BridgeConfig, ProviderConfig};
use crate::fulfill::FulfillError;
use crate::types::{GifPreview, GifResult, GifSource, QueryParams};

pub trait GifProvider: Send + Sync {
    fn source(&self) -> GifSource;

    /// Full upstream URL: base + endpoint, auth parameter first, then `params`
    /// in insertion order.
    fn build_query(&self, endpoint: &str, params: &QueryParams) -> Result<Url, FulfillError>;

    /// The raw result items of a response body. Absent or null is empty.
    fn result_items<'a>(&self, body: &'a Value) -> &'a [Value];

    /// Maps one raw item, or `None` if it lacks a required field.
    fn normalize(&self, item: &Value) -> Option<GifResult>;
}

#[derive(Debug, Clone)]
pub struct GiphyProvider {
    config: ProviderConfig,
}

impl GiphyProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl GifProvider for GiphyProvider {
    fn source(&self) -> GifSource {
        GifSource::Giphy
    }

    fn build_query(&self, endpoint: &str, params: &QueryParams) -> Result<Url, FulfillError> {
        build_url(&self.config, "api_key", endpoint, params)
    }

    fn result_items<'a>(&self, body: &'a Value) -> &'a [Value] {
        array_at(body, "data")
    }

    fn normalize(&self, item: &Value) -> Option<GifResult> {
        let preview = item.pointer("/images/preview_gif")?;
        Some(GifResult {
            preview: GifPreview {
                url: absolute_url(preview.get("url"))?,
                width: dimension(preview.get("width"))?,
                height: dimension(preview.get("height"))?,
            },
            url: absolute_url(item.pointer("/images/original/url"))?,
            source: GifSource::Giphy,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TenorProvider {
    config: ProviderConfig,
}

impl TenorProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl GifProvider for TenorProvider {
    fn source(&self) -> GifSource {
        GifSource::Tenor
    }

    fn build_query(&self, endpoint: &str, params: &QueryParams) -> Result<Url, FulfillError> {
        build_url(&self.config, "key", endpoint, params)
    }

    fn result_items<'a>(&self, body: &'a Value) -> &'a [Value] {
        array_at(body, "results")
    }

    fn normalize(&self, item: &Value) -> Option<GifResult> {
        let tiny = item.pointer("/media/0/tinygif")?;
        Some(GifResult {
            preview: GifPreview {
                url: absolute_url(tiny.get("url"))?,
                width: dimension(tiny.pointer("/dims/0"))?,
                height: dimension(tiny.pointer("/dims/1"))?,
            },
            url: absolute_url(item.pointer("/media/0/gif/url"))?,
            source: GifSource::Tenor,
        })
    }
}

/// Adapters keyed by the source they serve.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<GifSource, Arc<dyn GifProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Giphy and Tenor adapters.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GiphyProvider::new(config.giphy.clone())));
        registry.register(Arc::new(TenorProvider::new(config.tenor.clone())));
        registry
    }

    /// Adds or replaces the adapter for `provider.source()`.
    pub fn register(&mut self, provider: Arc<dyn GifProvider>) {
        self.providers.insert(provider.source(), provider);
    }

    pub fn get(&self, source: GifSource) -> Option<&dyn GifProvider> {
        self.providers.get(&source).map(|p| p.as_ref())
    }
}

fn build_url(
    config: &ProviderConfig,
    auth_param: &str,
    endpoint: &str,
    params: &QueryParams,
) -> Result<Url, FulfillError> {
    let endpoint = endpoint.trim();
    let invalid = endpoint.is_empty()
        || endpoint.starts_with('/')
        || endpoint.contains(['?', '#', '\\'])
        || endpoint.split('/').any(is_dot_segment);
    if invalid {
        return Err(FulfillError::InvalidEndpoint(endpoint.to_string()));
    }

    let mut url = config
        .base_url
        .join(endpoint)
        .map_err(|_| FulfillError::InvalidEndpoint(endpoint.to_string()))?;
    // The key must only ever be sent below the configured base path.
    let escaped = url.origin() != config.base_url.origin()
        || !url.path().starts_with(config.base_url.path());
    if escaped {
        return Err(FulfillError::InvalidEndpoint(endpoint.to_string()));
    }
    {
        let mut query = url.query_pairs_mut();
        query.append_pair(auth_param, &config.api_key);
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

/// `.` or `..`, including percent-encoded spellings such as `%2e%2E`.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn array_at<'a>(body: &'a Value, key: &str) -> &'a [Value] {
    body.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn absolute_url(value: Option<&Value>) -> Option<String> {
    let raw = value?.as_str()?.trim();
    let parsed = Url::parse(raw).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| raw.to_string())
}

/// Positive pixel size given either as a number or a numeric string.
fn dimension(value: Option<&Value>) -> Option<u32> {
    let size = match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok())?,
        Value::String(s) => s.trim().parse::<u32>().ok()?,
        _ => return None,
    };
    (size > 0).then_some(size)
}

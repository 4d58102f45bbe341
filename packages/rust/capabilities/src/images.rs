//! Featured image lookup over the Unsplash search API.

use postcrew_shared::{ImagesConfig, PostcrewError, Result, optional_key};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::build_client;

/// Images used when the lookup is unavailable or finds nothing.
pub const DEFAULT_IMAGES: [&str; 10] = [
    "https://images.unsplash.com/photo-1620712943543-bcc4688e7485",
    "https://images.unsplash.com/photo-1550751827-4bd374c3f58b",
    "https://images.unsplash.com/photo-1526374965328-7f61d4dc18c5",
    "https://images.unsplash.com/photo-1518770660439-4636190af475",
    "https://images.unsplash.com/photo-1461749280684-dccba630e2f6",
    "https://images.unsplash.com/photo-1558346547-4439467bd1d5",
    "https://images.unsplash.com/photo-1535378620166-273708d44e4c",
    "https://images.unsplash.com/photo-1531297484001-80022131f5a1",
    "https://images.unsplash.com/photo-1555949963-ff9fe0c870eb",
    "https://images.unsplash.com/photo-1581472723648-909f4851d4ae",
];

#[derive(Debug, Deserialize)]
struct PhotoSearch {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

/// Image lookup shim. Always returns a non-empty URL.
#[derive(Debug, Clone)]
pub struct ImageFinder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ImageFinder {
    pub fn new(config: &ImagesConfig, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_config(config: &ImagesConfig) -> Result<Self> {
        let api_key = optional_key(&config.api_key_env);
        if api_key.is_none() {
            warn!(
                var = %config.api_key_env,
                "image API key not set, default images will be used"
            );
        }
        Self::new(config, api_key)
    }

    /// Find an image URL for `query`.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn find(&self, query: &str) -> String {
        if let Some(api_key) = self.api_key.as_deref() {
            match self.request(query, api_key).await {
                Ok(Some(url)) => {
                    info!("found image from search");
                    return url;
                }
                Ok(None) => info!("image search returned no results"),
                Err(e) => warn!(error = %e, "image search failed"),
            }
        }

        info!("using default image");
        default_image()
    }

    async fn request(&self, query: &str, api_key: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("Client-ID {api_key}"))
            .query(&[("query", query), ("per_page", "1")])
            .send()
            .await
            .map_err(|e| PostcrewError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostcrewError::Network(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let parsed: PhotoSearch = response.json().await.map_err(|e| {
            PostcrewError::Network(format!("{}: invalid response: {e}", self.endpoint))
        })?;

        Ok(parsed
            .results
            .into_iter()
            .next()
            .map(|photo| photo.urls.regular)
            .filter(|url| !url.is_empty()))
    }
}

fn default_image() -> String {
    DEFAULT_IMAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DEFAULT_IMAGES[0])
        .to_string()
}

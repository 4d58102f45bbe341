//! Capability shims: web search and image lookup.
//!
//! Each shim wraps one external HTTP service and always produces a usable
//! answer. Missing credentials, empty results and transport failures degrade
//! to deterministic fallback text (search) or a default image (images), with
//! a WARN log, instead of an error.

mod images;
mod search;

use std::time::Duration;

use postcrew_shared::{PostcrewError, Result};
use reqwest::Client;

pub use images::{DEFAULT_IMAGES, ImageFinder};
pub use search::{WebSearch, time_period};

/// User-Agent string for capability requests.
const USER_AGENT: &str = concat!("postcrew/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with a bounded request timeout.
fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PostcrewError::Network(format!("failed to build HTTP client: {e}")))
}

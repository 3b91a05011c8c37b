//! Best-effort reverse geolocation of a visitor's origin address.
//!
//! Lookups hit an external `ip-api`-style JSON endpoint with a short
//! timeout. Failure of any kind degrades to a fixed fallback string;
//! nothing in this module is allowed to surface an error to the
//! notification path.

use serde::Deserialize;
use tracing::warn;

use crate::config::GlobalConfig;

/// Rendered location when the lookup fails or times out.
pub const FALLBACK_LOCATION: &str = "Location unavailable";

/// Placeholder for a field the lookup service omitted.
const UNKNOWN_FIELD: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct LookupBody {
    city: Option<String>,
    country: Option<String>,
}

/// Thin client over the geolocation service.
#[derive(Debug, Clone)]
pub struct Geolocator {
    client: reqwest::Client,
    base_url: String,
}

impl Geolocator {
    /// Build a locator from the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Geo` if the HTTP client cannot be constructed.
    pub fn from_config(config: &GlobalConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.geo_timeout_seconds))
            .build()
            .map_err(|err| crate::AppError::Geo(format!("failed to build client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.geo_base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Resolve `ip` to a `"City, Country"` string.
    ///
    /// Never fails: timeouts, non-200 responses, and malformed bodies
    /// all yield [`FALLBACK_LOCATION`] with a warning log.
    pub async fn lookup(&self, ip: &str) -> String {
        match self.try_lookup(ip).await {
            Ok(location) => location,
            Err(err) => {
                warn!(ip, %err, "geolocation lookup failed; using fallback");
                FALLBACK_LOCATION.to_owned()
            }
        }
    }

    async fn try_lookup(&self, ip: &str) -> std::result::Result<String, reqwest::Error> {
        let url = format!("{}/json/{ip}?fields=country,city", self.base_url);
        let body: LookupBody = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let city = body.city.filter(|c| !c.is_empty());
        let country = body.country.filter(|c| !c.is_empty());
        Ok(format!(
            "{}, {}",
            city.as_deref().unwrap_or(UNKNOWN_FIELD),
            country.as_deref().unwrap_or(UNKNOWN_FIELD),
        ))
    }
}

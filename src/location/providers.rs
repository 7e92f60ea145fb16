//! Network location providers: IP-based geolocation over HTTP.

use super::types::LocationError;
use serde::Deserialize;
use std::time::Duration;

const IPAPI_URL: &str = "https://ipapi.co/json/";
const USER_AGENT: &str = concat!("Trackzer/", env!("CARGO_PKG_VERSION"));

/// What an IP geolocation service reports about the caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IpLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// ISO 3166-1 alpha-2 (e.g. "CM")
    #[serde(default)]
    pub country_code: Option<String>,
}

impl IpLocation {
    pub fn is_in_cameroon(&self) -> bool {
        self.country_code.as_deref().is_some_and(|cc| cc.eq_ignore_ascii_case("CM"))
    }

    /// City name if present, region otherwise.
    pub fn place_name(&self) -> Option<&str> {
        self.city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.region.as_deref())
    }
}

/// Anything that can tell where the current network connection comes from.
pub trait NetworkLocator {
    fn lookup(&self) -> Result<IpLocation, LocationError>;
}

/// ipapi.co over `ureq`.
pub struct IpApiLocator {
    url: String,
    timeout: Duration,
}

impl IpApiLocator {
    pub fn new() -> Self {
        Self {
            url: IPAPI_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Point the locator at another endpoint with the same JSON shape.
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self { url: url.into(), timeout }
    }
}

impl Default for IpApiLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkLocator for IpApiLocator {
    fn lookup(&self) -> Result<IpLocation, LocationError> {
        let response = ureq::get(&self.url)
            .set("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .call()
            .map_err(|e| LocationError::Network(e.to_string()))?;

        response
            .into_json()
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))
    }
}

//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Whether a gazetteer entry is a whole city or a district inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    City,
    District,
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::City => write!(f, "city"),
            Self::District => write!(f, "district"),
        }
    }
}

/// One named place of the gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazetteerEntry {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(alias = "type")]
    pub kind: PlaceKind,
    /// Owning city; present only for districts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
}

impl GazetteerEntry {
    pub fn is_city(&self) -> bool {
        self.kind == PlaceKind::City
    }

    pub fn is_district(&self) -> bool {
        self.kind == PlaceKind::District
    }
}

/// Coarse confidence in a resolved location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    High,
    Medium,
    Low,
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// How the coordinates of a result were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Gps,
    Network,
    Gazetteer,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gps => write!(f, "GPS"),
            Self::Network => write!(f, "Network"),
            Self::Gazetteer => write!(f, "Gazetteer"),
        }
    }
}

/// A resolved location, built fresh per query and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResult {
    pub lat: f64,
    pub lng: f64,
    /// "Akwa, Douala, Cameroon" or "Yaoundé, Cameroon"
    pub formatted_address: String,
    pub accuracy: Accuracy,
    pub source: LocationSource,
}

/// A coordinate lookup with the distance to the matched entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseLookup {
    #[serde(flatten)]
    pub location: LocationResult,
    /// Planar distance to the matched entry, in degrees.
    pub distance: f64,
    /// Match confidence in percent.
    pub confidence: u8,
}

/// A latitude/longitude rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl Bounds {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }
}

/// Location resolution errors.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location not found: '{0}'")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

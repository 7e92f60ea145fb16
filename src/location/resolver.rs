//! Location resolver: text and coordinate lookups over the gazetteer.
//!
//! Text flow:        normalise → exact tier → substring tier → priority sort → cap
//! Coordinate flow:  nearest entry → accuracy from distance → GPS or snapped coordinates

use super::cache::TtlCache;
use super::gazetteer::{format_address, Gazetteer, NearestMatch, CAMEROON_BOUNDS, PRIORITY_CITIES};
use super::types::{
    Accuracy, GazetteerEntry, LocationError, LocationResult, LocationSource, PlaceKind, ReverseLookup,
};
use chrono::Duration;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of entries returned by a text search.
pub const MAX_SUGGESTIONS: usize = 15;

/// Resolves place names and coordinates against one shared gazetteer.
///
/// All lookups take `&self`; the suggestion cache synchronises internally,
/// so a resolver can sit behind an `Arc` and be used from any thread.
pub struct LocationResolver {
    gazetteer: Arc<Gazetteer>,
    suggestions: TtlCache<Vec<String>>,
}

impl LocationResolver {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self {
            gazetteer,
            suggestions: TtlCache::default(),
        }
    }

    /// Create a resolver whose suggestion lists live for `ttl`.
    pub fn with_suggestion_ttl(gazetteer: Arc<Gazetteer>, ttl: Duration) -> Self {
        Self {
            gazetteer,
            suggestions: TtlCache::new(ttl),
        }
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn suggestion_cache(&self) -> &TtlCache<Vec<String>> {
        &self.suggestions
    }

    /// Release the suggestion cache. Lookups keep working, uncached.
    pub fn close(&self) {
        self.suggestions.close();
    }

    /// Entries matching a free-text query, best first, at most `MAX_SUGGESTIONS`.
    ///
    /// Exact matches on name or parent city win outright; substring matches
    /// are only considered when no exact match exists.
    pub fn search(&self, query: &str) -> Vec<&GazetteerEntry> {
        let q = normalize(query);
        if q.is_empty() {
            return Vec::new();
        }

        let entries = self.gazetteer.entries();
        let mut matches: Vec<&GazetteerEntry> = entries.iter().filter(|e| matches_exact(e, &q)).collect();
        if matches.is_empty() {
            matches = entries.iter().filter(|e| matches_partial(e, &q)).collect();
        }

        // Stable: gazetteer order survives inside each priority class.
        matches.sort_by_key(|e| !is_priority(e));
        matches.truncate(MAX_SUGGESTIONS);
        matches
    }

    /// Best gazetteer match for a free-text query.
    pub fn resolve_by_text(&self, query: &str) -> Result<LocationResult, LocationError> {
        let entry = self
            .search(query)
            .into_iter()
            .next()
            .ok_or_else(|| LocationError::NotFound(query.trim().to_string()))?;

        let accuracy = match entry.kind {
            PlaceKind::District => Accuracy::High,
            PlaceKind::City => Accuracy::Medium,
        };
        debug!(query, matched = %entry.name, %accuracy, "resolved by text");

        Ok(LocationResult {
            lat: entry.lat,
            lng: entry.lng,
            formatted_address: format_address(entry),
            accuracy,
            source: LocationSource::Gazetteer,
        })
    }

    /// Formatted addresses for `search`, memoised per normalised query.
    ///
    /// Queries with no match are not cached.
    pub fn suggestions(&self, query: &str) -> Vec<String> {
        let key = normalize(query);
        if key.is_empty() {
            return Vec::new();
        }
        if let Some(cached) = self.suggestions.get(&key) {
            debug!(query = %key, "suggestion cache hit");
            return cached;
        }

        let list: Vec<String> = self.search(&key).into_iter().map(format_address).collect();
        if !list.is_empty() {
            self.suggestions.put(&key, list.clone());
        }
        list
    }

    /// Whether free text names at least one known place.
    pub fn is_known_address(&self, text: &str) -> bool {
        !self.search(text).is_empty()
    }

    /// Nearest-place lookup. Never fails.
    ///
    /// Coordinates inside Cameroon are returned unchanged as a GPS fix;
    /// anything outside snaps to the matched entry.
    pub fn resolve_by_coordinates(&self, lat: f64, lng: f64) -> LocationResult {
        self.reverse_lookup(lat, lng).location
    }

    /// `resolve_by_coordinates` plus the match distance and its confidence.
    pub fn reverse_lookup(&self, lat: f64, lng: f64) -> ReverseLookup {
        let NearestMatch { entry, distance } = self.gazetteer.nearest(lat, lng);
        let accuracy = accuracy_for_distance(distance);

        let (lat_out, lng_out, source) = if CAMEROON_BOUNDS.contains(lat, lng) {
            (lat, lng, LocationSource::Gps)
        } else {
            debug!(lat, lng, snapped_to = %entry.name, "coordinates outside Cameroon");
            (entry.lat, entry.lng, LocationSource::Gazetteer)
        };

        ReverseLookup {
            location: LocationResult {
                lat: lat_out,
                lng: lng_out,
                formatted_address: format_address(entry),
                accuracy,
                source,
            },
            distance,
            confidence: confidence_for_distance(distance),
        }
    }

    /// Uniform pick over all cities, driven by the caller's random source.
    pub fn random_location<R: Rng + ?Sized>(&self, rng: &mut R) -> &GazetteerEntry {
        self.gazetteer.random_city(rng)
    }
}

/// Accuracy bucket for a nearest-match distance in degrees.
#[allow(clippy::if_same_then_else)]
pub fn accuracy_for_distance(distance: f64) -> Accuracy {
    if distance < 0.01 {
        Accuracy::High
    } else if distance < 0.05 {
        Accuracy::High
    } else if distance < 0.1 {
        Accuracy::Medium
    } else if distance < 0.5 {
        Accuracy::Medium
    } else {
        Accuracy::Low
    }
}

/// Match confidence (percent) for a nearest-match distance in degrees.
pub fn confidence_for_distance(distance: f64) -> u8 {
    if distance < 0.01 {
        95
    } else if distance < 0.05 {
        85
    } else if distance < 0.1 {
        70
    } else if distance < 0.5 {
        50
    } else {
        30
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn matches_exact(entry: &GazetteerEntry, q: &str) -> bool {
    entry.name.to_lowercase() == q
        || entry.parent_city.as_deref().is_some_and(|p| p.to_lowercase() == q)
}

fn matches_partial(entry: &GazetteerEntry, q: &str) -> bool {
    entry.name.to_lowercase().contains(q)
        || entry.parent_city.as_deref().is_some_and(|p| p.to_lowercase().contains(q))
}

fn is_priority(entry: &GazetteerEntry) -> bool {
    PRIORITY_CITIES.contains(&entry.name.as_str())
        || entry
            .parent_city
            .as_deref()
            .is_some_and(|p| PRIORITY_CITIES.contains(&p))
}

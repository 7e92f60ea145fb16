//! "Where am I?" fallback chain.
//!
//! Each strategy may or may not produce a location; the chain tries them in
//! order and the first success wins. The usual order is device fix, then
//! network, then a guess from the gazetteer.

use super::gazetteer::{format_address, CAMEROON_BOUNDS};
use super::providers::NetworkLocator;
use super::resolver::LocationResolver;
use super::types::{Accuracy, LocationResult, LocationSource};
use rand::Rng;
use tracing::{debug, info, warn};

/// One way of finding the user's location.
pub trait LocationStrategy {
    fn name(&self) -> &'static str;
    fn locate(&mut self, resolver: &LocationResolver) -> Option<LocationResult>;
}

/// A coordinate fix reported by the device. Only trusted inside Cameroon.
#[derive(Debug, Clone, Copy)]
pub struct DeviceFix {
    pub lat: f64,
    pub lng: f64,
}

impl LocationStrategy for DeviceFix {
    fn name(&self) -> &'static str {
        "device"
    }

    fn locate(&mut self, resolver: &LocationResolver) -> Option<LocationResult> {
        if !CAMEROON_BOUNDS.contains(self.lat, self.lng) {
            debug!(lat = self.lat, lng = self.lng, "device fix outside Cameroon");
            return None;
        }
        Some(resolver.resolve_by_coordinates(self.lat, self.lng))
    }
}

/// IP geolocation through a `NetworkLocator`.
pub struct NetworkLookup<L> {
    locator: L,
}

impl<L: NetworkLocator> NetworkLookup<L> {
    pub fn new(locator: L) -> Self {
        Self { locator }
    }
}

impl<L: NetworkLocator> LocationStrategy for NetworkLookup<L> {
    fn name(&self) -> &'static str {
        "network"
    }

    fn locate(&mut self, resolver: &LocationResolver) -> Option<LocationResult> {
        let ip = match self.locator.lookup() {
            Ok(ip) => ip,
            Err(e) => {
                warn!(error = %e, "network geolocation failed");
                return None;
            }
        };

        let gazetteer = resolver.gazetteer();
        if ip.is_in_cameroon() {
            if let Some(entry) = ip.place_name().and_then(|name| gazetteer.find_by_name(name)) {
                return Some(LocationResult {
                    lat: ip.latitude.unwrap_or(entry.lat),
                    lng: ip.longitude.unwrap_or(entry.lng),
                    formatted_address: format_address(entry),
                    accuracy: Accuracy::Medium,
                    source: LocationSource::Network,
                });
            }
        }

        // Abroad, or a place we don't know: settle on the main city.
        let main = gazetteer.main_city();
        Some(LocationResult {
            lat: main.lat,
            lng: main.lng,
            formatted_address: format_address(main),
            accuracy: Accuracy::Low,
            source: LocationSource::Network,
        })
    }
}

/// Random popular city. Always succeeds.
pub struct GazetteerGuess<R> {
    rng: R,
}

impl<R: Rng> GazetteerGuess<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> LocationStrategy for GazetteerGuess<R> {
    fn name(&self) -> &'static str {
        "guess"
    }

    fn locate(&mut self, resolver: &LocationResolver) -> Option<LocationResult> {
        let entry = resolver.gazetteer().random_popular_city(&mut self.rng);
        Some(LocationResult {
            lat: entry.lat,
            lng: entry.lng,
            formatted_address: format_address(entry),
            accuracy: Accuracy::Low,
            source: LocationSource::Gazetteer,
        })
    }
}

/// Ordered list of strategies.
#[derive(Default)]
pub struct LocationChain {
    strategies: Vec<Box<dyn LocationStrategy + Send>>,
}

impl LocationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, strategy: impl LocationStrategy + Send + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order until one produces a location.
    pub fn locate(&mut self, resolver: &LocationResolver) -> Option<LocationResult> {
        for strategy in &mut self.strategies {
            if let Some(result) = strategy.locate(resolver) {
                info!(strategy = strategy.name(), address = %result.formatted_address, "location found");
                return Some(result);
            }
            debug!(strategy = strategy.name(), "strategy produced nothing");
        }
        None
    }
}

//! Location subsystem for Trackzer.
//!
//! Resolves free-text place names and coordinate fixes against a static
//! gazetteer of Cameroonian cities and districts, with a TTL-cached
//! suggestion list and an ordered fallback chain for "use my location".

pub mod cache;
pub mod gazetteer;
pub mod providers;
pub mod resolver;
pub mod strategy;
pub mod types;

pub use gazetteer::{format_address, Gazetteer, GazetteerError, NearestMatch, CAMEROON_BOUNDS};
pub use resolver::LocationResolver;
pub use strategy::{DeviceFix, GazetteerGuess, LocationChain, LocationStrategy, NetworkLookup};
pub use types::{
    Accuracy, GazetteerEntry, LocationError, LocationResult, LocationSource, PlaceKind, ReverseLookup,
};

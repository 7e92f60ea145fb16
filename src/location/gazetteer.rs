//! The Cameroonian gazetteer: a read-only table of cities and districts.
//!
//! Loaded once at startup, either from the built-in table or from a JSON
//! file. Every lookup is a linear scan; the table is small and fixed.

use super::types::{Bounds, GazetteerEntry, PlaceKind};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Country label appended to every formatted address.
pub const COUNTRY_LABEL: &str = "Cameroon";

/// Territory of Cameroon, in decimal degrees.
pub const CAMEROON_BOUNDS: Bounds = Bounds {
    south: 1.652778,
    north: 13.083333,
    west: 8.494444,
    east: 16.192222,
};

/// Default map centre (lat, lng).
pub const CAMEROON_CENTER: (f64, f64) = (7.3697, 12.3547);

/// Cities sorted first in text search results.
pub const PRIORITY_CITIES: &[&str] = &["Yaoundé", "Douala", "Bafoussam", "Bamenda", "Garoua", "Maroua"];

/// Cities used when a location has to be guessed.
pub const POPULAR_CITIES: &[&str] = &["Yaoundé", "Douala", "Bafoussam", "Bamenda", "Garoua"];

const MAIN_CITIES: &[&str] = &["Yaoundé", "Douala"];

const REGIONS: &[(&str, &[&str])] = &[
    ("centre", &["Yaoundé", "Mbalmayo", "Edéa"]),
    ("littoral", &["Douala", "Kribi", "Limbe", "Buea", "Tiko", "Nkongsamba"]),
    ("ouest", &["Bafoussam", "Dschang", "Foumban"]),
    ("nord-ouest", &["Bamenda", "Kumba"]),
    ("nord", &["Garoua", "Ngaoundéré"]),
    ("extrême-nord", &["Maroua"]),
    ("est", &["Bertoua"]),
    ("sud", &["Ebolowa", "Sangmélima"]),
];

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinPlace {
    name: &'static str,
    lat: f64,
    lng: f64,
    kind: PlaceKind,
    parent: Option<&'static str>,
    population: Option<u64>,
}

const fn city(name: &'static str, lat: f64, lng: f64, population: u64) -> BuiltinPlace {
    BuiltinPlace { name, lat, lng, kind: PlaceKind::City, parent: None, population: Some(population) }
}

const fn district(name: &'static str, lat: f64, lng: f64, parent: &'static str) -> BuiltinPlace {
    BuiltinPlace { name, lat, lng, kind: PlaceKind::District, parent: Some(parent), population: None }
}

const BUILTIN_PLACES: &[BuiltinPlace] = &[
    // Yaoundé
    city("Yaoundé", 3.8480, 11.5021, 4000000),
    district("Centre-ville", 3.8667, 11.5167, "Yaoundé"),
    district("Bastos", 3.8833, 11.5167, "Yaoundé"),
    district("Melen", 3.8333, 11.5000, "Yaoundé"),
    district("Mvog-Mbi", 3.8500, 11.4833, "Yaoundé"),
    district("Nlongkak", 3.8667, 11.4833, "Yaoundé"),
    district("Emombo", 3.8167, 11.5167, "Yaoundé"),
    district("Essos", 3.8833, 11.5333, "Yaoundé"),
    district("Kondengui", 3.8000, 11.5333, "Yaoundé"),
    district("Nkoldongo", 3.8333, 11.5333, "Yaoundé"),
    district("Nkomo", 3.8167, 11.4833, "Yaoundé"),
    district("Odza", 3.8500, 11.5500, "Yaoundé"),
    district("Mokolo", 3.8333, 11.4667, "Yaoundé"),
    district("Mfoundi", 3.8167, 11.5000, "Yaoundé"),
    district("Ngousso", 3.8833, 11.4667, "Yaoundé"),
    district("Biyem-Assi", 3.8000, 11.4833, "Yaoundé"),
    district("Ekounou", 3.8667, 11.5500, "Yaoundé"),
    district("Mendong", 3.8000, 11.5167, "Yaoundé"),

    // Douala
    city("Douala", 4.0511, 9.7679, 3500000),
    district("Akwa", 4.0500, 9.7000, "Douala"),
    district("Bonanjo", 4.0667, 9.7000, "Douala"),
    district("Bali", 4.0333, 9.7333, "Douala"),
    district("Bonapriso", 4.0833, 9.7167, "Douala"),
    district("Deido", 4.0833, 9.7333, "Douala"),
    district("New Bell", 4.0333, 9.7667, "Douala"),
    district("Nylon", 4.0167, 9.7500, "Douala"),
    district("Makepe", 4.0167, 9.8000, "Douala"),
    district("Logbessou", 4.0000, 9.7833, "Douala"),
    district("Kotto", 4.0500, 9.7833, "Douala"),
    district("Ndokotti", 4.0167, 9.7167, "Douala"),
    district("Bessengue", 4.0833, 9.7500, "Douala"),
    district("Pk8", 4.0000, 9.8167, "Douala"),
    district("Pk10", 3.9833, 9.8333, "Douala"),
    district("Pk12", 3.9667, 9.8500, "Douala"),
    district("Pk14", 3.9500, 9.8667, "Douala"),
    district("Pk17", 3.9333, 9.8833, "Douala"),
    district("Cité SIC", 4.0333, 9.8000, "Douala"),
    district("Village", 4.0667, 9.7833, "Douala"),
    district("Bépanda", 4.0167, 9.7333, "Douala"),
    district("Nyalla", 4.0500, 9.8167, "Douala"),

    // Bafoussam
    city("Bafoussam", 5.4781, 10.4167, 800000),
    district("Centre-ville Bafoussam", 5.4833, 10.4167, "Bafoussam"),
    district("Djeleng", 5.4667, 10.4000, "Bafoussam"),
    district("Famla", 5.4833, 10.4333, "Bafoussam"),
    district("Tamdja", 5.4667, 10.4333, "Bafoussam"),
    district("Tougang", 5.4500, 10.4167, "Bafoussam"),
    district("Kamkop", 5.4833, 10.4000, "Bafoussam"),
    district("Ngouache", 5.4667, 10.4167, "Bafoussam"),
    district("Banengo", 5.4500, 10.4333, "Bafoussam"),

    // Bamenda
    city("Bamenda", 5.9631, 10.1591, 500000),
    district("Commercial Avenue", 5.9667, 10.1500, "Bamenda"),
    district("Up Station", 5.9833, 10.1667, "Bamenda"),
    district("Cow Street", 5.9500, 10.1500, "Bamenda"),
    district("Ntarikon", 5.9333, 10.1333, "Bamenda"),
    district("Nkwen", 5.9833, 10.1333, "Bamenda"),
    district("Mankon", 5.9500, 10.1833, "Bamenda"),
    district("Mendankwe", 5.9667, 10.1333, "Bamenda"),
    district("Mulang", 5.9333, 10.1667, "Bamenda"),

    // Garoua
    city("Garoua", 9.3265, 13.3958, 400000),
    district("Centre-ville Garoua", 9.3333, 13.4000, "Garoua"),
    district("Grand Marché", 9.3167, 13.3833, "Garoua"),
    district("Plateau", 9.3500, 13.4167, "Garoua"),
    district("Petit Marché", 9.3000, 13.3667, "Garoua"),
    district("Doualaré", 9.3167, 13.4167, "Garoua"),
    district("Ouro Tchédé", 9.3500, 13.3833, "Garoua"),
    district("Kollere", 9.3000, 13.4000, "Garoua"),

    // Maroua
    city("Maroua", 10.5906, 14.3172, 350000),
    district("Centre-ville Maroua", 10.5833, 14.3167, "Maroua"),
    district("Domayo", 10.6000, 14.3333, "Maroua"),
    district("Djarengol", 10.5667, 14.3000, "Maroua"),
    district("Hardé", 10.6167, 14.3500, "Maroua"),
    district("Pitoaré", 10.5667, 14.3333, "Maroua"),
    district("Founangué", 10.6000, 14.3000, "Maroua"),

    // Ngaoundéré
    city("Ngaoundéré", 7.3167, 13.5833, 300000),
    district("Centre-ville Ngaoundéré", 7.3167, 13.5833, "Ngaoundéré"),
    district("Petit Marché Ngaoundéré", 7.3000, 13.5667, "Ngaoundéré"),
    district("Haoussa", 7.3333, 13.6000, "Ngaoundéré"),
    district("Dang", 7.3000, 13.6000, "Ngaoundéré"),
    district("Sabongari", 7.3333, 13.5667, "Ngaoundéré"),

    // Bertoua
    city("Bertoua", 4.5833, 13.6833, 250000),
    district("Centre-ville Bertoua", 4.5833, 13.6833, "Bertoua"),
    district("Mokolo Bertoua", 4.5667, 13.6667, "Bertoua"),
    district("Gbiti", 4.5667, 13.7000, "Bertoua"),
    district("Sabongari Bertoua", 4.6000, 13.6667, "Bertoua"),

    // Ebolowa
    city("Ebolowa", 2.9167, 11.1500, 200000),
    district("Centre-ville Ebolowa", 2.9167, 11.1500, "Ebolowa"),
    district("Angalé", 2.9000, 11.1333, "Ebolowa"),
    district("Nkolemveng", 2.9333, 11.1333, "Ebolowa"),

    // Kribi
    city("Kribi", 2.9333, 9.9167, 150000),
    district("Centre-ville Kribi", 2.9333, 9.9167, "Kribi"),
    district("Grand Batanga", 2.9167, 9.9000, "Kribi"),
    district("Londji", 2.9500, 9.8833, "Kribi"),

    // Limbe
    city("Limbe", 4.0167, 9.2167, 120000),
    district("Down Beach", 4.0000, 9.2000, "Limbe"),
    district("Mile 4", 4.0333, 9.2333, "Limbe"),
    district("Clerks Quarters", 4.0167, 9.2333, "Limbe"),
    district("New Town", 4.0333, 9.2167, "Limbe"),

    // Buea
    city("Buea", 4.1500, 9.2833, 100000),
    district("Molyko", 4.1333, 9.2667, "Buea"),
    district("Great Soppo", 4.1667, 9.3000, "Buea"),
    district("Bonduma", 4.1333, 9.3000, "Buea"),
    district("Bokwango", 4.1667, 9.2667, "Buea"),

    // Secondary towns, no district breakdown
    city("Edéa", 3.8000, 10.1333, 80000),
    city("Kumba", 4.6333, 9.4500, 90000),
    city("Foumban", 5.7167, 10.9000, 70000),
    city("Dschang", 5.4500, 10.0500, 60000),
    city("Mbalmayo", 3.5167, 11.5000, 50000),
    city("Sangmélima", 2.9333, 11.9833, 45000),
    city("Tiko", 4.0667, 9.3667, 55000),
    city("Nkongsamba", 4.9500, 9.9333, 65000),];

// ─── Gazetteer ──────────────────────────────────────────────────

/// A gazetteer that cannot be used. Fatal at startup.
#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("gazetteer is empty")]
    Empty,
    #[error("gazetteer entry #{0} has a blank name")]
    BlankName(usize),
    #[error("gazetteer entry '{0}' has non-finite coordinates")]
    InvalidCoordinates(String),
    #[error("district '{0}' has no parent city")]
    MissingParent(String),
    #[error("district '{district}' names unknown parent city '{parent}'")]
    UnknownParent { district: String, parent: String },
    #[error("city '{0}' must not have a parent city")]
    UnexpectedParent(String),
    #[error("cannot read gazetteer {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed gazetteer JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The closest gazetteer entry to a coordinate pair.
#[derive(Debug, Clone, Copy)]
pub struct NearestMatch<'a> {
    pub entry: &'a GazetteerEntry,
    /// Planar distance in degrees.
    pub distance: f64,
}

/// Immutable, validated place table. Never empty, always holds at least one city.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
    city_indices: Vec<usize>,
}

impl Gazetteer {
    /// The built-in Cameroonian table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_PLACES
            .iter()
            .map(|p| GazetteerEntry {
                name: p.name.to_string(),
                lat: p.lat,
                lng: p.lng,
                kind: p.kind,
                parent_city: p.parent.map(str::to_string),
                population: p.population,
            })
            .collect::<Vec<_>>();
        let city_indices = city_indices(&entries);
        Self { entries, city_indices }
    }

    /// Build a gazetteer from arbitrary entries, checking every invariant.
    pub fn from_entries(entries: Vec<GazetteerEntry>) -> Result<Self, GazetteerError> {
        if entries.is_empty() {
            return Err(GazetteerError::Empty);
        }

        for (i, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(GazetteerError::BlankName(i));
            }
            if !entry.lat.is_finite() || !entry.lng.is_finite() {
                return Err(GazetteerError::InvalidCoordinates(entry.name.clone()));
            }
            match (entry.kind, entry.parent_city.as_deref()) {
                (PlaceKind::City, Some(_)) => {
                    return Err(GazetteerError::UnexpectedParent(entry.name.clone()));
                }
                (PlaceKind::District, None) => {
                    return Err(GazetteerError::MissingParent(entry.name.clone()));
                }
                (PlaceKind::District, Some(parent)) => {
                    let known = entries.iter().any(|e| e.is_city() && e.name == parent);
                    if !known {
                        return Err(GazetteerError::UnknownParent {
                            district: entry.name.clone(),
                            parent: parent.to_string(),
                        });
                    }
                }
                (PlaceKind::City, None) => {}
            }
        }

        let city_indices = city_indices(&entries);
        debug!(entries = entries.len(), cities = city_indices.len(), "gazetteer validated");
        Ok(Self { entries, city_indices })
    }

    /// Parse a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self, GazetteerError> {
        let entries: Vec<GazetteerEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Load a JSON gazetteer file.
    pub fn load(path: &Path) -> Result<Self, GazetteerError> {
        let data = fs::read_to_string(path).map_err(|source| GazetteerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn entries(&self) -> &[GazetteerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with exactly this name.
    pub fn get(&self, name: &str) -> Option<&GazetteerEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn cities(&self) -> impl Iterator<Item = &GazetteerEntry> {
        self.city_indices.iter().map(|&i| &self.entries[i])
    }

    pub fn districts_of<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a GazetteerEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.is_district() && e.parent_city.as_deref() == Some(city))
    }

    /// Up to ten cities with a known population, largest first.
    pub fn popular_cities(&self) -> Vec<&GazetteerEntry> {
        let mut cities: Vec<&GazetteerEntry> = self.cities().filter(|c| c.population.is_some()).collect();
        cities.sort_by(|a, b| b.population.cmp(&a.population));
        cities.truncate(10);
        cities
    }

    /// Cities of every administrative region whose name contains the query.
    pub fn search_by_region(&self, query: &str) -> Vec<&GazetteerEntry> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        let wanted: Vec<&str> = REGIONS
            .iter()
            .filter(|(region, _)| region.contains(q.as_str()))
            .flat_map(|(_, cities)| cities.iter().copied())
            .collect();
        self.entries
            .iter()
            .filter(|e| wanted.contains(&e.name.as_str()))
            .collect()
    }

    /// First entry whose name or parent city contains the term, case-insensitively.
    pub fn find_by_name(&self, term: &str) -> Option<&GazetteerEntry> {
        let q = term.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }
        self.entries.iter().find(|e| {
            e.name.to_lowercase().contains(&q)
                || e.parent_city.as_deref().is_some_and(|p| p.to_lowercase().contains(&q))
        })
    }

    /// Closest entry by planar degree distance; ties keep the earlier entry.
    pub fn nearest(&self, lat: f64, lng: f64) -> NearestMatch<'_> {
        let first = &self.entries[0];
        let mut best = NearestMatch {
            entry: first,
            distance: planar_distance(lat, lng, first.lat, first.lng),
        };
        for entry in &self.entries[1..] {
            let distance = planar_distance(lat, lng, entry.lat, entry.lng);
            if distance < best.distance {
                best = NearestMatch { entry, distance };
            }
        }
        best
    }

    /// Uniform pick over all cities.
    pub fn random_city<R: Rng + ?Sized>(&self, rng: &mut R) -> &GazetteerEntry {
        let i = rng.gen_range(0..self.city_indices.len());
        &self.entries[self.city_indices[i]]
    }

    /// Uniform pick over the popular cities present, or over all cities if none are.
    pub fn random_popular_city<R: Rng + ?Sized>(&self, rng: &mut R) -> &GazetteerEntry {
        let popular: Vec<&GazetteerEntry> = self
            .cities()
            .filter(|c| POPULAR_CITIES.contains(&c.name.as_str()))
            .collect();
        if popular.is_empty() {
            return self.random_city(rng);
        }
        popular[rng.gen_range(0..popular.len())]
    }

    /// The capital, else the economic capital, else the first city.
    pub fn main_city(&self) -> &GazetteerEntry {
        MAIN_CITIES
            .iter()
            .find_map(|name| self.get(name).filter(|e| e.is_city()))
            .unwrap_or(&self.entries[self.city_indices[0]])
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::builtin()
    }
}

fn city_indices(entries: &[GazetteerEntry]) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_city())
        .map(|(i, _)| i)
        .collect()
}

/// Euclidean distance in degree space. Only meant for nearest-label lookup.
pub fn planar_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    ((lat1 - lat2).powi(2) + (lng1 - lng2).powi(2)).sqrt()
}

/// "Akwa, Douala, Cameroon" for a district, "Douala, Cameroon" for a city.
pub fn format_address(entry: &GazetteerEntry) -> String {
    match (entry.kind, entry.parent_city.as_deref()) {
        (PlaceKind::District, Some(parent)) => format!("{}, {}, {}", entry.name, parent, COUNTRY_LABEL),
        _ => format!("{}, {}", entry.name, COUNTRY_LABEL),
    }
}

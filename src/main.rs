use anyhow::Context;
use chrono::Duration;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use trackzer::imei::validate_imei;
use trackzer::location::providers::IpApiLocator;
use trackzer::location::{
    DeviceFix, Gazetteer, GazetteerEntry, GazetteerGuess, LocationChain, LocationError, LocationResolver,
    NetworkLookup,
};
use trackzer::{logging, server};

/// Trackzer: lost and stolen phone tracker for Cameroon
///
/// Validates IMEIs and resolves Cameroonian place names and coordinates.
///
/// Examples:
///   trackzer imei 356938035643809
///   trackzer locate Akwa
///   trackzer locate "centre" --suggest
///   trackzer reverse --lat 3.848 --lng 11.5021
///   trackzer here --offline
///   trackzer serve --port 8080
#[derive(Parser)]
#[command(name = "trackzer", version, about, long_about = None)]
struct Cli {
    /// JSON gazetteer file to use instead of the built-in table.
    #[arg(long, global = true, env = "TRACKZER_GAZETTEER")]
    gazetteer: Option<PathBuf>,

    /// Lifetime of cached suggestion lists, in seconds.
    #[arg(long, global = true, env = "TRACKZER_SUGGESTION_TTL", default_value_t = 600)]
    suggestion_ttl: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check an IMEI's format and Luhn checksum.
    Imei { imei: String },

    /// Resolve a place name.
    Locate {
        query: String,

        /// Print the suggestion list instead of the best match.
        #[arg(long)]
        suggest: bool,
    },

    /// Find the nearest known place to a coordinate pair.
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Pick a random city.
    Random {
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Locate the user: device fix, then IP geolocation, then a guess.
    Here {
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,

        /// Skip IP geolocation.
        #[arg(long)]
        offline: bool,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the districts of a city.
    Districts { city: String },

    /// Run the JSON HTTP API.
    Serve {
        #[arg(long, env = "TRACKZER_HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "TRACKZER_PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Serialize)]
struct ImeiVerdict<'a> {
    imei: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init("info")?;

    // ── Load gazetteer ──────────────────────────────────────────

    let gazetteer = match &cli.gazetteer {
        Some(path) => Gazetteer::load(path)
            .with_context(|| format!("cannot use gazetteer {}", path.display()))?,
        None => Gazetteer::builtin(),
    };
    info!(entries = gazetteer.len(), "gazetteer loaded");

    let resolver = LocationResolver::with_suggestion_ttl(
        Arc::new(gazetteer),
        Duration::seconds(i64::from(cli.suggestion_ttl)),
    );

    match cli.command {
        Command::Imei { imei } => {
            let reason = validate_imei(&imei).err().map(|e| e.to_string());
            let valid = reason.is_none();
            print_json(&ImeiVerdict { imei: &imei, valid, reason })?;
            if !valid {
                std::process::exit(1);
            }
        }

        Command::Locate { query, suggest } => {
            if suggest {
                print_json(&resolver.suggestions(&query))?;
            } else {
                match resolver.resolve_by_text(&query) {
                    Ok(loc) => print_json(&loc)?,
                    Err(e @ LocationError::NotFound(_)) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Command::Reverse { lat, lng } => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                anyhow::bail!("Invalid coordinates. Lat: -90..90, Lng: -180..180");
            }
            print_json(&resolver.reverse_lookup(lat, lng))?;
        }

        Command::Random { seed } => {
            let mut rng = seeded_rng(seed);
            print_json(resolver.random_location(&mut rng))?;
        }

        Command::Here { lat, lng, offline, seed } => {
            let mut chain = LocationChain::new();
            if let (Some(lat), Some(lng)) = (lat, lng) {
                chain = chain.then(DeviceFix { lat, lng });
            }
            if offline {
                warn!("offline: skipping IP geolocation");
            } else {
                chain = chain.then(NetworkLookup::new(IpApiLocator::new()));
            }
            chain = chain.then(GazetteerGuess::new(seeded_rng(seed)));

            let loc = chain
                .locate(&resolver)
                .context("no location strategy produced a result")?;
            print_json(&loc)?;
        }

        Command::Districts { city } => {
            let gazetteer = resolver.gazetteer();
            if !gazetteer.get(&city).is_some_and(GazetteerEntry::is_city) {
                eprintln!("Error: unknown city '{}'", city);
                std::process::exit(1);
            }
            let districts: Vec<_> = gazetteer.districts_of(&city).collect();
            print_json(&districts)?;
        }

        Command::Serve { host, port } => {
            let state = Arc::new(server::AppState::new(resolver));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start(&host, port, state))?;
            return Ok(());
        }
    }

    resolver.close();
    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

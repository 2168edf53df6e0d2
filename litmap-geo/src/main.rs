//! litmap-geo - city resolution for historical author datasets
//!
//! Commands:
//! - `resolve`: geocode an authors CSV through the persistent cache
//! - `audit`: coverage summary of an annotated CSV
//! - `export-cache`: dump the resolution cache as JSON
//! - `init-config`: write a default TOML config

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use litmap_common::config::{self, TomlConfig};
use litmap_common::CountryField;
use litmap_geo::dataset::{
    split_clean, write_annotated, write_cache_json, AuthorColumns, AuthorTable, GeocodingAudit,
};
use litmap_geo::providers::{Gazetteer, GazetteerOptions, GoogleGeocoder, GoogleGeocoderSettings};
use litmap_geo::services::{
    annotate_authors, CacheStore, CsvCacheStore, MemoryCacheStore, ResolutionCache,
};
use litmap_geo::{Flagger, LocationProvider, RegionTable, Resolver};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments for litmap-geo
#[derive(Parser, Debug)]
#[command(name = "litmap-geo")]
#[command(about = "Resolve, flag and cache author city locations")]
#[command(version)]
struct Args {
    /// Config file (overrides LITMAP_CONFIG and default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve every city of an authors CSV and write annotated output
    Resolve {
        /// Authors CSV
        input: PathBuf,

        /// Annotated output CSV
        #[arg(long)]
        out: PathBuf,

        #[arg(long, value_enum, default_value_t = ProviderKind::Gazetteer)]
        provider: ProviderKind,

        /// GeoNames export (overrides [gazetteer] path)
        #[arg(long, env = "LITMAP_GAZETTEER")]
        gazetteer: Option<PathBuf>,

        /// Cache CSV (overrides [cache] path)
        #[arg(long, env = "LITMAP_CACHE")]
        cache: Option<PathBuf>,

        /// Also write authors_cleaned.csv and authors_bad_results.csv here
        #[arg(long, value_name = "DIR")]
        split_dir: Option<PathBuf>,

        /// Country representation: name or code (overrides [geocoder] country_field)
        #[arg(long)]
        country_field: Option<CountryField>,

        /// Resolve against an in-memory copy of the cache; nothing is persisted
        #[arg(long)]
        dry_run: bool,
    },

    /// Print geocoding coverage of an annotated CSV
    Audit {
        input: PathBuf,
    },

    /// Export the resolution cache as JSON
    ExportCache {
        #[arg(long)]
        out: PathBuf,

        #[arg(long, env = "LITMAP_CACHE")]
        cache: Option<PathBuf>,
    },

    /// Write a default config file
    InitConfig {
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    /// Offline GeoNames gazetteer
    Gazetteer,
    /// Google Geocoding API
    Google,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Subscriber first so config discovery is logged; RUST_LOG wins over
    // [logging] level, which is applied once the config is loaded
    let env_filter = EnvFilter::try_from_default_env().ok();
    let level_from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| crate_filter(DEFAULT_LOG_LEVEL)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = config::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    if !level_from_env {
        apply_log_level(&filter_handle, &config.logging.level)?;
    }

    info!("litmap-geo {}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Resolve {
            input,
            out,
            provider,
            gazetteer,
            cache,
            split_dir,
            country_field,
            dry_run,
        } => {
            if let Some(field) = country_field {
                config.geocoder.country_field = field;
            }
            let provider = build_provider(&config, provider, gazetteer.as_deref())?;
            let cache_path = cache.unwrap_or_else(|| config.cache.path.clone());
            let options = ResolveOptions {
                input: &input,
                out: &out,
                split_dir: split_dir.as_deref(),
            };

            if dry_run {
                warn!("Dry run: cache updates will not be persisted");
                let rows = CsvCacheStore::new(&cache_path)
                    .load()
                    .with_context(|| format!("Failed to load cache {}", cache_path.display()))?;
                run_resolve(&config, provider, MemoryCacheStore::with_rows(rows), &options).await
            } else {
                run_resolve(&config, provider, CsvCacheStore::new(&cache_path), &options).await
            }
        }

        Command::Audit { input } => {
            let columns = AuthorColumns::from(&config.dataset);
            let audit = GeocodingAudit::from_csv(&input, &columns)
                .with_context(|| format!("Failed to audit {}", input.display()))?;
            println!("{}", audit);
            Ok(())
        }

        Command::ExportCache { out, cache } => {
            let cache_path = cache.unwrap_or_else(|| config.cache.path.clone());
            let rows = CsvCacheStore::new(&cache_path)
                .load()
                .with_context(|| format!("Failed to load cache {}", cache_path.display()))?;
            let cache = ResolutionCache::from_rows(rows, config.cache.id_base)
                .with_context(|| format!("Cache {} is corrupt", cache_path.display()))?;
            let cities = write_cache_json(&cache, &out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Exported {} cities to {}", cities, out.display());
            Ok(())
        }

        Command::InitConfig { path, force } => {
            let path = match path {
                Some(path) => path,
                None => config::default_config_path()?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::write_toml_config(&TomlConfig::default(), &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn crate_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("litmap_geo={0},litmap_common={0}", level))
}

/// Swap in the configured `[logging] level`
fn apply_log_level(handle: &reload::Handle<EnvFilter, Registry>, level: &str) -> Result<()> {
    handle
        .reload(crate_filter(level))
        .context("Failed to apply configured log level")
}

struct ResolveOptions<'a> {
    input: &'a Path,
    out: &'a Path,
    split_dir: Option<&'a Path>,
}

fn build_provider(
    config: &TomlConfig,
    kind: ProviderKind,
    gazetteer_path: Option<&Path>,
) -> Result<Box<dyn LocationProvider>> {
    let country_field = config.geocoder.country_field;

    match kind {
        ProviderKind::Gazetteer => {
            let Some(path) = gazetteer_path.or(config.gazetteer.path.as_deref()) else {
                bail!("No gazetteer configured: pass --gazetteer or set [gazetteer] path");
            };
            let options = GazetteerOptions {
                case_insensitive: config.gazetteer.case_insensitive,
                country_field,
            };
            let gazetteer = Gazetteer::load(path, config.gazetteer.delimiter, options)
                .with_context(|| format!("Failed to load gazetteer {}", path.display()))?;
            Ok(Box::new(gazetteer))
        }
        ProviderKind::Google => {
            let api_key = config::resolve_google_api_key(config)?;
            let settings = GoogleGeocoderSettings {
                min_interval: Duration::from_millis(config.geocoder.min_interval_ms),
                timeout: Duration::from_secs(config.geocoder.timeout_secs),
                country_field,
            };
            let geocoder = GoogleGeocoder::new(api_key, settings).context("Failed to build geocoder")?;
            Ok(Box::new(geocoder))
        }
    }
}

async fn run_resolve<S: CacheStore>(
    config: &TomlConfig,
    provider: Box<dyn LocationProvider>,
    store: S,
    options: &ResolveOptions<'_>,
) -> Result<()> {
    let columns = AuthorColumns::from(&config.dataset);
    let table = AuthorTable::read_csv(options.input, &columns)
        .with_context(|| format!("Failed to read {}", options.input.display()))?;

    let flagger = Flagger::new(RegionTable::new(config.geocoder.country_field));
    let mut resolver = Resolver::open(provider, flagger, store, config.cache.id_base)
        .context("Failed to load resolution cache")?;

    let (annotated, stats) =
        annotate_authors(&mut resolver, &table.records, config.dataset.reference_offset_years)
            .await
            .context("Failed to persist resolution cache")?;

    write_annotated(options.out, &table, &annotated)
        .with_context(|| format!("Failed to write {}", options.out.display()))?;

    if let Some(dir) = options.split_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let (cleaned, bad) = split_clean(&annotated);
        write_annotated(&dir.join("authors_cleaned.csv"), &table, cleaned)?;
        write_annotated(&dir.join("authors_bad_results.csv"), &table, bad)?;
    }

    println!(
        "{} rows: {} resolved, {} from cache, {} unresolved ({} provider errors), {} flagged",
        stats.rows, stats.resolved, stats.cache_hits, stats.unresolved, stats.provider_errors, stats.flagged
    );
    println!("{}", GeocodingAudit::from_annotated(&annotated));
    Ok(())
}

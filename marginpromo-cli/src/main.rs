//! MarginPromo CLI — resolve promotional margin offers.
//!
//! Commands:
//! - `by-symbol`: cheapest offer for one symbol, per account of a custody code
//! - `public-by-symbol`: cheapest catalog-wide offer for one symbol
//! - `public`: catalog-wide offers for every promoted symbol, grouped by package
//! - `investor`: every retail-promoted symbol's offer, per account
//! - `packages`: per-account offers grouped by package
//! - `campaigns`: catalog-wide offers per active campaign, grouped by package
//! - `fingerprint`: content hash of a snapshot file
//!
//! Data comes from a snapshot file (`--snapshot`) or the remote services
//! (`--remote`). Set `RUST_LOG` for finer log control.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use marginpromo_core::{
    AccountNo, GroupedPackage, RemoteConfig, RemoteSource, ResolvedOffer, Snapshot,
    SnapshotSource,
};
use marginpromo_engine::{EngineConfig, PromotionService, Sources};

#[derive(Parser)]
#[command(
    name = "marginpromo",
    about = "MarginPromo CLI: promotional margin loan resolution"
)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Engine config TOML file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the fan-out parallelism bound.
    #[arg(long, global = true)]
    max_parallelism: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    /// Log resolution details to stderr.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Snapshot JSON file to read all sources from.
    #[arg(long, global = true, conflicts_with = "remote")]
    snapshot: Option<PathBuf>,

    /// Base URL of the remote services.
    #[arg(long, global = true)]
    remote: Option<String>,

    /// Per-request timeout for remote services, in seconds.
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,
}

#[derive(Args)]
struct AccountArgs {
    /// Custody code owning the accounts.
    #[arg(long)]
    custody_code: String,

    /// Restrict to one account of the custody code.
    #[arg(long)]
    account: Option<String>,
}

impl AccountArgs {
    fn account_no(&self) -> Option<AccountNo> {
        self.account.as_deref().map(AccountNo::new)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cheapest offer for a symbol, per margin account of a custody code.
    BySymbol {
        symbol: String,
        #[command(flatten)]
        accounts: AccountArgs,
    },
    /// Cheapest catalog-wide offer for a symbol.
    PublicBySymbol { symbol: String },
    /// Catalog-wide offers for every promoted symbol, grouped by package.
    Public,
    /// Every retail-promoted symbol's offer, per margin account.
    Investor {
        #[command(flatten)]
        accounts: AccountArgs,
    },
    /// Per-account offers grouped by package.
    Packages {
        #[command(flatten)]
        accounts: AccountArgs,

        /// Only this symbol.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Catalog-wide offers per active campaign, grouped by package.
    Campaigns {
        /// Only this symbol.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print the content fingerprint of the snapshot file.
    Fingerprint,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

/// One flattened offer, as written to CSV.
#[derive(Serialize)]
struct OfferRow {
    account_no: String,
    symbol: String,
    loan_package_id: i64,
    package_name: String,
    product_id: String,
    interest_rate: f64,
    campaign_name: String,
}

impl OfferRow {
    fn from_offer(account_no: Option<&AccountNo>, offer: &ResolvedOffer) -> Self {
        Self {
            account_no: account_no.map(|a| a.to_string()).unwrap_or_default(),
            symbol: offer.loan_product.symbol.clone(),
            loan_package_id: offer.package.id.0,
            package_name: offer.package.name.clone(),
            product_id: offer.loan_product.id.to_string(),
            interest_rate: offer.loan_product.interest_rate,
            campaign_name: offer
                .campaign
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        }
    }

    fn from_group(account_no: Option<&AccountNo>, group: &GroupedPackage) -> Vec<Self> {
        group
            .campaign_products
            .iter()
            .map(|p| Self {
                account_no: account_no.map(|a| a.to_string()).unwrap_or_default(),
                symbol: p.loan_product.symbol.clone(),
                loan_package_id: group.package.id.0,
                package_name: group.package.name.clone(),
                product_id: p.loan_product.id.to_string(),
                interest_rate: p.loan_product.interest_rate,
                campaign_name: p.campaign.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            })
            .collect()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = cli.format;
    let service = || {
        build_service(
            &cli.source,
            cli.config.as_deref(),
            cli.max_parallelism,
        )
    };

    match cli.command {
        Commands::BySymbol { symbol, accounts } => {
            let offers = service()?.promotion_loan_package_by_symbol(
                &symbol,
                accounts.account_no().as_ref(),
                &accounts.custody_code,
            )?;
            let offers = sorted(offers);
            let rows = offers
                .iter()
                .map(|(account, offer)| OfferRow::from_offer(Some(account), offer))
                .collect();
            emit(format, &offers, rows)
        }
        Commands::PublicBySymbol { symbol } => {
            let offer = service()?.public_promotion_loan_package_by_symbol(&symbol)?;
            if offer.is_none() {
                tracing::info!(symbol = %symbol, "no promotional offer");
            }
            let rows = offer
                .iter()
                .map(|o| OfferRow::from_offer(None, o))
                .collect();
            emit(format, &offer, rows)
        }
        Commands::Public => {
            let grouped = service()?.public_promotion_loan_packages()?;
            let rows = grouped
                .iter()
                .flat_map(|g| OfferRow::from_group(None, g))
                .collect();
            emit(format, &grouped, rows)
        }
        Commands::Investor { accounts } => {
            let offers = sorted(service()?.investor_promotion_loan_packages(
                accounts.account_no().as_ref(),
                &accounts.custody_code,
            )?);
            let rows = offers
                .iter()
                .flat_map(|(account, list)| {
                    list.iter().map(move |o| OfferRow::from_offer(Some(account), o))
                })
                .collect();
            emit(format, &offers, rows)
        }
        Commands::Packages { accounts, symbol } => {
            let grouped = sorted(service()?.promotion_loan_packages(
                accounts.account_no().as_ref(),
                &accounts.custody_code,
                symbol.as_deref(),
            )?);
            let rows = grouped
                .iter()
                .flat_map(|(account, groups)| {
                    groups.iter().flat_map(move |g| OfferRow::from_group(Some(account), g))
                })
                .collect();
            emit(format, &grouped, rows)
        }
        Commands::Campaigns { symbol } => {
            let grouped = service()?.public_promotion_loan_packages_with_campaigns(symbol.as_deref())?;
            let rows = grouped
                .iter()
                .flat_map(|g| OfferRow::from_group(None, g))
                .collect();
            emit(format, &grouped, rows)
        }
        Commands::Fingerprint => {
            let Some(path) = cli.source.snapshot.as_deref() else {
                bail!("fingerprint requires --snapshot");
            };
            run_fingerprint(path)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(
    source: &SourceArgs,
    config_path: Option<&Path>,
    max_parallelism: Option<usize>,
) -> Result<PromotionService> {
    let config = load_config(config_path, max_parallelism)?;
    let sources = build_sources(source)?;
    Ok(PromotionService::new(sources, config)?)
}

fn load_config(path: Option<&Path>, max_parallelism: Option<usize>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(n) = max_parallelism {
        config.max_parallelism = n;
    }
    config.validate()?;
    Ok(config)
}

fn build_sources(args: &SourceArgs) -> Result<Sources> {
    match (&args.snapshot, &args.remote) {
        (Some(path), None) => {
            let source = SnapshotSource::from_file(path)
                .with_context(|| format!("loading snapshot {}", path.display()))?;
            let fingerprint = source.fingerprint()?;
            tracing::info!(%fingerprint, "using snapshot");
            Ok(Sources::shared(Arc::new(source)))
        }
        (None, Some(url)) => {
            let config = RemoteConfig {
                timeout_secs: args.timeout_secs,
                ..RemoteConfig::new(url.as_str())
            };
            let source = RemoteSource::new(&config)
                .with_context(|| format!("connecting to {url}"))?;
            Ok(Sources::shared(Arc::new(source)))
        }
        _ => bail!("exactly one of --snapshot or --remote is required"),
    }
}

fn run_fingerprint(path: &Path) -> Result<()> {
    let snapshot = Snapshot::from_file(path)
        .with_context(|| format!("loading snapshot {}", path.display()))?;
    println!("{}", snapshot.fingerprint()?);
    Ok(())
}

fn sorted<V>(map: HashMap<AccountNo, V>) -> BTreeMap<AccountNo, V> {
    map.into_iter().collect()
}

fn emit<T: Serialize>(format: Format, value: &T, rows: Vec<OfferRow>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

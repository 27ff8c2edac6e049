//! bond-screener CLI - MOEX bond collection, yields and reports
//!
//! ## Example Usage
//!
//! ```bash
//! # Fetch the bond listing, then refresh specs of stale traded bonds
//! bond-screener get-bonds --show-progress
//!
//! # Refresh every traded bond regardless of age
//! bond-screener update-bonds
//!
//! # Collection statistics and reports
//! bond-screener stats
//! bond-screener report --rep 365-cheap
//!
//! # Export the screened selection to CSV
//! bond-screener export --only-buyback
//! ```

use anyhow::Context;
use bond_screener::analytics::{summarize, BondFrame, ReportKind};
use bond_screener::data::{MoexClient, SmartLabClient};
use bond_screener::enrich::EnrichedBond;
use bond_screener::finance::constants::{
    DEFAULT_FLAT_COMMISSION, DEFAULT_LOW_PRICE_FLOOR, DEFAULT_TAX_RETENTION,
};
use bond_screener::finance::CommissionPolicy;
use bond_screener::refresh::{refresh_listing, refresh_stale};
use bond_screener::store::{BondStore, SqliteBondStore};
use bond_screener::types::DATE_FORMAT;
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

/// bond-screener: exchange-traded bond yields and screening
#[derive(Parser)]
#[command(name = "bond-screener")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MOEX bond screener: coupon schedules, yields and reports", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the full bond listing, then refresh stale traded bonds
    GetBonds {
        /// Listing page size (default from config)
        #[arg(long)]
        page_size: Option<u32>,

        /// Show progress bar
        #[arg(long)]
        show_progress: bool,
    },

    /// Mark every bond stale and refresh all traded bonds
    UpdateBonds {
        /// Show progress bar
        #[arg(long)]
        show_progress: bool,
    },

    /// Show collection statistics
    Stats,

    /// Print a ranked report
    Report {
        /// lowest-price, 365-cheap or 365-yieldest
        #[arg(short, long, default_value = "lowest-price")]
        rep: String,

        /// Price floor of the lowest-price report (default from config)
        #[arg(long)]
        floor: Option<f64>,
    },

    /// Export bonds to CSV
    Export {
        /// Only bonds with a buyback (offer) date
        #[arg(short = 'b', long)]
        only_buyback: bool,

        /// Every stored bond, no screening
        #[arg(short, long)]
        all: bool,

        /// Output file (default under the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default = "default_db_file")]
    db_file: String,
    #[serde(default = "default_flat_commission")]
    flat_commission: f64,
    #[serde(default = "default_tax_retention")]
    tax_retention: f64,
    #[serde(default = "default_low_price_floor")]
    low_price_floor: f64,
    #[serde(default = "default_stale_after_hours")]
    stale_after_hours: i64,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bond-screener")
}

fn default_db_file() -> String {
    "bonds.db".to_string()
}

fn default_flat_commission() -> f64 {
    DEFAULT_FLAT_COMMISSION
}

fn default_tax_retention() -> f64 {
    DEFAULT_TAX_RETENTION
}

fn default_low_price_floor() -> f64 {
    DEFAULT_LOW_PRICE_FLOOR
}

fn default_stale_after_hours() -> i64 {
    24
}

fn default_page_size() -> u32 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_file: default_db_file(),
            flat_commission: default_flat_commission(),
            tax_retention: default_tax_retention(),
            low_price_floor: default_low_price_floor(),
            stale_after_hours: default_stale_after_hours(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_data_dir().join("config.toml"),
        };
        if !path.exists() {
            return Config::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => return config.validated(),
                Err(e) => {
                    eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                }
            },
            Err(e) => {
                eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
            }
        }

        Config::default()
    }

    fn validated(mut self) -> Self {
        if self.stale_after_hours < 0 {
            eprintln!(
                "{} stale_after_hours must not be negative ({}), using {}",
                "Warning:".yellow(),
                self.stale_after_hours,
                default_stale_after_hours()
            );
            self.stale_after_hours = default_stale_after_hours();
        }
        self
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }

    fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    fn policy(&self) -> bond_screener::error::Result<CommissionPolicy> {
        CommissionPolicy::new(self.flat_commission, self.tax_retention)
    }
}

type CmdResult = anyhow::Result<()>;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref());
    if let Err(e) = config.ensure_dirs() {
        eprintln!(
            "{} Failed to create directories: {}",
            "Error:".red().bold(),
            e
        );
        process::exit(1);
    }

    if cli.verbose {
        println!(
            "{} v{}",
            "bond-screener".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!("Database: {}", config.db_path().display().to_string().dimmed());
    }

    let result = match cli.command {
        Commands::GetBonds {
            page_size,
            show_progress,
        } => get_bonds(&config, page_size.unwrap_or(config.page_size), show_progress),
        Commands::UpdateBonds { show_progress } => update_bonds(&config, show_progress),
        Commands::Stats => show_stats(&config),
        Commands::Report { rep, floor } => {
            show_report(&config, &rep, floor.unwrap_or(config.low_price_floor))
        }
        Commands::Export {
            only_buyback,
            all,
            output,
        } => export_bonds(&config, only_buyback, all, output),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn open_store(config: &Config) -> anyhow::Result<SqliteBondStore> {
    let path = config.db_path();
    SqliteBondStore::new(&path).with_context(|| format!("opening bond store {}", path.display()))
}

fn source() -> bond_screener::error::Result<MoexClient> {
    Ok(MoexClient::new()?.with_coupon_kinds(SmartLabClient::new()?))
}

fn elapsed(start: Instant) -> String {
    let secs = start.elapsed().as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn get_bonds(config: &Config, page_size: u32, show_progress: bool) -> CmdResult {
    println!("{}", "Fetching bond listing...".cyan().bold());
    let start = Instant::now();
    let mut store = open_store(config)?;
    let source = source()?;
    let runtime = tokio::runtime::Runtime::new()?;

    let summary = runtime.block_on(refresh_listing(&source, &mut store, page_size))?;
    println!(
        "{} [{}] {} pages, {} new, {} updated",
        "✓".green().bold(),
        elapsed(start).yellow(),
        summary.pages,
        summary.inserted,
        summary.updated
    );
    if summary.issues > 0 {
        println!(
            "{} {} listing fields could not be decoded",
            "Warning:".yellow(),
            summary.issues
        );
    }

    refresh_specs(config, &mut store, &source, &runtime, show_progress, start)
}

fn update_bonds(config: &Config, show_progress: bool) -> CmdResult {
    let start = Instant::now();
    let mut store = open_store(config)?;
    let reset = store.reset_updated()?;
    println!("{} {} bonds marked stale", "✓".green().bold(), reset);

    let source = source()?;
    let runtime = tokio::runtime::Runtime::new()?;
    refresh_specs(config, &mut store, &source, &runtime, show_progress, start)
}

fn refresh_specs(
    config: &Config,
    store: &mut SqliteBondStore,
    source: &MoexClient,
    runtime: &tokio::runtime::Runtime,
    show_progress: bool,
    start: Instant,
) -> CmdResult {
    println!("{}", "Refreshing bond specs...".cyan().bold());
    let now = Local::now().naive_local();
    let stale_after = Duration::hours(config.stale_after_hours);
    let pending = store.count_stale(now - stale_after)?;

    let pb = if show_progress {
        let pb = ProgressBar::new(pending as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("█▓▒░ "),
        );
        Some(pb)
    } else {
        None
    };

    let summary = runtime.block_on(refresh_stale(
        source,
        store,
        config.policy()?,
        stale_after,
        now,
        |bond| match &pb {
            Some(pb) => {
                pb.set_message(bond.secid().to_string());
                pb.inc(1);
            }
            None => println!("{} / {}", elapsed(start).yellow(), bond.facts),
        },
    ))?;

    if let Some(pb) = pb {
        pb.finish_with_message("Complete!");
    }

    println!(
        "{} Refreshed {} bonds in {} ({} failed fetches)",
        "✓".green().bold(),
        summary.refreshed,
        elapsed(start),
        summary.failed
    );
    Ok(())
}

fn load_frame(config: &Config) -> anyhow::Result<BondFrame> {
    let store = open_store(config)?;
    let bonds = store.load_all()?;
    Ok(BondFrame::new(bonds, Local::now().date_naive()))
}

fn show_stats(config: &Config) -> CmdResult {
    let frame = load_frame(config)?;
    let snapshot = summarize(&frame);

    if snapshot.is_empty() {
        println!(
            "{} No bonds stored yet, run {} first",
            "Warning:".yellow(),
            "bond-screener get-bonds".bold()
        );
    }

    for (key, value) in snapshot.iter() {
        println!("{} .. {}", key.bright_white(), format_value(value).green());
    }
    Ok(())
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn show_report(config: &Config, rep: &str, floor: f64) -> CmdResult {
    let kind = rep
        .parse::<ReportKind>()
        .context("choose one of lowest-price, 365-cheap, 365-yieldest")?;
    let frame = load_frame(config)?;
    let rows = frame.report(kind, floor);

    for row in &rows {
        let facts = &row.bond.facts;
        println!(
            "{}, {} : {}, {} / {}",
            facts.shortname.as_deref().unwrap_or(&facts.secid),
            opt(row.days_to_maturity),
            opt(facts.price),
            opt(row.yield_percent()),
            facts.url().dimmed()
        );
    }

    println!(
        "report {}, found {} bonds",
        kind.as_str().green(),
        rows.len().to_string().green()
    );
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// One CSV line of an export
#[derive(Debug, Serialize)]
struct ExportRow {
    secid: String,
    shortname: Option<String>,
    url: String,
    price: Option<f64>,
    market_yield: Option<f64>,
    calc_yield: Option<f64>,
    total_percent: Option<f64>,
    month_percent: Option<f64>,
    legacy_total_percent: f64,
    legacy_month_percent: f64,
    coupon_percent: Option<f64>,
    coupon_value: Option<f64>,
    coupon_frequency: Option<u32>,
    remaining_coupons: u32,
    accrued_interest: Option<f64>,
    next_coupon_date: Option<String>,
    buyback_date: Option<String>,
    maturity_date: Option<String>,
    days_to_buyback: Option<i64>,
    days_to_finish: Option<i64>,
    days_since_prev_coupon: i64,
    list_level: Option<u8>,
    coupon_kind: Option<String>,
    face_unit: Option<String>,
    volume: Option<f64>,
}

impl From<&EnrichedBond> for ExportRow {
    fn from(bond: &EnrichedBond) -> Self {
        let f = &bond.facts;
        let d = &bond.derived;
        let date = |d: Option<NaiveDate>| d.map(|d| d.format(DATE_FORMAT).to_string());
        Self {
            secid: f.secid.clone(),
            shortname: f.shortname.clone(),
            url: f.url(),
            price: f.price,
            market_yield: f.market_yield,
            calc_yield: d.calc_yield,
            total_percent: d.total_percent,
            month_percent: d.month_percent,
            legacy_total_percent: d.legacy_total_percent,
            legacy_month_percent: d.legacy_month_percent,
            coupon_percent: f.coupon_percent,
            coupon_value: f.coupon_value,
            coupon_frequency: f.coupon_frequency,
            remaining_coupons: d.remaining_coupons,
            accrued_interest: d.accrued_interest,
            next_coupon_date: date(f.next_coupon_date),
            buyback_date: date(f.buyback_date),
            maturity_date: date(f.maturity_date),
            days_to_buyback: d.days_to_buyback,
            days_to_finish: d.days_to_finish,
            days_since_prev_coupon: d.days_since_prev_coupon,
            list_level: f.list_level.map(|l| l.get()),
            coupon_kind: f.coupon_kind.map(|k| k.to_string()),
            face_unit: f.face_unit.clone(),
            volume: f.volume,
        }
    }
}

fn write_csv<'a>(path: &Path, bonds: impl IntoIterator<Item = &'a EnrichedBond>) -> bond_screener::error::Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0;
    for bond in bonds {
        writer.serialize(ExportRow::from(bond))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

fn export_bonds(config: &Config, only_buyback: bool, all: bool, output: Option<PathBuf>) -> CmdResult {
    let frame = load_frame(config)?;
    if frame.is_empty() {
        println!("{} No bonds stored to export", "Warning:".yellow());
        return Ok(());
    }

    let file_name = match (all, only_buyback) {
        (true, _) => "bonds_all.csv",
        (false, true) => "bonds_with_filter_buyback.csv",
        (false, false) => "bonds_with_filter.csv",
    };
    let path = match output {
        Some(path) => path,
        None => {
            let reports = config.data_dir.join("reports");
            fs::create_dir_all(&reports)
                .with_context(|| format!("creating {}", reports.display()))?;
            reports.join(file_name)
        }
    };

    let count = if all {
        write_csv(&path, frame.bonds())
    } else {
        write_csv(&path, frame.export_selection(only_buyback))
    }
    .with_context(|| format!("writing {}", path.display()))?;

    println!(
        "{} Exported {} bonds to {}",
        "✓".green().bold(),
        count,
        path.display()
    );
    Ok(())
}

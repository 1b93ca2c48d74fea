//! CLI definition and dispatch.
//!
//! Results go to stdout; progress and errors go to stderr. Every failure maps
//! to an exit code through `From<&TrackerError> for ExitCode`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::MarketScan;
use crate::domain::backtest::BacktestResult;
use crate::domain::config_validation::validate_config;
use crate::domain::error::TrackerError;
use crate::domain::opportunity::InvestmentOpportunity;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::StrategyType;

/// Backtest window used when neither the command line nor the config sets one.
const DEFAULT_BACKTEST_DAYS: i64 = 365;

#[derive(Parser, Debug)]
#[command(
    name = "invest-tracker",
    about = "Investment opportunity analysis, simulation and backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every applicable strategy on one asset
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset: String,
    },
    /// Analyze every asset of a type
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset_type: String,
    },
    /// Project an investment through a strategy's scenarios
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: f64,
        /// Days; defaults to the strategy's own horizon
        #[arg(long)]
        horizon: Option<u32>,
    },
    /// Replay a strategy over stored price history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: Option<f64>,
        /// YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        /// Write the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest several strategies on one asset
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma separated, e.g. momentum,value
        #[arg(long)]
        strategies: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List stored opportunities
    Opportunities {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        active: bool,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Close an active opportunity
    CloseOpportunity {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Load assets from a JSON array
    ImportAssets {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        file: PathBuf,
    },
    /// Load price points for one asset from a CSV file
    ImportPrices {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "daily")]
        timeframe: String,
    },
    /// Check a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Command {
    fn config_path(&self) -> &Path {
        match self {
            Command::Analyze { config, .. }
            | Command::Scan { config, .. }
            | Command::Simulate { config, .. }
            | Command::Backtest { config, .. }
            | Command::Compare { config, .. }
            | Command::Opportunities { config, .. }
            | Command::CloseOpportunity { config, .. }
            | Command::ImportAssets { config, .. }
            | Command::ImportPrices { config, .. }
            | Command::Validate { config } => config,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrackerError> {
    log::debug!("loading config from {}", path.display());
    let config = FileConfigAdapter::from_file(path)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn execute(command: Command) -> Result<(), TrackerError> {
    let config = load_config(command.config_path())?;

    if let Command::Validate { config: path } = &command {
        println!("{}: configuration is valid", path.display());
        return Ok(());
    }

    #[cfg(feature = "sqlite")]
    {
        store::execute(command, &config)
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (command, config);
        Err(TrackerError::InvalidInput {
            reason: "this command needs the sqlite feature".to_string(),
        })
    }
}

/// Parses a `YYYY-MM-DD` argument as midnight UTC.
pub fn parse_date_arg(raw: &str) -> Result<DateTime<Utc>, TrackerError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| TrackerError::InvalidInput {
            reason: format!("invalid date '{raw}' (expected YYYY-MM-DD)"),
        })
}

/// Command line dates win over config dates; a missing end is now and a
/// missing start is one year before the end.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    config_start: Option<DateTime<Utc>>,
    config_end: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TrackerError> {
    let end = match end {
        Some(raw) => parse_date_arg(raw)?,
        None => config_end.unwrap_or_else(Utc::now),
    };
    let start = match start {
        Some(raw) => parse_date_arg(raw)?,
        None => config_start.unwrap_or(end - Duration::days(DEFAULT_BACKTEST_DAYS)),
    };
    Ok((start, end))
}

fn print_opportunities(opportunities: &[InvestmentOpportunity]) {
    if opportunities.is_empty() {
        println!("No opportunities");
        return;
    }
    for opp in opportunities {
        println!(
            "{}  {:<8} {:<8} {:<4} {:>6.1}%  {:<6} {:<7} {}",
            opp.id,
            opp.symbol,
            opp.strategy.as_str(),
            opp.signal.as_str(),
            opp.potential_return,
            opp.risk_level.as_str(),
            opp.status.as_str(),
            opp.reason
        );
    }
}

fn print_scan(scan: &MarketScan) {
    print_opportunities(&scan.opportunities);
    println!(
        "\n{} assets analyzed, {} skipped",
        scan.analyzed,
        scan.skipped.len()
    );
    for skipped in &scan.skipped {
        println!("  {}: {}", skipped.symbol, skipped.reason);
    }
}

fn print_simulation(sim: &Simulation) {
    println!("{} ({})", sim.name, sim.id);
    println!(
        "Entry {:.2}, target {:.2}, amount {:.2}, horizon {} days",
        sim.entry_price, sim.target_price, sim.initial_amount, sim.time_horizon_days
    );
    println!(
        "\n{:>9} {:>12} {:>12} {:>12} {:>9} {:>10}",
        "Scenario", "Price", "Final", "P/L", "P/L %", "Annual %"
    );
    for r in &sim.results {
        println!(
            "{:>8.1}% {:>12.2} {:>12.2} {:>12.2} {:>8.2}% {:>9.2}%",
            r.scenario_change,
            r.final_price,
            r.final_amount,
            r.profit_loss,
            r.profit_loss_pct,
            r.annualized_roi * 100.0
        );
    }
}

fn print_backtest(result: &BacktestResult) {
    let s = &result.statistics;
    println!(
        "=== {} on {} ({} to {}) ===",
        result.strategy_name,
        result.symbol,
        result.start_date.format("%Y-%m-%d"),
        result.end_date.format("%Y-%m-%d")
    );
    println!("Initial:       {:.2}", result.initial_investment);
    println!("Final value:   {:.2}", s.final_value);
    println!("Return:        {:.2}%", s.profit_loss_pct);
    println!("Max drawdown:  {:.2}%", s.max_drawdown);
    println!("Trades:        {}", s.total_trades);
    println!("Win rate:      {:.1}%", s.win_rate);
    println!("Biggest win:   {:.2}", s.biggest_win);
    println!("Biggest loss:  {:.2}", s.biggest_loss);

    if !result.trades.is_empty() {
        println!();
        for t in &result.trades {
            println!(
                "  {} {:<4} {:>10.4} @ {:>10.2}  {:>10.2}  {}",
                t.date.format("%Y-%m-%d"),
                t.trade_type.to_string(),
                t.units,
                t.price,
                t.profit_loss,
                t.reason
            );
        }
    }
}

fn print_comparison(results: &BTreeMap<StrategyType, BacktestResult>) {
    println!(
        "{:<10} {:>12} {:>9} {:>9} {:>7} {:>9}",
        "Strategy", "Final", "Return", "Drawdown", "Trades", "Win rate"
    );
    for (strategy, r) in results {
        let s = &r.statistics;
        println!(
            "{:<10} {:>12.2} {:>8.2}% {:>8.2}% {:>7} {:>8.1}%",
            strategy.as_str(),
            s.final_value,
            s.profit_loss_pct,
            s.max_drawdown,
            s.total_trades,
            s.win_rate
        );
    }
}

#[cfg(feature = "sqlite")]
mod store {
    use super::*;
    use crate::adapters::csv_adapter::CsvAdapter;
    use crate::adapters::json_report_adapter::JsonReportAdapter;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::domain::analysis::{AnalysisConfig, MarketAnalyzer};
    use crate::domain::asset::{Asset, AssetType};
    use crate::domain::config_validation::backtest_settings;
    use crate::domain::opportunities;
    use crate::domain::price::Timeframe;
    use crate::domain::simulator::StrategySimulator;
    use crate::domain::strategy::{parse_strategy_list, StrategyRegistry};
    use crate::ports::asset_port::AssetPort;
    use crate::ports::config_port::ConfigPort;
    use crate::ports::opportunity_port::OpportunityFilter;
    use crate::ports::price_history_port::PriceHistoryPort;
    use crate::ports::report_port::ReportPort;
    use std::fs;

    /// Assets and opportunities live in SQLite. Prices come from the CSV
    /// directory when `[prices] csv_dir` is set, else from SQLite too.
    struct Stores {
        db: SqliteAdapter,
        csv: Option<CsvAdapter>,
    }

    impl Stores {
        fn open(config: &dyn ConfigPort) -> Result<Self, TrackerError> {
            let db = SqliteAdapter::from_config(config)?;
            db.initialize_schema()?;
            let csv = config
                .get_string("prices", "csv_dir")
                .map(|dir| CsvAdapter::new(PathBuf::from(dir)));
            Ok(Stores { db, csv })
        }

        fn prices(&self) -> &dyn PriceHistoryPort {
            match &self.csv {
                Some(csv) => csv as &dyn PriceHistoryPort,
                None => &self.db,
            }
        }
    }

    fn invalid(reason: String) -> TrackerError {
        TrackerError::InvalidInput { reason }
    }

    pub(super) fn execute(command: Command, config: &FileConfigAdapter) -> Result<(), TrackerError> {
        let stores = Stores::open(config)?;
        let registry = StrategyRegistry::with_defaults();
        let simulator = StrategySimulator::new(&stores.db, stores.prices(), &registry);

        match command {
            Command::Analyze { asset, .. } => {
                let analyzer = MarketAnalyzer::new(
                    &stores.db,
                    stores.prices(),
                    &stores.db,
                    &registry,
                    AnalysisConfig::from_config(config),
                );
                print_opportunities(&analyzer.analyze_asset(&asset)?);
            }
            Command::Scan { asset_type, .. } => {
                let asset_type: AssetType = asset_type.parse().map_err(invalid)?;
                let analyzer = MarketAnalyzer::new(
                    &stores.db,
                    stores.prices(),
                    &stores.db,
                    &registry,
                    AnalysisConfig::from_config(config),
                );
                print_scan(&analyzer.analyze_market(asset_type)?);
            }
            Command::Simulate {
                strategy,
                asset,
                amount,
                horizon,
                ..
            } => {
                let sim = simulator.simulate_forward(strategy.parse()?, &asset, amount, horizon)?;
                print_simulation(&sim);
            }
            Command::Backtest {
                strategy,
                asset,
                amount,
                start,
                end,
                output,
                ..
            } => {
                let settings = backtest_settings(config)?;
                let (start, end) = resolve_window(
                    start.as_deref(),
                    end.as_deref(),
                    settings.start_date,
                    settings.end_date,
                )?;
                let amount = amount.unwrap_or(settings.initial_investment);
                let result = simulator.backtest(strategy.parse()?, &asset, amount, start, end)?;
                print_backtest(&result);
                if let Some(path) = output {
                    JsonReportAdapter::new().write_backtest(&result, &path)?;
                    eprintln!("Report written to: {}", path.display());
                }
            }
            Command::Compare {
                strategies,
                asset,
                amount,
                start,
                end,
                output,
                ..
            } => {
                let settings = backtest_settings(config)?;
                let (start, end) = resolve_window(
                    start.as_deref(),
                    end.as_deref(),
                    settings.start_date,
                    settings.end_date,
                )?;
                let amount = amount.unwrap_or(settings.initial_investment);
                let strategy_types = parse_strategy_list(&strategies)?;
                let results =
                    simulator.compare_strategies(&strategy_types, &asset, amount, start, end)?;
                print_comparison(&results);
                if let Some(path) = output {
                    JsonReportAdapter::new().write_comparison(&results, &path)?;
                    eprintln!("Report written to: {}", path.display());
                }
            }
            Command::Opportunities {
                active,
                asset,
                strategy,
                ..
            } => {
                let filter = OpportunityFilter {
                    active_only: active,
                    asset_id: asset,
                    strategy: strategy.map(|s| s.parse()).transpose()?,
                };
                let found = opportunities::list_opportunities(&stores.db, &filter, Utc::now())?;
                print_opportunities(&found);
            }
            Command::CloseOpportunity { id, .. } => {
                let closed = opportunities::close_opportunity(&stores.db, &id, Utc::now())?;
                println!("Closed {} ({})", closed.id, closed.symbol);
            }
            Command::ImportAssets { file, .. } => {
                let content = fs::read_to_string(&file)?;
                let assets: Vec<Asset> = serde_json::from_str(&content)
                    .map_err(|e| invalid(format!("{}: {e}", file.display())))?;
                for asset in &assets {
                    stores.db.save_asset(asset)?;
                }
                println!("Imported {} assets", assets.len());
            }
            Command::ImportPrices {
                asset,
                file,
                timeframe,
                ..
            } => {
                let timeframe: Timeframe = timeframe.parse().map_err(invalid)?;
                if stores.db.get_asset_by_id(&asset)?.is_none() {
                    return Err(TrackerError::not_found("asset", &asset));
                }
                let points = CsvAdapter::read_points(&file)?;
                let written = stores.db.insert_price_points(&asset, timeframe, &points)?;
                println!("Imported {written} {timeframe} price points for {asset}");
            }
            Command::Validate { .. } => {}
        }

        Ok(())
    }
}

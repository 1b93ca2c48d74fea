//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading and validation with real INI files on disk
//! - Import of assets and prices into a temporary SQLite database
//! - Analysis, simulation, backtest and comparison commands end to end
//! - Opportunity listing and closing

use chrono::{Duration, Utc};
use clap::Parser;
use invest_tracker::cli::{self, Cli};
use invest_tracker::domain::error::TrackerError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn parse(args: &[&str]) -> Cli {
    let mut full = vec!["invest-tracker"];
    full.extend_from_slice(args);
    Cli::try_parse_from(full).unwrap()
}

fn execute(args: &[&str]) -> Result<(), TrackerError> {
    cli::execute(parse(args).command)
}

fn same_code(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

mod config_loading {
    use super::*;

    #[test]
    fn validate_accepts_full_config() {
        let file = write_temp_ini(
            "[sqlite]\npath = /tmp/unused.db\npool_size = 2\n\
             [analysis]\nlookback_days = 120\nmin_points = 20\nworkers = 2\n\
             [backtest]\ninitial_investment = 2500\nstart_date = 2023-01-01\nend_date = 2023-12-31\n",
        );
        let path = file.path().to_str().unwrap();
        let code = cli::run(parse(&["validate", "-c", path]));
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let file = write_temp_ini("[analysis]\nworkers = 0\n");
        let err = execute(&["validate", "-c", file.path().to_str().unwrap()]).unwrap_err();
        assert!(matches!(&err, TrackerError::ConfigInvalid { key, .. } if key == "workers"));
        assert!(same_code((&err).into(), ExitCode::from(2)));
    }

    #[test]
    fn missing_config_file_fails() {
        let err = execute(&["validate", "-c", "/nonexistent/path/app.ini"]).unwrap_err();
        assert!(matches!(err, TrackerError::ConfigParse { .. }));
    }

    #[test]
    fn load_config_validates() {
        let file = write_temp_ini("[backtest]\nstart_date = 2024-05-01\nend_date = 2024-01-01\n");
        assert!(cli::load_config(file.path()).is_err());
    }
}

#[cfg(feature = "sqlite")]
mod end_to_end {
    use super::*;
    use invest_tracker::adapters::file_config_adapter::FileConfigAdapter;
    use invest_tracker::adapters::sqlite_adapter::SqliteAdapter;
    use invest_tracker::domain::opportunity::OpportunityStatus;
    use invest_tracker::ports::opportunity_port::{OpportunityFilter, OpportunityPort};
    use tempfile::TempDir;

    const ASSETS_JSON: &str = r#"[
        {
            "id": "stock-WEGE3", "symbol": "WEGE3", "name": "WEG",
            "current_price": 40.0, "previous_close": 40.0, "change_percentage": 0.0,
            "last_updated": "2024-01-02T00:00:00Z",
            "type": "stock", "price_to_earnings": 10.0, "dividend_yield": 5.0
        },
        {
            "id": "crypto-BTC", "symbol": "BTC", "name": "Bitcoin",
            "current_price": 30000.0, "previous_close": 30000.0, "change_percentage": 0.0,
            "last_updated": "2024-01-02T00:00:00Z",
            "type": "crypto", "market_cap": 1.0, "circulating_supply": 1.0
        }
    ]"#;

    struct Workspace {
        dir: TempDir,
        config: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db = dir.path().join("tracker.db");
            let config = dir.path().join("app.ini");
            fs::write(
                &config,
                format!(
                    "[sqlite]\npath = {}\npool_size = 2\n[analysis]\nworkers = 2\n",
                    db.display()
                ),
            )
            .unwrap();
            Workspace { dir, config }
        }

        fn config(&self) -> &str {
            self.config.to_str().unwrap()
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn run(&self, args: &[&str]) -> Result<(), TrackerError> {
            let mut full = args.to_vec();
            full.extend_from_slice(&["-c", self.config()]);
            execute(&full)
        }

        fn db(&self) -> SqliteAdapter {
            let config = FileConfigAdapter::from_file(&self.config).unwrap();
            SqliteAdapter::from_config(&config).unwrap()
        }
    }

    /// `count` daily rows ending yesterday, rising 1% a day.
    fn write_prices(path: &Path, count: usize) {
        let today = Utc::now().date_naive();
        let mut csv = String::from("timestamp,open,high,low,close,volume\n");
        for i in 0..count {
            let date = today - Duration::days((count - i) as i64);
            let close = 20.0 * 1.01f64.powi(i as i32);
            csv.push_str(&format!(
                "{},{close:.4},{close:.4},{close:.4},{close:.4},1000\n",
                date.format("%Y-%m-%d")
            ));
        }
        fs::write(path, csv).unwrap();
    }

    fn seeded() -> Workspace {
        let ws = Workspace::new();
        let assets = ws.path("assets.json");
        fs::write(&assets, ASSETS_JSON).unwrap();
        ws.run(&["import-assets", "--file", assets.to_str().unwrap()])
            .unwrap();

        let prices = ws.path("wege3.csv");
        write_prices(&prices, 80);
        ws.run(&[
            "import-prices",
            "--asset",
            "stock-WEGE3",
            "--file",
            prices.to_str().unwrap(),
        ])
        .unwrap();
        ws
    }

    #[test]
    fn prices_for_unknown_asset_are_refused() {
        let ws = seeded();
        let prices = ws.path("nope.csv");
        write_prices(&prices, 10);
        let err = ws
            .run(&["import-prices", "--asset", "stock-NOPE3", "--file", prices.to_str().unwrap()])
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }

    #[test]
    fn malformed_assets_file_is_invalid_input() {
        let ws = Workspace::new();
        let assets = ws.path("assets.json");
        fs::write(&assets, "{ not json").unwrap();
        let err = ws
            .run(&["import-assets", "--file", assets.to_str().unwrap()])
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput { .. }));
    }

    #[test]
    fn analyze_then_close_an_opportunity() {
        let ws = seeded();
        ws.run(&["analyze", "--asset", "stock-WEGE3"]).unwrap();

        let db = ws.db();
        let stored = db.list_opportunities(&OpportunityFilter::active()).unwrap();
        assert_eq!(stored.len(), 2);

        ws.run(&["close-opportunity", "--id", stored[0].id.as_str()]).unwrap();
        let closed = db.get_opportunity(&stored[0].id).unwrap().unwrap();
        assert_eq!(closed.status, OpportunityStatus::Closed);

        let again = ws.run(&["close-opportunity", "--id", stored[0].id.as_str()]).unwrap_err();
        assert!(matches!(again, TrackerError::InvalidTransition { .. }));

        ws.run(&["opportunities", "--active", "--asset", "stock-WEGE3"])
            .unwrap();
    }

    #[test]
    fn scan_skips_assets_without_prices() {
        let ws = seeded();
        ws.run(&["scan", "--asset-type", "crypto"]).unwrap();
        ws.run(&["scan", "--asset-type", "stock"]).unwrap();

        let err = ws.run(&["scan", "--asset-type", "reit"]).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
        let err = ws.run(&["scan", "--asset-type", "bond"]).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput { .. }));
    }

    #[test]
    fn simulate_reports_errors_by_kind() {
        let ws = seeded();
        ws.run(&[
            "simulate", "--strategy", "value", "--asset", "stock-WEGE3", "--amount", "1000",
        ])
        .unwrap();

        let unknown = ws
            .run(&[
                "simulate", "--strategy", "growth", "--asset", "stock-WEGE3", "--amount", "1000",
            ])
            .unwrap_err();
        assert!(matches!(unknown, TrackerError::UnknownStrategy(_)));
        assert!(same_code((&unknown).into(), ExitCode::from(4)));

        let no_prices = ws
            .run(&[
                "simulate", "--strategy", "momentum", "--asset", "crypto-BTC", "--amount", "1000",
            ])
            .unwrap_err();
        assert!(matches!(no_prices, TrackerError::InsufficientData { .. }));
    }

    #[test]
    fn backtest_writes_json_report() {
        let ws = seeded();
        let output = ws.path("reports").join("backtest.json");
        let start = (Utc::now() - Duration::days(120)).format("%Y-%m-%d").to_string();
        ws.run(&[
            "backtest",
            "--strategy",
            "momentum",
            "--asset",
            "stock-WEGE3",
            "--amount",
            "1000",
            "--start",
            start.as_str(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(doc["symbol"], "WEGE3");
        assert_eq!(doc["strategy"], "momentum");
        assert!(doc["trades"].as_array().is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn compare_writes_both_strategies() {
        let ws = seeded();
        let output = ws.path("compare.json");
        let start = (Utc::now() - Duration::days(120)).format("%Y-%m-%d").to_string();
        ws.run(&[
            "compare",
            "--strategies",
            "momentum,value",
            "--asset",
            "stock-WEGE3",
            "--start",
            start.as_str(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(doc["results"]["momentum"].is_object());
        assert!(doc["results"]["value"].is_object());
        assert_eq!(doc["results"]["value"]["initial_investment"], 1000.0);
    }

    #[test]
    fn compare_on_unsuitable_only_fails() {
        let ws = seeded();
        let err = ws
            .run(&["compare", "--strategies", "value", "--asset", "crypto-BTC"])
            .unwrap_err();
        assert!(matches!(err, TrackerError::AllStrategiesFailed { .. }));
        assert!(same_code((&err).into(), ExitCode::from(5)));
    }
}

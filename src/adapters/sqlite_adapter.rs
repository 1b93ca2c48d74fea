//! SQLite persistence adapter for assets, price history and opportunities.
//!
//! Assets and opportunities are stored as JSON bodies next to the columns the
//! queries filter on. Timestamps are RFC 3339 text in UTC, which sorts
//! chronologically.

use crate::domain::asset::{Asset, AssetType};
use crate::domain::error::TrackerError;
use crate::domain::opportunity::InvestmentOpportunity;
use crate::domain::price::{PriceHistory, PricePoint, Timeframe};
use crate::ports::asset_port::AssetPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::opportunity_port::{OpportunityFilter, OpportunityPort};
use crate::ports::price_history_port::PriceHistoryPort;
use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS assets (
        id TEXT PRIMARY KEY,
        asset_type TEXT NOT NULL,
        symbol TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_assets_type ON assets(asset_type);
    CREATE TABLE IF NOT EXISTS price_points (
        asset_id TEXT NOT NULL,
        timeframe TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        open REAL NOT NULL,
        high REAL NOT NULL,
        low REAL NOT NULL,
        close REAL NOT NULL,
        volume REAL NOT NULL,
        PRIMARY KEY (asset_id, timeframe, timestamp)
    );
    CREATE TABLE IF NOT EXISTS opportunities (
        id TEXT PRIMARY KEY,
        asset_id TEXT NOT NULL,
        strategy TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_opportunities_asset ON opportunities(asset_id);";

type Connection = PooledConnection<SqliteConnectionManager>;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> TrackerError {
    TrackerError::persistence(e)
}

fn json_err(e: serde_json::Error) -> TrackerError {
    TrackerError::persistence(format!("corrupt record: {e}"))
}

fn to_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn from_text(raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                raw.len(),
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrackerError> {
        let db_path = config.require_string("sqlite", "path")?;
        let pool_size = config.get_int("sqlite", "pool_size", 4).clamp(1, 64) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| TrackerError::persistence(e))?;

        log::debug!("opened sqlite database {db_path} (pool size {pool_size})");
        Ok(Self { pool })
    }

    /// Single-connection pool; every connection to `:memory:` is its own database.
    pub fn in_memory() -> Result<Self, TrackerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TrackerError::persistence(e))?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<Connection, TrackerError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| TrackerError::persistence(e))
    }

    pub fn initialize_schema(&self) -> Result<(), TrackerError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_err)
    }

    /// Upserts points keyed by (asset, timeframe, timestamp). Returns the row count written.
    pub fn insert_price_points(
        &self,
        asset_id: &str,
        timeframe: Timeframe,
        points: &[PricePoint],
    ) -> Result<usize, TrackerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for p in points {
            tx.execute(
                "INSERT OR REPLACE INTO price_points
                    (asset_id, timeframe, timestamp, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    asset_id,
                    timeframe.as_str(),
                    to_text(p.timestamp),
                    p.open,
                    p.high,
                    p.low,
                    p.close,
                    p.volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(points.len())
    }

    fn read_asset_rows(
        conn: &Connection,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Asset>, TrackerError> {
        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let bodies = stmt
            .query_map(args, |row| row.get::<_, String>(0))
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(json_err))
            .collect()
    }
}

impl AssetPort for SqliteAdapter {
    fn get_asset_by_id(&self, id: &str) -> Result<Option<Asset>, TrackerError> {
        let conn = self.conn()?;
        let assets = Self::read_asset_rows(&conn, "SELECT body FROM assets WHERE id = ?1", &[&id])?;
        Ok(assets.into_iter().next())
    }

    fn get_assets_by_type(&self, asset_type: AssetType) -> Result<Vec<Asset>, TrackerError> {
        let conn = self.conn()?;
        Self::read_asset_rows(
            &conn,
            "SELECT body FROM assets WHERE asset_type = ?1 ORDER BY symbol",
            &[&asset_type.as_str()],
        )
    }

    fn save_asset(&self, asset: &Asset) -> Result<(), TrackerError> {
        let body = serde_json::to_string(asset).map_err(json_err)?;
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO assets (id, asset_type, symbol, body) VALUES (?1, ?2, ?3, ?4)",
                params![asset.id, asset.asset_type().as_str(), asset.symbol, body],
            )
            .map_err(query_err)?;
        Ok(())
    }
}

impl PriceHistoryPort for SqliteAdapter {
    fn get_price_history(
        &self,
        asset_id: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<PriceHistory, TrackerError> {
        let conn = self.conn()?;

        let symbol: Option<String> = conn
            .query_row(
                "SELECT symbol FROM assets WHERE id = ?1",
                params![asset_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT timestamp, open, high, low, close, volume
                 FROM price_points
                 WHERE asset_id = ?1 AND timeframe = ?2
                   AND (?3 IS NULL OR timestamp >= ?3)
                   AND (?4 IS NULL OR timestamp <= ?4)
                 ORDER BY timestamp ASC",
            )
            .map_err(query_err)?;

        let points = stmt
            .query_map(
                params![
                    asset_id,
                    timeframe.as_str(),
                    start.map(to_text),
                    end.map(to_text)
                ],
                |row| {
                    let ts: String = row.get(0)?;
                    Ok(PricePoint {
                        timestamp: from_text(&ts)?,
                        open: row.get(1)?,
                        high: row.get(2)?,
                        low: row.get(3)?,
                        close: row.get(4)?,
                        volume: row.get(5)?,
                    })
                },
            )
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        Ok(PriceHistory::new(
            asset_id,
            symbol.unwrap_or_else(|| asset_id.to_string()),
            timeframe,
            points,
        ))
    }
}

impl OpportunityPort for SqliteAdapter {
    fn save_opportunity(&self, opp: &InvestmentOpportunity) -> Result<(), TrackerError> {
        let body = serde_json::to_string(opp).map_err(json_err)?;
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO opportunities (id, asset_id, strategy, status, created_at, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    opp.id,
                    opp.asset_id,
                    opp.strategy.as_str(),
                    opp.status.as_str(),
                    to_text(opp.created_at),
                    body
                ],
            )
            .map_err(query_err)?;
        Ok(())
    }

    fn update_opportunity(&self, opp: &InvestmentOpportunity) -> Result<(), TrackerError> {
        let body = serde_json::to_string(opp).map_err(json_err)?;
        let changed = self
            .conn()?
            .execute(
                "UPDATE opportunities SET status = ?2, body = ?3 WHERE id = ?1",
                params![opp.id, opp.status.as_str(), body],
            )
            .map_err(query_err)?;

        if changed == 0 {
            return Err(TrackerError::not_found("opportunity", &opp.id));
        }
        Ok(())
    }

    fn get_opportunity(&self, id: &str) -> Result<Option<InvestmentOpportunity>, TrackerError> {
        let body: Option<String> = self
            .conn()?
            .query_row(
                "SELECT body FROM opportunities WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;

        body.map(|b| serde_json::from_str(&b).map_err(json_err))
            .transpose()
    }

    fn list_opportunities(
        &self,
        filter: &OpportunityFilter,
    ) -> Result<Vec<InvestmentOpportunity>, TrackerError> {
        let mut sql = String::from("SELECT body FROM opportunities WHERE 1 = 1");
        let mut args: Vec<Value> = Vec::new();

        if filter.active_only {
            args.push(Value::Text("active".to_string()));
            sql.push_str(&format!(" AND status = ?{}", args.len()));
        }
        if let Some(asset_id) = &filter.asset_id {
            args.push(Value::Text(asset_id.clone()));
            sql.push_str(&format!(" AND asset_id = ?{}", args.len()));
        }
        if let Some(strategy) = filter.strategy {
            args.push(Value::Text(strategy.as_str().to_string()));
            sql.push_str(&format!(" AND strategy = ?{}", args.len()));
        }
        sql.push_str(" ORDER BY created_at DESC, id");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(query_err)?;
        let bodies = stmt
            .query_map(params_from_iter(args), |row| row.get::<_, String>(0))
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(json_err))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::asset::{AssetKind, CryptoFundamentals, ReitFundamentals, StockFundamentals};
    use crate::domain::opportunity::{OpportunityStatus, RiskLevel, SignalType};
    use crate::domain::strategy::StrategyType;
    use chrono::{Duration, TimeZone};

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn stock(symbol: &str) -> Asset {
        Asset::new(
            symbol,
            "Stock",
            10.0,
            AssetKind::Stock(StockFundamentals {
                price_to_earnings: 9.5,
                ..Default::default()
            }),
        )
    }

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    fn opportunity(asset: &Asset, strategy: StrategyType) -> InvestmentOpportunity {
        InvestmentOpportunity::new(
            asset,
            SignalType::Buy,
            "test".into(),
            10.0,
            RiskLevel::Medium,
            strategy,
        )
    }

    #[test]
    fn from_config_missing_path() {
        let config = FileConfigAdapter::empty();
        match SqliteAdapter::from_config(&config) {
            Err(TrackerError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn from_config_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("tracker.db");
        let config =
            FileConfigAdapter::from_string(&format!("[sqlite]\npath = {}\npool_size = 2\n", db.display()))
                .unwrap();
        let adapter = SqliteAdapter::from_config(&config).unwrap();
        adapter.initialize_schema().unwrap();
        adapter.save_asset(&stock("ABEV3")).unwrap();
        assert!(db.exists());
    }

    #[test]
    fn schema_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn assets_round_trip_by_id_and_type() {
        let adapter = adapter();
        let reit = Asset::new("HGLG11", "CSHG", 160.0, AssetKind::Reit(ReitFundamentals::default()));
        let btc = Asset::new("BTC", "Bitcoin", 1.0, AssetKind::Crypto(CryptoFundamentals::default()));
        for a in [stock("WEGE3"), stock("ABEV3"), reit.clone(), btc] {
            adapter.save_asset(&a).unwrap();
        }

        let fetched = adapter.get_asset_by_id("stock-WEGE3").unwrap().unwrap();
        assert_eq!(fetched.symbol, "WEGE3");
        assert!(adapter.get_asset_by_id("stock-NOPE").unwrap().is_none());

        let stocks = adapter.get_assets_by_type(AssetType::Stock).unwrap();
        let symbols: Vec<_> = stocks.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ABEV3", "WEGE3"]);

        assert_eq!(adapter.get_assets_by_type(AssetType::Reit).unwrap(), vec![reit]);
    }

    #[test]
    fn save_asset_replaces() {
        let adapter = adapter();
        let mut asset = stock("WEGE3");
        adapter.save_asset(&asset).unwrap();
        asset.favorite = true;
        adapter.save_asset(&asset).unwrap();
        assert!(adapter.get_asset_by_id(&asset.id).unwrap().unwrap().favorite);
        assert_eq!(adapter.get_assets_by_type(AssetType::Stock).unwrap().len(), 1);
    }

    #[test]
    fn price_history_window_and_order() {
        let adapter = adapter();
        adapter.save_asset(&stock("WEGE3")).unwrap();
        let written = adapter
            .insert_price_points(
                "stock-WEGE3",
                Timeframe::Daily,
                &[point(3, 12.0), point(1, 10.0), point(2, 11.0)],
            )
            .unwrap();
        assert_eq!(written, 3);

        let all = adapter
            .get_price_history("stock-WEGE3", Timeframe::Daily, None, None)
            .unwrap();
        assert_eq!(all.symbol, "WEGE3");
        let closes: Vec<f64> = all.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![10.0, 11.0, 12.0]);

        let window = adapter
            .get_price_history(
                "stock-WEGE3",
                Timeframe::Daily,
                Some(point(2, 0.0).timestamp),
                Some(point(3, 0.0).timestamp),
            )
            .unwrap();
        assert_eq!(window.len(), 2);

        let weekly = adapter
            .get_price_history("stock-WEGE3", Timeframe::Weekly, None, None)
            .unwrap();
        assert!(weekly.is_empty());
    }

    #[test]
    fn price_points_upsert() {
        let adapter = adapter();
        adapter
            .insert_price_points("stock-WEGE3", Timeframe::Daily, &[point(1, 10.0)])
            .unwrap();
        adapter
            .insert_price_points("stock-WEGE3", Timeframe::Daily, &[point(1, 15.0)])
            .unwrap();
        let history = adapter
            .get_price_history("stock-WEGE3", Timeframe::Daily, None, None)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.points().last().map(|p| p.close), Some(15.0));
        // No asset row: the id doubles as the symbol.
        assert_eq!(history.symbol, "stock-WEGE3");
    }

    #[test]
    fn opportunities_save_get_update() {
        let adapter = adapter();
        let asset = stock("WEGE3");
        let mut opp = opportunity(&asset, StrategyType::Momentum);
        adapter.save_opportunity(&opp).unwrap();

        assert_eq!(adapter.get_opportunity(&opp.id).unwrap().unwrap(), opp);
        assert!(adapter.get_opportunity("opp-missing").unwrap().is_none());

        opp.close(opp.created_at).unwrap();
        adapter.update_opportunity(&opp).unwrap();
        let stored = adapter.get_opportunity(&opp.id).unwrap().unwrap();
        assert_eq!(stored.status, OpportunityStatus::Closed);
    }

    #[test]
    fn update_unknown_opportunity_is_not_found() {
        let adapter = adapter();
        let opp = opportunity(&stock("WEGE3"), StrategyType::Value);
        let err = adapter.update_opportunity(&opp).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }

    #[test]
    fn list_opportunities_filters() {
        let adapter = adapter();
        let wege = stock("WEGE3");
        let abev = stock("ABEV3");

        let mut first = opportunity(&wege, StrategyType::Momentum);
        first.created_at -= Duration::hours(1);
        let second = opportunity(&wege, StrategyType::Value);
        let mut third = opportunity(&abev, StrategyType::Momentum);
        third.close(third.created_at).unwrap();
        for o in [&first, &second, &third] {
            adapter.save_opportunity(o).unwrap();
        }

        let all = adapter.list_opportunities(&OpportunityFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let active = adapter.list_opportunities(&OpportunityFilter::active()).unwrap();
        assert_eq!(active.len(), 2);
        // Newest first.
        assert_eq!(active[0].id, second.id);

        let filter = OpportunityFilter {
            active_only: false,
            asset_id: Some("stock-WEGE3".into()),
            strategy: Some(StrategyType::Momentum),
        };
        let only = adapter.list_opportunities(&filter).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, first.id);
    }
}

use crate::analyzer::PriceAlert;
use crate::model::{PriceObservation, PriceStats, StorageError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

/// A stored system event, e.g. a recommendation produced for a product.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub id: i64,
    pub kind: String,
    pub product: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredAlert {
    pub product: String,
    pub classification: String,
    pub current_price: f64,
    pub potential_savings: f64,
    pub created_at: DateTime<Utc>,
}

pub struct SqliteStorage {
    conn: Connection,
}

/// Fixed-width UTC timestamps so that text order is time order.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn column_datetime(row: &Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl SqliteStorage {
    /// Opens the database (`":memory:"` for a throwaway one) and creates the schema.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product TEXT NOT NULL,
                store TEXT NOT NULL,
                price REAL NOT NULL,
                recorded_at TEXT NOT NULL,
                UNIQUE (product, store, recorded_at)
            );

            CREATE INDEX IF NOT EXISTS idx_history_product
                ON price_history (product, recorded_at);

            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product TEXT NOT NULL,
                classification TEXT NOT NULL,
                current_price REAL NOT NULL,
                avg_price REAL NOT NULL,
                min_price REAL NOT NULL,
                potential_savings REAL NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                product TEXT NOT NULL,
                payload TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self { conn })
    }

    /// Stores one reading; a repeated (product, store, time) reading replaces the old price.
    pub fn record_price(&self, obs: &PriceObservation) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO price_history (product, store, price, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![&obs.product, &obs.store, &obs.price, timestamp(&obs.recorded_at)],
        )?;
        Ok(())
    }

    /// History of a product, oldest first, optionally narrowed to one store
    /// and to readings at or after `since`.
    pub fn price_history(
        &self,
        product: &str,
        store: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PriceObservation>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT product, store, price, recorded_at FROM price_history
             WHERE product = ?1
               AND (?2 IS NULL OR store = ?2)
               AND (?3 IS NULL OR recorded_at >= ?3)
             ORDER BY recorded_at ASC",
        )?;

        let rows = stmt.query_map(params![product, store, since.as_ref().map(timestamp)], |row| {
            Ok(PriceObservation {
                product: row.get(0)?,
                store: row.get(1)?,
                price: row.get(2)?,
                recorded_at: column_datetime(row, 3)?,
            })
        })?;

        let mut history = Vec::new();
        for obs in rows {
            history.push(obs?);
        }
        Ok(history)
    }

    pub fn price_stats(&self, product: &str) -> Result<Option<PriceStats>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT MIN(price), MAX(price), AVG(price), COUNT(*)
             FROM price_history WHERE product = ?1",
        )?;

        let mut rows = stmt.query(params![product])?;
        if let Some(row) = rows.next()? {
            let count: i64 = row.get(3)?;
            if count == 0 {
                return Ok(None);
            }
            Ok(Some(PriceStats {
                min: row.get(0)?,
                max: row.get(1)?,
                avg: row.get(2)?,
                count: count as usize,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn tracked_products(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT product FROM price_history ORDER BY product ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn save_alert(&self, product: &str, alert: &PriceAlert) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO alerts (
                product, classification, current_price, avg_price, min_price,
                potential_savings, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                product,
                alert.classification.as_str(),
                &alert.current_price,
                &alert.avg_price,
                &alert.min_price,
                &alert.potential_savings,
                timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Latest alerts of a product, newest first.
    pub fn recent_alerts(&self, product: &str, limit: usize) -> Result<Vec<StoredAlert>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT product, classification, current_price, potential_savings, created_at
             FROM alerts WHERE product = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![product, limit as i64], |row| {
            Ok(StoredAlert {
                product: row.get(0)?,
                classification: row.get(1)?,
                current_price: row.get(2)?,
                potential_savings: row.get(3)?,
                created_at: column_datetime(row, 4)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Records an event with a JSON payload; returns its id.
    pub fn record_event<T: Serialize>(
        &self,
        kind: &str,
        product: &str,
        payload: &T,
    ) -> Result<i64, StorageError> {
        let payload = serde_json::to_string(payload)?;
        self.conn.execute(
            "INSERT INTO events (kind, product, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![kind, product, payload, timestamp(&Utc::now())],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn unprocessed_events(&self) -> Result<Vec<StoredEvent>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, product, payload, created_at
             FROM events WHERE processed = 0 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(StoredEvent {
                id: row.get(0)?,
                kind: row.get(1)?,
                product: row.get(2)?,
                payload: row.get(3)?,
                created_at: column_datetime(row, 4)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn mark_event_processed(&self, id: i64) -> Result<(), StorageError> {
        self.conn
            .execute("UPDATE events SET processed = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }
}

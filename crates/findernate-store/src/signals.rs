//! Append-only signal log shared by client processes on the same machine.
//!
//! A publisher appends a row; every other process polls for rows with a
//! sequence number above the last one it has seen.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::Signal;

impl Database {
    /// Append a signal and return its sequence number.
    pub fn push_signal(&self, origin: &str, name: &str, payload: &str) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO signals (origin, name, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![origin, name, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Signals with a sequence number strictly greater than `after`, oldest first.
    pub fn signals_since(&self, after: i64) -> Result<Vec<Signal>> {
        let mut stmt = self.conn().prepare(
            "SELECT seq, origin, name, payload, created_at
             FROM signals
             WHERE seq > ?1
             ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![after], row_to_signal)?;

        let mut signals = Vec::new();
        for row in rows {
            signals.push(row?);
        }
        Ok(signals)
    }

    /// Highest sequence number written so far (0 when the log is empty).
    pub fn latest_signal_seq(&self) -> Result<i64> {
        let seq: Option<i64> =
            self.conn()
                .query_row("SELECT MAX(seq) FROM signals", [], |row| row.get(0))?;
        Ok(seq.unwrap_or(0))
    }

    /// Keep only the newest `keep` signals. Returns how many rows were deleted.
    pub fn prune_signals(&self, keep: i64) -> Result<usize> {
        let deleted = self.conn().execute(
            "DELETE FROM signals
             WHERE seq <= (SELECT COALESCE(MAX(seq), 0) FROM signals) - ?1",
            params![keep],
        )?;
        Ok(deleted)
    }
}

fn row_to_signal(row: &rusqlite::Row<'_>) -> rusqlite::Result<Signal> {
    let ts_str: String = row.get(4)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Signal {
        seq: row.get(0)?,
        origin: row.get(1)?,
        name: row.get(2)?,
        payload: row.get(3)?,
        created_at,
    })
}

//! v002 -- Cross-process signal log.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS signals (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    origin     TEXT NOT NULL,                 -- id of the publishing process
    name       TEXT NOT NULL,                 -- event name, e.g. refresh-message-counts
    payload    TEXT NOT NULL,                 -- JSON
    created_at TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

use crate::model::{SentimentSnapshot, StorageError};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Открывает соединение к БД и создаёт таблицу истории снимков
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                technology TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                score REAL NOT NULL,
                data_points INTEGER NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_snapshots_technology
                ON snapshots (technology, recorded_at);
            "
        )?;

        Ok(Self { conn })
    }

    /// Сохраняет снимок целиком (JSON) вместе с ключевыми полями для выборок
    pub fn record_snapshot(&self, snapshot: &SentimentSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT INTO snapshots (technology, recorded_at, score, data_points, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &snapshot.technology,
                &snapshot.last_updated.to_rfc3339_opts(SecondsFormat::Micros, true),
                &snapshot.current_sentiment.score,
                &(snapshot.data_points as i64),
                &payload,
            ],
        )?;
        Ok(())
    }

    /// Последний снимок по каждой технологии (для прогрева кэша при старте)
    pub fn latest_snapshots(&self) -> Result<Vec<SentimentSnapshot>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM snapshots s
             WHERE id = (SELECT id FROM snapshots WHERE technology = s.technology
                         ORDER BY recorded_at DESC, id DESC LIMIT 1)
             ORDER BY technology ASC",
        )?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut snapshots = Vec::new();
        for payload in rows {
            snapshots.push(serde_json::from_str(&payload?)?);
        }

        Ok(snapshots)
    }

    /// Общее количество сохранённых снимков
    pub fn count_snapshots(&self) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

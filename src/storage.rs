use crate::card::Card;
use crate::error::Result;
use crate::stats::Stats;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

const CARDS_KEY: &str = "flashcards";
const STATS_KEY: &str = "stats";

/// Everything a store holds; `None` means the key was never written
#[derive(Debug, Default)]
pub struct Snapshot {
    pub cards: Option<Vec<Card>>,
    pub stats: Option<Stats>,
}

/// Full-snapshot persistence for cards and stats
pub trait Store {
    fn load(&self) -> Result<Snapshot>;
    fn save_cards(&mut self, cards: &[Card]) -> Result<()>;
    fn save_stats(&mut self, stats: &Stats) -> Result<()>;
}

/// Key-value store in a SQLite database, one JSON document per key
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        let store = SqliteStore { conn };
        store.init_schema()?;

        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let store = SqliteStore {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO snapshots (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, now],
        )?;

        Ok(())
    }
}

impl Store for SqliteStore {
    fn load(&self) -> Result<Snapshot> {
        let cards = match self.get(CARDS_KEY)? {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };
        let stats = match self.get(STATS_KEY)? {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        Ok(Snapshot { cards, stats })
    }

    fn save_cards(&mut self, cards: &[Card]) -> Result<()> {
        self.put(CARDS_KEY, &serde_json::to_string(cards)?)
    }

    fn save_stats(&mut self, stats: &Stats) -> Result<()> {
        self.put(STATS_KEY, &serde_json::to_string(stats)?)
    }
}

/// In-memory store for tests, with switchable write failures
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub cards: Option<String>,
    pub stats: Option<String>,
    pub fail_writes: bool,
    pub writes: usize,
}

#[cfg(test)]
impl MemoryStore {
    fn check_writable(&mut self) -> Result<()> {
        if self.fail_writes {
            return Err(std::io::Error::other("storage quota exceeded").into());
        }
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
impl Store for MemoryStore {
    fn load(&self) -> Result<Snapshot> {
        let cards = match &self.cards {
            Some(json) => Some(serde_json::from_str(json)?),
            None => None,
        };
        let stats = match &self.stats {
            Some(json) => Some(serde_json::from_str(json)?),
            None => None,
        };
        Ok(Snapshot { cards, stats })
    }

    fn save_cards(&mut self, cards: &[Card]) -> Result<()> {
        self.check_writable()?;
        self.cards = Some(serde_json::to_string(cards)?);
        Ok(())
    }

    fn save_stats(&mut self, stats: &Stats) -> Result<()> {
        self.check_writable()?;
        self.stats = Some(serde_json::to_string(stats)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Schedule, ScheduleState, sample_cards};
    use crate::scheduler::{Rating, compute_next_schedule};
    use chrono::DateTime;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        "2026-10-17T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let snapshot = store.load().unwrap();
        assert!(snapshot.cards.is_none());
        assert!(snapshot.stats.is_none());
    }

    #[test]
    fn test_round_trip_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kelma.db");

        let mut cards = sample_cards(now());
        cards[0] = compute_next_schedule(Rating::Good, &cards[0], now());
        let mut stats = Stats::default();
        stats.record_review(Rating::Good, &now());

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save_cards(&cards).unwrap();
            store.save_stats(&stats).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.cards.unwrap(), cards);
        assert_eq!(snapshot.stats.unwrap(), stats);
    }

    #[test]
    fn test_reload_keeps_exact_ease_factor() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut cards = sample_cards(now());
        cards[0].schedule = Schedule::Scheduled(ScheduleState {
            repetitions: 6,
            ease_factor: 1.3800000000000001,
            interval: 42,
            next_review: now(),
            last_reviewed: now(),
        });

        store.save_cards(&cards).unwrap();
        let reloaded = store.load().unwrap().cards.unwrap();
        let state = reloaded[0].schedule.state().unwrap();
        assert_eq!(state.ease_factor.to_bits(), 1.3800000000000001_f64.to_bits());
        assert_eq!(reloaded, cards);
    }

    #[test]
    fn test_save_overwrites_snapshot() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let cards = sample_cards(now());

        store.save_cards(&cards).unwrap();
        store.save_cards(&cards[..2]).unwrap();

        assert_eq!(store.load().unwrap().cards.unwrap().len(), 2);
    }

    #[test]
    fn test_memory_store_failure() {
        let mut store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        assert!(store.save_stats(&Stats::default()).is_err());
        assert!(store.stats.is_none());
        assert_eq!(store.writes, 0);
    }
}

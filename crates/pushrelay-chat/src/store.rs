//! SQLite chat-turn store.

use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

use pushrelay_core::error::{PushRelayError, Result};

/// One persisted chat turn.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    pub id: i64,
    pub conversation_id: String,
    pub sender: String,
    pub content: String,
    pub created_at: String,
}

/// Chat-turn persistence behind a mutex-guarded connection.
pub struct ChatStore {
    conn: Mutex<Connection>,
}

impl ChatStore {
    /// Open or create the chat database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| PushRelayError::Storage(format!("Chat DB open error: {e}")))?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PushRelayError::Storage(format!("Chat DB open error: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                sender TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages (conversation_id, id);
        ",
        )
        .map_err(|e| PushRelayError::Storage(format!("Migration error: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PushRelayError::Storage(format!("Lock: {e}")))
    }

    /// Append a turn to a conversation, returning its row id.
    pub fn append(&self, conversation_id: &str, sender: &str, content: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (conversation_id, sender, content) VALUES (?1, ?2, ?3)",
            params![conversation_id, sender, content],
        )
        .map_err(|e| PushRelayError::Storage(format!("Insert error: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    /// All turns of a conversation, oldest first.
    pub fn history(&self, conversation_id: &str) -> Result<Vec<ChatTurn>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, conversation_id, sender, content, created_at
                 FROM messages WHERE conversation_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e| PushRelayError::Storage(format!("Query error: {e}")))?;
        let rows = stmt
            .query_map(params![conversation_id], |row| {
                Ok(ChatTurn {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    sender: row.get(2)?,
                    content: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .map_err(|e| PushRelayError::Storage(format!("Query error: {e}")))?;

        let mut turns = Vec::new();
        for row in rows {
            turns.push(row.map_err(|e| PushRelayError::Storage(format!("Row error: {e}")))?);
        }
        Ok(turns)
    }
}

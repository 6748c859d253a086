// ABOUTME: Durable conversation and message storage over a SQLite key-value table.
// ABOUTME: JSON-encoded records keyed by conversation id; corrupt records degrade to empty.
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key holding the JSON-encoded conversation list (most recent first).
const KEY_CONVERSATIONS: &str = "conversations";
/// Key holding the generated per-device user identifier.
const KEY_USER_ID: &str = "user_id";
/// Key holding the persisted theme preference flag.
const KEY_THEME: &str = "theme";

fn messages_key(conversation_id: &str) -> String {
    format!("messages:{}", conversation_id)
}

/// A named, ordered thread of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: String,
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    System,
}

/// A single chat message. Never mutated after creation; ordering is
/// append-only by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
}

impl Message {
    pub fn new(conversation_id: &str, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: format!("msg_{}", uuid::Uuid::new_v4()),
            conversation_id: conversation_id.to_string(),
            sender,
            text: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Client-device-scoped store for conversations, their message histories,
/// and small persisted flags (device user id, theme preference).
///
/// In-memory state is authoritative for display; every mutation re-serializes
/// the affected slice to the key-value table synchronously, best-effort.
/// A storage write failure is logged and swallowed, never surfaced.
pub struct ConversationStore {
    db: Arc<Mutex<Connection>>,
    db_path: PathBuf,
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
}

impl ConversationStore {
    /// Open (or create) the store under the given directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).context("Failed to create storage directory")?;

        let db_path = dir.join("banter.db");
        let conn = Connection::open(&db_path).context("Failed to open SQLite database")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        let mut store = ConversationStore {
            db: Arc::new(Mutex::new(conn)),
            db_path: db_path.clone(),
            conversations: Vec::new(),
            messages: HashMap::new(),
        };

        store.conversations = store.load_json(KEY_CONVERSATIONS);

        tracing::info!(
            db = %db_path.display(),
            conversations = store.conversations.len(),
            "ConversationStore opened"
        );

        Ok(store)
    }

    /// Path of the backing database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create a conversation and prepend it to the list.
    pub fn create_conversation(&mut self, title: &str) -> Result<Conversation> {
        let title = title.trim();
        if title.is_empty() {
            anyhow::bail!("Conversation title must not be empty");
        }

        let conversation = Conversation {
            id: format!("conv_{}", uuid::Uuid::new_v4()),
            title: title.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        self.conversations.insert(0, conversation.clone());
        self.persist_conversations();

        tracing::info!(
            conversation_id = %conversation.id,
            title = %conversation.title,
            "Conversation created"
        );

        Ok(conversation)
    }

    /// All conversations, most recent first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Load a conversation's message history into memory and return it.
    ///
    /// Missing or unparseable persisted data yields an empty sequence,
    /// never an error.
    pub fn select_conversation(&mut self, conversation_id: &str) -> Vec<Message> {
        if !self.messages.contains_key(conversation_id) {
            let loaded: Vec<Message> = self.load_json(&messages_key(conversation_id));
            self.messages.insert(conversation_id.to_string(), loaded);
        }
        self.messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Messages currently loaded for a conversation (empty if never selected).
    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.messages
            .get(conversation_id)
            .map(|m| m.as_slice())
            .unwrap_or(&[])
    }

    /// Append a message and re-persist the conversation's sequence.
    pub fn append_message(&mut self, message: Message) {
        let conversation_id = message.conversation_id.clone();
        self.messages
            .entry(conversation_id.clone())
            .or_default()
            .push(message);
        self.persist_messages(&conversation_id);
    }

    /// The per-device user identifier, generated once and reused across
    /// activations.
    pub fn device_user_id(&self) -> String {
        if let Some(existing) = self.get(KEY_USER_ID) {
            return existing;
        }
        let user_id = format!("user_{}", uuid::Uuid::new_v4());
        self.put(KEY_USER_ID, &user_id);
        tracing::info!(user_id = %user_id, "Generated device user id");
        user_id
    }

    /// Persisted theme preference flag, defaulting to dark.
    pub fn theme(&self) -> String {
        self.get(KEY_THEME).unwrap_or_else(|| "dark".to_string())
    }

    pub fn set_theme(&self, theme: &str) {
        self.put(KEY_THEME, theme);
    }

    // =========================================================================
    // Persistence helpers (best-effort, never surfaced)
    // =========================================================================

    fn persist_conversations(&self) {
        self.put_json(KEY_CONVERSATIONS, &self.conversations);
    }

    fn persist_messages(&self, conversation_id: &str) {
        if let Some(messages) = self.messages.get(conversation_id) {
            self.put_json(&messages_key(conversation_id), messages);
        }
    }

    fn load_json<T: serde::de::DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.get(key) else {
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt persisted record, treating as empty");
                T::default()
            }
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(encoded) => self.put(key, &encoded),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode record");
            }
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let db = match self.db.lock() {
            Ok(db) => db,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Database mutex poisoned");
                return None;
            }
        };
        let mut stmt = match db.prepare("SELECT value FROM kv WHERE key = ?1") {
            Ok(stmt) => stmt,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to prepare read");
                return None;
            }
        };
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read record");
                None
            }
        }
    }

    fn put(&self, key: &str, value: &str) {
        let db = match self.db.lock() {
            Ok(db) => db,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Database mutex poisoned");
                return;
            }
        };
        if let Err(e) = db.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        ) {
            tracing::warn!(key = %key, error = %e, "Failed to persist record");
        }
    }
}

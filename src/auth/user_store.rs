//! User storage backed by SQLite.

use crate::auth::models::{User, UserUpdate};
use anyhow::{Context, Result};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

type UserRow = (String, String, String, String);

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Create a new user. The plaintext password is hashed before insert and
    /// never persisted.
    pub fn create_user(&self, username: &str, password: &str) -> Result<User> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        info!("Created user: {}", user.username);

        Ok(user)
    }

    /// Get user by username (exact match)
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let row: Option<UserRow> = conn
            .query_row(
                "SELECT id, username, password_hash, created_at
                 FROM users WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        row.map(Self::row_to_user).transpose()
    }

    /// Get user by id
    pub fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let row: Option<UserRow> = conn
            .query_row(
                "SELECT id, username, password_hash, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        row.map(Self::row_to_user).transpose()
    }

    fn row_to_user((id, username, password_hash, created_at): UserRow) -> Result<User> {
        Ok(User {
            id: Uuid::parse_str(&id).context("Malformed user id in store")?,
            username,
            password_hash,
            created_at,
        })
    }

    /// Apply a partial update to a stored user.
    ///
    /// The password hash is recomputed only when the update carries a new
    /// plaintext password. A username-only update leaves the stored hash
    /// untouched; re-hashing an already-hashed value would corrupt it.
    pub fn update_user(&self, id: &Uuid, update: UserUpdate) -> Result<User> {
        let mut user = self.get_user_by_id(id)?.context("User not found")?;

        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(password) = update.password {
            user.password_hash = hash(&password, DEFAULT_COST).context("Failed to hash password")?;
        }

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE users SET username = ?1, password_hash = ?2 WHERE id = ?3",
            params![user.username, user.password_hash, user.id.to_string()],
        )
        .context("Failed to update user")?;

        Ok(user)
    }

    /// Wipe the users table and seed the demo accounts. Used by tests and by
    /// startup when AUTH_SEED is set.
    pub fn reset_and_seed(&self) -> Result<Vec<User>> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute("DELETE FROM users", [])?;
        drop(conn);

        let credentials = [("lucy", "lucy_pw"), ("larry", "larry_pw"), ("moe", "moe_pw")];
        credentials
            .iter()
            .map(|(username, password)| self.create_user(username, password))
            .collect()
    }
}

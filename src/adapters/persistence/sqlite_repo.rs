//! SQLite-backed repository via libsql. Implements ProfileRepoPort.
//!
//! Two tables: `users` (identity) and `profiles` (one row per user, `ON DELETE CASCADE`).
//! Every write touching both tables runs in one explicit transaction that is rolled back
//! on any error, so an account is never left behind without its profile.
//! CHECK constraints mirror the domain validation as a last line at the storage level.

use crate::domain::validation::USERNAME_TAKEN_MESSAGE;
use crate::domain::{
    AccountType, DomainError, ImageRef, MeetingMethod, Profile, ProfileFilter, UserAccount,
    ValidationError,
};
use crate::ports::ProfileRepoPort;
use libsql::{Connection, Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT ''
)"#;

const PROFILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
    account_type TEXT NOT NULL DEFAULT 'S' CHECK (account_type IN ('T', 'S', 'B')),
    bio TEXT CHECK (bio IS NULL OR length(bio) <= 500),
    profession TEXT CHECK (profession IS NULL OR length(profession) <= 100),
    phone_number TEXT CHECK (phone_number IS NULL OR length(phone_number) <= 17),
    city TEXT CHECK (city IS NULL OR length(city) <= 30),
    meeting_method TEXT NOT NULL DEFAULT 'B' CHECK (meeting_method IN ('L', 'O', 'B')),
    image TEXT
)"#;

const INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_profiles_account_type ON profiles (account_type)",
    "CREATE INDEX IF NOT EXISTS idx_profiles_city ON profiles (city)",
    "CREATE INDEX IF NOT EXISTS idx_users_first_name ON users (first_name)",
    "CREATE INDEX IF NOT EXISTS idx_users_last_name ON users (last_name)",
];

/// Column order is relied on by `row_to_profile`.
const SELECT_PROFILE: &str = r#"
SELECT p.id, p.account_type, p.bio, p.profession, p.phone_number, p.city, p.meeting_method, p.image,
       u.id, u.username, u.password, u.first_name, u.last_name, u.email
FROM profiles p
JOIN users u ON u.id = p.user_id
"#;

fn repo_err(e: libsql::Error) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn username_taken() -> DomainError {
    ValidationError::single("username", USERNAME_TAKEN_MESSAGE).into()
}

/// SQLite repository. One database file in the given base directory.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    pub async fn connect(base_dir: impl AsRef<Path>, file_name: &str) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join(file_name);
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // PRAGMA journal_mode returns a row; consume it (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Repo(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(repo_err)?.is_some() {}

        conn.execute(USERS_TABLE, ()).await.map_err(repo_err)?;
        conn.execute(PROFILES_TABLE, ()).await.map_err(repo_err)?;
        for index in INDEXES {
            conn.execute(index, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite profile store ready (WAL)");

        Ok(Self { db, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Fresh connection with foreign keys enforced (the pragma is per connection).
    async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(repo_err)?;
        Ok(conn)
    }

    fn row_to_profile(row: &Row) -> Result<Profile, DomainError> {
        let account_type: AccountType = row
            .get::<String>(1)
            .map_err(repo_err)?
            .parse()
            .map_err(|e: ValidationError| DomainError::Repo(e.to_string()))?;
        let meeting_method: MeetingMethod = row
            .get::<String>(6)
            .map_err(repo_err)?
            .parse()
            .map_err(|e: ValidationError| DomainError::Repo(e.to_string()))?;

        Ok(Profile {
            id: row.get(0).map_err(repo_err)?,
            account_type,
            bio: row.get::<String>(2).ok(),
            profession: row.get::<String>(3).ok(),
            phone_number: row.get::<String>(4).ok(),
            city: row.get::<String>(5).ok(),
            meeting_method,
            image: row.get::<String>(7).ok().map(ImageRef::new),
            user: UserAccount {
                id: row.get(8).map_err(repo_err)?,
                username: row.get(9).map_err(repo_err)?,
                password: row.get(10).map_err(repo_err)?,
                first_name: row.get::<String>(11).unwrap_or_default(),
                last_name: row.get::<String>(12).unwrap_or_default(),
                email: row.get::<String>(13).unwrap_or_default(),
            },
        })
    }

    async fn query_profiles(
        conn: &Connection,
        sql: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<Profile>, DomainError> {
        let mut rows = conn.query(sql, args).await.map_err(repo_err)?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            profiles.push(Self::row_to_profile(&row)?);
        }
        Ok(profiles)
    }

    async fn username_in_use(
        conn: &Connection,
        username: &str,
        except_user_id: i64,
    ) -> Result<bool, DomainError> {
        let mut rows = conn
            .query(
                "SELECT 1 FROM users WHERE username = ?1 AND id != ?2",
                params![username, except_user_id],
            )
            .await
            .map_err(repo_err)?;
        Ok(rows.next().await.map_err(repo_err)?.is_some())
    }

    async fn count(&self, sql: &str) -> Result<u64, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn.query(sql, ()).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(repo_err)? as u64),
            None => Ok(0),
        }
    }

    /// Account row, then profile row. Runs inside the caller's transaction.
    async fn insert_rows(conn: &Connection, draft: &Profile) -> Result<Profile, DomainError> {
        let user = &draft.user;
        if Self::username_in_use(conn, &user.username, 0).await? {
            return Err(username_taken());
        }
        conn.execute(
            r#"
            INSERT INTO users (username, password, first_name, last_name, email)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                user.username.as_str(),
                user.password.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.email.as_str()
            ],
        )
        .await
        .map_err(|e| {
            // Lost a race against a concurrent insert of the same username.
            if e.to_string().contains("UNIQUE constraint failed: users.username") {
                username_taken()
            } else {
                repo_err(e)
            }
        })?;
        let user_id = conn.last_insert_rowid();

        conn.execute(
            r#"
            INSERT INTO profiles (user_id, account_type, bio, profession, phone_number, city, meeting_method, image)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                user_id,
                draft.account_type.code(),
                draft.bio.as_deref(),
                draft.profession.as_deref(),
                draft.phone_number.as_deref(),
                draft.city.as_deref(),
                draft.meeting_method.code(),
                draft.image.as_ref().map(ImageRef::as_str)
            ],
        )
        .await
        .map_err(repo_err)?;
        let profile_id = conn.last_insert_rowid();

        let mut profile = draft.clone();
        profile.id = profile_id;
        profile.user.id = user_id;
        Ok(profile)
    }

    /// Account row first, then profile row. Runs inside the caller's transaction.
    async fn update_rows(conn: &Connection, profile: &Profile) -> Result<(), DomainError> {
        let user = &profile.user;
        let mut owner = conn
            .query(
                "SELECT user_id FROM profiles WHERE id = ?1",
                params![profile.id],
            )
            .await
            .map_err(repo_err)?;
        let owner_id: Option<i64> = match owner.next().await.map_err(repo_err)? {
            Some(row) => Some(row.get(0).map_err(repo_err)?),
            None => None,
        };
        if owner_id != Some(user.id) {
            return Err(DomainError::NotFound(format!("profile {}", profile.id)));
        }
        if Self::username_in_use(conn, &user.username, user.id).await? {
            return Err(username_taken());
        }

        let updated = conn
            .execute(
                r#"
                UPDATE users
                SET username = ?2, password = ?3, first_name = ?4, last_name = ?5, email = ?6
                WHERE id = ?1
                "#,
                params![
                    user.id,
                    user.username.as_str(),
                    user.password.as_str(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    user.email.as_str()
                ],
            )
            .await
            .map_err(repo_err)?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("user {}", user.id)));
        }

        conn.execute(
            r#"
            UPDATE profiles
            SET account_type = ?2, bio = ?3, profession = ?4, phone_number = ?5,
                city = ?6, meeting_method = ?7, image = ?8
            WHERE id = ?1
            "#,
            params![
                profile.id,
                profile.account_type.code(),
                profile.bio.as_deref(),
                profile.profession.as_deref(),
                profile.phone_number.as_deref(),
                profile.city.as_deref(),
                profile.meeting_method.code(),
                profile.image.as_ref().map(ImageRef::as_str)
            ],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn delete_rows(conn: &Connection, user_id: i64) -> Result<bool, DomainError> {
        conn.execute("DELETE FROM profiles WHERE user_id = ?1", params![user_id])
            .await
            .map_err(repo_err)?;
        let deleted = conn
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])
            .await
            .map_err(repo_err)?;
        Ok(deleted > 0)
    }

    /// Commit on success; roll back on any error and return that error.
    async fn finish<T>(
        tx: libsql::Transaction,
        result: Result<T, DomainError>,
        op: &str,
    ) -> Result<T, DomainError> {
        match result {
            Ok(value) => {
                tx.commit().await.map_err(repo_err)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(op, error = %rb, "rollback failed");
                } else {
                    debug!(op, error = %e, "rolled back");
                }
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl ProfileRepoPort for SqliteRepo {
    async fn insert(&self, draft: &Profile) -> Result<Profile, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(repo_err)?;
        let result = Self::insert_rows(&tx, draft).await;
        Self::finish(tx, result, "insert").await
    }

    async fn update(&self, profile: &Profile) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(repo_err)?;
        let result = Self::update_rows(&tx, profile).await;
        Self::finish(tx, result, "update").await
    }

    async fn get(&self, profile_id: i64) -> Result<Option<Profile>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("{SELECT_PROFILE} WHERE p.id = ?1");
        let mut found = Self::query_profiles(&conn, &sql, params![profile_id]).await?;
        Ok(found.pop())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Profile>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("{SELECT_PROFILE} WHERE u.username = ?1");
        let mut found = Self::query_profiles(&conn, &sql, params![username]).await?;
        Ok(found.pop())
    }

    async fn filter(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, DomainError> {
        let conn = self.conn().await?;
        // Name lookups resolve matching account ids first, then the profiles they own.
        let (clause, value) = match filter {
            ProfileFilter::AccountType(t) => ("p.account_type = ?1", t.code().to_string()),
            ProfileFilter::City(city) => ("p.city = ?1", city.clone()),
            ProfileFilter::FirstName(name) => (
                "p.user_id IN (SELECT id FROM users WHERE first_name = ?1)",
                name.clone(),
            ),
            ProfileFilter::LastName(name) => (
                "p.user_id IN (SELECT id FROM users WHERE last_name = ?1)",
                name.clone(),
            ),
        };
        let sql = format!("{SELECT_PROFILE} WHERE {clause} ORDER BY p.id");
        Self::query_profiles(&conn, &sql, params![value]).await
    }

    async fn delete_account(&self, user_id: i64) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(repo_err)?;
        let result = Self::delete_rows(&tx, user_id).await;
        Self::finish(tx, result, "delete_account").await
    }

    async fn count_accounts(&self) -> Result<u64, DomainError> {
        self.count("SELECT COUNT(*) FROM users").await
    }

    async fn count_profiles(&self) -> Result<u64, DomainError> {
        self.count("SELECT COUNT(*) FROM profiles").await
    }
}

//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, Profile, ProfileFilter};

/// Profile store. Accounts and profiles are written together.
#[async_trait::async_trait]
pub trait ProfileRepoPort: Send + Sync {
    /// Persist an unsaved profile: the account row first, then the profile row, atomically.
    /// Ids on `draft` are ignored; the returned profile carries the assigned ones.
    ///
    /// Fails with `DomainError::Validation` (field `username`) if the username is taken.
    /// Nothing is persisted on failure.
    async fn insert(&self, draft: &Profile) -> Result<Profile, DomainError>;

    /// Update an existing account and its profile, account first, atomically.
    ///
    /// Fails with `DomainError::NotFound` if either row is gone.
    async fn update(&self, profile: &Profile) -> Result<(), DomainError>;

    async fn get(&self, profile_id: i64) -> Result<Option<Profile>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Profile>, DomainError>;

    /// Profiles matching `filter` exactly, in storage (id) order.
    async fn filter(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, DomainError>;

    /// Delete an account; its profile goes with it. Returns false if no such account.
    async fn delete_account(&self, user_id: i64) -> Result<bool, DomainError>;

    async fn count_accounts(&self) -> Result<u64, DomainError>;

    async fn count_profiles(&self) -> Result<u64, DomainError>;
}

/// Password hashing. Only hashes ever reach the store.
pub trait PasswordPort: Send + Sync {
    fn hash(&self, raw: &str) -> Result<String, DomainError>;

    /// Check `raw` against a stored hash. Malformed hashes are an error, a mismatch is `Ok(false)`.
    fn verify(&self, raw: &str, hash: &str) -> Result<bool, DomainError>;
}

//! Implements ProfileRepoPort in process memory.
//!
//! Accounts and profiles live in two id-ordered maps behind one RwLock. Every
//! multi-record write happens under a single write guard, so it is all-or-nothing.

use crate::domain::validation::USERNAME_TAKEN_MESSAGE;
use crate::domain::{DomainError, Profile, ProfileFilter, UserAccount, ValidationError};
use crate::ports::ProfileRepoPort;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Profile row without the embedded account; joined on read.
#[derive(Debug, Clone)]
struct ProfileRow {
    user_id: i64,
    profile: Profile,
}

#[derive(Debug, Default)]
struct StoreData {
    next_user_id: i64,
    next_profile_id: i64,
    accounts: BTreeMap<i64, UserAccount>,
    profiles: BTreeMap<i64, ProfileRow>,
}

impl StoreData {
    fn username_taken(&self, username: &str, except_user_id: i64) -> bool {
        self.accounts
            .values()
            .any(|a| a.username == username && a.id != except_user_id)
    }

    /// Re-attach the current account row to a stored profile.
    fn joined(&self, row: &ProfileRow) -> Option<Profile> {
        let account = self.accounts.get(&row.user_id)?;
        let mut profile = row.profile.clone();
        profile.user = account.clone();
        Some(profile)
    }

    /// Two-step lookup: matching account ids first, then the profiles they own.
    fn profiles_of(&self, account_matches: impl Fn(&UserAccount) -> bool) -> Vec<Profile> {
        let ids: Vec<i64> = self
            .accounts
            .values()
            .filter(|a| account_matches(a))
            .map(|a| a.id)
            .collect();
        self.profiles
            .values()
            .filter(|row| ids.contains(&row.user_id))
            .filter_map(|row| self.joined(row))
            .collect()
    }
}

/// In-memory repository. Same semantics as the SQLite one; used by tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    data: RwLock<StoreData>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileRepoPort for MemoryRepo {
    async fn insert(&self, draft: &Profile) -> Result<Profile, DomainError> {
        let mut data = self.data.write().await;
        if data.username_taken(&draft.user.username, 0) {
            return Err(ValidationError::single("username", USERNAME_TAKEN_MESSAGE).into());
        }

        data.next_user_id += 1;
        data.next_profile_id += 1;
        let mut profile = draft.clone();
        profile.user.id = data.next_user_id;
        profile.id = data.next_profile_id;

        data.accounts.insert(profile.user.id, profile.user.clone());
        data.profiles.insert(
            profile.id,
            ProfileRow {
                user_id: profile.user.id,
                profile: profile.clone(),
            },
        );
        Ok(profile)
    }

    async fn update(&self, profile: &Profile) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        let owned_by_user = data
            .profiles
            .get(&profile.id)
            .is_some_and(|row| row.user_id == profile.user.id);
        if !owned_by_user || !data.accounts.contains_key(&profile.user.id) {
            return Err(DomainError::NotFound(format!("profile {}", profile.id)));
        }
        if data.username_taken(&profile.user.username, profile.user.id) {
            return Err(ValidationError::single("username", USERNAME_TAKEN_MESSAGE).into());
        }

        data.accounts.insert(profile.user.id, profile.user.clone());
        data.profiles.insert(
            profile.id,
            ProfileRow {
                user_id: profile.user.id,
                profile: profile.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, profile_id: i64) -> Result<Option<Profile>, DomainError> {
        let data = self.data.read().await;
        Ok(data.profiles.get(&profile_id).and_then(|row| data.joined(row)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Profile>, DomainError> {
        let data = self.data.read().await;
        Ok(data.profiles_of(|a| a.username == username).into_iter().next())
    }

    async fn filter(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, DomainError> {
        let data = self.data.read().await;
        let found: Vec<Profile> = match filter {
            ProfileFilter::AccountType(t) => data
                .profiles
                .values()
                .filter(|row| row.profile.account_type == *t)
                .filter_map(|row| data.joined(row))
                .collect(),
            ProfileFilter::City(city) => data
                .profiles
                .values()
                .filter(|row| row.profile.city.as_deref() == Some(city.as_str()))
                .filter_map(|row| data.joined(row))
                .collect(),
            ProfileFilter::FirstName(name) => data.profiles_of(|a| &a.first_name == name),
            ProfileFilter::LastName(name) => data.profiles_of(|a| &a.last_name == name),
        };
        Ok(found)
    }

    async fn delete_account(&self, user_id: i64) -> Result<bool, DomainError> {
        let mut data = self.data.write().await;
        if data.accounts.remove(&user_id).is_none() {
            return Ok(false);
        }
        data.profiles.retain(|_, row| row.user_id != user_id);
        Ok(true)
    }

    async fn count_accounts(&self) -> Result<u64, DomainError> {
        Ok(self.data.read().await.accounts.len() as u64)
    }

    async fn count_profiles(&self) -> Result<u64, DomainError> {
        Ok(self.data.read().await.profiles.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, NewProfile};

    fn draft(username: &str) -> Profile {
        NewProfile::new(username, "pw", AccountType::Both, "Dana", "Lee")
            .city("Oslo")
            .into_draft("hash".to_string())
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let repo = MemoryRepo::new();
        let a = repo.insert(&draft("a")).await.unwrap();
        let b = repo.insert(&draft("b")).await.unwrap();
        assert_eq!((a.id, a.user.id), (1, 1));
        assert_eq!((b.id, b.user.id), (2, 2));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = MemoryRepo::new();
        let a = repo.insert(&draft("a")).await.unwrap();
        repo.delete_account(a.user.id).await.unwrap();
        let b = repo.insert(&draft("a")).await.unwrap();
        assert!(b.id > a.id);
        assert!(b.user.id > a.user.id);
    }

    #[tokio::test]
    async fn test_update_missing_profile_is_not_found() {
        let repo = MemoryRepo::new();
        let mut ghost = draft("ghost");
        ghost.id = 7;
        ghost.user.id = 7;
        assert!(matches!(
            repo.update(&ghost).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() {
        let repo = MemoryRepo::new();
        repo.insert(&draft("a")).await.unwrap();
        let mut b = repo.insert(&draft("b")).await.unwrap();
        b.user.username = "a".to_string();
        let err = repo.update(&b).await.unwrap_err();
        assert!(err.as_validation().unwrap().has_field("username"));
        assert_eq!(
            repo.find_by_username("b").await.unwrap().map(|p| p.id),
            Some(b.id)
        );
    }
}

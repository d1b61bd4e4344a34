//! Profile store use cases: combined account + profile creation, validated saves, lookups.
//!
//! - Validates every field before anything touches the repository
//! - Hashes passwords via PasswordPort; the repository only ever sees hashes
//! - Leaves atomicity of the two-record writes to the repository transaction

use crate::domain::{AccountType, DomainError, NewProfile, Profile, ProfileFilter, validate_profile};
use crate::ports::{PasswordPort, ProfileRepoPort};
use std::sync::Arc;
use tracing::{debug, info};

/// Profile service. Coordinates validation, hashing and the profile repository.
pub struct ProfileService {
    repo: Arc<dyn ProfileRepoPort>,
    hasher: Arc<dyn PasswordPort>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn ProfileRepoPort>, hasher: Arc<dyn PasswordPort>) -> Self {
        Self { repo, hasher }
    }

    /// Create a user account and its profile. Both are persisted, or neither.
    pub async fn create(&self, new: NewProfile) -> Result<Profile, DomainError> {
        let password_hash = self.hasher.hash(&new.password)?;
        let draft = new.into_draft(password_hash);
        validate_profile(&draft)?;

        let profile = self.repo.insert(&draft).await?;
        info!(
            profile_id = profile.id,
            user_id = profile.user.id,
            username = %profile.user.username,
            account_type = profile.account_type.code(),
            "created profile"
        );
        Ok(profile)
    }

    /// Validate all fields, then persist the account and the profile.
    pub async fn save(&self, profile: &Profile) -> Result<Profile, DomainError> {
        if !profile.is_persisted() {
            return Err(DomainError::NotFound(format!(
                "{} has not been created yet",
                profile
            )));
        }
        validate_profile(profile)?;
        self.repo.update(profile).await?;
        debug!(profile_id = profile.id, "saved profile");
        Ok(profile.clone())
    }

    /// Replace the stored password hash. Takes effect on the next `save`.
    pub fn set_password(&self, profile: &mut Profile, raw: &str) -> Result<(), DomainError> {
        profile.user.password = self.hasher.hash(raw)?;
        Ok(())
    }

    pub fn check_password(&self, profile: &Profile, raw: &str) -> Result<bool, DomainError> {
        self.hasher.verify(raw, &profile.user.password)
    }

    pub async fn get(&self, profile_id: i64) -> Result<Option<Profile>, DomainError> {
        self.repo.get(profile_id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Profile>, DomainError> {
        self.repo.find_by_username(username).await
    }

    pub async fn filter_by_account_type(
        &self,
        account_type: AccountType,
    ) -> Result<Vec<Profile>, DomainError> {
        self.repo
            .filter(&ProfileFilter::AccountType(account_type))
            .await
    }

    /// Exact, case-sensitive city match.
    pub async fn filter_by_city(&self, city: &str) -> Result<Vec<Profile>, DomainError> {
        self.repo
            .filter(&ProfileFilter::City(city.to_string()))
            .await
    }

    pub async fn filter_by_first_name(
        &self,
        first_name: &str,
    ) -> Result<Vec<Profile>, DomainError> {
        self.repo
            .filter(&ProfileFilter::FirstName(first_name.to_string()))
            .await
    }

    pub async fn filter_by_last_name(&self, last_name: &str) -> Result<Vec<Profile>, DomainError> {
        self.repo
            .filter(&ProfileFilter::LastName(last_name.to_string()))
            .await
    }

    /// Delete the account and, with it, its profile.
    pub async fn delete_account(&self, user_id: i64) -> Result<bool, DomainError> {
        let deleted = self.repo.delete_account(user_id).await?;
        if deleted {
            info!(user_id, "deleted account and profile");
        }
        Ok(deleted)
    }

    pub async fn count_accounts(&self) -> Result<u64, DomainError> {
        self.repo.count_accounts().await
    }

    pub async fn count_profiles(&self) -> Result<u64, DomainError> {
        self.repo.count_profiles().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::memory_repo::MemoryRepo;
    use crate::domain::validation::{PHONE_FORMAT_MESSAGE, USERNAME_TAKEN_MESSAGE};
    use crate::domain::{ImageRef, MeetingMethod};

    /// Reversible stand-in so tests do not pay for Argon2.
    struct PlainHasher;

    impl PasswordPort for PlainHasher {
        fn hash(&self, raw: &str) -> Result<String, DomainError> {
            Ok(format!("plain${}", raw))
        }

        fn verify(&self, raw: &str, hash: &str) -> Result<bool, DomainError> {
            Ok(hash == format!("plain${}", raw))
        }
    }

    fn service() -> ProfileService {
        ProfileService::new(Arc::new(MemoryRepo::new()), Arc::new(PlainHasher))
    }

    fn alice() -> NewProfile {
        NewProfile::new("alice", "pw123", AccountType::Student, "Alice", "Smith")
            .phone_number("+123456789")
            .city("Paris")
    }

    #[tokio::test]
    async fn test_create_links_one_account_to_one_profile() {
        let svc = service();
        let profile = svc.create(alice()).await.unwrap();

        assert!(profile.is_persisted());
        assert_eq!(profile.user.username, "alice");
        assert_eq!(profile.meeting_method, MeetingMethod::Both);
        assert_ne!(profile.user.password, "pw123");
        assert!(svc.check_password(&profile, "pw123").unwrap());
        assert!(!svc.check_password(&profile, "wrong").unwrap());
        assert_eq!(svc.count_accounts().await.unwrap(), 1);
        assert_eq!(svc.count_profiles().await.unwrap(), 1);

        let by_city = svc.filter_by_city("Paris").await.unwrap();
        assert_eq!(by_city, vec![profile.clone()]);
        assert_eq!(svc.get(profile.id).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_create_with_bad_phone_persists_nothing() {
        let svc = service();
        let err = svc.create(alice().phone_number("abc")).await.unwrap_err();

        let v = err.as_validation().expect("validation error");
        assert_eq!(v.messages("phone_number"), [PHONE_FORMAT_MESSAGE]);
        assert_eq!(svc.count_accounts().await.unwrap(), 0);
        assert_eq!(svc.count_profiles().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_accepts_free_form_username() {
        let svc = service();
        let profile = svc
            .create(NewProfile::new("john doe", "pw", AccountType::Student, "John", "Doe"))
            .await
            .unwrap();
        assert_eq!(profile.user.username, "john doe");
        assert_eq!(
            svc.find_by_username("john doe").await.unwrap(),
            Some(profile)
        );
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let svc = service();
        svc.create(alice()).await.unwrap();
        let err = svc.create(alice().city("Lyon")).await.unwrap_err();

        assert_eq!(
            err.as_validation().unwrap().messages("username"),
            [USERNAME_TAKEN_MESSAGE]
        );
        assert_eq!(svc.count_accounts().await.unwrap(), 1);
        assert!(svc.filter_by_city("Lyon").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filters_are_exact() {
        let svc = service();
        let a = svc.create(alice()).await.unwrap();
        let b = svc
            .create(
                NewProfile::new("bob", "pw", AccountType::Teacher, "Bob", "Smith")
                    .city("paris")
                    .meeting_method(MeetingMethod::Online),
            )
            .await
            .unwrap();
        let c = svc
            .create(NewProfile::new("carol", "pw", AccountType::Teacher, "Alice", "Jones"))
            .await
            .unwrap();

        assert_eq!(svc.filter_by_city("Paris").await.unwrap(), vec![a.clone()]);
        assert_eq!(svc.filter_by_city("paris").await.unwrap(), vec![b.clone()]);
        assert!(svc.filter_by_city("Par").await.unwrap().is_empty());

        assert_eq!(
            svc.filter_by_account_type(AccountType::Teacher).await.unwrap(),
            vec![b.clone(), c.clone()]
        );
        assert!(
            svc.filter_by_account_type(AccountType::Both)
                .await
                .unwrap()
                .is_empty()
        );

        assert_eq!(
            svc.filter_by_first_name("Alice").await.unwrap(),
            vec![a.clone(), c.clone()]
        );
        assert!(svc.filter_by_first_name("alice").await.unwrap().is_empty());
        assert_eq!(svc.filter_by_last_name("Smith").await.unwrap(), vec![a, b]);
        assert_eq!(svc.filter_by_last_name("Jones").await.unwrap(), vec![c]);
    }

    #[tokio::test]
    async fn test_save_validates_and_updates_both_records() {
        let svc = service();
        let mut profile = svc.create(alice()).await.unwrap();

        profile.city = Some("Berlin".to_string());
        profile.user.first_name = "Alicia".to_string();
        profile.image = Some(ImageRef::upload("alice.png"));
        svc.save(&profile).await.unwrap();

        let stored = svc.get(profile.id).await.unwrap().unwrap();
        assert_eq!(stored.city.as_deref(), Some("Berlin"));
        assert_eq!(stored.user.first_name, "Alicia");
        assert_eq!(svc.filter_by_first_name("Alicia").await.unwrap().len(), 1);

        let mut invalid = stored.clone();
        invalid.phone_number = Some("12".to_string());
        assert!(
            svc.save(&invalid)
                .await
                .unwrap_err()
                .as_validation()
                .is_some()
        );
        assert_eq!(svc.get(profile.id).await.unwrap().unwrap(), stored);
    }

    #[tokio::test]
    async fn test_save_requires_created_profile() {
        let svc = service();
        let draft = alice().into_draft("plain$pw123".to_string());
        assert!(matches!(
            svc.save(&draft).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_password_takes_effect_on_save() {
        let svc = service();
        let mut profile = svc.create(alice()).await.unwrap();
        svc.set_password(&mut profile, "new-secret").unwrap();
        svc.save(&profile).await.unwrap();

        let stored = svc.find_by_username("alice").await.unwrap().unwrap();
        assert!(svc.check_password(&stored, "new-secret").unwrap());
        assert!(!svc.check_password(&stored, "pw123").unwrap());
    }

    #[tokio::test]
    async fn test_delete_account_cascades_to_profile() {
        let svc = service();
        let profile = svc.create(alice()).await.unwrap();
        assert!(svc.delete_account(profile.user.id).await.unwrap());

        assert_eq!(svc.count_accounts().await.unwrap(), 0);
        assert_eq!(svc.count_profiles().await.unwrap(), 0);
        assert!(svc.get(profile.id).await.unwrap().is_none());
        assert!(svc.filter_by_city("Paris").await.unwrap().is_empty());
        assert!(!svc.delete_account(profile.user.id).await.unwrap());
    }
}

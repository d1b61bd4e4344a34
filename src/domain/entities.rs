//! Domain entities. Pure data structures for the core business.
//!
//! No storage/IO types here; adapters map rows and wire formats into these.

use super::errors::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directory (relative to the storage backend root) where profile images are uploaded.
pub const PROFILE_IMAGE_DIR: &str = "images/profile_images/";

/// Role classification of an account. Stored as a one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "T")]
    Teacher,
    #[default]
    #[serde(rename = "S")]
    Student,
    #[serde(rename = "B")]
    Both,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [Self::Teacher, Self::Student, Self::Both];

    /// Stored one-letter code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Teacher => "T",
            Self::Student => "S",
            Self::Both => "B",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Teacher => "Teacher",
            Self::Student => "Student",
            Self::Both => "Teacher and Student",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccountType {
    type Err = ValidationError;

    /// Parses the stored code (`T`, `S`, `B`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == s)
            .ok_or_else(|| ValidationError::invalid_choice("account_type", s))
    }
}

/// Preferred interaction mode. Stored as a one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeetingMethod {
    #[serde(rename = "L")]
    Live,
    #[serde(rename = "O")]
    Online,
    #[default]
    #[serde(rename = "B")]
    Both,
}

impl MeetingMethod {
    pub const ALL: [MeetingMethod; 3] = [Self::Live, Self::Online, Self::Both];

    pub fn code(self) -> &'static str {
        match self {
            Self::Live => "L",
            Self::Online => "O",
            Self::Both => "B",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Online => "Online",
            Self::Both => "Live and Online",
        }
    }
}

impl fmt::Display for MeetingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MeetingMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == s)
            .ok_or_else(|| ValidationError::invalid_choice("meeting_method", s))
    }
}

/// Reference to an image held by an external storage backend. Opaque path; never read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap an already stored path as-is.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path for a freshly uploaded file: `images/profile_images/<file_name>`.
    pub fn upload(file_name: &str) -> Self {
        Self::upload_to(PROFILE_IMAGE_DIR, file_name)
    }

    /// Same as [`ImageRef::upload`] with a configurable upload directory.
    pub fn upload_to(dir: &str, file_name: &str) -> Self {
        let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
        if dir.ends_with('/') {
            Self(format!("{dir}{name}"))
        } else {
            Self(format!("{dir}/{name}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Core identity record. The profile holds it but does not own its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// 0 until persisted.
    pub id: i64,
    pub username: String,
    /// Password hash (PHC string). Never the raw password.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Empty when no email was given.
    pub email: String,
}

/// Extended per-user attributes, one-to-one with a [`UserAccount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// 0 until persisted.
    pub id: i64,
    pub user: UserAccount,
    pub account_type: AccountType,
    pub bio: Option<String>,
    pub profession: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub meeting_method: MeetingMethod,
    pub image: Option<ImageRef>,
}

impl Profile {
    pub fn is_persisted(&self) -> bool {
        self.id != 0 && self.user.id != 0
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'s Profile", self.user.username)
    }
}

/// Input of the combined account + profile factory.
///
/// Required arguments go through [`NewProfile::new`]; the rest default
/// (meeting method `Both`, everything else empty) and are set with the builder methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub username: String,
    /// Raw password; hashed before anything is stored.
    pub password: String,
    pub account_type: AccountType,
    pub first_name: String,
    pub last_name: String,
    pub meeting_method: MeetingMethod,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub profession: Option<String>,
    pub image: Option<ImageRef>,
}

impl NewProfile {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        account_type: AccountType,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            account_type,
            first_name: first_name.into(),
            last_name: last_name.into(),
            meeting_method: MeetingMethod::default(),
            email: None,
            phone_number: None,
            city: None,
            bio: None,
            profession: None,
            image: None,
        }
    }

    pub fn meeting_method(mut self, meeting_method: MeetingMethod) -> Self {
        self.meeting_method = meeting_method;
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = Some(profession.into());
        self
    }

    pub fn image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    /// Build the unsaved profile (ids 0) around an already hashed password.
    pub fn into_draft(self, password_hash: String) -> Profile {
        Profile {
            id: 0,
            user: UserAccount {
                id: 0,
                username: self.username,
                password: password_hash,
                first_name: self.first_name,
                last_name: self.last_name,
                email: normalize_email(self.email.as_deref()),
            },
            account_type: self.account_type,
            bio: self.bio,
            profession: self.profession,
            phone_number: self.phone_number,
            city: self.city,
            meeting_method: self.meeting_method,
            image: self.image,
        }
    }
}

/// Lower-case the domain part of an email; `None` becomes the empty string.
pub fn normalize_email(email: Option<&str>) -> String {
    let email = email.unwrap_or_default().trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Which profiles a lookup should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileFilter {
    AccountType(AccountType),
    City(String),
    /// Exact match on the owning account's first name.
    FirstName(String),
    /// Exact match on the owning account's last name.
    LastName(String),
}

/// A chat message. Exposed only through the message serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Id of the sending user account.
    pub sender: i64,
    pub date_time: DateTime<Utc>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_codes_round_trip_through_from_str() {
        for t in AccountType::ALL {
            assert_eq!(t.code().parse::<AccountType>().unwrap(), t);
        }
        for m in MeetingMethod::ALL {
            assert_eq!(m.code().parse::<MeetingMethod>().unwrap(), m);
        }
    }

    #[test]
    fn test_choice_defaults_and_labels() {
        assert_eq!(AccountType::default(), AccountType::Student);
        assert_eq!(MeetingMethod::default(), MeetingMethod::Both);
        assert_eq!(AccountType::Both.to_string(), "Teacher and Student");
        assert_eq!(MeetingMethod::Both.to_string(), "Live and Online");
    }

    #[test]
    fn test_invalid_choice_code() {
        let err = "X".parse::<AccountType>().unwrap_err();
        assert_eq!(
            err.messages("account_type"),
            ["Value 'X' is not a valid choice."]
        );
        // Labels are not codes.
        assert!("Teacher".parse::<AccountType>().is_err());
        assert!("l".parse::<MeetingMethod>().is_err());
    }

    #[test]
    fn test_new_profile_defaults_and_draft() {
        let draft = NewProfile::new("alice", "pw123", AccountType::Student, "Alice", "Smith")
            .city("Paris")
            .email("Alice@Example.COM")
            .into_draft("hashed".to_string());

        assert_eq!(draft.id, 0);
        assert!(!draft.is_persisted());
        assert_eq!(draft.meeting_method, MeetingMethod::Both);
        assert_eq!(draft.user.password, "hashed");
        assert_eq!(draft.user.email, "Alice@example.com");
        assert_eq!(draft.city.as_deref(), Some("Paris"));
        assert_eq!(draft.phone_number, None);
        assert_eq!(draft.to_string(), "alice's Profile");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(None), "");
        assert_eq!(normalize_email(Some(" bob@MAIL.org ")), "bob@mail.org");
        assert_eq!(normalize_email(Some("no-at-sign")), "no-at-sign");
    }

    #[test]
    fn test_image_upload_path() {
        assert_eq!(
            ImageRef::upload("me.png").as_str(),
            "images/profile_images/me.png"
        );
        assert_eq!(
            ImageRef::upload_to("media/avatars", "C:\\tmp\\me.png").as_str(),
            "media/avatars/me.png"
        );
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let draft = NewProfile::new("bob", "secret", AccountType::Teacher, "Bob", "Stone")
            .into_draft("$argon2id$fake".to_string());
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json["user"].get("password").is_none());
        assert_eq!(json["account_type"], "T");
        assert_eq!(json["meeting_method"], "B");
    }
}

//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Main menu: create a profile, search, delete an account. Validation errors are
//! printed per field and the menu comes back.

use crate::domain::{AccountType, DomainError, ImageRef, MeetingMethod, NewProfile, Profile};
use crate::ports::InputPort;
use crate::usecases::ProfileService;
use async_trait::async_trait;
use inquire::{Confirm, Password, Select, Text};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Create,
    ByAccountType,
    ByCity,
    ByFirstName,
    ByLastName,
    Delete,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 7] = [
        Self::Create,
        Self::ByAccountType,
        Self::ByCity,
        Self::ByFirstName,
        Self::ByLastName,
        Self::Delete,
        Self::Quit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "Create profile",
            Self::ByAccountType => "Search by account type",
            Self::ByCity => "Search by city",
            Self::ByFirstName => "Search by first name",
            Self::ByLastName => "Search by last name",
            Self::Delete => "Delete account",
            Self::Quit => "Quit",
        })
    }
}

fn input_err(e: inquire::InquireError) -> DomainError {
    DomainError::Input(e.to_string())
}

/// Optional text prompt; blank input means "not given".
fn optional(prompt: &str) -> Result<Option<String>, DomainError> {
    let value = Text::new(prompt)
        .with_help_message("leave empty to skip")
        .prompt()
        .map_err(input_err)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// One line per profile: `#id username (First Last) - type, city, meeting method`.
fn summary_line(p: &Profile) -> String {
    format!(
        "#{} {} ({} {}) - {}, {}, {}",
        p.id,
        p.user.username,
        p.user.first_name,
        p.user.last_name,
        p.account_type,
        p.city.as_deref().unwrap_or("-"),
        p.meeting_method
    )
}

fn print_results(profiles: &[Profile]) {
    if profiles.is_empty() {
        println!("No matching profiles.");
        return;
    }
    for p in profiles {
        println!("{}", summary_line(p));
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    profiles: Arc<ProfileService>,
    image_upload_dir: String,
}

impl TuiInputPort {
    pub fn new(profiles: Arc<ProfileService>, image_upload_dir: impl Into<String>) -> Self {
        Self {
            profiles,
            image_upload_dir: image_upload_dir.into(),
        }
    }

    async fn create(&self) -> Result<(), DomainError> {
        let username = Text::new("Username:").prompt().map_err(input_err)?;
        let password = Password::new("Password:").prompt().map_err(input_err)?;
        let account_type = Select::new("Account type:", AccountType::ALL.to_vec())
            .with_starting_cursor(1)
            .prompt()
            .map_err(input_err)?;
        let first_name = Text::new("First name:").prompt().map_err(input_err)?;
        let last_name = Text::new("Last name:").prompt().map_err(input_err)?;
        let meeting_method = Select::new("Meeting method:", MeetingMethod::ALL.to_vec())
            .with_starting_cursor(2)
            .prompt()
            .map_err(input_err)?;

        let mut new = NewProfile::new(username, password, account_type, first_name, last_name)
            .meeting_method(meeting_method);
        new.email = optional("Email:")?;
        new.phone_number = optional("Phone number:")?;
        new.city = optional("City:")?;
        new.profession = optional("Profession:")?;
        new.bio = optional("Bio:")?;
        new.image = optional("Image file name:")?
            .map(|name| ImageRef::upload_to(&self.image_upload_dir, &name));

        let profile = self.profiles.create(new).await?;
        println!("Created {}: {}", profile, summary_line(&profile));
        Ok(())
    }

    async fn search(&self, item: MenuItem) -> Result<(), DomainError> {
        let found = match item {
            MenuItem::ByAccountType => {
                let t = Select::new("Account type:", AccountType::ALL.to_vec())
                    .prompt()
                    .map_err(input_err)?;
                self.profiles.filter_by_account_type(t).await?
            }
            MenuItem::ByCity => {
                let city = Text::new("City:").prompt().map_err(input_err)?;
                self.profiles.filter_by_city(&city).await?
            }
            MenuItem::ByFirstName => {
                let name = Text::new("First name:").prompt().map_err(input_err)?;
                self.profiles.filter_by_first_name(&name).await?
            }
            MenuItem::ByLastName => {
                let name = Text::new("Last name:").prompt().map_err(input_err)?;
                self.profiles.filter_by_last_name(&name).await?
            }
            _ => return Ok(()),
        };
        print_results(&found);
        Ok(())
    }

    async fn delete(&self) -> Result<(), DomainError> {
        let username = Text::new("Username:").prompt().map_err(input_err)?;
        let Some(profile) = self.profiles.find_by_username(&username).await? else {
            println!("No account named {}.", username);
            return Ok(());
        };
        let confirmed = Confirm::new(&format!("Delete {} and its profile?", profile.user.username))
            .with_default(false)
            .prompt()
            .map_err(input_err)?;
        if confirmed && self.profiles.delete_account(profile.user.id).await? {
            println!("Deleted {}.", profile.user.username);
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let item = Select::new("What next?", MenuItem::ALL.to_vec())
                .prompt()
                .map_err(input_err)?;
            let result = match item {
                MenuItem::Quit => return Ok(()),
                MenuItem::Create => self.create().await,
                MenuItem::Delete => self.delete().await,
                search => self.search(search).await,
            };
            match result {
                Ok(()) => {}
                Err(DomainError::Validation(errors)) => {
                    for (field, messages) in errors.fields() {
                        for message in messages {
                            println!("  {}: {}", field, message);
                        }
                    }
                }
                Err(DomainError::Input(e)) => return Err(DomainError::Input(e)),
                Err(e) => warn!(error = %e, "operation failed"),
            }
            println!();
        }
    }
}

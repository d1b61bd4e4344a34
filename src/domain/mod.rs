//! Core domain layer. No external I/O dependencies.
//!
//! Entities, validation rules and errors live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod validation;

pub use entities::{
    AccountType, ImageRef, MeetingMethod, Message, NewProfile, Profile, ProfileFilter,
    UserAccount,
};
pub use errors::{DomainError, ValidationError};
pub use validation::validate_profile;

//! Infrastructure adapters. Implement outbound ports.
//!
//! Storage, password hashing, wire formats, terminal UI. Map errors to DomainError.

pub mod persistence;
pub mod security;
pub mod serializers;
pub mod ui;

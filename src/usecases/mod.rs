//! Application use cases. Orchestrate domain logic via ports.

pub mod profile_service;

pub use profile_service::ProfileService;

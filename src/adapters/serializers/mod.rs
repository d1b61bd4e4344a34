//! Wire-format serializers for domain entities.

pub mod message;

pub use message::MessageSerializer;

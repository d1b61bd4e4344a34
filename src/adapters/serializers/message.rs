//! Chat message wire contract: a JSON object with exactly
//! `message_id`, `sender`, `date_time` and `message`.
//!
//! Encoding goes through serde. Decoding is field by field so that every bad field
//! gets its own message, with the usual lenient coercion (numeric strings for ints,
//! numbers for text). Text is trimmed and must not end up blank.

use crate::domain::{DomainError, Message, ValidationError};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const MESSAGE_FIELDS: [&str; 4] = ["message_id", "sender", "date_time", "message"];

const REQUIRED: &str = "This field is required.";
const INVALID_INT: &str = "A valid integer is required.";
const INVALID_DATETIME: &str = "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";
const INVALID_STRING: &str = "Not a valid string.";
const BLANK: &str = "This field may not be blank.";

/// Maps [`Message`] to and from its JSON representation.
pub struct MessageSerializer;

impl MessageSerializer {
    pub fn to_value(message: &Message) -> Result<Value, DomainError> {
        serde_json::to_value(message).map_err(|e| DomainError::Serialization(e.to_string()))
    }

    pub fn to_json(message: &Message) -> Result<String, DomainError> {
        serde_json::to_string(message).map_err(|e| DomainError::Serialization(e.to_string()))
    }

    /// Encode a list as a JSON array.
    pub fn to_json_many(messages: &[Message]) -> Result<String, DomainError> {
        serde_json::to_string(messages).map_err(|e| DomainError::Serialization(e.to_string()))
    }

    /// Decode a JSON object. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Message, DomainError> {
        let Some(obj) = value.as_object() else {
            return Err(ValidationError::single(
                "non_field_errors",
                format!("Invalid data. Expected a dictionary, but got {}.", json_type(value)),
            )
            .into());
        };

        let mut errors = ValidationError::new();
        let message_id = int_field(obj, "message_id", &mut errors);
        let sender = int_field(obj, "sender", &mut errors);
        let date_time = datetime_field(obj, "date_time", &mut errors);
        let message = string_field(obj, "message", &mut errors);

        match (message_id, sender, date_time, message) {
            (Some(message_id), Some(sender), Some(date_time), Some(message)) => Ok(Message {
                message_id,
                sender,
                date_time,
                message,
            }),
            _ => Err(errors.into()),
        }
    }

    pub fn from_json(json: &str) -> Result<Message, DomainError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| DomainError::Serialization(e.to_string()))?;
        Self::from_value(&value)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn present<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut ValidationError,
) -> Option<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, REQUIRED);
            None
        }
        Some(v) => Some(v),
    }
}

fn int_field(obj: &Map<String, Value>, field: &str, errors: &mut ValidationError) -> Option<i64> {
    let value = present(obj, field, errors)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, INVALID_INT);
    }
    parsed
}

fn datetime_field(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationError,
) -> Option<DateTime<Utc>> {
    let value = present(obj, field, errors)?;
    let parsed = value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));
    if parsed.is_none() {
        errors.add(field, INVALID_DATETIME);
    }
    parsed
}

fn string_field(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationError,
) -> Option<String> {
    let value = present(obj, field, errors)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(field, INVALID_STRING);
            return None;
        }
    };
    if text.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    Some(text)
}

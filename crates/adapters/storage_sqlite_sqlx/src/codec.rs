//! Column encoding helpers shared by the repository.
//!
//! Enums are stored as their serde name (`"male_only"`, `"shift_admin"`),
//! identifiers as hyphenated UUIDs and calendar values as ISO-8601 text.

use std::error::Error;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StorageError;

pub(crate) fn encode_enum<T: Serialize>(value: &T) -> Result<String, StorageError> {
    match serde_json::to_value(value)? {
        Value::String(name) => Ok(name),
        other => Ok(other.to_string()),
    }
}

pub(crate) fn decode_enum<T: DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_value(Value::String(raw.to_owned()))
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

/// Parse a text column through the type's [`FromStr`] implementation.
pub(crate) fn parse_column<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    T::from_str(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub(crate) fn parse_optional<T>(raw: Option<String>) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    raw.as_deref().map(parse_column).transpose()
}

//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of identifiers (chat, message, listener).
pub const MAX_ID_LENGTH: usize = 100;

/// Maximum length of chat titles and message texts, in characters.
pub const MAX_TEXT_LENGTH: usize = 255;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $empty:ident, $too_long:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(id: String) -> Result<Self, ValueObjectError> {
                if id.is_empty() {
                    return Err(ValueObjectError::$empty);
                }
                let len = id.len();
                if len > MAX_ID_LENGTH {
                    return Err(ValueObjectError::$too_long {
                        max: MAX_ID_LENGTH,
                        actual: len,
                    });
                }
                Ok(Self(id))
            }

            /// Get the inner string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert to owned String.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Chat identifier value object ("oid" on the wire).
    ChatId,
    ChatIdEmpty,
    ChatIdTooLong
);

string_id!(
    /// Message identifier value object.
    MessageId,
    MessageIdEmpty,
    MessageIdTooLong
);

string_id!(
    /// Identifier of an external listener attached to a chat (e.g. a Telegram chat id).
    ListenerId,
    ListenerIdEmpty,
    ListenerIdTooLong
);

/// Domain event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_text(
    value: &str,
    empty: ValueObjectError,
    too_long: fn(usize) -> ValueObjectError,
) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(empty);
    }
    let len = value.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(too_long(len));
    }
    Ok(())
}

/// Chat title value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Title(String);

impl Title {
    /// Create a new Title.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank or longer than 255 characters.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_text(&value, ValueObjectError::TitleEmpty, |actual| {
            ValueObjectError::TitleTooLong {
                max: MAX_TEXT_LENGTH,
                actual,
            }
        })?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Title {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message text value object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text(String);

impl Text {
    /// Create a new Text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is blank or longer than 255 characters.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_text(&value, ValueObjectError::TextEmpty, |actual| {
            ValueObjectError::TextTooLong {
                max: MAX_TEXT_LENGTH,
                actual,
            }
        })?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Text {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Current time.
    pub fn now() -> Self {
        Self(hibiki_shared::time::get_jst_timestamp())
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

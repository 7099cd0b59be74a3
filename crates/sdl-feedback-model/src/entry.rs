// SPDX-License-Identifier: Apache-2.0

use crate::ordering::parse_timestamp;
use crate::page::PageKey;
use crate::serde_helpers::null_as_empty;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const ANONYMOUS_NAME: &str = "anonymous";
pub const NAME_MAX_CHARS: usize = 40;
pub const MESSAGE_MAX_CHARS: usize = 1000;
pub const SOURCE_AGENT_MAX_CHARS: usize = 120;

/// Client-generated entry identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::try_from(input.to_string())
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntryId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ValidationError("entry id must not be empty".to_string()));
        }
        Ok(Self(value))
    }
}

impl From<EntryId> for String {
    fn from(value: EntryId) -> Self {
        value.0
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One feedback record. The JSON shape is shared by local storage and the
/// remote table, so `source_agent` travels as `ua`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub page: PageKey,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(rename = "ua", default, deserialize_with = "null_as_empty")]
    pub source_agent: String,
}

impl Entry {
    /// Builds a fresh entry from user input. Only an empty message is an error;
    /// the name falls back to [`ANONYMOUS_NAME`] and over-long text is capped.
    pub fn compose(
        page: PageKey,
        name: &str,
        message: &str,
        source_agent: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let message = normalize_message(message)?;
        Ok(Self {
            id: EntryId::generate(),
            page,
            name: normalize_name(name),
            message,
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            source_agent: truncate_chars(source_agent, SOURCE_AGENT_MAX_CHARS),
        })
    }

    /// Name to render; rows written by other clients may leave it blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            ANONYMOUS_NAME
        } else {
            &self.name
        }
    }

    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

pub fn normalize_message(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError("message must not be empty".to_string()));
    }
    Ok(truncate_chars(trimmed, MESSAGE_MAX_CHARS))
}

#[must_use]
pub fn normalize_name(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ANONYMOUS_NAME.to_string();
    }
    truncate_chars(trimmed, NAME_MAX_CHARS)
}

#[must_use]
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => input[..cut].to_string(),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0)
            .single()
            .expect("valid instant")
    }

    fn page(raw: &str) -> PageKey {
        PageKey::parse(raw).expect("page")
    }

    #[test]
    fn compose_rejects_blank_message() {
        let err = Entry::compose(page("day2"), "Al", "   \n", "agent", now())
            .expect_err("blank message must be rejected");
        assert_eq!(err.0, "message must not be empty");
    }

    #[test]
    fn compose_defaults_blank_name_to_anonymous() {
        let entry = Entry::compose(page("day1"), "  ", "hi", "agent", now()).expect("entry");
        assert_eq!(entry.name, ANONYMOUS_NAME);
    }

    #[test]
    fn compose_formats_timestamp_like_iso_string() {
        let entry = Entry::compose(page("day1"), "Al", "hi", "agent", now()).expect("entry");
        assert_eq!(entry.created_at, "2026-03-01T12:30:00.000Z");
        assert_eq!(entry.created_at_utc(), Some(now()));
    }

    #[test]
    fn compose_caps_field_lengths() {
        let long_name = "n".repeat(NAME_MAX_CHARS + 5);
        let long_message = "m".repeat(MESSAGE_MAX_CHARS + 5);
        let long_agent = "a".repeat(SOURCE_AGENT_MAX_CHARS * 2);
        let entry = Entry::compose(page("day1"), &long_name, &long_message, &long_agent, now())
            .expect("entry");
        assert_eq!(entry.name.chars().count(), NAME_MAX_CHARS);
        assert_eq!(entry.message.chars().count(), MESSAGE_MAX_CHARS);
        assert_eq!(entry.source_agent.chars().count(), SOURCE_AGENT_MAX_CHARS);
    }

    #[test]
    fn compose_generates_distinct_ids() {
        let a = Entry::compose(page("day1"), "", "one", "", now()).expect("a");
        let b = Entry::compose(page("day1"), "", "one", "", now()).expect("b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ok", 10), "ok");
    }

    #[test]
    fn entry_id_rejects_whitespace_only() {
        assert!(EntryId::parse(" ").is_err());
        assert_eq!(EntryId::parse(" "), EntryId::try_from(" ".to_string()));
        assert_eq!(EntryId::parse("a").expect("id").as_str(), "a");
    }
}

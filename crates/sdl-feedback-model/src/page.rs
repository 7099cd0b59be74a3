// SPDX-License-Identifier: Apache-2.0

use crate::entry::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const PAGE_MAX_LEN: usize = 256;
pub const DEFAULT_PAGE: &str = "index";

/// Partition key of the entry collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageKey(String);

impl PageKey {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("page must not be empty".to_string()));
        }
        if s.len() > PAGE_MAX_LEN {
            return Err(ValidationError(format!(
                "page exceeds max length {PAGE_MAX_LEN}"
            )));
        }
        if s.chars().any(char::is_control) {
            return Err(ValidationError(
                "page must not contain control characters".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Derives the page from a document path: last segment without `.html`,
    /// falling back to `index`.
    #[must_use]
    pub fn from_document_path(path: &str) -> Self {
        let last = path.rsplit('/').next().unwrap_or_default();
        let stem = last.strip_suffix(".html").unwrap_or(last);
        Self::parse(stem).unwrap_or_else(|_| Self(DEFAULT_PAGE.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PageKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PageKey> for String {
    fn from(value: PageKey) -> Self {
        value.0
    }
}

impl Display for PageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Channel name - validated path segment

use std::fmt;

use serde::Serialize;

use crate::error::DomainError;

/// A validated channel name
///
/// 1-20 characters from `[A-Za-z0-9_-]`. Names are path segments (`a/b/c`),
/// so separators and other punctuation are rejected. Sibling uniqueness is
/// compared ASCII case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    pub const MAX_LEN: usize = 20;

    /// Validate and wrap a channel name
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() || raw.len() > Self::MAX_LEN {
            return Err(DomainError::ArgumentInvalid(format!(
                "channel name must be 1-{} characters",
                Self::MAX_LEN
            )));
        }
        if let Some(bad) = raw.chars().find(|c| !Self::is_allowed(*c)) {
            return Err(DomainError::ArgumentInvalid(format!(
                "channel name contains invalid character {bad:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    #[inline]
    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

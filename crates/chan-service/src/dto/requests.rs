//! Request DTOs
//!
//! Request DTOs implement `Deserialize` and `Validate` for input validation.
//! Snowflake IDs arrive as strings for JavaScript compatibility.

use chan_core::{DomainError, Snowflake};
use serde::Deserialize;
use validator::Validate;

/// Create channel request
///
/// `private` selects the private constructor; `parent_id` and `members` are
/// then respectively ignored and used as the initial member list.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChannelRequest {
    #[validate(length(min = 1, max = 20, message = "Channel name must be 1-20 characters"))]
    pub name: String,

    /// Parent channel ID (Snowflake as string); absent for a top-level channel
    pub parent_id: Option<String>,

    #[serde(default)]
    pub private: bool,

    /// Initial members of a private channel (Snowflakes as strings)
    #[serde(default)]
    #[validate(length(max = 1000, message = "At most 1000 initial members"))]
    pub members: Vec<String>,
}

impl CreateChannelRequest {
    /// Parsed parent; `None` for a top-level channel
    pub fn parent(&self) -> Result<Option<Snowflake>, DomainError> {
        self.parent_id
            .as_deref()
            .map(|raw| parse_id(raw, "parent_id"))
            .transpose()
            .map(|parent| parent.and_then(Snowflake::non_zero))
    }

    pub fn member_ids(&self) -> Result<Vec<Snowflake>, DomainError> {
        self.members
            .iter()
            .map(|raw| parse_id(raw, "members"))
            .collect()
    }
}

fn parse_id(raw: &str, field: &str) -> Result<Snowflake, DomainError> {
    Snowflake::parse(raw)
        .map_err(|_| DomainError::ArgumentInvalid(format!("{field}: invalid snowflake {raw:?}")))
}

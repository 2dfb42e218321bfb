use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat message as it travels on the channel and sits in the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub text: String,
    pub user: String,
    /// Display-formatted wall-clock time. Not sortable.
    pub timestamp: String,
    #[serde(default)]
    pub avatar_color: String,
}

/// Outbound `send-message` payload: the message fields plus the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Creation time in unix milliseconds.
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub submitted_by: String,
    #[serde(default)]
    pub color: String,
}

/// Uncommitted form state for a new assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentDraft {
    pub title: String,
    pub description: String,
    /// Raw `YYYY-MM-DD` text, empty when no due date is set.
    pub due_date: String,
}

impl AssignmentDraft {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.due_date.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySessionRequest {
    pub host: String,
    pub topic: String,
    /// Minutes.
    pub duration: u32,
}

/// Who this client speaks as. Configured, not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub display_name: String,
    pub avatar_color: String,
    pub session_id: Uuid,
}

impl LocalIdentity {
    pub fn new(display_name: impl Into<String>, avatar_color: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            avatar_color: avatar_color.into(),
            session_id: Uuid::new_v4(),
        }
    }
}

/// `createdAt` is written the way browsers print `Date.toISOString()`.
mod iso_millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Absent due dates are `""` on the wire; `null` is accepted too.
mod due_date {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

pub use due_date::FORMAT as DUE_DATE_FORMAT;

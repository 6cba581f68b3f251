//! Event types and structures.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{EventError, EventResult};

/// Kind of post mutation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A post was created.
    PostCreated,
    /// A post was edited.
    PostUpdated,
    /// A post was removed.
    PostDeleted,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 3] = [
        EventKind::PostCreated,
        EventKind::PostUpdated,
        EventKind::PostDeleted,
    ];

    /// Returns the wire name (e.g. `POST_CREATED`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PostCreated => "POST_CREATED",
            EventKind::PostUpdated => "POST_UPDATED",
            EventKind::PostDeleted => "POST_DELETED",
        }
    }

    /// Returns the human-readable label shown in chat notifications.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::PostCreated => "새 게시글 작성",
            EventKind::PostUpdated => "게시글 수정",
            EventKind::PostDeleted => "게시글 삭제",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EventError::UnknownEventKind(s.to_string()))
    }
}

/// A post lifecycle event.
///
/// Serializes to the provider-agnostic wire shape
/// `{ "event": ..., "timestamp": ..., "data": { "postId": ..., ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEvent {
    /// What happened.
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// When the mutation was committed.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Event data; always carries `postId`.
    pub data: Map<String, Value>,
}

impl PostEvent {
    /// Creates an event stamped with the current time.
    pub fn new(kind: EventKind, data: Map<String, Value>) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            data,
        }
    }

    /// Starts building an event for the given post.
    pub fn builder(kind: EventKind, post_id: impl Into<String>) -> PostEventBuilder {
        PostEventBuilder::new(kind, post_id)
    }

    /// Overrides the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the timestamp as ISO-8601 with millisecond precision.
    pub fn timestamp_string(&self) -> String {
        format_timestamp(&self.timestamp)
    }

    /// Returns the post id, rendering numeric ids as strings.
    pub fn post_id(&self) -> Option<String> {
        match self.data.get("postId")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Returns the post title, if present and not blank.
    pub fn title(&self) -> Option<&str> {
        self.text_field("title")
    }

    /// Returns the post body, if present and not blank.
    pub fn content(&self) -> Option<&str> {
        self.text_field("content")
    }

    fn text_field(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Checks the event carries a usable `postId`.
    pub fn validate(&self) -> EventResult<()> {
        match self.post_id() {
            Some(id) if !id.is_empty() => Ok(()),
            _ => Err(EventError::InvalidInput(
                "event data must contain a postId".to_string(),
            )),
        }
    }
}

/// Formats a timestamp the way it appears on the wire (`2025-12-04T12:00:00.000Z`).
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Builder for [`PostEvent`].
pub struct PostEventBuilder {
    kind: EventKind,
    timestamp: Option<DateTime<Utc>>,
    data: Map<String, Value>,
}

impl PostEventBuilder {
    /// Creates a builder for the given post.
    pub fn new(kind: EventKind, post_id: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("postId".to_string(), Value::String(post_id.into()));
        Self {
            kind,
            timestamp: None,
            data,
        }
    }

    /// Sets the post title.
    pub fn title(self, title: impl Into<String>) -> Self {
        self.field("title", title.into())
    }

    /// Sets the post body.
    pub fn content(self, content: impl Into<String>) -> Self {
        self.field("content", content.into())
    }

    /// Sets the author.
    pub fn author_id(self, author_id: impl Into<String>) -> Self {
        self.field("authorId", author_id.into())
    }

    /// Sets the category.
    pub fn category_id(self, category_id: impl Into<String>) -> Self {
        self.field("categoryId", category_id.into())
    }

    /// Sets the tag list.
    pub fn tags(self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let tags: Vec<Value> = tags.into_iter().map(|t| Value::String(t.into())).collect();
        self.field("tags", tags)
    }

    /// Lists the fields touched by an update.
    pub fn updated_fields(self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let fields: Vec<Value> = fields
            .into_iter()
            .map(|f| Value::String(f.into()))
            .collect();
        self.field("updatedFields", fields)
    }

    /// Sets an arbitrary data field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Pins the timestamp instead of using the build time.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Builds the event.
    pub fn build(self) -> PostEvent {
        PostEvent {
            kind: self.kind,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            data: self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(EventKind::PostCreated.as_str(), "POST_CREATED");
        assert_eq!(
            serde_json::to_value(EventKind::PostDeleted).unwrap(),
            serde_json::json!("POST_DELETED")
        );
        assert_eq!("POST_UPDATED".parse::<EventKind>().unwrap(), EventKind::PostUpdated);
        assert!("COMMENT_CREATED".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(EventKind::PostCreated.label(), "새 게시글 작성");
        assert_eq!(EventKind::PostUpdated.label(), "게시글 수정");
        assert_eq!(EventKind::PostDeleted.label(), "게시글 삭제");
    }

    #[test]
    fn test_generic_wire_shape() {
        let event = PostEvent::builder(EventKind::PostCreated, "p1")
            .title("Hello")
            .tags(["rust", "async"])
            .timestamp(fixed_time())
            .build();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "POST_CREATED");
        assert_eq!(json["timestamp"], "2025-12-04T12:00:00.000Z");
        assert_eq!(json["data"]["postId"], "p1");
        assert_eq!(json["data"]["tags"], serde_json::json!(["rust", "async"]));
    }

    #[test]
    fn test_parse_wire_payload() {
        let raw = r#"{
            "event": "POST_UPDATED",
            "timestamp": "2025-12-04T12:00:00.000Z",
            "data": {"postId": 42, "updatedFields": ["title"]}
        }"#;

        let event: PostEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind, EventKind::PostUpdated);
        assert_eq!(event.timestamp, fixed_time());
        assert_eq!(event.post_id().as_deref(), Some("42"));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_post_id() {
        let event = PostEvent::new(EventKind::PostDeleted, Map::new());
        assert!(matches!(event.validate(), Err(EventError::InvalidInput(_))));
    }

    #[test]
    fn test_blank_text_fields_read_as_absent() {
        let event = PostEvent::builder(EventKind::PostUpdated, "p1")
            .title("")
            .content(" \n")
            .build();
        assert_eq!(event.title(), None);
        assert_eq!(event.content(), None);

        // The wire payload keeps them untouched.
        assert_eq!(event.data["title"], "");
    }
}

//! Provider-specific payload shapes.
//!
//! Every delivery starts from the canonical [`PostEvent`]. Generic
//! subscribers get it verbatim; Discord and Slack get a chat message built
//! from the post id, title and a short content preview.

use serde_json::{Map, Value, json};

use agora_events::{EventKind, PostEvent};

use crate::error::{WebhookError, WebhookResult};
use crate::subscription::SubscriptionType;

/// Maximum number of characters of post content shown in previews.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Glyph prefixed to Discord embed titles.
pub const TITLE_GLYPH: &str = "📢";

/// Footer text on Discord embeds.
pub const FOOTER_TEXT: &str = "Agora Forum";

/// Embed color for created posts (green).
pub const COLOR_CREATED: u32 = 0x57F287;
/// Embed color for updated posts (blue).
pub const COLOR_UPDATED: u32 = 0x3498DB;
/// Embed color for deleted posts (red).
pub const COLOR_DELETED: u32 = 0xED4245;

const PREVIEW_FIELD_NAME: &str = "내용";
const POST_ID_FIELD_NAME: &str = "게시글 ID";

/// Builds the JSON body for a subscription of the given type.
pub fn transform(event: &PostEvent, subscription_type: SubscriptionType) -> WebhookResult<Value> {
    let post_id = event
        .post_id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| WebhookError::InvalidPayload("event data has no postId".to_string()))?;

    match subscription_type {
        SubscriptionType::Generic => Ok(serde_json::to_value(event)?),
        SubscriptionType::Discord => Ok(discord_payload(event, &post_id)),
        SubscriptionType::Slack => Ok(slack_payload(event, &post_id)),
    }
}

/// Returns the embed color for an event kind.
pub fn embed_color(kind: EventKind) -> u32 {
    match kind {
        EventKind::PostCreated => COLOR_CREATED,
        EventKind::PostUpdated => COLOR_UPDATED,
        EventKind::PostDeleted => COLOR_DELETED,
    }
}

/// Truncates post content to [`PREVIEW_MAX_CHARS`] characters, appending `...` when cut.
pub fn content_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_MAX_CHARS {
        return content.to_string();
    }
    let mut preview: String = content.chars().take(PREVIEW_MAX_CHARS).collect();
    preview.push_str("...");
    preview
}

fn discord_payload(event: &PostEvent, post_id: &str) -> Value {
    let mut fields = Vec::new();
    if let Some(content) = event.content() {
        fields.push(json!({
            "name": PREVIEW_FIELD_NAME,
            "value": content_preview(content),
            "inline": false,
        }));
    }
    fields.push(json!({
        "name": POST_ID_FIELD_NAME,
        "value": post_id,
        "inline": true,
    }));

    let mut embed = Map::new();
    embed.insert(
        "title".to_string(),
        Value::String(format!("{} {}", TITLE_GLYPH, event.kind.label())),
    );
    if let Some(title) = event.title() {
        embed.insert("description".to_string(), Value::String(format!("**{title}**")));
    }
    embed.insert("fields".to_string(), Value::Array(fields));
    embed.insert("color".to_string(), json!(embed_color(event.kind)));
    embed.insert("footer".to_string(), json!({ "text": FOOTER_TEXT }));
    embed.insert("timestamp".to_string(), Value::String(event.timestamp_string()));

    json!({ "embeds": [Value::Object(embed)] })
}

fn slack_payload(event: &PostEvent, post_id: &str) -> Value {
    let mut blocks = vec![json!({
        "type": "header",
        "text": {
            "type": "plain_text",
            "text": event.kind.label(),
            "emoji": true,
        },
    })];

    if let Some(title) = event.title() {
        blocks.push(mrkdwn_section(format!("*{title}*")));
    }
    if let Some(content) = event.content() {
        blocks.push(mrkdwn_section(content_preview(content)));
    }

    blocks.push(json!({
        "type": "context",
        "elements": [
            { "type": "mrkdwn", "text": format!("{POST_ID_FIELD_NAME}: {post_id}") },
        ],
    }));

    json!({ "blocks": blocks })
}

fn mrkdwn_section(text: String) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_event(kind: EventKind) -> PostEvent {
        PostEvent::builder(kind, "p1")
            .title("Hello")
            .content("a".repeat(250))
            .timestamp(Utc.with_ymd_and_hms(2025, 12, 4, 12, 0, 0).unwrap())
            .build()
    }

    #[test]
    fn test_generic_is_passthrough() {
        let event = sample_event(EventKind::PostUpdated);
        let payload = transform(&event, SubscriptionType::Generic).unwrap();

        assert_eq!(payload, serde_json::to_value(&event).unwrap());
        assert_eq!(payload["event"], "POST_UPDATED");
        assert_eq!(payload["timestamp"], "2025-12-04T12:00:00.000Z");
    }

    #[test]
    fn test_discord_embed_for_created_post() {
        let event = sample_event(EventKind::PostCreated);
        let payload = transform(&event, SubscriptionType::Discord).unwrap();
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "📢 새 게시글 작성");
        assert_eq!(embed["description"], "**Hello**");
        assert_eq!(embed["color"], COLOR_CREATED);
        assert_eq!(embed["footer"]["text"], FOOTER_TEXT);
        assert_eq!(embed["timestamp"], "2025-12-04T12:00:00.000Z");

        let preview = embed["fields"][0]["value"].as_str().unwrap();
        assert!(preview.chars().count() <= 203);
        assert!(preview.ends_with("..."));
        assert_eq!(embed["fields"][1]["value"], "p1");
    }

    #[test]
    fn test_discord_colors_by_kind() {
        for (kind, color) in [
            (EventKind::PostCreated, COLOR_CREATED),
            (EventKind::PostUpdated, COLOR_UPDATED),
            (EventKind::PostDeleted, COLOR_DELETED),
        ] {
            let payload = transform(&sample_event(kind), SubscriptionType::Discord).unwrap();
            assert_eq!(payload["embeds"][0]["color"], color);
        }
    }

    #[test]
    fn test_discord_omits_missing_title_and_content() {
        let event = PostEvent::builder(EventKind::PostDeleted, "p2").build();
        let payload = transform(&event, SubscriptionType::Discord).unwrap();
        let embed = &payload["embeds"][0];

        assert!(embed.get("description").is_none());
        assert_eq!(embed["fields"].as_array().unwrap().len(), 1);
        assert_eq!(embed["fields"][0]["name"], POST_ID_FIELD_NAME);
    }

    #[test]
    fn test_slack_block_order() {
        let event = sample_event(EventKind::PostDeleted);
        let payload = transform(&event, SubscriptionType::Slack).unwrap();
        let blocks = payload["blocks"].as_array().unwrap();

        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0]["type"], "header");
        assert_eq!(blocks[0]["text"]["text"], "게시글 삭제");
        assert_eq!(blocks[1]["text"]["text"], "*Hello*");
        assert!(blocks[2]["text"]["text"].as_str().unwrap().ends_with("..."));
        assert_eq!(blocks[3]["type"], "context");
        assert_eq!(blocks[3]["elements"][0]["text"], "게시글 ID: p1");
    }

    #[test]
    fn test_slack_without_title_or_content() {
        let event = PostEvent::builder(EventKind::PostCreated, "p3").build();
        let payload = transform(&event, SubscriptionType::Slack).unwrap();
        let blocks = payload["blocks"].as_array().unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["type"], "context");
    }

    #[test]
    fn test_blank_title_and_content_are_omitted() {
        let event = PostEvent::builder(EventKind::PostUpdated, "p1")
            .title("")
            .content("  ")
            .build();

        let discord = transform(&event, SubscriptionType::Discord).unwrap();
        let embed = &discord["embeds"][0];
        assert!(embed.get("description").is_none());
        assert_eq!(embed["fields"].as_array().unwrap().len(), 1);
        assert_eq!(embed["fields"][0]["value"], "p1");

        let slack = transform(&event, SubscriptionType::Slack).unwrap();
        let blocks = slack["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "header");
        assert_eq!(blocks[1]["type"], "context");
    }

    #[test]
    fn test_blank_title_with_content() {
        let event = PostEvent::builder(EventKind::PostUpdated, "p1")
            .title("")
            .content("본문")
            .build();

        let discord = transform(&event, SubscriptionType::Discord).unwrap();
        let embed = &discord["embeds"][0];
        assert!(embed.get("description").is_none());
        assert_eq!(embed["fields"][0]["value"], "본문");

        let slack = transform(&event, SubscriptionType::Slack).unwrap();
        let blocks = slack["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1]["text"]["text"], "본문");
    }

    #[test]
    fn test_preview_counts_characters() {
        let short = "짧은 글";
        assert_eq!(content_preview(short), short);

        let exact = "가".repeat(PREVIEW_MAX_CHARS);
        assert_eq!(content_preview(&exact), exact);

        let long = "가".repeat(PREVIEW_MAX_CHARS + 1);
        let preview = content_preview(&long);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
    }

    #[test]
    fn test_missing_post_id_is_rejected() {
        let event = PostEvent::new(EventKind::PostCreated, Map::new());
        for ty in [SubscriptionType::Generic, SubscriptionType::Discord, SubscriptionType::Slack] {
            assert!(matches!(transform(&event, ty), Err(WebhookError::InvalidPayload(_))));
        }
    }
}

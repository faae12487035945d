use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::ReplySink;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Originating chat platform of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// OneBot-style platform: exposes the raw message-query API used to
    /// resolve images out of quoted messages.
    OneBot,
    Other(String),
}

impl Platform {
    /// Whether quoted messages can be resolved via a secondary lookup.
    pub fn supports_quote_lookup(&self) -> bool {
        matches!(self, Platform::OneBot)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::OneBot => write!(f, "onebot"),
            Platform::Other(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Context key
// ---------------------------------------------------------------------------

/// Identifies the conversation a message belongs to. Acquisition sessions
/// are keyed by this: one waiter per (channel, sender) at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub channel: String,
    pub sender_id: String,
}

impl ContextKey {
    pub fn new(channel: impl Into<String>, sender_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            sender_id: sender_id.into(),
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.sender_id)
    }
}

// ---------------------------------------------------------------------------
// Message segments
// ---------------------------------------------------------------------------

/// One segment of an inbound message, in the tagged `{type, data}` wire shape.
///
/// Platforms are inconsistent about where the interesting field lives (a
/// direct attribute on the segment vs. a key in the generic `data` map), so
/// every variant keeps both and exposes a normalized accessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageSegment {
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default)]
        data: HashMap<String, Value>,
    },
    /// A quote of a prior message, carrying its platform message id.
    Reply {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        data: HashMap<String, Value>,
    },
    Text {
        #[serde(default)]
        data: HashMap<String, Value>,
    },
    #[serde(other)]
    Unknown,
}

impl MessageSegment {
    pub fn text(content: impl Into<String>) -> Self {
        let mut data = HashMap::new();
        data.insert("text".to_string(), Value::String(content.into()));
        MessageSegment::Text { data }
    }

    pub fn image(url: impl Into<String>) -> Self {
        MessageSegment::Image {
            url: Some(url.into()),
            data: HashMap::new(),
        }
    }

    pub fn reply(id: impl Into<String>) -> Self {
        MessageSegment::Reply {
            id: Some(id.into()),
            data: HashMap::new(),
        }
    }

    /// Fetchable URL of an image segment, wherever the platform put it.
    pub fn image_url(&self) -> Option<&str> {
        let MessageSegment::Image { url, data } = self else {
            return None;
        };
        if let Some(u) = url.as_deref().filter(|u| !u.is_empty()) {
            return Some(u);
        }
        data.get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
    }

    /// Referenced message id of a quote segment. Platforms send both string
    /// and numeric ids; both normalize to a string.
    pub fn reply_id(&self) -> Option<String> {
        let MessageSegment::Reply { id, data } = self else {
            return None;
        };
        if let Some(i) = id.as_deref().filter(|i| !i.is_empty()) {
            return Some(i.to_string());
        }
        match data.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Plain text content of a text segment.
    pub fn plain_text(&self) -> Option<&str> {
        let MessageSegment::Text { data } = self else {
            return None;
        };
        data.get("text").and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Image reference
// ---------------------------------------------------------------------------

/// A resolved, fetchable image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Message event
// ---------------------------------------------------------------------------

/// One inbound chat message, owned by the host framework and handed to the
/// bot for the duration of handling. Never mutated.
#[derive(Clone)]
pub struct MessageEvent {
    pub platform: Platform,
    pub context: ContextKey,
    pub segments: Vec<MessageSegment>,
    reply: Arc<dyn ReplySink>,
}

impl MessageEvent {
    pub fn new(
        platform: Platform,
        context: ContextKey,
        segments: Vec<MessageSegment>,
        reply: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            platform,
            context,
            segments,
            reply,
        }
    }

    /// Send a text reply into the originating conversation.
    pub async fn reply(&self, text: &str) -> Result<()> {
        self.reply.send(text).await
    }

    /// Content of the first text segment, if any.
    pub fn plain_text(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| s.plain_text())
    }
}

impl fmt::Debug for MessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageEvent")
            .field("platform", &self.platform)
            .field("context", &self.context)
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_prefers_direct_field() {
        let mut data = HashMap::new();
        data.insert("url".to_string(), Value::String("http://from-map".into()));
        let seg = MessageSegment::Image {
            url: Some("http://direct".into()),
            data,
        };
        assert_eq!(seg.image_url(), Some("http://direct"));
    }

    #[test]
    fn image_url_falls_back_to_data_map() {
        let raw = r#"{"type": "image", "data": {"url": "http://x/y.png"}}"#;
        let seg: MessageSegment = serde_json::from_str(raw).unwrap();
        assert_eq!(seg.image_url(), Some("http://x/y.png"));
    }

    #[test]
    fn empty_url_is_not_an_image_ref() {
        let seg = MessageSegment::Image {
            url: Some(String::new()),
            data: HashMap::new(),
        };
        assert_eq!(seg.image_url(), None);
    }

    #[test]
    fn reply_id_accepts_numeric_wire_ids() {
        let raw = r#"{"type": "reply", "data": {"id": 42}}"#;
        let seg: MessageSegment = serde_json::from_str(raw).unwrap();
        assert_eq!(seg.reply_id(), Some("42".to_string()));
    }

    #[test]
    fn unknown_segment_types_deserialize() {
        let raw = r#"[{"type": "face", "data": {"id": "1"}}, {"type": "text", "data": {"text": "hi"}}]"#;
        let segs: Vec<MessageSegment> = serde_json::from_str(raw).unwrap();
        assert!(matches!(segs[0], MessageSegment::Unknown));
        assert_eq!(segs[1].plain_text(), Some("hi"));
    }
}

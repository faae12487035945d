//! Image location: resolve a fetchable URL out of a message's segments,
//! falling back to a secondary lookup for quoted messages.

use imagetrace_core::{ImageRef, MessageEvent, MessageLookup, MessageSegment};
use serde_json::Value;
use tracing::warn;

/// Resolve an image URL from `event`.
///
/// Scans segments in order and returns the first image with a non-empty
/// URL. If none and `resolve_quotes` is set, a quote segment on a
/// quote-capable platform triggers a secondary `get_message` lookup.
/// Lookup failures of any kind are logged and yield `None`; they never
/// propagate to the caller.
pub async fn locate(
    event: &MessageEvent,
    lookup: &dyn MessageLookup,
    resolve_quotes: bool,
) -> Option<ImageRef> {
    if let Some(image) = direct_image(&event.segments) {
        return Some(image);
    }

    if !resolve_quotes || !event.platform.supports_quote_lookup() {
        return None;
    }

    let reply_id = event.segments.iter().find_map(MessageSegment::reply_id)?;

    match quoted_image(lookup, &reply_id).await {
        Ok(found) => found,
        Err(e) => {
            warn!("[Locator] quoted-message lookup for id {reply_id} failed: {e:#}");
            None
        }
    }
}

/// First image segment with a usable URL, in message order.
fn direct_image(segments: &[MessageSegment]) -> Option<ImageRef> {
    segments
        .iter()
        .find_map(|s| s.image_url().map(ImageRef::new))
}

/// Scan a referenced message's raw body for an image segment.
///
/// Only the list-shaped `{"message": [{type, data: {url}}, ...]}` form is
/// handled; anything else yields `None`.
async fn quoted_image(
    lookup: &dyn MessageLookup,
    message_id: &str,
) -> anyhow::Result<Option<ImageRef>> {
    let raw = lookup.get_message(message_id).await?;

    let Some(segments) = raw.get("message").and_then(Value::as_array) else {
        warn!("[Locator] referenced message {message_id} has no segment list");
        return Ok(None);
    };

    for segment in segments {
        if segment.get("type").and_then(Value::as_str) != Some("image") {
            continue;
        }
        let url = segment
            .pointer("/data/url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty());
        if let Some(url) = url {
            return Ok(Some(ImageRef::new(url)));
        }
    }

    warn!("[Locator] referenced message {message_id} contains no image segment");
    Ok(None)
}

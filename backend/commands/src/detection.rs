//! Trigger detection: identify /commands in inbound messages.

use imagetrace_core::MessageEvent;

use crate::registry::{CommandDef, CommandRegistry};

/// Detect a recognition trigger in the event's text.
///
/// The first whitespace-delimited token of the first text segment must be
/// a known slash alias; anything else is a normal message.
pub fn detect_command<'r>(
    event: &MessageEvent,
    registry: &'r CommandRegistry,
) -> Option<&'r CommandDef> {
    let text = event.plain_text()?;
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let alias = trimmed.split_whitespace().next()?;
    registry.find_by_alias(alias)
}

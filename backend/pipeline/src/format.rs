//! Reply formatting: turn a recognition result into a bounded,
//! human-readable summary. Pure; fully determined by its inputs.

use imagetrace_core::{ModelSelector, RecognitionResult};

/// Reply when the service returned no detections at all.
pub const NO_MATCH: &str = "🔍 No matching results found";

/// Reply when the first detection carries no character matches.
pub const NO_CHARACTER: &str = "🔍 No recognizable character in this image";

/// At most this many matches are listed.
pub const MAX_LISTED_MATCHES: usize = 5;

const FOOTER: &str = "Data source: AnimeTrace, results are for reference only";

/// Render `result` as reply text.
///
/// Only the first detection is consulted; matches keep the service's order,
/// which is authoritative. More than [`MAX_LISTED_MATCHES`] matches get a
/// truncation notice stating the total.
pub fn format_response(result: &RecognitionResult, model: ModelSelector) -> String {
    let Some(first) = result.detections.first() else {
        return NO_MATCH.to_string();
    };
    if first.characters.is_empty() {
        return NO_CHARACTER.to_string();
    }

    let ai_flag = if result.ai_generated {
        "🤖 AI generated"
    } else {
        "NO AI"
    };

    let mut lines = vec![
        format!("**{} {} result** | {}", model.icon(), model.label(), ai_flag),
        "------------------------".to_string(),
    ];

    for (i, m) in first.characters.iter().take(MAX_LISTED_MATCHES).enumerate() {
        let name = if m.name.is_empty() { "unknown" } else { &m.name };
        let work = if m.work.is_empty() { "unknown" } else { &m.work };
        lines.push(format!("{}. **{}** - 《{}》", i + 1, name, work));
    }

    let total = first.characters.len();
    if total > MAX_LISTED_MATCHES {
        lines.push(format!(
            "\n> {total} results found, showing the first {MAX_LISTED_MATCHES}"
        ));
    }

    lines.push(format!("\n{FOOTER}"));
    lines.join("\n")
}

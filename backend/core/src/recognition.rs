use serde::Deserialize;

// ---------------------------------------------------------------------------
// Model selector
// ---------------------------------------------------------------------------

/// Which recognition profile to request of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSelector {
    Anime,
    Gal,
    Generic,
}

impl ModelSelector {
    /// Opaque model name the service expects for this profile.
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelSelector::Anime => "pre_stable",
            ModelSelector::Gal => "full_game_model_kira",
            ModelSelector::Generic => "animetrace_high_beta",
        }
    }

    /// Status icon used in reply headers.
    pub fn icon(&self) -> &'static str {
        match self {
            ModelSelector::Anime => "📺",
            _ => "🎮",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelSelector::Anime => "Anime",
            ModelSelector::Gal => "Gal",
            ModelSelector::Generic => "Recognition",
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized image payload
// ---------------------------------------------------------------------------

/// Base64 text of a re-encoded, dimension-bounded JPEG, ready for transport.
/// Created per request and discarded after the recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage(String);

impl NormalizedImage {
    pub fn new(base64: String) -> Self {
        Self(base64)
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Recognition result
// ---------------------------------------------------------------------------

/// Structured result of one recognition call.
///
/// The service's schema is not contractually stable, so every field is
/// defaulted: a missing `data` array or `ai` flag parses as empty/false
/// instead of failing the whole call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecognitionResult {
    #[serde(default, rename = "ai")]
    pub ai_generated: bool,
    #[serde(default, rename = "data")]
    pub detections: Vec<Detection>,
}

/// One bounding-box region reported by the service, with its own ranked
/// character matches. This pipeline only consults the first region.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Detection {
    #[serde(default, rename = "character")]
    pub characters: Vec<CharacterMatch>,
}

/// A recognized character/work pair; rank is its position in service order.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterMatch {
    #[serde(default, rename = "character")]
    pub name: String,
    #[serde(default)]
    pub work: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_service_response() {
        let raw = r#"{
            "ai": true,
            "data": [
                {"character": [
                    {"character": "Hatsune Miku", "work": "VOCALOID"},
                    {"character": "Kagamine Rin", "work": "VOCALOID"}
                ]}
            ]
        }"#;
        let result: RecognitionResult = serde_json::from_str(raw).unwrap();
        assert!(result.ai_generated);
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.detections[0].characters[0].name, "Hatsune Miku");
        assert_eq!(result.detections[0].characters[1].work, "VOCALOID");
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let result: RecognitionResult = serde_json::from_str("{}").unwrap();
        assert!(!result.ai_generated);
        assert!(result.detections.is_empty());

        let result: RecognitionResult =
            serde_json::from_str(r#"{"data": [{}]}"#).unwrap();
        assert!(result.detections[0].characters.is_empty());
    }
}

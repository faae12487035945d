//! Trigger command registry.
//!
//! The model-specific triggers are plain configuration over one shared
//! flow; only the unified `/detect` resolves images out of quoted messages.

use imagetrace_core::ModelSelector;

/// A trigger command wired to a recognition profile.
#[derive(Debug, Clone)]
pub struct CommandDef {
    /// Unique key (e.g. "detect").
    pub key: &'static str,
    pub description: &'static str,
    /// Slash aliases (must start with '/').
    pub text_aliases: &'static [&'static str],
    /// Recognition profile this trigger requests.
    pub model: ModelSelector,
    /// Whether the quoted-message lookup path applies.
    pub quote_resolution: bool,
}

pub struct CommandRegistry {
    commands: Vec<CommandDef>,
}

impl CommandRegistry {
    /// The built-in trigger set.
    pub fn builtin() -> Self {
        Self {
            commands: vec![
                CommandDef {
                    key: "detect",
                    description: "Recognize characters in a sent or quoted image",
                    text_aliases: &["/detect", "/sauce"],
                    model: ModelSelector::Generic,
                    quote_resolution: true,
                },
                CommandDef {
                    key: "anime",
                    description: "Recognize anime characters in a sent image",
                    text_aliases: &["/anime"],
                    model: ModelSelector::Anime,
                    quote_resolution: false,
                },
                CommandDef {
                    key: "gal",
                    description: "Recognize gal-game characters in a sent image",
                    text_aliases: &["/gal"],
                    model: ModelSelector::Gal,
                    quote_resolution: false,
                },
            ],
        }
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<&CommandDef> {
        self.commands
            .iter()
            .find(|c| c.text_aliases.contains(&alias))
    }

    pub fn all(&self) -> &[CommandDef] {
        &self.commands
    }
}

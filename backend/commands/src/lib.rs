//! Trigger commands and the bot dispatch surface the host framework drives.

pub mod bot;
pub mod detection;
pub mod registry;

pub use bot::ImageTraceBot;
pub use detection::detect_command;
pub use registry::{CommandDef, CommandRegistry};

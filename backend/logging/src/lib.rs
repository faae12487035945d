//! Structured logging setup for the imagetrace bot.

pub mod logger;

pub use logger::init_logger;

pub mod error;
pub mod event;
pub mod recognition;
pub mod traits;

pub use error::TraceError;
pub use event::{ContextKey, ImageRef, MessageEvent, MessageSegment, Platform};
pub use recognition::{
    CharacterMatch, Detection, ModelSelector, NormalizedImage, RecognitionResult,
};
pub use traits::{MessageLookup, ReplySink};

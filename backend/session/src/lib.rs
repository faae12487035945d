//! Interactive image acquisition: a per-context waiter registry and the
//! timeout-bounded session that prompts for an image when the trigger
//! carried none.

pub mod acquisition;
pub mod waiter;

pub use acquisition::{AcquisitionSession, RecognitionPipeline, SessionOutcome};
pub use waiter::WaiterRegistry;

//! The recognition pipeline: locate an image reference in an inbound
//! message, normalize it for transport, query the recognition service,
//! and format the result.

pub mod format;
pub mod locator;
pub mod normalize;
pub mod recognize;

pub use format::format_response;
pub use locator::locate;
pub use normalize::ImageNormalizer;
pub use recognize::RecognitionClient;

//! Request handler module
//!
//! Routes requests to the page, asset and landing handlers and turns their
//! results into HTTP responses.

pub mod asset;
pub mod landing;
pub mod page;
pub mod router;

// Re-export main entry point
pub use router::handle_request;

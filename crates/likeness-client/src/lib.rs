//! likeness-client — HTTP client for the remote similarity matcher.
//!
//! One stabilized frame goes up as a base64 JPEG data URL; two ranked
//! match lists come back. A "no face detected" response is a
//! distinguished non-error outcome, not a failure.

pub mod client;
pub mod error;
pub mod types;

pub use client::{MatcherClient, MatcherConfig};
pub use error::MatchError;
pub use types::MatchOutcome;

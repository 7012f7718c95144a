//! # Quill Shared
//!
//! Wire types for the Quill API: request bodies, query strings and response
//! envelopes. Serde only, so clients can depend on it without pulling in the
//! server stack.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, FieldErrorResponse};

//! Observability: request IDs on every request span.

mod request_id;

pub use request_id::RequestIdMiddleware;

//! Application services - the use cases exposed over HTTP.
//!
//! Services depend only on the ports, so they run unchanged against the
//! Postgres and in-memory repositories.

mod post_service;
mod stats_service;
mod user_service;
mod view;

pub use post_service::{CommentOutcome, LikeOutcome, PostService};
pub use stats_service::StatsService;
pub use user_service::UserService;
pub use view::PostView;

//! Domain entities - the core business objects.

mod caller;
mod pagination;
mod post;
mod slug;
mod stats;
mod user;
mod validation;

pub use caller::Caller;
pub use pagination::{
    DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT, Page, PageMeta, PageRequest, Paginated,
};
pub use post::{
    Comment, NewComment, NewPost, Post, PostChanges, PostFilter, PostKey, PostSort, PostStatus,
    WORDS_PER_MINUTE, normalize_tags, read_time,
};
pub use slug::slugify;
pub use stats::{PlatformOverview, PlatformStats, RecentPost};
pub use user::{AuthorSummary, NewUser, Role, User, UserChanges, UserProfile};
pub use validation::{validate_featured_image, validate_http_url};

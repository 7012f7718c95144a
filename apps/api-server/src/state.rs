//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{PasswordService, PostRepository, TokenService, UserRepository};
use quill_core::services::{PostService, StatsService, UserService};
use quill_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService,
};

#[cfg(feature = "postgres")]
use quill_infra::{DatabaseConnections, PostgresPostRepository, PostgresUserRepository};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: UserService,
    pub stats: StatsService,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

type Repositories = (Arc<dyn UserRepository>, Arc<dyn PostRepository>);

fn in_memory() -> Repositories {
    (
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryPostRepository::new()),
    )
}

impl AppState {
    /// Build the application state, connecting to Postgres when configured.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (users, posts): Repositories = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => (
                    Arc::new(PostgresUserRepository::new(connections.main.clone())),
                    Arc::new(PostgresPostRepository::new(connections.main)),
                ),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    in_memory()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (users, posts): Repositories = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            in_memory()
        };

        let state = Self::from_repositories(users, posts, config.jwt.clone());
        tracing::info!("Application state initialized");
        state
    }

    /// Wire services over the given repositories.
    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            posts: PostService::new(posts.clone(), users.clone()),
            users: UserService::new(users.clone(), posts.clone()),
            stats: StatsService::new(users, posts),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }
}

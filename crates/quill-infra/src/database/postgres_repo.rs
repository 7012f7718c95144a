//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use quill_core::domain::{Page, PageRequest, Post, PostFilter, PostSort, PostStatus, User};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Build an `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn tag_matches(pattern: String) -> sea_orm::sea_query::SimpleExpr {
    Expr::cust_with_values(
        r#"EXISTS (SELECT 1 FROM jsonb_array_elements_text("posts"."tags") AS tag WHERE tag ILIKE $1)"#,
        [pattern],
    )
}

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

fn to_users(models: Vec<user::Model>) -> Result<Vec<User>, RepoError> {
    models.into_iter().map(User::try_from).collect()
}

fn to_posts(models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
    models.into_iter().map(Post::try_from).collect()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        result.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        result.map(User::try_from).transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        to_users(models)
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, RepoError> {
        let mut query = UserEntity::find();
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = contains_pattern(term);
            query = query.filter(
                Condition::any()
                    .add(Expr::col((user::Entity, user::Column::Username)).ilike(&pattern))
                    .add(Expr::col((user::Entity, user::Column::Email)).ilike(&pattern))
                    .add(Expr::col((user::Entity, user::Column::FirstName)).ilike(&pattern))
                    .add(Expr::col((user::Entity, user::Column::LastName)).ilike(&pattern)),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(map_db_err)?;
        let models = query
            .order_by_desc(user::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(to_users(models)?, total))
    }

    async fn count(&self) -> Result<u64, RepoError> {
        UserEntity::find()
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<User>, RepoError> {
        let models = UserEntity::find()
            .order_by_desc(user::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        to_users(models)
    }
}

/// Translate a [`PostFilter`] into a SQL condition.
fn post_condition(filter: &PostFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(author_id) = filter.author_id {
        cond = cond.add(post::Column::AuthorId.eq(author_id));
    }
    if let Some(status) = filter.status {
        cond = cond.add(post::Column::Status.eq(status.as_str()));
    }
    if let Some(tag) = &filter.tag {
        cond = cond.add(tag_matches(contains_pattern(tag)));
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        cond = cond.add(
            Condition::any()
                .add(Expr::col((post::Entity, post::Column::Title)).ilike(&pattern))
                .add(Expr::col((post::Entity, post::Column::Content)).ilike(&pattern))
                .add(tag_matches(pattern)),
        );
    }
    cond
}

fn apply_sort(query: Select<PostEntity>, sort: PostSort) -> Select<PostEntity> {
    match sort {
        PostSort::CreatedAt => query.order_by_desc(post::Column::CreatedAt),
        PostSort::Views => query
            .order_by_desc(post::Column::Views)
            .order_by_desc(post::Column::CreatedAt),
        PostSort::Likes => query
            .order_by(
                Expr::cust(r#"jsonb_array_length("posts"."likes")"#),
                Order::Desc,
            )
            .order_by_desc(post::Column::CreatedAt),
        PostSort::PublishedAt => query
            .order_by_with_nulls(post::Column::PublishedAt, Order::Desc, NullOrdering::Last)
            .order_by_desc(post::Column::CreatedAt),
        PostSort::Insertion => query.order_by_asc(post::Column::CreatedAt),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        result.map(Post::try_from).transpose()
    }

    async fn slug_exists(&self, slug: &str, excluding: Option<Uuid>) -> Result<bool, RepoError> {
        let mut query = PostEntity::find().filter(post::Column::Slug.eq(slug));
        if let Some(id) = excluding {
            query = query.filter(post::Column::Id.ne(id));
        }
        let hits = query.count(&self.db).await.map_err(map_db_err)?;
        Ok(hits > 0)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let query = PostEntity::find().filter(post_condition(filter));

        let total = query.clone().count(&self.db).await.map_err(map_db_err)?;
        let models = apply_sort(query, sort)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(total, returned = models.len(), ?sort, "Listed posts");
        Ok(Page::new(to_posts(models)?, total))
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Views, Expr::col(post::Column::Views).add(1))
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        model.map(Post::try_from).transpose()
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let result = PostEntity::delete_many()
            .filter(post::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post_condition(filter))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn count_comments(&self) -> Result<u64, RepoError> {
        let total: Option<i64> = PostEntity::find()
            .select_only()
            .column_as(
                Expr::cust(r#"COALESCE(SUM(jsonb_array_length("posts"."comments")), 0)::bigint"#),
                "total",
            )
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(total.and_then(|n| u64::try_from(n).ok()).unwrap_or(0))
    }

    async fn recent_published(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::Status.eq(PostStatus::Published.as_str()))
            .order_by_with_nulls(post::Column::PublishedAt, Order::Desc, NullOrdering::Last)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        to_posts(models)
    }
}

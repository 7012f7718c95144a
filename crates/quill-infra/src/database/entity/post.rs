//! Post entity for SeaORM.
//!
//! Tags, likes and comments live in JSONB columns so a post stays a single
//! row that is read and written as a whole.

use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

use quill_core::domain::{Comment, Post};
use quill_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub featured_image: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub read_time: i32,
    pub views: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: Json,
    pub status: String,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn decode<T: DeserializeOwned>(value: Json, column: &str) -> Result<T, RepoError> {
    serde_json::from_value(value).map_err(|e| RepoError::Corrupt(format!("posts.{column}: {e}")))
}

fn encode<T: Serialize>(value: &T, column: &str) -> Result<Json, RepoError> {
    serde_json::to_value(value).map_err(|e| RepoError::Corrupt(format!("posts.{column}: {e}")))
}

/// Conversion from SeaORM Model to Domain Post.
impl TryFrom<Model> for Post {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let comments: Vec<Comment> = decode(model.comments, "comments")?;
        Ok(Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            content: model.content,
            slug: model.slug,
            featured_image: model.featured_image,
            tags: decode(model.tags, "tags")?,
            read_time: u32::try_from(model.read_time).unwrap_or(0),
            views: u64::try_from(model.views).unwrap_or(0),
            likes: decode(model.likes, "likes")?,
            comments,
            status: model.status.parse().map_err(RepoError::Corrupt)?,
            published_at: model.published_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl TryFrom<Post> for ActiveModel {
    type Error = RepoError;

    fn try_from(post: Post) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            title: Set(post.title),
            content: Set(post.content),
            slug: Set(post.slug),
            featured_image: Set(post.featured_image),
            tags: Set(encode(&post.tags, "tags")?),
            read_time: Set(i32::try_from(post.read_time).unwrap_or(i32::MAX)),
            views: Set(i64::try_from(post.views).unwrap_or(i64::MAX)),
            likes: Set(encode(&post.likes, "likes")?),
            comments: Set(encode(&post.comments, "comments")?),
            status: Set(post.status.as_str().to_string()),
            published_at: Set(post.published_at.map(Into::into)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        })
    }
}

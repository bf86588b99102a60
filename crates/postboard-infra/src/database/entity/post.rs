//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use postboard_core::domain::PostStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub author: String,
    pub status: String,
    pub views: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

// `author` is free text, not a foreign key to users.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for postboard_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            text: model.text,
            author: model.author,
            status: model.status.parse().unwrap_or_else(|_| {
                tracing::warn!(post_id = %model.id, status = %model.status, "Unknown post status, reading as draft");
                PostStatus::Draft
            }),
            views: u64::try_from(model.views).unwrap_or(0),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
///
/// Fails when the view count does not fit the signed `views` column.
impl TryFrom<postboard_core::domain::Post> for ActiveModel {
    type Error = postboard_core::error::RepoError;

    fn try_from(post: postboard_core::domain::Post) -> Result<Self, Self::Error> {
        let views = i64::try_from(post.views).map_err(|_| {
            postboard_core::error::RepoError::Constraint("views out of range".to_string())
        })?;

        Ok(Self {
            id: Set(post.id),
            title: Set(post.title),
            text: Set(post.text),
            author: Set(post.author),
            status: Set(post.status.as_str().to_string()),
            views: Set(views),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        })
    }
}

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::validation::ValidationErrors;

/// Minimum length, in characters, of a post's title and text.
pub const MIN_CONTENT_CHARS: usize = 5;

/// Largest view count any store can hold (the SQL column is a signed 64-bit integer).
pub const MAX_VIEWS: u64 = i64::MAX as u64;

/// Publication state. Declared for clients; no endpoint transitions it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// Post entity - a piece of content with a view counter.
///
/// `author` is free text, not a reference to a [`User`](super::User).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub author: String,
    pub status: PostStatus,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post with zero views. Does not validate.
    pub fn new(title: String, text: String, author: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            text,
            author,
            status: PostStatus::Draft,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new post, rejecting it if any field rule fails.
    pub fn create(title: String, text: String, author: String) -> Result<Self, ValidationErrors> {
        let post = Self::new(title, text, author);
        post.validate()?;
        Ok(post)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("title", &self.title, MIN_CONTENT_CHARS);
        errors.min_chars("text", &self.text, MIN_CONTENT_CHARS);
        errors.require("author", &self.author);
        if self.views > MAX_VIEWS {
            errors.add("views", format!("views must be at most {MAX_VIEWS}"));
        }
        errors.into_result()
    }

    /// Merge `patch` onto this post.
    ///
    /// Every field in the patch must be allowed by `policy`, and the merged
    /// record must validate; otherwise `self` is left untouched.
    /// `updated_at` only changes when the patch sets it.
    pub fn apply_patch(&mut self, patch: PostPatch, policy: &PatchPolicy) -> Result<(), DomainError> {
        if let Some(field) = patch.fields().into_iter().find(|f| !policy.permits(*f)) {
            return Err(DomainError::ReadOnlyField(field.as_str()));
        }

        let mut merged = self.clone();
        if let Some(title) = patch.title {
            merged.title = title;
        }
        if let Some(text) = patch.text {
            merged.text = text;
        }
        if let Some(author) = patch.author {
            merged.author = author;
        }
        if let Some(status) = patch.status {
            merged.status = status;
        }
        if let Some(views) = patch.views {
            merged.views = views;
        }
        if let Some(created_at) = patch.created_at {
            merged.created_at = created_at;
        }
        if let Some(updated_at) = patch.updated_at {
            merged.updated_at = updated_at;
        }

        merged.validate()?;
        *self = merged;
        Ok(())
    }
}

/// Fields a partial update may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostField {
    Title,
    Text,
    Author,
    Status,
    Views,
    CreatedAt,
    UpdatedAt,
}

impl PostField {
    pub const ALL: [PostField; 7] = [
        PostField::Title,
        PostField::Text,
        PostField::Author,
        PostField::Status,
        PostField::Views,
        PostField::CreatedAt,
        PostField::UpdatedAt,
    ];

    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostField::Title => "title",
            PostField::Text => "text",
            PostField::Author => "author",
            PostField::Status => "status",
            PostField::Views => "views",
            PostField::CreatedAt => "createdAt",
            PostField::UpdatedAt => "updatedAt",
        }
    }
}

/// A name that is not a known post field or status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for PostField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        PostField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .or(match s {
                "created_at" => Some(PostField::CreatedAt),
                "updated_at" => Some(PostField::UpdatedAt),
                _ => None,
            })
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Partial update body. Absent (or `null`) fields are left unchanged;
/// unrecognised keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<String>,
    pub text: Option<String>,
    pub author: Option<String>,
    pub status: Option<PostStatus>,
    pub views: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PostPatch {
    /// The fields this patch would overwrite.
    pub fn fields(&self) -> Vec<PostField> {
        let present = [
            (PostField::Title, self.title.is_some()),
            (PostField::Text, self.text.is_some()),
            (PostField::Author, self.author.is_some()),
            (PostField::Status, self.status.is_some()),
            (PostField::Views, self.views.is_some()),
            (PostField::CreatedAt, self.created_at.is_some()),
            (PostField::UpdatedAt, self.updated_at.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(field, set)| set.then_some(field))
            .collect()
    }
}

/// Allow-list deciding which fields a partial update may overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPolicy {
    allowed: HashSet<PostField>,
}

impl Default for PatchPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl PatchPolicy {
    pub fn allow_all() -> Self {
        Self {
            allowed: PostField::ALL.into_iter().collect(),
        }
    }

    pub fn only(fields: impl IntoIterator<Item = PostField>) -> Self {
        Self {
            allowed: fields.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list such as `"title,text,author"`.
    pub fn from_names(names: &str) -> Result<Self, UnknownField> {
        let fields = names
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<PostField>, _>>()?;
        Ok(Self::only(fields))
    }

    pub fn permits(&self, field: PostField) -> bool {
        self.allowed.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Post {
        Post::create(
            "Hello World".to_string(),
            "Some text body".to_string(),
            "alice".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let post = sample();
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.views, 0);
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn test_create_rejects_short_fields() {
        let errors = Post::create("Hi".into(), "tiny".into(), "alice".into()).unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("text"));
        assert!(!errors.has("author"));
    }

    #[test]
    fn test_apply_patch_merges_subset() {
        let mut post = sample();
        let before = post.updated_at;
        let patch: PostPatch =
            serde_json::from_value(serde_json::json!({ "title": "A new title", "views": 7, "bogus": 1 }))
                .unwrap();

        post.apply_patch(patch, &PatchPolicy::allow_all()).unwrap();

        assert_eq!(post.title, "A new title");
        assert_eq!(post.views, 7);
        assert_eq!(post.text, "Some text body");
        assert_eq!(post.updated_at, before);
    }

    #[test]
    fn test_apply_patch_invalid_leaves_post_untouched() {
        let mut post = sample();
        let patch = PostPatch {
            title: Some("New title".into()),
            text: Some("abc".into()),
            ..Default::default()
        };

        let err = post.apply_patch(patch, &PatchPolicy::allow_all()).unwrap_err();

        assert!(matches!(err, DomainError::Validation(ref e) if e.has("text")));
        assert_eq!(post.title, "Hello World");
    }

    #[test]
    fn test_apply_patch_rejects_unstorable_views() {
        let mut post = sample();
        let patch = PostPatch {
            views: Some(u64::MAX),
            ..Default::default()
        };

        let err = post.apply_patch(patch, &PatchPolicy::allow_all()).unwrap_err();

        assert!(matches!(err, DomainError::Validation(ref e) if e.has("views")));
        assert_eq!(post.views, 0);

        let patch = PostPatch {
            views: Some(MAX_VIEWS),
            ..Default::default()
        };
        post.apply_patch(patch, &PatchPolicy::allow_all()).unwrap();
        assert_eq!(post.views, MAX_VIEWS);
    }

    #[test]
    fn test_apply_patch_respects_policy() {
        let mut post = sample();
        let policy = PatchPolicy::from_names("title, text,author").unwrap();
        let patch = PostPatch {
            views: Some(1_000),
            ..Default::default()
        };

        let err = post.apply_patch(patch, &policy).unwrap_err();

        assert!(matches!(err, DomainError::ReadOnlyField("views")));
        assert_eq!(post.views, 0);
    }

    #[test]
    fn test_policy_parsing() {
        let policy = PatchPolicy::from_names("title,updated_at,createdAt").unwrap();
        assert!(policy.permits(PostField::UpdatedAt));
        assert!(policy.permits(PostField::CreatedAt));
        assert!(!policy.permits(PostField::Status));

        assert_eq!(
            PatchPolicy::from_names("title,likes").unwrap_err(),
            UnknownField("likes".to_string())
        );
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["status"], "draft");
        assert!(json.get("createdAt").is_some());
        assert_eq!("archived".parse::<PostStatus>().unwrap(), PostStatus::Archived);
    }
}

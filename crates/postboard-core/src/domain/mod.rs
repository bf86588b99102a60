//! Domain entities - the core business objects.

mod user;

mod post;

pub use post::{MAX_VIEWS, PatchPolicy, Post, PostField, PostPatch, PostStatus, UnknownField};
pub use user::{ActivationPolicy, Registration, User};

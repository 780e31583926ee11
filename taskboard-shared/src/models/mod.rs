/// Database models for Taskboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts with a platform-wide role
/// - `project`: Projects owned by a creator
/// - `membership`: Per-project role assignments
/// - `task`: Tasks within a project
/// - `comment`: Comment threads on tasks
/// - `notification`: Per-user notifications
///
/// Listing and point lookups on projects, tasks, and comments take a
/// [`Visibility`](crate::auth::authorization::Visibility) value so that
/// row filtering happens in the query, not in memory.

pub mod comment;
pub mod membership;
pub mod notification;
pub mod project;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Keeps an explicit JSON `null` distinguishable from an absent field.
///
/// Plain `Option<Option<T>>` collapses `{"field": null}` into the outer
/// `None`, making a clear request indistinguishable from no change. With
/// `#[serde(default, deserialize_with = "double_option")]` an absent field
/// stays `None` and a present `null` becomes `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

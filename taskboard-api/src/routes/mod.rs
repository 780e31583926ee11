/// API route handlers
///
/// Each module holds the handlers for one resource. All handlers under the
/// authenticated group take the resolved `Actor` from request extensions and
/// never re-derive the role themselves.

pub mod auth;
pub mod comments;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod users;

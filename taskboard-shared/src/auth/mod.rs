/// Authentication and authorization for Taskboard
///
/// # Modules
///
/// - `jwt`: Token generation and validation (HS256 access/refresh pairs)
/// - `password`: Argon2id password hashing
/// - `authorization`: The role-and-membership authorization engine

pub mod authorization;
pub mod jwt;
pub mod password;

/// HTTP middleware
///
/// Request-level layers that sit outside the route handlers.

pub mod security;

/// Database layer for Taskboard
///
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: sqlx migration runner

pub mod migrations;
pub mod pool;

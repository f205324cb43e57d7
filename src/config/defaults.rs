pub const DEFAULT_RUST_LOG: &str = "info,sqlx=warn";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: i64 = 5;
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
pub const MAX_ACCESS_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 180;
pub const MAX_REFRESH_TTL_DAYS: u64 = 3_650;
pub const DEFAULT_STORE_TIMEOUT_MS: i64 = 5_000;
pub const MIN_JWT_SECRET_BYTES: usize = 32;

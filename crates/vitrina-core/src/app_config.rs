/// JPEG quality band, in percent, used when re-encoding oversized uploads.
pub const COMPRESS_QUALITY_RANGE: std::ops::RangeInclusive<u8> = 75..=85;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub storage_url: String,
    pub storage_key: String,
    pub storage_bucket: String,
    pub cover_bucket: String,
    pub storage_timeout_secs: u64,
    pub storage_user_agent: String,
    pub cache_control_secs: u64,
    /// Deadline for the cover-upload race; the upload itself is never cancelled.
    pub upload_timeout_secs: u64,
    pub compress_max_width: u32,
    pub compress_quality: u8,
    pub compress_threshold_bytes: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("storage_url", &self.storage_url)
            .field("storage_key", &"[redacted]")
            .field("storage_bucket", &self.storage_bucket)
            .field("cover_bucket", &self.cover_bucket)
            .field("storage_timeout_secs", &self.storage_timeout_secs)
            .field("storage_user_agent", &self.storage_user_agent)
            .field("cache_control_secs", &self.cache_control_secs)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field("compress_max_width", &self.compress_max_width)
            .field("compress_quality", &self.compress_quality)
            .field("compress_threshold_bytes", &self.compress_threshold_bytes)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

/// Immutable process configuration, built once at startup and passed by
/// reference into each component's constructor.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    /// Video-source credential. `None` leaves the video collector
    /// unavailable without affecting the other sources.
    pub youtube_api_key: Option<String>,
    /// Optional forum credentials; the forum source works anonymously.
    pub discourse_api_key: Option<String>,
    pub discourse_api_username: Option<String>,

    pub enable_scheduler: bool,
    /// Six-field cron expression (seconds first) for the recurring run.
    pub cron_schedule: String,

    pub youtube_requests_per_day: u32,
    pub discourse_requests_per_minute: u32,
    pub trends_delay_ms: u64,

    pub items_per_platform: usize,
    pub countries: Vec<String>,
    pub request_timeout_secs: u64,
    pub max_concurrent_platforms: usize,
    /// Overall deadline for one orchestration pass; zero disables it.
    pub collect_deadline_secs: u64,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Deadline for one orchestration pass, if configured.
    #[must_use]
    pub fn collect_deadline(&self) -> Option<Duration> {
        (self.collect_deadline_secs > 0).then(|| Duration::from_secs(self.collect_deadline_secs))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "discourse_api_key",
                &self.discourse_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("discourse_api_username", &self.discourse_api_username)
            .field("enable_scheduler", &self.enable_scheduler)
            .field("cron_schedule", &self.cron_schedule)
            .field("youtube_requests_per_day", &self.youtube_requests_per_day)
            .field(
                "discourse_requests_per_minute",
                &self.discourse_requests_per_minute,
            )
            .field("trends_delay_ms", &self.trends_delay_ms)
            .field("items_per_platform", &self.items_per_platform)
            .field("countries", &self.countries)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_concurrent_platforms", &self.max_concurrent_platforms)
            .field("collect_deadline_secs", &self.collect_deadline_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

//! Daemon configuration.

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Shared secret for webhook signature verification (unsigned deliveries
    /// are accepted when absent)
    pub webhook_secret: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            bind_addr: std::env::var("GANGWAY_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            webhook_secret: std::env::var("GANGWAY_WEBHOOK_SECRET").ok(),
        }
    }
}

impl DaemonConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Scheduling oracle configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL of an Ollama-compatible server (default: `http://localhost:11434`).
    pub url: String,
    /// Model name passed to `/api/generate` (default: `llama3.1`).
    pub model: String,
    /// Budget for a single oracle call in seconds (default: `120`).
    pub timeout_secs: u64,
}

impl OracleConfig {
    pub const DEFAULT_URL: &'static str = "http://localhost:11434";
    pub const DEFAULT_MODEL: &'static str = "llama3.1";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                  |
    /// |-----------------------|--------------------------|
    /// | `ORACLE_URL`          | `http://localhost:11434` |
    /// | `ORACLE_MODEL`        | `llama3.1`               |
    /// | `ORACLE_TIMEOUT_SECS` | `120`                    |
    ///
    /// An unparseable timeout falls back to the default.
    pub fn from_env() -> Self {
        let url = std::env::var("ORACLE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.into());
        let model = std::env::var("ORACLE_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.into());
        let timeout_secs = std::env::var("ORACLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);

        Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: Self::DEFAULT_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

use panotour_core::TierLimits;

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{0}")]
    UnknownTier(String),
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Grace period for background services after the server stops (default: `5`).
    pub shutdown_timeout_secs: u64,
    /// PostgreSQL URL. Without one, tours are kept in memory.
    pub database_url: Option<String>,
    /// Edition limits applied to validation and authoring.
    pub limits: TierLimits,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `5`                     |
    /// | `DATABASE_URL`           | unset (in-memory)       |
    /// | `TOUR_TIER`              | `lite`                  |
    /// | `MAX_SCENES_PER_TOUR`    | tier ceiling            |
    /// | `MAX_HOTSPOTS_PER_SCENE` | tier ceiling            |
    /// | `MAX_TOURS`              | tier ceiling            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&lookup, "PORT", "a valid u16")?.unwrap_or(3000);

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs =
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "a valid u64")?.unwrap_or(30);
        let shutdown_timeout_secs =
            parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", "a valid u64")?.unwrap_or(5);

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let tier = lookup("TOUR_TIER").unwrap_or_else(|| "lite".into());
        let mut limits = TierLimits::for_tier(&tier).map_err(ConfigError::UnknownTier)?;
        if let Some(max) = parse_var(&lookup, "MAX_SCENES_PER_TOUR", "a positive integer")? {
            limits.max_scenes = Some(max);
        }
        if let Some(max) = parse_var(&lookup, "MAX_HOTSPOTS_PER_SCENE", "a positive integer")? {
            limits.max_hotspots_per_scene = Some(max);
        }
        if let Some(max) = parse_var(&lookup, "MAX_TOURS", "a positive integer")? {
            limits.max_tours = Some(max);
        }

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            limits,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value,
            }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

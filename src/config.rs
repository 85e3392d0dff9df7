use std::env;

use crate::access::UnlistedRolePolicy;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and pulled into
/// handlers via `FromRef`, like every other part of the shared state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the LMS REST backend (everything under `/api` hangs off this).
    pub api_base: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls the log format.
    pub env: Env,
    // How USER/TA sessions are treated on course-scoped paths.
    pub unlisted_role_policy: UnlistedRolePolicy,
}

/// Env
///
/// Defines the runtime context: local development or a production deployment.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_API_BASE: &str = "http://localhost:4000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for test state scaffolding, so tests never need to
    /// touch environment variables.
    fn default() -> Self {
        Self {
            api_base: LOCAL_API_BASE.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            env: Env::Local,
            unlisted_role_policy: UnlistedRolePolicy::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics when `KAMBAZ_API_BASE` is missing in production, or when
    /// `KAMBAZ_UNLISTED_ROLE_POLICY` holds an unknown value.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_base = match env {
            Env::Production => env::var("KAMBAZ_API_BASE")
                .expect("FATAL: KAMBAZ_API_BASE must be set in production."),
            Env::Local => {
                env::var("KAMBAZ_API_BASE").unwrap_or_else(|_| LOCAL_API_BASE.to_string())
            }
        };

        let bind_addr =
            env::var("KAMBAZ_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let unlisted_role_policy = match env::var("KAMBAZ_UNLISTED_ROLE_POLICY") {
            Ok(value) => UnlistedRolePolicy::parse(&value).unwrap_or_else(|| {
                panic!("FATAL: unknown KAMBAZ_UNLISTED_ROLE_POLICY `{}`", value)
            }),
            Err(_) => UnlistedRolePolicy::default(),
        };

        Self {
            api_base,
            bind_addr,
            env,
            unlisted_role_policy,
        }
    }
}

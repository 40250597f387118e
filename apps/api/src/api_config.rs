use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderName;
use pls_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_ACTOR_HEADER: &str = "x-pls-actor";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub api_host: String,
    pub api_port: u16,
    pub actor_header: HeaderName,
    pub bootstrap_admin: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let database_max_connections = parsed_env("DATABASE_MAX_CONNECTIONS", 10)?;
        if database_max_connections == 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parsed_env("API_PORT", 3000)?;

        let actor_header =
            env::var("ACTOR_HEADER").unwrap_or_else(|_| DEFAULT_ACTOR_HEADER.to_owned());
        let actor_header = HeaderName::from_str(actor_header.trim()).map_err(|error| {
            AppError::Validation(format!("invalid ACTOR_HEADER '{actor_header}': {error}"))
        })?;

        let bootstrap_admin = env::var("BOOTSTRAP_ADMIN")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            api_host,
            api_port,
            actor_header,
            bootstrap_admin,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parsed_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        Err(_) => Ok(default),
    }
}

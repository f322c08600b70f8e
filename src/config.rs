use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_REFRESH_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Local JSON file, re-read every cycle.
    File(PathBuf),
    /// REST collection endpoint.
    Api(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub storage_path: PathBuf,
    pub source: Source,
    /// Base of the REST backend, used by the API source and the fines proxy.
    pub api_base_url: String,
    pub refresh_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let storage_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/local_storage.json"));

        let api_base_url = lookup("TRAFFIC_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let source = match lookup("TRAFFIC_SOURCE").as_deref().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("api") => {
                Source::Api(format!("{api_base_url}/api/violations"))
            }
            _ => Source::File(
                lookup("TRAFFIC_DATA_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("data/violations.json")),
            ),
        };

        let refresh_secs = lookup("REFRESH_INTERVAL_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REFRESH_SECS);

        Self {
            port,
            storage_path,
            source,
            api_base_url,
            refresh_interval: Duration::from_secs(refresh_secs),
        }
    }
}

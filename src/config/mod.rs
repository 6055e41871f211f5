use std::env;

use crate::request::LoadingPolicy;

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Strategy execution service
    pub strategy_service_url: String,
    pub request_timeout_secs: u64,

    // Dashboard behaviour
    pub default_strategies: Vec<String>,
    pub data_mode: String,
    pub clear_on_loading: bool,

    // Bearer token for the API; auth disabled when unset
    pub api_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let strategies_raw =
            env::var("DEFAULT_STRATEGIES").unwrap_or_else(|_| "wheel,rotator".into());

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            strategy_service_url: env::var("STRATEGY_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_SERVICE_URL.into()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".into())
                .parse()
                .unwrap_or(120),

            default_strategies: parse_list(&strategies_raw),
            data_mode: env::var("DATA_MODE").unwrap_or_else(|_| "mock".into()),
            clear_on_loading: env::var("CLEAR_ON_LOADING")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),

            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    pub fn loading_policy(&self) -> LoadingPolicy {
        if self.clear_on_loading {
            LoadingPolicy::ClearData
        } else {
            LoadingPolicy::RetainData
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

use crate::budget::BudgetConfig;
use crate::error::{Error, Result};
use std::env;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://discord.bots.gg";

/// Runtime configuration for a discord.bots.gg [`Client`](crate::Client).
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Sent verbatim as the `Authorization` header on stats updates only;
    /// lookups and searches go out unauthenticated.
    pub token: String,
    pub api_url: Url,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub query_budget: BudgetConfig,
    pub update_budget: BudgetConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            user_agent: default_user_agent(),
            timeout_secs: 30,
            query_budget: BudgetConfig::QUERY,
            update_budget: BudgetConfig::UPDATE,
        }
    }
}

impl Config {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - DISCORDBOTSGG_TOKEN (default: empty; stats updates will be rejected remotely)
    /// - DISCORDBOTSGG_API_URL (default: https://discord.bots.gg)
    /// - DISCORDBOTSGG_HTTP_TIMEOUT_SECS (default: 30)
    /// - DISCORDBOTSGG_USER_AGENT (default: discordbotsgg/<version>)
    pub fn from_env() -> Result<Self> {
        let token = env::var("DISCORDBOTSGG_TOKEN").unwrap_or_default();
        let api_url = match env::var("DISCORDBOTSGG_API_URL") {
            Ok(raw) => parse_api_url(&raw)?,
            Err(_) => parse_api_url(DEFAULT_API_URL)?,
        };
        let timeout_secs = env::var("DISCORDBOTSGG_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        let user_agent = env::var("DISCORDBOTSGG_USER_AGENT").unwrap_or_else(|_| default_user_agent());

        Ok(Self {
            token,
            api_url,
            user_agent,
            timeout_secs,
            query_budget: BudgetConfig::QUERY,
            update_budget: BudgetConfig::UPDATE,
        })
    }

    /// Point the client at another deployment (or a local mock server).
    pub fn with_api_url(mut self, raw: &str) -> Result<Self> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }
}

fn default_user_agent() -> String {
    format!("discordbotsgg/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid API URL {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("API URL {raw:?} cannot be a base")));
    }
    Ok(url)
}

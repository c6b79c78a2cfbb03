use crate::budget::RateBudget;
use crate::config::Config;
use crate::endpoints::{bot_endpoint, bots_endpoint, stats_endpoint};
use crate::error::{Error, Result};
use crate::http::{ApiRequest, Transport};
use crate::query::QueryParameters;
use crate::types::{Bot, Page, StatsResponse, StatsUpdate};
use log::{debug, warn};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A rate-limited discord.bots.gg client.
///
/// Lookups and searches draw from a query budget, stats updates from a
/// separate update budget; see [`BudgetConfig`](crate::BudgetConfig) for the
/// defaults. Calls that find their budget empty wait for the next token.
///
/// Only stats updates carry the `Authorization` header. The service serves
/// lookups and searches unauthenticated, and that asymmetry is kept on the
/// wire.
pub struct Client {
    transport: Arc<dyn Transport>,
    token: String,
    api_url: Url,
    query_budget: RateBudget,
    update_budget: RateBudget,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url.as_str())
            .field("query_budget", &self.query_budget)
            .field("update_budget", &self.update_budget)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// A client against the public API with the default budgets.
    pub fn new(transport: Arc<dyn Transport>, token: impl Into<String>) -> Self {
        Self::with_config(transport, &Config::new(token))
    }

    pub fn with_config(transport: Arc<dyn Transport>, cfg: &Config) -> Self {
        Self {
            transport,
            token: cfg.token.clone(),
            api_url: cfg.api_url.clone(),
            query_budget: RateBudget::new("query", cfg.query_budget),
            update_budget: RateBudget::new("update", cfg.update_budget),
        }
    }

    /// Budget shared by lookups and searches.
    pub fn query_budget(&self) -> &RateBudget {
        &self.query_budget
    }

    /// Budget for stats updates.
    pub fn update_budget(&self) -> &RateBudget {
        &self.update_budget
    }

    /// Stops admitting requests. Calls waiting on a budget return
    /// [`Error::Closed`]; requests already handed to the transport finish
    /// normally.
    pub fn close(&self) {
        self.query_budget.close();
        self.update_budget.close();
    }

    /// Fetches a single bot.
    pub async fn bot(&self, bot_id: &str, sanitize: bool) -> Result<Bot> {
        self.bot_inner(bot_id, sanitize, None).await
    }

    /// Like [`bot`](Self::bot), abandoned when `cancel` fires.
    pub async fn bot_with_cancel(
        &self,
        bot_id: &str,
        sanitize: bool,
        cancel: &CancellationToken,
    ) -> Result<Bot> {
        self.bot_inner(bot_id, sanitize, Some(cancel)).await
    }

    /// Fetches one page of bots matching `params`.
    pub async fn bots(&self, params: &QueryParameters) -> Result<Page> {
        self.bots_inner(params, None).await
    }

    /// Like [`bots`](Self::bots), abandoned when `cancel` fires.
    pub async fn bots_with_cancel(
        &self,
        params: &QueryParameters,
        cancel: &CancellationToken,
    ) -> Result<Page> {
        self.bots_inner(params, Some(cancel)).await
    }

    /// Posts stats for `bot_id` and returns the stats the service recorded.
    pub async fn update(&self, bot_id: &str, update: &StatsUpdate) -> Result<StatsResponse> {
        self.update_inner(bot_id, update, None).await
    }

    /// Like [`update`](Self::update), abandoned when `cancel` fires.
    pub async fn update_with_cancel(
        &self,
        bot_id: &str,
        update: &StatsUpdate,
        cancel: &CancellationToken,
    ) -> Result<StatsResponse> {
        self.update_inner(bot_id, update, Some(cancel)).await
    }

    async fn bot_inner(
        &self,
        bot_id: &str,
        sanitize: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<Bot> {
        self.query_budget.acquire(cancel).await?;
        let url = bot_endpoint(&self.api_url, bot_id, sanitize)?;
        self.execute(ApiRequest::get(url), cancel).await
    }

    async fn bots_inner(
        &self,
        params: &QueryParameters,
        cancel: Option<&CancellationToken>,
    ) -> Result<Page> {
        self.query_budget.acquire(cancel).await?;
        let url = bots_endpoint(&self.api_url, params)?;
        self.execute(ApiRequest::get(url), cancel).await
    }

    async fn update_inner(
        &self,
        bot_id: &str,
        update: &StatsUpdate,
        cancel: Option<&CancellationToken>,
    ) -> Result<StatsResponse> {
        // The token is spent on the attempt, even if composing the request fails below.
        self.update_budget.acquire(cancel).await?;
        let url = stats_endpoint(&self.api_url, bot_id)?;
        let body = serde_json::to_vec(update).map_err(Error::Encode)?;
        let mut req = ApiRequest::post(url, body);
        req.headers
            .insert(AUTHORIZATION, HeaderValue::from_str(&self.token)?);
        req.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.execute(req, cancel).await
    }

    /// Sends `req`, reads the whole body, then checks the status and decodes.
    async fn execute<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<T> {
        debug!("{} {}", req.method, req.url);
        let url = req.url.clone();
        let exchange = async {
            let res = self.transport.send(req).await.map_err(|e| {
                warn!("{} send failed: {}", url, e);
                Error::Transport(e)
            })?;
            let status = res.status;
            let body = res.body.collect().await.map_err(|source| {
                warn!("{} reading body failed (status {}): {}", url, status, source);
                Error::BodyRead { status, source }
            })?;
            Ok::<_, Error>((status, body))
        };

        // Dropping `exchange` on cancellation also drops the in-flight body.
        let (status, body) = match cancel {
            Some(token) => tokio::select! {
                res = exchange => res?,
                _ = token.cancelled() => return Err(Error::Cancelled),
            },
            None => exchange.await?,
        };

        if status != StatusCode::OK {
            warn!("{} returned unexpected status {}", url, status);
            return Err(Error::UnexpectedStatus { status });
        }
        serde_json::from_slice(&body).map_err(Error::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::BudgetConfig;
    use crate::mock::MockTransport;
    use std::time::Duration;

    fn client(transport: Arc<MockTransport>) -> Client {
        let cfg = Config {
            query_budget: BudgetConfig::new(2, Duration::from_millis(200)),
            update_budget: BudgetConfig::new(2, Duration::from_millis(20)),
            ..Config::new("apiToken")
        };
        Client::with_config(transport, &cfg)
    }

    #[tokio::test(start_paused = true)]
    async fn bot_decodes_canned_response() {
        let transport = Arc::new(MockTransport::new());
        let client = client(transport.clone());

        let bot = client.bot("12345", true).await.unwrap();
        assert_eq!(bot.username, "Test Bot 1");
        assert_eq!(bot.owner.unwrap().username, "testOwner");
        assert_eq!(transport.requests_sent(), 1);
        assert_eq!(client.query_budget().available(), 1);
        assert_eq!(client.update_budget().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn bots_decodes_a_page() {
        let client = client(Arc::new(MockTransport::new()));
        let page = client.bots(&QueryParameters::new().q("test")).await.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.limit, 50);
        assert_eq!(page.to_string(), "Test Bot 1, Test Bot 2");
    }

    #[tokio::test(start_paused = true)]
    async fn update_echoes_stats() {
        let client = client(Arc::new(MockTransport::new()));
        let resp = client.update("12345", &StatsUpdate::new(100, 5)).await.unwrap();
        assert_eq!(resp.stats.guild_count, 100);
        assert_eq!(resp.stats.shard_count, 5);
        assert_eq!(client.query_budget().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_sends_nothing() {
        let transport = Arc::new(MockTransport::new());
        let client = client(transport.clone());
        client.bot("1", false).await.unwrap();
        client.bot("1", false).await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let err = client.bot_with_cancel("1", false, &token).await.unwrap_err();
        assert!(matches!(err, Error::RateLimitCancelled));
        assert_eq!(transport.requests_sent(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_client_rejects_calls() {
        let transport = Arc::new(MockTransport::new());
        let client = client(transport.clone());
        client.close();
        assert!(matches!(client.bot("1", false).await, Err(Error::Closed)));
        assert!(matches!(
            client.update("1", &StatsUpdate::default()).await,
            Err(Error::Closed)
        ));
        assert_eq!(transport.requests_sent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_token_still_spends_update_budget() {
        let transport = Arc::new(MockTransport::new());
        let cfg = Config {
            update_budget: BudgetConfig::new(2, Duration::from_secs(10)),
            ..Config::new("bad\ntoken")
        };
        let client = Client::with_config(transport.clone(), &cfg);
        let err = client.update("1", &StatsUpdate::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
        assert_eq!(client.update_budget().available(), 1);
        assert_eq!(transport.requests_sent(), 0);
    }
}

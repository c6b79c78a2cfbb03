//! # discordbotsgg
//!
//! A rate-limited async client for the [discord.bots.gg](https://discord.bots.gg) API.
//!
//! The client covers the three calls the API offers: fetching one bot,
//! searching bots, and posting a bot's stats. Each client enforces the
//! service's limits locally with two token buckets, one shared by lookups and
//! searches (10 per 5 seconds) and one for stats updates (20 per second), so
//! concurrent callers wait for capacity instead of collecting `429`s.
//!
//! The network is reached through the [`Transport`] trait. `reqwest::Client`
//! implements it; [`mock::MockTransport`] answers with canned payloads.
//!
//! ## Example
//!
//! ```no_run
//! use discordbotsgg::{http, Client, Config, QueryParameters, StatsUpdate};
//! use std::sync::Arc;
//!
//! # async fn run() -> discordbotsgg::Result<()> {
//! let cfg = Config::from_env()?;
//! let client = Client::with_config(Arc::new(http::build_client(&cfg)?), &cfg);
//!
//! let bot = client.bot("123456789012345678", true).await?;
//! println!("{bot} is in {} guilds", bot.guild_count);
//!
//! let page = client.bots(&QueryParameters::new().lib("serenity").sort("guildcount")).await?;
//! println!("{page}");
//!
//! client.update("123456789012345678", &StatsUpdate::new(1200, 2)).await?;
//! # Ok(())
//! # }
//! ```

pub mod budget;
mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod mock;
pub mod query;
pub mod types;

pub use budget::{BudgetConfig, RateBudget};
pub use client::Client;
pub use config::Config;
pub use error::{Error, Result, TransportError};
pub use http::{ApiRequest, ApiResponse, Body, Transport};
pub use query::{Order, QueryParameters, Sort};
pub use types::{Bot, BotOwner, Page, Stats, StatsResponse, StatsUpdate};
pub use tokio_util::sync::CancellationToken;

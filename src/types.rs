use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// Total number of bots matching the query, across all pages.
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub bots: Vec<Bot>,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .bots
            .iter()
            .map(|bot| bot.username.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&names)
    }
}

/// A bot listing. Nullable fields in the service's payload are `Option`s.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    pub discriminator: Option<String>,
    #[serde(rename = "avatarURL")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub co_owners: Vec<BotOwner>,
    pub prefix: Option<String>,
    pub help_command: Option<String>,
    pub library_name: Option<String>,
    pub website: Option<String>,
    pub support_invite: Option<String>,
    pub bot_invite: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub open_source: Option<String>,
    #[serde(default)]
    pub shard_count: u32,
    #[serde(default)]
    pub guild_count: u64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub in_guild: bool,
    pub owner: Option<BotOwner>,
    pub added_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl fmt::Display for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BotOwner {
    #[serde(default)]
    pub username: String,
    pub discriminator: Option<String>,
    #[serde(default)]
    pub user_id: String,
}

/// Metrics reported for a bot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub guild_count: u64,
    pub shard_count: u32,
}

/// Body of a stats update: the stats as seen by one shard.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsUpdate {
    #[serde(flatten)]
    pub stats: Stats,
    #[serde(rename = "shardID")]
    pub shard_id: u32,
}

impl StatsUpdate {
    pub fn new(guild_count: u64, shard_count: u32) -> Self {
        Self {
            stats: Stats {
                guild_count,
                shard_count,
            },
            shard_id: 0,
        }
    }

    pub fn with_shard_id(mut self, shard_id: u32) -> Self {
        self.shard_id = shard_id;
        self
    }
}

/// Stats as confirmed by the service after an update.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: Stats,
}

impl fmt::Display for StatsResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_displays_usernames() {
        let page = Page {
            bots: vec![
                Bot {
                    username: "Test Bot 1".into(),
                    ..Bot::default()
                },
                Bot {
                    username: "Test Bot 2".into(),
                    ..Bot::default()
                },
            ],
            ..Page::default()
        };
        assert_eq!(page.to_string(), "Test Bot 1, Test Bot 2");
        assert_eq!(page.bots[0].to_string(), "Test Bot 1");
        assert_eq!(Page::default().to_string(), "");
    }

    #[test]
    fn stats_response_displays_as_json() {
        let resp = StatsResponse {
            stats: Stats {
                guild_count: 100,
                shard_count: 5,
            },
        };
        assert_eq!(resp.to_string(), r#"{"guildCount":100,"shardCount":5}"#);
    }

    #[test]
    fn stats_update_wire_shape() {
        let body = serde_json::to_value(StatsUpdate::new(100, 5).with_shard_id(2)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"guildCount": 100, "shardCount": 5, "shardID": 2})
        );
    }

    #[test]
    fn bot_tolerates_nulls() {
        let bot: Bot = serde_json::from_value(serde_json::json!({
            "userId": "1",
            "clientId": "2",
            "username": "b",
            "discriminator": null,
            "avatarURL": null,
            "coOwners": [],
            "owner": {"username": "o", "discriminator": null, "userId": "3"},
            "addedDate": "2016-10-30T04:59:04.000Z",
            "shardCount": 1,
            "guildCount": 0,
            "verified": true
        }))
        .unwrap();
        assert_eq!(bot.user_id, "1");
        assert!(bot.discriminator.is_none());
        assert_eq!(bot.owner.unwrap().user_id, "3");
        assert_eq!(bot.added_date.unwrap().timestamp(), 1_477_803_544);
        assert!(bot.verified);
        assert!(!bot.online);
    }
}

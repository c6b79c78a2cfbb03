use crate::error::{Error, Result};
use crate::query::QueryParameters;
use url::Url;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// `<base>/api/v1/<segments..>`; every segment is percent-encoded on its own,
/// so ids cannot escape their path position.
fn api_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("API URL {base} cannot be a base")))?
        .pop_if_empty()
        .extend(API_PREFIX)
        .extend(segments);
    Ok(url)
}

/// `GET` target for a single bot.
pub fn bot_endpoint(base: &Url, bot_id: &str, sanitize: bool) -> Result<Url> {
    let mut url = api_url(base, &["bots", bot_id])?;
    url.query_pairs_mut()
        .append_pair("sanitize", if sanitize { "true" } else { "false" });
    Ok(url)
}

/// `GET` target for a bot search; no query string at all when `params` is empty.
pub fn bots_endpoint(base: &Url, params: &QueryParameters) -> Result<Url> {
    let mut url = api_url(base, &["bots"])?;
    if !params.is_empty() {
        url.set_query(Some(&params.to_query_string()));
    }
    Ok(url)
}

/// `POST` target for a stats update.
pub fn stats_endpoint(base: &Url, bot_id: &str) -> Result<Url> {
    api_url(base, &["bots", bot_id, "stats"])
}

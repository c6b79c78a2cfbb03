use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Keys the service can sort search results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Username,
    Id,
    GuildCount,
    Library,
    Author,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Username => "username",
            Sort::Id => "id",
            Sort::GuildCount => "guildcount",
            Sort::Library => "library",
            Sort::Author => "author",
        }
    }
}

impl FromStr for Sort {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "username" => Ok(Sort::Username),
            "id" => Ok(Sort::Id),
            "guildcount" => Ok(Sort::GuildCount),
            "library" => Ok(Sort::Library),
            "author" => Ok(Sort::Author),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl FromStr for Order {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Order::Asc),
            "DESC" => Ok(Order::Desc),
            _ => Err(()),
        }
    }
}

/// Filters for searching bots. Zero, empty and `false` fields are left out of
/// the query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    /// Matches bots whose username or short description contains this text.
    pub q: String,
    /// Zero-based page index.
    pub page: u32,
    /// Results per page; the service accepts 1 to 100 and defaults to 50.
    pub limit: u32,
    /// Bots owned or co-owned by this user id.
    pub author_id: u64,
    /// Bots owned or co-owned by this `User#1234`.
    pub author_name: String,
    /// Include unverified bots. The service requires authentication for this.
    pub unverified: bool,
    pub lib: String,
    pub sort: Option<Sort>,
    pub order: Option<Order>,
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = q.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn author_id(mut self, author_id: u64) -> Self {
        self.author_id = author_id;
        self
    }

    pub fn author_name(mut self, author_name: impl Into<String>) -> Self {
        self.author_name = author_name.into();
        self
    }

    pub fn unverified(mut self, unverified: bool) -> Self {
        self.unverified = unverified;
        self
    }

    pub fn lib(mut self, lib: impl Into<String>) -> Self {
        self.lib = lib.into();
        self
    }

    /// Case-insensitive; an unknown key clears the sort instead of failing.
    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = sort.parse().ok();
        self
    }

    /// Case-insensitive; anything other than asc/desc clears the order.
    pub fn order(mut self, order: &str) -> Self {
        self.order = order.parse().ok();
        self
    }

    /// Non-default fields keyed by their wire name, in ASCII key order.
    fn pairs(&self) -> BTreeMap<&'static str, String> {
        let mut values = BTreeMap::new();
        if !self.q.is_empty() {
            values.insert("q", self.q.clone());
        }
        if self.page > 0 {
            values.insert("page", self.page.to_string());
        }
        if self.limit > 0 {
            values.insert("limit", self.limit.to_string());
        }
        if self.author_id > 0 {
            values.insert("authorId", self.author_id.to_string());
        }
        if !self.author_name.is_empty() {
            values.insert("authorName", self.author_name.clone());
        }
        if self.unverified {
            values.insert("unverified", "true".to_string());
        }
        if !self.lib.is_empty() {
            values.insert("lib", self.lib.clone());
        }
        if let Some(sort) = self.sort {
            values.insert("sort", sort.as_str().to_string());
        }
        if let Some(order) = self.order {
            values.insert("order", order.as_str().to_string());
        }
        values
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    /// `application/x-www-form-urlencoded` form, keys sorted.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}

impl fmt::Display for QueryParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let params = QueryParameters::default();
        assert!(params.is_empty());
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn full_set_in_key_order() {
        let params = QueryParameters::new()
            .q("test")
            .page(1)
            .limit(1)
            .author_id(1)
            .author_name("test")
            .unverified(true)
            .lib("test")
            .sort("username")
            .order("DESC");
        assert_eq!(
            params.to_string(),
            "authorId=1&authorName=test&lib=test&limit=1&order=DESC&page=1&q=test&sort=username&unverified=true"
        );
    }

    #[test]
    fn sort_and_order_normalize() {
        assert_eq!(
            QueryParameters::new().sort("USERNAME").to_query_string(),
            "sort=username"
        );
        assert_eq!(
            QueryParameters::new().sort("GuildCount").to_query_string(),
            "sort=guildcount"
        );
        assert_eq!(QueryParameters::new().order("desc").to_query_string(), "order=DESC");
        assert_eq!(QueryParameters::new().order("Asc").to_query_string(), "order=ASC");
    }

    #[test]
    fn unknown_sort_and_order_are_dropped() {
        let params = QueryParameters::new().sort("bogus").order("sideways");
        assert!(params.sort.is_none());
        assert!(params.order.is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn values_are_form_encoded() {
        let params = QueryParameters::new().q("a b&c").author_name("User#1234");
        assert_eq!(params.to_query_string(), "authorName=User%231234&q=a+b%26c");
    }
}

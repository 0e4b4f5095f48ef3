use url::Url;

use crate::config::SESSION_QUERY_PARAM;

/// The navigable address of the chat surface. The active session rides along
/// as a query parameter so reopening the address restores the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(input)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn session_id(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, v)| k == SESSION_QUERY_PARAM && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    }

    /// Copy of this location with the session parameter set, replaced or
    /// removed. Other query parameters are preserved.
    pub fn with_session(&self, session_id: Option<&str>) -> Self {
        let others: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k != SESSION_QUERY_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.url.clone();
        url.set_query(None);
        if !others.is_empty() || session_id.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &others {
                pairs.append_pair(k, v);
            }
            if let Some(id) = session_id {
                pairs.append_pair(SESSION_QUERY_PARAM, id);
            }
        }

        Self { url }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

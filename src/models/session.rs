use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub title: String,
}

/// Recency groups as labelled by the server. The client never computes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    LastYear,
}

impl Recency {
    pub const ALL: [Recency; 5] = [
        Recency::Today,
        Recency::Yesterday,
        Recency::LastWeek,
        Recency::LastMonth,
        Recency::LastYear,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Recency::Today => "Today",
            Recency::Yesterday => "Yesterday",
            Recency::LastWeek => "Previous 7 Days",
            Recency::LastMonth => "Previous 30 Days",
            Recency::LastYear => "Previous Year",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBuckets {
    #[serde(default)]
    pub today: Vec<Session>,
    #[serde(default)]
    pub yesterday: Vec<Session>,
    #[serde(default)]
    pub last_week: Vec<Session>,
    #[serde(default)]
    pub last_month: Vec<Session>,
    #[serde(default)]
    pub last_year: Vec<Session>,
}

impl SessionBuckets {
    pub fn bucket(&self, recency: Recency) -> &[Session] {
        match recency {
            Recency::Today => &self.today,
            Recency::Yesterday => &self.yesterday,
            Recency::LastWeek => &self.last_week,
            Recency::LastMonth => &self.last_month,
            Recency::LastYear => &self.last_year,
        }
    }

    /// Non-empty groups in display order.
    pub fn groups(&self) -> impl Iterator<Item = (Recency, &[Session])> {
        Recency::ALL
            .into_iter()
            .map(move |r| (r, self.bucket(r)))
            .filter(|(_, sessions)| !sessions.is_empty())
    }

    pub fn find(&self, session_id: &str) -> Option<&Session> {
        Recency::ALL
            .iter()
            .flat_map(|r| self.bucket(*r))
            .find(|s| s.session_id == session_id)
    }

    pub fn is_empty(&self) -> bool {
        self.groups().next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub session_id: String,
    #[serde(default)]
    pub title: String,
}

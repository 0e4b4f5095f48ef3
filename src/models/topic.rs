/// Quick-start coaching topics that prefill the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Nutrition,
    Strength,
    Training,
    Injury,
    Analytics,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Nutrition,
        Topic::Strength,
        Topic::Training,
        Topic::Injury,
        Topic::Analytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Nutrition => "nutrition",
            Topic::Strength => "strength",
            Topic::Training => "training",
            Topic::Injury => "injury",
            Topic::Analytics => "analytics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Topic::Nutrition => "AI Nutrition",
            Topic::Strength => "AI Strength",
            Topic::Training => "AI Training & Programs",
            Topic::Injury => "AI Injury Prevention",
            Topic::Analytics => "AI Analytics",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn prompt(&self) -> String {
        format!("Tell me about {}", self.label().to_lowercase())
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStatus {
    #[serde(rename = "plan__name")]
    pub plan_name: String,
}

/// The signed-in user that sessions are scoped to.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub token: String,
    pub plan: Option<PlanStatus>,
}

impl Identity {
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
            plan: None,
        }
    }

    pub fn with_plan(mut self, plan_name: impl Into<String>) -> Self {
        self.plan = Some(PlanStatus {
            plan_name: plan_name.into(),
        });
        self
    }

    /// Free or unknown plans may browse history but not start conversations.
    pub fn can_chat(&self) -> bool {
        match &self.plan {
            Some(plan) => !plan.plan_name.trim().eq_ignore_ascii_case("free"),
            None => false,
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("email", &self.email)
            .field("token", &"***")
            .field("plan", &self.plan)
            .finish()
    }
}

pub const APP_ID: &str = "com.coachbot.Coachbot";
pub const APP_NAME: &str = "Coachbot";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000/football-ai";

/// Overrides the persisted API base URL when set.
pub const API_URL_ENV: &str = "COACHBOT_API_URL";

/// Query parameter that carries the active session in the navigable location.
pub const SESSION_QUERY_PARAM: &str = "session_id";

pub const APOLOGY_TEXT: &str =
    "Sorry, I'm having trouble responding right now. Please try again.";

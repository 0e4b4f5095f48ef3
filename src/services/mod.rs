pub mod controller;
pub mod conversation;
pub mod database;
pub mod export;
pub mod identity;
pub mod keyring;
pub mod location;
pub mod markdown;
pub mod reconcile;
pub mod settings;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::{ChatController, ChatError, NoticeLevel, Route, UiEvent};
pub use database::Database;
pub use identity::IdentityService;
pub use keyring::KeyringService;
pub use location::Location;
pub use settings::{AppSettings, SettingsService, SettingsUpdate};

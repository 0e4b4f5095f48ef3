use anyhow::{Context, Result};

use crate::api::{ApiError, ChatBackend, Profile};
use crate::models::Identity;
use crate::services::database::Database;
use crate::services::keyring::{AccountKey, KeyringService};

const EMAIL_KEY: &str = "identity_email";

/// Resolves who is signed in. The email is kept in the local database and the
/// token in the keyring; the plan comes from the profile endpoint.
pub struct IdentityService {
    db: Database,
    keyring: KeyringService,
}

impl IdentityService {
    pub fn new(db: Database, keyring: KeyringService) -> Self {
        Self { db, keyring }
    }

    pub async fn login(&self, email: &str, token: &str) -> Result<()> {
        let account = AccountKey::parse(email)?;

        let replaced = self
            .keyring
            .store_token(&account, token)
            .await
            .context("Failed to save access token")?;
        self.db
            .set_setting(EMAIL_KEY, account.as_str())
            .await
            .context("Failed to save account email")?;

        tracing::info!(email = %account, replaced, "Signed in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        if let Some(email) = self.db.get_setting(EMAIL_KEY).await? {
            match AccountKey::parse(&email) {
                Ok(account) => match self.keyring.delete_token(&account).await {
                    Ok(true) => tracing::info!(email = %account, "Removed access token"),
                    Ok(false) => tracing::debug!(email = %account, "No access token stored"),
                    Err(e) => tracing::warn!("Failed to delete token: {}", e),
                },
                Err(e) => tracing::warn!("Stored account email is unusable: {}", e),
            }
        }
        self.db.delete_setting(EMAIL_KEY).await?;
        Ok(())
    }

    pub async fn resolve(&self, backend: &dyn ChatBackend) -> Result<Option<Identity>> {
        let Some(email) = self.db.get_setting(EMAIL_KEY).await? else {
            return Ok(None);
        };
        let account = match AccountKey::parse(&email) {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!("Stored account email is unusable, continuing signed out: {}", e);
                return Ok(None);
            }
        };
        let token = match self.keyring.retrieve_token(&account).await {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!("Keyring unavailable, continuing signed out: {}", e);
                return Ok(None);
            }
        };

        let profile = backend.fetch_profile(&token).await;
        Ok(identity_from_profile(email, token, profile))
    }
}

/// Combine stored credentials with the profile lookup. A rejected token means
/// the user is signed out; any other failure keeps the identity without a plan.
pub fn identity_from_profile(
    email: String,
    token: String,
    profile: Result<Profile, ApiError>,
) -> Option<Identity> {
    match profile {
        Ok(profile) => Some(Identity {
            email,
            token,
            plan: profile.subscribed_plan_status,
        }),
        Err(ApiError::Unauthorized(msg)) => {
            tracing::warn!("Stored token rejected: {}", msg);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to load profile: {}", e);
            Some(Identity::new(email, token))
        }
    }
}

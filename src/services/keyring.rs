use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use oo7::Keyring;

use crate::config::{APP_ID, APP_NAME};

const KEYRING_ATTR_APP: &str = "application";
const KEYRING_ATTR_ACCOUNT: &str = "account";

/// Normalized account email used to file a token. Emails are compared
/// case-insensitively by the service, so `Coach@Example.com` and
/// `coach@example.com` share one keyring item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn parse(email: &str) -> Result<Self> {
        let email = email.trim().to_lowercase();
        let valid = match email.split_once('@') {
            Some((user, domain)) => {
                !user.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            anyhow::bail!("Not a valid account email: {:?}", email);
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn attributes(&self) -> Vec<(&'static str, &str)> {
        vec![(KEYRING_ATTR_APP, APP_ID), (KEYRING_ATTR_ACCOUNT, &self.0)]
    }

    fn label(&self) -> String {
        format!("{} access token ({})", APP_NAME, self.0)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer tokens are opaque but never blank or space-separated.
fn normalize_token(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Access token is empty");
    }
    if token.contains(char::is_whitespace) {
        anyhow::bail!("Access token must not contain whitespace");
    }
    Ok(token)
}

/// Access tokens live in the desktop secret service, one per account.
#[derive(Debug, Clone)]
pub struct KeyringService {
    keyring: Arc<Keyring>,
}

impl KeyringService {
    pub async fn new() -> Result<Self> {
        let keyring = Keyring::new()
            .await
            .context("Failed to initialize keyring")?;
        Ok(Self {
            keyring: Arc::new(keyring),
        })
    }

    async fn has_token(&self, account: &AccountKey) -> Result<bool> {
        let items = self
            .keyring
            .search_items(&account.attributes())
            .await
            .context("Failed to search keyring")?;
        Ok(!items.is_empty())
    }

    /// Store `token` for `account`. Returns `true` when an earlier token for
    /// the same account was replaced.
    pub async fn store_token(&self, account: &AccountKey, token: &str) -> Result<bool> {
        let token = normalize_token(token)?;
        let replaced = self.has_token(account).await?;

        self.keyring
            .create_item(&account.label(), &account.attributes(), token, true)
            .await
            .context("Failed to store token in keyring")?;

        Ok(replaced)
    }

    /// The stored token, or `None` when there is none or it is unusable.
    pub async fn retrieve_token(&self, account: &AccountKey) -> Result<Option<String>> {
        let items = self
            .keyring
            .search_items(&account.attributes())
            .await
            .context("Failed to search keyring")?;

        let Some(item) = items.first() else {
            return Ok(None);
        };
        let secret = item.secret().await.context("Failed to read token")?;
        let token = String::from_utf8(secret.to_vec()).context("Token is not valid UTF-8")?;

        match normalize_token(&token) {
            Ok(token) => Ok(Some(token.to_string())),
            Err(e) => {
                tracing::warn!(account = %account, "Ignoring stored token: {}", e);
                Ok(None)
            }
        }
    }

    /// Remove the token for `account`. Returns `false` when none was stored.
    pub async fn delete_token(&self, account: &AccountKey) -> Result<bool> {
        if !self.has_token(account).await? {
            return Ok(false);
        }

        self.keyring
            .delete(&account.attributes())
            .await
            .context("Failed to delete token from keyring")?;

        Ok(true)
    }
}

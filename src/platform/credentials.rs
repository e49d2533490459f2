//! Platform credentials kept in the catalog settings store.

use serde::Serialize;
use tracing::info;

use super::{PlatformError, PublishPlatform, Result};
use crate::catalog::CatalogStore;

pub const SETTING_ACCESS_TOKEN: &str = "platform_access_token";
pub const SETTING_USER_ID: &str = "platform_user_id";
pub const SETTING_BASE_URL: &str = "platform_base_url";
pub const SETTING_APP_ID: &str = "platform_app_id";
pub const SETTING_APP_SECRET: &str = "platform_app_secret";

const SECONDS_PER_DAY: u64 = 86_400;

/// What a publish needs: who we post as, and where local images are served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCredentials {
    pub access_token: String,
    pub user_id: String,
    pub base_url: String,
}

impl PublishCredentials {
    /// Read the credentials, `None` when token or user id is missing
    ///
    /// `default_base_url` applies when no base URL setting is stored.
    pub fn load(catalog: &CatalogStore, default_base_url: &str) -> Result<Option<Self>> {
        let mut values =
            catalog.get_settings(&[SETTING_ACCESS_TOKEN, SETTING_USER_ID, SETTING_BASE_URL])?;

        let (Some(access_token), Some(user_id)) = (
            values.remove(SETTING_ACCESS_TOKEN),
            values.remove(SETTING_USER_ID),
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            access_token,
            user_id,
            base_url: values
                .remove(SETTING_BASE_URL)
                .unwrap_or_else(|| default_base_url.to_string()),
        }))
    }

    /// Like `load`, but missing credentials are a precondition failure
    pub fn require(catalog: &CatalogStore, default_base_url: &str) -> Result<Self> {
        Self::load(catalog, default_base_url)?.ok_or_else(|| {
            PlatformError::NotConfigured("access token and user id are required".to_string())
        })
    }
}

pub fn is_configured(catalog: &CatalogStore) -> Result<bool> {
    // The base URL always has a fallback, so it plays no part here
    Ok(PublishCredentials::load(catalog, "")?.is_some())
}

/// App identity used for the token exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefresh {
    pub new_token: String,
    pub expires_in_days: u64,
}

/// Exchange the stored token for a long-lived one and store the result
///
/// Token, app id and app secret must all be present; nothing is sent otherwise.
pub async fn refresh_token(
    catalog: &CatalogStore,
    platform: &dyn PublishPlatform,
) -> Result<TokenRefresh> {
    let mut values =
        catalog.get_settings(&[SETTING_ACCESS_TOKEN, SETTING_APP_ID, SETTING_APP_SECRET])?;

    let (Some(current_token), Some(app_id), Some(app_secret)) = (
        values.remove(SETTING_ACCESS_TOKEN),
        values.remove(SETTING_APP_ID),
        values.remove(SETTING_APP_SECRET),
    ) else {
        return Err(PlatformError::NotConfigured(
            "current token, app id and app secret are required to refresh".to_string(),
        ));
    };

    let exchange = platform
        .exchange_token(
            &AppCredentials { app_id, app_secret },
            &current_token,
        )
        .await?;

    catalog.put_setting(SETTING_ACCESS_TOKEN, &exchange.access_token)?;

    let expires_in_days = exchange.expires_in_secs / SECONDS_PER_DAY;
    info!(expires_in_days, "Platform access token refreshed");

    Ok(TokenRefresh {
        new_token: exchange.access_token,
        expires_in_days,
    })
}

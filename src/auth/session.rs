//! Signed-in user: tokens, profile and the login/logout lifecycle.

use crate::auth::TokenPair;
use crate::error::ClientError;
use crate::http::{ApiClient, LOGIN_PATH, PROFILE_PATH};
use crate::notify::Notification;
use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "Admin";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl crate::http::Payload for Credentials {}

#[derive(Deserialize)]
struct TokenResponse {
    access: String,
    refresh: String,
}

#[derive(Debug)]
pub struct Session {
    client: ApiClient,
    profile: Option<UserProfile>,
    loading: bool,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        Session {
            client,
            profile: None,
            loading: false,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.profile().is_some_and(|p| p.role == ADMIN_ROLE)
    }

    /// Last fetched profile; `None` once the tokens are gone.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref().filter(|_| self.is_logged_in())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), ClientError> {
        self.loading = true;
        let result = self.login_inner(credentials).await;
        self.loading = false;
        match result {
            Ok(()) => {
                let email = self.profile().map(|p| p.email.as_str()).unwrap_or_default();
                self.client
                    .notify(Notification::positive(format!("Welcome, {}!", email)));
                Ok(())
            }
            Err(e) => {
                tracing::error!(email = %credentials.email, error = %e, "login failed");
                self.client
                    .notify(Notification::negative(e.user_message("Unknown authorization error")));
                Err(e)
            }
        }
    }

    async fn login_inner(&mut self, credentials: &Credentials) -> Result<(), ClientError> {
        let tokens: TokenResponse = self.client.post_anonymous(LOGIN_PATH, credentials).await?;
        self.client.set_tokens(&TokenPair::new(tokens.access, tokens.refresh));
        self.fetch_profile().await;
        Ok(())
    }

    /// Loads `/users/me/`. Failures are reported and leave the previous profile in place.
    pub async fn fetch_profile(&mut self) -> Option<&UserProfile> {
        if !self.is_logged_in() {
            return None;
        }
        self.loading = true;
        let result = self.client.get::<UserProfile>(PROFILE_PATH, &[]).await;
        self.loading = false;
        match result {
            Ok(profile) => {
                tracing::debug!(user = %profile.email, "profile loaded");
                self.profile = Some(profile);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch user profile");
                self.client
                    .notify(Notification::negative(e.user_message("Failed to load user profile.")));
            }
        }
        self.profile()
    }

    pub fn logout(&mut self) {
        self.profile = None;
        self.client.logout();
    }

    /// `true` when a new access token was stored.
    pub async fn refresh_access_token(&self) -> bool {
        if self.client.tokens().refresh.is_none() {
            return false;
        }
        match self.client.refresh_access_token().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to refresh token");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let c = Credentials::new("a@b.c", "hunter2");
        let shown = format!("{:?}", c);
        assert!(shown.contains("a@b.c"));
        assert!(!shown.contains("hunter2"));
    }
}

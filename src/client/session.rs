use reqwest::Method;
use tracing::{info, warn};

use crate::{
    client::ApiClient,
    errors::Error,
    request::ApiRequest,
    types::TokenPayload,
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const SESSION_CHECK_PATH: &str = "/auth/session-check";

impl ApiClient {
    /// Exchanges credentials for an access token and stores it. The refresh cookie set by the
    /// server is kept by the transport.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, Error> {
        let request = ApiRequest::new(Method::POST, LOGIN_PATH)
            .with_form([("username", username), ("password", password)]);
        let payload: TokenPayload = self.request(request).await?.data()?;
        info!("login ok: user='{}'", username);
        self.set_access_token(Some(payload.access_token.clone()));
        Ok(payload.access_token)
    }

    /// Revokes the server session. Server failures are ignored; the token is cleared regardless.
    /// Logout handlers are not fired since the caller asked for this.
    pub async fn logout(&self) {
        if let Err(err) = self.request(ApiRequest::new(Method::POST, LOGOUT_PATH)).await {
            warn!("logout request failed: {}", err);
        }
        self.set_access_token(None);
    }

    /// Whether the current token is accepted by the server. No token means no network call.
    pub async fn check_session(&self) -> bool {
        if self.access_token().is_none() {
            return false;
        }
        match self.get(SESSION_CHECK_PATH).await {
            Ok(_) => true,
            Err(err) => {
                warn!("session check failed: {}", err);
                false
            }
        }
    }
}

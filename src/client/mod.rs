use std::sync::Arc;

use reqwest::Url;

use crate::notify::NotificationSlot;
use crate::refresh::RefreshCell;
use crate::session::LogoutRegistry;
use crate::token::CredentialStore;
use crate::transport::Transport;

mod impls;
mod session;

/// HTTP client for the household API. Attaches the in-memory access token to every call and
/// recovers from an expired token with a single coordinated refresh.
///
/// Cloning is cheap; clones share the token, refresh state and subscriptions.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Url,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    notifications: NotificationSlot,
    logout: LogoutRegistry,
    refresh: RefreshCell,
}

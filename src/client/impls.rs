use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use futures::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::{
    client::{ApiClient, ClientInner},
    config::Config,
    errors::Error,
    notify::{
        FALLBACK_MESSAGE, Notification, NotificationSink, NotificationSlot, Severity,
        classify_response, duration_for,
    },
    refresh::{Admission, PendingRequest, RefreshCell},
    request::{ApiRequest, ApiResponse, REFRESH_PATH},
    session::{LogoutRegistry, LogoutSubscription, SubscriptionId},
    telemetry::refresh::{RefreshTelemetry, emit_queued},
    token::{CredentialStore, MemoryCredentialStore},
    transport::{ReqwestTransport, Transport},
    types::TokenPayload,
};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

impl ApiClient {
    /// Create a client over the default reqwest transport with an in-memory token store.
    /// # Arguments
    /// * `config` - Explicit configuration, typically loaded via `Config::from_env` or `Config::from_file`.
    /// # ENV Vars (when using `Config::from_env`)
    /// * `HOUSEHOLD_API_BASE_URL` - Absolute base URL of the API, e.g. `https://example.com/api/v1`
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_parts(
            config,
            Arc::new(ReqwestTransport::new()?),
            Arc::new(MemoryCredentialStore::new()),
        )
    }

    /// Create a client over a caller-supplied transport and credential store.
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, Error> {
        let base_url = config.base_url()?;
        info!("api client ready: base_url='{}'", base_url);
        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                transport,
                credentials,
                notifications: NotificationSlot::default(),
                logout: LogoutRegistry::new(),
                refresh: RefreshCell::default(),
            }),
        })
    }

    /// Replaces the in-memory token. `None` logs the client out for authentication purposes
    /// without firing logout handlers.
    pub fn set_access_token(&self, token: Option<String>) {
        info!(
            "access token {}",
            if token.is_some() { "set" } else { "cleared" }
        );
        self.inner.credentials.set(token);
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.credentials.get()
    }

    /// Installs the sink for user-facing error messages, replacing any previous one.
    pub fn set_notification_sink(&self, sink: Option<Arc<dyn NotificationSink>>) {
        self.inner.notifications.set(sink);
    }

    pub fn on_notification<F>(&self, handler: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.set_notification_sink(Some(Arc::new(handler)));
    }

    pub fn register_logout_handler<F>(&self, handler: F) -> LogoutSubscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.logout.register(handler)
    }

    pub fn unregister_logout_handler(&self, id: SubscriptionId) -> bool {
        self.inner.logout.unregister(id)
    }

    pub fn logout_handlers(&self) -> &LogoutRegistry {
        &self.inner.logout
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Requests parked behind the in-flight refresh.
    pub fn pending_requests(&self) -> usize {
        self.inner.refresh.pending_len()
    }

    /// Sends `request`, transparently refreshing the access token once on a 401.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let token = self.inner.credentials.get();
        self.inner.dispatch(request, token).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, Error> {
        self.request(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, Error> {
        self.request(ApiRequest::new(Method::DELETE, path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let body = serde_json::to_value(body)?;
        self.request(ApiRequest::new(Method::POST, path).with_json(body))
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let body = serde_json::to_value(body)?;
        self.request(ApiRequest::new(Method::PUT, path).with_json(body))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let body = serde_json::to_value(body)?;
        self.request(ApiRequest::new(Method::PATCH, path).with_json(body))
            .await
    }

    /// GET and unwrap the `data` member of the envelope.
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get(path).await?.data()
    }
}

impl ClientInner {
    /// Boxed entry into the pipeline; replays re-enter through here.
    pub(crate) fn dispatch(
        self: &Arc<Self>,
        request: ApiRequest,
        token: Option<String>,
    ) -> BoxFuture<Result<ApiResponse, Error>> {
        let this = Arc::clone(self);
        Box::pin(async move { this.execute(request, token).await })
    }

    async fn execute(
        self: &Arc<Self>,
        request: ApiRequest,
        token: Option<String>,
    ) -> Result<ApiResponse, Error> {
        let prepared = match request.prepare(&self.base_url, token.as_deref()) {
            Ok(prepared) => prepared,
            Err(err) => {
                error!("api request not sent: path='{}' error={}", request.path(), err);
                self.report_error(&err);
                return Err(err);
            }
        };
        debug!(
            "api request: {} {} retries={}",
            request.method(),
            request.path(),
            request.retries()
        );

        let response = match self.transport.send(prepared).await {
            Ok(response) => response,
            Err(err) => {
                error!("api network failure: path='{}' error={}", request.path(), err);
                self.report(FALLBACK_MESSAGE.to_string(), None);
                return Err(err);
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status != StatusCode::UNAUTHORIZED {
            let message = classify_response(&response);
            error!(
                "api error: status={} path='{}' message='{}'",
                status,
                request.path(),
                message
            );
            self.report(message.clone(), Some(status));
            return Err(Error::Http(status, message));
        }

        warn!(
            "401 unauthorized: method={} path='{}' retries={}",
            request.method(),
            request.path(),
            request.retries()
        );
        let auth_error = Error::Auth {
            path: request.path().to_string(),
            message: classify_response(&response),
        };

        if request.is_bootstrap() {
            return Err(auth_error);
        }
        if request.has_been_retried() {
            error!("401 after token refresh; giving up on '{}'", request.path());
            self.report_error(&auth_error);
            return Err(auth_error);
        }

        self.recover(request.retried(), auth_error).await
    }

    /// Runs the refresh protocol for a request whose first attempt got a 401.
    async fn recover(
        self: &Arc<Self>,
        request: ApiRequest,
        auth_error: Error,
    ) -> Result<ApiResponse, Error> {
        let path = request.path().to_string();
        let (ticket, request) = match self.refresh.admit(request) {
            Admission::Queued { reply, position } => {
                emit_queued(&path, position);
                return reply
                    .await
                    .unwrap_or_else(|_| Err(Error::RefreshAbandoned));
            }
            Admission::Initiator { ticket, request } => (ticket, request),
        };

        let telemetry = RefreshTelemetry::new(path);
        telemetry.emit_start();

        match self.fetch_access_token().await {
            Ok(token) => {
                self.credentials.set(Some(token.clone()));
                let pending = ticket.settle();
                telemetry.emit_success(pending.len());
                let (reply, outcome) = oneshot::channel();
                let replays: Vec<_> = std::iter::once(PendingRequest { request, reply })
                    .chain(pending)
                    .map(|PendingRequest { request, reply }| {
                        let replay = self.dispatch(request, Some(token.clone()));
                        async move {
                            let _ = reply.send(replay.await);
                        }
                    })
                    .collect();
                // join_all polls in order on its first pass, so the initiator is issued first
                // and queued requests follow in arrival order, on any runtime flavor.
                tokio::spawn(join_all(replays));
                outcome
                    .await
                    .unwrap_or_else(|_| Err(Error::RefreshAbandoned))
            }
            Err(refresh_error) => {
                self.credentials.set(None);
                let pending = ticket.settle();
                telemetry.emit_failure(&refresh_error, pending.len());
                let shared = Arc::new(refresh_error);
                for p in pending {
                    let _ = p.reply.send(Err(Error::Refresh(Arc::clone(&shared))));
                }
                self.report_error(&auth_error);
                warn!(
                    attempt_id = %telemetry.attempt_id(),
                    "session could not be recovered; broadcasting logout"
                );
                self.logout.broadcast();
                Err(auth_error)
            }
        }
    }

    /// Calls the refresh endpoint directly, outside the interception path. The session cookie is
    /// attached by the transport, never by this crate.
    async fn fetch_access_token(&self) -> Result<String, Error> {
        let prepared = ApiRequest::new(Method::POST, REFRESH_PATH).prepare(&self.base_url, None)?;
        let response = self.transport.send(prepared).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth {
                path: REFRESH_PATH.to_string(),
                message: classify_response(&response),
            });
        }
        if !status.is_success() {
            return Err(Error::Http(status, classify_response(&response)));
        }
        let payload: TokenPayload = response.data()?;
        info!(
            "access token refreshed (len={})",
            payload.access_token.len()
        );
        Ok(payload.access_token)
    }

    fn report_error(&self, err: &Error) {
        let message = match err {
            Error::Http(_, message) | Error::Auth { message, .. } => message.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        };
        self.report(message, err.status());
    }

    fn report(&self, message: String, status: Option<StatusCode>) {
        self.notifications.emit(Notification {
            message,
            severity: Severity::Error,
            duration: duration_for(status),
        });
    }
}

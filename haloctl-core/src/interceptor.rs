//! Bearer-token interceptor with single-flight refresh.
//!
//! [`AuthInterceptor`] decorates a [`Transport`]. Every outbound request gets
//! the currently stored access token. When a response comes back 401 the
//! interceptor runs one refresh-or-login cycle; any other request that hits a
//! 401 while that cycle is in flight is queued instead of starting its own.
//! When the cycle finishes the queue is released oldest first, each waiter
//! re-issues its request with the new token, and the request that started the
//! cycle is replayed last. A 401 for a token that a finished cycle has
//! already replaced is replayed directly without another refresh.
//!
//! # State
//!
//! ```text
//!           401 (idle)                    refresh ok / login ok
//!   IDLE ──────────────────▶ REFRESHING ─────────────────────────▶ IDLE, release queue with Ok
//!                               │  ▲
//!                    401 (busy) │  │ enqueue waiter
//!                               ▼  │
//!                            pending queue
//!                               │
//!                               └── refresh + login failed / timed out ──▶ IDLE, release queue with AuthError
//! ```
//!
//! The flag is flipped while holding a synchronous lock, before the first
//! await of the cycle, so two overlapping 401 handlers can never both see
//! `IDLE`.
//!
//! # Example
//!
//! ```rust,ignore
//! use haloctl_core::{AuthInterceptor, InterceptorConfig, MemoryStore, ReqwestTransport};
//! use haloctl_core::transport::HttpRequest;
//!
//! let transport = ReqwestTransport::new("http://localhost:8090/api/admin", timeout)?;
//! let interceptor = AuthInterceptor::new(transport, MemoryStore::new(), InterceptorConfig::default());
//! let response = interceptor.send(HttpRequest::get("/posts")).await?;
//! ```

use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::auth::{self, AuthEndpoints, LoginCredentials, SessionError};
use crate::credentials::{CredentialKey, TokenPair};
use crate::error::ApiError;
use crate::store::{Secret, SecretStore};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Default bound on one refresh-or-login cycle.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// How the access token is attached to outbound requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub name: String,

    /// Prepended to the token with a single space, e.g. `Bearer`.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl TokenHeader {
    /// `Authorization: Bearer <token>`
    pub fn bearer() -> Self {
        Self {
            name: "Authorization".to_string(),
            prefix: Some("Bearer".to_string()),
        }
    }

    /// `Admin-Authorization: <token>`, as used by the Halo admin API.
    pub fn halo_admin() -> Self {
        Self {
            name: "Admin-Authorization".to_string(),
            prefix: None,
        }
    }

    pub fn value(&self, token: &Secret) -> String {
        match &self.prefix {
            Some(prefix) => format!("{} {}", prefix, token.expose()),
            None => token.expose().to_string(),
        }
    }
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self::bearer()
    }
}

/// Settings for an [`AuthInterceptor`].
#[derive(Debug, Clone)]
pub struct InterceptorConfig {
    pub token_header: TokenHeader,
    pub endpoints: AuthEndpoints,

    /// Used when refreshing is impossible or rejected. `None` disables the
    /// login fallback.
    pub login: Option<LoginCredentials>,

    pub refresh_timeout: Duration,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            token_header: TokenHeader::default(),
            endpoints: AuthEndpoints::default(),
            login: None,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

/// What a queued request receives when the cycle ends: its turn to replay,
/// or the reason the cycle failed.
type Waiter = oneshot::Sender<Result<ReplayTurn, String>>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    /// Bumped each time a cycle stores new tokens.
    generation: u64,
    pending: VecDeque<Waiter>,
}

/// Permission to replay, passed along the queue in arrival order.
///
/// Dropping a turn hands it to the next live waiter; after the last one the
/// leader is told it may replay its own request.
struct ReplayTurn {
    rest: VecDeque<Waiter>,
    done: Option<oneshot::Sender<()>>,
}

impl ReplayTurn {
    fn pass(&mut self) {
        while let Some(next) = self.rest.pop_front() {
            let turn = ReplayTurn {
                rest: std::mem::take(&mut self.rest),
                done: self.done.take(),
            };
            match next.send(Ok(turn)) {
                Ok(()) => return,
                // Caller went away; take the turn back and try the next one.
                Err(returned) => {
                    if let Ok(mut turn) = returned {
                        self.rest = std::mem::take(&mut turn.rest);
                        self.done = turn.done.take();
                    }
                }
            }
        }
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

impl Drop for ReplayTurn {
    fn drop(&mut self) {
        self.pass();
    }
}

/// Ends the current cycle exactly once: on [`finish`](Self::finish), or on
/// drop if the leading future was cancelled mid-cycle.
struct CycleGuard<'a> {
    state: &'a Mutex<RefreshState>,
    finished: bool,
}

impl CycleGuard<'_> {
    /// Returns a receiver that fires once every queued request has been
    /// re-dispatched, if any were queued and the cycle succeeded.
    fn finish(mut self, outcome: Result<(), String>) -> Option<oneshot::Receiver<()>> {
        self.release(outcome)
    }

    fn release(&mut self, outcome: Result<(), String>) -> Option<oneshot::Receiver<()>> {
        self.finished = true;
        let pending = {
            let mut state = self.state.lock();
            state.refreshing = false;
            if outcome.is_ok() {
                state.generation += 1;
            }
            std::mem::take(&mut state.pending)
        };
        if pending.is_empty() {
            return None;
        }
        debug!(count = pending.len(), ok = outcome.is_ok(), "Releasing queued requests");

        match outcome {
            Ok(()) => {
                let (tx, rx) = oneshot::channel();
                drop(ReplayTurn {
                    rest: pending,
                    done: Some(tx),
                });
                Some(rx)
            }
            Err(message) => {
                for waiter in pending {
                    let _ = waiter.send(Err(message.clone()));
                }
                None
            }
        }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Token refresh cycle abandoned before completion");
            let _ = self.release(Err("token refresh was abandoned".to_string()));
        }
    }
}

/// Decorator around a [`Transport`] that authenticates every request.
///
/// Share one instance (behind an `Arc`) across all callers; the
/// single-flight guarantee is per instance.
pub struct AuthInterceptor<T, S> {
    transport: T,
    store: S,
    config: InterceptorConfig,
    state: Mutex<RefreshState>,
}

impl<T: Transport, S: SecretStore> AuthInterceptor<T, S> {
    pub fn new(transport: T, store: S, config: InterceptorConfig) -> Self {
        Self {
            transport,
            store,
            config,
            state: Mutex::new(RefreshState::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether a refresh-or-login cycle is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// Number of requests waiting on the in-flight cycle.
    pub fn pending_requests(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Send `request` with the stored token, recovering once from a 401.
    ///
    /// Returns the 2xx response, or the categorized failure.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let (outbound, sent_token) = self.authorize(&request).await?;
        let response = self.transport.send(outbound).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return classify(response);
        }

        debug!(method = %request.method, path = %request.path, "Request unauthorized, recovering session");
        let turn = self.recover(sent_token.as_ref()).await?;

        let (outbound, _) = self.authorize(&request).await?;
        drop(turn);
        let replay = self.transport.send(outbound).await?;
        if replay.status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::auth(
                replay
                    .server_message()
                    .unwrap_or_else(|| "request still unauthorized after token refresh".to_string()),
            ));
        }
        classify(replay)
    }

    /// [`send`](Self::send) and decode the 2xx body as JSON.
    pub async fn send_json<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// Log in with the configured credentials and store the issued tokens.
    ///
    /// Bypasses the refresh queue; meant for an explicit `login` command.
    pub async fn login(&self) -> Result<(), ApiError> {
        let tokens = self
            .login_exchange()
            .await
            .map_err(|e| ApiError::auth(e.to_string()))?;
        tokens.store(&self.store).await?;
        info!("Logged in");
        Ok(())
    }

    /// Attach the stored access token, returning it alongside the request.
    async fn authorize(&self, request: &HttpRequest) -> Result<(HttpRequest, Option<Secret>), ApiError> {
        let token = self.store.get(CredentialKey::AccessToken.as_str()).await?;
        let outbound = match &token {
            Some(token) => {
                let header = &self.config.token_header;
                request.clone().header(header.name.as_str(), header.value(token))
            }
            None => {
                debug!(path = %request.path, "No access token stored, sending unauthenticated");
                request.clone()
            }
        };
        Ok((outbound, token))
    }

    /// Join the in-flight cycle, lead a new one, or return straight away if
    /// the token `sent` with has already been replaced.
    ///
    /// A queued request gets back its [`ReplayTurn`]; it must re-dispatch
    /// before dropping it.
    async fn recover(&self, sent: Option<&Secret>) -> Result<Option<ReplayTurn>, ApiError> {
        let generation = self.state.lock().generation;
        let stored = self.store.get(CredentialKey::AccessToken.as_str()).await?;

        let waiter = {
            let mut state = self.state.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.pending.push_back(tx);
                Some(rx)
            } else if state.generation != generation || !same_token(stored.as_ref(), sent) {
                debug!("Access token already rotated, replaying without refresh");
                return Ok(None);
            } else {
                state.refreshing = true;
                None
            }
        };

        match waiter {
            Some(rx) => {
                debug!("Token refresh in flight, queued request");
                match rx.await {
                    Ok(Ok(turn)) => Ok(Some(turn)),
                    Ok(Err(message)) => Err(ApiError::auth(message)),
                    Err(_) => Err(ApiError::auth("token refresh was abandoned")),
                }
            }
            None => {
                self.lead_cycle().await?;
                Ok(None)
            }
        }
    }

    async fn lead_cycle(&self) -> Result<(), ApiError> {
        let guard = CycleGuard {
            state: &self.state,
            finished: false,
        };

        let outcome = match tokio::time::timeout(self.config.refresh_timeout, self.refresh_or_login()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "Session recovery failed");
                Err(e.to_string())
            }
            Err(_) => {
                error!(timeout = ?self.config.refresh_timeout, "Session recovery timed out");
                Err(format!(
                    "token refresh timed out after {}s",
                    self.config.refresh_timeout.as_secs()
                ))
            }
        };

        // Queued requests go first; the leader replays after them.
        if let Some(replayed) = guard.finish(outcome.clone()) {
            let _ = replayed.await;
        }
        outcome.map_err(ApiError::auth)
    }

    async fn refresh_or_login(&self) -> Result<(), SessionError> {
        let refreshed = match self.store.get(CredentialKey::RefreshToken.as_str()).await? {
            Some(refresh_token) => {
                match auth::refresh(&self.transport, &self.config.endpoints, &refresh_token).await {
                    Ok(tokens) => {
                        info!(expires_in = ?tokens.expires_in, "Access token refreshed");
                        Some(tokens)
                    }
                    Err(e) => {
                        warn!(error = %e, "Token refresh failed, falling back to login");
                        None
                    }
                }
            }
            None => {
                debug!("No refresh token stored, logging in");
                None
            }
        };

        let tokens = match refreshed {
            Some(tokens) => tokens,
            None => {
                let tokens = self.login_exchange().await?;
                info!(expires_in = ?tokens.expires_in, "Logged in after failed refresh");
                tokens
            }
        };

        tokens.store(&self.store).await?;
        Ok(())
    }

    async fn login_exchange(&self) -> Result<TokenPair, SessionError> {
        let credentials = self.config.login.as_ref().ok_or(SessionError::MissingLogin)?;
        auth::login(&self.transport, &self.config.endpoints, credentials).await
    }
}

fn same_token(stored: Option<&Secret>, sent: Option<&Secret>) -> bool {
    match (stored, sent) {
        (Some(stored), Some(sent)) => stored.expose() == sent.expose(),
        (None, None) => true,
        _ => false,
    }
}

/// Map a non-401 response to its outcome.
pub(crate) fn classify(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    let status = response.status;
    if status.is_success() {
        return Ok(response);
    }
    let message = response.server_message();
    match status {
        StatusCode::BAD_REQUEST => Err(ApiError::request(message.unwrap_or_else(|| {
            status.canonical_reason().unwrap_or("bad request").to_string()
        }))),
        StatusCode::UNAUTHORIZED => Err(ApiError::auth(
            message.unwrap_or_else(|| "unauthorized".to_string()),
        )),
        _ => Err(ApiError::Server {
            status: status.as_u16(),
            message: message
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16())),
        }),
    }
}

//! Request and response interception for bearer auth.
//!
//! Refresh coordination is a small state machine guarded by a non-async
//! mutex: `refreshing` plus a FIFO of requests waiting on the in-flight
//! refresh. The lock is only held between await points, so the
//! check-and-set that elects the refresh leader is atomic with respect to
//! every other request.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{AuthOptions, SharedAuthHooks};
use crate::client::PameClient;
use crate::error::{Error, RefreshError, Result};
use crate::request::ApiRequest;

/// A request that hit 401 while a refresh was already running.
struct PendingRequest {
    request: ApiRequest,
    reply: oneshot::Sender<Result<reqwest::Response>>,
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    queue: VecDeque<PendingRequest>,
}

enum Role {
    /// Runs the refresh and settles the queue.
    Leader(ApiRequest),
    /// Waits for the leader's outcome.
    Follower(oneshot::Receiver<Result<reqwest::Response>>),
}

/// Auth interceptors attached to a client.
pub(crate) struct AuthInterceptor {
    hooks: SharedAuthHooks,
    options: AuthOptions,
    state: Mutex<RefreshState>,
}

impl AuthInterceptor {
    pub(crate) fn new(hooks: SharedAuthHooks, options: AuthOptions) -> Self {
        Self {
            hooks,
            options,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Send a request through both interceptors.
    pub(crate) async fn send(
        &self,
        client: &PameClient,
        mut request: ApiRequest,
    ) -> Result<reqwest::Response> {
        self.authorize(&mut request).await;

        match client.dispatch(&request).await {
            Ok(response) => Ok(response),
            Err(err) => self.recover(client, request, err).await,
        }
    }

    fn is_exempt(&self, request: &ApiRequest) -> bool {
        request.flags().skip_auth || self.options.exclude_paths.is_match(request.path())
    }

    /// Request side: attach the current access token.
    async fn authorize(&self, request: &mut ApiRequest) {
        if self.is_exempt(request) {
            return;
        }

        let token = match self.hooks.access_token().await {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, path = request.path(), "access token unavailable");
                None
            }
        };

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request.set_bearer(&token);
        }
    }

    /// Response side: decide whether a failed request can be recovered.
    async fn recover(
        &self,
        client: &PameClient,
        mut request: ApiRequest,
        err: Error,
    ) -> Result<reqwest::Response> {
        if self.is_exempt(&request) || request.flags().no_refresh {
            return Err(err);
        }
        if !err.is_unauthorized() || request.flags().retried {
            return Err(err);
        }

        request.mark_retried();

        let role = {
            let mut state = self.state.lock();
            if state.refreshing {
                let (reply, rx) = oneshot::channel();
                debug!(
                    path = request.path(),
                    position = state.queue.len() + 1,
                    "refresh in flight, queuing request"
                );
                state.queue.push_back(PendingRequest { request, reply });
                Role::Follower(rx)
            } else {
                state.refreshing = true;
                Role::Leader(request)
            }
        };

        match role {
            Role::Follower(rx) => rx
                .await
                .unwrap_or(Err(Error::Refresh(RefreshError::Abandoned))),
            Role::Leader(request) => self.lead_refresh(client, request).await,
        }
    }

    async fn lead_refresh(
        &self,
        client: &PameClient,
        mut request: ApiRequest,
    ) -> Result<reqwest::Response> {
        let mut cycle = RefreshCycle::new(&self.state);

        info!(path = request.path(), "access token rejected, refreshing");
        let outcome = self.run_refresh(client).await;
        let queued = cycle.settle();

        match outcome {
            Ok(token) => {
                info!(replaying = queued.len(), "access token refreshed");

                if !queued.is_empty() {
                    let client = client.clone();
                    let token = token.clone();
                    tokio::spawn(async move {
                        for PendingRequest { mut request, reply } in queued {
                            request.set_bearer(&token);
                            let result = client.dispatch(&request).await;
                            let _ = reply.send(result);
                        }
                    });
                }

                request.set_bearer(&token);
                client.dispatch(&request).await
            }
            Err(e) => {
                warn!(error = %e, rejected = queued.len(), "token refresh failed");

                for pending in queued {
                    let _ = pending.reply.send(Err(Error::Refresh(e.clone())));
                }

                self.hooks.on_unauthorized(client).await;
                Err(Error::Refresh(e))
            }
        }
    }

    async fn run_refresh(&self, client: &PameClient) -> std::result::Result<String, RefreshError> {
        let refresh = self.hooks.refresh_access_token(client);

        let outcome = match self.options.refresh_timeout {
            Some(limit) => match tokio::time::timeout(limit, refresh).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(RefreshError::TimedOut(limit)),
            },
            None => refresh.await,
        };

        match outcome {
            Ok(Some(token)) if !token.is_empty() => Ok(token),
            Ok(_) => Err(RefreshError::NoToken),
            Err(e) => Err(RefreshError::from_error(e)),
        }
    }

    #[cfg(test)]
    fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }
}

/// Leader's hold on the refresh state.
///
/// Dropping it without [`RefreshCycle::settle`] (the leader's future was
/// cancelled) returns the state to idle and rejects everything queued.
struct RefreshCycle<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl<'a> RefreshCycle<'a> {
    fn new(state: &'a Mutex<RefreshState>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    /// Return to idle and hand back the queue, in arrival order.
    fn settle(&mut self) -> VecDeque<PendingRequest> {
        self.settled = true;
        let mut state = self.state.lock();
        state.refreshing = false;
        std::mem::take(&mut state.queue)
    }
}

impl Drop for RefreshCycle<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        for pending in self.settle() {
            let _ = pending
                .reply
                .send(Err(Error::Refresh(RefreshError::Abandoned)));
        }
    }
}

//! API client.
//!
//! One configured client per process. Outgoing requests get the base URL,
//! the default JSON content type, a request id, and the bearer token when a
//! session exists. A 401 clears the session and is announced to
//! `on_unauthorized` listeners; the error is still returned to the caller.

use crate::error::{FolioError, FolioResult};
use crate::request::{HttpClient, HttpRequest, HttpResponse};
use crate::session::{SessionEvent, SessionState};
use folio_shared::protocol::{Endpoint, HttpMethod};
use folio_shared::{CONTENT_TYPE_JSON, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HEADER_REQUEST_ID};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Bounded retry for GET requests that got no response at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn allows(&self, method: HttpMethod, attempt: u32, err: &FolioError) -> bool {
        method.is_idempotent_read() && err.is_network() && attempt < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Emitted after a 401 has cleared the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedEvent {
    pub method: HttpMethod,
    pub path: String,
}

type UnauthorizedListener = Rc<dyn Fn(&UnauthorizedEvent)>;

struct ClientInner {
    base_url: String,
    http: Rc<dyn HttpClient>,
    session: Rc<SessionState>,
    retry: RetryPolicy,
    unauthorized_listeners: RefCell<Vec<UnauthorizedListener>>,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Rc<ClientInner>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        retry: RetryPolicy,
        http: Rc<dyn HttpClient>,
        session: Rc<SessionState>,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            inner: Rc::new(ClientInner {
                base_url,
                http,
                session,
                retry,
                unauthorized_listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    /// Registers a 401 handler, typically a redirect to the login view.
    pub fn on_unauthorized(&self, listener: impl Fn(&UnauthorizedEvent) + 'static) {
        self.inner
            .unauthorized_listeners
            .borrow_mut()
            .push(Rc::new(listener));
    }

    /// Sends one endpoint call and decodes its response.
    pub async fn call<E: Endpoint>(&self, endpoint: &E) -> FolioResult<E::Response> {
        let path = endpoint.path();
        let mut req = HttpRequest::new(&self.url(&path), E::METHOD)
            .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);

        if let Some(body) = endpoint.body() {
            let body = serde_json::to_string(body)
                .map_err(|e| FolioError::from(e).in_op_with("http.encode", path.clone()))?;
            req = req.with_body(body);
        }

        let req = self.intercept_request(req);
        let request_id = req.header(HEADER_REQUEST_ID).unwrap_or_default().to_string();

        let resp = self
            .send_with_retry(req)
            .await
            .map_err(|e| e.in_op_with("http.send", format!("{} {}", E::METHOD.as_str(), path)))?;

        debug!(
            method = E::METHOD.as_str(),
            path = %path,
            status = resp.status,
            request_id = %request_id,
            "response received"
        );

        self.intercept_response::<E>(&path, resp)
    }

    // =========================================================
    // Interceptors
    // =========================================================

    fn intercept_request(&self, req: HttpRequest) -> HttpRequest {
        let req = req.with_header(HEADER_REQUEST_ID, &Uuid::new_v4().to_string());
        match self.inner.session.token() {
            Some(token) => req.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token)),
            None => req,
        }
    }

    fn intercept_response<E: Endpoint>(&self, path: &str, resp: HttpResponse) -> FolioResult<E::Response> {
        if resp.ok() {
            if E::DISCARDS_BODY {
                return serde_json::from_value(serde_json::Value::Null)
                    .map_err(|e| FolioError::from(e).in_op_with("http.decode", path.to_string()));
            }
            return resp
                .json::<E::Response>()
                .map_err(|e| e.in_op_with("http.decode", path.to_string()));
        }

        let err = FolioError::from_response(resp.status, &resp.body);
        warn!(
            method = E::METHOD.as_str(),
            path = %path,
            status = resp.status,
            error = %err,
            "request failed"
        );

        if resp.status == 401 && !E::CREDENTIAL_EXCHANGE {
            self.expire_session(E::METHOD, path);
        }

        Err(err.in_op_with("http.response", format!("{} {}", E::METHOD.as_str(), path)))
    }

    fn expire_session(&self, method: HttpMethod, path: &str) {
        self.inner.session.clear(SessionEvent::Expired);

        let event = UnauthorizedEvent {
            method,
            path: path.to_string(),
        };
        let listeners: Vec<UnauthorizedListener> =
            self.inner.unauthorized_listeners.borrow().clone();
        for listener in listeners {
            listener(&event);
        }
    }

    async fn send_with_retry(&self, req: HttpRequest) -> FolioResult<HttpResponse> {
        let mut attempt = 0;
        loop {
            match self.inner.http.send(req.clone()).await {
                Ok(resp) => return Ok(resp),
                Err(e) if self.inner.retry.allows(req.method, attempt, &e) => {
                    attempt += 1;
                    warn!(
                        url = %req.url,
                        attempt,
                        error = %e,
                        "read failed without a response, retrying"
                    );
                    tokio::time::sleep(self.inner.retry.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! The core never opens a socket on its own; `SessionManager` and
//! `TodoCollection` hand each built request to a `Transport` and parse what
//! comes back. Non-2xx statuses are data, not errors: only a failure to obtain
//! any response at all is an `ApiError::Transport`.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs one HTTP round trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use std::time::Duration;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a shared `ureq::Agent`.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new(timeout: Duration) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new(Duration::from_secs(10))
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
            tracing::debug!(method = req.method.as_str(), path = %req.path, "sending request");
            let headers = req.headers;
            let result = match (req.method, req.body) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(&req.path), &headers).call(),
                (HttpMethod::Delete, _) => {
                    with_headers(self.agent.delete(&req.path), &headers).call()
                }
                (HttpMethod::Post, Some(body)) => {
                    with_headers(self.agent.post(&req.path), &headers).send(body.as_bytes())
                }
                (HttpMethod::Post, None) => {
                    with_headers(self.agent.post(&req.path), &headers).send_empty()
                }
                (HttpMethod::Put, Some(body)) => {
                    with_headers(self.agent.put(&req.path), &headers).send(body.as_bytes())
                }
                (HttpMethod::Put, None) => {
                    with_headers(self.agent.put(&req.path), &headers).send_empty()
                }
            };
            let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            tracing::debug!(status, "received response");

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

/// In-memory transport for unit tests: replays queued responses and records
/// every request it was asked to execute.
#[cfg(test)]
pub(crate) mod scripted {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(&self, status: u16, body: &str) -> &Self {
            self.replies
                .borrow_mut()
                .push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        pub(crate) fn fail(&self, message: &str) -> &Self {
            self.replies
                .borrow_mut()
                .push_back(Err(ApiError::Transport(message.to_string())));
            self
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }

        /// `(method, path)` pairs in the order they were issued.
        pub(crate) fn calls(&self) -> Vec<(HttpMethod, String)> {
            self.requests
                .borrow()
                .iter()
                .map(|req| (req.method, req.path.clone()))
                .collect()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(request);
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("no scripted reply".to_string())))
        }
    }
}

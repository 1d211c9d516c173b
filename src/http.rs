//! HTTP transport
//!
//! Every network read goes through the [`Transport`] trait so the resolver and
//! the acquisition cascade can run against an in-memory fake in tests. The
//! production implementation is a blocking `ureq` agent.

use crate::core::config::Config;
use crate::error::HttpError;
use serde::de::DeserializeOwned;
use std::io::Read;

/// Accept header for GitHub REST API requests
pub const GITHUB_JSON: &str = "application/vnd.github+json";

/// A response body being read from the network.
pub type Body = Box<dyn Read + Send>;

/// One outbound GET request.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub url: &'a str,
    pub accept: Option<&'a str>,
    pub bearer: Option<&'a str>,
}

impl<'a> Request<'a> {
    pub fn new(url: &'a str) -> Self {
        Self {
            url,
            accept: None,
            bearer: None,
        }
    }

    pub fn accept(mut self, accept: &'a str) -> Self {
        self.accept = Some(accept);
        self
    }

    pub fn bearer(mut self, token: Option<&'a str>) -> Self {
        self.bearer = token;
        self
    }
}

/// Opens response bodies for GET requests.
///
/// Implementations must return an error for non-success statuses instead of
/// handing back an error page as a body.
pub trait Transport {
    fn get(&self, request: &Request<'_>) -> Result<Body, HttpError>;
}

/// Read a whole response body, failing on an empty one.
pub fn fetch_bytes(transport: &dyn Transport, request: &Request<'_>) -> Result<Vec<u8>, HttpError> {
    let mut body = transport.get(request)?;
    let mut data = Vec::new();
    body.read_to_end(&mut data).map_err(|source| HttpError::Read {
        url: request.url.to_string(),
        source,
    })?;
    if data.is_empty() {
        return Err(HttpError::EmptyBody {
            url: request.url.to_string(),
        });
    }
    Ok(data)
}

/// Read a response body as text, replacing invalid UTF-8.
pub fn fetch_text(transport: &dyn Transport, request: &Request<'_>) -> Result<String, HttpError> {
    let data = fetch_bytes(transport, request)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Read and deserialize a JSON response body.
pub fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: &Request<'_>,
) -> Result<T, HttpError> {
    let data = fetch_bytes(transport, request)?;
    serde_json::from_slice(&data).map_err(|e| HttpError::Decode {
        url: request.url.to_string(),
        message: e.to_string(),
    })
}

/// Blocking transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .user_agent(&config.user_agent)
            .build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, request: &Request<'_>) -> Result<Body, HttpError> {
        let mut req = self.agent.get(request.url);
        if let Some(accept) = request.accept {
            req = req.set("Accept", accept);
        }
        if let Some(token) = request.bearer {
            req = req.set("Authorization", &format!("Bearer {}", token));
        }

        tracing::debug!(url = request.url, "GET");
        match req.call() {
            Ok(response) => Ok(Box::new(response.into_reader())),
            Err(ureq::Error::Status(status, _)) => Err(HttpError::from_status(request.url, status)),
            Err(e) => Err(HttpError::Transport {
                url: request.url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

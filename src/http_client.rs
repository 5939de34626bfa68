//! Blocking HTTP capability shared by every provider client.

use std::io::Read;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0 Safari/537.36";

/// Transport-level failure; HTTP status codes are never reported through this type.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{url}: {message}")]
    Transport { url: String, message: String },

    #[error("{url}: failed to read response body: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Status and raw body of one GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

pub trait HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// Builds `base?k=v&...` with percent-encoded values.
pub fn request_url_with_params(base: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}

/// `ureq` agent with a fixed identity header and per-request timeout.
pub struct UreqHttpClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqHttpClient {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            user_agent: user_agent.into(),
        }
    }

    fn read_response(url: &str, response: ureq::Response) -> Result<HttpResponse, HttpError> {
        let status = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|source| HttpError::Read {
                url: url.to_string(),
                source,
            })?;
        Ok(HttpResponse { status, body })
    }
}

impl HttpClient for UreqHttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        match self
            .agent
            .get(url)
            .set("User-Agent", &self.user_agent)
            .call()
        {
            Ok(response) => Self::read_response(url, response),
            // ureq reports 4xx/5xx as errors; callers want them as plain statuses.
            Err(ureq::Error::Status(_, response)) => Self::read_response(url, response),
            Err(ureq::Error::Transport(transport)) => Err(HttpError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{request_url_with_params, HttpResponse};

    #[test]
    fn test_request_url_with_params_encodes_values() {
        assert_eq!(
            request_url_with_params("https://x.test/api", &[("q", "周 柯宇"), ("n", "1")]),
            "https://x.test/api?q=%E5%91%A8%20%E6%9F%AF%E5%AE%87&n=1"
        );
    }

    #[test]
    fn test_request_url_with_params_without_params_returns_base() {
        assert_eq!(
            request_url_with_params("https://x.test/api", &[]),
            "https://x.test/api"
        );
    }

    #[test]
    fn test_http_response_json_rejects_html_body() {
        let response = HttpResponse {
            status: 200,
            body: b"<html></html>".to_vec(),
        };
        assert!(response.is_ok());
        assert!(response.json().is_err());
    }
}

//! Fetch collaborators for `x-url` directives
//!
//! The evaluator only knows the [`Fetcher`] trait. [`HttpFetcher`] performs
//! real requests with `reqwest`; [`StaticFetcher`] answers from canned
//! responses for offline rendering.

use crate::config::runtime::FetchPreferences;
use crate::logging::{codes, Code};
use crate::log_debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Status and body of one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Any 2xx status
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Unsupported fetch method '{method}'")]
    UnsupportedMethod { method: String },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Reading response from {url} failed: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Response from {url} exceeds {max} bytes")]
    ResponseTooLarge { url: String, max: usize },

    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to read fetch fixtures '{path}': {source}")]
    FixtureIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fetch fixtures: {0}")]
    Fixture(#[from] serde_json::Error),
}

impl FetchError {
    pub fn error_code(&self) -> Code {
        match self {
            FetchError::UnsupportedMethod { .. } => codes::directive::UNSUPPORTED_METHOD,
            FetchError::InvalidUrl { .. } | FetchError::UnsupportedScheme { .. } => {
                codes::directive::INVALID_URL
            }
            FetchError::Transport { .. } | FetchError::Read { .. } | FetchError::Client(_) => {
                codes::directive::TRANSPORT_FAILURE
            }
            FetchError::ResponseTooLarge { .. } => codes::directive::RESPONSE_TOO_LARGE,
            FetchError::FixtureIo { .. } => codes::file_processing::IO_ERROR,
            FetchError::Fixture(_) => codes::system::CONFIGURATION_INVALID,
        }
    }
}

/// Performs the outbound request for a directive
pub trait Fetcher {
    /// `method` is already lower-cased
    fn fetch(&self, method: &str, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Build the blocking client used for directive fetches
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

/// HTTP(S) fetcher backed by `reqwest::blocking`
pub struct HttpFetcher {
    client: Client,
    max_response_size: usize,
}

impl HttpFetcher {
    pub fn new(preferences: &FetchPreferences) -> Result<Self, FetchError> {
        let client = build_client(
            Duration::from_secs(preferences.timeout_seconds),
            &preferences.user_agent,
        )?;

        Ok(Self {
            client,
            max_response_size: preferences.max_response_size,
        })
    }

    fn parse_url(url: &str) -> Result<Url, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
                scheme: scheme.to_string(),
            }),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, method: &str, url: &str) -> Result<FetchResponse, FetchError> {
        if method != "get" {
            return Err(FetchError::UnsupportedMethod {
                method: method.to_string(),
            });
        }

        let parsed = Self::parse_url(url)?;

        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();

        // One byte over the cap tells a full-size body from an oversized one
        let mut buffer = Vec::new();
        response
            .take(self.max_response_size as u64 + 1)
            .read_to_end(&mut buffer)
            .map_err(|source| FetchError::Read {
                url: url.to_string(),
                source,
            })?;

        if buffer.len() > self.max_response_size {
            return Err(FetchError::ResponseTooLarge {
                url: url.to_string(),
                max: self.max_response_size,
            });
        }

        log_debug!("Fetched directive URL",
            "url" => url,
            "status" => status,
            "bytes" => buffer.len()
        );

        Ok(FetchResponse {
            status,
            body: String::from_utf8_lossy(&buffer).into_owned(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CannedResponse {
    Body(String),
    Full {
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default)]
        body: String,
    },
}

fn default_status() -> u16 {
    200
}

impl From<CannedResponse> for FetchResponse {
    fn from(canned: CannedResponse) -> Self {
        match canned {
            CannedResponse::Body(body) => FetchResponse::new(200, body),
            CannedResponse::Full { status, body } => FetchResponse::new(status, body),
        }
    }
}

/// Canned responses keyed by URL. Unknown URLs answer 404.
///
/// Fixture JSON maps each URL to either a body string or
/// `{"status": 503, "body": "..."}`.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, FetchResponse>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, status: u16, body: &str) -> Self {
        self.insert(url, FetchResponse::new(status, body));
        self
    }

    pub fn insert(&mut self, url: &str, response: FetchResponse) {
        self.responses.insert(url.to_string(), response);
    }

    pub fn from_json_str(content: &str) -> Result<Self, FetchError> {
        let canned: HashMap<String, CannedResponse> = serde_json::from_str(content)?;
        Ok(Self {
            responses: canned
                .into_iter()
                .map(|(url, response)| (url, response.into()))
                .collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path).map_err(|source| FetchError::FixtureIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, method: &str, url: &str) -> Result<FetchResponse, FetchError> {
        if method != "get" {
            return Err(FetchError::UnsupportedMethod {
                method: method.to_string(),
            });
        }

        Ok(self
            .responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(404, "")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_success_range() {
        assert!(FetchResponse::new(200, "").is_success());
        assert!(FetchResponse::new(204, "").is_success());
        assert!(!FetchResponse::new(199, "").is_success());
        assert!(!FetchResponse::new(301, "").is_success());
        assert!(!FetchResponse::new(500, "").is_success());
    }

    #[test]
    fn test_static_fetcher_answers_known_and_unknown_urls() {
        let fetcher = StaticFetcher::new().with_response("https://a.test/x", 200, "hello");

        assert_eq!(
            fetcher.fetch("get", "https://a.test/x").unwrap(),
            FetchResponse::new(200, "hello")
        );
        assert_eq!(fetcher.fetch("get", "https://a.test/y").unwrap().status, 404);
        assert_matches!(
            fetcher.fetch("post", "https://a.test/x"),
            Err(FetchError::UnsupportedMethod { .. })
        );
    }

    #[test]
    fn test_fixture_formats() {
        let fetcher = StaticFetcher::from_json_str(
            r#"{
                "https://a.test/plain": "body text",
                "https://a.test/down": {"status": 503},
                "https://a.test/full": {"status": 201, "body": "made"}
            }"#,
        )
        .unwrap();

        assert_eq!(fetcher.len(), 3);
        assert_eq!(
            fetcher.fetch("get", "https://a.test/plain").unwrap(),
            FetchResponse::new(200, "body text")
        );
        assert_eq!(
            fetcher.fetch("get", "https://a.test/down").unwrap(),
            FetchResponse::new(503, "")
        );
        assert_eq!(fetcher.fetch("get", "https://a.test/full").unwrap().body, "made");
    }

    #[test]
    fn test_fixture_errors() {
        let err = StaticFetcher::from_json_str("[1, 2]").unwrap_err();
        assert_matches!(err, FetchError::Fixture(_));

        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            StaticFetcher::load(&dir.path().join("absent.json")),
            Err(FetchError::FixtureIo { .. })
        );
    }

    #[test]
    fn test_http_fetcher_rejects_bad_urls_without_network() {
        let fetcher = HttpFetcher::new(&FetchPreferences::default()).unwrap();

        let err = fetcher.fetch("get", "not a url").unwrap_err();
        assert_matches!(err, FetchError::InvalidUrl { .. });
        assert_eq!(err.error_code(), codes::directive::INVALID_URL);

        assert_matches!(
            fetcher.fetch("get", "ftp://host/file"),
            Err(FetchError::UnsupportedScheme { .. })
        );
        assert_matches!(
            fetcher.fetch("delete", "https://host/"),
            Err(FetchError::UnsupportedMethod { .. })
        );
    }
}

//! Blocking ISS client.

use std::time::{Duration, Instant};

use log::debug;
use moexiss_table::{Blocks, NormalizationSpec, Table, Tables, parse_blocks, to_tables};
use moexiss_types::{IssError, ParseError, RawResponse, Result, ValidationError};
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;

use crate::RateLimiter;
use crate::url::{BASE_URL, ParamValue, Params, build_url};

/// Back-off reported for a 429 without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Configuration for the ISS client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root every endpoint is appended to.
    pub base_url: String,
    /// Minimum interval between consecutive requests.
    pub rate_limit: Duration,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Whether to ask the API for block metadata (`iss.meta`).
    pub meta: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            rate_limit: Duration::from_millis(200),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("moexiss/{}", env!("CARGO_PKG_VERSION")),
            meta: false,
        }
    }
}

impl ClientConfig {
    /// Environment variable overriding [`ClientConfig::base_url`].
    pub const ENV_BASE_URL: &'static str = "MOEXISS_BASE_URL";
    /// Environment variable overriding [`ClientConfig::rate_limit`], in milliseconds.
    pub const ENV_RATE_LIMIT_MS: &'static str = "MOEXISS_RATE_LIMIT_MS";
    /// Environment variable overriding [`ClientConfig::timeout`], in seconds.
    pub const ENV_TIMEOUT_SECS: &'static str = "MOEXISS_TIMEOUT_SECS";

    /// Sets the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the minimum interval between requests.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether block metadata is requested.
    #[must_use]
    pub const fn with_meta(mut self, meta: bool) -> Self {
        self.meta = meta;
        self
    }

    /// Returns the defaults overlaid with `MOEXISS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] if a numeric variable does
    /// not parse.
    pub fn from_env() -> std::result::Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(base_url) = lookup(Self::ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(ms) = lookup(Self::ENV_RATE_LIMIT_MS) {
            config.rate_limit = Duration::from_millis(parse_env(Self::ENV_RATE_LIMIT_MS, &ms)?);
        }
        if let Some(secs) = lookup(Self::ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(parse_env(Self::ENV_TIMEOUT_SECS, &secs)?);
        }
        Ok(config)
    }
}

fn parse_env(key: &str, value: &str) -> std::result::Result<u64, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Parameters go in the query string.
    #[default]
    Get,
    /// Parameters go in a form body.
    Post,
}

/// One ISS request: an endpoint template plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    endpoint: String,
    path: Vec<(String, String)>,
    params: Params,
    method: Method,
}

impl Request {
    /// Creates a GET request for an endpoint template such as
    /// `/engines/[engine]/markets`.
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            path: Vec::new(),
            params: Params::new(),
            method: Method::Get,
        }
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(endpoint)
        }
    }

    /// Supplies a value for a `[name]` placeholder.
    #[must_use]
    pub fn path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.set(name, value);
        self
    }

    /// Replaces all query parameters.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Returns the endpoint template.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }
}

/// Blocking client for the ISS API.
///
/// Requests are strictly sequential and spaced by the configured rate limit.
/// Errors are never retried.
#[derive(Debug)]
pub struct IssClient {
    http: Client,
    config: ClientConfig,
    limiter: RateLimiter,
}

impl IssClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IssError::Connection`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| IssError::connection("Failed to build HTTP client", e))?;
        let limiter = RateLimiter::new(config.rate_limit);
        Ok(Self {
            http,
            config,
            limiter,
        })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IssError::Connection`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the full URL a request resolves to.
    ///
    /// # Errors
    ///
    /// Returns [`IssError::Validation`] for unresolved placeholders.
    pub fn url_for(&self, request: &Request) -> Result<String> {
        Ok(build_url(&self.config.base_url, &request.endpoint, &request.path)?)
    }

    /// Returns the query or form parameters sent with a request.
    #[must_use]
    pub fn query_for(&self, request: &Request) -> Vec<(String, String)> {
        let mut query = vec![(
            "iss.meta".to_string(),
            if self.config.meta { "on" } else { "off" }.to_string(),
        )];
        query.extend(
            request
                .params
                .to_query()
                .into_iter()
                .filter(|(name, _)| name != "iss.meta"),
        );
        query
    }

    /// Performs a request and returns the body of a successful response.
    ///
    /// # Errors
    ///
    /// - [`IssError::Validation`] for unresolved placeholders
    /// - [`IssError::Connection`] for transport failures
    /// - [`IssError::RateLimit`], [`IssError::Auth`] or [`IssError::Response`]
    ///   for error statuses
    pub fn get_text(&self, request: &Request) -> Result<String> {
        let url = self.url_for(request)?;
        let query = self.query_for(request);

        self.limiter.acquire();
        let started = Instant::now();
        let sent = match request.method {
            Method::Get => self.http.get(&url).query(&query).send(),
            Method::Post => self.http.post(&url).form(&query).send(),
        };
        self.limiter.record();

        let response = sent.map_err(|e| IssError::connection("Failed to connect to MOEX API", e))?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let final_url = response.url().to_string();
        let body = response
            .text()
            .map_err(|e| IssError::connection("Failed to read response body", e))?;

        debug!(
            "{:?} {url} -> {status} in {:?}",
            request.method,
            started.elapsed()
        );

        check_status(
            RawResponse {
                url: final_url,
                status,
                body,
            },
            retry_after.as_deref(),
        )
        .map(|response| response.body)
    }

    /// Performs a request and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Everything [`IssClient::get_text`] reports, plus
    /// [`ParseError::InvalidJson`] carrying the body when it is not JSON.
    pub fn get_json(&self, request: &Request) -> Result<serde_json::Value> {
        let body = self.get_text(request)?;
        serde_json::from_str(&body)
            .map_err(|source| ParseError::InvalidJson { source, body }.into())
    }

    /// Performs a request and extracts its data blocks.
    ///
    /// # Errors
    ///
    /// Everything [`IssClient::get_json`] reports, plus block schema errors.
    pub fn get_blocks(&self, request: &Request) -> Result<Blocks> {
        Ok(parse_blocks(self.get_json(request)?)?)
    }

    /// Performs a request and converts it into tables.
    ///
    /// With `block` set the result is [`Tables::Single`]; otherwise every
    /// non-empty block is returned. `normalize` is applied to each table.
    ///
    /// # Errors
    ///
    /// Everything [`IssClient::get_blocks`] reports, plus
    /// [`ParseError::BlockNotFound`] for a missing block.
    pub fn get_tables(
        &self,
        request: &Request,
        block: Option<&str>,
        normalize: Option<&NormalizationSpec>,
    ) -> Result<Tables> {
        let tables = to_tables(self.get_blocks(request)?, block)?;
        Ok(match normalize {
            Some(spec) => tables.normalize(spec),
            None => tables,
        })
    }

    /// Performs a request and returns one block as a table.
    ///
    /// # Errors
    ///
    /// Same as [`IssClient::get_tables`].
    pub fn get_table(&self, request: &Request, block: &str) -> Result<Table> {
        let mut blocks = self.get_blocks(request)?;
        let rows = blocks
            .shift_remove(block)
            .ok_or_else(|| ParseError::BlockNotFound(block.to_string()))?;
        Ok(Table::from_rows(rows)?)
    }
}

/// Maps an error status to the matching [`IssError`] and passes successful
/// responses through.
///
/// - 429: [`IssError::RateLimit`]; `Retry-After` seconds, or 60 when absent
/// - 401, 403: [`IssError::Auth`]
/// - any other status >= 400: [`IssError::Response`]
///
/// # Errors
///
/// Returns the mapped error for statuses >= 400.
pub fn check_status(response: RawResponse, retry_after: Option<&str>) -> Result<RawResponse> {
    let status = response.status;
    match status {
        429 => Err(IssError::RateLimit {
            message: "Rate limit exceeded".to_string(),
            status,
            retry_after: retry_after
                .and_then(|v| v.trim().parse().ok())
                .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs),
            response,
        }),
        401 | 403 => Err(IssError::Auth {
            message: "Authentication failed".to_string(),
            status,
            response,
        }),
        s if s >= 400 => Err(IssError::Response {
            message: format!("API returned error response: {status}"),
            status,
            response,
        }),
        _ => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moexiss_types::ErrorKind;

    fn raw(status: u16) -> RawResponse {
        RawResponse {
            url: "https://iss.moex.com/iss/engines.json".to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://iss.moex.com/iss");
        assert_eq!(config.rate_limit, Duration::from_millis(200));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("moexiss/"));
        assert!(!config.meta);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            "MOEXISS_BASE_URL" => Some("http://127.0.0.1:9000/iss".to_string()),
            "MOEXISS_RATE_LIMIT_MS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000/iss");
        assert_eq!(config.rate_limit, Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(30));

        let err = ClientConfig::from_lookup(|key| {
            (key == "MOEXISS_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidConfig { .. }));
    }

    #[test]
    fn test_rate_limit_with_header() {
        let err = check_status(raw(429), Some("60")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
        assert_eq!(err.status(), Some(429));

        let err = check_status(raw(429), Some("5")).unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_rate_limit_without_header() {
        let err = check_status(raw(429), None).unwrap_err();
        assert_eq!(err.retry_after(), Some(DEFAULT_RETRY_AFTER));
    }

    #[test]
    fn test_auth_statuses() {
        for status in [401, 403] {
            let err = check_status(raw(status), None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Auth);
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn test_other_error_statuses() {
        for status in [400, 404, 500, 503] {
            let err = check_status(raw(status), None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Response);
            assert_eq!(err.message(), format!("API returned error response: {status}"));
            assert_eq!(err.response().map(|r| r.status), Some(status));
        }
    }

    #[test]
    fn test_success_passes_through() {
        assert_eq!(check_status(raw(200), None).unwrap(), raw(200));
        assert_eq!(check_status(raw(304), None).unwrap(), raw(304));
    }

    #[test]
    fn test_query_for_adds_meta_off() {
        let client = IssClient::with_defaults().unwrap();
        let request = Request::get("/securities").param("q", "sber");
        assert_eq!(
            client.query_for(&request),
            [
                ("iss.meta".to_string(), "off".to_string()),
                ("q".to_string(), "sber".to_string()),
            ]
        );
    }

    #[test]
    fn test_url_for() {
        let client = IssClient::with_defaults().unwrap();
        let request = Request::get("/engines/[engine]/markets").path("engine", "stock");
        assert_eq!(
            client.url_for(&request).unwrap(),
            "https://iss.moex.com/iss/engines/stock/markets.json"
        );
        let err = client.url_for(&Request::get("/engines/[engine]")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

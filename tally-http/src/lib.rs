//! Page download client for `wordtally`.
//!
//! [`HttpClient::get_text`] issues a GET and returns the body as UTF-8 text.
//! Throttling (429), server errors (5xx) and transport failures are retried
//! within a budget, waiting `200ms * 2^k` or whatever `Retry-After` asks for.
//!
//! ```no_run
//! # async fn demo() -> Result<(), tally_http::HttpError> {
//! use tally_http::{HttpClient, RequestOpts};
//!
//! let client = HttpClient::new()?.with_retries(2);
//! let url = reqwest::Url::parse("https://www.example.com/").expect("static url");
//! let markup = client.get_text(&url, RequestOpts::default()).await?;
//! # let _ = markup;
//! # Ok(()) }
//! ```
//!
//! Every attempt logs `http.request.start` and `http.response.headers` at
//! debug level. Set `TALLY_HTTP_RAW=1` to also log a replayable curl line and
//! the response body under the `http.raw` target. Credentials in query
//! strings and headers are masked in all of these.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use reqwest::header::{
    ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT,
};
use reqwest::{Client, Method, Response, StatusCode, Url};
use thiserror::Error;

const RAW_ENV: &str = "TALLY_HTTP_RAW";
const RAW_BODY_LIMIT: usize = 64 * 1024;
const SNIPPET_LIMIT: usize = 500;
const REDACTED: &str = "<redacted>";
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("body is not valid UTF-8: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// Per-request overrides of the client defaults.
///
/// ```
/// use std::time::Duration;
/// use tally_http::RequestOpts;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("lang", "en".into())]),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout, Some(Duration::from_secs(30)));
/// assert!(opts.retries.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    /// Merged over the client's `User-Agent` and `Accept`.
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    default_headers: HeaderMap,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Client with a 5s connect timeout, 15s request timeout and no retries.
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use tally_http::HttpClient;
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), tally_http::HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::with_connect_timeout(Duration::from_secs(5))
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
        Ok(Self {
            inner,
            default_headers,
            default_timeout: Duration::from_secs(15),
            max_retries: 0,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Extra attempts after the first; zero means a single attempt.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_user_agent(mut self, agent: &str) -> Result<Self, HttpError> {
        let value = HeaderValue::from_str(agent)
            .map_err(|e| HttpError::Build(format!("invalid User-Agent {agent:?}: {e}")))?;
        self.default_headers.insert(USER_AGENT, value);
        Ok(self)
    }

    /// GET `url` and return the body decoded as UTF-8.
    pub async fn get_text(&self, url: &Url, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let page = self.fetch(Method::GET, url, &opts).await?;
        String::from_utf8(page.body).map_err(|e| {
            tracing::warn!(
                req_id = %page.req_id,
                utf8_err = %e.utf8_error(),
                "http.response.decode_error"
            );
            HttpError::Decode(e.utf8_error().to_string(), snip_body(e.as_bytes()))
        })
    }

    async fn fetch(
        &self,
        method: Method,
        url: &Url,
        opts: &RequestOpts<'_>,
    ) -> Result<Fetched, HttpError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::Url(format!("unsupported scheme: {}", url.scheme())));
        }

        let req = Prepared {
            id: format!("r{:x}", NEXT_REQUEST.fetch_add(1, Ordering::Relaxed)),
            method,
            url,
            timeout: opts.timeout.unwrap_or(self.default_timeout),
            headers: self.merged_headers(opts.headers.as_ref()),
            query: opts.query.as_deref().unwrap_or_default(),
        };
        let budget = opts.retries.unwrap_or(self.max_retries);

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let failure = match self.attempt(&req, attempt, budget).await {
                Ok(fetched) => return Ok(fetched),
                Err(failure) => failure,
            };
            if !failure.retryable || attempt > budget {
                tracing::warn!(
                    req_id = %req.id,
                    attempt,
                    max_retries = budget,
                    stage = failure.stage,
                    error = %failure.error,
                    "http.error"
                );
                return Err(failure.error);
            }

            let delay = failure.wait.unwrap_or_else(|| failure.floor.max(backoff(attempt)));
            tracing::warn!(
                req_id = %req.id,
                attempt,
                max_retries = budget,
                stage = failure.stage,
                backoff_ms = delay.as_millis() as u64,
                error = %failure.error,
                "http.retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One round trip. Classifies every failure as retryable or final.
    async fn attempt(
        &self,
        req: &Prepared<'_>,
        attempt: usize,
        budget: usize,
    ) -> Result<Fetched, Failure> {
        let (host_path, query) = redact_query(req.url);
        tracing::debug!(
            req_id = %req.id,
            attempt,
            max_retries = budget,
            method = %req.method,
            host_path = %host_path,
            query = ?query,
            timeout_ms = req.timeout.as_millis() as u64,
            "http.request.start"
        );
        if raw_enabled() {
            let curl = curl_line(&req.method, req.url, &req.headers);
            tracing::debug!(target: "http.raw", req_id = %req.id, %curl, "request");
        }

        let started = Instant::now();
        let resp = self
            .inner
            .request(req.method.clone(), req.url.clone())
            .timeout(req.timeout)
            .headers(req.headers.clone())
            .query(req.query)
            .send()
            .await
            .map_err(|e| Failure::transport("send", e))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let final_url = resp.url().clone();
        let body = read_body(resp).await?;
        let request_id = header_str(&headers, "x-request-id")
            .or_else(|| header_str(&headers, "x-correlation-id"))
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id = %req.id,
            %status,
            final_url = %final_url,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = body.len(),
            content_len = content_len(&headers, body.len()),
            content_type = header_str(&headers, CONTENT_TYPE.as_str()).unwrap_or("-"),
            x_request_id = %request_id,
            "http.response.headers"
        );
        if raw_enabled() {
            let shown = &body[..body.len().min(RAW_BODY_LIMIT)];
            tracing::info!(
                target: "http.raw",
                req_id = %req.id,
                %status,
                headers = ?redact_headers(&headers),
                body = %String::from_utf8_lossy(shown),
                truncated = body.len() > RAW_BODY_LIMIT,
                "response"
            );
        }

        if status.is_success() {
            return Ok(Fetched {
                body,
                req_id: req.id.clone(),
            });
        }

        let snippet = snip_body(&body);
        let throttled = status == StatusCode::TOO_MANY_REQUESTS;
        Err(Failure {
            stage: "status",
            retryable: throttled || status.is_server_error(),
            wait: retry_after(&headers),
            floor: if throttled {
                Duration::from_millis(1100)
            } else {
                Duration::ZERO
            },
            error: HttpError::Api {
                status,
                message: error_message(status, &snippet),
                request_id,
            },
        })
    }

    fn merged_headers(&self, extra: Option<&HeaderMap>) -> HeaderMap {
        let mut merged = self.default_headers.clone();
        if let Some(extra) = extra {
            for (name, value) in extra {
                merged.insert(name, value.clone());
            }
        }
        merged
    }
}

struct Prepared<'r> {
    id: String,
    method: Method,
    url: &'r Url,
    timeout: Duration,
    headers: HeaderMap,
    query: &'r [(&'r str, Cow<'r, str>)],
}

struct Fetched {
    body: Vec<u8>,
    req_id: String,
}

struct Failure {
    stage: &'static str,
    retryable: bool,
    /// Server-requested wait (`Retry-After`), used verbatim.
    wait: Option<Duration>,
    /// Lower bound on the computed backoff.
    floor: Duration,
    error: HttpError,
}

impl Failure {
    fn transport(stage: &'static str, err: reqwest::Error) -> Self {
        Self {
            stage,
            retryable: true,
            wait: None,
            floor: Duration::ZERO,
            error: HttpError::Network(err.to_string()),
        }
    }
}

async fn read_body(resp: Response) -> Result<Vec<u8>, Failure> {
    resp.bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| Failure::transport("body", e))
}

fn raw_enabled() -> bool {
    std::env::var(RAW_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn backoff(attempt: usize) -> Duration {
    let doublings = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64 << doublings)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: u64 = header_str(headers, RETRY_AFTER.as_str())?.trim().parse().ok()?;
    Some(Duration::from_secs(secs))
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn content_len(headers: &HeaderMap, body_len: usize) -> usize {
    header_str(headers, CONTENT_LENGTH.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or(body_len)
}

fn error_message(status: StatusCode, snippet: &str) -> String {
    let snippet = snippet.trim();
    match (status.canonical_reason(), snippet.is_empty()) {
        (Some(reason), true) => reason.to_string(),
        (Some(reason), false) => format!("{reason}: {snippet}"),
        (None, true) => status.as_str().to_string(),
        (None, false) => snippet.to_string(),
    }
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_LIMIT {
        return text.into_owned();
    }
    let cut = (0..=SNIPPET_LIMIT)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...", &text[..cut])
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "api_key"
            | "apikey"
            | "auth"
            | "authorization"
            | "bearer"
            | "client_secret"
            | "key"
            | "password"
            | "secret"
            | "sig"
            | "signature"
            | "token"
    )
}

/// `host + path` and the query pairs with secret values masked.
fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let pairs = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if is_secret_param(&k) {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    (host_path, pairs)
}

fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = match name.as_str() {
                "authorization" | "cookie" | "set-cookie" | "proxy-authorization" => REDACTED,
                _ => value.to_str().unwrap_or("<binary>"),
            };
            (name.as_str().to_string(), shown.to_string())
        })
        .collect()
}

/// A curl command that replays the request with secrets masked.
fn curl_line(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let (host_path, query) = redact_query(url);
    let mut target = format!("{}://{host_path}", url.scheme());
    if !query.is_empty() {
        let joined: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        target.push('?');
        target.push_str(&joined.join("&"));
    }

    let mut line = format!("curl -X{method}");
    for (name, value) in redact_headers(headers) {
        line.push_str(&format!(" -H '{name}: {}'", value.replace('\'', r"'\''")));
    }
    line.push_str(&format!(" '{target}'"));
    line
}
